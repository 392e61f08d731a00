//! Shared collaborators handed to every connection.

use crate::classifier::Classifier;
use crate::config::VibrationSettings;
use crate::core::{Classification, SensorReading};
use crate::dispatch::AlertDispatcher;
use crate::error::MonitorError;
use crate::policy::AlertPolicy;
use crate::store::Store;
use std::sync::Arc;
use stillwater::effect::{BoxedEffect, Effect};
use stillwater::prelude::*;

/// Environment for effectful connection steps.
///
/// Cheap to clone; each connection holds its own copy. Nothing in here is
/// mutable per connection.
#[derive(Clone)]
pub struct MonitorEnv {
    pub classifier: Arc<dyn Classifier>,
    pub store: Arc<dyn Store>,
    pub dispatcher: Arc<AlertDispatcher>,
    pub policy: AlertPolicy,
    pub vibration: VibrationSettings,
}

impl MonitorEnv {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn Store>,
        dispatcher: Arc<AlertDispatcher>,
    ) -> Self {
        Self {
            classifier,
            store,
            dispatcher,
            policy: AlertPolicy::default(),
            vibration: VibrationSettings::default(),
        }
    }

    pub fn with_policy(mut self, policy: AlertPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_vibration(mut self, vibration: VibrationSettings) -> Self {
        self.vibration = vibration;
        self
    }
}

/// Classify one reading with the environment's classifier.
///
/// A classifier without an opinion yields `None` verdicts, never an error.
pub fn classify(reading: SensorReading) -> BoxedEffect<Classification, MonitorError, MonitorEnv> {
    from_fn(move |env: &MonitorEnv| Ok(env.classifier.classify(&reading))).boxed()
}
