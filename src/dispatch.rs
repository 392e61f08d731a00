//! Fire-and-forget alert delivery.
//!
//! The dispatcher fans an [`Alert`] out to every registered handler. A
//! failing handler is logged and skipped; dispatch itself never fails, so
//! the sample path is never blocked by a broken notifier.

use crate::store::{AlertKind, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by alert handlers
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Notification to {contact} failed: {reason}")]
    NotificationFailed { contact: String, reason: String },

    #[error("Handler unavailable: {0}")]
    Unavailable(String),
}

/// An alert raised for one user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub kind: AlertKind,
    pub user_id: UserId,
    pub username: String,
    pub emergency_contact: Option<String>,
    pub raised_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        kind: AlertKind,
        user_id: UserId,
        username: impl Into<String>,
        emergency_contact: Option<String>,
        raised_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            user_id,
            username: username.into(),
            emergency_contact,
            raised_at,
        }
    }
}

/// What a handler did with an alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// A human contact was notified
    Notified,
    /// Recorded without contacting anyone
    Logged,
    /// Not applicable to this alert
    Skipped,
}

/// Outcome of one dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub contact_notified: bool,
    pub failures: usize,
}

/// Handler for processing alerts
#[async_trait]
pub trait AlertHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, alert: &Alert) -> Result<Delivery, DispatchError>;
}

/// Fans alerts out to handlers.
#[derive(Default)]
pub struct AlertDispatcher {
    handlers: Vec<Box<dyn AlertHandler>>,
}

impl AlertDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&mut self, handler: Box<dyn AlertHandler>) {
        self.handlers.push(handler);
    }

    pub fn with_handler(mut self, handler: Box<dyn AlertHandler>) -> Self {
        self.add_handler(handler);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Deliver `alert` to every handler. Handler failures are logged and
    /// counted, never returned.
    pub async fn dispatch(&self, alert: &Alert) -> DispatchReport {
        tracing::info!(
            alert_id = %alert.id,
            kind = alert.kind.as_str(),
            user_id = alert.user_id,
            "Dispatching alert"
        );

        let mut report = DispatchReport::default();
        for handler in &self.handlers {
            match handler.handle(alert).await {
                Ok(Delivery::Notified) => report.contact_notified = true,
                Ok(Delivery::Logged | Delivery::Skipped) => {}
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(
                        alert_id = %alert.id,
                        handler = %handler.name(),
                        error = %e,
                        "Handler failed to process alert"
                    );
                }
            }
        }
        report
    }
}

/// Logs every alert.
pub struct LogAlertHandler;

#[async_trait]
impl AlertHandler for LogAlertHandler {
    fn name(&self) -> &str {
        "log"
    }

    async fn handle(&self, alert: &Alert) -> Result<Delivery, DispatchError> {
        tracing::warn!(
            alert_id = %alert.id,
            kind = alert.kind.as_str(),
            user = %alert.username,
            raised_at = %alert.raised_at,
            "Alert raised"
        );
        Ok(Delivery::Logged)
    }
}

/// Text sent to the emergency contact after a fall.
pub fn emergency_message(username: &str) -> String {
    format!("EMERGENCY ALERT: Fall detected for user {username}. Please check on them immediately.")
}

/// Outbound channel to a person (SMS, voice call, ...).
#[async_trait]
pub trait ContactNotifier: Send + Sync {
    async fn notify(&self, contact: &str, message: &str) -> Result<(), DispatchError>;
}

/// Notifier that only logs what it would send.
pub struct LogNotifier;

#[async_trait]
impl ContactNotifier for LogNotifier {
    async fn notify(&self, contact: &str, message: &str) -> Result<(), DispatchError> {
        tracing::info!(contact, body = message, "Would notify emergency contact");
        Ok(())
    }
}

/// Notifies the user's emergency contact about falls.
pub struct EmergencyContactHandler {
    notifier: Arc<dyn ContactNotifier>,
}

impl EmergencyContactHandler {
    pub fn new(notifier: Arc<dyn ContactNotifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl AlertHandler for EmergencyContactHandler {
    fn name(&self) -> &str {
        "emergency_contact"
    }

    async fn handle(&self, alert: &Alert) -> Result<Delivery, DispatchError> {
        if alert.kind != AlertKind::Fall {
            return Ok(Delivery::Skipped);
        }
        let Some(contact) = alert.emergency_contact.as_deref().filter(|c| !c.is_empty()) else {
            tracing::debug!(user_id = alert.user_id, "No emergency contact on file");
            return Ok(Delivery::Skipped);
        };
        self.notifier
            .notify(contact, &emergency_message(&alert.username))
            .await?;
        Ok(Delivery::Notified)
    }
}
