//! Connection lifecycle adapter.
//!
//! One [`Connection`] lives exactly as long as one transport connection. It
//! owns the session state, runs each inbound message through the
//! classifier, the session state machine, the store and the dispatcher, and
//! returns the outbound messages to send back in order.

use super::env::{classify, MonitorEnv};
use crate::core::{ConnectionPhase, PhaseLog, SensorReading, SessionState, State};
use crate::dispatch::Alert;
use crate::error::MonitorError;
use crate::protocol::{
    InboundMessage, OutboundMessage, PostureUpdate, CONNECTED_MESSAGE, FALL_ALERT_MESSAGE,
    INVALID_USER_MESSAGE, POSTURE_ALERT_MESSAGE,
};
use crate::store::{AlertKind, AlertRecord, SampleRecord, SessionRecord, UserId, UserProfile};
use chrono::{DateTime, Utc};
use stillwater::effect::Effect;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// The user and device bound to a monitoring connection.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceBinding {
    pub profile: UserProfile,
    pub device_id: Option<String>,
}

/// Per-connection message handler.
///
/// Alert delivery runs on detached tokio tasks, so handling a sample needs a
/// tokio runtime. A slow notifier never delays the outbound messages.
pub struct Connection {
    id: Uuid,
    env: MonitorEnv,
    phase: ConnectionPhase,
    phases: PhaseLog<ConnectionPhase>,
    binding: Option<DeviceBinding>,
    session: Option<SessionState>,
    pending_alerts: Vec<JoinHandle<()>>,
}

impl Connection {
    pub fn new(env: MonitorEnv) -> Self {
        Self {
            id: Uuid::new_v4(),
            env,
            phase: ConnectionPhase::AwaitingDevice,
            phases: PhaseLog::new(),
            binding: None,
            session: None,
            pending_alerts: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn phases(&self) -> &PhaseLog<ConnectionPhase> {
        &self.phases
    }

    pub fn binding(&self) -> Option<&DeviceBinding> {
        self.binding.as_ref()
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    /// Number of alert deliveries still in flight.
    pub fn pending_alerts(&mut self) -> usize {
        self.pending_alerts.retain(|task| !task.is_finished());
        self.pending_alerts.len()
    }

    /// Wait for every alert delivery started so far.
    pub async fn settle_alerts(&mut self) {
        for task in self.pending_alerts.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!(connection_id = %self.id, error = %e, "Alert delivery task failed");
            }
        }
    }

    /// Handle one raw text frame received at `now`.
    ///
    /// Never fails: any error becomes a single outbound `error` message and
    /// the connection stays usable.
    pub async fn handle_text(&mut self, text: &str, now: DateTime<Utc>) -> Vec<OutboundMessage> {
        let result = match InboundMessage::decode(text) {
            Ok(message) => self.handle_message(message, now).await,
            Err(e) => Err(MonitorError::from(e)),
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(connection_id = %self.id, error = %e, "Failed to handle message");
            vec![OutboundMessage::error(e.to_string())]
        })
    }

    /// Handle one decoded message received at `now`.
    pub async fn handle_message(
        &mut self,
        message: InboundMessage,
        now: DateTime<Utc>,
    ) -> Result<Vec<OutboundMessage>, MonitorError> {
        if self.phase.is_final() {
            return Err(MonitorError::Closed);
        }

        match message {
            InboundMessage::DeviceConnect { device_id, user_id } => {
                self.connect_device(user_id, device_id, now).await
            }
            InboundMessage::PostureData { sensor_data } => self.process_sample(sensor_data, now).await,
            InboundMessage::Heartbeat => Ok(vec![OutboundMessage::HeartbeatAck]),
            InboundMessage::Unknown => {
                tracing::debug!(connection_id = %self.id, "Ignoring unknown message type");
                Ok(Vec::new())
            }
        }
    }

    /// Tear the connection down: persist the session summary, mark the
    /// device disconnected and discard the session. Idempotent.
    pub async fn close(&mut self, now: DateTime<Utc>) {
        if self.phase.is_final() {
            return;
        }
        self.end_session(now).await;
        self.enter(ConnectionPhase::Closed, now);
        tracing::info!(connection_id = %self.id, "Connection closed");
    }

    async fn connect_device(
        &mut self,
        user_id: Option<UserId>,
        device_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<OutboundMessage>, MonitorError> {
        let profile = match user_id {
            Some(user_id) => self.env.store.find_user(user_id).await?,
            None => None,
        };
        let Some(profile) = profile else {
            tracing::warn!(connection_id = %self.id, ?user_id, "Device connect for unknown user");
            return Ok(vec![OutboundMessage::ConnectionError {
                message: INVALID_USER_MESSAGE.to_string(),
            }]);
        };

        // A second connect rebinds; the previous window does not carry over.
        self.end_session(now).await;

        if let Err(e) = self
            .env
            .store
            .set_device_status(profile.user_id, true, device_id.as_deref())
            .await
        {
            self.enter(ConnectionPhase::AwaitingDevice, now);
            return Err(e.into());
        }

        tracing::info!(
            connection_id = %self.id,
            user_id = profile.user_id,
            device_id = device_id.as_deref().unwrap_or("-"),
            "Device connected"
        );

        let reply = OutboundMessage::ConnectionSuccess {
            message: CONNECTED_MESSAGE.to_string(),
            user: profile.username.clone(),
        };
        self.binding = Some(DeviceBinding { profile, device_id });
        self.session = Some(SessionState::new(self.env.policy, now));
        self.enter(ConnectionPhase::Monitoring, now);

        Ok(vec![reply])
    }

    async fn process_sample(
        &mut self,
        reading: SensorReading,
        now: DateTime<Utc>,
    ) -> Result<Vec<OutboundMessage>, MonitorError> {
        if !self.phase.accepts_samples() {
            return Err(MonitorError::NotConnected);
        }
        let (Some(binding), Some(session)) = (self.binding.as_ref(), self.session.as_mut()) else {
            return Err(MonitorError::NotConnected);
        };
        let profile = &binding.profile;

        let classification = classify(reading).run(&self.env).await?;
        let decision = session.on_sample(&classification, now);

        let mut outbound = Vec::new();

        let record = SampleRecord {
            user_id: profile.user_id,
            timestamp: now,
            reading,
            classification,
        };
        if let Err(e) = self.env.store.append_sample(record).await {
            tracing::warn!(connection_id = %self.id, error = %e, "Failed to store sample");
            outbound.push(OutboundMessage::error(MonitorError::from(e).to_string()));
        }

        let mut alerts = Vec::new();
        if decision.fall_alert {
            alerts.push(AlertKind::Fall);
            outbound.push(OutboundMessage::FallAlert {
                message: FALL_ALERT_MESSAGE.to_string(),
                timestamp: now,
            });
        }

        if decision.vibration_alert {
            outbound.push(OutboundMessage::VibrationCommand {
                duration: self.env.vibration.duration_ms,
                pattern: self.env.vibration.pattern.clone(),
            });
            outbound.push(OutboundMessage::PostureAlert {
                message: POSTURE_ALERT_MESSAGE.to_string(),
                timestamp: now,
            });
            alerts.push(AlertKind::Posture);
        }

        self.pending_alerts.retain(|task| !task.is_finished());
        for kind in alerts {
            let alert = Alert::new(
                kind,
                profile.user_id,
                profile.username.clone(),
                profile.emergency_contact.clone(),
                now,
            );
            let env = self.env.clone();
            self.pending_alerts
                .push(tokio::spawn(async move { raise_alert(env, alert).await }));
        }

        outbound.push(OutboundMessage::PostureUpdate {
            data: PostureUpdate::new(&reading, &classification, now),
        });

        Ok(outbound)
    }

    async fn end_session(&mut self, now: DateTime<Utc>) {
        let (Some(binding), Some(session)) = (self.binding.take(), self.session.take()) else {
            return;
        };
        let user_id = binding.profile.user_id;

        let record = SessionRecord {
            connection_id: self.id,
            user_id,
            device_id: binding.device_id,
            summary: session.summary(now),
        };
        if let Err(e) = self.env.store.append_session(record).await {
            tracing::warn!(connection_id = %self.id, error = %e, "Failed to store session summary");
        }
        if let Err(e) = self.env.store.set_device_status(user_id, false, None).await {
            tracing::warn!(connection_id = %self.id, error = %e, "Failed to mark device disconnected");
        }
    }

    fn enter(&mut self, to: ConnectionPhase, now: DateTime<Utc>) {
        if self.phase == to {
            return;
        }
        tracing::debug!(
            connection_id = %self.id,
            from = self.phase.name(),
            to = to.name(),
            "Phase change"
        );
        self.phases.record(self.phase, to, now);
        self.phase = to;
    }
}

/// Dispatch an alert and persist it. Failures are logged only.
async fn raise_alert(env: MonitorEnv, alert: Alert) {
    let report = env.dispatcher.dispatch(&alert).await;

    let record = AlertRecord {
        alert_id: alert.id,
        user_id: alert.user_id,
        kind: alert.kind,
        timestamp: alert.raised_at,
        emergency_contact_notified: report.contact_notified,
    };
    if let Err(e) = env.store.append_alert(record).await {
        tracing::warn!(alert_id = %alert.id, error = %e, "Failed to store alert");
    }
}
