//! Persistence seam.
//!
//! The monitor only ever appends: samples, alerts and session summaries.
//! Reads are limited to looking up the profile of the user behind a device.
//! Implementations must accept concurrent appends from many connections.

use crate::core::{Classification, SensorReading, SessionSummary};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use uuid::Uuid;

pub type UserId = i64;

/// Errors that can occur in a store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown user {0}")]
    UnknownUser(UserId),
}

/// What the monitor knows about a user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub device_connected: bool,
}

impl UserProfile {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            emergency_contact: None,
            device_id: None,
            device_connected: false,
        }
    }

    pub fn with_emergency_contact(mut self, contact: impl Into<String>) -> Self {
        self.emergency_contact = Some(contact.into());
        self
    }
}

/// One persisted sensor sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub reading: SensorReading,
    pub classification: Classification,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Fall,
    Posture,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fall => "fall",
            Self::Posture => "posture",
        }
    }
}

/// One persisted alert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub alert_id: Uuid,
    pub user_id: UserId,
    pub kind: AlertKind,
    pub timestamp: DateTime<Utc>,
    pub emergency_contact_notified: bool,
}

/// Summary of a finished connection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub connection_id: Uuid,
    pub user_id: UserId,
    pub device_id: Option<String>,
    pub summary: SessionSummary,
}

/// Append-only persistence used by the connection adapter.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError>;

    /// Record whether the user's device is connected, and which device.
    async fn set_device_status(
        &self,
        user_id: UserId,
        connected: bool,
        device_id: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn append_sample(&self, record: SampleRecord) -> Result<(), StoreError>;

    async fn append_alert(&self, record: AlertRecord) -> Result<(), StoreError>;

    async fn append_session(&self, record: SessionRecord) -> Result<(), StoreError>;
}

/// Records kept per table by a [`MemoryStore`] unless configured otherwise.
pub const DEFAULT_RETAINED_RECORDS: usize = 10_000;

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserProfile>,
    samples: VecDeque<SampleRecord>,
    alerts: VecDeque<AlertRecord>,
    sessions: VecDeque<SessionRecord>,
}

/// Process-local store, used by the server binary and in tests.
///
/// Each record table keeps only the newest `retained` entries; older ones
/// are dropped on append.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    retained: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tables: RwLock::default(),
            retained: DEFAULT_RETAINED_RECORDS,
        }
    }
}

fn push_bounded<T>(table: &mut VecDeque<T>, record: T, retained: usize) {
    table.push_back(record);
    while table.len() > retained {
        table.pop_front();
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `retained` records per table.
    pub fn with_retention(mut self, retained: usize) -> Self {
        self.retained = retained;
        self
    }

    pub fn retention(&self) -> usize {
        self.retained
    }

    pub fn with_users<I>(users: I) -> Self
    where
        I: IntoIterator<Item = UserProfile>,
    {
        let store = Self::new();
        for user in users {
            store.insert_user(user);
        }
        store
    }

    pub fn insert_user(&self, user: UserProfile) {
        self.tables.write().users.insert(user.user_id, user);
    }

    pub fn user(&self, user_id: UserId) -> Option<UserProfile> {
        self.tables.read().users.get(&user_id).cloned()
    }

    pub fn samples(&self) -> Vec<SampleRecord> {
        self.tables.read().samples.iter().cloned().collect()
    }

    pub fn alerts(&self) -> Vec<AlertRecord> {
        self.tables.read().alerts.iter().cloned().collect()
    }

    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.tables.read().sessions.iter().cloned().collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.user(user_id))
    }

    async fn set_device_status(
        &self,
        user_id: UserId,
        connected: bool,
        device_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let profile = tables
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::UnknownUser(user_id))?;
        profile.device_connected = connected;
        if let Some(device_id) = device_id {
            profile.device_id = Some(device_id.to_string());
        }
        Ok(())
    }

    async fn append_sample(&self, record: SampleRecord) -> Result<(), StoreError> {
        push_bounded(&mut self.tables.write().samples, record, self.retained);
        Ok(())
    }

    async fn append_alert(&self, record: AlertRecord) -> Result<(), StoreError> {
        push_bounded(&mut self.tables.write().alerts, record, self.retained);
        Ok(())
    }

    async fn append_session(&self, record: SessionRecord) -> Result<(), StoreError> {
        push_bounded(&mut self.tables.write().sessions, record, self.retained);
        Ok(())
    }
}
