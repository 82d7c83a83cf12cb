//! Transport connectivity state per identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Error => "error",
        }
    }
}

/// A status change reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub status: ConnectionStatus,
    pub message: Option<String>,
}

impl StatusEvent {
    pub fn new(status: ConnectionStatus) -> Self {
        Self {
            status,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ConnectionStatus::Error,
            message: Some(message.into()),
        }
    }
}

/// Identity-level connectivity bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connectivity {
    pub status: ConnectionStatus,
    pub connected: bool,
    pub last_connected_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub reconnect_attempts: u32,
}

impl Connectivity {
    /// Fold a status event into the bookkeeping.
    pub fn apply(&mut self, event: &StatusEvent, now: DateTime<Utc>) {
        self.status = event.status;
        match event.status {
            ConnectionStatus::Connected => {
                self.connected = true;
                self.last_connected_at = Some(now);
                self.reconnect_attempts = 0;
            }
            ConnectionStatus::Connecting => {}
            ConnectionStatus::Reconnecting => {
                self.connected = false;
            }
            ConnectionStatus::Disconnected => {
                self.connected = false;
            }
            ConnectionStatus::Error => {
                self.connected = false;
                self.last_error = event.message.clone();
                self.last_error_at = Some(now);
            }
        }
    }
}
