//! Event types for the replication engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All possible events in the system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A replication run record was created
    #[serde(rename = "run.created")]
    RunCreated { run_id: Uuid, task_id: Uuid },

    /// A run moved to a new status
    #[serde(rename = "run.status_changed")]
    RunStatusChanged {
        run_id: Uuid,
        task_id: Uuid,
        from_status: String,
        to_status: String,
    },

    /// A run reached a terminal status
    #[serde(rename = "run.ended")]
    RunEnded {
        run_id: Uuid,
        task_id: Uuid,
        success: bool,
    },

    /// Generic error event
    #[serde(rename = "error")]
    Error {
        message: String,
        context: Option<String>,
    },
}

impl Event {
    /// Get the run ID associated with this event, if any
    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            Event::RunCreated { run_id, .. } => Some(*run_id),
            Event::RunStatusChanged { run_id, .. } => Some(*run_id),
            Event::RunEnded { run_id, .. } => Some(*run_id),
            Event::Error { .. } => None,
        }
    }
}
