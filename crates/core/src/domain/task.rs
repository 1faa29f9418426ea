use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Active,
    Inactive,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// A named replication job pairing a source and target connection.
///
/// `selection_criteria` is free-form and interpreted by the source kind:
/// a query for sql-like and warehouse-query sources, a key prefix for
/// object stores, a comma-separated path list for local files.
/// `schedule` and `workflow_id` are opaque here; only the external workflow
/// engine consumes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationTask {
    pub id: Uuid,
    pub name: String,
    pub source_connection_id: Uuid,
    pub target_connection_id: Uuid,
    pub selection_criteria: String,
    pub transformation_script: String,
    pub schedule: String,
    pub workflow_id: Option<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReplicationTask {
    pub fn new(name: impl Into<String>, source_connection_id: Uuid, target_connection_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            source_connection_id,
            target_connection_id,
            selection_criteria: String::new(),
            transformation_script: String::new(),
            schedule: String::new(),
            workflow_id: None,
            status: TaskStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_selection_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.selection_criteria = criteria.into();
        self
    }

    pub fn with_transformation_script(mut self, script: impl Into<String>) -> Self {
        self.transformation_script = script.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    pub source_connection_id: Uuid,
    pub target_connection_id: Uuid,
    pub selection_criteria: String,
    pub transformation_script: Option<String>,
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTaskRequest {
    pub name: Option<String>,
    pub selection_criteria: Option<String>,
    pub transformation_script: Option<String>,
    pub schedule: Option<String>,
    pub status: Option<TaskStatus>,
    pub workflow_id: Option<String>,
}
