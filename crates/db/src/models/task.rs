use repli_core::{ReplicationTask, TaskStatus};
use uuid::Uuid;

use super::{datetime_to_timestamp, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskRow {
    pub id: String,
    pub name: String,
    pub source_connection_id: String,
    pub target_connection_id: String,
    pub selection_criteria: String,
    pub transformation_script: String,
    pub schedule: String,
    pub workflow_id: Option<String>,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TaskRow {
    pub fn into_domain(self) -> ReplicationTask {
        ReplicationTask {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            name: self.name,
            source_connection_id: Uuid::parse_str(&self.source_connection_id).unwrap_or_default(),
            target_connection_id: Uuid::parse_str(&self.target_connection_id).unwrap_or_default(),
            selection_criteria: self.selection_criteria,
            transformation_script: self.transformation_script,
            schedule: self.schedule,
            workflow_id: self.workflow_id,
            status: TaskStatus::parse(&self.status).unwrap_or_default(),
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        }
    }
}

impl From<&ReplicationTask> for TaskRow {
    fn from(task: &ReplicationTask) -> Self {
        Self {
            id: task.id.to_string(),
            name: task.name.clone(),
            source_connection_id: task.source_connection_id.to_string(),
            target_connection_id: task.target_connection_id.to_string(),
            selection_criteria: task.selection_criteria.clone(),
            transformation_script: task.transformation_script.clone(),
            schedule: task.schedule.clone(),
            workflow_id: task.workflow_id.clone(),
            status: task.status.as_str().to_string(),
            created_at: datetime_to_timestamp(task.created_at),
            updated_at: datetime_to_timestamp(task.updated_at),
        }
    }
}
