use repli_core::{ReplicationRun, RunStatus};
use uuid::Uuid;

use super::{datetime_to_timestamp, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RunRow {
    pub id: String,
    pub task_id: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub status: String,
    pub error_detail: Option<String>,
    pub correlation_id: Option<String>,
    pub created_at: i64,
}

impl RunRow {
    pub fn into_domain(self) -> ReplicationRun {
        ReplicationRun {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            task_id: Uuid::parse_str(&self.task_id).unwrap_or_default(),
            start_time: timestamp_to_datetime(self.start_time),
            end_time: self.end_time.map(timestamp_to_datetime),
            status: RunStatus::parse(&self.status).unwrap_or_default(),
            error_detail: self.error_detail,
            correlation_id: self.correlation_id,
            created_at: timestamp_to_datetime(self.created_at),
        }
    }
}

impl From<&ReplicationRun> for RunRow {
    fn from(run: &ReplicationRun) -> Self {
        Self {
            id: run.id.to_string(),
            task_id: run.task_id.to_string(),
            start_time: datetime_to_timestamp(run.start_time),
            end_time: run.end_time.map(datetime_to_timestamp),
            status: run.status.as_str().to_string(),
            error_detail: run.error_detail.clone(),
            correlation_id: run.correlation_id.clone(),
            created_at: datetime_to_timestamp(run.created_at),
        }
    }
}
