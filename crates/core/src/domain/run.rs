use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on stored error detail. Executor output can be arbitrarily
/// large; anything past this is cut before it reaches the run record.
pub const ERROR_DETAIL_MAX_LEN: usize = 4000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    RunCreated,
    ConfigGenerated,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunCreated => "run_created",
            Self::ConfigGenerated => "config_generated",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "run_created" => Some(Self::RunCreated),
            "config_generated" => Some(Self::ConfigGenerated),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Position in the forward-only ordering. Terminal states share the top
    /// rank; a run never moves between them.
    pub fn rank(&self) -> u8 {
        match self {
            Self::RunCreated => 0,
            Self::ConfigGenerated => 1,
            Self::Running => 2,
            Self::Completed | Self::Failed => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One durable execution attempt of a replication task.
///
/// Invariants: `end_time` is set exactly when the status is terminal, and a
/// failed run always carries a non-empty error detail. A run has a single
/// writer for its lifetime (the orchestrator instance that created it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationRun {
    pub id: Uuid,
    pub task_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub error_detail: Option<String>,
    /// Identifier of the engine-side execution driving this run, used to
    /// locate and cancel it.
    pub correlation_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReplicationRun {
    pub fn new(task_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            task_id,
            start_time: now,
            end_time: None,
            status: RunStatus::RunCreated,
            error_detail: None,
            correlation_id: None,
            created_at: now,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.error_detail = None;
        self.end_time = Some(Utc::now());
    }

    pub fn fail(&mut self, detail: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.error_detail = Some(truncate_error_detail(&detail.into()));
        self.end_time = Some(Utc::now());
    }
}

/// Truncate to `ERROR_DETAIL_MAX_LEN`, respecting char boundaries.
pub fn truncate_error_detail(detail: &str) -> String {
    if detail.len() <= ERROR_DETAIL_MAX_LEN {
        return detail.to_string();
    }
    let mut end = ERROR_DETAIL_MAX_LEN;
    while !detail.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &detail[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_creation() {
        let task_id = Uuid::new_v4();
        let run = ReplicationRun::new(task_id);

        assert_eq!(run.task_id, task_id);
        assert_eq!(run.status, RunStatus::RunCreated);
        assert!(run.end_time.is_none());
        assert!(run.error_detail.is_none());
    }

    #[test]
    fn test_run_complete() {
        let mut run = ReplicationRun::new(Uuid::new_v4());
        run.complete();

        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.end_time.is_some());
        assert!(run.error_detail.is_none());
    }

    #[test]
    fn test_run_fail_sets_detail_and_end_time() {
        let mut run = ReplicationRun::new(Uuid::new_v4());
        run.fail("executor reported failure");

        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.end_time.is_some());
        assert_eq!(
            run.error_detail.as_deref(),
            Some("executor reported failure")
        );
    }

    #[test]
    fn test_fail_truncates_long_detail() {
        let mut run = ReplicationRun::new(Uuid::new_v4());
        run.fail("x".repeat(10_000));

        let detail = run.error_detail.unwrap();
        assert_eq!(detail.len(), ERROR_DETAIL_MAX_LEN + 3);
        assert!(detail.ends_with("..."));
    }

    #[test]
    fn test_status_ordering() {
        assert!(RunStatus::RunCreated.rank() < RunStatus::ConfigGenerated.rank());
        assert!(RunStatus::ConfigGenerated.rank() < RunStatus::Running.rank());
        assert!(RunStatus::Running.rank() < RunStatus::Completed.rank());
        assert_eq!(RunStatus::Completed.rank(), RunStatus::Failed.rank());
    }

    #[test]
    fn test_status_terminal() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            RunStatus::RunCreated,
            RunStatus::ConfigGenerated,
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Failed,
        ] {
            assert_eq!(RunStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RunStatus::parse("unknown"), None);
    }
}
