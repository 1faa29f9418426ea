use repli_core::truncate_error_detail;
use thiserror::Error;
use uuid::Uuid;

/// Failure classification driving retry and finalization decisions.
///
/// Only `Transient` is retryable; everything else ends the run. `Persistence`
/// is special-cased by the runner: after bounded retries at the store-call
/// level it continues with in-memory state instead of failing the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Transient,
    Execution,
    Persistence,
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(Uuid),

    #[error("Run not found: {0}")]
    RunNotFound(Uuid),

    #[error("Invalid run status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Step {step} timed out after {timeout_ms}ms")]
    StepTimeout { step: &'static str, timeout_ms: u64 },

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Pipeline execution failed: {summary}")]
    ExecutionFailed { summary: String, output: String },

    #[error("State write failed: {0}")]
    Persistence(String),

    #[error("Run cancelled")]
    Cancelled,
}

impl OrchestratorError {
    /// Build an execution failure carrying the captured (truncated) output.
    pub fn execution_failed(summary: impl Into<String>, output: &str) -> Self {
        Self::ExecutionFailed {
            summary: summary.into(),
            output: truncate_error_detail(output),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidTransition { .. } => ErrorKind::Validation,
            Self::TaskNotFound(_) | Self::ConnectionNotFound(_) | Self::RunNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::StepTimeout { .. } | Self::Unavailable(_) => ErrorKind::Transient,
            Self::ExecutionFailed { .. } | Self::Cancelled => ErrorKind::Execution,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Whether the external engine should retry the failing step.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// Message recorded on the run when this error ends it. Execution
    /// failures append the captured output so operators can see what the
    /// pipeline reported.
    pub fn run_detail(&self) -> String {
        match self {
            Self::ExecutionFailed { summary, output } if !output.is_empty() => {
                truncate_error_detail(&format!("{summary}\n{output}"))
            }
            other => other.to_string(),
        }
    }
}

impl From<db::DbError> for OrchestratorError {
    fn from(err: db::DbError) -> Self {
        match err {
            db::DbError::TaskNotFound(id) => Self::TaskNotFound(id),
            db::DbError::ConnectionNotFound(id) => Self::ConnectionNotFound(id),
            db::DbError::RunNotFound(id) => Self::RunNotFound(id),
            // A corrupt stored value will not heal on retry.
            err @ db::DbError::Decode { .. } => Self::Validation(err.to_string()),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
