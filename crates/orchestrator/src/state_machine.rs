use repli_core::RunStatus;

use crate::error::{OrchestratorError, Result};

/// Forward-only run state machine.
///
/// Transitions are monotonic: a run never moves backward, and the two
/// terminal states admit no exits. Re-applying the current status is allowed
/// so that an externally retried step can repeat its write without error.
pub struct RunStateMachine;

impl RunStateMachine {
    pub fn validate_transition(from: &RunStatus, to: &RunStatus) -> Result<()> {
        if from == to {
            // Step retry re-applying the same status; a no-op, not an error.
            return Ok(());
        }

        let allowed = Self::allowed_transitions(from);
        if allowed.contains(to) {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    fn allowed_transitions(from: &RunStatus) -> Vec<RunStatus> {
        match from {
            RunStatus::RunCreated => vec![RunStatus::ConfigGenerated, RunStatus::Failed],
            RunStatus::ConfigGenerated => vec![RunStatus::Running, RunStatus::Failed],
            RunStatus::Running => vec![RunStatus::Completed, RunStatus::Failed],
            RunStatus::Completed | RunStatus::Failed => vec![],
        }
    }

    pub fn can_transition(from: &RunStatus, to: &RunStatus) -> bool {
        Self::validate_transition(from, to).is_ok()
    }
}
