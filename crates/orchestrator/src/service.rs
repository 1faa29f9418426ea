//! Task-level control surface.
//!
//! Starting a task hands it to the workflow engine; the engine then invokes
//! the orchestrator for each run on its own schedule. Stopping cancels the
//! engine-side execution by the correlation id recorded at start.

use std::sync::Arc;

use repli_core::{ReplicationRun, TaskStatus};
use tracing::info;
use uuid::Uuid;

use crate::collaborators::{RunStateStore, WorkflowEngine};
use crate::error::{OrchestratorError, Result};

pub struct ReplicationService {
    store: Arc<dyn RunStateStore>,
    engine: Arc<dyn WorkflowEngine>,
}

impl ReplicationService {
    pub fn new(store: Arc<dyn RunStateStore>, engine: Arc<dyn WorkflowEngine>) -> Self {
        Self { store, engine }
    }

    /// Hand the task to the workflow engine and record the workflow id it
    /// returns. Inactive tasks are rejected before the engine is contacted.
    pub async fn start_task(&self, task_id: Uuid) -> Result<String> {
        let task = self.store.get_task(task_id).await?;
        if task.status != TaskStatus::Active {
            return Err(OrchestratorError::Validation(format!(
                "task {task_id} is not active and cannot be started"
            )));
        }

        let workflow_id = self.engine.start_run(task_id, &task.schedule).await?;
        self.store
            .set_task_workflow_id(task_id, &workflow_id)
            .await?;
        info!(%task_id, %workflow_id, "task handed to workflow engine");
        Ok(workflow_id)
    }

    /// Cancel the engine-side execution for the task. Fails when the task
    /// was never started.
    pub async fn stop_task(&self, task_id: Uuid) -> Result<()> {
        let task = self.store.get_task(task_id).await?;
        let Some(workflow_id) = task.workflow_id else {
            return Err(OrchestratorError::Validation(format!(
                "task {task_id} has no workflow to stop"
            )));
        };

        self.engine.cancel(&workflow_id).await?;
        info!(%task_id, %workflow_id, "task workflow cancelled");
        Ok(())
    }

    /// Run history for a task, newest first.
    pub async fn list_runs(&self, task_id: Uuid) -> Result<Vec<ReplicationRun>> {
        self.store.get_task(task_id).await?;
        self.store.list_runs(task_id).await
    }

    pub async fn get_run(&self, run_id: Uuid) -> Result<ReplicationRun> {
        self.store.get_run(run_id).await
    }
}
