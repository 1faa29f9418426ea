//! Interfaces to the external collaborators.
//!
//! The orchestrator carries no dependency on any concrete workflow engine or
//! pipeline runtime; adapters outside this crate bind these traits to real
//! systems. All collaborators are constructor-injected, never held in
//! process-wide state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use repli_core::{ConnectionProfile, ReplicationRun, ReplicationTask, RunStatus};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::Result;
use crate::spec::PipelineSpec;

/// Persistence boundary for tasks, connections, and runs.
///
/// Implementations must report missing rows as not-found errors, distinct
/// from infrastructure failures, and `update_run_status` must tolerate being
/// invoked redundantly with the same terminal values.
#[async_trait]
pub trait RunStateStore: Send + Sync {
    async fn get_task(&self, id: Uuid) -> Result<ReplicationTask>;

    async fn get_connection(&self, id: Uuid) -> Result<ConnectionProfile>;

    /// Persist a new run for the task, stamped with the engine-side
    /// correlation id when the caller executes under one. Always creates a
    /// fresh record; a task accumulates many runs over time.
    async fn create_run(
        &self,
        task_id: Uuid,
        correlation_id: Option<&str>,
    ) -> Result<ReplicationRun>;

    async fn get_run(&self, id: Uuid) -> Result<ReplicationRun>;

    async fn update_run_status(
        &self,
        id: Uuid,
        status: RunStatus,
        error_detail: Option<&str>,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<()>;

    async fn list_runs(&self, task_id: Uuid) -> Result<Vec<ReplicationRun>>;

    /// Record the engine-side identifier driving a task's executions.
    async fn set_task_workflow_id(&self, task_id: Uuid, workflow_id: &str) -> Result<()>;
}

/// Outcome reported by the pipeline runtime. `success = false` means the
/// pipeline ran and reported failure; infrastructure faults surface as `Err`
/// from `PipelineExecutor::run` instead.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub success: bool,
    pub output: String,
}

/// External runtime that executes a generated spec to completion.
#[async_trait]
pub trait PipelineExecutor: Send + Sync {
    /// Run the pipeline, honoring the cancellation token and the caller's
    /// deadline. May suspend for hours.
    async fn run(&self, spec: &PipelineSpec, cancel: CancellationToken) -> Result<ExecutionReport>;
}

/// External durable execution substrate. The engine triggers orchestrator
/// runs, retries failed steps per its own policy, and cancels by the
/// correlation id it handed out.
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    /// Begin (or schedule) execution for the task; the schedule expression is
    /// opaque to the core. Returns the engine's correlation id.
    async fn start_run(&self, task_id: Uuid, schedule: &str) -> Result<String>;

    async fn cancel(&self, correlation_id: &str) -> Result<()>;

    /// Liveness signal emitted while a long dispatch is in flight so the
    /// engine can detect a stalled executor.
    async fn record_heartbeat(&self, run_id: Uuid) -> Result<()>;
}
