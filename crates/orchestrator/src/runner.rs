//! Run execution.
//!
//! `Orchestrator::execute` drives one run from record creation through
//! pipeline dispatch to a terminal status. The surrounding workflow engine
//! owns retry policy; this module only classifies failures so the engine can
//! tell retryable steps from final ones.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use events::{Event, EventBus, EventEnvelope};
use repli_core::{truncate_error_detail, RunStatus};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::collaborators::{ExecutionReport, PipelineExecutor, RunStateStore, WorkflowEngine};
use crate::error::{ErrorKind, OrchestratorError, Result};
use crate::generator::ConfigGenerator;
use crate::spec::PipelineSpec;
use crate::state_machine::RunStateMachine;

/// Ceiling on the best-effort terminal write so a failing store cannot hold
/// the run open indefinitely.
const TERMINAL_WRITE_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-step time and retry budgets.
#[derive(Debug, Clone)]
pub struct StepBudgets {
    /// Metadata reads and the initial run-record write.
    pub metadata: Duration,
    /// End-to-end pipeline dispatch.
    pub dispatch: Duration,
    /// Liveness interval while a dispatch is in flight.
    pub heartbeat: Duration,
    /// Attempts per run-state write before declaring divergence.
    pub store_write_retries: u32,
}

impl Default for StepBudgets {
    fn default() -> Self {
        Self {
            metadata: Duration::from_secs(5 * 60),
            dispatch: Duration::from_secs(60 * 60),
            heartbeat: Duration::from_secs(2 * 60),
            store_write_retries: 3,
        }
    }
}

impl StepBudgets {
    pub fn with_metadata(mut self, timeout: Duration) -> Self {
        self.metadata = timeout;
        self
    }

    pub fn with_dispatch(mut self, timeout: Duration) -> Self {
        self.dispatch = timeout;
        self
    }

    pub fn with_heartbeat(mut self, interval: Duration) -> Self {
        self.heartbeat = interval;
        self
    }

    pub fn with_store_write_retries(mut self, retries: u32) -> Self {
        self.store_write_retries = retries;
        self
    }
}

/// Result of a finished run, returned to the engine adapter.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub error_detail: Option<String>,
}

/// In-memory view of the run's status, kept authoritative when store writes
/// fail so execution can continue past a flaky database.
struct StatusTracker {
    run_id: Uuid,
    task_id: Uuid,
    status: RunStatus,
    diverged: bool,
}

pub struct Orchestrator {
    store: Arc<dyn RunStateStore>,
    executor: Arc<dyn PipelineExecutor>,
    engine: Arc<dyn WorkflowEngine>,
    event_bus: Option<EventBus>,
    budgets: StepBudgets,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn RunStateStore>,
        executor: Arc<dyn PipelineExecutor>,
        engine: Arc<dyn WorkflowEngine>,
    ) -> Self {
        Self {
            store,
            executor,
            engine,
            event_bus: None,
            budgets: StepBudgets::default(),
        }
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn with_budgets(mut self, budgets: StepBudgets) -> Self {
        self.budgets = budgets;
        self
    }

    /// Execute one run of the task to a terminal status.
    ///
    /// `correlation_id` is the engine-side execution handle, stamped on the
    /// run record so operators can find the engine execution behind a run.
    /// Returns `Ok` with the outcome for both completed and failed runs;
    /// `Err` is reserved for retryable faults (and the pre-run record write),
    /// where the engine is expected to re-invoke with the same token.
    pub async fn execute(
        &self,
        task_id: Uuid,
        correlation_id: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<RunOutcome> {
        let run = self
            .step("create_run", self.store.create_run(task_id, correlation_id))
            .await?;
        info!(run_id = %run.id, %task_id, "run created");
        self.emit(Event::RunCreated {
            run_id: run.id,
            task_id,
        });

        let mut tracker = StatusTracker {
            run_id: run.id,
            task_id,
            status: run.status,
            diverged: false,
        };

        let result = tokio::select! {
            res = self.drive(&mut tracker, &cancel) => res,
            _ = cancel.cancelled() => Err(OrchestratorError::Cancelled),
        };

        match result {
            Ok(()) => {
                self.advance_with(&mut tracker, RunStatus::Completed, None, Some(Utc::now()))
                    .await?;
                if tracker.diverged {
                    warn!(run_id = %tracker.run_id, "run completed but at least one state write was lost");
                }
                info!(run_id = %tracker.run_id, "run completed");
                self.emit(Event::RunEnded {
                    run_id: tracker.run_id,
                    task_id,
                    success: true,
                });
                Ok(RunOutcome {
                    run_id: tracker.run_id,
                    status: RunStatus::Completed,
                    error_detail: None,
                })
            }
            Err(err) if err.is_retryable() => {
                warn!(run_id = %tracker.run_id, error = %err, "transient failure, leaving run open for retry");
                Err(err)
            }
            Err(err) => {
                error!(run_id = %tracker.run_id, error = %err, "run failed");
                let detail = err.run_detail();
                self.finalize_failed(&mut tracker, &detail).await;
                self.emit(Event::RunEnded {
                    run_id: tracker.run_id,
                    task_id,
                    success: false,
                });
                Ok(RunOutcome {
                    run_id: tracker.run_id,
                    status: RunStatus::Failed,
                    error_detail: Some(detail),
                })
            }
        }
    }

    /// Mark a run failed after the engine has exhausted its retries for a
    /// transient fault. No-op when the run is already terminal.
    pub async fn fail_run(&self, run_id: Uuid, message: &str) -> Result<()> {
        let run = self.store.get_run(run_id).await?;
        if run.status.is_terminal() {
            return Ok(());
        }

        let detail = truncate_error_detail(message);
        self.store
            .update_run_status(run_id, RunStatus::Failed, Some(&detail), Some(Utc::now()))
            .await?;
        self.emit(Event::RunEnded {
            run_id,
            task_id: run.task_id,
            success: false,
        });
        Ok(())
    }

    async fn drive(&self, tracker: &mut StatusTracker, cancel: &CancellationToken) -> Result<()> {
        let task = self.step("load_task", self.store.get_task(tracker.task_id)).await?;
        let source = self
            .step(
                "load_source_connection",
                self.store.get_connection(task.source_connection_id),
            )
            .await?;
        let target = self
            .step(
                "load_target_connection",
                self.store.get_connection(task.target_connection_id),
            )
            .await?;

        let spec = ConfigGenerator::generate(&task, &source, &target)?;
        self.advance(tracker, RunStatus::ConfigGenerated).await?;

        // Running is recorded before the executor is invoked so that a crash
        // mid-pipeline leaves an accurate record behind.
        self.advance(tracker, RunStatus::Running).await?;

        let report = self.dispatch(tracker.run_id, &spec, cancel).await?;
        if report.success {
            Ok(())
        } else {
            Err(OrchestratorError::execution_failed(
                "pipeline reported failure",
                &report.output,
            ))
        }
    }

    /// Run the pipeline under the dispatch deadline, heartbeating to the
    /// engine while it is in flight.
    async fn dispatch(
        &self,
        run_id: Uuid,
        spec: &PipelineSpec,
        cancel: &CancellationToken,
    ) -> Result<ExecutionReport> {
        let mut heartbeat = tokio::time::interval(self.budgets.heartbeat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let deadline = tokio::time::sleep(self.budgets.dispatch);
        tokio::pin!(deadline);

        let exec = self.executor.run(spec, cancel.clone());
        tokio::pin!(exec);

        loop {
            tokio::select! {
                res = &mut exec => return res,
                _ = heartbeat.tick() => {
                    if let Err(err) = self.engine.record_heartbeat(run_id).await {
                        warn!(%run_id, error = %err, "heartbeat failed");
                    }
                }
                _ = &mut deadline => {
                    return Err(OrchestratorError::StepTimeout {
                        step: "dispatch",
                        timeout_ms: self.budgets.dispatch.as_millis() as u64,
                    });
                }
            }
        }
    }

    async fn advance(&self, tracker: &mut StatusTracker, to: RunStatus) -> Result<()> {
        self.advance_with(tracker, to, None, None).await
    }

    /// Move the run forward, writing the new status through the store. A
    /// persistently failing write does not abort the run: in-memory state
    /// advances and the divergence is logged.
    async fn advance_with(
        &self,
        tracker: &mut StatusTracker,
        to: RunStatus,
        error_detail: Option<&str>,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        if tracker.status == to {
            return Ok(());
        }
        RunStateMachine::validate_transition(&tracker.status, &to)?;

        self.write_status(tracker, to, error_detail, end_time).await;

        let from = tracker.status;
        tracker.status = to;
        self.emit(Event::RunStatusChanged {
            run_id: tracker.run_id,
            task_id: tracker.task_id,
            from_status: from.as_str().to_string(),
            to_status: to.as_str().to_string(),
        });
        Ok(())
    }

    async fn write_status(
        &self,
        tracker: &mut StatusTracker,
        to: RunStatus,
        error_detail: Option<&str>,
        end_time: Option<DateTime<Utc>>,
    ) {
        let mut attempt: u32 = 0;
        loop {
            match self
                .store
                .update_run_status(tracker.run_id, to, error_detail, end_time)
                .await
            {
                Ok(()) => return,
                Err(err)
                    if err.kind() == ErrorKind::Persistence
                        && attempt + 1 < self.budgets.store_write_retries =>
                {
                    attempt += 1;
                    warn!(run_id = %tracker.run_id, attempt, error = %err, "run state write failed, retrying");
                    tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
                }
                Err(err) => {
                    warn!(
                        run_id = %tracker.run_id,
                        status = to.as_str(),
                        error = %err,
                        "run state write abandoned, in-memory state diverges from store"
                    );
                    tracker.diverged = true;
                    self.emit(Event::Error {
                        message: format!("state write abandoned at status {}", to.as_str()),
                        context: Some(format!("run {}", tracker.run_id)),
                    });
                    return;
                }
            }
        }
    }

    /// Best-effort terminal write on its own clock, so neither cancellation
    /// nor a hung store can keep a failed run out of its terminal status.
    async fn finalize_failed(&self, tracker: &mut StatusTracker, detail: &str) {
        let write = self.advance_with(tracker, RunStatus::Failed, Some(detail), Some(Utc::now()));
        match tokio::time::timeout(TERMINAL_WRITE_TIMEOUT, write).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(run_id = %tracker.run_id, error = %err, "failed-state write rejected")
            }
            Err(_) => warn!(run_id = %tracker.run_id, "failed-state write timed out"),
        }
    }

    async fn step<T>(
        &self,
        step: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.budgets.metadata, fut).await {
            Ok(res) => res,
            Err(_) => Err(OrchestratorError::StepTimeout {
                step,
                timeout_ms: self.budgets.metadata.as_millis() as u64,
            }),
        }
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.event_bus {
            bus.publish(EventEnvelope::new(event));
        }
    }
}
