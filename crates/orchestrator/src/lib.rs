pub mod collaborators;
pub mod error;
pub mod generator;
pub mod params;
pub mod runner;
pub mod service;
pub mod spec;
pub mod state_machine;
pub mod store;

pub use collaborators::{ExecutionReport, PipelineExecutor, RunStateStore, WorkflowEngine};
pub use error::{ErrorKind, OrchestratorError, Result};
pub use generator::ConfigGenerator;
pub use runner::{Orchestrator, RunOutcome, StepBudgets};
pub use service::ReplicationService;
pub use spec::{InputSpec, OutputSpec, PipelineSpec};
pub use state_machine::RunStateMachine;
pub use store::SqlRunStateStore;
