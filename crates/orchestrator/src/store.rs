//! SQLite-backed `RunStateStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use db::{ConnectionRepository, RunRepository, TaskRepository};
use repli_core::{
    ConnectionProfile, ReplicationRun, ReplicationTask, RunStatus, UpdateTaskRequest,
};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::collaborators::RunStateStore;
use crate::error::{OrchestratorError, Result};

/// Binds the collaborator interface to the repository layer. Read failures
/// map to transient unavailability; write failures map to persistence errors
/// so the runner can apply its bounded-retry policy.
pub struct SqlRunStateStore {
    connections: ConnectionRepository,
    tasks: TaskRepository,
    runs: RunRepository,
}

impl SqlRunStateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            connections: ConnectionRepository::new(pool.clone()),
            tasks: TaskRepository::new(pool.clone()),
            runs: RunRepository::new(pool),
        }
    }
}

fn read_err(err: db::DbError) -> OrchestratorError {
    OrchestratorError::from(err)
}

fn write_err(err: db::DbError) -> OrchestratorError {
    if err.is_not_found() {
        OrchestratorError::from(err)
    } else {
        OrchestratorError::Persistence(err.to_string())
    }
}

#[async_trait]
impl RunStateStore for SqlRunStateStore {
    async fn get_task(&self, id: Uuid) -> Result<ReplicationTask> {
        self.tasks
            .find_by_id(id)
            .await
            .map_err(read_err)?
            .ok_or(OrchestratorError::TaskNotFound(id))
    }

    async fn get_connection(&self, id: Uuid) -> Result<ConnectionProfile> {
        self.connections
            .find_by_id(id)
            .await
            .map_err(read_err)?
            .ok_or(OrchestratorError::ConnectionNotFound(id))
    }

    async fn create_run(
        &self,
        task_id: Uuid,
        correlation_id: Option<&str>,
    ) -> Result<ReplicationRun> {
        let mut run = ReplicationRun::new(task_id);
        if let Some(correlation_id) = correlation_id {
            run = run.with_correlation_id(correlation_id);
        }
        self.runs.create(&run).await.map_err(write_err)
    }

    async fn get_run(&self, id: Uuid) -> Result<ReplicationRun> {
        self.runs
            .find_by_id(id)
            .await
            .map_err(read_err)?
            .ok_or(OrchestratorError::RunNotFound(id))
    }

    async fn update_run_status(
        &self,
        id: Uuid,
        status: RunStatus,
        error_detail: Option<&str>,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.runs
            .update_status(id, status, error_detail, end_time)
            .await
            .map_err(write_err)
    }

    async fn list_runs(&self, task_id: Uuid) -> Result<Vec<ReplicationRun>> {
        self.runs.find_by_task_id(task_id).await.map_err(read_err)
    }

    async fn set_task_workflow_id(&self, task_id: Uuid, workflow_id: &str) -> Result<()> {
        let update = UpdateTaskRequest {
            workflow_id: Some(workflow_id.to_string()),
            ..Default::default()
        };
        self.tasks
            .update(task_id, &update)
            .await
            .map_err(write_err)?
            .ok_or(OrchestratorError::TaskNotFound(task_id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::{create_pool, run_migrations};
    use repli_core::{ConnectionKind, TaskStatus};

    async fn setup_store() -> (SqlRunStateStore, SqlitePool) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        (SqlRunStateStore::new(pool.clone()), pool)
    }

    async fn seed_task(pool: &SqlitePool) -> ReplicationTask {
        let conn_repo = ConnectionRepository::new(pool.clone());
        let source = ConnectionProfile::new("src", ConnectionKind::SqlLike, "dsn=x");
        let target = ConnectionProfile::new("dst", ConnectionKind::ObjectStore, "bucket=b");
        conn_repo.create(&source).await.unwrap();
        conn_repo.create(&target).await.unwrap();

        let task_repo = TaskRepository::new(pool.clone());
        let task = ReplicationTask::new("t", source.id, target.id);
        task_repo.create(&task).await.unwrap();
        task
    }

    #[tokio::test]
    async fn test_get_task_not_found() {
        let (store, _pool) = setup_store().await;
        let id = Uuid::new_v4();
        let err = store.get_task(id).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::TaskNotFound(found) if found == id));
    }

    #[tokio::test]
    async fn test_create_and_update_run() {
        let (store, pool) = setup_store().await;
        let task = seed_task(&pool).await;

        let run = store.create_run(task.id, None).await.unwrap();
        assert_eq!(run.status, RunStatus::RunCreated);
        assert!(run.correlation_id.is_none());

        store
            .update_run_status(run.id, RunStatus::ConfigGenerated, None, None)
            .await
            .unwrap();

        let found = store.get_run(run.id).await.unwrap();
        assert_eq!(found.status, RunStatus::ConfigGenerated);
    }

    #[tokio::test]
    async fn test_update_missing_run_maps_to_not_found() {
        let (store, pool) = setup_store().await;
        seed_task(&pool).await;

        let err = store
            .update_run_status(Uuid::new_v4(), RunStatus::Failed, Some("x"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::RunNotFound(_)));
    }

    #[tokio::test]
    async fn test_set_task_workflow_id() {
        let (store, pool) = setup_store().await;
        let task = seed_task(&pool).await;

        store.set_task_workflow_id(task.id, "wf-1").await.unwrap();

        let found = store.get_task(task.id).await.unwrap();
        assert_eq!(found.workflow_id.as_deref(), Some("wf-1"));
        assert_eq!(found.status, TaskStatus::Active);
    }

    #[tokio::test]
    async fn test_list_runs_for_task() {
        let (store, pool) = setup_store().await;
        let task = seed_task(&pool).await;

        store.create_run(task.id, None).await.unwrap();
        store.create_run(task.id, None).await.unwrap();

        let runs = store.list_runs(task.id).await.unwrap();
        assert_eq!(runs.len(), 2);
    }

    #[tokio::test]
    async fn test_create_run_records_correlation_id() {
        let (store, pool) = setup_store().await;
        let task = seed_task(&pool).await;

        let run = store
            .create_run(task.id, Some("engine-exec-12"))
            .await
            .unwrap();

        let found = store.get_run(run.id).await.unwrap();
        assert_eq!(found.correlation_id.as_deref(), Some("engine-exec-12"));
    }
}
