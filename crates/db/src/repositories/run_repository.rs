use crate::error::DbError;
use crate::models::{datetime_to_timestamp, RunRow};
use chrono::{DateTime, Utc};
use repli_core::{ReplicationRun, RunStatus};
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Clone)]
pub struct RunRepository {
    pool: SqlitePool,
}

impl RunRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, run: &ReplicationRun) -> Result<ReplicationRun, DbError> {
        let row = RunRow::from(run);

        sqlx::query(
            r#"
            INSERT INTO replication_runs
                (id, task_id, start_time, end_time, status, error_detail, correlation_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.task_id)
        .bind(row.start_time)
        .bind(row.end_time)
        .bind(&row.status)
        .bind(&row.error_detail)
        .bind(&row.correlation_id)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(run.clone())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ReplicationRun>, DbError> {
        let row: Option<RunRow> = sqlx::query_as(
            r#"
            SELECT id, task_id, start_time, end_time, status, error_detail, correlation_id, created_at
            FROM replication_runs
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    pub async fn find_by_task_id(&self, task_id: Uuid) -> Result<Vec<ReplicationRun>, DbError> {
        let rows: Vec<RunRow> = sqlx::query_as(
            r#"
            SELECT id, task_id, start_time, end_time, status, error_detail, correlation_id, created_at
            FROM replication_runs
            WHERE task_id = ?
            ORDER BY start_time DESC
            "#,
        )
        .bind(task_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }

    /// Write status, error detail, and end time in one statement. Writing the
    /// same values again is a no-op at the row level, so redundant retries of
    /// a terminal update are safe.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: RunStatus,
        error_detail: Option<&str>,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE replication_runs
            SET status = ?, error_detail = ?, end_time = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(error_detail)
        .bind(end_time.map(datetime_to_timestamp))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::RunNotFound(id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{ConnectionRepository, TaskRepository};
    use crate::{create_pool, run_migrations};
    use repli_core::{ConnectionKind, ConnectionProfile, ReplicationTask};

    async fn setup_test_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    async fn create_test_task(pool: &SqlitePool) -> ReplicationTask {
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
    async fn test_create_and_find_run() {
        let pool = setup_test_db().await;
        let task = create_test_task(&pool).await;
        let repo = RunRepository::new(pool);

        let run = ReplicationRun::new(task.id);
        repo.create(&run).await.unwrap();

        let found = repo.find_by_id(run.id).await.unwrap().unwrap();
        assert_eq!(found.task_id, task.id);
        assert_eq!(found.status, RunStatus::RunCreated);
        assert!(found.end_time.is_none());
    }

    #[tokio::test]
    async fn test_update_status_to_terminal() {
        let pool = setup_test_db().await;
        let task = create_test_task(&pool).await;
        let repo = RunRepository::new(pool);

        let run = ReplicationRun::new(task.id);
        repo.create(&run).await.unwrap();

        let end = Utc::now();
        repo.update_status(run.id, RunStatus::Failed, Some("boom"), Some(end))
            .await
            .unwrap();

        let found = repo.find_by_id(run.id).await.unwrap().unwrap();
        assert_eq!(found.status, RunStatus::Failed);
        assert_eq!(found.error_detail.as_deref(), Some("boom"));
        assert!(found.end_time.is_some());
    }

    #[tokio::test]
    async fn test_update_status_is_idempotent() {
        let pool = setup_test_db().await;
        let task = create_test_task(&pool).await;
        let repo = RunRepository::new(pool);

        let run = ReplicationRun::new(task.id);
        repo.create(&run).await.unwrap();

        let end = Utc::now();
        repo.update_status(run.id, RunStatus::Completed, None, Some(end))
            .await
            .unwrap();
        let first = repo.find_by_id(run.id).await.unwrap().unwrap();

        repo.update_status(run.id, RunStatus::Completed, None, Some(end))
            .await
            .unwrap();
        let second = repo.find_by_id(run.id).await.unwrap().unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(first.end_time, second.end_time);
        assert_eq!(first.error_detail, second.error_detail);
    }

    #[tokio::test]
    async fn test_update_status_missing_run() {
        let pool = setup_test_db().await;
        create_test_task(&pool).await;
        let repo = RunRepository::new(pool);

        let err = repo
            .update_status(Uuid::new_v4(), RunStatus::Running, None, None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_find_by_task_id_ordering() {
        let pool = setup_test_db().await;
        let task = create_test_task(&pool).await;
        let repo = RunRepository::new(pool);

        repo.create(&ReplicationRun::new(task.id)).await.unwrap();
        repo.create(&ReplicationRun::new(task.id)).await.unwrap();

        let runs = repo.find_by_task_id(task.id).await.unwrap();
        assert_eq!(runs.len(), 2);
    }

    #[tokio::test]
    async fn test_correlation_id_persisted() {
        let pool = setup_test_db().await;
        let task = create_test_task(&pool).await;
        let repo = RunRepository::new(pool);

        let run = ReplicationRun::new(task.id).with_correlation_id("engine-run-7");
        repo.create(&run).await.unwrap();

        let found = repo.find_by_id(run.id).await.unwrap().unwrap();
        assert_eq!(found.correlation_id.as_deref(), Some("engine-run-7"));
    }
}
