use crate::error::DbError;
use crate::models::TaskRow;
use chrono::Utc;
use repli_core::{ReplicationTask, UpdateTaskRequest};
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Clone)]
pub struct TaskRepository {
    pool: SqlitePool,
}

impl TaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, task: &ReplicationTask) -> Result<ReplicationTask, DbError> {
        let row = TaskRow::from(task);

        sqlx::query(
            r#"
            INSERT INTO replication_tasks
                (id, name, source_connection_id, target_connection_id, selection_criteria,
                 transformation_script, schedule, workflow_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.source_connection_id)
        .bind(&row.target_connection_id)
        .bind(&row.selection_criteria)
        .bind(&row.transformation_script)
        .bind(&row.schedule)
        .bind(&row.workflow_id)
        .bind(&row.status)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(task.clone())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ReplicationTask>, DbError> {
        let row: Option<TaskRow> = sqlx::query_as(
            r#"
            SELECT id, name, source_connection_id, target_connection_id, selection_criteria,
                   transformation_script, schedule, workflow_id, status, created_at, updated_at
            FROM replication_tasks
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    pub async fn find_all(&self) -> Result<Vec<ReplicationTask>, DbError> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            r#"
            SELECT id, name, source_connection_id, target_connection_id, selection_criteria,
                   transformation_script, schedule, workflow_id, status, created_at, updated_at
            FROM replication_tasks
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }

    pub async fn update(
        &self,
        id: Uuid,
        update: &UpdateTaskRequest,
    ) -> Result<Option<ReplicationTask>, DbError> {
        let existing = self.find_by_id(id).await?;
        let Some(mut task) = existing else {
            return Ok(None);
        };

        if let Some(name) = &update.name {
            task.name = name.clone();
        }
        if let Some(criteria) = &update.selection_criteria {
            task.selection_criteria = criteria.clone();
        }
        if let Some(script) = &update.transformation_script {
            task.transformation_script = script.clone();
        }
        if let Some(schedule) = &update.schedule {
            task.schedule = schedule.clone();
        }
        if let Some(status) = &update.status {
            task.status = *status;
        }
        if let Some(workflow_id) = &update.workflow_id {
            task.workflow_id = Some(workflow_id.clone());
        }

        task.updated_at = Utc::now();
        let row = TaskRow::from(&task);

        sqlx::query(
            r#"
            UPDATE replication_tasks
            SET name = ?, selection_criteria = ?, transformation_script = ?, schedule = ?,
                workflow_id = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&row.name)
        .bind(&row.selection_criteria)
        .bind(&row.transformation_script)
        .bind(&row.schedule)
        .bind(&row.workflow_id)
        .bind(&row.status)
        .bind(row.updated_at)
        .bind(&row.id)
        .execute(&self.pool)
        .await?;

        Ok(Some(task))
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM replication_tasks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::ConnectionRepository;
    use crate::{create_pool, run_migrations};
    use repli_core::{ConnectionKind, ConnectionProfile, TaskStatus};

    async fn setup_test_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    async fn create_test_connections(pool: &SqlitePool) -> (ConnectionProfile, ConnectionProfile) {
        let repo = ConnectionRepository::new(pool.clone());
        let source = ConnectionProfile::new("src", ConnectionKind::SqlLike, "dsn=x");
        let target = ConnectionProfile::new("dst", ConnectionKind::ObjectStore, "bucket=b");
        repo.create(&source).await.unwrap();
        repo.create(&target).await.unwrap();
        (source, target)
    }

    #[tokio::test]
    async fn test_create_and_find_task() {
        let pool = setup_test_db().await;
        let (source, target) = create_test_connections(&pool).await;
        let repo = TaskRepository::new(pool);

        let task = ReplicationTask::new("Nightly sync", source.id, target.id)
            .with_selection_criteria("SELECT * FROM orders");
        repo.create(&task).await.unwrap();

        let found = repo.find_by_id(task.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Nightly sync");
        assert_eq!(found.source_connection_id, source.id);
        assert_eq!(found.selection_criteria, "SELECT * FROM orders");
    }

    #[tokio::test]
    async fn test_update_task_status_and_workflow_id() {
        let pool = setup_test_db().await;
        let (source, target) = create_test_connections(&pool).await;
        let repo = TaskRepository::new(pool);

        let task = ReplicationTask::new("t", source.id, target.id);
        repo.create(&task).await.unwrap();

        let update = UpdateTaskRequest {
            status: Some(TaskStatus::Inactive),
            workflow_id: Some("wf-42".to_string()),
            ..Default::default()
        };
        let updated = repo.update(task.id, &update).await.unwrap().unwrap();

        assert_eq!(updated.status, TaskStatus::Inactive);
        assert_eq!(updated.workflow_id.as_deref(), Some("wf-42"));
    }

    #[tokio::test]
    async fn test_find_all_tasks() {
        let pool = setup_test_db().await;
        let (source, target) = create_test_connections(&pool).await;
        let repo = TaskRepository::new(pool);

        repo.create(&ReplicationTask::new("a", source.id, target.id))
            .await
            .unwrap();
        repo.create(&ReplicationTask::new("b", source.id, target.id))
            .await
            .unwrap();

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_task() {
        let pool = setup_test_db().await;
        let (source, target) = create_test_connections(&pool).await;
        let repo = TaskRepository::new(pool);

        let task = ReplicationTask::new("gone", source.id, target.id);
        repo.create(&task).await.unwrap();

        assert!(repo.delete(task.id).await.unwrap());
        assert!(repo.find_by_id(task.id).await.unwrap().is_none());
    }
}
