use crate::error::DbError;
use crate::models::ConnectionRow;
use chrono::Utc;
use repli_core::{ConnectionProfile, UpdateConnectionRequest};
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ConnectionRepository {
    pool: SqlitePool,
}

impl ConnectionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, conn: &ConnectionProfile) -> Result<ConnectionProfile, DbError> {
        let row = ConnectionRow::from(conn);

        sqlx::query(
            r#"
            INSERT INTO connections (id, name, kind, params, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.kind)
        .bind(&row.params)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(conn.clone())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ConnectionProfile>, DbError> {
        let row: Option<ConnectionRow> = sqlx::query_as(
            r#"
            SELECT id, name, kind, params, created_at, updated_at
            FROM connections
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_domain()).transpose()
    }

    pub async fn find_all(&self) -> Result<Vec<ConnectionProfile>, DbError> {
        let rows: Vec<ConnectionRow> = sqlx::query_as(
            r#"
            SELECT id, name, kind, params, created_at, updated_at
            FROM connections
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ConnectionRow::into_domain).collect()
    }

    pub async fn update(
        &self,
        id: Uuid,
        update: &UpdateConnectionRequest,
    ) -> Result<Option<ConnectionProfile>, DbError> {
        let existing = self.find_by_id(id).await?;
        let Some(mut conn) = existing else {
            return Ok(None);
        };

        if let Some(name) = &update.name {
            conn.name = name.clone();
        }
        if let Some(params) = &update.params {
            conn.params = params.clone();
        }

        conn.updated_at = Utc::now();
        let row = ConnectionRow::from(&conn);

        sqlx::query(
            r#"
            UPDATE connections
            SET name = ?, params = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&row.name)
        .bind(&row.params)
        .bind(row.updated_at)
        .bind(&row.id)
        .execute(&self.pool)
        .await?;

        Ok(Some(conn))
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM connections WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use repli_core::ConnectionKind;

    async fn setup_test_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_find_connection() {
        let pool = setup_test_db().await;
        let repo = ConnectionRepository::new(pool);

        let conn = ConnectionProfile::new("source", ConnectionKind::SqlLike, "dsn=postgres://x");
        let created = repo.create(&conn).await.unwrap();

        assert_eq!(created.name, "source");

        let found = repo.find_by_id(conn.id).await.unwrap().unwrap();
        assert_eq!(found.kind, ConnectionKind::SqlLike);
        assert_eq!(found.params, "dsn=postgres://x");
    }

    #[tokio::test]
    async fn test_update_connection_params() {
        let pool = setup_test_db().await;
        let repo = ConnectionRepository::new(pool);

        let conn = ConnectionProfile::new("target", ConnectionKind::ObjectStore, "bucket=a");
        repo.create(&conn).await.unwrap();

        let update = UpdateConnectionRequest {
            params: Some("bucket=b;region=eu-west-1".to_string()),
            ..Default::default()
        };
        let updated = repo.update(conn.id, &update).await.unwrap().unwrap();

        assert_eq!(updated.params, "bucket=b;region=eu-west-1");
        assert_eq!(updated.name, "target");
    }

    #[tokio::test]
    async fn test_update_missing_connection() {
        let pool = setup_test_db().await;
        let repo = ConnectionRepository::new(pool);

        let updated = repo
            .update(Uuid::new_v4(), &UpdateConnectionRequest::default())
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_stored_kind_is_surfaced() {
        let pool = setup_test_db().await;
        let repo = ConnectionRepository::new(pool.clone());

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO connections (id, name, kind, params, created_at, updated_at)
            VALUES (?, 'legacy', 'postgres', '', 0, 0)
            "#,
        )
        .bind(id.to_string())
        .execute(&pool)
        .await
        .unwrap();

        let err = repo.find_by_id(id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Decode {
                column: "connections.kind",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_delete_connection() {
        let pool = setup_test_db().await;
        let repo = ConnectionRepository::new(pool);

        let conn = ConnectionProfile::new("tmp", ConnectionKind::LocalFile, "");
        repo.create(&conn).await.unwrap();

        assert!(repo.delete(conn.id).await.unwrap());
        assert!(repo.find_by_id(conn.id).await.unwrap().is_none());
    }
}
