use repli_core::{ConnectionKind, ConnectionProfile};
use uuid::Uuid;

use super::{datetime_to_timestamp, timestamp_to_datetime};
use crate::error::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConnectionRow {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub params: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ConnectionRow {
    /// A kind outside the closed set means the row was written by something
    /// newer than this binary, or tampered with; guessing a kind here would
    /// drive generation of a wrong pipeline, so it is surfaced instead.
    pub fn into_domain(self) -> Result<ConnectionProfile, DbError> {
        let kind = ConnectionKind::parse(&self.kind).ok_or_else(|| DbError::Decode {
            column: "connections.kind",
            value: self.kind.clone(),
        })?;

        Ok(ConnectionProfile {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            name: self.name,
            kind,
            params: self.params,
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        })
    }
}

impl From<&ConnectionProfile> for ConnectionRow {
    fn from(conn: &ConnectionProfile) -> Self {
        Self {
            id: conn.id.to_string(),
            name: conn.name.clone(),
            kind: conn.kind.as_str().to_string(),
            params: conn.params.clone(),
            created_at: datetime_to_timestamp(conn.created_at),
            updated_at: datetime_to_timestamp(conn.updated_at),
        }
    }
}
