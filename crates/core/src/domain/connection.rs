use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of systems a connection can describe. The kind fixes which
/// parameters are required, but that is only checked when a pipeline spec
/// is generated, not when the profile is stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    SqlLike,
    ObjectStore,
    LocalFile,
    WarehouseQuery,
    WarehouseLoad,
}

impl ConnectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlLike => "sql_like",
            Self::ObjectStore => "object_store",
            Self::LocalFile => "local_file",
            Self::WarehouseQuery => "warehouse_query",
            Self::WarehouseLoad => "warehouse_load",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sql_like" => Some(Self::SqlLike),
            "object_store" => Some(Self::ObjectStore),
            "local_file" => Some(Self::LocalFile),
            "warehouse_query" => Some(Self::WarehouseQuery),
            "warehouse_load" => Some(Self::WarehouseLoad),
            _ => None,
        }
    }
}

/// Stored description of how to reach a source or target system.
///
/// `params` is an opaque `key=value;key=value` string; it is parsed into a
/// map by the config generator and may contain credentials, so it must never
/// be echoed into logs or error messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub id: Uuid,
    pub name: String,
    pub kind: ConnectionKind,
    pub params: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConnectionProfile {
    pub fn new(name: impl Into<String>, kind: ConnectionKind, params: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            params: params.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConnectionRequest {
    pub name: String,
    pub kind: ConnectionKind,
    pub params: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateConnectionRequest {
    pub name: Option<String>,
    pub params: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_creation() {
        let conn = ConnectionProfile::new(
            "warehouse",
            ConnectionKind::WarehouseLoad,
            "account=acc;table=t",
        );

        assert_eq!(conn.name, "warehouse");
        assert_eq!(conn.kind, ConnectionKind::WarehouseLoad);
        assert_eq!(conn.params, "account=acc;table=t");
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(ConnectionKind::SqlLike.as_str(), "sql_like");
        assert_eq!(ConnectionKind::ObjectStore.as_str(), "object_store");
        assert_eq!(ConnectionKind::WarehouseLoad.as_str(), "warehouse_load");
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(
            ConnectionKind::parse("local_file"),
            Some(ConnectionKind::LocalFile)
        );
        assert_eq!(
            ConnectionKind::parse("warehouse_query"),
            Some(ConnectionKind::WarehouseQuery)
        );
        assert_eq!(ConnectionKind::parse("postgres"), None);
    }

    #[test]
    fn test_connection_with_id() {
        let id = Uuid::new_v4();
        let conn = ConnectionProfile::new("c", ConnectionKind::LocalFile, "").with_id(id);

        assert_eq!(conn.id, id);
    }
}
