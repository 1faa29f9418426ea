//! Typed pipeline specification.
//!
//! The spec is an ephemeral value: generated per run, serialized to the wire
//! shape consumed by the pipeline executor, never persisted. Each section is
//! a tagged variant validated at construction time rather than an untyped
//! map assembled at the boundary.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOGGING_LEVEL: &str = "INFO";
pub const DEFAULT_CODEC: &str = "lines";
pub const DEFAULT_STAGE_NAME: &str = "REPLICATION_STAGE";
pub const DEFAULT_FILE_NAME_PATTERN: &str = "${count}-${timestamp_unix_nano}.json.gz";
pub const DEFAULT_OUTPUT_PREFIX: &str = "output/";
pub const DEFAULT_BATCH_COUNT: u32 = 100;
pub const DEFAULT_BATCH_PERIOD: &str = "1s";

/// Input section, one variant per supported source kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputSpec {
    SqlSelect {
        dsn: String,
        query: String,
    },
    ObjectStore {
        bucket: String,
        /// Omitted from the wire when absent so the executor can infer it.
        #[serde(skip_serializing_if = "Option::is_none")]
        region: Option<String>,
        prefix: String,
    },
    LocalFile {
        paths: Vec<String>,
        codec: String,
    },
    WarehouseQuery {
        project: String,
        query: String,
    },
}

/// Output section, one variant per supported target kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputSpec {
    WarehouseLoad {
        account: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        user: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        database: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        schema: Option<String>,
        table: String,
        /// Passing credentials through the parameter string is insecure;
        /// included only when the profile supplies it.
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        stage_name: String,
        file_name_pattern: String,
    },
    ObjectStore {
        bucket: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        region: Option<String>,
        path_prefix: String,
        batching: Batching,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batching {
    pub count: u32,
    pub period: String,
}

impl Default for Batching {
    fn default() -> Self {
        Self {
            count: DEFAULT_BATCH_COUNT,
            period: DEFAULT_BATCH_PERIOD.to_string(),
        }
    }
}

/// A transformation step; the script is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Processor {
    pub script: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operational {
    pub logging_level: String,
    pub metrics_enabled: bool,
}

impl Default for Operational {
    fn default() -> Self {
        Self {
            logging_level: DEFAULT_LOGGING_LEVEL.to_string(),
            metrics_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub input: InputSpec,
    pub processors: Vec<Processor>,
    pub output: OutputSpec,
    pub operational: Operational,
}

#[derive(Serialize)]
struct WireSpec<'a> {
    input: &'a InputSpec,
    pipeline: WirePipeline<'a>,
    output: &'a OutputSpec,
    operational: &'a Operational,
}

#[derive(Serialize)]
struct WirePipeline<'a> {
    processors: &'a [Processor],
}

impl PipelineSpec {
    /// Serialize to the wire document consumed by the pipeline executor:
    /// `{input, pipeline: {processors}, output, operational}`. Field order is
    /// fixed by the struct definitions, so identical specs serialize to
    /// byte-identical documents.
    pub fn to_wire(&self) -> serde_json::Result<String> {
        serde_json::to_string(&WireSpec {
            input: &self.input,
            pipeline: WirePipeline {
                processors: &self.processors,
            },
            output: &self.output,
            operational: &self.operational,
        })
    }
}
