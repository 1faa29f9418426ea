//! Pipeline spec generation.
//!
//! Maps a (task, source connection, target connection) triple to a typed
//! `PipelineSpec`, validating that the parameters each connection kind
//! requires are present. Generation is pure and deterministic: identical
//! inputs yield identical specs, so a retried generation step is
//! side-effect-free.
//!
//! Validation errors name the missing parameter and the connection id but
//! never echo parameter values, which may carry credentials.

use repli_core::{ConnectionKind, ConnectionProfile, ReplicationTask};
use tracing::warn;

use crate::error::{OrchestratorError, Result};
use crate::params::parse_params;
use crate::spec::{
    Batching, InputSpec, Operational, OutputSpec, PipelineSpec, Processor, DEFAULT_CODEC,
    DEFAULT_FILE_NAME_PATTERN, DEFAULT_OUTPUT_PREFIX, DEFAULT_STAGE_NAME,
};

pub struct ConfigGenerator;

impl ConfigGenerator {
    /// Assemble a full pipeline spec, failing fast on the first invalid
    /// section. Never returns a partially-built spec.
    pub fn generate(
        task: &ReplicationTask,
        source: &ConnectionProfile,
        target: &ConnectionProfile,
    ) -> Result<PipelineSpec> {
        let input = Self::generate_input(source, task)?;
        let output = Self::generate_output(target, task)?;

        let processors = if task.transformation_script.is_empty() {
            Vec::new()
        } else {
            vec![Processor {
                script: task.transformation_script.clone(),
            }]
        };

        Ok(PipelineSpec {
            input,
            processors,
            output,
            operational: Operational::default(),
        })
    }

    fn generate_input(conn: &ConnectionProfile, task: &ReplicationTask) -> Result<InputSpec> {
        let params = parse_params(&conn.params);

        match conn.kind {
            ConnectionKind::SqlLike => {
                let dsn = params.get("dsn").ok_or_else(|| {
                    OrchestratorError::Validation(format!(
                        "missing required parameter 'dsn' for sql_like source connection {}",
                        conn.id
                    ))
                })?;
                if task.selection_criteria.is_empty() {
                    return Err(OrchestratorError::Validation(format!(
                        "empty query: selection criteria is required for sql_like source connection {}",
                        conn.id
                    )));
                }
                Ok(InputSpec::SqlSelect {
                    dsn: dsn.clone(),
                    query: task.selection_criteria.clone(),
                })
            }
            ConnectionKind::ObjectStore => {
                let bucket = params.get("bucket").ok_or_else(|| {
                    OrchestratorError::Validation(format!(
                        "missing required parameter 'bucket' for object_store source connection {}",
                        conn.id
                    ))
                })?;
                Ok(InputSpec::ObjectStore {
                    bucket: bucket.clone(),
                    // Absent region is left out so the executor can infer it.
                    region: params.get("region").cloned(),
                    prefix: task.selection_criteria.clone(),
                })
            }
            ConnectionKind::LocalFile => {
                let paths: Vec<String> = task
                    .selection_criteria
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect();
                if paths.is_empty() {
                    return Err(OrchestratorError::Validation(format!(
                        "selection criteria (file paths) cannot be empty for local_file source connection {}",
                        conn.id
                    )));
                }
                let codec = params
                    .get("codec")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_CODEC.to_string());
                Ok(InputSpec::LocalFile { paths, codec })
            }
            ConnectionKind::WarehouseQuery => {
                let project = params.get("project").ok_or_else(|| {
                    OrchestratorError::Validation(format!(
                        "missing required parameter 'project' for warehouse_query source connection {}",
                        conn.id
                    ))
                })?;
                if task.selection_criteria.is_empty() {
                    return Err(OrchestratorError::Validation(format!(
                        "empty query: selection criteria is required for warehouse_query source connection {}",
                        conn.id
                    )));
                }
                Ok(InputSpec::WarehouseQuery {
                    project: project.clone(),
                    query: task.selection_criteria.clone(),
                })
            }
            ConnectionKind::WarehouseLoad => Err(OrchestratorError::Validation(format!(
                "unsupported source kind: {} (connection {})",
                conn.kind.as_str(),
                conn.id
            ))),
        }
    }

    fn generate_output(conn: &ConnectionProfile, _task: &ReplicationTask) -> Result<OutputSpec> {
        let params = parse_params(&conn.params);

        match conn.kind {
            ConnectionKind::WarehouseLoad => {
                let account = params.get("account").ok_or_else(|| {
                    OrchestratorError::Validation(format!(
                        "missing required parameter 'account' for warehouse_load target connection {}",
                        conn.id
                    ))
                })?;
                let table = params.get("table").ok_or_else(|| {
                    OrchestratorError::Validation(format!(
                        "missing required parameter 'table' for warehouse_load target connection {}",
                        conn.id
                    ))
                })?;
                let password = params.get("password").cloned();
                if password.is_some() {
                    warn!(
                        connection_id = %conn.id,
                        "password supplied via connection parameters; prefer externally managed credentials"
                    );
                }
                Ok(OutputSpec::WarehouseLoad {
                    account: account.clone(),
                    user: params.get("user").cloned(),
                    database: params.get("database").cloned(),
                    schema: params.get("schema").cloned(),
                    table: table.clone(),
                    password,
                    stage_name: DEFAULT_STAGE_NAME.to_string(),
                    file_name_pattern: DEFAULT_FILE_NAME_PATTERN.to_string(),
                })
            }
            ConnectionKind::ObjectStore => {
                let bucket = params.get("bucket").ok_or_else(|| {
                    OrchestratorError::Validation(format!(
                        "missing required parameter 'bucket' for object_store target connection {}",
                        conn.id
                    ))
                })?;
                let path_prefix = params
                    .get("path_prefix")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string());
                Ok(OutputSpec::ObjectStore {
                    bucket: bucket.clone(),
                    region: params.get("region").cloned(),
                    path_prefix,
                    batching: Batching::default(),
                })
            }
            ConnectionKind::SqlLike | ConnectionKind::LocalFile | ConnectionKind::WarehouseQuery => {
                Err(OrchestratorError::Validation(format!(
                    "unsupported target kind: {} (connection {})",
                    conn.kind.as_str(),
                    conn.id
                )))
            }
        }
    }
}
