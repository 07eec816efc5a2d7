//! Reasoning output queries.
//!
//! After every data message the configured output queries are run on the reasoner. Their
//! SPARQL JSON answers are flattened into rows whose variable names are data point paths
//! (`Vehicle_Powertrain_IsLow` stands for `Vehicle.Powertrain.IsLow`), grouped by schema
//! collection, stored as JSON and sent back to the information layer.

use super::ReasonerPort;
use crate::config::ModelConfig;
use crate::error::{ConnectorError, Result};
use crate::files::FilePort;
use crate::rdf::query::{QueryLanguage, ResultFormat};
use chrono::Utc;
use log::{debug, error, warn};
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Section holding the nested answers when they are reported as inference results.
pub const INFERENCE_RESULTS_KEY: &str = "AI.Reasoner.InferenceResults";

const OUTPUT_FILE_PREFIX: &str = "gen_from_sparql_query_";

#[derive(Debug, Deserialize)]
struct SparqlJson {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<BTreeMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

/// Runs the reasoning output queries and shapes their answers.
#[derive(Debug, Clone)]
pub struct ReasoningQueryService {
    queries: Vec<(QueryLanguage, String)>,
    inference_results: bool,
    output_dir: Option<String>,
}

impl ReasoningQueryService {
    pub fn new(
        queries: Vec<(QueryLanguage, String)>,
        inference_results: bool,
        output_dir: Option<String>,
    ) -> Self {
        Self { queries, inference_results, output_dir }
    }

    /// The service of the model, or `None` when it configures no output queries.
    pub fn from_config<F: FilePort + ?Sized>(
        config: &ModelConfig,
        files: &F,
    ) -> Result<Option<Self>> {
        let queries = config.reasoning_output_queries(files)?;
        if queries.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::new(
            queries,
            config.reasoner_settings.is_ai_reasoner_inference_results,
            Some(config.reasoning_output_dir()),
        )))
    }

    pub fn queries(&self) -> &[(QueryLanguage, String)] {
        &self.queries
    }

    /// Answers of every query, one grouped object per result row. A failing query is
    /// logged and contributes nothing.
    pub fn process_reasoning_queries<R, F>(&self, reasoner: &R, files: &mut F) -> Vec<Value>
    where
        R: ReasonerPort + ?Sized,
        F: FilePort + ?Sized,
    {
        let mut results = Vec::new();
        for query in &self.queries {
            match self.process_reasoning_query(reasoner, files, query) {
                Ok(grouped) => results.extend(grouped),
                Err(e) => error!("Error processing reasoning query: {}", e),
            }
        }
        results
    }

    pub fn process_reasoning_query<R, F>(
        &self,
        reasoner: &R,
        files: &mut F,
        query: &(QueryLanguage, String),
    ) -> Result<Vec<Value>>
    where
        R: ReasonerPort + ?Sized,
        F: FilePort + ?Sized,
    {
        let answer = reasoner.query_data_as(&query.1, query.0, ResultFormat::SparqlJson);
        let rows = parse_sparql_json(&answer)?;
        let grouped = group_by_schema(rows, self.inference_results);

        if let (false, Some(dir)) = (grouped.is_empty(), self.output_dir.as_deref()) {
            let path = format!("{}{}{}.json", dir, OUTPUT_FILE_PREFIX, Utc::now().format("%H%M%S"));
            let content = serde_json::to_string_pretty(&grouped)?;
            files.write_file(&path, &content, false)?;
            debug!("Reasoning output stored in '{}'", path);
        }
        Ok(grouped)
    }
}

/// Rows of a SPARQL JSON answer. Variable names get `_` replaced by `.` and values are
/// typed with [`detect_type`].
pub fn parse_sparql_json(answer: &str) -> Result<Vec<Map<String, Value>>> {
    let parsed: SparqlJson = serde_json::from_str(answer).map_err(|e| {
        ConnectorError::InvalidArgument(format!("Invalid SPARQL JSON response: {}", e))
    })?;

    Ok(parsed
        .results
        .bindings
        .into_iter()
        .map(|binding| {
            binding
                .into_iter()
                .map(|(name, term)| (name.replace('_', "."), detect_type(&term.value)))
                .collect::<Map<String, Value>>()
        })
        .collect())
}

/// Splits every key of a row at its first `.` into schema and data point and nests the
/// values per schema. Keys without a schema are dropped.
pub fn group_by_schema(rows: Vec<Map<String, Value>>, inference_results: bool) -> Vec<Value> {
    let mut grouped_rows = Vec::new();
    for row in rows {
        let mut schemas: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
        for (key, value) in row {
            let Some((schema, data_point)) = key.split_once('.') else {
                warn!("No schema found for reasoning result key '{}'", key);
                continue;
            };
            schemas.entry(schema.to_string()).or_default().insert(data_point.to_string(), value);
        }
        if schemas.is_empty() {
            continue;
        }

        let grouped: Map<String, Value> = schemas
            .into_iter()
            .map(|(schema, data_points)| {
                let section = if inference_results {
                    let mut section = Map::new();
                    section.insert(
                        INFERENCE_RESULTS_KEY.to_string(),
                        Value::String(Value::Object(data_points).to_string()),
                    );
                    section
                } else {
                    data_points
                };
                (schema, Value::Object(section))
            })
            .collect();
        grouped_rows.push(Value::Object(grouped));
    }
    grouped_rows
}

/// Booleans and numbers become JSON booleans and numbers, anything else stays a string.
pub fn detect_type(value: &str) -> Value {
    match value {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(integer) = value.parse::<i64>() {
        return Value::Number(integer.into());
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(value.to_string()), Value::Number)
}
