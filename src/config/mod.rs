//! Model configuration (JSON) and process settings (command line and environment).

pub mod system;

pub use system::SystemConfig;

use crate::core::SchemaType;
use crate::error::{ConnectorError, Result};
use crate::files::FilePort;
use crate::geo::Wgs84Coord;
use crate::rdf::query::{PropertyType, QueryLanguage, QueryPair};
use crate::rdf::RdfSyntax;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const INPUT_SUFFIX: &str = "_data";
const REASONING_OUTPUT_DIR: &str = "reasoning_output/";

/// Supported data points of a schema, listed inline or in a file with one point per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataPointSource {
    Inline(Vec<String>),
    File(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueriesConfig {
    /// Schema key, or `default`, to helper query files
    #[serde(default)]
    pub triple_assembler_helper: BTreeMap<String, Vec<String>>,
    /// Directory of the queries whose answers are sent back to the information layer
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonerSettings {
    #[serde(default = "default_inference_engine")]
    pub inference_engine: String,
    pub output_format: String,
    pub supported_schema_collections: Vec<String>,
    /// Nest reasoning answers under `AI.Reasoner.InferenceResults` as a JSON string
    #[serde(default)]
    pub is_ai_reasoner_inference_results: bool,
}

fn default_inference_engine() -> String {
    "RDFox".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneOrigin {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<ZoneOrigin> for Wgs84Coord {
    fn from(origin: ZoneOrigin) -> Self {
        Wgs84Coord::new(origin.latitude, origin.longitude)
    }
}

/// Ontology model, helper queries and output settings of the connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub inputs: BTreeMap<String, DataPointSource>,
    /// Schema key to the instance id subscribed to at start-up
    #[serde(default)]
    pub object_id: BTreeMap<String, String>,
    #[serde(default)]
    pub ontologies: Vec<String>,
    #[serde(default)]
    pub shacl_shapes: Vec<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    /// Prefix of the generated output files, usually a directory ending in `/`
    pub output: String,
    #[serde(default)]
    pub queries: QueriesConfig,
    pub reasoner_settings: ReasonerSettings,
    #[serde(default)]
    pub zone_origin: Option<ZoneOrigin>,
}

impl ModelConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<F: FilePort + ?Sized>(files: &F, path: &str) -> Result<Self> {
        let content = files.read_file(path).map_err(|e| {
            ConnectorError::Configuration(format!("Cannot read model config '{}': {}", path, e))
        })?;
        let config = Self::from_json(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn output_syntax(&self) -> Result<RdfSyntax> {
        let syntax = RdfSyntax::from_string(&self.reasoner_settings.output_format)?;
        syntax.file_extension()?;
        Ok(syntax)
    }

    pub fn supported_schemas(&self) -> Vec<SchemaType> {
        self.reasoner_settings
            .supported_schema_collections
            .iter()
            .map(|name| SchemaType::parse(name))
            .collect()
    }

    pub fn zone_origin(&self) -> Option<Wgs84Coord> {
        self.zone_origin.map(Wgs84Coord::from)
    }

    /// Checks that the output syntax can be produced and that every supported schema
    /// resolves to both helper queries, directly or through `default`.
    pub fn validate(&self) -> Result<()> {
        self.output_syntax()?;

        if self.output.is_empty() {
            return Err(ConnectorError::Configuration("Output path is not set".to_string()));
        }
        if self.reasoner_settings.supported_schema_collections.is_empty() {
            return Err(ConnectorError::Configuration(
                "No supported schema collections configured".to_string(),
            ));
        }

        for schema in self.supported_schemas() {
            for property_type in [PropertyType::Data, PropertyType::Object] {
                if self.query_file(&schema, property_type).is_none() {
                    return Err(ConnectorError::Configuration(format!(
                        "No {} query configured for '{}'",
                        property_type.file_marker(),
                        schema.key()
                    )));
                }
            }
        }
        Ok(())
    }

    /// The helper query file of `schema`, falling back to the `default` entry.
    pub fn query_file(&self, schema: &SchemaType, property_type: PropertyType) -> Option<&str> {
        let marker = property_type.file_marker();
        let find = |key: &str| {
            self.queries
                .triple_assembler_helper
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .and_then(|(_, paths)| paths.iter().find(|path| path.contains(&marker)))
                .map(String::as_str)
        };
        find(&schema.key()).or_else(|| find(&SchemaType::Default.key()))
    }

    /// Reads the helper queries of every configured key.
    pub fn query_pairs<F: FilePort + ?Sized>(
        &self,
        files: &F,
    ) -> Result<BTreeMap<SchemaType, QueryPair>> {
        let mut pairs = BTreeMap::new();
        for key in self.queries.triple_assembler_helper.keys() {
            let schema = SchemaType::parse(key);
            let data = self.read_query(files, &schema, PropertyType::Data)?;
            let object = self.read_query(files, &schema, PropertyType::Object)?;
            pairs.insert(schema, QueryPair::sparql(data, object));
        }
        Ok(pairs)
    }

    /// Supported data points per schema, read from files where configured so.
    pub fn supported_data_points<F: FilePort + ?Sized>(
        &self,
        files: &F,
    ) -> Result<BTreeMap<SchemaType, Vec<String>>> {
        let mut data_points = BTreeMap::new();
        for (key, source) in &self.inputs {
            let schema = SchemaType::parse(key.strip_suffix(INPUT_SUFFIX).unwrap_or(key));
            let points = match source {
                DataPointSource::Inline(points) => points.clone(),
                DataPointSource::File(path) => files
                    .read_file(path)?
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect(),
            };
            data_points.insert(schema, points);
        }
        Ok(data_points)
    }

    /// Reads every query file of the reasoning output directory, in file name order.
    /// Files of unknown languages are skipped. Without a configured directory there are
    /// no reasoning queries.
    pub fn reasoning_output_queries<F: FilePort + ?Sized>(
        &self,
        files: &F,
    ) -> Result<Vec<(QueryLanguage, String)>> {
        let Some(directory) = self.queries.output.as_deref() else {
            return Ok(Vec::new());
        };
        let directory = directory.trim_end_matches('/');
        let mut names = files.read_directory(directory).map_err(|e| {
            ConnectorError::Configuration(format!(
                "Cannot list reasoning output queries in '{}': {}",
                directory, e
            ))
        })?;
        names.sort();

        let mut queries = Vec::new();
        for name in names {
            let Some(language) = QueryLanguage::from_path(&name) else {
                warn!("Skipping '{}/{}', not a query file", directory, name);
                continue;
            };
            let path = format!("{}/{}", directory, name);
            let query = files.read_file(&path).map_err(|e| {
                ConnectorError::Configuration(format!("Cannot read query file '{}': {}", path, e))
            })?;
            if query.trim().is_empty() {
                return Err(ConnectorError::Configuration(format!("Query file is empty: {}", path)));
            }
            queries.push((language, query));
        }

        if queries.is_empty() {
            return Err(ConnectorError::Configuration(format!(
                "No reasoning output queries found in '{}'",
                directory
            )));
        }
        Ok(queries)
    }

    /// Directory the JSON answers of the reasoning output queries are stored in.
    pub fn reasoning_output_dir(&self) -> String {
        format!("{}{}", self.output, REASONING_OUTPUT_DIR)
    }

    fn read_query<F: FilePort + ?Sized>(
        &self,
        files: &F,
        schema: &SchemaType,
        property_type: PropertyType,
    ) -> Result<String> {
        let path = self.query_file(schema, property_type).ok_or_else(|| {
            ConnectorError::Configuration(format!(
                "No {} query configured for '{}'",
                property_type.file_marker(),
                schema.key()
            ))
        })?;
        let query = files.read_file(path).map_err(|e| {
            ConnectorError::Configuration(format!("Cannot read query file '{}': {}", path, e))
        })?;
        if query.trim().is_empty() {
            return Err(ConnectorError::Configuration(format!("Query file is empty: {}", path)));
        }
        Ok(query)
    }
}
