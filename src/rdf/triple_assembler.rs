//! Message to RDF pipeline.
//!
//! Every node path is split into an object chain and a data element. Adjacent objects are
//! linked with object-property statements and the last object carries the observation of
//! the value; the ontology identifiers come from helper SPARQL queries executed on the
//! reasoner. Latitude and longitude readings are held back until both halves of a position
//! are known, then projected and emitted together.

use super::query::{PropertyType, QueryPair, QueryParser};
use super::triple_writer::TripleWriter;
use crate::config::ModelConfig;
use crate::core::{DataMessage, Node, SchemaType};
use crate::error::{ConnectorError, Result};
use crate::files::FilePort;
use crate::geo::{ntm_from_wgs84, Wgs84Coord};
use crate::reasoner::{ReasonerPort, ReasoningQueryService};
use chrono::{SecondsFormat, Utc};
use log::{debug, error, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;

/// Largest distance between a latitude and a longitude reading that still form a position.
pub const COORDINATE_PAIRING_WINDOW_MS: i64 = 2000;

/// Every time the number of unpaired coordinate timestamps reaches a multiple of this, a
/// warning is logged.
pub const PENDING_COORDINATES_WARN_STEP: usize = 1000;

const SHACL_CONTENT_TYPE: &str = "text/turtle";
const OUTPUT_FILE_PREFIX: &str = "gen_rdf_triple_";

#[derive(Debug, Clone, Default)]
struct CoordinateBucket {
    latitude: Option<Node>,
    longitude: Option<Node>,
}

/// Latitude and longitude readings close enough in time to describe one position.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatePair {
    pub latitude: Node,
    pub longitude: Node,
}

pub struct TripleAssembler<R: ReasonerPort, F: FilePort> {
    config: ModelConfig,
    reasoner: R,
    files: F,
    writer: TripleWriter,
    query_parser: QueryParser,
    query_pairs: BTreeMap<SchemaType, QueryPair>,
    coordinates: BTreeMap<i64, CoordinateBucket>,
    coordinates_last_timestamp: i64,
}

impl<R: ReasonerPort, F: FilePort> TripleAssembler<R, F> {
    pub fn new(config: ModelConfig, reasoner: R, files: F) -> Result<Self> {
        Ok(Self {
            config,
            reasoner,
            files,
            writer: TripleWriter::new()?,
            query_parser: QueryParser::new()?,
            query_pairs: BTreeMap::new(),
            coordinates: BTreeMap::new(),
            coordinates_last_timestamp: 0,
        })
    }

    pub fn reasoner(&self) -> &R {
        &self.reasoner
    }

    pub fn files(&self) -> &F {
        &self.files
    }

    pub fn writer(&self) -> &TripleWriter {
        &self.writer
    }

    /// Number of timestamps still waiting for their coordinate counterpart.
    pub fn pending_coordinates(&self) -> usize {
        self.coordinates.len()
    }

    /// Runs the reasoning output queries against the assembler's reasoner, storing their
    /// answers through its file port.
    pub fn run_reasoning_queries(&mut self, service: &ReasoningQueryService) -> Vec<Value> {
        service.process_reasoning_queries(&self.reasoner, &mut self.files)
    }

    /// Loads the SHACL shapes into the reasoner and reads the helper queries.
    pub fn initialize(&mut self) -> Result<()> {
        if !self.reasoner.check_data_store() {
            return Err(ConnectorError::Unavailable(
                "The reasoner datastore is not reachable".to_string(),
            ));
        }

        if self.config.shacl_shapes.is_empty() {
            return Err(ConnectorError::Configuration("No SHACL shape files configured".to_string()));
        }
        for path in &self.config.shacl_shapes {
            let shapes = self.files.read_file(path).map_err(|e| {
                ConnectorError::Configuration(format!(
                    "Cannot read SHACL shape file '{}': {}",
                    path, e
                ))
            })?;
            if shapes.trim().is_empty() {
                return Err(ConnectorError::Configuration(format!(
                    "SHACL shape file is empty: {}",
                    path
                )));
            }
            if !self.reasoner.load_data(&shapes, SHACL_CONTENT_TYPE) {
                return Err(ConnectorError::Configuration(format!(
                    "The reasoner rejected SHACL shape file: {}",
                    path
                )));
            }
            debug!("Loaded SHACL shapes from '{}'", path);
        }

        self.query_pairs = self.config.query_pairs(&self.files)?;
        info!("Triple assembler initialized with {} query sets", self.query_pairs.len());
        Ok(())
    }

    /// Converts a message into RDF, stores it in the reasoner and appends it to the hourly
    /// output file. Returns the serialized triples, or `None` when nothing was produced.
    pub fn transform_message_to_rdf_triple(
        &mut self,
        message: &DataMessage,
    ) -> Result<Option<String>> {
        if !self.reasoner.check_data_store() {
            return Err(ConnectorError::Unavailable(format!(
                "The reasoner datastore is not reachable, dropping message of '{}'",
                message.header.id
            )));
        }
        self.writer.initiate_triple(&message.header.id)?;

        if message.nodes.is_empty() {
            warn!("Message of '{}' holds no nodes", message.header.id);
            return Ok(None);
        }

        let schema = &message.header.schema_type;
        let mut coordinates = None;
        for node in &message.nodes {
            if node.is_latitude() || node.is_longitude() {
                self.buffer_coordinate(node);
                coordinates = self.valid_coordinates_pair();
            } else if let Err(e) = self.generate_triples_from_node(node, schema, None) {
                warn!(
                    "Failed to generate triples for node '{}' of '{}': {}",
                    node.name, message.header.id, e
                );
            }
        }

        if let Some(pair) = coordinates {
            self.generate_triples_from_coordinates(&pair, schema, &message.header.id);
        }

        let syntax = self.config.output_syntax()?;
        let output = self.writer.generate_triple_output(syntax)?;
        if output.is_empty() {
            debug!("No triples generated for '{}'", message.header.id);
            return Ok(None);
        }

        self.store_triple_output(&output)?;
        Ok(Some(output))
    }

    fn buffer_coordinate(&mut self, node: &Node) {
        let bucket = self.coordinates.entry(node.timestamp_millis()).or_default();
        if node.is_latitude() {
            bucket.latitude = Some(node.clone());
        } else {
            bucket.longitude = Some(node.clone());
        }
        if let Some(warning) = backlog_warning(self.coordinates.len()) {
            warn!("{} ('{}')", warning, node.name);
        }
    }

    /// Pairs the latest latitude with the latest longitude of the buffer, which need not
    /// share a timestamp, as long as they are within the pairing window.
    fn valid_coordinates_pair(&mut self) -> Option<CoordinatePair> {
        let mut latitude: Option<(i64, &Node)> = None;
        let mut longitude: Option<(i64, &Node)> = None;
        for (timestamp, bucket) in &self.coordinates {
            if let Some(node) = &bucket.latitude {
                latitude = Some((*timestamp, node));
            }
            if let Some(node) = &bucket.longitude {
                longitude = Some((*timestamp, node));
            }
        }

        let ((latitude_ts, latitude), (longitude_ts, longitude)) = (latitude?, longitude?);
        if (latitude_ts - longitude_ts).abs() > COORDINATE_PAIRING_WINDOW_MS {
            return None;
        }

        let pair = CoordinatePair { latitude: latitude.clone(), longitude: longitude.clone() };
        self.coordinates_last_timestamp = latitude_ts.max(longitude_ts);
        Some(pair)
    }

    fn generate_triples_from_coordinates(
        &mut self,
        pair: &CoordinatePair,
        schema: &SchemaType,
        identifier: &str,
    ) {
        match self.project(pair) {
            Ok((northing, easting)) => {
                for (node, ntm) in [(&pair.latitude, northing), (&pair.longitude, easting)] {
                    if let Err(e) = self.generate_triples_from_node(node, schema, Some(ntm)) {
                        warn!(
                            "Failed to generate triples for node '{}' of '{}': {}",
                            node.name, identifier, e
                        );
                    }
                }
            }
            Err(e) => error!("Dropping position of '{}': {}", identifier, e),
        }

        let last = self.coordinates_last_timestamp;
        self.coordinates.retain(|timestamp, _| *timestamp > last);
    }

    /// Northing and easting of the pair.
    fn project(&self, pair: &CoordinatePair) -> Result<(f64, f64)> {
        let parse = |node: &Node| {
            node.value.trim().parse::<f64>().map_err(|_| {
                ConnectorError::InvalidArgument(format!(
                    "'{}' is not a coordinate: {}",
                    node.name, node.value
                ))
            })
        };
        let point = Wgs84Coord::new(parse(&pair.latitude)?, parse(&pair.longitude)?);
        let origin = self.config.zone_origin().unwrap_or(point);

        let ntm = ntm_from_wgs84(&origin, &point).ok_or_else(|| {
            ConnectorError::InvalidArgument(format!(
                "Failed to convert ({}, {}) to NTM",
                point.latitude, point.longitude
            ))
        })?;
        Ok((ntm.northing, ntm.easting))
    }

    fn generate_triples_from_node(
        &mut self,
        node: &Node,
        schema: &SchemaType,
        ntm_value: Option<f64>,
    ) -> Result<()> {
        let segments: Vec<&str> = node.name.split('.').collect();
        let invalid = || {
            ConnectorError::InvalidNode(format!(
                "'{}' needs at least an object and a data element",
                node.name
            ))
        };
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(invalid());
        }
        let (data_element, objects) = segments.split_last().ok_or_else(invalid)?;
        let last_object = *objects.last().ok_or_else(invalid)?;

        for link in objects.windows(2) {
            let (prefixes, values) =
                self.query_prefixes_and_values(schema, PropertyType::Object, link[0], link[1])?;
            self.writer
                .add_rdf_object_to_triple(&prefixes, (&values.0, &values.1, &values.2))?;
        }

        let (prefixes, values) =
            self.query_prefixes_and_values(schema, PropertyType::Data, last_object, data_element)?;
        self.writer.add_rdf_data_to_triple(
            &prefixes,
            (&values.0, &values.1, &values.2),
            &node.value,
            &node.metadata.timestamp(),
            ntm_value,
        )
    }

    fn query_for(&self, schema: &SchemaType, property_type: PropertyType) -> Result<&str> {
        self.query_pairs
            .get(schema)
            .or_else(|| self.query_pairs.get(&SchemaType::Default))
            .map(|pair| pair.query(property_type))
            .filter(|query| !query.is_empty())
            .ok_or_else(|| {
                ConnectorError::Configuration(format!(
                    "No {} query for '{}' and no default",
                    property_type.file_marker(),
                    schema.key()
                ))
            })
    }

    fn query_prefixes_and_values(
        &self,
        schema: &SchemaType,
        property_type: PropertyType,
        subject: &str,
        object: &str,
    ) -> Result<(String, (String, String, String))> {
        let template = self.query_for(schema, property_type)?;
        let query = self.query_parser.replace_placeholders(template, subject, object);
        let result = self.reasoner.query_data(&query);
        let values = self.query_parser.extract_element_values(&result).map_err(|e| {
            ConnectorError::InvalidArgument(format!(
                "No {} for '{}' and '{}': {}",
                property_type.file_marker(),
                subject,
                object,
                e
            ))
        })?;
        Ok((self.query_parser.extract_prefixes(&query), values))
    }

    fn store_triple_output(&mut self, output: &str) -> Result<()> {
        let syntax = self.config.output_syntax()?;
        if !self.reasoner.load_data(output, syntax.media_type()) {
            error!("The reasoner rejected the generated triples, keeping them in the output file");
        }

        let now = Utc::now();
        let path = format!(
            "{}{}{}{}",
            self.config.output,
            OUTPUT_FILE_PREFIX,
            now.format("%H"),
            syntax.file_extension()?
        );
        let content = format!(
            "# Output from {}\n\n{}\n\n",
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
            output
        );
        self.files.write_file(&path, &content, true)?;
        debug!("Appended triples to '{}'", path);
        Ok(())
    }
}

fn backlog_warning(pending: usize) -> Option<String> {
    (pending > 0 && pending % PENDING_COORDINATES_WARN_STEP == 0).then(|| {
        format!("{} coordinate readings are waiting for their counterpart", pending)
    })
}
