//! Statement builder for a single transaction.
//!
//! A transaction starts with [`TripleWriter::initiate_triple`], which fixes the entity id
//! appended to every instance name, collects statements through
//! [`TripleWriter::add_rdf_object_to_triple`] and [`TripleWriter::add_rdf_data_to_triple`],
//! and is rendered with [`TripleWriter::generate_triple_output`]. Rendering does not reset
//! anything; the next `initiate_triple` does.

use super::RdfSyntax;
use crate::error::{ConnectorError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::{GraphName, Literal, NamedNode, Quad, Term};
use regex::Regex;
use std::collections::BTreeMap;

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const SOSA_PREFIX: (&str, &str) = ("sosa", "http://www.w3.org/ns/sosa/");
pub const XSD_PREFIX: (&str, &str) = ("xsd", "http://www.w3.org/2001/XMLSchema#");

const CURRENT_LOCATION: &str = "CurrentLocation";

/// How the text of a triple node has to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Absolute IRI
    Uri,
    /// Prefixed name, `prefix:local`
    Curie,
    Literal,
}

pub type TripleNode = (NodeKind, String);

#[derive(Debug, Clone, PartialEq)]
pub struct TripleNodes {
    pub subject: TripleNode,
    pub predicate: TripleNode,
    pub object: TripleNode,
    pub datatype: Option<TripleNode>,
}

impl TripleNodes {
    fn new(subject: TripleNode, predicate: TripleNode, object: TripleNode) -> Self {
        Self { subject, predicate, object, datatype: None }
    }

    fn typed(mut self, datatype: TripleNode) -> Self {
        self.datatype = Some(datatype);
        self
    }
}

/// An ontology element such as `<http://example.org/vehicle#Vehicle>` split into its
/// namespace and local name, with the short prefix it resolved to (if any).
#[derive(Debug, Clone, PartialEq)]
struct RdfElement {
    prefix: Option<String>,
    namespace_iri: String,
    local_name: String,
}

impl RdfElement {
    fn with_local_name(&self, local_name: String) -> TripleNode {
        match &self.prefix {
            Some(prefix) => (NodeKind::Curie, format!("{}:{}", prefix, local_name)),
            None => (NodeKind::Uri, format!("{}{}", self.namespace_iri, local_name)),
        }
    }

    fn term(&self) -> TripleNode {
        self.with_local_name(self.local_name.clone())
    }
}

/// Accumulates RDF statements for one entity and serializes them.
#[derive(Debug)]
pub struct TripleWriter {
    prefix_regex: Regex,
    element_regex: Regex,
    identifier: String,
    /// Prefixes declared by the queries seen in this transaction, in declaration order.
    supported_prefixes: Vec<(String, String)>,
    /// Prefixes referenced by emitted statements.
    used_prefixes: BTreeMap<String, String>,
    statements: Vec<TripleNodes>,
}

impl TripleWriter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            prefix_regex: Regex::new(r"(?i)prefix\s+(\w+):\s+<([^>]+)>")?,
            element_regex: Regex::new(r"^<(https?://([^#>]+)#)([^>]+)>$")?,
            identifier: String::new(),
            supported_prefixes: Vec::new(),
            used_prefixes: BTreeMap::new(),
            statements: Vec::new(),
        })
    }

    /// Starts a new transaction for the entity `identifier`, discarding all statements and
    /// prefixes collected so far.
    pub fn initiate_triple(&mut self, identifier: &str) -> Result<()> {
        if identifier.is_empty() {
            return Err(ConnectorError::InvalidArgument(
                "Triple identifier cannot be empty".to_string(),
            ));
        }
        self.identifier = identifier.to_string();
        self.statements.clear();
        self.supported_prefixes.clear();
        self.used_prefixes.clear();
        Ok(())
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn statements(&self) -> &[TripleNodes] {
        &self.statements
    }

    pub fn used_prefixes(&self) -> &BTreeMap<String, String> {
        &self.used_prefixes
    }

    /// Adds `instance(class1) a class1` and `instance(class1) objectProperty instance(class2)`.
    pub fn add_rdf_object_to_triple(
        &mut self,
        prefixes: &str,
        rdf_object_values: (&str, &str, &str),
    ) -> Result<()> {
        let (class_1, object_property, class_2) = rdf_object_values;
        self.add_supported_prefixes(prefixes)?;

        let mut used = BTreeMap::new();
        let class_1 = self.resolve_element(class_1, &mut used)?;
        let object_property = self.resolve_element(object_property, &mut used)?;
        let class_2 = self.resolve_element(class_2, &mut used)?;

        let class_1_instance = self.instance_of(&class_1)?;
        let class_2_instance = self.instance_of(&class_2)?;

        self.used_prefixes.extend(used);
        self.statements.push(TripleNodes::new(
            class_1_instance.clone(),
            (NodeKind::Uri, RDF_TYPE.to_string()),
            class_1.term(),
        ));
        self.statements.push(TripleNodes::new(
            class_1_instance,
            object_property.term(),
            class_2_instance,
        ));
        Ok(())
    }

    /// Adds a SOSA observation of `value` for the data property on the class instance.
    ///
    /// Latitude and longitude of `CurrentLocation` additionally carry the projected value
    /// in `hasSimpleResultNTM`, which must then be supplied.
    pub fn add_rdf_data_to_triple(
        &mut self,
        prefixes: &str,
        rdf_data_values: (&str, &str, &str),
        value: &str,
        timestamp: &DateTime<Utc>,
        ntm_value: Option<f64>,
    ) -> Result<()> {
        if value.is_empty() {
            return Err(ConnectorError::InvalidArgument("Triple value cannot be empty".to_string()));
        }
        let (class_1, data_property, datatype) = rdf_data_values;
        self.add_supported_prefixes(prefixes)?;

        let mut used = BTreeMap::new();
        used.insert(SOSA_PREFIX.0.to_string(), SOSA_PREFIX.1.to_string());
        used.insert(XSD_PREFIX.0.to_string(), XSD_PREFIX.1.to_string());

        let class_1 = self.resolve_element(class_1, &mut used)?;
        let data_property = self.resolve_element(data_property, &mut used)?;
        let datatype = self.resolve_element(datatype, &mut used)?;

        let needs_ntm = class_1.local_name == CURRENT_LOCATION
            && (data_property.local_name == "latitude" || data_property.local_name == "longitude");
        if needs_ntm && ntm_value.is_none() {
            return Err(ConnectorError::InvalidArgument("NTM value cannot be empty".to_string()));
        }

        let class_1_instance = self.instance_of(&class_1)?;
        let observation = class_1.with_local_name(format!(
            "ob_{}_{}",
            data_property.local_name,
            observation_identifier(timestamp)
        ));
        let phenomenon_time = timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true);
        let sosa = |name: &str| (NodeKind::Curie, format!("{}:{}", SOSA_PREFIX.0, name));
        let literal = |text: String| (NodeKind::Literal, text);

        let mut statements = vec![
            TripleNodes::new(
                class_1_instance.clone(),
                (NodeKind::Uri, RDF_TYPE.to_string()),
                class_1.term(),
            ),
            TripleNodes::new(
                observation.clone(),
                (NodeKind::Uri, RDF_TYPE.to_string()),
                sosa("Observation"),
            ),
            TripleNodes::new(observation.clone(), sosa("hasFeatureOfInterest"), class_1_instance),
            TripleNodes::new(observation.clone(), sosa("hasSimpleResult"), literal(value.to_string()))
                .typed(datatype.term()),
            TripleNodes::new(observation.clone(), sosa("observedProperty"), data_property.term()),
            TripleNodes::new(observation.clone(), sosa("phenomenonTime"), literal(phenomenon_time))
                .typed((NodeKind::Curie, format!("{}:dateTime", XSD_PREFIX.0))),
        ];

        if let (true, Some(ntm)) = (needs_ntm, ntm_value) {
            statements.push(
                TripleNodes::new(
                    observation,
                    class_1.with_local_name("hasSimpleResultNTM".to_string()),
                    literal(format!("{:.6}", ntm)),
                )
                .typed(datatype.term()),
            );
        }

        self.used_prefixes.extend(used);
        self.statements.extend(statements);
        Ok(())
    }

    /// Serializes every statement of the transaction, in insertion order, declaring the
    /// prefixes that the statements use. Trailing newlines are trimmed.
    pub fn generate_triple_output(&self, syntax: RdfSyntax) -> Result<String> {
        let format = match syntax {
            RdfSyntax::Turtle => RdfFormat::Turtle,
            RdfSyntax::NTriples => RdfFormat::NTriples,
            RdfSyntax::NQuads => RdfFormat::NQuads,
            RdfSyntax::TriG => RdfFormat::TriG,
            other => return Err(ConnectorError::UnsupportedFormat(format!("{:?}", other))),
        };

        let mut serializer = RdfSerializer::from_format(format);
        for (prefix, iri) in &self.used_prefixes {
            serializer = serializer.with_prefix(prefix.as_str(), iri.as_str())?;
        }

        let mut writer = serializer.for_writer(Vec::new());
        for statement in &self.statements {
            let quad = self.to_quad(statement)?;
            writer
                .serialize_quad(&quad)
                .map_err(|e| ConnectorError::Serialization(e.to_string()))?;
        }
        let buffer = writer.finish().map_err(|e| ConnectorError::Serialization(e.to_string()))?;

        let output =
            String::from_utf8(buffer).map_err(|e| ConnectorError::Serialization(e.to_string()))?;
        Ok(output.trim_end_matches('\n').to_string())
    }

    /// Registers every `prefix name: <iri>` line of `prefixes` as supported.
    fn add_supported_prefixes(&mut self, prefixes: &str) -> Result<()> {
        if prefixes.trim().is_empty() {
            return Err(ConnectorError::InvalidArgument("Prefixes cannot be empty".to_string()));
        }

        let mut parsed = Vec::new();
        for line in prefixes.lines().filter(|line| !line.trim().is_empty()) {
            let captures = self.prefix_regex.captures(line).ok_or_else(|| {
                ConnectorError::InvalidArgument(format!("Unsupported input format: {}", line))
            })?;
            parsed.push((captures[1].to_string(), captures[2].to_string()));
        }

        for (prefix, iri) in parsed {
            if !self.supported_prefixes.iter().any(|(known, _)| *known == prefix) {
                self.supported_prefixes.push((prefix, iri));
            }
        }
        Ok(())
    }

    /// Splits `<http://ns#Local>` and maps its namespace onto a supported prefix. The
    /// matched prefix is recorded in `used`.
    fn resolve_element(
        &self,
        element: &str,
        used: &mut BTreeMap<String, String>,
    ) -> Result<RdfElement> {
        if element.is_empty() {
            return Err(ConnectorError::InvalidArgument(
                "The RDF element cannot be empty".to_string(),
            ));
        }
        let captures = self.element_regex.captures(element.trim()).ok_or_else(|| {
            ConnectorError::InvalidArgument(format!("Unsupported input format: {}", element))
        })?;
        let namespace = &captures[2];

        let prefix = self.supported_prefixes.iter().find(|(_, iri)| iri.contains(namespace)).map(
            |(prefix, iri)| {
                used.insert(prefix.clone(), iri.clone());
                prefix.clone()
            },
        );

        Ok(RdfElement {
            prefix,
            namespace_iri: captures[1].to_string(),
            local_name: captures[3].to_string(),
        })
    }

    fn instance_of(&self, element: &RdfElement) -> Result<TripleNode> {
        if self.identifier.is_empty() {
            return Err(ConnectorError::InvalidState(
                "Triple identifier has not been set".to_string(),
            ));
        }
        Ok(element.with_local_name(format!("{}{}", element.local_name, self.identifier)))
    }

    fn expand(&self, node: &TripleNode) -> Result<NamedNode> {
        match node.0 {
            NodeKind::Uri => Ok(NamedNode::new(node.1.as_str())?),
            NodeKind::Curie => {
                let (prefix, local_name) = node.1.split_once(':').ok_or_else(|| {
                    ConnectorError::Serialization(format!("Malformed prefixed name: {}", node.1))
                })?;
                let namespace = self.used_prefixes.get(prefix).ok_or_else(|| {
                    ConnectorError::Serialization(format!("Undeclared prefix: {}", prefix))
                })?;
                Ok(NamedNode::new(format!("{}{}", namespace, local_name))?)
            }
            NodeKind::Literal => Err(ConnectorError::Serialization(format!(
                "Literal used where an IRI is required: {}",
                node.1
            ))),
        }
    }

    fn to_quad(&self, statement: &TripleNodes) -> Result<Quad> {
        let subject = self.expand(&statement.subject)?;
        let predicate = self.expand(&statement.predicate)?;
        let object: Term = match statement.object.0 {
            NodeKind::Literal => match &statement.datatype {
                Some(datatype) => Literal::new_typed_literal(
                    statement.object.1.as_str(),
                    self.expand(datatype)?,
                )
                .into(),
                None => Literal::new_simple_literal(statement.object.1.as_str()).into(),
            },
            _ => self.expand(&statement.object)?.into(),
        };
        Ok(Quad::new(subject, predicate, object, GraphName::DefaultGraph))
    }
}

/// `YYYYMMDDHHMMSS` followed by the zero-padded nanoseconds of the timestamp.
pub fn observation_identifier(timestamp: &DateTime<Utc>) -> String {
    format!("{}{:09}", timestamp.format("%Y%m%d%H%M%S"), timestamp.timestamp_subsec_nanos())
}
