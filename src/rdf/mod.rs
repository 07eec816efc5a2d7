//! RDF triple generation.
//!
//! [`TripleWriter`] accumulates the statements of one transaction and serializes them,
//! [`TripleAssembler`] drives it from incoming data messages using ontology lookups on the
//! reasoner.

pub mod query;
pub mod triple_assembler;
pub mod triple_writer;

pub use triple_assembler::TripleAssembler;
pub use triple_writer::{NodeKind, TripleNodes, TripleWriter};

use crate::error::{ConnectorError, Result};
use serde::{Deserialize, Serialize};

/// RDF syntaxes known to the connector. Only Turtle, N-Triples, N-Quads and TriG can be
/// produced by the triple writer; the others are accepted when loading model files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RdfSyntax {
    Turtle,
    NTriples,
    NQuads,
    TriG,
    RdfXml,
    JsonLd,
}

impl RdfSyntax {
    pub fn from_string(format: &str) -> Result<RdfSyntax> {
        match format.to_lowercase().as_str() {
            "turtle" | "ttl" => Ok(RdfSyntax::Turtle),
            "ntriples" | "nt" => Ok(RdfSyntax::NTriples),
            "nquads" | "nq" => Ok(RdfSyntax::NQuads),
            "trig" => Ok(RdfSyntax::TriG),
            "rdfxml" | "rdf" | "owl" | "xml" => Ok(RdfSyntax::RdfXml),
            "jsonld" | "json-ld" => Ok(RdfSyntax::JsonLd),
            _ => Err(ConnectorError::UnsupportedFormat(format.to_string())),
        }
    }

    /// Guess the syntax of a model file from its extension.
    pub fn from_path(path: &str) -> Result<RdfSyntax> {
        let extension = path.rsplit_once('.').map_or("", |(_, ext)| ext);
        RdfSyntax::from_string(extension)
    }

    /// Extension of generated output files, including the leading dot.
    pub fn file_extension(&self) -> Result<&'static str> {
        match self {
            RdfSyntax::Turtle => Ok(".ttl"),
            RdfSyntax::NQuads => Ok(".nq"),
            RdfSyntax::NTriples => Ok(".nt"),
            RdfSyntax::TriG => Ok(".trig"),
            other => Err(ConnectorError::UnsupportedFormat(format!("{:?}", other))),
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            RdfSyntax::Turtle => "text/turtle",
            RdfSyntax::NTriples => "application/n-triples",
            RdfSyntax::NQuads => "application/n-quads",
            RdfSyntax::TriG => "application/trig",
            RdfSyntax::RdfXml => "application/rdf+xml",
            RdfSyntax::JsonLd => "application/ld+json",
        }
    }
}
