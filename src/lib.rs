//! # Knowledge Connector
//!
//! The knowledge connector subscribes to live vehicle telemetry over a WebSocket link,
//! turns every signal reading into RDF triples following a configurable ontology mapping,
//! and persists those triples both to rolling output files and to an external rule-based
//! reasoning engine reached over HTTP.
//!
//! ## Features
//!
//! - Ontology lookup through SHACL-derived SPARQL queries executed on the reasoner
//! - SOSA observations for every reading, with projected (NTM) positions for locations
//! - Turtle, N-Triples, N-Quads and TriG output
//!
//! ## Example
//!
//! ```rust
//! use knowledge_connector::rdf::{RdfSyntax, TripleWriter};
//!
//! fn example() -> knowledge_connector::Result<()> {
//!     let mut writer = TripleWriter::new()?;
//!     writer.initiate_triple("WBY11CF080CH470711")?;
//!     let output = writer.generate_triple_output(RdfSyntax::Turtle)?;
//!     assert!(output.is_empty());
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::new_without_default)]

/// Core data structures exchanged between the connector components
pub mod core;

/// WGS84 to local Transverse Mercator projection
pub mod geo;

/// Triple generation and serialization
pub mod rdf;

/// Access to the reasoning engine
pub mod reasoner;

/// File access used for queries, shapes and generated output
pub mod files;

/// Model and system configuration
pub mod config;

/// Wire-level message objects and their conversion into core types
pub mod dto;

/// WebSocket session with the information layer
pub mod client;

pub mod error;

// Re-export commonly used types
pub use error::{ConnectorError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConnectorError::Configuration("test error".to_string());
        assert_eq!(format!("{}", err), "Configuration error: test error");
    }
}
