//! Access to the rule-based reasoner holding the knowledge graph.

pub mod rdfox_adapter;
pub mod reasoning_query;

pub use rdfox_adapter::{RdfoxAdapter, ReasonerServerData};
pub use reasoning_query::ReasoningQueryService;

use crate::error::{ConnectorError, Result};
use crate::files::FilePort;
use crate::rdf::query::{QueryLanguage, ResultFormat};
use crate::rdf::RdfSyntax;
use log::info;

/// Operations the triple assembler needs from a reasoner.
///
/// Transport problems are not reported as errors: a store that cannot be reached answers
/// `false` or an empty result.
pub trait ReasonerPort {
    /// Whether the configured datastore exists and answers.
    fn check_data_store(&self) -> bool;

    /// Loads `data` of the given media type into the datastore.
    fn load_data(&self, data: &str, content_type: &str) -> bool;

    /// Runs a query and returns the answer in `format`, or an empty string.
    fn query_data_as(&self, query: &str, language: QueryLanguage, format: ResultFormat) -> String;

    /// Runs a SPARQL query and returns the tab-separated answer, or an empty string.
    fn query_data(&self, query: &str) -> String {
        self.query_data_as(query, QueryLanguage::Sparql, ResultFormat::Tsv)
    }
}

/// Loads ontology files into the reasoner, guessing each syntax from the file extension.
pub fn load_ontologies<R, F>(reasoner: &R, files: &F, paths: &[String]) -> Result<()>
where
    R: ReasonerPort + ?Sized,
    F: FilePort + ?Sized,
{
    for path in paths {
        let syntax = RdfSyntax::from_path(path)?;
        load_file(reasoner, files, path, syntax.media_type())?;
    }
    Ok(())
}

/// Loads Datalog rule files into the reasoner.
pub fn load_rules<R, F>(reasoner: &R, files: &F, paths: &[String]) -> Result<()>
where
    R: ReasonerPort + ?Sized,
    F: FilePort + ?Sized,
{
    for path in paths {
        load_file(reasoner, files, path, QueryLanguage::Datalog.content_type())?;
    }
    Ok(())
}

fn load_file<R, F>(reasoner: &R, files: &F, path: &str, content_type: &str) -> Result<()>
where
    R: ReasonerPort + ?Sized,
    F: FilePort + ?Sized,
{
    let content = files.read_file(path)?;
    if content.trim().is_empty() {
        return Err(ConnectorError::Configuration(format!("Model file is empty: {}", path)));
    }
    if !reasoner.load_data(&content, content_type) {
        return Err(ConnectorError::Configuration(format!(
            "The reasoner rejected model file: {}",
            path
        )));
    }
    info!("Loaded '{}' into the reasoner", path);
    Ok(())
}
