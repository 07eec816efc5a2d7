//! SPARQL helper queries used to look ontology elements up on the reasoner.
//!
//! Each schema collection has one query template per property kind. Templates carry the
//! placeholders `%A%` (subject) and `%B%` (object) and return a single row of three
//! IRIs.

use crate::error::{ConnectorError, Result};
use regex::Regex;
use std::path::Path;

pub const SUBJECT_PLACEHOLDER: &str = "%A%";
pub const OBJECT_PLACEHOLDER: &str = "%B%";

/// Kind of relation a helper query resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    /// Class to class, returns `(class1, objectProperty, class2)`
    Object,
    /// Class to value, returns `(class, dataProperty, datatype)`
    Data,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Object => "object",
            PropertyType::Data => "data",
        }
    }

    /// Fragment identifying the query file of this kind, e.g. `object_property`.
    pub fn file_marker(&self) -> String {
        format!("{}_property", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryLanguage {
    Sparql,
    Datalog,
}

impl QueryLanguage {
    pub fn content_type(&self) -> &'static str {
        match self {
            QueryLanguage::Sparql => "application/sparql-query",
            QueryLanguage::Datalog => "application/x.datalog",
        }
    }

    /// Language of a query file, told by its extension.
    pub fn from_path(path: &str) -> Option<QueryLanguage> {
        let extension = Path::new(path).extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "rq" | "sparql" => Some(QueryLanguage::Sparql),
            "dlog" | "datalog" => Some(QueryLanguage::Datalog),
            _ => None,
        }
    }
}

/// Format the reasoner is asked to answer a query in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFormat {
    Tsv,
    SparqlJson,
}

impl ResultFormat {
    pub fn accept_type(&self) -> &'static str {
        match self {
            ResultFormat::Tsv => "text/tab-separated-values",
            ResultFormat::SparqlJson => "application/sparql-results+json",
        }
    }
}

/// Data- and object-property queries of one schema collection.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPair {
    pub data_property: (QueryLanguage, String),
    pub object_property: (QueryLanguage, String),
}

impl QueryPair {
    pub fn sparql(data_property: String, object_property: String) -> Self {
        Self {
            data_property: (QueryLanguage::Sparql, data_property),
            object_property: (QueryLanguage::Sparql, object_property),
        }
    }

    pub fn query(&self, property_type: PropertyType) -> &str {
        match property_type {
            PropertyType::Object => &self.object_property.1,
            PropertyType::Data => &self.data_property.1,
        }
    }
}

/// Prepares helper queries and reads their answers.
#[derive(Debug)]
pub struct QueryParser {
    prefix_regex: Regex,
}

impl QueryParser {
    pub fn new() -> Result<Self> {
        Ok(Self { prefix_regex: Regex::new(r"(?i)(prefix\s+\w+:\s+<[^>]+>)")? })
    }

    /// Substitutes the subject and object placeholders of a template.
    pub fn replace_placeholders(&self, query: &str, subject: &str, object: &str) -> String {
        query.replace(SUBJECT_PLACEHOLDER, subject).replace(OBJECT_PLACEHOLDER, object)
    }

    /// Collects the `PREFIX name: <iri>` declarations of a query, one per line.
    pub fn extract_prefixes(&self, query: &str) -> String {
        query
            .lines()
            .filter_map(|line| self.prefix_regex.find(line))
            .map(|found| found.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Reads the three values of the first result row.
    pub fn extract_element_values(&self, query_result: &str) -> Result<(String, String, String)> {
        extract_element_values(query_result)
    }
}

/// The reasoner answers with tab-separated values whose first line holds the variable
/// names; the second line is the first row.
fn extract_element_values(query_result: &str) -> Result<(String, String, String)> {
    let row = query_result.lines().nth(1).ok_or_else(|| {
        ConnectorError::InvalidArgument("Query returned no result rows".to_string())
    })?;

    let mut values = row.split_whitespace().map(str::to_string);
    match (values.next(), values.next(), values.next()) {
        (Some(first), Some(second), Some(third)) => Ok((first, second, third)),
        _ => Err(ConnectorError::InvalidArgument(format!(
            "Query result row does not hold three values: {}",
            row
        ))),
    }
}
