//! In-memory reasoner and file system shared by the integration tests.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use knowledge_connector::config::ModelConfig;
use knowledge_connector::core::{DataMessage, MessageHeader, Metadata, Node, SchemaType};
use knowledge_connector::files::FilePort;
use knowledge_connector::rdf::query::{QueryLanguage, ResultFormat};
use knowledge_connector::reasoner::ReasonerPort;
use knowledge_connector::{ConnectorError, Result};
use std::collections::HashMap;
use std::sync::Mutex;

pub const CAR_NS: &str = "http://example.ontology.com/car#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const VIN: &str = "WBY11CF080CH470711";

pub const OBJECT_QUERY: &str = "PREFIX car: <http://example.ontology.com/car#>\n\
                                PREFIX sh: <http://www.w3.org/ns/shacl#>\n\
                                SELECT ?class1 ?property ?class2 WHERE { ?s sh:path ?p } # object:%A%:%B%";
pub const DATA_QUERY: &str = "PREFIX car: <http://example.ontology.com/car#>\n\
                              PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>\n\
                              SELECT ?class ?property ?datatype WHERE { ?s sh:path ?p } # data:%A%:%B%";

#[derive(Default)]
struct ReasonerState {
    available: bool,
    accept_loads: bool,
    loads: Vec<(String, String)>,
    queries: Vec<String>,
    formats: Vec<ResultFormat>,
    answers: Vec<(String, String)>,
}

/// Answers queries from canned responses matched by substring.
pub struct MockReasoner {
    state: Mutex<ReasonerState>,
}

impl MockReasoner {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ReasonerState {
                available: true,
                accept_loads: true,
                ..ReasonerState::default()
            }),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.state.lock().unwrap().available = available;
    }

    pub fn set_accept_loads(&self, accept: bool) {
        self.state.lock().unwrap().accept_loads = accept;
    }

    pub fn answer(&self, needle: &str, response: String) {
        self.state.lock().unwrap().answers.push((needle.to_string(), response));
    }

    /// Object property row linking `Class1` to `Class2`.
    pub fn answer_object(&self, class_1: &str, class_2: &str) {
        self.answer(
            &format!("object:{}:{}", class_1, class_2),
            format!(
                "?class1\t?property\t?class2\n<{ns}{}>\t<{ns}hasPart>\t<{ns}{}>\n",
                class_1,
                class_2,
                ns = CAR_NS
            ),
        );
    }

    /// Data property row of `element` on `class`.
    pub fn answer_data(&self, class: &str, element: &str, property: &str, datatype: &str) {
        self.answer(
            &format!("data:{}:{}", class, element),
            format!(
                "?class\t?property\t?datatype\n<{ns}{}>\t<{ns}{}>\t<{}{}>\n",
                class,
                property,
                XSD_NS,
                datatype,
                ns = CAR_NS
            ),
        );
    }

    pub fn loads(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().loads.clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.lock().unwrap().queries.clone()
    }

    pub fn formats(&self) -> Vec<ResultFormat> {
        self.state.lock().unwrap().formats.clone()
    }
}

impl ReasonerPort for MockReasoner {
    fn check_data_store(&self) -> bool {
        self.state.lock().unwrap().available
    }

    fn load_data(&self, data: &str, content_type: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        state.loads.push((data.to_string(), content_type.to_string()));
        state.accept_loads
    }

    fn query_data_as(&self, query: &str, _language: QueryLanguage, format: ResultFormat) -> String {
        let mut state = self.state.lock().unwrap();
        state.queries.push(query.to_string());
        state.formats.push(format);
        state
            .answers
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub path: String,
    pub content: String,
    pub append: bool,
}

#[derive(Default)]
pub struct MockFiles {
    pub files: HashMap<String, String>,
    pub writes: Vec<Write>,
}

impl MockFiles {
    pub fn with_queries() -> Self {
        let mut files = Self::default();
        files.insert("queries/default_object_property.rq", OBJECT_QUERY);
        files.insert("queries/default_data_property.rq", DATA_QUERY);
        files.insert("shapes/vehicle.ttl", "@prefix sh: <http://www.w3.org/ns/shacl#> .");
        files
    }

    pub fn insert(&mut self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
    }
}

impl FilePort for MockFiles {
    fn read_file(&self, path: &str) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            ConnectorError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
        })
    }

    fn read_directory(&self, path: &str) -> Result<Vec<String>> {
        Ok(self
            .files
            .keys()
            .filter_map(|name| name.strip_prefix(&format!("{}/", path)))
            .map(str::to_string)
            .collect())
    }

    fn write_file(&mut self, path: &str, content: &str, append: bool) -> Result<()> {
        self.writes.push(Write {
            path: path.to_string(),
            content: content.to_string(),
            append,
        });
        Ok(())
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn model_config(output_format: &str) -> ModelConfig {
    ModelConfig::from_json(&format!(
        r#"{{
            "inputs": {{ "Vehicle": ["Vehicle.Speed"] }},
            "object_id": {{ "vehicle": "{vin}" }},
            "shacl_shapes": ["shapes/vehicle.ttl"],
            "output": "out/",
            "queries": {{
                "triple_assembler_helper": {{
                    "default": [
                        "queries/default_data_property.rq",
                        "queries/default_object_property.rq"
                    ]
                }}
            }},
            "reasoner_settings": {{
                "inference_engine": "RDFox",
                "output_format": "{format}",
                "supported_schema_collections": ["Vehicle"]
            }}
        }}"#,
        vin = VIN,
        format = output_format
    ))
    .unwrap()
}

pub fn at_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).unwrap()
}

pub fn node(name: &str, value: &str, generated_millis: i64) -> Node {
    let generated = at_millis(generated_millis);
    Node::new(name, value, Metadata::new(generated, Some(generated)))
}

pub fn message(nodes: Vec<Node>) -> DataMessage {
    DataMessage::new(MessageHeader::new(VIN, SchemaType::Vehicle), nodes)
}
