//! Core data structures for the knowledge connector

use chrono::{DateTime, Utc};

/// Suffix of the node carrying the latitude of the current location
pub const LATITUDE_SUFFIX: &str = "CurrentLocation.Latitude";
/// Suffix of the node carrying the longitude of the current location
pub const LONGITUDE_SUFFIX: &str = "CurrentLocation.Longitude";

/// Schema collection a message belongs to. `Default` is the fallback key used when
/// looking up queries for collections without a dedicated entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchemaType {
    Vehicle,
    Default,
    Other(String),
}

impl SchemaType {
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "vehicle" => SchemaType::Vehicle,
            "default" => SchemaType::Default,
            _ => SchemaType::Other(value.to_string()),
        }
    }

    /// Key used in configuration maps (`"vehicle"`, `"default"`, ...).
    pub fn key(&self) -> String {
        match self {
            SchemaType::Vehicle => "vehicle".to_string(),
            SchemaType::Default => "default".to_string(),
            SchemaType::Other(name) => name.to_lowercase(),
        }
    }

    /// Name used as the first segment of node paths and in subscribe messages.
    pub fn collection_name(&self) -> String {
        match self {
            SchemaType::Vehicle => "Vehicle".to_string(),
            SchemaType::Default => "Default".to_string(),
            SchemaType::Other(name) => name.clone(),
        }
    }
}

/// Timestamps attached to a single node reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub generated: Option<DateTime<Utc>>,
    pub received: DateTime<Utc>,
}

impl Metadata {
    pub fn new(received: DateTime<Utc>, generated: Option<DateTime<Utc>>) -> Self {
        Self { generated, received }
    }

    /// The time the value was produced, falling back to the time it was received.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.generated.unwrap_or(self.received)
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self { generated: None, received: Utc::now() }
    }
}

/// One signal reading: a dotted path such as `Vehicle.Speed`, its value and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub value: String,
    pub metadata: Metadata,
}

impl Node {
    pub fn new(name: &str, value: &str, metadata: Metadata) -> Self {
        Self { name: name.to_string(), value: value.to_string(), metadata }
    }

    pub fn is_latitude(&self) -> bool {
        self.name.ends_with(LATITUDE_SUFFIX)
    }

    pub fn is_longitude(&self) -> bool {
        self.name.ends_with(LONGITUDE_SUFFIX)
    }

    /// Milliseconds since epoch of the node timestamp.
    pub fn timestamp_millis(&self) -> i64 {
        self.metadata.timestamp().timestamp_millis()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageHeader {
    /// Entity identifier, e.g. the VIN of the vehicle
    pub id: String,
    pub schema_type: SchemaType,
    pub date_time: String,
}

impl MessageHeader {
    pub fn new(id: &str, schema_type: SchemaType) -> Self {
        Self {
            id: id.to_string(),
            schema_type,
            date_time: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

/// A decoded data frame, processed start-to-finish by the triple assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct DataMessage {
    pub header: MessageHeader,
    pub nodes: Vec<Node>,
}

impl DataMessage {
    pub fn new(header: MessageHeader, nodes: Vec<Node>) -> Self {
        Self { header, nodes }
    }
}
