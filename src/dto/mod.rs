//! JSON frames exchanged with the information layer and their conversion into
//! [`DataMessage`]s.

use crate::core::{DataMessage, MessageHeader, Metadata, Node, SchemaType};
use crate::error::{ConnectorError, Result};
use chrono::{DateTime, TimeZone, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampDto {
    #[serde(default)]
    pub seconds: i64,
    #[serde(default)]
    pub nanos: u32,
}

impl TimestampDto {
    fn is_zero(&self) -> bool {
        self.seconds == 0 && self.nanos == 0
    }

    pub fn from_date_time(date_time: &DateTime<Utc>) -> Self {
        Self { seconds: date_time.timestamp(), nanos: date_time.timestamp_subsec_nanos() }
    }

    pub fn to_date_time(self) -> Option<DateTime<Utc>> {
        if self.is_zero() {
            return None;
        }
        Utc.timestamp_opt(self.seconds, self.nanos).single()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadataDto {
    #[serde(default)]
    pub received: TimestampDto,
    #[serde(default)]
    pub generated: TimestampDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMessageDto {
    pub schema: String,
    pub instance: String,
    #[serde(default)]
    pub path: Option<String>,
    pub data: Value,
    /// Node path, relative to the schema, to its timestamps
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, NodeMetadataDto>>,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessageDto {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub timestamp: TimestampDto,
}

/// Frames sent by the information layer, told apart by their `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IncomingMessage {
    Data(DataMessageDto),
    Status(StatusMessageDto),
}

impl IncomingMessage {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Request for the updates of one instance of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribeMessageDto {
    #[serde(rename = "type")]
    pub kind: String,
    pub schema: String,
    pub instance: String,
}

impl SubscribeMessageDto {
    pub fn new(schema: &SchemaType, instance: &str) -> Self {
        Self {
            kind: "subscribe".to_string(),
            schema: schema.collection_name(),
            instance: instance.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedMetadataDto {
    pub generated: TimestampDto,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetMetadataDto {
    pub nodes: BTreeMap<String, GeneratedMetadataDto>,
}

/// Values written back to one instance of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMessageDto {
    #[serde(rename = "type")]
    pub kind: String,
    pub schema: String,
    pub instance: String,
    pub data: Map<String, Value>,
    pub metadata: SetMetadataDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl SetMessageDto {
    pub fn new(
        schema: &SchemaType,
        instance: &str,
        data: Map<String, Value>,
        generated: &DateTime<Utc>,
    ) -> Self {
        let timestamp = TimestampDto::from_date_time(generated);
        let nodes = data
            .keys()
            .map(|name| (name.clone(), GeneratedMetadataDto { generated: timestamp }))
            .collect();
        Self {
            kind: "set".to_string(),
            schema: schema.collection_name(),
            instance: instance.to_string(),
            data,
            metadata: SetMetadataDto { nodes },
            path: None,
            request_id: None,
        }
    }

    /// One message per schema section of every grouped reasoning result. Sections of
    /// schemas without a configured instance are skipped.
    pub fn from_reasoning_results(
        object_id: &BTreeMap<String, String>,
        results: &[Value],
        generated: &DateTime<Utc>,
    ) -> Vec<Self> {
        let mut messages = Vec::new();
        for sections in results.iter().filter_map(Value::as_object) {
            for (schema, data_points) in sections {
                let schema_type = SchemaType::parse(schema);
                let Some(instance) = object_id
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(&schema_type.key()))
                    .map(|(_, instance)| instance)
                else {
                    warn!("Schema '{}' has no configured instance, not sending its results", schema);
                    continue;
                };
                let Some(data) = data_points.as_object() else {
                    warn!("Reasoning results of '{}' are not an object", schema);
                    continue;
                };
                messages.push(Self::new(&schema_type, instance, data.clone(), generated));
            }
        }
        messages
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl DataMessageDto {
    /// Flattens `data` into nodes named `<schema>.<path>`, keeping only supported data
    /// points of the schema.
    pub fn into_data_message(
        self,
        supported_data_points: &BTreeMap<SchemaType, Vec<String>>,
    ) -> Result<DataMessage> {
        let base_path = self.path.clone().unwrap_or_default();
        if base_path.is_empty() && !self.data.is_object() {
            return Err(ConnectorError::InvalidArgument("Path is missing".to_string()));
        }

        let schema = SchemaType::parse(&self.schema);
        let supported = supported_data_points.get(&schema).ok_or_else(|| {
            ConnectorError::InvalidArgument(format!("Schema '{}' is not supported", self.schema))
        })?;

        let mut nodes = Vec::new();
        self.collect_nodes(&base_path, &self.data, supported, &mut nodes);
        Ok(DataMessage::new(MessageHeader::new(&self.instance, schema), nodes))
    }

    fn collect_nodes(&self, path: &str, value: &Value, supported: &[String], nodes: &mut Vec<Node>) {
        if let Value::Object(map) = value {
            for (key, child) in map {
                let child_path = match (path.is_empty(), key.is_empty()) {
                    (_, true) => path.to_string(),
                    (true, false) => key.clone(),
                    (false, false) => format!("{}.{}", path, key),
                };
                self.collect_nodes(&child_path, child, supported, nodes);
            }
            return;
        }

        let name = format!("{}.{}", self.schema, path);
        if !supported.iter().any(|point| *point == name) {
            warn!("Skipping unsupported data point '{}'", name);
            return;
        }
        let Some(text) = value_to_string(value) else {
            warn!("Skipping data point '{}' without value", name);
            return;
        };
        nodes.push(Node::new(&name, &text, self.node_metadata(path)));
    }

    fn node_metadata(&self, path: &str) -> Metadata {
        let Some(dto) = self.metadata.as_ref().and_then(|nodes| nodes.get(path)) else {
            return Metadata::default();
        };
        match (dto.received.to_date_time(), dto.generated.to_date_time()) {
            (Some(received), generated) => Metadata::new(received, generated),
            (None, Some(generated)) => Metadata::new(Utc::now(), Some(generated)),
            (None, None) => Metadata::default(),
        }
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&serde_json::json!("abc")).as_deref(), Some("abc"));
        assert_eq!(value_to_string(&serde_json::json!(98.6)).as_deref(), Some("98.6"));
        assert_eq!(value_to_string(&serde_json::json!(true)).as_deref(), Some("true"));
        assert_eq!(value_to_string(&Value::Null), None);
    }

    #[test]
    fn test_zero_timestamp_is_absent() {
        assert!(TimestampDto::default().to_date_time().is_none());
        let ts = TimestampDto { seconds: 1_700_000_000, nanos: 5 };
        assert_eq!(ts.to_date_time().unwrap().timestamp_subsec_nanos(), 5);
    }

    #[test]
    fn test_subscribe_message() {
        let json = SubscribeMessageDto::new(&SchemaType::Vehicle, "VIN1").to_json().unwrap();
        assert_eq!(json, r#"{"type":"subscribe","schema":"Vehicle","instance":"VIN1"}"#);
    }
}
