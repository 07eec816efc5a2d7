//! Error types and result definitions

use thiserror::Error;

/// Result type alias for connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Main error type for the connector
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Malformed input to a triple writer operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation attempted before the required setup
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Missing or inconsistent model configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The reasoner datastore cannot be reached
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Unknown RDF syntax requested
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Node path that cannot be split into objects and a data element
    #[error("Invalid node: {0}")]
    InvalidNode(String),

    /// Failure while writing RDF with the serializer
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(String),

    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid regular expression
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        ConnectorError::Http(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ConnectorError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ConnectorError::WebSocket(err.to_string())
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        ConnectorError::Json(err.to_string())
    }
}

impl From<oxigraph::model::IriParseError> for ConnectorError {
    fn from(err: oxigraph::model::IriParseError) -> Self {
        ConnectorError::Serialization(err.to_string())
    }
}
