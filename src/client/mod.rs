//! Connection to the information layer and the worker feeding the triple assembler.

pub mod pipeline;
pub mod websocket_client;

pub use pipeline::{spawn_pipeline, PipelineStats, ReasoningFeedback};
pub use websocket_client::{WebSocketClient, WebSocketClientConfig};
