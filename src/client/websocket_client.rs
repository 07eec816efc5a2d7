//! WebSocket session with the information layer.
//!
//! On every (re)connect the client subscribes to the configured instances, then decodes
//! data frames into [`DataMessage`]s and hands them to the pipeline worker. Replies
//! queued by the worker are written back on the same session.

use crate::core::{DataMessage, SchemaType};
use crate::dto::{IncomingMessage, SubscribeMessageDto};
use crate::error::{ConnectorError, Result};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone)]
pub struct WebSocketClientConfig {
    /// `ws://host:port/target`
    pub url: String,
    /// Schema and instance id of every subscription
    pub subscriptions: Vec<(SchemaType, String)>,
    pub reconnect_delay: Duration,
}

impl WebSocketClientConfig {
    pub fn new(url: String, subscriptions: Vec<(SchemaType, String)>) -> Self {
        Self { url, subscriptions, reconnect_delay: Duration::from_secs(5) }
    }
}

pub struct WebSocketClient {
    config: WebSocketClientConfig,
    supported_data_points: BTreeMap<SchemaType, Vec<String>>,
    should_stop: Arc<AtomicBool>,
    frames_received: Arc<AtomicU64>,
    frames_rejected: Arc<AtomicU64>,
    replies_sent: Arc<AtomicU64>,
}

impl WebSocketClient {
    pub fn new(
        config: WebSocketClientConfig,
        supported_data_points: BTreeMap<SchemaType, Vec<String>>,
    ) -> Self {
        Self {
            config,
            supported_data_points,
            should_stop: Arc::new(AtomicBool::new(false)),
            frames_received: Arc::new(AtomicU64::new(0)),
            frames_rejected: Arc::new(AtomicU64::new(0)),
            replies_sent: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn stop(&self) {
        self.should_stop.store(true, Ordering::Relaxed);
    }

    /// Frames received and frames that could not be turned into a data message.
    pub fn get_metrics(&self) -> (u64, u64) {
        (self.frames_received.load(Ordering::Relaxed), self.frames_rejected.load(Ordering::Relaxed))
    }

    pub fn subscribe_messages(&self) -> Result<Vec<String>> {
        self.config
            .subscriptions
            .iter()
            .map(|(schema, instance)| SubscribeMessageDto::new(schema, instance).to_json())
            .collect()
    }

    /// Decodes a text frame. Status frames and undecodable frames are logged and yield
    /// nothing.
    pub fn handle_frame(&self, text: &str) -> Option<DataMessage> {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        let decoded = IncomingMessage::parse(text).and_then(|incoming| match incoming {
            IncomingMessage::Data(dto) => {
                dto.into_data_message(&self.supported_data_points).map(Some)
            }
            IncomingMessage::Status(status) => {
                info!("Status {} from information layer: {}", status.code, status.message);
                Ok(None)
            }
        });

        match decoded {
            Ok(Some(message)) if message.nodes.is_empty() => {
                debug!("Ignoring data frame of '{}' without supported nodes", message.header.id);
                None
            }
            Ok(message) => message,
            Err(e) => {
                self.frames_rejected.fetch_add(1, Ordering::Relaxed);
                warn!("Rejected frame: {}", e);
                None
            }
        }
    }

    /// Keeps a session open until [`WebSocketClient::stop`] is called or the pipeline is
    /// gone, reconnecting after transport failures. Frames arriving on `replies` are
    /// written to the open session.
    pub async fn run(
        &self,
        sender: Sender<DataMessage>,
        mut replies: UnboundedReceiver<String>,
    ) -> Result<()> {
        while !self.should_stop.load(Ordering::Relaxed) {
            match self.run_session(&sender, &mut replies).await {
                Ok(()) => info!("Session with '{}' closed", self.config.url),
                Err(ConnectorError::InvalidState(reason)) => {
                    return Err(ConnectorError::InvalidState(reason));
                }
                Err(e) => error!("Session with '{}' failed: {}", self.config.url, e),
            }
            if self.should_stop.load(Ordering::Relaxed) {
                break;
            }
            info!("Reconnecting in {:?}", self.config.reconnect_delay);
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
        Ok(())
    }

    /// Frames written back to the information layer.
    pub fn replies_sent(&self) -> u64 {
        self.replies_sent.load(Ordering::Relaxed)
    }

    async fn run_session(
        &self,
        sender: &Sender<DataMessage>,
        replies: &mut UnboundedReceiver<String>,
    ) -> Result<()> {
        let (stream, _) = connect_async(self.config.url.as_str()).await?;
        info!("Connected to '{}'", self.config.url);
        let (mut write, mut read) = stream.split();

        for subscription in self.subscribe_messages()? {
            debug!("Subscribing: {}", subscription);
            write.send(Message::Text(subscription)).await?;
        }

        let mut replies_open = true;
        loop {
            tokio::select! {
                frame = read.next() => {
                    let Some(frame) = frame else { break };
                    if self.should_stop.load(Ordering::Relaxed) {
                        write.send(Message::Close(None)).await?;
                        break;
                    }
                    match frame? {
                        Message::Text(text) => {
                            if let Some(message) = self.handle_frame(&text) {
                                sender.send(message).map_err(|_| {
                                    ConnectorError::InvalidState(
                                        "The pipeline worker has stopped".to_string(),
                                    )
                                })?;
                            }
                        }
                        Message::Ping(payload) => write.send(Message::Pong(payload)).await?,
                        Message::Close(reason) => {
                            debug!("Server closed the session: {:?}", reason);
                            break;
                        }
                        _ => {}
                    }
                }
                reply = replies.recv(), if replies_open => match reply {
                    Some(reply) => {
                        debug!("Sending reply: {}", reply);
                        write.send(Message::Text(reply)).await?;
                        self.replies_sent.fetch_add(1, Ordering::Relaxed);
                    }
                    None => replies_open = false,
                },
            }
        }
        Ok(())
    }
}
