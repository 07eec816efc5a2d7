use crate::reasoner::ReasonerServerData;
use clap::Parser;

/// Knowledge connector: vehicle telemetry to RDF
#[derive(Parser, Debug, Clone)]
#[command(name = "knowledge_connector")]
#[command(about = "Streams vehicle telemetry into a reasoner as RDF", long_about = None)]
pub struct SystemConfig {
    /// Host of the information layer WebSocket server
    #[arg(long, env = "HOST_WEBSOCKET_SERVER", default_value = "127.0.0.1")]
    pub ws_host: String,

    #[arg(long, env = "PORT_WEBSOCKET_SERVER", default_value_t = 8080)]
    pub ws_port: u16,

    /// Request target of the WebSocket handshake
    #[arg(long, env = "TARGET_WEBSOCKET_SERVER", default_value = "/")]
    pub ws_target: String,

    #[arg(long, env = "HOST_REASONER_SERVER", default_value = "127.0.0.1")]
    pub reasoner_host: String,

    #[arg(long, env = "PORT_REASONER_SERVER", default_value_t = 12110)]
    pub reasoner_port: u16,

    /// Base64 encoded `user:password` for the reasoner
    #[arg(long, env = "AUTH_REASONER_SERVER_BASE64")]
    pub reasoner_auth: String,

    #[arg(long, env = "REASONER_DATASTORE", default_value = "vehicle_ds")]
    pub datastore: String,

    /// Path of the model configuration JSON file
    #[arg(long, env = "MODEL_CONFIG_FILE", default_value = "config/model_config.json")]
    pub model_config: String,
}

impl SystemConfig {
    pub fn websocket_url(&self) -> String {
        let target = if self.ws_target.starts_with('/') {
            self.ws_target.clone()
        } else {
            format!("/{}", self.ws_target)
        };
        format!("ws://{}:{}{}", self.ws_host, self.ws_port, target)
    }

    pub fn reasoner_server(&self) -> ReasonerServerData {
        ReasonerServerData {
            host: self.reasoner_host.clone(),
            port: self.reasoner_port,
            auth_base64: self.reasoner_auth.clone(),
            data_store: self.datastore.clone(),
        }
    }
}
