//! Knowledge connector entry point.
//!
//! Loads the model into the reasoner, starts the triple pipeline worker and keeps the
//! WebSocket session with the information layer open until Ctrl-C. Reasoning results are
//! written back on the same session.

use clap::Parser;
use knowledge_connector::{
    client::{spawn_pipeline, ReasoningFeedback, WebSocketClient, WebSocketClientConfig},
    config::{ModelConfig, SystemConfig},
    files::LocalFileHandler,
    rdf::TripleAssembler,
    reasoner::{self, RdfoxAdapter, ReasoningQueryService},
};
use log::{error, info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = SystemConfig::parse();

    let files = LocalFileHandler::new();
    let model = ModelConfig::load(&files, &args.model_config)?;
    let supported_data_points = model.supported_data_points(&files)?;

    info!("Connecting to reasoner at {}:{}", args.reasoner_host, args.reasoner_port);
    let adapter = RdfoxAdapter::new(&args.reasoner_server())?;
    adapter.initialize()?;
    reasoner::load_ontologies(&adapter, &files, &model.ontologies)?;
    reasoner::load_rules(&adapter, &files, &model.rules)?;

    let subscriptions = model
        .supported_schemas()
        .into_iter()
        .filter_map(|schema| match model.object_id.get(&schema.key()) {
            Some(instance) => Some((schema, instance.clone())),
            None => {
                warn!("No instance configured for '{}', not subscribing", schema.key());
                None
            }
        })
        .collect();

    let (reply_sender, replies) = tokio::sync::mpsc::unbounded_channel();
    let feedback = match ReasoningQueryService::from_config(&model, &files)? {
        Some(service) => {
            info!("Answering {} reasoning output queries per message", service.queries().len());
            Some(ReasoningFeedback {
                service,
                object_id: model.object_id.clone(),
                replies: reply_sender,
            })
        }
        None => {
            info!("No reasoning output queries configured");
            None
        }
    };

    let mut assembler = TripleAssembler::new(model, adapter, files)?;
    assembler.initialize()?;
    let (sender, worker) = spawn_pipeline(assembler, feedback);

    let client = WebSocketClient::new(
        WebSocketClientConfig::new(args.websocket_url(), subscriptions),
        supported_data_points,
    );

    let runtime = tokio::runtime::Builder::new_multi_thread().worker_threads(2).enable_all().build()?;
    runtime.block_on(async {
        tokio::select! {
            result = client.run(sender, replies) => {
                if let Err(e) = result {
                    error!("WebSocket client stopped: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                client.stop();
            }
        }
    });

    match worker.join() {
        Ok(stats) => info!(
            "Processed {} messages, {} failed, {} replies queued",
            stats.processed, stats.failed, stats.replies
        ),
        Err(_) => error!("Pipeline worker panicked"),
    }
    let (received, rejected) = client.get_metrics();
    info!(
        "Received {} frames, rejected {}, sent {} replies",
        received,
        rejected,
        client.replies_sent()
    );
    Ok(())
}
