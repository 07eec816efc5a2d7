//! Worker thread owning the triple assembler.
//!
//! Messages are processed one at a time in arrival order; the reasoner and file calls made
//! by the assembler block, so they stay off the async runtime. After each message the
//! reasoning output queries, when configured, are answered and their results queued as
//! `set` frames for the WebSocket session.

use crate::core::DataMessage;
use crate::dto::SetMessageDto;
use crate::files::FilePort;
use crate::rdf::TripleAssembler;
use crate::reasoner::{ReasonerPort, ReasoningQueryService};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::sync::mpsc::{channel, Sender};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub processed: u64,
    pub empty: u64,
    pub failed: u64,
    /// `set` frames handed to the session
    pub replies: u64,
}

/// Reasoning output queries and where their `set` frames go.
pub struct ReasoningFeedback {
    pub service: ReasoningQueryService,
    /// Schema key to the instance the results are written to
    pub object_id: BTreeMap<String, String>,
    pub replies: UnboundedSender<String>,
}

/// Starts the worker. It stops once every sender has been dropped and returns its counters.
pub fn spawn_pipeline<R, F>(
    mut assembler: TripleAssembler<R, F>,
    feedback: Option<ReasoningFeedback>,
) -> (Sender<DataMessage>, JoinHandle<PipelineStats>)
where
    R: ReasonerPort + Send + 'static,
    F: FilePort + Send + 'static,
{
    let (sender, receiver) = channel::<DataMessage>();

    let handle = thread::spawn(move || {
        let mut stats = PipelineStats::default();
        for message in receiver {
            match assembler.transform_message_to_rdf_triple(&message) {
                Ok(Some(output)) => {
                    stats.processed += 1;
                    debug!("Stored {} bytes of triples for '{}'", output.len(), message.header.id);
                }
                Ok(None) => stats.empty += 1,
                Err(e) => {
                    stats.failed += 1;
                    error!("Failed to transform message of '{}': {}", message.header.id, e);
                    continue;
                }
            }

            if let Some(feedback) = &feedback {
                stats.replies += send_reasoning_results(&mut assembler, feedback);
            }
        }
        info!(
            "Pipeline stopped: {} stored, {} empty, {} failed, {} replies",
            stats.processed, stats.empty, stats.failed, stats.replies
        );
        stats
    });

    (sender, handle)
}

fn send_reasoning_results<R, F>(
    assembler: &mut TripleAssembler<R, F>,
    feedback: &ReasoningFeedback,
) -> u64
where
    R: ReasonerPort,
    F: FilePort,
{
    let results = assembler.run_reasoning_queries(&feedback.service);
    if results.is_empty() {
        return 0;
    }

    let mut sent = 0;
    for message in SetMessageDto::from_reasoning_results(&feedback.object_id, &results, &Utc::now())
    {
        let frame = match message.to_json() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to encode set message for '{}': {}", message.instance, e);
                continue;
            }
        };
        if feedback.replies.send(frame).is_err() {
            warn!("WebSocket session is gone, dropping reasoning results");
            break;
        }
        sent += 1;
    }
    sent
}
