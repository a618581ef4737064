mod config;
mod core;
mod db;
mod error;
mod features;
mod predict;
mod record;
mod scales;
mod writer;

use std::path::Path;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::core::pipeline::{FailureReason, PipelineOutput, run_pipeline};
use crate::core::{RawResponse, SessionEvent};
use crate::db::SharedDatabase;
use crate::predict::PredictionClient;
use crate::writer::{RetryPolicy, spawn_record_writer};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("phishgauge=info".parse().unwrap()),
        )
        .init();

    tracing::info!("phishgauge starting...");

    // Load configuration
    let config = Config::load("config.toml");
    tracing::info!("Config: {:?}", config);

    // Survey answers for one completed session, keyed by item code
    let responses_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "responses.json".into());
    let responses: RawResponse = {
        let contents = std::fs::read_to_string(&responses_path)
            .unwrap_or_else(|e| panic!("Failed to read {responses_path}: {e}"));
        serde_json::from_str(&contents)
            .unwrap_or_else(|e| panic!("Failed to parse {responses_path}: {e}"))
    };
    tracing::info!("Loaded {} answers from {responses_path}", responses.len());

    // Open assessment database
    let db_path = Path::new(&config.storage.path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create database directory");
    }
    let db = SharedDatabase::open(db_path).expect("Failed to open assessment database");
    tracing::info!("Assessment database opened at {}", config.storage.path);

    // Prediction-service client
    let predictor =
        PredictionClient::new(&config.model).expect("Failed to build prediction client");
    tracing::info!("Prediction client configured for {}", config.model.endpoint_url);

    // Pipeline → writer channel; the writer task owns the retry budget
    let (writer_tx, writer_rx) = mpsc::unbounded_channel();
    let writer_handle = spawn_record_writer(
        db.clone(),
        writer_rx,
        RetryPolicy::from_config(&config.storage),
    );

    // Session events → pipeline → result view channels
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<PipelineOutput>();
    let pipeline_handle = tokio::spawn(run_pipeline(
        event_rx,
        out_tx,
        writer_tx,
        predictor,
        config.clone(),
    ));

    let session_id = uuid::Uuid::new_v4().to_string();
    event_tx
        .send(SessionEvent::Completed {
            session_id,
            responses,
        })
        .expect("Pipeline channel closed");

    if let Some(output) = out_rx.recv().await {
        match output {
            PipelineOutput::Result(outcome) => {
                tracing::info!(
                    "{} Risk level {} (probability {:.2})",
                    outcome.risk_level.emoji(),
                    outcome.risk_level.as_str(),
                    outcome.probability
                );
                for (name, score) in &outcome.scores {
                    tracing::info!("  {name}: {score:.2}");
                }
            }
            PipelineOutput::Failed { reason, .. } => match reason {
                FailureReason::MissingInput(field) => {
                    tracing::error!("Assessment incomplete: {field} was not answered");
                }
                FailureReason::InvalidInput(detail) => {
                    tracing::error!("Assessment rejected: {detail}");
                }
                FailureReason::PredictionUnavailable => {
                    tracing::error!("Could not complete the analysis, please retry later");
                }
            },
        }
    }

    // Shut down: close the event channel, then wait for the writer to drain
    // so no accepted record is abandoned.
    drop(event_tx);
    pipeline_handle.await.ok();
    writer_handle.await.ok();

    match db.response_count() {
        Ok(count) => tracing::info!("Stored assessments: {count}"),
        Err(e) => tracing::warn!("Could not read stored assessment count: {e}"),
    }
}
