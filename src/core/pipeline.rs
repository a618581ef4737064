use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::core::{AssessmentOutcome, ModelOutput, RawResponse, RiskLevel, ScoreMap, SessionEvent};
use crate::error::PipelineError;
use crate::features;
use crate::predict::Predictor;
use crate::record::{self, ResultRecord};
use crate::scales::{ScaleSet, alias};

/// Messages from pipeline to the result view.
#[derive(Debug, Clone)]
pub enum PipelineOutput {
    Result(AssessmentOutcome),
    Failed {
        session_id: String,
        reason: FailureReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// A required field was never answered; the UI can name it.
    MissingInput(String),
    /// A present value could not be interpreted — corrupted session state.
    InvalidInput(String),
    /// The prediction service was unreachable or returned nothing usable.
    PredictionUnavailable,
}

/// Per-session state: normalized responses plus cached computation results,
/// so re-rendering a result view recomputes nothing and the record is
/// dispatched to the writer at most once.
struct AssessmentContext {
    responses: RawResponse,
    scores: Option<ScoreMap>,
    prediction: Option<ModelOutput>,
    persisted: bool,
}

/// Run the pipeline: receive session events, score, predict, classify, and
/// hand completed records to the writer channel. Storage health never
/// affects the emitted outcome.
pub async fn run_pipeline<P: Predictor>(
    mut rx: mpsc::UnboundedReceiver<SessionEvent>,
    out_tx: mpsc::UnboundedSender<PipelineOutput>,
    writer_tx: mpsc::UnboundedSender<ResultRecord>,
    predictor: P,
    config: Config,
) {
    let scales = ScaleSet::new();
    let mut sessions: HashMap<String, AssessmentContext> = HashMap::new();
    let mut completed: u64 = 0;

    info!("Pipeline started, waiting for session events...");

    while let Some(event) = rx.recv().await {
        let session_id = match event {
            SessionEvent::Completed {
                session_id,
                responses,
            } => {
                sessions.insert(
                    session_id.clone(),
                    AssessmentContext {
                        responses: alias::normalize_keys(&responses),
                        scores: None,
                        prediction: None,
                        persisted: false,
                    },
                );
                completed += 1;
                session_id
            }
            SessionEvent::ResultViewed { session_id } => {
                if !sessions.contains_key(&session_id) {
                    warn!("Result view for unknown session {session_id}, ignoring");
                    continue;
                }
                session_id
            }
        };

        let ctx = sessions
            .get_mut(&session_id)
            .expect("session inserted above");
        let output = assess(&session_id, ctx, &scales, &predictor, &writer_tx, &config).await;
        if out_tx.send(output).is_err() {
            info!("Output channel closed, stopping pipeline");
            break;
        }
    }

    info!("Pipeline shutting down after {completed} assessments");
}

async fn assess<P: Predictor>(
    session_id: &str,
    ctx: &mut AssessmentContext,
    scales: &ScaleSet,
    predictor: &P,
    writer_tx: &mpsc::UnboundedSender<ResultRecord>,
    config: &Config,
) -> PipelineOutput {
    let scores = ctx
        .scores
        .get_or_insert_with(|| scales.compute_scores(&ctx.responses))
        .clone();

    // Validation boundary: nothing leaves the process until the feature
    // contract is satisfied.
    let features = match features::assemble(&scores, &ctx.responses) {
        Ok(features) => features,
        Err(PipelineError::MissingField(field)) => {
            warn!("Session {session_id}: required field {field} not answered");
            return PipelineOutput::Failed {
                session_id: session_id.to_string(),
                reason: FailureReason::MissingInput(field),
            };
        }
        Err(e) => {
            error!("Session {session_id}: corrupted input, {e}");
            return PipelineOutput::Failed {
                session_id: session_id.to_string(),
                reason: FailureReason::InvalidInput(e.to_string()),
            };
        }
    };

    let prediction = match &ctx.prediction {
        Some(prediction) => prediction.clone(),
        None => match predictor.predict(&features).await {
            Ok(prediction) => {
                ctx.prediction = Some(prediction.clone());
                prediction
            }
            Err(e) => {
                error!("Session {session_id}: prediction call failed: {e}");
                return PipelineOutput::Failed {
                    session_id: session_id.to_string(),
                    reason: FailureReason::PredictionUnavailable,
                };
            }
        },
    };

    let Some(probability) = prediction.probability else {
        error!("Session {session_id}: model output carries no probability");
        return PipelineOutput::Failed {
            session_id: session_id.to_string(),
            reason: FailureReason::PredictionUnavailable,
        };
    };
    let risk_level = RiskLevel::from_probability(probability, &config.risk);

    // Fire-and-forget with bounded retry: dispatch to the writer at most
    // once per session, then render regardless of storage health.
    if !ctx.persisted {
        match record::build_record(
            ctx.responses.clone(),
            scores.clone(),
            &prediction,
            risk_level,
        ) {
            Ok(record) => {
                debug!(
                    "Session {session_id}: record {} handed to writer",
                    record.response_id
                );
                if writer_tx.send(record).is_err() {
                    warn!("Writer channel closed, record for session {session_id} dropped");
                }
                ctx.persisted = true;
            }
            Err(e) => {
                error!("Session {session_id}: refusing to persist, {e}");
                return PipelineOutput::Failed {
                    session_id: session_id.to_string(),
                    reason: FailureReason::InvalidInput(e.to_string()),
                };
            }
        }
    }

    PipelineOutput::Result(AssessmentOutcome {
        session_id: session_id.to_string(),
        scores,
        probability,
        risk_level,
    })
}
