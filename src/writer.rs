use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::StorageConfig;
use crate::db::SharedDatabase;
use crate::error::{PipelineError, StoreError};
use crate::record::ResultRecord;

/// Storage collaborator seam: the retry logic is written against this trait
/// so it can be exercised with a flaky in-memory store.
pub trait RecordStore: Send + Sync {
    fn insert_record(&self, record: &ResultRecord) -> Result<(), StoreError>;
}

impl RecordStore for SharedDatabase {
    fn insert_record(&self, record: &ResultRecord) -> Result<(), StoreError> {
        self.insert_response(record).map_err(|e| Box::new(e) as StoreError)
    }
}

/// Bounded retry: `max_attempts` total tries with linear backoff
/// (`attempt * base_delay`) between them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }
}

/// Attempt the write up to the retry budget. Returns the attempt count on
/// success; after the final failed attempt the underlying cause is wrapped
/// in `StorageWrite` rather than retrying indefinitely.
pub async fn persist_with_retry<S: RecordStore>(
    store: &S,
    record: &ResultRecord,
    policy: &RetryPolicy,
) -> Result<u32, PipelineError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match store.insert_record(record) {
            Ok(()) => return Ok(attempt),
            Err(e) if attempt < policy.max_attempts => {
                warn!(
                    "Write attempt {attempt}/{} for record {} failed: {e}, retrying",
                    policy.max_attempts, record.response_id
                );
                tokio::time::sleep(policy.base_delay * attempt).await;
            }
            Err(e) => {
                return Err(PipelineError::StorageWrite {
                    response_id: record.response_id.clone(),
                    attempts: attempt,
                    source: e,
                });
            }
        }
    }
}

/// Spawn the background writer task. Records arrive on the channel, each is
/// persisted with bounded retries, and permanent failures are logged with
/// full context but never surfaced to the interactive path — persistence is
/// best-effort by design. When all senders are dropped the task drains what
/// is left and exits.
pub fn spawn_record_writer<S: RecordStore + 'static>(
    store: S,
    mut rx: mpsc::UnboundedReceiver<ResultRecord>,
    policy: RetryPolicy,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut written = 0u64;
        while let Some(record) = rx.recv().await {
            match persist_with_retry(&store, &record, &policy).await {
                Ok(attempts) => {
                    written += 1;
                    if attempts > 1 {
                        info!(
                            "Record {} stored after {attempts} attempts",
                            record.response_id
                        );
                    } else {
                        debug!("Record {} stored", record.response_id);
                    }
                }
                Err(e) => {
                    error!("Dropping record after retry budget exhausted: {e}");
                }
            }
        }
        info!("Record writer shutting down, {written} records stored");
    })
}
