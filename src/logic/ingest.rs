//! Ingestion Poll Driver
//!
//! Bridges an external sighting source (the telemetry collaborator) to the
//! engine. Polls on a fixed interval, applies each batch through the full
//! pipeline, and backs off while the source keeps failing. All transport
//! concerns stay on the source side; this loop only paces and applies.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::logic::config::PollConfig;
use crate::logic::device::SightingBatch;
use crate::logic::engine::Engine;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug)]
pub struct IngestError(pub String);

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IngestError: {}", self.0)
    }
}

impl std::error::Error for IngestError {}

// ============================================================================
// SOURCE CONTRACT
// ============================================================================

/// One poll of the telemetry collaborator.
///
/// The source captures the operator-position snapshot together with the
/// sightings so the whole batch shares one consistent fix.
pub trait SightingSource: Send + 'static {
    fn poll(&mut self) -> Result<SightingBatch, IngestError>;
}

impl<F> SightingSource for F
where
    F: FnMut() -> Result<SightingBatch, IngestError> + Send + 'static,
{
    fn poll(&mut self) -> Result<SightingBatch, IngestError> {
        self()
    }
}

// ============================================================================
// DRIVER
// ============================================================================

/// Handle for stopping a spawned ingest loop
#[derive(Clone)]
pub struct IngestHandle {
    running: Arc<AtomicBool>,
}

impl IngestHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Next poll delay: reset to base on success, double toward the cap on
/// failure
pub fn next_interval_secs(current: u64, poll: &PollConfig, failed: bool) -> u64 {
    if failed {
        (current * 2).clamp(poll.interval_secs, poll.max_interval_secs)
    } else {
        poll.interval_secs
    }
}

/// Spawn the poll loop on the current tokio runtime
pub fn spawn<S: SightingSource>(engine: Arc<Engine>, source: S, poll: PollConfig) -> IngestHandle {
    let running = Arc::new(AtomicBool::new(true));
    let handle = IngestHandle {
        running: running.clone(),
    };

    tokio::spawn(async move {
        ingest_loop(engine, source, poll, running).await;
    });

    handle
}

async fn ingest_loop<S: SightingSource>(
    engine: Arc<Engine>,
    mut source: S,
    poll: PollConfig,
    running: Arc<AtomicBool>,
) {
    log::info!(
        "ingest loop started (interval: {}s, max backoff: {}s)",
        poll.interval_secs,
        poll.max_interval_secs
    );

    let mut interval_secs = poll.interval_secs;

    while running.load(Ordering::SeqCst) {
        match source.poll() {
            Ok(batch) => {
                let report = engine.apply_batch(&batch);
                if report.dropped > 0 {
                    log::warn!("batch had {} malformed sightings", report.dropped);
                }
                interval_secs = next_interval_secs(interval_secs, &poll, false);
            }
            Err(e) => {
                interval_secs = next_interval_secs(interval_secs, &poll, true);
                log::error!("ingestion failed: {} (backing off to {}s)", e, interval_secs);
            }
        }

        tokio::time::sleep(Duration::from_secs(interval_secs)).await;
    }

    log::info!("ingest loop stopped");
}

// ============================================================================
// TESTS
// ============================================================================
