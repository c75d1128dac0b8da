//! Progression worker: an explicit loop that applies progression requests one at a time.
//!
//! Requests arrive on an mpsc channel and each answer goes back on its own oneshot. Because a
//! single task drains the queue, two progression requests for the same tournament never run
//! concurrently, and tests can drive it without timers.

use crate::logic::{advance, Advance};
use crate::models::{BracketError, TournamentId};
use crate::store::MatchStore;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Queue depth used by the web binary.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

pub struct ProgressionRequest {
    pub tournament_id: TournamentId,
    reply: oneshot::Sender<Result<Advance, BracketError>>,
}

/// Client side: cheap to clone, one per request handler.
#[derive(Clone)]
pub struct ProgressionHandle {
    tx: mpsc::Sender<ProgressionRequest>,
}

/// Server side: owns the store and drains the queue.
pub struct ProgressionWorker {
    store: Arc<dyn MatchStore>,
    rx: mpsc::Receiver<ProgressionRequest>,
}

/// Create a connected handle/worker pair.
pub fn progression_channel(
    store: Arc<dyn MatchStore>,
    capacity: usize,
) -> (ProgressionHandle, ProgressionWorker) {
    let (tx, rx) = mpsc::channel(capacity);
    (ProgressionHandle { tx }, ProgressionWorker { store, rx })
}

impl ProgressionHandle {
    /// Queue an `advance` for the tournament and wait for its result.
    pub async fn advance(&self, tournament_id: TournamentId) -> Result<Advance, BracketError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ProgressionRequest {
                tournament_id,
                reply,
            })
            .await
            .map_err(|_| BracketError::WorkerUnavailable)?;
        rx.await.map_err(|_| BracketError::WorkerUnavailable)?
    }
}

impl ProgressionWorker {
    /// Handle one request.
    pub fn process(&self, request: ProgressionRequest) {
        let result = advance(self.store.as_ref(), request.tournament_id);
        if let Err(e) = &result {
            log::debug!("advance({}) rejected: {}", request.tournament_id, e);
        }
        // The requester may have gone away; nothing to do then.
        let _ = request.reply.send(result);
    }

    /// Run until every handle is dropped.
    pub async fn run(mut self) {
        log::info!("Progression worker started");
        while let Some(request) = self.rx.recv().await {
            self.process(request);
        }
        log::info!("Progression worker stopped: all handles dropped");
    }
}
