//! Caption advance worker
//!
//! Waits for playback to start, then sleeps through each inter-caption
//! delay and advances the model. Cancelling the start gate ends the worker
//! whether it is still waiting or mid-sleep.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::captions::model::CaptionModel;
use crate::error::{CaptionError, Result};
use crate::signal::{GateOutcome, StartGate};

/// What the worker got through before exiting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionStreamReport {
    pub advanced: usize,
    pub completed: bool,
}

/// Run the advance loop on the calling thread
pub fn run_caption_stream(
    gate: &StartGate,
    delays: &[Duration],
    model: &CaptionModel,
) -> CaptionStreamReport {
    let mut report = CaptionStreamReport {
        advanced: 0,
        completed: false,
    };

    if gate.wait() == GateOutcome::Cancelled {
        tracing::info!("Caption stream cancelled before playback started");
        return report;
    }
    tracing::info!("Caption stream started with {} captions", delays.len());

    for (i, delay) in delays.iter().enumerate() {
        if !gate.sleep_unless_cancelled(*delay) {
            tracing::info!("Caption stream cancelled at caption {}", i);
            return report;
        }
        let index = model.advance();
        report.advanced += 1;
        match model.current() {
            Some(caption) => tracing::debug!(
                index,
                speaker = %caption.speaker,
                message_id = caption.message_id,
                chunk_id = caption.chunk_id,
                "Caption advanced"
            ),
            None => tracing::debug!(index, "Caption advanced past the last loaded caption"),
        }
    }

    report.completed = true;
    tracing::info!("Caption stream finished");
    report
}

/// Handle to a running caption advance thread
pub struct CaptionStream {
    handle: JoinHandle<CaptionStreamReport>,
    gate: Arc<StartGate>,
}

impl CaptionStream {
    pub fn spawn(
        gate: Arc<StartGate>,
        delays: Vec<Duration>,
        model: Arc<CaptionModel>,
    ) -> Result<Self> {
        let worker_gate = Arc::clone(&gate);
        let handle = thread::Builder::new()
            .name("caption-stream".to_string())
            .spawn(move || run_caption_stream(&worker_gate, &delays, &model))
            .map_err(|e| CaptionError::Thread(format!("spawn caption-stream: {}", e)))?;
        Ok(Self { handle, gate })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the gate and wait for the worker
    pub fn cancel_and_join(self) -> Result<CaptionStreamReport> {
        self.gate.cancel();
        self.handle
            .join()
            .map_err(|_| CaptionError::Thread("caption-stream panicked".to_string()))
    }
}
