use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::AdvisoryQueue;
use crate::pipeline::collaborators::SpeechSynthesizer;
use crate::pipeline::RunState;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackStats {
    pub spoken: u64,
    pub failed: u64,
}

/// The single consumer of an [`AdvisoryQueue`]: speaks one message at a time
/// and pauses for `gap` between messages.
pub struct SpeechWorker {
    queue: Arc<AdvisoryQueue>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    gap: Duration,
    run_state: RunState,
}

impl SpeechWorker {
    pub fn new(
        queue: Arc<AdvisoryQueue>,
        synthesizer: Box<dyn SpeechSynthesizer>,
        gap: Duration,
        run_state: RunState,
    ) -> Self {
        Self {
            queue,
            synthesizer,
            gap,
            run_state,
        }
    }

    pub fn spawn(self) -> JoinHandle<PlaybackStats> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) -> PlaybackStats {
        let mut stats = PlaybackStats::default();
        info!(engine = self.synthesizer.name(), "Speech worker started");

        while self.run_state.is_running() {
            let message = match self.queue.begin_next() {
                Some(message) => message,
                None => {
                    tokio::select! {
                        _ = self.run_state.stopped() => break,
                        _ = self.queue.wait_for_message() => {}
                    }
                    continue;
                }
            };

            info!("TTS output: {}", message.text);
            match self.synthesizer.speak(&message.text).await {
                Ok(()) => stats.spoken += 1,
                Err(e) => {
                    stats.failed += 1;
                    error!("Failed to speak '{}': {}", message.text, e);
                }
            }
            self.queue.finish_current();

            tokio::select! {
                _ = self.run_state.stopped() => break,
                _ = tokio::time::sleep(self.gap) => {}
            }
        }

        debug!("Speech worker left {} advisories unspoken", self.queue.len());
        info!(
            spoken = stats.spoken,
            failed = stats.failed,
            "Speech worker stopped"
        );
        stats
    }
}
