mod depth;
mod detection;
mod gesture;

pub use depth::{DepthGrid, DepthPerceiver, Direction};
pub use detection::DetectionPerceiver;
pub use gesture::{is_catch, GesturePerceiver};

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::common::{panic_message, Frame};
use crate::error::InferenceError;
use crate::pipeline::{FrameSubscriber, RunState};

/// One perception producer: turns a frame into decisions or flag events.
#[async_trait]
pub trait Perceiver: Send {
    fn name(&self) -> &'static str;

    async fn process(&mut self, frame: &Frame) -> Result<(), InferenceError>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PerceptionStats {
    pub frames_processed: u64,
    pub failures: u64,
}

/// Drives a [`Perceiver`] over the frames published to the hub until the
/// run state stops or the hub goes away.
pub struct PerceptionTask {
    perceiver: Box<dyn Perceiver>,
    frames: FrameSubscriber,
    run_state: RunState,
}

impl PerceptionTask {
    pub fn new(perceiver: Box<dyn Perceiver>, frames: FrameSubscriber, run_state: RunState) -> Self {
        Self {
            perceiver,
            frames,
            run_state,
        }
    }

    pub fn name(&self) -> &'static str {
        self.perceiver.name()
    }

    pub fn spawn(self) -> JoinHandle<PerceptionStats> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) -> PerceptionStats {
        let name = self.perceiver.name();
        let mut stats = PerceptionStats::default();
        info!(task = name, "Perception task started");

        while self.run_state.is_running() {
            let frame = tokio::select! {
                _ = self.run_state.stopped() => break,
                frame = self.frames.next_frame() => frame,
            };
            let Some(frame) = frame else {
                warn!(task = name, "Frame hub closed");
                break;
            };

            // A panic counts as an unavailable backend.
            let result = AssertUnwindSafe(self.perceiver.process(&frame))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    Err(InferenceError::Unavailable(format!(
                        "perceiver panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                });

            match result {
                Ok(()) => stats.frames_processed += 1,
                Err(InferenceError::Failed(reason)) => {
                    stats.failures += 1;
                    warn!(
                        task = name,
                        "Skipping frame {}: {}",
                        frame.sequence(),
                        reason
                    );
                }
                Err(InferenceError::Unavailable(reason)) => {
                    stats.failures += 1;
                    error!(task = name, "Cannot continue: {}", reason);
                    self.run_state.stop(name);
                    break;
                }
            }

            tokio::task::yield_now().await;
        }

        info!(
            task = name,
            frames = stats.frames_processed,
            failures = stats.failures,
            "Perception task stopped"
        );
        stats
    }
}
