use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::CameraError;
use crate::pipeline::collaborators::CameraSource;
use crate::pipeline::{FrameHub, RunState};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CameraStats {
    pub frames_published: u64,
}

/// The single producer feeding the [`FrameHub`]. A camera that stops
/// delivering frames stops the whole pipeline; one that cannot be opened
/// also surfaces its error to whoever joins the task.
pub struct CameraTask {
    camera: Box<dyn CameraSource>,
    hub: FrameHub,
    run_state: RunState,
}

impl CameraTask {
    pub fn new(camera: Box<dyn CameraSource>, hub: FrameHub, run_state: RunState) -> Self {
        Self {
            camera,
            hub,
            run_state,
        }
    }

    pub fn spawn(self) -> JoinHandle<Result<CameraStats, CameraError>> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) -> Result<CameraStats, CameraError> {
        let mut stats = CameraStats::default();
        let mut fatal = None;
        info!("Camera task started");

        while self.run_state.is_running() {
            let result = tokio::select! {
                _ = self.run_state.stopped() => break,
                result = self.camera.next_frame() => result,
            };

            match result {
                Ok(frame) => {
                    debug!("Publishing frame {}", frame.sequence());
                    self.hub.publish(frame);
                    stats.frames_published += 1;
                }
                Err(CameraError::NoFrame(reason)) => {
                    info!("Camera stream ended: {}", reason);
                    self.run_state.stop("camera stopped delivering frames");
                    break;
                }
                Err(e) => {
                    error!("Camera failed: {}", e);
                    self.run_state.stop("camera failed");
                    fatal = Some(e);
                    break;
                }
            }

            tokio::task::yield_now().await;
        }

        self.camera.release();
        info!(
            frames = stats.frames_published,
            "Camera task stopped, device released"
        );
        match fatal {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }
}
