use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info};

use super::Perceiver;
use crate::common::Frame;
use crate::config::GestureSettings;
use crate::error::InferenceError;
use crate::pipeline::collaborators::HandLandmarker;
use crate::pipeline::flags::{FlagKind, FlagMonitorHandle};
use crate::pipeline::types::{HandLandmark, HandLandmarks};

/// A hand is "catching" when the pinky tip has curled down to its knuckle.
pub fn is_catch(hand: &HandLandmarks, threshold: f32) -> bool {
    hand.distance(HandLandmark::PinkyTip, HandLandmark::PinkyMcp)
        .map(|distance| distance < threshold)
        .unwrap_or(false)
}

pub struct GesturePerceiver {
    landmarker: Box<dyn HandLandmarker>,
    catch_threshold: f32,
    flags: FlagMonitorHandle,
    catching: bool,
    log_interval: Duration,
    last_logged: Option<Instant>,
}

impl GesturePerceiver {
    pub fn new(
        landmarker: Box<dyn HandLandmarker>,
        settings: &GestureSettings,
        flags: FlagMonitorHandle,
    ) -> Self {
        Self {
            landmarker,
            catch_threshold: settings.catch_threshold,
            flags,
            catching: false,
            log_interval: settings.log_interval(),
            last_logged: None,
        }
    }

    fn log_catch(&mut self) {
        let now = Instant::now();
        let due = self
            .last_logged
            .map(|last| now.duration_since(last) >= self.log_interval)
            .unwrap_or(true);
        if due {
            info!("CATCH - pinky tip near MCP");
            self.last_logged = Some(now);
        }
    }
}

#[async_trait]
impl Perceiver for GesturePerceiver {
    fn name(&self) -> &'static str {
        "gesture"
    }

    async fn process(&mut self, frame: &Frame) -> Result<(), InferenceError> {
        let hands = self.landmarker.infer(frame).await?;
        let catching = hands
            .iter()
            .any(|hand| is_catch(hand, self.catch_threshold));

        if catching && !self.catching {
            debug!("Catch gesture started on frame {}", frame.sequence());
            self.flags.notify(FlagKind::Gesture);
        }
        if catching {
            self.log_catch();
        }
        self.catching = catching;
        Ok(())
    }
}
