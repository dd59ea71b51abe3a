use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info};

use super::Perceiver;
use crate::common::Frame;
use crate::config::DetectionSettings;
use crate::error::InferenceError;
use crate::pipeline::collaborators::ObjectDetector;
use crate::pipeline::flags::{FlagKind, FlagMonitorHandle, TimedLatch};
use crate::pipeline::types::{Detection, RegionOfInterest};

/// Runs the object detector over a centered window of each frame and reports
/// the most confident hit to the flag monitor.
pub struct DetectionPerceiver {
    detector: Box<dyn ObjectDetector>,
    roi_width: u32,
    roi_height: u32,
    min_confidence: f32,
    flags: FlagMonitorHandle,
    cooldown: TimedLatch,
    report_interval: Duration,
    last_reported: Option<Instant>,
}

impl DetectionPerceiver {
    pub fn new(
        detector: Box<dyn ObjectDetector>,
        settings: &DetectionSettings,
        flags: FlagMonitorHandle,
    ) -> Self {
        Self {
            detector,
            roi_width: settings.roi_width,
            roi_height: settings.roi_height,
            min_confidence: settings.min_confidence,
            flags,
            cooldown: TimedLatch::new(settings.cooldown()),
            report_interval: settings.report_interval(),
            last_reported: None,
        }
    }

    fn best<'a>(&self, detections: &'a [Detection]) -> Option<&'a Detection> {
        detections
            .iter()
            .filter(|d| d.confidence >= self.min_confidence)
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
    }

    fn log_detection(&mut self, detection: &Detection) {
        let now = Instant::now();
        let due = self
            .last_reported
            .map(|last| now.duration_since(last) >= self.report_interval)
            .unwrap_or(true);
        if due {
            info!("Detected: {} ({:.2})", detection.label, detection.confidence);
            self.last_reported = Some(now);
        }
    }
}

#[async_trait]
impl Perceiver for DetectionPerceiver {
    fn name(&self) -> &'static str {
        "detection"
    }

    async fn process(&mut self, frame: &Frame) -> Result<(), InferenceError> {
        let region = RegionOfInterest::centered(
            frame.width(),
            frame.height(),
            self.roi_width,
            self.roi_height,
        );
        if region.is_empty() {
            debug!("Frame {} too small for a detection window", frame.sequence());
            return Ok(());
        }

        let detections = self.detector.infer(frame, region).await?;
        let Some(best) = self.best(&detections).cloned() else {
            return Ok(());
        };

        // The label always goes first so the composite alert names this class.
        self.flags.report_label(best.label.clone());
        if self.cooldown.try_engage() {
            debug!("Detection flag raised by {}", best.label);
            self.flags.notify(FlagKind::Detection);
        }
        self.log_detection(&best);
        Ok(())
    }
}
