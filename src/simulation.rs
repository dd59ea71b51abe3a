//! Stand-in collaborators that let the advisor run without a camera or models.
//!
//! Everything is driven by the frame sequence number, replaying a fixed
//! scene every [`SCENE_PERIOD`] frames: an obstacle drifts from the left to
//! the right and then clears, a cider bottle is held up in front of the camera
//! and a catch gesture is made while it is visible.

use std::ops::Range;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use image::{DynamicImage, GrayImage, Luma};
use tokio::time::{Interval, MissedTickBehavior};

use crate::common::Frame;
use crate::config::CameraSettings;
use crate::error::{CameraError, InferenceError};
use crate::pipeline::collaborators::{
    CameraSource, DepthEstimator, HandLandmarker, ObjectDetector,
};
use crate::pipeline::types::{
    DepthMap, Detection, HandLandmark, HandLandmarks, RegionOfInterest, NUM_LANDMARKS,
};

pub const SCENE_PERIOD: u64 = 300;

const OBSTACLE_LEFT: Range<u64> = 0..90;
const OBSTACLE_RIGHT: Range<u64> = 90..180;
const BOTTLE_VISIBLE: Range<u64> = 120..200;
const CATCH_HELD: Range<u64> = 150..180;

const DEPTH_SIZE: usize = 10;

fn scene_phase(frame: &Frame) -> u64 {
    frame.sequence() % SCENE_PERIOD
}

/// Emits flat gray frames at the configured rate.
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    ticker: Interval,
    sequence: u64,
    limit: Option<u64>,
}

impl SyntheticCamera {
    pub fn new(settings: &CameraSettings) -> Self {
        let mut ticker = tokio::time::interval(settings.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            width: settings.width,
            height: settings.height,
            ticker,
            sequence: 0,
            limit: None,
        }
    }

    /// Ends the stream after `frames` frames, the way a video file would.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    pub fn frame_interval(&self) -> Duration {
        self.ticker.period()
    }
}

#[async_trait]
impl CameraSource for SyntheticCamera {
    async fn next_frame(&mut self) -> Result<Frame, CameraError> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::Open(format!(
                "unsupported resolution {}x{}",
                self.width, self.height
            )));
        }
        if self.limit.is_some_and(|limit| self.sequence >= limit) {
            return Err(CameraError::NoFrame("end of stream".to_string()));
        }

        self.ticker.tick().await;
        self.sequence += 1;
        let image = GrayImage::from_pixel(self.width, self.height, Luma([128]));
        Ok(Frame::new(
            self.sequence,
            DynamicImage::ImageLuma8(image),
            Utc::now(),
        ))
    }

    fn release(&mut self) {
        tracing::debug!("Synthetic camera released after {} frames", self.sequence);
    }
}

/// Raw inverse-distance output with a near band on one side of the view.
#[derive(Debug, Default)]
pub struct ScriptedDepth;

#[async_trait]
impl DepthEstimator for ScriptedDepth {
    async fn infer(&mut self, frame: &Frame) -> Result<DepthMap, InferenceError> {
        let phase = scene_phase(frame);
        let near_columns = if OBSTACLE_LEFT.contains(&phase) {
            0..DEPTH_SIZE / 2
        } else if OBSTACLE_RIGHT.contains(&phase) {
            DEPTH_SIZE / 2..DEPTH_SIZE
        } else {
            0..0
        };

        let raw: Vec<f32> = (0..DEPTH_SIZE * DEPTH_SIZE)
            .map(|i| {
                if near_columns.contains(&(i % DEPTH_SIZE)) {
                    10.0
                } else {
                    1.0
                }
            })
            .collect();
        DepthMap::from_raw(DEPTH_SIZE, DEPTH_SIZE, &raw)
            .ok_or_else(|| InferenceError::Failed("depth buffer size mismatch".to_string()))
    }
}

/// One open hand, curling its pinky while the catch is held.
#[derive(Debug, Default)]
pub struct ScriptedHands;

impl ScriptedHands {
    fn hand(pinky_gap: f32) -> HandLandmarks {
        let mut points = vec![(0.5, 0.6); NUM_LANDMARKS];
        points[HandLandmark::PinkyMcp as usize] = (0.42, 0.55);
        points[HandLandmark::PinkyTip as usize] = (0.42, 0.55 - pinky_gap);
        HandLandmarks::new(points)
    }
}

#[async_trait]
impl HandLandmarker for ScriptedHands {
    async fn infer(&mut self, frame: &Frame) -> Result<Vec<HandLandmarks>, InferenceError> {
        let gap = if CATCH_HELD.contains(&scene_phase(frame)) {
            0.01
        } else {
            0.15
        };
        Ok(vec![Self::hand(gap)])
    }
}

#[derive(Debug)]
pub struct ScriptedDetector {
    label: String,
}

impl ScriptedDetector {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Default for ScriptedDetector {
    fn default() -> Self {
        Self::new("cider")
    }
}

#[async_trait]
impl ObjectDetector for ScriptedDetector {
    async fn infer(
        &mut self,
        frame: &Frame,
        region: RegionOfInterest,
    ) -> Result<Vec<Detection>, InferenceError> {
        if !BOTTLE_VISIBLE.contains(&scene_phase(frame)) {
            return Ok(Vec::new());
        }
        let (x, y) = (region.x as f32, region.y as f32);
        let (w, h) = (region.width as f32, region.height as f32);
        Ok(vec![
            Detection::new(
                self.label.clone(),
                [x + w * 0.25, y + h * 0.1, x + w * 0.75, y + h * 0.9],
                0.9,
            ),
            Detection::new("person", [x, y, x + w, y + h], 0.2),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DepthSettings, GestureSettings};
    use crate::pipeline::perception::{is_catch, DepthGrid, Direction};

    fn frame(sequence: u64) -> Frame {
        Frame::new(sequence, DynamicImage::new_luma8(4, 4), Utc::now())
    }

    #[tokio::test]
    async fn depth_scene_drifts_left_to_right_then_clears() {
        let grid = DepthGrid::from(&DepthSettings::default());
        let mut depth = ScriptedDepth;
        let expected = [
            (10, Direction::AvoidToRight),
            (100, Direction::AvoidToLeft),
            (250, Direction::Balanced),
            (SCENE_PERIOD + 10, Direction::AvoidToRight),
        ];
        for (sequence, direction) in expected {
            let map = depth.infer(&frame(sequence)).await.unwrap();
            assert_eq!(grid.decide(&map), direction, "frame {sequence}");
        }
    }

    #[tokio::test]
    async fn catch_is_held_while_bottle_is_visible() {
        let threshold = GestureSettings::default().catch_threshold;
        let mut hands = ScriptedHands;
        let mut detector = ScriptedDetector::default();
        let roi = RegionOfInterest::centered(4, 4, 2, 2);

        let held = hands.infer(&frame(160)).await.unwrap();
        assert!(is_catch(&held[0], threshold));
        assert!(!detector.infer(&frame(160), roi).await.unwrap().is_empty());

        let open = hands.infer(&frame(20)).await.unwrap();
        assert!(!is_catch(&open[0], threshold));
        assert!(detector.infer(&frame(20), roi).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn camera_counts_frames_and_ends_at_limit() {
        let settings = CameraSettings {
            fps: 10,
            width: 8,
            height: 6,
        };
        let mut camera = SyntheticCamera::new(&settings).with_limit(2);
        assert_eq!(camera.frame_interval(), Duration::from_millis(100));

        let first = camera.next_frame().await.unwrap();
        let second = camera.next_frame().await.unwrap();
        assert_eq!((first.sequence(), second.sequence()), (1, 2));
        assert_eq!((second.width(), second.height()), (8, 6));
        assert!(matches!(
            camera.next_frame().await,
            Err(CameraError::NoFrame(_))
        ));
    }
}
