use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::Perceiver;
use crate::common::Frame;
use crate::config::DepthSettings;
use crate::error::InferenceError;
use crate::pipeline::advisory::AdvisoryQueue;
use crate::pipeline::collaborators::DepthEstimator;
use crate::pipeline::types::DepthMap;

/// Which way the operator should move, away from the side with more near cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    AvoidToLeft,
    AvoidToRight,
    Balanced,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::AvoidToLeft => "Avoid to Left",
            Direction::AvoidToRight => "Avoid to Right",
            Direction::Balanced => "Balanced",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splits a depth map into `rows × cols` cells and counts the near ones on
/// each side of the center column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthGrid {
    pub rows: usize,
    pub cols: usize,
    pub near_threshold: f32,
}

impl From<&DepthSettings> for DepthGrid {
    fn from(settings: &DepthSettings) -> Self {
        Self {
            rows: settings.rows,
            cols: settings.cols,
            near_threshold: settings.near_threshold,
        }
    }
}

impl DepthGrid {
    pub fn decide(&self, map: &DepthMap) -> Direction {
        let (left, right) = self.near_counts(map);
        debug!("Near cells: left {}, right {}", left, right);
        if left > right {
            Direction::AvoidToRight
        } else if right > left {
            Direction::AvoidToLeft
        } else {
            Direction::Balanced
        }
    }

    /// `(left, right)` near-cell counts. Columns before `cols / 2` are left,
    /// the rest (the center column included when `cols` is odd) are right.
    pub fn near_counts(&self, map: &DepthMap) -> (usize, usize) {
        if self.rows == 0 || self.cols == 0 {
            return (0, 0);
        }
        let half = self.cols / 2;
        let (width, height) = (map.width(), map.height());

        let mut left = 0;
        let mut right = 0;
        for row in 0..self.rows {
            let (y0, y1) = (row * height / self.rows, (row + 1) * height / self.rows);
            for col in 0..self.cols {
                let (x0, x1) = (col * width / self.cols, (col + 1) * width / self.cols);
                let Some(mean) = map.mean_in(x0, x1, y0, y1) else {
                    continue;
                };
                if mean >= self.near_threshold {
                    if col < half {
                        left += 1;
                    } else {
                        right += 1;
                    }
                }
            }
        }
        (left, right)
    }
}

pub struct DepthPerceiver {
    estimator: Box<dyn DepthEstimator>,
    grid: DepthGrid,
    announce_balanced: bool,
    advisories: Arc<AdvisoryQueue>,
    last_direction: Option<Direction>,
}

impl DepthPerceiver {
    pub fn new(
        estimator: Box<dyn DepthEstimator>,
        settings: &DepthSettings,
        advisories: Arc<AdvisoryQueue>,
    ) -> Self {
        Self {
            estimator,
            grid: DepthGrid::from(settings),
            announce_balanced: settings.announce_balanced,
            advisories,
            last_direction: None,
        }
    }
}

#[async_trait]
impl Perceiver for DepthPerceiver {
    fn name(&self) -> &'static str {
        "depth"
    }

    async fn process(&mut self, frame: &Frame) -> Result<(), InferenceError> {
        let map = self.estimator.infer(frame).await?;
        let direction = self.grid.decide(&map);
        if self.last_direction != Some(direction) {
            debug!("Depth decision changed to {}", direction);
            self.last_direction = Some(direction);
        }

        if direction == Direction::Balanced && !self.announce_balanced {
            return Ok(());
        }
        let outcome = self.advisories.enqueue(direction.as_str(), false);
        debug!("Depth advisory '{}': {:?}", direction, outcome);
        Ok(())
    }
}
