/// The 21 hand keypoints in the order hand-landmark models emit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexMcp = 5,
    IndexPip = 6,
    IndexDip = 7,
    IndexTip = 8,
    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,
    RingMcp = 13,
    RingPip = 14,
    RingDip = 15,
    RingTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

pub const NUM_LANDMARKS: usize = 21;

/// One detected hand: normalized `(x, y)` image coordinates per keypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: Vec<(f32, f32)>,
}

impl HandLandmarks {
    pub fn new(points: Vec<(f32, f32)>) -> Self {
        Self { points }
    }

    pub fn point(&self, landmark: HandLandmark) -> Option<(f32, f32)> {
        self.points.get(landmark as usize).copied()
    }

    pub fn distance(&self, a: HandLandmark, b: HandLandmark) -> Option<f32> {
        let (ax, ay) = self.point(a)?;
        let (bx, by) = self.point(b)?;
        Some(((ax - bx).powi(2) + (ay - by).powi(2)).sqrt())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
