/// Axis-aligned box in pixel coordinates: `[x1, y1, x2, y2]`.
pub type BoundingBox = [f32; 4];

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            label: label.into(),
            bbox,
            confidence,
        }
    }
}

/// Pixel rectangle of the frame handed to the object detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionOfInterest {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionOfInterest {
    /// A `width × height` window centered in the frame, shrunk to fit when the
    /// frame is smaller than the window.
    pub fn centered(frame_width: u32, frame_height: u32, width: u32, height: u32) -> Self {
        let width = width.min(frame_width);
        let height = height.min(frame_height);
        Self {
            x: (frame_width - width) / 2,
            y: (frame_height - height) / 2,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_region_in_hd_frame() {
        let roi = RegionOfInterest::centered(1280, 720, 320, 480);
        assert_eq!(
            roi,
            RegionOfInterest {
                x: 480,
                y: 120,
                width: 320,
                height: 480
            }
        );
    }

    #[test]
    fn region_is_clamped_to_small_frames() {
        let roi = RegionOfInterest::centered(200, 100, 320, 480);
        assert_eq!((roi.x, roi.y, roi.width, roi.height), (0, 0, 200, 100));
        assert!(RegionOfInterest::centered(0, 0, 320, 480).is_empty());
    }
}
