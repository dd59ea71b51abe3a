use chrono::{DateTime, Utc};
use image::DynamicImage;
use std::sync::Arc;
use uuid::Uuid;

/// A captured camera image. Cloning shares the pixel buffer, so a published
/// frame is never mutated; readers that want to draw on it take a copy first.
#[derive(Clone, Debug)]
pub struct Frame {
    frame_id: Uuid,
    sequence: u64,
    image: Arc<DynamicImage>,
    captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(sequence: u64, image: DynamicImage, captured_at: DateTime<Utc>) -> Self {
        Self {
            frame_id: Uuid::new_v4(),
            sequence,
            image: Arc::new(image),
            captured_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.frame_id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn to_owned_image(&self) -> DynamicImage {
        self.image.as_ref().clone()
    }
}
