mod depth_map;
mod detection;
mod hand_landmarks;

pub use depth_map::DepthMap;
pub use detection::{BoundingBox, Detection, RegionOfInterest};
pub use hand_landmarks::{HandLandmark, HandLandmarks, NUM_LANDMARKS};
