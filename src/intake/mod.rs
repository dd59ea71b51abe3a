pub mod camera_task;

pub use camera_task::{CameraStats, CameraTask};
