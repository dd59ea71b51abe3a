pub mod advisory;
pub mod collaborators;
pub mod flags;
pub mod frame_hub;
pub mod perception;
pub mod run_state;
pub mod types;

pub use frame_hub::{FrameHub, FrameSubscriber};
pub use run_state::RunState;
