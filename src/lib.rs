pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod intake;
pub mod pipeline;
pub mod simulation;
pub mod speech;

pub use config::Configuration;
pub use coordinator::{Coordinator, CoordinatorBuilder, ShutdownReport};
pub use error::AppError;
pub use pipeline::{FrameHub, RunState};
