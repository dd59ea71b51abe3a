use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Camera Error: {0}")]
    Camera(#[from] CameraError),
    #[error("Speech Error: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("Failed to acquire {resource}: {reason}")]
    ResourceAcquisition {
        resource: &'static str,
        reason: String,
    },
    #[error("Coordinator is missing its {0}")]
    MissingCollaborator(&'static str),
    #[error("Task {0} panicked or was aborted")]
    TaskJoin(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("No frame available: {0}")]
    NoFrame(String),
    #[error("Camera could not be opened: {0}")]
    Open(String),
}

// Failed is a single bad frame, Unavailable means the collaborator is gone for good.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Inference failed: {0}")]
    Failed(String),
    #[error("Inference backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Speech engine error: {0}")]
    Engine(String),
    #[error("Speech engine IO error: {0}")]
    Io(#[from] std::io::Error),
}
