use async_trait::async_trait;

use crate::common::Frame;
use crate::error::{CameraError, InferenceError, SynthesisError};
use crate::pipeline::types::{DepthMap, Detection, HandLandmarks, RegionOfInterest};

/// Frame producer. Implementations that read from blocking device APIs should
/// do so on a blocking thread so the runtime keeps ticking.
#[async_trait]
pub trait CameraSource: Send {
    async fn next_frame(&mut self) -> Result<Frame, CameraError>;

    /// Releases the device. Called once when the camera task exits.
    fn release(&mut self) {}
}

#[async_trait]
pub trait DepthEstimator: Send {
    async fn infer(&mut self, frame: &Frame) -> Result<DepthMap, InferenceError>;
}

#[async_trait]
pub trait HandLandmarker: Send {
    async fn infer(&mut self, frame: &Frame) -> Result<Vec<HandLandmarks>, InferenceError>;
}

#[async_trait]
pub trait ObjectDetector: Send {
    async fn infer(
        &mut self,
        frame: &Frame,
        region: RegionOfInterest,
    ) -> Result<Vec<Detection>, InferenceError>;
}

/// Speaks one utterance, resolving only after playback has finished.
#[async_trait]
pub trait SpeechSynthesizer: Send {
    async fn speak(&mut self, text: &str) -> Result<(), SynthesisError>;

    fn name(&self) -> &'static str;
}
