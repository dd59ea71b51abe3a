use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::info;

use crate::{
    config::Configuration,
    error::AppError,
    error::CameraError,
    intake::{CameraStats, CameraTask},
    pipeline::{
        advisory::{AdvisoryPolicy, AdvisoryQueue, PlaybackStats, SpeechWorker},
        collaborators::{
            CameraSource, DepthEstimator, HandLandmarker, ObjectDetector, SpeechSynthesizer,
        },
        flags::flag_monitor,
        perception::{
            DepthPerceiver, DetectionPerceiver, GesturePerceiver, PerceptionStats, Perceiver,
            PerceptionTask,
        },
        FrameHub, RunState,
    },
};

/// What every task reported when it exited.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub camera: CameraStats,
    pub perception: Vec<(&'static str, PerceptionStats)>,
    pub playback: PlaybackStats,
}

struct Tasks {
    camera: JoinHandle<Result<CameraStats, CameraError>>,
    perception: Vec<(&'static str, JoinHandle<PerceptionStats>)>,
    flag_monitor: JoinHandle<()>,
    speech: JoinHandle<PlaybackStats>,
}

/// Owns every running task of the advisor and the handles they share.
pub struct Coordinator {
    run_state: RunState,
    advisories: Arc<AdvisoryQueue>,
    frame_hub: FrameHub,
    tasks: Option<Tasks>,
}

impl Coordinator {
    fn start(configuration: Configuration, parts: Collaborators, run_state: RunState) -> Self {
        let frame_hub = FrameHub::new();
        let advisories = Arc::new(AdvisoryQueue::new(AdvisoryPolicy::from(
            &configuration.advisory,
        )));

        let speech = SpeechWorker::new(
            advisories.clone(),
            parts.speech,
            configuration.advisory.gap(),
            run_state.clone(),
        )
        .spawn();

        let (monitor, flags) =
            flag_monitor(&configuration.flags, advisories.clone(), run_state.clone());
        let flag_monitor = monitor.spawn();

        let perceivers: Vec<Box<dyn Perceiver>> = vec![
            Box::new(DepthPerceiver::new(
                parts.depth,
                &configuration.depth,
                advisories.clone(),
            )),
            Box::new(GesturePerceiver::new(
                parts.hands,
                &configuration.gesture,
                flags.clone(),
            )),
            Box::new(DetectionPerceiver::new(
                parts.detector,
                &configuration.detection,
                flags,
            )),
        ];
        let perception = perceivers
            .into_iter()
            .map(|perceiver| {
                let task =
                    PerceptionTask::new(perceiver, frame_hub.subscribe(), run_state.clone());
                (task.name(), task.spawn())
            })
            .collect();

        // Consumers subscribe first so the very first frame is not missed.
        let camera = CameraTask::new(parts.camera, frame_hub.clone(), run_state.clone()).spawn();

        info!("Coordinator started all tasks");
        Self {
            run_state,
            advisories,
            frame_hub,
            tasks: Some(Tasks {
                camera,
                perception,
                flag_monitor,
                speech,
            }),
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_state.clone()
    }

    pub fn advisories(&self) -> Arc<AdvisoryQueue> {
        self.advisories.clone()
    }

    pub fn frame_hub(&self) -> FrameHub {
        self.frame_hub.clone()
    }

    pub fn stop(&self) {
        self.run_state.stop("coordinator stop requested");
    }

    /// Stops every task and waits for each to finish its current unit of work.
    /// Every task is joined before a camera failure is reported.
    pub async fn shutdown(mut self) -> Result<ShutdownReport, AppError> {
        self.stop();
        let Some(tasks) = self.tasks.take() else {
            return Ok(ShutdownReport::default());
        };

        let camera = tasks
            .camera
            .await
            .map_err(|_| AppError::TaskJoin("camera".to_string()))?;

        let (names, handles): (Vec<_>, Vec<_>) = tasks.perception.into_iter().unzip();
        let mut perception = Vec::with_capacity(names.len());
        for (name, joined) in names.into_iter().zip(join_all(handles).await) {
            let stats = joined.map_err(|_| AppError::TaskJoin(name.to_string()))?;
            perception.push((name, stats));
        }

        tasks
            .flag_monitor
            .await
            .map_err(|_| AppError::TaskJoin("flag monitor".to_string()))?;
        let playback = tasks
            .speech
            .await
            .map_err(|_| AppError::TaskJoin("speech worker".to_string()))?;

        info!("All tasks stopped");
        Ok(ShutdownReport {
            camera: camera?,
            perception,
            playback,
        })
    }

    /// Runs until something stops the run state (Ctrl-C, a lost camera, an
    /// unavailable model), then shuts down.
    pub async fn wait(self) -> Result<ShutdownReport, AppError> {
        self.run_state.stopped().await;
        self.shutdown().await
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        if self.tasks.is_some() {
            self.stop();
        }
    }
}

struct Collaborators {
    camera: Box<dyn CameraSource>,
    depth: Box<dyn DepthEstimator>,
    hands: Box<dyn HandLandmarker>,
    detector: Box<dyn ObjectDetector>,
    speech: Box<dyn SpeechSynthesizer>,
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    run_state: Option<RunState>,
    camera: Option<Box<dyn CameraSource>>,
    depth: Option<Box<dyn DepthEstimator>>,
    hands: Option<Box<dyn HandLandmarker>>,
    detector: Option<Box<dyn ObjectDetector>>,
    speech: Option<Box<dyn SpeechSynthesizer>>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            run_state: None,
            camera: None,
            depth: None,
            hands: None,
            detector: None,
            speech: None,
        }
    }

    // Speaks "Balanced" depth decisions too, this will override the default configuration.
    pub fn announce_balanced(mut self, announce_balanced: bool) -> Self {
        self.configuration.depth.announce_balanced = announce_balanced;
        self
    }

    // Sets the pause between two advisories, this will override the default configuration.
    pub fn advisory_gap_ms(mut self, gap_ms: u64) -> Self {
        self.configuration.advisory.gap_ms = gap_ms;
        self
    }

    // Shares an externally owned run state, e.g. one already wired to Ctrl-C.
    pub fn run_state(mut self, run_state: RunState) -> Self {
        self.run_state = Some(run_state);
        self
    }

    pub fn camera(mut self, camera: Box<dyn CameraSource>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn depth_estimator(mut self, depth: Box<dyn DepthEstimator>) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn hand_landmarker(mut self, hands: Box<dyn HandLandmarker>) -> Self {
        self.hands = Some(hands);
        self
    }

    pub fn object_detector(mut self, detector: Box<dyn ObjectDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn speech(mut self, speech: Box<dyn SpeechSynthesizer>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Validates the configuration and spawns every task. Must be called from
    /// within a tokio runtime.
    pub fn build(self) -> Result<Coordinator, AppError> {
        self.configuration.validate()?;
        let parts = Collaborators {
            camera: self.camera.ok_or(AppError::MissingCollaborator("camera"))?,
            depth: self
                .depth
                .ok_or(AppError::MissingCollaborator("depth estimator"))?,
            hands: self
                .hands
                .ok_or(AppError::MissingCollaborator("hand landmarker"))?,
            detector: self
                .detector
                .ok_or(AppError::MissingCollaborator("object detector"))?,
            speech: self
                .speech
                .ok_or(AppError::MissingCollaborator("speech synthesizer"))?,
        };
        let run_state = self.run_state.unwrap_or_default();
        Ok(Coordinator::start(self.configuration, parts, run_state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraSettings;
    use crate::simulation::{ScriptedDepth, ScriptedDetector, ScriptedHands, SyntheticCamera};
    use crate::speech::LogSpeech;
    use std::time::Duration;

    fn camera_settings() -> CameraSettings {
        CameraSettings {
            fps: 30,
            width: 64,
            height: 48,
        }
    }

    fn builder(camera: SyntheticCamera) -> CoordinatorBuilder {
        CoordinatorBuilder::new(Configuration::default())
            .camera(Box::new(camera))
            .depth_estimator(Box::new(ScriptedDepth))
            .hand_landmarker(Box::new(ScriptedHands))
            .object_detector(Box::new(ScriptedDetector::default()))
            .speech(Box::new(LogSpeech::new(150)))
    }

    #[tokio::test]
    async fn build_requires_every_collaborator() {
        let result = CoordinatorBuilder::new(Configuration::default())
            .depth_estimator(Box::new(ScriptedDepth))
            .build();
        assert!(matches!(
            result,
            Err(AppError::MissingCollaborator("camera"))
        ));
    }

    #[tokio::test]
    async fn build_rejects_invalid_configuration() {
        let mut configuration = Configuration::default();
        configuration.flags.tick_ms = 0;
        let result = CoordinatorBuilder::new(configuration).build();
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_converges() {
        let coordinator = builder(SyntheticCamera::new(&camera_settings()))
            .build()
            .expect("Failed to build coordinator");

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(coordinator.frame_hub().latest().is_some());

        let report = tokio::time::timeout(Duration::from_secs(5), coordinator.shutdown())
            .await
            .expect("every task should observe the stop")
            .expect("no task should panic");
        assert!(report.camera.frames_published > 0);
        assert_eq!(report.perception.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_stream_stops_everything() {
        let camera = SyntheticCamera::new(&camera_settings()).with_limit(10);
        let coordinator = builder(camera).build().expect("Failed to build coordinator");

        let report = tokio::time::timeout(Duration::from_secs(5), coordinator.wait())
            .await
            .expect("a finished stream should stop the pipeline")
            .expect("no task should panic");
        assert_eq!(report.camera.frames_published, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn unopenable_camera_fails_the_run() {
        let settings = CameraSettings {
            width: 0,
            height: 0,
            ..camera_settings()
        };
        let coordinator = builder(SyntheticCamera::new(&settings))
            .build()
            .expect("Failed to build coordinator");

        let result = tokio::time::timeout(Duration::from_secs(5), coordinator.wait())
            .await
            .expect("a camera failure should stop the pipeline");
        assert!(matches!(
            result,
            Err(AppError::Camera(CameraError::Open(_)))
        ));
    }
}
