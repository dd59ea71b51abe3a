use perception_advisor::config::LoggingSettings;
use perception_advisor::simulation::{
    ScriptedDepth, ScriptedDetector, ScriptedHands, SyntheticCamera,
};
use perception_advisor::speech::build_synthesizer;
use perception_advisor::{AppError, Configuration, CoordinatorBuilder, RunState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn stop_on_ctrl_c(run_state: RunState) {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl-C: {}", e);
                }
                run_state.stop("Ctrl-C received");
            }
            _ = run_state.stopped() => {}
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let configuration = Configuration::load()?;
    init_logging(&configuration.logging);
    info!("Configuration loaded: {:?}", configuration);

    let run_state = RunState::new();
    stop_on_ctrl_c(run_state.clone());

    let speech = build_synthesizer(&configuration.speech).await?;
    let camera = SyntheticCamera::new(&configuration.camera);
    let coordinator = CoordinatorBuilder::new(configuration)
        .run_state(run_state)
        .camera(Box::new(camera))
        .depth_estimator(Box::new(ScriptedDepth))
        .hand_landmarker(Box::new(ScriptedHands))
        .object_detector(Box::new(ScriptedDetector::default()))
        .speech(speech)
        .build()?;

    let report = coordinator.wait().await?;
    info!(
        frames = report.camera.frames_published,
        spoken = report.playback.spoken,
        "Shut down cleanly"
    );
    Ok(())
}
