use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::sanitize;
use crate::config::SpeechSettings;
use crate::error::{AppError, SynthesisError};
use crate::pipeline::collaborators::SpeechSynthesizer;

const BINARY: &str = "espeak-ng";

/// Plays advisories through the `espeak-ng` command line engine.
pub struct EspeakSpeech {
    rate: u32,
    amplitude: u32,
    voice: Option<String>,
}

impl EspeakSpeech {
    /// Confirms `espeak-ng` runs before any advisory depends on it.
    pub async fn new(settings: &SpeechSettings) -> Result<Self, AppError> {
        let mut version = Command::new(BINARY);
        version.arg("--version");
        check_engine(version).await?;

        info!(engine = BINARY, "Speech engine ready");
        Ok(Self {
            rate: settings.rate,
            amplitude: amplitude(settings.volume),
            voice: settings.voice.clone(),
        })
    }

    fn command(&self, text: &str) -> Command {
        let mut command = Command::new(BINARY);
        command
            .arg("-s")
            .arg(self.rate.to_string())
            .arg("-a")
            .arg(self.amplitude.to_string());
        if let Some(voice) = &self.voice {
            command.arg("-v").arg(voice);
        }
        command.arg(text);
        command
    }
}

// A binary that cannot be spawned is a missing resource; one that runs and
// fails is an engine error.
async fn check_engine(mut command: Command) -> Result<(), AppError> {
    let output = command
        .output()
        .await
        .map_err(|e| AppError::ResourceAcquisition {
            resource: "speech engine",
            reason: format!("{BINARY} is not installed or not on PATH: {e}"),
        })?;
    if !output.status.success() {
        return Err(SynthesisError::Engine(format!(
            "{BINARY} self-check exited with {}",
            output.status
        ))
        .into());
    }
    Ok(())
}

/// espeak amplitude runs 0..=200; volume is a 0..=1 fraction.
fn amplitude(volume: f32) -> u32 {
    (volume.clamp(0.0, 1.0) * 200.0).round() as u32
}

#[async_trait]
impl SpeechSynthesizer for EspeakSpeech {
    async fn speak(&mut self, text: &str) -> Result<(), SynthesisError> {
        let text = sanitize(text);
        if text.is_empty() {
            return Ok(());
        }
        debug!(engine = BINARY, "Speaking \"{}\"", text);

        let output = self.command(&text).output().await?;
        if !output.status.success() {
            return Err(SynthesisError::Engine(format!(
                "{BINARY} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "espeak"
    }
}
