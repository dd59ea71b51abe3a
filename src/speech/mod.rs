mod espeak;
mod log_speech;

pub use espeak::EspeakSpeech;
pub use log_speech::LogSpeech;

use crate::config::{SpeechEngineKind, SpeechSettings};
use crate::error::AppError;
use crate::pipeline::collaborators::SpeechSynthesizer;

/// Builds the configured speech engine. Fails when an external engine binary
/// cannot be found, so the process never starts mute by accident.
pub async fn build_synthesizer(
    settings: &SpeechSettings,
) -> Result<Box<dyn SpeechSynthesizer>, AppError> {
    match settings.engine {
        SpeechEngineKind::Log => Ok(Box::new(LogSpeech::new(settings.rate))),
        SpeechEngineKind::Espeak => Ok(Box::new(EspeakSpeech::new(settings).await?)),
    }
}

/// Strips characters a speech engine cannot pronounce or might read as flags.
pub(crate) fn sanitize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    cleaned.trim().trim_start_matches('-').trim_start().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_drops_control_chars_and_leading_dashes() {
        assert_eq!(sanitize("Avoid\tto\nLeft"), "Avoid to Left");
        assert_eq!(sanitize("--help me"), "help me");
        assert_eq!(sanitize("  cider catch "), "cider catch");
    }

    #[tokio::test]
    async fn log_engine_is_the_default() {
        let synthesizer = build_synthesizer(&SpeechSettings::default())
            .await
            .unwrap();
        assert_eq!(synthesizer.name(), "log");
    }
}
