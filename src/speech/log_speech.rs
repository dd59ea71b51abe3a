use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::sanitize;
use crate::error::SynthesisError;
use crate::pipeline::collaborators::SpeechSynthesizer;

/// Speaks into the log. Each utterance still takes as long as it would
/// when read aloud at `rate` words per minute, so pacing matches a real engine.
pub struct LogSpeech {
    words_per_minute: u32,
}

impl LogSpeech {
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute: words_per_minute.max(1),
        }
    }

    pub fn duration_of(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count().max(1) as u64;
        Duration::from_millis(words * 60_000 / u64::from(self.words_per_minute))
    }
}

#[async_trait]
impl SpeechSynthesizer for LogSpeech {
    async fn speak(&mut self, text: &str) -> Result<(), SynthesisError> {
        let text = sanitize(text);
        if text.is_empty() {
            return Ok(());
        }
        info!(engine = "log", "Speaking \"{}\"", text);
        tokio::time::sleep(self.duration_of(&text)).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn duration_scales_with_word_count() {
        let speech = LogSpeech::new(150);
        assert_eq!(speech.duration_of("Balanced"), Duration::from_millis(400));
        assert_eq!(speech.duration_of("Avoid to Left"), Duration::from_millis(1_200));
    }

    #[tokio::test(start_paused = true)]
    async fn speak_blocks_for_the_utterance() {
        let mut speech = LogSpeech::new(60);
        let started = Instant::now();
        speech.speak("cider catch").await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_millis(2_100));
    }
}
