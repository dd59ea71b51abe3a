use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const CONFIG_PATH_ENV: &str = "PERCEPTION_ADVISOR_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "perception-advisor";
const ENV_PREFIX: &str = "PERCEPTION_ADVISOR";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub camera: CameraSettings,
    pub depth: DepthSettings,
    pub gesture: GestureSettings,
    pub detection: DetectionSettings,
    pub flags: FlagSettings,
    pub advisory: AdvisorySettings,
    pub speech: SpeechSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DepthSettings {
    pub rows: usize,
    pub cols: usize,
    pub near_threshold: f32,
    pub announce_balanced: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    pub catch_threshold: f32,
    pub log_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub roi_width: u32,
    pub roi_height: u32,
    pub min_confidence: f32,
    pub cooldown_ms: u64,
    pub report_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlagSettings {
    pub gesture_hold_ms: u64,
    pub detection_hold_ms: u64,
    pub tick_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdvisorySettings {
    pub gap_ms: u64,
    pub rate_limited_category: String,
    pub rate_limit_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechEngineKind {
    Log,
    Espeak,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub engine: SpeechEngineKind,
    pub rate: u32,
    pub volume: f32,
    pub voice: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            camera: CameraSettings::default(),
            depth: DepthSettings::default(),
            gesture: GestureSettings::default(),
            detection: DetectionSettings::default(),
            flags: FlagSettings::default(),
            advisory: AdvisorySettings::default(),
            speech: SpeechSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            width: 1280,
            height: 720,
        }
    }
}

impl Default for DepthSettings {
    fn default() -> Self {
        Self {
            rows: 5,
            cols: 5,
            near_threshold: 0.8,
            announce_balanced: true,
        }
    }
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            catch_threshold: 0.05,
            log_interval_ms: 1_000,
        }
    }
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            roi_width: 320,
            roi_height: 480,
            min_confidence: 0.25,
            cooldown_ms: 5_000,
            report_interval_ms: 1_000,
        }
    }
}

impl Default for FlagSettings {
    fn default() -> Self {
        Self {
            gesture_hold_ms: 5_000,
            detection_hold_ms: 5_000,
            tick_ms: 100,
        }
    }
}

impl Default for AdvisorySettings {
    fn default() -> Self {
        Self {
            gap_ms: 500,
            rate_limited_category: "Avoid".to_string(),
            rate_limit_ms: 5_000,
        }
    }
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            engine: SpeechEngineKind::Log,
            rate: 150,
            volume: 0.9,
            voice: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CameraSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1_000 / u64::from(self.fps.max(1)))
    }
}

impl GestureSettings {
    pub fn log_interval(&self) -> Duration {
        Duration::from_millis(self.log_interval_ms)
    }
}

impl DetectionSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

impl FlagSettings {
    pub fn gesture_hold(&self) -> Duration {
        Duration::from_millis(self.gesture_hold_ms)
    }

    pub fn detection_hold(&self) -> Duration {
        Duration::from_millis(self.detection_hold_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl AdvisorySettings {
    pub fn gap(&self) -> Duration {
        Duration::from_millis(self.gap_ms)
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

impl Configuration {
    /// Loads the configuration file named by `PERCEPTION_ADVISOR_CONFIG` (or
    /// `perception-advisor.toml` in the working directory, if present) and layers
    /// `PERCEPTION_ADVISOR__SECTION__KEY` environment overrides on top.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let configuration: Configuration = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth.rows == 0 || self.depth.cols == 0 {
            return Err(ConfigError::Invalid {
                field: "depth.rows/depth.cols",
                reason: "grid must have at least one row and one column".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.depth.near_threshold) {
            return Err(ConfigError::Invalid {
                field: "depth.near_threshold",
                reason: format!("{} is outside [0, 1]", self.depth.near_threshold),
            });
        }
        if self.flags.tick_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "flags.tick_ms",
                reason: "tick must be positive".to_string(),
            });
        }
        if self.camera.fps == 0 {
            return Err(ConfigError::Invalid {
                field: "camera.fps",
                reason: "frame rate must be positive".to_string(),
            });
        }
        Ok(())
    }
}
