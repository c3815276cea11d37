use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::frame::ColorFormat;
use crate::pack::MAX_COMPRESSION_RATIO;
use crate::producer::{SourceConfig, FILE_NAME_UNSET};

const DEFAULT_OUTPUT_COLOR_FORMAT: &str = "RGB";
const DEFAULT_COMPRESSION_RATIO: u32 = 100;
const DEFAULT_TARGET_FPS: u32 = 10;
const MAX_TARGET_FPS: u32 = 1000;
const DEFAULT_MQTT_BROKER_ADDR: &str = "127.0.0.1:1883";
const DEFAULT_MQTT_TOPIC_PREFIX: &str = "stillcam";
const DEFAULT_MQTT_CLIENT_ID: &str = "stillcamd";

#[derive(Debug, Deserialize, Default)]
struct StillcamConfigFile {
    source: Option<SourceConfigFile>,
    tick: Option<TickConfigFile>,
    mqtt: Option<MqttConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    file_name: Option<String>,
    output_color_format: Option<String>,
    compression_ratio: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct TickConfigFile {
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct MqttConfigFile {
    broker_addr: Option<String>,
    topic_prefix: Option<String>,
    client_id: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StillcamConfig {
    pub source: SourceConfig,
    pub tick: TickSettings,
    pub mqtt: MqttSettings,
}

#[derive(Debug, Clone)]
pub struct TickSettings {
    pub target_fps: u32,
}

impl TickSettings {
    /// Sleep interval between ticks.
    pub fn period(&self) -> Duration {
        Duration::from_millis(u64::from(1000 / self.target_fps.max(1)))
    }
}

#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub broker_addr: String,
    pub topic_prefix: String,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl StillcamConfig {
    /// Load from the file named by `STILLCAM_CONFIG` (if any), then apply
    /// env overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("STILLCAM_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => StillcamConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: StillcamConfigFile) -> Result<Self> {
        let source_file = file.source.unwrap_or_default();
        let source = SourceConfig {
            file_name: source_file
                .file_name
                .unwrap_or_else(|| FILE_NAME_UNSET.to_string()),
            output_color_format: ColorFormat::parse(
                source_file
                    .output_color_format
                    .as_deref()
                    .unwrap_or(DEFAULT_OUTPUT_COLOR_FORMAT),
            )?,
            compression_ratio: compression_ratio_from(
                source_file
                    .compression_ratio
                    .unwrap_or(DEFAULT_COMPRESSION_RATIO),
            )?,
        };
        let tick = TickSettings {
            target_fps: file
                .tick
                .and_then(|tick| tick.target_fps)
                .unwrap_or(DEFAULT_TARGET_FPS),
        };
        let mqtt_file = file.mqtt.unwrap_or_default();
        let mqtt = MqttSettings {
            broker_addr: mqtt_file
                .broker_addr
                .unwrap_or_else(|| DEFAULT_MQTT_BROKER_ADDR.to_string()),
            topic_prefix: mqtt_file
                .topic_prefix
                .unwrap_or_else(|| DEFAULT_MQTT_TOPIC_PREFIX.to_string()),
            client_id: mqtt_file
                .client_id
                .unwrap_or_else(|| DEFAULT_MQTT_CLIENT_ID.to_string()),
            username: mqtt_file.username,
            password: mqtt_file.password,
        };
        Ok(Self { source, tick, mqtt })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(file_name) = std::env::var("STILLCAM_FILE") {
            if !file_name.trim().is_empty() {
                self.source.file_name = file_name;
            }
        }
        if let Ok(format) = std::env::var("STILLCAM_COLOR_FORMAT") {
            if !format.trim().is_empty() {
                self.source.output_color_format = ColorFormat::parse(&format)?;
            }
        }
        if let Ok(ratio) = std::env::var("STILLCAM_COMPRESSION_RATIO") {
            let value: u32 = ratio
                .parse()
                .map_err(|_| anyhow!("STILLCAM_COMPRESSION_RATIO must be an integer"))?;
            self.source.compression_ratio = compression_ratio_from(value)?;
        }
        if let Ok(fps) = std::env::var("STILLCAM_FPS") {
            self.tick.target_fps = fps
                .parse()
                .map_err(|_| anyhow!("STILLCAM_FPS must be an integer number of frames"))?;
        }
        if let Ok(addr) = std::env::var("STILLCAM_MQTT_ADDR") {
            if !addr.trim().is_empty() {
                self.mqtt.broker_addr = addr;
            }
        }
        if let Ok(prefix) = std::env::var("STILLCAM_MQTT_TOPIC_PREFIX") {
            if !prefix.trim().is_empty() {
                self.mqtt.topic_prefix = prefix;
            }
        }
        if let Ok(client_id) = std::env::var("STILLCAM_MQTT_CLIENT_ID") {
            if !client_id.trim().is_empty() {
                self.mqtt.client_id = client_id;
            }
        }
        if let Ok(username) = std::env::var("STILLCAM_MQTT_USERNAME") {
            if !username.trim().is_empty() {
                self.mqtt.username = Some(username);
            }
        }
        if let Ok(password) = std::env::var("STILLCAM_MQTT_PASSWORD") {
            if !password.is_empty() {
                self.mqtt.password = Some(password);
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.tick.target_fps == 0 || self.tick.target_fps > MAX_TARGET_FPS {
            return Err(anyhow!(
                "target_fps must be between 1 and {}",
                MAX_TARGET_FPS
            ));
        }
        if self.mqtt.broker_addr.trim().is_empty() {
            return Err(anyhow!("mqtt broker address must not be empty"));
        }
        if self.mqtt.client_id.trim().is_empty() {
            return Err(anyhow!("mqtt client id must not be empty"));
        }
        Ok(())
    }
}

fn compression_ratio_from(value: u32) -> Result<u8> {
    if value > u32::from(MAX_COMPRESSION_RATIO) {
        return Err(anyhow!(
            "compression_ratio must be between 0 and {}",
            MAX_COMPRESSION_RATIO
        ));
    }
    Ok(value as u8)
}

fn read_config_file(path: &Path) -> Result<StillcamConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
