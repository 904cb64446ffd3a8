//! Service settings
//!
//! Layered with the `config` crate: an optional TOML file, then environment
//! variables prefixed `SAFETY` with `__` between sections, e.g.
//! `SAFETY_ENGINE__ALERT__BEEP_DURATION_SECS=4`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use event_fusion::EngineConfig;
use notifier::MqttConfig;
use sensors::GpsSerialConfig;

/// Default settings file, overridable with `SAFETY_MONITOR_CONFIG`
pub const DEFAULT_CONFIG_FILE: &str = "safety-monitor.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineConfig,
    pub gps: GpsSettings,
    pub sensors: SensorSettings,
    pub mqtt: MqttSettings,
    pub http: HttpSettings,
    pub metrics: MetricsSettings,
    pub replay: ReplaySettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsSettings {
    pub enabled: bool,
    pub serial: GpsSerialConfig,
}

/// Sysfs (IIO) paths for the analog sensors; unset means unavailable
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    pub gas_path: Option<PathBuf>,
    pub gas_full_scale: f64,
    pub accel_x_path: Option<PathBuf>,
    pub accel_y_path: Option<PathBuf>,
    pub accel_z_path: Option<PathBuf>,
    /// Multiplier from raw counts to g
    pub accel_scale: f64,
    pub poll_interval_ms: u64,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            gas_path: None,
            gas_full_scale: 1023.0,
            accel_x_path: None,
            accel_y_path: None,
            accel_z_path: None,
            accel_scale: 1.0,
            poll_interval_ms: 100,
        }
    }
}

impl SensorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttSettings {
    pub enabled: bool,
    pub broker: MqttConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub enabled: bool,
    pub bind: SocketAddr,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen: SocketAddr,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: SocketAddr::from(([0, 0, 0, 0], 9000)),
        }
    }
}

/// Recorded face-metric frames driving the tick loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
    /// JSON-lines file; frames without a face when unset
    pub path: Option<PathBuf>,
    pub frame_interval_ms: u64,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            path: None,
            frame_interval_ms: 66,
        }
    }
}

impl ReplaySettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub json: bool,
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            json: false,
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load from the default file location and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var("SAFETY_MONITOR_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// A missing file is not an error; every field has a default
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("SAFETY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn from_toml(text: &str) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = Settings::load_from("/nonexistent/safety-monitor.toml").unwrap();
        assert_eq!(settings.engine.dms.ear_consec_frames, 20);
        assert_eq!(settings.engine.sobriety.alcohol_threshold, 500.0);
        assert_eq!(settings.gps.serial.baud_rate, 9600);
        assert_eq!(settings.replay.frame_interval(), Duration::from_millis(66));
    }

    #[test]
    fn test_toml_overrides_nested_sections() {
        let settings = Settings::from_toml(
            r#"
            [engine.alert]
            beep_duration_secs = 3.5

            [engine.accident]
            tilt_threshold_degrees = 60.0

            [mqtt]
            enabled = true

            [mqtt.broker]
            vehicle_id = "bus-12"

            [http]
            bind = "127.0.0.1:9090"
            "#,
        )
        .unwrap();

        assert_eq!(settings.engine.alert.beep_duration(), Duration::from_millis(3500));
        assert_eq!(settings.engine.accident.tilt_threshold_degrees, 60.0);
        assert!(settings.mqtt.enabled);
        assert_eq!(settings.mqtt.broker.vehicle_id, "bus-12");
        assert_eq!(settings.mqtt.broker.broker_port, 1883);
        assert_eq!(settings.http.bind.port(), 9090);
        assert_eq!(settings.engine.dms.mar_smooth_window, 10);
    }
}
