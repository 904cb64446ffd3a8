//! Alerting configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Escalation timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Seconds of audible tone before the external buzzer joins in
    pub beep_duration_secs: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            beep_duration_secs: 6.0,
        }
    }
}

impl AlertConfig {
    pub fn beep_duration(&self) -> Duration {
        Duration::from_secs_f64(self.beep_duration_secs.max(0.0))
    }
}

/// Accident (rollover) detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccidentConfig {
    /// Tilt from vertical beyond which the vehicle is considered overturned
    pub tilt_threshold_degrees: f64,
}

impl Default for AccidentConfig {
    fn default() -> Self {
        Self {
            tilt_threshold_degrees: 45.0,
        }
    }
}
