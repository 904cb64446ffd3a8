//! Side-effect commands and the output ports that execute them

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use sensors::GpsFix;

/// Independent alert concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concern {
    /// Drowsiness and yawning share one concern
    Drowsiness,
    Accident,
    Intoxication,
}

impl Concern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Concern::Drowsiness => "drowsiness",
            Concern::Accident => "accident",
            Concern::Intoxication => "intoxication",
        }
    }
}

impl std::fmt::Display for Concern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a notifier needs besides the wall-clock timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub concern: Concern,
    /// Human-readable incident line, e.g. "ACCIDENT - Vehicle Tilted 52.0°"
    pub incident: String,
    pub gps: GpsFix,
}

impl NotificationRequest {
    pub fn drowsiness(gps: GpsFix) -> Self {
        Self {
            concern: Concern::Drowsiness,
            incident: "DROWSINESS - Driver Not Responding".to_string(),
            gps,
        }
    }

    pub fn accident(tilt_angle_degrees: f64, gps: GpsFix) -> Self {
        Self {
            concern: Concern::Accident,
            incident: format!("ACCIDENT - Vehicle Tilted {:.1}°", tilt_angle_degrees),
            gps,
        }
    }

    pub fn intoxication(gps: GpsFix) -> Self {
        Self {
            concern: Concern::Intoxication,
            incident: "ALCOHOL DETECTED - Failed Sobriety Test".to_string(),
            gps,
        }
    }
}

/// A side effect requested by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    PlayTone,
    StopTone,
    ActivateBuzzer,
    DeactivateBuzzer,
    SendNotification(NotificationRequest),
}

/// Audible tone and external buzzer
pub trait AlertOutputs: Send {
    fn play_tone(&mut self);
    fn stop_tone(&mut self);
    fn activate_buzzer(&mut self);
    fn deactivate_buzzer(&mut self);

    /// Run a hardware command; notifications are not this port's concern
    fn execute(&mut self, command: &Command) {
        match command {
            Command::PlayTone => self.play_tone(),
            Command::StopTone => self.stop_tone(),
            Command::ActivateBuzzer => self.activate_buzzer(),
            Command::DeactivateBuzzer => self.deactivate_buzzer(),
            Command::SendNotification(_) => {}
        }
    }
}

/// Output port that only logs; used when no hardware is attached
#[derive(Debug, Default)]
pub struct LoggingOutputs {
    tone: bool,
    buzzer: bool,
}

impl LoggingOutputs {
    pub fn tone_active(&self) -> bool {
        self.tone
    }

    pub fn buzzer_active(&self) -> bool {
        self.buzzer
    }
}

impl AlertOutputs for LoggingOutputs {
    fn play_tone(&mut self) {
        self.tone = true;
        info!("Alert tone playing");
    }

    fn stop_tone(&mut self) {
        self.tone = false;
        info!("Alert tone stopped");
    }

    fn activate_buzzer(&mut self) {
        self.buzzer = true;
        warn!("EXTERNAL BUZZER ACTIVATED!");
    }

    fn deactivate_buzzer(&mut self) {
        self.buzzer = false;
        info!("External buzzer deactivated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incident_text() {
        let request = NotificationRequest::accident(52.04, GpsFix::default());
        assert_eq!(request.incident, "ACCIDENT - Vehicle Tilted 52.0°");
        assert_eq!(request.concern.as_str(), "accident");
    }

    #[test]
    fn test_logging_outputs_track_state() {
        let mut outputs = LoggingOutputs::default();
        outputs.execute(&Command::PlayTone);
        outputs.execute(&Command::ActivateBuzzer);
        assert!(outputs.tone_active() && outputs.buzzer_active());
        outputs.execute(&Command::DeactivateBuzzer);
        outputs.execute(&Command::SendNotification(NotificationRequest::intoxication(
            GpsFix::default(),
        )));
        assert!(outputs.tone_active());
        assert!(!outputs.buzzer_active());
    }
}
