//! Per-tick display state

use serde::{Deserialize, Serialize};

use alerting::{AccidentState, EscalationLevel};
use sensors::GpsFix;
use sobriety::ChallengeStatus;

/// Headline status shown to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    #[default]
    Normal,
    Alert,
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertStatus::Normal => f.write_str("NORMAL"),
            AlertStatus::Alert => f.write_str("ALERT!"),
        }
    }
}

/// Escalation tier per concern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConcernLevels {
    pub drowsiness: EscalationLevel,
    pub accident: EscalationLevel,
    pub intoxication: EscalationLevel,
}

/// Everything the display layer needs after a tick
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub face_detected: bool,
    pub eye_aspect_ratio: Option<f64>,
    pub mouth_aspect_ratio: Option<f64>,
    pub calibrating: bool,
    pub drowsy: bool,
    pub yawning: bool,
    pub tilt_degrees: Option<f64>,
    /// Last known good fix
    pub gps: GpsFix,
    pub levels: ConcernLevels,
    pub status: AlertStatus,
    pub challenge: ChallengeStatus,
    /// Accident overlay
    pub accident: AccidentState,
    pub tone_active: bool,
    pub buzzer_active: bool,
}

impl EngineSnapshot {
    pub fn ear_text(&self) -> String {
        match self.eye_aspect_ratio {
            Some(ear) => format!("EAR: {:.2}", ear),
            None => "EAR: N/A".to_string(),
        }
    }

    pub fn mar_text(&self) -> String {
        match self.mouth_aspect_ratio {
            Some(mar) => format!("MAR: {:.2}", mar),
            None => "MAR: N/A".to_string(),
        }
    }

    pub fn tilt_text(&self) -> String {
        match self.tilt_degrees {
            Some(tilt) => format!("Tilt: {:.1}°", tilt),
            None => "Tilt: N/A".to_string(),
        }
    }

    pub fn gps_text(&self) -> String {
        self.gps.display_text()
    }

    /// Challenge prompt as two display lines
    pub fn prompt_lines(&self) -> Option<(String, String)> {
        self.challenge
            .prompt_text
            .as_deref()
            .map(sobriety::display_lines)
    }

    pub fn accident_overlay(&self) -> Option<String> {
        if !self.accident.detected {
            return None;
        }
        Some(match self.accident.tilt_angle_at_detection {
            Some(angle) => format!("ACCIDENT DETECTED! Tilt: {:.1}°", angle),
            None => "ACCIDENT DETECTED!".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_readings_render_na() {
        let snapshot = EngineSnapshot::default();
        assert_eq!(snapshot.ear_text(), "EAR: N/A");
        assert_eq!(snapshot.mar_text(), "MAR: N/A");
        assert_eq!(snapshot.tilt_text(), "Tilt: N/A");
        assert_eq!(snapshot.gps_text(), "GPS: N/A");
        assert_eq!(snapshot.status.to_string(), "NORMAL");
        assert!(snapshot.accident_overlay().is_none());
    }

    #[test]
    fn test_prompt_split_for_display() {
        let snapshot = EngineSnapshot {
            challenge: ChallengeStatus {
                active: true,
                prompt_text: Some("apple banana computer elephant".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            snapshot.prompt_lines(),
            Some(("apple banana".to_string(), "computer elephant".to_string()))
        );
    }

    #[test]
    fn test_status_serializes_upper_case() {
        let json = serde_json::to_string(&AlertStatus::Alert).unwrap();
        assert_eq!(json, "\"ALERT\"");
    }
}
