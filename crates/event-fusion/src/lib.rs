//! Event Fusion Engine
//!
//! Fuses one tick of heterogeneous sensor input into alert decisions:
//! - Face metrics (drowsiness, yawning)
//! - Tilt (accident latch)
//! - Gas (sobriety challenge)
//! - GPS (last known good fix for notifications)
//!
//! The engine performs no I/O. Every tick returns the commands a driver must
//! execute plus a snapshot for the display layer.

pub mod config;
pub mod snapshot;

pub use config::EngineConfig;
pub use snapshot::{AlertStatus, ConcernLevels, EngineSnapshot};

use std::time::Instant;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use alerting::{
    AccidentLatch, BuzzerDemand, Command, ConcernEscalation, EscalationLevel, EscalationRecord,
    NotificationRequest, OutputState, Transition,
};
use dms::{DmsAnalysis, DmsModule, FaceObservation};
use sensors::GpsFix;
use sobriety::{CaptureOutcome, CaptureRequest, SobrietyChallenge, Verdict};

/// Latest value of every sensor port for one tick
///
/// `None` means the port reported unavailable; the matching concern simply
/// cannot trigger this tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorInputs {
    pub face: FaceObservation,
    pub gas: Option<f64>,
    pub tilt_degrees: Option<f64>,
    pub gps: GpsFix,
}

/// Result of one tick
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub commands: Vec<Command>,
    pub snapshot: EngineSnapshot,
}

/// Result of applying a speech capture
#[derive(Debug, Clone, Default)]
pub struct CaptureApplied {
    /// `None` when the result belonged to a stale challenge
    pub verdict: Option<Verdict>,
    pub commands: Vec<Command>,
}

/// Session state for the driver monitor
pub struct SafetyEngine {
    dms: DmsModule,
    drowsiness: ConcernEscalation,
    accident: AccidentLatch,
    accident_record: EscalationRecord,
    sobriety: SobrietyChallenge,
    intoxication_record: EscalationRecord,
    outputs: OutputState,
    gps: GpsFix,
    last_analysis: DmsAnalysis,
    last_tilt: Option<f64>,
}

impl SafetyEngine {
    pub fn new(config: EngineConfig) -> Self {
        let sobriety = SobrietyChallenge::new(config.sobriety.clone());
        Self::with_challenge(config, sobriety)
    }

    /// Seeded prompt generation for replays and tests
    pub fn with_rng(config: EngineConfig, rng: StdRng) -> Self {
        let sobriety = SobrietyChallenge::with_rng(config.sobriety.clone(), rng);
        Self::with_challenge(config, sobriety)
    }

    fn with_challenge(config: EngineConfig, sobriety: SobrietyChallenge) -> Self {
        Self {
            dms: DmsModule::new(&config.dms),
            drowsiness: ConcernEscalation::new("Drowsiness", config.alert.beep_duration()),
            accident: AccidentLatch::new(&config.accident),
            accident_record: EscalationRecord::default(),
            sobriety,
            intoxication_record: EscalationRecord::default(),
            outputs: OutputState::default(),
            gps: GpsFix::default(),
            last_analysis: DmsAnalysis::default(),
            last_tilt: None,
        }
    }

    /// Advance the engine by one frame
    pub fn tick(&mut self, now: Instant, inputs: &SensorInputs) -> TickOutput {
        let mut notifications = Vec::new();

        if inputs.gps.coordinates().is_some() {
            self.gps = inputs.gps;
        }

        let analysis = self.dms.analyze(&inputs.face);
        let transition = self.drowsiness.update(now, analysis.fatigue_triggered());
        if let Transition::Escalated { notify: true } = transition {
            notifications.push(NotificationRequest::drowsiness(self.gps));
        }
        self.last_analysis = analysis;

        self.last_tilt = inputs.tilt_degrees;
        if let Some(tilt) = inputs.tilt_degrees {
            if self.accident.update(tilt) {
                self.accident_record.escalate_immediately(now);
                if self.accident_record.mark_notified(now) {
                    notifications.push(NotificationRequest::accident(tilt, self.gps));
                }
            }
        }

        if let Some(prompt) = self.sobriety.observe_gas(inputs.gas) {
            debug!("Sobriety prompt shown: {}", prompt);
        }

        let mut commands = Vec::new();
        self.reconcile_outputs(&mut commands);
        commands.extend(notifications.into_iter().map(Command::SendNotification));

        TickOutput {
            commands,
            snapshot: self.snapshot(),
        }
    }

    /// Hand out a capture ticket for the pending sobriety challenge
    pub fn begin_sobriety_capture(&mut self) -> Option<CaptureRequest> {
        self.sobriety.begin_capture()
    }

    /// Apply a finished capture; results for a stale challenge are dropped
    pub fn complete_sobriety_capture(
        &mut self,
        now: Instant,
        challenge_id: u64,
        outcome: &CaptureOutcome,
    ) -> CaptureApplied {
        let Some(verdict) = self.sobriety.complete_capture(challenge_id, outcome) else {
            return CaptureApplied::default();
        };

        let mut notification = None;
        match &verdict {
            Verdict::Passed { .. } => self.intoxication_record.clear(),
            Verdict::Failed(_) => {
                // Every failed test is its own episode with its own notification
                self.intoxication_record.clear();
                self.intoxication_record.escalate_immediately(now);
                if self.intoxication_record.mark_notified(now) {
                    notification = Some(NotificationRequest::intoxication(self.gps));
                }
            }
        }

        let mut commands = Vec::new();
        self.reconcile_outputs(&mut commands);
        commands.extend(notification.map(Command::SendNotification));
        CaptureApplied {
            verdict: Some(verdict),
            commands,
        }
    }

    /// One-off alcohol check; leaves the challenge untouched
    pub fn probe_gas(&self, reading: Option<f64>) -> bool {
        let detected = self.sobriety.alcohol_detected(reading);
        info!(
            "Gas probe: {}",
            if detected { "ALCOHOL DETECTED" } else { "clear" }
        );
        detected
    }

    /// External reset: clears the accident latch and a failed challenge, and
    /// switches the buzzer off regardless of its last state
    ///
    /// A still-escalated drowsiness episode re-asserts the buzzer on the
    /// next tick.
    pub fn reset(&mut self) -> Vec<Command> {
        warn!("System reset: clearing accident and sobriety state");
        self.accident.reset();
        self.accident_record.clear();
        self.sobriety.reset();
        self.intoxication_record.clear();

        let mut commands = Vec::new();
        self.outputs.force_buzzer_off(&mut commands);
        commands
    }

    /// Silence every output before the process exits
    pub fn shutdown(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        self.outputs.reconcile(false, false, &mut commands);
        commands
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let analysis = &self.last_analysis;
        let metrics = analysis.metrics;
        let levels = self.levels();
        let accident = self.accident.state();
        let challenge = self.sobriety.status();

        let alerting = analysis.fatigue_triggered()
            || levels.drowsiness != EscalationLevel::None
            || accident.detected
            || challenge.failed;

        EngineSnapshot {
            face_detected: analysis.face_detected,
            eye_aspect_ratio: metrics.map(|m| m.eye_aspect_ratio),
            mouth_aspect_ratio: metrics.map(|m| m.mouth_aspect_ratio_smoothed),
            calibrating: analysis.calibrating,
            drowsy: analysis.is_drowsy(),
            yawning: analysis.is_yawning(),
            tilt_degrees: self.last_tilt,
            gps: self.gps,
            levels,
            status: if alerting {
                AlertStatus::Alert
            } else {
                AlertStatus::Normal
            },
            challenge,
            accident,
            tone_active: self.outputs.tone_active,
            buzzer_active: self.outputs.buzzer_active,
        }
    }

    /// Last known good GPS fix
    pub fn gps(&self) -> GpsFix {
        self.gps
    }

    fn levels(&self) -> ConcernLevels {
        ConcernLevels {
            drowsiness: self.drowsiness.level(),
            accident: self.accident_record.level,
            intoxication: self.intoxication_record.level,
        }
    }

    fn buzzer_demand(&self) -> BuzzerDemand {
        BuzzerDemand {
            drowsiness_escalated: self.drowsiness.level() == EscalationLevel::BuzzerEscalated,
            accident_detected: self.accident.is_detected(),
            sobriety_failed: self.sobriety.failed(),
        }
    }

    fn reconcile_outputs(&mut self, commands: &mut Vec<Command>) {
        let tone = self.drowsiness.level() != EscalationLevel::None;
        let buzzer = self.buzzer_demand().active();
        self.outputs.reconcile(tone, buzzer, commands);
    }
}
