//! Shared alarm outputs derived from every concern
//!
//! The buzzer is on whenever any concern demands it; the tone belongs to
//! the drowsiness concern alone. Both are recomputed every tick and only
//! changes are turned into commands.

use serde::{Deserialize, Serialize};

use crate::command::Command;

/// Per-concern demands on the external buzzer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzerDemand {
    pub drowsiness_escalated: bool,
    pub accident_detected: bool,
    pub sobriety_failed: bool,
}

impl BuzzerDemand {
    pub fn active(&self) -> bool {
        self.drowsiness_escalated || self.accident_detected || self.sobriety_failed
    }
}

/// Last commanded state of the physical outputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputState {
    pub tone_active: bool,
    pub buzzer_active: bool,
}

impl OutputState {
    /// Emit commands to move the outputs to the desired state
    pub fn reconcile(&mut self, tone: bool, buzzer: bool, commands: &mut Vec<Command>) {
        if tone != self.tone_active {
            commands.push(if tone {
                Command::PlayTone
            } else {
                Command::StopTone
            });
            self.tone_active = tone;
        }
        if buzzer != self.buzzer_active {
            commands.push(if buzzer {
                Command::ActivateBuzzer
            } else {
                Command::DeactivateBuzzer
            });
            self.buzzer_active = buzzer;
        }
    }

    /// Buzzer off regardless of last state (external reset)
    pub fn force_buzzer_off(&mut self, commands: &mut Vec<Command>) {
        commands.push(Command::DeactivateBuzzer);
        self.buzzer_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_concern_holds_buzzer() {
        let accident_only = BuzzerDemand {
            accident_detected: true,
            ..Default::default()
        };
        assert!(accident_only.active());
        assert!(!BuzzerDemand::default().active());
    }

    #[test]
    fn test_reconcile_emits_only_changes() {
        let mut state = OutputState::default();
        let mut commands = Vec::new();
        state.reconcile(true, false, &mut commands);
        state.reconcile(true, false, &mut commands);
        assert_eq!(commands, vec![Command::PlayTone]);

        commands.clear();
        state.reconcile(false, true, &mut commands);
        assert_eq!(commands, vec![Command::StopTone, Command::ActivateBuzzer]);
    }

    #[test]
    fn test_force_buzzer_off_always_emits() {
        let mut state = OutputState::default();
        let mut commands = Vec::new();
        state.force_buzzer_off(&mut commands);
        assert_eq!(commands, vec![Command::DeactivateBuzzer]);
    }
}
