//! Timed escalation for a sustained alert concern
//!
//! `Inactive -> SoundOnly` on the first triggered tick, `SoundOnly ->
//! BuzzerEscalated` once the tone has run for the beep duration and the
//! trigger still holds, and straight back to `Inactive` the first tick the
//! trigger is false. One notification per episode at most.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Severity tier of one concern
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum EscalationLevel {
    #[default]
    None,
    SoundOnly,
    BuzzerEscalated,
}

/// Escalation bookkeeping for one concern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EscalationRecord {
    pub level: EscalationLevel,
    /// Set on `None -> SoundOnly`, cleared on return to `None`
    pub started_at: Option<Instant>,
    /// Set at most once per episode
    pub notified_at: Option<Instant>,
}

impl EscalationRecord {
    pub fn is_active(&self) -> bool {
        self.level != EscalationLevel::None
    }

    /// Jump straight to the top tier (one-shot concerns)
    pub fn escalate_immediately(&mut self, now: Instant) {
        self.level = EscalationLevel::BuzzerEscalated;
        self.started_at.get_or_insert(now);
    }

    /// Record a dispatched notification; false if this episode already has one
    pub fn mark_notified(&mut self, now: Instant) -> bool {
        if self.notified_at.is_some() {
            return false;
        }
        self.notified_at = Some(now);
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// What a tick did to the escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// New episode: start the tone
    Started,
    /// Buzzer joins; `notify` is true when this episode has not notified yet
    Escalated { notify: bool },
    /// Episode over: stop the tone
    Cleared,
}

/// Escalation state machine for the drowsiness/yawn concern
#[derive(Debug, Clone)]
pub struct ConcernEscalation {
    record: EscalationRecord,
    beep_duration: Duration,
    name: &'static str,
}

impl ConcernEscalation {
    pub fn new(name: &'static str, beep_duration: Duration) -> Self {
        Self {
            record: EscalationRecord::default(),
            beep_duration,
            name,
        }
    }

    /// Advance one tick
    pub fn update(&mut self, now: Instant, triggered: bool) -> Transition {
        if !triggered {
            if self.record.is_active() {
                info!("{} alert cleared", self.name);
                self.record.clear();
                return Transition::Cleared;
            }
            return Transition::Unchanged;
        }

        match self.record.level {
            EscalationLevel::None => {
                self.record.level = EscalationLevel::SoundOnly;
                self.record.started_at = Some(now);
                self.record.notified_at = None;
                warn!("{} alert started", self.name);
                Transition::Started
            }
            EscalationLevel::SoundOnly => {
                let started = self.record.started_at.unwrap_or(now);
                if now.saturating_duration_since(started) < self.beep_duration {
                    return Transition::Unchanged;
                }
                self.record.level = EscalationLevel::BuzzerEscalated;
                let notify = self.record.mark_notified(now);
                warn!(
                    "{} alert escalated to buzzer after {:?}",
                    self.name,
                    now.saturating_duration_since(started)
                );
                Transition::Escalated { notify }
            }
            EscalationLevel::BuzzerEscalated => Transition::Unchanged,
        }
    }

    pub fn level(&self) -> EscalationLevel {
        self.record.level
    }

    pub fn record(&self) -> &EscalationRecord {
        &self.record
    }

    /// Drop the episode without reporting a transition
    pub fn clear(&mut self) {
        self.record.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BEEP: Duration = Duration::from_secs(6);

    fn concern() -> ConcernEscalation {
        ConcernEscalation::new("Drowsiness", BEEP)
    }

    #[test]
    fn test_first_trigger_starts_sound() {
        let mut c = concern();
        let t0 = Instant::now();
        assert_eq!(c.update(t0, true), Transition::Started);
        assert_eq!(c.level(), EscalationLevel::SoundOnly);
        assert_eq!(c.record().started_at, Some(t0));
    }

    #[test]
    fn test_escalates_after_beep_duration() {
        let mut c = concern();
        let t0 = Instant::now();
        c.update(t0, true);
        assert_eq!(c.update(t0 + Duration::from_millis(5999), true), Transition::Unchanged);
        assert_eq!(
            c.update(t0 + BEEP, true),
            Transition::Escalated { notify: true }
        );
        assert_eq!(c.level(), EscalationLevel::BuzzerEscalated);
        assert_eq!(c.record().notified_at, Some(t0 + BEEP));
    }

    #[test]
    fn test_clear_is_immediate_and_resets_timers() {
        let mut c = concern();
        let t0 = Instant::now();
        c.update(t0, true);
        c.update(t0 + BEEP, true);
        assert_eq!(c.update(t0 + BEEP, false), Transition::Cleared);
        assert_eq!(*c.record(), EscalationRecord::default());
        assert_eq!(c.update(t0 + BEEP, false), Transition::Unchanged);
    }

    #[test]
    fn test_new_episode_can_notify_again() {
        let mut c = concern();
        let t0 = Instant::now();
        c.update(t0, true);
        c.update(t0 + BEEP, true);
        c.update(t0 + BEEP * 2, false);

        let t1 = t0 + BEEP * 3;
        assert_eq!(c.update(t1, true), Transition::Started);
        assert_eq!(c.record().started_at, Some(t1));
        assert_eq!(
            c.update(t1 + BEEP, true),
            Transition::Escalated { notify: true }
        );
    }

    #[test]
    fn test_mark_notified_once() {
        let mut record = EscalationRecord::default();
        let now = Instant::now();
        assert!(record.mark_notified(now));
        assert!(!record.mark_notified(now));
    }

    proptest! {
        #[test]
        fn prop_at_most_one_notification_per_episode(extra_ticks in 1usize..500, step_ms in 1u64..2000) {
            let mut c = concern();
            let t0 = Instant::now();
            let mut notifications = 0;
            for i in 0..=extra_ticks {
                let now = t0 + Duration::from_millis(step_ms * i as u64);
                if let Transition::Escalated { notify: true } = c.update(now, true) {
                    notifications += 1;
                }
            }
            prop_assert!(notifications <= 1);
            let elapsed = Duration::from_millis(step_ms * extra_ticks as u64);
            if elapsed >= BEEP {
                prop_assert_eq!(notifications, 1);
            }
        }
    }
}
