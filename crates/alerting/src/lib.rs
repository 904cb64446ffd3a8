//! Alerting System
//!
//! Escalation tiers per concern, the accident latch, and the shared alarm
//! outputs (tone and buzzer) expressed as commands for a thin driver.

pub mod accident;
pub mod command;
pub mod config;
pub mod escalation;
pub mod outputs;

pub use accident::{AccidentLatch, AccidentState};
pub use command::{AlertOutputs, Command, Concern, LoggingOutputs, NotificationRequest};
pub use config::{AccidentConfig, AlertConfig};
pub use escalation::{ConcernEscalation, EscalationLevel, EscalationRecord, Transition};
pub use outputs::{BuzzerDemand, OutputState};
