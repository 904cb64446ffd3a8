//! Emergency Notification Module
//!
//! Builds the emergency payload for a concern and hands it to a transport:
//! - MQTT publish to the fleet backend
//! - Log-only fallback when no transport is configured

pub mod message;
pub mod mqtt;

pub use message::{maps_link, EmergencyMessage};
pub use mqtt::{MqttConfig, MqttNotifier};

use thiserror::Error;
use tracing::warn;

/// Notification error types
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Transport for emergency messages; must not block the caller for long
pub trait EmergencyNotifier: Send + Sync {
    fn send(&self, message: &EmergencyMessage) -> Result<(), NotifyError>;
}

/// Writes the rendered message to the log
#[derive(Debug, Default)]
pub struct LoggingNotifier;

impl EmergencyNotifier for LoggingNotifier {
    fn send(&self, message: &EmergencyMessage) -> Result<(), NotifyError> {
        warn!("{}\n{}", message.subject(), message.render_body());
        Ok(())
    }
}
