//! Vehicle Sensor Sampling
//!
//! Port traits and sampling helpers for the non-camera sensors:
//! - MQ-series gas sensor behind an ADC (alcohol)
//! - Tri-axial accelerometer (tilt / rollover)
//! - NMEA GPS receiver on a serial line
//!
//! Every sampler reports `None` instead of failing when its device is
//! unavailable, and background samplers publish through single-writer
//! most-recent-value feeds.

pub mod calibration;
pub mod feed;
pub mod gas;
pub mod gps;
pub mod serial;
pub mod tilt;

pub use feed::{SamplerHandle, SamplerService};
pub use gas::{alcohol_detected, sample_gas, GasSensor, ADC_FULL_SCALE};
pub use gps::{parse_gga, FixQuality, GgaSentence, GpsFix, GpsTracker};
pub use serial::{spawn_serial_gps, GpsSerialConfig};
pub use tilt::{sample_tilt, tilt_angle_degrees, AccelSample, Accelerometer};

use thiserror::Error;

/// Sensor error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("Sensor unavailable: {0}")]
    Unavailable(String),

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Parse failure: {0}")]
    Parse(String),

    #[error("Serial port error: {0}")]
    Serial(String),

    #[error("Calibration error: {0}")]
    Calibration(String),
}

impl From<tokio_serial::Error> for SensorError {
    fn from(err: tokio_serial::Error) -> Self {
        SensorError::Serial(err.to_string())
    }
}
