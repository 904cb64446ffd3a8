//! Accelerometer tilt sampling

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::SensorError;

/// Acceleration in g along each axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccelSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AccelSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Total G-force magnitude
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }
}

/// Tri-axial accelerometer port
pub trait Accelerometer: Send {
    fn read(&mut self) -> Result<AccelSample, SensorError>;
}

/// Angle between the acceleration vector and vertical: `acos(z / |a|)` in degrees
///
/// Upright (z ≈ 1g) gives ≈0°; a zero vector has no defined tilt.
pub fn tilt_angle_degrees(sample: &AccelSample) -> Option<f64> {
    let magnitude = sample.magnitude();
    if !magnitude.is_finite() || magnitude <= f64::EPSILON {
        return None;
    }
    let cos = (sample.z / magnitude).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Sample the accelerometer as a tilt angle, `None` when unavailable
pub fn sample_tilt(sensor: Option<&mut dyn Accelerometer>) -> Option<f64> {
    let sensor = sensor?;
    match sensor.read() {
        Ok(sample) => tilt_angle_degrees(&sample),
        Err(e) => {
            debug!("Accelerometer unavailable: {}", e);
            None
        }
    }
}
