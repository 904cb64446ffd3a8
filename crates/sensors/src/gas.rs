//! Gas (alcohol) sensor sampling

use tracing::debug;

use crate::SensorError;

/// ADC counts per unit of normalized reading (10-bit MCP3008 style)
pub const ADC_FULL_SCALE: f64 = 1024.0;

/// Analog gas sensor port
pub trait GasSensor: Send {
    /// Normalized reading in `0.0..=1.0`
    fn read_normalized(&mut self) -> Result<f64, SensorError>;
}

/// Sample the sensor in ADC counts, `None` when unavailable
pub fn sample_gas(sensor: Option<&mut dyn GasSensor>) -> Option<f64> {
    let sensor = sensor?;
    match sensor.read_normalized() {
        Ok(value) if value.is_finite() => Some(value * ADC_FULL_SCALE),
        Ok(value) => {
            debug!("Discarding non-finite gas reading {}", value);
            None
        }
        Err(e) => {
            debug!("Gas sensor unavailable: {}", e);
            None
        }
    }
}

/// Threshold comparison shared by the tick path and one-off probes
pub fn alcohol_detected(reading: Option<f64>, threshold: f64) -> bool {
    reading.map_or(false, |value| value > threshold)
}
