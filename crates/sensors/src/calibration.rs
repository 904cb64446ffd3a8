//! Sensor calibration statistics
//!
//! Offline helpers for choosing the alcohol threshold and checking that the
//! accelerometer reads level before it is trusted for tilt detection.

use serde::{Deserialize, Serialize};

use crate::tilt::{tilt_angle_degrees, AccelSample};
use crate::SensorError;

/// Summary statistics for a batch of readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); 0 for a single reading
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SampleSummary {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let count = samples.len();
        let mean = samples.iter().sum::<f64>() / count as f64;
        let std_dev = if count > 1 {
            let sum_sq: f64 = samples.iter().map(|v| (v - mean).powi(2)).sum();
            (sum_sq / (count - 1) as f64).sqrt()
        } else {
            0.0
        };
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            count,
            mean,
            std_dev,
            min,
            max,
        })
    }
}

/// Threshold choices between clean-air and alcohol-present averages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlcoholThresholdRecommendation {
    pub clean_air: SampleSummary,
    pub alcohol: SampleSummary,
    /// Halfway between the two means
    pub recommended: f64,
    /// 30% of the way; fewer false alarms
    pub conservative: f64,
    /// 70% of the way; more sensitive
    pub aggressive: f64,
    pub percent_increase: f64,
}

/// Recommend an alcohol threshold from two batches of ADC readings
pub fn recommend_alcohol_threshold(
    clean_air: &[f64],
    alcohol: &[f64],
) -> Result<AlcoholThresholdRecommendation, SensorError> {
    let clean = SampleSummary::from_samples(clean_air)
        .ok_or_else(|| SensorError::Calibration("no clean-air samples".to_string()))?;
    let exposed = SampleSummary::from_samples(alcohol)
        .ok_or_else(|| SensorError::Calibration("no alcohol samples".to_string()))?;

    let difference = exposed.mean - clean.mean;
    if difference <= 0.0 {
        return Err(SensorError::Calibration(format!(
            "alcohol mean {:.1} not above clean-air mean {:.1}",
            exposed.mean, clean.mean
        )));
    }

    let percent_increase = if clean.mean.abs() > f64::EPSILON {
        difference / clean.mean * 100.0
    } else {
        f64::INFINITY
    };

    Ok(AlcoholThresholdRecommendation {
        clean_air: clean,
        alcohol: exposed,
        recommended: clean.mean + difference * 0.5,
        conservative: clean.mean + difference * 0.3,
        aggressive: clean.mean + difference * 0.7,
        percent_increase,
    })
}

/// Level-surface check for the accelerometer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub x: SampleSummary,
    pub y: SampleSummary,
    pub z: SampleSummary,
    /// Tilt of the averaged vector
    pub tilt_degrees: f64,
}

/// Tilt above which the mounting surface is reported as not level
pub const LEVEL_TOLERANCE_DEGREES: f64 = 10.0;

impl LevelSummary {
    pub fn is_level(&self) -> bool {
        self.tilt_degrees <= LEVEL_TOLERANCE_DEGREES
    }
}

/// Average a batch of accelerometer samples taken at rest
pub fn summarize_level(samples: &[AccelSample]) -> Result<LevelSummary, SensorError> {
    let axis = |f: fn(&AccelSample) -> f64| -> Result<SampleSummary, SensorError> {
        let values: Vec<f64> = samples.iter().map(f).collect();
        SampleSummary::from_samples(&values)
            .ok_or_else(|| SensorError::Calibration("no accelerometer samples".to_string()))
    };

    let x = axis(|s: &AccelSample| s.x)?;
    let y = axis(|s: &AccelSample| s.y)?;
    let z = axis(|s: &AccelSample| s.z)?;
    let tilt_degrees = tilt_angle_degrees(&AccelSample::new(x.mean, y.mean, z.mean))
        .ok_or_else(|| SensorError::Calibration("accelerometer reads zero on all axes".into()))?;

    Ok(LevelSummary {
        x,
        y,
        z,
        tilt_degrees,
    })
}
