//! Guided sensor calibration runs
//!
//! Collect batches of readings from the real devices and turn them into the
//! alcohol threshold recommendation or the accelerometer level check.

use std::time::Duration;

use tracing::{info, warn};

use sensors::calibration::{
    recommend_alcohol_threshold, summarize_level, AlcoholThresholdRecommendation, LevelSummary,
    SampleSummary,
};
use sensors::{sample_gas, AccelSample, Accelerometer, GasSensor, SensorError};

/// How many readings to take per batch and how far apart
#[derive(Debug, Clone, Copy)]
pub struct SamplingPlan {
    pub samples: usize,
    pub delay: Duration,
}

impl Default for SamplingPlan {
    fn default() -> Self {
        Self {
            samples: 100,
            delay: Duration::from_millis(100),
        }
    }
}

/// Collect gas readings in ADC counts; unavailable reads are skipped
pub fn collect_gas(sensor: &mut dyn GasSensor, plan: SamplingPlan) -> Vec<f64> {
    let mut readings = Vec::with_capacity(plan.samples);
    for i in 0..plan.samples {
        match sample_gas(Some(&mut *sensor)) {
            Some(value) => readings.push(value),
            None => warn!("Gas sample {} unavailable", i + 1),
        }
        if (i + 1) % 10 == 0 {
            info!("  Sample {}/{}", i + 1, plan.samples);
        }
        std::thread::sleep(plan.delay);
    }
    readings
}

/// Collect raw accelerometer samples; failed reads are skipped
pub fn collect_accel(sensor: &mut dyn Accelerometer, plan: SamplingPlan) -> Vec<AccelSample> {
    let mut samples = Vec::with_capacity(plan.samples);
    for i in 0..plan.samples {
        match sensor.read() {
            Ok(sample) => samples.push(sample),
            Err(e) => warn!("Accelerometer sample {} failed: {}", i + 1, e),
        }
        std::thread::sleep(plan.delay);
    }
    samples
}

/// Clean-air batch, then an alcohol-vapour batch, then the recommendation
///
/// `ready` is called before each batch with an instruction for the operator
/// and returns once they have set the sensor up.
pub fn calibrate_alcohol<F>(
    sensor: &mut dyn GasSensor,
    plan: SamplingPlan,
    mut ready: F,
) -> Result<AlcoholThresholdRecommendation, SensorError>
where
    F: FnMut(&str) -> std::io::Result<()>,
{
    ready("Step 1: make sure there is NO alcohol near the sensor")
        .map_err(|e| SensorError::Read(e.to_string()))?;
    let clean_air = collect_gas(sensor, plan);
    log_summary("Clean air", SampleSummary::from_samples(&clean_air));

    ready("Step 2: expose the sensor to alcohol vapour (never an open flame)")
        .map_err(|e| SensorError::Read(e.to_string()))?;
    let alcohol = collect_gas(sensor, plan);
    log_summary("Alcohol present", SampleSummary::from_samples(&alcohol));

    let recommendation = recommend_alcohol_threshold(&clean_air, &alcohol)?;
    info!(
        "Difference {:.2} ({:.1}% increase)",
        recommendation.alcohol.mean - recommendation.clean_air.mean,
        recommendation.percent_increase
    );
    info!("RECOMMENDED THRESHOLD: {:.0}", recommendation.recommended);
    info!(
        "  set SAFETY_ENGINE__SOBRIETY__ALCOHOL_THRESHOLD={:.0}",
        recommendation.recommended
    );
    info!("  Conservative (fewer false alarms): {:.0}", recommendation.conservative);
    info!("  Aggressive (more sensitive):       {:.0}", recommendation.aggressive);
    Ok(recommendation)
}

/// Sample the accelerometer at rest and report whether it reads level
pub fn calibrate_level(
    sensor: &mut dyn Accelerometer,
    plan: SamplingPlan,
) -> Result<LevelSummary, SensorError> {
    let samples = collect_accel(sensor, plan);
    let summary = summarize_level(&samples)?;

    for (axis, stats) in [("X", summary.x), ("Y", summary.y), ("Z", summary.z)] {
        info!("{}: mean {:.3} g, std dev {:.3}", axis, stats.mean, stats.std_dev);
    }
    if summary.is_level() {
        info!("Level: tilt {:.1}°", summary.tilt_degrees);
    } else {
        warn!(
            "Not level: tilt {:.1}°; remount the sensor before relying on accident detection",
            summary.tilt_degrees
        );
    }
    Ok(summary)
}

fn log_summary(label: &str, summary: Option<SampleSummary>) {
    match summary {
        Some(s) => info!(
            "{}: mean {:.2}, std dev {:.2}, min {:.2}, max {:.2} ({} samples)",
            label, s.mean, s.std_dev, s.min, s.max, s.count
        ),
        None => warn!("{}: no readings", label),
    }
}
