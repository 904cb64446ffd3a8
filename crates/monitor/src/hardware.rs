//! Sysfs-backed sensor ports and their background samplers

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use sensors::{
    sample_gas, sample_tilt, AccelSample, Accelerometer, GasSensor, SamplerHandle, SamplerService,
    SensorError,
};

use crate::settings::SensorSettings;

fn read_raw(path: &Path) -> Result<f64, SensorError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| SensorError::Unavailable(format!("{}: {}", path.display(), e)))?;
    text.trim()
        .parse()
        .map_err(|_| SensorError::Read(format!("{}: not a number: {:?}", path.display(), text.trim())))
}

/// ADC channel exposed as an IIO `in_voltageN_raw` file
pub struct SysfsGasSensor {
    path: PathBuf,
    full_scale: f64,
}

impl SysfsGasSensor {
    pub fn new(path: PathBuf, full_scale: f64) -> Self {
        Self { path, full_scale }
    }
}

impl GasSensor for SysfsGasSensor {
    fn read_normalized(&mut self) -> Result<f64, SensorError> {
        if self.full_scale <= 0.0 {
            return Err(SensorError::Calibration("gas full scale must be positive".to_string()));
        }
        Ok((read_raw(&self.path)? / self.full_scale).clamp(0.0, 1.0))
    }
}

/// Three IIO `in_accel_*_raw` files
pub struct SysfsAccelerometer {
    axes: [PathBuf; 3],
    scale: f64,
}

impl SysfsAccelerometer {
    pub fn new(x: PathBuf, y: PathBuf, z: PathBuf, scale: f64) -> Self {
        Self {
            axes: [x, y, z],
            scale,
        }
    }
}

impl Accelerometer for SysfsAccelerometer {
    fn read(&mut self) -> Result<AccelSample, SensorError> {
        let [x, y, z] = &self.axes;
        Ok(AccelSample::new(
            read_raw(x)? * self.scale,
            read_raw(y)? * self.scale,
            read_raw(z)? * self.scale,
        ))
    }
}

/// Gas sensor on the configured IIO channel, if any
pub fn gas_sensor(settings: &SensorSettings) -> Option<SysfsGasSensor> {
    let path = settings.gas_path.as_ref()?;
    Some(SysfsGasSensor::new(path.clone(), settings.gas_full_scale))
}

/// Accelerometer from the three configured axis channels, if all are set
pub fn accelerometer(settings: &SensorSettings) -> Option<SysfsAccelerometer> {
    match (&settings.accel_x_path, &settings.accel_y_path, &settings.accel_z_path) {
        (Some(x), Some(y), Some(z)) => Some(SysfsAccelerometer::new(
            x.clone(),
            y.clone(),
            z.clone(),
            settings.accel_scale,
        )),
        (None, None, None) => None,
        _ => {
            warn!("Accelerometer needs all three axis paths");
            None
        }
    }
}

/// Latest readings from the polled sensors
#[derive(Default)]
pub struct SensorFeeds {
    pub gas: Option<SamplerHandle<Option<f64>>>,
    pub tilt: Option<SamplerHandle<Option<f64>>>,
    pub gps: Option<SamplerHandle<sensors::GpsFix>>,
}

impl SensorFeeds {
    /// Start samplers for every configured device
    pub fn start(settings: &SensorSettings) -> Self {
        let interval = settings.poll_interval();
        let mut feeds = Self::default();

        match gas_sensor(settings) {
            Some(mut sensor) => {
                feeds.gas = Some(SamplerService::spawn("gas", interval, None, move || {
                    sample_gas(Some(&mut sensor))
                }));
            }
            None => info!("No gas sensor configured"),
        }

        match accelerometer(settings) {
            Some(mut sensor) => {
                feeds.tilt = Some(SamplerService::spawn("tilt", interval, None, move || {
                    sample_tilt(Some(&mut sensor))
                }));
            }
            None => info!("Tilt unavailable"),
        }

        feeds
    }

    pub fn gas(&self) -> Option<f64> {
        self.gas.as_ref().and_then(|feed| feed.latest())
    }

    pub fn tilt(&self) -> Option<f64> {
        self.tilt.as_ref().and_then(|feed| feed.latest())
    }

    pub fn gps(&self) -> sensors::GpsFix {
        self.gps.as_ref().map(|feed| feed.latest()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("safety-monitor-{}-{}", std::process::id(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", contents).unwrap();
        path
    }

    #[test]
    fn test_gas_normalized_from_raw_counts() {
        let path = temp_file("gas", "511\n");
        let mut sensor = SysfsGasSensor::new(path.clone(), 1023.0);
        let reading = sample_gas(Some(&mut sensor)).unwrap();
        assert!((reading - 511.0 / 1023.0 * 1024.0).abs() < 1e-9);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_device_is_unavailable() {
        let mut sensor = SysfsGasSensor::new(PathBuf::from("/nonexistent/in_voltage0_raw"), 1023.0);
        assert!(matches!(sensor.read_normalized(), Err(SensorError::Unavailable(_))));
        assert_eq!(sample_gas(Some(&mut sensor)), None);
    }

    #[test]
    fn test_upright_accelerometer_has_no_tilt() {
        let x = temp_file("ax", "0");
        let y = temp_file("ay", "0");
        let z = temp_file("az", "16384");
        let mut sensor = SysfsAccelerometer::new(x.clone(), y.clone(), z.clone(), 1.0 / 16384.0);
        let tilt = sample_tilt(Some(&mut sensor)).unwrap();
        assert!(tilt.abs() < 1e-9);
        for path in [x, y, z] {
            std::fs::remove_file(path).ok();
        }
    }

    #[test]
    fn test_partial_accelerometer_config_is_unavailable() {
        let settings = SensorSettings {
            accel_x_path: Some(PathBuf::from("/sys/x")),
            accel_z_path: Some(PathBuf::from("/sys/z")),
            ..Default::default()
        };
        assert!(accelerometer(&settings).is_none());
        assert!(gas_sensor(&settings).is_none());
    }

    #[test]
    fn test_unconfigured_feeds_read_unavailable() {
        let feeds = SensorFeeds::start(&SensorSettings::default());
        assert_eq!(feeds.gas(), None);
        assert_eq!(feeds.tilt(), None);
        assert_eq!(feeds.gps(), sensors::GpsFix::default());
    }
}
