//! Serial NMEA reader feeding the GPS tracker

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio_serial::SerialPortBuilderExt;
use tracing::{info, warn};

use crate::feed::SamplerHandle;
use crate::gps::{GpsFix, GpsTracker};
use crate::SensorError;

/// GPS serial port configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsSerialConfig {
    /// Device path (e.g., "/dev/ttyAMA0" or "/dev/serial0")
    pub port: String,
    pub baud_rate: u32,
}

impl Default for GpsSerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyAMA0".to_string(),
            baud_rate: 9600,
        }
    }
}

/// Open the GPS serial port and publish fixes as they arrive
///
/// Must be called from within a tokio runtime. The feed starts with no fix
/// and only ever moves to a newer valid fix.
pub fn spawn_serial_gps(config: &GpsSerialConfig) -> Result<SamplerHandle<GpsFix>, SensorError> {
    let stream = tokio_serial::new(&config.port, config.baud_rate).open_native_async()?;
    info!("GPS serial connection established on {} @ {}", config.port, config.baud_rate);

    let (tx, rx) = watch::channel(GpsFix::default());
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    let mut tracker = GpsTracker::new();

    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while !shutdown_clone.load(Ordering::SeqCst) {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tracker.ingest(&line) && tx.send(tracker.last_fix()).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    warn!("GPS serial stream closed");
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    // Non-UTF8 noise on the line; keep reading
                    warn!("GPS serial read error: {}", e);
                }
                Err(e) => {
                    warn!("GPS serial port failed, keeping last fix: {}", e);
                    break;
                }
            }
        }
    });

    Ok(SamplerHandle::new(rx, shutdown))
}
