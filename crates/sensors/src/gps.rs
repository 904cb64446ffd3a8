//! NMEA GGA parsing with last-known-good position tracking

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::SensorError;

/// Last known position; either half may be missing before the first fix
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GpsFix {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl GpsFix {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
        }
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lon?))
    }

    /// Text for the status overlay
    pub fn display_text(&self) -> String {
        match self.coordinates() {
            Some((lat, lon)) => format!("GPS: {:.4}, {:.4}", lat, lon),
            None => "GPS: N/A".to_string(),
        }
    }
}

/// GGA fix quality indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixQuality {
    NoFix,
    Gps,
    Dgps,
    Pps,
    Rtk,
    FloatRtk,
    Estimated,
    Unknown,
}

impl FixQuality {
    fn from_field(field: &str) -> Self {
        match field.trim() {
            "0" => Self::NoFix,
            "1" => Self::Gps,
            "2" => Self::Dgps,
            "3" => Self::Pps,
            "4" => Self::Rtk,
            "5" => Self::FloatRtk,
            "6" => Self::Estimated,
            _ => Self::Unknown,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::NoFix => "No fix",
            Self::Gps => "GPS fix",
            Self::Dgps => "DGPS fix",
            Self::Pps => "PPS fix",
            Self::Rtk => "RTK fix",
            Self::FloatRtk => "Float RTK",
            Self::Estimated => "Estimated",
            Self::Unknown => "Unknown",
        }
    }
}

/// Decoded `$GPGGA` / `$GNGGA` sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GgaSentence {
    pub lat: f64,
    pub lon: f64,
    pub quality: FixQuality,
    pub satellites: Option<u32>,
    pub altitude_m: Option<f64>,
}

impl GgaSentence {
    pub fn fix(&self) -> GpsFix {
        GpsFix::new(self.lat, self.lon)
    }
}

/// Whether a line is a GGA sentence from a GPS or multi-GNSS talker
pub fn is_gga(line: &str) -> bool {
    line.starts_with("$GPGGA") || line.starts_with("$GNGGA")
}

/// Parse a GGA sentence into decimal degrees
pub fn parse_gga(line: &str) -> Result<GgaSentence, SensorError> {
    let line = line.trim();
    if !is_gga(line) {
        return Err(SensorError::Parse(format!("not a GGA sentence: {:.16}", line)));
    }

    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() <= 6 || parts[2].is_empty() || parts[4].is_empty() {
        return Err(SensorError::Parse("GGA sentence has no position".to_string()));
    }

    let mut lat = parse_coordinate(parts[2], 2)?;
    if parts[3] == "S" {
        lat = -lat;
    }
    let mut lon = parse_coordinate(parts[4], 3)?;
    if parts[5] == "W" {
        lon = -lon;
    }

    Ok(GgaSentence {
        lat,
        lon,
        quality: FixQuality::from_field(parts[6]),
        satellites: parts.get(7).and_then(|s| s.trim().parse().ok()),
        altitude_m: parts.get(9).and_then(|s| s.trim().parse().ok()),
    })
}

/// `ddmm.mmmm` / `dddmm.mmmm` to decimal degrees
fn parse_coordinate(raw: &str, degree_digits: usize) -> Result<f64, SensorError> {
    let (degrees, minutes) = match (raw.get(..degree_digits), raw.get(degree_digits..)) {
        (Some(d), Some(m)) if !m.is_empty() => (d, m),
        _ => return Err(SensorError::Parse(format!("coordinate too short: {}", raw))),
    };

    let degrees: f64 = degrees
        .parse()
        .map_err(|_| SensorError::Parse(format!("bad degrees in {}", raw)))?;
    let minutes: f64 = minutes
        .parse()
        .map_err(|_| SensorError::Parse(format!("bad minutes in {}", raw)))?;
    if !degrees.is_finite() || !minutes.is_finite() {
        return Err(SensorError::Parse(format!("non-finite coordinate: {}", raw)));
    }

    Ok(degrees + minutes / 60.0)
}

/// Keeps the last good fix across malformed or missing sentences
#[derive(Debug, Clone, Default)]
pub struct GpsTracker {
    last_fix: GpsFix,
    valid_count: u64,
}

impl GpsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line; returns true if it produced a new fix
    pub fn ingest(&mut self, line: &str) -> bool {
        if !is_gga(line.trim()) {
            return false;
        }

        match parse_gga(line) {
            Ok(sentence) => {
                if self.valid_count == 0 {
                    info!(
                        "GPS fix acquired: {:.6}, {:.6} ({})",
                        sentence.lat,
                        sentence.lon,
                        sentence.quality.describe()
                    );
                }
                self.valid_count += 1;
                self.last_fix = sentence.fix();
                true
            }
            Err(e) => {
                debug!("Keeping last GPS fix: {}", e);
                false
            }
        }
    }

    pub fn last_fix(&self) -> GpsFix {
        self.last_fix
    }

    /// Number of valid fixes seen this session
    pub fn valid_count(&self) -> u64 {
        self.valid_count
    }
}
