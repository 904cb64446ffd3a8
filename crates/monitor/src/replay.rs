//! Frame sources for the tick loop
//!
//! A replay file holds one JSON object per line. Every field is optional;
//! fields present in a frame take precedence over the live sensor feeds.
//!
//! ```text
//! {"face":{"kind":"face","eye_aspect_ratio":0.31,"mouth_aspect_ratio":0.22},"gas":120}
//! {"face":{"kind":"no_face"},"accel":{"x":0.0,"y":0.9,"z":0.3}}
//! {"nmea":"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47"}
//! ```

use std::io::BufRead;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use dms::FaceObservation;
use sensors::AccelSample;

/// One recorded frame
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReplayFrame {
    pub face: FaceObservation,
    pub gas: Option<f64>,
    pub tilt_degrees: Option<f64>,
    pub accel: Option<AccelSample>,
    /// Raw NMEA sentence received alongside this frame
    pub nmea: Option<String>,
}

/// Source of per-tick frames; `None` ends the session
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Option<ReplayFrame>;
}

/// In-memory frames, mostly for tests
pub struct VecFrameSource {
    frames: std::vec::IntoIter<ReplayFrame>,
}

impl VecFrameSource {
    pub fn new(frames: Vec<ReplayFrame>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl FrameSource for VecFrameSource {
    fn next_frame(&mut self) -> Option<ReplayFrame> {
        self.frames.next()
    }
}

/// Endless frames with no face; the loop then runs on sensor feeds alone
pub struct IdleFrameSource;

impl FrameSource for IdleFrameSource {
    fn next_frame(&mut self) -> Option<ReplayFrame> {
        Some(ReplayFrame::default())
    }
}

/// Parse a JSON-lines replay; malformed lines are skipped
pub fn parse_replay<R: BufRead>(reader: R) -> std::io::Result<Vec<ReplayFrame>> {
    let mut frames = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(frame) => frames.push(frame),
            Err(e) => warn!("Skipping replay line {}: {}", index + 1, e),
        }
    }
    debug!("Parsed {} replay frames", frames.len());
    Ok(frames)
}

pub fn load_replay(path: &Path) -> std::io::Result<VecFrameSource> {
    let file = std::fs::File::open(path)?;
    let frames = parse_replay(std::io::BufReader::new(file))?;
    info!("Loaded {} frames from {}", frames.len(), path.display());
    Ok(VecFrameSource::new(frames))
}
