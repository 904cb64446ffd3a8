//! Eye and mouth aspect ratios from facial landmarks
//!
//! Landmark extraction itself happens upstream; these helpers turn the
//! 68-point layout's eye (6 points each) and outer-lip (12 points) slices
//! into the scalar ratios the debouncers consume.

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// A 2D landmark in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Points per eye in the 68-landmark layout
pub const EYE_POINTS: usize = 6;

/// Outer-lip points in the 68-landmark layout (indices 48..60)
pub const MOUTH_POINTS: usize = 12;

/// Eye aspect ratio: `(|p1-p5| + |p2-p4|) / (2 * |p0-p3|)`
pub fn eye_aspect_ratio(eye: &[Point]) -> Result<f64, DmsError> {
    if eye.len() != EYE_POINTS {
        return Err(DmsError::LandmarkCount {
            expected: EYE_POINTS,
            actual: eye.len(),
        });
    }

    let a = eye[1].distance(&eye[5]);
    let b = eye[2].distance(&eye[4]);
    let c = eye[0].distance(&eye[3]);
    ratio(a + b, c)
}

/// Mean EAR of both eyes
pub fn final_ear(left: &[Point], right: &[Point]) -> Result<f64, DmsError> {
    let left = eye_aspect_ratio(left)?;
    let right = eye_aspect_ratio(right)?;
    Ok((left + right) / 2.0)
}

/// Mouth aspect ratio over the outer lip: `(|m2-m10| + |m4-m8|) / (2 * |m0-m6|)`
pub fn mouth_aspect_ratio(mouth: &[Point]) -> Result<f64, DmsError> {
    if mouth.len() != MOUTH_POINTS {
        return Err(DmsError::LandmarkCount {
            expected: MOUTH_POINTS,
            actual: mouth.len(),
        });
    }

    let a = mouth[2].distance(&mouth[10]);
    let b = mouth[4].distance(&mouth[8]);
    let c = mouth[0].distance(&mouth[6]);
    ratio(a + b, c)
}

fn ratio(vertical_sum: f64, width: f64) -> Result<f64, DmsError> {
    if width <= f64::EPSILON {
        return Err(DmsError::DegenerateLandmarks);
    }
    Ok(vertical_sum / (2.0 * width))
}
