//! Driver state tracking

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationState;
use crate::drowsiness::DrowsinessState;

/// Snapshot of the debouncers' internal state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverState {
    pub calibration: CalibrationState,

    pub drowsiness: DrowsinessState,
}
