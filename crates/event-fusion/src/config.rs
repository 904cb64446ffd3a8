//! Engine configuration

use serde::{Deserialize, Serialize};

use alerting::{AccidentConfig, AlertConfig};
use dms::DmsConfig;
use sobriety::SobrietyConfig;

/// All thresholds the engine consults, grouped per component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dms: DmsConfig,
    pub alert: AlertConfig,
    pub accident: AccidentConfig,
    pub sobriety: SobrietyConfig,
}
