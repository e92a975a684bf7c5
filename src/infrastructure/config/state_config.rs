use serde::{Deserialize, Serialize};

use crate::domain::entities::{MapRegion, PinId};

/// Session state persisted between runs.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Last opened pin.
    #[serde(default)]
    pub last_pin: Option<PinId>,

    /// Last visible map region.
    #[serde(default)]
    pub map_region: Option<MapRegion>,
}
