//! Engine and service configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Geometry constants of a layout pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Minimum horizontal distance between neighbors in a layer.
    pub horizontal_gap: f64,
    /// Distance between the bottom of one layer and the top of the next.
    pub vertical_gap: f64,
    /// Margin around a container's children block.
    pub group_padding: f64,
    /// Left edge of the first vertex of every layer.
    pub min_x: f64,
    /// Top edge the first layer is measured from.
    pub min_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_gap: 20.0,
            vertical_gap: 40.0,
            group_padding: 10.0,
            min_x: 0.0,
            min_y: 0.0,
        }
    }
}

/// Queue and batching parameters of [`crate::service::LayoutService`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// How long the consumer waits after the first event of a burst before running a pass.
    pub debounce_ms: u64,
    /// Capacity of the event queue; producers block while it is full.
    pub queue_capacity: usize,
    /// Upper bound on events coalesced into one pass.
    pub max_batch: usize,
}

impl ServiceConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 15,
            queue_capacity: 1024,
            max_batch: 256,
        }
    }
}
