//! Composer tuning knobs.
//!
//! Every field has a default, so a partial JSON object (or `{}`) is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use wires_core::{Size, WiresError};

/// Width/height pair as it appears in the console's JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentSize {
    pub width: f64,
    pub height: f64,
}

impl From<ComponentSize> for Size {
    fn from(s: ComponentSize) -> Self {
        Size::new(s.width, s.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComposerConfig {
    /// Snap grid spacing in canvas units.
    pub grid_size: f64,
    pub component_size: ComponentSize,
    /// Horizontal step used when looking for free space.
    pub free_spot_offset: f64,
    pub zoom_in_factor: f64,
    pub zoom_out_factor: f64,
    pub zoom_duration_ms: f64,
    pub center_duration_ms: f64,
    pub fit_duration_ms: f64,
    /// Quiet period after a pan or transition before blinking resumes.
    pub blink_grace_ms: f64,
    pub pulse_duration_ms: f64,
    /// Pick radius around port anchors.
    pub port_radius: f64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            component_size: ComponentSize {
                width: 80.0,
                height: 80.0,
            },
            free_spot_offset: 100.0,
            zoom_in_factor: 1.2,
            zoom_out_factor: 0.8,
            zoom_duration_ms: 250.0,
            center_duration_ms: 500.0,
            fit_duration_ms: 500.0,
            blink_grace_ms: 1000.0,
            pulse_duration_ms: 400.0,
            port_radius: 8.0,
        }
    }
}

impl ComposerConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, WiresError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WiresError> {
        let positive = [
            ("componentSize.width", self.component_size.width),
            ("componentSize.height", self.component_size.height),
            ("freeSpotOffset", self.free_spot_offset),
            ("zoomInFactor", self.zoom_in_factor),
            ("zoomOutFactor", self.zoom_out_factor),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(WiresError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        let non_negative = [
            ("gridSize", self.grid_size),
            ("zoomDurationMs", self.zoom_duration_ms),
            ("centerDurationMs", self.center_duration_ms),
            ("fitDurationMs", self.fit_duration_ms),
            ("blinkGraceMs", self.blink_grace_ms),
            ("pulseDurationMs", self.pulse_duration_ms),
            ("portRadius", self.port_radius),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(WiresError::Config(format!("{name} must not be negative, got {value}")));
            }
        }
        Ok(())
    }
}
