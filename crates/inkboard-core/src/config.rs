//! Engine tuning knobs.

use crate::view::{MAX_ZOOM, MIN_ZOOM};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
    #[error("invalid zoom range {min}..{max}")]
    ZoomRange { min: f64, max: f64 },
    #[error("{field} must be a finite non-negative number, got {value}")]
    Negative { field: &'static str, value: f64 },
}

/// Tunable constants for the history store and interaction engine.
///
/// Every field has a default, so partial JSON files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of undo entries kept.
    pub history_limit: usize,
    /// Click-select tolerance in screen pixels.
    pub hit_tolerance_px: f64,
    /// Eraser sweep tolerance in screen pixels.
    pub eraser_tolerance_px: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom change per unit of wheel delta.
    pub wheel_zoom_speed: f64,
    /// Smallest width/height a resize may produce, in world units.
    pub min_resize: f64,
    /// Smallest text box committed on pointer-up, in world units.
    pub text_min_size: Size,
    /// Shapes at or below this size in every dimension are discarded on pointer-up.
    pub shape_substance: f64,
    /// Placement search rings around the preferred position.
    pub placement_rings: usize,
    /// Gap used by the placement search, in world units.
    pub placement_gap: f64,
    /// Padding around content for zoom-to-fit, in screen pixels.
    pub fit_padding: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: 200,
            hit_tolerance_px: 8.0,
            eraser_tolerance_px: 2.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            wheel_zoom_speed: 0.001,
            min_resize: 20.0,
            text_min_size: Size::new(100.0, 40.0),
            shape_substance: 2.0,
            placement_rings: 20,
            placement_gap: 20.0,
            fit_padding: 50.0,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the zoom range and the non-negative distances.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = (self.min_zoom, self.max_zoom);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(ConfigError::ZoomRange { min, max });
        }
        for (field, value) in self.distances() {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }

    /// Copy with every invalid field reset to its default.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let mut config = self;
        if let Err(err) = config.validate() {
            log::warn!("engine config rejected ({err}); resetting invalid fields");
        }
        let (min, max) = (config.min_zoom, config.max_zoom);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            config.min_zoom = defaults.min_zoom;
            config.max_zoom = defaults.max_zoom;
        }
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(config.hit_tolerance_px) {
            config.hit_tolerance_px = defaults.hit_tolerance_px;
        }
        if !valid(config.eraser_tolerance_px) {
            config.eraser_tolerance_px = defaults.eraser_tolerance_px;
        }
        if !valid(config.wheel_zoom_speed) {
            config.wheel_zoom_speed = defaults.wheel_zoom_speed;
        }
        if !valid(config.min_resize) {
            config.min_resize = defaults.min_resize;
        }
        if !(valid(config.text_min_size.width) && valid(config.text_min_size.height)) {
            config.text_min_size = defaults.text_min_size;
        }
        if !valid(config.shape_substance) {
            config.shape_substance = defaults.shape_substance;
        }
        if !valid(config.placement_gap) {
            config.placement_gap = defaults.placement_gap;
        }
        if !valid(config.fit_padding) {
            config.fit_padding = defaults.fit_padding;
        }
        config
    }

    fn distances(&self) -> [(&'static str, f64); 9] {
        [
            ("hit_tolerance_px", self.hit_tolerance_px),
            ("eraser_tolerance_px", self.eraser_tolerance_px),
            ("wheel_zoom_speed", self.wheel_zoom_speed),
            ("min_resize", self.min_resize),
            ("text_min_size.width", self.text_min_size.width),
            ("text_min_size.height", self.text_min_size.height),
            ("shape_substance", self.shape_substance),
            ("placement_gap", self.placement_gap),
            ("fit_padding", self.fit_padding),
        ]
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
