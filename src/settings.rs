//! Simulation settings
//!
//! One serializable bundle of viewport size and tuning records. Hosts may
//! keep it as JSON; the core never touches storage on its own.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;
use crate::tuning::{BodyTuning, GenerationTuning, StressTuning};

/// Viewport the level is laid out for (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Velocity unit in pixels
    #[inline]
    pub fn unit(&self) -> f32 {
        self.width / PC_INCR_DIV
    }

    /// Left margin of the playable area
    #[inline]
    pub fn margin_x(&self) -> f32 {
        self.width / MARGIN_DIV
    }
}

/// Complete simulation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub viewport: Viewport,
    #[serde(default)]
    pub body: BodyTuning,
    #[serde(default)]
    pub stress: StressTuning,
    #[serde(default)]
    pub generation: GenerationTuning,
}

impl Settings {
    /// Settings for a viewport with default tuning
    pub fn for_viewport(width: f32, height: f32) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            ..Default::default()
        }
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file, falling back to defaults if it is missing
    pub fn load_or_default(path: &Path) -> Result<Self, SimError> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let settings = Self::from_json(&json)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                Ok(Self::default())
            }
            Err(err) => Err(SimError::InvalidSettings(format!(
                "{}: {err}",
                path.display()
            ))),
        }
    }

    /// Reject values the simulation cannot run with.
    /// Physics degeneracy is checked separately when deriving body parameters.
    pub fn validate(&self) -> Result<(), SimError> {
        let v = &self.viewport;
        if !(v.width.is_finite() && v.height.is_finite() && v.width > 0.0 && v.height > 0.0) {
            return Err(SimError::InvalidSettings(format!(
                "viewport must be positive, got {}x{}",
                v.width, v.height
            )));
        }

        let s = &self.stress;
        if s.min_stress > s.max_stress {
            return Err(SimError::InvalidSettings(
                "min_stress exceeds max_stress".into(),
            ));
        }
        if s.effect_threshold >= crate::tuning::ABS_MAX_STRESS {
            return Err(SimError::InvalidSettings(
                "effect_threshold must be below 100".into(),
            ));
        }

        let g = &self.generation;
        if !(g.reach_safety > 0.0 && g.reach_safety <= 1.0) {
            return Err(SimError::InvalidSettings(
                "reach_safety must be in (0, 1]".into(),
            ));
        }
        if g.vertical_rise.1 > 1.0 || g.horizontal_rise.1 > 1.0 {
            return Err(SimError::InvalidSettings(
                "hop rises cannot exceed the jump height".into(),
            ));
        }
        if g.horizontal_rise.0 <= 0.0 || g.vertical_rise.0 <= 0.0 {
            return Err(SimError::InvalidSettings(
                "hop rises must be positive".into(),
            ));
        }
        if g.max_hop_attempts == 0 {
            return Err(SimError::InvalidSettings(
                "max_hop_attempts must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_json_partial_uses_default_tuning() {
        let settings = Settings::from_json(r#"{"viewport":{"width":800,"height":600}}"#).unwrap();
        assert_eq!(settings.viewport, Viewport::new(800.0, 600.0));
        assert_eq!(settings.body, BodyTuning::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = Settings::for_viewport(1024.0, 768.0);
        settings.stress.panic_spike = 35.0;
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_rejects_bad_viewport() {
        let err = Settings::from_json(r#"{"viewport":{"width":0,"height":600}}"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidSettings(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(Settings::from_json("{"), Err(SimError::Json(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::load_or_default(Path::new("/definitely/not/here.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
