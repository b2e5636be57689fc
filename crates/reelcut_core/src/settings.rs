use crate::error::{CoreError, Result};
use crate::types::{TimeUs, FRAME_RATE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Editor tunables. Missing fields in a settings file fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    /// Horizontal pixels per second of timeline at zoom 1.0.
    pub pixels_per_second: f64,
    pub initial_zoom: f64,
    /// Output drift tolerated before a forced reseek.
    pub drift_tolerance_secs: f64,
    /// Logical transport clock rate.
    pub frame_rate: u32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            pixels_per_second: 50.0,
            initial_zoom: 1.0,
            drift_tolerance_secs: 0.2,
            frame_rate: FRAME_RATE,
        }
    }
}

impl EditorSettings {
    pub fn drift_tolerance(&self) -> TimeUs {
        TimeUs::from_seconds(self.drift_tolerance_secs)
    }

    /// Reject values the time scale and transport cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.pixels_per_second.is_finite() && self.pixels_per_second > 0.0) {
            return Err(CoreError::InvalidSettings(format!(
                "pixels_per_second must be positive, got {}",
                self.pixels_per_second
            )));
        }
        if !(self.initial_zoom.is_finite() && self.initial_zoom > 0.0) {
            return Err(CoreError::InvalidSettings(format!(
                "initial_zoom must be positive, got {}",
                self.initial_zoom
            )));
        }
        if !(self.drift_tolerance_secs.is_finite() && self.drift_tolerance_secs >= 0.0) {
            return Err(CoreError::InvalidSettings(format!(
                "drift_tolerance_secs must be zero or more, got {}",
                self.drift_tolerance_secs
            )));
        }
        if self.frame_rate == 0 {
            return Err(CoreError::InvalidSettings("frame_rate must be at least 1".into()));
        }
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let settings: Self = serde_json::from_str(&data)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Wide timeline for long edits.
pub fn preset_overview() -> EditorSettings {
    EditorSettings {
        pixels_per_second: 20.0,
        initial_zoom: 0.5,
        ..EditorSettings::default()
    }
}

/// Close-up for frame-level trimming.
pub fn preset_detail() -> EditorSettings {
    EditorSettings {
        pixels_per_second: 100.0,
        initial_zoom: 2.0,
        ..EditorSettings::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let s = EditorSettings::default();
        assert_eq!(s.pixels_per_second, 50.0);
        assert_eq!(s.initial_zoom, 1.0);
        assert_eq!(s.drift_tolerance(), TimeUs(200_000));
        assert_eq!(s.frame_rate, FRAME_RATE);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let settings = preset_detail();
        settings.save_to_file(&path).unwrap();
        assert_eq!(EditorSettings::load_from_file(&path).unwrap(), settings);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "pixels_per_second": 80.0 }"#).unwrap();

        let settings = EditorSettings::load_from_file(&path).unwrap();
        assert_eq!(settings.pixels_per_second, 80.0);
        assert_eq!(settings.frame_rate, 60);
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let dir = TempDir::new().unwrap();
        for body in [
            r#"{ "pixels_per_second": 0.0 }"#,
            r#"{ "pixels_per_second": -5.0 }"#,
            r#"{ "initial_zoom": 0.0 }"#,
            r#"{ "drift_tolerance_secs": -0.1 }"#,
            r#"{ "frame_rate": 0 }"#,
        ] {
            let path = dir.path().join("bad.json");
            std::fs::write(&path, body).unwrap();
            let err = EditorSettings::load_from_file(&path).unwrap_err();
            assert!(matches!(err, CoreError::InvalidSettings(_)), "{body}: {err}");
        }
    }

    #[test]
    fn missing_file_errors() {
        assert!(EditorSettings::load_from_file("/tmp/does_not_exist_reelcut_settings.json").is_err());
    }

    #[test]
    fn presets() {
        assert_eq!(preset_overview().initial_zoom, 0.5);
        assert_eq!(preset_detail().pixels_per_second, 100.0);
    }
}
