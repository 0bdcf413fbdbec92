use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Session parameters, loaded from tuning.ron.
#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Fixed tick length in seconds. Timed modifiers advance by this much per tick.
    pub dt: f32,
    /// Upper bound for one option sync chunk, in encoded bytes.
    pub option_chunk_bytes: usize,
    pub hud_font_size: f32,
    /// HUD offset from the right edge, in pixels.
    pub hud_right_px: f32,
    /// HUD offset from the top edge, in pixels.
    pub hud_top_px: f32,
    /// Demo player speed (world units per second).
    pub move_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            dt: 1.0 / 50.0,
            option_chunk_bytes: 1000,
            hud_font_size: 20.0,
            hud_right_px: 16.0,
            hud_top_px: 12.0,
            move_speed: 240.0,
        }
    }
}

impl Tuning {
    /// Per-user directory holding `tuning.ron` and the saved options.
    pub fn data_dir() -> PathBuf {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("effect_sync")
    }

    pub fn file_path() -> PathBuf {
        Self::data_dir().join("tuning.ron")
    }

    /// Session tuning from `tuning.ron`. A missing or broken file is rewritten with defaults.
    pub fn load_or_default() -> Self {
        let path = Self::file_path();
        if let Some(tuning) = Self::read(&path) {
            return tuning.sanitized();
        }
        let tuning = Self::default();
        tuning.save();
        tuning
    }

    fn read(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| warn!("Cannot read {}: {e}, falling back to defaults", path.display()))
            .ok()?;
        ron::from_str::<Tuning>(&text)
            .map_err(|e| warn!("Cannot parse {}: {e}, falling back to defaults", path.display()))
            .ok()
    }

    /// Write the current values as pretty RON.
    pub fn save(&self) {
        let path = Self::file_path();
        if let Some(dir) = path.parent()
            && let Err(e) = std::fs::create_dir_all(dir)
        {
            warn!("Cannot create {}: {e}", dir.display());
        }
        let text = match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(text) => text,
            Err(e) => {
                warn!("Cannot encode tuning: {e}");
                return;
            }
        };
        if let Err(e) = std::fs::write(&path, text) {
            warn!("Cannot write {}: {e}", path.display());
        }
    }

    /// Re-read the file in place. The fixed timestep follows on the next frame.
    pub fn reload(&mut self) {
        *self = Self::load_or_default();
        info!("Tuning reloaded (dt = {:.4}s)", self.dt);
    }

    /// Replace values that would stall the tick loop or the option sync.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.dt.is_finite() || self.dt <= 0.0 {
            warn!("tuning.ron: dt must be positive, got {}", self.dt);
            self.dt = defaults.dt;
        }
        if self.option_chunk_bytes == 0 {
            warn!("tuning.ron: option_chunk_bytes must be non-zero");
            self.option_chunk_bytes = defaults.option_chunk_bytes;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_file_with_defaults() {
        let tuning: Tuning = ron::from_str("(dt: 0.5)").unwrap();
        assert_eq!(tuning.dt, 0.5);
        assert_eq!(tuning.option_chunk_bytes, 1000);
    }

    #[test]
    fn sanitizes_invalid_values() {
        let tuning: Tuning = ron::from_str("(dt: -1.0, option_chunk_bytes: 0)").unwrap();
        let tuning = tuning.sanitized();
        assert_eq!(tuning.dt, Tuning::default().dt);
        assert_eq!(tuning.option_chunk_bytes, 1000);
    }

    #[test]
    fn unreadable_files_yield_nothing() {
        let dir = std::env::temp_dir().join(format!("effect_sync_tuning_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(Tuning::read(&dir.join("absent.ron")).is_none());

        let broken = dir.join("broken.ron");
        std::fs::write(&broken, "(dt: ").unwrap();
        assert!(Tuning::read(&broken).is_none());

        let good = dir.join("good.ron");
        std::fs::write(&good, "(move_speed: 10.0)").unwrap();
        assert_eq!(Tuning::read(&good).map(|t| t.move_speed), Some(10.0));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
