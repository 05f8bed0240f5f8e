//! # Settings
//!
//! A small TOML settings file: canvas defaults, which snapping strategy the
//! curve stencils use, and where the autosave document lives. Missing or
//! unparseable settings fall back to defaults with a warning - preferences
//! are never worth refusing to start over.

use std::path::{Path, PathBuf};

use crate::stencil::SnapGeneration;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub snap_generation: SnapGeneration,
    /// Autosave document location; `None` selects the platform default.
    pub autosave_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas_width: 2000,
            canvas_height: 1000,
            snap_generation: SnapGeneration::default(),
            autosave_file: None,
        }
    }
}

impl Config {
    /// Default settings path under the platform config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("sketch360").join("config.toml"))
    }

    /// Default autosave path under the platform data directory.
    #[must_use]
    pub fn default_autosave_path() -> Option<PathBuf> {
        Some(dirs::data_local_dir()?.join("sketch360").join("_sketchData.json"))
    }

    /// The effective autosave location.
    #[must_use]
    pub fn autosave_path(&self) -> PathBuf {
        self.autosave_file
            .clone()
            .or_else(Self::default_autosave_path)
            .unwrap_or_else(|| PathBuf::from("_sketchData.json"))
    }

    /// Load from `path`, falling back to defaults on any error.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => config,
                Err(err) => {
                    log::warn!("invalid settings in {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                log::warn!("could not read settings {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Config;
    use crate::stencil::SnapGeneration;

    #[test]
    fn roundtrips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config {
            canvas_width: 4000,
            canvas_height: 2000,
            snap_generation: SnapGeneration::Perspective,
            autosave_file: Some(dir.path().join("doc.json")),
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load_or_default(&path), config);
    }

    #[test]
    fn missing_or_invalid_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            Config::load_or_default(&dir.path().join("absent.toml")),
            Config::default()
        );

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "canvas_width = \"wide\"").unwrap();
        assert_eq!(Config::load_or_default(&bad), Config::default());
    }

    #[test]
    fn partial_settings_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "snap_generation = \"Perspective\"").unwrap();
        let config = Config::load_or_default(&path);
        assert_eq!(config.snap_generation, SnapGeneration::Perspective);
        assert_eq!(config.canvas_width, 2000);
    }
}
