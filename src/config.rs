//! TOML configuration for the viewer binary.
//!
//! Every field has a default, so a missing file or a sparse one still
//! yields a runnable setup.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub archive: ArchiveSettings,
    pub window: WindowSettings,
    pub camera: CameraSettings,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveSettings {
    /// Path to the WAD archive.
    pub path: PathBuf,
    /// Name of the level marker to load.
    pub level: String,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/doom1.wad"),
            level: "E1M1".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSettings {
    pub width: usize,
    pub height: usize,
    pub title: String,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 960,
            height: 600,
            title: "wadview".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSettings {
    /// Starting position `[x, height, z]`; overridden by the level's
    /// player start when one exists.
    pub position: [f32; 3],
    /// Heading in degrees.
    pub rotation: f32,
    /// Horizontal field of view in degrees.
    pub fov: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    /// Eye height above the floor, used by the per-frame floor snap.
    pub eye_height: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: [0.0, 41.0, 0.0],
            rotation: -90.0,
            fov: 90.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            eye_height: 41.0,
        }
    }
}

impl Config {
    /// Parse the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Parse the file at `path`, falling back to defaults when it does
    /// not exist.  Malformed files are still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}
