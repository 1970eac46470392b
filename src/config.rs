//! Demo configuration loaded from RON or TOML.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```ron
//! (
//!     spin_speed: 0.25,
//!     camera: (movement_speed: 6.0),
//!     shadow: (resolution: 4096),
//! )
//! ```

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::render_graph::ShadowSettings;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Wait for vertical blank when presenting.
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "penumbra".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub movement_speed: f32,
    pub mouse_look_speed: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, -5.0],
            movement_speed: 4.0,
            mouse_look_speed: 2.0,
            fov_degrees: 90.0,
        }
    }
}

/// Top-level settings for the demo binary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Directory holding `textures/` and `skies/`.
    pub asset_dir: PathBuf,
    /// Yaw added to every entity per second, in radians.
    pub spin_speed: f32,
    /// Show FPS and frame time in the window title.
    pub show_stats: bool,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub shadow: ShadowSettings,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            spin_speed: 0.1,
            show_stats: true,
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            shadow: ShadowSettings::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Ron,
    Toml,
}

fn format_of(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
    }
}

impl DemoConfig {
    /// Load from a `.ron` or `.toml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = format_of(path)?;
        let contents = std::fs::read_to_string(path)?;
        let config = match format {
            Format::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?,
            Format::Toml => {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
        };
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write to a `.ron` or `.toml` file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match format_of(path)? {
            Format::Ron => ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Format::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
        };
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Vertical field of view in radians.
    pub fn fov(&self) -> f32 {
        self.camera.fov_degrees.to_radians()
    }
}
