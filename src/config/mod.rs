use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::render::{
    RenderStyle, RgbaColor, DEFAULT_BORDER_COLOR, DEFAULT_BORDER_WIDTH, DEFAULT_OVERLAY_COLOR,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "cropper";
const APP_CONFIG_FILE: &str = "config.json";

pub const DEFAULT_HANDLE_MARGIN_PX: f64 = 20.0;
pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 0;

/// Settings from `config.json`. Missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CropperConfig {
    /// Grab distance around crop edges, in surface pixels.
    pub handle_margin_px: f64,
    pub resize_debounce_ms: u64,
    pub border_width: f64,
    pub overlay_color: RgbaColor,
    pub border_color: RgbaColor,
    pub window_width: i32,
    pub window_height: i32,
}

impl Default for CropperConfig {
    fn default() -> Self {
        Self {
            handle_margin_px: DEFAULT_HANDLE_MARGIN_PX,
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
            border_width: DEFAULT_BORDER_WIDTH,
            overlay_color: DEFAULT_OVERLAY_COLOR,
            border_color: DEFAULT_BORDER_COLOR,
            window_width: 960,
            window_height: 720,
        }
    }
}

impl CropperConfig {
    pub fn render_style(&self) -> RenderStyle {
        RenderStyle {
            overlay_color: self.overlay_color,
            border_color: self.border_color,
            border_width: self.border_width,
        }
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    // Negative or non-finite lengths fall back to defaults.
    fn sanitized(mut self) -> Self {
        if !self.handle_margin_px.is_finite() || self.handle_margin_px < 0.0 {
            tracing::warn!(
                value = self.handle_margin_px,
                "invalid handle_margin_px; using default"
            );
            self.handle_margin_px = DEFAULT_HANDLE_MARGIN_PX;
        }
        if !self.border_width.is_finite() || self.border_width < 0.0 {
            tracing::warn!(value = self.border_width, "invalid border_width; using default");
            self.border_width = DEFAULT_BORDER_WIDTH;
        }
        self.window_width = self.window_width.max(1);
        self.window_height = self.window_height.max(1);
        self
    }
}

pub fn load_cropper_config() -> CropperConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_cropper_config_with(xdg_config_home.as_deref(), home.as_deref())
}

pub fn load_cropper_config_with(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> CropperConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(err) => {
            tracing::debug!(?err, "no config directory; using defaults");
            return CropperConfig::default();
        }
    };
    if !path.exists() {
        return CropperConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<CropperConfig>(&contents) {
            Ok(config) => {
                tracing::info!(?path, "loaded config");
                config.sanitized()
            }
            Err(err) => {
                tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
                CropperConfig::default()
            }
        },
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            CropperConfig::default()
        }
    }
}

pub fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
