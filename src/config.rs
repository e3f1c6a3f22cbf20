use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/viewer.json";
pub const MSAA_SAMPLES: u32 = 4;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "WindowConfig::default_title")]
    pub title: String,
    #[serde(default = "WindowConfig::default_width")]
    pub width: u32,
    #[serde(default = "WindowConfig::default_height")]
    pub height: u32,
    #[serde(default = "WindowConfig::default_vsync")]
    pub vsync: bool,
    #[serde(default)]
    pub fullscreen: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "ModelConfig::default_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderConfig {
    /// 4x MSAA when set.
    #[serde(default = "RenderConfig::default_antialias")]
    pub antialias: bool,
    /// Overrides the device-reported scale factor.
    #[serde(default)]
    pub pixel_ratio: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct ViewerConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub vsync: Option<bool>,
    pub model: Option<PathBuf>,
}

impl WindowConfig {
    fn default_title() -> String {
        "Livery".to_string()
    }

    const fn default_width() -> u32 {
        1280
    }

    const fn default_height() -> u32 {
        720
    }

    const fn default_vsync() -> bool {
        true
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            width: Self::default_width(),
            height: Self::default_height(),
            vsync: Self::default_vsync(),
            fullscreen: false,
        }
    }
}

impl ModelConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("assets/models/scene.gltf")
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { path: Self::default_path() }
    }
}

impl RenderConfig {
    const fn default_antialias() -> bool {
        true
    }

    /// Requested multisample count. The window surface may lower it to what the adapter supports.
    pub fn sample_count(&self) -> u32 {
        if self.antialias {
            MSAA_SAMPLES
        } else {
            1
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { antialias: Self::default_antialias(), pixel_ratio: None }
    }
}

impl ViewerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("Config load error: {err:#}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ViewerConfigOverrides) {
        if let Some(width) = overrides.width {
            self.window.width = width;
        }
        if let Some(height) = overrides.height {
            self.window.height = height;
        }
        if let Some(vsync) = overrides.vsync {
            self.window.vsync = vsync;
        }
        if let Some(model) = &overrides.model {
            self.model.path = model.clone();
        }
    }
}

impl ViewerConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.applied_fields().is_empty()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.width.is_some() {
            fields.push("width");
        }
        if self.height.is_some() {
            fields.push("height");
        }
        if self.vsync.is_some() {
            fields.push("vsync");
        }
        if self.model.is_some() {
            fields.push("model");
        }
        fields
    }
}
