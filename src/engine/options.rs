use serde::{Deserialize, Serialize};

/// Free-form loading overlay options (text, colors, spinner size).
pub type LoadingOptions = serde_json::Value;

/// Rendering backend requested at init time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    #[default]
    Canvas,
    Svg,
}

impl RendererKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Canvas => "canvas",
            Self::Svg => "svg",
        }
    }
}

/// Engine init options besides theme and renderer.
///
/// Any change to these forces the instance to be recreated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitOptions {
    #[serde(default)]
    pub device_pixel_ratio: Option<f64>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub use_dirty_rect: Option<bool>,
    #[serde(default)]
    pub use_coarse_pointer: Option<bool>,
}

/// Options accompanying a `set_option` call.
///
/// Unset fields defer to the engine default, which lets per-call overrides be
/// layered on top of binding-wide defaults with `merged_with`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOptionOpts {
    #[serde(default)]
    pub not_merge: Option<bool>,
    #[serde(default)]
    pub replace_merge: Option<Vec<String>>,
    #[serde(default)]
    pub lazy_update: Option<bool>,
    #[serde(default)]
    pub silent: Option<bool>,
}

impl SetOptionOpts {
    #[must_use]
    pub fn not_merge() -> Self {
        Self {
            not_merge: Some(true),
            ..Self::default()
        }
    }

    /// Returns `self` with every field set in `overrides` taking precedence.
    #[must_use]
    pub fn merged_with(&self, overrides: &SetOptionOpts) -> SetOptionOpts {
        SetOptionOpts {
            not_merge: overrides.not_merge.or(self.not_merge),
            replace_merge: overrides
                .replace_merge
                .clone()
                .or_else(|| self.replace_merge.clone()),
            lazy_update: overrides.lazy_update.or(self.lazy_update),
            silent: overrides.silent.or(self.silent),
        }
    }
}
