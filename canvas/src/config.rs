//! Canvas configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::collections::HashMap;
use std::env::VarError;

use crate::input::Platform;
use crate::render::{CardSurface, RenderMode, RenderOptions};

pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";

/// Every variable [`CanvasConfig::from_env`] reads.
pub const ENV_VARS: [&str; 5] =
    ["CARD_WIDTH_MM", "CARD_HEIGHT_MM", "CARD_PX_PER_MM", "CARD_PLATFORM", "CARD_DEFAULT_FONT_FAMILY"];

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a positive number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var}: {message}")]
    Invalid { var: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    pub surface: CardSurface,
    pub platform: Platform,
    pub font_family: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            surface: CardSurface::default(),
            platform: Platform::Other,
            font_family: DEFAULT_FONT_FAMILY.into(),
        }
    }
}

impl CanvasConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `CARD_WIDTH_MM`: default 85.6
    /// - `CARD_HEIGHT_MM`: default 53.98
    /// - `CARD_PX_PER_MM`: default 96 / 25.4
    /// - `CARD_PLATFORM`: `other` (default) or `mac`
    /// - `CARD_DEFAULT_FONT_FAMILY`: default `sans-serif`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set but is not unicode or
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut vars = HashMap::new();
        for var in ENV_VARS {
            match std::env::var(var) {
                Ok(value) => {
                    vars.insert(var, value);
                }
                Err(VarError::NotPresent) => {}
                Err(VarError::NotUnicode(raw)) => {
                    return Err(ConfigError::Invalid { var, message: format!("not valid unicode: {raw:?}") });
                }
            }
        }
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value is present but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let surface = CardSurface {
            width_mm: parse_positive("CARD_WIDTH_MM", get("CARD_WIDTH_MM"), defaults.surface.width_mm)?,
            height_mm: parse_positive("CARD_HEIGHT_MM", get("CARD_HEIGHT_MM"), defaults.surface.height_mm)?,
            px_per_mm: parse_positive("CARD_PX_PER_MM", get("CARD_PX_PER_MM"), defaults.surface.px_per_mm)?,
        };
        let platform = match get("CARD_PLATFORM") {
            Some(raw) => raw
                .parse::<Platform>()
                .map_err(|e| ConfigError::Invalid { var: "CARD_PLATFORM", message: e.to_string() })?,
            None => defaults.platform,
        };
        let font_family = get("CARD_DEFAULT_FONT_FAMILY").map_or(defaults.font_family, |f| f.trim().to_owned());

        Ok(Self { surface, platform, font_family })
    }

    /// Render options for this surface in `mode`.
    #[must_use]
    pub fn render_options(&self, mode: RenderMode) -> RenderOptions {
        RenderOptions { surface: self.surface, mode, font_family: self.font_family.clone() }
    }
}

fn parse_positive(var: &'static str, raw: Option<String>, default: f64) -> Result<f64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(ConfigError::InvalidNumber { var, value: raw }),
    }
}
