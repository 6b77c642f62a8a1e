//! Configuration for the diff engine
//!
//! Defaults match the reference tool: a 5px grid, a luma threshold of 20,
//! and a pure red highlight at 30% opacity.

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{DiffError, Result};

pub const DEFAULT_GRID_SIZE: u32 = 5;
pub const DEFAULT_THRESHOLD: u8 = 20;
pub const DEFAULT_OVERLAY_COLOR: [u8; 3] = [255, 0, 0];
pub const DEFAULT_OPACITY_PERCENT: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Edge length of a grid cell in page pixels
    pub grid_size: u32,
    /// A cell is hot when its max luma delta is strictly above this
    pub diff_threshold: u8,
    /// Highlight color as RGB
    pub overlay_color: [u8; 3],
    /// Highlight opacity, 0..=100
    pub opacity_percent: u8,
}

impl Default for DiffConfig {
    fn default() -> Self {
        DiffConfig {
            grid_size: DEFAULT_GRID_SIZE,
            diff_threshold: DEFAULT_THRESHOLD,
            overlay_color: DEFAULT_OVERLAY_COLOR,
            opacity_percent: DEFAULT_OPACITY_PERCENT,
        }
    }
}

impl DiffConfig {
    /// Build a config from `PDFDIFF_*` environment variables.
    ///
    /// Missing or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = DiffConfig::default();

        DiffConfig {
            grid_size: parse_var("PDFDIFF_GRID_SIZE").unwrap_or(defaults.grid_size),
            diff_threshold: parse_var("PDFDIFF_THRESHOLD").unwrap_or(defaults.diff_threshold),
            overlay_color: env::var("PDFDIFF_OVERLAY_COLOR")
                .ok()
                .and_then(|raw| {
                    let parsed = parse_hex_color(&raw);
                    if parsed.is_none() {
                        tracing::warn!(value = %raw, "Ignoring malformed PDFDIFF_OVERLAY_COLOR");
                    }
                    parsed
                })
                .unwrap_or(defaults.overlay_color),
            opacity_percent: parse_var("PDFDIFF_OPACITY").unwrap_or(defaults.opacity_percent),
        }
    }

    /// Reject values the differ and overlay cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 {
            return Err(DiffError::InvalidConfig("grid_size must be at least 1".into()));
        }
        if self.opacity_percent > 100 {
            return Err(DiffError::InvalidConfig(format!(
                "opacity_percent must be within 0..=100, got {}",
                self.opacity_percent
            )));
        }
        Ok(())
    }

    pub fn with_grid_size(mut self, grid_size: u32) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.diff_threshold = threshold;
        self
    }

    pub fn with_opacity(mut self, opacity_percent: u8) -> Self {
        self.opacity_percent = opacity_percent;
        self
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable config value");
            None
        }
    }
}

/// Parse `#rrggbb` (leading `#` optional)
pub fn parse_hex_color(raw: &str) -> Option<[u8; 3]> {
    let hex_str = raw.trim().trim_start_matches('#');
    if hex_str.len() != 6 {
        return None;
    }
    let bytes = hex::decode(hex_str).ok()?;
    Some([bytes[0], bytes[1], bytes[2]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DiffConfig::default();
        assert_eq!(config.grid_size, 5);
        assert_eq!(config.diff_threshold, 20);
        assert_eq!(config.overlay_color, [255, 0, 0]);
        assert_eq!(config.opacity_percent, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_grid() {
        let config = DiffConfig::default().with_grid_size(0);
        assert!(matches!(config.validate(), Err(DiffError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_opacity_over_100() {
        let config = DiffConfig::default().with_opacity(101);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff0000"), Some([255, 0, 0]));
        assert_eq!(parse_hex_color("00FF7f"), Some([0, 255, 127]));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("zzzzzz"), None);
    }
}
