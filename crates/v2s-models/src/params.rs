//! Process parameters and their defaults.
//!
//! Clients send zero or empty values to mean "use the default", so every
//! accessor here resolves the effective value instead of exposing raw fields
//! to the filter builders.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default chroma key similarity.
pub const DEFAULT_SIMILARITY: f64 = 0.05;
/// Default chroma key blend (sent by clients as `threshold`).
pub const DEFAULT_BLEND: f64 = 0.15;
/// Default key colour (pure green).
pub const DEFAULT_CHROMA_COLOR: &str = "#00ff00";
/// Default spritesheet grid.
pub const DEFAULT_TILE: &str = "8x8";
/// Default extraction frame rate.
pub const DEFAULT_FPS: u32 = 12;
/// Width of the rendered GIF.
pub const GIF_DISPLAY_WIDTH: u32 = 320;

const MAX_FPS: u32 = 60;
const MAX_TARGET_WIDTH: u32 = 4096;
const MAX_TILE_CELLS: u32 = 64;

/// Rejected process parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    #[error("invalid chroma color: {0}")]
    InvalidColor(String),

    #[error("invalid tile layout: {0} (expected COLSxROWS)")]
    InvalidTile(String),

    #[error("{name} must be between 0 and 1, got {value}")]
    ToleranceOutOfRange { name: &'static str, value: f64 },

    #[error("fps must be at most 60, got {0}")]
    FpsOutOfRange(u32),

    #[error("size must be at most 4096, got {0}")]
    SizeOutOfRange(u32),
}

/// Caller-supplied processing parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessParams {
    /// Chroma key blend amount (0 = default)
    pub threshold: f64,
    /// Chroma key similarity (0 = default)
    pub similarity: f64,
    /// Spritesheet grid, e.g. "8x8" (empty = default)
    pub tile: String,
    /// Key colour as `#rrggbb` or `#rgb` (empty = default)
    pub chroma_color: String,
    /// Extraction frame rate (0 = default)
    pub fps: u32,
    /// Target frame width in pixels (0 = keep source size)
    pub size: u32,
}

impl ProcessParams {
    /// Check every field that ends up inside an FFmpeg filter graph.
    pub fn validate(&self) -> Result<(), ParamsError> {
        for (name, value) in [("threshold", self.threshold), ("similarity", self.similarity)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ParamsError::ToleranceOutOfRange { name, value });
            }
        }
        if self.fps > MAX_FPS {
            return Err(ParamsError::FpsOutOfRange(self.fps));
        }
        if self.size > MAX_TARGET_WIDTH {
            return Err(ParamsError::SizeOutOfRange(self.size));
        }
        self.chroma_key()?;
        self.tile_layout()?;
        Ok(())
    }

    /// Resolved chroma key settings.
    pub fn chroma_key(&self) -> Result<ChromaKey, ParamsError> {
        let color = if self.chroma_color.trim().is_empty() {
            DEFAULT_CHROMA_COLOR
        } else {
            self.chroma_color.trim()
        };
        Ok(ChromaKey {
            color: ffmpeg_color(color)?,
            similarity: or_default(self.similarity, DEFAULT_SIMILARITY),
            blend: or_default(self.threshold, DEFAULT_BLEND),
        })
    }

    /// Resolved spritesheet grid.
    pub fn tile_layout(&self) -> Result<TileLayout, ParamsError> {
        let tile = self.tile.trim();
        if tile.is_empty() {
            return DEFAULT_TILE.parse();
        }
        tile.parse()
    }

    /// Resolved extraction frame rate.
    pub fn frame_rate(&self) -> u32 {
        if self.fps == 0 {
            DEFAULT_FPS
        } else {
            self.fps
        }
    }

    /// Target frame width, `None` to keep the source size.
    pub fn target_width(&self) -> Option<u32> {
        (self.size > 0).then_some(self.size)
    }
}

fn or_default(value: f64, default: f64) -> f64 {
    if value == 0.0 {
        default
    } else {
        value
    }
}

/// Convert `#rrggbb` / `#rgb` (hash optional) to FFmpeg's `0xRRGGBB`.
fn ffmpeg_color(hex: &str) -> Result<String, ParamsError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ParamsError::InvalidColor(hex.to_string()));
    }
    let expanded = match digits.len() {
        6 => digits.to_string(),
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        _ => return Err(ParamsError::InvalidColor(hex.to_string())),
    };
    Ok(format!("0x{}", expanded.to_ascii_uppercase()))
}

/// Effective chroma key settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaKey {
    /// Colour in FFmpeg notation (`0xRRGGBB`)
    pub color: String,
    pub similarity: f64,
    pub blend: f64,
}

impl Default for ChromaKey {
    fn default() -> Self {
        Self {
            color: "0x00FF00".to_string(),
            similarity: DEFAULT_SIMILARITY,
            blend: DEFAULT_BLEND,
        }
    }
}

/// Spritesheet grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    pub columns: u32,
    pub rows: u32,
}

impl Default for TileLayout {
    fn default() -> Self {
        Self {
            columns: 8,
            rows: 8,
        }
    }
}

impl std::str::FromStr for TileLayout {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParamsError::InvalidTile(s.to_string());
        let (cols, rows) = s.split_once(['x', 'X']).ok_or_else(invalid)?;
        let columns: u32 = cols.parse().map_err(|_| invalid())?;
        let rows: u32 = rows.parse().map_err(|_| invalid())?;
        if !(1..=MAX_TILE_CELLS).contains(&columns) || !(1..=MAX_TILE_CELLS).contains(&rows) {
            return Err(invalid());
        }
        Ok(Self { columns, rows })
    }
}

impl fmt::Display for TileLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values_resolve_to_defaults() {
        let params = ProcessParams::default();
        let key = params.chroma_key().unwrap();
        assert_eq!(key.color, "0x00FF00");
        assert_eq!(key.similarity, DEFAULT_SIMILARITY);
        assert_eq!(key.blend, DEFAULT_BLEND);
        assert_eq!(params.tile_layout().unwrap(), TileLayout::default());
        assert_eq!(params.frame_rate(), DEFAULT_FPS);
        assert_eq!(params.target_width(), None);
    }

    #[test]
    fn test_explicit_values_win() {
        let params = ProcessParams {
            threshold: 0.3,
            similarity: 0.2,
            tile: "4x2".into(),
            chroma_color: "#ff00AA".into(),
            fps: 24,
            size: 256,
        };
        let key = params.chroma_key().unwrap();
        assert_eq!(key.color, "0xFF00AA");
        assert_eq!(key.similarity, 0.2);
        assert_eq!(key.blend, 0.3);
        assert_eq!(params.tile_layout().unwrap(), TileLayout { columns: 4, rows: 2 });
        assert_eq!(params.frame_rate(), 24);
        assert_eq!(params.target_width(), Some(256));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_color_conversion() {
        assert_eq!(ffmpeg_color("#f00").unwrap(), "0xFF0000");
        assert_eq!(ffmpeg_color("00ff00").unwrap(), "0x00FF00");
        assert!(ffmpeg_color("#12345").is_err());
        assert!(ffmpeg_color("green").is_err());
        assert!(ffmpeg_color("#00ff00:1").is_err());
    }

    #[test]
    fn test_tile_parsing() {
        assert_eq!(
            "10x3".parse::<TileLayout>().unwrap(),
            TileLayout {
                columns: 10,
                rows: 3
            }
        );
        assert!("8".parse::<TileLayout>().is_err());
        assert!("0x8".parse::<TileLayout>().is_err());
        assert!("8x8;drawtext".parse::<TileLayout>().is_err());
        assert_eq!(TileLayout::default().to_string(), "8x8");
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let bad_similarity = ProcessParams {
            similarity: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            bad_similarity.validate(),
            Err(ParamsError::ToleranceOutOfRange { name: "similarity", .. })
        ));

        let bad_fps = ProcessParams {
            fps: 240,
            ..Default::default()
        };
        assert_eq!(bad_fps.validate(), Err(ParamsError::FpsOutOfRange(240)));

        let bad_color = ProcessParams {
            chroma_color: "blue".into(),
            ..Default::default()
        };
        assert!(matches!(bad_color.validate(), Err(ParamsError::InvalidColor(_))));
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let params: ProcessParams = serde_json::from_str(r#"{"fps": 12, "tile": "8x8"}"#).unwrap();
        assert_eq!(params.fps, 12);
        assert_eq!(params.similarity, 0.0);
        assert!(params.chroma_color.is_empty());
    }
}
