//! FFmpeg filter graph definitions.

use v2s_models::{ChromaKey, TileLayout};

/// Alpha cleanup applied to keyed frames.
pub const EROSION_FILTER: &str = "format=rgba,erosion";

/// Frame extraction filter: resample to `fps`, optionally scaling to `width`
/// while keeping the aspect ratio.
pub fn fps_filter(fps: u32, width: Option<u32>) -> String {
    match width {
        Some(w) => format!("fps={},scale={}:-1", fps, w),
        None => format!("fps={}", fps),
    }
}

/// Chroma key filter: `chromakey=color:similarity:blend`.
pub fn chroma_filter(key: &ChromaKey) -> String {
    format!(
        "chromakey={}:{:.2}:{:.2}",
        key.color, key.similarity, key.blend
    )
}

/// GIF filter graph.
///
/// Keys the frames with the same settings as the chroma stage, scales to the
/// display width and builds a palette with a reserved transparent entry so
/// the keyed background stays transparent in the GIF.
pub fn gif_filter(key: &ChromaKey, width: u32) -> String {
    format!(
        "{},scale={}:-1:flags=lanczos,split[s0][s1];\
         [s0]palettegen=reserve_transparent=1[p];\
         [s1][p]paletteuse=alpha_threshold=128",
        chroma_filter(key),
        width
    )
}

/// Spritesheet grid filter.
pub fn tile_filter(layout: &TileLayout) -> String {
    format!("tile={}", layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_filter() {
        assert_eq!(fps_filter(12, None), "fps=12");
        assert_eq!(fps_filter(24, Some(256)), "fps=24,scale=256:-1");
    }

    #[test]
    fn test_chroma_filter_defaults() {
        assert_eq!(
            chroma_filter(&ChromaKey::default()),
            "chromakey=0x00FF00:0.05:0.15"
        );
    }

    #[test]
    fn test_gif_filter_keeps_transparency() {
        let filter = gif_filter(&ChromaKey::default(), 320);
        assert!(filter.starts_with("chromakey=0x00FF00:0.05:0.15,scale=320:-1"));
        assert!(filter.contains("palettegen=reserve_transparent=1"));
        assert!(filter.contains("paletteuse"));
    }

    #[test]
    fn test_tile_filter() {
        assert_eq!(tile_filter(&TileLayout { columns: 4, rows: 2 }), "tile=4x2");
    }
}
