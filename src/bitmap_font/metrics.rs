use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::pack::GlyphRect;

/// Smallest line space a font can have, so an all-empty glyph set still has height.
pub const MIN_LINE_SPACE: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineMetrics {
    pub line_space: f32,
}

impl LineMetrics {
    pub fn from_rects(rects: &[GlyphRect]) -> Self {
        let line_space = rects.iter().map(|r| r.height as f32).fold(MIN_LINE_SPACE, f32::max);
        Self { line_space }
    }
}

/// Layout record for one glyph, in atlas pixels except for the UV corners.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlyphMetrics {
    pub character: char,
    pub uv_bottom_left: Vec2,
    pub uv_bottom_right: Vec2,
    pub uv_top_left: Vec2,
    pub uv_top_right: Vec2,
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    pub advance: i32,
}

impl GlyphMetrics {
    /// Every glyph is centred vertically against the shared line space.
    pub fn derive(character: char, rect: &GlyphRect, line: &LineMetrics, atlas: UVec2) -> Self {
        let h = rect.height as f32;
        let pivot = -line.line_space / 2.0;
        let offset_y = (pivot + (line.line_space - h) / 2.0).floor() as i32;
        let (w, ah) = (atlas.x as f32, atlas.y as f32);
        let (u0, u1) = (rect.x as f32 / w, rect.right() as f32 / w);
        let (v0, v1) = (rect.y as f32 / ah, rect.top() as f32 / ah);
        Self {
            character,
            uv_bottom_left: Vec2::new(u0, v0),
            uv_bottom_right: Vec2::new(u1, v0),
            uv_top_left: Vec2::new(u0, v1),
            uv_top_right: Vec2::new(u1, v1),
            min_x: 0,
            max_x: rect.width as i32,
            min_y: -(rect.height as i32) - offset_y,
            max_y: -offset_y,
            advance: rect.width as i32,
        }
    }
}

/// Number of glyphs both lists can describe; warns when they disagree.
pub(crate) fn paired_len(rects: usize, characters: usize) -> usize {
    if rects != characters {
        warn!("{rects} rects but {characters} characters; only the first {} glyphs are used", rects.min(characters));
    }
    rects.min(characters)
}

/// Derives line and glyph metrics for the overlapping prefix of `rects` and `characters`.
pub fn derive_metrics(rects: &[GlyphRect], characters: &[char], atlas: UVec2) -> (LineMetrics, Vec<GlyphMetrics>) {
    let n = paired_len(rects.len(), characters.len());
    let line = LineMetrics::from_rects(rects);
    let glyphs = rects[..n]
        .iter()
        .zip(&characters[..n])
        .map(|(r, &c)| GlyphMetrics::derive(c, r, &line, atlas))
        .collect();
    (line, glyphs)
}
