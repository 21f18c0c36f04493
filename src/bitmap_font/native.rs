//! Engine-side font descriptor: a material that samples the atlas and a font
//! settings file holding the per-glyph metrics. Both are RON documents.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use super::metrics::{GlyphMetrics, LineMetrics};

pub const TEXT_SHADER: &str = "GUI/Text Shader";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontMaterial {
    pub shader: String,
    /// Atlas file name, relative to the material.
    pub main_texture: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontSettings {
    /// Material file name, relative to the settings file.
    pub material: String,
    pub line_space: f32,
    pub characters: Vec<GlyphMetrics>,
}

fn write_ron<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let text = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .with_context(|| format!("serialize {}", path.display()))?;
    fs::write(path, text).with_context(|| format!("write {}", path.display()))
}

pub fn write_material(path: &Path, atlas_file: &str) -> Result<FontMaterial> {
    let mat = FontMaterial { shader: TEXT_SHADER.into(), main_texture: atlas_file.into() };
    write_ron(&mat, path)?;
    Ok(mat)
}

pub fn write_font_settings(path: &Path, material_file: &str, line: &LineMetrics, glyphs: &[GlyphMetrics]) -> Result<()> {
    let settings = FontSettings {
        material: material_file.into(),
        line_space: line.line_space,
        characters: glyphs.to_vec(),
    };
    write_ron(&settings, path)
}

impl FontSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap_font::pack::GlyphRect;
    use glam::UVec2;

    #[test]
    fn settings_survive_a_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let rect = GlyphRect::new(2, 3, 5, 7);
        let line = LineMetrics::from_rects(&[rect]);
        let glyphs = vec![GlyphMetrics::derive('Q', &rect, &line, UVec2::new(16, 16))];
        let path = tmp.path().join("f.fontsettings");
        write_font_settings(&path, "f.mat", &line, &glyphs).unwrap();
        let back = FontSettings::load(&path).unwrap();
        assert_eq!(back.material, "f.mat");
        assert_eq!(back.line_space, 7.0);
        assert_eq!(back.characters, glyphs);
    }

    #[test]
    fn material_points_at_atlas() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("f.mat");
        write_material(&path, "f.png").unwrap();
        let back: FontMaterial = ron::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.shader, TEXT_SHADER);
        assert_eq!(back.main_texture, "f.png");
    }
}
