use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// Extension (without dot) of glyph images picked up from a directory.
    pub image_extension: String,
    /// Manifest listing one character per image, relative to the glyph directory.
    pub manifest_name: String,
    /// Prepended to a filename when an image has to be copied before it can be loaded.
    pub recovery_prefix: String,
}
impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            image_extension: "png".into(),
            manifest_name: "chars.txt".into(),
            recovery_prefix: "_".into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PackingConfig {
    /// Empty pixels kept between neighbouring glyphs.
    pub padding: u32,
    pub max_atlas_size: u32,
    /// Rewrite source images as RGBA8 PNG when they decode to another pixel format.
    pub persist_normalized_sources: bool,
}
impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            padding: 0,
            max_atlas_size: 2048,
            persist_normalized_sources: true,
        }
    }
}

/// Fixed values written to the `info` and `common` records of the `.fnt` file.
///
/// These are not derived from the font name or the measured line space.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FntConfig {
    pub face: String,
    pub size: u32,
    pub bold: bool,
    pub italic: bool,
    pub charset: String,
    pub unicode: bool,
    pub base: u32,
    pub scale_w: u32,
    pub scale_h: u32,
}
impl Default for FntConfig {
    fn default() -> Self {
        Self {
            face: "Custom".into(),
            size: 50,
            bold: true,
            italic: false,
            charset: String::new(),
            unicode: true,
            base: 26,
            scale_w: 128,
            scale_h: 64,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct BuilderConfig {
    pub sources: SourceConfig,
    pub packing: PackingConfig,
    pub fnt: FntConfig,
}

impl BuilderConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let data = fs::read_to_string(&path).map_err(|e| format!("read config: {e}"))?;
        ron::from_str(&data).map_err(|e| format!("parse RON: {e}"))
    }
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<String>) {
        match Self::load_from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }
    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.sources.image_extension.trim_start_matches('.').is_empty() {
            w.push("sources.image_extension is empty; no images will be found".into());
        }
        if self.sources.manifest_name.is_empty() {
            w.push("sources.manifest_name is empty".into());
        }
        if self.sources.recovery_prefix.is_empty() {
            w.push("sources.recovery_prefix is empty; load recovery would copy a file onto itself".into());
        }
        if self.packing.max_atlas_size == 0 {
            w.push("packing.max_atlas_size is 0; every non-empty build will fail".into());
        } else if !self.packing.max_atlas_size.is_power_of_two() {
            w.push(format!(
                "packing.max_atlas_size {} is not a power of two; the largest usable size is {}",
                self.packing.max_atlas_size,
                prev_power_of_two(self.packing.max_atlas_size)
            ));
        }
        if self.packing.padding > 64 {
            w.push(format!("packing.padding {} is unusually large", self.packing.padding));
        }
        if self.fnt.size == 0 {
            w.push("fnt.size is 0".into());
        }
        w
    }
}

fn prev_power_of_two(v: u32) -> u32 {
    if v == 0 {
        0
    } else {
        1 << (31 - v.leading_zeros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_keeps_defaults() {
        let cfg: BuilderConfig = ron::from_str("(packing: (padding: 2))").unwrap();
        assert_eq!(cfg.packing.padding, 2);
        assert_eq!(cfg.packing.max_atlas_size, 2048);
        assert_eq!(cfg.sources.manifest_name, "chars.txt");
        assert_eq!(cfg.fnt.size, 50);
        assert_eq!(cfg.fnt.face, "Custom");
    }

    #[test]
    fn default_config_has_no_warnings() {
        assert!(BuilderConfig::default().validate().is_empty());
    }

    #[test]
    fn non_power_of_two_max_size_warns() {
        let mut cfg = BuilderConfig::default();
        cfg.packing.max_atlas_size = 1000;
        let w = cfg.validate();
        assert_eq!(w.len(), 1);
        assert!(w[0].contains("512"), "{}", w[0]);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let (cfg, err) = BuilderConfig::load_or_default("does/not/exist.ron");
        assert_eq!(cfg, BuilderConfig::default());
        assert!(err.unwrap().starts_with("read config"));
    }
}
