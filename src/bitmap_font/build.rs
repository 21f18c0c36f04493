use anyhow::{bail, Context, Result};
use glam::UVec2;
use image::RgbaImage;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use super::error::BuildError;
use super::fnt::write_fnt;
use super::metrics::{derive_metrics, LineMetrics};
use super::native::{write_font_settings, write_material};
use super::pack::{pack_atlas, GlyphRect, RectPacker};
use super::source::{default_font_name, ensure_dir, file_name_of, filename_sources, manifest_sources, GlyphSource};
use super::store::{ImageStore, SourceImage};
use crate::config::{BuilderConfig, SourceConfig};

/// Everything a build needs. Front-ends fill this in however they like; the
/// pipeline does not care how it was assembled.
#[derive(Clone, Debug, Default)]
pub struct BuildRequest {
    /// `None` marks an image that could not be read; its slot is skipped.
    pub textures: Vec<Option<SourceImage>>,
    /// Character for the texture at the same index.
    pub characters: Vec<char>,
    pub output_dir: PathBuf,
    pub font_name: String,
}

impl BuildRequest {
    pub fn new(output_dir: impl Into<PathBuf>, font_name: impl Into<String>) -> Self {
        Self { output_dir: output_dir.into(), font_name: font_name.into(), ..Default::default() }
    }

    pub fn from_sources(sources: Vec<GlyphSource>, output_dir: impl Into<PathBuf>, font_name: impl Into<String>) -> Self {
        let mut req = Self::new(output_dir, font_name);
        for s in sources {
            req.push(s.character, s.image);
        }
        req
    }

    pub fn push(&mut self, character: char, image: Option<SourceImage>) {
        self.characters.push(character);
        self.textures.push(image);
    }

    pub fn paths(&self) -> FontPaths {
        FontPaths::new(&self.output_dir, &self.font_name)
    }
}

/// The four files one build owns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontPaths {
    pub atlas: PathBuf,
    pub fnt: PathBuf,
    pub font_settings: PathBuf,
    pub material: PathBuf,
}

impl FontPaths {
    pub fn new(dir: &Path, font_name: &str) -> Self {
        let stem = dir.join(font_name);
        let with = |ext: &str| {
            let mut p = stem.clone().into_os_string();
            p.push(".");
            p.push(ext);
            PathBuf::from(p)
        };
        Self {
            atlas: with("png"),
            fnt: with("fnt"),
            font_settings: with("fontsettings"),
            material: with("mat"),
        }
    }

    pub fn all(&self) -> [&Path; 4] {
        [&self.atlas, &self.fnt, &self.font_settings, &self.material]
    }
}

pub(crate) fn atlas_file_name(font_name: &str) -> String {
    format!("{font_name}.png")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedGlyph {
    pub character: char,
    pub rect: GlyphRect,
}

#[derive(Clone, Debug)]
pub struct BuildReport {
    pub paths: FontPaths,
    pub atlas_size: UVec2,
    /// In request order.
    pub glyphs: Vec<PackedGlyph>,
    pub line: LineMetrics,
    /// Texture slots that did not make it into the font.
    pub skipped: usize,
}

fn font_name_or_default(dir: &Path, font_name: Option<&str>) -> String {
    font_name.map_or_else(|| default_font_name(dir), str::to_owned)
}

/// Builds a request from single-character image names in `dir`.
///
/// Output goes next to the images, named after the directory unless `font_name` is given.
pub fn resolve_from_filenames(dir: &Path, font_name: Option<&str>, store: &dyn ImageStore, cfg: &SourceConfig) -> Result<BuildRequest> {
    ensure_dir(dir)?;
    let font_name = font_name_or_default(dir, font_name);
    let sources = filename_sources(dir, store, cfg, &[atlas_file_name(&font_name)])?;
    Ok(BuildRequest::from_sources(sources, dir, font_name))
}

/// Builds a request from the images in `dir` and the characters in its manifest.
pub fn resolve_from_manifest(dir: &Path, font_name: Option<&str>, store: &dyn ImageStore, cfg: &SourceConfig) -> Result<BuildRequest> {
    ensure_dir(dir)?;
    let font_name = font_name_or_default(dir, font_name);
    let sources = manifest_sources(dir, store, cfg, &[atlas_file_name(&font_name)])?;
    Ok(BuildRequest::from_sources(sources, dir, font_name))
}

fn validate(request: &BuildRequest) -> Result<()> {
    if request.font_name.trim().is_empty() {
        bail!(BuildError::EmptyFontName);
    }
    let mut seen = HashSet::new();
    for &c in &request.characters {
        if !seen.insert(c) {
            bail!(BuildError::DuplicateCharacter(c));
        }
    }
    if request.textures.len() != request.characters.len() {
        warn!(
            "{} textures but {} characters; unmatched entries are dropped",
            request.textures.len(),
            request.characters.len()
        );
    }
    Ok(())
}

fn delete_old_outputs(paths: &FontPaths) -> Result<()> {
    for p in paths.all() {
        if p.exists() {
            fs::remove_file(p).with_context(|| format!("remove old {}", p.display()))?;
            debug!("removed old {}", p.display());
        }
    }
    Ok(())
}

fn normalize_all(textures: &[Option<SourceImage>], store: &dyn ImageStore) -> Vec<Option<RgbaImage>> {
    textures
        .iter()
        .map(|t| {
            let src = t.as_ref()?;
            match store.normalize_for_packing(src) {
                Ok(rgba) => Some(rgba),
                Err(e) => {
                    warn!("cannot prepare {} for packing: {e:#}", src.path.display());
                    None
                }
            }
        })
        .collect()
}

/// Runs the whole build: pack, derive metrics, write the atlas and both descriptors.
///
/// Request problems fail before any file is touched. Existing outputs are
/// replaced, never merged.
pub fn build_font(request: &BuildRequest, store: &dyn ImageStore, packer: &dyn RectPacker, cfg: &BuilderConfig) -> Result<BuildReport> {
    validate(request)?;
    let paths = request.paths();

    let pixels = normalize_all(&request.textures, store);
    let packed = pack_atlas(&pixels, packer)?;
    let atlas_size = packed.size();

    let mut glyphs = Vec::with_capacity(packed.rects.len());
    for p in &packed.rects {
        match request.characters.get(p.source_index) {
            Some(&character) => glyphs.push(PackedGlyph { character, rect: p.rect }),
            None => warn!("texture slot {} has no character, leaving it out", p.source_index),
        }
    }
    if glyphs.is_empty() {
        warn!("no glyphs to write; {} will be empty", file_name_of(&paths.fnt));
    }
    let rects: Vec<GlyphRect> = glyphs.iter().map(|g| g.rect).collect();
    let characters: Vec<char> = glyphs.iter().map(|g| g.character).collect();
    let (line, metrics) = derive_metrics(&rects, &characters, atlas_size);

    delete_old_outputs(&paths)?;
    fs::create_dir_all(&request.output_dir).with_context(|| format!("create {}", request.output_dir.display()))?;
    packed.image.save(&paths.atlas).with_context(|| format!("write {}", paths.atlas.display()))?;

    let atlas_file = file_name_of(&paths.atlas);
    let text = write_fnt(&rects, &characters, atlas_size, &atlas_file, &cfg.fnt);
    fs::write(&paths.fnt, text).with_context(|| format!("write {}", paths.fnt.display()))?;

    write_material(&paths.material, &atlas_file)?;
    write_font_settings(&paths.font_settings, &file_name_of(&paths.material), &line, &metrics)?;

    let skipped = request.textures.len().saturating_sub(glyphs.len());
    info!(
        "built {} glyphs into {} ({}x{}, line space {}, {} skipped)",
        glyphs.len(),
        paths.atlas.display(),
        atlas_size.x,
        atlas_size.y,
        line.line_space,
        skipped
    );
    Ok(BuildReport { paths, atlas_size, glyphs, line, skipped })
}
