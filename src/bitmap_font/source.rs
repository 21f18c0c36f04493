//! Glyph source resolution from a directory of images.
//!
//! Two strategies pair each image with its character:
//!   - filename: `A.png` is the glyph for 'A'
//!   - manifest: `chars.txt` lists one character per image, in sorted file order

use anyhow::{bail, Context, Result};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use super::error::BuildError;
use super::store::{ImageStore, SourceImage};
use crate::config::SourceConfig;

/// One glyph's character and, if it could be read, its image.
#[derive(Clone, Debug)]
pub struct GlyphSource {
    pub character: char,
    pub image: Option<SourceImage>,
}

pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!(BuildError::NotADirectory(dir.to_path_buf()));
    }
    Ok(())
}

/// The directory's own name, used as the default font name.
pub fn default_font_name(dir: &Path) -> String {
    dir.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(dir)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub(crate) fn single_char(s: &str) -> Option<char> {
    let mut it = s.chars();
    match (it.next(), it.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Image files directly inside `dir`, sorted by file name.
///
/// `skip_names` are exact file names left out, e.g. the atlas a previous build
/// wrote into the same directory.
pub fn list_images(dir: &Path, cfg: &SourceConfig, skip_names: &[String]) -> Result<Vec<PathBuf>> {
    ensure_dir(dir)?;
    let ext = cfg.image_extension.trim_start_matches('.');
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches_ext = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case(ext));
        if matches_ext && !skip_names.contains(&file_name_of(&path)) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Drops `<prefix><name>` files whose `<name>` is also listed. Those are copies
/// made by load recovery, not glyphs of their own.
pub(crate) fn without_recovery_copies(files: Vec<PathBuf>, prefix: &str) -> Vec<PathBuf> {
    if prefix.is_empty() {
        return files;
    }
    let names: Vec<String> = files.iter().map(|p| file_name_of(p)).collect();
    let present: HashSet<&str> = names.iter().map(String::as_str).collect();
    files
        .into_iter()
        .zip(&names)
        .filter(|(_, name)| !name.strip_prefix(prefix).is_some_and(|orig| present.contains(orig)))
        .map(|(p, _)| p)
        .collect()
}

pub(crate) fn file_name_of(p: &Path) -> String {
    p.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Loads `path`, falling back to a prefixed copy when the store cannot resolve the original name.
fn load_with_recovery(path: &Path, store: &dyn ImageStore, prefix: &str) -> Option<SourceImage> {
    if let Some(img) = store.load_image(path) {
        return Some(img);
    }
    warn!("failed to load {}; the file name may not be loadable", path.display());
    if prefix.is_empty() {
        return None;
    }
    let copy = path.with_file_name(format!("{prefix}{}", file_name_of(path)));
    warn!("copying {} -> {}", path.display(), copy.display());
    if copy.exists() {
        warn!("{} already exists, replacing it", copy.display());
        if let Err(e) = fs::remove_file(&copy) {
            warn!("could not remove {}: {e}", copy.display());
            return None;
        }
    }
    if let Err(e) = fs::copy(path, &copy) {
        warn!("could not copy {}: {e}", path.display());
        return None;
    }
    let loaded = store.load_image(&copy);
    if loaded.is_none() {
        warn!("{} still fails to load after copying, skipping", path.display());
    }
    loaded
}

/// Filename strategy: each image's stem must be exactly one character.
pub fn filename_sources(dir: &Path, store: &dyn ImageStore, cfg: &SourceConfig, skip_names: &[String]) -> Result<Vec<GlyphSource>> {
    let mut out = Vec::new();
    let files = without_recovery_copies(list_images(dir, cfg, skip_names)?, &cfg.recovery_prefix);
    for path in files {
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let Some(character) = single_char(&stem) else {
            warn!("skipping {}: file name is not a single character", path.display());
            continue;
        };
        let Some(image) = load_with_recovery(&path, store, &cfg.recovery_prefix) else {
            continue;
        };
        out.push(GlyphSource { character, image: Some(image) });
    }
    info!("resolved {} glyphs from file names in {}", out.len(), dir.display());
    Ok(out)
}

/// Reads the manifest characters, ignoring a BOM and trailing line breaks.
pub fn read_manifest(path: &Path) -> Result<Vec<char>> {
    if !path.is_file() {
        bail!(BuildError::ManifestMissing(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).with_context(|| format!("read manifest {}", path.display()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    Ok(text.trim_end_matches(['\r', '\n']).chars().collect())
}

/// Manifest strategy: pairs the n-th image with the n-th manifest character.
///
/// Fails before loading anything if the counts differ. Images that cannot be
/// loaded keep their slot as `None`.
pub fn manifest_sources(dir: &Path, store: &dyn ImageStore, cfg: &SourceConfig, skip_names: &[String]) -> Result<Vec<GlyphSource>> {
    ensure_dir(dir)?;
    let characters = read_manifest(&dir.join(&cfg.manifest_name))?;
    let files = list_images(dir, cfg, skip_names)?;
    if characters.len() != files.len() {
        bail!(BuildError::ManifestCountMismatch { images: files.len(), characters: characters.len() });
    }
    let out: Vec<GlyphSource> = files
        .iter()
        .zip(characters)
        .map(|(path, character)| {
            let image = store.load_image(path);
            if image.is_none() {
                warn!("failed to load {} for {character:?}", path.display());
            }
            GlyphSource { character, image }
        })
        .collect();
    info!("resolved {} glyphs from manifest in {}", out.len(), dir.display());
    Ok(out)
}
