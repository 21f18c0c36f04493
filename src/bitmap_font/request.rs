//! Editable build requests.
//!
//! `assemble` collects everything in a glyph directory into a RON file the
//! user can reorder or trim by hand before running the build from it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use super::build::{atlas_file_name, BuildRequest};
use super::source::{default_font_name, ensure_dir, list_images, read_manifest, single_char, without_recovery_copies};
use super::store::ImageStore;
use crate::config::SourceConfig;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestFile {
    /// Relative paths are resolved against the request file's directory.
    pub textures: Vec<PathBuf>,
    /// One character per texture, in the same order.
    pub characters: String,
    pub output_dir: PathBuf,
    pub font_name: String,
}

impl RequestFile {
    /// Lists every image in `dir`. Characters come from the manifest when one
    /// exists, otherwise from the images whose name is a single character.
    pub fn assemble(dir: &Path, font_name: Option<&str>, cfg: &SourceConfig) -> Result<Self> {
        ensure_dir(dir)?;
        let dir = dir.canonicalize().with_context(|| format!("resolve {}", dir.display()))?;
        let font_name = font_name.map_or_else(|| default_font_name(&dir), str::to_owned);
        let listed = list_images(&dir, cfg, &[atlas_file_name(&font_name)])?;
        let manifest = dir.join(&cfg.manifest_name);
        let (textures, characters): (Vec<PathBuf>, String) = if manifest.is_file() {
            (listed, read_manifest(&manifest)?.into_iter().collect())
        } else {
            let textures = without_recovery_copies(listed, &cfg.recovery_prefix);
            let characters = textures
                .iter()
                .filter_map(|p| single_char(p.file_stem()?.to_str()?))
                .collect();
            (textures, characters)
        };
        let n_chars = characters.chars().count();
        if n_chars != textures.len() {
            warn!("{} textures but {} characters; edit the request before building", textures.len(), n_chars);
        }
        Ok(Self { textures, characters, output_dir: dir, font_name })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("read request {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("parse request {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text).with_context(|| format!("write request {}", path.display()))
    }

    /// Loads every listed texture; unreadable ones stay in their slot as `None`.
    pub fn into_request(self, base: &Path, store: &dyn ImageStore) -> BuildRequest {
        let resolve = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        let output_dir = resolve(self.output_dir);
        let mut req = BuildRequest::new(output_dir, self.font_name);
        req.characters = self.characters.chars().collect();
        req.textures = self
            .textures
            .into_iter()
            .map(|p| {
                let p = resolve(p);
                let img = store.load_image(&p);
                if img.is_none() {
                    warn!("cannot load {}", p.display());
                }
                img
            })
            .collect();
        info!("request {} with {} textures", req.font_name, req.textures.len());
        req
    }
}
