//! Access to glyph source images.
//!
//! The pipeline only ever reads sources through [`ImageStore`], so a caller
//! embedding the builder in an asset pipeline can substitute its own store.

use anyhow::{Context, Result};
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A decoded glyph image together with the file it came from.
#[derive(Clone, Debug)]
pub struct SourceImage {
    pub path: PathBuf,
    pub image: DynamicImage,
}

impl SourceImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

pub trait ImageStore {
    /// Returns `None` when the path cannot be resolved or decoded.
    fn load_image(&self, path: &Path) -> Option<SourceImage>;

    /// Produces the RGBA8 pixels used for packing. May rewrite the backing
    /// file; calling it again on an already normalized source is a no-op.
    fn normalize_for_packing(&self, source: &SourceImage) -> Result<RgbaImage>;
}

/// Reads and writes glyph images directly on the filesystem.
#[derive(Clone, Debug, Default)]
pub struct FsImageStore {
    pub persist_normalized: bool,
}

impl FsImageStore {
    pub fn new(persist_normalized: bool) -> Self {
        Self { persist_normalized }
    }
}

impl ImageStore for FsImageStore {
    fn load_image(&self, path: &Path) -> Option<SourceImage> {
        // Dot-prefixed names are hidden entries; the store does not resolve them.
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(true, |n| n.starts_with('.'));
        if hidden {
            debug!("refusing to resolve {}", path.display());
            return None;
        }
        match image::open(path) {
            Ok(image) => Some(SourceImage { path: path.to_path_buf(), image }),
            Err(e) => {
                warn!("failed to decode {}: {e}", path.display());
                None
            }
        }
    }

    fn normalize_for_packing(&self, source: &SourceImage) -> Result<RgbaImage> {
        if let DynamicImage::ImageRgba8(rgba) = &source.image {
            return Ok(rgba.clone());
        }
        let rgba = source.image.to_rgba8();
        if self.persist_normalized {
            rgba.save(&source.path)
                .with_context(|| format!("write normalized {}", source.path.display()))?;
            info!(
                "normalized {} from {:?} to RGBA8",
                source.path.display(),
                source.image.color()
            );
        }
        Ok(rgba)
    }
}
