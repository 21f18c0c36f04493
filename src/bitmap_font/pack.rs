//! Atlas packing.
//!
//! Placement is delegated to a [`RectPacker`], which reports rectangles in
//! normalized atlas space with a bottom-left origin. [`pack_atlas`] turns those
//! into pixel rectangles and copies every glyph into the atlas image.

use anyhow::{bail, Result};
use glam::UVec2;
use guillotiere::{size2, AtlasAllocator};
use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::BuildError;
use crate::config::PackingConfig;

/// Pixel rectangle inside the atlas, origin at the bottom-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl GlyphRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
    pub fn right(&self) -> u32 {
        self.x + self.width
    }
    pub fn top(&self) -> u32 {
        self.y + self.height
    }
    pub fn overlaps(&self, other: &GlyphRect) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.top() && other.y < self.top()
    }
    pub fn fits_in(&self, atlas: UVec2) -> bool {
        self.right() <= atlas.x && self.top() <= atlas.y
    }
}

/// Rectangle in [0,1] atlas space as reported by a packer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormRect {
    fn to_pixels(self, atlas: UVec2) -> GlyphRect {
        let (w, h) = (atlas.x as f32, atlas.y as f32);
        GlyphRect {
            x: (self.x * w).round() as u32,
            y: (self.y * h).round() as u32,
            width: (self.width * w).round() as u32,
            height: (self.height * h).round() as u32,
        }
    }
}

pub struct PackLayout {
    pub atlas_size: UVec2,
    /// One entry per requested size, in request order.
    pub rects: Vec<NormRect>,
}

pub trait RectPacker {
    fn pack(&self, sizes: &[UVec2]) -> Result<PackLayout>;
}

/// Power-of-two growing packer backed by `guillotiere`.
#[derive(Clone, Debug)]
pub struct GuillotinePacker {
    pub padding: u32,
    pub max_size: u32,
}

impl Default for GuillotinePacker {
    fn default() -> Self {
        Self { padding: 0, max_size: 2048 }
    }
}

impl GuillotinePacker {
    pub fn new(padding: u32, max_size: u32) -> Self {
        Self { padding, max_size }
    }

    pub fn from_config(cfg: &PackingConfig) -> Self {
        Self::new(cfg.padding, cfg.max_atlas_size)
    }

    fn initial_side(&self, sizes: &[UVec2]) -> u32 {
        let pad = self.padding;
        let mut longest = 1u32;
        let mut area = 0u64;
        for s in sizes {
            longest = longest.max(s.x + pad).max(s.y + pad);
            area += u64::from(s.x + pad) * u64::from(s.y + pad);
        }
        let area_side = (area as f64).sqrt().ceil() as u32;
        longest.max(area_side).next_power_of_two()
    }

    /// Top-left origin placements for `order`, or `None` if something did not fit.
    fn try_place(&self, atlas: UVec2, sizes: &[UVec2], order: &[usize]) -> Option<Vec<UVec2>> {
        let mut allocator = AtlasAllocator::new(size2(atlas.x as i32, atlas.y as i32));
        let mut origins = vec![UVec2::ZERO; sizes.len()];
        for &i in order {
            let s = sizes[i];
            if s.x == 0 || s.y == 0 {
                continue;
            }
            let alloc = allocator.allocate(size2((s.x + self.padding) as i32, (s.y + self.padding) as i32))?;
            origins[i] = UVec2::new(alloc.rectangle.min.x as u32, alloc.rectangle.min.y as u32);
        }
        Some(origins)
    }
}

impl RectPacker for GuillotinePacker {
    fn pack(&self, sizes: &[UVec2]) -> Result<PackLayout> {
        if sizes.is_empty() {
            return Ok(PackLayout { atlas_size: UVec2::ONE, rects: Vec::new() });
        }
        // Tall glyphs first; ties keep input order so layouts are stable.
        let mut order: Vec<usize> = (0..sizes.len()).collect();
        order.sort_by(|&a, &b| sizes[b].y.cmp(&sizes[a].y).then(sizes[b].x.cmp(&sizes[a].x)).then(a.cmp(&b)));

        let side = self.initial_side(sizes);
        let mut atlas = UVec2::splat(side);
        loop {
            if atlas.x > self.max_size || atlas.y > self.max_size {
                bail!(BuildError::AtlasTooLarge { max: self.max_size });
            }
            if let Some(origins) = self.try_place(atlas, sizes, &order) {
                debug!("packed {} rects into {}x{}", sizes.len(), atlas.x, atlas.y);
                let (w, h) = (atlas.x as f32, atlas.y as f32);
                let rects = sizes
                    .iter()
                    .zip(&origins)
                    .map(|(s, o)| NormRect {
                        x: o.x as f32 / w,
                        // flip to bottom-left origin
                        y: (atlas.y - o.y - s.y) as f32 / h,
                        width: s.x as f32 / w,
                        height: s.y as f32 / h,
                    })
                    .collect();
                return Ok(PackLayout { atlas_size: atlas, rects });
            }
            if atlas.x <= atlas.y {
                atlas.x *= 2;
            } else {
                atlas.y *= 2;
            }
        }
    }
}

/// Where one surviving input ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedRect {
    /// Index into the texture list passed to [`pack_atlas`].
    pub source_index: usize,
    pub rect: GlyphRect,
}

pub struct PackedAtlas {
    pub image: RgbaImage,
    pub rects: Vec<PackedRect>,
}

impl PackedAtlas {
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.image.width(), self.image.height())
    }
}

/// Packs every present texture into one RGBA atlas.
///
/// Missing entries are skipped; the returned rects keep the order of the
/// remaining inputs.
pub fn pack_atlas(textures: &[Option<RgbaImage>], packer: &dyn RectPacker) -> Result<PackedAtlas> {
    let mut present: Vec<(usize, &RgbaImage)> = Vec::with_capacity(textures.len());
    for (i, t) in textures.iter().enumerate() {
        match t {
            Some(img) => present.push((i, img)),
            None => warn!("texture slot {i} is empty, skipping"),
        }
    }
    if present.is_empty() {
        warn!("no readable glyph images; the atlas will be empty");
    }

    let sizes: Vec<UVec2> = present.iter().map(|(_, img)| UVec2::new(img.width(), img.height())).collect();
    let layout = packer.pack(&sizes)?;
    if layout.rects.len() != sizes.len() {
        bail!("packer returned {} rects for {} images", layout.rects.len(), sizes.len());
    }

    let atlas_size = layout.atlas_size.max(UVec2::ONE);
    let mut image = RgbaImage::new(atlas_size.x, atlas_size.y);
    let mut rects = Vec::with_capacity(present.len());
    for ((source_index, img), norm) in present.into_iter().zip(layout.rects) {
        let rect = norm.to_pixels(atlas_size);
        if !rect.fits_in(atlas_size) {
            bail!("packer placed slot {source_index} outside the {}x{} atlas", atlas_size.x, atlas_size.y);
        }
        let top = atlas_size.y - rect.top();
        imageops::replace(&mut image, img, i64::from(rect.x), i64::from(top));
        rects.push(PackedRect { source_index, rect });
    }
    Ok(PackedAtlas { image, rects })
}
