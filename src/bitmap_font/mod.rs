//! Bitmap font building: single-glyph images in, atlas + descriptors out.
//!
//! Pipeline: [`source`] resolves (character, image) pairs, [`pack`] places
//! them in one atlas, [`metrics`] derives layout data, and [`fnt`] / [`native`]
//! write the two descriptor formats. [`build::build_font`] runs all of it.

pub mod build;
pub mod error;
pub mod fnt;
pub mod metrics;
pub mod native;
pub mod pack;
pub mod request;
pub mod source;
pub mod store;

pub use build::{build_font, resolve_from_filenames, resolve_from_manifest, BuildReport, BuildRequest, FontPaths, PackedGlyph};
pub use error::BuildError;
pub use fnt::{write_fnt, FntChar, FntDocument};
pub use metrics::{derive_metrics, GlyphMetrics, LineMetrics, MIN_LINE_SPACE};
pub use native::{FontMaterial, FontSettings};
pub use pack::{pack_atlas, GlyphRect, GuillotinePacker, NormRect, PackLayout, PackedAtlas, PackedRect, RectPacker};
pub use request::RequestFile;
pub use source::GlyphSource;
pub use store::{FsImageStore, ImageStore, SourceImage};
