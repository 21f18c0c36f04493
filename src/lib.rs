pub mod bitmap_font;
pub mod config;

// Curated re-exports
pub use bitmap_font::{
    build_font, resolve_from_filenames, resolve_from_manifest, BuildError, BuildReport,
    BuildRequest, FsImageStore, GuillotinePacker, ImageStore, RectPacker, RequestFile,
};
pub use config::BuilderConfig;
