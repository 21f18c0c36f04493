use std::path::PathBuf;
use thiserror::Error;

/// Conditions that abort a build before any output file is touched.
///
/// Per-glyph problems (unreadable images, bad filenames) are never reported
/// through this type; they are logged and the glyph is skipped.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("{0} is not a directory; select exactly one glyph directory")]
    NotADirectory(PathBuf),
    #[error("manifest {0} does not exist")]
    ManifestMissing(PathBuf),
    #[error("image count ({images}) and manifest character count ({characters}) differ; make them match")]
    ManifestCountMismatch { images: usize, characters: usize },
    #[error("character {0:?} is assigned to more than one glyph")]
    DuplicateCharacter(char),
    #[error("font name is empty")]
    EmptyFontName,
    #[error("glyphs do not fit in a {max}x{max} atlas")]
    AtlasTooLarge { max: u32 },
}
