use std::{fs, path::Path};

use bitmap_font_builder::bitmap_font::{
    build_font, resolve_from_filenames, resolve_from_manifest, BuildError, FntDocument, FontSettings, FsImageStore,
    GuillotinePacker, PackLayout, RectPacker,
};
use bitmap_font_builder::BuilderConfig;
use glam::UVec2;
use image::{GrayImage, Luma, Rgba, RgbaImage};

fn glyph(dir: &Path, name: &str, w: u32, h: u32, shade: u8) {
    RgbaImage::from_pixel(w, h, Rgba([shade, shade, shade, 255])).save(dir.join(name)).unwrap();
}

fn build(dir: &Path, manifest: bool) -> anyhow::Result<bitmap_font_builder::BuildReport> {
    let cfg = BuilderConfig::default();
    let store = FsImageStore::new(cfg.packing.persist_normalized_sources);
    let req = if manifest {
        resolve_from_manifest(dir, Some("font"), &store, &cfg.sources)?
    } else {
        resolve_from_filenames(dir, Some("font"), &store, &cfg.sources)?
    };
    build_font(&req, &store, &GuillotinePacker::from_config(&cfg.packing), &cfg)
}

#[test]
fn filename_strategy_writes_all_artifacts() {
    let tmp = tempfile::tempdir().unwrap();
    let d = tmp.path();
    glyph(d, "A.png", 8, 12, 10);
    glyph(d, "B.png", 6, 10, 20);
    glyph(d, "AB.png", 5, 5, 30);

    let report = build(d, false).unwrap();
    for p in report.paths.all() {
        assert!(p.is_file(), "{} missing", p.display());
    }
    let chars: String = report.glyphs.iter().map(|g| g.character).collect();
    assert_eq!(chars, "AB");

    let doc = FntDocument::parse(&fs::read_to_string(&report.paths.fnt).unwrap()).unwrap();
    assert_eq!(doc.declared_count, Some(2));
    assert_eq!(doc.chars.len(), 2);
    assert_eq!(doc.pages, vec![(0, "font.png".to_string())]);
    assert!(doc.chars.iter().all(|c| c.letter.as_deref() != Some("AB")));

    let atlas = image::open(&report.paths.atlas).unwrap().to_rgba8();
    assert_eq!(UVec2::new(atlas.width(), atlas.height()), report.atlas_size);
    // BMFont rows count from the top: the glyph's first pixel must carry its shade
    let a = doc.chars.iter().find(|c| c.character() == Some('A')).unwrap();
    assert_eq!(atlas.get_pixel(a.x, a.y)[0], 10);
    assert_eq!(atlas.get_pixel(a.x + a.width - 1, a.y + a.height - 1)[0], 10);

    let settings = FontSettings::load(&report.paths.font_settings).unwrap();
    assert_eq!(settings.line_space, 12.0);
    assert_eq!(settings.characters.len(), 2);
    assert_eq!(settings.material, "font.mat");
}

#[test]
fn manifest_pairs_by_position() {
    let tmp = tempfile::tempdir().unwrap();
    let d = tmp.path();
    // heights chosen so the packer places them in a different order than listed
    glyph(d, "1.png", 4, 3, 1);
    glyph(d, "2.png", 5, 9, 2);
    glyph(d, "3.png", 6, 6, 3);
    fs::write(d.join("chars.txt"), "ABC").unwrap();

    let report = build(d, true).unwrap();
    let got: Vec<_> = report.glyphs.iter().map(|g| (g.character, g.rect.width, g.rect.height)).collect();
    assert_eq!(got, vec![('A', 4, 3), ('B', 5, 9), ('C', 6, 6)]);
}

#[test]
fn manifest_count_mismatch_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let d = tmp.path();
    for n in ["1.png", "2.png", "3.png"] {
        glyph(d, n, 4, 4, 9);
    }
    fs::write(d.join("chars.txt"), "AB").unwrap();

    let err = build(d, true).unwrap_err();
    assert_eq!(
        err.downcast_ref::<BuildError>(),
        Some(&BuildError::ManifestCountMismatch { images: 3, characters: 2 })
    );
    for ext in ["png", "fnt", "fontsettings", "mat"] {
        assert!(!d.join(format!("font.{ext}")).exists());
    }
}

#[test]
fn missing_manifest_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    glyph(tmp.path(), "1.png", 4, 4, 9);
    let err = build(tmp.path(), true).unwrap_err();
    assert!(matches!(err.downcast_ref::<BuildError>(), Some(BuildError::ManifestMissing(_))));
}

#[test]
fn rebuild_is_byte_identical_and_ignores_own_atlas() {
    let tmp = tempfile::tempdir().unwrap();
    let d = tmp.path();
    for (i, c) in "0123456789".chars().enumerate() {
        glyph(d, &format!("{c}.png"), 5 + i as u32 % 3, 9 + i as u32 % 4, i as u8);
    }
    fs::write(d.join("chars.txt"), "0123456789").unwrap();

    let first = build(d, true).unwrap();
    let fnt1 = fs::read(&first.paths.fnt).unwrap();
    let png1 = fs::read(&first.paths.atlas).unwrap();
    // font.png now sits among the glyphs; the manifest count must still match
    let second = build(d, true).unwrap();
    assert_eq!(fs::read(&second.paths.fnt).unwrap(), fnt1);
    assert_eq!(fs::read(&second.paths.atlas).unwrap(), png1);
}

#[test]
fn stale_outputs_are_replaced() {
    let tmp = tempfile::tempdir().unwrap();
    let d = tmp.path();
    glyph(d, "x.png", 3, 3, 5);
    fs::write(d.join("font.fnt"), "garbage that is not a font\n".repeat(50)).unwrap();
    fs::write(d.join("font.mat"), "old").unwrap();
    let report = build(d, false).unwrap();
    let text = fs::read_to_string(&report.paths.fnt).unwrap();
    assert!(text.starts_with("info "));
    assert!(!text.contains("garbage"));
    assert_ne!(fs::read_to_string(&report.paths.material).unwrap(), "old");
}

#[test]
fn unloadable_name_is_recovered_through_a_copy() {
    let tmp = tempfile::tempdir().unwrap();
    let d = tmp.path();
    glyph(d, "..png", 4, 6, 77);
    glyph(d, "a.png", 4, 4, 1);

    let report = build(d, false).unwrap();
    let chars: String = report.glyphs.iter().map(|g| g.character).collect();
    assert_eq!(chars, ".a");
    assert!(d.join("_..png").is_file());

    // a second run reuses the directory without treating the copy as a glyph
    let again = build(d, false).unwrap();
    assert_eq!(again.glyphs.len(), 2);
}

#[test]
fn recovery_fails_twice_and_the_glyph_is_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let d = tmp.path();
    fs::write(d.join("x.png"), b"not a png at all").unwrap();
    glyph(d, "y.png", 3, 3, 4);

    let report = build(d, false).unwrap();
    let chars: String = report.glyphs.iter().map(|g| g.character).collect();
    assert_eq!(chars, "y");
    assert_eq!(report.skipped, 0);
    assert!(d.join("_x.png").is_file());
    let doc = FntDocument::parse(&fs::read_to_string(&report.paths.fnt).unwrap()).unwrap();
    assert_eq!(doc.chars.len(), 1);
    assert_eq!(doc.chars[0].character(), Some('y'));
}

#[test]
fn manifest_counts_underscore_images_as_glyphs() {
    let tmp = tempfile::tempdir().unwrap();
    let d = tmp.path();
    glyph(d, "_coin.png", 6, 6, 1);
    glyph(d, "coin.png", 5, 5, 2);
    fs::write(d.join("chars.txt"), "cC").unwrap();

    let report = build(d, true).unwrap();
    let got: Vec<_> = report.glyphs.iter().map(|g| (g.character, g.rect.width)).collect();
    assert_eq!(got, vec![('c', 6), ('C', 5)]);
}

#[test]
fn greyscale_sources_are_normalized_in_place() {
    let tmp = tempfile::tempdir().unwrap();
    let d = tmp.path();
    GrayImage::from_pixel(4, 4, Luma([90])).save(d.join("g.png")).unwrap();
    build(d, false).unwrap();
    let src = image::open(d.join("g.png")).unwrap();
    assert_eq!(src.color(), image::ColorType::Rgba8);
}

#[test]
fn empty_directory_builds_empty_font() {
    let tmp = tempfile::tempdir().unwrap();
    let report = build(tmp.path(), false).unwrap();
    assert!(report.glyphs.is_empty());
    assert_eq!(report.line.line_space, 0.1);
    let doc = FntDocument::parse(&fs::read_to_string(&report.paths.fnt).unwrap()).unwrap();
    assert_eq!(doc.declared_count, Some(0));
    assert!(doc.chars.is_empty());
    assert!(report.paths.atlas.is_file());
}

#[test]
fn file_instead_of_directory_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let f = tmp.path().join("A.png");
    glyph(tmp.path(), "A.png", 2, 2, 0);
    let err = build(&f, false).unwrap_err();
    assert_eq!(err.downcast_ref::<BuildError>(), Some(&BuildError::NotADirectory(f)));
}

/// Places everything in one row, right to left.
struct RightToLeft;
impl RectPacker for RightToLeft {
    fn pack(&self, sizes: &[UVec2]) -> anyhow::Result<PackLayout> {
        let w: u32 = sizes.iter().map(|s| s.x).sum::<u32>().max(1);
        let h = sizes.iter().map(|s| s.y).max().unwrap_or(1);
        let mut x = w;
        let rects = sizes
            .iter()
            .map(|s| {
                x -= s.x;
                bitmap_font_builder::bitmap_font::NormRect {
                    x: x as f32 / w as f32,
                    y: 0.0,
                    width: s.x as f32 / w as f32,
                    height: s.y as f32 / h as f32,
                }
            })
            .collect();
        Ok(PackLayout { atlas_size: UVec2::new(w, h), rects })
    }
}

#[test]
fn custom_packer_keeps_correspondence() {
    let tmp = tempfile::tempdir().unwrap();
    let d = tmp.path();
    glyph(d, "a.png", 2, 4, 1);
    glyph(d, "b.png", 3, 4, 2);
    glyph(d, "c.png", 5, 4, 3);
    let cfg = BuilderConfig::default();
    let store = FsImageStore::default();
    let req = resolve_from_filenames(d, Some("rtl"), &store, &cfg.sources).unwrap();
    let report = build_font(&req, &store, &RightToLeft, &cfg).unwrap();
    let got: Vec<_> = report.glyphs.iter().map(|g| (g.character, g.rect.x, g.rect.width)).collect();
    assert_eq!(got, vec![('a', 8, 2), ('b', 5, 3), ('c', 0, 5)]);
    let atlas = image::open(&report.paths.atlas).unwrap().to_rgba8();
    assert_eq!(atlas.get_pixel(9, 0)[0], 1);
    assert_eq!(atlas.get_pixel(0, 3)[0], 3);
}
