//! Bitmap font CLI
//!
//! Subcommands:
//!   from-filenames  Build from a directory of single-character images (A.png, 7.png, ...)
//!   from-manifest   Build from a directory of images plus chars.txt (one char per image)
//!   assemble        Write an editable request file for a directory
//!   build           Build from a request file
//!   inspect         Summarize an existing .fnt (and optionally check its atlas)
//!
//! Example:
//!   cargo run --bin bitmap_font -- from-filenames assets/fonts/score_digits

use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glam::UVec2;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use bitmap_font_builder::bitmap_font::{
    build_font, resolve_from_filenames, resolve_from_manifest, BuildReport, BuildRequest, FntDocument, FsImageStore,
    GuillotinePacker, RequestFile,
};
use bitmap_font_builder::BuilderConfig;

#[derive(Parser, Debug)]
#[command(author, version, about="Pack glyph images into a bitmap font", long_about=None)]
struct Cli {
    /// Builder configuration (RON). Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Characters come from the image file names
    FromFilenames(DirArgs),
    /// Characters come from the manifest next to the images
    FromManifest(DirArgs),
    /// Write an editable request file for a glyph directory
    Assemble(AssembleArgs),
    /// Build from a request file
    Build(BuildArgs),
    /// Summarize a .fnt file
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct DirArgs {
    /// Glyph image directory
    dir: PathBuf,
    /// Output directory (defaults to the glyph directory)
    #[arg(long)] out_dir: Option<PathBuf>,
    /// Font name (defaults to the glyph directory's name)
    #[arg(long)] font_name: Option<String>,
}

#[derive(Args, Debug)]
struct AssembleArgs {
    dir: PathBuf,
    #[arg(long)] out: PathBuf,
    #[arg(long)] font_name: Option<String>,
}

#[derive(Args, Debug)]
struct BuildArgs {
    request: PathBuf,
}

#[derive(Args, Debug)]
struct InspectArgs {
    fnt: PathBuf,
    #[arg(long)] atlas_png: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

fn load_config(path: Option<&Path>) -> Result<BuilderConfig> {
    let cfg = match path {
        Some(p) => BuilderConfig::load_from_file(p).map_err(|e| anyhow::anyhow!("{}: {e}", p.display()))?,
        None => BuilderConfig::default(),
    };
    for w in cfg.validate() { warn!("config: {w}"); }
    Ok(cfg)
}

fn run_build(request: &BuildRequest, store: &FsImageStore, cfg: &BuilderConfig) -> Result<BuildReport> {
    let packer = GuillotinePacker::from_config(&cfg.packing);
    let report = build_font(request, store, &packer, cfg)?;
    for p in report.paths.all() { println!("{}", p.display()); }
    Ok(report)
}

fn cmd_from_dir(a: DirArgs, manifest: bool, cfg: &BuilderConfig) -> Result<()> {
    let store = FsImageStore::new(cfg.packing.persist_normalized_sources);
    let mut request = if manifest {
        resolve_from_manifest(&a.dir, a.font_name.as_deref(), &store, &cfg.sources)?
    } else {
        resolve_from_filenames(&a.dir, a.font_name.as_deref(), &store, &cfg.sources)?
    };
    if let Some(out) = a.out_dir { request.output_dir = out; }
    run_build(&request, &store, cfg)?;
    Ok(())
}

fn cmd_assemble(a: AssembleArgs, cfg: &BuilderConfig) -> Result<()> {
    let req = RequestFile::assemble(&a.dir, a.font_name.as_deref(), &cfg.sources)?;
    req.save(&a.out)?;
    info!("wrote request {} ({} textures, {} characters)", a.out.display(), req.textures.len(), req.characters.chars().count());
    Ok(())
}

fn cmd_build(a: BuildArgs, cfg: &BuilderConfig) -> Result<()> {
    let store = FsImageStore::new(cfg.packing.persist_normalized_sources);
    let file = RequestFile::load(&a.request)?;
    let base = a.request.parent().map(Path::to_path_buf).unwrap_or_default();
    let request = file.into_request(&base, &store);
    run_build(&request, &store, cfg)?;
    Ok(())
}

fn cmd_inspect(a: InspectArgs) -> Result<()> {
    let text = std::fs::read_to_string(&a.fnt).with_context(|| format!("read {}", a.fnt.display()))?;
    let doc = FntDocument::parse(&text)?;
    let face = doc.info.get("face").map(String::as_str).unwrap_or("?");
    println!("Font: face={face} lineHeight={} pages={} chars={} (declared {})",
        doc.line_height().map_or_else(|| "?".into(), |v| v.to_string()), doc.pages.len(), doc.chars.len(),
        doc.declared_count.map_or_else(|| "?".into(), |v| v.to_string()));
    if doc.declared_count.is_some_and(|n| n != doc.chars.len()) { warn!("chars count does not match char records"); }
    if let Some(png) = a.atlas_png {
        let img = image::open(&png).with_context(|| format!("open {}", png.display()))?;
        let size = UVec2::new(img.width(), img.height());
        println!("Atlas: {}x{}", size.x, size.y);
        for c in doc.chars.iter().filter(|c| !c.fits_in(size)) {
            warn!("char {} lies outside the atlas", c.id);
        }
    }
    for c in &doc.chars {
        let letter = c.character().map(String::from).unwrap_or_default();
        println!("  {:>6} {:<3} x={:<4} y={:<4} {}x{} adv={}", c.id, letter, c.x, c.y, c.width, c.height, c.xadvance);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let cfg = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::FromFilenames(a) => cmd_from_dir(a, false, &cfg),
        Commands::FromManifest(a) => cmd_from_dir(a, true, &cfg),
        Commands::Assemble(a) => cmd_assemble(a, &cfg),
        Commands::Build(a) => cmd_build(a, &cfg),
        Commands::Inspect(a) => cmd_inspect(a),
    }
}
