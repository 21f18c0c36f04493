//! BMFont text format (`.fnt`).
//!
//! Records are written one per line as `kind key=value key=value ...`:
//!   info   face / size / style flags (fixed values from [`FntConfig`])
//!   common lineHeight / base / scale (fixed values from [`FntConfig`])
//!   page   id=0 file="<atlas>.png"
//!   chars  count=N
//!   char   one per glyph; y is measured from the top of the atlas
//!
//! [`FntDocument::parse`] reads the same grammar back.

use anyhow::{anyhow, bail, Context, Result};
use glam::UVec2;
use std::{collections::BTreeMap, fmt::Write as _, str::FromStr};

use super::metrics::paired_len;
use super::pack::GlyphRect;
use crate::config::FntConfig;

fn flag(b: bool) -> u8 {
    u8::from(b)
}

/// Renders the `.fnt` text for the overlapping prefix of `rects` and `characters`.
pub fn write_fnt(rects: &[GlyphRect], characters: &[char], atlas: UVec2, atlas_file: &str, cfg: &FntConfig) -> String {
    let n = paired_len(rects.len(), characters.len());
    let mut s = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(
        s,
        "info face=\"{}\" size={} bold={} italic={} charset=\"{}\" unicode={} stretchH=100 smooth=1 aa=1 padding=0,0,0,0 spacing=1,1 outline=0",
        cfg.face,
        cfg.size,
        flag(cfg.bold),
        flag(cfg.italic),
        cfg.charset,
        flag(cfg.unicode)
    );
    let _ = writeln!(
        s,
        "common lineHeight={} base={} scaleW={} scaleH={} pages=1 packed=0 alphaChnl=1 redChnl=0 greenChnl=0 blueChnl=0",
        cfg.size, cfg.base, cfg.scale_w, cfg.scale_h
    );
    let _ = writeln!(s, "page id=0 file=\"{atlas_file}\"");
    let _ = writeln!(s, "chars count={n}");
    for (r, &c) in rects[..n].iter().zip(&characters[..n]) {
        // rects are bottom-left based, BMFont counts rows from the top
        let y = atlas.y.saturating_sub(r.y + r.height);
        let _ = writeln!(
            s,
            "char id={} x={} y={} width={} height={} xoffset=0 yoffset=0 xadvance={} page=0 chnl=0 letter=\"{}\"",
            u32::from(c),
            r.x,
            y,
            r.width,
            r.height,
            r.width,
            c
        );
    }
    s
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FntChar {
    pub id: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub xoffset: i32,
    pub yoffset: i32,
    pub xadvance: i32,
    pub page: u32,
    pub chnl: u32,
    pub letter: Option<String>,
}

impl FntChar {
    pub fn character(&self) -> Option<char> {
        char::from_u32(self.id)
    }

    /// Whether the glyph rectangle lies inside an atlas of `size` pixels.
    pub fn fits_in(&self, size: UVec2) -> bool {
        self.x.saturating_add(self.width) <= size.x && self.y.saturating_add(self.height) <= size.y
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FntDocument {
    pub info: BTreeMap<String, String>,
    pub common: BTreeMap<String, String>,
    /// `(id, file)` pairs in file order.
    pub pages: Vec<(u32, String)>,
    pub declared_count: Option<usize>,
    pub chars: Vec<FntChar>,
}

type Fields = BTreeMap<String, String>;

fn field<T: FromStr>(f: &Fields, key: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw = f.get(key).ok_or_else(|| anyhow!("missing {key}"))?;
    raw.parse().map_err(|e| anyhow!("{key}={raw}: {e}"))
}

fn field_or<T: FromStr>(f: &Fields, key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    if f.contains_key(key) { field(f, key) } else { Ok(default) }
}

fn parse_fields(mut s: &str) -> Result<Fields> {
    let mut out = Fields::new();
    loop {
        s = s.trim_start();
        if s.is_empty() {
            return Ok(out);
        }
        let eq = s.find('=').ok_or_else(|| anyhow!("field without '=' near {s:?}"))?;
        let key = &s[..eq];
        if key.is_empty() || key.contains(char::is_whitespace) {
            bail!("malformed key near {s:?}");
        }
        let rest = &s[eq + 1..];
        let (value, next) = if let Some(q) = rest.strip_prefix('"') {
            // a value may itself be a quote, so the closing quote is the one before whitespace
            let end = q
                .char_indices()
                .find(|&(i, c)| c == '"' && q[i + 1..].chars().next().map_or(true, char::is_whitespace))
                .map(|(i, _)| i)
                .ok_or_else(|| anyhow!("unterminated quote for {key}"))?;
            (&q[..end], &q[end + 1..])
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            (&rest[..end], &rest[end..])
        };
        out.insert(key.to_string(), value.to_string());
        s = next;
    }
}

impl FntDocument {
    pub fn parse(text: &str) -> Result<Self> {
        let mut doc = FntDocument::default();
        for (no, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            let (kind, rest) = line.split_once(' ').unwrap_or((line, ""));
            let parsed = || parse_fields(rest).with_context(|| format!("line {}", no + 1));
            match kind {
                "info" => doc.info = parsed()?,
                "common" => doc.common = parsed()?,
                "page" => {
                    let f = parsed()?;
                    let id = field(&f, "id").with_context(|| format!("line {}", no + 1))?;
                    doc.pages.push((id, f.get("file").cloned().unwrap_or_default()));
                }
                "chars" => doc.declared_count = Some(field(&parsed()?, "count").with_context(|| format!("line {}", no + 1))?),
                "char" => {
                    let f = parsed()?;
                    let ch = (|| -> Result<FntChar> {
                        Ok(FntChar {
                            id: field(&f, "id")?,
                            x: field(&f, "x")?,
                            y: field(&f, "y")?,
                            width: field(&f, "width")?,
                            height: field(&f, "height")?,
                            xoffset: field_or(&f, "xoffset", 0)?,
                            yoffset: field_or(&f, "yoffset", 0)?,
                            xadvance: field_or(&f, "xadvance", 0)?,
                            page: field_or(&f, "page", 0)?,
                            chnl: field_or(&f, "chnl", 0)?,
                            letter: f.get("letter").cloned(),
                        })
                    })()
                    .with_context(|| format!("line {}", no + 1))?;
                    doc.chars.push(ch);
                }
                // kerning and unknown records carry nothing we use
                _ => {}
            }
        }
        Ok(doc)
    }

    pub fn line_height(&self) -> Option<u32> {
        self.common.get("lineHeight")?.parse().ok()
    }
}
