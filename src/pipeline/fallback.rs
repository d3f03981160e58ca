//! Plain-text fallback normalizer.
//!
//! Used when no structured tree is available: text or markdown exports and
//! text salvaged from a malformed document part. Converts the markdown-like
//! conventions into the same stream shape the structural normalizer emits.

use super::normalize::{strip_bold_wrappers, NormalizedStream};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

/// Options for the fallback cleanup.
#[derive(Debug, Clone)]
pub struct FallbackOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Remove grid-table borders (`+---+`, `|`)
    pub strip_grid_tables: bool,

    /// Remove heading markers (`#`)
    pub strip_headings: bool,
}

impl Default for FallbackOptions {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            strip_grid_tables: true,
            strip_headings: true,
        }
    }
}

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+").unwrap());
static GRID_BORDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[+|][-=+:]+[+|][ \t]*$").unwrap());
static GRID_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\|[ \t]*(.*?)[ \t]*\|[ \t]*$").unwrap());
static GRID_CELL_SEP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+\|[ \t]+").unwrap());
static IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[[^\]]*\]\([^)]*?image(\d+)\.[A-Za-z0-9]+\)(\{[^}]*\})?").unwrap()
});
static IMAGE_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(width|height)="?([0-9.]+)(in|px|pt|cm)?"?"#).unwrap());
static SUBSCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z0-9()])~([^~\s]+)~").unwrap());
static SUPERSCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z0-9)])\^([^\^\s]+)\^").unwrap());
static DISPLAY_DOLLARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\$\$(.+?)\$\$").unwrap());
static INLINE_DOLLARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([^$\n]+?)\$").unwrap());
/// Stands in for an escaped `\$` while dollar math is converted.
const ESCAPED_DOLLAR: &str = "\u{E000}";

static MATH_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\\\((.*?)\\\)").unwrap());
static UNDERSCORE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"__([^_\n]+?)__").unwrap());
static BOLD_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(?:mathbf|boldsymbol|bf)\{([^{}]*)\}").unwrap());

/// Clean markdown-like text into a normalized stream.
pub fn normalize_text(text: &str, options: &FallbackOptions) -> NormalizedStream {
    let mut stream = NormalizedStream::default();

    let mut cleaned = if options.normalize_unicode {
        text.nfc().collect::<String>()
    } else {
        text.to_string()
    };
    cleaned = cleaned.replace("\r\n", "\n");

    cleaned = cleaned
        .replace("\\`", "`")
        .replace('`', "'")
        .replace("\\'", "'")
        .replace("\\\"", "\"");
    if options.strip_headings {
        cleaned = HEADING.replace_all(&cleaned, "").into_owned();
    }
    if options.strip_grid_tables {
        cleaned = GRID_BORDER.replace_all(&cleaned, "").into_owned();
        cleaned = GRID_ROW.replace_all(&cleaned, "$1").into_owned();
        cleaned = GRID_CELL_SEP.replace_all(&cleaned, " ").into_owned();
    }

    cleaned = IMAGE
        .replace_all(&cleaned, |caps: &Captures| {
            let seq: u32 = caps[1].parse().unwrap_or(0);
            if let Some((w, h)) = caps.get(2).and_then(|a| image_size(a.as_str())) {
                stream.dimensions.record(seq, w, h);
            }
            format!(" IMAGE_{} ", seq)
        })
        .into_owned();

    cleaned = SUBSCRIPT.replace_all(&cleaned, "${1}_$2").into_owned();
    cleaned = SUPERSCRIPT.replace_all(&cleaned, "$1^$2").into_owned();

    cleaned = cleaned.replace("\\$", ESCAPED_DOLLAR);
    cleaned = DISPLAY_DOLLARS.replace_all(&cleaned, "\\($1\\)").into_owned();
    cleaned = INLINE_DOLLARS.replace_all(&cleaned, "\\($1\\)").into_owned();
    cleaned = cleaned.replace(ESCAPED_DOLLAR, "\\$");

    // bold inside math is dropped, bold text becomes emphasis
    cleaned = MATH_SPAN
        .replace_all(&cleaned, |caps: &Captures| {
            format!("\\({}\\)", strip_bold_wrappers(caps[1].trim()))
        })
        .into_owned();
    for _ in 0..3 {
        cleaned = BOLD_COMMAND.replace_all(&cleaned, "**$1**").into_owned();
    }
    cleaned = UNDERSCORE_BOLD.replace_all(&cleaned, "**$1**").into_owned();

    stream.text = cleaned
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    stream.text.push('\n');
    stream
}

fn image_size(attrs: &str) -> Option<(u32, u32)> {
    let mut width = None;
    let mut height = None;
    for caps in IMAGE_ATTR.captures_iter(attrs) {
        let value: f64 = caps[2].parse().ok()?;
        let px = match caps.get(3).map(|u| u.as_str()) {
            Some("in") => value * 96.0,
            Some("pt") => value * 96.0 / 72.0,
            Some("cm") => value * 96.0 / 2.54,
            _ => value,
        };
        let px = px.round() as u32;
        match &caps[1] {
            "width" => width = Some(px),
            _ => height = Some(px),
        }
    }
    Some((width?, height?))
}
