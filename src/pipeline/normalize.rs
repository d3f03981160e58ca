//! Structural normalizer: rich-text tree to one linear text stream.
//!
//! Paragraphs become lines. Bold and highlighted runs are wrapped in `**`,
//! math becomes `\(..\)`, images become ` IMAGE_<seq> ` and data tables
//! become ` TABLE_<n> `. Tables whose cells hold question or variant markers
//! are layout tables and are inlined as text instead.

use crate::model::{Block, Document, InlineContent, Paragraph, Script, Table};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Display dimensions of images, keyed by media sequence number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionTable {
    entries: HashMap<u32, (u32, u32)>,
}

impl DimensionTable {
    /// Record dimensions for `seq` unless an earlier reference already did.
    pub fn record(&mut self, seq: u32, width: u32, height: u32) {
        self.entries.entry(seq).or_insert((width, height));
    }

    /// Look up `(width, height)` for a sequence number.
    pub fn get(&self, seq: u32) -> Option<(u32, u32)> {
        self.entries.get(&seq).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The single text stream produced from a document.
#[derive(Debug, Clone, Default)]
pub struct NormalizedStream {
    /// Stream text, one line per paragraph
    pub text: String,
    /// Image display dimensions
    pub dimensions: DimensionTable,
    /// Data tables; `TABLE_<n>` refers to `tables[n - 1]`
    pub tables: Vec<Table>,
}

impl NormalizedStream {
    /// Wrap already-normalized text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Sequence numbers of every `IMAGE_<n>` token, in stream order.
    pub fn image_tokens(&self) -> Vec<u32> {
        IMAGE_TOKEN
            .captures_iter(&self.text)
            .filter_map(|c| c[1].parse().ok())
            .collect()
    }

    /// Number of `\(..\)` math spans.
    pub fn math_count(&self) -> usize {
        self.text.matches("\\(").count()
    }
}

static IMAGE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"IMAGE_(\d+)").unwrap());

static LAYOUT_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\*\*)?(?:\d{1,3}|[A-F])(?:\*\*)?[.)]").unwrap());

static BOLD_WRAPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(?:mathbf|boldsymbol|bf)\s*\{").unwrap());

/// Normalize a structured document.
///
/// `equations` maps image sequence numbers to math sources for images that
/// are renderings of formulas; those are emitted as math instead of tokens.
pub fn normalize(doc: &Document, equations: &HashMap<u32, String>) -> NormalizedStream {
    let mut writer = StreamWriter {
        equations,
        out: NormalizedStream::default(),
    };
    for block in doc.blocks() {
        match block {
            Block::Paragraph(p) => writer.paragraph(p),
            Block::Table(t) if is_layout_table(t) => {
                for p in t.paragraphs() {
                    writer.paragraph(p);
                }
            }
            Block::Table(t) => writer.table(t),
        }
    }
    writer.out
}

/// A table misused for layout carries question or variant markers in its cells.
pub fn is_layout_table(table: &Table) -> bool {
    table
        .rows
        .iter()
        .flat_map(|r| &r.cells)
        .any(|c| LAYOUT_CELL.is_match(c.plain_text().trim_start()))
}

/// Remove bold-only wrapper commands, keeping their argument.
pub fn strip_bold_wrappers(source: &str) -> String {
    let mut result = source.to_string();
    while let Some(m) = BOLD_WRAPPER.find(&result) {
        let open = m.end() - 1;
        let Some(close) = matching_brace(&result, open) else {
            break;
        };
        let inner = result[open + 1..close].to_string();
        result.replace_range(m.start()..=close, &inner);
    }
    result
}

fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn script_text(text: &str, script: Script) -> String {
    let mark = match script {
        Script::Baseline => return text.to_string(),
        Script::Superscript => '^',
        Script::Subscript => '_',
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return text.to_string();
    }
    if trimmed.chars().count() == 1 {
        format!("{}{}", mark, trimmed)
    } else {
        format!("{}{{{}}}", mark, trimmed)
    }
}

struct StreamWriter<'a> {
    equations: &'a HashMap<u32, String>,
    out: NormalizedStream,
}

impl StreamWriter<'_> {
    fn paragraph(&mut self, paragraph: &Paragraph) {
        let mut line = LineBuilder::default();
        for inline in &paragraph.content {
            match inline {
                InlineContent::Text(run) => {
                    line.push(&script_text(&run.text, run.style.script), run.style.is_emphasized())
                }
                InlineContent::LineBreak => line.newline(),
                InlineContent::Math(math) => {
                    let source = strip_bold_wrappers(&math.source);
                    if !source.trim().is_empty() {
                        line.push(&format!("\\({}\\)", source.trim()), math.bold);
                    }
                }
                InlineContent::Image(img) => match self.equations.get(&img.seq) {
                    Some(source) => line.push(&format!("\\({}\\)", strip_bold_wrappers(source)), false),
                    None => {
                        if let (Some(w), Some(h)) = (img.width, img.height) {
                            self.out.dimensions.record(img.seq, w, h);
                        }
                        line.push(&format!(" IMAGE_{} ", img.seq), false);
                    }
                },
            }
        }
        let text = line.finish();
        if !text.trim().is_empty() {
            self.out.text.push_str(&text);
            self.out.text.push('\n');
        }
    }

    fn table(&mut self, table: &Table) {
        if table.is_empty() {
            return;
        }
        self.out.tables.push(table.clone());
        self.out
            .text
            .push_str(&format!(" TABLE_{} \n", self.out.tables.len()));
    }
}

/// Builds one line, coalescing adjacent emphasized runs into one `**` span.
#[derive(Default)]
struct LineBuilder {
    text: String,
    open: bool,
}

impl LineBuilder {
    fn push(&mut self, text: &str, emphasized: bool) {
        // whitespace never toggles emphasis
        if text.trim().is_empty() {
            self.text.push_str(text);
            return;
        }
        if emphasized && !self.open {
            self.text.push_str("**");
            self.open = true;
        } else if !emphasized && self.open {
            self.close();
        }
        self.text.push_str(text);
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        let trimmed = self.text.trim_end().len();
        let tail = self.text.split_off(trimmed);
        self.text.push_str("**");
        self.text.push_str(&tail);
        self.open = false;
    }

    fn newline(&mut self) {
        self.close();
        self.text.push('\n');
    }

    fn finish(mut self) -> String {
        self.close();
        self.text
    }
}
