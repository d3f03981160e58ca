//! Protection substitution: math spans become opaque `MATH_<n>` tokens.
//!
//! Structural parsing only ever sees the protected stream, so parentheses,
//! dots and letters inside formulas cannot be mistaken for question or
//! variant markers. Numbering is normalized here as well so the segmenter
//! deals with one marker shape.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// A stream with every math span replaced by `MATH_<n>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedStream {
    /// Protected text
    pub text: String,
    /// Original math sources (with delimiters), indexed by `n`
    pub math: Vec<String>,
}

impl ProtectedStream {
    /// Replace every `MATH_<n>` token in `text` with its recorded source.
    pub fn restore(&self, text: &str) -> String {
        MATH_TOKEN
            .replace_all(text, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| self.math.get(n))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Number of protected math spans.
    pub fn math_count(&self) -> usize {
        self.math.len()
    }
}

static MATH_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\\\(.*?\\\)").unwrap());
static MATH_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"MATH_(\d+)").unwrap());

/// Answer letter left inside a formula, e.g. `x^2 D)`.
static TRAPPED_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9}\s])(\*\*)?([A-D])(\*\*)?(?:\\?\)|\\?\.)(\*\*)?").unwrap());

static TOKEN_THEN_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"((?:MATH|IMAGE|TABLE)_\d+)([A-Za-z])").unwrap());
static LETTER_THEN_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z])((?:MATH|IMAGE|TABLE)_\d+)").unwrap());
static ESCAPED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\([.()\[\]])").unwrap());

/// `D) text 18. Next question` on one line.
static INLINE_DOT_QUESTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-D]\)[^\n]*?[a-z0-9,;)\]'"*_}])[ \t]+(\d{1,3})\.[ \t]*([A-Z«"'(][^).])"#)
        .unwrap()
});
static INLINE_PAREN_QUESTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(D\)[^\n]*?[a-z0-9,;)\]'"*_}])[ \t]+(\d{1,3})\)[ \t]+"#).unwrap()
});

static LEADING_DOT_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)(\*\*)?(\d{1,3})(\*\*)?\.(?:[ \t]+|([^\d\s])|$)").unwrap()
});
static LEADING_PAREN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*(?:\*\*)?\d{1,3}(?:\*\*)?\))(\S)").unwrap());

static GLUED_VARIANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([0-9.,;:!?\]}'"])(\*\*)?([A-F])(\*\*)?\)"#).unwrap());
static WIDE_VARIANT_GAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\S)[ \t]{2,}((?:\*\*)?[A-F](?:\*\*)?\))").unwrap());
static VARIANT_NO_SPACE_AFTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[\s*])([A-F])(\*\*)?\)(\*\*)?([^\s*])").unwrap());
static VARIANT_WIDE_AFTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[\s*])([A-F])(\*\*)?\)(\*\*)?[ \t]{2,}").unwrap());

/// Protect math and normalize markers.
pub fn protect(stream: &str) -> ProtectedStream {
    let ejected = eject_trapped_letters(stream);

    let mut math = Vec::new();
    let mut text = MATH_SPAN
        .replace_all(&ejected, |caps: &Captures| {
            math.push(caps[0].to_string());
            format!(" MATH_{} ", math.len() - 1)
        })
        .into_owned();

    text = TOKEN_THEN_LETTER.replace_all(&text, "$1 $2").into_owned();
    text = LETTER_THEN_TOKEN.replace_all(&text, "$1 $2").into_owned();
    text = ESCAPED.replace_all(&text, "$1").into_owned();

    text = split_inline_questions(&text);
    text = normalize_numbering(&text);
    text = normalize_variant_spacing(&text);

    ProtectedStream { text, math }
}

/// Split a formula at any answer letter trapped inside it.
fn eject_trapped_letters(stream: &str) -> String {
    MATH_SPAN
        .replace_all(stream, |caps: &Captures| {
            let span = &caps[0];
            let inner = &span[2..span.len() - 2];
            if !TRAPPED_LETTER.is_match(inner) {
                return span.to_string();
            }
            let mut out = String::new();
            let mut last = 0;
            for m in TRAPPED_LETTER.captures_iter(inner) {
                let (Some(whole), Some(lead)) = (m.get(0), m.get(1)) else {
                    continue;
                };
                push_math(&mut out, &inner[last..lead.end()]);
                let emphasized = m.get(2).or(m.get(4)).or(m.get(5)).is_some();
                if emphasized {
                    out.push_str(&format!(" **{})** ", &m[3]));
                } else {
                    out.push_str(&format!(" {}) ", &m[3]));
                }
                last = whole.end();
            }
            push_math(&mut out, &inner[last..]);
            out
        })
        .into_owned()
}

fn push_math(out: &mut String, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push_str(&format!("\\({}\\)", piece));
    }
}

fn split_inline_questions(text: &str) -> String {
    let text = INLINE_DOT_QUESTION.replace_all(text, "$1\n$2. $3");
    INLINE_PAREN_QUESTION
        .replace_all(&text, "$1\n$2) ")
        .into_owned()
}

/// A line-leading `<n>.` becomes `<n>)`; decimals such as `1.5` are left alone.
fn normalize_numbering(text: &str) -> String {
    let text = LEADING_DOT_NUMBER.replace_all(text, "${1}${2}${3}${4}) ${5}");
    LEADING_PAREN_NUMBER.replace_all(&text, "$1 $2").into_owned()
}

fn normalize_variant_spacing(text: &str) -> String {
    let text = GLUED_VARIANT.replace_all(text, "$1 $2$3$4)");
    let text = WIDE_VARIANT_GAP.replace_all(&text, "$1 $2");
    let text = VARIANT_NO_SPACE_AFTER.replace_all(&text, "$1$2$3)$4 $5");
    VARIANT_WIDE_AFTER
        .replace_all(&text, "$1$2$3)$4 ")
        .into_owned()
}
