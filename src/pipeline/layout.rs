//! Variant layout grammars.
//!
//! Each layout is an independent matcher tried in a fixed order by the
//! segmenter. The first one yielding a well-formed variant list (at least
//! two variants, starting at `A`) wins.

use once_cell::sync::Lazy;
use regex::Regex;

/// A variant as found in the protected stream, before restoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVariant {
    /// Variant letter
    pub letter: char,
    /// Text after the marker, placeholders and emphasis intact
    pub text: String,
    /// The letter or some of the text was inside an emphasis span
    pub emphasized: bool,
}

impl RawVariant {
    pub fn new(letter: char, text: impl Into<String>, emphasized: bool) -> Self {
        Self {
            letter,
            text: text.into(),
            emphasized,
        }
    }
}

/// Result of a successful layout match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutMatch {
    /// Question text preceding the variants
    pub question: String,
    /// Variants in letter order
    pub variants: Vec<RawVariant>,
}

/// Limits shared by every layout.
#[derive(Debug, Clone, Copy)]
pub struct LayoutConfig {
    /// Last letter accepted by the punctuated layouts
    pub last_letter: char,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { last_letter: 'F' }
    }
}

/// A variant layout grammar.
pub trait VariantLayout: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Try to split a question block into question text and variants.
    fn split(&self, block: &str, config: &LayoutConfig) -> Option<LayoutMatch>;
}

/// Layouts in priority order.
pub fn default_layouts(allow_spaced: bool) -> Vec<Box<dyn VariantLayout>> {
    let mut layouts: Vec<Box<dyn VariantLayout>> = vec![Box::new(InlineLayout), Box::new(DottedLayout)];
    if allow_spaced {
        layouts.push(Box::new(SpacedLayout));
    }
    layouts.push(Box::new(PerLineLayout));
    layouts
}

static PAREN_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\*\*)?([A-Z])(\*\*)?\)(\*\*)?").unwrap());
static DOT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\*\*)?([A-Z])(\*\*)?\.(\*\*)?").unwrap());
static BARE_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\*\*)?([A-D])(\*\*)?").unwrap());
static LINE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\*\*)?([A-Z])(\*\*)?[.)](\*\*)?(?:\s|$)").unwrap());

/// A letter marker located in a text.
#[derive(Debug, Clone, Copy)]
struct LetterMarker {
    letter: char,
    start: usize,
    end: usize,
}

fn preceded_by_space(text: &str, at: usize) -> bool {
    text[..at].chars().next_back().map_or(true, char::is_whitespace)
}

fn followed_by_space(text: &str, at: usize) -> bool {
    text[at..].chars().next().map_or(true, char::is_whitespace)
}

fn find_markers(text: &str, re: &Regex, space_after: bool) -> Vec<LetterMarker> {
    re.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let letter = caps.get(2)?.as_str().chars().next()?;
            if !preceded_by_space(text, whole.start()) {
                return None;
            }
            if space_after && !followed_by_space(text, whole.end()) {
                return None;
            }
            Some(LetterMarker {
                letter,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Keep markers forming a strictly increasing run that starts at `A`.
fn accept_sequence(markers: Vec<LetterMarker>, last: char) -> Vec<LetterMarker> {
    let mut accepted: Vec<LetterMarker> = Vec::new();
    for marker in markers {
        if marker.letter > last {
            continue;
        }
        match accepted.last() {
            None if marker.letter == 'A' => accepted.push(marker),
            Some(prev) if marker.letter > prev.letter => accepted.push(marker),
            _ => {}
        }
    }
    accepted
}

/// Byte ranges of `text` inside `**` spans. An unclosed span runs to the end.
fn emphasis_ranges(text: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut open: Option<usize> = None;
    for (i, _) in text.match_indices("**") {
        match open.take() {
            Some(start) => ranges.push((start, i)),
            None => open = Some(i + 2),
        }
    }
    if let Some(start) = open {
        ranges.push((start, text.len()));
    }
    ranges
}

fn span_emphasized(text: &str, ranges: &[(usize, usize)], start: usize, end: usize) -> bool {
    text[start..end].char_indices().any(|(i, c)| {
        let pos = start + i;
        !c.is_whitespace() && c != '*' && ranges.iter().any(|&(s, e)| pos >= s && pos < e)
    })
}

fn joined_lines(block: &str) -> String {
    block
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut `text` at accepted markers.
fn build_match(text: &str, markers: &[LetterMarker]) -> Option<LayoutMatch> {
    if markers.len() < 2 || markers[0].letter != 'A' {
        return None;
    }
    let region_start = markers[0].start;
    let region = &text[region_start..];
    let ranges = emphasis_ranges(region);

    let variants = markers
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let next = markers.get(i + 1).map_or(text.len(), |n| n.start);
            let emphasized = span_emphasized(region, &ranges, m.start - region_start, next - region_start);
            RawVariant::new(m.letter, text[m.end..next].trim(), emphasized)
        })
        .collect();

    Some(LayoutMatch {
        question: text[..region_start].trim().to_string(),
        variants,
    })
}

/// (i) Parenthesized variants sharing a line: `A) 1 B) 2 C) 3 D) 4`.
///
/// Applies when some line of the block carries at least two markers; all
/// lines are joined first so variants wrapped onto a second line still match.
pub struct InlineLayout;

impl VariantLayout for InlineLayout {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn split(&self, block: &str, config: &LayoutConfig) -> Option<LayoutMatch> {
        let has_inline_line = block
            .lines()
            .any(|line| find_markers(line, &PAREN_MARKER, false).len() >= 2);
        if !has_inline_line {
            return None;
        }
        let joined = joined_lines(block);
        let markers = accept_sequence(find_markers(&joined, &PAREN_MARKER, false), config.last_letter);
        build_match(&joined, &markers)
    }
}

/// (ii) Dot-separated run-on: `A. 1 B. 2 C. 3`.
pub struct DottedLayout;

impl VariantLayout for DottedLayout {
    fn name(&self) -> &'static str {
        "dotted"
    }

    fn split(&self, block: &str, config: &LayoutConfig) -> Option<LayoutMatch> {
        let joined = joined_lines(block);
        let markers = accept_sequence(find_markers(&joined, &DOT_MARKER, true), config.last_letter);
        build_match(&joined, &markers)
    }
}

/// (iii) Space-separated letters without punctuation: `? A 1 B 2 C 3 D 4`.
///
/// Only A-D, at least three letters, and the run has to follow the end of
/// a sentence so capital words in the question are not taken for letters.
pub struct SpacedLayout;

impl VariantLayout for SpacedLayout {
    fn name(&self) -> &'static str {
        "spaced"
    }

    fn split(&self, block: &str, _config: &LayoutConfig) -> Option<LayoutMatch> {
        let joined = joined_lines(block);
        let candidates = find_markers(&joined, &BARE_LETTER, true);
        let first = candidates.iter().position(|m| {
            m.letter == 'A'
                && joined[..m.start]
                    .trim_end_matches(|c: char| c.is_whitespace() || c == '*')
                    .ends_with(['?', ':', '.'])
        })?;
        let markers = accept_sequence(candidates[first..].to_vec(), 'D');
        if markers.len() < 3 {
            return None;
        }
        build_match(&joined, &markers)
    }
}

/// (iv) One variant per line; continuation lines extend the current variant.
pub struct PerLineLayout;

impl VariantLayout for PerLineLayout {
    fn name(&self) -> &'static str {
        "per-line"
    }

    fn split(&self, block: &str, config: &LayoutConfig) -> Option<LayoutMatch> {
        let mut question: Vec<&str> = Vec::new();
        let mut variants: Vec<RawVariant> = Vec::new();

        for line in block.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let emphasized = span_emphasized(line, &emphasis_ranges(line), 0, line.len());
            let marker = LINE_MARKER.captures(line).and_then(|caps| {
                let letter = caps.get(2)?.as_str().chars().next()?;
                let accepted = match variants.last() {
                    None => letter == 'A',
                    Some(prev) => letter > prev.letter,
                };
                let end = caps.get(0)?.end();
                (accepted && letter <= config.last_letter).then_some((letter, end))
            });

            if let Some((letter, end)) = marker {
                variants.push(RawVariant::new(letter, line[end..].trim(), emphasized));
            } else if let Some(current) = variants.last_mut() {
                current.text.push(' ');
                current.text.push_str(line);
                current.emphasized |= emphasized;
            } else {
                question.push(line);
            }
        }

        if variants.len() < 2 {
            return None;
        }
        Some(LayoutMatch {
            question: question.join(" "),
            variants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(m: &LayoutMatch) -> String {
        m.variants.iter().map(|v| v.letter).collect()
    }

    fn texts(m: &LayoutMatch) -> Vec<&str> {
        m.variants.iter().map(|v| v.text.as_str()).collect()
    }

    fn marked(m: &LayoutMatch) -> Vec<char> {
        m.variants.iter().filter(|v| v.emphasized).map(|v| v.letter).collect()
    }

    #[test]
    fn test_inline_layout() {
        let config = LayoutConfig::default();
        let m = InlineLayout
            .split("2+2=? A) 3 **B) 4** C) 5 D) 6", &config)
            .unwrap();
        assert_eq!(m.question, "2+2=?");
        assert_eq!(letters(&m), "ABCD");
        assert_eq!(texts(&m), vec!["3", "4**", "5", "6"]);
        assert_eq!(marked(&m), vec!['B']);
    }

    #[test]
    fn test_inline_joins_wrapped_lines() {
        let config = LayoutConfig::default();
        let m = InlineLayout
            .split("Savol\nA) 1 B) 2\n**C) 3** D) 4", &config)
            .unwrap();
        assert_eq!(letters(&m), "ABCD");
        assert_eq!(marked(&m), vec!['C']);
    }

    #[test]
    fn test_inline_needs_two_markers_on_a_line() {
        let config = LayoutConfig::default();
        assert!(InlineLayout.split("Savol\nA) 1\nB) 2", &config).is_none());
    }

    #[test]
    fn test_repeated_letter_is_text() {
        let config = LayoutConfig::default();
        let m = InlineLayout
            .split("Savol A) 1 B) 2 B) 3 C) 4", &config)
            .unwrap();
        assert_eq!(letters(&m), "ABC");
        assert_eq!(texts(&m), vec!["1", "2 B) 3", "4"]);
    }

    #[test]
    fn test_letters_beyond_limit_ignored() {
        let config = LayoutConfig { last_letter: 'D' };
        let m = InlineLayout
            .split("Savol A) 1 B) 2 C) 3 D) 4 E) 5", &config)
            .unwrap();
        assert_eq!(letters(&m), "ABCD");
        assert_eq!(texts(&m)[3], "4 E) 5");
    }

    #[test]
    fn test_dotted_layout() {
        let config = LayoutConfig::default();
        let m = DottedLayout
            .split("Poytaxt? A. Toshkent **B. Samarqand** C. Buxoro", &config)
            .unwrap();
        assert_eq!(letters(&m), "ABC");
        assert_eq!(marked(&m), vec!['B']);
    }

    #[test]
    fn test_spaced_layout() {
        let config = LayoutConfig::default();
        let m = SpacedLayout
            .split("Qaysi biri gaz? A kislorod **B azot** C temir D mis", &config)
            .unwrap();
        assert_eq!(m.question, "Qaysi biri gaz?");
        assert_eq!(letters(&m), "ABCD");
        assert_eq!(texts(&m)[0], "kislorod");
        assert_eq!(marked(&m), vec!['B']);
    }

    #[test]
    fn test_spaced_layout_needs_sentence_end() {
        let config = LayoutConfig::default();
        assert!(SpacedLayout.split("A B C D nuqtalar", &config).is_none());
    }

    #[test]
    fn test_per_line_layout() {
        let config = LayoutConfig::default();
        let block = "Savol matni\ndavomi\nA) bir\n**B) ikki**\nC) uch\nqo'shimcha\nD) to'rt";
        let m = PerLineLayout.split(block, &config).unwrap();
        assert_eq!(m.question, "Savol matni davomi");
        assert_eq!(letters(&m), "ABCD");
        assert_eq!(texts(&m)[2], "uch qo'shimcha");
        assert_eq!(marked(&m), vec!['B']);
    }

    #[test]
    fn test_emphasis_ranges_unclosed() {
        let text = "A) 1 **B) 2 C) 3";
        let ranges = emphasis_ranges(text);
        assert_eq!(ranges, vec![(7, text.len())]);
    }

    #[test]
    fn test_default_layout_order() {
        let names: Vec<&str> = default_layouts(true).iter().map(|l| l.name()).collect();
        assert_eq!(names, vec!["inline", "dotted", "spaced", "per-line"]);
        let names: Vec<&str> = default_layouts(false).iter().map(|l| l.name()).collect();
        assert_eq!(names, vec!["inline", "dotted", "per-line"]);
    }
}
