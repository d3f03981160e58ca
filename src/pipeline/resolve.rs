//! Correct-answer resolution and text restoration.

use super::protect::ProtectedStream;
use super::segment::RawQuestion;
use crate::model::{Diagnostic, DiagnosticKind, Question, Variant};
use once_cell::sync::Lazy;
use regex::Regex;

static MEDIA_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:IMAGE|TABLE)_\d+").unwrap());

/// Turns raw questions into final records.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    protected: &'a ProtectedStream,
    points: u32,
    expected_variants: usize,
    preview_len: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(protected: &'a ProtectedStream) -> Self {
        Self {
            protected,
            points: 1,
            expected_variants: 4,
            preview_len: 80,
        }
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.points = points;
        self
    }

    pub fn with_expected_variants(mut self, expected: usize) -> Self {
        self.expected_variants = expected;
        self
    }

    pub fn with_preview_len(mut self, len: usize) -> Self {
        self.preview_len = len;
        self
    }

    /// Strip markup, drop media tokens, escape and restore math.
    pub fn restore(&self, raw: &str) -> String {
        let text = raw.replace("**", "");
        let text = MEDIA_TOKEN.replace_all(&text, " ");
        let text = text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
        let text = escape_dollars(&text);
        let text = self.protected.restore(&text);
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Resolve one question. `index` is its position in the output list.
    pub fn resolve(&self, index: usize, raw: &RawQuestion) -> (Question, Vec<Diagnostic>) {
        let mut question = Question::new(self.restore(&raw.text));
        question.points = self.points;
        question.original_number = Some(raw.number);
        question.variants = raw
            .variants
            .iter()
            .map(|v| Variant::new(v.letter, self.restore(&v.text)))
            .collect();

        let mut kinds = Vec::new();
        match raw.variants.iter().find(|v| v.emphasized) {
            Some(marked) => question.correct_answer = marked.letter.to_string(),
            None => {
                if let Some(first) = raw.variants.first() {
                    question.correct_answer = first.letter.to_string();
                    kinds.push(DiagnosticKind::UnmarkedAnswer);
                }
            }
        }

        if raw.variants.is_empty() {
            question.needs_review = true;
            kinds.insert(0, DiagnosticKind::NoVariants);
        } else if raw.variants.len() < self.expected_variants {
            kinds.insert(0, DiagnosticKind::IncompleteVariants);
        }

        let preview: String = question.text.chars().take(self.preview_len).collect();
        let diagnostics = kinds
            .into_iter()
            .map(|kind| Diagnostic {
                index,
                original_number: Some(raw.number),
                preview: preview.clone(),
                variant_count: question.variants.len(),
                kind,
            })
            .collect();
        (question, diagnostics)
    }
}

/// Escape every `$` not already preceded by a backslash.
fn escape_dollars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = None;
    for ch in text.chars() {
        if ch == '$' && prev != Some('\\') {
            out.push('\\');
        }
        out.push(ch);
        prev = Some(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::layout::RawVariant;

    fn raw(text: &str, variants: &[(char, &str, bool)]) -> RawQuestion {
        RawQuestion {
            number: 7,
            text: text.to_string(),
            variants: variants
                .iter()
                .map(|&(l, t, e)| RawVariant::new(l, t, e))
                .collect(),
            layout: Some("inline"),
        }
    }

    #[test]
    fn test_restore_sanitizes_outside_math() {
        let protected = ProtectedStream {
            text: String::new(),
            math: vec!["\\(a<b\\)".to_string()],
        };
        let resolver = Resolver::new(&protected);
        assert_eq!(
            resolver.restore("**x** < 5 &  MATH_0  IMAGE_3 narxi $5"),
            "x &lt; 5 &amp; \\(a<b\\) narxi \\$5"
        );
        assert_eq!(resolver.restore("narx 5$$ va $"), "narx 5\\$\\$ va \\$");
        assert_eq!(resolver.restore("narxi \\$5"), "narxi \\$5");
    }

    #[test]
    fn test_emphasized_variant_is_correct() {
        let protected = ProtectedStream::default();
        let (q, diags) = Resolver::new(&protected).resolve(
            0,
            &raw("2+2=?", &[('A', "3", false), ('B', "4**", true), ('C', "5", false), ('D', "6", false)]),
        );
        assert_eq!(q.text, "2+2=?");
        assert_eq!(q.correct_answer, "B");
        assert_eq!(q.variant('B').unwrap().text, "4");
        assert_eq!(q.original_number, Some(7));
        assert!(diags.is_empty());
        assert!(q.is_consistent());
    }

    #[test]
    fn test_only_first_emphasized_counts() {
        let protected = ProtectedStream::default();
        let (q, _) = Resolver::new(&protected).resolve(
            0,
            &raw("Q", &[('A', "1", false), ('B', "2", true), ('C', "3", true), ('D', "4", false)]),
        );
        assert_eq!(q.correct_answer, "B");
    }

    #[test]
    fn test_unmarked_defaults_to_first() {
        let protected = ProtectedStream::default();
        let (q, diags) = Resolver::new(&protected)
            .with_preview_len(3)
            .resolve(4, &raw("Savol", &[('A', "1", false), ('B', "2", false), ('C', "3", false)]));
        assert_eq!(q.correct_answer, "A");
        let kinds: Vec<_> = diags.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::IncompleteVariants, DiagnosticKind::UnmarkedAnswer]
        );
        assert_eq!(diags[0].index, 4);
        assert_eq!(diags[0].preview, "Sav");
        assert_eq!(diags[0].variant_count, 3);
    }

    #[test]
    fn test_no_variants_needs_review() {
        let protected = ProtectedStream::default();
        let (q, diags) = Resolver::new(&protected)
            .with_points(3)
            .resolve(0, &raw("Insho yozing IMAGE_1", &[]));
        assert_eq!(q.text, "Insho yozing");
        assert!(q.needs_review);
        assert!(q.correct_answer.is_empty());
        assert_eq!(q.points, 3);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::NoVariants);
    }
}
