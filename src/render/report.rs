//! Review report: which questions need a human look.

use crate::model::{DiagnosticKind, ParseOutcome};
use serde::Serialize;
use std::fmt::Write;

/// One flagged question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    /// Position in the question list (1-based)
    pub position: usize,
    /// Number printed in the document
    pub original_number: Option<u32>,
    pub preview: String,
    pub variant_count: usize,
    pub problems: Vec<DiagnosticKind>,
}

/// Summary of an outcome's diagnostics, one item per flagged question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReport {
    pub total: usize,
    pub needs_review: usize,
    /// Percent of questions with no diagnostics
    pub accuracy: f64,
    pub items: Vec<ReviewItem>,
}

impl ReviewReport {
    pub fn from_outcome(outcome: &ParseOutcome) -> Self {
        let mut items: Vec<ReviewItem> = Vec::new();
        for diagnostic in &outcome.diagnostics {
            let position = diagnostic.index + 1;
            match items.iter_mut().find(|item| item.position == position) {
                Some(item) => item.problems.push(diagnostic.kind),
                None => items.push(ReviewItem {
                    position,
                    original_number: diagnostic.original_number,
                    preview: diagnostic.preview.clone(),
                    variant_count: diagnostic.variant_count,
                    problems: vec![diagnostic.kind],
                }),
            }
        }
        items.sort_by_key(|item| item.position);

        Self {
            total: outcome.questions.len(),
            needs_review: items.len(),
            accuracy: outcome.accuracy(),
            items,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.items.is_empty()
    }

    /// "N of M questions need review".
    pub fn summary(&self) -> String {
        format!("{} of {} questions need review", self.needs_review, self.total)
    }

    /// Plain-text rendering, one line per flagged question.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} (accuracy {:.1}%)", self.summary(), self.accuracy);
        for item in &self.items {
            let number = item
                .original_number
                .map(|n| format!("#{}", n))
                .unwrap_or_else(|| "#?".to_string());
            let problems: Vec<String> = item.problems.iter().map(|p| p.to_string()).collect();
            let _ = writeln!(
                out,
                "  {:>4}. {} [{} variants] {}: {}",
                item.position,
                number,
                item.variant_count,
                problems.join(", "),
                item.preview
            );
        }
        out
    }
}

impl std::fmt::Display for ReviewReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Render the review report of an outcome as text.
pub fn to_review_text(outcome: &ParseOutcome) -> String {
    ReviewReport::from_outcome(outcome).to_text()
}
