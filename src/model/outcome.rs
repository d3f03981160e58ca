//! Parse results: questions, category, diagnostics and statistics.

use super::{DetectedCategory, Question};
use serde::{Deserialize, Serialize};

/// Everything a parse call returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOutcome {
    /// Extracted questions in document order
    pub questions: Vec<Question>,

    /// Subject detected by the classifier
    pub category: DetectedCategory,

    /// Items that need a human look
    pub diagnostics: Vec<Diagnostic>,

    /// Name of the parser variant that ran
    pub parser: String,

    /// Extraction statistics
    pub stats: ParseStats,
}

impl ParseOutcome {
    /// Number of distinct questions flagged by diagnostics.
    pub fn review_count(&self) -> usize {
        let mut indices: Vec<usize> = self.diagnostics.iter().map(|d| d.index).collect();
        indices.sort_unstable();
        indices.dedup();
        indices.len()
    }

    /// Share of questions that need no review, in percent.
    pub fn accuracy(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        let ok = self.questions.len() - self.review_count();
        ok as f64 * 100.0 / self.questions.len() as f64
    }

    /// "N of M questions need review".
    pub fn review_summary(&self) -> String {
        format!(
            "{} of {} questions need review",
            self.review_count(),
            self.questions.len()
        )
    }
}

/// A problem found in one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Index of the question in the output list
    pub index: usize,

    /// Number printed in the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_number: Option<u32>,

    /// Beginning of the question text
    pub preview: String,

    /// Variants found
    pub variant_count: usize,

    /// What is wrong
    pub kind: DiagnosticKind,
}

/// Kind of question-level problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No variant layout matched
    NoVariants,
    /// Fewer variants than a complete item has
    IncompleteVariants,
    /// No emphasized variant; the first one was assumed correct
    UnmarkedAnswer,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::NoVariants => write!(f, "no variants found"),
            DiagnosticKind::IncompleteVariants => write!(f, "incomplete variants"),
            DiagnosticKind::UnmarkedAnswer => write!(f, "correct answer not marked"),
        }
    }
}

/// Statistics collected during a parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStats {
    /// Question-marker candidates found in the stream
    pub marker_candidates: u32,

    /// Candidates rejected by the sequential filter
    pub discarded_markers: u32,

    /// Questions emitted
    pub question_count: u32,

    /// Variants emitted
    pub variant_count: u32,

    /// Math expressions protected
    pub math_count: u32,

    /// Images persisted to the media store
    pub image_count: u32,

    /// Tables extracted
    pub table_count: u32,

    /// Media items skipped (collaborator failure, filters, scans)
    pub skipped_media: u32,
}
