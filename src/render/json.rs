//! JSON rendering for parse outcomes.

use crate::error::{Error, Result};
use crate::model::{ParseOutcome, Question};
use serde::Serialize;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Render a full outcome: questions, category, diagnostics and stats.
pub fn to_json(outcome: &ParseOutcome, format: JsonFormat) -> Result<String> {
    serialize(outcome, format)
}

/// Render only the question list, the artifact downstream systems consume.
pub fn questions_to_json(questions: &[Question], format: JsonFormat) -> Result<String> {
    serialize(questions, format)
}

fn serialize<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DetectedCategory, ParseStats, Variant};

    fn outcome() -> ParseOutcome {
        ParseOutcome {
            questions: vec![Question::new("2+2=?")
                .with_variant(Variant::new('A', "3"))
                .with_variant(Variant::new('B', "4"))
                .with_correct_answer('B')],
            category: DetectedCategory::Math,
            diagnostics: Vec::new(),
            parser: "math".into(),
            stats: ParseStats::default(),
        }
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&outcome(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"category\": \"math\""));
        assert!(json.contains("\"correctAnswer\": \"B\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_questions_compact() {
        let json = questions_to_json(&outcome().questions, JsonFormat::Compact).unwrap();
        assert!(json.starts_with('['));
        assert!(!json.contains('\n'));
        assert!(!json.contains("category"));
    }
}
