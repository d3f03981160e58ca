//! Parser variant selection and custom parsers.

use std::sync::Arc;

use unquiz::pipeline::{self, Profile};
use unquiz::{
    parse_text, CancelToken, Document, Error, ParseContext, ParseOptions, ParseOutcome,
    ParserRegistry, QuestionParser,
};

/// Never tries the space-separated layout, whatever the subject.
struct StrictLayoutParser;

impl QuestionParser for StrictLayoutParser {
    fn name(&self) -> &str {
        "strict-layout"
    }

    fn aliases(&self) -> &[&str] {
        &["olimpiada"]
    }

    fn parse(&self, doc: &Document, ctx: &ParseContext) -> unquiz::Result<ParseOutcome> {
        pipeline::run(doc, ctx, self.name(), |_| Profile {
            allow_spaced_layout: false,
            chemistry_repair: false,
        })
    }
}

const SPACED: &str = "1) Yig'indini toping: A 10 B 12 C 14 D 16\n";

#[test]
fn test_hint_selects_parser() {
    let outcome = parse_text(SPACED, ParseOptions::default().with_subject_hint("Matematika")).unwrap();
    assert_eq!(outcome.parser, "math");
    assert_eq!(outcome.questions[0].variants.len(), 4);

    let outcome = parse_text(SPACED, ParseOptions::default()).unwrap();
    assert_eq!(outcome.parser, "unified");
}

#[test]
fn test_custom_parser_registered() {
    let mut registry = ParserRegistry::with_defaults();
    registry.register(Arc::new(StrictLayoutParser));
    assert!(registry.names().contains(&"strict-layout"));

    let ctx = ParseContext::new(ParseOptions::default().with_subject_hint("Olimpiada 2024"));
    let outcome = registry.parse(&Document::from_text(SPACED), &ctx).unwrap();
    assert_eq!(outcome.parser, "strict-layout");
    assert!(outcome.questions[0].variants.is_empty());
    assert!(outcome.questions[0].needs_review);
}

#[test]
fn test_empty_registry_errors() {
    let registry = ParserRegistry::new();
    let result = registry.parse(&Document::from_text(SPACED), &ParseContext::default());
    assert!(matches!(result, Err(Error::Other(_))));
}

#[test]
fn test_cancelled_parse() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let ctx = ParseContext::default().with_cancel_token(cancel);
    let result = unquiz::parse_document(&Document::from_text(SPACED), &ctx);
    assert!(matches!(result, Err(Error::Cancelled)));
}
