//! Parser variants and the subject-hint registry.
//!
//! A parser variant is the full pipeline with segmenter switches tuned for
//! one subject. The caller's subject hint only selects the variant; text
//! cleanup always follows the category the classifier detects.
//!
//! # Example
//!
//! ```no_run
//! use unquiz::strategy::ParserRegistry;
//! use unquiz::{Document, ParseContext};
//!
//! let registry = ParserRegistry::with_defaults();
//! let parser = registry.select(Some("Kimyo 9-sinf")).unwrap();
//! assert_eq!(parser.name(), "chemistry");
//!
//! let doc = Document::from_text("1) H_2O nima? A) suv B) tuz");
//! let outcome = parser.parse(&doc, &ParseContext::default()).unwrap();
//! println!("{}", outcome.review_summary());
//! ```

mod subject;

pub use subject::{ParserKind, SubjectParser};

use crate::error::{Error, Result};
use crate::model::{Document, ParseOutcome};
use crate::pipeline::ParseContext;
use std::collections::HashMap;
use std::sync::Arc;

/// A parser variant.
pub trait QuestionParser: Send + Sync {
    /// Name of this parser.
    fn name(&self) -> &str;

    /// Lowercase subject-hint fragments that select this parser.
    fn aliases(&self) -> &[&str];

    /// Parse a document into questions.
    fn parse(&self, doc: &Document, ctx: &ParseContext) -> Result<ParseOutcome>;

    /// Check if a subject hint names this parser.
    fn accepts_hint(&self, hint: &str) -> bool {
        let hint = hint.to_lowercase();
        self.aliases().iter().any(|alias| hint.contains(alias))
    }
}

/// Registry of parser variants.
///
/// Hints are matched against aliases in registration order; anything
/// unmatched goes to the `unified` parser.
pub struct ParserRegistry {
    ordered: Vec<Arc<dyn QuestionParser>>,
    by_name: HashMap<String, Arc<dyn QuestionParser>>,
}

impl ParserRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            ordered: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with every built-in parser variant.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in ParserKind::ALL {
            registry.register(Arc::new(SubjectParser::new(kind)));
        }
        registry
    }

    /// Register a parser. A parser with the same name is replaced.
    pub fn register(&mut self, parser: Arc<dyn QuestionParser>) {
        let name = parser.name().to_lowercase();
        self.ordered.retain(|p| p.name().to_lowercase() != name);
        self.ordered.push(parser.clone());
        self.by_name.insert(name, parser);
    }

    /// Get a parser by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn QuestionParser>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Names of registered parsers, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.ordered.iter().map(|p| p.name()).collect()
    }

    /// Pick the parser for a subject hint, falling back to `unified`.
    pub fn select(&self, hint: Option<&str>) -> Option<Arc<dyn QuestionParser>> {
        hint.and_then(|h| self.ordered.iter().find(|p| p.accepts_hint(h)).cloned())
            .or_else(|| self.get_by_name(ParserKind::Unified.name()))
    }

    /// Parse with the parser selected by the context's subject hint.
    pub fn parse(&self, doc: &Document, ctx: &ParseContext) -> Result<ParseOutcome> {
        let parser = self
            .select(ctx.options.subject_hint.as_deref())
            .ok_or_else(|| Error::Other("No parser registered".into()))?;
        parser.parse(doc, ctx)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_with_defaults() {
        let registry = ParserRegistry::with_defaults();
        assert_eq!(
            registry.names(),
            vec!["unified", "math", "physics", "chemistry", "biology", "literature"]
        );
        assert!(registry.get_by_name("Chemistry").is_some());
    }

    #[test]
    fn test_select_by_hint() {
        let registry = ParserRegistry::with_defaults();
        let name = |hint: Option<&str>| registry.select(hint).map(|p| p.name().to_string());
        assert_eq!(name(Some("Matematika 5-sinf")).as_deref(), Some("math"));
        assert_eq!(name(Some("GEOMETRIYA")).as_deref(), Some("math"));
        assert_eq!(name(Some("fizika")).as_deref(), Some("physics"));
        assert_eq!(name(Some("Kimyo")).as_deref(), Some("chemistry"));
        assert_eq!(name(Some("Biologiya")).as_deref(), Some("biology"));
        assert_eq!(name(Some("Ona tili")).as_deref(), Some("literature"));
        assert_eq!(name(Some("Tarix")).as_deref(), Some("unified"));
        assert_eq!(name(None).as_deref(), Some("unified"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = ParserRegistry::new();
        assert!(registry.select(Some("kimyo")).is_none());
        let doc = Document::from_text("1) Q A) 1 B) 2");
        assert!(registry.parse(&doc, &ParseContext::default()).is_err());
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut registry = ParserRegistry::with_defaults();
        registry.register(Arc::new(SubjectParser::new(ParserKind::Math)));
        assert_eq!(registry.names().len(), 6);
    }
}
