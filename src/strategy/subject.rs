//! Built-in parser variants.

use super::QuestionParser;
use crate::error::Result;
use crate::model::{DetectedCategory, Document, ParseOutcome};
use crate::pipeline::{self, ParseContext, Profile};

/// The closed set of built-in parser variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserKind {
    /// Switches follow the detected category
    Unified,
    Math,
    Physics,
    /// Repairs a numeric tail of variant C
    Chemistry,
    Biology,
    /// No space-separated layout (capital initials in names)
    Literature,
}

impl ParserKind {
    /// Every kind, in registration order.
    pub const ALL: [ParserKind; 6] = [
        ParserKind::Unified,
        ParserKind::Math,
        ParserKind::Physics,
        ParserKind::Chemistry,
        ParserKind::Biology,
        ParserKind::Literature,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ParserKind::Unified => "unified",
            ParserKind::Math => "math",
            ParserKind::Physics => "physics",
            ParserKind::Chemistry => "chemistry",
            ParserKind::Biology => "biology",
            ParserKind::Literature => "literature",
        }
    }

    /// Subject-hint fragments (Uzbek and English).
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            ParserKind::Unified => &[],
            ParserKind::Math => &["math", "matematika", "algebra", "geometriya"],
            ParserKind::Physics => &["fizika", "physics"],
            ParserKind::Chemistry => &["kimyo", "chemistry"],
            ParserKind::Biology => &["biologiya", "biology"],
            ParserKind::Literature => &["ona tili", "adabiyot", "literature"],
        }
    }

    /// Segmenter switches for a document of the detected category.
    pub fn profile(&self, category: DetectedCategory) -> Profile {
        match self {
            ParserKind::Unified => Profile::for_category(category),
            ParserKind::Chemistry => Profile {
                allow_spaced_layout: true,
                chemistry_repair: true,
            },
            ParserKind::Literature => Profile {
                allow_spaced_layout: false,
                chemistry_repair: false,
            },
            ParserKind::Math | ParserKind::Physics | ParserKind::Biology => Profile::default(),
        }
    }
}

impl std::fmt::Display for ParserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A parser variant running the full pipeline.
#[derive(Debug, Clone, Copy)]
pub struct SubjectParser {
    kind: ParserKind,
}

impl SubjectParser {
    pub fn new(kind: ParserKind) -> Self {
        Self { kind }
    }

    /// The parser used when no hint matches.
    pub fn unified() -> Self {
        Self::new(ParserKind::Unified)
    }

    pub fn kind(&self) -> ParserKind {
        self.kind
    }
}

impl Default for SubjectParser {
    fn default() -> Self {
        Self::unified()
    }
}

impl QuestionParser for SubjectParser {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn aliases(&self) -> &[&str] {
        self.kind.aliases()
    }

    fn parse(&self, doc: &Document, ctx: &ParseContext) -> Result<ParseOutcome> {
        pipeline::run(doc, ctx, self.kind.name(), |category| self.kind.profile(category))
    }
}
