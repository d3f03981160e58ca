//! The question extraction pipeline.
//!
//! Stages run strictly in order on one document:
//!
//! 1. [`normalize`] (or [`normalize_text`] for raw text) builds one stream
//! 2. [`classify`] picks the subject category
//! 3. [`protect`] hides math behind `MATH_<n>` tokens
//! 4. [`Segmenter`] splits questions and variants
//! 5. media extraction persists what the questions reference
//! 6. [`Resolver`] picks correct answers and restores text
//! 7. the linker attaches media, [`post_process`] rewrites notation
//!
//! All state is per call; nothing is shared between documents.

pub mod classify;
pub mod fallback;
pub mod layout;
pub mod normalize;
pub mod postprocess;
pub mod protect;
pub mod resolve;
pub mod segment;

pub use classify::{classify, score, CategoryScores};
pub use fallback::{normalize_text, FallbackOptions};
pub use layout::{LayoutConfig, LayoutMatch, RawVariant, VariantLayout};
pub use normalize::{normalize, DimensionTable, NormalizedStream};
pub use postprocess::post_process;
pub use protect::{protect, ProtectedStream};
pub use resolve::Resolver;
pub use segment::{RawQuestion, SegmentOptions, Segmentation, Segmenter};

use crate::error::{Error, Result};
use crate::media::{
    extract_media, media_tokens, Collaborators, CommandRasterizer, CommandTableRenderer, Linker,
    MediaInventory, MediaRequest, MediaToken, ScanRule,
};
use crate::model::{Body, DetectedCategory, Document, ParseOutcome, ParseStats};
use crate::parser::ParseOptions;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Coarse cancellation, checked between stages.
///
/// Media already written to the store is not rolled back.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every parse holding a clone of this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Error::Cancelled)` once cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Everything one parse call needs besides the document.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    pub options: ParseOptions,
    pub collaborators: Collaborators,
    pub cancel: CancelToken,
}

impl ParseContext {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Rasterize vector images with an external program, bounded by
    /// `options.collaborator_timeout`.
    pub fn with_rasterizer_command<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rasterizer = CommandRasterizer::new(program)
            .with_args(args)
            .with_timeout(self.options.collaborator_timeout);
        self.collaborators.rasterizer = Some(Arc::new(rasterizer));
        self
    }

    /// Render tables with an external program, bounded by
    /// `options.collaborator_timeout`.
    pub fn with_table_renderer_command<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let renderer = CommandTableRenderer::new(program)
            .with_args(args)
            .with_timeout(self.options.collaborator_timeout);
        self.collaborators.table_renderer = Some(Arc::new(renderer));
        self
    }
}

/// Segmenter switches a parser variant controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    /// Try the space-separated variant layout
    pub allow_spaced_layout: bool,
    /// Split a two-number tail of variant C into C and D
    pub chemistry_repair: bool,
}

impl Profile {
    /// The profile implied by a detected category.
    pub fn for_category(category: DetectedCategory) -> Self {
        Self {
            allow_spaced_layout: category != DetectedCategory::Literature,
            chemistry_repair: category == DetectedCategory::Chemistry,
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            allow_spaced_layout: true,
            chemistry_repair: false,
        }
    }
}

/// Build the normalized stream for a document, structured or raw.
pub fn stream_for(doc: &Document, equations: &HashMap<u32, String>) -> NormalizedStream {
    match &doc.body {
        Body::Tree(_) => normalize(doc, equations),
        Body::Raw(text) => normalize_text(text, &FallbackOptions::default()),
    }
}

/// Run every stage on one document.
///
/// `parser` names the parser variant in the outcome; `profile_for` maps the
/// detected category to segmenter switches.
pub fn run<F>(doc: &Document, ctx: &ParseContext, parser: &str, profile_for: F) -> Result<ParseOutcome>
where
    F: Fn(DetectedCategory) -> Profile,
{
    let options = &ctx.options;
    ctx.cancel.check()?;

    let equations = ctx.collaborators.equation_sources(doc);
    let stream = stream_for(doc, &equations);
    debug!(
        "Normalized stream: {} bytes, {} math spans, {} images, {} tables",
        stream.text.len(),
        stream.math_count(),
        stream.image_tokens().len(),
        stream.tables.len()
    );
    ctx.cancel.check()?;

    let scores = score(&stream.text);
    let category = scores.dominant();
    debug!("Category scores {:?} -> {}", scores, category);
    let profile = profile_for(category);

    let protected = protect(&stream.text);
    ctx.cancel.check()?;

    let segmenter = Segmenter::new(SegmentOptions {
        max_question_number: options.max_question_number,
        layout: LayoutConfig {
            last_letter: options.last_variant_letter(),
        },
        allow_spaced_layout: profile.allow_spaced_layout,
        chemistry_repair: profile.chemistry_repair,
        merge_sections: options.merge_variant_sections,
    });
    let segmentation = segmenter.segment(&protected.text);
    ctx.cancel.check()?;

    let inventory = if options.extract_media {
        let request = media_request(&segmentation);
        extract_media(doc, &stream.tables, &request, &ctx.collaborators, options)?
    } else {
        MediaInventory::default()
    };
    ctx.cancel.check()?;

    let resolver = Resolver::new(&protected)
        .with_points(options.default_points)
        .with_expected_variants(options.expected_variants)
        .with_preview_len(options.preview_len);
    let linker = Linker::new(&inventory, &stream.dimensions).with_scan_rule(ScanRule {
        aspect_ratio: options.scan_aspect_ratio,
        min_height: options.scan_min_height,
    });

    let mut questions = Vec::with_capacity(segmentation.questions.len());
    let mut diagnostics = Vec::new();
    let mut scans = 0;
    for (index, raw) in segmentation.questions.iter().enumerate() {
        let (mut question, found) = resolver.resolve(index, raw);
        scans += linker.link(raw, &mut question);

        question.text = post_process(&question.text, category);
        for variant in &mut question.variants {
            variant.text = post_process(&variant.text, category);
        }

        if question.needs_review {
            warn!("Question {}: no variant layout matched", raw.number);
        }
        diagnostics.extend(found);
        questions.push(question);
    }

    let stats = ParseStats {
        marker_candidates: segmentation.marker_candidates as u32,
        discarded_markers: segmentation.discarded as u32,
        question_count: questions.len() as u32,
        variant_count: questions.iter().map(|q| q.variants.len() as u32).sum(),
        math_count: protected.math_count() as u32,
        image_count: inventory.image_count() as u32,
        table_count: inventory.table_count() as u32,
        skipped_media: inventory.skipped + scans,
    };

    let outcome = ParseOutcome {
        questions,
        category,
        diagnostics,
        parser: parser.to_string(),
        stats,
    };
    info!(
        "Parsed {} questions with {} parser ({}), {}",
        outcome.questions.len(),
        parser,
        category,
        outcome.review_summary()
    );
    Ok(outcome)
}

/// Media referenced by the segmented questions.
fn media_request(segmentation: &Segmentation) -> MediaRequest {
    let mut request = MediaRequest::default();
    for raw in &segmentation.questions {
        for token in media_tokens(&raw.raw_text()) {
            match token {
                MediaToken::Image(seq) if !request.images.contains(&seq) => request.images.push(seq),
                MediaToken::Table(id) if !request.tables.contains(&id) => request.tables.push(id),
                _ => {}
            }
        }
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DiagnosticKind;

    fn parse(text: &str) -> ParseOutcome {
        let doc = Document::from_text(text);
        run(&doc, &ParseContext::default(), "unified", Profile::for_category).unwrap()
    }

    #[test]
    fn test_run_plain_text() {
        let outcome = parse("1. 2+2=? A) 3 __B) 4__ C) 5 D) 6\n2. Poytaxt? A) Toshkent B) Buxoro\n");
        assert_eq!(outcome.questions.len(), 2);
        assert_eq!(outcome.questions[0].correct_answer, "B");
        assert_eq!(outcome.questions[1].correct_answer, "A");
        assert_eq!(outcome.parser, "unified");
        assert_eq!(outcome.stats.question_count, 2);
        assert_eq!(outcome.stats.variant_count, 6);

        let kinds: Vec<_> = outcome.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::IncompleteVariants, DiagnosticKind::UnmarkedAnswer]
        );
        assert!(outcome.diagnostics.iter().all(|d| d.index == 1));
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let ctx = ParseContext::default().with_cancel_token(cancel.clone());
        let result = run(&Document::from_text("1) Q A) 1 B) 2"), &ctx, "unified", Profile::for_category);
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_profile_for_category() {
        assert!(!Profile::for_category(DetectedCategory::Literature).allow_spaced_layout);
        assert!(Profile::for_category(DetectedCategory::Chemistry).chemistry_repair);
        assert_eq!(Profile::for_category(DetectedCategory::Math), Profile::default());
    }

    #[test]
    fn test_media_request_dedup() {
        let segmentation = Segmenter::default().segment("1) IMAGE_2 Q A) IMAGE_2 B) TABLE_1\n");
        let request = media_request(&segmentation);
        assert_eq!(request.images, vec![2]);
        assert_eq!(request.tables, vec![1]);
    }

    #[test]
    fn test_command_collaborators_use_option_timeout() {
        let options = ParseOptions::default()
            .with_collaborator_timeout(std::time::Duration::from_millis(100));
        let ctx = ParseContext::new(options)
            .with_rasterizer_command("sh", ["-c", "sleep 5"])
            .with_table_renderer_command("sh", ["-c", "sleep 5"]);

        let rasterizer = ctx.collaborators.rasterizer.as_ref().unwrap();
        let err = rasterizer.rasterize(b"x", "wmf").unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(ctx.collaborators.table_renderer.is_some());
    }
}
