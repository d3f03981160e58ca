//! # unquiz
//!
//! Multiple-choice question extraction from Word documents.
//!
//! A question bank is read from a DOCX container (or a plain-text export),
//! flattened into one annotated text stream, classified by subject and
//! segmented into questions with lettered variants. The emphasized variant
//! is taken as the correct answer; items that could not be read cleanly are
//! reported as diagnostics instead of failing the call.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unquiz::{parse_file, render};
//!
//! fn main() -> unquiz::Result<()> {
//!     let outcome = parse_file("bank.docx")?;
//!     println!("{}", outcome.review_summary());
//!
//!     let json = render::to_json(&outcome, render::JsonFormat::Pretty)?;
//!     std::fs::write("bank.json", json)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Layouts**: inline `A)`, dotted `A.`, per-line and space-separated variants
//! - **Math**: OMML and inline LaTeX survive segmentation untouched
//! - **Media**: images and tables linked to the question or variant they sit in
//! - **Subjects**: chemistry, physics and math notation cleanup
//! - **Parallel processing**: batches of files run on Rayon

pub mod detect;
pub mod error;
pub mod media;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod strategy;

pub use detect::{detect_format_from_bytes, detect_format_from_path, ContainerFormat};
pub use error::{Error, Result};
pub use media::{Collaborators, EquationExtractor, MediaStore, TableRenderer, VectorRasterizer};
pub use model::{
    DetectedCategory, Diagnostic, DiagnosticKind, Document, MediaPosition, MediaRef, MediaType,
    ParseOutcome, ParseStats, Question, Variant,
};
pub use parser::{DocxParser, ErrorMode, ParseOptions};
pub use pipeline::{CancelToken, ParseContext};
pub use render::{JsonFormat, ReviewReport};
pub use strategy::{ParserKind, ParserRegistry, QuestionParser};

use log::debug;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Parse a question bank file with default options.
///
/// # Example
///
/// ```no_run
/// use unquiz::parse_file;
///
/// let outcome = parse_file("kimyo.docx").unwrap();
/// for q in &outcome.questions {
///     println!("{} -> {}", q.text, q.correct_answer);
/// }
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ParseOutcome> {
    parse_file_with_options(path, ParseOptions::default())
}

/// Parse a question bank file with custom options.
///
/// # Example
///
/// ```no_run
/// use unquiz::{parse_file_with_options, ParseOptions};
///
/// let options = ParseOptions::new()
///     .with_subject_hint("Fizika")
///     .text_only();
/// let outcome = parse_file_with_options("fizika.docx", options).unwrap();
/// ```
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<ParseOutcome> {
    let data = std::fs::read(path)?;
    parse_bytes_with_options(&data, options)
}

/// Parse a question bank from bytes.
pub fn parse_bytes(data: &[u8]) -> Result<ParseOutcome> {
    parse_bytes_with_options(data, ParseOptions::default())
}

/// Parse a question bank from bytes with custom options.
pub fn parse_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<ParseOutcome> {
    parse_with_context(data, &ParseContext::new(options))
}

/// Parse bytes with explicit collaborators and cancellation.
///
/// # Example
///
/// ```no_run
/// use unquiz::media::{Collaborators, FsMediaStore};
/// use unquiz::{parse_with_context, ParseContext, ParseOptions};
/// use std::sync::Arc;
///
/// let ctx = ParseContext::new(ParseOptions::default())
///     .with_collaborators(Collaborators::new(Arc::new(FsMediaStore::new("uploads"))));
/// let data = std::fs::read("bank.docx").unwrap();
/// let outcome = parse_with_context(&data, &ctx).unwrap();
/// ```
pub fn parse_with_context(data: &[u8], ctx: &ParseContext) -> Result<ParseOutcome> {
    let doc = read_document(data)?;
    parse_document(&doc, ctx)
}

/// Parse plain text, such as a markdown export of a document.
pub fn parse_text(text: &str, options: ParseOptions) -> Result<ParseOutcome> {
    parse_document(&Document::from_text(text), &ParseContext::new(options))
}

/// Run the parser selected by the subject hint on a document.
pub fn parse_document(doc: &Document, ctx: &ParseContext) -> Result<ParseOutcome> {
    ParserRegistry::with_defaults().parse(doc, ctx)
}

/// Read bytes into a [`Document`] according to the detected container.
pub fn read_document(data: &[u8]) -> Result<Document> {
    let format = detect_format_from_bytes(data)?;
    debug!("Detected {}", format);
    match format {
        ContainerFormat::Docx => DocxParser::from_bytes(data.to_vec())?.parse(),
        ContainerFormat::PlainText => Ok(Document::from_text(String::from_utf8_lossy(data))),
        ContainerFormat::LegacyDoc => Err(Error::UnsupportedFormat(
            "legacy .doc; convert it to .docx first".into(),
        )),
    }
}

/// Parse several files in parallel.
///
/// Results keep the order of `paths`; one failing file does not stop the
/// others.
pub fn parse_batch(paths: &[PathBuf], ctx: &ParseContext) -> Vec<(PathBuf, Result<ParseOutcome>)> {
    paths
        .par_iter()
        .map(|path| {
            let result = std::fs::read(path)
                .map_err(Error::from)
                .and_then(|data| parse_with_context(&data, ctx));
            (path.clone(), result)
        })
        .collect()
}
