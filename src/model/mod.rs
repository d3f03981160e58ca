//! Document and question model types.
//!
//! The input side (`Document`, blocks, runs, tables, media parts) is what the
//! container reader produces; the output side (`Question`, `ParseOutcome`)
//! is what the pipeline returns to callers.

mod category;
mod document;
mod outcome;
mod paragraph;
mod question;
mod resource;
mod table;

pub use category::DetectedCategory;
pub use document::{Block, Body, Document, Metadata};
pub use outcome::{Diagnostic, DiagnosticKind, ParseOutcome, ParseStats};
pub use paragraph::{ImageRef, InlineContent, MathSpan, Paragraph, Script, TextRun, TextStyle};
pub use question::{MediaPosition, MediaRef, MediaType, Question, Variant};
pub use resource::{MediaFormat, MediaPart};
pub use table::{Table, TableCell, TableRow, VerticalMerge};
