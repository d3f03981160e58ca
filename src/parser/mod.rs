//! DOCX reading and parse configuration.
//!
//! [`DocxParser`] turns a Word container into a [`Document`](crate::Document)
//! block tree; numbering and OMML conversion are internal to it.

mod docx_parser;
mod numbering;
mod omml;
mod options;

pub use docx_parser::DocxParser;
pub use options::{ErrorMode, ParseOptions};
