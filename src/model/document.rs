//! Document-level types.

use super::{MediaPart, Paragraph, Table};
use crate::detect::ContainerFormat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A question-bank document read from its container.
///
/// Holds either the structured rich-text tree or, when the container offered
/// no usable tree, the raw text that the fallback path cleans up.
#[derive(Debug, Clone)]
pub struct Document {
    /// Document metadata (title, author, etc.)
    pub metadata: Metadata,

    /// Document body
    pub body: Body,

    /// Embedded media parts, ordered by sequence number
    pub media: Vec<MediaPart>,
}

impl Document {
    /// Create a document from a structured block tree.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            metadata: Metadata::default(),
            body: Body::Tree(blocks),
            media: Vec::new(),
        }
    }

    /// Create a document from raw text (markdown-like export or salvaged text).
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            metadata: Metadata {
                format: Some(ContainerFormat::PlainText),
                ..Default::default()
            },
            body: Body::Raw(text.into()),
            media: Vec::new(),
        }
    }

    /// Attach embedded media.
    pub fn with_media(mut self, media: Vec<MediaPart>) -> Self {
        self.media = media;
        self
    }

    /// Whether a structured tree is available.
    pub fn has_tree(&self) -> bool {
        matches!(self.body, Body::Tree(_))
    }

    /// Top-level blocks (empty for raw documents).
    pub fn blocks(&self) -> &[Block] {
        match &self.body {
            Body::Tree(blocks) => blocks,
            Body::Raw(_) => &[],
        }
    }

    /// Look up an embedded media part by sequence number.
    pub fn media_part(&self, seq: u32) -> Option<&MediaPart> {
        self.media.iter().find(|m| m.seq == seq)
    }

    /// Sequence numbers of images that preview embedded equation objects.
    pub fn equation_previews(&self) -> Vec<u32> {
        let mut seqs: Vec<u32> = self
            .blocks()
            .iter()
            .flat_map(|b| match b {
                Block::Paragraph(p) => vec![p],
                Block::Table(t) => t.paragraphs().collect(),
            })
            .flat_map(|p| p.images())
            .filter(|img| img.equation)
            .map(|img| img.seq)
            .collect();
        seqs.sort_unstable();
        seqs.dedup();
        seqs
    }

    /// Number of tables in the tree.
    pub fn table_count(&self) -> usize {
        self.blocks()
            .iter()
            .filter(|b| matches!(b, Block::Table(_)))
            .count()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        match &self.body {
            Body::Raw(text) => text.clone(),
            Body::Tree(blocks) => blocks
                .iter()
                .map(|b| match b {
                    Block::Paragraph(p) => p.plain_text(),
                    Block::Table(t) => t
                        .text_rows()
                        .into_iter()
                        .map(|row| row.join(" | "))
                        .collect::<Vec<_>>()
                        .join("\n"),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Document body.
#[derive(Debug, Clone)]
pub enum Body {
    /// Structured rich-text tree
    Tree(Vec<Block>),

    /// Plain text without structure
    Raw(String),
}

/// A top-level block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A paragraph
    Paragraph(Paragraph),

    /// A table
    Table(Table),
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Container format the document was read from
    #[serde(skip)]
    pub format: Option<ContainerFormat>,

    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
}
