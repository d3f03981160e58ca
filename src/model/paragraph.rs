//! Paragraph and inline-level types.

use serde::{Deserialize, Serialize};

/// A paragraph of rich-text content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Inline content in document order
    pub content: Vec<InlineContent>,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with plain text.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.add_text(text);
        p
    }

    /// Add plain text to the paragraph.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.add_run(TextRun::new(text));
    }

    /// Add a styled text run.
    pub fn add_run(&mut self, run: TextRun) {
        self.content.push(InlineContent::Text(run));
    }

    /// Add a math expression.
    pub fn add_math(&mut self, math: MathSpan) {
        self.content.push(InlineContent::Math(math));
    }

    /// Add an image reference.
    pub fn add_image(&mut self, image: ImageRef) {
        self.content.push(InlineContent::Image(image));
    }

    /// Add a line break.
    pub fn add_line_break(&mut self) {
        self.content.push(InlineContent::LineBreak);
    }

    /// Get plain text content of the paragraph (math as source, images dropped).
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                InlineContent::Text(run) => run.text.clone(),
                InlineContent::LineBreak => "\n".to_string(),
                InlineContent::Math(math) => math.source.clone(),
                InlineContent::Image(_) => String::new(),
            })
            .collect()
    }

    /// Check if the paragraph has no visible content.
    pub fn is_empty(&self) -> bool {
        !self
            .content
            .iter()
            .any(|c| matches!(c, InlineContent::Image(_) | InlineContent::Math(_)))
            && self.plain_text().trim().is_empty()
    }

    /// Iterate over the image references in this paragraph.
    pub fn images(&self) -> impl Iterator<Item = &ImageRef> {
        self.content.iter().filter_map(|c| match c {
            InlineContent::Image(img) => Some(img),
            _ => None,
        })
    }
}

/// Inline content within a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineContent {
    /// A text run with styling
    Text(TextRun),

    /// A line break inside the paragraph
    LineBreak,

    /// A math expression (LaTeX source)
    Math(MathSpan),

    /// An inline image
    Image(ImageRef),
}

/// A run of text with consistent styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Text styling
    pub style: TextStyle,
}

impl TextRun {
    /// Create a new text run with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// Create a bold text run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle {
                bold: true,
                ..Default::default()
            },
        }
    }

    /// Set the style.
    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }
}

/// Character formatting relevant to question extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Bold
    pub bold: bool,

    /// Highlighted (any highlight color)
    pub highlight: bool,

    /// Vertical alignment
    pub script: Script,
}

impl TextStyle {
    /// Bold and highlight both mark emphasis.
    pub fn is_emphasized(&self) -> bool {
        self.bold || self.highlight
    }
}

/// Vertical alignment of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

/// A math expression converted to LaTeX.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathSpan {
    /// LaTeX source without delimiters
    pub source: String,

    /// Every run of the expression was bold
    pub bold: bool,

    /// Display (paragraph-level) math
    pub display: bool,
}

impl MathSpan {
    /// Create an inline math span.
    pub fn inline(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            bold: false,
            display: false,
        }
    }
}

/// Reference to an embedded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Media sequence number
    pub seq: u32,

    /// Display width in pixels, if the document states it
    pub width: Option<u32>,

    /// Display height in pixels, if the document states it
    pub height: Option<u32>,

    /// The image is the preview of an embedded equation object
    pub equation: bool,
}

impl ImageRef {
    /// Create an image reference without dimensions.
    pub fn new(seq: u32) -> Self {
        Self {
            seq,
            width: None,
            height: None,
            equation: false,
        }
    }

    /// Set display dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_plain_text() {
        let mut p = Paragraph::new();
        p.add_text("Agar ");
        p.add_math(MathSpan::inline("x^2"));
        p.add_line_break();
        p.add_image(ImageRef::new(3));
        assert_eq!(p.plain_text(), "Agar x^2\n");
        assert_eq!(p.images().count(), 1);
    }

    #[test]
    fn test_paragraph_is_empty() {
        assert!(Paragraph::with_text("   ").is_empty());
        let mut p = Paragraph::new();
        p.add_image(ImageRef::new(1));
        assert!(!p.is_empty());
    }

    #[test]
    fn test_emphasis() {
        assert!(TextRun::bold("B) 4").style.is_emphasized());
        let highlighted = TextStyle {
            highlight: true,
            ..Default::default()
        };
        assert!(highlighted.is_emphasized());
        assert!(!TextStyle::default().is_emphasized());
    }
}
