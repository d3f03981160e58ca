//! Question records produced by the pipeline.

use serde::{Deserialize, Serialize};

/// A multiple-choice (or free-response) question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Question text with math restored
    pub text: String,

    /// Answer variants in letter order
    pub variants: Vec<Variant>,

    /// Letter of the correct variant, or empty
    pub correct_answer: String,

    /// Score for a correct answer
    pub points: u32,

    /// Attached images and tables
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaRef>,

    /// Number printed in the source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_number: Option<u32>,

    /// No variant layout matched; a person should look at this item
    #[serde(default, skip_serializing_if = "is_false")]
    pub needs_review: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Question {
    /// Create a question with text and no variants.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            variants: Vec::new(),
            correct_answer: String::new(),
            points: 1,
            media: Vec::new(),
            original_number: None,
            needs_review: false,
        }
    }

    /// Add a variant.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variants.push(variant);
        self
    }

    /// Set the correct answer letter.
    pub fn with_correct_answer(mut self, letter: char) -> Self {
        self.correct_answer = letter.to_string();
        self
    }

    /// A question without variants is a free-response item.
    pub fn is_free_response(&self) -> bool {
        self.variants.is_empty()
    }

    /// Correct answer as a letter.
    pub fn correct_letter(&self) -> Option<char> {
        self.correct_answer.chars().next()
    }

    /// The variant designated as correct.
    pub fn correct_variant(&self) -> Option<&Variant> {
        let letter = self.correct_letter()?;
        self.variants.iter().find(|v| v.letter == letter)
    }

    /// Get a variant by letter.
    pub fn variant(&self, letter: char) -> Option<&Variant> {
        self.variants.iter().find(|v| v.letter == letter)
    }

    /// Check the record invariants: unique letters, a valid correct answer,
    /// and no leftover placeholder tokens.
    pub fn is_consistent(&self) -> bool {
        let mut letters: Vec<char> = self.variants.iter().map(|v| v.letter).collect();
        letters.sort_unstable();
        letters.dedup();
        if letters.len() != self.variants.len() {
            return false;
        }
        if !self.correct_answer.is_empty()
            && self
                .variants
                .iter()
                .filter(|v| v.letter.to_string() == self.correct_answer)
                .count()
                != 1
        {
            return false;
        }
        !has_placeholder(&self.text) && self.variants.iter().all(|v| !has_placeholder(&v.text))
    }
}

fn has_placeholder(text: &str) -> bool {
    ["MATH_", "IMAGE_", "TABLE_"].iter().any(|p| {
        text.match_indices(p).any(|(i, _)| {
            text[i + p.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit())
        })
    })
}

/// One labeled answer choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    /// Variant letter (A, B, C, ...)
    pub letter: char,

    /// Variant text with math restored
    pub text: String,

    /// Image shown with this variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Display width of the image in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,

    /// Display height of the image in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
}

impl Variant {
    /// Create a variant.
    pub fn new(letter: char, text: impl Into<String>) -> Self {
        Self {
            letter,
            text: text.into(),
            image_url: None,
            image_width: None,
            image_height: None,
        }
    }
}

/// Kind of attached media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Table,
}

/// Where an attachment sat relative to the question text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaPosition {
    /// Placeholder preceded all text
    BeforeText,
    /// Placeholder sat between text
    Inline,
    /// Placeholder followed all text
    AfterText,
}

/// A media attachment of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    /// Image or table
    #[serde(rename = "type")]
    pub kind: MediaType,

    /// Stable reference returned by the media store; absent for unrendered tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Position relative to the question text
    pub position: MediaPosition,

    /// Width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// HTML rendering of a table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl MediaRef {
    /// Create an image attachment.
    pub fn image(url: impl Into<String>, position: MediaPosition) -> Self {
        Self {
            kind: MediaType::Image,
            url: Some(url.into()),
            position,
            width: None,
            height: None,
            html: None,
        }
    }

    /// Create a table attachment.
    pub fn table(url: Option<String>, html: Option<String>, position: MediaPosition) -> Self {
        Self {
            kind: MediaType::Table,
            url,
            position,
            width: None,
            height: None,
            html,
        }
    }

    /// Set dimensions.
    pub fn with_dimensions(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}
