//! Parsing options and configuration.

use std::time::Duration;

/// Options for parsing question banks.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode for media collaborators
    pub error_mode: ErrorMode,

    /// Advisory subject hint selecting a parser variant
    pub subject_hint: Option<String>,

    /// Highest question number accepted as a marker
    pub max_question_number: u32,

    /// Highest number of variants per question (letters A..)
    pub max_variants: usize,

    /// Variants a complete question is expected to have
    pub expected_variants: usize,

    /// Points assigned to every question
    pub default_points: u32,

    /// Whether to extract, convert and persist embedded media
    pub extract_media: bool,

    /// Raster images smaller than this many bytes are dropped (0 = keep all)
    pub min_image_bytes: usize,

    /// Height/width ratio above which a tall image is treated as a scan
    pub scan_aspect_ratio: f32,

    /// Minimum height in pixels for the scan rule to apply
    pub scan_min_height: u32,

    /// Timeout for each call to a command-backed collaborator built by
    /// `ParseContext::with_rasterizer_command` or `with_table_renderer_command`
    pub collaborator_timeout: Duration,

    /// Renumber the second of two "N-Variant" sections
    pub merge_variant_sections: bool,

    /// Characters of question text kept in diagnostic previews
    pub preview_len: usize,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail the parse when a media collaborator fails.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Set the subject hint.
    pub fn with_subject_hint(mut self, hint: impl Into<String>) -> Self {
        self.subject_hint = Some(hint.into());
        self
    }

    /// Set the highest accepted question number.
    pub fn with_max_question_number(mut self, max: u32) -> Self {
        self.max_question_number = max.max(1);
        self
    }

    /// Set the highest number of variants (2..=26).
    pub fn with_max_variants(mut self, max: usize) -> Self {
        self.max_variants = max.clamp(2, 26);
        self
    }

    /// Set the number of variants a complete question has.
    pub fn with_expected_variants(mut self, expected: usize) -> Self {
        self.expected_variants = expected;
        self
    }

    /// Set points per question.
    pub fn with_points(mut self, points: u32) -> Self {
        self.default_points = points;
        self
    }

    /// Enable or disable media extraction.
    pub fn with_media(mut self, extract: bool) -> Self {
        self.extract_media = extract;
        self
    }

    /// Skip text-only parsing of media.
    pub fn text_only(mut self) -> Self {
        self.extract_media = false;
        self
    }

    /// Set the minimum raster size in bytes.
    pub fn with_min_image_bytes(mut self, bytes: usize) -> Self {
        self.min_image_bytes = bytes;
        self
    }

    /// Set the scan detection thresholds.
    pub fn with_scan_threshold(mut self, aspect_ratio: f32, min_height: u32) -> Self {
        self.scan_aspect_ratio = aspect_ratio;
        self.scan_min_height = min_height;
        self
    }

    /// Set the collaborator timeout.
    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    /// Enable or disable two-section renumbering.
    pub fn with_section_merge(mut self, merge: bool) -> Self {
        self.merge_variant_sections = merge;
        self
    }

    /// Set the diagnostic preview length.
    pub fn with_preview_len(mut self, len: usize) -> Self {
        self.preview_len = len;
        self
    }

    /// Last variant letter accepted by the parenthesized layouts.
    pub fn last_variant_letter(&self) -> char {
        (b'A' + (self.max_variants.clamp(2, 26) as u8 - 1)) as char
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            subject_hint: None,
            max_question_number: 100,
            max_variants: 6,
            expected_variants: 4,
            default_points: 1,
            extract_media: true,
            min_image_bytes: 0,
            scan_aspect_ratio: 1.4,
            scan_min_height: 600,
            collaborator_timeout: Duration::from_secs(30),
            merge_variant_sections: true,
            preview_len: 80,
        }
    }
}

/// How collaborator failures are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail the parse on the first collaborator error
    Strict,
    /// Skip the affected media item and continue
    #[default]
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .strict()
            .with_subject_hint("Kimyo")
            .with_max_variants(4)
            .with_points(2)
            .text_only();

        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.subject_hint.as_deref(), Some("Kimyo"));
        assert_eq!(options.last_variant_letter(), 'D');
        assert_eq!(options.default_points, 2);
        assert!(!options.extract_media);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.max_question_number, 100);
        assert_eq!(options.last_variant_letter(), 'F');
        assert!(options.extract_media);
    }

    #[test]
    fn test_variant_limit_clamped() {
        assert_eq!(ParseOptions::new().with_max_variants(1).max_variants, 2);
        assert_eq!(ParseOptions::new().with_max_variants(40).max_variants, 26);
    }
}
