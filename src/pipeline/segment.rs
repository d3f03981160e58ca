//! Question/variant segmenter.
//!
//! Splits the protected stream into question blocks at numeric markers,
//! filters markers that belong to numbered lists inside a question body,
//! and hands each block to the variant layouts.

use super::layout::{default_layouts, LayoutConfig, RawVariant, VariantLayout};
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// Segmenter configuration.
#[derive(Debug, Clone, Copy)]
pub struct SegmentOptions {
    /// Highest question number accepted as a marker
    pub max_question_number: u32,
    /// Variant letter limits
    pub layout: LayoutConfig,
    /// Try the space-separated layout
    pub allow_spaced_layout: bool,
    /// Split a two-number tail of variant C into C and D
    pub chemistry_repair: bool,
    /// Renumber the second of two "N-Variant" sections
    pub merge_sections: bool,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            max_question_number: 100,
            layout: LayoutConfig::default(),
            allow_spaced_layout: true,
            chemistry_repair: false,
            merge_sections: true,
        }
    }
}

/// A question block after layout matching, before restoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuestion {
    /// Number printed in the document
    pub number: u32,
    /// Question text (whole block when no layout matched)
    pub text: String,
    /// Variants; empty when no layout matched
    pub variants: Vec<RawVariant>,
    /// Name of the layout that matched
    pub layout: Option<&'static str>,
}

impl RawQuestion {
    /// Question text and variant texts in document order.
    pub fn raw_text(&self) -> String {
        let mut text = self.text.clone();
        for variant in &self.variants {
            text.push(' ');
            text.push_str(&variant.text);
        }
        text
    }
}

/// Output of segmentation.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    pub questions: Vec<RawQuestion>,
    /// Markers found within the number range
    pub marker_candidates: usize,
    /// Markers dropped by the sequential filter
    pub discarded: usize,
}

static QUESTION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*((?:\*\*)?(\d{1,3})(?:\*\*)?\)(?:\*\*)?)(?:[ \t\r\n]|$)").unwrap()
});
static SECTION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[ \t*]*(\d+)[ \t]*-[ \t]*variant\b[^\n]*$").unwrap());
static LINE_QUESTION_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*(?:\*\*)?)(\d{1,3})((?:\*\*)?\))").unwrap());
static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(?:[.,]\d+)*(?:/\d+)?$").unwrap());

#[derive(Debug, Clone, Copy)]
struct QuestionMarker {
    number: u32,
    start: usize,
    end: usize,
}

/// Splits a protected stream into questions.
pub struct Segmenter {
    options: SegmentOptions,
    layouts: Vec<Box<dyn VariantLayout>>,
}

impl Segmenter {
    /// Create a segmenter with the default layout order.
    pub fn new(options: SegmentOptions) -> Self {
        Self {
            layouts: default_layouts(options.allow_spaced_layout),
            options,
        }
    }

    /// Segment a protected stream.
    pub fn segment(&self, text: &str) -> Segmentation {
        let text: Cow<'_, str> = if self.options.merge_sections {
            merge_variant_sections(text).map_or(Cow::Borrowed(text), Cow::Owned)
        } else {
            Cow::Borrowed(text)
        };

        let markers = find_question_markers(&text, self.options.max_question_number);
        let numbers: Vec<u32> = markers.iter().map(|m| m.number).collect();
        let kept = sequential_filter(&numbers);
        debug!(
            "Question markers: {} candidates, {} kept",
            markers.len(),
            kept.len()
        );

        let questions = kept
            .iter()
            .enumerate()
            .map(|(i, &idx)| {
                let marker = markers[idx];
                let end = kept.get(i + 1).map_or(text.len(), |&next| markers[next].start);
                self.split_block(marker.number, &text[marker.end..end])
            })
            .collect();

        Segmentation {
            questions,
            marker_candidates: markers.len(),
            discarded: markers.len() - kept.len(),
        }
    }

    fn split_block(&self, number: u32, block: &str) -> RawQuestion {
        for layout in &self.layouts {
            let Some(found) = layout.split(block, &self.options.layout) else {
                continue;
            };
            let mut variants = found.variants;
            if self.options.chemistry_repair && self.options.layout.last_letter >= 'D' {
                split_numeric_tail(&mut variants);
            }
            return RawQuestion {
                number,
                text: found.question,
                variants,
                layout: Some(layout.name()),
            };
        }
        debug!("Question {}: no variant layout matched", number);
        RawQuestion {
            number,
            text: block.trim().to_string(),
            variants: Vec::new(),
            layout: None,
        }
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(SegmentOptions::default())
    }
}

fn find_question_markers(text: &str, max: u32) -> Vec<QuestionMarker> {
    QUESTION_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let marker = caps.get(1)?;
            let number: u32 = caps[2].parse().ok()?;
            (1..=max).contains(&number).then_some(QuestionMarker {
                number,
                start: marker.start(),
                end: marker.end(),
            })
        })
        .collect()
}

/// Indices of the markers that form the question sequence.
///
/// Runs a greedy forward pass for 1, 2, 3, ... and a longest strictly
/// ascending subsequence, and keeps the longer one (greedy on ties).
pub fn sequential_filter(numbers: &[u32]) -> Vec<usize> {
    let greedy = greedy_sequence(numbers);
    let ascending = longest_ascending(numbers);
    if ascending.len() > greedy.len() {
        ascending
    } else {
        greedy
    }
}

fn greedy_sequence(numbers: &[u32]) -> Vec<usize> {
    let Some(&max) = numbers.iter().max() else {
        return Vec::new();
    };
    let mut picks = Vec::new();
    let mut pos = 0;
    for target in 1..=max {
        if let Some(offset) = numbers[pos..].iter().position(|&n| n == target) {
            picks.push(pos + offset);
            pos += offset + 1;
        }
    }
    picks
}

fn longest_ascending(numbers: &[u32]) -> Vec<usize> {
    // tails[k]: index of the smallest tail of an ascending run of length k + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; numbers.len()];
    for (i, &n) in numbers.iter().enumerate() {
        let k = tails.partition_point(|&t| numbers[t] < n);
        if k > 0 {
            prev[i] = Some(tails[k - 1]);
        }
        if k == tails.len() {
            tails.push(i);
        } else {
            tails[k] = i;
        }
    }

    let mut sequence = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        sequence.push(i);
        cursor = prev[i];
    }
    sequence.reverse();
    sequence
}

/// Renumber the second section of a two-section document.
///
/// Returns `None` unless exactly two `<k>-Variant` headers are present.
/// Header lines are removed so they do not end up in question text.
pub fn merge_variant_sections(text: &str) -> Option<String> {
    let headers: Vec<_> = SECTION_HEADER.find_iter(text).collect();
    let [first, second] = headers.as_slice() else {
        return None;
    };

    let section_one = &text[first.end()..second.start()];
    let offset = LINE_QUESTION_NUMBER
        .captures_iter(section_one)
        .filter_map(|c| c[2].parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    let section_two = LINE_QUESTION_NUMBER.replace_all(&text[second.end()..], |caps: &Captures| {
        let number: u32 = caps[2].parse().unwrap_or(0);
        format!("{}{}{}", &caps[1], number + offset, &caps[3])
    });
    debug!("Merged two variant sections, second section offset by {}", offset);

    Some(format!("{}{}\n{}", &text[..first.start()], section_one, section_two))
}

/// `C) 5 6` with no variant D: the two numbers are C and D.
fn split_numeric_tail(variants: &mut Vec<RawVariant>) {
    if variants.len() != 3 || variants[2].letter != 'C' {
        return;
    }
    let parts: Vec<String> = variants[2].text.split_whitespace().map(str::to_string).collect();
    let [c, d] = parts.as_slice() else {
        return;
    };
    if !NUMERIC.is_match(c.trim_matches('*')) || !NUMERIC.is_match(d.trim_matches('*')) {
        return;
    }
    let d_emphasized = d.contains("**");
    let last = &mut variants[2];
    last.emphasized = (last.emphasized && !d_emphasized) || c.contains("**");
    last.text = c.clone();
    variants.push(RawVariant::new('D', d.clone(), d_emphasized));
}
