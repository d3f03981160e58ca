//! Media linking: attach stored images and tables to questions and variants.

use super::MediaInventory;
use crate::model::{MediaPosition, MediaRef, Question};
use crate::pipeline::{DimensionTable, RawQuestion};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static MEDIA_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(IMAGE|TABLE)_(\d+)").unwrap());

/// A media placeholder found in raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaToken {
    Image(u32),
    Table(usize),
}

/// Media placeholders of `text`, in order.
pub fn media_tokens(text: &str) -> Vec<MediaToken> {
    MEDIA_TOKEN
        .captures_iter(text)
        .filter_map(|caps| match &caps[1] {
            "IMAGE" => caps[2].parse().ok().map(MediaToken::Image),
            _ => caps[2].parse().ok().map(MediaToken::Table),
        })
        .collect()
}

/// Tall narrow images are usually scanned answer sheets, not illustrations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanRule {
    /// Height/width ratio above which an image is a scan
    pub aspect_ratio: f32,
    /// Minimum height for the rule to apply
    pub min_height: u32,
}

impl ScanRule {
    pub fn is_scan(&self, width: u32, height: u32) -> bool {
        width > 0 && height as f32 > self.aspect_ratio * width as f32 && height > self.min_height
    }
}

impl Default for ScanRule {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.4,
            min_height: 600,
        }
    }
}

enum ImageLink {
    Linked {
        url: String,
        width: Option<u32>,
        height: Option<u32>,
    },
    Scan,
    Missing,
}

/// Attaches media of one parse to its questions.
pub struct Linker<'a> {
    inventory: &'a MediaInventory,
    dimensions: &'a DimensionTable,
    scan: ScanRule,
}

impl<'a> Linker<'a> {
    pub fn new(inventory: &'a MediaInventory, dimensions: &'a DimensionTable) -> Self {
        Self {
            inventory,
            dimensions,
            scan: ScanRule::default(),
        }
    }

    pub fn with_scan_rule(mut self, scan: ScanRule) -> Self {
        self.scan = scan;
        self
    }

    /// Link media of `raw` into `question`. Returns the number of images
    /// dropped as scans.
    pub fn link(&self, raw: &RawQuestion, question: &mut Question) -> u32 {
        let mut scans = 0;

        for caps in MEDIA_TOKEN.captures_iter(&raw.text) {
            let Some(m) = caps.get(0) else { continue };
            let position = position_in(&raw.text, m.start(), m.end());
            let token = match &caps[1] {
                "IMAGE" => caps[2].parse().ok().map(MediaToken::Image),
                _ => caps[2].parse().ok().map(MediaToken::Table),
            };
            if let Some(token) = token {
                scans += self.attach(token, position, question);
            }
        }

        for (variant, raw_variant) in question.variants.iter_mut().zip(&raw.variants) {
            let mut extra = Vec::new();
            for token in media_tokens(&raw_variant.text) {
                match token {
                    MediaToken::Image(seq) if variant.image_url.is_none() => match self.image(seq) {
                        ImageLink::Linked { url, width, height } => {
                            variant.image_url = Some(url);
                            variant.image_width = width;
                            variant.image_height = height;
                        }
                        ImageLink::Scan => scans += 1,
                        ImageLink::Missing => {}
                    },
                    other => extra.push(other),
                }
            }
            for token in extra {
                scans += self.attach_to(token, MediaPosition::AfterText, &mut question.media);
            }
        }

        if scans > 0 {
            debug!("Question {}: {} scan image(s) skipped", raw.number, scans);
        }
        scans
    }

    fn attach(&self, token: MediaToken, position: MediaPosition, question: &mut Question) -> u32 {
        self.attach_to(token, position, &mut question.media)
    }

    fn attach_to(&self, token: MediaToken, position: MediaPosition, media: &mut Vec<MediaRef>) -> u32 {
        match token {
            MediaToken::Image(seq) => match self.image(seq) {
                ImageLink::Linked { url, width, height } => {
                    media.push(MediaRef::image(url, position).with_dimensions(width, height));
                    0
                }
                ImageLink::Scan => 1,
                ImageLink::Missing => 0,
            },
            MediaToken::Table(id) => {
                if let Some(table) = self.inventory.table(id) {
                    media.push(MediaRef::table(
                        table.url.clone(),
                        Some(table.html.clone()),
                        position,
                    ));
                }
                0
            }
        }
    }

    fn image(&self, seq: u32) -> ImageLink {
        let Some(stored) = self.inventory.image(seq) else {
            return ImageLink::Missing;
        };
        let (width, height) = match self.dimensions.get(seq) {
            Some((w, h)) => (Some(w), Some(h)),
            None => (stored.width, stored.height),
        };
        if let (Some(w), Some(h)) = (width, height) {
            if self.scan.is_scan(w, h) {
                return ImageLink::Scan;
            }
        }
        ImageLink::Linked {
            url: stored.url.clone(),
            width,
            height,
        }
    }
}

/// Position of a token relative to the text, ignoring other tokens and emphasis.
fn position_in(text: &str, start: usize, end: usize) -> MediaPosition {
    let is_blank = |s: &str| {
        MEDIA_TOKEN
            .replace_all(s, "")
            .chars()
            .all(|c| c.is_whitespace() || c == '*')
    };
    if is_blank(&text[..start]) {
        MediaPosition::BeforeText
    } else if is_blank(&text[end..]) {
        MediaPosition::AfterText
    } else {
        MediaPosition::Inline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{StoredImage, StoredTable};
    use crate::model::{MediaType, Variant};
    use crate::pipeline::layout::RawVariant;

    fn inventory() -> MediaInventory {
        let mut inventory = MediaInventory::default();
        for (seq, w, h) in [(1, 200, 100), (2, 100, 900), (3, 50, 50)] {
            inventory.insert_image(StoredImage {
                seq,
                url: format!("/media/{}.png", seq),
                width: Some(w),
                height: Some(h),
            });
        }
        inventory.insert_table(StoredTable {
            id: 1,
            url: None,
            html: "<table></table>".into(),
        });
        inventory
    }

    fn raw(text: &str, variants: &[(char, &str)]) -> RawQuestion {
        RawQuestion {
            number: 1,
            text: text.to_string(),
            variants: variants.iter().map(|&(l, t)| RawVariant::new(l, t, false)).collect(),
            layout: None,
        }
    }

    fn question(raw: &RawQuestion) -> Question {
        let mut q = Question::new("q");
        q.variants = raw.variants.iter().map(|v| Variant::new(v.letter, "")).collect();
        q
    }

    #[test]
    fn test_tokens() {
        assert_eq!(
            media_tokens("a IMAGE_4 b TABLE_2"),
            vec![MediaToken::Image(4), MediaToken::Table(2)]
        );
    }

    #[test]
    fn test_positions_and_order() {
        let inventory = inventory();
        let dims = DimensionTable::default();
        let linker = Linker::new(&inventory, &dims);

        let raw = raw("IMAGE_1 Rasmga qarang IMAGE_3 va jadval TABLE_1", &[]);
        let mut q = question(&raw);
        assert_eq!(linker.link(&raw, &mut q), 0);

        let positions: Vec<_> = q.media.iter().map(|m| m.position).collect();
        assert_eq!(
            positions,
            vec![
                MediaPosition::BeforeText,
                MediaPosition::Inline,
                MediaPosition::AfterText
            ]
        );
        assert_eq!(q.media[0].url.as_deref(), Some("/media/1.png"));
        assert_eq!(q.media[0].width, Some(200));
        assert_eq!(q.media[2].kind, MediaType::Table);
        assert!(q.media[2].url.is_none());
        assert!(q.media[2].html.is_some());
    }

    #[test]
    fn test_scan_skipped() {
        let inventory = inventory();
        let dims = DimensionTable::default();
        let raw = raw("Savol IMAGE_2", &[]);
        let mut q = question(&raw);
        assert_eq!(Linker::new(&inventory, &dims).link(&raw, &mut q), 1);
        assert!(q.media.is_empty());
    }

    #[test]
    fn test_display_dimensions_preferred() {
        let inventory = inventory();
        let mut dims = DimensionTable::default();
        dims.record(2, 300, 200);
        let raw = raw("Savol IMAGE_2", &[]);
        let mut q = question(&raw);
        assert_eq!(Linker::new(&inventory, &dims).link(&raw, &mut q), 0);
        assert_eq!(q.media[0].height, Some(200));
    }

    #[test]
    fn test_variant_images() {
        let inventory = inventory();
        let dims = DimensionTable::default();
        let raw = raw("Qaysi?", &[('A', "IMAGE_3"), ('B', "IMAGE_1 IMAGE_3"), ('C', "IMAGE_9")]);
        let mut q = question(&raw);
        Linker::new(&inventory, &dims).link(&raw, &mut q);

        assert_eq!(q.variants[0].image_url.as_deref(), Some("/media/3.png"));
        assert_eq!(q.variants[0].image_width, Some(50));
        assert_eq!(q.variants[1].image_url.as_deref(), Some("/media/1.png"));
        assert!(q.variants[2].image_url.is_none());
        assert_eq!(q.media.len(), 1);
        assert_eq!(q.media[0].position, MediaPosition::AfterText);
    }

    #[test]
    fn test_scan_rule() {
        let rule = ScanRule::default();
        assert!(rule.is_scan(400, 1000));
        assert!(!rule.is_scan(400, 500));
        assert!(!rule.is_scan(100, 130));
    }
}
