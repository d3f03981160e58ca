//! Media extraction: persist referenced images and render tables.

use super::{Collaborators, TableAsset};
use crate::error::Result;
use crate::model::{Document, MediaFormat, MediaPart, Table};
use crate::parser::{ErrorMode, ParseOptions};
use log::{debug, warn};
use std::collections::HashMap;
use std::io::Cursor;

/// An image persisted to the media store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub seq: u32,
    /// Reference returned by the store
    pub url: String,
    /// Intrinsic pixel width, when the raster could be read
    pub width: Option<u32>,
    /// Intrinsic pixel height
    pub height: Option<u32>,
}

/// An extracted data table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTable {
    /// The `n` of `TABLE_<n>`
    pub id: usize,
    /// Rendered image reference, when a renderer succeeded
    pub url: Option<String>,
    /// HTML rendering
    pub html: String,
}

/// What the linker may attach, per parse call.
#[derive(Debug, Clone, Default)]
pub struct MediaInventory {
    images: HashMap<u32, StoredImage>,
    tables: HashMap<usize, StoredTable>,
    /// Items dropped by filters or failed collaborators
    pub skipped: u32,
}

impl MediaInventory {
    pub fn image(&self, seq: u32) -> Option<&StoredImage> {
        self.images.get(&seq)
    }

    pub fn table(&self, id: usize) -> Option<&StoredTable> {
        self.tables.get(&id)
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn insert_image(&mut self, image: StoredImage) {
        self.images.insert(image.seq, image);
    }

    pub fn insert_table(&mut self, table: StoredTable) {
        self.tables.insert(table.id, table);
    }
}

/// Media referenced by the segmented questions.
#[derive(Debug, Clone, Default)]
pub struct MediaRequest {
    /// Image sequence numbers, in first-reference order
    pub images: Vec<u32>,
    /// Table ids
    pub tables: Vec<usize>,
}

/// Persist requested images and render requested tables.
///
/// `tables[n - 1]` is the table behind `TABLE_<n>`. In lenient mode a failing
/// collaborator only drops the affected item; in strict mode it fails the call.
pub fn extract_media(
    doc: &Document,
    tables: &[Table],
    request: &MediaRequest,
    collaborators: &Collaborators,
    options: &ParseOptions,
) -> Result<MediaInventory> {
    let mut inventory = MediaInventory::default();
    let previews = doc.equation_previews();

    for &seq in &request.images {
        if inventory.image(seq).is_some() {
            continue;
        }
        let Some(part) = doc.media_part(seq) else {
            warn!("IMAGE_{} has no media part", seq);
            inventory.skipped += 1;
            continue;
        };
        let keep_small = previews.contains(&seq);
        match store_image(part, keep_small, collaborators, options) {
            Ok(Some(image)) => inventory.insert_image(image),
            Ok(None) => inventory.skipped += 1,
            Err(e) if options.error_mode == ErrorMode::Lenient => {
                warn!("Skipping {}: {}", part.name, e);
                inventory.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    for &id in &request.tables {
        let Some(table) = id.checked_sub(1).and_then(|i| tables.get(i)) else {
            continue;
        };
        let asset = TableAsset::from_table(id, table);
        let url = match render_table(&asset, collaborators) {
            Ok(url) => url,
            Err(e) if options.error_mode == ErrorMode::Lenient => {
                warn!("Table {} left unrendered: {}", id, e);
                inventory.skipped += 1;
                None
            }
            Err(e) => return Err(e),
        };
        inventory.insert_table(StoredTable {
            id,
            url,
            html: asset.html,
        });
    }

    debug!(
        "Media: {} images stored, {} tables, {} skipped",
        inventory.image_count(),
        inventory.table_count(),
        inventory.skipped
    );
    Ok(inventory)
}

/// `Ok(None)` when the image is filtered out or cannot be converted.
///
/// `keep_small` exempts equation previews from the byte-size filter.
fn store_image(
    part: &MediaPart,
    keep_small: bool,
    collaborators: &Collaborators,
    options: &ParseOptions,
) -> Result<Option<StoredImage>> {
    let (data, name) = match part.format {
        MediaFormat::Raster => {
            if !keep_small && options.min_image_bytes > 0 && part.size() < options.min_image_bytes {
                debug!("{} below {} bytes, dropped", part.name, options.min_image_bytes);
                return Ok(None);
            }
            (part.data.clone(), part.suggested_filename())
        }
        MediaFormat::Vector => {
            let Some(rasterizer) = &collaborators.rasterizer else {
                warn!("No rasterizer for vector image {}", part.name);
                return Ok(None);
            };
            let png = rasterizer.rasterize(&part.data, part.extension())?;
            (png, format!("image{}.png", part.seq))
        }
        MediaFormat::Other => {
            debug!("{} is not an image ({})", part.name, part.mime_type);
            return Ok(None);
        }
    };

    let (width, height) = match intrinsic_dimensions(&data) {
        Some((w, h)) => (Some(w), Some(h)),
        None => (None, None),
    };
    let url = collaborators.store.store(&data, &name)?;
    Ok(Some(StoredImage {
        seq: part.seq,
        url,
        width,
        height,
    }))
}

fn render_table(asset: &TableAsset, collaborators: &Collaborators) -> Result<Option<String>> {
    let Some(renderer) = &collaborators.table_renderer else {
        return Ok(None);
    };
    let png = renderer.render(asset)?;
    let url = collaborators
        .store
        .store(&png, &format!("table{}.png", asset.id))?;
    Ok(Some(url))
}

/// Pixel size read from the image header.
pub(crate) fn intrinsic_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::media::{MemoryMediaStore, TableRenderer, VectorRasterizer};
    use crate::model::{Block, ImageRef, Paragraph, TableCell, TableRow};
    use std::sync::Arc;

    /// Smallest valid PNG: 1x1 RGBA.
    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    const WMF: &[u8] = &[0xD7, 0xCD, 0xC6, 0x9A, 0, 0, 0, 0];

    struct FailingRasterizer;

    impl VectorRasterizer for FailingRasterizer {
        fn rasterize(&self, _data: &[u8], _format_hint: &str) -> Result<Vec<u8>> {
            Err(Error::collaborator("vector rasterizer", "boom"))
        }
    }

    struct PngRasterizer;

    impl VectorRasterizer for PngRasterizer {
        fn rasterize(&self, _data: &[u8], format_hint: &str) -> Result<Vec<u8>> {
            assert_eq!(format_hint, "wmf");
            Ok(PNG_1X1.to_vec())
        }
    }

    struct EchoRenderer;

    impl TableRenderer for EchoRenderer {
        fn render(&self, table: &TableAsset) -> Result<Vec<u8>> {
            Ok(table.html.clone().into_bytes())
        }
    }

    fn doc() -> Document {
        Document::from_blocks(Vec::new()).with_media(vec![
            MediaPart::new(1, "word/media/image1.png", PNG_1X1.to_vec()),
            MediaPart::new(2, "word/media/image2.wmf", WMF.to_vec()),
        ])
    }

    fn request(images: &[u32]) -> MediaRequest {
        MediaRequest {
            images: images.to_vec(),
            tables: Vec::new(),
        }
    }

    #[test]
    fn test_raster_stored_with_dimensions() {
        let store = Arc::new(MemoryMediaStore::new());
        let collaborators = Collaborators::new(store.clone());
        let inventory = extract_media(
            &doc(),
            &[],
            &request(&[1, 1]),
            &collaborators,
            &ParseOptions::default(),
        )
        .unwrap();
        let image = inventory.image(1).unwrap();
        assert_eq!((image.width, image.height), (Some(1), Some(1)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&image.url).as_deref(), Some(PNG_1X1));
    }

    #[test]
    fn test_vector_needs_rasterizer() {
        let collaborators = Collaborators::default();
        let inventory =
            extract_media(&doc(), &[], &request(&[2]), &collaborators, &ParseOptions::default()).unwrap();
        assert!(inventory.image(2).is_none());
        assert_eq!(inventory.skipped, 1);

        let collaborators = Collaborators::default().with_rasterizer(Arc::new(PngRasterizer));
        let inventory =
            extract_media(&doc(), &[], &request(&[2]), &collaborators, &ParseOptions::default()).unwrap();
        assert!(inventory.image(2).unwrap().url.ends_with("image2.png"));
    }

    #[test]
    fn test_lenient_and_strict_failures() {
        let collaborators = Collaborators::default().with_rasterizer(Arc::new(FailingRasterizer));
        let inventory = extract_media(
            &doc(),
            &[],
            &request(&[1, 2]),
            &collaborators,
            &ParseOptions::default(),
        )
        .unwrap();
        assert!(inventory.image(1).is_some());
        assert_eq!(inventory.skipped, 1);

        let result = extract_media(
            &doc(),
            &[],
            &request(&[2]),
            &collaborators,
            &ParseOptions::default().strict(),
        );
        assert!(matches!(result, Err(Error::Collaborator { .. })));
    }

    #[test]
    fn test_small_images_filtered() {
        let options = ParseOptions::default().with_min_image_bytes(1024);
        let inventory =
            extract_media(&doc(), &[], &request(&[1]), &Collaborators::default(), &options).unwrap();
        assert!(inventory.image(1).is_none());
        assert_eq!(inventory.skipped, 1);

        let mut preview = ImageRef::new(1);
        preview.equation = true;
        let mut p = Paragraph::new();
        p.add_image(preview);
        let with_preview = Document::from_blocks(vec![Block::Paragraph(p)]).with_media(doc().media);
        let inventory =
            extract_media(&with_preview, &[], &request(&[1]), &Collaborators::default(), &options).unwrap();
        assert!(inventory.image(1).is_some());
    }

    #[test]
    fn test_tables_rendered_or_left_as_html() {
        let mut table = Table::new();
        table.add_row(TableRow::new(vec![TableCell::with_text("x")]));
        let tables = vec![table];
        let request = MediaRequest {
            images: Vec::new(),
            tables: vec![1, 5],
        };

        let plain = extract_media(&doc(), &tables, &request, &Collaborators::default(), &ParseOptions::default())
            .unwrap();
        let stored = plain.table(1).unwrap();
        assert!(stored.url.is_none());
        assert!(stored.html.contains("<td>x</td>"));
        assert!(plain.table(5).is_none());

        let collaborators = Collaborators::default().with_table_renderer(Arc::new(EchoRenderer));
        let rendered =
            extract_media(&doc(), &tables, &request, &collaborators, &ParseOptions::default()).unwrap();
        assert_eq!(
            rendered.table(1).and_then(|t| t.url.as_deref()),
            Some("memory://1/table1.png")
        );
    }
}
