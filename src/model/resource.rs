//! Embedded media parts (images inside the document container).

use serde::{Deserialize, Serialize};

/// An embedded media part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPart {
    /// Media sequence number (the `n` of `IMAGE_<n>`)
    pub seq: u32,

    /// Part name inside the container (e.g. "word/media/image3.png")
    pub name: String,

    /// Raw binary data
    #[serde(skip_serializing, default)]
    pub data: Vec<u8>,

    /// MIME type (e.g., "image/png")
    pub mime_type: String,

    /// Raster or vector
    pub format: MediaFormat,
}

impl MediaPart {
    /// Create a media part, detecting its MIME type from content then name.
    pub fn new(seq: u32, name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = Self::detect_mime_type(&data)
            .or_else(|| Self::mime_from_name(&name))
            .unwrap_or("application/octet-stream")
            .to_string();
        let format = MediaFormat::from_mime(&mime_type);
        Self {
            seq,
            name,
            data,
            mime_type,
            format,
        }
    }

    /// Get the size of the part data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Legacy vector formats that need rasterizing before display.
    pub fn is_vector(&self) -> bool {
        self.format == MediaFormat::Vector
    }

    /// Whether this part is a displayable raster image.
    pub fn is_raster(&self) -> bool {
        self.format == MediaFormat::Raster
    }

    /// File name component of the part name.
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Get a suggested filename based on sequence number and type.
    pub fn suggested_filename(&self) -> String {
        format!("image{}.{}", self.seq, self.extension())
    }

    /// Get the file extension based on MIME type.
    pub fn extension(&self) -> &str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/tiff" => "tiff",
            "image/bmp" => "bmp",
            "image/webp" => "webp",
            "image/wmf" => "wmf",
            "image/emf" => "emf",
            "image/svg+xml" => "svg",
            _ => "bin",
        }
    }

    /// Sequence number encoded in a media part name (`image12.png` → 12).
    pub fn sequence_from_name(name: &str) -> Option<u32> {
        let file = name.rsplit('/').next()?;
        let stem = file.split('.').next()?;
        let digits: String = stem
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        digits.parse().ok()
    }

    fn mime_from_name(name: &str) -> Option<&'static str> {
        let ext = name.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "gif" => Some("image/gif"),
            "bmp" => Some("image/bmp"),
            "tif" | "tiff" => Some("image/tiff"),
            "webp" => Some("image/webp"),
            "wmf" => Some("image/wmf"),
            "emf" => Some("image/emf"),
            "svg" => Some("image/svg+xml"),
            _ => None,
        }
    }

    /// Detect MIME type from magic bytes.
    pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
        if data.len() < 4 {
            return None;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some("image/jpeg");
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some("image/png");
        }

        // GIF: GIF87a or GIF89a
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some("image/gif");
        }

        // TIFF: little-endian or big-endian
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some("image/tiff");
        }

        // BMP: BM
        if data.starts_with(b"BM") {
            return Some("image/bmp");
        }

        // WMF: placeable header, or standard memory/disk metafile header
        if data.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A])
            || data.starts_with(&[0x01, 0x00, 0x09, 0x00])
            || data.starts_with(&[0x02, 0x00, 0x09, 0x00])
        {
            return Some("image/wmf");
        }

        // EMF: EMR_HEADER record with " EMF" signature at offset 40
        if data.len() >= 44 && data.starts_with(&[0x01, 0x00, 0x00, 0x00]) && &data[40..44] == b" EMF"
        {
            return Some("image/emf");
        }

        None
    }
}

/// Broad class of a media part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    /// PNG, JPEG, GIF, BMP, ...
    Raster,
    /// WMF / EMF
    Vector,
    /// Anything else (OLE payloads, SVG, unknown)
    Other,
}

impl MediaFormat {
    fn from_mime(mime: &str) -> Self {
        match mime {
            "image/wmf" | "image/emf" => MediaFormat::Vector,
            "image/svg+xml" => MediaFormat::Other,
            m if m.starts_with("image/") => MediaFormat::Raster,
            _ => MediaFormat::Other,
        }
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaFormat::Raster => write!(f, "raster"),
            MediaFormat::Vector => write!(f, "vector"),
            MediaFormat::Other => write!(f, "other"),
        }
    }
}
