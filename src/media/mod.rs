//! Embedded media: collaborators, extraction and linking.
//!
//! Rasterizing legacy vector images, rendering tables and storing binaries
//! are external concerns. They are reached through the traits below so the
//! pipeline stays free of I/O policy.
//!
//! # Example
//!
//! ```no_run
//! use unquiz::media::{Collaborators, CommandRasterizer, FsMediaStore};
//! use std::sync::Arc;
//!
//! let collaborators = Collaborators::new(Arc::new(FsMediaStore::new("uploads")))
//!     .with_rasterizer(Arc::new(CommandRasterizer::new("inkscape")));
//! ```

mod external;
mod extract;
mod link;
mod store;
mod table;

pub use external::{CommandRasterizer, CommandTableRenderer};
pub use extract::{extract_media, MediaInventory, MediaRequest, StoredImage, StoredTable};
pub use link::{media_tokens, Linker, MediaToken, ScanRule};
pub use store::{FsMediaStore, MemoryMediaStore};
pub use table::{table_html, TableAsset};

use crate::error::Result;
use crate::model::Document;
use std::collections::HashMap;
use std::sync::Arc;

/// Converts legacy vector images (WMF/EMF) to PNG.
pub trait VectorRasterizer: Send + Sync {
    /// Rasterize `data`; `format_hint` is the source extension (`wmf`, `emf`).
    fn rasterize(&self, data: &[u8], format_hint: &str) -> Result<Vec<u8>>;
}

/// Renders an extracted table to a PNG image.
pub trait TableRenderer: Send + Sync {
    fn render(&self, table: &TableAsset) -> Result<Vec<u8>>;
}

/// Persists binaries and hands back a stable reference.
///
/// Implementations must tolerate concurrent calls from parallel parses.
pub trait MediaStore: Send + Sync {
    fn store(&self, data: &[u8], suggested_name: &str) -> Result<String>;
}

/// Identifies images that are renderings of formulas.
pub trait EquationExtractor: Send + Sync {
    /// Map of media sequence number to math source.
    fn extract(&self, doc: &Document) -> HashMap<u32, String>;
}

/// The set of collaborators one parse may call.
#[derive(Clone)]
pub struct Collaborators {
    /// Media store (required)
    pub store: Arc<dyn MediaStore>,

    /// Vector-to-raster converter; vector images are skipped without one
    pub rasterizer: Option<Arc<dyn VectorRasterizer>>,

    /// Table renderer; tables stay unrendered without one
    pub table_renderer: Option<Arc<dyn TableRenderer>>,

    /// Formula image detector
    pub equations: Option<Arc<dyn EquationExtractor>>,
}

impl Collaborators {
    /// Create collaborators around a media store.
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self {
            store,
            rasterizer: None,
            table_renderer: None,
            equations: None,
        }
    }

    /// Set the vector rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn VectorRasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Set the table renderer.
    pub fn with_table_renderer(mut self, renderer: Arc<dyn TableRenderer>) -> Self {
        self.table_renderer = Some(renderer);
        self
    }

    /// Set the equation extractor.
    pub fn with_equation_extractor(mut self, equations: Arc<dyn EquationExtractor>) -> Self {
        self.equations = Some(equations);
        self
    }

    /// Formula images reported by the equation extractor, if any.
    pub fn equation_sources(&self, doc: &Document) -> HashMap<u32, String> {
        self.equations
            .as_ref()
            .map(|e| e.extract(doc))
            .unwrap_or_default()
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::new(Arc::new(MemoryMediaStore::new()))
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("rasterizer", &self.rasterizer.is_some())
            .field("table_renderer", &self.table_renderer.is_some())
            .field("equations", &self.equations.is_some())
            .finish_non_exhaustive()
    }
}
