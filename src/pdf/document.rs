//! The document model the compression pipelines drive
//!
//! Pages and images are addressed by position only. A backend reports what it
//! can do once, up front, through [`Capabilities`]; the pipelines consult that
//! descriptor instead of probing individual operations.

use std::path::Path;

use crate::error::{PdfError, StageError};

use super::dedup::DedupStats;

/// Operations a backend supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whole-document content stream compression
    pub content_compression: bool,
    /// Per-page content stream compression at a chosen level
    pub page_compression: bool,
    /// Lossy re-encoding of embedded raster images
    pub image_recompression: bool,
    /// Merging of identical objects and removal of unreferenced ones
    pub deduplication: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            content_compression: true,
            page_compression: true,
            image_recompression: true,
            deduplication: true,
        }
    }

    pub fn none() -> Self {
        Self {
            content_compression: false,
            page_compression: false,
            image_recompression: false,
            deduplication: false,
        }
    }
}

/// Opens documents.
pub trait PdfBackend {
    type Document: PdfDocument;

    fn capabilities(&self) -> Capabilities;

    /// Parse `path` and copy its pages, in order, into a fresh document.
    fn load_pages(&self, path: &Path) -> Result<Self::Document, PdfError>;

    /// Parse `path` keeping its whole object graph.
    fn clone_document(&self, path: &Path) -> Result<Self::Document, PdfError>;
}

/// An open, mutable PDF document.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    /// Compress the content streams of every page.
    fn compress_content_streams(&mut self) -> Result<(), StageError>;

    /// Compress the content streams of one page at a flate `level`.
    fn compress_page(&mut self, page: usize, level: u32) -> Result<(), StageError>;

    /// Number of raster images reachable from a page's resources.
    fn image_count(&self, page: usize) -> Result<usize, StageError>;

    /// Re-encode one image of a page as JPEG at `quality` (0-100).
    fn recompress_image(&mut self, page: usize, image: usize, quality: u8)
        -> Result<(), StageError>;

    fn remove_identical_objects(&mut self) -> Result<DedupStats, StageError>;

    /// Write the document, replacing any existing file. Returns the size written.
    fn save(&mut self, path: &Path) -> Result<u64, PdfError>;
}
