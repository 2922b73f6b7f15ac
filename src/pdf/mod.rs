//! PDF size reduction
//!
//! The pipelines in [`pipeline`] are written against the [`PdfBackend`] /
//! [`PdfDocument`] traits; [`LopdfBackend`] is the implementation the tools use.

pub mod dedup;
pub mod document;
pub mod images;
pub mod lopdf_backend;
pub mod pipeline;

pub use dedup::DedupStats;
pub use document::{Capabilities, PdfBackend, PdfDocument};
pub use lopdf_backend::{LopdfBackend, LopdfDocument};
pub use pipeline::{
    compress_basic, compress_extended, CompressionReport, SkipReason, Stage, StageOutcome, Tally,
};
