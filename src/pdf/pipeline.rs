//! Compression pipelines
//!
//! Both pipelines run synchronously and own their document from load to
//! write. Only opening the source and writing the destination can fail a run;
//! every stage in between is best effort, and its outcome is recorded in the
//! returned [`CompressionReport`] and logged rather than raised.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::config::CompressOptions;
use crate::error::{PdfError, StageError};

use super::document::{Capabilities, PdfBackend, PdfDocument};

/// Best-effort steps of a pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ContentCompression,
    PageCompression,
    ImageRecompression,
    Deduplication,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ContentCompression => "content streams",
            Stage::PageCompression => "lossless",
            Stage::ImageRecompression => "images",
            Stage::Deduplication => "dedup",
        };
        f.write_str(name)
    }
}

/// Per-item counts of a stage that touches pages, images or objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: usize,
    pub failed: usize,
    pub unsupported: usize,
}

impl Tally {
    fn record(&mut self, result: Result<(), StageError>, what: fmt::Arguments<'_>) {
        match result {
            Ok(()) => self.succeeded += 1,
            Err(StageError::Unsupported(reason)) => {
                log::debug!("{}: skipped, {}", what, reason);
                self.unsupported += 1;
            }
            Err(StageError::Failed(reason)) => {
                log::info!("{}: failed, {}", what, reason);
                self.failed += 1;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotRequested,
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Applied(Tally),
    Skipped(SkipReason),
    Failed(String),
}

impl StageOutcome {
    fn from_result(result: Result<Tally, StageError>) -> Self {
        match result {
            Ok(tally) => StageOutcome::Applied(tally),
            Err(StageError::Unsupported(reason)) => {
                StageOutcome::Skipped(SkipReason::Unsupported(reason))
            }
            Err(StageError::Failed(reason)) => StageOutcome::Failed(reason),
        }
    }

    fn unavailable() -> Self {
        StageOutcome::Skipped(SkipReason::Unsupported(
            "not supported by this backend".to_string(),
        ))
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Applied(t) if t.failed == 0 && t.unsupported == 0 => {
                write!(f, "{} ok", t.succeeded)
            }
            StageOutcome::Applied(t) => write!(
                f,
                "{} ok, {} failed, {} unsupported",
                t.succeeded, t.failed, t.unsupported
            ),
            StageOutcome::Skipped(SkipReason::NotRequested) => f.write_str("off"),
            StageOutcome::Skipped(SkipReason::Unsupported(_)) => f.write_str("unsupported"),
            StageOutcome::Failed(_) => f.write_str("failed"),
        }
    }
}

/// What a pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionReport {
    pub pages: usize,
    pub stages: Vec<(Stage, StageOutcome)>,
    pub bytes_written: u64,
}

impl CompressionReport {
    fn new(pages: usize) -> Self {
        Self {
            pages,
            stages: Vec::new(),
            bytes_written: 0,
        }
    }

    fn record(&mut self, stage: Stage, outcome: StageOutcome) {
        match &outcome {
            StageOutcome::Failed(reason) => log::info!("Stage {}: failed, {}", stage, reason),
            StageOutcome::Skipped(SkipReason::Unsupported(reason)) => {
                log::debug!("Stage {}: skipped, {}", stage, reason)
            }
            other => log::debug!("Stage {}: {}", stage, other),
        }
        self.stages.push((stage, outcome));
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, outcome)| outcome)
    }

    /// One line for the command line tools.
    pub fn summary(&self) -> String {
        let stages: Vec<String> = self
            .stages
            .iter()
            .map(|(stage, outcome)| format!("{}: {}", stage, outcome))
            .collect();
        format!(
            "{} pages, {} bytes written ({})",
            self.pages,
            self.bytes_written,
            stages.join("; ")
        )
    }
}

/// Copy every page of `input` into a fresh document, compress its content
/// streams and write it to `output`, replacing any existing file.
pub fn compress_basic<B: PdfBackend>(
    backend: &B,
    input: &Path,
    output: &Path,
) -> Result<CompressionReport, PdfError> {
    let capabilities = backend.capabilities();
    log::debug!("Start: {}", input.display());

    let mut doc = backend.load_pages(input)?;
    let mut report = CompressionReport::new(doc.page_count());
    log::debug!("Loaded: {} pages", report.pages);

    let outcome = if capabilities.content_compression {
        let pages = report.pages;
        StageOutcome::from_result(doc.compress_content_streams().map(|()| Tally {
            succeeded: pages,
            ..Tally::default()
        }))
    } else {
        StageOutcome::unavailable()
    };
    report.record(Stage::ContentCompression, outcome);

    report.bytes_written = doc.save(output)?;
    log::debug!("Written: {}", output.display());
    Ok(report)
}

/// Structure-preserving compression of `input` into `output`, creating the
/// destination's parent directories as needed.
pub fn compress_extended<B: PdfBackend>(
    backend: &B,
    input: &Path,
    output: &Path,
    options: &CompressOptions,
) -> Result<CompressionReport, PdfError> {
    let capabilities = backend.capabilities();
    log::debug!("Start: {} with {:?}", input.display(), options);

    let mut doc = backend.clone_document(input)?;
    let mut report = CompressionReport::new(doc.page_count());
    log::debug!("Loaded: {} pages", report.pages);

    let outcome = compress_pages(&mut doc, &capabilities, options);
    report.record(Stage::PageCompression, outcome);

    let outcome = recompress_images(&mut doc, &capabilities, options);
    report.record(Stage::ImageRecompression, outcome);

    let outcome = if !options.deduplicate {
        StageOutcome::Skipped(SkipReason::NotRequested)
    } else if !capabilities.deduplication {
        StageOutcome::unavailable()
    } else {
        StageOutcome::from_result(doc.remove_identical_objects().map(|stats| {
            log::debug!(
                "Merged {} objects, removed {} orphans",
                stats.merged,
                stats.orphans_removed
            );
            Tally {
                succeeded: stats.merged + stats.orphans_removed,
                ..Tally::default()
            }
        }))
    };
    report.record(Stage::Deduplication, outcome);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PdfError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    report.bytes_written = doc.save(output)?;
    log::debug!("Written: {}", output.display());
    Ok(report)
}

fn compress_pages<D: PdfDocument>(
    doc: &mut D,
    capabilities: &Capabilities,
    options: &CompressOptions,
) -> StageOutcome {
    if !options.lossless {
        return StageOutcome::Skipped(SkipReason::NotRequested);
    }
    if !capabilities.page_compression {
        return StageOutcome::unavailable();
    }
    let mut tally = Tally::default();
    for page in 0..doc.page_count() {
        let result = doc.compress_page(page, options.compression_level);
        tally.record(result, format_args!("Page {}", page + 1));
    }
    StageOutcome::Applied(tally)
}

fn recompress_images<D: PdfDocument>(
    doc: &mut D,
    capabilities: &Capabilities,
    options: &CompressOptions,
) -> StageOutcome {
    let Some(quality) = options.image_quality else {
        return StageOutcome::Skipped(SkipReason::NotRequested);
    };
    if !capabilities.image_recompression {
        return StageOutcome::unavailable();
    }
    let mut tally = Tally::default();
    for page in 0..doc.page_count() {
        let count = match doc.image_count(page) {
            Ok(count) => count,
            Err(e) => {
                // The page's images are left alone.
                tally.record(Err(e), format_args!("Page {} images", page + 1));
                continue;
            }
        };
        for image in 0..count {
            let result = doc.recompress_image(page, image, quality);
            tally.record(result, format_args!("Page {} image {}", page + 1, image + 1));
        }
    }
    StageOutcome::Applied(tally)
}
