pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod pdf;
pub mod render;
pub mod server;

use std::path::Path;

pub use config::{CompressOptions, DrawSettings, ServerSettings};
pub use error::{PdfError, RenderError, SmilesError, StageError};
pub use model::Molecule;
pub use parser::parse_smiles;
pub use pdf::{CompressionReport, LopdfBackend};
pub use render::{ensure_xml_declaration, smiles_to_svg};

/// High-level API for shrinking a PDF file.
///
/// Opens `input` with the lopdf backend and runs the extended pipeline:
/// per-page content stream compression, optional JPEG re-encoding of images,
/// then merging of identical objects. Stage failures are recorded in the
/// returned report; only reading `input` or writing `output` can fail.
///
/// # Example
///
/// ```no_run
/// use chem_pdf_tools::{compress_file, CompressOptions};
///
/// let options = CompressOptions {
///     image_quality: Some(60),
///     ..CompressOptions::default()
/// };
/// let report = compress_file("scan.pdf".as_ref(), "out/scan.pdf".as_ref(), &options).unwrap();
/// println!("{}", report.summary());
/// ```
pub fn compress_file(
    input: &Path,
    output: &Path,
    options: &CompressOptions,
) -> Result<CompressionReport, PdfError> {
    pdf::compress_extended(&LopdfBackend::new(), input, output, options)
}
