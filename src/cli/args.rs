use clap::Parser;
use std::path::PathBuf;

use crate::config::defaults::{
    DEFAULT_HEIGHT, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_WIDTH, MAX_COMPRESSION_LEVEL,
};

/// Arguments of the basic compressor
#[derive(Parser, Debug)]
#[command(name = "compress_pdf")]
#[command(
    author,
    version,
    about = "Copy every page of a PDF into a new document and compress its content streams"
)]
pub struct CompressArgs {
    /// Source PDF file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Destination PDF file (overwritten if present)
    #[arg(required = true)]
    pub output: PathBuf,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Arguments of the extended compressor
#[derive(Parser, Debug)]
#[command(name = "pdf_compress")]
#[command(
    author,
    version,
    about = "Compress a PDF in place of its structure: content streams, images and duplicate objects"
)]
pub struct ExtendedCompressArgs {
    /// Source PDF file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Destination PDF file; missing parent directories are created
    #[arg(required = true)]
    pub output: PathBuf,

    /// Re-encode embedded images as JPEG at this quality (0-100)
    #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
    pub image_quality: Option<u8>,

    /// Skip lossless content stream compression
    #[arg(long)]
    pub no_lossless: bool,

    /// Skip duplicate and orphan object removal
    #[arg(long)]
    pub no_dedup: bool,

    /// Flate compression level for content streams (1-9)
    #[arg(long, default_value_t = MAX_COMPRESSION_LEVEL, value_parser = clap::value_parser!(u32).range(1..=9))]
    pub level: u32,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Arguments of the SMILES renderer
#[derive(Parser, Debug)]
#[command(name = "render")]
#[command(author, version, about = "Render a SMILES string as an SVG depiction on stdout")]
pub struct RenderArgs {
    /// Molecule in SMILES notation
    #[arg(required = true)]
    pub smiles: String,

    /// Image width in pixels
    #[arg(default_value_t = DEFAULT_WIDTH)]
    pub width: u32,

    /// Image height in pixels
    #[arg(default_value_t = DEFAULT_HEIGHT)]
    pub height: u32,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Arguments of the HTTP depiction service
#[derive(Parser, Debug)]
#[command(name = "chem_server")]
#[command(author, version, about = "HTTP service rendering SMILES strings as SVG")]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
