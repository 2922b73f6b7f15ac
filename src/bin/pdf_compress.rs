use anyhow::{Context, Result};
use clap::Parser;

use chem_pdf_tools::cli::{init_logging, is_non_numeric_value, ExtendedCompressArgs};
use chem_pdf_tools::config::CompressOptions;
use chem_pdf_tools::pdf::{compress_extended, LopdfBackend};

fn main() -> Result<()> {
    let args = match ExtendedCompressArgs::try_parse() {
        Ok(args) => args,
        Err(e) if is_non_numeric_value(&e) => {
            // A quality that is not an integer fails like any other runtime error
            eprint!("{}", e);
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    init_logging(args.verbose);

    let options = CompressOptions::from_args(&args);
    let report = compress_extended(&LopdfBackend::new(), &args.input, &args.output, &options)
        .with_context(|| format!("Failed to compress {}", args.input.display()))?;

    log::info!("{}", report.summary());

    Ok(())
}
