use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;

use chem_pdf_tools::cli::{init_logging, CompressArgs};
use chem_pdf_tools::pdf::{compress_basic, LopdfBackend};

fn main() -> Result<()> {
    let args = match CompressArgs::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // Wrong argument count is a plain usage error here
            eprint!("{}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.verbose);

    let report = compress_basic(&LopdfBackend::new(), &args.input, &args.output)
        .with_context(|| format!("Failed to compress {}", args.input.display()))?;

    log::info!("{}", report.summary());

    Ok(())
}
