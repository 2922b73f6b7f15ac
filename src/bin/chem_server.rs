use anyhow::{Context, Result};
use clap::Parser;

use chem_pdf_tools::cli::{init_logging, ServeArgs};
use chem_pdf_tools::config::ServerSettings;
use chem_pdf_tools::server::serve;

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServeArgs::parse();

    init_logging(args.verbose);

    let settings = ServerSettings::from_args(&args);
    serve(&settings)
        .await
        .with_context(|| format!("Server on {} failed", settings.bind_address()))?;

    Ok(())
}
