use clap::Parser;

use chem_pdf_tools::cli::{init_logging, RenderArgs};
use chem_pdf_tools::config::DrawSettings;
use chem_pdf_tools::render::{ensure_xml_declaration, smiles_to_svg};

fn main() {
    let args = RenderArgs::parse();

    init_logging(args.verbose);

    let settings = DrawSettings::from_args(&args);
    match smiles_to_svg(&args.smiles, &settings) {
        Ok(svg) => println!("{}", ensure_xml_declaration(svg)),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    }
}
