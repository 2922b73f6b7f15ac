//! 2D depiction of molecules as SVG

pub mod colors;
pub mod geometry;
pub mod layout;
pub mod svg;

pub use colors::AtomPalette;
pub use layout::{compute_layout, Layout};
pub use svg::{draw_svg, SvgDrawer};

use crate::config::DrawSettings;
use crate::error::RenderError;
use crate::parser::parse_smiles;

/// Declaration prepended to SVG output that lacks one
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Parse a SMILES string, lay it out and draw it.
pub fn smiles_to_svg(smiles: &str, settings: &DrawSettings) -> Result<String, RenderError> {
    if settings.width == 0 || settings.height == 0 {
        return Err(RenderError::InvalidSize {
            width: settings.width,
            height: settings.height,
        });
    }
    let mol = parse_smiles(smiles)?;
    let layout = compute_layout(&mol);
    log::debug!(
        "Depicting {} atoms, {} bonds, {} rings at {}x{}",
        mol.atom_count(),
        mol.bond_count(),
        layout.rings.len(),
        settings.width,
        settings.height
    );
    draw_svg(&mol, &layout, settings)
}

/// Make sure an SVG document starts with an XML declaration.
pub fn ensure_xml_declaration(svg: String) -> String {
    if svg.trim_start().starts_with("<?xml") {
        svg
    } else {
        format!("{}\n{}", XML_DECLARATION, svg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SmilesError;

    #[test]
    fn test_smiles_to_svg() {
        let svg = smiles_to_svg("CCO", &DrawSettings::default()).unwrap();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_invalid_smiles() {
        let err = smiles_to_svg("zzz", &DrawSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidSmiles(SmilesError::UnexpectedChar { ch: 'z', position: 0 })
        ));
        assert!(err.to_string().starts_with("Invalid SMILES"));
    }

    #[test]
    fn test_invalid_size_checked_before_parsing() {
        let err = smiles_to_svg("zzz", &DrawSettings::with_size(400, 0)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidSize { .. }));
    }

    #[test]
    fn test_ensure_xml_declaration() {
        let bare = "<svg></svg>".to_string();
        let fixed = ensure_xml_declaration(bare);
        assert!(fixed.starts_with(XML_DECLARATION));
        assert!(fixed.ends_with("<svg></svg>"));

        let declared = "<?xml version='1.0'?><svg/>".to_string();
        assert_eq!(ensure_xml_declaration(declared.clone()), declared);
    }

    #[test]
    fn test_disconnected_structures() {
        let svg = smiles_to_svg("[Na+].[Cl-]", &DrawSettings::default()).unwrap();
        assert_eq!(svg.matches("<text").count(), 2);
    }
}
