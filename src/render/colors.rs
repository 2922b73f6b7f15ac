use crate::model::Element;

/// Color provider for atom labels and bond halves
#[derive(Debug, Clone)]
pub struct AtomPalette {
    pub default: &'static str,
    pub nitrogen: &'static str,
    pub oxygen: &'static str,
    pub fluorine: &'static str,
    pub phosphorus: &'static str,
    pub sulfur: &'static str,
    pub chlorine: &'static str,
    pub bromine: &'static str,
    pub iodine: &'static str,
    pub boron: &'static str,
    /// Any other heteroatom
    pub other: &'static str,
}

impl Default for AtomPalette {
    fn default() -> Self {
        Self {
            default: BLACK,
            nitrogen: "#0000FF",
            oxygen: "#FF0000",
            fluorine: "#33CCCC",
            phosphorus: "#FF7F00",
            sulfur: "#CCCC00",
            chlorine: "#00CC00",
            bromine: "#7F4C19",
            iodine: "#A01EEF",
            boron: "#FFB5B5",
            other: "#7F7F7F",
        }
    }
}

impl AtomPalette {
    /// All-black palette
    pub fn monochrome() -> Self {
        Self {
            default: BLACK,
            nitrogen: BLACK,
            oxygen: BLACK,
            fluorine: BLACK,
            phosphorus: BLACK,
            sulfur: BLACK,
            chlorine: BLACK,
            bromine: BLACK,
            iodine: BLACK,
            boron: BLACK,
            other: BLACK,
        }
    }

    pub fn for_element(&self, element: Element) -> &'static str {
        match element {
            Element::WILDCARD | Element::HYDROGEN | Element::CARBON => self.default,
            Element::NITROGEN => self.nitrogen,
            Element::OXYGEN => self.oxygen,
            Element::FLUORINE => self.fluorine,
            Element::PHOSPHORUS => self.phosphorus,
            Element::SULFUR => self.sulfur,
            Element::CHLORINE => self.chlorine,
            Element::BROMINE => self.bromine,
            Element::IODINE => self.iodine,
            Element::BORON => self.boron,
            _ => self.other,
        }
    }
}

pub const BLACK: &str = "#000000";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heteroatoms_colored() {
        let palette = AtomPalette::default();
        assert_eq!(palette.for_element(Element::CARBON), BLACK);
        assert_eq!(palette.for_element(Element::OXYGEN), "#FF0000");
        assert_eq!(palette.for_element(Element::NITROGEN), "#0000FF");
        let xenon = Element::from_symbol("Xe").unwrap();
        assert_eq!(palette.for_element(xenon), palette.other);
    }

    #[test]
    fn test_monochrome() {
        let palette = AtomPalette::monochrome();
        assert_eq!(palette.for_element(Element::SULFUR), BLACK);
    }
}
