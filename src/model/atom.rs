use std::fmt;

use super::element::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Chirality {
    #[default]
    None,
    /// `@`
    AntiClockwise,
    /// `@@`
    Clockwise,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub element: Element,
    pub aromatic: bool,
    /// Written inside `[...]`; bracket atoms never get implicit hydrogens.
    pub bracket: bool,
    pub isotope: Option<u16>,
    pub charge: i8,
    /// Hydrogen count given in a bracket atom (`[NH4+]`).
    pub explicit_hydrogens: u8,
    pub chirality: Chirality,
    pub class: Option<u32>,
}

impl Atom {
    /// An unbracketed organic-subset atom.
    pub fn organic(element: Element, aromatic: bool) -> Self {
        Self {
            element,
            aromatic,
            bracket: false,
            isotope: None,
            charge: 0,
            explicit_hydrogens: 0,
            chirality: Chirality::None,
            class: None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        self.element.symbol()
    }

    pub fn is_carbon(&self) -> bool {
        self.element == Element::CARBON
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.aromatic {
            write!(f, "{}", self.symbol().to_ascii_lowercase())
        } else {
            write!(f, "{}", self.symbol())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '-' | '/' | '\\' => Some(BondOrder::Single),
            '=' => Some(BondOrder::Double),
            '#' => Some(BondOrder::Triple),
            '$' => Some(BondOrder::Quadruple),
            ':' => Some(BondOrder::Aromatic),
            _ => None,
        }
    }

    /// Valence units consumed by the bond; aromatic bonds count as one and the
    /// pi contribution is added per atom.
    pub fn valence(&self) -> u32 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }
}

/// Directional single bond marks (`/` and `\`), kept for double bond geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondStereo {
    #[default]
    None,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
    pub stereo: BondStereo,
}

impl Bond {
    pub fn new(begin: usize, end: usize, order: BondOrder) -> Self {
        Self {
            begin,
            end,
            order,
            stereo: BondStereo::None,
        }
    }

    /// The atom at the other end of the bond.
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom {
            self.end
        } else {
            self.begin
        }
    }

    pub fn connects(&self, a: usize, b: usize) -> bool {
        (self.begin == a && self.end == b) || (self.begin == b && self.end == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bond_symbols() {
        assert_eq!(BondOrder::from_symbol('='), Some(BondOrder::Double));
        assert_eq!(BondOrder::from_symbol('/'), Some(BondOrder::Single));
        assert_eq!(BondOrder::from_symbol('x'), None);
    }

    #[test]
    fn test_bond_other() {
        let bond = Bond::new(2, 5, BondOrder::Single);
        assert_eq!(bond.other(2), 5);
        assert_eq!(bond.other(5), 2);
        assert!(bond.connects(5, 2));
        assert!(!bond.connects(2, 3));
    }

    #[test]
    fn test_atom_display() {
        assert_eq!(Atom::organic(Element::NITROGEN, true).to_string(), "n");
        assert_eq!(Atom::organic(Element::CHLORINE, false).to_string(), "Cl");
    }
}
