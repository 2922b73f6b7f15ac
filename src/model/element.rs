use std::fmt;

const SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", // 1-10
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca", // 11-20
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", // 21-30
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", // 31-40
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", // 41-50
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", // 51-60
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", // 61-70
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", // 71-80
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", // 81-90
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", // 91-100
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", // 101-110
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og", // 111-118
];

/// A chemical element, or the `*` wildcard atom (atomic number 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Element(u8);

impl Element {
    pub const WILDCARD: Element = Element(0);
    pub const HYDROGEN: Element = Element(1);
    pub const BORON: Element = Element(5);
    pub const CARBON: Element = Element(6);
    pub const NITROGEN: Element = Element(7);
    pub const OXYGEN: Element = Element(8);
    pub const FLUORINE: Element = Element(9);
    pub const PHOSPHORUS: Element = Element(15);
    pub const SULFUR: Element = Element(16);
    pub const CHLORINE: Element = Element(17);
    pub const BROMINE: Element = Element(35);
    pub const IODINE: Element = Element(53);

    pub fn from_atomic_number(number: u8) -> Option<Self> {
        if (number as usize) <= SYMBOLS.len() {
            Some(Element(number))
        } else {
            None
        }
    }

    /// Look up an element by its exact (case-sensitive) symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        if symbol == "*" {
            return Some(Element::WILDCARD);
        }
        SYMBOLS
            .iter()
            .position(|s| *s == symbol)
            .map(|i| Element(i as u8 + 1))
    }

    pub fn atomic_number(&self) -> u8 {
        self.0
    }

    pub fn symbol(&self) -> &'static str {
        match self.0 {
            0 => "*",
            n => SYMBOLS[n as usize - 1],
        }
    }

    /// Allowed valences for atoms written without brackets.
    pub fn default_valences(&self) -> &'static [u32] {
        match *self {
            Element::BORON => &[3],
            Element::CARBON => &[4],
            Element::NITROGEN => &[3],
            Element::PHOSPHORUS => &[3, 5],
            Element::OXYGEN => &[2],
            Element::SULFUR => &[2, 4, 6],
            Element::FLUORINE | Element::CHLORINE | Element::BROMINE | Element::IODINE => &[1],
            _ => &[],
        }
    }

    /// Whether the element may appear in lowercase (aromatic) form.
    pub fn can_be_aromatic(&self) -> bool {
        matches!(
            self.0,
            5 | 6 | 7 | 8 | 15 | 16 | 33 | 34 // B C N O P S As Se
        )
    }

    /// Aromatic atoms that contribute one electron to the pi system and
    /// therefore carry one extra unit of valence beyond their sigma bonds.
    pub fn donates_pi_valence(&self) -> bool {
        matches!(*self, Element::BORON | Element::CARBON | Element::NITROGEN | Element::PHOSPHORUS)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(Element::from_symbol("C"), Some(Element::CARBON));
        assert_eq!(Element::from_symbol("Cl"), Some(Element::CHLORINE));
        assert_eq!(Element::from_symbol("Og").map(|e| e.atomic_number()), Some(118));
        assert_eq!(Element::from_symbol("*"), Some(Element::WILDCARD));
        assert_eq!(Element::from_symbol("cl"), None);
        assert_eq!(Element::from_symbol("Zz"), None);
    }

    #[test]
    fn test_symbol_round_trip() {
        for n in 0..=118u8 {
            let element = Element::from_atomic_number(n).unwrap();
            assert_eq!(Element::from_symbol(element.symbol()), Some(element));
        }
        assert!(Element::from_atomic_number(119).is_none());
    }

    #[test]
    fn test_default_valences() {
        assert_eq!(Element::CARBON.default_valences(), &[4]);
        assert_eq!(Element::NITROGEN.default_valences(), &[3]);
        assert_eq!(Element::PHOSPHORUS.default_valences(), &[3, 5]);
        assert_eq!(Element::SULFUR.default_valences(), &[2, 4, 6]);
        assert!(Element::from_symbol("Fe").unwrap().default_valences().is_empty());
    }
}
