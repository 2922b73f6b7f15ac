pub mod atom;
pub mod element;
pub mod kekule;
pub mod molecule;
pub mod rings;

pub use atom::{Atom, Bond, BondOrder, BondStereo, Chirality};
pub use element::Element;
pub use molecule::Molecule;
