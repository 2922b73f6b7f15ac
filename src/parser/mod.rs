pub mod atoms;
pub mod smiles;

pub use smiles::parse_smiles;
