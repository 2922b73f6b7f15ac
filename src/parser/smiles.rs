use std::collections::BTreeMap;

use crate::error::SmilesError;
use crate::model::{Atom, Bond, BondOrder, BondStereo, Element, Molecule};

use super::atoms::{bond_symbol, bracket_atom, organic_atom, ring_label, BracketAtom};

/// A bond symbol waiting for the atom or ring label that completes it.
#[derive(Debug, Clone, Copy)]
struct PendingBond {
    order: BondOrder,
    stereo: BondStereo,
    position: usize,
}

#[derive(Debug, Clone, Copy)]
struct OpenRing {
    atom: usize,
    bond: Option<PendingBond>,
}

#[derive(Debug, Clone, Copy)]
struct OpenBranch {
    atom: usize,
    position: usize,
    atoms_before: usize,
}

struct SmilesReader<'a> {
    source: &'a str,
    molecule: Molecule,
    previous: Option<usize>,
    pending: Option<PendingBond>,
    branches: Vec<OpenBranch>,
    rings: BTreeMap<u32, OpenRing>,
}

/// Parse a SMILES string into a sanitized molecule graph.
pub fn parse_smiles(input: &str) -> Result<Molecule, SmilesError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SmilesError::Empty);
    }

    let mut reader = SmilesReader {
        source: input,
        molecule: Molecule::new(),
        previous: None,
        pending: None,
        branches: Vec::new(),
        rings: BTreeMap::new(),
    };
    reader.read()?;
    let molecule = reader.finish()?;
    molecule.sanitize()?;

    log::debug!(
        "Parsed SMILES '{}': {} atoms, {} bonds",
        input,
        molecule.atom_count(),
        molecule.bond_count()
    );
    Ok(molecule)
}

impl<'a> SmilesReader<'a> {
    fn position(&self, rest: &str) -> usize {
        self.source.len() - rest.len()
    }

    fn unexpected(&self, rest: &str) -> SmilesError {
        match rest.chars().next() {
            Some(ch) => SmilesError::UnexpectedChar {
                ch,
                position: self.position(rest),
            },
            None => SmilesError::UnexpectedEnd(self.source.len()),
        }
    }

    fn read(&mut self) -> Result<(), SmilesError> {
        let mut rest = self.source;

        while let Some(c) = rest.chars().next() {
            let position = self.position(rest);
            match c {
                '(' => {
                    let Some(atom) = self.previous else {
                        return Err(self.unexpected(rest));
                    };
                    if self.pending.is_some() {
                        return Err(self.unexpected(rest));
                    }
                    self.branches.push(OpenBranch {
                        atom,
                        position,
                        atoms_before: self.molecule.atom_count(),
                    });
                    rest = &rest[1..];
                }
                ')' => {
                    let branch = self
                        .branches
                        .pop()
                        .ok_or(SmilesError::UnmatchedBranchClose(position))?;
                    if let Some(bond) = self.pending {
                        return Err(SmilesError::DanglingBond(bond.position));
                    }
                    if self.molecule.atom_count() == branch.atoms_before {
                        return Err(self.unexpected(rest));
                    }
                    self.previous = Some(branch.atom);
                    rest = &rest[1..];
                }
                '.' => {
                    if let Some(bond) = self.pending {
                        return Err(SmilesError::DanglingBond(bond.position));
                    }
                    if self.previous.is_none() || !self.branches.is_empty() {
                        return Err(self.unexpected(rest));
                    }
                    self.previous = None;
                    rest = &rest[1..];
                }
                '0'..='9' | '%' => {
                    if self.previous.is_none() {
                        return Err(self.unexpected(rest));
                    }
                    let (next, label) = ring_label(rest).map_err(|_| self.unexpected(rest))?;
                    self.ring_bond(label, position)?;
                    rest = next;
                }
                '[' => {
                    let (next, raw) = bracket_atom(rest).map_err(|_| {
                        let message = match rest.find(']') {
                            Some(end) => format!("cannot parse '{}'", &rest[..=end]),
                            None => "missing closing ']'".to_string(),
                        };
                        SmilesError::InvalidBracketAtom { position, message }
                    })?;
                    let atom = resolve_bracket(&raw, position)?;
                    self.push_atom(atom)?;
                    rest = next;
                }
                _ => {
                    if let Ok((next, (order, stereo))) = bond_symbol(rest) {
                        if self.pending.is_some() || self.previous.is_none() {
                            return Err(self.unexpected(rest));
                        }
                        self.pending = Some(PendingBond {
                            order,
                            stereo,
                            position,
                        });
                        rest = next;
                    } else {
                        let (next, atom) =
                            organic_atom(rest).map_err(|_| self.unexpected(rest))?;
                        self.push_atom(atom)?;
                        rest = next;
                    }
                }
            }
        }

        Ok(())
    }

    fn implicit_order(&self, a: usize, b: usize) -> BondOrder {
        if self.molecule.atom(a).aromatic && self.molecule.atom(b).aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn push_atom(&mut self, atom: Atom) -> Result<(), SmilesError> {
        let index = self.molecule.add_atom(atom);
        if let Some(previous) = self.previous {
            let bond = match self.pending.take() {
                Some(p) => Bond {
                    begin: previous,
                    end: index,
                    order: p.order,
                    stereo: p.stereo,
                },
                None => Bond::new(previous, index, self.implicit_order(previous, index)),
            };
            self.molecule.add_bond(bond)?;
        }
        self.previous = Some(index);
        Ok(())
    }

    fn ring_bond(&mut self, label: u32, position: usize) -> Result<(), SmilesError> {
        let Some(current) = self.previous else {
            return Err(SmilesError::UnexpectedEnd(position));
        };
        let pending = self.pending.take();

        match self.rings.remove(&label) {
            None => {
                self.rings.insert(
                    label,
                    OpenRing {
                        atom: current,
                        bond: pending,
                    },
                );
            }
            Some(open) => {
                if open.atom == current {
                    return Err(SmilesError::SelfBond {
                        ring: label,
                        position,
                    });
                }
                let bond = match (open.bond, pending) {
                    (Some(a), Some(b)) if a.order != b.order => {
                        return Err(SmilesError::ConflictingRingBond(label));
                    }
                    (Some(p), _) | (None, Some(p)) => Bond {
                        begin: open.atom,
                        end: current,
                        order: p.order,
                        stereo: p.stereo,
                    },
                    (None, None) => {
                        Bond::new(open.atom, current, self.implicit_order(open.atom, current))
                    }
                };
                self.molecule.add_bond(bond)?;
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Molecule, SmilesError> {
        if let Some(bond) = self.pending {
            return Err(SmilesError::DanglingBond(bond.position));
        }
        if let Some(branch) = self.branches.last() {
            return Err(SmilesError::UnclosedBranch(branch.position));
        }
        if let Some(label) = self.rings.keys().next() {
            return Err(SmilesError::UnclosedRing(*label));
        }
        Ok(self.molecule)
    }
}

fn resolve_bracket(raw: &BracketAtom<'_>, position: usize) -> Result<Atom, SmilesError> {
    let element = if raw.aromatic {
        let mut symbol = raw.symbol.to_string();
        if let Some(first) = symbol.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        Element::from_symbol(&symbol)
    } else {
        Element::from_symbol(raw.symbol)
    }
    .ok_or_else(|| SmilesError::UnknownElement(raw.symbol.to_string()))?;

    if raw.aromatic && !element.can_be_aromatic() {
        return Err(SmilesError::InvalidBracketAtom {
            position,
            message: format!("{} cannot be aromatic", element),
        });
    }

    Ok(Atom {
        element,
        aromatic: raw.aromatic,
        bracket: true,
        isotope: raw.isotope,
        charge: raw.charge,
        explicit_hydrogens: raw.hydrogens,
        chirality: raw.chirality,
        class: raw.class,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethanol() {
        let mol = parse_smiles("CCO").unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.atom(2).element, Element::OXYGEN);
        assert_eq!(mol.total_hydrogens(2), 1);
    }

    #[test]
    fn test_benzene_aromatic_bonds() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(mol.atom_count(), 6);
        assert_eq!(mol.bond_count(), 6);
        assert!(mol.bonds().iter().all(|b| b.order == BondOrder::Aromatic));
        assert!((0..6).all(|i| mol.implicit_hydrogens(i) == 1));
    }

    #[test]
    fn test_branches_and_double_bonds() {
        // acetic acid
        let mol = parse_smiles("CC(=O)O").unwrap();
        assert_eq!(mol.atom_count(), 4);
        let carbonyl = mol.bond_between(1, 2).unwrap();
        assert_eq!(mol.bond(carbonyl).order, BondOrder::Double);
        assert!(mol.bond_between(1, 3).is_some());
        assert_eq!(mol.implicit_hydrogens(1), 0);
    }

    #[test]
    fn test_ring_closure_with_bond_symbol() {
        let mol = parse_smiles("C=1CCCCC=1").unwrap();
        let closure = mol.bond_between(0, 5).unwrap();
        assert_eq!(mol.bond(closure).order, BondOrder::Double);
    }

    #[test]
    fn test_percent_ring_label() {
        let mol = parse_smiles("C%10CCCC%10").unwrap();
        assert!(mol.bond_between(0, 4).is_some());
    }

    #[test]
    fn test_dot_disconnection() {
        let mol = parse_smiles("[Na+].[Cl-]").unwrap();
        assert_eq!(mol.bond_count(), 0);
        assert_eq!(mol.components().len(), 2);
        assert_eq!(mol.atom(0).charge, 1);
    }

    #[test]
    fn test_pyrrole_bracket_nh() {
        let mol = parse_smiles("c1cc[nH]c1").unwrap();
        assert_eq!(mol.atom(3).explicit_hydrogens, 1);
        assert!(mol.atom(3).aromatic);
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            parse_smiles("zzz").unwrap_err(),
            SmilesError::UnexpectedChar { ch: 'z', position: 0 }
        );
        assert_eq!(
            parse_smiles("not-a-smiles").unwrap_err(),
            SmilesError::UnexpectedChar { ch: 't', position: 2 }
        );
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(parse_smiles("").unwrap_err(), SmilesError::Empty);
        assert_eq!(parse_smiles("C1CC").unwrap_err(), SmilesError::UnclosedRing(1));
        assert_eq!(parse_smiles("CC(C").unwrap_err(), SmilesError::UnclosedBranch(2));
        assert_eq!(
            parse_smiles("CC)C").unwrap_err(),
            SmilesError::UnmatchedBranchClose(2)
        );
        assert_eq!(parse_smiles("CC=").unwrap_err(), SmilesError::DanglingBond(2));
        assert!(matches!(
            parse_smiles("C11").unwrap_err(),
            SmilesError::SelfBond { ring: 1, .. }
        ));
        assert!(matches!(
            parse_smiles("(C)C").unwrap_err(),
            SmilesError::UnexpectedChar { ch: '(', .. }
        ));
        assert!(matches!(
            parse_smiles("C()C").unwrap_err(),
            SmilesError::UnexpectedChar { ch: ')', .. }
        ));
    }

    #[test]
    fn test_bracket_errors() {
        assert_eq!(
            parse_smiles("[Xx]").unwrap_err(),
            SmilesError::UnknownElement("Xx".to_string())
        );
        assert!(matches!(
            parse_smiles("C[NH4+").unwrap_err(),
            SmilesError::InvalidBracketAtom { position: 1, .. }
        ));
    }

    #[test]
    fn test_sanitize_errors() {
        assert!(matches!(
            parse_smiles("C(C)(C)(C)(C)C").unwrap_err(),
            SmilesError::Valence { index: 0, .. }
        ));
        assert_eq!(parse_smiles("cc").unwrap_err(), SmilesError::NonRingAromatic(0));
    }

    #[test]
    fn test_unkekulizable_rings_rejected() {
        assert_eq!(
            parse_smiles("c1cccc1").unwrap_err(),
            SmilesError::Kekulize(vec![0, 1, 2, 3, 4])
        );
        assert!(matches!(
            parse_smiles("c1ccnc1").unwrap_err(),
            SmilesError::Kekulize(_)
        ));
        assert!(parse_smiles("c1cc[nH]c1").is_ok());
    }

    #[test]
    fn test_tetravalent_neutral_nitrogen_rejected() {
        let err = parse_smiles("N(C)(C)(C)C").unwrap_err();
        assert_eq!(
            err,
            SmilesError::Valence {
                index: 0,
                symbol: "N".to_string(),
                valence: 4
            }
        );
        assert_eq!(
            err.to_string(),
            "Explicit valence for atom # 0 N, 4, is greater than permitted"
        );
        assert!(parse_smiles("C[N+](C)(C)C").is_ok());
    }
}
