use std::collections::VecDeque;

use crate::error::SmilesError;

use super::atom::{Atom, Bond, BondOrder};
use super::kekule::kekulize;
use super::rings::smallest_rings;

/// Molecular graph: atoms, bonds and an adjacency index of `(neighbor, bond)`.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    /// Add a bond; a second bond between the same pair of atoms is rejected.
    pub fn add_bond(&mut self, bond: Bond) -> Result<usize, SmilesError> {
        if self.bond_between(bond.begin, bond.end).is_some() {
            return Err(SmilesError::DuplicateBond(bond.begin, bond.end));
        }
        let index = self.bonds.len();
        self.adjacency[bond.begin].push((bond.end, index));
        self.adjacency[bond.end].push((bond.begin, index));
        self.bonds.push(bond);
        Ok(index)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom(&self, index: usize) -> &Atom {
        &self.atoms[index]
    }

    pub fn bond(&self, index: usize) -> &Bond {
        &self.bonds[index]
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// `(neighbor, bond index)` pairs in the order the bonds were written.
    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<usize> {
        self.adjacency
            .get(a)?
            .iter()
            .find(|(n, _)| *n == b)
            .map(|(_, bond)| *bond)
    }

    /// Sum of bond valences, plus the pi contribution of aromatic B/C/N/P.
    pub fn bond_valence(&self, atom: usize) -> u32 {
        let sigma: u32 = self.adjacency[atom]
            .iter()
            .map(|(_, b)| self.bonds[*b].order.valence())
            .sum();
        let a = &self.atoms[atom];
        let has_aromatic_bond = self.adjacency[atom]
            .iter()
            .any(|(_, b)| self.bonds[*b].order == BondOrder::Aromatic);
        if a.aromatic && has_aromatic_bond && a.element.donates_pi_valence() {
            sigma + 1
        } else {
            sigma
        }
    }

    /// Hydrogens implied by the default valence of an unbracketed atom.
    pub fn implicit_hydrogens(&self, atom: usize) -> u8 {
        let a = &self.atoms[atom];
        if a.bracket {
            return 0;
        }
        let used = self.bond_valence(atom);
        let valences = a.element.default_valences();
        if a.aromatic {
            // Fused aromatic atoms already use their lowest valence fully.
            return valences
                .first()
                .map(|v| v.saturating_sub(used) as u8)
                .unwrap_or(0);
        }
        valences
            .iter()
            .find(|v| **v >= used)
            .map(|v| (v - used) as u8)
            .unwrap_or(0)
    }

    pub fn total_hydrogens(&self, atom: usize) -> u8 {
        self.atoms[atom].explicit_hydrogens + self.implicit_hydrogens(atom)
    }

    /// Connected components as lists of atom indices, each in ascending order.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.atoms.len()];
        let mut components = Vec::new();
        for start in 0..self.atoms.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut queue = VecDeque::from([start]);
            let mut members = Vec::new();
            while let Some(atom) = queue.pop_front() {
                members.push(atom);
                for &(n, _) in &self.adjacency[atom] {
                    if !seen[n] {
                        seen[n] = true;
                        queue.push_back(n);
                    }
                }
            }
            members.sort_unstable();
            components.push(members);
        }
        components
    }

    /// Smallest set of smallest rings, each ring an ordered cycle of atoms.
    pub fn rings(&self) -> Vec<Vec<usize>> {
        smallest_rings(self)
    }

    /// Per-atom ring membership flags.
    pub fn ring_atoms(&self) -> Vec<bool> {
        let mut in_ring = vec![false; self.atoms.len()];
        for ring in self.rings() {
            for atom in ring {
                in_ring[atom] = true;
            }
        }
        in_ring
    }

    /// Chemistry checks applied after parsing: organic-subset valences,
    /// aromatic atoms outside rings and a Kekulé form for every aromatic system.
    pub fn sanitize(&self) -> Result<(), SmilesError> {
        for (index, atom) in self.atoms.iter().enumerate() {
            if atom.bracket {
                continue;
            }
            let valence = self.bond_valence(index);
            let allowed_max = atom.element.default_valences().last().copied();
            if let Some(max) = allowed_max {
                // An aromatic atom may carry its pi unit on top of a full sigma shell.
                let limit = if atom.aromatic && atom.element.donates_pi_valence() {
                    max + 1
                } else {
                    max
                };
                if valence > limit {
                    return Err(SmilesError::Valence {
                        index,
                        symbol: atom.symbol().to_string(),
                        valence,
                    });
                }
            }
        }

        if self.atoms.iter().any(|a| a.aromatic) {
            let in_ring = self.ring_atoms();
            if let Some(index) = self
                .atoms
                .iter()
                .enumerate()
                .position(|(i, a)| a.aromatic && !in_ring[i])
            {
                return Err(SmilesError::NonRingAromatic(index));
            }
            kekulize(self)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Element;

    fn chain(elements: &[Element]) -> Molecule {
        let mut mol = Molecule::new();
        for (i, e) in elements.iter().enumerate() {
            mol.add_atom(Atom::organic(*e, false));
            if i > 0 {
                mol.add_bond(Bond::new(i - 1, i, BondOrder::Single)).unwrap();
            }
        }
        mol
    }

    #[test]
    fn test_implicit_hydrogens_ethanol() {
        let mol = chain(&[Element::CARBON, Element::CARBON, Element::OXYGEN]);
        assert_eq!(mol.implicit_hydrogens(0), 3);
        assert_eq!(mol.implicit_hydrogens(1), 2);
        assert_eq!(mol.implicit_hydrogens(2), 1);
    }

    #[test]
    fn test_duplicate_bond_rejected() {
        let mut mol = chain(&[Element::CARBON, Element::CARBON]);
        let err = mol.add_bond(Bond::new(1, 0, BondOrder::Double)).unwrap_err();
        assert_eq!(err, SmilesError::DuplicateBond(1, 0));
    }

    #[test]
    fn test_pentavalent_carbon_fails_sanitize() {
        let mut mol = Molecule::new();
        let c = mol.add_atom(Atom::organic(Element::CARBON, false));
        for _ in 0..5 {
            let f = mol.add_atom(Atom::organic(Element::FLUORINE, false));
            mol.add_bond(Bond::new(c, f, BondOrder::Single)).unwrap();
        }
        let err = mol.sanitize().unwrap_err();
        assert!(matches!(err, SmilesError::Valence { index: 0, valence: 5, .. }));
    }

    #[test]
    fn test_components() {
        let mut mol = chain(&[Element::CARBON, Element::CARBON]);
        mol.add_atom(Atom::organic(Element::OXYGEN, false));
        let components = mol.components();
        assert_eq!(components, vec![vec![0, 1], vec![2]]);
    }
}
