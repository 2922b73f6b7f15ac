//! Kekulé assignment for aromatic systems

use crate::error::SmilesError;

use super::atom::BondOrder;
use super::element::Element;
use super::molecule::Molecule;

/// Assign alternating double bonds to the aromatic bonds of `mol`.
///
/// Every aromatic atom that has room for one more bond must receive exactly
/// one double bond; atoms already saturated (`[nH]`, furan oxygen, an
/// exocyclic `=O`) stay single. Returns the indices of the bonds chosen as
/// double, or the atoms that could not be paired.
pub fn kekulize(mol: &Molecule) -> Result<Vec<usize>, SmilesError> {
    let needs_double: Vec<bool> = (0..mol.atom_count())
        .map(|atom| needs_double_bond(mol, atom))
        .collect();

    let mut partner: Vec<Option<(usize, usize)>> = vec![None; mol.atom_count()];
    for group in pi_systems(mol, &needs_double) {
        if group.len() % 2 == 1 || !assign(mol, &needs_double, &group, &mut partner) {
            return Err(SmilesError::Kekulize(group));
        }
    }

    let mut doubles: Vec<usize> = partner
        .iter()
        .flatten()
        .map(|(_, bond)| *bond)
        .collect();
    doubles.sort_unstable();
    doubles.dedup();
    Ok(doubles)
}

/// Valence an aromatic atom reaches in its Kekulé form.
fn kekule_valence(element: Element, charge: i8) -> Option<i32> {
    let base = match element {
        Element::BORON | Element::NITROGEN | Element::PHOSPHORUS => 3,
        Element::CARBON => 4,
        Element::OXYGEN | Element::SULFUR => 2,
        e if e.symbol() == "As" => 3,
        e if e.symbol() == "Se" => 2,
        _ => return None,
    };
    let charge = i32::from(charge);
    Some(match element {
        Element::CARBON => base - charge.abs(),
        _ => base + charge,
    })
}

fn needs_double_bond(mol: &Molecule, atom: usize) -> bool {
    let a = mol.atom(atom);
    if !a.aromatic {
        return false;
    }
    let Some(target) = kekule_valence(a.element, a.charge) else {
        return false;
    };
    let sigma: u32 = mol
        .neighbors(atom)
        .iter()
        .map(|(_, bond)| mol.bond(*bond).order.valence())
        .sum();
    let hydrogens = if a.bracket {
        u32::from(a.explicit_hydrogens)
    } else {
        0
    };
    ((sigma + hydrogens) as i32) < target
}

/// Atoms needing a double bond, grouped by connectivity over aromatic bonds.
fn pi_systems(mol: &Molecule, needs_double: &[bool]) -> Vec<Vec<usize>> {
    let mut seen = vec![false; mol.atom_count()];
    let mut groups = Vec::new();
    for start in 0..mol.atom_count() {
        if !needs_double[start] || seen[start] {
            continue;
        }
        seen[start] = true;
        let mut stack = vec![start];
        let mut group = Vec::new();
        while let Some(atom) = stack.pop() {
            group.push(atom);
            for (n, _) in candidate_bonds(mol, needs_double, atom) {
                if !seen[n] {
                    seen[n] = true;
                    stack.push(n);
                }
            }
        }
        group.sort_unstable();
        groups.push(group);
    }
    groups
}

fn candidate_bonds<'a>(
    mol: &'a Molecule,
    needs_double: &'a [bool],
    atom: usize,
) -> impl Iterator<Item = (usize, usize)> + 'a {
    mol.neighbors(atom)
        .iter()
        .copied()
        .filter(move |(n, bond)| {
            needs_double[*n] && mol.bond(*bond).order == BondOrder::Aromatic
        })
}

/// Perfect matching over `group` by backtracking, always extending the atom
/// with the fewest free partners first.
fn assign(
    mol: &Molecule,
    needs_double: &[bool],
    group: &[usize],
    partner: &mut [Option<(usize, usize)>],
) -> bool {
    let next = group
        .iter()
        .copied()
        .filter(|atom| partner[*atom].is_none())
        .map(|atom| {
            let free: Vec<(usize, usize)> = candidate_bonds(mol, needs_double, atom)
                .filter(|(n, _)| partner[*n].is_none())
                .collect();
            (atom, free)
        })
        .min_by_key(|(_, free)| free.len());

    let Some((atom, free)) = next else {
        return true;
    };
    for (n, bond) in free {
        partner[atom] = Some((n, bond));
        partner[n] = Some((atom, bond));
        if assign(mol, needs_double, group, partner) {
            return true;
        }
        partner[atom] = None;
        partner[n] = None;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_smiles;

    #[test]
    fn test_benzene_gets_three_double_bonds() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        let doubles = kekulize(&mol).unwrap();
        assert_eq!(doubles.len(), 3);
        let mut touched: Vec<usize> = doubles
            .iter()
            .flat_map(|b| [mol.bond(*b).begin, mol.bond(*b).end])
            .collect();
        touched.sort_unstable();
        assert_eq!(touched, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_saturated_heteroatoms_stay_single() {
        assert_eq!(kekulize(&parse_smiles("c1cc[nH]c1").unwrap()).unwrap().len(), 2);
        assert_eq!(kekulize(&parse_smiles("c1ccoc1").unwrap()).unwrap().len(), 2);
        assert_eq!(kekulize(&parse_smiles("c1ccsc1").unwrap()).unwrap().len(), 2);
        assert_eq!(kekulize(&parse_smiles("c1ccncc1").unwrap()).unwrap().len(), 3);
    }

    #[test]
    fn test_fused_and_charged_systems() {
        assert_eq!(kekulize(&parse_smiles("c1ccc2ccccc2c1").unwrap()).unwrap().len(), 5);
        // azulene: fused five and seven membered rings
        assert_eq!(kekulize(&parse_smiles("c1ccc2cccc2cc1").unwrap()).unwrap().len(), 5);
        assert_eq!(kekulize(&parse_smiles("c1cc[nH+]cc1").unwrap()).unwrap().len(), 3);
        assert_eq!(kekulize(&parse_smiles("c1cc[cH-]c1").unwrap()).unwrap().len(), 2);
    }

    #[test]
    fn test_exocyclic_double_bond() {
        // 2-pyridone
        assert_eq!(kekulize(&parse_smiles("O=c1cccc[nH]1").unwrap()).unwrap().len(), 2);
    }
}
