//! Ring perception.
//!
//! Candidate cycles come from shortest-path trees rooted at every atom
//! (Horton's construction). Candidates are taken shortest first and kept when
//! their bond set is independent over GF(2) of the rings already chosen,
//! until the cycle space is spanned.

use std::collections::{HashSet, VecDeque};

use super::molecule::Molecule;

/// A fixed-width bit set over bond indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BondSet(Vec<u64>);

impl BondSet {
    fn new(bits: usize) -> Self {
        BondSet(vec![0; bits.div_ceil(64)])
    }

    fn insert(&mut self, bit: usize) {
        self.0[bit / 64] |= 1u64 << (bit % 64);
    }

    fn contains(&self, bit: usize) -> bool {
        self.0[bit / 64] & (1u64 << (bit % 64)) != 0
    }

    fn xor_with(&mut self, other: &BondSet) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a ^= *b;
        }
    }

    fn highest_bit(&self) -> Option<usize> {
        self.0
            .iter()
            .enumerate()
            .rev()
            .find(|(_, w)| **w != 0)
            .map(|(i, w)| i * 64 + 63 - w.leading_zeros() as usize)
    }
}

/// Gaussian elimination basis keyed by pivot bit.
struct CycleBasis {
    rows: Vec<Option<BondSet>>,
}

impl CycleBasis {
    fn new(bits: usize) -> Self {
        Self {
            rows: vec![None; bits],
        }
    }

    /// Insert the vector if it is independent of the basis.
    fn insert(&mut self, mut v: BondSet) -> bool {
        while let Some(pivot) = v.highest_bit() {
            match &self.rows[pivot] {
                Some(row) => v.xor_with(row),
                None => {
                    self.rows[pivot] = Some(v);
                    return true;
                }
            }
        }
        false
    }
}

/// Shortest-path parents from `root`, breadth first in adjacency order.
fn bfs_parents(mol: &Molecule, root: usize) -> Vec<Option<usize>> {
    let mut parent = vec![None; mol.atom_count()];
    let mut seen = vec![false; mol.atom_count()];
    seen[root] = true;
    let mut queue = VecDeque::from([root]);
    while let Some(atom) = queue.pop_front() {
        for &(n, _) in mol.neighbors(atom) {
            if !seen[n] {
                seen[n] = true;
                parent[n] = Some(atom);
                queue.push_back(n);
            }
        }
    }
    parent
}

/// Path `root ..= target` following parent links.
fn path_from_root(parent: &[Option<usize>], root: usize, target: usize) -> Vec<usize> {
    let mut path = vec![target];
    let mut current = target;
    while current != root {
        match parent[current] {
            Some(p) => {
                path.push(p);
                current = p;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

fn ring_bonds(mol: &Molecule, ring: &[usize]) -> Option<BondSet> {
    let mut set = BondSet::new(mol.bond_count());
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        let bond = mol.bond_between(a, b)?;
        if set.contains(bond) {
            return None;
        }
        set.insert(bond);
    }
    Some(set)
}

/// Smallest set of smallest rings as ordered atom cycles.
pub fn smallest_rings(mol: &Molecule) -> Vec<Vec<usize>> {
    let atoms = mol.atom_count();
    let bonds = mol.bond_count();
    let components = mol.components().len();
    let cyclomatic = (bonds + components).saturating_sub(atoms);
    if cyclomatic == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<(Vec<usize>, BondSet)> = Vec::new();
    let mut seen_sets: HashSet<BondSet> = HashSet::new();

    for root in 0..atoms {
        let parent = bfs_parents(mol, root);
        for bond in mol.bonds() {
            let (x, y) = (bond.begin, bond.end);
            let reachable = |a: usize| a == root || parent[a].is_some();
            if !reachable(x) || !reachable(y) {
                continue;
            }
            let px = path_from_root(&parent, root, x);
            let py = path_from_root(&parent, root, y);
            let shared = px.iter().filter(|a| py.contains(a)).count();
            if shared != 1 {
                continue;
            }
            let mut ring = px;
            ring.extend(py.iter().skip(1).rev());
            if ring.len() < 3 {
                continue;
            }
            if let Some(set) = ring_bonds(mol, &ring) {
                if seen_sets.insert(set.clone()) {
                    candidates.push((ring, set));
                }
            }
        }
    }

    candidates.sort_by_key(|(ring, _)| ring.len());

    let mut basis = CycleBasis::new(bonds);
    let mut rings = Vec::with_capacity(cyclomatic);
    for (ring, set) in candidates {
        if basis.insert(set) {
            rings.push(ring);
            if rings.len() == cyclomatic {
                break;
            }
        }
    }
    rings
}
