//! 2D coordinate generation
//!
//! Ring systems are laid out first as fused regular polygons in their own
//! frame. Atoms are then placed breadth-first from the first atom of each
//! connected component: chains zig-zag at 120°, a ring system reached over a
//! bond is rotated so it points away from its attachment, and components are
//! packed left to right.

use std::collections::{BTreeMap, VecDeque};
use std::f64::consts::{PI, TAU};

use crate::model::{BondOrder, Molecule};

use super::geometry::{centroid, normalize_angle, Bounds, Point};

/// Gap between packed components, in bond lengths
const COMPONENT_GAP: f64 = 1.5;

/// Non-bonded atoms closer than this (in bond lengths) get pushed apart
const MIN_ATOM_DISTANCE: f64 = 0.5;

const RELAX_ITERATIONS: usize = 50;

/// Atom coordinates in bond-length units, y pointing up.
#[derive(Debug, Clone)]
pub struct Layout {
    pub positions: Vec<Point>,
    /// Rings used for the layout, as ordered atom cycles
    pub rings: Vec<Vec<usize>>,
}

impl Layout {
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of(self.positions.iter().copied())
    }

    /// Smallest ring containing both atoms of a bond.
    pub fn ring_of_bond(&self, a: usize, b: usize) -> Option<&[usize]> {
        self.rings
            .iter()
            .filter(|ring| ring.contains(&a) && ring.contains(&b))
            .min_by_key(|ring| ring.len())
            .map(|ring| ring.as_slice())
    }
}

/// Compute 2D coordinates for every atom of a molecule.
pub fn compute_layout(mol: &Molecule) -> Layout {
    let rings = mol.rings();
    let mut builder = LayoutBuilder::new(mol, &rings);
    for component in mol.components() {
        builder.place_component(&component);
    }
    builder.relax();
    let positions = builder.positions.into_iter().map(|p| p.unwrap_or_default()).collect();
    Layout { positions, rings }
}

/// Radius of a regular polygon with `n` unit sides.
fn polygon_radius(n: usize) -> f64 {
    1.0 / (2.0 * (PI / n as f64).sin())
}

/// Group rings sharing at least one atom into ring systems.
fn ring_systems(rings: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..rings.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..rings.len() {
        for j in (i + 1)..rings.len() {
            if rings[i].iter().any(|a| rings[j].contains(a)) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj.max(ri)] = rj.min(ri);
                }
            }
        }
    }

    let mut systems: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..rings.len() {
        let root = find(&mut parent, i);
        systems.entry(root).or_default().push(i);
    }
    systems.into_values().collect()
}

/// Lay out one ring system in its own frame.
fn layout_ring_system(system: &[usize], rings: &[Vec<usize>]) -> BTreeMap<usize, Point> {
    let mut coords: BTreeMap<usize, Point> = BTreeMap::new();
    let mut pending: Vec<usize> = system.to_vec();

    // Start from the most fused ring, larger rings first on ties.
    let shares = |r: usize| {
        system
            .iter()
            .filter(|&&o| o != r && rings[o].iter().any(|a| rings[r].contains(a)))
            .count()
    };
    let first = pending
        .iter()
        .copied()
        .max_by(|&a, &b| {
            (shares(a), rings[a].len())
                .cmp(&(shares(b), rings[b].len()))
                .then(b.cmp(&a))
        })
        .unwrap_or(system[0]);
    pending.retain(|&r| r != first);
    place_polygon(&rings[first], &mut coords);

    while !pending.is_empty() {
        let placed_count = |r: usize| rings[r].iter().filter(|a| coords.contains_key(a)).count();
        let Some((slot, &next)) = pending
            .iter()
            .enumerate()
            .filter(|(_, &r)| placed_count(r) > 0)
            .max_by(|(_, &a), (_, &b)| placed_count(a).cmp(&placed_count(b)).then(b.cmp(&a)))
        else {
            break;
        };
        pending.remove(slot);

        let ring = &rings[next];
        if placed_count(next) == 1 {
            place_spiro_ring(ring, &mut coords);
        } else {
            place_fused_ring(ring, rings, &mut coords);
        }
    }
    coords
}

fn place_polygon(ring: &[usize], coords: &mut BTreeMap<usize, Point>) {
    let n = ring.len();
    let radius = polygon_radius(n);
    for (i, &atom) in ring.iter().enumerate() {
        let angle = PI / 2.0 + TAU * i as f64 / n as f64;
        coords.insert(atom, Point::from_angle(angle) * radius);
    }
}

/// A ring sharing a single atom with the system: its center sits on the line
/// from the system centroid through the shared atom.
fn place_spiro_ring(ring: &[usize], coords: &mut BTreeMap<usize, Point>) {
    let Some(start) = ring.iter().position(|a| coords.contains_key(a)) else {
        return;
    };
    let shared = coords[&ring[start]];
    let system_center = centroid(coords.values().copied());
    let outward = (shared - system_center)
        .normalized()
        .unwrap_or(Point::new(1.0, 0.0));

    let n = ring.len();
    let radius = polygon_radius(n);
    let center = shared + outward * radius;
    let start_angle = (shared - center).angle();
    for step in 1..n {
        let atom = ring[(start + step) % n];
        let angle = start_angle + TAU * step as f64 / n as f64;
        coords.insert(atom, center + Point::from_angle(angle) * radius);
    }
}

/// A ring sharing a bond or a longer path with the system. Each run of
/// unplaced atoms becomes an arc between its two placed anchors.
fn place_fused_ring(ring: &[usize], rings: &[Vec<usize>], coords: &mut BTreeMap<usize, Point>) {
    let n = ring.len();
    let radius = polygon_radius(n);

    loop {
        // A placed atom followed by an unplaced one starts a run.
        let Some(start) = (0..n)
            .find(|&i| coords.contains_key(&ring[i]) && !coords.contains_key(&ring[(i + 1) % n]))
        else {
            break;
        };
        let mut run = Vec::new();
        let mut j = (start + 1) % n;
        while !coords.contains_key(&ring[j]) {
            run.push(ring[j]);
            j = (j + 1) % n;
        }
        let (a, b) = (ring[start], ring[j]);
        let (pa, pb) = (coords[&a], coords[&b]);

        // Push away from the ring(s) already holding this edge.
        let inner = rings
            .iter()
            .filter(|r| {
                r.contains(&a) && r.contains(&b) && r.iter().all(|x| coords.contains_key(x))
            })
            .min_by_key(|r| r.len())
            .map(|r| centroid(r.iter().map(|x| coords[x])))
            .unwrap_or_else(|| centroid(coords.values().copied()));

        let chord = pb - pa;
        let half = chord.length() / 2.0;
        let mid = pa.midpoint(pb);
        let r = radius.max(half);
        let apothem = (r * r - half * half).max(0.0).sqrt();
        let mut away = chord.perpendicular().normalized().unwrap_or(Point::new(0.0, 1.0));
        if away.dot(mid - inner) < 0.0 {
            away = away * -1.0;
        }
        let center = mid + away * apothem;

        let angle_a = (pa - center).angle();
        let mut sweep = normalize_angle((pb - center).angle() - angle_a);
        let far = normalize_angle(away.angle() - angle_a);
        if far > sweep {
            sweep -= TAU;
        }
        let step = sweep / (run.len() + 1) as f64;
        for (k, &atom) in run.iter().enumerate() {
            let angle = angle_a + step * (k + 1) as f64;
            coords.insert(atom, center + Point::from_angle(angle) * r);
        }
    }
}

struct LayoutBuilder<'a> {
    mol: &'a Molecule,
    positions: Vec<Option<Point>>,
    /// Zig-zag side for the next chain atom
    turn: Vec<f64>,
    atom_system: Vec<Option<usize>>,
    systems: Vec<BTreeMap<usize, Point>>,
    system_placed: Vec<bool>,
    /// Right edge of the components placed so far
    cursor: Option<f64>,
}

impl<'a> LayoutBuilder<'a> {
    fn new(mol: &'a Molecule, rings: &[Vec<usize>]) -> Self {
        let n = mol.atom_count();
        let mut atom_system = vec![None; n];
        let mut systems = Vec::new();
        for (index, system) in ring_systems(rings).iter().enumerate() {
            for &r in system {
                for &atom in &rings[r] {
                    atom_system[atom] = Some(index);
                }
            }
            systems.push(layout_ring_system(system, rings));
        }
        Self {
            mol,
            positions: vec![None; n],
            turn: vec![1.0; n],
            atom_system,
            system_placed: vec![false; systems.len()],
            systems,
            cursor: None,
        }
    }

    fn place_component(&mut self, component: &[usize]) {
        let Some(&root) = component.first() else {
            return;
        };
        let mut queue = VecDeque::new();
        match self.atom_system[root] {
            Some(system) => {
                for (atom, p) in self.systems[system].clone() {
                    self.positions[atom] = Some(p);
                    queue.push_back(atom);
                }
                self.system_placed[system] = true;
            }
            None => {
                self.positions[root] = Some(Point::ORIGIN);
                queue.push_back(root);
            }
        }

        while let Some(atom) = queue.pop_front() {
            self.expand(atom, &mut queue);
        }
        self.pack(component);
    }

    /// Place the unplaced neighbours of an already placed atom.
    fn expand(&mut self, atom: usize, queue: &mut VecDeque<usize>) {
        let Some(origin) = self.positions[atom] else {
            return;
        };
        let mut placed_dirs = Vec::new();
        let mut unplaced = Vec::new();
        for &(nbr, _) in self.mol.neighbors(atom) {
            match self.positions[nbr] {
                Some(p) => placed_dirs.push((p - origin).angle()),
                None => unplaced.push(nbr),
            }
        }
        if unplaced.is_empty() {
            return;
        }

        let angles = choose_angles(&placed_dirs, unplaced.len(), self.is_linear(atom), self.turn[atom]);
        for (nbr, angle) in unplaced.into_iter().zip(angles) {
            let target = origin + Point::from_angle(angle);
            match self.atom_system[nbr] {
                Some(system) if !self.system_placed[system] => {
                    self.place_system(system, nbr, target, angle, queue);
                }
                _ => {
                    self.positions[nbr] = Some(target);
                    self.turn[nbr] = -self.turn[atom];
                    queue.push_back(nbr);
                }
            }
        }
    }

    /// Drop a ring system so that `anchor` lands on `target` and the system
    /// extends along `direction`.
    fn place_system(
        &mut self,
        system: usize,
        anchor: usize,
        target: Point,
        direction: f64,
        queue: &mut VecDeque<usize>,
    ) {
        let local = self.systems[system].clone();
        let Some(&anchor_local) = local.get(&anchor) else {
            return;
        };
        let local_center = centroid(local.values().copied());
        let local_dir = (local_center - anchor_local)
            .normalized()
            .map(|d| d.angle())
            .unwrap_or(0.0);
        let rotation = direction - local_dir;

        self.system_placed[system] = true;
        self.positions[anchor] = Some(target);
        queue.push_back(anchor);
        for (atom, p) in local {
            if atom == anchor {
                continue;
            }
            self.positions[atom] = Some(target + (p - anchor_local).rotated(rotation));
            queue.push_back(atom);
        }
    }

    /// Triple bonds and cumulated double bonds keep their atom straight.
    fn is_linear(&self, atom: usize) -> bool {
        let mut doubles = 0;
        for &(_, bond) in self.mol.neighbors(atom) {
            match self.mol.bond(bond).order {
                BondOrder::Triple | BondOrder::Quadruple => return true,
                BondOrder::Double => doubles += 1,
                _ => {}
            }
        }
        doubles >= 2
    }

    /// Shift a finished component to the right of the previous ones,
    /// vertically centered on the x axis.
    fn pack(&mut self, component: &[usize]) {
        let Some(bounds) = Bounds::of(component.iter().filter_map(|&a| self.positions[a])) else {
            return;
        };
        let shift_x = match self.cursor {
            Some(right) => right + COMPONENT_GAP - bounds.min.x,
            None => 0.0,
        };
        let shift = Point::new(shift_x, -bounds.center().y);
        for &atom in component {
            if let Some(p) = self.positions[atom] {
                self.positions[atom] = Some(p + shift);
            }
        }
        self.cursor = Some(bounds.max.x + shift_x);
    }

    /// Push apart non-bonded atoms that ended up on top of each other.
    fn relax(&mut self) {
        let n = self.positions.len();
        for _ in 0..RELAX_ITERATIONS {
            let mut moved = false;
            for i in 0..n {
                for j in (i + 1)..n {
                    if self.mol.bond_between(i, j).is_some() {
                        continue;
                    }
                    let (Some(pi), Some(pj)) = (self.positions[i], self.positions[j]) else {
                        continue;
                    };
                    let delta = pj - pi;
                    let dist = delta.length();
                    if dist >= MIN_ATOM_DISTANCE {
                        continue;
                    }
                    let dir = delta.normalized().unwrap_or(Point::new(1.0, 0.0));
                    let push = dir * ((MIN_ATOM_DISTANCE - dist) / 2.0);
                    self.positions[i] = Some(pi - push);
                    self.positions[j] = Some(pj + push);
                    moved = true;
                }
            }
            if !moved {
                break;
            }
        }
    }
}

/// Directions (radians) for `count` new bonds around an atom whose existing
/// bonds point along `placed`.
fn choose_angles(placed: &[f64], count: usize, linear: bool, turn: f64) -> Vec<f64> {
    match placed {
        [] => {
            let start = -PI / 6.0;
            (0..count)
                .map(|i| start + TAU * i as f64 / count as f64)
                .collect()
        }
        [back] => {
            let back = *back;
            match count {
                1 if linear => vec![back + PI],
                1 => vec![back + turn * 2.0 * PI / 3.0],
                2 => vec![back + turn * 2.0 * PI / 3.0, back - turn * 2.0 * PI / 3.0],
                _ => (1..=count)
                    .map(|i| back + TAU * i as f64 / (count + 1) as f64)
                    .collect(),
            }
        }
        _ => {
            let mut sorted: Vec<f64> = placed.iter().map(|&a| normalize_angle(a)).collect();
            sorted.sort_by(|a, b| a.total_cmp(b));
            let mut best_start = sorted[sorted.len() - 1];
            let mut best_gap = sorted[0] + TAU - best_start;
            for pair in sorted.windows(2) {
                let gap = pair[1] - pair[0];
                if gap > best_gap {
                    best_gap = gap;
                    best_start = pair[0];
                }
            }
            (1..=count)
                .map(|i| best_start + best_gap * i as f64 / (count + 1) as f64)
                .collect()
        }
    }
}
