//! Position estimation from Kepler elements, nearest-neighbour tour seeding,
//! and 2-opt refinement for in-system visit order.

use crate::model::{BodyId, LIGHT_SECOND_M};

/// Orbital elements shared by a body or bary-centre, enough to place it at
/// a given offset `dt` (seconds) from its journal-reported epoch.
#[derive(Clone, Copy, Debug)]
pub struct OrbitalNode {
    pub body_id: BodyId,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub orbital_inclination: f64,
    pub periapsis: f64,
    pub orbital_period: f64,
    pub ascending_node: f64,
    pub mean_anomaly: f64,
    /// Primary orbital parent, if any (see `PlanetDetails::primary_parent`).
    pub parent: Option<BodyId>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub body_id: BodyId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Solves `E - e*sin(E) = M` via Newton-Raphson, 10 iterations or
/// `|ΔE| < 1e-9`, whichever comes first.
pub fn solve_kepler(mean_anomaly_rad: f64, eccentricity: f64) -> f64 {
    const MAX_ITERATIONS: usize = 10;
    const PRECISION: f64 = 1e-9;

    let mut e_anomaly = mean_anomaly_rad;
    for _ in 0..MAX_ITERATIONS {
        let delta = (e_anomaly - eccentricity * e_anomaly.sin() - mean_anomaly_rad)
            / (1.0 - eccentricity * e_anomaly.cos());
        e_anomaly -= delta;
        if delta.abs() < PRECISION {
            break;
        }
    }
    e_anomaly
}

/// Position relative to the orbit's own centre at offset `dt` seconds,
/// via the 3-2-1 (`Ω, ω, i`) rotation pinned from the reference solver.
pub fn relative_position(node: &OrbitalNode, dt: f64) -> Location {
    if node.orbital_period <= 0.0 {
        return Location { body_id: node.body_id, x: 0.0, y: 0.0, z: 0.0 };
    }

    let n = (2.0 * std::f64::consts::PI) / node.orbital_period;
    let m = node.mean_anomaly.to_radians() + n * dt;
    let e_anom = solve_kepler(m, node.eccentricity);

    let x_orb = node.semi_major_axis * (e_anom.cos() - node.eccentricity);
    let y_orb =
        node.semi_major_axis * (1.0 - node.eccentricity.powi(2)).sqrt() * e_anom.sin();

    let i = node.orbital_inclination.to_radians();
    let w = node.periapsis.to_radians();
    let lan = node.ascending_node.to_radians();

    let x = x_orb * (lan.cos() * w.cos() - lan.sin() * w.sin() * i.cos())
        - y_orb * (lan.cos() * w.sin() + lan.sin() * w.cos() * i.cos());
    let y = x_orb * (lan.sin() * w.cos() + lan.cos() * w.sin() * i.cos())
        + y_orb * (lan.cos() * w.cos() * i.cos() - lan.sin() * w.sin());
    let z = x_orb * (w.sin() * i.sin()) + y_orb * (w.cos() * i.sin());

    Location { body_id: node.body_id, x, y, z }
}

/// Sums relative positions along the parent chain up to the system root,
/// using each node's position at `dt = 0`.
pub fn absolute_positions(nodes: &[OrbitalNode]) -> Vec<Location> {
    use std::collections::HashMap;

    let registry: HashMap<BodyId, &OrbitalNode> =
        nodes.iter().map(|n| (n.body_id, n)).collect();
    let rel_coords: HashMap<BodyId, Location> = nodes
        .iter()
        .map(|n| (n.body_id, relative_position(n, 0.0)))
        .collect();

    let mut out = Vec::with_capacity(nodes.len());
    for start in nodes {
        let mut abs = (0.0, 0.0, 0.0);
        let mut current_id = start.body_id;
        loop {
            let Some(node) = registry.get(&current_id) else { break };
            let rel = rel_coords[&current_id];
            abs.0 += rel.x;
            abs.1 += rel.y;
            abs.2 += rel.z;
            match node.parent {
                Some(parent_id) => current_id = parent_id,
                None => break,
            }
        }
        out.push(Location { body_id: start.body_id, x: abs.0, y: abs.1, z: abs.2 });
    }
    out
}

fn squared_distance(a: &Location, b: &Location) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    dx * dx + dy * dy + dz * dz
}

/// Euclidean distance between two points, in metres.
pub fn distance_m(a: &Location, b: &Location) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Euclidean distance between two points, in light-seconds.
pub fn distance_ls(a: &Location, b: &Location) -> f64 {
    distance_m(a, b) / LIGHT_SECOND_M
}

/// Nearest-Neighbour seed tour, locked to start at index 0.
pub fn nearest_neighbour_seed(positions: &[Location]) -> Vec<Location> {
    if positions.is_empty() {
        return Vec::new();
    }

    let mut visited = vec![false; positions.len()];
    let mut current_idx = 0usize;
    let mut path = vec![positions[current_idx]];
    visited[current_idx] = true;

    for _ in 1..positions.len() {
        let mut min_d2 = f64::MAX;
        let mut next_idx = current_idx;
        for (j, candidate) in positions.iter().enumerate() {
            if visited[j] {
                continue;
            }
            let d2 = squared_distance(&positions[current_idx], candidate);
            if d2 < min_d2 {
                min_d2 = d2;
                next_idx = j;
            }
        }
        visited[next_idx] = true;
        path.push(positions[next_idx]);
        current_idx = next_idx;
    }

    path
}

/// Open-TSP 2-opt refinement with the start position locked at index 0:
/// reverses improving segments until no improving swap remains.
pub fn two_opt_refine(mut path: Vec<Location>) -> Vec<Location> {
    const IMPROVEMENT_THRESHOLD: f64 = 1e-6;

    if path.len() < 4 {
        return path;
    }

    let n = path.len();
    let mut improved = true;
    while improved {
        improved = false;
        for i in 1..n - 2 {
            for j in (i + 1)..(n - 1) {
                let dist_current = distance_m(&path[i - 1], &path[i]) + distance_m(&path[j], &path[j + 1]);
                let dist_new = distance_m(&path[i - 1], &path[j]) + distance_m(&path[i], &path[j + 1]);

                if dist_current - dist_new > IMPROVEMENT_THRESHOLD {
                    path[i..=j].reverse();
                    improved = true;
                }
            }
        }
    }

    path
}

/// Partitions scanned bodies by `parent_planet` (bodies without one form the
/// `-1` group), and produces an independently-solved visit order per group.
pub fn plan_tour(nodes: &[OrbitalNode], group_of: impl Fn(BodyId) -> BodyId) -> Vec<(BodyId, Vec<Location>)> {
    use std::collections::BTreeMap;

    let mut groups: BTreeMap<BodyId, Vec<OrbitalNode>> = BTreeMap::new();
    for node in nodes {
        groups.entry(group_of(node.body_id)).or_default().push(*node);
    }

    groups
        .into_iter()
        .map(|(group, members)| {
            let positions = absolute_positions(&members);
            let seed = nearest_neighbour_seed(&positions);
            (group, two_opt_refine(seed))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(body_id: BodyId, a: f64, e: f64, period: f64) -> OrbitalNode {
        OrbitalNode {
            body_id,
            semi_major_axis: a,
            eccentricity: e,
            orbital_inclination: 0.0,
            periapsis: 0.0,
            orbital_period: period,
            ascending_node: 0.0,
            mean_anomaly: 0.0,
            parent: None,
        }
    }

    #[test]
    fn kepler_round_trip_within_tolerance() {
        for &(m, e) in &[(0.3, 0.1), (1.5, 0.5), (2.9, 0.85)] {
            let solved = solve_kepler(m, e);
            let residual = (solved - e * solved.sin() - m).abs();
            assert!(residual < 1e-8, "residual {residual} too large for m={m} e={e}");
        }
    }

    #[test]
    fn two_opt_never_worsens_seed() {
        let positions = vec![
            Location { body_id: 0, x: 0.0, y: 0.0, z: 0.0 },
            Location { body_id: 1, x: 10.0, y: 0.0, z: 0.0 },
            Location { body_id: 2, x: 10.0, y: 10.0, z: 0.0 },
            Location { body_id: 3, x: 0.0, y: 10.0, z: 0.0 },
            Location { body_id: 4, x: 5.0, y: 5.0, z: 0.0 },
        ];
        let seed = nearest_neighbour_seed(&positions);
        let seed_len: f64 = seed.windows(2).map(|w| distance_m(&w[0], &w[1])).sum();
        let refined = two_opt_refine(seed.clone());
        let refined_len: f64 = refined.windows(2).map(|w| distance_m(&w[0], &w[1])).sum();
        assert!(refined_len <= seed_len + 1e-9);
        assert_eq!(refined[0], seed[0]);
    }

    #[test]
    fn distance_ls_matches_light_second_constant() {
        let a = Location { body_id: 0, x: 0.0, y: 0.0, z: 0.0 };
        let b = Location { body_id: 1, x: LIGHT_SECOND_M, y: 0.0, z: 0.0 };
        assert!((distance_ls(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn absolute_position_sums_parent_chain() {
        let mut star = node(0, 0.0, 0.0, 0.0);
        star.orbital_period = 0.0;
        let mut planet = node(1, 1.0e9, 0.0, 1000.0);
        planet.parent = Some(0);
        let positions = absolute_positions(&[star, planet]);
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].body_id, 0);
    }
}
