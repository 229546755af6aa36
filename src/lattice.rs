use rand::Rng;

use crate::types::{AbcParams, Category, Node};

pub const GRID_SPACING: f64 = 1.2;
pub const DEPTH_HALF_RANGE: f64 = 2.0;

pub const EXCITATION_RADIUS: f64 = 4.0;
pub const EXCITATION_PROBABILITY: f64 = 0.5;
pub const EXCITATION_ENERGY_GAIN: f64 = 1.5;
pub const EXCITATION_MAX_LIFT: f64 = 2.0;

/// Lays `count` nodes out on a centred square grid of side `ceil(sqrt(count))`.
///
/// Categories cycle diagonally through `a, b, c`; each node takes its energy from the
/// matching parameter. Only the depth coordinate is random.
pub fn generate_nodes<R: Rng + ?Sized>(count: usize, params: &AbcParams, rng: &mut R) -> Vec<Node> {
    let side = grid_side(count);
    let half = side as f64 / 2.0;

    (0..count)
        .map(|id| {
            let row = id / side;
            let col = id % side;
            let category = Category::ALL[(row + col) % 3];

            Node {
                id,
                category,
                energy: params.energy_of(category),
                x: (col as f64 - half) * GRID_SPACING,
                y: (row as f64 - half) * GRID_SPACING,
                z: rng.random_range(-DEPTH_HALF_RANGE..DEPTH_HALF_RANGE),
                excited: false,
            }
        })
        .collect()
}

/// Excites a random half of the nodes near the origin.
///
/// Returns a fresh list; untouched nodes are copied through. Already excited nodes are
/// eligible again, so repeated injections compound their energy.
pub fn inject_mass<R: Rng + ?Sized>(nodes: &[Node], rng: &mut R) -> Vec<Node> {
    nodes
        .iter()
        .map(|node| {
            if node.distance_from_origin() < EXCITATION_RADIUS
                && rng.random_bool(EXCITATION_PROBABILITY)
            {
                Node {
                    excited: true,
                    energy: node.energy * EXCITATION_ENERGY_GAIN,
                    z: node.z + rng.random_range(0.0..EXCITATION_MAX_LIFT),
                    ..*node
                }
            } else {
                *node
            }
        })
        .collect()
}

fn grid_side(count: usize) -> usize {
    let mut side = (count as f64).sqrt().ceil() as usize;
    // guard against float rounding on perfect squares
    while side * side < count {
        side += 1;
    }
    side.max(1)
}
