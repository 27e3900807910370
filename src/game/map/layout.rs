use std::collections::BTreeMap;
use crate::game::map::graph::MapGraph;

/// Final map rectangle the layout is scaled into.
pub const MAP_WIDTH: f64 = 1600.0;
pub const MAP_HEIGHT: f64 = 1200.0;
pub const MAP_PADDING: f64 = 80.0;

pub const LAYOUT_ITERATIONS: usize = 150;

const MIN_DISTANCE: f64 = 0.01;

/// Force-directed relaxation of the seeded cluster layout.
///
/// Fruchterman-Reingold with the repulsion constant `0.5/sqrt(|V|)` and a linearly cooling
/// temperature. Nodes listed in `fixed` (Founder's World) never move. Nodes are visited in
/// ascending id order and pair forces accumulated in that same order, which pins the floating
/// point summation order and keeps the layout reproducible for a seed.
pub fn spring_layout(
    graph: &MapGraph,
    initial: &BTreeMap<i32, (f64, f64)>,
    fixed: &[i32],
    iterations: usize,
) -> BTreeMap<i32, (f64, f64)> {
    let nodes = graph.nodes();
    let count = nodes.len();
    if count == 0 {
        return BTreeMap::new();
    }

    let mut positions: Vec<(f64, f64)> = nodes.iter()
        .map(|node| *initial.get(node).unwrap_or(&(0.5, 0.5)))
        .collect();
    let index_of: BTreeMap<i32, usize> = nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();
    let movable: Vec<bool> = nodes.iter().map(|node| !fixed.contains(node)).collect();
    let edges: Vec<(usize, usize)> = graph.edges().iter()
        .map(|(a, b)| (index_of[a], index_of[b]))
        .collect();

    let k = 0.5 / (count as f64).sqrt();
    let mut temperature = 0.1;
    let cooling = temperature / (iterations as f64 + 1.0);

    for _ in 0..iterations {
        let mut displacement = vec![(0.0, 0.0); count];

        // Repulsion between every pair
        for i in 0..count {
            for j in (i + 1)..count {
                let dx = positions[i].0 - positions[j].0;
                let dy = positions[i].1 - positions[j].1;
                let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                let force = k * k / distance;
                let fx = dx / distance * force;
                let fy = dy / distance * force;
                displacement[i].0 += fx;
                displacement[i].1 += fy;
                displacement[j].0 -= fx;
                displacement[j].1 -= fy;
            }
        }

        // Attraction along edges
        for (i, j) in edges.iter().cloned() {
            let dx = positions[i].0 - positions[j].0;
            let dy = positions[i].1 - positions[j].1;
            let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
            let force = distance * distance / k;
            let fx = dx / distance * force;
            let fy = dy / distance * force;
            displacement[i].0 -= fx;
            displacement[i].1 -= fy;
            displacement[j].0 += fx;
            displacement[j].1 += fy;
        }

        for i in 0..count {
            if !movable[i] {
                continue;
            }
            let (dx, dy) = displacement[i];
            let length = (dx * dx + dy * dy).sqrt().max(1e-9);
            let step = length.min(temperature);
            positions[i].0 += dx / length * step;
            positions[i].1 += dy / length * step;
        }
        temperature -= cooling;
    }

    nodes.into_iter().zip(positions.into_iter()).collect()
}

/// Affine-scales raw layout positions into the map rectangle and rounds to two decimals.
pub fn scale_to_map(positions: &BTreeMap<i32, (f64, f64)>) -> BTreeMap<i32, (f64, f64)> {
    let xs: Vec<f64> = positions.values().map(|p| p.0).collect();
    let ys: Vec<f64> = positions.values().map(|p| p.1).collect();
    let min_x = xs.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_x = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min_y = ys.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_y = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let range_x = if max_x - min_x > 0.0 { max_x - min_x } else { 1.0 };
    let range_y = if max_y - min_y > 0.0 { max_y - min_y } else { 1.0 };

    positions.iter().map(|(node, (x, y))| {
        let sx = MAP_PADDING + (x - min_x) / range_x * (MAP_WIDTH - 2.0 * MAP_PADDING);
        let sy = MAP_PADDING + (y - min_y) / range_y * (MAP_HEIGHT - 2.0 * MAP_PADDING);
        (*node, (round2(sx), round2(sy)))
    }).collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_graph() -> (MapGraph, BTreeMap<i32, (f64, f64)>) {
        let mut graph = MapGraph::new();
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);
        graph.add_edge(3, 0);

        let mut initial = BTreeMap::new();
        initial.insert(0, (0.5, 0.5));
        initial.insert(1, (0.4, 0.6));
        initial.insert(2, (0.6, 0.6));
        initial.insert(3, (0.6, 0.4));
        (graph, initial)
    }

    #[test]
    fn test_fixed_node_does_not_move() {
        let (graph, initial) = square_graph();
        let positions = spring_layout(&graph, &initial, &[0], LAYOUT_ITERATIONS);

        assert_eq!((0.5, 0.5), positions[&0]);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let (graph, initial) = square_graph();
        let a = spring_layout(&graph, &initial, &[0], LAYOUT_ITERATIONS);
        let b = spring_layout(&graph, &initial, &[0], LAYOUT_ITERATIONS);

        assert_eq!(a, b);
    }

    #[test]
    fn test_scale_to_map_bounds() {
        let (graph, initial) = square_graph();
        let positions = scale_to_map(&spring_layout(&graph, &initial, &[0], LAYOUT_ITERATIONS));

        for (x, y) in positions.values() {
            assert!(*x >= MAP_PADDING - 0.01 && *x <= MAP_WIDTH - MAP_PADDING + 0.01);
            assert!(*y >= MAP_PADDING - 0.01 && *y <= MAP_HEIGHT - MAP_PADDING + 0.01);
        }
    }

    #[test]
    fn test_scale_rounds_to_two_decimals() {
        let (graph, initial) = square_graph();
        let positions = scale_to_map(&spring_layout(&graph, &initial, &[0], LAYOUT_ITERATIONS));

        for (x, y) in positions.values() {
            assert_eq!(*x, (*x * 100.0).round() / 100.0);
            assert_eq!(*y, (*y * 100.0).round() / 100.0);
        }
    }
}
