use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Minimal undirected adjacency-list graph used by the map generator.
///
/// Nodes are system ids. Ordered containers keep every traversal deterministic for a given
/// edge set, which the seeded generator relies on.
#[derive(Clone, Debug)]
pub struct MapGraph {
    adjacency: BTreeMap<i32, BTreeSet<i32>>,
}

impl MapGraph {
    pub fn new() -> Self {
        MapGraph { adjacency: BTreeMap::new() }
    }

    pub fn add_node(&mut self, node: i32) {
        self.adjacency.entry(node).or_insert_with(BTreeSet::new);
    }

    /// Inserts an undirected edge. Self-loops are ignored; inserting an existing edge is a no-op.
    pub fn add_edge(&mut self, a: i32, b: i32) {
        if a == b {
            return;
        }
        self.add_node(a);
        self.add_node(b);
        self.adjacency.get_mut(&a).map(|n| n.insert(b));
        self.adjacency.get_mut(&b).map(|n| n.insert(a));
    }

    pub fn has_edge(&self, a: i32, b: i32) -> bool {
        self.adjacency.get(&a).map_or(false, |n| n.contains(&b))
    }

    pub fn degree(&self, node: i32) -> usize {
        self.adjacency.get(&node).map_or(0, |n| n.len())
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn nodes(&self) -> Vec<i32> {
        self.adjacency.keys().cloned().collect()
    }

    pub fn neighbors(&self, node: i32) -> Vec<i32> {
        self.adjacency.get(&node).map_or_else(Vec::new, |n| n.iter().cloned().collect())
    }

    /// Every edge once, as `(min, max)` pairs in ascending order.
    pub fn edges(&self) -> Vec<(i32, i32)> {
        let mut edges = vec![];
        for (node, neighbors) in self.adjacency.iter() {
            for neighbor in neighbors.iter() {
                if node < neighbor {
                    edges.push((*node, *neighbor));
                }
            }
        }
        edges
    }

    /// Connected components as sorted node lists, ordered by their smallest node.
    pub fn connected_components(&self) -> Vec<Vec<i32>> {
        let mut seen = BTreeSet::new();
        let mut components = vec![];

        for start in self.adjacency.keys() {
            if seen.contains(start) {
                continue;
            }
            let component = self.reachable_from(*start);
            seen.extend(component.iter().cloned());
            components.push(component.into_iter().collect());
        }
        components
    }

    pub fn is_connected(&self) -> bool {
        self.connected_components().len() <= 1
    }

    /// All nodes reachable from `start`, including `start` itself.
    pub fn reachable_from(&self, start: i32) -> BTreeSet<i32> {
        let mut seen = BTreeSet::new();
        if !self.adjacency.contains_key(&start) {
            return seen;
        }
        let mut queue = VecDeque::new();
        seen.insert(start);
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            for neighbor in self.neighbors(node) {
                if seen.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        seen
    }

    pub fn has_path(&self, from: i32, to: i32) -> bool {
        self.reachable_from(from).contains(&to)
    }

    /// The subgraph induced by `keep`: those nodes and every edge with both endpoints kept.
    pub fn induced(&self, keep: &BTreeSet<i32>) -> MapGraph {
        let mut subgraph = MapGraph::new();
        for node in keep.iter() {
            if self.adjacency.contains_key(node) {
                subgraph.add_node(*node);
            }
        }
        for (a, b) in self.edges() {
            if keep.contains(&a) && keep.contains(&b) {
                subgraph.add_edge(a, b);
            }
        }
        subgraph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph(nodes: &[i32]) -> MapGraph {
        let mut graph = MapGraph::new();
        for window in nodes.windows(2) {
            graph.add_edge(window[0], window[1]);
        }
        graph
    }

    #[test]
    fn test_add_edge_is_undirected_and_deduplicated() {
        let mut graph = MapGraph::new();
        graph.add_edge(1, 2);
        graph.add_edge(2, 1);
        graph.add_edge(1, 1);

        assert_eq!(true, graph.has_edge(1, 2));
        assert_eq!(true, graph.has_edge(2, 1));
        assert_eq!(vec![(1, 2)], graph.edges());
        assert_eq!(1, graph.degree(1));
    }

    #[test]
    fn test_connected_components() {
        let mut graph = path_graph(&[0, 1, 2]);
        graph.add_edge(10, 11);
        graph.add_node(20);

        let components = graph.connected_components();
        assert_eq!(3, components.len());
        assert_eq!(vec![0, 1, 2], components[0]);
        assert_eq!(vec![10, 11], components[1]);
        assert_eq!(vec![20], components[2]);
        assert_eq!(false, graph.is_connected());
    }

    #[test]
    fn test_has_path() {
        let graph = path_graph(&[0, 1, 2, 3]);
        assert_eq!(true, graph.has_path(0, 3));
        assert_eq!(false, graph.has_path(0, 42));
    }

    #[test]
    fn test_induced_subgraph_drops_crossing_edges() {
        let mut graph = path_graph(&[0, 1, 2, 3]);
        graph.add_edge(1, 3);

        let keep: BTreeSet<i32> = vec![0, 1, 3].into_iter().collect();
        let subgraph = graph.induced(&keep);

        assert_eq!(3, subgraph.node_count());
        assert_eq!(true, subgraph.has_edge(0, 1));
        assert_eq!(true, subgraph.has_edge(1, 3));
        assert_eq!(false, subgraph.has_edge(2, 3));
        assert_eq!(false, subgraph.has_path(0, 2));
    }
}
