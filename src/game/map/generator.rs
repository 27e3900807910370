use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;
use crate::game::{
    rng::GameRng,
    map::{
        graph::MapGraph,
        layout::{spring_layout, scale_to_map, LAYOUT_ITERATIONS},
        names::{FOUNDERS_WORLD_NAME, STAR_NAMES},
    },
};

pub const MIN_PLAYERS: i32 = 2;
pub const MAX_PLAYERS: i32 = 8;

/// The central objective system. It belongs to no cluster and is pinned at the map center.
pub const FOUNDERS_WORLD_ID: i32 = 0;

/// Target degree cap for every system. Repair passes may exceed it as a last resort when no
/// under-degree placement preserves the topological guarantees; such edges are reported on
/// the generated map.
pub const MAX_SYSTEM_DEGREE: usize = 4;

/// Systems reserved up front for each player's home cluster; the first one is the home system.
pub const HOME_CLUSTER_SYSTEMS: i32 = 3;

pub const HOME_MINING_VALUE: i32 = 5;

const MAX_EXTRA_CLUSTER_EDGES: usize = 2;
const PLAYER_RING_RADIUS: f64 = 0.2;
const NEUTRAL_RING_RADIUS: f64 = 0.15;
const ANCHOR_JITTER: f64 = 0.05;

#[derive(Clone, Debug)]
pub struct GeneratedSystem {
    pub id: i32,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub mining_value: i32,
    pub cluster_id: i32,
    pub is_home_system: bool,
    pub is_founders_world: bool,
    pub owner_player_index: Option<i32>,
}

#[derive(Clone, Debug)]
pub struct GeneratedCluster {
    pub id: i32,
    /// `Some` for a player home cluster, `None` for a neutral cluster.
    pub player_index: Option<i32>,
    pub system_ids: Vec<i32>,
}

impl GeneratedCluster {
    pub fn is_home_cluster(&self) -> bool {
        self.player_index.is_some()
    }

    /// The first system added to a home cluster is the player's home system.
    pub fn home_system_id(&self) -> Option<i32> {
        if self.is_home_cluster() {
            self.system_ids.first().cloned()
        } else {
            None
        }
    }
}

#[derive(Clone, Debug)]
pub struct GeneratedMap {
    pub systems: Vec<GeneratedSystem>,
    pub jump_lines: Vec<(i32, i32)>,
    pub clusters: Vec<GeneratedCluster>,
    /// Edges placed by a repair pass on a system that was already at the degree cap.
    pub fallback_edges: Vec<(i32, i32)>,
}

/// Generates the complete star map for `num_players` (2-8). Fully deterministic per seed:
/// the same `(num_players, seed)` yields identical systems, edges, positions and names.
pub fn generate_map(num_players: i32, seed: u32) -> GeneratedMap {
    let mut rng = GameRng::new(seed);

    let num_systems = rng.rand_int(4 * num_players, 7 * num_players) + 1;
    let mut clusters = build_clusters(num_players, &mut rng);
    distribute_systems(num_systems, &mut clusters, &mut rng);

    let mut fallback_edges = vec![];
    let (mut graph, ring, bridges) = build_graph(&clusters, &mut rng, &mut fallback_edges);
    repair_safe_paths(&mut graph, &clusters, &mut fallback_edges);

    let positions = compute_layout(&graph, &clusters, &ring, &bridges, &mut rng);
    let names = assign_names(num_systems, &mut rng);
    let mining_values = roll_mining_values(&graph, &clusters, &mut rng);

    let cluster_of: BTreeMap<i32, i32> = clusters.iter()
        .flat_map(|c| c.system_ids.iter().map(move |sid| (*sid, c.id)))
        .collect();
    let home_owner: BTreeMap<i32, i32> = clusters.iter()
        .filter_map(|c| c.home_system_id().map(|sid| (sid, c.player_index.unwrap())))
        .collect();

    let systems = graph.nodes().into_iter().map(|id| {
        let (x, y) = positions[&id];
        GeneratedSystem {
            id,
            name: names[id as usize].clone(),
            x,
            y,
            mining_value: mining_values[&id],
            cluster_id: cluster_of.get(&id).cloned().unwrap_or(-1),
            is_home_system: home_owner.contains_key(&id),
            is_founders_world: id == FOUNDERS_WORLD_ID,
            owner_player_index: home_owner.get(&id).cloned(),
        }
    }).collect();

    GeneratedMap {
        systems,
        jump_lines: graph.edges(),
        clusters,
        fallback_edges,
    }
}

/// One home cluster per player (player_index 1..N), then 1 to N/2+1 neutral clusters.
fn build_clusters(num_players: i32, rng: &mut GameRng) -> Vec<GeneratedCluster> {
    let mut clusters = vec![];
    for i in 0..num_players {
        clusters.push(GeneratedCluster {
            id: i,
            player_index: Some(i + 1),
            system_ids: vec![],
        });
    }
    let num_neutral = std::cmp::max(1, rng.rand_int(1, std::cmp::max(1, num_players / 2 + 1)));
    for i in 0..num_neutral {
        clusters.push(GeneratedCluster {
            id: num_players + i,
            player_index: None,
            system_ids: vec![],
        });
    }
    clusters
}

/// Assigns system ids to clusters. Id 0 is Founder's World and stays clusterless. Every home
/// cluster gets its reserved block, every neutral cluster gets at least one system, and the
/// remainder lands on a uniformly random cluster.
fn distribute_systems(num_systems: i32, clusters: &mut Vec<GeneratedCluster>, rng: &mut GameRng) {
    let mut next_id = 1;
    for cluster in clusters.iter_mut().filter(|c| c.is_home_cluster()) {
        for _ in 0..HOME_CLUSTER_SYSTEMS {
            cluster.system_ids.push(next_id);
            next_id += 1;
        }
    }
    for cluster in clusters.iter_mut().filter(|c| !c.is_home_cluster()) {
        cluster.system_ids.push(next_id);
        next_id += 1;
    }

    let indices: Vec<usize> = (0..clusters.len()).collect();
    while next_id < num_systems {
        let target = *rng.choice(&indices).unwrap();
        clusters[target].system_ids.push(next_id);
        next_id += 1;
    }
}

fn under_degree(graph: &MapGraph, ids: &[i32]) -> Vec<i32> {
    ids.iter().cloned().filter(|id| graph.degree(*id) < MAX_SYSTEM_DEGREE).collect()
}

/// Adds one edge between the two system groups, preferring under-degree endpoints on both
/// sides. When a side has no under-degree system the edge is still placed (the guarantees of
/// the ring and the neutral bridges are unconditional) and recorded as a fallback.
fn connect_groups(
    graph: &mut MapGraph,
    group_a: &[i32],
    group_b: &[i32],
    rng: &mut GameRng,
    fallback_edges: &mut Vec<(i32, i32)>,
) {
    let candidates_a = under_degree(graph, group_a);
    let candidates_b = under_degree(graph, group_b);
    let over_cap = candidates_a.is_empty() || candidates_b.is_empty();

    let pool_a: &[i32] = if candidates_a.is_empty() { group_a } else { &candidates_a };
    let pool_b: &[i32] = if candidates_b.is_empty() { group_b } else { &candidates_b };
    let a = *rng.choice(pool_a).unwrap();
    let b = *rng.choice(pool_b).unwrap();

    if over_cap && !graph.has_edge(a, b) {
        log::warn!("degree cap exceeded to connect systems {} and {}", a, b);
        fallback_edges.push((a.min(b), a.max(b)));
    }
    graph.add_edge(a, b);
}

type BridgeAssignments = BTreeMap<usize, (usize, usize)>;

/// Builds the jump-line graph: intra-cluster paths with a couple of extra edges, the player
/// ring, one neutral bridge cluster per ring segment, Founder's World spokes, and a final
/// connectivity repair. Returns the graph, the ring order (indices into `clusters`) and the
/// player-cluster pair each neutral cluster bridges.
fn build_graph(
    clusters: &[GeneratedCluster],
    rng: &mut GameRng,
    fallback_edges: &mut Vec<(i32, i32)>,
) -> (MapGraph, Vec<usize>, BridgeAssignments) {
    let mut graph = MapGraph::new();
    graph.add_node(FOUNDERS_WORLD_ID);
    for cluster in clusters {
        for sid in cluster.system_ids.iter() {
            graph.add_node(*sid);
        }
    }

    // Intra-cluster: spanning path over shuffled systems, then up to two extra edges
    for cluster in clusters {
        let mut ids = cluster.system_ids.clone();
        if ids.len() < 2 {
            continue;
        }
        rng.shuffle(&mut ids);
        for window in ids.windows(2) {
            graph.add_edge(window[0], window[1]);
        }
        for _ in 0..MAX_EXTRA_CLUSTER_EDGES {
            let candidates: Vec<(i32, i32)> = ids.iter().flat_map(|a| {
                ids.iter()
                    .filter(move |b| a < *b)
                    .map(move |b| (*a, *b))
            })
                .filter(|(a, b)| !graph.has_edge(*a, *b))
                .filter(|(a, b)| {
                    graph.degree(*a) < MAX_SYSTEM_DEGREE && graph.degree(*b) < MAX_SYSTEM_DEGREE
                })
                .collect();
            match rng.choice(&candidates) {
                Some((a, b)) => graph.add_edge(*a, *b),
                None => break,
            }
        }
    }

    // Player ring: shuffle the home clusters, connect each consecutive pair
    let mut ring: Vec<usize> = clusters.iter().enumerate()
        .filter(|(_, c)| c.is_home_cluster())
        .map(|(i, _)| i)
        .collect();
    rng.shuffle(&mut ring);
    let num_players = ring.len();
    let ring_pairs = if num_players == 2 { 1 } else { num_players };
    for i in 0..ring_pairs {
        let a = ring[i];
        let b = ring[(i + 1) % num_players];
        connect_groups(&mut graph, &clusters[a].system_ids, &clusters[b].system_ids, rng, fallback_edges);
    }

    // Neutral bridges: each neutral cluster spans one ring segment
    let neutral_indices: Vec<usize> = clusters.iter().enumerate()
        .filter(|(_, c)| !c.is_home_cluster())
        .map(|(i, _)| i)
        .collect();
    let mut bridges = BridgeAssignments::new();
    for (i, neutral) in neutral_indices.iter().enumerate() {
        let a = ring[i % num_players];
        let b = ring[(i + 1) % num_players];
        bridges.insert(*neutral, (a, b));
        for player_cluster in [a, b].iter() {
            connect_groups(
                &mut graph,
                &clusters[*neutral].system_ids,
                &clusters[*player_cluster].system_ids,
                rng,
                fallback_edges,
            );
        }
    }

    // Founder's World spokes: at most one per cluster, bounded by its own degree cap
    for cluster in clusters {
        if graph.degree(FOUNDERS_WORLD_ID) >= MAX_SYSTEM_DEGREE {
            break;
        }
        let candidates = under_degree(&graph, &cluster.system_ids);
        if let Some(target) = rng.choice(&candidates) {
            graph.add_edge(FOUNDERS_WORLD_ID, *target);
        }
    }

    // Connectivity repair: bridge components until the graph is whole
    loop {
        let components = graph.connected_components();
        if components.len() <= 1 {
            break;
        }
        connect_groups(&mut graph, &components[0], &components[1], rng, fallback_edges);
    }

    (graph, ring, bridges)
}

/// Guarantees every player a path from home to Founder's World that only crosses their own
/// cluster, neutral clusters and Founder's World itself. Missing links are patched with the
/// cheapest intra-safe edge: under-degree endpoint pairs strictly preferred, then lowest
/// combined degree, ties broken on the smallest ids.
fn repair_safe_paths(
    graph: &mut MapGraph,
    clusters: &[GeneratedCluster],
    fallback_edges: &mut Vec<(i32, i32)>,
) {
    let neutral_systems: Vec<i32> = clusters.iter()
        .filter(|c| !c.is_home_cluster())
        .flat_map(|c| c.system_ids.iter().cloned())
        .collect();

    for cluster in clusters.iter().filter(|c| c.is_home_cluster()) {
        let home = match cluster.home_system_id() {
            Some(id) => id,
            None => continue,
        };
        let mut safe: BTreeSet<i32> = neutral_systems.iter().cloned().collect();
        safe.insert(FOUNDERS_WORLD_ID);
        safe.extend(cluster.system_ids.iter().cloned());

        loop {
            let subgraph = graph.induced(&safe);
            if subgraph.has_path(home, FOUNDERS_WORLD_ID) {
                break;
            }
            let home_side = subgraph.reachable_from(home);
            let fw_side = subgraph.reachable_from(FOUNDERS_WORLD_ID);

            let mut best: Option<(bool, usize, i32, i32)> = None;
            for a in home_side.iter() {
                for b in fw_side.iter() {
                    let over_cap = graph.degree(*a) >= MAX_SYSTEM_DEGREE
                        || graph.degree(*b) >= MAX_SYSTEM_DEGREE;
                    let candidate = (over_cap, graph.degree(*a) + graph.degree(*b), *a, *b);
                    if best.map_or(true, |current| candidate < current) {
                        best = Some(candidate);
                    }
                }
            }
            let (over_cap, _, a, b) = best.unwrap();
            if over_cap {
                log::warn!(
                    "degree cap exceeded to restore the safe path of player {}",
                    cluster.player_index.unwrap()
                );
                fallback_edges.push((a.min(b), a.max(b)));
            }
            graph.add_edge(a, b);
        }
    }
}

/// Seeds the layout with cluster anchors (players on an outer circle in ring order, neutral
/// clusters at the midpoint of their bridged pair), relaxes it with the force model and
/// scales the result into the map rectangle.
fn compute_layout(
    graph: &MapGraph,
    clusters: &[GeneratedCluster],
    ring: &[usize],
    bridges: &BridgeAssignments,
    rng: &mut GameRng,
) -> BTreeMap<i32, (f64, f64)> {
    let num_players = ring.len();
    let mut centers: BTreeMap<usize, (f64, f64)> = BTreeMap::new();
    for (position, cluster_index) in ring.iter().enumerate() {
        let angle = 2.0 * PI * position as f64 / num_players as f64;
        centers.insert(*cluster_index, (0.5 + PLAYER_RING_RADIUS * angle.cos(), 0.5 + PLAYER_RING_RADIUS * angle.sin()));
    }

    let neutral_indices: Vec<usize> = clusters.iter().enumerate()
        .filter(|(_, c)| !c.is_home_cluster())
        .map(|(i, _)| i)
        .collect();
    for (i, neutral) in neutral_indices.iter().enumerate() {
        let center = match bridges.get(neutral) {
            Some((a, b)) => {
                let (ax, ay) = centers[a];
                let (bx, by) = centers[b];
                ((ax + bx) / 2.0, (ay + by) / 2.0)
            },
            None => {
                let angle = 2.0 * PI * i as f64 / neutral_indices.len() as f64 + PI / 6.0;
                (0.5 + NEUTRAL_RING_RADIUS * angle.cos(), 0.5 + NEUTRAL_RING_RADIUS * angle.sin())
            },
        };
        centers.insert(*neutral, center);
    }

    let mut initial = BTreeMap::new();
    initial.insert(FOUNDERS_WORLD_ID, (0.5, 0.5));
    for (index, cluster) in clusters.iter().enumerate() {
        let (cx, cy) = centers[&index];
        for sid in cluster.system_ids.iter() {
            let jx = rng.jitter(-ANCHOR_JITTER, ANCHOR_JITTER);
            let jy = rng.jitter(-ANCHOR_JITTER, ANCHOR_JITTER);
            initial.insert(*sid, (cx + jx, cy + jy));
        }
    }

    scale_to_map(&spring_layout(graph, &initial, &[FOUNDERS_WORLD_ID], LAYOUT_ITERATIONS))
}

/// Shuffled star names handed out in id order; Founder's World keeps its fixed name and the
/// overflow falls back to a generated one.
fn assign_names(num_systems: i32, rng: &mut GameRng) -> Vec<String> {
    let mut pool: Vec<&str> = STAR_NAMES.to_vec();
    rng.shuffle(&mut pool);

    let mut names = vec![String::from(FOUNDERS_WORLD_NAME)];
    for id in 1..num_systems {
        match pool.get((id - 1) as usize) {
            Some(name) => names.push(String::from(*name)),
            None => names.push(format!("System {}", id)),
        }
    }
    names
}

/// 2d6-2 everywhere except Founder's World and the home systems, which are fixed at 5.
fn roll_mining_values(
    graph: &MapGraph,
    clusters: &[GeneratedCluster],
    rng: &mut GameRng,
) -> BTreeMap<i32, i32> {
    let home_ids: BTreeSet<i32> = clusters.iter()
        .filter_map(|c| c.home_system_id())
        .collect();

    graph.nodes().into_iter().map(|id| {
        let value = if id == FOUNDERS_WORLD_ID || home_ids.contains(&id) {
            HOME_MINING_VALUE
        } else {
            rng.rand_int(1, 6) + rng.rand_int(1, 6) - 2
        };
        (id, value)
    }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SEEDS: [u32; 4] = [1, 42, 99, 777];

    fn rebuild_graph(map: &GeneratedMap) -> MapGraph {
        let mut graph = MapGraph::new();
        for system in map.systems.iter() {
            graph.add_node(system.id);
        }
        for (a, b) in map.jump_lines.iter() {
            graph.add_edge(*a, *b);
        }
        graph
    }

    #[test]
    fn test_system_count_in_range() {
        for num_players in [2, 4, 6, 8].iter().cloned() {
            let map = generate_map(num_players, 42);
            let count = map.systems.len() as i32;
            assert!(count >= 4 * num_players + 1 && count <= 7 * num_players + 1,
                "expected {}-{} systems for {} players, got {}",
                4 * num_players + 1, 7 * num_players + 1, num_players, count);
        }
    }

    #[test]
    fn test_graph_is_connected() {
        for num_players in [2, 4, 6, 8].iter().cloned() {
            for seed in TEST_SEEDS.iter().cloned() {
                let map = generate_map(num_players, seed);
                assert!(rebuild_graph(&map).is_connected(),
                    "disconnected map for {} players, seed {}", num_players, seed);
            }
        }
    }

    #[test]
    fn test_degree_constraint() {
        for num_players in [2, 4, 6, 8].iter().cloned() {
            for seed in TEST_SEEDS.iter().cloned() {
                let map = generate_map(num_players, seed);
                let graph = rebuild_graph(&map);
                for system in map.systems.iter() {
                    let degree = graph.degree(system.id);
                    assert!(degree >= 1, "system {} is isolated (seed {})", system.id, seed);
                    if map.fallback_edges.is_empty() {
                        assert!(degree <= MAX_SYSTEM_DEGREE,
                            "system {} has degree {} (seed {})", system.id, degree, seed);
                    }
                }
                if !map.fallback_edges.is_empty() {
                    println!(
                        "warning: degree cap fallback fired for {} players, seed {}: {:?}",
                        num_players, seed, map.fallback_edges
                    );
                }
            }
        }
    }

    #[test]
    fn test_founders_world_exists_and_is_clusterless() {
        let map = generate_map(4, 42);
        let founders: Vec<&GeneratedSystem> = map.systems.iter()
            .filter(|s| s.is_founders_world)
            .collect();
        assert_eq!(1, founders.len());
        assert_eq!(FOUNDERS_WORLD_ID, founders[0].id);
        assert_eq!(-1, founders[0].cluster_id);
        assert_eq!(FOUNDERS_WORLD_NAME, founders[0].name);
    }

    #[test]
    fn test_home_systems_per_player() {
        for num_players in [2, 5, 8].iter().cloned() {
            let map = generate_map(num_players, 42);
            let homes: Vec<&GeneratedSystem> = map.systems.iter()
                .filter(|s| s.is_home_system)
                .collect();
            assert_eq!(num_players as usize, homes.len());

            let owners: BTreeSet<i32> = homes.iter()
                .map(|s| s.owner_player_index.unwrap())
                .collect();
            assert_eq!((1..=num_players).collect::<BTreeSet<i32>>(), owners);
            for home in homes {
                assert_eq!(HOME_MINING_VALUE, home.mining_value);
            }
        }
    }

    #[test]
    fn test_mining_values_in_range() {
        let map = generate_map(6, 7);
        for system in map.systems.iter() {
            assert!(system.mining_value >= 0 && system.mining_value <= 10);
        }
    }

    #[test]
    fn test_non_home_systems_start_unowned() {
        let map = generate_map(4, 42);
        for system in map.systems.iter().filter(|s| !s.is_home_system) {
            assert_eq!(None, system.owner_player_index);
        }
    }

    #[test]
    fn test_neutral_cluster_always_present() {
        for seed in TEST_SEEDS.iter().cloned() {
            let map = generate_map(2, seed);
            let neutrals: Vec<&GeneratedCluster> = map.clusters.iter()
                .filter(|c| !c.is_home_cluster())
                .collect();
            assert!(!neutrals.is_empty());
            for neutral in neutrals {
                assert!(!neutral.system_ids.is_empty());
            }
        }
    }

    #[test]
    fn test_neutral_clusters_bridge_two_player_clusters() {
        for num_players in [2, 3, 5, 8].iter().cloned() {
            for seed in TEST_SEEDS.iter().cloned() {
                let map = generate_map(num_players, seed);
                let graph = rebuild_graph(&map);
                let cluster_of: BTreeMap<i32, &GeneratedCluster> = map.clusters.iter()
                    .flat_map(|c| c.system_ids.iter().map(move |sid| (*sid, c)))
                    .collect();

                for neutral in map.clusters.iter().filter(|c| !c.is_home_cluster()) {
                    let mut adjacent_players = BTreeSet::new();
                    for sid in neutral.system_ids.iter() {
                        for neighbor in graph.neighbors(*sid) {
                            if let Some(cluster) = cluster_of.get(&neighbor) {
                                if let Some(player) = cluster.player_index {
                                    adjacent_players.insert(player);
                                }
                            }
                        }
                    }
                    assert!(adjacent_players.len() >= 2,
                        "neutral cluster {} only touches players {:?} ({} players, seed {})",
                        neutral.id, adjacent_players, num_players, seed);
                }
            }
        }
    }

    #[test]
    fn test_player_ring_for_three_plus_players() {
        for num_players in [3, 4, 6, 8].iter().cloned() {
            for seed in TEST_SEEDS.iter().cloned() {
                let map = generate_map(num_players, seed);
                let graph = rebuild_graph(&map);
                let cluster_of: BTreeMap<i32, &GeneratedCluster> = map.clusters.iter()
                    .flat_map(|c| c.system_ids.iter().map(move |sid| (*sid, c)))
                    .collect();

                for cluster in map.clusters.iter().filter(|c| c.is_home_cluster()) {
                    let mut adjacent_players = BTreeSet::new();
                    for sid in cluster.system_ids.iter() {
                        for neighbor in graph.neighbors(*sid) {
                            if let Some(other) = cluster_of.get(&neighbor) {
                                if let Some(player) = other.player_index {
                                    if player != cluster.player_index.unwrap() {
                                        adjacent_players.insert(player);
                                    }
                                }
                            }
                        }
                    }
                    assert!(adjacent_players.len() >= 2,
                        "player cluster {} only touches players {:?} ({} players, seed {})",
                        cluster.id, adjacent_players, num_players, seed);
                }
            }
        }
    }

    #[test]
    fn test_safe_path_to_founders_world() {
        for num_players in [2, 4, 6, 8].iter().cloned() {
            for seed in TEST_SEEDS.iter().cloned() {
                let map = generate_map(num_players, seed);
                let graph = rebuild_graph(&map);
                let neutral_systems: Vec<i32> = map.clusters.iter()
                    .filter(|c| !c.is_home_cluster())
                    .flat_map(|c| c.system_ids.iter().cloned())
                    .collect();

                for cluster in map.clusters.iter().filter(|c| c.is_home_cluster()) {
                    let home = cluster.home_system_id().unwrap();
                    let mut safe: BTreeSet<i32> = neutral_systems.iter().cloned().collect();
                    safe.insert(FOUNDERS_WORLD_ID);
                    safe.extend(cluster.system_ids.iter().cloned());

                    assert!(graph.induced(&safe).has_path(home, FOUNDERS_WORLD_ID),
                        "player {} (home {}) has no safe path ({} players, seed {})",
                        cluster.player_index.unwrap(), home, num_players, seed);
                }
            }
        }
    }

    #[test]
    fn test_positions_are_inside_the_map() {
        let map = generate_map(4, 42);
        for system in map.systems.iter() {
            assert!(system.x >= 0.0 && system.x <= 1600.0);
            assert!(system.y >= 0.0 && system.y <= 1200.0);
            if system.is_founders_world {
                continue;
            }
            assert_eq!(system.x, (system.x * 100.0).round() / 100.0);
            assert_eq!(system.y, (system.y * 100.0).round() / 100.0);
        }
    }

    #[test]
    fn test_names_are_unique() {
        let map = generate_map(8, 3);
        let names: BTreeSet<&str> = map.systems.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(map.systems.len(), names.len());
    }

    #[test]
    fn test_deterministic_with_seed() {
        let first = generate_map(4, 123);
        let second = generate_map(4, 123);

        assert_eq!(first.jump_lines, second.jump_lines);
        assert_eq!(first.systems.len(), second.systems.len());
        for (a, b) in first.systems.iter().zip(second.systems.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.x, b.x);
            assert_eq!(a.y, b.y);
            assert_eq!(a.mining_value, b.mining_value);
            assert_eq!(a.cluster_id, b.cluster_id);
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let first = generate_map(4, 1);
        let second = generate_map(4, 2);
        let first_names: Vec<&String> = first.systems.iter().map(|s| &s.name).collect();
        let second_names: Vec<&String> = second.systems.iter().map(|s| &s.name).collect();

        assert!(first.jump_lines != second.jump_lines || first_names != second_names);
    }
}
