//! Legality and road-network queries over a [`Board`].
//!
//! Everything here is a pure read: the same board state always produces the
//! same answer (the longest-path search may pick a different maximal path of
//! equal length between calls, which callers must not rely on).

use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use crate::board::{Board, BoardError};
use crate::map::{EdgeId, NodeId, Tile};
use crate::types::{BuildingKind, Color};

/// A connected road subgraph, closed over its boundary: every explored edge
/// is recorded under both endpoints, so nodes at the rim of the network show
/// up as keys even when unowned or held by an opponent.
pub type Subgraph = HashMap<NodeId, HashMap<EdgeId, NodeId>>;

type EdgePath = SmallVec<[EdgeId; 16]>;

/// Nodes where `color` may legally place a settlement.
///
/// During initial placement the whole land surface is scanned (water and
/// port tiles never host settlements); afterwards only nodes reachable
/// through the color's own road network qualify. Either way a node must be
/// empty and have only empty direct neighbors, the two-node distance rule.
pub fn buildable_nodes(board: &Board, color: Color, initial_placement: bool) -> HashSet<NodeId> {
    let mut buildable = HashSet::new();

    if initial_placement {
        for tile in board.map().tiles.values() {
            let Tile::Land(land) = tile else {
                continue;
            };
            for &node in land.nodes.values() {
                if node_is_open(board, node) {
                    buildable.insert(node);
                }
            }
        }
    } else {
        for subgraph in find_connected_components(board, color) {
            for &node in subgraph.keys() {
                if node_is_open(board, node) {
                    buildable.insert(node);
                }
            }
        }
    }

    buildable
}

fn node_is_open(board: &Board, node: NodeId) -> bool {
    board.node_owner(node).is_none()
        && board
            .star(node)
            .values()
            .all(|&neighbor| board.node_owner(neighbor).is_none())
}

/// Edges where `color` may legally place a road: the edge is empty, and it
/// either touches one of the color's buildings or continues one of its
/// roads through an endpoint not occupied by an opposing building.
pub fn buildable_edges(board: &Board, color: Color) -> HashSet<EdgeId> {
    board
        .edges()
        .filter(|&edge| edge_is_buildable(board, edge, color))
        .collect()
}

fn edge_is_buildable(board: &Board, edge: EdgeId, color: Color) -> bool {
    if board.road_owner(edge).is_some() {
        return false;
    }
    let (a, b) = edge;
    let anchored = board.is_color_node(a, color) || board.is_color_node(b, color);
    let a_connected = board
        .star(a)
        .keys()
        .any(|&other| other != edge && board.is_color_road(other, color));
    let b_connected = board
        .star(b)
        .keys()
        .any(|&other| other != edge && board.is_color_road(other, color));
    let enemy_on_a = board.node_owner(a).is_some_and(|owner| owner != color);
    let enemy_on_b = board.node_owner(b).is_some_and(|owner| owner != color);

    anchored || (a_connected && !enemy_on_a) || (b_connected && !enemy_on_b)
}

/// Partition the color's roads into maximal connected subgraphs.
///
/// Worklist BFS seeded from any still-unassigned owned edge. Expansion
/// around an endpoint is skipped when an opposing building sits on it, which
/// is how an enemy settlement severs a road network. Every owned edge lands
/// in exactly one subgraph.
pub fn find_connected_components(board: &Board, color: Color) -> Vec<Subgraph> {
    let mut settled: HashSet<EdgeId> = board.roads_of(color).collect();
    let mut components = Vec::new();

    while !settled.is_empty() {
        let seed = *settled.iter().next().expect("settled set is non-empty");
        settled.remove(&seed);

        let mut subgraph = Subgraph::new();
        let mut visited: HashSet<EdgeId> = HashSet::new();
        let mut agenda = vec![seed];
        while let Some(edge) = agenda.pop() {
            if !visited.insert(edge) {
                continue;
            }
            settled.remove(&edge);

            let (a, b) = edge;
            subgraph.entry(a).or_default().insert(edge, b);
            subgraph.entry(b).or_default().insert(edge, a);

            for endpoint in [a, b] {
                if board
                    .node_owner(endpoint)
                    .is_some_and(|owner| owner != color)
                {
                    continue;
                }
                for &candidate in board.star(endpoint).keys() {
                    if candidate != edge
                        && !visited.contains(&candidate)
                        && board.is_color_road(candidate, color)
                    {
                        agenda.push(candidate);
                    }
                }
            }
        }

        components.push(subgraph);
    }

    components
}

/// Longest simple path through one subgraph: an exhaustive worklist DFS from
/// every node, extending by any incident edge not already on the partial
/// path and recording a candidate whenever a walk runs out of unused edges.
/// Ties between maximal paths are broken arbitrarily; only the length
/// matters downstream.
pub fn longest_acyclic_path(subgraph: &Subgraph) -> Vec<EdgeId> {
    let mut best = EdgePath::new();

    for &start in subgraph.keys() {
        let mut agenda: Vec<(NodeId, EdgePath)> = vec![(start, EdgePath::new())];
        while let Some((node, path)) = agenda.pop() {
            let mut extended = false;
            for (&edge, &neighbor) in &subgraph[&node] {
                if !path.contains(&edge) {
                    let mut longer = path.clone();
                    longer.push(edge);
                    agenda.push((neighbor, longer));
                    extended = true;
                }
            }
            if !extended && path.len() > best.len() {
                best = path;
            }
        }
    }

    best.into_vec()
}

/// Resolve the longest-road title across all seated colors.
///
/// A candidate path counts once it spans at least 5 edges. Returns `None`
/// when nobody qualifies. When several colors tie at the maximum, the build
/// log decides: walking the tied colors' road actions from most recent
/// backwards, each action eliminates its color until one remains, so the
/// title stays with whoever reached the maximum first.
pub fn longest_road(board: &Board) -> Option<(Color, Vec<EdgeId>)> {
    let mut max_count = 0;
    let mut leaders: HashMap<Color, Vec<EdgeId>> = HashMap::new();

    for &color in board.seating() {
        for component in find_connected_components(board, color) {
            let path = longest_acyclic_path(&component);
            let count = path.len();
            if count < 5 {
                continue;
            }
            if count > max_count {
                max_count = count;
                leaders.clear();
                leaders.insert(color, path);
            } else if count == max_count {
                leaders.insert(color, path);
            }
        }
    }

    if leaders.is_empty() {
        return None;
    }

    let mut road_builds: Vec<Color> = board
        .build_log()
        .iter()
        .filter(|record| {
            record.kind == BuildingKind::Road && leaders.contains_key(&record.color)
        })
        .map(|record| record.color)
        .collect();
    while leaders.len() > 1 {
        let color = road_builds
            .pop()
            .expect("tied colors must have road builds in the log");
        leaders.remove(&color);
    }

    leaders.into_iter().next()
}

/// Deliberate stub: the knight-count bonus is owned by the surrounding
/// engine and has no implementation here yet.
pub fn largest_army(_board: &Board) -> Result<(Color, u32), BoardError> {
    Err(BoardError::NotImplemented("largest army"))
}
