use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use once_cell::sync::Lazy;
use rand::Rng;
use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::coords::{CubeCoord, Direction};
use crate::types::{EdgeRef, NodeRef, Resource};

pub type NodeId = u16;
pub type EdgeId = (NodeId, NodeId);

type NodeMap = HashMap<NodeRef, NodeId>;
type EdgeMap = HashMap<EdgeRef, EdgeId>;

/// Canonical edge identity: endpoints are distinct and stored low-high, so
/// the edge between `a` and `b` compares equal no matter the argument order.
pub fn edge_between(a: NodeId, b: NodeId) -> EdgeId {
    debug_assert!(a != b, "an edge joins two distinct nodes");
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandTile {
    pub resource: Option<Resource>,
    pub number: Option<u8>,
    pub nodes: NodeMap,
    pub edges: EdgeMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortTile {
    pub resource: Option<Resource>,
    pub direction: Direction,
    pub nodes: NodeMap,
    pub edges: EdgeMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterTile {
    pub nodes: NodeMap,
    pub edges: EdgeMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Tile {
    Land(LandTile),
    Port(PortTile),
    Water(WaterTile),
}

impl Tile {
    pub fn nodes(&self) -> &NodeMap {
        match self {
            Tile::Land(tile) => &tile.nodes,
            Tile::Port(port) => &port.nodes,
            Tile::Water(water) => &water.nodes,
        }
    }

    pub fn edges(&self) -> &EdgeMap {
        match self {
            Tile::Land(tile) => &tile.edges,
            Tile::Port(port) => &port.edges,
            Tile::Water(water) => &water.edges,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TileTemplate {
    Land,
    Water,
    Port(Direction),
}

#[derive(Debug, Clone)]
pub struct MapTemplate {
    pub numbers: Vec<u8>,
    pub port_resources: Vec<Option<Resource>>,
    pub tile_resources: Vec<Option<Resource>>,
    pub topology: Vec<(CubeCoord, TileTemplate)>,
}

impl MapTemplate {
    pub fn base() -> &'static MapTemplate {
        &BASE_TEMPLATE
    }

    pub fn mini() -> &'static MapTemplate {
        &MINI_TEMPLATE
    }
}

#[derive(Debug, Clone)]
pub struct HexMap {
    pub tiles: HashMap<CubeCoord, Tile>,
    /// The "star" around each node: every touching edge mapped to the
    /// neighbor node on its far side. At most 3 entries per node.
    pub adjacency: HashMap<NodeId, HashMap<EdgeId, NodeId>>,
    pub edges: Vec<EdgeId>,
    pub land_nodes: HashSet<NodeId>,
}

impl HexMap {
    pub fn from_template(template: &MapTemplate) -> Self {
        let mut rng = thread_rng();
        Self::from_template_with_rng(template, &mut rng)
    }

    pub fn from_template_with_rng(template: &MapTemplate, rng: &mut impl Rng) -> Self {
        Self::from_tiles(initialize_tiles(template, rng))
    }

    pub fn from_tiles(tiles: HashMap<CubeCoord, Tile>) -> Self {
        let mut adjacency: HashMap<NodeId, HashMap<EdgeId, NodeId>> = HashMap::new();
        for tile in tiles.values() {
            for &edge in tile.edges().values() {
                let (a, b) = edge;
                adjacency.entry(a).or_default().insert(edge, b);
                adjacency.entry(b).or_default().insert(edge, a);
            }
        }

        let edges: Vec<EdgeId> = tiles
            .values()
            .flat_map(|tile| tile.edges().values().copied())
            .unique()
            .sorted()
            .collect();

        let land_nodes: HashSet<NodeId> = tiles
            .values()
            .filter_map(|tile| match tile {
                Tile::Land(land) => Some(&land.nodes),
                _ => None,
            })
            .flat_map(|nodes| nodes.values().copied())
            .collect();

        Self {
            tiles,
            adjacency,
            edges,
            land_nodes,
        }
    }

    pub fn has_edge(&self, edge: EdgeId) -> bool {
        self.adjacency
            .get(&edge.0)
            .map_or(false, |star| star.contains_key(&edge))
    }
}

fn initialize_tiles(template: &MapTemplate, rng: &mut impl Rng) -> HashMap<CubeCoord, Tile> {
    let mut numbers = template.numbers.clone();
    numbers.shuffle(rng);
    let mut port_resources = template.port_resources.clone();
    port_resources.shuffle(rng);
    let mut tile_resources = template.tile_resources.clone();
    tile_resources.shuffle(rng);

    let mut tiles: HashMap<CubeCoord, Tile> = HashMap::new();
    let mut node_autoinc: NodeId = 0;

    for &(coord, kind) in &template.topology {
        let (nodes, edges) = stitch_tile(&tiles, coord, &mut node_autoinc);
        let tile = match kind {
            TileTemplate::Land => {
                let resource = tile_resources.pop().expect("template short on tile resources");
                let number = match resource {
                    Some(_) => Some(numbers.pop().expect("template short on roll numbers")),
                    None => None,
                };
                Tile::Land(LandTile {
                    resource,
                    number,
                    nodes,
                    edges,
                })
            }
            TileTemplate::Water => Tile::Water(WaterTile { nodes, edges }),
            TileTemplate::Port(direction) => {
                let resource = port_resources.pop().expect("template short on port resources");
                Tile::Port(PortTile {
                    resource,
                    direction,
                    nodes,
                    edges,
                })
            }
        };
        tiles.insert(coord, tile);
    }

    tiles
}

/// Resolve the six perimeter nodes of a new tile, reusing the identities of
/// nodes already claimed by placed neighbors and minting fresh ids for the
/// rest in fixed `NodeRef` order, so a given topology always yields the same
/// graph. Edge identities need no such sharing: normalization makes the edge
/// shared with a neighbor compare equal on both sides.
fn stitch_tile(
    tiles: &HashMap<CubeCoord, Tile>,
    coord: CubeCoord,
    node_autoinc: &mut NodeId,
) -> (NodeMap, EdgeMap) {
    let mut nodes: NodeMap = HashMap::new();
    for direction in Direction::iter() {
        let Some(neighbor) = tiles.get(&coord.neighbor(direction)) else {
            continue;
        };
        for (own_ref, their_ref) in shared_node_refs(direction) {
            if let Some(&id) = neighbor.nodes().get(&their_ref) {
                nodes.insert(own_ref, id);
            }
        }
    }

    for node_ref in NodeRef::iter() {
        if !nodes.contains_key(&node_ref) {
            nodes.insert(node_ref, *node_autoinc);
            *node_autoinc += 1;
        }
    }

    let edges: EdgeMap = EdgeRef::iter()
        .map(|edge_ref| {
            let (a_ref, b_ref) = edge_ref_endpoints(edge_ref);
            (edge_ref, edge_between(nodes[&a_ref], nodes[&b_ref]))
        })
        .collect();

    (nodes, edges)
}

/// Node positions shared with the tile one step away in `direction`:
/// (our reference, their reference) pairs.
fn shared_node_refs(direction: Direction) -> [(NodeRef, NodeRef); 2] {
    match direction {
        Direction::East => [
            (NodeRef::NorthEast, NodeRef::NorthWest),
            (NodeRef::SouthEast, NodeRef::SouthWest),
        ],
        Direction::SouthEast => [
            (NodeRef::South, NodeRef::NorthWest),
            (NodeRef::SouthEast, NodeRef::North),
        ],
        Direction::SouthWest => [
            (NodeRef::South, NodeRef::NorthEast),
            (NodeRef::SouthWest, NodeRef::North),
        ],
        Direction::West => [
            (NodeRef::NorthWest, NodeRef::NorthEast),
            (NodeRef::SouthWest, NodeRef::SouthEast),
        ],
        Direction::NorthWest => [
            (NodeRef::North, NodeRef::SouthEast),
            (NodeRef::NorthWest, NodeRef::South),
        ],
        Direction::NorthEast => [
            (NodeRef::North, NodeRef::SouthWest),
            (NodeRef::NorthEast, NodeRef::South),
        ],
    }
}

fn edge_ref_endpoints(edge_ref: EdgeRef) -> (NodeRef, NodeRef) {
    match edge_ref {
        EdgeRef::East => (NodeRef::NorthEast, NodeRef::SouthEast),
        EdgeRef::SouthEast => (NodeRef::SouthEast, NodeRef::South),
        EdgeRef::SouthWest => (NodeRef::South, NodeRef::SouthWest),
        EdgeRef::West => (NodeRef::SouthWest, NodeRef::NorthWest),
        EdgeRef::NorthWest => (NodeRef::NorthWest, NodeRef::North),
        EdgeRef::NorthEast => (NodeRef::North, NodeRef::NorthEast),
    }
}

static BASE_TEMPLATE: Lazy<MapTemplate> = Lazy::new(|| MapTemplate {
    numbers: vec![2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12],
    port_resources: vec![
        Some(Resource::Wood),
        Some(Resource::Brick),
        Some(Resource::Sheep),
        Some(Resource::Wheat),
        Some(Resource::Ore),
        None,
        None,
        None,
        None,
    ],
    tile_resources: vec![
        Some(Resource::Wood),
        Some(Resource::Wood),
        Some(Resource::Wood),
        Some(Resource::Wood),
        Some(Resource::Brick),
        Some(Resource::Brick),
        Some(Resource::Brick),
        Some(Resource::Sheep),
        Some(Resource::Sheep),
        Some(Resource::Sheep),
        Some(Resource::Sheep),
        Some(Resource::Wheat),
        Some(Resource::Wheat),
        Some(Resource::Wheat),
        Some(Resource::Wheat),
        Some(Resource::Ore),
        Some(Resource::Ore),
        Some(Resource::Ore),
        None,
    ],
    topology: base_topology(),
});

static MINI_TEMPLATE: Lazy<MapTemplate> = Lazy::new(|| MapTemplate {
    numbers: vec![3, 4, 5, 6, 8, 9, 10],
    port_resources: vec![],
    tile_resources: vec![
        Some(Resource::Wood),
        None,
        Some(Resource::Brick),
        Some(Resource::Sheep),
        Some(Resource::Wheat),
        Some(Resource::Wheat),
        Some(Resource::Ore),
    ],
    topology: mini_topology(),
});

fn base_topology() -> Vec<(CubeCoord, TileTemplate)> {
    use TileTemplate::*;
    vec![
        (CubeCoord::new(0, 0, 0), Land),
        (CubeCoord::new(1, -1, 0), Land),
        (CubeCoord::new(0, -1, 1), Land),
        (CubeCoord::new(-1, 0, 1), Land),
        (CubeCoord::new(-1, 1, 0), Land),
        (CubeCoord::new(0, 1, -1), Land),
        (CubeCoord::new(1, 0, -1), Land),
        (CubeCoord::new(2, -2, 0), Land),
        (CubeCoord::new(1, -2, 1), Land),
        (CubeCoord::new(0, -2, 2), Land),
        (CubeCoord::new(-1, -1, 2), Land),
        (CubeCoord::new(-2, 0, 2), Land),
        (CubeCoord::new(-2, 1, 1), Land),
        (CubeCoord::new(-2, 2, 0), Land),
        (CubeCoord::new(-1, 2, -1), Land),
        (CubeCoord::new(0, 2, -2), Land),
        (CubeCoord::new(1, 1, -2), Land),
        (CubeCoord::new(2, 0, -2), Land),
        (CubeCoord::new(2, -1, -1), Land),
        (CubeCoord::new(3, -3, 0), Port(Direction::West)),
        (CubeCoord::new(2, -3, 1), Water),
        (CubeCoord::new(1, -3, 2), Port(Direction::NorthWest)),
        (CubeCoord::new(0, -3, 3), Water),
        (CubeCoord::new(-1, -2, 3), Port(Direction::NorthWest)),
        (CubeCoord::new(-2, -1, 3), Water),
        (CubeCoord::new(-3, 0, 3), Port(Direction::NorthEast)),
        (CubeCoord::new(-3, 1, 2), Water),
        (CubeCoord::new(-3, 2, 1), Port(Direction::East)),
        (CubeCoord::new(-3, 3, 0), Water),
        (CubeCoord::new(-2, 3, -1), Port(Direction::East)),
        (CubeCoord::new(-1, 3, -2), Water),
        (CubeCoord::new(0, 3, -3), Port(Direction::SouthEast)),
        (CubeCoord::new(1, 2, -3), Water),
        (CubeCoord::new(2, 1, -3), Port(Direction::SouthWest)),
        (CubeCoord::new(3, 0, -3), Water),
        (CubeCoord::new(3, -1, -2), Port(Direction::SouthWest)),
        (CubeCoord::new(3, -2, -1), Water),
    ]
}

fn mini_topology() -> Vec<(CubeCoord, TileTemplate)> {
    use TileTemplate::*;
    vec![
        (CubeCoord::new(0, 0, 0), Land),
        (CubeCoord::new(1, -1, 0), Land),
        (CubeCoord::new(0, -1, 1), Land),
        (CubeCoord::new(-1, 0, 1), Land),
        (CubeCoord::new(-1, 1, 0), Land),
        (CubeCoord::new(0, 1, -1), Land),
        (CubeCoord::new(1, 0, -1), Land),
        (CubeCoord::new(2, -2, 0), Water),
        (CubeCoord::new(1, -2, 1), Water),
        (CubeCoord::new(0, -2, 2), Water),
        (CubeCoord::new(-1, -1, 2), Water),
        (CubeCoord::new(-2, 0, 2), Water),
        (CubeCoord::new(-2, 1, 1), Water),
        (CubeCoord::new(-2, 2, 0), Water),
        (CubeCoord::new(-1, 2, -1), Water),
        (CubeCoord::new(0, 2, -2), Water),
        (CubeCoord::new(1, 1, -2), Water),
        (CubeCoord::new(2, 0, -2), Water),
        (CubeCoord::new(2, -1, -1), Water),
    ]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn land_tiles(map: &HexMap) -> Vec<&LandTile> {
        map.tiles
            .values()
            .filter_map(|tile| match tile {
                Tile::Land(land) => Some(land),
                _ => None,
            })
            .collect()
    }

    fn land_edge_set(map: &HexMap) -> HashSet<EdgeId> {
        land_tiles(map)
            .iter()
            .flat_map(|land| land.edges.values().copied())
            .collect()
    }

    #[test]
    fn base_map_tile_counts() {
        let map = HexMap::from_template(MapTemplate::base());
        assert_eq!(land_tiles(&map).len(), 19);
        let ports = map
            .tiles
            .values()
            .filter(|tile| matches!(tile, Tile::Port(_)))
            .count();
        assert_eq!(ports, 9);
        assert_eq!(map.tiles.len(), 37);
    }

    #[test]
    fn base_map_has_54_land_nodes_and_72_land_edges() {
        let map = HexMap::from_template(MapTemplate::base());
        assert_eq!(map.land_nodes.len(), 54);
        assert_eq!(land_edge_set(&map).len(), 72);
    }

    #[test]
    fn base_map_resource_spread() {
        let map = HexMap::from_template(MapTemplate::base());
        for resource in Resource::ALL {
            let count = land_tiles(&map)
                .iter()
                .filter(|land| land.resource == Some(resource))
                .count();
            assert!(count >= 3, "{resource} should appear on at least 3 tiles");
        }
        let deserts = land_tiles(&map)
            .iter()
            .filter(|land| land.resource.is_none())
            .count();
        assert_eq!(deserts, 1);
    }

    #[test]
    fn mini_map_has_24_land_nodes_and_30_land_edges() {
        let map = HexMap::from_template(MapTemplate::mini());
        assert_eq!(land_tiles(&map).len(), 7);
        assert_eq!(map.land_nodes.len(), 24);
        assert_eq!(land_edge_set(&map).len(), 30);
    }

    #[test]
    fn adjacency_is_symmetric_with_small_stars() {
        let map = HexMap::from_template(MapTemplate::base());
        for (&node, star) in &map.adjacency {
            assert!(star.len() <= 3, "node {node} has more than 3 edges");
            for (&edge, &neighbor) in star {
                assert_eq!(map.adjacency[&neighbor][&edge], node);
            }
        }
    }

    #[test]
    fn edges_are_normalized_and_distinct() {
        let map = HexMap::from_template(MapTemplate::base());
        for &(a, b) in &map.edges {
            assert!(a < b, "edge ({a}, {b}) is not normalized");
        }
        let unique: HashSet<EdgeId> = map.edges.iter().copied().collect();
        assert_eq!(unique.len(), map.edges.len());
    }

    #[test]
    fn neighboring_tiles_share_nodes_and_edges() {
        let map = HexMap::from_template(MapTemplate::mini());
        let center = &map.tiles[&CubeCoord::new(0, 0, 0)];
        let east = &map.tiles[&CubeCoord::new(1, -1, 0)];
        assert_eq!(center.edges()[&EdgeRef::East], east.edges()[&EdgeRef::West]);
        assert_eq!(
            center.nodes()[&NodeRef::NorthEast],
            east.nodes()[&NodeRef::NorthWest]
        );
        assert_eq!(
            center.nodes()[&NodeRef::SouthEast],
            east.nodes()[&NodeRef::SouthWest]
        );
    }

    #[test]
    fn identical_templates_yield_identical_graphs() {
        let a = HexMap::from_template(MapTemplate::base());
        let b = HexMap::from_template(MapTemplate::base());
        assert_eq!(a.edges, b.edges);
        for (coord, tile) in &a.tiles {
            assert_eq!(tile.nodes(), b.tiles[coord].nodes());
        }
    }
}
