use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::map::{EdgeId, HexMap, NodeId};
use crate::types::{BuildingKind, Color};

pub mod algorithms;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("node {0} is not on the board")]
    UnknownNode(NodeId),
    #[error("edge {0:?} is not on the board")]
    UnknownEdge(EdgeId),
    #[error("node {0} already occupied")]
    NodeOccupied(NodeId),
    #[error("edge {0:?} already occupied")]
    EdgeOccupied(EdgeId),
    #[error("node {0} holds no settlement of the acting color")]
    NotASettlement(NodeId),
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub color: Color,
    pub kind: BuildingKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildSite {
    Node(NodeId),
    Edge(EdgeId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub color: Color,
    pub kind: BuildingKind,
    pub site: BuildSite,
}

/// Aggregate board state: the static tile graph plus everything the build
/// actions of a game put on it. The legality queries in [`algorithms`] only
/// ever read this; writes come from the surrounding turn loop through the
/// three `place_`/`upgrade_` entry points, each of which appends to the
/// chronological build log.
#[derive(Debug, Clone)]
pub struct Board {
    map: HexMap,
    seating: Vec<Color>,
    buildings: HashMap<NodeId, Building>,
    roads: HashMap<EdgeId, Color>,
    log: Vec<BuildRecord>,
}

impl Board {
    pub fn new(map: HexMap, seating: Vec<Color>) -> Self {
        assert!(!seating.is_empty(), "a board needs at least one seated color");
        Self {
            map,
            seating,
            buildings: HashMap::new(),
            roads: HashMap::new(),
            log: Vec::new(),
        }
    }

    pub fn map(&self) -> &HexMap {
        &self.map
    }

    pub fn seating(&self) -> &[Color] {
        &self.seating
    }

    pub fn build_log(&self) -> &[BuildRecord] {
        &self.log
    }

    pub fn building_at(&self, node: NodeId) -> Option<&Building> {
        self.buildings.get(&node)
    }

    pub fn node_owner(&self, node: NodeId) -> Option<Color> {
        self.buildings.get(&node).map(|building| building.color)
    }

    pub fn road_owner(&self, edge: EdgeId) -> Option<Color> {
        self.roads.get(&edge).copied()
    }

    pub fn is_color_node(&self, node: NodeId, color: Color) -> bool {
        self.node_owner(node) == Some(color)
    }

    pub fn is_color_road(&self, edge: EdgeId, color: Color) -> bool {
        self.road_owner(edge) == Some(color)
    }

    /// The edge star around `node`. Panics when the node is not part of the
    /// board graph: a query against a node the map never minted is a
    /// data-integrity error, not a recoverable condition.
    pub fn star(&self, node: NodeId) -> &HashMap<EdgeId, NodeId> {
        self.map
            .adjacency
            .get(&node)
            .expect("node missing from board adjacency")
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.map.edges.iter().copied()
    }

    pub fn roads_of(&self, color: Color) -> impl Iterator<Item = EdgeId> + '_ {
        self.roads
            .iter()
            .filter_map(move |(&edge, &owner)| (owner == color).then_some(edge))
    }

    pub fn place_settlement(&mut self, color: Color, node: NodeId) -> Result<(), BoardError> {
        if !self.map.adjacency.contains_key(&node) {
            return Err(BoardError::UnknownNode(node));
        }
        if self.buildings.contains_key(&node) {
            return Err(BoardError::NodeOccupied(node));
        }
        self.buildings.insert(
            node,
            Building {
                color,
                kind: BuildingKind::Settlement,
            },
        );
        self.log.push(BuildRecord {
            color,
            kind: BuildingKind::Settlement,
            site: BuildSite::Node(node),
        });
        Ok(())
    }

    pub fn upgrade_to_city(&mut self, color: Color, node: NodeId) -> Result<(), BoardError> {
        if !self.map.adjacency.contains_key(&node) {
            return Err(BoardError::UnknownNode(node));
        }
        match self.buildings.get_mut(&node) {
            Some(building)
                if building.color == color && building.kind == BuildingKind::Settlement =>
            {
                building.kind = BuildingKind::City;
                self.log.push(BuildRecord {
                    color,
                    kind: BuildingKind::City,
                    site: BuildSite::Node(node),
                });
                Ok(())
            }
            _ => Err(BoardError::NotASettlement(node)),
        }
    }

    pub fn place_road(&mut self, color: Color, edge: EdgeId) -> Result<(), BoardError> {
        if !self.map.has_edge(edge) {
            return Err(BoardError::UnknownEdge(edge));
        }
        if self.roads.contains_key(&edge) {
            return Err(BoardError::EdgeOccupied(edge));
        }
        self.roads.insert(edge, color);
        self.log.push(BuildRecord {
            color,
            kind: BuildingKind::Road,
            site: BuildSite::Edge(edge),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::coords::CubeCoord;
    use crate::map::{MapTemplate, Tile};
    use crate::types::NodeRef;

    fn mini_board() -> Board {
        let mut rng = StdRng::seed_from_u64(7);
        let map = HexMap::from_template_with_rng(MapTemplate::mini(), &mut rng);
        Board::new(map, vec![Color::Red, Color::Blue])
    }

    fn origin_node(board: &Board, node_ref: NodeRef) -> NodeId {
        match &board.map().tiles[&CubeCoord::new(0, 0, 0)] {
            Tile::Land(land) => land.nodes[&node_ref],
            _ => panic!("origin tile should be land"),
        }
    }

    #[test]
    fn settlement_occupies_its_node() {
        let mut board = mini_board();
        let node = origin_node(&board, NodeRef::North);
        board.place_settlement(Color::Red, node).unwrap();
        assert_eq!(board.node_owner(node), Some(Color::Red));
        assert_eq!(
            board.place_settlement(Color::Blue, node),
            Err(BoardError::NodeOccupied(node))
        );
    }

    #[test]
    fn road_placement_validates_edge() {
        let mut board = mini_board();
        assert_eq!(
            board.place_road(Color::Red, (998, 999)),
            Err(BoardError::UnknownEdge((998, 999)))
        );
        let edge = *board.star(origin_node(&board, NodeRef::North)).keys().next().unwrap();
        board.place_road(Color::Red, edge).unwrap();
        assert_eq!(
            board.place_road(Color::Blue, edge),
            Err(BoardError::EdgeOccupied(edge))
        );
        assert_eq!(board.road_owner(edge), Some(Color::Red));
    }

    #[test]
    fn city_upgrade_requires_own_settlement() {
        let mut board = mini_board();
        let node = origin_node(&board, NodeRef::South);
        assert_eq!(
            board.upgrade_to_city(Color::Red, node),
            Err(BoardError::NotASettlement(node))
        );
        board.place_settlement(Color::Red, node).unwrap();
        assert_eq!(
            board.upgrade_to_city(Color::Blue, node),
            Err(BoardError::NotASettlement(node))
        );
        board.upgrade_to_city(Color::Red, node).unwrap();
        assert_eq!(
            board.building_at(node).map(|b| b.kind),
            Some(BuildingKind::City)
        );
        assert_eq!(
            board.upgrade_to_city(Color::Red, node),
            Err(BoardError::NotASettlement(node))
        );
    }

    #[test]
    fn build_log_is_chronological() {
        let mut board = mini_board();
        let node = origin_node(&board, NodeRef::North);
        let edge = *board.star(node).keys().next().unwrap();
        board.place_settlement(Color::Red, node).unwrap();
        board.place_road(Color::Red, edge).unwrap();
        board.upgrade_to_city(Color::Red, node).unwrap();
        let kinds: Vec<BuildingKind> = board.build_log().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![BuildingKind::Settlement, BuildingKind::Road, BuildingKind::City]
        );
        assert_eq!(board.build_log()[1].site, BuildSite::Edge(edge));
    }
}
