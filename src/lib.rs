#![warn(clippy::all)]
#![deny(rust_2018_idioms)]

pub mod board;
pub mod coords;
pub mod map;
pub mod types;

pub use board::algorithms::{
    Subgraph, buildable_edges, buildable_nodes, find_connected_components, largest_army,
    longest_acyclic_path, longest_road,
};
pub use board::{Board, BoardError, BuildRecord, BuildSite, Building};
pub use map::{EdgeId, HexMap, MapTemplate, NodeId, Tile, TileTemplate, edge_between};
pub use types::{BuildingKind, Color, Resource};
