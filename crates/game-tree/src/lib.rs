//! Annotated game-tree model for chess analysis.
//!
//! A game is a tree of moves addressed by [`Path`]s. Documents are read with
//! [`build_game`], edited through a [`Game`] or a [`Controller`] cursor, and
//! written back with [`write_pgn`].

pub mod annotation;
pub mod builder;
pub mod controller;
pub mod error;
pub mod game;
pub mod move_id;
pub mod node;
pub mod path;
pub mod reader;
pub mod rules;
pub mod tree;
pub mod writer;

pub use annotation::{Annotations, Brush, Centis, Clocks, Shape};
pub use builder::{build_game, try_build_game};
pub use controller::{BoardView, Controller, ControllerOptions, GoTo, Pane};
pub use error::GameError;
pub use game::{Game, Metadata, Player, Players, TimeControl};
pub use move_id::MoveId;
pub use node::{BoardState, MoveNode, Node, NodeKind, PlayedMove, RootNode};
pub use path::Path;
pub use rules::{Rules, StandardRules, STANDARD_START_FEN};
pub use tree::{MoveTree, NodeId};
pub use writer::{write_movetext, write_pgn};
