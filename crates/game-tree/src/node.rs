//! Node payloads. The root carries the starting position only; every other
//! node carries one applied move.

use shakmaty::{Color, Role, Square};

use crate::annotation::Annotations;
use crate::move_id::MoveId;
use crate::path::Path;
use crate::tree::NodeId;

/// Position after a node, as reported by the rules oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    pub fen: String,
    /// Side to move next.
    pub turn: Color,
    pub check: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
    pub san: String,
    pub uci: String,
}

/// A detached ply: what the oracle produces and what deletions hand back.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveNode {
    pub id: MoveId,
    /// Half-move number; ply 1 is White's first move.
    pub ply: u32,
    pub played: PlayedMove,
    pub state: BoardState,
    pub annotations: Annotations,
}

impl MoveNode {
    /// The side that made this move.
    pub fn mover(&self) -> Color {
        !self.state.turn
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RootNode {
    /// Ply of the starting position (0 for the standard start).
    pub ply: u32,
    pub state: BoardState,
    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root(RootNode),
    Move(MoveNode),
}

/// A node as stored in the tree: its payload, its address and its ordered
/// continuations. `children[0]` is the mainline continuation.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) path: Path,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root(_))
    }

    pub fn as_move(&self) -> Option<&MoveNode> {
        match &self.kind {
            NodeKind::Move(m) => Some(m),
            NodeKind::Root(_) => None,
        }
    }

    pub fn id(&self) -> Option<MoveId> {
        self.as_move().map(|m| m.id)
    }

    pub fn ply(&self) -> u32 {
        match &self.kind {
            NodeKind::Root(r) => r.ply,
            NodeKind::Move(m) => m.ply,
        }
    }

    pub fn state(&self) -> &BoardState {
        match &self.kind {
            NodeKind::Root(r) => &r.state,
            NodeKind::Move(m) => &m.state,
        }
    }

    pub fn annotations(&self) -> &Annotations {
        match &self.kind {
            NodeKind::Root(r) => &r.annotations,
            NodeKind::Move(m) => &m.annotations,
        }
    }

    pub fn annotations_mut(&mut self) -> &mut Annotations {
        match &mut self.kind {
            NodeKind::Root(r) => &mut r.annotations,
            NodeKind::Move(m) => &mut m.annotations,
        }
    }
}
