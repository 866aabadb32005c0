//! A game: the move tree bound to its players and metadata, with the
//! mainline cached for position lookups.

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::Color;
use tracing::{debug, info};

use crate::annotation::{Annotations, Clocks};
use crate::node::{MoveNode, Node, RootNode};
use crate::path::Path;
use crate::rules::{Rules, StandardRules};
use crate::tree::{MoveTree, NodeId};

/// Result token of a game still in progress or of unknown outcome.
pub const UNTERMINATED: &str = "*";

/// Prefix of the comment that parks a game result on a demoted line.
pub const RESULT_MARKER: &str = "Result: ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: Option<String>,
    pub title: Option<String>,
    pub rating: Option<u32>,
    pub fide_id: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub white: Player,
    pub black: Player,
}

impl Players {
    pub fn get(&self, color: Color) -> &Player {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

/// Base time and increment, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    pub initial: u32,
    pub increment: u32,
}

impl TimeControl {
    /// Parse `"300+2"` or `"600"`. Unlimited (`"-"`) and unknown (`"?"`)
    /// controls yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().splitn(2, '+');
        let initial = parts.next()?.parse().ok()?;
        let increment = match parts.next() {
            Some(inc) => inc.parse().ok()?,
            None => 0,
        };
        Some(Self { initial, increment })
    }
}

impl fmt::Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.initial, self.increment)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub result: Option<String>, // "1-0", "0-1", "1/2-1/2", "*"
    pub time_control: Option<TimeControl>,
    pub external_link: Option<String>,
    pub orientation: Option<String>, // "white" | "black"
    pub comment: Option<String>,
    /// Headers without a dedicated field, in document order.
    pub headers: Vec<(String, String)>,
}

impl Metadata {
    /// A decided result, i.e. anything but the unterminated marker.
    pub fn recorded_result(&self) -> Option<&str> {
        self.result.as_deref().filter(|r| *r != UNTERMINATED)
    }

    pub fn orientation(&self) -> Color {
        match self.orientation.as_deref() {
            Some("black") => Color::Black,
            _ => Color::White,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Game {
    tree: MoveTree,
    pub players: Players,
    pub metadata: Metadata,
    mainline: Vec<NodeId>,
}

impl Game {
    pub fn new(tree: MoveTree, players: Players, metadata: Metadata) -> Self {
        let mainline = tree.mainline();
        Self {
            tree,
            players,
            metadata,
            mainline,
        }
    }

    /// A game with no moves from the standard starting position.
    pub fn empty() -> Self {
        let rules = StandardRules;
        let (state, ply) = rules.root_state(&shakmaty::Chess::default());
        let root = RootNode {
            ply,
            state,
            annotations: Annotations::default(),
        };
        Self::new(MoveTree::new(root), Players::default(), Metadata::default())
    }

    pub fn tree(&self) -> &MoveTree {
        &self.tree
    }

    pub fn root(&self) -> &Node {
        self.tree.root()
    }

    pub fn node_at(&self, path: &Path) -> Option<&Node> {
        self.tree.node_at(path)
    }

    pub fn mainline(&self) -> impl Iterator<Item = &Node> + '_ {
        self.mainline.iter().filter_map(|&id| self.tree.get(id))
    }

    pub fn ply_count(&self) -> usize {
        self.mainline.len()
    }

    /// The final mainline node, or the root of a game without moves.
    pub fn last_mainline(&self) -> &Node {
        self.mainline
            .last()
            .and_then(|&id| self.tree.get(id))
            .unwrap_or_else(|| self.tree.root())
    }

    /// First mainline node whose board state starts with `prefix`.
    pub fn find_mainline_fen(&self, prefix: &str) -> Option<&Node> {
        self.mainline().find(|n| n.state().fen.starts_with(prefix))
    }

    fn refresh_mainline(&mut self) {
        self.mainline = self.tree.mainline();
    }

    pub fn insert(&mut self, parent: &Path, node: MoveNode) -> Option<Path> {
        let path = self.tree.insert(parent, node);
        self.refresh_mainline();
        path
    }

    pub fn insert_sequence<I>(&mut self, parent: &Path, nodes: I) -> Option<Path>
    where
        I: IntoIterator<Item = MoveNode>,
    {
        let path = self.tree.insert_sequence(parent, nodes);
        self.refresh_mainline();
        path
    }

    pub fn delete_subtree(&mut self, path: &Path) -> Option<MoveNode> {
        let removed = self.tree.delete_subtree(path);
        self.refresh_mainline();
        removed
    }

    pub fn truncate_after(&mut self, path: &Path) -> bool {
        let done = self.tree.truncate_after(path);
        self.refresh_mainline();
        done
    }

    pub fn delete_from(&mut self, path: &Path) -> Option<Vec<MoveNode>> {
        let removed = self.tree.delete_from(path);
        self.refresh_mainline();
        removed
    }

    /// Make the line through `path` the played line at its branch point.
    ///
    /// A recorded result is parked as a `Result: ` comment on the end of the
    /// old mainline, and adopted again from the end of the new one if that
    /// line carries such a comment. Comments on the new mainline are cleared.
    pub fn promote_variation(&mut self, path: &Path) -> bool {
        let Some(parent) = self.tree.node_at(&path.init()).filter(|_| !path.is_root()) else {
            debug!(path = %path, "Promote on unresolved path ignored");
            return false;
        };
        let is_variation = parent
            .children()
            .iter()
            .skip(1)
            .any(|&c| self.tree.get(c).and_then(Node::id) == path.last());
        if !is_variation {
            return false;
        }

        if let Some(result) = self.metadata.recorded_result().map(str::to_string) {
            let end = self.last_mainline().path().clone();
            if let Some(node) = self.tree.node_at_mut(&end) {
                node.annotations_mut()
                    .add_comment(&format!("{RESULT_MARKER}{result}"));
            }
            self.metadata.result = Some(UNTERMINATED.to_string());
        }

        self.tree.promote(path);
        self.refresh_mainline();

        let end = self.last_mainline().path().clone();
        if let Some(node) = self.tree.node_at_mut(&end) {
            let comments = &mut node.annotations_mut().comments;
            if let Some(index) = comments.iter().position(|c| c.starts_with(RESULT_MARKER)) {
                let marker = comments.remove(index);
                let result = marker[RESULT_MARKER.len()..].trim().to_string();
                info!(result = %result, "Adopted result from promoted line");
                self.metadata.result = Some(result);
            }
        }

        let mainline: Vec<Path> = self.mainline().map(|n| n.path().clone()).collect();
        for p in &mainline {
            if let Some(node) = self.tree.node_at_mut(p) {
                node.annotations_mut().comments.clear();
            }
        }
        true
    }

    fn annotations_mut(&mut self, path: &Path) -> Option<&mut Annotations> {
        let node = self.tree.node_at_mut(path);
        if node.is_none() {
            debug!(path = %path, "Annotation edit on unresolved path ignored");
        }
        node.map(Node::annotations_mut)
    }

    pub fn add_nag(&mut self, path: &Path, code: u8) -> bool {
        self.annotations_mut(path).is_some_and(|a| a.add_nag(code))
    }

    pub fn remove_nag(&mut self, path: &Path, code: u8) -> bool {
        self.annotations_mut(path).is_some_and(|a| a.remove_nag(code))
    }

    /// Comment text is read like a document comment: `}` is dropped and
    /// embedded commands such as `[%clk]` update the node.
    pub fn add_comment(&mut self, path: &Path, text: &str) -> bool {
        let added = self
            .annotations_mut(path)
            .map(|a| a.add_comment(text))
            .is_some();
        if added {
            self.tree.refresh_clocks(path);
        }
        added
    }

    pub fn edit_comment(&mut self, path: &Path, index: usize, text: &str) -> bool {
        let edited = self
            .annotations_mut(path)
            .is_some_and(|a| a.edit_comment(index, text));
        if edited {
            self.tree.refresh_clocks(path);
        }
        edited
    }

    pub fn delete_comment(&mut self, path: &Path, index: usize) -> Option<String> {
        self.annotations_mut(path)?.delete_comment(index)
    }

    /// Clock readings after the node at `path`.
    pub fn clocks_at(&self, path: &Path) -> Option<Clocks> {
        self.node_at(path).map(|n| n.annotations().clocks)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::empty()
    }
}
