//! Cursor over a game: the selected path, the view flags a rendering layer
//! polls, and edits that keep the selection valid.

use serde::Serialize;
use shakmaty::Color;
use tracing::debug;

use crate::annotation::Shape;
use crate::error::GameError;
use crate::game::Game;
use crate::node::{MoveNode, Node};
use crate::path::Path;
use crate::rules::Rules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoTo {
    First,
    Prev,
    Next,
    Last,
}

/// Side panel shown next to the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pane {
    #[default]
    Board,
    Comments,
    Info,
}

/// Session-start inputs.
#[derive(Debug, Clone, Default)]
pub struct ControllerOptions {
    /// Overrides the game's own `Orientation` header.
    pub orientation: Option<Color>,
    /// Board-state prefix to jump to on open.
    pub initial_fen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeView {
    pub orig: String,
    pub dest: Option<String>,
    pub brush: &'static str,
}

impl From<&Shape> for ShapeView {
    fn from(shape: &Shape) -> Self {
        Self {
            orig: shape.orig.to_string(),
            dest: shape.dest.map(|d| d.to_string()),
            brush: shape.brush.name(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClockView {
    pub white: Option<String>,
    pub black: Option<String>,
}

/// Everything a board renderer needs for the selected node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub path: String,
    pub ply: u32,
    pub fen: String,
    pub orientation: &'static str,
    pub check: bool,
    pub san: Option<String>,
    pub last_move: Option<[String; 2]>,
    pub shapes: Vec<ShapeView>,
    pub clocks: ClockView,
    pub pane: Pane,
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

pub struct Controller<R: Rules> {
    game: Game,
    rules: R,
    path: Path,
    orientation: Color,
    pane: Pane,
    scroll_pending: bool,
    focus_pending: bool,
}

impl<R: Rules> Controller<R> {
    pub fn new(game: Game, rules: R, options: ControllerOptions) -> Self {
        let orientation = options
            .orientation
            .unwrap_or_else(|| game.metadata.orientation());
        let mut ctrl = Self {
            game,
            rules,
            path: Path::root(),
            orientation,
            pane: Pane::Board,
            scroll_pending: false,
            focus_pending: false,
        };
        if let Some(fen) = options.initial_fen.as_deref() {
            ctrl.jump_to_fen(fen);
        }
        ctrl
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn into_game(self) -> Game {
        self.game
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The selected node. Falls back to the root if the selection went stale.
    pub fn node(&self) -> &Node {
        self.game
            .node_at(&self.path)
            .unwrap_or_else(|| self.game.root())
    }

    pub fn orientation(&self) -> Color {
        self.orientation
    }

    pub fn pane(&self) -> Pane {
        self.pane
    }

    pub fn flip(&mut self) {
        self.orientation = self.orientation.other();
    }

    pub fn set_pane(&mut self, pane: Pane) {
        self.pane = pane;
    }

    /// True once per selection change.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_pending)
    }

    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_pending)
    }

    fn select(&mut self, path: Path, focus: bool) -> bool {
        if path == self.path {
            return false;
        }
        self.path = path;
        self.pane = Pane::Board;
        self.scroll_pending = true;
        if focus {
            self.focus_pending = true;
        }
        true
    }

    pub fn can_go_to(&self, to: GoTo) -> bool {
        match to {
            GoTo::First | GoTo::Prev => !self.path.is_root(),
            GoTo::Next | GoTo::Last => !self.node().children().is_empty(),
        }
    }

    /// Move the cursor. Returns whether the selection changed.
    pub fn go_to(&mut self, to: GoTo, focus: bool) -> bool {
        let target = match to {
            GoTo::First => Path::root(),
            GoTo::Prev => self.path.init(),
            GoTo::Next => {
                let Some(&first) = self.node().children().first() else {
                    return false;
                };
                match self.game.tree().get(first) {
                    Some(child) => child.path().clone(),
                    None => return false,
                }
            }
            GoTo::Last => self.game.last_mainline().path().clone(),
        };
        self.select(target, focus)
    }

    /// Select `path` directly. Paths that do not resolve are ignored.
    pub fn to_path(&mut self, path: &Path, focus: bool) -> bool {
        if self.game.node_at(path).is_none() {
            debug!(path = %path, "Selection of unresolved path ignored");
            return false;
        }
        self.select(path.clone(), focus)
    }

    /// Select the first mainline node whose board state starts with
    /// `prefix`, or the end of the mainline when none does.
    pub fn jump_to_fen(&mut self, prefix: &str) -> bool {
        match self.game.find_mainline_fen(prefix) {
            Some(node) => {
                let path = node.path().clone();
                self.select(path, false)
            }
            None => {
                debug!(prefix, "No mainline position matches, going to last");
                self.go_to(GoTo::Last, false)
            }
        }
    }

    /// Play `san` from the selected node and select the resulting node.
    pub fn play(&mut self, san: &str) -> Result<Path, GameError> {
        let parent = self.node();
        let pos = self.rules.starting_position(Some(&parent.state().fen))?;
        let ply = parent
            .ply()
            .checked_add(1)
            .ok_or_else(|| GameError::illegal(san, "ply out of range"))?;
        let (node, _) = self.rules.apply(&pos, san, ply)?;
        let from = self.path.clone();
        let path = self
            .game
            .insert(&from, node)
            .ok_or_else(|| GameError::illegal(san, "selected node no longer exists"))?;
        self.select(path.clone(), false);
        Ok(path)
    }

    /// Insert an externally applied move under `parent` and select it.
    pub fn insert(&mut self, parent: &Path, node: MoveNode) -> Option<Path> {
        let path = self.game.insert(parent, node)?;
        self.select(path.clone(), false);
        Some(path)
    }

    /// Insert a line under `parent`. Moves inserted before a failure stay,
    /// and the cursor only moves when the whole line went in.
    pub fn insert_sequence<I>(&mut self, parent: &Path, nodes: I) -> Option<Path>
    where
        I: IntoIterator<Item = MoveNode>,
    {
        let path = self.game.insert_sequence(parent, nodes)?;
        self.select(path.clone(), false);
        Some(path)
    }

    /// After a removal, move the cursor up to its deepest surviving ancestor.
    fn repair_cursor(&mut self) {
        let mut path = self.path.clone();
        while !path.is_root() && self.game.node_at(&path).is_none() {
            path = path.init();
        }
        if path != self.path {
            debug!(from = %self.path, to = %path, "Cursor moved out of removed line");
            self.select(path, false);
        }
    }

    pub fn delete_subtree(&mut self, path: &Path) -> Option<MoveNode> {
        let removed = self.game.delete_subtree(path);
        self.repair_cursor();
        removed
    }

    pub fn truncate_after(&mut self, path: &Path) -> bool {
        let done = self.game.truncate_after(path);
        self.repair_cursor();
        done
    }

    pub fn delete_from(&mut self, path: &Path) -> Option<Vec<MoveNode>> {
        let removed = self.game.delete_from(path);
        self.repair_cursor();
        removed
    }

    pub fn promote_variation(&mut self, path: &Path) -> bool {
        self.game.promote_variation(path)
    }

    pub fn add_nag(&mut self, path: &Path, code: u8) -> bool {
        self.game.add_nag(path, code)
    }

    pub fn remove_nag(&mut self, path: &Path, code: u8) -> bool {
        self.game.remove_nag(path, code)
    }

    pub fn add_comment(&mut self, path: &Path, text: &str) -> bool {
        self.game.add_comment(path, text)
    }

    pub fn edit_comment(&mut self, path: &Path, index: usize, text: &str) -> bool {
        self.game.edit_comment(path, index, text)
    }

    pub fn delete_comment(&mut self, path: &Path, index: usize) -> Option<String> {
        self.game.delete_comment(path, index)
    }

    pub fn view(&self) -> BoardView {
        let node = self.node();
        let annotations = node.annotations();
        let played = node.as_move().map(|m| &m.played);
        BoardView {
            path: node.path().to_string(),
            ply: node.ply(),
            fen: node.state().fen.clone(),
            orientation: color_name(self.orientation),
            check: node.state().check,
            san: played.map(|p| p.san.clone()),
            last_move: played.map(|p| [p.from.to_string(), p.to.to_string()]),
            shapes: annotations.shapes.iter().map(ShapeView::from).collect(),
            clocks: ClockView {
                white: annotations.clocks.white.map(|c| c.to_string()),
                black: annotations.clocks.black.map(|c| c.to_string()),
            },
            pane: self.pane,
        }
    }
}
