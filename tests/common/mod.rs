#![allow(dead_code)]

use game_tree::{build_game, Game, MoveNode, Node, Path, Rules, StandardRules};

/// Parse a document with the standard rules.
pub fn game(pgn: &str) -> Game {
    build_game(pgn, &StandardRules)
}

pub fn san(node: &Node) -> &str {
    node.as_move().map(|m| m.played.san.as_str()).unwrap_or("")
}

pub fn mainline_sans(game: &Game) -> Vec<String> {
    game.mainline().map(|n| san(n).to_string()).collect()
}

/// Paths of the children of the node at `path`, in order.
pub fn child_paths(game: &Game, path: &Path) -> Vec<Path> {
    let node = game.node_at(path).expect("path resolves");
    node.children()
        .iter()
        .map(|&c| game.tree().get(c).expect("child exists").path().clone())
        .collect()
}

/// Apply `sans` after the node at `path`, without inserting them.
pub fn nodes_after(game: &Game, path: &Path, sans: &[&str]) -> Vec<MoveNode> {
    let parent = game.node_at(path).expect("path resolves");
    let mut pos = StandardRules
        .starting_position(Some(&parent.state().fen))
        .expect("valid position");
    let mut ply = parent.ply();
    let mut out = Vec::new();
    for san in sans {
        ply += 1;
        let (node, next) = StandardRules.apply(&pos, san, ply).expect("legal move");
        out.push(node);
        pos = next;
    }
    out
}
