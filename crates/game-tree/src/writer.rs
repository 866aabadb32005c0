//! Serializer: move tree and metadata back to interchange notation.

use crate::game::{Game, Player, RESULT_MARKER};
use crate::node::Node;
use crate::rules::STANDARD_START_FEN;
use crate::tree::{MoveTree, NodeId};

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn player_headers(side: &str, player: &Player, out: &mut Vec<(String, String)>) {
    if let Some(name) = &player.name {
        out.push((side.to_string(), name.clone()));
    }
    if let Some(title) = &player.title {
        out.push((format!("{side}Title"), title.clone()));
    }
    if let Some(rating) = player.rating {
        out.push((format!("{side}Elo"), rating.to_string()));
    }
    if let Some(fide_id) = player.fide_id {
        out.push((format!("{side}FideId"), fide_id.to_string()));
    }
}

/// Header pairs in write order: known fields first, then the rest as read.
pub fn header_pairs(game: &Game) -> Vec<(String, String)> {
    let mut out = Vec::new();
    player_headers("White", &game.players.white, &mut out);
    player_headers("Black", &game.players.black, &mut out);

    let meta = &game.metadata;
    if let Some(tc) = meta.time_control {
        out.push(("TimeControl".to_string(), tc.to_string()));
    }
    if let Some(link) = &meta.external_link {
        out.push(("Site".to_string(), link.clone()));
    }
    if let Some(orientation) = &meta.orientation {
        out.push(("Orientation".to_string(), orientation.clone()));
    }
    if let Some(result) = &meta.result {
        out.push(("Result".to_string(), result.clone()));
    }
    if let Some(comment) = &meta.comment {
        out.push(("Comment".to_string(), comment.clone()));
    }

    let fen = &game.root().state().fen;
    if fen != STANDARD_START_FEN {
        out.push(("FEN".to_string(), fen.clone()));
        out.push(("SetUp".to_string(), "1".to_string()));
    }

    out.extend(meta.headers.iter().cloned());
    out
}

fn move_number(ply: u32) -> String {
    let number = (ply + 1) / 2;
    if ply % 2 == 1 {
        format!("{number}.")
    } else {
        format!("{number}...")
    }
}

/// Codes, text comments and the command block of a node.
fn annotation_tokens(node: &Node, out: &mut Vec<String>) {
    let annotations = node.annotations();
    out.extend(annotations.nags().iter().map(|nag| format!("${nag}")));
    out.extend(
        annotations
            .comments
            .iter()
            .filter(|c| !c.starts_with(RESULT_MARKER))
            .map(|c| format!("{{ {c} }}")),
    );
    if let Some(commands) = annotations.command_text() {
        out.push(format!("{{ {commands} }}"));
    }
}

fn move_tokens(node: &Node, forced: bool, out: &mut Vec<String>) {
    let Some(m) = node.as_move() else {
        return;
    };
    if forced || m.ply % 2 == 1 {
        out.push(move_number(m.ply));
    }
    out.push(m.played.san.clone());
    annotation_tokens(node, out);
}

/// Emit the continuations of `id`: the mainline move, each variation in
/// parentheses, then the rest of the mainline.
fn write_children(tree: &MoveTree, id: NodeId, forced: bool, out: &mut Vec<String>) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let Some((&first, variations)) = node.children().split_first() else {
        return;
    };
    let Some(first_node) = tree.get(first) else {
        return;
    };

    move_tokens(first_node, forced, out);

    for &variation in variations {
        let Some(var_node) = tree.get(variation) else {
            continue;
        };
        let mut inner = Vec::new();
        move_tokens(var_node, true, &mut inner);
        write_children(tree, variation, true, &mut inner);
        out.push(format!("({})", inner.join(" ")));
    }

    write_children(tree, first, !variations.is_empty(), out);
}

/// Movetext only: root annotations then every line below the root.
pub fn write_movetext(tree: &MoveTree) -> String {
    let mut tokens = Vec::new();
    annotation_tokens(tree.root(), &mut tokens);
    write_children(tree, tree.root_id(), true, &mut tokens);
    tokens.join(" ")
}

/// Full document: header block, blank line, movetext, result token.
pub fn write_pgn(game: &Game) -> String {
    let mut out = String::new();

    let headers = header_pairs(game);
    for (key, value) in &headers {
        out.push_str(&format!("[{key} \"{}\"]\n", escape(value)));
    }
    if !headers.is_empty() {
        out.push('\n');
    }

    let movetext = write_movetext(game.tree());
    let mut body: Vec<&str> = Vec::new();
    if !movetext.is_empty() {
        body.push(&movetext);
    }
    if let Some(result) = &game.metadata.result {
        body.push(result);
    }
    out.push_str(&body.join(" "));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_game;
    use crate::rules::StandardRules;

    fn movetext(pgn: &str) -> String {
        write_movetext(build_game(pgn, &StandardRules).tree())
    }

    #[test]
    fn test_move_numbers() {
        assert_eq!(move_number(1), "1.");
        assert_eq!(move_number(2), "1...");
        assert_eq!(move_number(3), "2.");
        assert_eq!(move_number(24), "12...");
    }

    #[test]
    fn test_plain_mainline() {
        assert_eq!(movetext("1. e4 e5 2. Nf3 Nc6 *"), "1. e4 e5 2. Nf3 Nc6");
    }

    #[test]
    fn test_variation_restates_number() {
        assert_eq!(
            movetext("1. e4 e5 (1... c5 2. Nf3) 2. Nf3 *"),
            "1. e4 e5 (1... c5 2. Nf3) 2. Nf3"
        );
        assert_eq!(
            movetext("1. e4 (1. d4 d5) 1... e5 *"),
            "1. e4 (1. d4 1... d5) 1... e5"
        );
    }

    #[test]
    fn test_codes_and_comments() {
        assert_eq!(
            movetext("{ start } 1. e4 $1 { best by test } e5 $2 $4 *"),
            "{ start } 1. e4 $1 { best by test } e5 $2 $4"
        );
    }

    #[test]
    fn test_commands_in_own_block() {
        assert_eq!(
            movetext("1. e4 { fine [%clk 0:05:00] [%cal Ge2e4] } *"),
            "1. e4 { fine } { [%clk 0:05:00] [%cal Ge2e4] }"
        );
    }

    #[test]
    fn test_result_marker_not_written() {
        let mut game = build_game("1. e4 *", &StandardRules);
        let e4 = game.last_mainline().path().clone();
        game.add_comment(&e4, "Result: 1-0");
        game.add_comment(&e4, "kept");
        assert_eq!(write_movetext(game.tree()), "1. e4 { kept }");
    }

    #[test]
    fn test_black_to_move_start() {
        let pgn = "[FEN \"4k3/8/8/8/8/8/4P3/4K3 b - - 0 12\"]\n\n12... Kd7 13. e4 *";
        assert_eq!(movetext(pgn), "12... Kd7 13. e4");
    }

    #[test]
    fn test_full_document() {
        let pgn = "[Event \"Club\"]\n[Black \"Bob\"]\n[White \"Ann\"]\n[Result \"1-0\"]\n\n1. e4 1-0";
        let game = build_game(pgn, &StandardRules);
        assert_eq!(
            write_pgn(&game),
            "[White \"Ann\"]\n[Black \"Bob\"]\n[Result \"1-0\"]\n[Event \"Club\"]\n\n1. e4 1-0\n"
        );
    }

    #[test]
    fn test_header_escaping() {
        assert_eq!(escape(r#"A "quoted" \ name"#), r#"A \"quoted\" \\ name"#);
    }

    #[test]
    fn test_setup_written_for_custom_start() {
        let pgn = "[FEN \"4k3/8/8/8/8/8/4P3/4K3 w - - 0 1\"]\n\n1. e4 *";
        let game = build_game(pgn, &StandardRules);
        let text = write_pgn(&game);
        assert!(text.starts_with("[FEN \"4k3/8/8/8/8/8/4P3/4K3 w - - 0 1\"]\n[SetUp \"1\"]\n"));
        assert!(text.ends_with("\n\n1. e4\n"));
    }

    #[test]
    fn test_empty_game_writes_nothing_but_newline() {
        assert_eq!(write_pgn(&crate::game::Game::empty()), "\n");
    }
}
