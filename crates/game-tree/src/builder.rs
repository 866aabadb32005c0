//! Tree-building pass: replays a raw parsed tree through the rules oracle.

use tracing::{debug, warn};

use crate::annotation::{Annotations, Centis, Clocks};
use crate::error::GameError;
use crate::game::{Game, Metadata, Player, Players, TimeControl};
use crate::node::RootNode;
use crate::path::Path;
use crate::reader::{read_raw, RawGame, RawNode};
use crate::rules::Rules;
use crate::tree::MoveTree;

/// Build a game from document text, falling back to an empty game when the
/// document cannot be read at all.
pub fn build_game<R: Rules>(text: &str, rules: &R) -> Game {
    match try_build_game(text, rules) {
        Ok(game) => game,
        Err(e) => {
            warn!(error = %e, "Unreadable document, using an empty game");
            Game::empty()
        }
    }
}

pub fn try_build_game<R: Rules>(text: &str, rules: &R) -> Result<Game, GameError> {
    let raw = read_raw(text)?.ok_or_else(|| GameError::Malformed("no game found".into()))?;
    build_from_raw(&raw, rules)
}

pub fn build_from_raw<R: Rules>(raw: &RawGame, rules: &R) -> Result<Game, GameError> {
    let (players, metadata) = split_headers(&raw.headers);

    let start = rules.starting_position(raw.header("FEN"))?;
    let (state, ply) = rules.root_state(&start);

    let mut annotations = Annotations::default();
    for comment in &raw.root_comments {
        annotations.absorb_comment(comment);
    }
    if let Some(tc) = metadata.time_control {
        let initial = Some(Centis::from_secs(tc.initial));
        annotations.clocks = Clocks {
            white: initial,
            black: initial,
        };
    }

    let mut tree = MoveTree::new(RootNode {
        ply,
        state,
        annotations,
    });
    for line in &raw.moves {
        build_line(rules, &mut tree, &Path::root(), &start, ply, line);
    }

    debug!(nodes = tree.node_count(), "Built move tree");
    Ok(Game::new(tree, players, metadata))
}

/// Apply `raw` after the node at `parent`, then its continuations. A line
/// stops at its first illegal move.
fn build_line<R: Rules>(
    rules: &R,
    tree: &mut MoveTree,
    parent: &Path,
    pos: &R::Position,
    parent_ply: u32,
    raw: &RawNode,
) {
    let Some(ply) = parent_ply.checked_add(1) else {
        warn!(parent = %parent, "Dropping line past the last representable ply");
        return;
    };
    let (mut node, next) = match rules.apply(pos, &raw.san, ply) {
        Ok(applied) => applied,
        Err(e) => {
            warn!(error = %e, parent = %parent, "Dropping line at illegal move");
            return;
        }
    };

    for comment in &raw.comments {
        node.annotations.absorb_comment(comment);
    }
    for &nag in &raw.nags {
        node.annotations.add_nag(nag);
    }

    let Some(path) = tree.insert(parent, node) else {
        return;
    };
    for child in &raw.children {
        build_line(rules, tree, &path, &next, ply, child);
    }
}

fn parse_player_field(player: &mut Player, field: &str, value: &str) -> bool {
    match field {
        "" => player.name = Some(value.to_string()),
        "Title" => player.title = Some(value.to_string()),
        "Elo" => match value.parse() {
            Ok(rating) => player.rating = Some(rating),
            Err(_) => return false,
        },
        "FideId" => match value.parse() {
            Ok(id) => player.fide_id = Some(id),
            Err(_) => return false,
        },
        _ => return false,
    }
    true
}

/// Map known headers onto typed fields; everything else is kept verbatim.
pub fn split_headers(headers: &[(String, String)]) -> (Players, Metadata) {
    let mut players = Players::default();
    let mut metadata = Metadata::default();

    for (key, value) in headers {
        let known = if let Some(field) = key.strip_prefix("White") {
            parse_player_field(&mut players.white, field, value)
        } else if let Some(field) = key.strip_prefix("Black") {
            parse_player_field(&mut players.black, field, value)
        } else {
            match key.as_str() {
                "Result" => {
                    metadata.result = Some(value.clone());
                    true
                }
                "TimeControl" => {
                    metadata.time_control = TimeControl::parse(value);
                    metadata.time_control.is_some()
                }
                "Site" if value.starts_with("http") => {
                    metadata.external_link = Some(value.clone());
                    true
                }
                "Orientation" if value == "white" || value == "black" => {
                    metadata.orientation = Some(value.clone());
                    true
                }
                "Comment" => {
                    metadata.comment = Some(value.clone());
                    true
                }
                // Derived from the root position when writing.
                "FEN" | "SetUp" => true,
                _ => false,
            }
        };
        if !known {
            metadata.headers.push((key.clone(), value.clone()));
        }
    }

    (players, metadata)
}
