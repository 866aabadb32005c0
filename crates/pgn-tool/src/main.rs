//! pgn-tool
//!
//! Loads an annotated game, opens a cursor on it and prints the normalized
//! document, the selected board view, or the mainline.

mod config;

use std::io::Read;

use game_tree::{build_game, write_pgn, Controller, StandardRules};
use tracing::info;

use crate::config::{Input, OutputMode, ToolConfig};

fn read_input(input: &Input) -> anyhow::Result<String> {
    let text = match input {
        Input::Stdin => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Input::File(path) => std::fs::read_to_string(path)?,
    };
    Ok(text)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file for local use
    let _ = dotenvy::dotenv();

    let config = ToolConfig::load()?;
    let text = read_input(&config.input)?;

    let game = build_game(&text, &StandardRules);
    info!(
        plies = game.ply_count(),
        nodes = game.tree().node_count(),
        "Game loaded"
    );

    let ctrl = Controller::new(game, StandardRules, config.controller_options());

    match config.output {
        OutputMode::Pgn => print!("{}", write_pgn(ctrl.game())),
        OutputMode::View => println!("{}", serde_json::to_string_pretty(&ctrl.view())?),
        OutputMode::Mainline => {
            for node in ctrl.game().mainline() {
                if let Some(m) = node.as_move() {
                    println!("{}\t{}\t{}", node.path(), m.played.san, m.state.fen);
                }
            }
        }
    }

    Ok(())
}
