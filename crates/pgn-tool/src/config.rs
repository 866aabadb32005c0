//! Tool configuration from environment variables and command-line flags.

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use game_tree::ControllerOptions;
use shakmaty::Color;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Normalized document text.
    #[default]
    Pgn,
    /// Board view of the selected node as JSON.
    View,
    /// One mainline move per line with its board state.
    Mainline,
}

impl FromStr for OutputMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pgn" => Ok(Self::Pgn),
            "view" => Ok(Self::View),
            "mainline" => Ok(Self::Mainline),
            other => Err(anyhow!("unknown output mode '{other}' (pgn, view, mainline)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(String),
}

#[derive(Clone, Debug)]
pub struct ToolConfig {
    pub input: Input,
    pub output: OutputMode,

    /// Board orientation override ("white" or "black")
    pub orientation: Option<Color>,

    /// Board-state prefix to select on open
    pub jump_fen: Option<String>,
}

fn parse_orientation(value: &str) -> anyhow::Result<Color> {
    match value.trim() {
        "white" => Ok(Color::White),
        "black" => Ok(Color::Black),
        other => bail!("unknown orientation '{other}' (white, black)"),
    }
}

impl ToolConfig {
    /// Load from the process environment and arguments.
    pub fn load() -> anyhow::Result<Self> {
        let args: Vec<String> = env::args().skip(1).collect();
        Self::from_sources(|key| env::var(key).ok(), &args)
    }

    /// Environment first, then flags on top.
    pub fn from_sources<F>(var: F, args: &[String]) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut output = match var("PGN_TOOL_OUTPUT") {
            Some(v) => v.parse()?,
            None => OutputMode::default(),
        };
        let orientation = var("PGN_TOOL_ORIENTATION")
            .map(|v| parse_orientation(&v))
            .transpose()?;
        let mut jump_fen = var("PGN_TOOL_JUMP_FEN").filter(|v| !v.trim().is_empty());
        let mut input = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--output" => {
                    let value = iter.next().ok_or_else(|| anyhow!("--output needs a value"))?;
                    output = value.parse()?;
                }
                "--fen" => {
                    let value = iter.next().ok_or_else(|| anyhow!("--fen needs a value"))?;
                    jump_fen = Some(value.clone());
                }
                "-" => input = Some(Input::Stdin),
                flag if flag.starts_with("--") => bail!("unknown flag '{flag}'"),
                path => input = Some(Input::File(path.to_string())),
            }
        }

        Ok(Self {
            input: input.unwrap_or(Input::Stdin),
            output,
            orientation,
            jump_fen,
        })
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            orientation: self.orientation,
            initial_fen: self.jump_fen.clone(),
        }
    }
}
