//! Boundary to the chess rules oracle. The tree never evaluates chess rules
//! itself; it asks a [`Rules`] implementation to apply moves for it.

use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position};

use crate::annotation::Annotations;
use crate::error::GameError;
use crate::move_id::MoveId;
use crate::node::{BoardState, MoveNode, PlayedMove};

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

pub trait Rules {
    type Position: Clone;

    /// Resolve the starting position, the standard one when `fen` is `None`.
    fn starting_position(&self, fen: Option<&str>) -> Result<Self::Position, GameError>;

    /// Board state and ply of a position used as the tree root.
    fn root_state(&self, pos: &Self::Position) -> (BoardState, u32);

    /// Apply a move given in SAN. `ply` is the ply the new node will have.
    fn apply(
        &self,
        pos: &Self::Position,
        san: &str,
        ply: u32,
    ) -> Result<(MoveNode, Self::Position), GameError>;
}

/// Standard chess through shakmaty.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

fn board_state(pos: &Chess) -> BoardState {
    BoardState {
        fen: Fen::from_position(pos, EnPassantMode::Legal).to_string(),
        turn: pos.turn(),
        check: pos.is_check(),
    }
}

/// Plies played before `pos`, `None` when the move number does not fit.
fn root_ply(pos: &Chess) -> Option<u32> {
    let black_to_move = u32::from(pos.turn() == Color::Black);
    (pos.fullmoves().get() - 1)
        .checked_mul(2)?
        .checked_add(black_to_move)
}

impl Rules for StandardRules {
    type Position = Chess;

    fn starting_position(&self, fen: Option<&str>) -> Result<Chess, GameError> {
        let Some(fen) = fen else {
            return Ok(Chess::default());
        };
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| GameError::InvalidPosition(format!("{fen}: {e}")))?;
        let pos: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| GameError::InvalidPosition(format!("{fen}: {e}")))?;
        if root_ply(&pos).is_none() {
            return Err(GameError::InvalidPosition(format!(
                "{fen}: move number out of range"
            )));
        }
        Ok(pos)
    }

    fn root_state(&self, pos: &Chess) -> (BoardState, u32) {
        (board_state(pos), root_ply(pos).unwrap_or_default())
    }

    fn apply(&self, pos: &Chess, san: &str, ply: u32) -> Result<(MoveNode, Chess), GameError> {
        let san_plus: SanPlus = san
            .trim()
            .parse()
            .map_err(|e| GameError::illegal(san, format!("unreadable SAN: {e}")))?;

        let mv = san_plus
            .san
            .to_move(pos)
            .map_err(|e| GameError::illegal(san, e))?;

        let id = MoveId::from_move(&mv)
            .ok_or_else(|| GameError::illegal(san, "move has no identifier"))?;
        let (from, to, promotion) = id
            .decode()
            .ok_or_else(|| GameError::illegal(san, "move has no identifier"))?;

        let canonical = San::from_move(pos, mv.clone()).to_string();
        let mut after = pos.clone();
        after.play_unchecked(mv.clone());

        let suffix = if after.is_checkmate() {
            "#"
        } else if after.is_check() {
            "+"
        } else {
            ""
        };

        let uci = match promotion {
            Some(role) => format!("{from}{to}{}", role.char()),
            None => format!("{from}{to}"),
        };

        let node = MoveNode {
            id,
            ply,
            played: PlayedMove {
                from,
                to,
                promotion,
                san: format!("{canonical}{suffix}"),
                uci,
            },
            state: board_state(&after),
            annotations: Annotations::default(),
        };
        Ok((node, after))
    }
}
