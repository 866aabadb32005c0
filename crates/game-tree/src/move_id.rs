//! Terse 2-character move identifiers.
//! The first character encodes the origin square, the second the destination
//! square or, for promotions, the promotion piece and capture direction.

use std::fmt;

use shakmaty::{File, Move, Rank, Role, Square};

const ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!?{~}(^)[_]@#$";

const PROMO_ROLES: [Role; 4] = [Role::Queen, Role::Knight, Role::Rook, Role::Bishop];

/// Highest destination index: 64 + 3 * 3 + 2.
const MAX_TO_IDX: usize = 75;

fn char_to_idx(c: u8) -> Option<usize> {
    ID_CHARS.iter().position(|&x| x == c)
}

fn square_idx(sq: Square) -> usize {
    sq.file() as usize + sq.rank() as usize * 8
}

fn idx_to_square(idx: usize) -> Square {
    Square::from_coords(File::new((idx % 8) as u32), Rank::new((idx / 8) as u32))
}

/// Identifier of a move from a given position. Two distinct legal moves from
/// the same position never share an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoveId([u8; 2]);

impl MoveId {
    pub fn from_indices(from_idx: usize, to_idx: usize) -> Option<Self> {
        if from_idx >= 64 || to_idx > MAX_TO_IDX {
            return None;
        }
        Some(Self([ID_CHARS[from_idx], ID_CHARS[to_idx]]))
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [a, b] => Self::from_indices(char_to_idx(*a)?, char_to_idx(*b)?),
            _ => None,
        }
    }

    /// Derive the identifier of an applied move. Drops are not representable.
    pub fn from_move(mv: &Move) -> Option<Self> {
        match *mv {
            Move::Normal { from, to, promotion: Some(role), .. } => {
                let piece_idx = PROMO_ROLES.iter().position(|r| *r == role)?;
                let offset = (to.file() as i32 - from.file() as i32 + 1) as usize;
                Self::from_indices(square_idx(from), 64 + piece_idx * 3 + offset)
            }
            Move::Normal { from, to, promotion: None, .. } | Move::EnPassant { from, to } => {
                Self::from_indices(square_idx(from), square_idx(to))
            }
            Move::Castle { king, rook } => {
                // Castling is recorded as the king's destination square.
                let to_file = if rook.file() > king.file() { File::G } else { File::C };
                let to = Square::from_coords(to_file, king.rank());
                Self::from_indices(square_idx(king), square_idx(to))
            }
            Move::Put { .. } => None,
        }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Recover origin, destination and promotion piece.
    pub fn decode(&self) -> Option<(Square, Square, Option<Role>)> {
        let from_idx = char_to_idx(self.0[0])?;
        let to_idx = char_to_idx(self.0[1])?;
        let from = idx_to_square(from_idx);

        if to_idx < 64 {
            return Some((from, idx_to_square(to_idx), None));
        }

        let promo_value = to_idx - 64;
        let role = PROMO_ROLES[promo_value / 3];
        let to_file = (from.file() as i32 + (promo_value % 3) as i32 - 1).clamp(0, 7) as u32;
        let to_rank = if from.rank() == Rank::Seventh { Rank::Eighth } else { Rank::First };
        Some((from, Square::from_coords(File::new(to_file), to_rank), Some(role)))
    }
}

impl fmt::Display for MoveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
