/*
  Kestrel, a UCI-compatible chess engine.
  Copyright (C) 2024 The Kestrel Authors.

  Kestrel is free software: you can redistribute it and/or modify
  it under the terms of the GNU General Public License as published by
  the Free Software Foundation, either version 3 of the License, or
  (at your option) any later version.

  Kestrel is distributed in the hope that it will be useful,
  but WITHOUT ANY WARRANTY; without even the implied warranty of
  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
  GNU General Public License for more details.

  You should have received a copy of the GNU General Public License
  along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

//! Piece kinds, without color or location.

use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
/// The kind of a piece.
///
/// The ordering is intentional: the four promotion targets come first so that a promotion target
/// packs into two bits of a move.
pub enum Piece {
    /// A knight, which jumps in an L-shape.
    Knight = 0,
    /// A bishop, which slides diagonally.
    Bishop,
    /// A rook, which slides horizontally and vertically.
    Rook,
    /// A queen, which slides like both a rook and a bishop.
    Queen,
    /// A pawn.
    Pawn,
    /// A king.
    King,
}

impl Piece {
    /// Total number of piece kinds.
    pub const NUM: usize = 6;

    /// Every piece kind.
    pub const ALL: [Piece; Piece::NUM] = [
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::Pawn,
        Piece::King,
    ];

    /// The kinds that a pawn can promote to.
    pub const PROMOTING: [Piece; 4] = [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen];

    #[must_use]
    /// Get the FEN code of this piece, as an uppercase letter.
    pub const fn code(self) -> char {
        match self {
            Piece::Knight => 'N',
            Piece::Bishop => 'B',
            Piece::Rook => 'R',
            Piece::Queen => 'Q',
            Piece::Pawn => 'P',
            Piece::King => 'K',
        }
    }

    #[must_use]
    /// Convert an uppercase FEN letter into a piece kind.
    pub const fn from_code(c: char) -> Option<Piece> {
        match c {
            'N' => Some(Piece::Knight),
            'B' => Some(Piece::Bishop),
            'R' => Some(Piece::Rook),
            'Q' => Some(Piece::Queen),
            'P' => Some(Piece::Pawn),
            'K' => Some(Piece::King),
            _ => None,
        }
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trip() {
        for pt in Piece::ALL {
            assert_eq!(Piece::from_code(pt.code()), Some(pt));
        }
        assert_eq!(Piece::from_code('x'), None);
    }
}
