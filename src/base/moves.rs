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

//! Definitions of moves, which can describe any legal playable move.

use super::{ParseError, Piece, Position, Square};

use std::fmt::{Debug, Display, Formatter};

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
/// The information of one move, packed into sixteen bits.
///
/// From LSB to MSB:
/// * 6 bits: destination square
/// * 6 bits: origin square
/// * 4 bits: flag nibble
///
/// The flag nibble distinguishes quiet moves, double pawn pushes, both castles, captures,
/// en passant, and the eight promotion variants (with and without capture).
pub struct Move(u16);

/// Flag value for a plain, quiet move.
const QUIET: u16 = 0;
/// Flag value for a two-square pawn advance.
const DOUBLE_PUSH: u16 = 1;
/// Flag value for a kingside (short) castle.
const SHORT_CASTLE: u16 = 2;
/// Flag value for a queenside (long) castle.
const LONG_CASTLE: u16 = 3;
/// Flag bit marking any kind of capture.
const CAPTURE: u16 = 4;
/// Flag value for an en passant capture.
const EN_PASSANT: u16 = 5;
/// Flag bit marking any kind of promotion. The two low bits then select the promotion target.
const PROMOTION: u16 = 8;

impl Move {
    /// A sentinel for the absence of a move. Not a legal move itself, since its origin and
    /// destination coincide.
    pub const NULL: Move = Move(0);

    /// Pack a move from its parts. `flags` must be a four-bit flag value.
    const fn pack(origin: Square, destination: Square, flags: u16) -> Move {
        Move((origin.index() as u16) << 6 | destination.index() as u16 | flags << 12)
    }

    #[must_use]
    /// Create a quiet (non-capturing, non-special) move.
    pub const fn quiet(origin: Square, destination: Square) -> Move {
        Move::pack(origin, destination, QUIET)
    }

    #[must_use]
    /// Create a capturing move.
    pub const fn capture(origin: Square, destination: Square) -> Move {
        Move::pack(origin, destination, CAPTURE)
    }

    #[must_use]
    /// Create a two-square pawn push.
    pub const fn double_push(origin: Square, destination: Square) -> Move {
        Move::pack(origin, destination, DOUBLE_PUSH)
    }

    #[must_use]
    /// Create an en passant capture.
    pub const fn en_passant(origin: Square, destination: Square) -> Move {
        Move::pack(origin, destination, EN_PASSANT)
    }

    #[must_use]
    /// Create a castling move, expressed as the king's two-square step.
    pub const fn castle(origin: Square, destination: Square) -> Move {
        let flags = if destination.index() > origin.index() {
            SHORT_CASTLE
        } else {
            LONG_CASTLE
        };
        Move::pack(origin, destination, flags)
    }

    #[must_use]
    /// Create a promotion. `target` must be one of the four kinds in [`Piece::PROMOTING`].
    pub const fn promotion(
        origin: Square,
        destination: Square,
        target: Piece,
        is_capture: bool,
    ) -> Move {
        let mut flags = PROMOTION | target as u16;
        if is_capture {
            flags |= CAPTURE;
        }
        Move::pack(origin, destination, flags)
    }

    #[must_use]
    /// Get the square that this move starts from.
    pub const fn origin(self) -> Square {
        Square::wrapping((self.0 >> 6) as u8)
    }

    #[must_use]
    /// Get the square that this move ends on.
    pub const fn destination(self) -> Square {
        Square::wrapping(self.0 as u8)
    }

    /// Extract the flag nibble.
    const fn flags(self) -> u16 {
        self.0 >> 12
    }

    #[must_use]
    /// Does this move capture anything (including en passant)?
    pub const fn is_capture(self) -> bool {
        self.flags() & CAPTURE != 0
    }

    #[must_use]
    /// Is this move an en passant capture?
    pub const fn is_en_passant(self) -> bool {
        self.flags() == EN_PASSANT
    }

    #[must_use]
    /// Is this move a two-square pawn push?
    pub const fn is_double_push(self) -> bool {
        self.flags() == DOUBLE_PUSH
    }

    #[must_use]
    /// Is this move a castle (of either direction)?
    pub const fn is_castle(self) -> bool {
        self.flags() == SHORT_CASTLE || self.flags() == LONG_CASTLE
    }

    #[must_use]
    /// Get the piece kind this move promotes to, or `None` if it is not a promotion.
    pub const fn promotion_target(self) -> Option<Piece> {
        if self.flags() & PROMOTION == 0 {
            None
        } else {
            Some(Piece::PROMOTING[(self.flags() & 3) as usize])
        }
    }

    #[must_use]
    /// Get the raw bits of this move. `Move::from_bits` inverts this exactly.
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[must_use]
    /// Reconstruct a move from bits previously produced by [`Move::bits`].
    pub const fn from_bits(bits: u16) -> Move {
        Move(bits)
    }

    /// Decode a move from its long-algebraic (UCI) text in the context of a position.
    ///
    /// The context is required to tag the move correctly: `e1g1` may be a castle or an ordinary
    /// king move, and only the position knows which.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError::MalformedMove`] if the text does not have the shape of a move, or
    /// if it does not name a move that is legal in `pos`.
    pub fn from_uci(s: &str, pos: &Position) -> Result<Move, ParseError> {
        if !s.is_ascii() || (s.len() != 4 && s.len() != 5) {
            return Err(ParseError::MalformedMove(
                "move text must be 4 or 5 characters",
            ));
        }
        let origin = Square::from_algebraic(&s[0..2])
            .ok_or(ParseError::MalformedMove("unreadable origin square"))?;
        let destination = Square::from_algebraic(&s[2..4])
            .ok_or(ParseError::MalformedMove("unreadable destination square"))?;
        let target = match s.chars().nth(4) {
            None => None,
            Some(c) => Some(
                Piece::from_code(c.to_ascii_uppercase())
                    .filter(|pt| Piece::PROMOTING.contains(pt))
                    .ok_or(ParseError::MalformedMove("invalid promotion letter"))?,
            ),
        };

        // The move's flags come from the matching generated move, so anything which is not legal
        // here is rejected wholesale.
        pos.legal_moves()
            .into_iter()
            .find(|m| {
                m.origin() == origin
                    && m.destination() == destination
                    && m.promotion_target() == target
            })
            .ok_or(ParseError::MalformedMove("not a legal move here"))
    }

    #[must_use]
    /// Write this move as long-algebraic (UCI) text.
    pub fn to_uci(self) -> String {
        match self.promotion_target() {
            None => format!("{}{}", self.origin(), self.destination()),
            Some(pt) => format!(
                "{}{}{}",
                self.origin(),
                self.destination(),
                pt.code().to_ascii_lowercase()
            ),
        }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl Debug for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.origin(), self.destination())?;
        if let Some(pt) = self.promotion_target() {
            write!(f, "={}", pt.code())?;
        }
        if self.is_en_passant() {
            write!(f, " [ep]")?;
        }
        if self.is_castle() {
            write!(f, " [castle]")?;
        }
        Ok(())
    }
}
