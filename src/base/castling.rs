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

//! Castling rights management.

use super::Color;

use std::{
    fmt::{Display, Formatter},
    ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// The set of castling rights still held in a position, as a packed bitmask.
///
/// * `1 << 0`: White kingside.
/// * `1 << 1`: White queenside.
/// * `1 << 2`: Black kingside.
/// * `1 << 3`: Black queenside.
pub struct CastleRights(pub u8);

impl CastleRights {
    /// All four rights.
    pub const ALL: CastleRights = CastleRights(15);

    /// No rights at all.
    pub const NONE: CastleRights = CastleRights(0);

    /// Both of White's rights.
    pub const WHITE: CastleRights = CastleRights(3);

    /// Both of Black's rights.
    pub const BLACK: CastleRights = CastleRights(12);

    /// White's kingside castle.
    pub const WHITE_KINGSIDE: CastleRights = CastleRights(1);

    /// White's queenside castle.
    pub const WHITE_QUEENSIDE: CastleRights = CastleRights(2);

    /// Black's kingside castle.
    pub const BLACK_KINGSIDE: CastleRights = CastleRights(4);

    /// Black's queenside castle.
    pub const BLACK_QUEENSIDE: CastleRights = CastleRights(8);

    #[must_use]
    /// Can the given color still castle kingside?
    pub const fn kingside(self, color: Color) -> bool {
        let mask = match color {
            Color::White => CastleRights::WHITE_KINGSIDE,
            Color::Black => CastleRights::BLACK_KINGSIDE,
        };
        self.0 & mask.0 != 0
    }

    #[must_use]
    /// Can the given color still castle queenside?
    pub const fn queenside(self, color: Color) -> bool {
        let mask = match color {
            Color::White => CastleRights::WHITE_QUEENSIDE,
            Color::Black => CastleRights::BLACK_QUEENSIDE,
        };
        self.0 & mask.0 != 0
    }
}

impl BitOr for CastleRights {
    type Output = CastleRights;

    fn bitor(self, rhs: CastleRights) -> CastleRights {
        CastleRights(self.0 | rhs.0)
    }
}

impl BitOrAssign for CastleRights {
    fn bitor_assign(&mut self, rhs: CastleRights) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CastleRights {
    type Output = CastleRights;

    fn bitand(self, rhs: CastleRights) -> CastleRights {
        CastleRights(self.0 & rhs.0)
    }
}

impl BitAndAssign for CastleRights {
    fn bitand_assign(&mut self, rhs: CastleRights) {
        self.0 &= rhs.0;
    }
}

impl Not for CastleRights {
    type Output = CastleRights;

    fn not(self) -> CastleRights {
        CastleRights(self.0 ^ 15)
    }
}

impl Display for CastleRights {
    /// Write these rights in FEN form: a subset of `KQkq`, or `-` when empty.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if *self == CastleRights::NONE {
            return write!(f, "-");
        }
        for (right, code) in [
            (CastleRights::WHITE_KINGSIDE, 'K'),
            (CastleRights::WHITE_QUEENSIDE, 'Q'),
            (CastleRights::BLACK_KINGSIDE, 'k'),
            (CastleRights::BLACK_QUEENSIDE, 'q'),
        ] {
            if self.0 & right.0 != 0 {
                write!(f, "{code}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries() {
        assert!(CastleRights::ALL.kingside(Color::White));
        assert!(CastleRights::ALL.queenside(Color::Black));
        assert!(!CastleRights::WHITE.kingside(Color::Black));
        assert!(!CastleRights::NONE.queenside(Color::White));
    }

    #[test]
    fn fen_form() {
        assert_eq!(CastleRights::ALL.to_string(), "KQkq");
        assert_eq!(CastleRights::NONE.to_string(), "-");
        assert_eq!(
            (CastleRights::WHITE_KINGSIDE | CastleRights::BLACK_QUEENSIDE).to_string(),
            "Kq"
        );
    }
}
