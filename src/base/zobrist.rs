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

//! Zobrist hash key material.
//!
//! Every hashable feature of a position (a piece on a square, one castling right, the en passant
//! file, the side to move) gets a pseudorandom 64-bit key, and a position's hash is the XOR of the
//! keys of its features. The keys are generated once, from a fixed seed so that hashes are
//! reproducible across runs and in tests.

use super::{Color, Piece, Square};

use once_cell::sync::Lazy;

/// The key material itself.
struct Keys {
    /// One key per (color, piece kind, square).
    pieces: [[[u64; 64]; Piece::NUM]; 2],
    /// One key per castling-right bit, indexed as in `CastleRights`.
    castling: [u64; 4],
    /// One key per en passant file.
    ep_files: [u64; 8],
    /// The key for Black being the side to move.
    black_to_move: u64,
}

static KEYS: Lazy<Keys> = Lazy::new(|| {
    let rng = fastrand::Rng::with_seed(0x4b45_5354_5245_4c21);
    let mut pieces = [[[0; 64]; Piece::NUM]; 2];
    for side in &mut pieces {
        for kind in side.iter_mut() {
            for key in kind.iter_mut() {
                *key = rng.u64(..);
            }
        }
    }
    let mut castling = [0; 4];
    for key in &mut castling {
        *key = rng.u64(..);
    }
    let mut ep_files = [0; 8];
    for key in &mut ep_files {
        *key = rng.u64(..);
    }
    Keys {
        pieces,
        castling,
        ep_files,
        black_to_move: rng.u64(..),
    }
});

#[must_use]
/// Get the key for a piece of the given color and kind standing on `sq`.
pub fn piece_key(color: Color, kind: Piece, sq: Square) -> u64 {
    KEYS.pieces[color as usize][kind as usize][sq.index()]
}

#[must_use]
/// Get the key for one castling right. `bit` indexes the rights as `CastleRights` does: 0 is White
/// kingside, 3 is Black queenside.
pub fn castle_key(bit: u8) -> u64 {
    KEYS.castling[bit as usize & 3]
}

#[must_use]
/// Get the key for an en passant target on the file of `sq`.
pub fn ep_key(sq: Square) -> u64 {
    KEYS.ep_files[sq.file() as usize]
}

#[must_use]
/// Get the key for Black being the side to move.
pub fn side_key() -> u64 {
    KEYS.black_to_move
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// No two feature keys may coincide, or two different positions would trivially collide.
    fn keys_distinct() {
        let mut all = Vec::new();
        for color in [Color::White, Color::Black] {
            for kind in Piece::ALL {
                for sq in crate::base::Bitboard::ALL {
                    all.push(piece_key(color, kind, sq));
                }
            }
        }
        for bit in 0..4 {
            all.push(castle_key(bit));
        }
        for file in 0..8 {
            all.push(KEYS.ep_files[file]);
        }
        all.push(side_key());

        let count = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), count);
    }
}
