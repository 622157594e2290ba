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

//! Move ordering.
//!
//! Alpha-beta pruning lives or dies by ordering: the earlier a refutation is searched, the more
//! of the tree gets cut away. The ordering here is simple and fully deterministic: the principal
//! variation's move first, then captures by most-valuable-victim / least-valuable-attacker, then
//! everything else.

use crate::base::{Move, Piece, Position};

use super::evaluate::value;

/// Sort `moves` into search order. `pv_move`, if given, is searched first.
pub fn order(pos: &Position, moves: &mut [Move], pv_move: Option<Move>) {
    // an unstable sort never allocates; the move bits break ties so the order is reproducible
    moves.sort_unstable_by_key(|&m| {
        let score = if pv_move == Some(m) {
            i32::MAX
        } else {
            heuristic(pos, m)
        };
        (std::cmp::Reverse(score), m.bits())
    });
}

/// A static guess at how promising a move is. Captures score by victim value descending and
/// attacker value ascending; promotions count their new piece as part of the haul.
fn heuristic(pos: &Position, m: Move) -> i32 {
    let mut score = 0;

    if m.is_capture() {
        let victim = if m.is_en_passant() {
            Piece::Pawn
        } else {
            // a capture's destination is always occupied
            pos[m.destination()].map_or(Piece::Pawn, |(kind, _)| kind)
        };
        let attacker = pos[m.origin()].map_or(Piece::Pawn, |(kind, _)| kind);
        score += 1_000_000 + 16 * i32::from(value(victim).centipawn_val())
            - i32::from(value(attacker).centipawn_val());
    }

    if let Some(target) = m.promotion_target() {
        score += 500_000 + i32::from(value(target).centipawn_val());
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Square;

    #[test]
    fn pv_move_first() {
        let pos = Position::new();
        let mut moves: Vec<Move> = pos.legal_moves().into_iter().collect();
        let pv = Move::quiet(Square::G1, Square::F3);
        order(&pos, &mut moves, Some(pv));
        assert_eq!(moves[0], pv);
    }

    #[test]
    fn best_victim_cheapest_attacker_first() {
        // both the pawn and the rook can take the queen; the pawn should be tried first, and
        // queen takes pawn should come after either queen capture
        let pos =
            Position::from_fen("4k3/8/8/3q4/2P5/8/8/3R2K1 w - - 0 1").unwrap();
        let mut moves: Vec<Move> = pos.legal_moves().into_iter().collect();
        order(&pos, &mut moves, None);
        assert_eq!(moves[0], Move::capture(Square::C4, Square::D5));
        assert_eq!(moves[1], Move::capture(Square::D1, Square::D5));
    }

    #[test]
    fn ordering_is_reproducible() {
        let pos =
            Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        let mut first: Vec<Move> = pos.legal_moves().into_iter().collect();
        let mut second = first.clone();
        order(&pos, &mut first, None);
        order(&pos, &mut second, None);
        assert_eq!(first, second);
    }
}
