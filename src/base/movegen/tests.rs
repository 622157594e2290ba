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

use super::*;

/// Check a sequence of perft values for the position at `fen`, starting from depth 1.
fn perft_helper(fen: &str, expected: &[u64]) {
    let mut pos = Position::from_fen(fen).unwrap();
    for (depth, &count) in expected.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let found = perft(&mut pos, depth as u8 + 1);
        assert_eq!(found, count, "depth {} of {fen}", depth + 1);
    }
}

#[test]
fn perft_start() {
    perft_helper(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        &[20, 400, 8_902, 197_281, 4_865_609],
    );
}

#[test]
/// "Kiwipete", the classic castling/pin/en-passant stress position.
fn perft_kiwipete() {
    perft_helper(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        &[48, 2_039, 97_862, 4_085_603],
    );
}

#[test]
/// An endgame heavy on pins and en passant edge cases.
fn perft_pins_and_en_passant() {
    perft_helper(
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        &[14, 191, 2_812, 43_238, 674_624],
    );
}

#[test]
/// A position stuffed with promotions and underpromotions.
fn perft_promotions() {
    perft_helper(
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        &[6, 264, 9_467, 422_333],
    );
}

#[test]
fn step_tables() {
    assert_eq!(
        KNIGHT_ATTACKS[Square::A1.index()],
        Bitboard::from(Square::B3).with_square(Square::C2)
    );
    assert_eq!(KNIGHT_ATTACKS[Square::D4.index()].len(), 8);
    assert_eq!(
        KING_ATTACKS[Square::A1.index()],
        Bitboard::from(Square::A2)
            .with_square(Square::B1)
            .with_square(Square::B2)
    );
    assert!(!KING_ATTACKS[Square::E4.index()].contains(Square::E4));
    assert_eq!(KING_ATTACKS[Square::E4.index()].len(), 8);
}

#[test]
fn outer_ring_shape() {
    // a central square has a full 16-square outer ring, two steps out in every direction
    assert_eq!(KING_OUTER_RING[Square::E4.index()].len(), 16);
    assert!(KING_OUTER_RING[Square::E4.index()].contains(Square::G6));
    assert!(!KING_OUTER_RING[Square::E4.index()].contains(Square::E5));
    assert!(!KING_OUTER_RING[Square::E4.index()].contains(Square::E4));
    // in the corner only the quarter of the ring that fits remains
    assert_eq!(
        KING_OUTER_RING[Square::A1.index()],
        Bitboard::from(Square::A3)
            .with_square(Square::B3)
            .with_square(Square::C3)
            .with_square(Square::C2)
            .with_square(Square::C1)
    );
}

#[test]
fn pawn_tables() {
    assert_eq!(
        PAWN_ATTACKS[Color::White as usize][Square::B3.index()],
        Bitboard::from(Square::A4).with_square(Square::C4)
    );
    assert_eq!(
        PAWN_ATTACKS[Color::Black as usize][Square::B5.index()],
        Bitboard::from(Square::A4).with_square(Square::C4)
    );
    // no pawn can stand on the back ranks, so those entries are empty
    assert!(PAWN_ATTACKS[Color::White as usize][Square::E1.index()].is_empty());
    assert!(PAWN_ATTACKS[Color::Black as usize][Square::E8.index()].is_empty());

    assert_eq!(
        PAWN_PUSHES[Color::White as usize][Square::E2.index()],
        Bitboard::from(Square::E3)
    );
    assert_eq!(
        PAWN_PUSHES[Color::Black as usize][Square::E7.index()],
        Bitboard::from(Square::E6)
    );
    assert_eq!(
        PAWN_DOUBLE_PUSHES[Color::White as usize][Square::E2.index()],
        Bitboard::from(Square::E4)
    );
    // double pushes exist only from the starting rank
    assert!(PAWN_DOUBLE_PUSHES[Color::White as usize][Square::E3.index()].is_empty());
    assert!(PAWN_DOUBLE_PUSHES[Color::Black as usize][Square::E2.index()].is_empty());
}

#[test]
fn attackers_found() {
    let pos = Position::new();
    assert_eq!(
        attackers_to(&pos, Square::E2, Color::White),
        Bitboard::from(Square::D1)
            .with_square(Square::E1)
            .with_square(Square::F1)
            .with_square(Square::G1)
    );
    assert!(attackers_to(&pos, Square::E4, Color::White).is_empty());
    // a pawn about to promote still attacks the back rank
    let pos = Position::from_fen("4k3/6P1/8/8/8/8/8/4K3 b - - 0 1").unwrap();
    assert_eq!(
        attackers_to(&pos, Square::F8, Color::White),
        Bitboard::from(Square::G7)
    );
}

#[test]
/// A pinned knight has no legal moves at all.
fn pinned_knight_is_frozen() {
    let pos = Position::from_fen("4k3/8/8/7b/8/5N2/8/3K4 w - - 0 1").unwrap();
    assert!(pos.pinned().contains(Square::F3));
    assert!(pos
        .legal_moves()
        .iter()
        .all(|m| m.origin() != Square::F3));
}

#[test]
/// A pinned rook may slide along the pin line but never off it.
fn pinned_rook_slides_on_the_pin() {
    let pos = Position::from_fen("4k3/4r3/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
    assert!(pos.pinned().contains(Square::E2));
    let moves = pos.legal_moves();
    assert!(moves.contains(&Move::capture(Square::E2, Square::E7)));
    assert!(moves.contains(&Move::quiet(Square::E2, Square::E5)));
    assert!(!moves.iter().any(|m| m.origin() == Square::E2 && m.destination().file() != 4));
}

#[test]
/// The infamous case: both pawns leave the fifth rank in one en passant capture, exposing the
/// king along the rank. The capture must not be generated.
fn en_passant_rank_xray_forbidden() {
    let pos = Position::from_fen("8/8/8/KPp4r/8/8/8/4k3 w - c6 0 2").unwrap();
    assert!(!pos.legal_moves().iter().any(|m| m.is_en_passant()));
}

#[test]
/// The same shape without the rook: the capture is fine.
fn en_passant_allowed_without_xray() {
    let pos = Position::from_fen("8/8/8/KPp5/8/8/8/4k3 w - c6 0 2").unwrap();
    assert!(pos
        .legal_moves()
        .contains(&Move::en_passant(Square::B5, Square::C6)));
}

#[test]
/// An en passant capture is the only way out of check from the just-pushed pawn.
fn en_passant_evades_pawn_check() {
    let pos = Position::from_fen("8/8/8/2k5/3Pp3/8/8/3K4 b - d3 0 1").unwrap();
    assert!(pos
        .legal_moves()
        .contains(&Move::en_passant(Square::E4, Square::D3)));
}

#[test]
fn castling_generated_and_blocked() {
    let pos =
        Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    let moves = pos.legal_moves();
    assert!(moves.contains(&Move::castle(Square::E1, Square::G1)));
    assert!(moves.contains(&Move::castle(Square::E1, Square::C1)));

    // with a rook raking the f-file, kingside castling would pass through check
    let pos = Position::from_fen("4k3/8/8/8/8/5r2/8/R3K2R w KQ - 0 1").unwrap();
    let moves = pos.legal_moves();
    assert!(!moves.contains(&Move::castle(Square::E1, Square::G1)));
    assert!(moves.contains(&Move::castle(Square::E1, Square::C1)));
}

#[test]
fn double_check_forces_the_king_to_move() {
    // knight on f6 and rook on e1 both check the king
    let pos = Position::from_fen("4k3/8/8/8/8/8/8/K3R3 b - - 0 1").unwrap();
    assert!(pos.in_check());
    let pos =
        Position::from_fen("3qk3/8/5N2/8/8/8/8/K3R3 b - - 0 1").unwrap();
    assert_eq!(pos.checkers().len(), 2);
    assert!(pos.legal_moves().iter().all(|m| m.origin() == Square::E8));
}

#[test]
fn checkmate_and_stalemate_have_no_moves() {
    // back-rank mate
    let mated = Position::from_fen("R5k1/5ppp/8/8/8/8/8/4K3 b - - 0 1").unwrap();
    assert!(mated.in_check());
    assert!(mated.legal_moves().is_empty());

    // the classic king-and-queen stalemate
    let stale = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(!stale.in_check());
    assert!(stale.legal_moves().is_empty());
}

#[test]
/// The captures-only generator must produce exactly the capturing and promoting subset of the
/// full move list.
fn loud_moves_are_the_loud_subset(){
    for fen in [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 b - - 0 1",
        "rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PP1/RNBQKBNR b KQkq e3 0 3",
    ] {
        let pos = Position::from_fen(fen).unwrap();
        let mut expected: Vec<Move> = pos
            .legal_moves()
            .into_iter()
            .filter(|m| m.is_capture() || m.promotion_target().is_some())
            .collect();
        let mut loud: Vec<Move> = pos.loud_moves().into_iter().collect();
        expected.sort_unstable_by_key(|m| m.bits());
        loud.sort_unstable_by_key(|m| m.bits());
        assert_eq!(loud, expected, "{fen}");
    }
}
