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

//! Generation and verification of legal moves in a position.

mod magic;
pub use magic::{bishop_attacks, queen_attacks, rook_attacks};

#[cfg(test)]
mod tests;

use super::{Bitboard, Color, Direction, Move, Piece, Position, Square};

use arrayvec::ArrayVec;

/// The capacity of a move list. No legal chess position has more than 218 moves.
pub const MAX_MOVES: usize = 256;

/// A list of moves generated for a single position, sized so it never spills to the heap.
pub type MoveList = ArrayVec<Move, MAX_MOVES>;

/// Build a table of the squares reachable from each square by single steps in `dirs`.
///
/// Steps that travel more than `max_dist` king-moves are discarded; this is what stops a step from
/// wrapping around the edge of the board.
const fn step_attacks(dirs: &[Direction], max_dist: u8) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut i = 0;
    while i < 64 {
        let mut j = 0;
        while j < dirs.len() {
            let target = i as i16 + dirs[j].0 as i16;
            if 0 <= target && target < 64 {
                let t = target as u8;
                let fd = (t & 7).abs_diff(i as u8 & 7);
                let rd = (t >> 3).abs_diff(i as u8 >> 3);
                let dist = if fd > rd { fd } else { rd };
                if dist <= max_dist {
                    table[i as usize] = Bitboard::new(table[i as usize].as_u64() | 1 << t);
                }
            }
            j += 1;
        }
        i += 1;
    }
    table
}

/// Build a table of the squares at exactly `radius` king-steps from each square.
const fn ring(radius: u8) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut i = 0u8;
    while i < 64 {
        let mut j = 0u8;
        while j < 64 {
            let fd = (i & 7).abs_diff(j & 7);
            let rd = (i >> 3).abs_diff(j >> 3);
            let dist = if fd > rd { fd } else { rd };
            if dist == radius {
                table[i as usize] = Bitboard::new(table[i as usize].as_u64() | 1 << j);
            }
            j += 1;
        }
        i += 1;
    }
    table
}

/// Clear the entries of `table` on the first and eighth ranks, where no pawn can ever stand.
const fn clear_edge_ranks(mut table: [Bitboard; 64]) -> [Bitboard; 64] {
    let mut i = 0;
    while i < 8 {
        table[i] = Bitboard::EMPTY;
        table[56 + i] = Bitboard::EMPTY;
        i += 1;
    }
    table
}

/// Build the single-push target table for one color.
const fn pawn_pushes(white: bool) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut r = 1u8;
    while r < 7 {
        let mut f = 0u8;
        while f < 8 {
            let from = r * 8 + f;
            let to = if white { from + 8 } else { from - 8 };
            table[from as usize] = Bitboard::new(1 << to);
            f += 1;
        }
        r += 1;
    }
    table
}

/// Build the double-push target table for one color, nonzero only on its pawns' starting rank.
const fn pawn_double_pushes(white: bool) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut f = 0u8;
    while f < 8 {
        if white {
            table[(8 + f) as usize] = Bitboard::new(1 << (24 + f));
        } else {
            table[(48 + f) as usize] = Bitboard::new(1 << (32 + f));
        }
        f += 1;
    }
    table
}

/// The squares a knight on each square attacks.
pub const KNIGHT_ATTACKS: [Bitboard; 64] = step_attacks(&Direction::KNIGHT_STEPS, 2);

/// The squares a king on each square attacks: its neighborhood, excluding itself.
pub const KING_ATTACKS: [Bitboard; 64] = step_attacks(&Direction::KING_STEPS, 1);

/// The squares exactly two king-steps away from each square. Used by the king-safety evaluation
/// as the outer ring of the king's field.
pub const KING_OUTER_RING: [Bitboard; 64] = ring(2);

/// The squares a pawn attacks, indexed by color and then square. Entries on the first and eighth
/// ranks, where a pawn can never stand, are empty.
pub const PAWN_ATTACKS: [[Bitboard; 64]; 2] = [
    clear_edge_ranks(step_attacks(
        &[Direction::NORTHEAST, Direction::NORTHWEST],
        1,
    )),
    clear_edge_ranks(step_attacks(
        &[Direction::SOUTHEAST, Direction::SOUTHWEST],
        1,
    )),
];

/// The square a pawn steps to with a single push, indexed by color and then square.
pub const PAWN_PUSHES: [[Bitboard; 64]; 2] = [pawn_pushes(true), pawn_pushes(false)];

/// The square a pawn reaches with a double push, indexed by color and then square. Nonzero only
/// on the color's starting rank.
pub const PAWN_DOUBLE_PUSHES: [[Bitboard; 64]; 2] =
    [pawn_double_pushes(true), pawn_double_pushes(false)];

/// The squares from which a pawn of `color` would attack `sq`.
fn pawn_attackers_mask(sq: Square, color: Color) -> Bitboard {
    const FILE_A: Bitboard = Bitboard::new(0x0101_0101_0101_0101);
    const FILE_H: Bitboard = Bitboard::new(0x8080_8080_8080_8080);
    let bb = Bitboard::from(sq);
    match color {
        Color::White => (bb >> 7 & !FILE_A) | (bb >> 9 & !FILE_H),
        Color::Black => (bb << 7 & !FILE_H) | (bb << 9 & !FILE_A),
    }
}

#[must_use]
/// Compute the pieces of `color` which attack `sq`, treating `occupancy` as the set of blockers.
///
/// Passing an `occupancy` different from the position's own is how king moves are validated: the
/// king is removed from the occupancy so that a slider's attack continues through its old square.
pub fn attackers_with_occupancy(
    pos: &Position,
    sq: Square,
    color: Color,
    occupancy: Bitboard,
) -> Bitboard {
    let queens = pos.by_piece(Piece::Queen);
    let mut attackers = pawn_attackers_mask(sq, color) & pos.by_piece(Piece::Pawn);
    attackers |= KNIGHT_ATTACKS[sq.index()] & pos.by_piece(Piece::Knight);
    attackers |= KING_ATTACKS[sq.index()] & pos.by_piece(Piece::King);
    attackers |= rook_attacks(occupancy, sq) & (pos.by_piece(Piece::Rook) | queens);
    attackers |= bishop_attacks(occupancy, sq) & (pos.by_piece(Piece::Bishop) | queens);
    attackers & pos.by_color(color)
}

#[must_use]
/// Compute the pieces of `color` which attack `sq` in the position as it stands.
pub fn attackers_to(pos: &Position, sq: Square, color: Color) -> Bitboard {
    attackers_with_occupancy(pos, sq, color, pos.occupancy())
}

#[must_use]
/// Compute the pieces standing alone between `sq` and a slider of color `by`, which are therefore
/// pinned against `sq` (or, for the slider's own pieces, shielding it).
pub(crate) fn pins_against(pos: &Position, sq: Square, by: Color) -> Bitboard {
    let queens = pos.by_piece(Piece::Queen);
    let snipers = pos.by_color(by)
        & (rook_attacks(Bitboard::EMPTY, sq) & (queens | pos.by_piece(Piece::Rook))
            | bishop_attacks(Bitboard::EMPTY, sq) & (queens | pos.by_piece(Piece::Bishop)));

    let occupancy = pos.occupancy();
    let mut pinned = Bitboard::EMPTY;
    for sniper in snipers {
        let blockers = Bitboard::between(sq, sniper) & occupancy;
        if blockers.just_one() {
            pinned |= blockers;
        }
    }
    pinned
}

/// Append every legal move in `pos` to `list`.
///
/// When `CAPTURES_ONLY` is true, the output is restricted to the quiescence set: captures
/// (including en passant) and promotions.
pub(crate) fn generate<const CAPTURES_ONLY: bool>(pos: &Position, list: &mut MoveList) {
    let us = pos.player();
    let king = pos.king_sq(us);
    let checkers = pos.checkers();

    king_moves::<CAPTURES_ONLY>(pos, king, list);

    if checkers.more_than_one() {
        // in double check, only the king may move
        return;
    }

    // In single check, non-king moves must capture the checker or block its line; otherwise any
    // square is permitted. A knight or pawn checker shares no line with the king, leaving only
    // the capture. (A sliding checker's path to the king is necessarily empty of pieces, so this
    // mask never includes a friendly square.)
    let block_mask = match checkers.first() {
        Some(checker) => Bitboard::between(king, checker).with_square(checker),
        None => Bitboard::ALL,
    };

    piece_moves::<CAPTURES_ONLY>(pos, king, block_mask, list);
    pawn_moves::<CAPTURES_ONLY>(pos, king, block_mask, list);
    en_passant_moves(pos, king, checkers, block_mask, list);

    if !CAPTURES_ONLY && checkers.is_empty() {
        castle_moves(pos, king, list);
    }
}

/// Generate the non-castling king moves.
fn king_moves<const CAPTURES_ONLY: bool>(pos: &Position, king: Square, list: &mut MoveList) {
    let us = pos.player();
    let enemies = pos.by_color(!us);
    let mut targets = KING_ATTACKS[king.index()] & !pos.by_color(us);
    if CAPTURES_ONLY {
        targets &= enemies;
    }

    // test each destination with the king lifted off the board, so that a slider's attack is not
    // blocked by the king's own old square
    let without_king = pos.occupancy() ^ Bitboard::from(king);
    for to in targets {
        if attackers_with_occupancy(pos, to, !us, without_king).is_empty() {
            if enemies.contains(to) {
                list.push(Move::capture(king, to));
            } else {
                list.push(Move::quiet(king, to));
            }
        }
    }
}

/// Generate the knight, bishop, rook, and queen moves landing inside `block_mask`.
fn piece_moves<const CAPTURES_ONLY: bool>(
    pos: &Position,
    king: Square,
    block_mask: Bitboard,
    list: &mut MoveList,
) {
    let us = pos.player();
    let allies = pos.by_color(us);
    let enemies = pos.by_color(!us);
    let occupancy = allies | enemies;
    let pinned = pos.pinned();
    let queens = pos.by_piece(Piece::Queen);

    let mode_mask = if CAPTURES_ONLY { enemies } else { !allies };
    let targets = block_mask & mode_mask;

    let mut push_all = |from: Square, mut destinations: Bitboard| {
        if pinned.contains(from) {
            // a pinned piece may only move along the line its king shares with it
            destinations &= Bitboard::axis(king, from);
        }
        for to in destinations {
            if enemies.contains(to) {
                list.push(Move::capture(from, to));
            } else {
                list.push(Move::quiet(from, to));
            }
        }
    };

    for from in pos.by_piece(Piece::Knight) & allies {
        push_all(from, KNIGHT_ATTACKS[from.index()] & targets);
    }
    for from in (pos.by_piece(Piece::Bishop) | queens) & allies {
        push_all(from, bishop_attacks(occupancy, from) & targets);
    }
    for from in (pos.by_piece(Piece::Rook) | queens) & allies {
        push_all(from, rook_attacks(occupancy, from) & targets);
    }
}

/// Generate pawn pushes, double pushes, ordinary captures, and promotions.
fn pawn_moves<const CAPTURES_ONLY: bool>(
    pos: &Position,
    king: Square,
    block_mask: Bitboard,
    list: &mut MoveList,
) {
    let us = pos.player();
    let allies = pos.by_color(us);
    let enemies = pos.by_color(!us);
    let occupancy = allies | enemies;
    let pinned = pos.pinned();
    let promote_rank = us.pawn_promote_rank();

    for from in pos.by_piece(Piece::Pawn) & allies {
        let pin_mask = if pinned.contains(from) {
            Bitboard::axis(king, from)
        } else {
            Bitboard::ALL
        };

        // captures
        for to in PAWN_ATTACKS[us as usize][from.index()] & enemies & block_mask & pin_mask {
            if promote_rank.contains(to) {
                for target in Piece::PROMOTING {
                    list.push(Move::promotion(from, to, target, true));
                }
            } else {
                list.push(Move::capture(from, to));
            }
        }

        // pushes; the single-push square must be clear before a double push is considered
        let push = PAWN_PUSHES[us as usize][from.index()] & !occupancy;
        if push.is_empty() {
            continue;
        }
        for to in push & block_mask & pin_mask {
            if promote_rank.contains(to) {
                for target in Piece::PROMOTING {
                    list.push(Move::promotion(from, to, target, false));
                }
            } else if !CAPTURES_ONLY {
                list.push(Move::quiet(from, to));
            }
        }
        if !CAPTURES_ONLY {
            let double =
                PAWN_DOUBLE_PUSHES[us as usize][from.index()] & !occupancy & block_mask & pin_mask;
            if let Some(to) = double.first() {
                list.push(Move::double_push(from, to));
            }
        }
    }
}

/// Generate en passant captures. These are rare and slippery enough that each candidate is
/// validated by surgically rebuilding the occupancy and checking the king for slider attacks,
/// which covers both the ordinary pin cases and the fifth-rank double-disappearance trick.
fn en_passant_moves(
    pos: &Position,
    king: Square,
    checkers: Bitboard,
    block_mask: Bitboard,
    list: &mut MoveList,
) {
    let Some(ep) = pos.en_passant() else {
        return;
    };
    let us = pos.player();
    let them = !us;
    let victim = ep - us.pawn_direction();

    // When in check, the capture must either remove the checking pawn or land on the block line.
    if !checkers.is_empty() && checkers != Bitboard::from(victim) && !block_mask.contains(ep) {
        return;
    }

    let enemies = pos.by_color(them);
    let queens = pos.by_piece(Piece::Queen);
    let capturers = PAWN_ATTACKS[them as usize][ep.index()] & pos.by_piece(Piece::Pawn) & pos.by_color(us);
    for from in capturers {
        let after = pos.occupancy()
            ^ Bitboard::from(from)
            ^ Bitboard::from(victim)
            ^ Bitboard::from(ep);
        let rook_xray = rook_attacks(after, king) & (pos.by_piece(Piece::Rook) | queens) & enemies;
        let bishop_xray =
            bishop_attacks(after, king) & (pos.by_piece(Piece::Bishop) | queens) & enemies;
        if rook_xray.is_empty() && bishop_xray.is_empty() {
            list.push(Move::en_passant(from, ep));
        }
    }
}

/// Generate castling moves. Requires that the mover is not in check.
fn castle_moves(pos: &Position, king: Square, list: &mut MoveList) {
    let us = pos.player();
    let occupancy = pos.occupancy();

    let (short_empty, short_transit, long_empty, long_transit) = match us {
        Color::White => (
            Bitboard::new(0x60),
            [Square::F1, Square::G1],
            Bitboard::new(0x0E),
            [Square::D1, Square::C1],
        ),
        Color::Black => (
            Bitboard::new(0x6000_0000_0000_0000),
            [Square::F8, Square::G8],
            Bitboard::new(0x0E00_0000_0000_0000),
            [Square::D8, Square::C8],
        ),
    };

    if pos.castle_rights().kingside(us)
        && (occupancy & short_empty).is_empty()
        && !short_transit
            .iter()
            .any(|&sq| !attackers_to(pos, sq, !us).is_empty())
    {
        list.push(Move::castle(king, short_transit[1]));
    }

    if pos.castle_rights().queenside(us)
        && (occupancy & long_empty).is_empty()
        && !long_transit
            .iter()
            .any(|&sq| !attackers_to(pos, sq, !us).is_empty())
    {
        list.push(Move::castle(king, long_transit[1]));
    }
}

#[must_use]
/// Count the leaf nodes of the legal move tree `depth` plies below `pos`.
///
/// This is the standard correctness oracle for move generators: the counts for well-known
/// positions are published, and any generation bug shows up as a mismatch.
pub fn perft(pos: &mut Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut list = MoveList::new();
    generate::<false>(pos, &mut list);
    if depth == 1 {
        return list.len() as u64;
    }
    let mut total = 0;
    for m in list {
        pos.make(m);
        total += perft(pos, depth - 1);
        let undone = pos.unmake();
        debug_assert!(undone.is_ok());
    }
    total
}
