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

//! The authoritative board state, including its history.

use super::{
    movegen::{self, MoveList},
    zobrist, Bitboard, CastleRights, Color, Move, ParseError, Piece, Square,
};

use nohash_hasher::IntMap;

use std::{
    fmt::{Display, Formatter},
    ops::Index,
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// A chess position together with the history that led to it.
///
/// The same placement is stored twice, as a mailbox and as bitboards, and the two views are kept
/// in agreement at every step. Each applied move pushes an undo record, so that [`Position::make`]
/// followed by [`Position::unmake`] restores the position bit for bit, hash included.
pub struct Position {
    /// The occupant of each square. Indexed by square, A1 first.
    mailbox: [Option<(Piece, Color)>; 64],
    /// The squares occupied by White and Black, respectively.
    sides: [Bitboard; 2],
    /// The squares occupied by each piece kind, in the order of [`Piece::ALL`].
    pieces: [Bitboard; Piece::NUM],
    /// One record per position in the history. The last entry describes the current position;
    /// the first describes the root (from startup or the last position load).
    states: Vec<State>,
    /// How many times each Zobrist hash has occurred in the history. Drives repetition detection.
    repetitions: IntMap<u64, u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// The per-ply state record: everything about a position that a move does not overwrite in a
/// reversible way, plus the move that produced it.
struct State {
    /// The color of the player to move.
    player: Color,
    /// The en passant target square, if the previous move was a capturable double push.
    en_passant: Option<Square>,
    /// The castling rights still held.
    castle_rights: CastleRights,
    /// Plies since the last capture or pawn move.
    halfmove: u8,
    /// The full move number, starting at 1 and incremented after Black moves.
    fullmove: u16,
    /// The Zobrist hash of this position.
    hash: u64,
    /// The enemy pieces currently giving check to the player to move.
    checkers: Bitboard,
    /// The pieces shielding the player-to-move's king from an enemy slider.
    pinned: Bitboard,
    /// The move that produced this state and the piece it captured, or `None` at the root.
    /// An en passant capture records its victim as `None`, since the victim does not stand on
    /// the move's destination square; undoing consults the move's flag instead.
    played: Option<(Move, Option<Piece>)>,
}

/// The castling right which dies when the piece on `sq` moves or is captured.
fn clipped_right(sq: Square) -> CastleRights {
    match sq {
        Square::A1 => CastleRights::WHITE_QUEENSIDE,
        Square::H1 => CastleRights::WHITE_KINGSIDE,
        Square::A8 => CastleRights::BLACK_QUEENSIDE,
        Square::H8 => CastleRights::BLACK_KINGSIDE,
        _ => CastleRights::NONE,
    }
}

impl Position {
    /// An empty board with no history. Only useful as a base for construction.
    fn bare() -> Position {
        Position {
            mailbox: [None; 64],
            sides: [Bitboard::EMPTY; 2],
            pieces: [Bitboard::EMPTY; Piece::NUM],
            states: Vec::new(),
            repetitions: IntMap::default(),
        }
    }

    #[must_use]
    /// Construct the standard chess starting position.
    pub fn new() -> Position {
        const BACK_RANK: [Piece; 8] = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        let mut pos = Position::bare();
        for file in 0..8 {
            pos.add_piece(Square::wrapping(file), BACK_RANK[file as usize], Color::White);
            pos.add_piece(Square::wrapping(8 + file), Piece::Pawn, Color::White);
            pos.add_piece(Square::wrapping(48 + file), Piece::Pawn, Color::Black);
            pos.add_piece(Square::wrapping(56 + file), BACK_RANK[file as usize], Color::Black);
        }
        pos.seal_root(Color::White, None, CastleRights::ALL, 0, 1);
        pos
    }

    /// Install the root state record for a freshly assembled placement, computing the hash and
    /// check metadata from scratch.
    fn seal_root(
        &mut self,
        player: Color,
        en_passant: Option<Square>,
        castle_rights: CastleRights,
        halfmove: u8,
        fullmove: u16,
    ) {
        let hash = self.hash_of(player, castle_rights, en_passant);
        let king = self.king_sq(player);
        let state = State {
            player,
            en_passant,
            castle_rights,
            halfmove,
            fullmove,
            hash,
            checkers: movegen::attackers_to(self, king, !player),
            pinned: movegen::pins_against(self, king, !player),
            played: None,
        };
        self.states.push(state);
        self.repetitions.insert(hash, 1);
    }

    /// Create a position from the six space-separated fields of Forsyth-Edwards notation.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError::MalformedPosition`] describing the first problem found, either in
    /// the grammar or in the placement itself (wrong king count, too many pawns, pawns on the
    /// back ranks, castling rights without their pieces, the side not to move left in check).
    pub fn from_fen(fen: &str) -> Result<Position, ParseError> {
        use ParseError::MalformedPosition;

        let mut fields = fen.split_ascii_whitespace();
        let placement = fields
            .next()
            .ok_or(MalformedPosition("FEN contains no fields"))?;

        let mut pos = Position::bare();
        let mut ranks = placement.split('/');
        for rank in (0..8u8).rev() {
            let row = ranks
                .next()
                .ok_or(MalformedPosition("placement must contain 8 ranks"))?;
            let mut file = 0u8;
            for chr in row.chars() {
                if let Some(run) = chr.to_digit(10) {
                    if run == 0 || run > 8 {
                        return Err(MalformedPosition("invalid empty-square run length"));
                    }
                    #[allow(clippy::cast_possible_truncation)]
                    {
                        file += run as u8;
                    }
                } else {
                    let color = if chr.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    let kind = Piece::from_code(chr.to_ascii_uppercase())
                        .ok_or(MalformedPosition("unrecognized piece letter"))?;
                    let sq = Square::new(file, rank)
                        .ok_or(MalformedPosition("rank describes more than 8 squares"))?;
                    pos.add_piece(sq, kind, color);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(MalformedPosition("rank describes fewer than 8 squares"));
            }
        }
        if ranks.next().is_some() {
            return Err(MalformedPosition("placement must contain exactly 8 ranks"));
        }

        let player = match fields.next() {
            Some("w") => Color::White,
            Some("b") => Color::Black,
            _ => return Err(MalformedPosition("unrecognized side to move")),
        };

        let mut castle_rights = CastleRights::NONE;
        let rights_field = fields
            .next()
            .ok_or(MalformedPosition("missing castling rights field"))?;
        if rights_field != "-" {
            for chr in rights_field.chars() {
                castle_rights |= match chr {
                    'K' => CastleRights::WHITE_KINGSIDE,
                    'Q' => CastleRights::WHITE_QUEENSIDE,
                    'k' => CastleRights::BLACK_KINGSIDE,
                    'q' => CastleRights::BLACK_QUEENSIDE,
                    _ => return Err(MalformedPosition("unrecognized castling rights letter")),
                };
            }
        }

        let en_passant = match fields.next() {
            Some("-") => None,
            Some(name) => Some(
                Square::from_algebraic(name)
                    .ok_or(MalformedPosition("unreadable en passant square"))?,
            ),
            None => return Err(MalformedPosition("missing en passant field")),
        };

        let halfmove = fields
            .next()
            .and_then(|s| s.parse::<u8>().ok())
            .ok_or(MalformedPosition("unreadable halfmove clock"))?;
        let fullmove = fields
            .next()
            .and_then(|s| s.parse::<u16>().ok())
            .filter(|&n| n >= 1)
            .ok_or(MalformedPosition("unreadable fullmove number"))?;
        if fields.next().is_some() {
            return Err(MalformedPosition("trailing input after six FEN fields"));
        }

        pos.check_structure(player, castle_rights, en_passant)?;
        pos.seal_root(player, en_passant, castle_rights, halfmove, fullmove);
        Ok(pos)
    }

    /// Reject placements that no legal game could reach in an obvious way.
    fn check_structure(
        &self,
        player: Color,
        castle_rights: CastleRights,
        en_passant: Option<Square>,
    ) -> Result<(), ParseError> {
        use ParseError::MalformedPosition;
        const BACK_RANKS: Bitboard = Bitboard::new(0xFF00_0000_0000_00FF);

        for color in [Color::White, Color::Black] {
            let side = self.by_color(color);
            if !(self.by_piece(Piece::King) & side).just_one() {
                return Err(MalformedPosition("each side must have exactly one king"));
            }
            if (self.by_piece(Piece::Pawn) & side).len() > 8 {
                return Err(MalformedPosition("more than 8 pawns of one color"));
            }
            if side.len() > 16 {
                return Err(MalformedPosition("more than 16 pieces of one color"));
            }
        }
        if !(self.by_piece(Piece::Pawn) & BACK_RANKS).is_empty() {
            return Err(MalformedPosition("pawn on the first or eighth rank"));
        }

        // every castling right must still have its king and rook at home
        for (right, king_sq, rook_sq, color) in [
            (CastleRights::WHITE_KINGSIDE, Square::E1, Square::H1, Color::White),
            (CastleRights::WHITE_QUEENSIDE, Square::E1, Square::A1, Color::White),
            (CastleRights::BLACK_KINGSIDE, Square::E8, Square::H8, Color::Black),
            (CastleRights::BLACK_QUEENSIDE, Square::E8, Square::A8, Color::Black),
        ] {
            if (castle_rights & right) != CastleRights::NONE
                && (self.mailbox[king_sq.index()] != Some((Piece::King, color))
                    || self.mailbox[rook_sq.index()] != Some((Piece::Rook, color)))
            {
                return Err(MalformedPosition("castling right without king and rook at home"));
            }
        }

        if let Some(ep) = en_passant {
            let expected_rank = match player {
                Color::White => 5,
                Color::Black => 2,
            };
            let victim = ep - player.pawn_direction();
            if ep.rank() != expected_rank
                || self.mailbox[ep.index()].is_some()
                || self.mailbox[victim.index()] != Some((Piece::Pawn, !player))
            {
                return Err(MalformedPosition("en passant square inconsistent with placement"));
            }
        }

        // the player who just moved may not have left their own king in check
        if !movegen::attackers_to(self, self.king_sq(!player), player).is_empty() {
            return Err(MalformedPosition("the side not to move is in check"));
        }

        Ok(())
    }

    #[must_use]
    /// Write this position as the six fields of Forsyth-Edwards notation.
    /// Parsing the result reproduces this position exactly.
    pub fn fen(&self) -> String {
        let mut out = String::with_capacity(90);
        for rank in (0..8u8).rev() {
            let mut empty_run = 0;
            for file in 0..8u8 {
                match self.mailbox[usize::from(rank * 8 + file)] {
                    None => empty_run += 1,
                    Some((kind, color)) => {
                        if empty_run > 0 {
                            out.push((b'0' + empty_run) as char);
                            empty_run = 0;
                        }
                        out.push(match color {
                            Color::White => kind.code(),
                            Color::Black => kind.code().to_ascii_lowercase(),
                        });
                    }
                }
            }
            if empty_run > 0 {
                out.push((b'0' + empty_run) as char);
            }
            if rank > 0 {
                out.push('/');
            }
        }

        let state = self.state();
        out.push(' ');
        out.push(match state.player {
            Color::White => 'w',
            Color::Black => 'b',
        });
        out.push_str(&format!(" {}", state.castle_rights));
        match state.en_passant {
            None => out.push_str(" -"),
            Some(sq) => out.push_str(&format!(" {sq}")),
        }
        out.push_str(&format!(" {} {}", state.halfmove, state.fullmove));
        out
    }

    /// Get the current state record.
    fn state(&self) -> &State {
        // the state stack is never empty; every constructor seals a root record
        self.states.last().unwrap()
    }

    #[must_use]
    /// Get the color of the player to move.
    pub fn player(&self) -> Color {
        self.state().player
    }

    #[must_use]
    /// Get the en passant target square, if a double push just made one available.
    pub fn en_passant(&self) -> Option<Square> {
        self.state().en_passant
    }

    #[must_use]
    /// Get the castling rights still held in this position.
    pub fn castle_rights(&self) -> CastleRights {
        self.state().castle_rights
    }

    #[must_use]
    /// Get the number of plies since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> u8 {
        self.state().halfmove
    }

    #[must_use]
    /// Get the full move number, which starts at 1 and increments after each Black move.
    pub fn fullmove_number(&self) -> u16 {
        self.state().fullmove
    }

    #[must_use]
    /// Get the Zobrist hash of this position.
    ///
    /// Hash equality is necessary but not sufficient for position equality; it is probe material,
    /// not an identity.
    pub fn hash(&self) -> u64 {
        self.state().hash
    }

    #[must_use]
    /// Get the enemy pieces currently giving check.
    pub fn checkers(&self) -> Bitboard {
        self.state().checkers
    }

    #[must_use]
    /// Get the pieces standing alone between the mover's king and an enemy slider.
    pub fn pinned(&self) -> Bitboard {
        self.state().pinned
    }

    #[must_use]
    /// Is the player to move in check?
    pub fn in_check(&self) -> bool {
        !self.state().checkers.is_empty()
    }

    #[must_use]
    /// Get the squares occupied by pieces of the given kind, of both colors.
    pub fn by_piece(&self, kind: Piece) -> Bitboard {
        self.pieces[kind as usize]
    }

    #[must_use]
    /// Get the squares occupied by pieces of the given color.
    pub fn by_color(&self, color: Color) -> Bitboard {
        self.sides[color as usize]
    }

    #[must_use]
    /// Get the set of all occupied squares.
    pub fn occupancy(&self) -> Bitboard {
        self.sides[0] | self.sides[1]
    }

    #[must_use]
    /// Get the square of the given color's king.
    pub fn king_sq(&self, color: Color) -> Square {
        // a position always has exactly one king per side
        (self.by_piece(Piece::King) & self.by_color(color))
            .first()
            .unwrap()
    }

    #[must_use]
    /// Generate the complete set of legal moves for the player to move.
    pub fn legal_moves(&self) -> MoveList {
        let mut list = MoveList::new();
        movegen::generate::<false>(self, &mut list);
        list
    }

    #[must_use]
    /// Generate only the "loud" legal moves: captures (including en passant) and promotions.
    pub fn loud_moves(&self) -> MoveList {
        let mut list = MoveList::new();
        movegen::generate::<true>(self, &mut list);
        list
    }

    #[must_use]
    /// How many times has the current position occurred in the history, this occurrence included?
    pub fn repetitions(&self) -> u8 {
        self.repetitions.get(&self.hash()).copied().unwrap_or(0)
    }

    #[must_use]
    /// Is this position drawn by bare material (two kings, king and minor piece against king, or
    /// same-colored lone bishops)?
    pub fn insufficient_material(&self) -> bool {
        const DARK_SQUARES: Bitboard = Bitboard::new(0xAA55_AA55_AA55_AA55);
        let bishops = self.by_piece(Piece::Bishop);
        match self.occupancy().len() {
            2 => true,
            3 => !(self.by_piece(Piece::Knight) | bishops).is_empty(),
            4 => {
                bishops.more_than_one()
                    && !(bishops & DARK_SQUARES).just_one()
                    && self.by_piece(Piece::Knight).is_empty()
                    && (self.by_color(Color::White) & bishops).just_one()
            }
            _ => false,
        }
    }

    /// Put a piece on an empty square, updating both board views.
    fn add_piece(&mut self, sq: Square, kind: Piece, color: Color) {
        let mask = Bitboard::from(sq);
        self.pieces[kind as usize] |= mask;
        self.sides[color as usize] |= mask;
        self.mailbox[sq.index()] = Some((kind, color));
    }

    /// Take the piece off `sq`, updating both board views.
    ///
    /// # Panics
    ///
    /// Panics if `sq` is empty.
    fn remove_piece(&mut self, sq: Square) {
        let (kind, color) = self.mailbox[sq.index()].unwrap();
        let mask = !Bitboard::from(sq);
        self.pieces[kind as usize] &= mask;
        self.sides[color as usize] &= mask;
        self.mailbox[sq.index()] = None;
    }

    /// Apply a move to the board, pushing an undo record.
    ///
    /// The move must have come from this position's move generator (or otherwise be known legal).
    ///
    /// # Panics
    ///
    /// May panic if `m` is not legal here; applying an illegal move is a programmer error.
    pub fn make(&mut self, m: Move) {
        let from = m.origin();
        let to = m.destination();
        let prev = *self.state();
        let us = prev.player;
        let them = !us;
        let (mover, _) = self.mailbox[from.index()].unwrap();

        let captured = if m.is_en_passant() {
            None
        } else {
            self.mailbox[to.index()].map(|(kind, _)| kind)
        };

        let mut hash = prev.hash ^ zobrist::side_key() ^ zobrist::piece_key(us, mover, from);

        if let Some(victim) = captured {
            self.remove_piece(to);
            hash ^= zobrist::piece_key(them, victim, to);
        }
        self.remove_piece(from);
        let landed = m.promotion_target().unwrap_or(mover);
        self.add_piece(to, landed, us);
        hash ^= zobrist::piece_key(us, landed, to);

        if m.is_en_passant() {
            let victim_sq = to - us.pawn_direction();
            self.remove_piece(victim_sq);
            hash ^= zobrist::piece_key(them, Piece::Pawn, victim_sq);
        }

        if m.is_castle() {
            let (rook_from, rook_to) = match (us, to.file()) {
                (Color::White, 6) => (Square::H1, Square::F1),
                (Color::White, 2) => (Square::A1, Square::D1),
                (Color::Black, 6) => (Square::H8, Square::F8),
                _ => (Square::A8, Square::D8),
            };
            self.remove_piece(rook_from);
            self.add_piece(rook_to, Piece::Rook, us);
            hash ^= zobrist::piece_key(us, Piece::Rook, rook_from)
                ^ zobrist::piece_key(us, Piece::Rook, rook_to);
        }

        if let Some(old_ep) = prev.en_passant {
            hash ^= zobrist::ep_key(old_ep);
        }
        let en_passant = if m.is_double_push() {
            #[allow(clippy::cast_possible_truncation)]
            let target = Square::wrapping(((from.index() + to.index()) / 2) as u8);
            // the square only matters if an enemy pawn can actually take there
            let takers =
                movegen::PAWN_ATTACKS[us as usize][target.index()] & self.by_piece(Piece::Pawn) & self.by_color(them);
            if takers.is_empty() {
                None
            } else {
                hash ^= zobrist::ep_key(target);
                Some(target)
            }
        } else {
            None
        };

        let mut lost_rights = clipped_right(from) | clipped_right(to);
        if mover == Piece::King {
            lost_rights |= match us {
                Color::White => CastleRights::WHITE,
                Color::Black => CastleRights::BLACK,
            };
        }
        lost_rights &= prev.castle_rights;
        let castle_rights = prev.castle_rights & !lost_rights;
        let mut right_bits = lost_rights.0;
        while right_bits != 0 {
            #[allow(clippy::cast_possible_truncation)]
            {
                hash ^= zobrist::castle_key(right_bits.trailing_zeros() as u8);
            }
            right_bits &= right_bits - 1;
        }

        let king = self.king_sq(them);
        let state = State {
            player: them,
            en_passant,
            castle_rights,
            halfmove: if mover == Piece::Pawn || m.is_capture() {
                0
            } else {
                prev.halfmove.saturating_add(1)
            },
            fullmove: prev.fullmove + u16::from(us == Color::Black),
            hash,
            checkers: movegen::attackers_to(self, king, us),
            pinned: movegen::pins_against(self, king, us),
            played: Some((m, captured)),
        };
        self.states.push(state);
        *self.repetitions.entry(hash).or_insert(0) += 1;

        debug_assert!(self.is_consistent());
    }

    /// Undo the most recent move, restoring the position exactly as it was, hash included.
    ///
    /// # Errors
    ///
    /// Returns an `Err` when there is no move left to undo.
    pub fn unmake(&mut self) -> Result<(), &'static str> {
        if self.states.len() < 2 {
            return Err("no moves left to unmake");
        }
        let undone = self.states.pop().unwrap();
        let (m, captured) = undone.played.unwrap();

        match self.repetitions.get_mut(&undone.hash) {
            Some(count) if *count > 1 => *count -= 1,
            _ => {
                self.repetitions.remove(&undone.hash);
            }
        }

        let from = m.origin();
        let to = m.destination();
        let (landed, color) = self.mailbox[to.index()].unwrap();

        self.remove_piece(to);
        let original = if m.promotion_target().is_some() {
            Piece::Pawn
        } else {
            landed
        };
        self.add_piece(from, original, color);

        if let Some(victim) = captured {
            self.add_piece(to, victim, !color);
        } else if m.is_en_passant() {
            self.add_piece(to - color.pawn_direction(), Piece::Pawn, !color);
        } else if m.is_castle() {
            let (rook_home, rook_castled) = match (color, to.file()) {
                (Color::White, 6) => (Square::H1, Square::F1),
                (Color::White, 2) => (Square::A1, Square::D1),
                (Color::Black, 6) => (Square::H8, Square::F8),
                _ => (Square::A8, Square::D8),
            };
            self.remove_piece(rook_castled);
            self.add_piece(rook_home, Piece::Rook, color);
        }

        debug_assert!(self.is_consistent());
        Ok(())
    }

    /// Compute this placement's Zobrist hash from scratch.
    fn hash_of(
        &self,
        player: Color,
        castle_rights: CastleRights,
        en_passant: Option<Square>,
    ) -> u64 {
        let mut hash = 0;
        for sq in Bitboard::ALL {
            if let Some((kind, color)) = self.mailbox[sq.index()] {
                hash ^= zobrist::piece_key(color, kind, sq);
            }
        }
        for bit in 0..4 {
            if castle_rights.0 & 1 << bit != 0 {
                hash ^= zobrist::castle_key(bit);
            }
        }
        if let Some(ep) = en_passant {
            hash ^= zobrist::ep_key(ep);
        }
        if player == Color::Black {
            hash ^= zobrist::side_key();
        }
        hash
    }

    #[must_use]
    /// Verify the internal agreement of this position: bitboards pairwise disjoint and matching
    /// the mailbox, the incrementally maintained hash matching a fresh recomputation, and the
    /// check metadata matching its definition. Intended for debug assertions and tests.
    pub fn is_consistent(&self) -> bool {
        let mut union = Bitboard::EMPTY;
        for kind in Piece::ALL {
            if !(union & self.by_piece(kind)).is_empty() {
                return false;
            }
            union |= self.by_piece(kind);
        }
        if !(self.sides[0] & self.sides[1]).is_empty() || union != self.occupancy() {
            return false;
        }
        for sq in Bitboard::ALL {
            let expected = match self.mailbox[sq.index()] {
                Some((kind, color)) => {
                    self.by_piece(kind).contains(sq) && self.by_color(color).contains(sq)
                }
                None => !self.occupancy().contains(sq),
            };
            if !expected {
                return false;
            }
        }

        let state = self.state();
        if state.hash != self.hash_of(state.player, state.castle_rights, state.en_passant) {
            return false;
        }
        let king = self.king_sq(state.player);
        state.checkers == movegen::attackers_to(self, king, !state.player)
            && state.pinned == movegen::pins_against(self, king, !state.player)
    }
}

impl Index<Square> for Position {
    type Output = Option<(Piece, Color)>;

    /// Get the kind and color of the piece on a square, if there is one.
    fn index(&self, sq: Square) -> &Self::Output {
        &self.mailbox[sq.index()]
    }
}

impl Default for Position {
    fn default() -> Position {
        Position::new()
    }
}

impl Display for Position {
    /// Draw the board with rank 8 at the top, White's pieces in uppercase.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8u8).rev() {
            for file in 0..8u8 {
                match self.mailbox[usize::from(rank * 8 + file)] {
                    Some((kind, Color::White)) => write!(f, "{} ", kind.code())?,
                    Some((kind, Color::Black)) => {
                        write!(f, "{} ", kind.code().to_ascii_lowercase())?;
                    }
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The FEN of the starting position.
    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn start_position_matches_its_fen() {
        assert_eq!(Position::new(), Position::from_fen(START_FEN).unwrap());
        assert!(Position::new().is_consistent());
    }

    #[test]
    fn fen_round_trips() {
        for fen in [
            START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            "8/5k2/8/8/8/3K4/8/8 b - - 31 102",
        ] {
            let pos = Position::from_fen(fen).unwrap();
            assert_eq!(pos.fen(), fen);
            assert!(pos.is_consistent());
        }
    }

    #[test]
    fn malformed_fens_rejected() {
        for fen in [
            "",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBN w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNRR w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkx - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e9 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0",
            // nine pawns
            "rnbqkbnr/pppppppp/8/8/8/4P3/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            // no black king
            "rnbq1bnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            // two white kings
            "rnbqkbnr/pppppppp/8/8/4K3/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            // pawn on the eighth rank
            "Pnbqkbnr/1ppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            // castling rights with a displaced rook
            "rnbqkbn1/pppppppp/7r/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            // the side not to move is in check
            "rnbqkbnr/ppppp1pp/8/5p1Q/8/4P3/PPPP1PPP/RNB1KBNR w KQkq - 0 1",
        ] {
            assert!(Position::from_fen(fen).is_err(), "accepted: {fen}");
        }
    }

    /// Play out `moves` (in UCI text) from the given FEN, asserting consistency at every ply,
    /// then unwind and assert that the original position is restored exactly.
    fn make_unmake_helper(fen: &str, moves: &[&str]) {
        let mut pos = Position::from_fen(fen).unwrap();
        let original = pos.clone();
        for text in moves {
            let m = Move::from_uci(text, &pos).unwrap();
            pos.make(m);
            assert!(pos.is_consistent(), "inconsistent after {text}");
        }
        for _ in moves {
            pos.unmake().unwrap();
            assert!(pos.is_consistent());
        }
        assert_eq!(pos, original);
    }

    #[test]
    fn make_unmake_identity() {
        make_unmake_helper(
            START_FEN,
            &["e2e4", "c7c5", "g1f3", "d7d6", "d2d4", "c5d4", "f3d4", "g8f6"],
        );
    }

    #[test]
    fn make_unmake_castles() {
        make_unmake_helper(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            &["e1g1", "e8c8"],
        );
    }

    #[test]
    fn make_unmake_en_passant() {
        make_unmake_helper(
            "rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PP1/RNBQKBNR b KQkq e3 0 3",
            &["d4e3"],
        );
    }

    #[test]
    fn make_unmake_promotions() {
        make_unmake_helper(
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            &["a7b8q", "b2a1n"],
        );
    }

    #[test]
    fn halfmove_clock_and_fullmove_number() {
        let mut pos = Position::new();
        pos.make(Move::from_uci("g1f3", &pos).unwrap());
        assert_eq!(pos.halfmove_clock(), 1);
        assert_eq!(pos.fullmove_number(), 1);
        pos.make(Move::from_uci("g8f6", &pos).unwrap());
        assert_eq!(pos.halfmove_clock(), 2);
        assert_eq!(pos.fullmove_number(), 2);
        pos.make(Move::from_uci("e2e4", &pos).unwrap());
        assert_eq!(pos.halfmove_clock(), 0);
    }

    #[test]
    fn repetition_counting() {
        let mut pos = Position::new();
        assert_eq!(pos.repetitions(), 1);
        for text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            pos.make(Move::from_uci(text, &pos).unwrap());
        }
        // knights returned home: the start position has now occurred twice
        assert_eq!(pos.repetitions(), 2);
        for text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            pos.make(Move::from_uci(text, &pos).unwrap());
        }
        assert_eq!(pos.repetitions(), 3);
        pos.unmake().unwrap();
        assert_eq!(pos.repetitions(), 2);
    }

    #[test]
    fn insufficient_material_cases() {
        for (fen, drawn) in [
            ("8/5k2/8/8/8/3K4/8/8 w - - 0 1", true),
            ("8/5k2/8/8/8/3KB3/8/8 w - - 0 1", true),
            ("8/5k2/8/8/8/3KN3/8/8 w - - 0 1", true),
            // both bishops live on dark squares: dead draw
            ("8/4bk2/8/8/8/3KB3/8/8 w - - 0 1", true),
            // opposite-colored bishops can still mate in a corner
            ("8/3b1k2/8/8/8/3KB3/8/8 w - - 0 1", false),
            ("8/5k2/8/8/8/3KR3/8/8 w - - 0 1", false),
            ("8/5kp1/8/8/8/3K4/8/8 w - - 0 1", false),
        ] {
            assert_eq!(
                Position::from_fen(fen).unwrap().insufficient_material(),
                drawn,
                "{fen}"
            );
        }
    }

    #[test]
    /// Seeded random playouts: every reachable position must satisfy the structural invariants,
    /// and unwinding the whole game must restore the start exactly.
    fn random_playout_invariants() {
        for seed in 0..4u64 {
            let rng = fastrand::Rng::with_seed(0xfeed_0000 + seed);
            let mut pos = Position::new();
            let original = pos.clone();
            let mut played = 0;
            for _ in 0..200 {
                let moves = pos.legal_moves();
                if moves.is_empty()
                    || pos.halfmove_clock() >= 100
                    || pos.insufficient_material()
                {
                    break;
                }
                let m = moves[rng.usize(..moves.len())];
                pos.make(m);
                played += 1;
                assert!(pos.is_consistent(), "inconsistent after {m} (seed {seed})");
                // no generated move may leave its own mover in check
                let mover = !pos.player();
                assert!(
                    movegen::attackers_to(&pos, pos.king_sq(mover), pos.player()).is_empty(),
                    "{m} left its mover in check (seed {seed})"
                );
                // the incremental hash must match a from-scratch parse of our own FEN
                let reparsed = Position::from_fen(&pos.fen()).unwrap();
                assert_eq!(reparsed.hash(), pos.hash());
            }
            for _ in 0..played {
                pos.unmake().unwrap();
            }
            assert_eq!(pos, original, "seed {seed}");
        }
    }
}
