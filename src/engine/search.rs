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

//! The primary search algorithm: iterative-deepening negamax with alpha-beta pruning and a
//! capture-only quiescence search at the leaves.
//!
//! The deepening driver runs the same position at depth 1, 2, 3, ... and publishes a report after
//! each completed depth. When a limit fires mid-iteration, the unfinished iteration is thrown
//! away and the previous depth's answer stands; the abort unwinds through every `make` with its
//! matching `unmake`, so the worker's position is intact afterwards.

use crate::base::{Move, Position};

use super::{
    evaluate::{evaluate, Eval},
    limit::SearchLimit,
    pick,
};

use arrayvec::ArrayVec;

use std::time::{Duration, Instant};

/// The deepest the search will ever nominally look, in plies.
pub const MAX_PLY: u8 = 64;

/// How many nodes are searched between flushes into the shared limit (and time checks).
const POLL_INTERVAL: u16 = 1024;

/// A principal variation under construction.
type PvLine = ArrayVec<Move, { MAX_PLY as usize }>;

/// The sign that a limit fired and the enclosing iteration must be discarded.
struct Stopped;

#[derive(Clone, Debug)]
/// What the search knew when it finished one depth of iterative deepening.
pub struct SearchReport {
    /// The depth that was just completed.
    pub depth: u8,
    /// The score of the position, from the mover's point of view.
    pub eval: Eval,
    /// Nodes visited since the search began (all depths so far).
    pub nodes: u64,
    /// Time elapsed since the search began.
    pub elapsed: Duration,
    /// The principal variation: the line of best play found.
    pub pv: Vec<Move>,
}

#[derive(Clone, Copy, Debug)]
/// Fixed configuration for one `go`.
pub struct SearchConfig {
    /// The maximum depth to iterate to.
    pub depth: u8,
}

impl Default for SearchConfig {
    fn default() -> SearchConfig {
        SearchConfig { depth: MAX_PLY }
    }
}

/// Search `pos` by iterative deepening until the configured depth is reached or `limit` fires,
/// calling `on_depth` with a report after each completed depth.
///
/// Returns the best move from the deepest completed iteration, or the first move in ordering if
/// the very first iteration was cut short. Returns `None` only when the position has no legal
/// moves at all.
pub fn iterate(
    pos: &Position,
    config: &SearchConfig,
    limit: &SearchLimit,
    mut on_depth: impl FnMut(&SearchReport),
) -> Option<Move> {
    let mut root_moves = pos.legal_moves();
    if root_moves.is_empty() {
        return None;
    }
    pick::order(pos, &mut root_moves, None);
    let mut best = root_moves[0];

    let started = Instant::now();
    let mut searcher = Searcher {
        pos: pos.clone(),
        limit,
        nodes: 0,
        unflushed: 0,
        prev_pv: Vec::new(),
    };

    for depth in 1..=config.depth.min(MAX_PLY) {
        let mut line = PvLine::new();
        #[allow(clippy::cast_possible_wrap)]
        let finished = searcher.negamax(depth as i8, 0, Eval::MIN, Eval::MAX, true, &mut line);
        match finished {
            Ok(eval) => {
                if let Some(&first) = line.first() {
                    best = first;
                }
                searcher.prev_pv = line.to_vec();
                on_depth(&SearchReport {
                    depth,
                    eval,
                    nodes: searcher.nodes,
                    elapsed: started.elapsed(),
                    pv: searcher.prev_pv.clone(),
                });
            }
            Err(Stopped) => break,
        }
        if limit.is_over() {
            break;
        }
    }

    Some(best)
}

/// The state threaded through one worker's recursion.
struct Searcher<'a> {
    /// The worker's own copy of the position, mutated in place by make/unmake.
    pos: Position,
    /// The shared limit, polled at every node.
    limit: &'a SearchLimit,
    /// Total nodes this worker has visited.
    nodes: u64,
    /// Nodes visited since the last flush into the limit.
    unflushed: u16,
    /// The principal variation of the previous, shallower iteration; its moves are searched
    /// first along the leftmost path.
    prev_pv: Vec<Move>,
}

impl Searcher<'_> {
    /// Count a node, periodically reporting into the shared limit and checking the clock.
    /// Fails when a limit has fired.
    fn tick(&mut self) -> Result<(), Stopped> {
        if self.limit.is_over() {
            return Err(Stopped);
        }
        self.nodes += 1;
        self.unflushed += 1;
        if self.unflushed >= POLL_INTERVAL {
            self.limit.add_nodes(u64::from(self.unflushed));
            self.unflushed = 0;
            self.limit.poll_time();
        }
        Ok(())
    }

    /// Evaluate the position to `depth` plies, from the perspective of its player to move.
    ///
    /// `alpha` and `beta` bound the window of interesting scores; a score at least `beta` fails
    /// high (the opponent would never allow this position) and returns `beta` exactly.
    /// `parent_line` receives the principal variation whenever `alpha` is improved.
    fn negamax(
        &mut self,
        depth: i8,
        ply: u8,
        mut alpha: Eval,
        beta: Eval,
        on_pv: bool,
        parent_line: &mut PvLine,
    ) -> Result<Eval, Stopped> {
        if depth <= 0 || ply >= MAX_PLY {
            return self.quiesce(alpha, beta);
        }

        self.tick()?;

        // draws by repetition, the 50-move rule, or bare material score as dead equal.
        // (At the root the moves still get searched, so a best move is always produced.)
        if ply > 0
            && (self.pos.repetitions() >= 2
                || self.pos.halfmove_clock() >= 100
                || self.pos.insufficient_material())
        {
            return Ok(Eval::DRAW);
        }

        let mut moves = self.pos.legal_moves();
        if moves.is_empty() {
            return Ok(if self.pos.in_check() {
                // mated here, and mates further away are less bad
                -Eval::mate_in(ply)
            } else {
                Eval::DRAW
            });
        }

        let pv_move = if on_pv {
            self.prev_pv.get(ply as usize).copied()
        } else {
            None
        };
        pick::order(&self.pos, &mut moves, pv_move);

        let mut line = PvLine::new();
        for (index, &m) in moves.iter().enumerate() {
            line.clear();
            self.pos.make(m);
            let result = self.negamax(
                depth - 1,
                ply + 1,
                -beta,
                -alpha,
                on_pv && index == 0,
                &mut line,
            );
            let undone = self.pos.unmake();
            debug_assert!(undone.is_ok());
            let score = -result?;

            if score >= beta {
                return Ok(beta);
            }
            if score > alpha {
                alpha = score;
                parent_line.clear();
                parent_line.push(m);
                parent_line.extend(line.iter().copied().take(MAX_PLY as usize - 1));
            }
        }

        Ok(alpha)
    }

    /// Resolve a "loud" position by searching captures and promotions only, so that leaves are
    /// never evaluated in the middle of an exchange.
    fn quiesce(&mut self, mut alpha: Eval, beta: Eval) -> Result<Eval, Stopped> {
        self.tick()?;

        // the player to move may always decline to keep capturing
        let stand_pat = evaluate(&self.pos).in_perspective(self.pos.player());
        if stand_pat >= beta {
            return Ok(beta);
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut moves = self.pos.loud_moves();
        pick::order(&self.pos, &mut moves, None);

        for &m in &moves {
            self.pos.make(m);
            let result = self.quiesce(-beta, -alpha);
            let undone = self.pos.unmake();
            debug_assert!(undone.is_ok());
            let score = -result?;

            if score >= beta {
                return Ok(beta);
            }
            if score > alpha {
                alpha = score;
            }
        }

        Ok(alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Search a position to a fixed depth with no other limits, returning the last report and
    /// the chosen move.
    fn search_helper(fen: &str, depth: u8) -> (SearchReport, Move) {
        let pos = Position::from_fen(fen).unwrap();
        let limit = SearchLimit::new();
        limit.start();
        let mut last: Option<SearchReport> = None;
        let best = iterate(&pos, &SearchConfig { depth }, &limit, |report| {
            last = Some(report.clone());
        })
        .unwrap();
        let report = last.unwrap();
        // the reported line must be playable
        let mut check = pos.clone();
        for &m in &report.pv {
            assert!(check.legal_moves().contains(&m), "unplayable pv in {fen}");
            check.make(m);
        }
        (report, best)
    }

    #[test]
    fn finds_mate_in_one() {
        // Rb8# is the only mate
        let (report, best) = search_helper("3k4/R7/1R6/5K2/8/8/8/8 w - - 0 1", 2);
        assert_eq!(best.to_uci(), "b6b8");
        assert_eq!(report.eval, Eval::mate_in(1));
    }

    #[test]
    fn sees_incoming_mate_in_four_plies() {
        // Black is getting ladder-mated no matter what, four plies out
        let (report, _) = search_helper("3k4/R7/8/5K2/3R4/8/8/8 b - - 0 1", 5);
        assert_eq!(report.eval, -Eval::mate_in(4));
    }

    #[test]
    fn grabs_the_hanging_queen() {
        let (_, best) = search_helper("4k3/8/8/3q4/2P5/8/8/6K1 w - - 0 1", 3);
        assert_eq!(best.to_uci(), "c4d5");
    }

    #[test]
    fn depth_one_move_is_legal() {
        let mut pos = Position::new();
        for text in ["e2e4", "e7e5"] {
            let m = Move::from_uci(text, &pos).unwrap();
            pos.make(m);
        }
        let limit = SearchLimit::new();
        limit.start();
        let best = iterate(&pos, &SearchConfig { depth: 1 }, &limit, |_| {}).unwrap();
        assert!(pos.legal_moves().contains(&best));
    }

    #[test]
    fn no_moves_means_no_answer() {
        // stalemate: the driver reports that there is nothing to play
        let pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let limit = SearchLimit::new();
        limit.start();
        assert!(iterate(&pos, &SearchConfig::default(), &limit, |_| {}).is_none());
    }

    #[test]
    fn node_cap_still_yields_a_legal_move() {
        let pos = Position::new();
        let limit = SearchLimit::new();
        limit.set_node_cap(Some(1));
        limit.start();
        let best = iterate(&pos, &SearchConfig { depth: 20 }, &limit, |_| {}).unwrap();
        assert!(pos.legal_moves().contains(&best));
    }

    #[test]
    fn prestopped_search_answers_immediately() {
        let pos = Position::new();
        let limit = SearchLimit::new();
        limit.start();
        limit.stop();
        let best = iterate(&pos, &SearchConfig::default(), &limit, |_| {}).unwrap();
        assert!(pos.legal_moves().contains(&best));
    }

    #[test]
    fn repeated_position_scores_as_draw() {
        // shuffling knights back and forth: the third occurrence is on the horizon, so a search
        // from a twice-seen position should call it level
        let mut pos = Position::new();
        for text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            let m = Move::from_uci(text, &pos).unwrap();
            pos.make(m);
        }
        let limit = SearchLimit::new();
        limit.start();
        let mut last_eval = None;
        iterate(&pos, &SearchConfig { depth: 3 }, &limit, |report| {
            last_eval = Some(report.eval);
        });
        // the position is balanced and repetition-bound; nothing should look winning
        let eval = last_eval.unwrap();
        assert!(eval.centipawn_val().abs() < 100, "eval was {eval}");
    }
}
