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

//! Messages sent back to the GUI, and their line format.

use crate::base::Move;
use crate::engine::search::SearchReport;

use std::fmt::{Display, Formatter};

#[derive(Clone, Debug)]
/// The lines the engine writes on its standard output.
///
/// Messages borrow what they report, since each one is formatted and written immediately.
pub enum Message<'a> {
    /// The engine's identity, sent in response to `uci`.
    Id,
    /// The end of the `uci` handshake.
    UciOk,
    /// The answer to `isready`.
    ReadyOk,
    /// A progress report from the search, one per completed depth.
    Info(&'a SearchReport),
    /// The search's final answer. `None` means the position had no legal move at all, which the
    /// protocol spells `0000`.
    BestMove(Option<Move>),
}

impl Display for Message<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Id => write!(
                f,
                "id name Kestrel {}\nid author The Kestrel Authors",
                env!("CARGO_PKG_VERSION")
            ),
            Message::UciOk => write!(f, "uciok"),
            Message::ReadyOk => write!(f, "readyok"),
            Message::Info(report) => {
                write!(f, "info depth {} score ", report.depth)?;
                match report.eval.moves_to_mate() {
                    Some(moves) if report.eval > crate::engine::evaluate::Eval::DRAW => {
                        write!(f, "mate {moves}")?;
                    }
                    Some(moves) => write!(f, "mate -{moves}")?,
                    None => write!(f, "cp {}", report.eval.centipawn_val())?,
                }
                let millis = report.elapsed.as_millis();
                write!(
                    f,
                    " nodes {} nps {} time {millis} pv",
                    report.nodes,
                    1000 * u128::from(report.nodes) / (millis + 1),
                )?;
                for m in &report.pv {
                    write!(f, " {}", m.to_uci())?;
                }
                Ok(())
            }
            Message::BestMove(Some(m)) => write!(f, "bestmove {}", m.to_uci()),
            Message::BestMove(None) => write!(f, "bestmove 0000"),
        }
    }
}
