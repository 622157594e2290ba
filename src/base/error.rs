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

//! Errors produced while decoding positions and moves from text.

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
/// The ways that text input describing board state can be rejected.
///
/// These are recoverable: the command that produced one is logged and dropped, and the engine
/// keeps serving the previous state.
pub enum ParseError {
    #[error("malformed position: {0}")]
    /// A FEN string which violates the grammar or describes a structurally impossible placement.
    MalformedPosition(&'static str),
    #[error("malformed move: {0}")]
    /// Move text which does not decode, or decodes to a move that is not legal in the position it
    /// was given for.
    MalformedMove(&'static str),
}
