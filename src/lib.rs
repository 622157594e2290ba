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

#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]

//! Kestrel is a chess engine speaking the Universal Chess Interface.
//!
//! The crate is split in two: [`base`] holds the board substrate (bitboards, positions, and legal
//! move generation), while [`engine`] holds everything built on top of it (evaluation, search, and
//! the UCI front end).

pub mod base;
pub mod engine;
