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

//! Time rationing.
//!
//! When the GUI hands over clock times instead of an explicit budget, the engine has to decide
//! for itself how long this one move deserves. The policy here is deliberately blunt: spend a
//! small slice of the remaining clock, plus the increment, and never commit more than a large
//! fraction of what is left.

use std::cmp::min;

#[must_use]
/// Decide how many milliseconds to spend on the next move.
///
/// * `movestogo`: moves remaining until the next time control, if the GUI said.
/// * `increment`: milliseconds gained back after each of our moves.
/// * `remaining`: milliseconds left on our clock.
pub fn allocation(movestogo: Option<u8>, increment: u32, remaining: u32) -> u32 {
    let budget = match movestogo {
        // split the remaining time across the moves that must be made, keeping a little back
        Some(moves) => remaining * 4 / (5 * u32::from(moves).max(1)) + increment,
        // sudden death or unknown control: a thin slice plus the increment
        None => remaining / 30 + increment,
    };
    min(budget, remaining * 4 / 5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_spends_the_whole_clock() {
        for remaining in [50, 1_000, 60_000, 3_600_000] {
            for increment in [0, 100, 10_000] {
                for movestogo in [None, Some(1), Some(10), Some(40)] {
                    assert!(allocation(movestogo, increment, remaining) < remaining);
                }
            }
        }
    }

    #[test]
    fn movestogo_splits_the_clock() {
        // with ten moves to make in sixty seconds, spend a healthy chunk but not a tenth more
        let t = allocation(Some(10), 0, 60_000);
        assert!(t >= 4_000 && t <= 6_000, "allocated {t}");
    }

    #[test]
    fn increment_is_spent() {
        assert!(allocation(None, 5_000, 60_000) > allocation(None, 0, 60_000));
    }
}
