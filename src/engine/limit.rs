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

//! Search limiting.
//!
//! A `SearchLimit` is the one piece of state shared between the protocol thread and the search
//! worker. The protocol thread configures it, starts it, and can flip its stop flag at any time;
//! the worker reads the flag at every node and reports its node counts into it.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Mutex,
    },
    time::{Duration, Instant},
};

#[derive(Debug)]
/// A limit to how long a search may run, combining an external stop signal with optional
/// node-count and wall-clock budgets.
pub struct SearchLimit {
    /// Whether the search should stop now.
    over: AtomicBool,
    /// The number of nodes searched since the last `start`.
    nodes: AtomicU64,
    /// The node budget. `u64::MAX` means unlimited.
    node_cap: AtomicU64,
    /// The moment the search must end, if it is timed.
    deadline: Mutex<Option<Instant>>,
    /// The configured search duration, applied at the next `start`.
    duration: Mutex<Option<Duration>>,
}

impl SearchLimit {
    #[must_use]
    /// Create a limit with no budgets at all; only `stop` will end the search.
    pub fn new() -> SearchLimit {
        SearchLimit {
            over: AtomicBool::new(false),
            nodes: AtomicU64::new(0),
            node_cap: AtomicU64::new(u64::MAX),
            deadline: Mutex::new(None),
            duration: Mutex::new(None),
        }
    }

    /// Set or clear the node budget for subsequent searches.
    pub fn set_node_cap(&self, cap: Option<u64>) {
        self.node_cap
            .store(cap.unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    /// Set or clear the wall-clock budget for subsequent searches.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_duration(&self, duration: Option<Duration>) {
        *self.duration.lock().unwrap() = duration;
    }

    /// Arm the limit for a fresh search: clear the stop flag and node count and set the deadline
    /// from the configured duration.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn start(&self) {
        self.nodes.store(0, Ordering::Relaxed);
        self.over.store(false, Ordering::Relaxed);
        *self.deadline.lock().unwrap() = self
            .duration
            .lock()
            .unwrap()
            .map(|duration| Instant::now() + duration);
    }

    /// Order the search to stop as soon as it notices.
    pub fn stop(&self) {
        self.over.store(true, Ordering::Relaxed);
    }

    #[must_use]
    /// Has the search been told to stop?
    pub fn is_over(&self) -> bool {
        self.over.load(Ordering::Relaxed)
    }

    /// Compare the clock against the deadline, flipping the stop flag if time has run out.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn poll_time(&self) {
        if let Some(deadline) = *self.deadline.lock().unwrap() {
            if Instant::now() >= deadline {
                self.over.store(true, Ordering::Relaxed);
            }
        }
    }

    /// Add searched nodes to the running total, flipping the stop flag if the budget is spent.
    pub fn add_nodes(&self, n: u64) {
        let total = self.nodes.fetch_add(n, Ordering::Relaxed) + n;
        if total >= self.node_cap.load(Ordering::Relaxed) {
            self.over.store(true, Ordering::Relaxed);
        }
    }

    #[must_use]
    /// The number of nodes reported since the last `start`.
    pub fn num_nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }
}

impl Default for SearchLimit {
    fn default() -> SearchLimit {
        SearchLimit::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_is_sticky_until_restart() {
        let limit = SearchLimit::new();
        assert!(!limit.is_over());
        limit.stop();
        assert!(limit.is_over());
        limit.start();
        assert!(!limit.is_over());
    }

    #[test]
    fn node_cap_trips() {
        let limit = SearchLimit::new();
        limit.set_node_cap(Some(1_000));
        limit.start();
        limit.add_nodes(999);
        assert!(!limit.is_over());
        limit.add_nodes(1);
        assert!(limit.is_over());
    }

    #[test]
    fn deadline_trips() {
        let limit = SearchLimit::new();
        limit.set_duration(Some(Duration::from_millis(0)));
        limit.start();
        limit.poll_time();
        assert!(limit.is_over());
    }
}
