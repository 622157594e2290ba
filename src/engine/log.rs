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

//! The engine log.
//!
//! Every line read from the GUI, every line written back, and the engine's own notable events are
//! appended to a plain-text log file, so a misbehaving session can be reconstructed afterwards.
//! Standard output belongs to the protocol, so the log is the only place diagnostics go.

use std::{error::Error, fs, path::Path};

use tracing::Level;

/// Set up the global log writing into `path`.
///
/// If a log from a previous run exists at `path`, it is rotated aside to `<path>.old` first, so
/// each run starts an append-only file of its own.
///
/// # Errors
///
/// Returns an error when the file cannot be rotated or created, or when a global subscriber has
/// already been installed. Callers are expected to continue without a log rather than abort.
pub fn init(path: &Path) -> Result<(), Box<dyn Error>> {
    if path.exists() {
        let mut rotated = path.as_os_str().to_owned();
        rotated.push(".old");
        fs::rename(path, &rotated)?;
    }
    let file = fs::File::create(path)?;

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .with_max_level(Level::DEBUG)
        .finish();
    Ok(tracing::subscriber::set_global_default(subscriber)?)
}
