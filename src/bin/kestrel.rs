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

//! The UCI driver: reads commands from standard input, answers on standard output.
//!
//! There are exactly two actors here. This thread parses and dispatches commands; each `go`
//! spawns one scoped worker that owns a clone of the position and searches it. The only state
//! the two share is the [`SearchLimit`], whose stop flag this thread flips on `stop` and `quit`.
//! A worker is always joined (and its best move published) before the next search starts.

use std::{
    io::stdin,
    path::Path,
    process::ExitCode,
    thread::{scope, ScopedJoinHandle},
    time::Duration,
};

use kestrel::base::{Color, Move, Position};
use kestrel::engine::{
    limit::SearchLimit,
    log,
    search::{self, SearchConfig},
    time,
    uci::{send::Message, Command, GoOption, UciError},
};

/// Where the engine log lives, relative to the working directory.
const LOG_PATH: &str = "kestrel.log";

fn main() -> ExitCode {
    if let Err(e) = log::init(Path::new(LOG_PATH)) {
        // stdout belongs to the protocol; a session without a log is still a session
        eprintln!("kestrel: running without a log file: {e}");
    }
    tracing::info!("kestrel {} started", env!("CARGO_PKG_VERSION"));

    let limit = SearchLimit::new();
    let mut pos = Position::new();

    scope(|s| {
        let mut worker: Option<ScopedJoinHandle<()>> = None;

        for line in stdin().lines() {
            let Ok(line) = line else {
                tracing::warn!("failed to read from stdin; shutting down");
                break;
            };
            tracing::info!("recv: {}", line.trim_end());

            let command = match Command::parse_line(&line) {
                Ok(command) => command,
                Err(e) => {
                    tracing::warn!("{e}");
                    continue;
                }
            };

            match command {
                Command::Uci => {
                    send(&Message::Id);
                    send(&Message::UciOk);
                }
                Command::IsReady => send(&Message::ReadyOk),
                Command::NewGame => {
                    halt(&limit, &mut worker);
                    pos = Position::new();
                }
                Command::Position { fen, moves } => {
                    halt(&limit, &mut worker);
                    match load_position(fen.as_deref(), &moves) {
                        Ok(loaded) => pos = loaded,
                        // a bad position or move drops the whole command; the previous
                        // position stays in effect
                        Err(e) => tracing::warn!("{e}"),
                    }
                }
                Command::SetOption { name, .. } => {
                    tracing::info!("ignoring unknown option {name}");
                }
                Command::Go(options) => {
                    halt(&limit, &mut worker);
                    let config = configure(&limit, &options, &pos);
                    limit.start();
                    let snapshot = pos.clone();
                    let limit = &limit;
                    worker = Some(s.spawn(move || run_search(&snapshot, &config, limit)));
                }
                Command::Stop => halt(&limit, &mut worker),
                Command::Quit => break,
            }
        }

        halt(&limit, &mut worker);
    });

    tracing::info!("kestrel exiting");
    ExitCode::SUCCESS
}

/// Print a message to the GUI, mirroring it into the log.
fn send(message: &Message) {
    let text = message.to_string();
    println!("{text}");
    tracing::info!("send: {text}");
}

/// Stop any running search and wait for it to publish its best move.
fn halt<'scope>(limit: &SearchLimit, worker: &mut Option<ScopedJoinHandle<'scope, ()>>) {
    limit.stop();
    if let Some(handle) = worker.take() {
        if handle.join().is_err() {
            // a panicked worker means a broken invariant somewhere below; nothing to salvage
            let e = UciError::Internal("search worker panicked".into());
            tracing::error!("{e}");
            eprintln!("kestrel: {e}");
            std::process::exit(1);
        }
    }
}

/// Build a position from the pieces of a `position` command.
fn load_position(fen: Option<&str>, moves: &[String]) -> Result<Position, UciError> {
    let mut pos = match fen {
        None => Position::new(),
        Some(fen) => Position::from_fen(fen)?,
    };
    for text in moves {
        let m = Move::from_uci(text, &pos)?;
        pos.make(m);
    }
    Ok(pos)
}

/// Translate the options of a `go` command into limit settings and a search configuration.
fn configure(limit: &SearchLimit, options: &[GoOption], pos: &Position) -> SearchConfig {
    let mut depth = search::MAX_PLY;
    let mut nodes = None;
    let mut movetime = None;
    let mut infinite = false;
    let (mut wtime, mut btime) = (None, None);
    let (mut winc, mut binc) = (0, 0);
    let mut movestogo = None;

    for &option in options {
        match option {
            GoOption::Depth(d) => depth = d,
            GoOption::Nodes(n) => nodes = Some(n),
            GoOption::MoveTime(ms) => movetime = Some(ms),
            GoOption::WhiteTime(ms) => wtime = Some(ms),
            GoOption::BlackTime(ms) => btime = Some(ms),
            GoOption::WhiteInc(ms) => winc = ms,
            GoOption::BlackInc(ms) => binc = ms,
            GoOption::MovesToGo(n) => movestogo = Some(n),
            GoOption::Infinite => infinite = true,
        }
    }

    limit.set_node_cap(nodes);

    let (remaining, increment) = match pos.player() {
        Color::White => (wtime, winc),
        Color::Black => (btime, binc),
    };
    let duration = if infinite {
        None
    } else if let Some(ms) = movetime {
        Some(Duration::from_millis(u64::from(ms)))
    } else {
        remaining.map(|ms| {
            #[allow(clippy::cast_sign_loss)]
            let clock = ms.max(0) as u32;
            Duration::from_millis(u64::from(time::allocation(movestogo, increment, clock)))
        })
    };
    limit.set_duration(duration);

    SearchConfig { depth }
}

/// The body of one search worker: iterate, reporting each depth, then publish the best move.
fn run_search(pos: &Position, config: &SearchConfig, limit: &SearchLimit) {
    let best = search::iterate(pos, config, limit, |report| send(&Message::Info(report)));
    send(&Message::BestMove(best));
}
