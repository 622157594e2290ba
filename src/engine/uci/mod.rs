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

//! Parsing Universal Chess Interface commands.
//!
//! UCI is a line-oriented text protocol: the GUI writes one command per line on the engine's
//! standard input and reads responses from its standard output. [`Command`] is the set of lines
//! the engine consumes; the responses it produces live in [`send`].
//!
//! Parsing stops at the command's shape. Commands that carry positions or moves hold them as raw
//! text here, and the driver applies them against real state, so that a bad value can be rejected
//! without disturbing the session.

pub mod send;

use crate::base::ParseError;

use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Everything the GUI can ask of the engine.
pub enum Command {
    /// Identify yourself and confirm the protocol.
    Uci,
    /// Ask whether the engine is ready for more commands.
    IsReady,
    /// Forget the current game; the next position starts a new one.
    NewGame,
    /// Replace the working position.
    Position {
        /// The six FEN fields to start from, or `None` for the standard start position.
        fen: Option<String>,
        /// Long-algebraic moves to apply after setting up.
        moves: Vec<String>,
    },
    /// Start searching the working position.
    Go(Vec<GoOption>),
    /// Set an engine option. Kestrel declares none, but tolerates the command.
    SetOption {
        /// The option's name.
        name: String,
        /// The option's value, if one was given.
        value: Option<String>,
    },
    /// Halt the running search and produce its best move.
    Stop,
    /// Halt everything and exit.
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The limits and clock facts that can accompany a `go`.
pub enum GoOption {
    /// Search no deeper than this many plies.
    Depth(u8),
    /// Search no more than this many nodes.
    Nodes(u64),
    /// Search for exactly this many milliseconds.
    MoveTime(u32),
    /// White's remaining clock, in milliseconds. May be negative in overtime play.
    WhiteTime(i32),
    /// Black's remaining clock, in milliseconds. May be negative in overtime play.
    BlackTime(i32),
    /// White's per-move increment, in milliseconds.
    WhiteInc(u32),
    /// Black's per-move increment, in milliseconds.
    BlackInc(u32),
    /// Moves remaining until the next time control.
    MovesToGo(u8),
    /// Search until told to stop.
    Infinite,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
/// The ways that serving the protocol can go wrong.
pub enum UciError {
    #[error("protocol error: {0}")]
    /// A line that is not a recognizable command, or a command with a malformed shape.
    /// Logged and dropped; the engine stays ready.
    Protocol(String),
    #[error(transparent)]
    /// A structurally fine command carrying an unusable position or move.
    /// Logged and dropped; the engine stays ready.
    Parse(#[from] ParseError),
    #[error("internal error: {0}")]
    /// A broken invariant inside the engine itself. Fatal: the process exits nonzero.
    Internal(String),
}

impl Command {
    /// Read one line of protocol input.
    ///
    /// # Errors
    ///
    /// Returns a [`UciError::Protocol`] when the line does not parse as a command.
    pub fn parse_line(line: &str) -> Result<Command, UciError> {
        let mut tokens = line.split_ascii_whitespace();
        let head = tokens
            .next()
            .ok_or_else(|| UciError::Protocol("empty line".into()))?;
        match head {
            "uci" => Ok(Command::Uci),
            "isready" => Ok(Command::IsReady),
            "ucinewgame" => Ok(Command::NewGame),
            "position" => Command::parse_position(&mut tokens),
            "go" => Command::parse_go(&mut tokens),
            "setoption" => Command::parse_set_option(&mut tokens),
            "stop" => Ok(Command::Stop),
            "quit" => Ok(Command::Quit),
            _ => Err(UciError::Protocol(format!("unrecognized command {head}"))),
        }
    }

    /// Parse the remainder of a `position` line: `startpos | fen <6 fields>`, then optionally
    /// `moves m1 m2 ...`.
    fn parse_position(tokens: &mut dyn Iterator<Item = &str>) -> Result<Command, UciError> {
        let fen = match tokens.next() {
            Some("startpos") => {
                match tokens.next() {
                    Some("moves") | None => (),
                    Some(other) => {
                        return Err(UciError::Protocol(format!(
                            "expected `moves` after `startpos`, got `{other}`"
                        )))
                    }
                }
                None
            }
            Some("fen") => {
                let mut fen = String::new();
                loop {
                    match tokens.next() {
                        Some("moves") | None => break,
                        Some(field) => {
                            if !fen.is_empty() {
                                fen.push(' ');
                            }
                            fen.push_str(field);
                        }
                    }
                }
                Some(fen)
            }
            _ => {
                return Err(UciError::Protocol(
                    "position requires `startpos` or `fen`".into(),
                ))
            }
        };

        Ok(Command::Position {
            fen,
            moves: tokens.map(String::from).collect(),
        })
    }

    /// Parse the remainder of a `go` line.
    fn parse_go(tokens: &mut dyn Iterator<Item = &str>) -> Result<Command, UciError> {
        /// Read the next token as an integer, or explain why not.
        fn int_arg<T: FromStr>(name: &str, tokens: &mut dyn Iterator<Item = &str>) -> Result<T, UciError>
        where
            T::Err: Display,
        {
            tokens
                .next()
                .ok_or_else(|| UciError::Protocol(format!("`{name}` requires a value")))?
                .parse()
                .map_err(|e| UciError::Protocol(format!("bad value for `{name}`: {e}")))
        }

        let mut options = Vec::new();
        while let Some(tok) = tokens.next() {
            options.push(match tok {
                "depth" => GoOption::Depth(int_arg("depth", tokens)?),
                "nodes" => GoOption::Nodes(int_arg("nodes", tokens)?),
                "movetime" => GoOption::MoveTime(int_arg("movetime", tokens)?),
                "wtime" => GoOption::WhiteTime(int_arg("wtime", tokens)?),
                "btime" => GoOption::BlackTime(int_arg("btime", tokens)?),
                "winc" => GoOption::WhiteInc(int_arg("winc", tokens)?),
                "binc" => GoOption::BlackInc(int_arg("binc", tokens)?),
                "movestogo" => GoOption::MovesToGo(int_arg("movestogo", tokens)?),
                "infinite" => GoOption::Infinite,
                _ => return Err(UciError::Protocol(format!("unrecognized go option {tok}"))),
            });
        }
        Ok(Command::Go(options))
    }

    /// Parse the remainder of a `setoption` line: `name <key...> [value <value...>]`.
    fn parse_set_option(tokens: &mut dyn Iterator<Item = &str>) -> Result<Command, UciError> {
        match tokens.next() {
            Some("name") => (),
            _ => return Err(UciError::Protocol("setoption requires `name`".into())),
        }

        let mut name = String::new();
        loop {
            match tokens.next() {
                None => {
                    return Ok(Command::SetOption { name, value: None });
                }
                Some("value") => break,
                Some(word) => {
                    if !name.is_empty() {
                        name.push(' ');
                    }
                    name.push_str(word);
                }
            }
        }

        let mut value = String::new();
        for word in tokens {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(word);
        }
        Ok(Command::SetOption {
            name,
            value: Some(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_commands() {
        assert_eq!(Command::parse_line("uci\n"), Ok(Command::Uci));
        assert_eq!(Command::parse_line("isready"), Ok(Command::IsReady));
        assert_eq!(Command::parse_line("  stop  "), Ok(Command::Stop));
        assert_eq!(Command::parse_line("quit"), Ok(Command::Quit));
        assert_eq!(Command::parse_line("ucinewgame"), Ok(Command::NewGame));
    }

    #[test]
    fn position_startpos() {
        assert_eq!(
            Command::parse_line("position startpos"),
            Ok(Command::Position {
                fen: None,
                moves: Vec::new()
            })
        );
        assert_eq!(
            Command::parse_line("position startpos moves e2e4 e7e5"),
            Ok(Command::Position {
                fen: None,
                moves: vec!["e2e4".into(), "e7e5".into()]
            })
        );
    }

    #[test]
    fn position_fen() {
        assert_eq!(
            Command::parse_line(
                "position fen rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1 moves c7c5"
            ),
            Ok(Command::Position {
                fen: Some("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1".into()),
                moves: vec!["c7c5".into()]
            })
        );
    }

    #[test]
    fn go_options() {
        assert_eq!(
            Command::parse_line("go depth 7 nodes 25"),
            Ok(Command::Go(vec![GoOption::Depth(7), GoOption::Nodes(25)]))
        );
        assert_eq!(
            Command::parse_line("go movetime 100"),
            Ok(Command::Go(vec![GoOption::MoveTime(100)]))
        );
        assert_eq!(
            Command::parse_line("go wtime 300000 btime -200 winc 2000 binc 2000 movestogo 40"),
            Ok(Command::Go(vec![
                GoOption::WhiteTime(300_000),
                GoOption::BlackTime(-200),
                GoOption::WhiteInc(2_000),
                GoOption::BlackInc(2_000),
                GoOption::MovesToGo(40),
            ]))
        );
        assert_eq!(
            Command::parse_line("go infinite"),
            Ok(Command::Go(vec![GoOption::Infinite]))
        );
    }

    #[test]
    fn setoption_forms() {
        assert_eq!(
            Command::parse_line("setoption name Clear Hash"),
            Ok(Command::SetOption {
                name: "Clear Hash".into(),
                value: None
            })
        );
        assert_eq!(
            Command::parse_line("setoption name Move Overhead value 30"),
            Ok(Command::SetOption {
                name: "Move Overhead".into(),
                value: Some("30".into())
            })
        );
    }

    #[test]
    fn rejected_lines() {
        assert!(Command::parse_line("").is_err());
        assert!(Command::parse_line("xyzzy").is_err());
        assert!(Command::parse_line("position e2e4").is_err());
        assert!(Command::parse_line("go depth").is_err());
        assert!(Command::parse_line("go depth banana").is_err());
        assert!(Command::parse_line("go searchmoves e2e4").is_err());
        assert!(Command::parse_line("setoption Clear Hash").is_err());
    }
}
