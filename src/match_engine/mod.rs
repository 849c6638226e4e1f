//! Per-game state machine (§4.3): `INIT -> RULES_SENT -> BEGIN_SENT ->
//! (TURN_LIGHT <-> TURN_DARK)* -> OVER`.
//!
//! Grounded on `board_server.py`'s `play()` loop: send rules and begin-game
//! to both players, then alternate turns, substituting a random legal move
//! on timeout or an invalid submission, and broadcasting every move (own,
//! opponent's, or synthesised) so both boards stay in sync.

use std::io;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::board::{Board, BoardSizeError, Side, Winner};
use crate::protocol::{read_frame, write_frame, ErrorName, FrameError, Message};

/// One end of a match: the socket and the name the player connected with.
pub struct PlayerLink {
    pub stream: TcpStream,
    pub name: String,
}

impl PlayerLink {
    pub fn new(stream: TcpStream, name: String) -> Self {
        PlayerLink { stream, name }
    }
}

enum TurnOutcome {
    Committed,
    Disconnected(Side),
}

/// Drives a single game between two connected players to completion.
pub struct Match {
    light: PlayerLink,
    dark: PlayerLink,
    board: Board,
    time_limit: Duration,
    rng: StdRng,
    shutdown: Arc<AtomicBool>,
}

impl Match {
    pub fn new(
        light: PlayerLink,
        dark: PlayerLink,
        board_size: usize,
        time_limit: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Match, BoardSizeError> {
        Ok(Match {
            light,
            dark,
            board: Board::new(board_size)?,
            time_limit,
            rng: StdRng::from_entropy(),
            shutdown,
        })
    }

    /// As `new`, but with an explicit RNG seed - used for reproducible
    /// tests of the random-move fallback.
    pub fn with_seed(
        light: PlayerLink,
        dark: PlayerLink,
        board_size: usize,
        time_limit: Duration,
        shutdown: Arc<AtomicBool>,
        seed: u64,
    ) -> Result<Match, BoardSizeError> {
        Ok(Match {
            light,
            dark,
            board: Board::new(board_size)?,
            time_limit,
            rng: StdRng::seed_from_u64(seed),
            shutdown,
        })
    }

    /// Runs the match to completion, returning the final result.
    pub fn run(mut self) -> Winner {
        for side in [Side::Light, Side::Dark] {
            if self.stream(side).set_read_timeout(Some(self.time_limit)).is_err() {
                return self.finish_on_disconnect(side);
            }
        }

        if let Err(disconnected) = self.send_rules_and_begin() {
            return self.finish_on_disconnect(disconnected);
        }

        let mut turn = Side::Light;
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                info!("match shutting down at a turn boundary");
                return Winner::None;
            }

            match self.play_turn(turn) {
                TurnOutcome::Disconnected(side) => return self.finish_on_disconnect(side),
                TurnOutcome::Committed => {}
            }

            let winner = self.board.winner();
            if winner != Winner::None {
                let _ = self.broadcast(&Message::GameOver {
                    winner: winner.wire_char().unwrap_or('d'),
                });
                return winner;
            }
            turn = turn.opposite();
        }
    }

    fn send_rules_and_begin(&mut self) -> Result<(), Side> {
        for side in [Side::Light, Side::Dark] {
            let rules = Message::GameRules {
                player_color: side.wire_char(),
                num_players: 2,
                time_limit: self.time_limit.as_secs_f64(),
                board_size: self.board.size(),
            };
            self.send_to(side, &rules).map_err(|_| side)?;
            self.send_to(side, &Message::BeginGame).map_err(|_| side)?;
        }
        Ok(())
    }

    fn play_turn(&mut self, side: Side) -> TurnOutcome {
        if self.send_to(side, &Message::YourTurn).is_err() {
            return TurnOutcome::Disconnected(side);
        }

        match read_frame(self.stream(side)) {
            Ok(Message::Move(mv)) if !mv.locations().is_empty() => {
                if self.board.execute_move(&mv) {
                    match self.broadcast(&Message::Move(mv)) {
                        Ok(()) => TurnOutcome::Committed,
                        Err(failed) => TurnOutcome::Disconnected(failed),
                    }
                } else {
                    warn!("{} submitted an illegal move, substituting random", self.link(side).name);
                    self.commit_random_move(side)
                }
            }
            Ok(_) => {
                warn!("{} sent an out-of-turn or empty move, substituting random", self.link(side).name);
                self.commit_random_move(side)
            }
            Err(e) => match classify(&e) {
                Outcome::Timeout => {
                    info!("{} timed out, substituting random move", self.link(side).name);
                    self.commit_random_move(side)
                }
                Outcome::ProtocolError => {
                    warn!("{} sent a malformed frame, substituting random move", self.link(side).name);
                    self.commit_random_move(side)
                }
                Outcome::Disconnected => TurnOutcome::Disconnected(side),
            },
        }
    }

    fn commit_random_move(&mut self, side: Side) -> TurnOutcome {
        let moves = self.board.all_legal_moves(side);
        let Some(mv) = moves.choose(&mut self.rng).cloned() else {
            // Winner() would have caught a side with no legal moves before
            // this turn was reached; defensively treat it as a commit of
            // nothing rather than panicking.
            return TurnOutcome::Committed;
        };
        self.board.execute_move(&mv);
        match self.broadcast(&Message::Move(mv)) {
            Ok(()) => TurnOutcome::Committed,
            Err(failed) => TurnOutcome::Disconnected(failed),
        }
    }

    fn finish_on_disconnect(&mut self, disconnected: Side) -> Winner {
        let survivor = disconnected.opposite();
        let _ = self.send_to(
            survivor,
            &Message::ErrorMessage {
                error_name: ErrorName::OpponentDisconnected,
            },
        );
        info!("{} disconnected, {} wins", self.link(disconnected).name, self.link(survivor).name);
        match survivor {
            Side::Light => Winner::Light,
            Side::Dark => Winner::Dark,
        }
    }

    fn send_to(&mut self, side: Side, msg: &Message) -> Result<(), FrameError> {
        write_frame(self.stream(side), msg)
    }

    fn broadcast(&mut self, msg: &Message) -> Result<(), Side> {
        self.send_to(Side::Light, msg).map_err(|_| Side::Light)?;
        self.send_to(Side::Dark, msg).map_err(|_| Side::Dark)?;
        Ok(())
    }

    fn link(&self, side: Side) -> &PlayerLink {
        match side {
            Side::Light => &self.light,
            Side::Dark => &self.dark,
        }
    }

    fn stream(&mut self, side: Side) -> &mut TcpStream {
        match side {
            Side::Light => &mut self.light.stream,
            Side::Dark => &mut self.dark.stream,
        }
    }
}

enum Outcome {
    Timeout,
    Disconnected,
    ProtocolError,
}

fn classify(e: &FrameError) -> Outcome {
    match e {
        FrameError::Eof => Outcome::Disconnected,
        FrameError::Io(io_err) if is_timeout(io_err) => Outcome::Timeout,
        FrameError::Io(_) => Outcome::Disconnected,
        FrameError::BadLength | FrameError::BadJson(_) => Outcome::ProtocolError,
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_timeouts_separately_from_disconnects() {
        let timeout = FrameError::Io(io::Error::new(io::ErrorKind::WouldBlock, "timed out"));
        assert!(matches!(classify(&timeout), Outcome::Timeout));

        let reset = FrameError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert!(matches!(classify(&reset), Outcome::Disconnected));

        assert!(matches!(classify(&FrameError::Eof), Outcome::Disconnected));
        assert!(matches!(classify(&FrameError::BadLength), Outcome::ProtocolError));
    }
}
