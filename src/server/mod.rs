//! Matchmaking server (§4.4): accept loop, pending-client queue, per-match
//! spawn, liveness probing, shutdown.
//!
//! Grounded on `run_checkers_server.py`'s `GameServer`: a nonblocking accept
//! loop (the standard library has no accept-with-timeout, so the listener
//! is set nonblocking and polled), a pending queue of not-yet-paired
//! clients, and a `shutdown()` entry point a signal handler can call.

use std::io::{self, ErrorKind};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{error, info, warn};

use crate::match_engine::{Match, PlayerLink};
use crate::protocol::{read_frame, write_frame, ErrorName, Message};

/// Number of players paired into a single match. Fixed at 2 for the
/// standard two-player game this spec covers.
pub const PAIR_SIZE: usize = 2;

/// How often the accept loop polls for a new connection while nonblocking.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct ServerConfig {
    pub port: u16,
    pub per_socket_timeout: Duration,
    pub board_size: usize,
}

struct PendingClient {
    stream: TcpStream,
    name: String,
}

/// Owns the listener, the pending-client queue, and the set of spawned
/// match workers. There is no process-global state: everything the server
/// needs lives here.
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    pending: Mutex<Vec<PendingClient>>,
    shutdown: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Server {
    pub fn bind(config: ServerConfig) -> io::Result<Server> {
        let listener = TcpListener::bind(("0.0.0.0", config.port))?;
        listener.set_nonblocking(true)?;
        info!("listening on port {}", config.port);
        Ok(Server {
            listener,
            config,
            pending: Mutex::new(Vec::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(Vec::new()),
        })
    }

    /// A clone of the shutdown flag, suitable for wiring into a signal
    /// handler (`ctrlc::set_handler`) at the binary's `main`.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Runs the accept loop until `shutdown()` is called.
    pub fn run(&self) {
        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    info!("incoming connection from {addr}");
                    self.handle_new_connection(stream);
                    self.probe_pending();
                    self.try_start_match();
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                    self.probe_pending();
                }
                Err(e) => {
                    error!("accept failed: {e}");
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }
    }

    /// Stops accepting, signals in-flight matches to exit at their next
    /// turn boundary, joins them, and closes the listener. Callable from a
    /// `Ctrl-C` handler, a test, or anywhere else - the core never installs
    /// its own signal handling.
    pub fn shutdown(&self) {
        info!("shutting down");
        self.shutdown.store(true, Ordering::SeqCst);
        let mut workers = self.workers.lock().unwrap();
        for worker in workers.drain(..) {
            let _ = worker.join();
        }
    }

    fn handle_new_connection(&self, mut stream: TcpStream) {
        if stream.set_read_timeout(Some(self.config.per_socket_timeout)).is_err() {
            return;
        }

        let request = match read_frame(&mut stream) {
            Ok(Message::ConnectionRequest { name }) if !name.is_empty() => name,
            _ => {
                warn!("rejecting connection: invalid ConnectionRequest");
                let _ = write_frame(
                    &mut stream,
                    &Message::ErrorMessage {
                        error_name: ErrorName::InvalidMsg,
                    },
                );
                return;
            }
        };

        let mut pending = self.pending.lock().unwrap();
        pending.push(PendingClient {
            stream,
            name: request,
        });

        if pending.len() < PAIR_SIZE {
            if let Some(client) = pending.last_mut() {
                let _ = write_frame(&mut client.stream, &Message::WaitingForOpponent { flag: true });
            }
        }
    }

    /// Periodically checks waiting clients for liveness: a nonblocking peek
    /// that returns EOF means the client dropped before a match was found.
    /// The stream is flipped to nonblocking only for the instant of the
    /// peek and restored before the client can be handed to a `Match`,
    /// which relies on the blocking-with-timeout mode set in
    /// `handle_new_connection`.
    fn probe_pending(&self) {
        let mut pending = self.pending.lock().unwrap();
        let mut alive = Vec::with_capacity(pending.len());
        for client in pending.drain(..) {
            if client.stream.set_nonblocking(true).is_err() {
                alive.push(client);
                continue;
            }
            let mut probe = [0u8; 1];
            let result = client.stream.peek(&mut probe);
            let _ = client.stream.set_nonblocking(false);
            match result {
                Ok(0) => {
                    info!("dropping dead waiting client {}", client.name);
                }
                _ => alive.push(client),
            }
        }
        *pending = alive;
    }

    fn try_start_match(&self) {
        let mut pending = self.pending.lock().unwrap();
        if pending.len() < PAIR_SIZE {
            return;
        }

        let paired: Vec<PendingClient> = pending.drain(..PAIR_SIZE).collect();
        drop(pending);

        for client in &paired {
            if let Ok(mut handle) = client.stream.try_clone() {
                let _ = write_frame(&mut handle, &Message::WaitingForOpponent { flag: false });
            }
        }

        let mut iter = paired.into_iter();
        let first = iter.next().expect("PAIR_SIZE clients were just drained");
        let second = iter.next().expect("PAIR_SIZE clients were just drained");

        let light = PlayerLink::new(first.stream, first.name);
        let dark = PlayerLink::new(second.stream, second.name);
        let board_size = self.config.board_size;
        let time_limit = self.config.per_socket_timeout;
        let shutdown = self.shutdown_flag();

        let handle = thread::spawn(move || {
            match Match::new(light, dark, board_size, time_limit, shutdown) {
                Ok(m) => {
                    let winner = m.run();
                    info!("match finished: {winner:?}");
                }
                Err(e) => error!("failed to start match: {e:?}"),
            }
        });
        self.workers.lock().unwrap().push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_size_is_two_players() {
        assert_eq!(PAIR_SIZE, 2);
    }
}
