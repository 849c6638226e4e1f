use std::io::{self, Write};
use std::time::Duration;

use clap::Parser;
use log::warn;

use checkers_engine::board::{Board, Location, Move, Side};
use checkers_engine::client::{AiMoveSource, Client, ClientState, MoveSource};

/// Checkers client.
///
/// Connects to a matchmaking server and plays a game, either with a local
/// AI or by prompting for moves on the console.
#[derive(Parser, Debug)]
struct Args {
    /// Player name sent in the initial connection request.
    #[arg(short, long)]
    name: String,

    /// Server host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port.
    #[arg(short, long, default_value_t = 2004)]
    port: u16,

    /// Play with the local AI instead of prompting for moves on stdin.
    #[arg(long)]
    ai: bool,
}

/// Reads a move from stdin as `"r,c;r,c;..."`, retrying on a parse
/// failure. Thin adapter over the client state machine, in the style of
/// the original console player: prompt, parse, retry.
struct ConsoleMoveSource;

impl MoveSource for ConsoleMoveSource {
    fn choose_move(&mut self, _board: &Board, _side: Side, _time_limit: Duration) -> Option<Move> {
        loop {
            print!("Enter your move as 'row,col;row,col;...': ");
            let _ = io::stdout().flush();

            let mut input = String::new();
            if io::stdin().read_line(&mut input).is_err() {
                return None;
            }
            let input = input.trim();
            if input.is_empty() {
                return None;
            }

            match parse_move(input) {
                Some(mv) => return Some(mv),
                None => println!("Invalid move, try again."),
            }
        }
    }
}

fn parse_move(input: &str) -> Option<Move> {
    let mut locations = Vec::new();
    for hop in input.split(';') {
        let mut parts = hop.split(',');
        let row: usize = parts.next()?.trim().parse().ok()?;
        let col: usize = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        locations.push(Location::new(row, col));
    }
    if locations.len() < 2 {
        return None;
    }
    Some(Move::new(locations))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    if args.ai {
        run(args, AiMoveSource)
    } else {
        run(args, ConsoleMoveSource)
    }
}

fn run(args: Args, move_source: impl MoveSource) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = Client::connect(&args.host, args.port, args.name, move_source)?;
    client.run();

    match client.winner() {
        Some(winner) => println!("Game over: {winner:?}"),
        None if client.state() == ClientState::GameOver => {
            warn!("match ended without a winner (opponent disconnected)")
        }
        None => warn!("disconnected before the match concluded"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_chain() {
        let mv = parse_move("2,1;3,0").unwrap();
        assert_eq!(mv.locations().len(), 2);
    }

    #[test]
    fn rejects_a_single_location() {
        assert!(parse_move("2,1").is_none());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_move("not,a,move").is_none());
    }
}
