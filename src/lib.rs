pub mod ai;
pub mod board;
pub mod client;
pub mod match_engine;
pub mod protocol;
pub mod server;

pub mod prelude {
    // Usefull struct
    pub use crate::ai::{search_best_move, spawn_search};
    pub use crate::board::{Board, Cell, Kind, Location, Move, Side, Winner};
    pub use crate::client::{AiMoveSource, Client, ClientState, MoveSource};
    pub use crate::match_engine::{Match, PlayerLink};
    pub use crate::protocol::{ErrorName, Message};
    pub use crate::server::{Server, ServerConfig};
}
