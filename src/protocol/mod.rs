//! Wire protocol: length-prefixed JSON framing (§6) plus the tagged
//! message schema it carries.

pub mod frame;
pub mod message;

pub use frame::{read_frame, write_frame, FrameError};
pub use message::{ErrorName, Message};
