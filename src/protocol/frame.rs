//! Length-prefixed JSON framing: `<decimal-length>\n<json-bytes>`, no
//! trailing newline after the payload. Mirrors `jsonsocket.py`'s
//! `json_send`/`json_recv` byte-for-byte.

use std::io::{self, Read, Write};

use serde::Serialize;
use serde_json::Value;

use super::message::Message;

#[derive(Debug)]
pub enum FrameError {
    Io(io::Error),
    Eof,
    BadLength,
    BadJson(serde_json::Error),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::Io(e) => write!(f, "io error: {e}"),
            FrameError::Eof => write!(f, "connection closed"),
            FrameError::BadLength => write!(f, "malformed frame length"),
            FrameError::BadJson(e) => write!(f, "malformed json payload: {e}"),
        }
    }
}

impl std::error::Error for FrameError {}

impl From<io::Error> for FrameError {
    fn from(e: io::Error) -> Self {
        FrameError::Io(e)
    }
}

/// Writes `value` as one frame: its decimal length, a newline, then the
/// JSON bytes with no trailing newline.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<(), FrameError> {
    let payload = serde_json::to_vec(value).map_err(FrameError::BadJson)?;
    writer.write_all(format!("{}\n", payload.len()).as_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Reads one frame and decodes it into a tagged `Message`, byte-at-a-time
/// for the length line (frames carry no delimiter after the payload, so
/// there is nothing else to buffer on).
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Message, FrameError> {
    let value = read_frame_value(reader)?;
    Message::from_value(value).map_err(FrameError::BadJson)
}

fn read_frame_value<R: Read>(reader: &mut R) -> Result<Value, FrameError> {
    let mut length_str = String::new();
    let mut byte = [0u8; 1];
    loop {
        let n = reader.read(&mut byte)?;
        if n == 0 {
            return Err(FrameError::Eof);
        }
        if byte[0] == b'\n' {
            break;
        }
        length_str.push(byte[0] as char);
    }
    let length: usize = length_str.parse().map_err(|_| FrameError::BadLength)?;

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload)?;
    serde_json::from_slice(&payload).map_err(FrameError::BadJson)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::Message;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_message() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Message::BeginGame).unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded = read_frame(&mut cursor).unwrap();
        assert_eq!(decoded, Message::BeginGame);
    }

    #[test]
    fn frame_has_no_trailing_newline() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Message::BeginGame).unwrap();
        let newline_at = buf.iter().position(|&b| b == b'\n').unwrap();
        let payload = &buf[newline_at + 1..];
        assert_eq!(payload.last(), Some(&b'}'));
    }

    #[test]
    fn eof_before_any_bytes_is_reported() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        assert!(matches!(read_frame(&mut cursor), Err(FrameError::Eof)));
    }
}
