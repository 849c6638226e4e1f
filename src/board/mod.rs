//! Board representation and the rules engine.
//!
//! Mirrors the teacher crate's split between a plain data representation
//! (`Board`) and the move-generation/validation logic that operates on it,
//! except the representation here is a flat `Cell` grid rather than
//! bitboards: an N×N checkers board has no performance case for bitboards,
//! and a grid keeps `GenerateMoves`'s recursive capture-chain expansion
//! straightforward to read.

mod moves;
mod rules;

pub use moves::GeneratedMoves;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Which player a piece or a board state belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Light,
    Dark,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Light => Side::Dark,
            Side::Dark => Side::Light,
        }
    }

    /// The single-character wire encoding used by the protocol ('w'/'b').
    pub fn wire_char(self) -> char {
        match self {
            Side::Light => 'w',
            Side::Dark => 'b',
        }
    }

    pub fn from_wire_char(c: char) -> Option<Side> {
        match c {
            'w' => Some(Side::Light),
            'b' => Some(Side::Dark),
            _ => None,
        }
    }
}

/// The kind of piece occupying a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Pawn,
    King,
}

/// What a square on the board holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Occupied(Side, Kind),
    Empty,
    NonPlayable,
}

impl Cell {
    pub fn side(&self) -> Option<Side> {
        match self {
            Cell::Occupied(side, _) => Some(*side),
            _ => None,
        }
    }
}

/// A single square, zero-indexed from the corner nearest the light side's
/// home row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub row: usize,
    pub col: usize,
}

impl Location {
    pub fn new(row: usize, col: usize) -> Self {
        Location { row, col }
    }

    fn offset(self, dr: isize, dc: isize) -> Option<Location> {
        let row = self.row as isize + dr;
        let col = self.col as isize + dc;
        if row < 0 || col < 0 {
            None
        } else {
            Some(Location::new(row as usize, col as usize))
        }
    }
}

// Wire format is a 2-element JSON array `[row, col]`, not an object -
// implemented by hand rather than derived since serde's derive would give
// `{"row": .., "col": ..}`.
impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.row, self.col).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (row, col) = <(usize, usize)>::deserialize(deserializer)?;
        Ok(Location { row, col })
    }
}

/// An ordered sequence of at least two locations: a single step, or a
/// capture chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move(pub Vec<Location>);

impl Move {
    pub fn new(locations: Vec<Location>) -> Self {
        Move(locations)
    }

    pub fn start(&self) -> Location {
        self.0[0]
    }

    pub fn end(&self) -> Location {
        *self.0.last().expect("a move always has at least one hop")
    }

    /// A move is a capture iff any hop spans two rows (jumps over a piece).
    pub fn is_capture(&self) -> bool {
        self.0
            .windows(2)
            .any(|pair| row_distance(pair[0], pair[1]) == 2)
    }

    pub fn locations(&self) -> &[Location] {
        &self.0
    }
}

fn row_distance(a: Location, b: Location) -> usize {
    (a.row as isize - b.row as isize).unsigned_abs()
}

/// Outcome of `Board::winner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Light,
    Dark,
    Draw,
    None,
}

impl Winner {
    pub fn wire_char(self) -> Option<char> {
        match self {
            Winner::Light => Some('w'),
            Winner::Dark => Some('b'),
            Winner::Draw => Some('d'),
            Winner::None => None,
        }
    }

    pub fn from_wire_char(c: char) -> Option<Winner> {
        match c {
            'w' => Some(Winner::Light),
            'b' => Some(Winner::Dark),
            'd' => Some(Winner::Draw),
            _ => None,
        }
    }
}

/// Error returned by `Board::new` for an invalid board size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardSizeError {
    Odd,
    TooSmall,
}

/// Number of consecutive quiet (non-capture, non-promotion) plies after
/// which the match is decided by piece count (or drawn).
pub const DRAW_THRESHOLD: u32 = 40;

/// The playing surface: an N×N grid of cells, whose turn it is, and the
/// quiet-ply counter used to detect draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Vec<Cell>>,
    side_to_move: Side,
    quiet_plies: u32,
}

impl Board {
    /// Builds the standard initial position on an `size` x `size` board.
    ///
    /// `size` must be even and at least 4.
    pub fn new(size: usize) -> Result<Board, BoardSizeError> {
        if size % 2 != 0 {
            return Err(BoardSizeError::Odd);
        }
        if size < 4 {
            return Err(BoardSizeError::TooSmall);
        }

        let player_rows = size / 2 - 1;
        let mut cells = vec![vec![Cell::NonPlayable; size]; size];
        for row in 0..size {
            for col in 0..size {
                if !playable(row, col) {
                    continue;
                }
                cells[row][col] = if row < player_rows {
                    Cell::Occupied(Side::Light, Kind::Pawn)
                } else if row >= size - player_rows {
                    Cell::Occupied(Side::Dark, Kind::Pawn)
                } else {
                    Cell::Empty
                };
            }
        }

        Ok(Board {
            size,
            cells,
            side_to_move: Side::Light,
            quiet_plies: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    pub fn quiet_plies(&self) -> u32 {
        self.quiet_plies
    }

    pub fn cell(&self, loc: Location) -> Cell {
        self.cells[loc.row][loc.col]
    }

    fn in_bounds(&self, loc: Location) -> bool {
        loc.row < self.size && loc.col < self.size
    }

    /// All occupied squares as `(side, kind, location)` triples.
    pub fn pieces(&self) -> Vec<(Side, Kind, Location)> {
        let mut out = Vec::new();
        for row in 0..self.size {
            for col in 0..self.size {
                if let Cell::Occupied(side, kind) = self.cells[row][col] {
                    out.push((side, kind, Location::new(row, col)));
                }
            }
        }
        out
    }

    /// All locations occupied by a piece of the given side.
    pub fn locations_of(&self, side: Side) -> Vec<Location> {
        self.pieces()
            .into_iter()
            .filter(|(s, _, _)| *s == side)
            .map(|(_, _, loc)| loc)
            .collect()
    }

    fn piece_count(&self, side: Side) -> usize {
        self.locations_of(side).len()
    }
}

/// Cell (r, c) is playable iff r + c is odd - the standard checkerboard
/// parity, preserved by every diagonal step (dr, dc each ±1 changes r + c
/// by 0 or ±2). This is the parity rule `spec.md` states in a form
/// (`(r + (r mod 2) + c) mod 2 == 0`) that algebraically collapses to a
/// function of `c` alone, since `r + (r mod 2)` is always even -
/// self-contradictory for a board where diagonal moves must land on
/// playable squares. Implemented here as the working rule that formula
/// was evidently meant to express; see DESIGN.md.
fn playable(row: usize, col: usize) -> bool {
    (row + col) % 2 == 1
}
