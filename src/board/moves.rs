//! Legal-move generation: simple steps and maximal capture chains.

use super::{Board, Cell, Kind, Location, Move, Side};

/// Result of `Board::generate_moves`: whether the returned moves are
/// captures, and the moves themselves.
#[derive(Debug, Clone)]
pub struct GeneratedMoves {
    pub is_capture: bool,
    pub moves: Vec<Move>,
}

impl GeneratedMoves {
    fn captures(moves: Vec<Move>) -> Self {
        GeneratedMoves {
            is_capture: true,
            moves,
        }
    }

    fn steps(moves: Vec<Move>) -> Self {
        GeneratedMoves {
            is_capture: false,
            moves,
        }
    }
}

/// Diagonal step directions available to a piece, ignoring capture/board
/// state. Kings move all four diagonals; pawns only toward their
/// promotion row.
fn directions(side: Side, kind: Kind) -> &'static [(isize, isize)] {
    match (side, kind) {
        (_, Kind::King) => &[(1, 1), (1, -1), (-1, 1), (-1, -1)],
        (Side::Light, Kind::Pawn) => &[(1, -1), (1, 1)],
        (Side::Dark, Kind::Pawn) => &[(-1, -1), (-1, 1)],
    }
}

impl Board {
    /// Legal moves for the piece at `loc`, assuming it is that piece's
    /// side's turn. Does *not* apply the cross-piece mandatory-capture
    /// rule - that's enforced in `execute_move`/callers that look across
    /// all of a side's pieces.
    pub fn generate_moves(&self, loc: Location) -> GeneratedMoves {
        let Cell::Occupied(side, kind) = self.cell(loc) else {
            return GeneratedMoves::steps(Vec::new());
        };

        let chains = self.capture_chains(loc, side, kind, &self.cells);
        if !chains.is_empty() {
            return GeneratedMoves::captures(chains);
        }

        let mut steps = Vec::new();
        for &(dr, dc) in directions(side, kind) {
            let Some(dest) = loc.offset(dr, dc) else {
                continue;
            };
            if self.in_bounds(dest) && self.cell(dest) == Cell::Empty {
                steps.push(Move::new(vec![loc, dest]));
            }
        }
        GeneratedMoves::steps(steps)
    }

    /// Recursively expands maximal capture chains for a piece at `loc` on
    /// a (possibly hypothetical) `grid`. A pawn that would promote mid-chain
    /// keeps moving with pawn directions until the chain terminates -
    /// promotion is applied only once the whole move commits, never
    /// mid-expansion, so `kind` is never upgraded here.
    fn capture_chains(
        &self,
        loc: Location,
        side: Side,
        kind: Kind,
        grid: &[Vec<Cell>],
    ) -> Vec<Move> {
        let mut chains = Vec::new();
        for &(dr, dc) in directions(side, kind) {
            let Some(mid) = loc.offset(dr, dc) else {
                continue;
            };
            let Some(landing) = loc.offset(2 * dr, 2 * dc) else {
                continue;
            };
            if !self.in_bounds(landing) {
                continue;
            }
            if grid[mid.row][mid.col].side() != Some(side.opposite()) {
                continue;
            }
            if grid[landing.row][landing.col] != Cell::Empty {
                continue;
            }

            let mut next_grid = grid.to_vec();
            next_grid[loc.row][loc.col] = Cell::Empty;
            next_grid[mid.row][mid.col] = Cell::Empty;
            next_grid[landing.row][landing.col] = Cell::Occupied(side, kind);

            let continuations = self.capture_chains(landing, side, kind, &next_grid);
            if continuations.is_empty() {
                chains.push(Move::new(vec![loc, landing]));
            } else {
                for continuation in continuations {
                    let mut path = vec![loc];
                    path.extend(continuation.0);
                    chains.push(Move::new(path));
                }
            }
        }
        chains
    }

    /// Whether any piece of `side` currently has a capture available -
    /// the trigger for the mandatory-capture rule.
    pub fn any_capture_available(&self, side: Side) -> bool {
        self.locations_of(side)
            .into_iter()
            .any(|loc| self.generate_moves(loc).is_capture)
    }

    /// All legal moves for every piece of `side`, already filtered by the
    /// mandatory-capture rule: if any piece has a capture, only capture
    /// moves (from any piece) are included.
    pub fn all_legal_moves(&self, side: Side) -> Vec<Move> {
        let per_piece: Vec<GeneratedMoves> = self
            .locations_of(side)
            .into_iter()
            .map(|loc| self.generate_moves(loc))
            .collect();

        let mandatory = per_piece.iter().any(|g| g.is_capture);
        per_piece
            .into_iter()
            .filter(|g| !mandatory || g.is_capture)
            .flat_map(|g| g.moves)
            .collect()
    }
}
