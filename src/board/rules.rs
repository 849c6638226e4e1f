//! Move commitment and terminal-state detection.

use super::{row_distance, Board, Cell, Kind, Location, Move, Side, Winner, DRAW_THRESHOLD};

impl Board {
    /// Validates and commits `mv`. Returns `true` and mutates the board on
    /// success; returns `false` and leaves the board untouched on
    /// rejection.
    pub fn execute_move(&mut self, mv: &Move) -> bool {
        if mv.locations().iter().any(|&loc| !self.in_bounds(loc)) {
            return false;
        }

        let start = mv.start();
        let Cell::Occupied(side, kind) = self.cell(start) else {
            return false;
        };
        if side != self.side_to_move {
            return false;
        }

        let generated = self.generate_moves(start);
        if !generated.moves.contains(mv) {
            return false;
        }

        // Mandatory capture: a non-capturing move is illegal while *any*
        // piece of the side to move has a capture available.
        if !mv.is_capture() && self.any_capture_available(side) {
            return false;
        }

        self.commit(mv, side, kind);
        true
    }

    /// Applies an already-validated move: relocates the piece, clears any
    /// jumped squares, promotes on arrival if applicable, and advances
    /// turn/quiet-ply bookkeeping.
    fn commit(&mut self, mv: &Move, side: Side, kind: Kind) {
        let mut captured = false;
        for pair in mv.locations().windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if row_distance(from, to) == 2 {
                let mid = Location::new((from.row + to.row) / 2, (from.col + to.col) / 2);
                self.cells[mid.row][mid.col] = Cell::Empty;
                captured = true;
            }
        }

        let start = mv.start();
        let end = mv.end();
        self.cells[start.row][start.col] = Cell::Empty;

        let promoted = kind == Kind::Pawn && is_promotion_row(self.size, side, end.row);
        let final_kind = if promoted { Kind::King } else { kind };
        self.cells[end.row][end.col] = Cell::Occupied(side, final_kind);

        self.side_to_move = side.opposite();
        if captured || promoted {
            self.quiet_plies = 0;
        } else {
            self.quiet_plies = (self.quiet_plies + 1).min(DRAW_THRESHOLD);
        }
    }

    /// Determines the outcome for the side currently to move.
    pub fn winner(&self) -> Winner {
        let to_move = self.side_to_move;
        if !self.has_any_legal_move(to_move) {
            return match to_move {
                Side::Light => Winner::Dark,
                Side::Dark => Winner::Light,
            };
        }

        if self.quiet_plies >= DRAW_THRESHOLD {
            let light = self.piece_count(Side::Light);
            let dark = self.piece_count(Side::Dark);
            return match light.cmp(&dark) {
                std::cmp::Ordering::Greater => Winner::Light,
                std::cmp::Ordering::Less => Winner::Dark,
                std::cmp::Ordering::Equal => Winner::Draw,
            };
        }

        Winner::None
    }

    fn has_any_legal_move(&self, side: Side) -> bool {
        self.locations_of(side)
            .into_iter()
            .any(|loc| !self.generate_moves(loc).moves.is_empty())
    }
}

fn is_promotion_row(size: usize, side: Side, row: usize) -> bool {
    match side {
        Side::Light => row == size - 1,
        Side::Dark => row == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// An 8x8 board with every occupied square cleared, ready for a test to
    /// place its own pieces on the playable squares.
    fn empty_board() -> Board {
        let mut board = Board::new(8).unwrap();
        for row in 0..8 {
            for col in 0..8 {
                if matches!(board.cells[row][col], Cell::Occupied(_, _)) {
                    board.cells[row][col] = Cell::Empty;
                }
            }
        }
        board
    }

    fn put(board: &mut Board, row: usize, col: usize, side: Side, kind: Kind) {
        board.cells[row][col] = Cell::Occupied(side, kind);
    }

    fn mv(locations: &[(usize, usize)]) -> Move {
        Move::new(locations.iter().map(|&(r, c)| Location::new(r, c)).collect())
    }

    #[test]
    fn forced_capture_rejects_a_quiet_move_when_a_capture_is_available() {
        let mut board = empty_board();
        // Light at (2,1) can jump the Dark piece at (3,2) and land on (4,3).
        put(&mut board, 2, 1, Side::Light, Kind::Pawn);
        put(&mut board, 3, 2, Side::Dark, Kind::Pawn);
        // A second, uninvolved Light piece with an ordinary step available.
        put(&mut board, 2, 5, Side::Light, Kind::Pawn);

        let quiet = mv(&[(2, 5), (3, 4)]);
        assert!(!board.execute_move(&quiet), "quiet move must be rejected while a capture exists");

        let before = board.clone();
        let capture = mv(&[(2, 1), (4, 3)]);
        assert!(board.execute_move(&capture));
        assert_eq!(board.cell(Location::new(3, 2)), Cell::Empty, "jumped piece is removed");
        assert_eq!(board.piece_count(Side::Dark), before.piece_count(Side::Dark) - 1);
        assert_eq!(board.cell(Location::new(4, 3)), Cell::Occupied(Side::Light, Kind::Pawn));
        assert_eq!(board.quiet_plies(), 0);
    }

    #[test]
    fn mandatory_capture_excludes_every_non_capturing_move() {
        let mut board = empty_board();
        put(&mut board, 2, 1, Side::Light, Kind::Pawn);
        put(&mut board, 3, 2, Side::Dark, Kind::Pawn);
        put(&mut board, 2, 5, Side::Light, Kind::Pawn);

        let legal = board.all_legal_moves(Side::Light);
        assert!(!legal.is_empty());
        assert!(legal.iter().all(|m| m.is_capture()), "only capture moves may appear once one is available");
    }

    #[test]
    fn multi_jump_chain_removes_every_captured_piece_and_lands_once() {
        let mut board = empty_board();
        put(&mut board, 2, 3, Side::Light, Kind::Pawn);
        put(&mut board, 3, 4, Side::Dark, Kind::Pawn);
        put(&mut board, 5, 4, Side::Dark, Kind::Pawn);

        let generated = board.generate_moves(Location::new(2, 3));
        assert!(generated.is_capture);
        assert!(generated
            .moves
            .iter()
            .any(|m| m.locations() == mv(&[(2, 3), (4, 5), (6, 3)]).locations()));

        let before_dark = board.piece_count(Side::Dark);
        let chain = mv(&[(2, 3), (4, 5), (6, 3)]);
        assert!(board.execute_move(&chain));
        assert_eq!(board.cell(Location::new(3, 4)), Cell::Empty);
        assert_eq!(board.cell(Location::new(5, 4)), Cell::Empty);
        assert_eq!(board.cell(Location::new(6, 3)), Cell::Occupied(Side::Light, Kind::Pawn));
        assert_eq!(board.piece_count(Side::Dark), before_dark - 2);
    }

    #[test]
    fn promotion_applies_only_once_the_capture_chain_terminates() {
        let mut board = empty_board();
        // Landing on the last row (7) ends the chain: a pawn's capture
        // directions never point back off that row, so no continuation is
        // possible regardless of what sits beyond it.
        put(&mut board, 5, 2, Side::Light, Kind::Pawn);
        put(&mut board, 6, 3, Side::Dark, Kind::Pawn);

        let chain = mv(&[(5, 2), (7, 4)]);
        assert!(board.execute_move(&chain));
        assert_eq!(board.cell(Location::new(7, 4)), Cell::Occupied(Side::Light, Kind::King));
        assert_eq!(board.quiet_plies(), 0);
    }

    #[test]
    fn quiet_ply_draw_favors_the_side_with_more_pieces() {
        let mut board = empty_board();
        put(&mut board, 2, 1, Side::Light, Kind::Pawn);
        put(&mut board, 2, 5, Side::Light, Kind::Pawn);
        put(&mut board, 5, 4, Side::Dark, Kind::Pawn);
        board.side_to_move = Side::Light;
        board.quiet_plies = DRAW_THRESHOLD;

        assert_eq!(board.winner(), Winner::Light);
    }

    #[test]
    fn quiet_ply_draw_is_a_tie_with_equal_piece_counts() {
        let mut board = empty_board();
        put(&mut board, 2, 1, Side::Light, Kind::Pawn);
        put(&mut board, 5, 4, Side::Dark, Kind::Pawn);
        board.side_to_move = Side::Light;
        board.quiet_plies = DRAW_THRESHOLD;

        assert_eq!(board.winner(), Winner::Draw);
    }

    #[test]
    fn rejected_move_leaves_the_board_bitwise_identical() {
        let mut board = empty_board();
        put(&mut board, 2, 1, Side::Light, Kind::Pawn);
        put(&mut board, 2, 2, Side::Dark, Kind::Pawn);
        let before = board.clone();

        // Occupied destination: illegal, not a capture (adjacent step onto
        // a piece rather than a jump over one).
        assert!(!board.execute_move(&mv(&[(2, 1), (2, 2)])));
        assert_eq!(board, before);

        // Out-of-range coordinates must be rejected rather than panicking.
        assert!(!board.execute_move(&mv(&[(999, 0), (998, 1)])));
        assert_eq!(board, before);
    }
}
