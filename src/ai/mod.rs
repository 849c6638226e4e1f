//! Time-bounded breadth-first minimax search (§4.2).
//!
//! Grounded on the teacher crate's `tree_search` module: a tree of owned,
//! reference-counted nodes (`Rc<RefCell<Node>>`) built up incrementally and
//! queried for its best line. Unlike the teacher's engine-sharing tree
//! (where every node borrows the same underlying chess `Engine` and mutates
//! it in place while walking the tree), each node here owns an independent
//! `Board` snapshot — the AI must never hold a live reference to the match
//! engine's board, so nodes are deep copies all the way down.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::board::{Board, Kind, Move, Side};

pub type NodeRef = Rc<RefCell<Node>>;

/// A node in the search tree: a board snapshot, the move that produced it,
/// and the side the AI is solving for.
#[derive(Debug)]
pub struct Node {
    board: Board,
    root_side: Side,
    produced_by: Option<Move>,
    children: Vec<NodeRef>,
}

impl Node {
    fn new_ref(board: Board, root_side: Side, produced_by: Option<Move>) -> NodeRef {
        Rc::new(RefCell::new(Node {
            board,
            root_side,
            produced_by,
            children: Vec::new(),
        }))
    }

    /// Builds and stores this node's children: one per legal move of the
    /// board's side to move, already filtered by the mandatory-capture rule
    /// via `Board::all_legal_moves`.
    fn expand(&mut self) -> Vec<NodeRef> {
        let side = self.board.side_to_move();
        let children: Vec<NodeRef> = self
            .board
            .all_legal_moves(side)
            .into_iter()
            .map(|mv| {
                let mut next = self.board.clone();
                next.execute_move(&mv);
                Node::new_ref(next, self.root_side, Some(mv))
            })
            .collect();
        self.children = children.clone();
        children
    }

    /// The utility of this node: the raw piece-count evaluation at a leaf,
    /// or the max/min of children's utility depending on whose turn this
    /// node's board represents.
    fn utility(&self) -> i32 {
        if self.children.is_empty() {
            return leaf_utility(&self.board, self.root_side);
        }
        if self.board.side_to_move() == self.root_side {
            self.children
                .iter()
                .map(|c| c.borrow().utility())
                .max()
                .unwrap_or(0)
        } else {
            self.children
                .iter()
                .map(|c| c.borrow().utility())
                .min()
                .unwrap_or(0)
        }
    }

    /// The move of the child with the highest utility, first generated wins
    /// ties.
    fn best_move(&self) -> Option<Move> {
        let mut best: Option<(i32, usize)> = None;
        for (index, child) in self.children.iter().enumerate() {
            let u = child.borrow().utility();
            if best.map_or(true, |(best_u, _)| u > best_u) {
                best = Some((u, index));
            }
        }
        best.and_then(|(_, index)| self.children[index].borrow().produced_by.clone())
    }
}

fn weight(kind: Kind) -> i32 {
    match kind {
        Kind::Pawn => 1,
        Kind::King => 3,
    }
}

fn leaf_utility(board: &Board, root_side: Side) -> i32 {
    board
        .pieces()
        .into_iter()
        .map(|(side, kind, _)| {
            let sign = if side == root_side { 1 } else { -1 };
            sign * weight(kind)
        })
        .sum()
}

/// Runs the search to completion (blocking) and returns the best move, or
/// `None` if no time was available or the side to move has no legal moves.
pub fn search_best_move(board: &Board, root_side: Side, time_limit: Duration) -> Option<Move> {
    let deadline = Instant::now() + time_limit.mul_f64(0.85);
    let root = Node::new_ref(board.clone(), root_side, None);

    let mut pending: VecDeque<NodeRef> = VecDeque::new();
    pending.push_back(Rc::clone(&root));

    while Instant::now() < deadline {
        let Some(node) = pending.pop_front() else {
            break;
        };
        let children = node.borrow_mut().expand();
        pending.extend(children);
    }

    root.borrow().best_move()
}

/// Runs `search_best_move` on a worker thread, handing the result back over
/// a channel so the caller never shares board state with the search.
pub fn spawn_search(
    board: Board,
    root_side: Side,
    time_limit: Duration,
) -> mpsc::Receiver<Option<Move>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = search_best_move(&board, root_side, time_limit);
        let _ = tx.send(result);
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn returns_a_move_given_any_time_budget() {
        let board = Board::new(8).unwrap();
        let mv = search_best_move(&board, Side::Light, Duration::from_millis(50));
        assert!(mv.is_some());
    }

    #[test]
    fn zero_time_budget_yields_no_move() {
        let board = Board::new(8).unwrap();
        let mv = search_best_move(&board, Side::Light, Duration::from_millis(0));
        assert!(mv.is_none());
    }

    #[test]
    fn spawned_search_delivers_over_a_channel() {
        let board = Board::new(8).unwrap();
        let rx = spawn_search(board, Side::Light, Duration::from_millis(50));
        let result = rx.recv().unwrap();
        assert!(result.is_some());
    }
}
