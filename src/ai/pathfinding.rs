//! A* pathfinding on a 2D grid
//!
//! 4-connected search with unit edge cost and a Manhattan heuristic. Cells
//! held by agents other than the requester count as blocked at the moment
//! the search runs.
//!
//! Among frontier nodes with equal `f`, the one with the lower `h` (closer
//! to the goal) is expanded first, then the one pushed earliest. Neighbours
//! are expanded left, right, up, down. Together these fix which of several
//! equal-length paths is returned.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use super::grid::{AgentId, Cell, Grid};

/// Manhattan distance between two cells
#[must_use]
pub fn manhattan(a: Cell, b: Cell) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

/// A* node for priority queue
#[derive(Debug, Clone)]
struct Node {
    cell: Cell,
    g_cost: u32,
    h_cost: u32,
    seq: u64,
}

impl Node {
    fn f_cost(&self) -> u32 {
        self.g_cost + self.h_cost
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other
            .f_cost()
            .cmp(&self.f_cost())
            .then_with(|| other.h_cost.cmp(&self.h_cost))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the shortest path from `start` to `goal` for `requester`.
///
/// The returned path excludes `start` and ends at `goal`. An empty path
/// means the requester is already there.
///
/// # Errors
///
/// Returns [`PathError::InvalidGoal`] if `goal` is not valid for the
/// requester and [`PathError::NotFound`] if the search exhausts without
/// reaching it.
pub fn find_path(
    grid: &Grid,
    start: Cell,
    goal: Cell,
    requester: AgentId,
) -> Result<Vec<Cell>, PathError> {
    if !grid.is_valid(goal, requester) {
        return Err(PathError::InvalidGoal { goal });
    }
    if start == goal {
        return Ok(Vec::new());
    }

    let mut open_set = BinaryHeap::new();
    let mut closed: FxHashSet<Cell> = FxHashSet::default();
    let mut came_from: FxHashMap<Cell, Cell> = FxHashMap::default();
    let mut g_score: FxHashMap<Cell, u32> = FxHashMap::default();
    let mut seq = 0u64;

    g_score.insert(start, 0);
    open_set.push(Node {
        cell: start,
        g_cost: 0,
        h_cost: manhattan(start, goal),
        seq,
    });

    while let Some(current) = open_set.pop() {
        if current.cell == goal {
            return Ok(reconstruct_path(&came_from, goal));
        }

        // Skip stale entries superseded by a cheaper push
        if !closed.insert(current.cell) {
            continue;
        }

        for next in grid.neighbors(current.cell) {
            if closed.contains(&next) || !grid.is_valid(next, requester) {
                continue;
            }

            let tentative_g = current.g_cost + 1;
            if g_score.get(&next).is_none_or(|&g| tentative_g < g) {
                came_from.insert(next, current.cell);
                g_score.insert(next, tentative_g);

                seq += 1;
                open_set.push(Node {
                    cell: next,
                    g_cost: tentative_g,
                    h_cost: manhattan(next, goal),
                    seq,
                });
            }
        }
    }

    Err(PathError::NotFound { start, goal })
}

fn reconstruct_path(came_from: &FxHashMap<Cell, Cell>, goal: Cell) -> Vec<Cell> {
    let mut path = vec![goal];
    let mut curr = goal;

    while let Some(&prev) = came_from.get(&curr) {
        path.push(prev);
        curr = prev;
    }

    // Drop the start cell
    path.pop();
    path.reverse();
    path
}

/// Reasons a path could not be produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Goal is out of bounds, an obstacle, or held by another agent
    InvalidGoal { goal: Cell },
    /// Open set exhausted before reaching the goal
    NotFound { start: Cell, goal: Cell },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGoal { goal } => write!(f, "Goal {goal} is not reachable"),
            Self::NotFound { start, goal } => write!(f, "No path from {start} to {goal}"),
        }
    }
}

impl std::error::Error for PathError {}
