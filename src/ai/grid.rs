//! Grid occupancy model
//!
//! Tracks static obstacles and the cells currently held by agents. Every
//! validity query goes through here so that the pathfinder and the agents
//! agree on what "blocked" means.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A discrete grid position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Identity of an agent registered on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub usize);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A 2D occupancy grid
#[derive(Debug, Clone)]
pub struct Grid {
    /// Width in cells
    width: i32,
    /// Height in cells
    height: i32,
    /// Obstacle cells, row-major (true = blocked)
    obstacles: Vec<bool>,
    /// Agent to cell
    positions: FxHashMap<AgentId, Cell>,
    /// Cell to agent
    occupants: FxHashMap<Cell, AgentId>,
}

impl Grid {
    /// Create a new grid with no obstacles and no occupants
    ///
    /// # Panics
    ///
    /// Panics if the cell count does not fit in an `i32`; use
    /// [`Grid::try_new`] for dimensions that come from outside.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        match Self::try_new(width, height) {
            Ok(grid) => grid,
            Err(e) => panic!("{e}"),
        }
    }

    /// Create a new grid, rejecting dimensions whose cell indices overflow
    ///
    /// # Errors
    ///
    /// Returns [`GridError::TooLarge`] if `width * height` exceeds `i32::MAX`
    pub fn try_new(width: usize, height: usize) -> Result<Self, GridError> {
        let too_large = GridError::TooLarge { width, height };
        let area = width.checked_mul(height).ok_or(too_large.clone())?;
        i32::try_from(area).map_err(|_| too_large.clone())?;
        let (Ok(w), Ok(h)) = (i32::try_from(width), i32::try_from(height)) else {
            return Err(too_large);
        };
        Ok(Self {
            width: w,
            height: h,
            obstacles: vec![false; area],
            positions: FxHashMap::default(),
            occupants: FxHashMap::default(),
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width as usize
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height as usize
    }

    /// Check whether a cell lies inside the grid
    #[must_use]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    fn index(&self, cell: Cell) -> usize {
        (cell.y * self.width + cell.x) as usize
    }

    /// Mark a cell as blocked.
    ///
    /// Out-of-bounds cells are ignored. A cell currently held by an agent is
    /// left untouched. Returns whether the cell is an obstacle afterwards.
    pub fn add_obstacle(&mut self, cell: Cell) -> bool {
        if !self.in_bounds(cell) {
            return false;
        }
        if let Some(id) = self.occupants.get(&cell) {
            log::warn!("Refusing obstacle at {cell}: occupied by {id}");
            return false;
        }
        let index = self.index(cell);
        self.obstacles[index] = true;
        true
    }

    /// Check if a cell is a static obstacle
    #[must_use]
    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && self.obstacles[self.index(cell)]
    }

    /// Number of obstacle cells
    #[must_use]
    pub fn obstacle_count(&self) -> usize {
        self.obstacles.iter().filter(|&&blocked| blocked).count()
    }

    /// Iterate over obstacle cells in row-major order
    pub fn obstacles(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells().filter(|&cell| self.obstacles[self.index(cell)])
    }

    /// Iterate over every cell in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Cell::new(x, y)))
    }

    /// Check whether `requester` may stand on `cell`.
    ///
    /// True iff the cell is in bounds, not an obstacle, and not held by an
    /// agent other than `requester`.
    #[must_use]
    pub fn is_valid(&self, cell: Cell, requester: AgentId) -> bool {
        self.is_passable(cell)
            && self
                .occupants
                .get(&cell)
                .is_none_or(|&occupant| occupant == requester)
    }

    /// Check whether a cell is in bounds, not an obstacle and unoccupied
    #[must_use]
    pub fn is_free(&self, cell: Cell) -> bool {
        self.is_passable(cell) && !self.occupants.contains_key(&cell)
    }

    fn is_passable(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && !self.obstacles[self.index(cell)]
    }

    /// Register an agent at its starting cell
    ///
    /// # Errors
    ///
    /// Returns an error if the cell is out of bounds or blocked, or if the
    /// agent is already on the grid
    pub fn register_occupant(&mut self, id: AgentId, cell: Cell) -> Result<(), GridError> {
        if !self.in_bounds(cell) {
            return Err(GridError::OutOfBounds(cell));
        }
        if self.positions.contains_key(&id) {
            return Err(GridError::AlreadyRegistered(id));
        }
        if !self.is_free(cell) {
            return Err(GridError::Blocked(cell));
        }
        self.positions.insert(id, cell);
        self.occupants.insert(cell, id);
        Ok(())
    }

    /// Move a registered agent to `to`.
    ///
    /// The move is committed immediately if `to` is valid for `id`.
    /// Returns `false` if the move was rejected.
    pub fn move_occupant(&mut self, id: AgentId, to: Cell) -> bool {
        let Some(&from) = self.positions.get(&id) else {
            return false;
        };
        if !self.is_valid(to, id) {
            return false;
        }
        self.occupants.remove(&from);
        self.occupants.insert(to, id);
        self.positions.insert(id, to);
        true
    }

    /// Agent currently holding `cell`, if any
    #[must_use]
    pub fn occupant_at(&self, cell: Cell) -> Option<AgentId> {
        self.occupants.get(&cell).copied()
    }

    /// Current cell of a registered agent
    #[must_use]
    pub fn position_of(&self, id: AgentId) -> Option<Cell> {
        self.positions.get(&id).copied()
    }

    #[must_use]
    pub fn occupant_count(&self) -> usize {
        self.positions.len()
    }

    /// In-bounds 4-directional neighbours (left, right, up, down)
    #[must_use]
    pub fn neighbors(&self, cell: Cell) -> SmallVec<[Cell; 4]> {
        [(-1, 0), (1, 0), (0, -1), (0, 1)]
            .into_iter()
            .map(|(dx, dy)| Cell::new(cell.x + dx, cell.y + dy))
            .filter(|&n| self.in_bounds(n))
            .collect()
    }

    /// Cells valid for `requester`, row-major
    #[must_use]
    pub fn valid_cells(&self, requester: AgentId) -> Vec<Cell> {
        self.cells()
            .filter(|&cell| self.is_valid(cell, requester))
            .collect()
    }

    /// Unoccupied, unobstructed cells, row-major
    #[must_use]
    pub fn free_cells(&self) -> Vec<Cell> {
        self.cells().filter(|&cell| self.is_free(cell)).collect()
    }
}

/// Errors that can occur when registering occupants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Cell lies outside the grid
    OutOfBounds(Cell),
    /// Cell is an obstacle or held by another agent
    Blocked(Cell),
    /// Agent is already on the grid
    AlreadyRegistered(AgentId),
    /// Cell count does not fit the grid's signed coordinates
    TooLarge { width: usize, height: usize },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds(cell) => write!(f, "Cell {cell} is out of bounds"),
            Self::Blocked(cell) => write!(f, "Cell {cell} is blocked"),
            Self::AlreadyRegistered(id) => write!(f, "Agent {id} is already registered"),
            Self::TooLarge { width, height } => {
                write!(f, "Grid {width}x{height} has too many cells")
            }
        }
    }
}

impl std::error::Error for GridError {}
