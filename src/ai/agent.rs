//! Grid agents and their movement/re-planning state machine
//!
//! An agent walks its planned path one cell per tick. A step rejected by
//! the grid (another agent got there first) discards the whole plan and a
//! fresh random goal is picked immediately. There is no waiting and no
//! alternate route to the old goal.
//!
//! ```text
//! Idle --set_random_goal--> Planning --path--> Moving --last step--> Arrived --tick--> Idle
//!                              |                  |
//!                              +--empty/no path--> Arrived
//!                                                 +--rejected step--> Blocked --> Planning
//! ```

use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::grid::{AgentId, Cell, Grid};
use super::pathfinding::find_path;
use crate::error::SimError;

/// RGB display color
pub type Color = [u8; 3];

pub const RED: Color = [255, 0, 0];
pub const BLUE: Color = [0, 0, 255];
pub const YELLOW: Color = [255, 255, 0];
pub const PURPLE: Color = [128, 0, 128];

/// Colors handed out to agents in spawn order
pub const PALETTE: [Color; 4] = [RED, BLUE, YELLOW, PURPLE];

/// Movement state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// No goal
    Idle,
    /// Goal set, path being computed
    Planning,
    /// Walking a non-empty path
    Moving,
    /// Last step was rejected
    Blocked,
    /// Path exhausted, or no path could be found
    Arrived,
}

impl AgentState {
    /// State name for debugging and logging.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Planning => "Planning",
            Self::Moving => "Moving",
            Self::Blocked => "Blocked",
            Self::Arrived => "Arrived",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happened to an agent during one tick
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Nothing to do
    Idle,
    /// Advanced one cell
    Moved { to: Cell },
    /// Advanced onto the goal
    Arrived { at: Cell },
    /// Step to `at` was rejected; `replan` is the result of the new goal
    Blocked {
        at: Cell,
        replan: Result<usize, SimError>,
    },
}

/// An agent walking the grid
#[derive(Debug, Clone)]
pub struct Agent {
    /// Identity on the grid and index in the driver's list
    id: AgentId,
    /// Display color
    color: Color,
    /// Current cell, mirrored in the grid's occupant map
    position: Cell,
    /// Cell the agent is heading for, kept after a failed plan
    goal: Option<Cell>,
    /// Planned steps, start excluded, goal included
    path: Vec<Cell>,
    /// Index of the next step in `path`
    cursor: usize,
    /// Current movement state
    state: AgentState,
}

impl Agent {
    /// Create an idle agent at `position`.
    ///
    /// The caller is responsible for registering the position on the grid.
    #[must_use]
    pub fn new(id: AgentId, color: Color, position: Cell) -> Self {
        Self {
            id,
            color,
            position,
            goal: None,
            path: Vec::new(),
            cursor: 0,
            state: AgentState::Idle,
        }
    }

    /// Place a new agent on a uniformly random free cell.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NoValidTarget`] if the grid has no free cell
    pub fn spawn<R: Rng + ?Sized>(
        id: AgentId,
        color: Color,
        grid: &mut Grid,
        rng: &mut R,
    ) -> Result<Self, SimError> {
        let candidates = grid.free_cells();
        let &position = candidates
            .choose(rng)
            .ok_or(SimError::NoValidTarget { agent: id })?;

        grid.register_occupant(id, position)?;
        log::debug!("Spawned {id} at {position}");

        Ok(Self::new(id, color, position))
    }

    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    #[must_use]
    pub fn position(&self) -> Cell {
        self.position
    }

    #[must_use]
    pub fn goal(&self) -> Option<Cell> {
        self.goal
    }

    /// Full planned path, including steps already taken
    #[must_use]
    pub fn path(&self) -> &[Cell] {
        &self.path
    }

    /// Steps not yet taken
    #[must_use]
    pub fn remaining_path(&self) -> &[Cell] {
        &self.path[self.cursor..]
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn state(&self) -> AgentState {
        self.state
    }

    /// True while there are steps left to take
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.state == AgentState::Moving && self.cursor < self.path.len()
    }

    /// True when the driver should pick a new goal for this agent
    #[must_use]
    pub fn needs_target(&self) -> bool {
        !self.is_moving()
    }

    fn transition(&mut self, next: AgentState) {
        if self.state != next {
            log::trace!("{}: {} -> {}", self.id, self.state, next);
            self.state = next;
        }
    }

    /// Drop goal and path and go idle
    pub fn clear(&mut self) {
        self.goal = None;
        self.path.clear();
        self.cursor = 0;
        self.transition(AgentState::Idle);
    }

    /// Plan a path to `goal`, replacing any current plan.
    ///
    /// Returns the number of steps planned. An empty plan leaves the agent
    /// `Arrived`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidGoal`] or [`SimError::PathNotFound`] when
    /// no plan exists; the agent is then `Arrived` and not moving
    pub fn set_goal(&mut self, goal: Cell, grid: &Grid) -> Result<usize, SimError> {
        self.transition(AgentState::Planning);
        self.goal = Some(goal);
        self.path.clear();
        self.cursor = 0;

        match find_path(grid, self.position, goal, self.id) {
            Ok(path) if path.is_empty() => {
                self.transition(AgentState::Arrived);
                Ok(0)
            }
            Ok(path) => {
                let steps = path.len();
                self.path = path;
                self.transition(AgentState::Moving);
                log::info!("{} target {goal}, {steps} steps", self.id);
                Ok(steps)
            }
            Err(e) => {
                self.transition(AgentState::Arrived);
                let err = SimError::from_path(self.id, e);
                log::warn!("{err}");
                Err(err)
            }
        }
    }

    /// Pick a uniformly random goal among valid cells other than the
    /// current one and plan a path to it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NoValidTarget`] if there is no candidate cell, in
    /// which case the agent stays idle without a goal. Planning failures are
    /// reported as in [`Agent::set_goal`].
    pub fn set_random_goal<R: Rng + ?Sized>(
        &mut self,
        grid: &Grid,
        rng: &mut R,
    ) -> Result<usize, SimError> {
        self.clear();

        let position = self.position;
        let candidates: Vec<Cell> = grid
            .valid_cells(self.id)
            .into_iter()
            .filter(|&cell| cell != position)
            .collect();

        let Some(&goal) = candidates.choose(rng) else {
            let err = SimError::NoValidTarget { agent: self.id };
            log::warn!("{err}");
            return Err(err);
        };

        self.set_goal(goal, grid)
    }

    /// Advance by at most one cell.
    ///
    /// A rejected step immediately re-plans toward a new random goal.
    pub fn tick<R: Rng + ?Sized>(&mut self, grid: &mut Grid, rng: &mut R) -> StepOutcome {
        match self.state {
            AgentState::Moving => self.step(grid, rng),
            AgentState::Arrived => {
                self.clear();
                StepOutcome::Idle
            }
            AgentState::Idle | AgentState::Planning | AgentState::Blocked => StepOutcome::Idle,
        }
    }

    fn step<R: Rng + ?Sized>(&mut self, grid: &mut Grid, rng: &mut R) -> StepOutcome {
        let Some(&next) = self.path.get(self.cursor) else {
            self.transition(AgentState::Arrived);
            return StepOutcome::Arrived { at: self.position };
        };

        if !grid.move_occupant(self.id, next) {
            self.transition(AgentState::Blocked);
            log::warn!("{} blocked at {next}, replanning", self.id);
            let replan = self.set_random_goal(grid, rng);
            return StepOutcome::Blocked { at: next, replan };
        }

        self.position = next;
        self.cursor += 1;
        log::debug!("{} moved to {next}", self.id);

        if self.cursor == self.path.len() {
            self.transition(AgentState::Arrived);
            log::info!("{} arrived at {next}", self.id);
            StepOutcome::Arrived { at: next }
        } else {
            StepOutcome::Moved { to: next }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn agent_at(grid: &mut Grid, id: usize, cell: Cell) -> Agent {
        grid.register_occupant(AgentId(id), cell).unwrap();
        Agent::new(AgentId(id), PALETTE[id % PALETTE.len()], cell)
    }

    #[test]
    fn test_spawn_uses_free_cell() {
        let mut grid = Grid::new(2, 1);
        grid.add_obstacle(Cell::new(0, 0));
        let mut rng = StdRng::seed_from_u64(1);

        let agent = Agent::spawn(AgentId(0), RED, &mut grid, &mut rng).unwrap();

        assert_eq!(agent.position(), Cell::new(1, 0));
        assert_eq!(grid.occupant_at(Cell::new(1, 0)), Some(AgentId(0)));
        assert_eq!(agent.state(), AgentState::Idle);

        // Grid is now full
        assert_eq!(
            Agent::spawn(AgentId(1), BLUE, &mut grid, &mut rng).unwrap_err(),
            SimError::NoValidTarget { agent: AgentId(1) }
        );
    }

    #[test]
    fn test_walk_to_goal_and_go_idle() {
        let mut grid = Grid::new(4, 4);
        for y in 1..4 {
            grid.add_obstacle(Cell::new(1, y));
        }
        let mut rng = StdRng::seed_from_u64(2);
        let mut agent = agent_at(&mut grid, 0, Cell::new(0, 0));

        assert_eq!(agent.set_goal(Cell::new(3, 0), &grid), Ok(3));
        assert_eq!(agent.state(), AgentState::Moving);
        assert!(agent.is_moving());
        assert_eq!(agent.cursor(), 0);

        assert_eq!(
            agent.tick(&mut grid, &mut rng),
            StepOutcome::Moved { to: Cell::new(1, 0) }
        );
        assert_eq!(agent.remaining_path(), &[Cell::new(2, 0), Cell::new(3, 0)]);
        assert_eq!(grid.position_of(AgentId(0)), Some(Cell::new(1, 0)));

        agent.tick(&mut grid, &mut rng);
        assert_eq!(
            agent.tick(&mut grid, &mut rng),
            StepOutcome::Arrived { at: Cell::new(3, 0) }
        );
        assert_eq!(agent.state(), AgentState::Arrived);
        assert!(!agent.is_moving());
        assert!(agent.remaining_path().is_empty());
        assert_eq!(agent.goal(), Some(Cell::new(3, 0)));

        // Arrived collapses to Idle on the next tick
        assert_eq!(agent.tick(&mut grid, &mut rng), StepOutcome::Idle);
        assert_eq!(agent.state(), AgentState::Idle);
        assert_eq!(agent.goal(), None);
        assert!(agent.path().is_empty());
    }

    #[test]
    fn test_goal_at_own_cell_is_arrived() {
        let mut grid = Grid::new(3, 3);
        let mut agent = agent_at(&mut grid, 0, Cell::new(1, 1));

        assert_eq!(agent.set_goal(Cell::new(1, 1), &grid), Ok(0));
        assert_eq!(agent.state(), AgentState::Arrived);
        assert!(!agent.is_moving());
    }

    #[test]
    fn test_unreachable_goal_reports_and_stops() {
        let mut grid = Grid::new(5, 5);
        for cell in [(3, 2), (3, 4), (2, 3), (4, 3)] {
            grid.add_obstacle(cell.into());
        }
        let mut agent = agent_at(&mut grid, 0, Cell::new(0, 0));

        let err = agent.set_goal(Cell::new(3, 3), &grid).unwrap_err();

        assert_eq!(
            err,
            SimError::PathNotFound {
                agent: AgentId(0),
                goal: Cell::new(3, 3)
            }
        );
        assert!(err.is_no_path());
        assert_eq!(agent.state(), AgentState::Arrived);
        assert!(agent.needs_target());
    }

    #[test]
    fn test_occupied_goal_is_invalid() {
        let mut grid = Grid::new(3, 1);
        let mut agent = agent_at(&mut grid, 0, Cell::new(0, 0));
        let _other = agent_at(&mut grid, 1, Cell::new(2, 0));

        assert_eq!(
            agent.set_goal(Cell::new(2, 0), &grid),
            Err(SimError::InvalidGoal {
                agent: AgentId(0),
                goal: Cell::new(2, 0)
            })
        );
    }

    #[test]
    fn test_random_goal_excludes_current_cell() {
        let mut grid = Grid::new(2, 1);
        let mut agent = agent_at(&mut grid, 0, Cell::new(0, 0));

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(agent.set_random_goal(&grid, &mut rng), Ok(1));
            assert_eq!(agent.goal(), Some(Cell::new(1, 0)));
        }
    }

    #[test]
    fn test_no_valid_target_stays_idle() {
        let mut grid = Grid::new(1, 1);
        let mut agent = agent_at(&mut grid, 0, Cell::new(0, 0));
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(
            agent.set_random_goal(&grid, &mut rng),
            Err(SimError::NoValidTarget { agent: AgentId(0) })
        );
        assert_eq!(agent.state(), AgentState::Idle);
        assert_eq!(agent.goal(), None);
    }

    #[test]
    fn test_retarget_on_open_grid_always_plans() {
        let mut grid = Grid::new(6, 6);
        grid.add_obstacle(Cell::new(2, 2));
        let mut agent = agent_at(&mut grid, 0, Cell::new(0, 0));

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let steps = agent.set_random_goal(&grid, &mut rng).unwrap();
            assert!(steps > 0);
            assert!(agent.is_moving());
        }
    }

    #[test]
    fn test_blocked_step_discards_plan_and_replans() {
        // Single-width corridor, agents walking toward each other
        let mut grid = Grid::new(5, 1);
        let mut a = agent_at(&mut grid, 0, Cell::new(0, 0));
        let mut b = agent_at(&mut grid, 1, Cell::new(4, 0));
        let mut rng = StdRng::seed_from_u64(4);

        a.set_goal(Cell::new(3, 0), &grid).unwrap();
        b.set_goal(Cell::new(2, 0), &grid).unwrap();
        let stale = b.path().to_vec();

        // Tick 1: both advance
        a.tick(&mut grid, &mut rng);
        b.tick(&mut grid, &mut rng);
        assert_eq!(a.position(), Cell::new(1, 0));
        assert_eq!(b.position(), Cell::new(3, 0));

        // Tick 2: A takes (2, 0) first, so B's step is rejected
        a.tick(&mut grid, &mut rng);
        let outcome = b.tick(&mut grid, &mut rng);

        assert!(matches!(outcome, StepOutcome::Blocked { at, .. } if at == Cell::new(2, 0)));
        assert_eq!(b.position(), Cell::new(3, 0));
        assert_eq!(grid.position_of(AgentId(1)), Some(Cell::new(3, 0)));
        assert_ne!(b.goal(), Some(Cell::new(2, 0)));
        assert_ne!(b.path(), stale.as_slice());
        assert_ne!(b.state(), AgentState::Blocked);
    }
}
