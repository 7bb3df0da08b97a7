//! Headless simulation driver
//!
//! Owns the grid, the agents and the random source. Each tick processes
//! agents strictly in list order: agent *i*'s move is committed before
//! agent *i+1* checks its next cell, so list order decides who wins a
//! contested cell.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ai::{Agent, AgentId, Cell, Grid, PALETTE, StepOutcome};
use crate::core::config::SimulationConfig;
use crate::core::events::{EventQueue, SimEvent};
use crate::core::snapshot::{AgentView, Snapshot};
use crate::error::SimError;
use crate::input::SimCommand;

/// Counts of what happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Agents that advanced without reaching their goal
    pub moved: usize,
    /// Agents that reached their goal
    pub arrived: usize,
    /// Agents whose step was rejected
    pub blocked: usize,
    /// Goals picked after stepping (arrivals, failures, idle agents)
    pub retargeted: usize,
    /// Planning attempts that produced no path or no target
    pub failed: usize,
}

/// A running simulation
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    grid: Grid,
    agents: Vec<Agent>,
    rng: StdRng,
    events: EventQueue,
    tick: u64,
    paused: bool,
    should_quit: bool,
}

impl Simulation {
    /// Build a grid, seed obstacles, spawn agents and give each a goal
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or there is no room
    /// to place every agent
    pub fn new(config: SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut grid = Grid::try_new(config.width, config.height)?;
        for &cell in &config.obstacles {
            if !grid.add_obstacle(cell) {
                log::warn!("Ignoring obstacle outside the grid at {cell}");
            }
        }
        for _ in 0..config.random_obstacles {
            let cell = Cell::new(
                rng.gen_range(0..config.width as i32),
                rng.gen_range(0..config.height as i32),
            );
            grid.add_obstacle(cell);
        }

        let mut agents = Vec::with_capacity(config.agent_count);
        for index in 0..config.agent_count {
            let color = PALETTE[index % PALETTE.len()];
            agents.push(Agent::spawn(AgentId(index), color, &mut grid, &mut rng)?);
        }

        log::info!(
            "Simulation ready: {}x{} grid, {} obstacles, {} agents",
            grid.width(),
            grid.height(),
            grid.obstacle_count(),
            agents.len()
        );

        let mut sim = Self {
            config,
            grid,
            agents,
            rng,
            events: EventQueue::new(),
            tick: 0,
            paused: false,
            should_quit: false,
        };
        for index in 0..sim.agents.len() {
            // Failures are recorded as events and retried every tick
            let _ = sim.plan(index);
        }
        Ok(sim)
    }

    /// Assemble a simulation from a prepared grid and agents.
    ///
    /// Agents must already be registered on the grid. They keep whatever
    /// plans they have.
    #[must_use]
    pub fn with_parts(grid: Grid, agents: Vec<Agent>, rng: StdRng) -> Self {
        let config = SimulationConfig {
            width: grid.width(),
            height: grid.height(),
            obstacles: grid.obstacles().collect(),
            random_obstacles: 0,
            agent_count: agents.len(),
            ..SimulationConfig::default()
        };
        Self {
            config,
            grid,
            agents,
            rng,
            events: EventQueue::new(),
            tick: 0,
            paused: false,
            should_quit: false,
        }
    }

    /// Advance every agent by at most one cell.
    ///
    /// Agents step in list order, then every agent left without a plan
    /// picks a new goal, again in list order. Does nothing while paused.
    ///
    /// The event queue is swapped first, so `events()` yields what was
    /// pushed since the previous tick and older events are dropped.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        self.events.swap();
        if self.paused {
            return report;
        }
        self.tick += 1;

        for index in 0..self.agents.len() {
            let agent = &mut self.agents[index];
            let id = agent.id();
            match agent.tick(&mut self.grid, &mut self.rng) {
                StepOutcome::Idle => {}
                StepOutcome::Moved { to } => {
                    report.moved += 1;
                    self.events.push(SimEvent::Moved { agent: id, to });
                }
                StepOutcome::Arrived { at } => {
                    report.arrived += 1;
                    self.events.push(SimEvent::Arrived { agent: id, at });
                }
                StepOutcome::Blocked { at, replan } => {
                    report.blocked += 1;
                    self.events.push(SimEvent::Blocked { agent: id, at });
                    if replan.is_err() {
                        report.failed += 1;
                    }
                    Self::record_plan(&mut self.events, &self.agents[index], &replan);
                }
            }
        }

        for index in 0..self.agents.len() {
            if self.agents[index].needs_target() {
                report.retargeted += 1;
                if self.plan(index).is_err() {
                    report.failed += 1;
                }
            }
        }

        log::trace!("Tick {}: {:?}", self.tick, report);
        report
    }

    /// Force every agent to drop its plan and pick a new goal now.
    ///
    /// Returns the number of agents that got a path.
    pub fn retarget_all(&mut self) -> usize {
        log::info!("Retargeting all agents");
        self.events.push(SimEvent::Retargeted);
        (0..self.agents.len())
            .filter(|&index| self.plan(index).is_ok())
            .count()
    }

    /// Execute a driver command
    pub fn apply(&mut self, command: SimCommand) {
        match command {
            SimCommand::RetargetAll => {
                self.retarget_all();
            }
            SimCommand::Pause => {
                self.paused = !self.paused;
                log::info!("Simulation {}", if self.paused { "paused" } else { "resumed" });
            }
            SimCommand::Quit => self.should_quit = true,
        }
    }

    fn plan(&mut self, index: usize) -> Result<usize, SimError> {
        let agent = &mut self.agents[index];
        let result = agent.set_random_goal(&self.grid, &mut self.rng);
        Self::record_plan(&mut self.events, agent, &result);
        result
    }

    fn record_plan(events: &mut EventQueue, agent: &Agent, result: &Result<usize, SimError>) {
        let id = agent.id();
        match result {
            Ok(steps) => {
                if let Some(goal) = agent.goal() {
                    events.push(SimEvent::GoalSelected { agent: id, goal });
                }
                events.push(SimEvent::PathPlanned {
                    agent: id,
                    steps: *steps,
                });
            }
            Err(SimError::PathNotFound { goal, .. } | SimError::InvalidGoal { goal, .. }) => {
                events.push(SimEvent::GoalSelected { agent: id, goal: *goal });
                events.push(SimEvent::PathNotFound { agent: id, goal: *goal });
            }
            Err(SimError::NoValidTarget { .. }) => {
                events.push(SimEvent::NoValidTarget { agent: id });
            }
            Err(_) => {}
        }
    }

    /// Capture a renderer-facing view of the current state
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let agents = self
            .agents
            .iter()
            .map(|agent| AgentView {
                id: agent.id(),
                color: agent.color(),
                position: agent.position(),
                goal: agent.goal(),
                remaining_path: agent.remaining_path().to_vec(),
                moving: agent.is_moving(),
            })
            .collect();
        Snapshot::capture(self.tick, &self.grid, agents)
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id() == id)
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}
