//! Read-only view of a simulation for renderers

use std::fmt;

use serde::Serialize;

use crate::ai::{AgentId, Cell, Color, Grid};

/// One agent as a renderer sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentView {
    pub id: AgentId,
    pub color: Color,
    pub position: Cell,
    pub goal: Option<Cell>,
    pub remaining_path: Vec<Cell>,
    pub moving: bool,
}

/// Simulation state at the end of a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub width: usize,
    pub height: usize,
    pub obstacles: Vec<Cell>,
    pub agents: Vec<AgentView>,
}

impl Snapshot {
    pub(crate) fn capture(tick: u64, grid: &Grid, agents: Vec<AgentView>) -> Self {
        Self {
            tick,
            width: grid.width(),
            height: grid.height(),
            obstacles: grid.obstacles().collect(),
            agents,
        }
    }

    /// One-line summary, e.g. `E0:(1, 2) (→(4, 2)) E1:(0, 0)`
    #[must_use]
    pub fn status_line(&self) -> String {
        self.agents
            .iter()
            .map(|agent| match agent.goal.filter(|_| agent.moving) {
                Some(goal) => format!("{}:{} (→{goal})", agent.id, agent.position),
                None => format!("{}:{}", agent.id, agent.position),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn glyph(&self, cell: Cell) -> char {
        if let Some(agent) = self.agents.iter().find(|a| a.position == cell) {
            return char::from_digit((agent.id.0 % 10) as u32, 10).unwrap_or('@');
        }
        if self.obstacles.contains(&cell) {
            return '#';
        }
        if self.agents.iter().any(|a| a.goal == Some(cell)) {
            return '*';
        }
        if self.agents.iter().any(|a| a.remaining_path.contains(&cell)) {
            return '.';
        }
        ' '
    }
}

/// ASCII frame: `#` obstacle, digit agent, `*` goal, `.` remaining path
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = "-".repeat(self.width);
        writeln!(f, "+{border}+")?;
        for y in 0..self.height as i32 {
            let row: String = (0..self.width as i32)
                .map(|x| self.glyph(Cell::new(x, y)))
                .collect();
            writeln!(f, "|{row}|")?;
        }
        write!(f, "+{border}+")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{BLUE, RED};

    fn sample() -> Snapshot {
        let mut grid = Grid::new(4, 2);
        grid.add_obstacle(Cell::new(1, 1));
        let agents = vec![
            AgentView {
                id: AgentId(0),
                color: RED,
                position: Cell::new(0, 0),
                goal: Some(Cell::new(3, 0)),
                remaining_path: vec![Cell::new(1, 0), Cell::new(2, 0), Cell::new(3, 0)],
                moving: true,
            },
            AgentView {
                id: AgentId(1),
                color: BLUE,
                position: Cell::new(3, 1),
                goal: None,
                remaining_path: Vec::new(),
                moving: false,
            },
        ];
        Snapshot::capture(5, &grid, agents)
    }

    #[test]
    fn test_status_line() {
        assert_eq!(sample().status_line(), "E0:(0, 0) (→(3, 0)) E1:(3, 1)");
    }

    #[test]
    fn test_ascii_frame() {
        let frame = sample().to_string();
        assert_eq!(frame, "+----+\n|0..*|\n| # 1|\n+----+");
    }

    #[test]
    fn test_json_export() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["tick"], 5);
        assert_eq!(value["agents"][0]["goal"]["x"], 3);
        assert_eq!(value["obstacles"][0]["y"], 1);
    }
}
