//! Terminal driver: ticks the simulation and prints ASCII frames
//!
//! Usage: `gridwalk [config.ron|config.json]`. Type a key and Enter to
//! send a command (Enter alone or `r` retargets, `p` pauses, `q` quits).

use std::io::BufRead;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use gridwalk::prelude::*;

/// Loop cadence of the driver, independent of the tick interval
const FRAME_TIME: Duration = Duration::from_millis(1000 / 60);

fn spawn_input_reader(mapper: InputMapper) -> mpsc::Receiver<SimCommand> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match mapper.parse_line(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None => log::warn!("Unbound input: {line:?}"),
            }
        }
    });
    rx
}

fn limit_reached(sim: &Simulation, max_ticks: Option<u64>) -> bool {
    max_ticks.is_some_and(|max| sim.tick_count() >= max)
}

/// Run up to `due` ticks, stopping early when paused or at the tick limit
fn run_due_ticks(sim: &mut Simulation, due: u32, max_ticks: Option<u64>) {
    for _ in 0..due {
        if sim.is_paused() || limit_reached(sim, max_ticks) {
            break;
        }
        let report = sim.tick();
        for event in sim.events().iter() {
            log::debug!("{event:?}");
        }

        let snapshot = sim.snapshot();
        println!("{snapshot}\n{}", snapshot.status_line());
        log::debug!("Tick {}: {report:?}", snapshot.tick);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::load(&path)?,
        None => SimulationConfig::default(),
    };
    log::info!("Starting with {config:?}");

    let mut timer = TickTimer::new(config.tick_interval());
    let max_ticks = config.max_ticks;
    let mut sim = Simulation::new(config)?;
    let commands = spawn_input_reader(InputMapper::with_defaults());

    println!("{}\n{}", sim.snapshot(), sim.snapshot().status_line());

    while !sim.should_quit() {
        while let Ok(command) = commands.try_recv() {
            sim.apply(command);
        }

        run_due_ticks(&mut sim, timer.update(), max_ticks);
        if limit_reached(&sim, max_ticks) {
            break;
        }
        thread::sleep(FRAME_TIME);
    }

    log::info!("Stopped after {} ticks", sim.tick_count());
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("gridwalk error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_sim() -> Simulation {
        let config = SimulationConfig::default()
            .with_size(4, 4)
            .with_random_obstacles(0)
            .with_agents(2)
            .with_seed(4);
        Simulation::new(config).unwrap()
    }

    #[test]
    fn test_catch_up_ticks_stop_at_limit() {
        let mut sim = small_sim();

        run_due_ticks(&mut sim, 5, Some(3));
        assert_eq!(sim.tick_count(), 3);

        run_due_ticks(&mut sim, 5, Some(3));
        assert_eq!(sim.tick_count(), 3);

        run_due_ticks(&mut sim, 2, None);
        assert_eq!(sim.tick_count(), 5);
    }

    #[test]
    fn test_paused_sim_skips_due_ticks() {
        let mut sim = small_sim();
        sim.apply(SimCommand::Pause);

        run_due_ticks(&mut sim, 4, None);
        assert_eq!(sim.tick_count(), 0);
    }
}
