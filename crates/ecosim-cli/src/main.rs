//! Command line driver for the predator/prey simulation.

mod render;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use ecosim_core::{Event, EventLog, EventSink, SimulationConfig, TracingSink};
use ecosim_world::Simulation;
use render::Renderer;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::signal;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// How turns are driven
    #[arg(short, long, value_enum, default_value = "auto")]
    mode: Mode,

    /// TOML config file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many turns
    #[arg(long)]
    max_turns: Option<u64>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Advance on a timer; Ctrl+C pauses
    Auto,
    /// Advance on Enter
    Step,
    /// Run to completion and print the result as JSON
    Headless,
}

/// Buffers events for the next frame and mirrors them to tracing
#[derive(Default)]
struct FrameSink {
    frame: EventLog,
}

impl FrameSink {
    fn take(&mut self) -> Vec<Event> {
        self.frame.drain()
    }
}

impl EventSink for FrameSink {
    fn emit(&mut self, event: Event) {
        TracingSink.emit(event.clone());
        self.frame.emit(event);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Interactive modes redraw the screen; keep log noise off it by default
    let default_filter = match args.mode {
        Mode::Headless => "info,ecosim_world=info",
        Mode::Auto | Mode::Step => "warn",
    };
    telemetry::init_telemetry(default_filter)?;

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.max_turns.is_some() {
        config.max_turns = args.max_turns;
    }

    let mut sim = Simulation::new(config).context("failed to set up simulation")?;
    info!(
        mode = ?args.mode,
        seed = sim.config().seed,
        width = sim.grid().width(),
        height = sim.grid().height(),
        "simulation ready"
    );

    match args.mode {
        Mode::Headless => {
            let max_turns = sim.config().max_turns;
            let result = sim.run(max_turns, &mut TracingSink);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Mode::Auto => {
            let stopped = run_auto(&mut sim).await?;
            finish(&sim, stopped);
        }
        Mode::Step => {
            let stopped = run_step(&mut sim).await?;
            finish(&sim, stopped);
        }
    }

    Ok(())
}

fn renderer_for(sim: &Simulation) -> Renderer {
    let config = sim.config();
    Renderer::new(config.display.clone(), &config.symbols.empty_cell)
}

fn turn_limit_reached(sim: &Simulation) -> bool {
    sim.config()
        .max_turns
        .is_some_and(|max| sim.turn() >= max)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PauseChoice {
    Continue,
    Stop,
}

/// Show the pause menu until a valid choice is read. End of input stops.
async fn pause_menu<R, W>(lines: &mut Lines<R>, out: &mut W) -> Result<PauseChoice>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        out.write_all(b"\nPause:\n1. Continue simulation\n2. Stop simulation\n> ")
            .await?;
        out.flush().await?;

        let Some(line) = lines.next_line().await? else {
            return Ok(PauseChoice::Stop);
        };
        match line.trim() {
            "1" => return Ok(PauseChoice::Continue),
            "2" | "q" => return Ok(PauseChoice::Stop),
            _ => out.write_all(b"Invalid choice. Please try again.\n").await?,
        }
    }
}

/// Returns true when stopped from the pause menu
async fn run_auto(sim: &mut Simulation) -> Result<bool> {
    let renderer = renderer_for(sim);
    let mut sink = FrameSink::default();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    renderer.draw(sim.grid(), 0, &[]);
    println!("Press Ctrl+C to pause.");

    let mut ticker = interval(Duration::from_millis(sim.config().turn_delay_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; let the opening frame stay up
    ticker.tick().await;

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while sim.is_ongoing() && !turn_limit_reached(sim) {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!(turn = sim.turn(), "paused");
                match pause_menu(&mut lines, &mut stdout).await? {
                    PauseChoice::Stop => return Ok(true),
                    PauseChoice::Continue => {
                        info!(turn = sim.turn(), "resumed");
                        ctrl_c.set(signal::ctrl_c());
                        ticker.reset();
                        renderer.draw(sim.grid(), sim.turn(), &[]);
                        println!("Press Ctrl+C to pause.");
                    }
                }
            }
            _ = ticker.tick() => {
                sim.advance_one_turn(&mut sink);
                renderer.draw(sim.grid(), sim.turn(), &sink.take());
                println!("Press Ctrl+C to pause.");
            }
        }
    }

    Ok(false)
}

/// Returns true when the user chose to stop
async fn run_step(sim: &mut Simulation) -> Result<bool> {
    let renderer = renderer_for(sim);
    let mut sink = FrameSink::default();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    renderer.draw(sim.grid(), 0, &[]);

    while sim.is_ongoing() && !turn_limit_reached(sim) {
        stdout
            .write_all(b"1 (or Enter) - next turn, 2 - stop: ")
            .await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            return Ok(true);
        };
        match line.trim() {
            "" | "1" => {
                sim.advance_one_turn(&mut sink);
                renderer.draw(sim.grid(), sim.turn(), &sink.take());
            }
            "2" | "q" => return Ok(true),
            other => println!("Unknown choice {other:?}"),
        }
    }

    Ok(false)
}

fn finish(sim: &Simulation, stopped: bool) {
    if stopped {
        println!("\nSimulation stopped by user.");
    } else {
        println!("\n{}", sim.outcome_message());
    }
}
