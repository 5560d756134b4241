//! # Moon Phase Application Entry Point
//!
//! This binary is the terminal host for the phase core: it picks dates, forwards
//! playback commands typed on stdin to the animation controller, and prints the
//! frames the controller emits. Timers are driven from a single-threaded tokio
//! runtime.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use moon_phase_lib::{
    config::Config,
    renderer::{JsonSink, TerminalSink},
    show_date, AnimationController, LunarCycle, MoonPhase, PhaseSink, PlaybackState, TimerQueue,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::{sleep_until, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "moon-phase", version, about = "Moon phase silhouettes in the terminal")]
struct Cli {
    /// Path to a TOML config file (defaults to ./moon-config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Draw the moon for one date
    Show { date: String },
    /// Print the phase summary for one or more dates
    Phase {
        #[arg(required = true)]
        dates: Vec<String>,
    },
    /// List the eight phase buckets
    Legend,
    /// Animate a full cycle starting at DATE; reads commands from stdin
    Animate {
        date: String,
        /// Milliseconds between frames
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Exit after this many frames
        #[arg(long)]
        frames: Option<u64>,
        /// Emit JSON lines instead of ASCII art
        #[arg(long)]
        json: bool,
    },
}

/// A playback command typed by the user while animating.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PlaybackCommand {
    Start(String),
    Pause,
    Resume,
    Stop,
    Forward(Option<f64>),
    Backward(Option<f64>),
    Speed(u64),
    Show(String),
    Quit,
}

pub(crate) fn parse_command(line: &str) -> Result<PlaybackCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".to_string());
    };
    let arg = words.next();

    let days = |arg: Option<&str>| -> Result<Option<f64>, String> {
        arg.map(|a| {
            a.parse::<f64>()
                .ok()
                .filter(|d| d.is_finite())
                .ok_or_else(|| format!("not a day count: {a}"))
        })
        .transpose()
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "start" | "play" => PlaybackCommand::Start(
            arg.ok_or_else(|| "start needs a date".to_string())?
                .to_string(),
        ),
        "pause" | "p" => PlaybackCommand::Pause,
        "resume" | "r" => PlaybackCommand::Resume,
        "stop" | "s" => PlaybackCommand::Stop,
        "fwd" | "forward" | "f" => PlaybackCommand::Forward(days(arg)?),
        "back" | "backward" | "b" => PlaybackCommand::Backward(days(arg)?),
        "speed" => {
            let ms = arg.ok_or_else(|| "speed needs milliseconds".to_string())?;
            PlaybackCommand::Speed(ms.parse().map_err(|_| format!("not milliseconds: {ms}"))?)
        }
        "show" => PlaybackCommand::Show(
            arg.ok_or_else(|| "show needs a date".to_string())?
                .to_string(),
        ),
        "quit" | "q" | "exit" => PlaybackCommand::Quit,
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(command)
}

/// Apply one command. Returns false when the user asked to quit.
///
/// `selected` is the date the user picked on the command line; it is what a
/// stop falls back to showing.
pub(crate) fn apply_command<K: PhaseSink>(
    ctrl: &mut AnimationController<TimerQueue, K>,
    command: PlaybackCommand,
    selected: &mut String,
    skip_days: f64,
) -> anyhow::Result<bool> {
    match command {
        PlaybackCommand::Start(date) => {
            ctrl.start(&date)?;
            *selected = date;
        }
        PlaybackCommand::Pause => ctrl.pause(),
        PlaybackCommand::Resume => ctrl.resume(),
        PlaybackCommand::Stop => {
            ctrl.stop();
            ctrl.show_date(selected)?;
        }
        PlaybackCommand::Forward(days) => ctrl.skip_forward(days.unwrap_or(skip_days))?,
        PlaybackCommand::Backward(days) => ctrl.skip_backward(days.unwrap_or(skip_days))?,
        PlaybackCommand::Speed(ms) => {
            let applied = ctrl.set_speed(ms);
            tracing::info!("frame interval set to {:?}", applied);
        }
        PlaybackCommand::Show(date) => {
            ctrl.stop();
            ctrl.show_date(&date)?;
            *selected = date;
        }
        PlaybackCommand::Quit => return Ok(false),
    }
    Ok(true)
}

async fn next_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Forward stdin lines to the runtime from a plain thread.
///
/// A blocking read must not live on the runtime: the reader stays parked until
/// the next newline, and the process exits without joining it.
fn spawn_stdin_reader() -> UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("reading commands from stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Drive the controller until quit, end of input with nothing left to play,
/// or the frame limit.
pub(crate) async fn run_animation<K: PhaseSink>(
    ctrl: &mut AnimationController<TimerQueue, K>,
    commands: &mut UnboundedReceiver<String>,
    mut selected: String,
    frame_limit: Option<u64>,
    skip_days: f64,
) -> anyhow::Result<()> {
    let mut input_open = true;
    let mut frames = 0u64;

    loop {
        let deadline = ctrl.scheduler().next_deadline().map(|(_, at)| at);

        tokio::select! {
            _ = next_deadline(deadline) => {
                let now = Instant::now();
                while let Some(id) = ctrl.scheduler_mut().pop_due(now) {
                    let was_playing = ctrl.is_playing();
                    if let Err(e) = ctrl.on_timer(id) {
                        tracing::warn!("frame skipped: {}", e);
                    }
                    if was_playing {
                        frames += 1;
                    }
                }
            }
            line = commands.recv(), if input_open => {
                match line {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match parse_command(&line) {
                        Ok(command) => {
                            match apply_command(ctrl, command, &mut selected, skip_days) {
                                Ok(true) => {}
                                Ok(false) => break,
                                Err(e) => tracing::warn!("{:#}", e),
                            }
                        }
                        Err(e) => tracing::warn!("{}", e),
                    },
                    None => input_open = false,
                }
            }
        }

        if frame_limit.is_some_and(|limit| frames >= limit) {
            break;
        }
        if !input_open && ctrl.state() != PlaybackState::Playing {
            break;
        }
    }

    ctrl.stop();
    Ok(())
}

fn print_legend(cycle: &LunarCycle) {
    println!("Lunar cycle: {} days, new moon on {}", cycle.period_days(), cycle.epoch());
    for phase in MoonPhase::ALL {
        let (start, end) = phase.day_range();
        println!("{}  days {:>2}-{:<2}", phase, start, end);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("moon_phase=info,moon_phase_lib=info")),
        )
        .with_writer(io::stderr)
        .init();
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::try_load_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::load(),
    };
    let cycle = config.cycle()?;
    let viewport = config.viewport();

    match cli.command {
        CliCommand::Show { date } => {
            let summary = cycle.summarize(&date)?;
            let stdout = io::stdout();
            let mut sink = TerminalSink::new(stdout.lock(), config.display.width, config.display.height);
            show_date(&cycle, viewport, &mut sink, &date)?;
            let mut out = sink.into_inner();
            writeln!(out, "{summary}")?;
        }
        CliCommand::Phase { dates } => {
            for date in &dates {
                let summary = cycle
                    .summarize(date)
                    .with_context(|| format!("summarizing {date}"))?;
                println!("{summary}");
            }
        }
        CliCommand::Legend => print_legend(&cycle),
        CliCommand::Animate {
            date,
            interval_ms,
            frames,
            json,
        } => {
            if frames == Some(0) {
                bail!("--frames must be at least 1");
            }
            let sink: Box<dyn PhaseSink> = if json {
                Box::new(JsonSink::new(io::stdout()))
            } else {
                Box::new(
                    TerminalSink::new(io::stdout(), config.display.width, config.display.height)
                        .clearing(true),
                )
            };

            let mut ctrl = AnimationController::new(cycle, viewport, TimerQueue::new(), sink)
                .with_options(config.playback());
            if let Some(ms) = interval_ms {
                ctrl.set_speed(ms);
            }
            ctrl.start(&date)?;

            let mut commands = spawn_stdin_reader();
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            rt.block_on(run_animation(
                &mut ctrl,
                &mut commands,
                date,
                frames,
                config.animation.skip_days,
            ))?;
        }
    }

    Ok(())
}
