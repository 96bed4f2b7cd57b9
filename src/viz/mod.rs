//! Terminal renderer for training runs
//!
//! The UI runs on its own thread and only ever sees copies of the board, so it cannot
//! influence a run except by asking it to stop.

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::warn;

use crate::{
    gym::grid_world::Grid,
    runner::{EpisodeSummary, Frame, Observer, Phase, Signal},
};

use app::App;
use tui::Tui;

mod app;
mod components;
mod tui;
mod util;

/// Names of the plotted per-episode metrics, in the order of [`Update::data`]
pub const PLOTS: [&str; 2] = ["Reward", "Steps"];

/// Format for updating plot data
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub episode: usize,
    pub data: Vec<f64>,
}

/// A copy of the board and the statistics shown next to it
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub grid: Grid,
    pub phase: Phase,
    pub episode: usize,
    pub total_reward: f64,
    pub epsilon: f64,
}

impl From<&Frame<'_>> for Snapshot {
    fn from(frame: &Frame<'_>) -> Self {
        Self {
            grid: frame.grid.clone(),
            phase: frame.phase,
            episode: frame.episode,
            total_reward: frame.total_reward,
            epsilon: frame.epsilon,
        }
    }
}

pub(crate) enum Message {
    Plot(Update),
    Board(Snapshot),
}

/// How often and how slowly the board is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VizOptions {
    /// Draw every step of every `render_every`-th training episode
    ///
    /// **Default**: `10`
    pub render_every: usize,
    /// Pause after each drawn training step
    ///
    /// **Default**: 100ms
    pub train_delay: Duration,
    /// Pause after each evaluation step
    ///
    /// **Default**: 200ms
    pub eval_delay: Duration,
}

impl Default for VizOptions {
    fn default() -> Self {
        Self {
            render_every: 10,
            train_delay: Duration::from_millis(100),
            eval_delay: Duration::from_millis(200),
        }
    }
}

/// Take over the terminal, install the TUI logger and start the UI thread
///
/// **Returns** the UI thread handle and the [`Observer`] to pass to the
/// [`Trainer`](crate::runner::Trainer). The thread exits once the user presses `q`.
///
/// Fails without touching the global logger if the terminal can't be set up,
/// e.g. when stdout is not a TTY.
pub fn init(
    episodes: usize,
    options: VizOptions,
) -> io::Result<(JoinHandle<io::Result<()>>, VizObserver)> {
    start(episodes, options, tui::init)
}

fn start(
    episodes: usize,
    options: VizOptions,
    terminal: impl FnOnce() -> io::Result<Tui>,
) -> io::Result<(JoinHandle<io::Result<()>>, VizObserver)> {
    let terminal = terminal()?;

    if tui_logger::init_logger(log::LevelFilter::Trace).is_ok() {
        tui_logger::set_default_level(log::LevelFilter::Trace);
    }

    let (tx, rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));

    let quit = Arc::clone(&stop);
    let handle = thread::spawn(move || App::new(&PLOTS, episodes, quit).run(terminal, rx));

    let observer = VizObserver {
        tx,
        stop,
        options,
        connected: true,
    };
    Ok((handle, observer))
}

/// Forwards board snapshots and episode metrics to the UI thread
///
/// Reports [`Signal::Stop`] once the user quits the UI. If the UI is gone for any
/// other reason the run carries on without it.
pub struct VizObserver {
    tx: Sender<Message>,
    stop: Arc<AtomicBool>,
    options: VizOptions,
    connected: bool,
}

impl VizObserver {
    fn send(&mut self, message: Message) {
        if self.connected && self.tx.send(message).is_err() {
            // Log records still go to the TUI logger, so tell the user directly
            eprintln!("Renderer disconnected, continuing headless");
            warn!("Renderer disconnected, continuing headless");
            self.connected = false;
        }
    }

    fn signal(&self) -> Signal {
        if self.stop.load(Ordering::Relaxed) {
            Signal::Stop
        } else {
            Signal::Continue
        }
    }
}

impl Observer for VizObserver {
    fn on_step(&mut self, frame: &Frame<'_>) -> Signal {
        let delay = match frame.phase {
            Phase::Train if self.options.render_every == 0 => return self.signal(),
            Phase::Train if frame.episode % self.options.render_every != 0 => {
                return self.signal()
            }
            Phase::Train => self.options.train_delay,
            Phase::Evaluate => self.options.eval_delay,
        };

        self.send(Message::Board(frame.into()));
        if self.connected {
            thread::sleep(delay);
        }
        self.signal()
    }

    fn on_episode(&mut self, phase: Phase, summary: &EpisodeSummary) -> Signal {
        if phase == Phase::Train {
            self.send(Message::Plot(Update {
                episode: summary.episode,
                data: vec![summary.total_reward, summary.steps as f64],
            }));
        }
        self.signal()
    }
}
