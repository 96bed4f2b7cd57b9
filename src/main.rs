use std::error::Error;

use clap::Parser;
use gemfield::{
    algo::tabular::{QTableAgent, QTableAgentConfig},
    gym::GridWorld,
    runner::{Observer, RunConfig, Trainer},
};
use log::info;

/// Train a tabular Q-learning agent to find the gem on a 5x5 grid, then test it greedily
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Number of training episodes
    #[arg(long, default_value_t = 500)]
    train_episodes: usize,

    /// Number of greedy evaluation episodes
    #[arg(long, default_value_t = 5)]
    eval_episodes: usize,

    /// Step budget per training episode
    #[arg(long, default_value_t = 100)]
    max_steps: usize,

    /// Step budget per evaluation episode
    #[arg(long, default_value_t = 50)]
    eval_max_steps: usize,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Show the board in a terminal UI
    #[arg(long)]
    render: bool,

    #[arg(long, default_value_t = 0.1)]
    alpha: f64,

    #[arg(long, default_value_t = 0.95)]
    gamma: f64,

    #[arg(long, default_value_t = 1.0)]
    epsilon: f64,

    #[arg(long, default_value_t = 0.995)]
    epsilon_decay: f64,

    #[arg(long, default_value_t = 0.01)]
    epsilon_min: f64,
}

impl Args {
    fn agent_config(&self) -> QTableAgentConfig {
        QTableAgentConfig {
            alpha: self.alpha,
            gamma: self.gamma,
            epsilon: self.epsilon,
            epsilon_decay: self.epsilon_decay,
            epsilon_min: self.epsilon_min,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let env = GridWorld::canonical();
    let config = args.agent_config();
    let agent = match args.seed {
        Some(seed) => QTableAgent::seeded(config, env.size(), seed)?,
        None => QTableAgent::new(config, env.size())?,
    };
    let mut trainer = Trainer::new(env, agent)?;

    if args.render {
        return render(&mut trainer, &args);
    }

    tracing_subscriber::fmt::init();
    run(&mut trainer, &args, gemfield::runner::NoopObserver);
    Ok(())
}

/// Train then evaluate, skipping evaluation if the observer stopped training
fn run<O: Observer>(trainer: &mut Trainer, args: &Args, mut observer: O) {
    let config = RunConfig {
        max_steps: args.max_steps,
        ..Default::default()
    };

    let mut training = trainer.train(args.train_episodes, config, &mut observer);
    training.by_ref().for_each(drop);
    if training.is_stopped() {
        info!("Training interrupted by user");
        return;
    }

    if let Some(mean) = trainer.mean_reward(100) {
        info!("Mean reward over the last 100 episodes: {mean:.2}");
    }
    trainer.evaluate(args.eval_episodes, args.eval_max_steps, &mut observer);
}

#[cfg(feature = "viz")]
fn render(trainer: &mut Trainer, args: &Args) -> Result<(), Box<dyn Error>> {
    use gemfield::viz::{self, VizOptions};

    let (handle, observer) = match viz::init(args.train_episodes, VizOptions::default()) {
        Ok(ui) => ui,
        Err(e) => {
            tracing_subscriber::fmt::init();
            log::warn!("Could not start the terminal UI ({e}), running headless");
            run(trainer, args, gemfield::runner::NoopObserver);
            return Ok(());
        }
    };
    run(trainer, args, observer);

    match handle.join() {
        Ok(result) => Ok(result?),
        Err(_) => Err("UI thread panicked".into()),
    }
}

#[cfg(not(feature = "viz"))]
fn render(trainer: &mut Trainer, args: &Args) -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();
    log::warn!("Built without the `viz` feature, running headless");
    run(trainer, args, gemfield::runner::NoopObserver);
    Ok(())
}
