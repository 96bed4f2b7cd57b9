use log::{debug, info, warn};

use crate::{
    agent::{Agent, Exp},
    algo::tabular::QTableAgent,
    env::{DiscreteActionSpace, Environment},
    error::Result,
    gym::grid_world::{Cell, Grid, GridWorld},
};

/// Number of recent episodes averaged in progress reports
const REPORT_WINDOW: usize = 100;

/// Which kind of run a hook is being called from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Train,
    Evaluate,
}

/// Returned by observers to let the run go on or end it early
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Signal {
    #[default]
    Continue,
    Stop,
}

/// Read-only view of the run handed to an [`Observer`] after every step
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub grid: &'a Grid,
    pub phase: Phase,
    pub episode: usize,
    pub step: usize,
    pub total_reward: f64,
    pub epsilon: f64,
}

/// How an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Reached the gem
    Gem,
    /// Stepped on a mine
    Mine,
    /// Ran out of steps
    Truncated,
    /// The agent had no legal move
    Stuck,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Gem
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub total_reward: f64,
    pub steps: usize,
    pub outcome: Outcome,
    /// Exploration rate the episode was played with
    pub epsilon: f64,
}

/// Hooks invoked by the [`Trainer`] purely for observation, e.g. rendering
///
/// Returning [`Signal::Stop`] ends the run after the current step.
pub trait Observer {
    fn on_step(&mut self, _frame: &Frame<'_>) -> Signal {
        Signal::Continue
    }

    fn on_episode(&mut self, _phase: Phase, _summary: &EpisodeSummary) -> Signal {
        Signal::Continue
    }
}

/// An observer that watches nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn on_step(&mut self, frame: &Frame<'_>) -> Signal {
        (**self).on_step(frame)
    }

    fn on_episode(&mut self, phase: Phase, summary: &EpisodeSummary) -> Signal {
        (**self).on_episode(phase, summary)
    }
}

/// Settings for a training run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Step budget per episode
    ///
    /// **Default**: `100`
    pub max_steps: usize,
    /// Log progress every this many episodes, `0` to stay quiet
    ///
    /// **Default**: `100`
    pub report_every: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: 100,
            report_every: 100,
        }
    }
}

/// Results of a greedy evaluation run
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub episodes: Vec<EpisodeSummary>,
    /// Whether an observer ended the run early
    pub stopped: bool,
}

impl Evaluation {
    pub fn successes(&self) -> usize {
        self.episodes
            .iter()
            .filter(|s| s.outcome.is_success())
            .count()
    }

    /// Fraction of completed episodes that reached the gem
    pub fn success_rate(&self) -> f64 {
        if self.episodes.is_empty() {
            0.0
        } else {
            self.successes() as f64 / self.episodes.len() as f64
        }
    }
}

/// Drives episodes of a [`GridWorld`] and feeds the transitions to an agent
///
/// Only the agent's learned values carry over from one episode to the next.
pub struct Trainer<A = QTableAgent> {
    env: GridWorld,
    agent: A,
    rewards: Vec<f64>,
}

impl<A: Agent<GridWorld>> Trainer<A> {
    /// Pair `env` with `agent`
    ///
    /// Fails if the agent cannot cover every square of `env`
    pub fn new(env: GridWorld, agent: A) -> Result<Self> {
        agent.check(&env)?;
        Ok(Self {
            env,
            agent,
            rewards: Vec::new(),
        })
    }

    pub fn env(&self) -> &GridWorld {
        &self.env
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut A {
        &mut self.agent
    }

    pub fn into_agent(self) -> A {
        self.agent
    }

    /// Total reward of every completed training episode, in order
    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// Mean reward of the last `window` training episodes
    pub fn mean_reward(&self, window: usize) -> Option<f64> {
        let n = window.min(self.rewards.len());
        if n == 0 {
            return None;
        }
        let tail = &self.rewards[self.rewards.len() - n..];
        Some(tail.iter().sum::<f64>() / n as f64)
    }

    /// Train for up to `episodes` episodes
    ///
    /// Returns a lazy iterator yielding one [`EpisodeSummary`] per finished episode.
    /// Nothing runs until it is polled. It ends early if `observer` signals a stop.
    pub fn train<O: Observer>(
        &mut self,
        episodes: usize,
        config: RunConfig,
        observer: O,
    ) -> Training<'_, A, O> {
        info!("Starting Q-learning training for {episodes} episodes");
        Training {
            trainer: self,
            observer,
            config,
            episode: 0,
            episodes,
            stopped: false,
        }
    }

    /// Play `episodes` episodes greedily without learning
    ///
    /// Exploration is switched off for good: the agent keeps an epsilon of zero afterwards.
    pub fn evaluate<O: Observer>(
        &mut self,
        episodes: usize,
        max_steps: usize,
        mut observer: O,
    ) -> Evaluation {
        info!("Testing trained agent...");
        self.agent.set_exploration(0.0);

        let mut evaluation = Evaluation {
            episodes: Vec::with_capacity(episodes),
            stopped: false,
        };
        for episode in 0..episodes {
            let Some(summary) = self.run_episode(Phase::Evaluate, episode, max_steps, &mut observer)
            else {
                evaluation.stopped = true;
                break;
            };

            match summary.outcome {
                Outcome::Gem => info!("Episode {}: SUCCESS in {} steps", episode + 1, summary.steps),
                Outcome::Mine => info!("Episode {}: FAILED (hit mine)", episode + 1),
                Outcome::Truncated => info!("Episode {}: FAILED (out of steps)", episode + 1),
                Outcome::Stuck => info!("Episode {}: FAILED (no valid actions)", episode + 1),
            }
            evaluation.episodes.push(summary);

            if observer.on_episode(Phase::Evaluate, &summary) == Signal::Stop {
                evaluation.stopped = true;
                break;
            }
        }

        let (successes, total) = (evaluation.successes(), evaluation.episodes.len());
        info!(
            "Success rate: {successes}/{total} ({:.1}%)",
            evaluation.success_rate() * 100.0
        );
        evaluation
    }

    /// Play one episode, learning from every transition while training
    ///
    /// Returns `None` if the observer stopped the run part way through.
    fn run_episode<O: Observer>(
        &mut self,
        phase: Phase,
        episode: usize,
        max_steps: usize,
        observer: &mut O,
    ) -> Option<EpisodeSummary> {
        let epsilon = self.agent.exploration();
        let mut state = self.env.reset();
        let mut total_reward = 0.0;
        let mut steps = 0;
        let mut outcome = Outcome::Truncated;

        while steps < max_steps {
            let actions = self.env.actions(&state);
            if actions.is_empty() {
                warn!("No valid actions from {state:?}, ending episode {episode}");
                outcome = Outcome::Stuck;
                break;
            }

            let action = self.agent.act(&state, &actions);
            let step = self.env.step(action);
            if phase == Phase::Train {
                self.agent.learn(Exp {
                    state,
                    action,
                    reward: step.reward,
                    next_state: step.next_state,
                    done: step.done,
                });
            }

            state = step.next_state;
            total_reward += step.reward;
            steps += 1;

            let frame = Frame {
                grid: self.env.grid(),
                phase,
                episode,
                step: steps,
                total_reward,
                epsilon,
            };
            if observer.on_step(&frame) == Signal::Stop {
                info!("Run stopped during episode {episode}");
                return None;
            }

            if step.done {
                outcome = match self.env.grid()[state] {
                    Cell::Mine => Outcome::Mine,
                    _ => Outcome::Gem,
                };
                break;
            }
        }

        debug!("Episode {episode} ended after {steps} steps: {outcome:?}\n{}", self.env.grid());
        Some(EpisodeSummary {
            episode,
            total_reward,
            steps,
            outcome,
            epsilon,
        })
    }
}

/// Lazy training run created by [`Trainer::train`]
///
/// Finite and single-use: once exhausted or stopped it yields nothing more.
pub struct Training<'a, A, O> {
    trainer: &'a mut Trainer<A>,
    observer: O,
    config: RunConfig,
    episode: usize,
    episodes: usize,
    stopped: bool,
}

impl<'a, A, O> Training<'a, A, O> {
    /// Whether an observer ended the run before all episodes were played
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl<'a, A: Agent<GridWorld>, O: Observer> Iterator for Training<'a, A, O> {
    type Item = EpisodeSummary;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped || self.episode >= self.episodes {
            return None;
        }

        let episode = self.episode;
        let trainer = &mut *self.trainer;
        let Some(summary) = trainer.run_episode(
            Phase::Train,
            episode,
            self.config.max_steps,
            &mut self.observer,
        ) else {
            self.stopped = true;
            return None;
        };
        self.episode += 1;

        trainer.agent.end_episode();
        trainer.rewards.push(summary.total_reward);

        let every = self.config.report_every;
        if every > 0 && episode % every == 0 {
            let average = trainer.mean_reward(REPORT_WINDOW).unwrap_or_default();
            info!(
                "Episode {episode}, Average Reward: {average:.2}, Epsilon: {:.3}",
                trainer.agent.exploration()
            );
        }
        if self.episode == self.episodes {
            info!("Training completed!");
        }

        if self.observer.on_episode(Phase::Train, &summary) == Signal::Stop {
            self.stopped = true;
        }
        Some(summary)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.stopped {
            (0, Some(0))
        } else {
            (0, Some(self.episodes - self.episode))
        }
    }
}
