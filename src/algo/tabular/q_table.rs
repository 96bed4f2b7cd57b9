use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use strum::VariantArray;

use crate::{
    agent::{Agent, Exp},
    check_interval,
    decay::Multiplicative,
    error::{ConfigError, Result},
    exploration::{Choice, EpsilonGreedy},
    gym::grid_world::{Action, GridWorld, Pos},
};

/// Configuration for the [`QTableAgent`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QTableAgentConfig {
    /// Learning rate, in `(0, 1]`
    ///
    /// **Default**: `0.1`
    pub alpha: f64,
    /// Discount factor, in `[0, 1]`
    ///
    /// **Default**: `0.95`
    pub gamma: f64,
    /// Initial exploration rate, in `[0, 1]`
    ///
    /// **Default**: `1.0`
    pub epsilon: f64,
    /// Multiplier applied to epsilon after each episode, in `(0, 1]`
    ///
    /// **Default**: `0.995`
    pub epsilon_decay: f64,
    /// Exploration floor, in `[0, epsilon]`
    ///
    /// **Default**: `0.01`
    pub epsilon_min: f64,
}

impl Default for QTableAgentConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.95,
            epsilon: 1.0,
            epsilon_decay: 0.995,
            epsilon_min: 0.01,
        }
    }
}

/// Dense table of action values for every square of a `size` x `size` grid
///
/// All entries start at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    size: usize,
    values: Vec<f64>,
}

impl QTable {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size * Action::COUNT],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn offset(&self, (row, col): Pos) -> usize {
        assert!(
            row < self.size && col < self.size,
            "{:?} is outside the table",
            (row, col)
        );
        (row * self.size + col) * Action::COUNT
    }

    /// Values of every action at `pos`, indexed by [`Action::index`]
    pub fn row(&self, pos: Pos) -> &[f64] {
        let i = self.offset(pos);
        &self.values[i..i + Action::COUNT]
    }

    pub fn get(&self, pos: Pos, action: Action) -> f64 {
        self.row(pos)[action.index()]
    }

    fn get_mut(&mut self, pos: Pos, action: Action) -> &mut f64 {
        let i = self.offset(pos);
        &mut self.values[i + action.index()]
    }

    /// Highest value at `pos` over all actions, legal or not
    pub fn max(&self, pos: Pos) -> f64 {
        self.row(pos).iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// The action among `actions` with the highest value at `pos`
    ///
    /// Ties go to the action that comes first in `actions`.
    pub fn best(&self, pos: Pos, actions: &[Action]) -> Option<Action> {
        let row = self.row(pos);
        actions
            .iter()
            .fold(None, |best: Option<Action>, &a| match best {
                Some(b) if row[b.index()] >= row[a.index()] => Some(b),
                _ => Some(a),
            })
    }

    /// The greedy action at every square, over all actions
    pub fn policy(&self) -> Vec<Vec<Action>> {
        (0..self.size)
            .map(|row| {
                (0..self.size)
                    .map(|col| {
                        self.best((row, col), Action::VARIANTS)
                            .unwrap_or(Action::Up)
                    })
                    .collect()
            })
            .collect()
    }
}

/// A Q-learning agent that stores its estimates in a dense [`QTable`]
///
/// Actions are picked epsilon-greedily among the legal actions of the current square,
/// and epsilon decays multiplicatively once per episode down to a floor.
///
/// ### Generics
/// - `R` - Source of randomness for exploration. Seed it for reproducible runs.
#[derive(Debug, Clone)]
pub struct QTableAgent<R: Rng = StdRng> {
    table: QTable,
    exploration: EpsilonGreedy<Multiplicative>,
    alpha: f64,   // learning rate
    gamma: f64,   // discount factor
    episode: u32, // completed episodes
    rng: R,
}

impl QTableAgent<StdRng> {
    /// Initialize a new agent for a `size` x `size` grid, seeded from system entropy
    pub fn new(config: QTableAgentConfig, size: usize) -> Result<Self> {
        Self::from_rng(config, size, StdRng::from_entropy())
    }

    /// Initialize a new agent with a reproducible random source
    pub fn seeded(config: QTableAgentConfig, size: usize, seed: u64) -> Result<Self> {
        Self::from_rng(config, size, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> QTableAgent<R> {
    /// Initialize a new agent drawing exploration decisions from `rng`
    ///
    /// Fails if a hyperparameter is outside its interval, see [`QTableAgentConfig`],
    /// or if `size` is zero
    pub fn from_rng(config: QTableAgentConfig, size: usize, rng: R) -> Result<Self> {
        let QTableAgentConfig {
            alpha,
            gamma,
            epsilon,
            epsilon_decay,
            epsilon_min,
        } = config;
        check_interval!(alpha, open 0.0, 1.0);
        check_interval!(gamma, 0.0, 1.0);
        if size == 0 {
            return Err(ConfigError::EmptyGrid);
        }

        let decay = Multiplicative::new(epsilon_decay, epsilon_min)?;
        Ok(Self {
            table: QTable::new(size),
            exploration: EpsilonGreedy::new(epsilon, decay)?,
            alpha,
            gamma,
            episode: 0,
            rng,
        })
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn epsilon(&self) -> f64 {
        self.exploration.epsilon()
    }

    /// Number of times [`decay_exploration`](Self::decay_exploration) has been called
    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// Choose an action for `state` among `actions`
    ///
    /// With probability epsilon a uniformly random action, otherwise the one with
    /// the highest value, ties going to the earliest in `actions`.
    ///
    /// **Panics** if `actions` is empty
    pub fn select_action(&mut self, state: Pos, actions: &[Action]) -> Action {
        let choice = self.exploration.choose(&mut self.rng);
        match choice {
            Choice::Explore => actions.choose(&mut self.rng).copied(),
            Choice::Exploit => self.table.best(state, actions),
        }
        .expect("There is always at least one action available")
    }

    /// Apply one Q-learning update to the entry for `(state, action)`
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max<sub>a'</sub> Q(s',a') - Q(s,a)]
    ///
    /// The max runs over every action at `next_state`, and is zero when `done`.
    pub fn update(&mut self, state: Pos, action: Action, reward: f64, next_state: Pos, done: bool) {
        let max_next_q = if done {
            0.0
        } else {
            self.table.max(next_state)
        };
        let target = reward + self.gamma * max_next_q;
        let q = self.table.get_mut(state, action);
        *q += self.alpha * (target - *q);
    }

    /// Shrink epsilon by the decay multiplier, never below the floor
    ///
    /// Call once per finished episode.
    pub fn decay_exploration(&mut self) {
        self.exploration.decay();
        self.episode += 1;
    }
}

impl<R: Rng> Agent<GridWorld> for QTableAgent<R> {
    fn act(&mut self, state: &Pos, actions: &[Action]) -> Action {
        self.select_action(*state, actions)
    }

    fn learn(&mut self, exp: Exp<GridWorld>) {
        let Exp {
            state,
            action,
            reward,
            next_state,
            done,
        } = exp;
        self.update(state, action, reward, next_state, done);
    }

    fn end_episode(&mut self) {
        self.decay_exploration();
    }

    fn exploration(&self) -> f64 {
        self.epsilon()
    }

    fn set_exploration(&mut self, epsilon: f64) {
        self.exploration.set_epsilon(epsilon);
    }

    fn check(&self, env: &GridWorld) -> Result<()> {
        let (env, agent) = (env.size(), self.table.size());
        if env != agent {
            return Err(ConfigError::SizeMismatch { env, agent });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greedy_agent() -> QTableAgent {
        let config = QTableAgentConfig {
            epsilon: 0.0,
            epsilon_min: 0.0,
            ..Default::default()
        };
        QTableAgent::seeded(config, 5, 0).unwrap()
    }

    #[test]
    fn config_validation() {
        let bad = [
            QTableAgentConfig {
                alpha: 0.0,
                ..Default::default()
            },
            QTableAgentConfig {
                alpha: 1.5,
                ..Default::default()
            },
            QTableAgentConfig {
                gamma: -0.5,
                ..Default::default()
            },
            QTableAgentConfig {
                epsilon: 2.0,
                ..Default::default()
            },
            QTableAgentConfig {
                epsilon_decay: 0.0,
                ..Default::default()
            },
            QTableAgentConfig {
                epsilon: 0.001,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(
                QTableAgent::seeded(config, 5, 0).is_err(),
                "{config:?} is rejected"
            );
        }
        assert_eq!(
            QTableAgent::seeded(QTableAgentConfig::default(), 0, 0).unwrap_err(),
            ConfigError::EmptyGrid
        );
        let err = QTableAgent::seeded(
            QTableAgentConfig {
                alpha: 1.5,
                ..Default::default()
            },
            5,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfInterval { name: "alpha", .. }));
        assert!(QTableAgent::seeded(QTableAgentConfig::default(), 5, 0).is_ok());
    }

    #[test]
    fn table_starts_at_zero() {
        let agent = greedy_agent();
        let table = agent.table();
        for row in 0..5 {
            for col in 0..5 {
                assert_eq!(table.row((row, col)), &[0.0; 4]);
            }
        }
    }

    #[test]
    fn greedy_is_deterministic() {
        let mut agent = greedy_agent();
        agent.update((2, 2), Action::Left, 1.0, (2, 1), true);
        let actions = [Action::Up, Action::Down, Action::Left, Action::Right];
        for _ in 0..50 {
            assert_eq!(agent.select_action((2, 2), &actions), Action::Left);
        }
    }

    #[test]
    fn ties_go_to_first_action() {
        let mut agent = greedy_agent();
        assert_eq!(
            agent.select_action((0, 0), &[Action::Right, Action::Down]),
            Action::Right
        );
        assert_eq!(
            agent.select_action((0, 0), &[Action::Down, Action::Right]),
            Action::Down
        );

        agent.update((0, 0), Action::Down, 1.0, (1, 0), true);
        agent.update((0, 0), Action::Right, 1.0, (0, 1), true);
        assert_eq!(
            agent.select_action((0, 0), &[Action::Right, Action::Down]),
            Action::Right,
            "Equal non-zero values also favor the first"
        );
    }

    #[test]
    fn exploration_stays_within_valid_actions() {
        let mut agent = QTableAgent::seeded(QTableAgentConfig::default(), 5, 42).unwrap();
        let actions = [Action::Down, Action::Right];
        let mut seen = [false; 2];
        for _ in 0..200 {
            let a = agent.select_action((0, 0), &actions);
            let i = actions.iter().position(|&x| x == a).expect("Action is valid");
            seen[i] = true;
        }
        assert_eq!(seen, [true, true], "Both actions get explored");
    }

    #[test]
    fn seeded_agents_agree() {
        let mut a = QTableAgent::seeded(QTableAgentConfig::default(), 5, 9).unwrap();
        let mut b = QTableAgent::seeded(QTableAgentConfig::default(), 5, 9).unwrap();
        let actions = Action::VARIANTS;
        for _ in 0..100 {
            assert_eq!(
                a.select_action((2, 2), actions),
                b.select_action((2, 2), actions)
            );
        }
    }

    #[test]
    fn update_rule() {
        let mut agent = greedy_agent();
        agent.update((1, 0), Action::Down, 2.0, (2, 0), false);
        assert!((agent.table().get((1, 0), Action::Down) - 0.2).abs() < 1e-12);

        // max over next state includes every action
        agent.update((0, 0), Action::Down, -1.0, (1, 0), false);
        let expected = 0.1 * (-1.0 + 0.95 * 0.2);
        assert!((agent.table().get((0, 0), Action::Down) - expected).abs() < 1e-12);

        // terminal transitions ignore the next state
        agent.update((0, 0), Action::Right, 10.0, (1, 0), true);
        assert!((agent.table().get((0, 0), Action::Right) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn update_touches_one_entry() {
        let mut agent = greedy_agent();
        let before = agent.table().clone();
        agent.update((3, 2), Action::Up, 5.0, (2, 2), false);
        let after = agent.table();
        for row in 0..5 {
            for col in 0..5 {
                for &a in Action::VARIANTS {
                    if (row, col, a) != (3, 2, Action::Up) {
                        assert_eq!(after.get((row, col), a), before.get((row, col), a));
                    }
                }
            }
        }
    }

    #[test]
    fn update_moves_toward_target() {
        let mut agent = greedy_agent();
        agent.update((2, 2), Action::Down, 4.0, (3, 2), true);
        agent.update((2, 3), Action::Down, 1.0, (3, 3), true);

        let target = -0.01 + 0.95 * agent.table().max((2, 3));
        let mut previous = agent.table().get((2, 2), Action::Left);
        for _ in 0..50 {
            agent.update((2, 2), Action::Left, -0.01, (2, 3), false);
            let q = agent.table().get((2, 2), Action::Left);
            assert!(
                (target - q).abs() < (target - previous).abs(),
                "Each update gets strictly closer"
            );
            previous = q;
        }
    }

    #[test]
    fn decay_respects_floor() {
        let mut agent = QTableAgent::seeded(
            QTableAgentConfig {
                epsilon_decay: 0.5,
                epsilon_min: 0.2,
                ..Default::default()
            },
            5,
            0,
        )
        .unwrap();
        for _ in 0..10 {
            agent.decay_exploration();
            assert!(agent.epsilon() >= 0.2);
        }
        assert_eq!(agent.epsilon(), 0.2);
        assert_eq!(agent.episode(), 10);
    }

    #[test]
    fn policy_follows_table() {
        let mut agent = greedy_agent();
        agent.update((4, 3), Action::Right, 10.0, (4, 4), true);
        let policy = agent.table().policy();
        assert_eq!(policy[4][3], Action::Right);
        assert_eq!(policy[0][0], Action::Up, "Untrained squares default to the first action");
    }

    #[test]
    fn check_rejects_other_grid_sizes() {
        let agent = greedy_agent();
        assert!(agent.check(&GridWorld::canonical()).is_ok());

        let env = GridWorld::new(crate::gym::Layout::new(6, (0, 0), (5, 5))).unwrap();
        assert_eq!(
            agent.check(&env),
            Err(ConfigError::SizeMismatch { env: 6, agent: 5 })
        );
    }
}
