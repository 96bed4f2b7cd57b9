use rand::Rng;

use crate::{
    check_interval,
    decay::Decay,
    error::{ConfigError, Result},
};

use super::Choice;

/// Epsilon greedy exploration policy with an episode-decaying epsilon threshold
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D: Decay> {
    epsilon: f64,
    decay: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a starting epsilon and a decay strategy
    ///
    /// Fails if `epsilon` is not in `[0, 1]` or lies below the decay floor
    pub fn new(epsilon: f64, decay: D) -> Result<Self> {
        check_interval!(epsilon, 0.0, 1.0);
        let floor = decay.floor();
        if floor > epsilon {
            return Err(ConfigError::FloorAboveStart {
                start: epsilon,
                floor,
            });
        }
        Ok(Self { epsilon, decay })
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Override the exploration rate, e.g. `0.0` for pure exploitation
    ///
    /// Unlike [`decay`](Self::decay), this is not bounded by the floor of the schedule.
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    /// Advance the decay schedule by one step
    pub fn decay(&mut self) {
        self.epsilon = self.decay.next(self.epsilon);
    }

    /// Invoke epsilon greedy policy
    ///
    /// Draws one sample from `rng` per call
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Choice {
        if rng.gen::<f64>() < self.epsilon {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use crate::decay::{Constant, Multiplicative};

    use super::*;

    #[test]
    fn rejects_bad_epsilon() {
        assert!(EpsilonGreedy::new(1.5, Constant).is_err());
        assert!(EpsilonGreedy::new(-0.1, Constant).is_err());
        assert_eq!(
            EpsilonGreedy::new(0.1, Multiplicative::new(0.9, 0.2).unwrap()).unwrap_err(),
            ConfigError::FloorAboveStart {
                start: 0.1,
                floor: 0.2
            }
        );
    }

    #[test]
    fn extremes_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        let greedy = EpsilonGreedy::new(0.0, Constant).unwrap();
        let random = EpsilonGreedy::new(1.0, Constant).unwrap();
        for _ in 0..100 {
            assert_eq!(greedy.choose(&mut rng), Choice::Exploit);
            assert_eq!(random.choose(&mut rng), Choice::Explore);
        }
    }

    #[test]
    fn decay_stops_at_floor() {
        let mut policy = EpsilonGreedy::new(1.0, Multiplicative::new(0.5, 0.1).unwrap()).unwrap();
        policy.decay();
        assert_eq!(policy.epsilon(), 0.5);
        for _ in 0..20 {
            policy.decay();
            assert!(policy.epsilon() >= 0.1, "Never below the floor");
        }
        assert_eq!(policy.epsilon(), 0.1);
    }

    #[test]
    fn override_ignores_floor() {
        let mut policy = EpsilonGreedy::new(1.0, Multiplicative::new(0.5, 0.1).unwrap()).unwrap();
        policy.set_epsilon(0.0);
        assert_eq!(policy.epsilon(), 0.0);
        assert_eq!(policy.choose(&mut StdRng::seed_from_u64(1)), Choice::Exploit);
    }
}
