use crate::{check_interval, error::Result};

/// A value that shrinks by one step at a time, e.g. once per episode
pub trait Decay {
    /// The value after one more decay step
    fn next(&self, value: f64) -> f64;

    /// Lowest value the schedule will produce
    fn floor(&self) -> f64;
}

/// A constant value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Constant;

impl Decay for Constant {
    fn next(&self, value: f64) -> f64 {
        value
    }

    fn floor(&self) -> f64 {
        0.0
    }
}

/// v<sub>t+1</sub> = max(v<sub>t</sub> * r, v<sub>f</sub>)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multiplicative {
    rate: f64,
    vf: f64,
}

impl Multiplicative {
    /// `rate` must be in `(0, 1]` and `vf` in `[0, 1]`
    pub fn new(rate: f64, vf: f64) -> Result<Self> {
        check_interval!(rate, open 0.0, 1.0);
        check_interval!(vf, 0.0, 1.0);
        Ok(Self { rate, vf })
    }
}

impl Decay for Multiplicative {
    fn next(&self, value: f64) -> f64 {
        (value * self.rate).max(self.vf)
    }

    fn floor(&self) -> f64 {
        self.vf
    }
}
