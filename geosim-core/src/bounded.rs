use serde::{Deserialize, Serialize};

/// A float clamped to `[MIN, MAX]` on every write.
///
/// Used for: relations (-100 to +100), war risk (0 to 100), occupation and
/// territory percentages (0 to 100). Serializes as a bare number; values read
/// from a scenario file are clamped on the way in.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Bounded<const MIN: i32, const MAX: i32>(f64);

impl<const MIN: i32, const MAX: i32> Bounded<MIN, MAX> {
    pub fn new(value: f64) -> Self {
        Self(Self::clamp(value))
    }

    fn clamp(value: f64) -> f64 {
        if value.is_nan() {
            return (MIN as f64).max(0.0).min(MAX as f64);
        }
        value.clamp(MIN as f64, MAX as f64)
    }

    pub fn get(&self) -> f64 {
        self.0
    }

    pub fn min(&self) -> f64 {
        MIN as f64
    }

    pub fn max(&self) -> f64 {
        MAX as f64
    }

    /// Adds `delta` and returns the new value.
    pub fn add(&mut self, delta: f64) -> f64 {
        self.0 = Self::clamp(self.0 + delta);
        self.0
    }

    pub fn set(&mut self, value: f64) {
        self.0 = Self::clamp(value);
    }

    /// Decay toward a target by a rate (e.g., 0.05 = 5%).
    ///
    /// `value = value + (target - value) * rate`
    pub fn decay_toward(&mut self, target: f64, rate: f64) {
        let delta = (target - self.0) * rate;
        self.0 = Self::clamp(self.0 + delta);
    }
}

impl<const MIN: i32, const MAX: i32> Default for Bounded<MIN, MAX> {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl<const MIN: i32, const MAX: i32> From<f64> for Bounded<MIN, MAX> {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl<const MIN: i32, const MAX: i32> From<Bounded<MIN, MAX>> for f64 {
    fn from(value: Bounded<MIN, MAX>) -> Self {
        value.0
    }
}

impl<const MIN: i32, const MAX: i32> std::fmt::Display for Bounded<MIN, MAX> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Attitude toward the player, -100 (hatred) to +100 (brotherhood).
pub type RelationsScore = Bounded<-100, 100>;
/// Standing in the eyes of the world, same range as relations.
pub type Reputation = Bounded<-100, 100>;
/// Percent-valued quantities: war risk, occupation, territory lost.
pub type Percent = Bounded<0, 100>;
