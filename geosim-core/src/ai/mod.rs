//! AI decision-making.
//!
//! Crisis behavior is keyed by personality. Each personality is a zero-sized
//! [`CrisisPolicy`] implementation; [`policy_for`] hands out the right one.
//! Policies are pure functions of the crisis, the acting country and the
//! opponent's power, so they can be tested by injecting power ratios.
//!
//! # Determinism
//!
//! Policies never roll dice. Randomness in AI behavior (whether to declare
//! war, whether an AI war ends in peace) lives in the systems that act on
//! these decisions and uses the simulation's seeded RNG.

pub mod military;
mod policies;

pub use policies::{
    DefensivePolicy, ExpansionistPolicy, IdeologicalPolicy, IsolationistPolicy,
    OpportunistPolicy, TradingPowerPolicy,
};

use crate::crisis::{CrisisAction, DiplomaticCrisis};
use crate::state::{Country, Personality};

/// Chooses an AI participant's crisis action.
///
/// Implementations must return an action that is legal in the crisis's
/// current phase. The engine falls back to `HoldFirm` otherwise.
pub trait CrisisPolicy: Send + Sync {
    fn decide(
        &self,
        crisis: &DiplomaticCrisis,
        actor: &Country,
        opponent_power: f64,
    ) -> CrisisAction;
}

/// The policy for a personality tag.
pub fn policy_for(personality: Personality) -> &'static dyn CrisisPolicy {
    match personality {
        Personality::Expansionist => &ExpansionistPolicy,
        Personality::Defensive => &DefensivePolicy,
        Personality::Isolationist => &IsolationistPolicy,
        Personality::Opportunist => &OpportunistPolicy,
        Personality::TradingPower => &TradingPowerPolicy,
        Personality::Ideological => &IdeologicalPolicy,
    }
}

/// Actor power over opponent power. An opponent with no power is infinitely outmatched.
pub(crate) fn power_ratio(actor: &Country, opponent_power: f64) -> f64 {
    if opponent_power <= 0.0 {
        f64::INFINITY
    } else {
        actor.power / opponent_power
    }
}
