//! Simulation systems.
//!
//! Each system is a set of free functions over the [`NationLedger`](crate::ledger::NationLedger):
//! they take the ledger, the current date and an injected RNG, mutate the
//! ledger and append what happened to an event sink.

pub mod alliance;
pub mod claims;
pub mod coalitions;
pub mod combat;
pub mod diplomacy;
pub mod economy;
pub mod elections;
pub mod war;

pub use alliance::run_alliance_response;
pub use combat::{resolve_battle, BattleOutcome};
pub use diplomacy::{declare_war, make_peace, propose_agreement};
pub use economy::{calculate_economy, EconomyReport, Infrastructure};

use rand::Rng;

/// Bernoulli roll that tolerates probabilities outside [0, 1].
pub(crate) fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    chance > 0.0 && rng.gen::<f64>() < chance
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_roll_bounds() {
        let mut low = StepRng::new(0, 0);
        let mut high = StepRng::new(u64::MAX, 0);

        assert!(roll(&mut low, 0.01));
        assert!(!roll(&mut low, 0.0));
        assert!(!roll(&mut low, -1.0));
        assert!(!roll(&mut high, 0.99));
        assert!(roll(&mut high, 1.0));
        assert!(roll(&mut high, 7.0));
    }
}
