use crate::defines::combat::{
    CASUALTY_RATE, LUCK_MAX, LUCK_MIN, MAX_BATTLE_GAIN, MIN_EFFECTIVE_RATIO,
};
use crate::geometry::{GeoPoint, GeometryService};
use crate::state::Fortification;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Result of one battle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BattleOutcome {
    /// Occupation the attacker gains, in percent of the defender's territory
    pub occupation_delta: f64,
    pub attacker_losses: u64,
    pub defender_losses: u64,
    pub defense_bonus: f64,
}

/// Deterministic occupation gain for one battle.
///
/// Effective ratio `r = attacker / (defender × (1 + bonus))`. Below 0.5
/// nothing is gained; above it the gain `25 × (r − 0.5) / (r + 1)` saturates
/// toward 25% without reaching it.
pub fn resolve_battle(attacker: u64, defender: u64, defense_bonus: f64) -> f64 {
    if attacker == 0 {
        return 0.0;
    }
    let defense = defender as f64 * (1.0 + defense_bonus.max(0.0));
    if defense <= 0.0 {
        return MAX_BATTLE_GAIN;
    }
    let ratio = attacker as f64 / defense;
    if ratio < MIN_EFFECTIVE_RATIO {
        return 0.0;
    }
    MAX_BATTLE_GAIN * (ratio - MIN_EFFECTIVE_RATIO) / (ratio + 1.0)
}

/// Fights a battle: the deterministic gain scaled by a luck roll, plus casualties.
///
/// Each side loses `3% × the opponent's share of effective strength` of its
/// soldiers.
pub fn fight_battle<R: Rng + ?Sized>(
    attacker: u64,
    defender: u64,
    defense_bonus: f64,
    rng: &mut R,
) -> BattleOutcome {
    let base = resolve_battle(attacker, defender, defense_bonus);
    let luck = rng.gen_range(LUCK_MIN..=LUCK_MAX);
    let occupation_delta = (base * luck).min(MAX_BATTLE_GAIN);

    let attack = attacker as f64;
    let defense = defender as f64 * (1.0 + defense_bonus.max(0.0));
    let total = attack + defense;
    let (attacker_losses, defender_losses) = if total > 0.0 {
        (
            (attack * CASUALTY_RATE * defense / total).round() as u64,
            (defender as f64 * CASUALTY_RATE * attack / total).round() as u64,
        )
    } else {
        (0, 0)
    };

    BattleOutcome {
        occupation_delta,
        attacker_losses,
        defender_losses,
        defense_bonus,
    }
}

/// Defense bonus for `defender` at `location`.
///
/// Only the nearest of the defender's fortifications within `radius_km`
/// counts; bonuses never stack. With no location (the geometry service
/// could not place the battle) there is no bonus. Fortifications whose
/// distance cannot be computed are ignored.
pub fn defense_bonus_at(
    fortifications: &[Fortification],
    geometry: &dyn GeometryService,
    defender: &str,
    location: Option<GeoPoint>,
    radius_km: f64,
) -> f64 {
    let Some(location) = location else {
        return 0.0;
    };

    fortifications
        .iter()
        .filter(|f| f.owner == defender)
        .filter_map(|f| match geometry.distance_km(location, f.location) {
            Ok(distance) => Some((distance, f.bonus)),
            Err(e) => {
                log::debug!("Skipping fortification {}: {}", f.id, e);
                None
            }
        })
        .filter(|(distance, _)| *distance <= radius_km)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, bonus)| bonus)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingGeometry, StubGeometry};
    use proptest::prelude::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_two_to_one_gains_without_saturating() {
        let open = resolve_battle(20_000, 10_000, 0.0);
        let fortified = resolve_battle(20_000, 10_000, 1.0);

        assert!(open > 0.0 && open < MAX_BATTLE_GAIN);
        assert_eq!(open, 12.5);
        assert!(fortified < open);
        assert!(fortified > 0.0);
    }

    #[test]
    fn test_weak_attack_gains_nothing() {
        assert_eq!(resolve_battle(4_999, 10_000, 0.0), 0.0);
        assert_eq!(resolve_battle(0, 10_000, 0.0), 0.0);
        assert_eq!(resolve_battle(0, 0, 0.0), 0.0);
        assert_eq!(resolve_battle(10, 0, 0.0), MAX_BATTLE_GAIN);
    }

    #[test]
    fn test_luck_bounds() {
        let base = resolve_battle(20_000, 10_000, 0.0);

        let unlucky = fight_battle(20_000, 10_000, 0.0, &mut StepRng::new(0, 0));
        let lucky = fight_battle(20_000, 10_000, 0.0, &mut StepRng::new(u64::MAX, 0));

        assert!((unlucky.occupation_delta - base * LUCK_MIN).abs() < 1e-9);
        assert!(lucky.occupation_delta <= base * LUCK_MAX + 1e-9);
        assert!(lucky.occupation_delta > unlucky.occupation_delta);
    }

    #[test]
    fn test_casualties_favor_the_stronger_side() {
        let outcome = fight_battle(30_000, 10_000, 0.0, &mut StepRng::new(0, 0));

        // 3% x 25% of 30k and 3% x 75% of 10k
        assert_eq!(outcome.attacker_losses, 225);
        assert_eq!(outcome.defender_losses, 225);

        let lopsided = fight_battle(90_000, 10_000, 0.0, &mut StepRng::new(0, 0));
        assert!(lopsided.defender_losses > lopsided.attacker_losses / 2);
    }

    #[test]
    fn test_nearest_fortification_wins_no_stacking() {
        let forts = vec![
            Fortification { id: 1, owner: "DEF".into(), location: GeoPoint::new(0.0, 1.0), bonus: 0.5 },
            Fortification { id: 2, owner: "DEF".into(), location: GeoPoint::new(0.0, 3.0), bonus: 1.0 },
            Fortification { id: 3, owner: "OTH".into(), location: GeoPoint::new(0.0, 0.0), bonus: 2.0 },
        ];
        let geo = StubGeometry::new();
        let here = Some(GeoPoint::new(0.0, 0.0));

        assert_eq!(defense_bonus_at(&forts, &geo, "DEF", here, 500.0), 0.5);
        // The second fort is 333 km out
        assert_eq!(defense_bonus_at(&forts, &geo, "DEF", here, 200.0), 0.5);
        assert_eq!(defense_bonus_at(&forts, &geo, "DEF", here, 100.0), 0.0);
        assert_eq!(defense_bonus_at(&forts, &geo, "DEF", None, 500.0), 0.0);
    }

    #[test]
    fn test_geometry_failure_means_no_bonus() {
        let forts = vec![Fortification {
            id: 1,
            owner: "DEF".into(),
            location: GeoPoint::new(0.0, 0.0),
            bonus: 1.0,
        }];
        let bonus = defense_bonus_at(&forts, &FailingGeometry, "DEF", Some(GeoPoint::new(0.0, 0.0)), 500.0);
        assert_eq!(bonus, 0.0);
    }

    proptest! {
        #[test]
        fn prop_gain_is_bounded_and_monotonic(
            attacker in 0u64..1_000_000,
            extra in 0u64..1_000_000,
            defender in 1u64..1_000_000,
            bonus in 0.0..3.0f64,
        ) {
            let gain = resolve_battle(attacker, defender, bonus);
            prop_assert!((0.0..MAX_BATTLE_GAIN).contains(&gain));
            prop_assert!(resolve_battle(attacker + extra, defender, bonus) >= gain);
            prop_assert!(resolve_battle(attacker, defender, bonus + 0.5) <= gain);
        }
    }
}
