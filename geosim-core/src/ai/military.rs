//! Military heuristics for AI countries: offensives, war declarations and
//! AI-vs-AI target selection. Pure functions; the scheduler rolls the dice.

use crate::config::SimConfig;
use crate::ledger::NationLedger;
use crate::state::{Country, CountryCode, CountryModifier, Disposition, Personality};

/// Soldiers an AI at war with the player commits to one offensive, if any.
///
/// The country must field at least `offensive_strength_threshold` times the
/// player's army.
pub fn offensive_commitment(country: &Country, player_soldiers: u64, config: &SimConfig) -> Option<u64> {
    if country.soldiers == 0 {
        return None;
    }
    if (country.soldiers as f64) < config.offensive_strength_threshold * player_soldiers as f64 {
        return None;
    }
    let committed = (country.soldiers as f64 * config.offensive_commit_share) as u64;
    Some(committed.max(1))
}

/// Whether a country is disposed to declare war on the player this turn.
///
/// Hostile, aggressive and at least as strong. Expansionists and militarists
/// accept slightly worse odds.
pub fn considers_war_on_player(country: &Country, at_war: bool, player_power: f64) -> bool {
    if at_war || country.is_annexed {
        return false;
    }
    if country.disposition(false) != Disposition::Hostile || country.aggression < 3 {
        return false;
    }
    let bold = country.personality == Personality::Expansionist
        || country.has_modifier(CountryModifier::Militarist);
    let needed = if bold { 0.8 } else { 1.0 };
    country.power >= player_power * needed
}

/// The weakest enemy an aggressive country would attack, if any.
///
/// Only declared enemies that are not annexed, not already at war with it and
/// clearly weaker qualify. Ties break by code.
pub fn ai_war_target(ledger: &NationLedger, code: &str) -> Option<CountryCode> {
    let country = ledger.country(code)?;
    if country.is_annexed || country.aggression < 4 {
        return None;
    }
    country
        .enemies
        .iter()
        .filter(|enemy| !ledger.is_player(enemy))
        .filter_map(|enemy| ledger.country(enemy))
        .filter(|enemy| !enemy.is_annexed && !ledger.are_at_war(code, &enemy.code))
        .filter(|enemy| enemy.power < country.power * 0.8)
        .min_by(|a, b| a.power.total_cmp(&b.power).then_with(|| a.code.cmp(&b.code)))
        .map(|enemy| enemy.code.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::WorldBuilder;

    #[test]
    fn test_offensive_requires_strength() {
        let config = SimConfig::default();
        let mut country = Country::new("AAA", "A");
        country.soldiers = 6_000;

        assert_eq!(offensive_commitment(&country, 10_000, &config), Some(1_800));
        assert_eq!(offensive_commitment(&country, 10_001, &config), None);

        country.soldiers = 0;
        assert_eq!(offensive_commitment(&country, 0, &config), None);
    }

    #[test]
    fn test_war_on_player_needs_hostility_and_power() {
        let mut country = Country::new("AAA", "A");
        country.aggression = 4;
        country.power = 50.0;
        country.relations.set(-60.0);

        assert!(considers_war_on_player(&country, false, 50.0));
        assert!(!considers_war_on_player(&country, true, 50.0));
        assert!(!considers_war_on_player(&country, false, 60.0));

        country.personality = Personality::Expansionist;
        assert!(considers_war_on_player(&country, false, 60.0));

        country.relations.set(0.0);
        assert!(!considers_war_on_player(&country, false, 10.0));
    }

    #[test]
    fn test_ai_war_target_picks_weakest_enemy() {
        let ledger = WorldBuilder::new()
            .with_custom_country("AGG", |c| {
                c.aggression = 5;
                c.soldiers = 100_000;
                c.enemies.extend(["BIG".to_string(), "MID".to_string(), "SML".to_string()]);
            })
            .with_custom_country("BIG", |c| c.soldiers = 200_000)
            .with_custom_country("MID", |c| c.soldiers = 40_000)
            .with_custom_country("SML", |c| c.soldiers = 10_000)
            .with_war("AGG", "SML")
            .build_ledger();

        assert_eq!(ai_war_target(&ledger, "AGG"), Some("MID".to_string()));
        assert_eq!(ai_war_target(&ledger, "MID"), None);
    }
}
