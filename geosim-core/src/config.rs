use serde::{Deserialize, Serialize};

/// Simulation configuration.
///
/// Every field has a default, so a scenario file only needs to list what it
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the simulation RNG. Same seed + same calls = same world.
    pub seed: u64,
    /// Upper bound on simultaneously active crises.
    pub max_active_crises: usize,
    /// Days a rejected proposal of one kind is suppressed for that country.
    pub proposal_cooldown_days: u32,
    /// Radius within which a defender's fortification grants its bonus.
    pub fortification_radius_km: f64,
    /// AI offensives need `soldiers >= threshold * player soldiers`.
    pub offensive_strength_threshold: f64,
    /// Share of its army an AI commits to one offensive.
    pub offensive_commit_share: f64,
    /// World land area; the denominator of territory share.
    pub world_area_km2: f64,
    pub election_interval_months: u32,
    pub border_incident_chance: f64,
    pub territorial_dispute_chance: f64,
    pub trade_war_chance: f64,
    /// Per AI turn, per hostile aggressive country.
    pub ai_war_declaration_chance: f64,
    /// Per AI-vs-AI turn, per active AI war.
    pub ai_peace_chance: f64,
    /// Chance per month that a country facing high tariffs retaliates.
    pub tariff_retaliation_chance: f64,
    pub economy: EconomyConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            max_active_crises: 3,
            proposal_cooldown_days: 180,
            fortification_radius_km: 500.0,
            offensive_strength_threshold: 0.6,
            offensive_commit_share: 0.3,
            world_area_km2: 148_940_000.0,
            election_interval_months: 48,
            border_incident_chance: 0.02,
            territorial_dispute_chance: 0.03,
            trade_war_chance: 0.05,
            ai_war_declaration_chance: 0.02,
            ai_peace_chance: 0.05,
            tariff_retaliation_chance: 0.3,
            economy: EconomyConfig::default(),
        }
    }
}

/// Costs and yields of the player's infrastructure. Money is in millions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub building_cost: f64,
    pub building_upkeep: f64,
    /// Defense bonus of a fortress, e.g. 0.5 = +50%
    pub fortification_bonus: f64,
    /// GDP per capita bonus per factory, as a fraction
    pub factory_gdp_bonus: f64,
    pub port_trade_income: f64,
    pub barracks_manpower: u64,
    pub barracks_recruitment: u64,
    pub university_research: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            building_cost: 100.0,
            building_upkeep: 5.0,
            fortification_bonus: 0.5,
            factory_gdp_bonus: 0.02,
            port_trade_income: 20.0,
            barracks_manpower: 5_000,
            barracks_recruitment: 200,
            university_research: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.max_active_crises, 3);
        assert_eq!(config.fortification_radius_km, 500.0);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SimConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.proposal_cooldown_days, 180);
        assert_eq!(config.economy.building_upkeep, 5.0);
    }
}
