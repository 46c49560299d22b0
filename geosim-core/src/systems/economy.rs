//! Monthly economy and research.
//!
//! Player: `net = tax + trade − expenses`, soldier growth bounded by free
//! manpower, research into the pool. AI countries run a simpler tick.
//! Money is in millions.

use crate::config::EconomyConfig;
use crate::defines::economy as defines;
use crate::error::ActionError;
use crate::geometry::GeoPoint;
use crate::ledger::NationLedger;
use crate::state::{AgreementKind, Fortification, NationStats, PlayerNation};
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Factory,
    University,
    Barracks,
    Fortress,
    Port,
}

/// Buildings the player owns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Infrastructure {
    pub factories: u32,
    pub universities: u32,
    pub barracks: u32,
    pub fortresses: u32,
    pub ports: u32,
}

impl Infrastructure {
    pub fn count(&self, kind: BuildingKind) -> u32 {
        match kind {
            BuildingKind::Factory => self.factories,
            BuildingKind::University => self.universities,
            BuildingKind::Barracks => self.barracks,
            BuildingKind::Fortress => self.fortresses,
            BuildingKind::Port => self.ports,
        }
    }

    pub fn add(&mut self, kind: BuildingKind) {
        let slot = match kind {
            BuildingKind::Factory => &mut self.factories,
            BuildingKind::University => &mut self.universities,
            BuildingKind::Barracks => &mut self.barracks,
            BuildingKind::Fortress => &mut self.fortresses,
            BuildingKind::Port => &mut self.ports,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u32 {
        self.factories + self.universities + self.barracks + self.fortresses + self.ports
    }
}

/// One month of the player's economy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomyReport {
    pub net_income: f64,
    pub tax_income: f64,
    pub trade_income: f64,
    pub expenses: f64,
    /// Soldiers recruited this month, never more than free manpower
    pub soldier_growth: u64,
    /// Manpower ceiling after this month
    pub manpower: u64,
    pub research_points: f64,
    pub stats: NationStats,
}

/// Computes the player's monthly economy without applying it.
pub fn calculate_economy(
    nation: &PlayerNation,
    infra: &Infrastructure,
    ledger: &NationLedger,
    config: &EconomyConfig,
) -> EconomyReport {
    let gdp_per_capita =
        nation.gdp_per_capita * (1.0 + infra.factories as f64 * config.factory_gdp_bonus);
    let population = nation.population as f64;

    let tax_income =
        population * gdp_per_capita * nation.tax_rate / defines::MONTHS_PER_YEAR / 1_000_000.0;

    // Trade flows through trade agreements, scaled by tariffs in both directions.
    let partner_trade: f64 = ledger
        .partners_of(&nation.code, AgreementKind::TradeAgreement)
        .iter()
        .filter_map(|code| ledger.country(code))
        .filter(|c| !c.is_annexed && !ledger.is_at_war(&c.code))
        .map(|c| {
            c.gdp()
                * defines::TRADE_SHARE
                * c.outbound_tariff.trade_multiplier()
                * c.inbound_tariff.trade_multiplier()
        })
        .sum();
    let trade_income = partner_trade + infra.ports as f64 * config.port_trade_income;

    let expenses = nation.soldiers as f64 * defines::SOLDIER_UPKEEP
        + infra.total() as f64 * config.building_upkeep;

    let manpower = (population * defines::MANPOWER_RATE) as u64
        + infra.barracks as u64 * config.barracks_manpower;
    let recruitment = (population * defines::RECRUITMENT_RATE) as u64
        + infra.barracks as u64 * config.barracks_recruitment;
    let soldier_growth = recruitment.min(manpower.saturating_sub(nation.soldiers));

    let stats = nation_stats(nation, infra, gdp_per_capita, ledger.agreements_of(&nation.code).len());
    let research_points = stats.science / 10.0 * (population / 1_000_000.0).max(0.1)
        + infra.universities as f64 * config.university_research;

    EconomyReport {
        net_income: tax_income + trade_income - expenses,
        tax_income,
        trade_income,
        expenses,
        soldier_growth,
        manpower,
        research_points,
        stats,
    }
}

fn nation_stats(
    nation: &PlayerNation,
    infra: &Infrastructure,
    gdp_per_capita: f64,
    agreements: usize,
) -> NationStats {
    let per_thousand = if nation.population > 0 {
        nation.soldiers as f64 / nation.population as f64 * 1000.0
    } else {
        0.0
    };
    NationStats {
        economy: (gdp_per_capita / 1000.0).clamp(0.0, 100.0),
        military: (per_thousand + infra.fortresses as f64 * 5.0).clamp(0.0, 100.0),
        diplomacy: (50.0 + nation.reputation.get() / 2.0 + agreements as f64 * 2.0).clamp(0.0, 100.0),
        science: (10.0 + infra.universities as f64 * 10.0).clamp(0.0, 100.0),
        stability: (100.0 - nation.tax_rate * 150.0 - nation.territory_lost_percent.get() / 2.0)
            .clamp(0.0, 100.0),
    }
}

/// Computes and applies the player's month.
#[instrument(skip_all, name = "economy")]
pub fn apply_economy(
    ledger: &mut NationLedger,
    infra: &Infrastructure,
    config: &EconomyConfig,
) -> EconomyReport {
    let report = calculate_economy(&ledger.player, infra, ledger, config);
    let player = &mut ledger.player;
    player.treasury += report.net_income;
    player.manpower = report.manpower;
    player.soldiers += report.soldier_growth;
    player.research_pool += report.research_points;
    player.stats = report.stats;
    log::debug!(
        "Economy: net {:.1} (tax {:.1}, trade {:.1}, expenses {:.1}), +{} soldiers",
        report.net_income,
        report.tax_income,
        report.trade_income,
        report.expenses,
        report.soldier_growth
    );
    report
}

/// Builds one building for the player, paid from the treasury.
///
/// A fortress also needs a location: it becomes a fortification that
/// defends the player's battles nearby.
pub fn construct_building(
    ledger: &mut NationLedger,
    infra: &mut Infrastructure,
    kind: BuildingKind,
    location: Option<GeoPoint>,
    config: &EconomyConfig,
) -> Result<(), ActionError> {
    let available = ledger.player.treasury;
    if available < config.building_cost {
        return Err(ActionError::InsufficientFunds {
            required: config.building_cost,
            available,
        });
    }
    if kind == BuildingKind::Fortress {
        let location = location.ok_or_else(|| {
            ActionError::ConstraintViolation("a fortress needs a location".into())
        })?;
        let id = ledger.fortifications.len() as u32 + 1;
        ledger.fortifications.push(Fortification {
            id,
            owner: ledger.player.code.clone(),
            location,
            bonus: config.fortification_bonus,
        });
    }
    ledger.player.treasury -= config.building_cost;
    infra.add(kind);
    log::debug!("Built {:?} ({} buildings)", kind, infra.total());
    Ok(())
}

/// Monthly tick for AI countries: wealth, recruitment toward manpower, power.
#[instrument(skip_all, name = "ai_economy")]
pub fn run_ai_economy_tick(ledger: &mut NationLedger) {
    for code in ledger.active_codes() {
        let Some(country) = ledger.country_mut(&code) else {
            continue;
        };
        let gdp = country.gdp();
        country.wealth += gdp * defines::AI_WEALTH_SHARE;
        country.budget = gdp / defines::MONTHS_PER_YEAR * 0.1;

        let recruitment = (country.population as f64 * defines::RECRUITMENT_RATE) as u64;
        let growth = recruitment.min(country.manpower.saturating_sub(country.soldiers));
        country.soldiers += growth;
        country.recompute_power();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Date, TariffLevel, WarOrigin};
    use crate::testing::WorldBuilder;
    use proptest::prelude::*;

    #[test]
    fn test_default_nation_month() {
        let ledger = WorldBuilder::new().build_ledger();
        let report = calculate_economy(
            &ledger.player,
            &Infrastructure::default(),
            &ledger,
            &EconomyConfig::default(),
        );

        // 1M people x 10k x 20% / 12, in millions
        assert!((report.tax_income - 1_000_000.0 * 10_000.0 * 0.2 / 12.0 / 1e6).abs() < 1e-9);
        assert_eq!(report.trade_income, 0.0);
        assert!((report.expenses - 20.0).abs() < 1e-9);
        assert!((report.net_income - (report.tax_income - 20.0)).abs() < 1e-9);
        // Manpower 10k equals soldiers: nothing to recruit
        assert_eq!(report.manpower, 10_000);
        assert_eq!(report.soldier_growth, 0);
    }

    #[test]
    fn test_trade_income_follows_tariffs() {
        let mut ledger = WorldBuilder::new()
            .with_country("TRD")
            .with_agreement("PLY", "TRD", AgreementKind::TradeAgreement)
            .build_ledger();
        let infra = Infrastructure::default();
        let config = EconomyConfig::default();

        let low = calculate_economy(&ledger.player, &infra, &ledger, &config).trade_income;
        assert!(low > 0.0);

        ledger.country_mut("TRD").unwrap().outbound_tariff = TariffLevel::FreeTrade;
        let free = calculate_economy(&ledger.player, &infra, &ledger, &config).trade_income;
        assert!((free - low * 1.5).abs() < 1e-9);

        ledger.country_mut("TRD").unwrap().inbound_tariff = TariffLevel::Embargo;
        let embargoed = calculate_economy(&ledger.player, &infra, &ledger, &config).trade_income;
        assert_eq!(embargoed, 0.0);
    }

    #[test]
    fn test_no_trade_with_enemies() {
        let mut ledger = WorldBuilder::new()
            .with_country("TRD")
            .with_agreement("PLY", "TRD", AgreementKind::TradeAgreement)
            .build_ledger();
        ledger.open_war("PLY", "TRD", WarOrigin::Declaration, Date::default());

        let report = calculate_economy(
            &ledger.player,
            &Infrastructure::default(),
            &ledger,
            &EconomyConfig::default(),
        );
        assert_eq!(report.trade_income, 0.0);
    }

    #[test]
    fn test_buildings_cost_and_yield() {
        let ledger = WorldBuilder::new().with_player(|p| p.soldiers = 0).build_ledger();
        let config = EconomyConfig::default();
        let mut infra = Infrastructure::default();
        let bare = calculate_economy(&ledger.player, &infra, &ledger, &config);

        infra.add(BuildingKind::University);
        infra.add(BuildingKind::Barracks);
        infra.add(BuildingKind::Port);
        let built = calculate_economy(&ledger.player, &infra, &ledger, &config);

        assert_eq!(infra.total(), 3);
        assert!((built.expenses - bare.expenses - 15.0).abs() < 1e-9);
        assert!(built.research_points > bare.research_points);
        assert_eq!(built.manpower, bare.manpower + 5_000);
        assert!((built.trade_income - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_economy_updates_player() {
        let mut ledger = WorldBuilder::new().with_player(|p| p.soldiers = 9_950).build_ledger();
        let treasury = ledger.player.treasury;

        let report = apply_economy(&mut ledger, &Infrastructure::default(), &EconomyConfig::default());

        assert_eq!(report.soldier_growth, 50);
        assert_eq!(ledger.player.soldiers, 10_000);
        assert!((ledger.player.treasury - treasury - report.net_income).abs() < 1e-9);
        assert!(ledger.player.research_pool > 0.0);
    }

    #[test]
    fn test_construct_building() {
        let mut ledger = WorldBuilder::new().with_player(|p| p.treasury = 250.0).build_ledger();
        let mut infra = Infrastructure::default();
        let config = EconomyConfig::default();

        construct_building(&mut ledger, &mut infra, BuildingKind::Factory, None, &config).unwrap();
        let no_site = construct_building(&mut ledger, &mut infra, BuildingKind::Fortress, None, &config);
        assert!(matches!(no_site, Err(ActionError::ConstraintViolation(_))));

        let here = Some(GeoPoint::new(1.0, 2.0));
        construct_building(&mut ledger, &mut infra, BuildingKind::Fortress, here, &config).unwrap();
        let broke = construct_building(&mut ledger, &mut infra, BuildingKind::Port, None, &config);

        assert!(matches!(broke, Err(ActionError::InsufficientFunds { .. })));
        assert_eq!(infra.count(BuildingKind::Factory), 1);
        assert_eq!(infra.count(BuildingKind::Fortress), 1);
        assert_eq!(ledger.player.treasury, 50.0);
        assert_eq!(ledger.fortifications.len(), 1);
        assert_eq!(ledger.fortifications[0].owner, "PLY");
    }

    #[test]
    fn test_ai_tick_recruits_up_to_manpower() {
        let mut ledger = WorldBuilder::new()
            .with_custom_country("AAA", |c| {
                c.soldiers = 49_900;
                c.manpower = 50_000;
            })
            .build_ledger();

        run_ai_economy_tick(&mut ledger);
        run_ai_economy_tick(&mut ledger);

        let aaa = ledger.country("AAA").unwrap();
        assert_eq!(aaa.soldiers, 50_000);
        assert!(aaa.wealth > 0.0);
    }

    proptest! {
        #[test]
        fn prop_soldier_growth_never_exceeds_manpower(
            population in 0u64..50_000_000,
            soldiers in 0u64..1_000_000,
            barracks in 0u32..20,
        ) {
            let ledger = WorldBuilder::new()
                .with_player(|p| {
                    p.population = population;
                    p.soldiers = soldiers;
                })
                .build_ledger();
            let infra = Infrastructure { barracks, ..Default::default() };

            let report = calculate_economy(&ledger.player, &infra, &ledger, &EconomyConfig::default());

            if soldiers <= report.manpower {
                prop_assert!(soldiers + report.soldier_growth <= report.manpower);
            } else {
                prop_assert_eq!(report.soldier_growth, 0);
            }
        }
    }
}
