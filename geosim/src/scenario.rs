//! Scenario files: the starting world of a headless run.
//!
//! A scenario is one JSON document. Every section is optional; missing
//! sections fall back to defaults, and missing fields inside a country or the
//! player fall back to the core's defaults.
//!
//! ```json
//! {
//!   "name": "Two rivals",
//!   "config": { "seed": 7 },
//!   "player": { "code": "PLY", "name": "Player" },
//!   "countries": [ { "code": "AAA", "name": "Aurelia", "aggression": 4 } ],
//!   "shapes": [ { "code": "AAA", "center": { "lat": 45.0, "lon": 10.0 }, "area_km2": 300000.0 } ],
//!   "agreements": [ { "a": "PLY", "b": "AAA", "kind": "TRADE_AGREEMENT" } ],
//!   "commands": [ { "month": 0, "command": "declare_war", "target": "AAA" } ]
//! }
//! ```

use crate::geometry::{CountryShape, PointGeometry};
use anyhow::{bail, Context, Result};
use geosim_core::state::{CountryModifier, Fortification};
use geosim_core::{
    AgreementKind, Country, Date, GeoPoint, NationLedger, Personality, PlayerNation,
    ScheduledCommand, SimConfig, Simulation, WarOrigin,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementSeed {
    pub a: String,
    pub b: String,
    pub kind: AgreementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarSeed {
    pub attacker: String,
    pub defender: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub start: Date,
    pub config: SimConfig,
    pub player: PlayerNation,
    pub countries: Vec<Country>,
    pub shapes: Vec<CountryShape>,
    pub agreements: Vec<AgreementSeed>,
    pub wars: Vec<WarSeed>,
    pub fortifications: Vec<Fortification>,
    pub commands: Vec<ScheduledCommand>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        let scenario: Scenario = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse scenario {}", path.display()))?;
        scenario.validate()?;
        log::info!(
            "Loaded scenario '{}': {} countries, {} shapes, {} commands",
            scenario.name,
            scenario.countries.len(),
            scenario.shapes.len(),
            scenario.commands.len()
        );
        Ok(scenario)
    }

    /// Rejects scenarios that reference nations they never define.
    pub fn validate(&self) -> Result<()> {
        let mut codes = BTreeSet::new();
        codes.insert(self.player.code.as_str());
        for country in &self.countries {
            if country.code.is_empty() {
                bail!("Country '{}' has no code", country.name);
            }
            if !codes.insert(country.code.as_str()) {
                bail!("Duplicate nation code {}", country.code);
            }
        }

        let known = |code: &str, what: &str| -> Result<()> {
            if codes.contains(code) {
                Ok(())
            } else {
                bail!("{} references unknown nation {}", what, code)
            }
        };
        for shape in &self.shapes {
            known(&shape.code, "Shape")?;
        }
        for seed in &self.agreements {
            known(&seed.a, "Agreement")?;
            known(&seed.b, "Agreement")?;
        }
        for seed in &self.wars {
            known(&seed.attacker, "War")?;
            known(&seed.defender, "War")?;
            if seed.attacker == seed.defender {
                bail!("{} cannot be at war with itself", seed.attacker);
            }
        }
        for fort in &self.fortifications {
            known(&fort.owner, "Fortification")?;
        }
        Ok(())
    }

    /// Builds the simulation and hands back the scripted commands.
    pub fn into_simulation(self, seed: Option<u64>) -> (Simulation, Vec<ScheduledCommand>) {
        let mut config = self.config;
        if let Some(seed) = seed {
            config.seed = seed;
        }

        let mut player = self.player;
        if let Some(shape) = self.shapes.iter().find(|s| s.code == player.code) {
            player.territory_km2 = shape.area_km2;
        }

        let mut ledger = NationLedger::new(player);
        for mut country in self.countries {
            country.recompute_power();
            ledger.upsert_country(country, self.start);
        }
        for seed in &self.agreements {
            ledger.sign_agreement(seed.kind, &seed.a, &seed.b, self.start);
        }
        // War voids every agreement between the pair, seeded ones included
        for seed in &self.wars {
            for voided in ledger.void_agreements_between(&seed.attacker, &seed.defender) {
                log::warn!(
                    "Scenario war {} vs {} voids their {:?}",
                    seed.attacker,
                    seed.defender,
                    voided.kind
                );
            }
            ledger.open_war(&seed.attacker, &seed.defender, WarOrigin::Declaration, self.start);
        }
        ledger.fortifications = self.fortifications;

        let geometry = PointGeometry::new(self.shapes);
        log::debug!("Geometry ready for {} nations", geometry.len());
        let sim = Simulation::new(config, ledger, Box::new(geometry), self.start);
        (sim, self.commands)
    }

    /// A small five-nation world, used when no scenario file is given.
    pub fn demo() -> Self {
        let mut player = PlayerNation::new("PLY", "Player Republic");
        player.population = 8_000_000;
        player.soldiers = 30_000;
        player.manpower = 60_000;

        let countries = vec![
            country("AUR", "Aurelia", |c| {
                c.aggression = 4;
                c.personality = Personality::Expansionist;
                c.relations.set(-45.0);
                c.soldiers = 80_000;
                c.freedom_level = 20.0;
                c.unrest_level = 60.0;
                c.enemies.insert("BOR".into());
                c.modifiers.insert(CountryModifier::Militarist);
            }),
            country("BOR", "Borovia", |c| {
                c.relations.set(10.0);
                c.soldiers = 25_000;
                c.enemies.insert("AUR".into());
            }),
            country("CAL", "Caldera", |c| {
                c.relations.set(65.0);
                c.personality = Personality::TradingPower;
                c.economy_index = 70.0;
            }),
            country("DUN", "Dunmark", |c| {
                c.personality = Personality::Isolationist;
                c.population = 2_000_000;
            }),
            country("ELM", "Elmora", |c| {
                c.relations.set(-20.0);
                c.aggression = 3;
                c.personality = Personality::Opportunist;
                c.soldiers = 40_000;
            }),
        ];

        let shape = |code: &str, lat: f64, lon: f64, area_km2: f64| CountryShape {
            code: code.to_string(),
            center: GeoPoint::new(lat, lon),
            area_km2,
        };
        let shapes = vec![
            shape("PLY", 48.0, 10.0, 350_000.0),
            shape("AUR", 48.0, 18.0, 420_000.0),
            shape("BOR", 53.0, 20.0, 300_000.0),
            shape("CAL", 42.0, 6.0, 250_000.0),
            shape("DUN", 56.0, 9.0, 45_000.0),
            shape("ELM", 44.0, 14.0, 130_000.0),
        ];

        Self {
            name: "Demo".to_string(),
            start: Date::default(),
            config: SimConfig::default(),
            player,
            countries,
            shapes,
            agreements: vec![AgreementSeed {
                a: "PLY".into(),
                b: "CAL".into(),
                kind: AgreementKind::TradeAgreement,
            }],
            wars: Vec::new(),
            fortifications: Vec::new(),
            commands: Vec::new(),
        }
    }
}

fn country(code: &str, name: &str, f: impl FnOnce(&mut Country)) -> Country {
    let mut c = Country::new(code, name);
    f(&mut c);
    c
}
