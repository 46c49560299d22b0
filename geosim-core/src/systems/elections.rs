//! Political turnover: elections in democracies, coups in unstable autocracies.
//!
//! A new leader forgets part of the predecessor's standing with the player and
//! calms the street. The scheduler calls this fire-and-forget; results show up
//! only as events and country state.

use super::roll;
use crate::config::SimConfig;
use crate::defines::politics;
use crate::events::GameEvent;
use crate::ledger::NationLedger;
use crate::state::{Country, Date};
use rand::Rng;
use tracing::instrument;

const GIVEN_NAMES: [&str; 8] = [
    "Amara", "Bastian", "Celia", "Dmitri", "Elena", "Farid", "Greta", "Hiro",
];
const FAMILY_NAMES: [&str; 8] = [
    "Adeyemi", "Brandt", "Castellanos", "Dragan", "Eklund", "Farouk", "Gallo", "Hayashi",
];

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, names: &[&'a str]) -> &'a str {
    let index = (rng.gen::<f64>() * names.len() as f64) as usize;
    names[index.min(names.len() - 1)]
}

fn new_leader<R: Rng + ?Sized>(rng: &mut R) -> String {
    let given = pick(rng, &GIVEN_NAMES);
    let family = pick(rng, &FAMILY_NAMES);
    format!("{} {}", given, family)
}

/// Chance the sitting leader keeps office: 60% at zero unrest, 10% at full unrest.
pub fn incumbent_chance(unrest: f64) -> f64 {
    (politics::INCUMBENT_BASE_CHANCE - unrest.clamp(0.0, 100.0) / 200.0).max(0.0)
}

/// Chance of a coup this call, zero below the unrest threshold.
pub fn coup_chance(country: &Country) -> f64 {
    if country.is_democracy() || country.unrest_level < politics::COUP_UNREST {
        return 0.0;
    }
    (politics::COUP_BASE_CHANCE + (country.unrest_level - politics::COUP_UNREST) / 100.0).min(1.0)
}

fn install_leader(country: &mut Country, leader: String, unrest_relief: f64) {
    country.leader = leader;
    country.unrest_level = (country.unrest_level + unrest_relief).clamp(0.0, 100.0);
    country
        .relations
        .decay_toward(0.0, politics::NEW_LEADER_RELATIONS_RESET);
}

/// Holds due elections and rolls for coups, in code order.
///
/// Democracies without a scheduled election get one `election_interval_months`
/// out. Annexed countries are skipped.
#[instrument(skip_all, name = "elections")]
pub fn run_elections<R: Rng + ?Sized>(
    ledger: &mut NationLedger,
    config: &SimConfig,
    date: Date,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) {
    for code in ledger.active_codes() {
        let Some(country) = ledger.country_mut(&code) else {
            continue;
        };

        if country.is_democracy() {
            match country.next_election {
                None => {
                    country.next_election = Some(date.add_months(config.election_interval_months));
                }
                Some(due) if due <= date => {
                    let incumbent_won = roll(rng, incumbent_chance(country.unrest_level));
                    if incumbent_won {
                        country.unrest_level =
                            (country.unrest_level + politics::ELECTION_UNREST_RELIEF / 2.0).max(0.0);
                    } else {
                        install_leader(country, new_leader(rng), politics::ELECTION_UNREST_RELIEF);
                    }
                    country.next_election = Some(date.add_months(config.election_interval_months));
                    log::info!(
                        "{} held an election: {} ({})",
                        code,
                        country.leader,
                        if incumbent_won { "re-elected" } else { "new leader" }
                    );
                    events.push(GameEvent::ElectionHeld {
                        date,
                        code: code.clone(),
                        leader: country.leader.clone(),
                        incumbent_won,
                    });
                }
                Some(_) => {}
            }
        } else if roll(rng, coup_chance(country)) {
            install_leader(country, new_leader(rng), politics::COUP_UNREST_RELIEF);
            country.authority = politics::COUP_AUTHORITY;
            log::info!("Coup in {}: {} seizes power", code, country.leader);
            events.push(GameEvent::Coup {
                date,
                code: code.clone(),
                leader: country.leader.clone(),
            });
        }
    }
}
