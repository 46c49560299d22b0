//! Alliance response - allies of a defender deciding whether to join a war.
//!
//! When a war is declared, every country holding a MILITARY_ALLIANCE with the
//! defender is asked once:
//! - Joining opens a separate war between the ally and the original attacker
//! - The response is one level deep: an ally that joins does not call its own allies
//! - Each country is drawn into a given war-origin event at most once
//! - The player is never auto-joined; it decides for itself

use super::diplomacy::declare_war;
use super::roll;
use crate::events::GameEvent;
use crate::ledger::NationLedger;
use crate::state::{AgreementKind, Country, CountryCode, CountryModifier, Date, WarId, WarOrigin};
use rand::Rng;
use rustc_hash::FxHashSet;

/// Base chance that an ally honors the alliance before personality weighting.
const BASE_JOIN_CHANCE: f64 = 0.5;

/// Chance that `ally` joins a war against `attacker`.
///
/// Personality sets the baseline; hostility toward a player attacker raises
/// it; a hopeless balance of power halves it.
pub fn join_chance(
    ally: &Country,
    attacker_is_player: bool,
    side_power: f64,
    attacker_power: f64,
) -> f64 {
    let mut chance = BASE_JOIN_CHANCE * ally.personality.alliance_loyalty();

    if attacker_is_player {
        chance += -ally.relations.get() / 200.0;
    }
    if ally.has_modifier(CountryModifier::Militarist) {
        chance *= 1.2;
    }
    if side_power < attacker_power * 0.5 {
        chance *= 0.5;
    }

    chance.clamp(0.0, 1.0)
}

/// Asks each of the defender's allies to join war `war_id`.
///
/// Returns the codes of allies that joined, in code order.
pub fn run_alliance_response<R: Rng + ?Sized>(
    ledger: &mut NationLedger,
    war_id: WarId,
    date: Date,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> Vec<CountryCode> {
    let Some(war) = ledger.war(war_id) else {
        return Vec::new();
    };
    let attacker = war.attacker.clone();
    let defender = war.defender.clone();

    let mut drawn: FxHashSet<CountryCode> = FxHashSet::default();
    drawn.insert(attacker.clone());
    drawn.insert(defender.clone());

    let mut joined = Vec::new();
    for ally in ledger.partners_of(&defender, AgreementKind::MilitaryAlliance) {
        if !drawn.insert(ally.clone()) || ledger.is_player(&ally) {
            continue;
        }
        let Some(country) = ledger.country(&ally) else {
            continue;
        };
        if country.is_annexed || ledger.are_at_war(&ally, &attacker) {
            continue;
        }
        // Allied to both sides: stays out rather than pick one.
        if ledger.has_agreement(&ally, &attacker, AgreementKind::MilitaryAlliance) {
            events.push(GameEvent::AllyDeclined {
                date,
                ally: ally.clone(),
                defender: defender.clone(),
            });
            continue;
        }

        let side_power = country.power + ledger.power_of(&defender);
        let chance = join_chance(
            country,
            ledger.is_player(&attacker),
            side_power,
            ledger.power_of(&attacker),
        );

        if roll(rng, chance) {
            let origin = WarOrigin::AllianceResponse { war_id };
            if let Some(new_war) = declare_war(ledger, &ally, &attacker, origin, date, rng, events)
            {
                log::info!("{} honors its alliance with {} against {}", ally, defender, attacker);
                events.push(GameEvent::AllyJoinedWar {
                    date,
                    war_id: new_war,
                    ally: ally.clone(),
                    against: attacker.clone(),
                });
                joined.push(ally);
            }
        } else {
            log::debug!("{} declines to join {}'s war (chance {:.2})", ally, defender, chance);
            events.push(GameEvent::AllyDeclined {
                date,
                ally,
                defender: defender.clone(),
            });
        }
    }

    joined
}
