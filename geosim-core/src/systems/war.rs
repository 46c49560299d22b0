//! Fighting wars: battles, occupation, territory and annexation.
//!
//! Occupation accrues on the war record and only grows while the war is
//! active. When the player gains occupation, the AI country's territory loss
//! follows immediately; full occupation of an AI country annexes it.

use super::combat::{defense_bonus_at, fight_battle, BattleOutcome};
use super::diplomacy::{conclude_war, declare_war};
use super::roll;
use crate::ai::military::{ai_war_target, offensive_commitment};
use crate::config::SimConfig;
use crate::defines::combat::REVANCHIST_LOST_PERCENT;
use crate::error::ActionError;
use crate::events::GameEvent;
use crate::geometry::{GeoPoint, GeometryService};
use crate::ledger::NationLedger;
use crate::state::{CountryCode, CountryModifier, Date, WarId, WarOrigin};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// One offensive and what came of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offensive {
    pub war_id: WarId,
    pub attacker: CountryCode,
    pub defender: CountryCode,
    pub committed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    pub outcome: BattleOutcome,
    /// Occupation actually added to the war record
    pub occupation_gained: f64,
    /// Set when the battle completed an annexation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annexed: Option<CountryCode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiWarEventKind {
    WarDeclared,
    Battle,
    Annexation,
    Peace,
}

/// Summary line for AI-vs-AI processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiWarEvent {
    #[serde(rename = "type")]
    pub kind: AiWarEventKind,
    pub attacker: CountryCode,
    pub defender: CountryCode,
}

/// Fights one battle in war `war_id`, `attacker` committing `committed` soldiers.
///
/// The battle location comes from `location` or, failing that, the
/// geometry service's frontline. Without a location there is no defense
/// bonus. Returns `None` if the war is not active or `attacker` is not in it.
#[allow(clippy::too_many_arguments)]
pub fn run_battle<R: Rng + ?Sized>(
    ledger: &mut NationLedger,
    geometry: &dyn GeometryService,
    config: &SimConfig,
    war_id: WarId,
    attacker: &str,
    committed: u64,
    location: Option<GeoPoint>,
    date: Date,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> Option<Offensive> {
    let war = ledger.war(war_id).filter(|w| w.is_active())?;
    let defender = war.opponent_of(attacker)?.clone();

    let location = location.or_else(|| match geometry.frontline(attacker, &defender) {
        Ok(point) => Some(point),
        Err(e) => {
            log::debug!("No battle location for {} vs {}: {}", attacker, defender, e);
            None
        }
    });
    let bonus = defense_bonus_at(
        &ledger.fortifications,
        geometry,
        &defender,
        location,
        config.fortification_radius_km,
    );

    let committed = committed.min(ledger.soldiers_of(attacker));
    let outcome = fight_battle(committed, ledger.soldiers_of(&defender), bonus, rng);
    apply_losses(ledger, attacker, outcome.attacker_losses);
    apply_losses(ledger, &defender, outcome.defender_losses);

    let gained = ledger
        .war_mut(war_id)
        .map(|w| w.add_occupation(attacker, outcome.occupation_delta))
        .unwrap_or(0.0);
    let occupation = ledger.war(war_id).map(|w| w.occupation_by(attacker)).unwrap_or(0.0);
    apply_territory(ledger, geometry, attacker, &defender, gained);

    log::debug!(
        "Battle {} vs {}: {} committed, +{:.2}% occupation (bonus {:.2})",
        attacker,
        defender,
        committed,
        gained,
        bonus
    );
    events.push(GameEvent::BattleFought {
        date,
        war_id,
        attacker: attacker.to_string(),
        defender: defender.clone(),
        occupation_delta: gained,
        attacker_losses: outcome.attacker_losses,
        defender_losses: outcome.defender_losses,
        defense_bonus: bonus,
    });

    let mut annexed = None;
    if gained > 0.0 && occupation >= 100.0 {
        if ledger.is_player(&defender) {
            log::warn!("The player has been fully occupied by {}", attacker);
            events.push(GameEvent::PlayerDefeated {
                date,
                by: attacker.to_string(),
            });
        } else {
            for ended in ledger.mark_annexed(&defender, date) {
                if ended != war_id {
                    log::debug!("War {} ended by annexation of {}", ended, defender);
                }
            }
            events.push(GameEvent::CountryAnnexed {
                date,
                code: defender.clone(),
                annexer: Some(attacker.to_string()),
            });
            annexed = Some(defender.clone());
        }
    }

    Some(Offensive {
        war_id,
        attacker: attacker.to_string(),
        defender,
        committed,
        location,
        outcome,
        occupation_gained: gained,
        annexed,
    })
}

fn apply_losses(ledger: &mut NationLedger, code: &str, losses: u64) {
    if ledger.is_player(code) {
        ledger.player.soldiers = ledger.player.soldiers.saturating_sub(losses);
    } else if let Some(country) = ledger.country_mut(code) {
        country.soldiers = country.soldiers.saturating_sub(losses);
        country.recompute_power();
    }
}

/// Converts occupation gained into territory change.
///
/// Only battles involving the player move territory; AI-vs-AI occupation
/// stays on the war record until it annexes.
fn apply_territory(
    ledger: &mut NationLedger,
    geometry: &dyn GeometryService,
    attacker: &str,
    defender: &str,
    gained: f64,
) {
    if gained <= 0.0 {
        return;
    }
    if ledger.is_player(attacker) {
        let Some(country) = ledger.country_mut(defender) else {
            return;
        };
        let lost = country.territory_lost_percent.add(gained);
        if lost > REVANCHIST_LOST_PERCENT {
            country.modifiers.insert(CountryModifier::Revanchist);
        }
        match geometry.country_area_km2(defender) {
            Ok(area) => ledger.player.territory_km2 += area * gained / 100.0,
            Err(e) => log::debug!("Territory of {} not measured: {}", defender, e),
        }
    } else if ledger.is_player(defender) {
        let player = &mut ledger.player;
        player.territory_lost_percent.add(gained);
        player.territory_km2 = (player.territory_km2 * (1.0 - gained / 100.0)).max(0.0);
    }
}

/// The player attacks `code` with `soldiers`.
#[allow(clippy::too_many_arguments)]
pub fn launch_offensive<R: Rng + ?Sized>(
    ledger: &mut NationLedger,
    geometry: &dyn GeometryService,
    config: &SimConfig,
    code: &str,
    soldiers: u64,
    location: Option<GeoPoint>,
    date: Date,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> Result<Offensive, ActionError> {
    let player = ledger.player_code().to_string();
    let war_id = ledger.active_war_between(&player, code).ok_or_else(|| {
        ActionError::ConstraintViolation(format!("not at war with {code}"))
    })?;
    if soldiers == 0 || soldiers > ledger.player.soldiers {
        return Err(ActionError::ConstraintViolation(format!(
            "cannot commit {} of {} soldiers",
            soldiers, ledger.player.soldiers
        )));
    }
    run_battle(ledger, geometry, config, war_id, &player, soldiers, location, date, rng, events)
        .ok_or_else(|| ActionError::ConstraintViolation(format!("war {war_id} is over")))
}

/// One offensive evaluation per country at war with the player, in code order.
#[instrument(skip_all, name = "ai_offensives")]
pub fn run_ai_offensives<R: Rng + ?Sized>(
    ledger: &mut NationLedger,
    geometry: &dyn GeometryService,
    config: &SimConfig,
    date: Date,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> Vec<Offensive> {
    let player = ledger.player_code().to_string();
    let mut offensives = Vec::new();

    for code in ledger.active_codes() {
        let Some(war_id) = ledger.active_war_between(&code, &player) else {
            continue;
        };
        let Some(country) = ledger.country(&code) else {
            continue;
        };
        let Some(committed) = offensive_commitment(country, ledger.player.soldiers, config) else {
            continue;
        };
        if let Some(offensive) =
            run_battle(ledger, geometry, config, war_id, &code, committed, None, date, rng, events)
        {
            offensives.push(offensive);
        }
    }

    offensives
}

/// AI countries fighting each other.
///
/// Aggressive countries may open wars on weaker declared enemies. Every
/// active AI-vs-AI war then fights one battle, the stronger side attacking.
/// A war that does not end in annexation may end in negotiated peace.
#[instrument(skip_all, name = "ai_vs_ai")]
pub fn run_ai_vs_ai<R: Rng + ?Sized>(
    ledger: &mut NationLedger,
    geometry: &dyn GeometryService,
    config: &SimConfig,
    date: Date,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> (Vec<AiWarEvent>, Vec<CountryCode>) {
    let mut summary = Vec::new();
    let mut annexed = Vec::new();

    for code in ledger.active_codes() {
        if ledger.is_annexed(&code) {
            continue;
        }
        let Some(target) = ai_war_target(ledger, &code) else {
            continue;
        };
        if !roll(rng, config.ai_war_declaration_chance) {
            continue;
        }
        if declare_war(ledger, &code, &target, WarOrigin::Declaration, date, rng, events).is_some() {
            summary.push(AiWarEvent {
                kind: AiWarEventKind::WarDeclared,
                attacker: code,
                defender: target,
            });
        }
    }

    let player = ledger.player_code().to_string();
    let wars: Vec<WarId> = ledger
        .wars()
        .filter(|w| w.is_active() && !w.involves(&player))
        .map(|w| w.id)
        .collect();

    for war_id in wars {
        let Some(war) = ledger.war(war_id).filter(|w| w.is_active()) else {
            continue;
        };
        let (a, b) = (war.attacker.clone(), war.defender.clone());
        let (attacker, defender) = if ledger.power_of(&a) >= ledger.power_of(&b) {
            (a, b)
        } else {
            (b, a)
        };
        let committed = (ledger.soldiers_of(&attacker) as f64 * config.offensive_commit_share) as u64;

        let Some(offensive) = run_battle(
            ledger, geometry, config, war_id, &attacker, committed, None, date, rng, events,
        ) else {
            continue;
        };
        summary.push(AiWarEvent {
            kind: AiWarEventKind::Battle,
            attacker: attacker.clone(),
            defender: defender.clone(),
        });

        if let Some(code) = offensive.annexed {
            summary.push(AiWarEvent {
                kind: AiWarEventKind::Annexation,
                attacker,
                defender: code.clone(),
            });
            annexed.push(code);
        } else if roll(rng, config.ai_peace_chance) && conclude_war(ledger, war_id, date, events) {
            summary.push(AiWarEvent {
                kind: AiWarEventKind::Peace,
                attacker,
                defender,
            });
        }
    }

    (summary, annexed)
}
