//! Coalition system - countries band together, with or against the player.
//!
//! The player can found coalitions and invite countries into them. Separately,
//! when the player's reputation sinks below -20 and at least 4 countries are
//! hostile, those countries form a containment coalition against it. Members
//! whose relations recover leave; a coalition below 3 members dissolves.

use crate::defines::coalition::{CONTAINMENT_MIN_HOSTILE, CONTAINMENT_REPUTATION, MIN_MEMBERS};
use crate::defines::relations::HOSTILE_BELOW;
use crate::error::ActionError;
use crate::events::GameEvent;
use crate::ledger::NationLedger;
use crate::state::{Coalition, CoalitionId, CoalitionKind, CountryCode, Date, Disposition};
use std::collections::BTreeSet;
use tracing::instrument;

const CONTAINMENT_NAME: &str = "Containment League";

fn formed_event(coalition: &Coalition) -> GameEvent {
    GameEvent::CoalitionFormed {
        date: coalition.formed,
        coalition_id: coalition.id,
        name: coalition.name.clone(),
        members: coalition.members.iter().cloned().collect(),
    }
}

fn insert_coalition(
    ledger: &mut NationLedger,
    name: &str,
    kind: CoalitionKind,
    members: BTreeSet<CountryCode>,
    date: Date,
    events: &mut Vec<GameEvent>,
) -> CoalitionId {
    let id = ledger.allocate_coalition_id();
    let coalition = Coalition {
        id,
        name: name.to_string(),
        kind,
        members,
        formed: date,
    };
    log::info!(
        "Coalition {} formed with {} members: {:?}",
        coalition.name,
        coalition.members.len(),
        coalition.members
    );
    events.push(formed_event(&coalition));
    ledger.coalitions.insert(id, coalition);
    id
}

fn dissolve(ledger: &mut NationLedger, id: CoalitionId, date: Date, events: &mut Vec<GameEvent>) {
    if let Some(coalition) = ledger.coalitions.remove(&id) {
        log::info!(
            "Coalition {} dissolved (only {} members remain)",
            coalition.name,
            coalition.members.len()
        );
        events.push(GameEvent::CoalitionDissolved {
            date,
            coalition_id: id,
        });
    }
}

/// Founds a coalition led by the player.
///
/// Invitees that are not hostile, not at war with the player and not annexed
/// accept. Fails when fewer than 3 members (the player included) would remain.
pub fn create_coalition(
    ledger: &mut NationLedger,
    name: &str,
    kind: CoalitionKind,
    invitees: &[CountryCode],
    date: Date,
    events: &mut Vec<GameEvent>,
) -> Result<CoalitionId, ActionError> {
    if kind == CoalitionKind::Containment {
        return Err(ActionError::ConstraintViolation(
            "containment coalitions cannot be founded by the player".into(),
        ));
    }

    let mut members = BTreeSet::new();
    members.insert(ledger.player_code().to_string());
    for code in invitees {
        let willing = ledger.country(code).is_some_and(|c| !c.is_annexed)
            && matches!(
                ledger.disposition(code),
                Some(Disposition::Friendly | Disposition::Neutral)
            );
        if willing {
            members.insert(code.clone());
        } else {
            log::debug!("{} declined to join coalition {}", code, name);
        }
    }

    if members.len() < MIN_MEMBERS {
        return Err(ActionError::ConstraintViolation(format!(
            "coalition {} needs {} members, only {} willing",
            name,
            MIN_MEMBERS,
            members.len()
        )));
    }
    Ok(insert_coalition(ledger, name, kind, members, date, events))
}

/// Adds a country (or the player) to a coalition.
///
/// The player cannot join a containment coalition; annexed countries cannot
/// join anything.
pub fn join_coalition(ledger: &mut NationLedger, id: CoalitionId, code: &str) -> bool {
    let is_player = ledger.is_player(code);
    if !is_player && ledger.country(code).map_or(true, |c| c.is_annexed) {
        return false;
    }
    let Some(coalition) = ledger.coalitions.get_mut(&id) else {
        return false;
    };
    if is_player && coalition.kind == CoalitionKind::Containment {
        return false;
    }
    coalition.members.insert(code.to_string())
}

/// Removes a member. A coalition left below 3 members dissolves.
pub fn leave_coalition(
    ledger: &mut NationLedger,
    id: CoalitionId,
    code: &str,
    date: Date,
    events: &mut Vec<GameEvent>,
) -> bool {
    let Some(coalition) = ledger.coalitions.get_mut(&id) else {
        return false;
    };
    if !coalition.members.remove(code) {
        return false;
    }
    if coalition.members.len() < MIN_MEMBERS {
        dissolve(ledger, id, date, events);
    }
    true
}

/// Monthly coalition tick: containment formation, membership and dissolution.
#[instrument(skip_all, name = "coalitions")]
pub fn run_coalition_tick(ledger: &mut NationLedger, date: Date, events: &mut Vec<GameEvent>) {
    update_containment(ledger, date, events);
    dissolve_undersized(ledger, date, events);
}

fn update_containment(ledger: &mut NationLedger, date: Date, events: &mut Vec<GameEvent>) {
    let hostile: BTreeSet<CountryCode> = ledger
        .countries()
        .filter(|c| !c.is_annexed && c.relations.get() < HOSTILE_BELOW)
        .map(|c| c.code.clone())
        .collect();
    let recovered: BTreeSet<CountryCode> = ledger
        .countries()
        .filter(|c| c.relations.get() >= HOSTILE_BELOW)
        .map(|c| c.code.clone())
        .collect();
    let alarmed = ledger.player.reputation.get() < CONTAINMENT_REPUTATION;

    let existing = ledger
        .coalitions
        .values()
        .find(|c| c.kind == CoalitionKind::Containment)
        .map(|c| c.id);

    match existing {
        Some(id) => {
            if let Some(coalition) = ledger.coalitions.get_mut(&id) {
                coalition.members.retain(|m| !recovered.contains(m));
                if alarmed {
                    coalition.members.extend(hostile);
                }
            }
        }
        None if alarmed && hostile.len() >= CONTAINMENT_MIN_HOSTILE => {
            insert_coalition(
                ledger,
                CONTAINMENT_NAME,
                CoalitionKind::Containment,
                hostile,
                date,
                events,
            );
        }
        None => {}
    }
}

fn dissolve_undersized(ledger: &mut NationLedger, date: Date, events: &mut Vec<GameEvent>) {
    let undersized: Vec<CoalitionId> = ledger
        .coalitions
        .values()
        .filter(|c| c.members.len() < MIN_MEMBERS)
        .map(|c| c.id)
        .collect();
    for id in undersized {
        dissolve(ledger, id, date, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::WorldBuilder;

    fn hostile_world(count: usize) -> NationLedger {
        let mut builder = WorldBuilder::new()
            .with_player(|p| p.reputation.set(-40.0))
            .with_country_relations("FRN", 60.0);
        for code in ["HA1", "HA2", "HA3", "HA4", "HA5"].iter().take(count) {
            builder = builder.with_country_relations(code, -60.0);
        }
        builder.build_ledger()
    }

    fn containment(ledger: &NationLedger) -> Option<&Coalition> {
        ledger
            .coalitions
            .values()
            .find(|c| c.kind == CoalitionKind::Containment)
    }

    #[test]
    fn test_containment_forms_from_hostile_countries() {
        let mut ledger = hostile_world(4);
        let mut events = Vec::new();

        run_coalition_tick(&mut ledger, Date::default(), &mut events);

        let coalition = containment(&ledger).expect("coalition should form");
        assert_eq!(coalition.members.len(), 4);
        assert!(!coalition.members.contains("FRN"));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "coalition_formed");
    }

    #[test]
    fn test_no_containment_with_good_reputation_or_few_enemies() {
        let mut ledger = hostile_world(3);
        run_coalition_tick(&mut ledger, Date::default(), &mut Vec::new());
        assert!(containment(&ledger).is_none());

        let mut ledger = hostile_world(5);
        ledger.player.reputation.set(0.0);
        run_coalition_tick(&mut ledger, Date::default(), &mut Vec::new());
        assert!(containment(&ledger).is_none());
    }

    #[test]
    fn test_recovered_members_leave_and_coalition_dissolves() {
        let mut ledger = hostile_world(4);
        let date = Date::default();
        run_coalition_tick(&mut ledger, date, &mut Vec::new());

        ledger.set_relations("HA1", 50.0);
        run_coalition_tick(&mut ledger, date, &mut Vec::new());
        assert_eq!(containment(&ledger).unwrap().members.len(), 3);

        ledger.set_relations("HA2", 50.0);
        let mut events = Vec::new();
        run_coalition_tick(&mut ledger, date, &mut events);

        assert!(containment(&ledger).is_none());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "coalition_dissolved");
    }

    #[test]
    fn test_player_coalition_needs_willing_members() {
        let mut ledger = WorldBuilder::new()
            .with_country_relations("AAA", 60.0)
            .with_country_relations("BBB", 0.0)
            .with_country_relations("CCC", -60.0)
            .build_ledger();
        let date = Date::default();
        let mut events = Vec::new();

        let refused = create_coalition(
            &mut ledger,
            "Pact",
            CoalitionKind::Military,
            &["AAA".into(), "CCC".into()],
            date,
            &mut events,
        );
        assert!(matches!(refused, Err(ActionError::ConstraintViolation(_))));
        assert!(ledger.coalitions.is_empty());

        let id = create_coalition(
            &mut ledger,
            "Pact",
            CoalitionKind::Economic,
            &["AAA".into(), "BBB".into(), "CCC".into()],
            date,
            &mut events,
        )
        .unwrap();
        let members = &ledger.coalitions[&id].members;
        assert!(members.contains("PLY") && members.contains("AAA") && members.contains("BBB"));
        assert!(!members.contains("CCC"));
    }

    #[test]
    fn test_join_and_leave() {
        let mut ledger = WorldBuilder::new()
            .with_country("AAA")
            .with_country("BBB")
            .with_country("CCC")
            .build_ledger();
        let date = Date::default();
        let mut events = Vec::new();
        let id = create_coalition(
            &mut ledger,
            "Pact",
            CoalitionKind::Military,
            &["AAA".into(), "BBB".into()],
            date,
            &mut events,
        )
        .unwrap();

        assert!(join_coalition(&mut ledger, id, "CCC"));
        assert!(!join_coalition(&mut ledger, id, "CCC"));
        assert!(!join_coalition(&mut ledger, 99, "CCC"));

        assert!(leave_coalition(&mut ledger, id, "CCC", date, &mut events));
        assert!(ledger.coalitions.contains_key(&id));
        assert!(leave_coalition(&mut ledger, id, "AAA", date, &mut events));
        assert!(!ledger.coalitions.contains_key(&id));
        assert_eq!(events.last().map(|e| e.kind()), Some("coalition_dissolved"));
    }

    #[test]
    fn test_player_cannot_join_containment() {
        let mut ledger = hostile_world(4);
        run_coalition_tick(&mut ledger, Date::default(), &mut Vec::new());
        let id = containment(&ledger).unwrap().id;

        assert!(!join_coalition(&mut ledger, id, "PLY"));
    }
}
