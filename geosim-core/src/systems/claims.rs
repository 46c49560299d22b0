//! Territorial claims drawn by the player.
//!
//! A claim is a polygon over foreign land. Creating one measures how much of
//! each active country it covers (through the geometry service) and sours
//! relations with every target. A claim ends in one of three ways:
//! relinquished, seized by force (the player occupies enough of each target
//! in a war) or ceded on demand. A refused demand opens a territorial dispute.

use super::roll;
use crate::crisis::{CrisisEngine, CrisisKind};
use crate::defines::claims::{
    CESSION_RELATIONS_PENALTY, CLAIM_RELATIONS_PENALTY, MAX_CESSION_CHANCE,
};
use crate::defines::combat::REVANCHIST_LOST_PERCENT;
use crate::error::ActionError;
use crate::events::GameEvent;
use crate::geometry::{GeometryService, Polygon};
use crate::ledger::NationLedger;
use crate::state::{Claim, ClaimId, ClaimTarget, CountryModifier, Date};
use rand::Rng;

fn claim_not_found(id: ClaimId) -> ActionError {
    ActionError::ConstraintViolation(format!("claim {id} does not exist"))
}

/// Records a claim over every active country the polygon overlaps.
///
/// Countries whose overlap cannot be measured are left out. A country whose
/// total area is unknown is still claimed, with a share of 0%.
pub fn create_claim(
    ledger: &mut NationLedger,
    geometry: &dyn GeometryService,
    polygon: Polygon,
    date: Date,
    events: &mut Vec<GameEvent>,
) -> Result<ClaimId, ActionError> {
    let area = geometry
        .area_km2(&polygon)
        .map_err(|e| ActionError::ConstraintViolation(format!("claim polygon rejected: {e}")))?;
    if area <= 0.0 {
        return Err(ActionError::ConstraintViolation("claim polygon has no area".into()));
    }

    let mut targets = Vec::new();
    for code in ledger.active_codes() {
        let overlap = match geometry.intersection_km2(&polygon, &code) {
            Ok(km2) if km2 > 0.0 => km2,
            Ok(_) => continue,
            Err(e) => {
                log::debug!("Skipping claim overlap with {}: {}", code, e);
                continue;
            }
        };
        let percent = match geometry.country_area_km2(&code) {
            Ok(total) if total > 0.0 => (overlap / total * 100.0).min(100.0),
            _ => 0.0,
        };
        targets.push(ClaimTarget {
            code,
            area_km2: overlap,
            percent,
        });
    }

    if targets.is_empty() {
        return Err(ActionError::ConstraintViolation(
            "claim covers no foreign territory".into(),
        ));
    }

    for target in &targets {
        if let Some(country) = ledger.country_mut(&target.code) {
            country.claimed_by_player_percent.add(target.percent);
            country.relations.add(CLAIM_RELATIONS_PENALTY);
        }
    }

    let id = ledger.allocate_claim_id();
    log::info!("Claim {} over {:.0} km² across {} countries", id, area, targets.len());
    events.push(GameEvent::ClaimCreated {
        date,
        claim_id: id,
        targets: targets.iter().map(|t| t.code.clone()).collect(),
    });
    ledger.claims.insert(
        id,
        Claim {
            id,
            polygon,
            targets,
            created: date,
        },
    );
    Ok(id)
}

fn release_targets(ledger: &mut NationLedger, claim: &Claim) {
    for target in &claim.targets {
        if let Some(country) = ledger.country_mut(&target.code) {
            country.claimed_by_player_percent.add(-target.percent);
        }
    }
}

/// Drops a claim. Returns false for unknown claims.
pub fn relinquish_claim(
    ledger: &mut NationLedger,
    id: ClaimId,
    date: Date,
    events: &mut Vec<GameEvent>,
) -> bool {
    let Some(claim) = ledger.claims.remove(&id) else {
        return false;
    };
    release_targets(ledger, &claim);
    events.push(GameEvent::ClaimRelinquished { date, claim_id: id });
    true
}

/// Moves every target's claimed land to the player and destroys the claim.
fn transfer_claim(ledger: &mut NationLedger, claim: Claim, date: Date, events: &mut Vec<GameEvent>) {
    release_targets(ledger, &claim);
    for target in &claim.targets {
        ledger.player.territory_km2 += target.area_km2;
        if let Some(country) = ledger.country_mut(&target.code) {
            let lost = country.territory_lost_percent.add(target.percent);
            if lost > REVANCHIST_LOST_PERCENT {
                country.modifiers.insert(CountryModifier::Revanchist);
            }
        }
        events.push(GameEvent::TerritoryTransferred {
            date,
            claim_id: claim.id,
            from: target.code.clone(),
            area_km2: target.area_km2,
        });
    }
}

/// Takes a claim by force.
///
/// The player must be at war with every target and occupy at least the
/// claimed share of each.
pub fn seize_claim(
    ledger: &mut NationLedger,
    id: ClaimId,
    date: Date,
    events: &mut Vec<GameEvent>,
) -> Result<f64, ActionError> {
    let claim = ledger.claims.get(&id).ok_or_else(|| claim_not_found(id))?;
    let player = ledger.player_code().to_string();

    for target in &claim.targets {
        let occupied = ledger
            .active_war_between(&player, &target.code)
            .and_then(|war_id| ledger.war(war_id))
            .map(|war| war.occupation_by(&player));
        match occupied {
            None => {
                return Err(ActionError::ConstraintViolation(format!(
                    "not at war with {}",
                    target.code
                )))
            }
            Some(occupied) if occupied < target.percent => {
                return Err(ActionError::ConstraintViolation(format!(
                    "occupation of {} is {:.1}%, claim needs {:.1}%",
                    target.code, occupied, target.percent
                )))
            }
            Some(_) => {}
        }
    }

    let Some(claim) = ledger.claims.remove(&id) else {
        return Err(claim_not_found(id));
    };
    let area = claim.total_area_km2();
    log::info!("Claim {} seized: {:.0} km²", id, area);
    transfer_claim(ledger, claim, date, events);
    Ok(area)
}

/// Chance a country cedes land on demand: rises with the player's power
/// advantage and with good relations, capped at 90%.
pub fn cession_chance(player_power: f64, target_power: f64, relations: f64) -> f64 {
    let advantage = if target_power > 0.0 {
        player_power / target_power - 1.0
    } else {
        f64::INFINITY
    };
    (advantage * 0.5 + relations / 200.0).clamp(0.0, MAX_CESSION_CHANCE)
}

/// Demands the claimed land without a war.
///
/// Every target is asked in order. If all yield, the land transfers, each
/// target's relations drop by 20 and the claim is destroyed. The first refusal
/// stops the demand and opens a territorial dispute crisis (the player as
/// instigator). Returns whether the land was ceded.
pub fn demand_territory<R: Rng + ?Sized>(
    ledger: &mut NationLedger,
    crises: &mut CrisisEngine,
    id: ClaimId,
    date: Date,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> Result<bool, ActionError> {
    let claim = ledger.claims.get(&id).ok_or_else(|| claim_not_found(id))?;
    let player_power = ledger.player.power();

    let mut refusal = None;
    for target in &claim.targets {
        let Some(country) = ledger.country(&target.code) else {
            continue;
        };
        let chance = cession_chance(player_power, country.power, country.relations.get());
        if !roll(rng, chance) {
            refusal = Some(target.code.clone());
            break;
        }
    }

    if let Some(code) = refusal {
        log::info!("{} refused the demand for claim {}", code, id);
        events.push(GameEvent::TerritorialDemandRefused {
            date,
            claim_id: id,
            code: code.clone(),
        });
        let player = ledger.player_code().to_string();
        if let Err(e) =
            crises.start_crisis(ledger, CrisisKind::TerritorialDispute, &player, &code, date, events)
        {
            log::debug!("No dispute opened with {}: {}", code, e);
        }
        return Ok(false);
    }

    let Some(claim) = ledger.claims.remove(&id) else {
        return Err(claim_not_found(id));
    };
    for target in &claim.targets {
        ledger.set_relations(&target.code, CESSION_RELATIONS_PENALTY);
    }
    transfer_claim(ledger, claim, date, events);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoPoint;
    use crate::state::WarOrigin;
    use crate::testing::{FailingGeometry, StubGeometry, WorldBuilder};
    use rand::rngs::mock::StepRng;

    fn square() -> Polygon {
        Polygon::new(vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(1.0, 0.0),
        ])
    }

    fn geometry() -> StubGeometry {
        StubGeometry::new()
            .with_country_area("AAA", 10_000.0)
            .with_overlap("AAA", 2_000.0)
            .with_overlap("BBB", 500.0)
    }

    fn world() -> NationLedger {
        WorldBuilder::new()
            .with_country("AAA")
            .with_country("BBB")
            .with_country("CCC")
            .build_ledger()
    }

    #[test]
    fn test_create_claim_measures_targets() {
        let mut ledger = world();
        let mut events = Vec::new();

        let id = create_claim(&mut ledger, &geometry(), square(), Date::default(), &mut events).unwrap();

        let claim = &ledger.claims[&id];
        assert_eq!(claim.targets.len(), 2);
        assert_eq!(claim.targets[0].code, "AAA");
        assert_eq!(claim.targets[0].percent, 20.0);
        // BBB's total area is unknown
        assert_eq!(claim.targets[1].percent, 0.0);
        assert_eq!(claim.total_area_km2(), 2_500.0);

        let aaa = ledger.country("AAA").unwrap();
        assert_eq!(aaa.claimed_by_player_percent.get(), 20.0);
        assert_eq!(aaa.relations.get(), CLAIM_RELATIONS_PENALTY);
        assert_eq!(ledger.country("CCC").unwrap().relations.get(), 0.0);
        assert_eq!(events[0].kind(), "claim_created");
    }

    #[test]
    fn test_claim_rejected_without_targets_or_geometry() {
        let mut ledger = world();
        let mut events = Vec::new();

        let none = create_claim(&mut ledger, &StubGeometry::new().with_overlap("ZZZ", 10.0), square(), Date::default(), &mut events);
        let offline = create_claim(&mut ledger, &FailingGeometry, square(), Date::default(), &mut events);
        let empty = create_claim(&mut ledger, &geometry(), Polygon::default(), Date::default(), &mut events);

        assert!(matches!(none, Err(ActionError::ConstraintViolation(_))));
        assert!(matches!(offline, Err(ActionError::ConstraintViolation(_))));
        assert!(matches!(empty, Err(ActionError::ConstraintViolation(_))));
        assert!(ledger.claims.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn test_relinquish_releases_claimed_share() {
        let mut ledger = world();
        let mut events = Vec::new();
        let id = create_claim(&mut ledger, &geometry(), square(), Date::default(), &mut events).unwrap();

        assert!(relinquish_claim(&mut ledger, id, Date::default(), &mut events));
        assert!(!relinquish_claim(&mut ledger, id, Date::default(), &mut events));

        assert_eq!(ledger.country("AAA").unwrap().claimed_by_player_percent.get(), 0.0);
        assert!(ledger.claims.is_empty());
    }

    #[test]
    fn test_seize_requires_occupation() {
        let mut ledger = WorldBuilder::new().with_country("AAA").build_ledger();
        let geo = StubGeometry::new()
            .with_country_area("AAA", 10_000.0)
            .with_overlap("AAA", 2_000.0);
        let date = Date::default();
        let mut events = Vec::new();
        let id = create_claim(&mut ledger, &geo, square(), date, &mut events).unwrap();
        let territory = ledger.player.territory_km2;

        assert!(seize_claim(&mut ledger, id, date, &mut events).is_err());

        let war = ledger.open_war("PLY", "AAA", WarOrigin::Declaration, date);
        ledger.war_mut(war).unwrap().add_occupation("PLY", 10.0);
        assert!(seize_claim(&mut ledger, id, date, &mut events).is_err());

        ledger.war_mut(war).unwrap().add_occupation("PLY", 15.0);
        let seized = seize_claim(&mut ledger, id, date, &mut events).unwrap();

        assert_eq!(seized, 2_000.0);
        assert_eq!(ledger.player.territory_km2, territory + 2_000.0);
        let aaa = ledger.country("AAA").unwrap();
        assert_eq!(aaa.territory_lost_percent.get(), 20.0);
        assert_eq!(aaa.claimed_by_player_percent.get(), 0.0);
        assert!(aaa.has_modifier(CountryModifier::Revanchist));
        assert!(ledger.claims.is_empty());
        assert_eq!(events.last().map(|e| e.kind()), Some("territory_transferred"));
    }

    #[test]
    fn test_demand_accepted_transfers_land() {
        let mut ledger = world();
        let mut crises = CrisisEngine::new();
        let date = Date::default();
        let mut events = Vec::new();
        let id = create_claim(&mut ledger, &geometry(), square(), date, &mut events).unwrap();
        ledger.player.soldiers = 200_000;

        let ceded =
            demand_territory(&mut ledger, &mut crises, id, date, &mut StepRng::new(0, 0), &mut events)
                .unwrap();

        assert!(ceded);
        assert!(ledger.claims.is_empty());
        assert_eq!(
            ledger.country("AAA").unwrap().relations.get(),
            CLAIM_RELATIONS_PENALTY + CESSION_RELATIONS_PENALTY
        );
        assert_eq!(crises.active_count(), 0);
    }

    #[test]
    fn test_refused_demand_opens_dispute() {
        let mut ledger = world();
        let mut crises = CrisisEngine::new();
        let date = Date::default();
        let mut events = Vec::new();
        let id = create_claim(&mut ledger, &geometry(), square(), date, &mut events).unwrap();

        let ceded = demand_territory(
            &mut ledger,
            &mut crises,
            id,
            date,
            &mut StepRng::new(u64::MAX, 0),
            &mut events,
        )
        .unwrap();

        assert!(!ceded);
        assert!(ledger.claims.contains_key(&id));
        let crisis_id = crises.active_crisis_for("AAA").expect("dispute should open");
        let crisis = crises.get(crisis_id).unwrap();
        assert_eq!(crisis.kind, CrisisKind::TerritorialDispute);
        assert_eq!(crisis.instigator, "PLY");
        assert!(events.iter().any(|e| e.kind() == "territorial_demand_refused"));
    }

    #[test]
    fn test_cession_chance() {
        assert_eq!(cession_chance(10.0, 10.0, 0.0), 0.0);
        assert_eq!(cession_chance(30.0, 10.0, 0.0), MAX_CESSION_CHANCE);
        assert_eq!(cession_chance(10.0, 0.0, -100.0), MAX_CESSION_CHANCE);
        assert!((cession_chance(15.0, 10.0, 20.0) - 0.35).abs() < 1e-9);
    }
}
