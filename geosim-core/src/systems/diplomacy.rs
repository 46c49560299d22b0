//! Diplomacy: agreements, war and peace, tariffs, covert and support actions.
//!
//! All of these act between the player and one AI country, except
//! [`declare_war`] which any two parties can use (AI-vs-AI wars and alliance
//! responses go through it too).

use super::alliance::run_alliance_response;
use super::roll;
use crate::config::SimConfig;
use crate::defines::{agreements, economy, relations};
use crate::error::ActionError;
use crate::events::GameEvent;
use crate::ledger::NationLedger;
use crate::state::{AgreementKind, Date, Disposition, Personality, TariffLevel, WarId, WarOrigin};
use rand::Rng;
use tracing::instrument;

/// Minimum relations score for a country to consider an agreement.
pub fn acceptance_threshold(kind: AgreementKind) -> f64 {
    match kind {
        AgreementKind::MilitaryAlliance => agreements::ALLIANCE_THRESHOLD,
        AgreementKind::SecurityGuarantee => agreements::GUARANTEE_THRESHOLD,
        AgreementKind::NonAggression => agreements::NON_AGGRESSION_THRESHOLD,
        AgreementKind::TradeAgreement => agreements::TRADE_THRESHOLD,
    }
}

/// Chance that a country with `score` relations accepts `kind`.
///
/// Zero below the threshold. Alliances and guarantees are certain once the
/// threshold is met; the cheaper agreements ramp up from there.
pub fn acceptance_chance(kind: AgreementKind, score: f64, personality: Personality) -> f64 {
    let threshold = acceptance_threshold(kind);
    if score < threshold {
        return 0.0;
    }
    let chance = match kind {
        AgreementKind::MilitaryAlliance | AgreementKind::SecurityGuarantee => 1.0,
        AgreementKind::NonAggression => 0.6 + score / 50.0,
        AgreementKind::TradeAgreement => {
            let base = 0.5 + (score - threshold) / 40.0;
            if personality == Personality::Isolationist {
                base * 0.5
            } else {
                base
            }
        }
    };
    chance.clamp(0.0, 1.0)
}

/// Player proposes an agreement to `code`. Returns whether it was accepted.
///
/// Accepted: the agreement is recorded for both parties and relations +5.
/// Rejected: relations unchanged, and repeat proposals of the same kind are
/// suppressed for `proposal_cooldown_days`.
pub fn propose_agreement<R: Rng + ?Sized>(
    ledger: &mut NationLedger,
    config: &SimConfig,
    code: &str,
    kind: AgreementKind,
    date: Date,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> bool {
    let player = ledger.player_code().to_string();
    if code == player {
        return false;
    }
    if let Some(until) = ledger.proposal_blocked_until(code, kind) {
        if date < until {
            log::debug!("Proposal of {:?} to {} on cooldown until {}", kind, code, until);
            return false;
        }
    }

    let country = ledger.country_or_init(code);
    if country.is_annexed {
        return false;
    }
    let score = country.relations.get();
    let personality = country.personality;

    if ledger.is_at_war(code) || ledger.has_agreement(&player, code, kind) {
        return false;
    }

    let chance = acceptance_chance(kind, score, personality);
    if roll(rng, chance) {
        ledger.sign_agreement(kind, &player, code, date);
        ledger.set_relations(code, relations::AGREEMENT_ACCEPTED_BONUS);
        log::info!("{} accepted {:?} (relations {:.0})", code, kind, score);
        events.push(GameEvent::AgreementSigned {
            date,
            kind,
            parties: (player, code.to_string()),
        });
        true
    } else {
        ledger.block_proposal(code, kind, date.add_days(config.proposal_cooldown_days));
        events.push(GameEvent::AgreementRejected {
            date,
            code: code.to_string(),
            kind,
        });
        false
    }
}

/// Player tears up an agreement. Relations -10.
pub fn break_agreement(
    ledger: &mut NationLedger,
    code: &str,
    kind: AgreementKind,
    date: Date,
    events: &mut Vec<GameEvent>,
) -> bool {
    let player = ledger.player_code().to_string();
    if !ledger.remove_agreement(&player, code, kind) {
        return false;
    }
    ledger.set_relations(code, relations::AGREEMENT_BROKEN_PENALTY);
    events.push(GameEvent::AgreementVoided {
        date,
        kind,
        parties: (player, code.to_string()),
    });
    true
}

/// Declares war between two parties.
///
/// Voids every agreement between them, opens the war record, and runs the
/// alliance response for the defender's allies. If the pair is already at
/// war the existing war is returned and nothing else happens. Returns `None`
/// when either side is annexed or both sides are the same party.
#[instrument(skip_all, name = "declare_war", fields(attacker = %attacker, defender = %defender))]
pub fn declare_war<R: Rng + ?Sized>(
    ledger: &mut NationLedger,
    attacker: &str,
    defender: &str,
    origin: WarOrigin,
    date: Date,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> Option<WarId> {
    if attacker == defender || ledger.is_annexed(attacker) || ledger.is_annexed(defender) {
        return None;
    }
    if let Some(existing) = ledger.active_war_between(attacker, defender) {
        return Some(existing);
    }
    for party in [attacker, defender] {
        if !ledger.is_player(party) {
            ledger.country_or_init(party);
        }
    }

    for voided in ledger.void_agreements_between(attacker, defender) {
        events.push(GameEvent::AgreementVoided {
            date,
            kind: voided.kind,
            parties: voided.parties,
        });
    }

    let war_id = ledger.open_war(attacker, defender, origin.clone(), date);
    log::info!("{} declared war on {} ({:?})", attacker, defender, origin);
    events.push(GameEvent::WarDeclared {
        date,
        war_id,
        attacker: attacker.to_string(),
        defender: defender.to_string(),
        origin: origin.clone(),
    });

    if origin == WarOrigin::Declaration {
        if ledger.is_player(attacker) {
            ledger.set_relations(defender, relations::WAR_DECLARED_PENALTY);
        } else if ledger.is_player(defender) {
            ledger.set_relations(attacker, relations::WAR_DECLARED_PENALTY);
        }
    }

    // Allies joining do not pull in their own allies.
    if !matches!(origin, WarOrigin::AllianceResponse { .. }) {
        run_alliance_response(ledger, war_id, date, rng, events);
    }

    Some(war_id)
}

/// Ends a war. Occupation already converted to territory is not reversed.
pub fn conclude_war(
    ledger: &mut NationLedger,
    war_id: WarId,
    date: Date,
    events: &mut Vec<GameEvent>,
) -> bool {
    let Some(war) = ledger.war(war_id) else {
        return false;
    };
    let (attacker, defender) = (war.attacker.clone(), war.defender.clone());
    if !ledger.end_war(war_id, date) {
        return false;
    }
    log::info!("Peace between {} and {}", attacker, defender);
    events.push(GameEvent::PeaceSigned {
        date,
        war_id,
        attacker,
        defender,
    });
    true
}

/// Player makes peace with `code`.
pub fn make_peace(
    ledger: &mut NationLedger,
    code: &str,
    date: Date,
    events: &mut Vec<GameEvent>,
) -> bool {
    let player = ledger.player_code().to_string();
    match ledger.active_war_between(&player, code) {
        Some(war_id) => conclude_war(ledger, war_id, date, events),
        None => false,
    }
}

/// Sets the player's tariff on `code`'s goods. Returns whether the level
/// changed.
pub fn set_tariff(
    ledger: &mut NationLedger,
    code: &str,
    level: TariffLevel,
    date: Date,
    events: &mut Vec<GameEvent>,
) -> bool {
    if ledger.is_player(code) {
        return false;
    }
    let country = ledger.country_or_init(code);
    if country.outbound_tariff == level {
        return false;
    }
    country.outbound_tariff = level;
    events.push(GameEvent::TariffChanged {
        date,
        code: code.to_string(),
        retaliation: false,
        level,
    });
    true
}

/// Monthly tariff effects: embargo relation drift and AI retaliation.
#[instrument(skip_all, name = "tariffs")]
pub fn run_tariff_tick<R: Rng + ?Sized>(
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

        if country.outbound_tariff == TariffLevel::Embargo
            || country.inbound_tariff == TariffLevel::Embargo
        {
            country.relations.add(relations::EMBARGO_MONTHLY_DRIFT);
        }

        if country.outbound_tariff.is_hostile()
            && country.inbound_tariff < country.outbound_tariff
            && roll(rng, config.tariff_retaliation_chance)
        {
            country.inbound_tariff = country.inbound_tariff.raised();
            log::debug!("{} retaliates with {:?} tariffs", code, country.inbound_tariff);
            events.push(GameEvent::TariffChanged {
                date,
                code: code.clone(),
                retaliation: true,
                level: country.inbound_tariff,
            });
        }
    }
}

/// Player covertly funds separatists in `code`.
///
/// Costs treasury; raises unrest and erodes authority. May be exposed, which
/// costs relations and reputation. Returns `false` if unaffordable or the
/// target is gone.
pub fn fund_separatists<R: Rng + ?Sized>(
    ledger: &mut NationLedger,
    code: &str,
    date: Date,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> Result<bool, ActionError> {
    let cost = economy::SEPARATIST_FUNDING_COST;
    if ledger.is_player(code) || ledger.country_or_init(code).is_annexed {
        return Ok(false);
    }
    if ledger.player.treasury < cost {
        return Err(ActionError::InsufficientFunds {
            required: cost,
            available: ledger.player.treasury,
        });
    }

    ledger.player.treasury -= cost;
    let country = ledger.country_or_init(code);
    country.unrest_level = (country.unrest_level + 15.0).min(100.0);
    country.authority = (country.authority - 5.0).max(0.0);

    let exposed = roll(rng, 0.3);
    if exposed {
        country.relations.add(-20.0);
        ledger.player.reputation.add(-5.0);
        log::info!("Separatist funding in {} was exposed", code);
    }
    events.push(GameEvent::SeparatistsFunded {
        date,
        code: code.to_string(),
        exposed,
    });
    Ok(true)
}

/// Player asks a friendly country for troops. Returns soldiers granted.
///
/// Only friendly countries not at war give anything. The grant scales with
/// how far relations exceed the friendly threshold, doubles for military
/// allies, and never exceeds 10% of the donor's army.
pub fn request_support(
    ledger: &mut NationLedger,
    code: &str,
    date: Date,
    events: &mut Vec<GameEvent>,
) -> u64 {
    if ledger.disposition(code) != Some(Disposition::Friendly) {
        return 0;
    }
    if !ledger.active_wars_of(code).is_empty() {
        return 0;
    }
    let player = ledger.player_code().to_string();
    let allied = ledger.has_agreement(&player, code, AgreementKind::MilitaryAlliance);

    let Some(country) = ledger.country_mut(code) else {
        return 0;
    };
    let surplus = (country.relations.get() - relations::FRIENDLY_ABOVE).max(0.0);
    let mut share = surplus / 500.0;
    if allied {
        share *= 2.0;
    }
    let granted = ((country.soldiers as f64 * share.min(0.1)) as u64).min(country.soldiers);
    if granted == 0 {
        return 0;
    }

    country.soldiers -= granted;
    country.relations.add(-5.0);
    country.recompute_power();
    ledger.player.soldiers += granted;

    events.push(GameEvent::SupportGranted {
        date,
        code: code.to_string(),
        soldiers: granted,
    });
    granted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::WorldBuilder;
    use rand::rngs::mock::StepRng;

    fn always() -> StepRng {
        StepRng::new(0, 0)
    }

    fn never() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn test_alliance_at_80_is_guaranteed() {
        let mut ledger = WorldBuilder::new()
            .with_country_relations("XXX", 80.0)
            .build_ledger();
        let mut events = Vec::new();

        // Even the least favorable roll accepts.
        let accepted = propose_agreement(
            &mut ledger,
            &SimConfig::default(),
            "XXX",
            AgreementKind::MilitaryAlliance,
            Date::default(),
            &mut never(),
            &mut events,
        );

        assert!(accepted);
        assert!(ledger.has_agreement("PLY", "XXX", AgreementKind::MilitaryAlliance));
        assert!(ledger.has_agreement("XXX", "PLY", AgreementKind::MilitaryAlliance));
        assert!(ledger.country("XXX").unwrap().allies.contains("PLY"));
        assert_eq!(ledger.country("XXX").unwrap().relations.get(), 85.0);
    }

    #[test]
    fn test_alliance_below_threshold_rejected_with_cooldown() {
        let mut ledger = WorldBuilder::new()
            .with_country_relations("XXX", 69.0)
            .build_ledger();
        let config = SimConfig::default();
        let mut events = Vec::new();
        let date = Date::default();

        let accepted = propose_agreement(
            &mut ledger,
            &config,
            "XXX",
            AgreementKind::MilitaryAlliance,
            date,
            &mut always(),
            &mut events,
        );

        assert!(!accepted);
        assert_eq!(ledger.country("XXX").unwrap().relations.get(), 69.0);
        assert_eq!(
            ledger.proposal_blocked_until("XXX", AgreementKind::MilitaryAlliance),
            Some(date.add_days(config.proposal_cooldown_days))
        );

        // Raise relations; the cooldown still suppresses the proposal.
        ledger.set_relations("XXX", 20.0);
        assert!(!propose_agreement(
            &mut ledger,
            &config,
            "XXX",
            AgreementKind::MilitaryAlliance,
            date.add_days(10),
            &mut always(),
            &mut events,
        ));

        // After the cooldown it goes through.
        assert!(propose_agreement(
            &mut ledger,
            &config,
            "XXX",
            AgreementKind::MilitaryAlliance,
            date.add_days(config.proposal_cooldown_days),
            &mut always(),
            &mut events,
        ));
    }

    #[test]
    fn test_acceptance_thresholds() {
        let p = Personality::Defensive;
        assert_eq!(acceptance_chance(AgreementKind::TradeAgreement, -11.0, p), 0.0);
        assert!(acceptance_chance(AgreementKind::TradeAgreement, -10.0, p) > 0.0);
        assert_eq!(acceptance_chance(AgreementKind::NonAggression, -1.0, p), 0.0);
        assert!(acceptance_chance(AgreementKind::NonAggression, 0.0, p) > 0.0);
        assert_eq!(acceptance_chance(AgreementKind::MilitaryAlliance, 70.0, p), 1.0);
        assert!(
            acceptance_chance(AgreementKind::TradeAgreement, 0.0, Personality::Isolationist)
                < acceptance_chance(AgreementKind::TradeAgreement, 0.0, p)
        );
    }

    #[test]
    fn test_war_voids_agreements_and_sets_at_war() {
        let mut ledger = WorldBuilder::new()
            .with_country_relations("XXX", 60.0)
            .with_agreement("PLY", "XXX", AgreementKind::TradeAgreement)
            .with_agreement("PLY", "XXX", AgreementKind::NonAggression)
            .build_ledger();
        let mut events = Vec::new();

        let war = declare_war(
            &mut ledger,
            "PLY",
            "XXX",
            WarOrigin::Declaration,
            Date::default(),
            &mut never(),
            &mut events,
        );

        assert!(war.is_some());
        assert!(ledger.agreements_between("PLY", "XXX").is_empty());
        assert_eq!(ledger.disposition("XXX"), Some(Disposition::AtWar));
        assert!(ledger.is_at_war("XXX"));
        assert_eq!(ledger.country("XXX").unwrap().relations.get(), 20.0);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::AgreementVoided { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_declare_war_twice_returns_same_war() {
        let mut ledger = WorldBuilder::new().with_country("XXX").build_ledger();
        let mut events = Vec::new();
        let date = Date::default();

        let first = declare_war(&mut ledger, "PLY", "XXX", WarOrigin::Declaration, date, &mut never(), &mut events);
        let second = declare_war(&mut ledger, "XXX", "PLY", WarOrigin::Declaration, date, &mut never(), &mut events);

        assert_eq!(first, second);
        assert_eq!(ledger.wars().count(), 1);
    }

    #[test]
    fn test_make_peace_restores_disposition() {
        let mut ledger = WorldBuilder::new()
            .with_country_relations("XXX", -50.0)
            .with_war("PLY", "XXX")
            .build_ledger();
        let mut events = Vec::new();

        assert!(make_peace(&mut ledger, "XXX", Date::default(), &mut events));
        assert_eq!(ledger.disposition("XXX"), Some(Disposition::Hostile));
        assert!(!make_peace(&mut ledger, "XXX", Date::default(), &mut events));
    }

    #[test]
    fn test_embargo_drags_relations_and_triggers_retaliation() {
        let mut ledger = WorldBuilder::new()
            .with_country_relations("XXX", 10.0)
            .build_ledger();
        let mut events = Vec::new();
        let date = Date::default();

        assert!(set_tariff(&mut ledger, "XXX", TariffLevel::Embargo, date, &mut events));
        assert!(!set_tariff(&mut ledger, "XXX", TariffLevel::Embargo, date, &mut events));
        run_tariff_tick(&mut ledger, &SimConfig::default(), date, &mut always(), &mut events);

        let xxx = ledger.country("XXX").unwrap();
        assert_eq!(xxx.relations.get(), 8.0);
        assert_eq!(xxx.inbound_tariff, TariffLevel::High);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::TariffChanged { retaliation: true, .. })));
    }

    #[test]
    fn test_fund_separatists_requires_budget() {
        let mut ledger = WorldBuilder::new().with_country("XXX").build_ledger();
        ledger.player.treasury = 100.0;
        let mut events = Vec::new();

        let result = fund_separatists(&mut ledger, "XXX", Date::default(), &mut never(), &mut events);

        assert!(matches!(result, Err(ActionError::InsufficientFunds { .. })));
        assert_eq!(ledger.player.treasury, 100.0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_fund_separatists_raises_unrest() {
        let mut ledger = WorldBuilder::new().with_country("XXX").build_ledger();
        ledger.player.treasury = 1000.0;
        let before = ledger.country("XXX").unwrap().unrest_level;
        let mut events = Vec::new();

        let result = fund_separatists(&mut ledger, "XXX", Date::default(), &mut never(), &mut events);

        assert_eq!(result, Ok(true));
        assert_eq!(ledger.player.treasury, 500.0);
        assert_eq!(ledger.country("XXX").unwrap().unrest_level, before + 15.0);
    }

    #[test]
    fn test_request_support_only_from_friends() {
        let mut ledger = WorldBuilder::new()
            .with_country_relations("FRI", 100.0)
            .with_country_relations("NEU", 10.0)
            .build_ledger();
        let mut events = Vec::new();
        let player_before = ledger.player.soldiers;

        assert_eq!(request_support(&mut ledger, "NEU", Date::default(), &mut events), 0);

        let donor_before = ledger.country("FRI").unwrap().soldiers;
        let granted = request_support(&mut ledger, "FRI", Date::default(), &mut events);

        assert_eq!(granted, donor_before / 10);
        assert_eq!(ledger.player.soldiers, player_before + granted);
        assert_eq!(ledger.country("FRI").unwrap().soldiers, donor_before - granted);
    }

    #[test]
    fn test_player_cannot_tariff_itself() {
        let mut ledger = WorldBuilder::new().with_country("AAA").build_ledger();
        let mut events = Vec::new();

        let date = Date::default();

        assert!(!set_tariff(&mut ledger, "PLY", TariffLevel::Embargo, date, &mut events));
        assert!(ledger.country("PLY").is_none());
        assert_eq!(ledger.active_codes(), vec!["AAA".to_string()]);
        assert!(events.is_empty());
    }
}
