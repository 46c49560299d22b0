//! Crisis Engine: escalation state machine for disputes short of war.
//!
//! A crisis runs through five ordinal phases. Participants act with
//! [`CrisisAction`]s that are legal only in certain phases; an elapsed
//! deadline escalates one phase on its own. Phase 5 is terminal and means
//! war, which is declared through the ledger like any other war.
//!
//! Every crisis has the player on one side. Relations effects land on the AI
//! participant's score toward the player; reputation effects land on whoever
//! acted.

use crate::ai::policy_for;
use crate::bounded::Percent;
use crate::config::SimConfig;
use crate::defines::crisis as defs;
use crate::error::ActionError;
use crate::events::GameEvent;
use crate::ledger::NationLedger;
use crate::state::{CountryCode, CountryModifier, CrisisId, Date, TariffLevel, WarOrigin};
use crate::systems::diplomacy::declare_war;
use crate::systems::roll;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrisisKind {
    BorderIncident,
    TerritorialDispute,
    TradeWar,
}

impl CrisisKind {
    /// War risk added by each escalation.
    pub fn escalation_rate(&self) -> f64 {
        match self {
            CrisisKind::BorderIncident => 15.0,
            CrisisKind::TerritorialDispute => 20.0,
            CrisisKind::TradeWar => 10.0,
        }
    }

    pub fn initial_risk(&self) -> f64 {
        match self {
            CrisisKind::BorderIncident => 10.0,
            CrisisKind::TerritorialDispute => 20.0,
            CrisisKind::TradeWar => 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisPhase {
    Incident = 1,
    Demands = 2,
    Ultimatum = 3,
    Mobilization = 4,
    War = 5,
}

impl CrisisPhase {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(CrisisPhase::Incident),
            2 => Some(CrisisPhase::Demands),
            3 => Some(CrisisPhase::Ultimatum),
            4 => Some(CrisisPhase::Mobilization),
            5 => Some(CrisisPhase::War),
            _ => None,
        }
    }

    /// Saturates at War.
    pub fn next(self) -> Self {
        Self::from_number(self.number() + 1).unwrap_or(CrisisPhase::War)
    }

    /// Saturates at Incident.
    pub fn previous(self) -> Self {
        Self::from_number(self.number().saturating_sub(1)).unwrap_or(CrisisPhase::Incident)
    }

    /// Days allowed in this phase before it escalates. War has no deadline.
    pub fn deadline_days(self) -> Option<u32> {
        match self {
            CrisisPhase::War => None,
            other => Some(defs::PHASE_DEADLINE_DAYS[other.number() as usize - 1]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrisisAction {
    BackDown,
    HoldFirm,
    Escalate,
    SeekMediation,
    ProposeSummit,
    Mobilize,
    DeclareWar,
}

impl CrisisAction {
    pub const ALL: [CrisisAction; 7] = [
        CrisisAction::BackDown,
        CrisisAction::HoldFirm,
        CrisisAction::Escalate,
        CrisisAction::SeekMediation,
        CrisisAction::ProposeSummit,
        CrisisAction::Mobilize,
        CrisisAction::DeclareWar,
    ];

    /// Whether the action may be taken in `phase` of an active crisis.
    pub fn is_legal_in(self, phase: CrisisPhase) -> bool {
        let n = phase.number();
        match self {
            CrisisAction::BackDown
            | CrisisAction::HoldFirm
            | CrisisAction::Escalate
            | CrisisAction::Mobilize => n <= 4,
            CrisisAction::SeekMediation => n <= 3,
            CrisisAction::ProposeSummit => (2..=3).contains(&n),
            CrisisAction::DeclareWar => n == 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisOutcome {
    Peaceful,
    War,
    /// A participant was annexed while the crisis ran
    Conquered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisStatus {
    Active,
    Resolved(CrisisOutcome),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationEntry {
    /// Phase the action was taken in
    pub phase: CrisisPhase,
    pub action: CrisisAction,
    /// None for deadline escalations
    pub actor: Option<CountryCode>,
    pub date: Date,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiplomaticCrisis {
    pub id: CrisisId,
    pub kind: CrisisKind,
    pub instigator: CountryCode,
    pub target: CountryCode,
    pub phase: CrisisPhase,
    pub war_risk: Percent,
    pub deadline: Option<Date>,
    pub history: Vec<EscalationEntry>,
    pub status: CrisisStatus,
    pub started: Date,
}

impl DiplomaticCrisis {
    pub fn is_active(&self) -> bool {
        self.status == CrisisStatus::Active
    }

    pub fn outcome(&self) -> Option<CrisisOutcome> {
        match self.status {
            CrisisStatus::Resolved(outcome) => Some(outcome),
            CrisisStatus::Active => None,
        }
    }

    pub fn involves(&self, code: &str) -> bool {
        self.instigator == code || self.target == code
    }

    pub fn opponent_of(&self, code: &str) -> Option<&CountryCode> {
        if self.instigator == code {
            Some(&self.target)
        } else if self.target == code {
            Some(&self.instigator)
        } else {
            None
        }
    }

    pub fn is_legal(&self, action: CrisisAction) -> bool {
        self.is_active() && action.is_legal_in(self.phase)
    }

    pub fn legal_actions(&self) -> Vec<CrisisAction> {
        CrisisAction::ALL
            .into_iter()
            .filter(|&a| self.is_legal(a))
            .collect()
    }
}

/// Owns every crisis, active and resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrisisEngine {
    crises: BTreeMap<CrisisId, DiplomaticCrisis>,
    next_id: CrisisId,
}

impl Default for CrisisEngine {
    fn default() -> Self {
        Self {
            crises: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl CrisisEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: CrisisId) -> Option<&DiplomaticCrisis> {
        self.crises.get(&id)
    }

    pub fn crises(&self) -> impl Iterator<Item = &DiplomaticCrisis> {
        self.crises.values()
    }

    pub fn active(&self) -> impl Iterator<Item = &DiplomaticCrisis> {
        self.crises.values().filter(|c| c.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn active_crisis_for(&self, code: &str) -> Option<CrisisId> {
        self.active().find(|c| c.involves(code)).map(|c| c.id)
    }

    /// Opens a crisis between `instigator` and `target`.
    ///
    /// One side must be the player, neither may be annexed, and neither may
    /// already be in an active crisis with the other.
    pub fn start_crisis(
        &mut self,
        ledger: &mut NationLedger,
        kind: CrisisKind,
        instigator: &str,
        target: &str,
        date: Date,
        events: &mut Vec<GameEvent>,
    ) -> Result<CrisisId, ActionError> {
        if ledger.is_player(instigator) == ledger.is_player(target) {
            return Err(ActionError::ConstraintViolation(format!(
                "crisis between {instigator} and {target} must involve the player exactly once"
            )));
        }
        for party in [instigator, target] {
            if ledger.is_annexed(party) {
                return Err(ActionError::ConstraintViolation(format!("{party} is annexed")));
            }
            if !ledger.is_player(party) {
                ledger.country_or_init(party);
            }
        }
        if self
            .active()
            .any(|c| c.involves(instigator) && c.involves(target))
        {
            return Err(ActionError::ConstraintViolation(format!(
                "{instigator} and {target} are already in a crisis"
            )));
        }

        let id = self.next_id;
        self.next_id += 1;
        let phase = CrisisPhase::Incident;
        self.crises.insert(
            id,
            DiplomaticCrisis {
                id,
                kind,
                instigator: instigator.to_string(),
                target: target.to_string(),
                phase,
                war_risk: Percent::new(kind.initial_risk()),
                deadline: phase.deadline_days().map(|d| date.add_days(d)),
                history: Vec::new(),
                status: CrisisStatus::Active,
                started: date,
            },
        );

        log::info!("Crisis {} ({:?}): {} vs {}", id, kind, instigator, target);
        events.push(GameEvent::CrisisStarted {
            date,
            crisis_id: id,
            kind,
            instigator: instigator.to_string(),
            target: target.to_string(),
        });
        Ok(id)
    }

    /// Applies `action` by `actor` to crisis `id`.
    ///
    /// Illegal actions are rejected with no state change. Returns the status
    /// after the action.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_action<R: Rng + ?Sized>(
        &mut self,
        ledger: &mut NationLedger,
        id: CrisisId,
        actor: &str,
        action: CrisisAction,
        date: Date,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) -> Result<CrisisStatus, ActionError> {
        let crisis = self.crises.get(&id).ok_or(ActionError::CrisisNotFound(id))?;
        if !crisis.involves(actor) {
            return Err(ActionError::NotParticipant {
                crisis: id,
                actor: actor.to_string(),
            });
        }
        if !crisis.is_legal(action) {
            return Err(ActionError::InvalidTransition {
                crisis: id,
                phase: crisis.phase.number(),
                action: format!("{action:?}"),
            });
        }

        self.transition(ledger, id, Some(actor), action, date, rng, events);
        self.crises
            .get(&id)
            .map(|c| c.status)
            .ok_or(ActionError::CrisisNotFound(id))
    }

    /// Performs a legal action. `actor` is None for deadline escalations.
    #[allow(clippy::too_many_arguments)]
    fn transition<R: Rng + ?Sized>(
        &mut self,
        ledger: &mut NationLedger,
        id: CrisisId,
        actor: Option<&str>,
        action: CrisisAction,
        date: Date,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        let Some(crisis) = self.crises.get_mut(&id) else {
            return;
        };
        let ai_party = if ledger.is_player(&crisis.instigator) {
            crisis.target.clone()
        } else {
            crisis.instigator.clone()
        };
        let phase_before = crisis.phase;
        let mut outcome = None;
        let mut war_attacker: Option<CountryCode> = None;

        crisis.history.push(EscalationEntry {
            phase: phase_before,
            action,
            actor: actor.map(str::to_string),
            date,
        });

        match action {
            CrisisAction::BackDown => {
                ledger.set_relations(&ai_party, defs::BACK_DOWN_RELATIONS);
                if let Some(actor) = actor {
                    adjust_reputation(ledger, actor, defs::BACK_DOWN_REPUTATION);
                }
                outcome = Some(CrisisOutcome::Peaceful);
            }
            CrisisAction::HoldFirm => {
                crisis.war_risk.add(defs::HOLD_FIRM_RISK);
            }
            CrisisAction::Escalate => {
                crisis.phase = phase_before.next();
                crisis.war_risk.add(crisis.kind.escalation_rate());
                if crisis.phase == CrisisPhase::War {
                    war_attacker = Some(
                        actor
                            .map(str::to_string)
                            .unwrap_or_else(|| crisis.instigator.clone()),
                    );
                }
            }
            CrisisAction::SeekMediation => {
                crisis.war_risk.add(defs::MEDIATION_RISK);
                if roll(rng, defs::MEDIATION_ROLLBACK_CHANCE) {
                    crisis.phase = phase_before.previous();
                }
            }
            CrisisAction::ProposeSummit => {
                if roll(rng, defs::SUMMIT_SUCCESS_CHANCE) {
                    ledger.set_relations(&ai_party, defs::SUMMIT_RELATIONS_BONUS);
                    outcome = Some(CrisisOutcome::Peaceful);
                }
            }
            CrisisAction::Mobilize => {
                crisis.phase = CrisisPhase::Mobilization;
                crisis.war_risk.add(defs::MOBILIZE_RISK);
            }
            CrisisAction::DeclareWar => {
                crisis.phase = CrisisPhase::War;
                ledger.set_relations(&ai_party, defs::DECLARE_WAR_RELATIONS);
                war_attacker = Some(
                    actor
                        .map(str::to_string)
                        .unwrap_or_else(|| crisis.instigator.clone()),
                );
            }
        }

        if crisis.phase != phase_before {
            crisis.deadline = crisis.phase.deadline_days().map(|d| date.add_days(d));
        }
        if crisis.phase == CrisisPhase::War {
            crisis.war_risk.set(100.0);
            outcome = Some(CrisisOutcome::War);
        }

        events.push(GameEvent::CrisisActionTaken {
            date,
            crisis_id: id,
            actor: actor.map(str::to_string),
            action,
            phase: crisis.phase.number(),
        });

        if let Some(attacker) = war_attacker {
            let defender = crisis
                .opponent_of(&attacker)
                .cloned()
                .unwrap_or_else(|| crisis.target.clone());
            declare_war(
                ledger,
                &attacker,
                &defender,
                WarOrigin::Crisis { crisis_id: id },
                date,
                rng,
                events,
            );
        }

        if let Some(outcome) = outcome {
            self.resolve(id, outcome, date, events);
        }
    }

    fn resolve(&mut self, id: CrisisId, outcome: CrisisOutcome, date: Date, events: &mut Vec<GameEvent>) {
        let Some(crisis) = self.crises.get_mut(&id) else {
            return;
        };
        if !crisis.is_active() {
            return;
        }
        crisis.status = CrisisStatus::Resolved(outcome);
        crisis.deadline = None;
        log::info!("Crisis {} resolved: {:?}", id, outcome);
        events.push(GameEvent::CrisisResolved {
            date,
            crisis_id: id,
            outcome,
        });
    }

    /// Escalates every crisis whose deadline has passed by one phase.
    #[instrument(skip_all, name = "crisis_deadlines")]
    pub fn tick_deadlines<R: Rng + ?Sized>(
        &mut self,
        ledger: &mut NationLedger,
        date: Date,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        let due: Vec<CrisisId> = self
            .active()
            .filter(|c| c.deadline.is_some_and(|d| d <= date))
            .map(|c| c.id)
            .collect();
        for id in due {
            log::debug!("Crisis {} deadline elapsed", id);
            self.transition(ledger, id, None, CrisisAction::Escalate, date, rng, events);
        }
    }

    /// Monthly scan for new crises, in code order.
    #[instrument(skip_all, name = "crisis_scan")]
    pub fn scan_for_crises<R: Rng + ?Sized>(
        &mut self,
        ledger: &mut NationLedger,
        config: &SimConfig,
        date: Date,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        let player = ledger.player_code().to_string();
        for code in ledger.active_codes() {
            if self.active_count() >= config.max_active_crises {
                break;
            }
            if self.active_crisis_for(&code).is_some() || ledger.is_at_war(&code) {
                continue;
            }
            let Some(country) = ledger.country(&code) else {
                continue;
            };

            let kind = if country.aggression >= defs::BORDER_INCIDENT_MIN_AGGRESSION
                && country.relations.get() < defs::BORDER_INCIDENT_RELATIONS
                && roll(rng, config.border_incident_chance)
            {
                Some(CrisisKind::BorderIncident)
            } else if country.has_modifier(CountryModifier::Revanchist)
                && country.territory_lost_percent.get() > defs::TERRITORY_DISPUTE_LOST_PERCENT
                && roll(rng, config.territorial_dispute_chance)
            {
                Some(CrisisKind::TerritorialDispute)
            } else if (country.outbound_tariff == TariffLevel::Embargo
                || country.inbound_tariff == TariffLevel::Embargo)
                && roll(rng, config.trade_war_chance)
            {
                Some(CrisisKind::TradeWar)
            } else {
                None
            };

            if let Some(kind) = kind {
                if let Err(e) = self.start_crisis(ledger, kind, &code, &player, date, events) {
                    log::debug!("Skipped crisis for {}: {}", code, e);
                }
            }
        }
    }

    /// Lets the AI participant of every active crisis act once.
    #[instrument(skip_all, name = "crisis_ai")]
    pub fn run_ai_turn<R: Rng + ?Sized>(
        &mut self,
        ledger: &mut NationLedger,
        date: Date,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        let ids: Vec<CrisisId> = self.active().map(|c| c.id).collect();
        for id in ids {
            let Some(crisis) = self.crises.get(&id) else {
                continue;
            };
            if !crisis.is_active() {
                continue;
            }
            let ai_party = if ledger.is_player(&crisis.instigator) {
                &crisis.target
            } else {
                &crisis.instigator
            };
            let Some(country) = ledger.country(ai_party) else {
                continue;
            };
            let opponent_power = ledger.player.power();
            let mut action = policy_for(country.personality).decide(crisis, country, opponent_power);
            if !crisis.is_legal(action) {
                log::warn!("Policy chose illegal {:?} in crisis {}; holding", action, id);
                action = CrisisAction::HoldFirm;
            }
            let actor = ai_party.clone();
            self.transition(ledger, id, Some(&actor), action, date, rng, events);
        }
    }

    /// Resolves every active crisis involving `code` as conquered.
    pub fn force_resolve(&mut self, code: &str, date: Date, events: &mut Vec<GameEvent>) {
        let ids: Vec<CrisisId> = self
            .active()
            .filter(|c| c.involves(code))
            .map(|c| c.id)
            .collect();
        for id in ids {
            self.resolve(id, CrisisOutcome::Conquered, date, events);
        }
    }
}

fn adjust_reputation(ledger: &mut NationLedger, code: &str, delta: f64) {
    if ledger.is_player(code) {
        ledger.player.reputation.add(delta);
    } else {
        ledger.country_or_init(code).reputation.add(delta);
    }
}

#[cfg(test)]
#[path = "crisis_tests.rs"]
mod tests;
