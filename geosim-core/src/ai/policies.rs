use super::{power_ratio, CrisisPolicy};
use crate::crisis::{CrisisAction, CrisisPhase, DiplomaticCrisis};
use crate::state::Country;

/// Pushes toward war at phase 4, otherwise one more step.
fn press(crisis: &DiplomaticCrisis) -> CrisisAction {
    if crisis.phase == CrisisPhase::Mobilization {
        CrisisAction::DeclareWar
    } else {
        CrisisAction::Escalate
    }
}

/// Mediation where it is still allowed, otherwise back down.
fn de_escalate(crisis: &DiplomaticCrisis) -> CrisisAction {
    if crisis.is_legal(CrisisAction::SeekMediation) {
        CrisisAction::SeekMediation
    } else {
        CrisisAction::BackDown
    }
}

/// Escalates whenever it holds the stronger hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpansionistPolicy;

impl CrisisPolicy for ExpansionistPolicy {
    fn decide(&self, crisis: &DiplomaticCrisis, actor: &Country, opponent_power: f64) -> CrisisAction {
        let ratio = power_ratio(actor, opponent_power);
        if ratio >= 1.2 {
            press(crisis)
        } else if ratio < 0.5 && crisis.phase >= CrisisPhase::Ultimatum {
            de_escalate(crisis)
        } else {
            CrisisAction::HoldFirm
        }
    }
}

/// Looks for mediation; only stands firm at the brink when clearly stronger.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefensivePolicy;

impl CrisisPolicy for DefensivePolicy {
    fn decide(&self, crisis: &DiplomaticCrisis, actor: &Country, opponent_power: f64) -> CrisisAction {
        if crisis.phase == CrisisPhase::Mobilization && power_ratio(actor, opponent_power) >= 1.5 {
            CrisisAction::HoldFirm
        } else {
            de_escalate(crisis)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IsolationistPolicy;

impl CrisisPolicy for IsolationistPolicy {
    fn decide(&self, crisis: &DiplomaticCrisis, _actor: &Country, _opponent_power: f64) -> CrisisAction {
        if crisis.phase == CrisisPhase::Incident {
            CrisisAction::SeekMediation
        } else {
            CrisisAction::BackDown
        }
    }
}

/// Reads the power ratio and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpportunistPolicy;

impl CrisisPolicy for OpportunistPolicy {
    fn decide(&self, crisis: &DiplomaticCrisis, actor: &Country, opponent_power: f64) -> CrisisAction {
        let ratio = power_ratio(actor, opponent_power);
        if ratio >= 1.5 {
            press(crisis)
        } else if ratio >= 0.8 {
            CrisisAction::HoldFirm
        } else {
            de_escalate(crisis)
        }
    }
}

/// Prefers a summit whenever one can be called.
#[derive(Debug, Clone, Copy, Default)]
pub struct TradingPowerPolicy;

impl CrisisPolicy for TradingPowerPolicy {
    fn decide(&self, crisis: &DiplomaticCrisis, _actor: &Country, _opponent_power: f64) -> CrisisAction {
        if crisis.is_legal(CrisisAction::ProposeSummit) {
            CrisisAction::ProposeSummit
        } else {
            de_escalate(crisis)
        }
    }
}

/// Will not back down before the ultimatum.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdeologicalPolicy;

impl CrisisPolicy for IdeologicalPolicy {
    fn decide(&self, crisis: &DiplomaticCrisis, actor: &Country, opponent_power: f64) -> CrisisAction {
        let favored = power_ratio(actor, opponent_power) >= 1.0;
        match crisis.phase {
            CrisisPhase::Incident | CrisisPhase::Demands => CrisisAction::HoldFirm,
            _ if favored => press(crisis),
            _ => de_escalate(crisis),
        }
    }
}
