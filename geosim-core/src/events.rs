//! Events emitted by the simulation.
//!
//! Every state-changing operation reports what it did as a list of
//! [`GameEvent`]s. The scheduler buffers them; hosts drain the buffer after a
//! tick or stream it through an [`EventLog`](crate::event_log::EventLog).
//!
//! Uses serde's tag format for clean JSONL output:
//! ```json
//! {"type":"war_declared","date":{"year":2025,"month":3,"day":1},...}
//! ```

use crate::crisis::{CrisisAction, CrisisKind, CrisisOutcome};
use crate::state::{
    AgreementKind, ClaimId, CoalitionId, CountryCode, CrisisId, Date, TariffLevel, WarId,
    WarOrigin,
};
use crate::victory::{AchievementId, VictoryKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    WarDeclared {
        date: Date,
        war_id: WarId,
        attacker: CountryCode,
        defender: CountryCode,
        origin: WarOrigin,
    },

    /// An ally of the defender honored its alliance.
    AllyJoinedWar {
        date: Date,
        war_id: WarId,
        ally: CountryCode,
        against: CountryCode,
    },

    /// An ally was asked and stayed out.
    AllyDeclined {
        date: Date,
        ally: CountryCode,
        defender: CountryCode,
    },

    PeaceSigned {
        date: Date,
        war_id: WarId,
        attacker: CountryCode,
        defender: CountryCode,
    },

    BattleFought {
        date: Date,
        war_id: WarId,
        attacker: CountryCode,
        defender: CountryCode,
        occupation_delta: f64,
        attacker_losses: u64,
        defender_losses: u64,
        defense_bonus: f64,
    },

    CountryAnnexed {
        date: Date,
        code: CountryCode,
        #[serde(skip_serializing_if = "Option::is_none")]
        annexer: Option<CountryCode>,
    },

    /// The player nation has been fully occupied.
    PlayerDefeated { date: Date, by: CountryCode },

    AgreementSigned {
        date: Date,
        kind: AgreementKind,
        parties: (CountryCode, CountryCode),
    },

    AgreementRejected {
        date: Date,
        code: CountryCode,
        kind: AgreementKind,
    },

    AgreementVoided {
        date: Date,
        kind: AgreementKind,
        parties: (CountryCode, CountryCode),
    },

    TariffChanged {
        date: Date,
        code: CountryCode,
        /// True when the AI changed its own tariff on the player
        retaliation: bool,
        level: TariffLevel,
    },

    CrisisStarted {
        date: Date,
        crisis_id: CrisisId,
        kind: CrisisKind,
        instigator: CountryCode,
        target: CountryCode,
    },

    CrisisActionTaken {
        date: Date,
        crisis_id: CrisisId,
        /// None when the deadline elapsed
        #[serde(skip_serializing_if = "Option::is_none")]
        actor: Option<CountryCode>,
        action: CrisisAction,
        phase: u8,
    },

    CrisisResolved {
        date: Date,
        crisis_id: CrisisId,
        outcome: CrisisOutcome,
    },

    ElectionHeld {
        date: Date,
        code: CountryCode,
        leader: String,
        incumbent_won: bool,
    },

    Coup {
        date: Date,
        code: CountryCode,
        leader: String,
    },

    SeparatistsFunded {
        date: Date,
        code: CountryCode,
        exposed: bool,
    },

    SupportGranted {
        date: Date,
        code: CountryCode,
        soldiers: u64,
    },

    CoalitionFormed {
        date: Date,
        coalition_id: CoalitionId,
        name: String,
        members: Vec<CountryCode>,
    },

    CoalitionDissolved {
        date: Date,
        coalition_id: CoalitionId,
    },

    ClaimCreated {
        date: Date,
        claim_id: ClaimId,
        targets: Vec<CountryCode>,
    },

    ClaimRelinquished { date: Date, claim_id: ClaimId },

    /// Claimed land changed hands, by force or by demand.
    TerritoryTransferred {
        date: Date,
        claim_id: ClaimId,
        from: CountryCode,
        area_km2: f64,
    },

    TerritorialDemandRefused {
        date: Date,
        claim_id: ClaimId,
        code: CountryCode,
    },

    AchievementUnlocked { date: Date, id: AchievementId },

    VictoryAchieved { date: Date, kind: VictoryKind },
}

impl GameEvent {
    /// Short machine name, matching the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::WarDeclared { .. } => "war_declared",
            GameEvent::AllyJoinedWar { .. } => "ally_joined_war",
            GameEvent::AllyDeclined { .. } => "ally_declined",
            GameEvent::PeaceSigned { .. } => "peace_signed",
            GameEvent::BattleFought { .. } => "battle_fought",
            GameEvent::CountryAnnexed { .. } => "country_annexed",
            GameEvent::PlayerDefeated { .. } => "player_defeated",
            GameEvent::AgreementSigned { .. } => "agreement_signed",
            GameEvent::AgreementRejected { .. } => "agreement_rejected",
            GameEvent::AgreementVoided { .. } => "agreement_voided",
            GameEvent::TariffChanged { .. } => "tariff_changed",
            GameEvent::CrisisStarted { .. } => "crisis_started",
            GameEvent::CrisisActionTaken { .. } => "crisis_action_taken",
            GameEvent::CrisisResolved { .. } => "crisis_resolved",
            GameEvent::ElectionHeld { .. } => "election_held",
            GameEvent::Coup { .. } => "coup",
            GameEvent::SeparatistsFunded { .. } => "separatists_funded",
            GameEvent::SupportGranted { .. } => "support_granted",
            GameEvent::CoalitionFormed { .. } => "coalition_formed",
            GameEvent::CoalitionDissolved { .. } => "coalition_dissolved",
            GameEvent::ClaimCreated { .. } => "claim_created",
            GameEvent::ClaimRelinquished { .. } => "claim_relinquished",
            GameEvent::TerritoryTransferred { .. } => "territory_transferred",
            GameEvent::TerritorialDemandRefused { .. } => "territorial_demand_refused",
            GameEvent::AchievementUnlocked { .. } => "achievement_unlocked",
            GameEvent::VictoryAchieved { .. } => "victory_achieved",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = GameEvent::PeaceSigned {
            date: Date::new(2025, 3, 1),
            war_id: 4,
            attacker: "AAA".into(),
            defender: "BBB".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.starts_with(r#"{"type":"peace_signed""#), "{json}");

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], event.kind());
    }

    #[test]
    fn test_optional_fields_skipped() {
        let event = GameEvent::CountryAnnexed {
            date: Date::default(),
            code: "AAA".into(),
            annexer: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("annexer"));
    }
}
