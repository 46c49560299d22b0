//! Victory conditions and achievements.
//!
//! Both evaluators are pure functions. Victory reads streak counters that
//! reset the first month a condition fails ([`VictoryTracker`]); achievements
//! read cumulative counters that never go down ([`AchievementParams`]).

use crate::defines::victory as defines;
use crate::events::GameEvent;
use crate::ledger::WorldAggregate;
use crate::state::WarOrigin;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VictoryKind {
    /// Control 40% of the world's land
    Domination,
    /// Top power for 120 consecutive months
    Hegemony,
    /// Top GDP for 240 consecutive months
    Economic,
    /// Survive 1200 months
    Survival,
}

/// Progress toward one victory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VictoryCondition {
    pub kind: VictoryKind,
    pub achieved: bool,
    pub current: f64,
    pub required: f64,
}

impl VictoryCondition {
    fn new(kind: VictoryKind, current: f64, required: f64) -> Self {
        Self {
            kind,
            achieved: current >= required,
            current,
            required,
        }
    }

    /// Progress in [0, 1].
    pub fn progress(&self) -> f64 {
        if self.required <= 0.0 {
            return 1.0;
        }
        (self.current / self.required).clamp(0.0, 1.0)
    }
}

/// Aggregated world statistics the victory check reads.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VictoryParams {
    /// Player share of world land, in percent
    pub player_territory_percent: f64,
    pub consecutive_months_as_top_power: u32,
    pub consecutive_months_as_top_gdp: u32,
    pub months_survived: u32,
}

/// Evaluates all four victory conditions, in a fixed order.
pub fn check_victory_conditions(params: &VictoryParams) -> Vec<VictoryCondition> {
    vec![
        VictoryCondition::new(
            VictoryKind::Domination,
            params.player_territory_percent,
            defines::DOMINATION_TERRITORY_PERCENT,
        ),
        VictoryCondition::new(
            VictoryKind::Hegemony,
            params.consecutive_months_as_top_power as f64,
            defines::HEGEMONY_MONTHS as f64,
        ),
        VictoryCondition::new(
            VictoryKind::Economic,
            params.consecutive_months_as_top_gdp as f64,
            defines::ECONOMIC_MONTHS as f64,
        ),
        VictoryCondition::new(
            VictoryKind::Survival,
            params.months_survived as f64,
            defines::SURVIVAL_MONTHS as f64,
        ),
    ]
}

/// Month-over-month streaks for the victory check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VictoryTracker {
    pub months_as_top_power: u32,
    pub months_as_top_gdp: u32,
    pub months_survived: u32,
    /// Victories already announced
    pub achieved: BTreeSet<VictoryKind>,
}

impl VictoryTracker {
    /// Advances the streaks by one month. A streak whose condition fails this
    /// month drops back to zero.
    pub fn record_month(&mut self, aggregate: &WorldAggregate) {
        self.months_as_top_power = if aggregate.player_is_top_power() {
            self.months_as_top_power + 1
        } else {
            0
        };
        self.months_as_top_gdp = if aggregate.player_is_top_gdp() {
            self.months_as_top_gdp + 1
        } else {
            0
        };
        self.months_survived += 1;
    }

    pub fn params(&self, player_territory_percent: f64) -> VictoryParams {
        VictoryParams {
            player_territory_percent,
            consecutive_months_as_top_power: self.months_as_top_power,
            consecutive_months_as_top_gdp: self.months_as_top_gdp,
            months_survived: self.months_survived,
        }
    }

    /// Victories reached for the first time. Each is reported once.
    pub fn newly_achieved(&mut self, conditions: &[VictoryCondition]) -> Vec<VictoryKind> {
        conditions
            .iter()
            .filter(|c| c.achieved && self.achieved.insert(c.kind))
            .map(|c| c.kind)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstBlood,
    Warmonger,
    FirstConquest,
    Conqueror,
    Peacemaker,
    Diplomat,
    CrisisManager,
    Warlord,
    Treasurer,
    Veteran,
}

impl AchievementId {
    pub const ALL: [AchievementId; 10] = [
        AchievementId::FirstBlood,
        AchievementId::Warmonger,
        AchievementId::FirstConquest,
        AchievementId::Conqueror,
        AchievementId::Peacemaker,
        AchievementId::Diplomat,
        AchievementId::CrisisManager,
        AchievementId::Warlord,
        AchievementId::Treasurer,
        AchievementId::Veteran,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AchievementId::FirstBlood => "First Blood",
            AchievementId::Warmonger => "Warmonger",
            AchievementId::FirstConquest => "First Conquest",
            AchievementId::Conqueror => "Conqueror",
            AchievementId::Peacemaker => "Peacemaker",
            AchievementId::Diplomat => "Diplomat",
            AchievementId::CrisisManager => "Crisis Manager",
            AchievementId::Warlord => "Warlord",
            AchievementId::Treasurer => "Treasurer",
            AchievementId::Veteran => "Veteran",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AchievementId::FirstBlood => "Declare your first war",
            AchievementId::Warmonger => "Declare 5 wars",
            AchievementId::FirstConquest => "Annex a country",
            AchievementId::Conqueror => "Annex 5 countries",
            AchievementId::Peacemaker => "Sign 5 peace treaties",
            AchievementId::Diplomat => "Sign 10 agreements",
            AchievementId::CrisisManager => "Resolve 5 crises peacefully",
            AchievementId::Warlord => "Win 10 battles",
            AchievementId::Treasurer => "Hold 10,000 in the treasury",
            AchievementId::Veteran => "Survive 120 months",
        }
    }

    fn is_met(&self, p: &AchievementParams) -> bool {
        match self {
            AchievementId::FirstBlood => p.wars_declared >= 1,
            AchievementId::Warmonger => p.wars_declared >= 5,
            AchievementId::FirstConquest => p.countries_annexed >= 1,
            AchievementId::Conqueror => p.countries_annexed >= 5,
            AchievementId::Peacemaker => p.peace_treaties >= 5,
            AchievementId::Diplomat => p.agreements_signed >= 10,
            AchievementId::CrisisManager => p.crises_defused >= 5,
            AchievementId::Warlord => p.battles_won >= 10,
            AchievementId::Treasurer => p.treasury >= 10_000.0,
            AchievementId::Veteran => p.months_survived >= 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub name: String,
    pub description: String,
}

impl From<AchievementId> for Achievement {
    fn from(id: AchievementId) -> Self {
        Self {
            id,
            name: id.name().to_string(),
            description: id.description().to_string(),
        }
    }
}

/// Cumulative counters. They only ever go up (the treasury is a snapshot).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AchievementParams {
    pub wars_declared: u32,
    pub countries_annexed: u32,
    pub peace_treaties: u32,
    pub agreements_signed: u32,
    pub crises_defused: u32,
    pub battles_won: u32,
    pub treasury: f64,
    pub months_survived: u32,
}

impl AchievementParams {
    /// Counts whatever `event` contributes to the player's record.
    pub fn observe(&mut self, event: &GameEvent, player: &str) {
        match event {
            GameEvent::WarDeclared {
                attacker, origin, ..
            } if attacker == player && matches!(origin, WarOrigin::Declaration) => {
                self.wars_declared += 1;
            }
            GameEvent::CountryAnnexed {
                annexer: Some(annexer),
                ..
            } if annexer == player => self.countries_annexed += 1,
            GameEvent::PeaceSigned {
                attacker, defender, ..
            } if attacker == player || defender == player => self.peace_treaties += 1,
            GameEvent::AgreementSigned { parties, .. }
                if parties.0 == player || parties.1 == player =>
            {
                self.agreements_signed += 1
            }
            GameEvent::CrisisResolved {
                outcome: crate::crisis::CrisisOutcome::Peaceful,
                ..
            } => self.crises_defused += 1,
            GameEvent::BattleFought {
                attacker,
                occupation_delta,
                ..
            } if attacker == player && *occupation_delta > 0.0 => self.battles_won += 1,
            _ => {}
        }
    }
}

/// Achievements newly met by `params`. Already unlocked ids are skipped
/// without being evaluated.
pub fn check_achievements(
    params: &AchievementParams,
    unlocked: &BTreeSet<AchievementId>,
) -> Vec<Achievement> {
    AchievementId::ALL
        .iter()
        .filter(|id| !unlocked.contains(id))
        .filter(|id| id.is_met(params))
        .map(|&id| Achievement::from(id))
        .collect()
}
