//! The turn scheduler: one [`Simulation`] owning the whole world.
//!
//! Two cadences drive it. The AI/war cadence ([`Simulation::process_ai_turn`],
//! [`Simulation::process_ai_vs_ai`]) and the economic month
//! ([`Simulation::run_month`]) may interleave in any order; every operation
//! takes `&mut self`, so the borrow checker serializes them. Each call applies
//! all of its mutations before returning, and appends what happened to the
//! event buffer ([`Simulation::drain_events`]).
//!
//! Player actions never fail loudly. Rejections are logged and surface as
//! `false`, `0` or `None`.

use crate::ai::military::considers_war_on_player;
use crate::config::SimConfig;
use crate::crisis::{CrisisAction, CrisisEngine, CrisisKind, CrisisStatus};
use crate::error::ActionError;
use crate::events::GameEvent;
use crate::geometry::{GeoPoint, GeometryService, Polygon};
use crate::input::Command;
use crate::ledger::NationLedger;
use crate::state::{
    AgreementKind, ClaimId, CoalitionId, CoalitionKind, CountryCode, CrisisId, Date, TariffLevel,
    WarOrigin,
};
use crate::systems::economy::{self, BuildingKind, EconomyReport, Infrastructure};
use crate::systems::war::{self, AiWarEvent, Offensive};
use crate::systems::{claims, coalitions, diplomacy, elections, roll};
use crate::victory::{
    check_achievements, check_victory_conditions, Achievement, AchievementId, AchievementParams,
    VictoryCondition, VictoryTracker,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::instrument;

/// What one AI/war tick did against the player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiTurnResult {
    pub offensives: Vec<Offensive>,
    /// Countries that declared war on the player this turn
    pub wars: Vec<CountryCode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiVsAiResult {
    pub events: Vec<AiWarEvent>,
}

/// Summary of one economic month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthReport {
    pub date: Date,
    pub economy: EconomyReport,
    pub victory: Vec<VictoryCondition>,
    pub achievements: Vec<Achievement>,
}

pub struct Simulation {
    config: SimConfig,
    ledger: NationLedger,
    crises: CrisisEngine,
    geometry: Box<dyn GeometryService>,
    rng: StdRng,
    date: Date,
    infrastructure: Infrastructure,
    tracker: VictoryTracker,
    counters: AchievementParams,
    unlocked: BTreeSet<AchievementId>,
    defeated: bool,
    events: Vec<GameEvent>,
}

impl Simulation {
    pub fn new(
        config: SimConfig,
        ledger: NationLedger,
        geometry: Box<dyn GeometryService>,
        date: Date,
    ) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            ledger,
            crises: CrisisEngine::new(),
            geometry,
            rng,
            date,
            infrastructure: Infrastructure::default(),
            tracker: VictoryTracker::default(),
            counters: AchievementParams::default(),
            unlocked: BTreeSet::new(),
            defeated: false,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn ledger(&self) -> &NationLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut NationLedger {
        &mut self.ledger
    }

    pub fn crises(&self) -> &CrisisEngine {
        &self.crises
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn infrastructure(&self) -> &Infrastructure {
        &self.infrastructure
    }

    pub fn tracker(&self) -> &VictoryTracker {
        &self.tracker
    }

    pub fn counters(&self) -> &AchievementParams {
        &self.counters
    }

    pub fn unlocked(&self) -> &BTreeSet<AchievementId> {
        &self.unlocked
    }

    /// True once the player nation has been fully occupied.
    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    /// Player share of the world's land, in percent.
    pub fn player_territory_percent(&self) -> f64 {
        if self.config.world_area_km2 <= 0.0 {
            return 0.0;
        }
        self.ledger.player.territory_km2 / self.config.world_area_km2 * 100.0
    }

    /// Takes every event buffered since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Finishes an operation: resolves crises of annexed countries, updates
    /// the cumulative counters and buffers the events.
    fn commit(&mut self, mut events: Vec<GameEvent>) {
        let annexed: Vec<CountryCode> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::CountryAnnexed { code, .. } => Some(code.clone()),
                _ => None,
            })
            .collect();
        for code in annexed {
            self.crises.force_resolve(&code, self.date, &mut events);
        }

        let player = self.ledger.player_code().to_string();
        for event in &events {
            if matches!(event, GameEvent::PlayerDefeated { .. }) {
                self.defeated = true;
            }
            self.counters.observe(event, &player);
        }
        self.events.extend(events);
    }

    // ------------------------------------------------------------------
    // AI / war cadence
    // ------------------------------------------------------------------

    /// One AI/war tick: crisis moves, offensives against the player and new
    /// declarations of war on the player.
    #[instrument(skip_all, name = "ai_turn")]
    pub fn process_ai_turn(&mut self) -> AiTurnResult {
        let mut events = Vec::new();
        self.crises
            .run_ai_turn(&mut self.ledger, self.date, &mut self.rng, &mut events);

        let offensives = war::run_ai_offensives(
            &mut self.ledger,
            self.geometry.as_ref(),
            &self.config,
            self.date,
            &mut self.rng,
            &mut events,
        );

        let wars = self.ai_declarations(&mut events);
        self.commit(events);
        AiTurnResult { offensives, wars }
    }

    fn ai_declarations(&mut self, events: &mut Vec<GameEvent>) -> Vec<CountryCode> {
        let player = self.ledger.player_code().to_string();
        let mut declared = Vec::new();
        for code in self.ledger.active_codes() {
            let Some(country) = self.ledger.country(&code) else {
                continue;
            };
            let at_war = self.ledger.is_at_war(&code);
            if !considers_war_on_player(country, at_war, self.ledger.player.power()) {
                continue;
            }
            if !roll(&mut self.rng, self.config.ai_war_declaration_chance) {
                continue;
            }
            let war = diplomacy::declare_war(
                &mut self.ledger,
                &code,
                &player,
                WarOrigin::Declaration,
                self.date,
                &mut self.rng,
                events,
            );
            if war.is_some() {
                log::info!("{} declared war on the player", code);
                declared.push(code);
            }
        }
        declared
    }

    /// AI countries fighting each other: new wars, one battle per war, peace.
    pub fn process_ai_vs_ai(&mut self) -> AiVsAiResult {
        let mut events = Vec::new();
        let (summary, _annexed) = war::run_ai_vs_ai(
            &mut self.ledger,
            self.geometry.as_ref(),
            &self.config,
            self.date,
            &mut self.rng,
            &mut events,
        );
        self.commit(events);
        AiVsAiResult { events: summary }
    }

    /// Elections and coups. Results show up as events only.
    pub fn process_elections(&mut self) {
        let mut events = Vec::new();
        elections::run_elections(
            &mut self.ledger,
            &self.config,
            self.date,
            &mut self.rng,
            &mut events,
        );
        self.commit(events);
    }

    // ------------------------------------------------------------------
    // Economic month
    // ------------------------------------------------------------------

    /// Advances the date by one month (30 days) and runs every monthly system.
    #[instrument(skip_all, name = "month")]
    pub fn run_month(&mut self) -> MonthReport {
        self.date = self.date.add_days(Date::DAYS_PER_MONTH);
        let mut events = Vec::new();

        let report = economy::apply_economy(
            &mut self.ledger,
            &self.infrastructure,
            &self.config.economy,
        );
        economy::run_ai_economy_tick(&mut self.ledger);
        diplomacy::run_tariff_tick(
            &mut self.ledger,
            &self.config,
            self.date,
            &mut self.rng,
            &mut events,
        );
        self.crises
            .tick_deadlines(&mut self.ledger, self.date, &mut self.rng, &mut events);
        self.crises.scan_for_crises(
            &mut self.ledger,
            &self.config,
            self.date,
            &mut self.rng,
            &mut events,
        );
        coalitions::run_coalition_tick(&mut self.ledger, self.date, &mut events);

        if !self.defeated {
            self.tracker.record_month(&self.ledger.aggregate());
        }
        let victory = check_victory_conditions(&self.tracker.params(self.player_territory_percent()));
        for kind in self.tracker.newly_achieved(&victory) {
            log::info!("Victory achieved: {:?}", kind);
            events.push(GameEvent::VictoryAchieved {
                date: self.date,
                kind,
            });
        }
        self.commit(events);

        self.counters.treasury = self.ledger.player.treasury;
        self.counters.months_survived = self.tracker.months_survived;
        let achievements = check_achievements(&self.counters, &self.unlocked);
        for achievement in &achievements {
            log::info!("Achievement unlocked: {}", achievement.name);
            self.unlocked.insert(achievement.id);
            self.events.push(GameEvent::AchievementUnlocked {
                date: self.date,
                id: achievement.id,
            });
        }

        log::debug!(
            "Month {}: treasury {:.1}, soldiers {}, {} active crises",
            self.date,
            self.ledger.player.treasury,
            self.ledger.player.soldiers,
            self.crises.active_count()
        );

        MonthReport {
            date: self.date,
            economy: report,
            victory,
            achievements,
        }
    }

    // ------------------------------------------------------------------
    // Player actions
    // ------------------------------------------------------------------

    fn rejected(action: &str, target: &str, e: &ActionError) {
        log::debug!("{} on {} rejected: {}", action, target, e);
    }

    pub fn declare_war(&mut self, code: &str) -> bool {
        if self.ledger.is_player(code) {
            return false;
        }
        let player = self.ledger.player_code().to_string();
        let mut events = Vec::new();
        let war = diplomacy::declare_war(
            &mut self.ledger,
            &player,
            code,
            WarOrigin::Declaration,
            self.date,
            &mut self.rng,
            &mut events,
        );
        self.commit(events);
        war.is_some()
    }

    pub fn make_peace(&mut self, code: &str) -> bool {
        let mut events = Vec::new();
        let ended = diplomacy::make_peace(&mut self.ledger, code, self.date, &mut events);
        self.commit(events);
        ended
    }

    pub fn propose_agreement(&mut self, code: &str, kind: AgreementKind) -> bool {
        let mut events = Vec::new();
        let accepted = diplomacy::propose_agreement(
            &mut self.ledger,
            &self.config,
            code,
            kind,
            self.date,
            &mut self.rng,
            &mut events,
        );
        self.commit(events);
        accepted
    }

    pub fn break_agreement(&mut self, code: &str, kind: AgreementKind) -> bool {
        let mut events = Vec::new();
        let broken = diplomacy::break_agreement(&mut self.ledger, code, kind, self.date, &mut events);
        self.commit(events);
        broken
    }

    pub fn set_tariff(&mut self, code: &str, level: TariffLevel) -> bool {
        let mut events = Vec::new();
        let changed = diplomacy::set_tariff(&mut self.ledger, code, level, self.date, &mut events);
        self.commit(events);
        changed
    }

    /// Shifts relations with `code`. Returns the new score.
    pub fn update_relations(&mut self, code: &str, delta: f64) -> f64 {
        self.ledger.set_relations(code, delta)
    }

    pub fn fund_separatists(&mut self, code: &str) -> bool {
        let mut events = Vec::new();
        let result = diplomacy::fund_separatists(
            &mut self.ledger,
            code,
            self.date,
            &mut self.rng,
            &mut events,
        );
        self.commit(events);
        result.unwrap_or_else(|e| {
            Self::rejected("fund_separatists", code, &e);
            false
        })
    }

    /// Soldiers granted by `code`, 0 if it refuses.
    pub fn request_support(&mut self, code: &str) -> u64 {
        let mut events = Vec::new();
        let granted = diplomacy::request_support(&mut self.ledger, code, self.date, &mut events);
        self.commit(events);
        granted
    }

    pub fn create_coalition(
        &mut self,
        name: &str,
        kind: CoalitionKind,
        invitees: &[CountryCode],
    ) -> Option<CoalitionId> {
        let mut events = Vec::new();
        let result =
            coalitions::create_coalition(&mut self.ledger, name, kind, invitees, self.date, &mut events);
        self.commit(events);
        result.map_err(|e| Self::rejected("create_coalition", name, &e)).ok()
    }

    pub fn join_coalition(&mut self, id: CoalitionId, code: &str) -> bool {
        coalitions::join_coalition(&mut self.ledger, id, code)
    }

    pub fn leave_coalition(&mut self, id: CoalitionId) -> bool {
        let player = self.ledger.player_code().to_string();
        let mut events = Vec::new();
        let left = coalitions::leave_coalition(&mut self.ledger, id, &player, self.date, &mut events);
        self.commit(events);
        left
    }

    /// Opens a crisis with the player as instigator.
    pub fn start_crisis(&mut self, code: &str, kind: CrisisKind) -> Option<CrisisId> {
        let player = self.ledger.player_code().to_string();
        let mut events = Vec::new();
        let result =
            self.crises
                .start_crisis(&mut self.ledger, kind, &player, code, self.date, &mut events);
        self.commit(events);
        result.map_err(|e| Self::rejected("start_crisis", code, &e)).ok()
    }

    /// The player's move in crisis `id`. `None` if the move was rejected.
    pub fn crisis_action(&mut self, id: CrisisId, action: CrisisAction) -> Option<CrisisStatus> {
        let player = self.ledger.player_code().to_string();
        let mut events = Vec::new();
        let result = self.crises.apply_action(
            &mut self.ledger,
            id,
            &player,
            action,
            self.date,
            &mut self.rng,
            &mut events,
        );
        self.commit(events);
        result
            .map_err(|e| Self::rejected("crisis_action", &id.to_string(), &e))
            .ok()
    }

    pub fn launch_offensive(
        &mut self,
        code: &str,
        soldiers: u64,
        location: Option<GeoPoint>,
    ) -> Option<Offensive> {
        let mut events = Vec::new();
        let result = war::launch_offensive(
            &mut self.ledger,
            self.geometry.as_ref(),
            &self.config,
            code,
            soldiers,
            location,
            self.date,
            &mut self.rng,
            &mut events,
        );
        self.commit(events);
        result.map_err(|e| Self::rejected("launch_offensive", code, &e)).ok()
    }

    pub fn create_claim(&mut self, polygon: Polygon) -> Option<ClaimId> {
        let mut events = Vec::new();
        let result = claims::create_claim(
            &mut self.ledger,
            self.geometry.as_ref(),
            polygon,
            self.date,
            &mut events,
        );
        self.commit(events);
        result.map_err(|e| Self::rejected("create_claim", "polygon", &e)).ok()
    }

    pub fn relinquish_claim(&mut self, id: ClaimId) -> bool {
        let mut events = Vec::new();
        let dropped = claims::relinquish_claim(&mut self.ledger, id, self.date, &mut events);
        self.commit(events);
        dropped
    }

    /// Area seized in km², 0 if the claim cannot be taken yet.
    pub fn seize_claim(&mut self, id: ClaimId) -> f64 {
        let mut events = Vec::new();
        let result = claims::seize_claim(&mut self.ledger, id, self.date, &mut events);
        self.commit(events);
        result.unwrap_or_else(|e| {
            Self::rejected("seize_claim", &id.to_string(), &e);
            0.0
        })
    }

    pub fn demand_territory(&mut self, id: ClaimId) -> bool {
        let mut events = Vec::new();
        let result = claims::demand_territory(
            &mut self.ledger,
            &mut self.crises,
            id,
            self.date,
            &mut self.rng,
            &mut events,
        );
        self.commit(events);
        result.unwrap_or_else(|e| {
            Self::rejected("demand_territory", &id.to_string(), &e);
            false
        })
    }

    pub fn construct_building(&mut self, kind: BuildingKind, location: Option<GeoPoint>) -> bool {
        economy::construct_building(
            &mut self.ledger,
            &mut self.infrastructure,
            kind,
            location,
            &self.config.economy,
        )
        .map_err(|e| Self::rejected("construct_building", &format!("{kind:?}"), &e))
        .is_ok()
    }

    /// Runs a scripted command. Returns whether it took effect.
    pub fn execute(&mut self, command: &Command) -> bool {
        match command {
            Command::DeclareWar { target } => self.declare_war(target),
            Command::MakePeace { target } => self.make_peace(target),
            Command::ProposeAgreement { target, kind } => self.propose_agreement(target, *kind),
            Command::BreakAgreement { target, kind } => self.break_agreement(target, *kind),
            Command::SetTariff { target, level } => self.set_tariff(target, *level),
            Command::UpdateRelations { target, delta } => {
                self.update_relations(target, *delta);
                true
            }
            Command::FundSeparatists { target } => self.fund_separatists(target),
            Command::RequestSupport { target } => self.request_support(target) > 0,
            Command::CreateCoalition {
                name,
                kind,
                invitees,
            } => self.create_coalition(name, *kind, invitees).is_some(),
            Command::LeaveCoalition { coalition } => self.leave_coalition(*coalition),
            Command::StartCrisis { target, kind } => self.start_crisis(target, *kind).is_some(),
            Command::CrisisAction { crisis, action } => {
                self.crisis_action(*crisis, *action).is_some()
            }
            Command::LaunchOffensive {
                target,
                soldiers,
                location,
            } => self.launch_offensive(target, *soldiers, *location).is_some(),
            Command::CreateClaim { polygon } => self.create_claim(polygon.clone()).is_some(),
            Command::RelinquishClaim { claim } => self.relinquish_claim(*claim),
            Command::SeizeClaim { claim } => self.seize_claim(*claim) > 0.0,
            Command::DemandTerritory { claim } => self.demand_territory(*claim),
            Command::Build { building, location } => self.construct_building(*building, *location),
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
