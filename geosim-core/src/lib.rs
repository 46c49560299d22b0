//! # Geopolitical Simulation Core
//!
//! Turn-based simulation of a player-controlled nation in a world of AI
//! countries that react to it: diplomacy, crises, wars, economy and long-run
//! victory conditions.
//!
//! The core is deterministic for a given seed. Randomness comes from one
//! injected RNG, and every scan over countries runs in code order.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Host / CLI   │────▶│  Simulation  │────▶│   systems    │
//! │ (commands)   │     │ (scheduler)  │     │ (free fns)   │
//! └──────────────┘     └──────┬───────┘     └──────┬───────┘
//!                             │                    │
//!                      ┌──────▼───────┐     ┌──────▼───────┐
//!                      │  GameEvent   │◀────│ NationLedger │
//!                      │  (EventLog)  │     │ CrisisEngine │
//!                      └──────────────┘     └──────────────┘
//! ```
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`NationLedger`] | Every nation, war, agreement, claim and coalition |
//! | [`CrisisEngine`] | Five-phase diplomatic crises and their AI policies |
//! | [`Simulation`] | Owns the world; AI turns, economic months, player actions |
//! | [`GameEvent`] | What happened, for hosts and the JSONL [`EventLog`] |
//! | [`GeometryService`] | Polygon math supplied by the host |

pub mod ai;
pub mod bounded;
pub mod config;
pub mod crisis;
pub mod defines;
pub mod error;
pub mod event_log;
pub mod events;
pub mod geometry;
pub mod input;
pub mod ledger;
pub mod scheduler;
pub mod state;
pub mod systems;
pub mod testing;
pub mod victory;

pub use ai::{policy_for, CrisisPolicy};
pub use bounded::{Bounded, Percent, RelationsScore, Reputation};
pub use config::{EconomyConfig, SimConfig};
pub use crisis::{
    CrisisAction, CrisisEngine, CrisisKind, CrisisOutcome, CrisisPhase, CrisisStatus,
    DiplomaticCrisis,
};
pub use error::ActionError;
pub use event_log::{EventLog, EventLogError};
pub use events::GameEvent;
pub use geometry::{GeoPoint, GeometryError, GeometryService, Polygon};
pub use input::{Command, ScheduledCommand};
pub use ledger::{NationLedger, WorldAggregate};
pub use scheduler::{AiTurnResult, AiVsAiResult, MonthReport, Simulation};
pub use state::{
    AgreementKind, Country, CountryCode, Date, Disposition, Personality, PlayerNation,
    TariffLevel, WarOrigin,
};
pub use systems::economy::{calculate_economy, BuildingKind, EconomyReport, Infrastructure};
pub use systems::war::{AiWarEvent, Offensive};
pub use victory::{
    check_achievements, check_victory_conditions, Achievement, AchievementId, AchievementParams,
    VictoryCondition, VictoryKind, VictoryParams,
};
