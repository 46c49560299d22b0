use crate::bounded::{Percent, RelationsScore, Reputation};
use crate::defines::{economy, politics, relations};
use crate::geometry::{GeoPoint, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A simulated calendar date.
///
/// The calendar is 12 months of 30 days; one economic tick is exactly one
/// month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date {
    pub year: i32,
    pub month: u8, // 1-12
    pub day: u8,   // 1-30
}

impl Date {
    pub const DAYS_PER_MONTH: u32 = 30;

    pub fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Adds days to the current date.
    pub fn add_days(&self, days: u32) -> Self {
        let mut d = self.day as u32 + days;
        let mut m = self.month as u32;
        let mut y = self.year;

        while d > Self::DAYS_PER_MONTH {
            d -= Self::DAYS_PER_MONTH;
            m += 1;
            if m > 12 {
                m -= 12;
                y += 1;
            }
        }

        Self {
            year: y,
            month: m as u8,
            day: d as u8,
        }
    }

    pub fn add_months(&self, months: u32) -> Self {
        self.add_days(months * Self::DAYS_PER_MONTH)
    }

    /// Days since year 0 on the simulated calendar.
    pub fn ordinal(&self) -> i64 {
        self.year as i64 * 360 + (self.month as i64 - 1) * 30 + (self.day as i64 - 1)
    }

    /// Signed number of days from `self` to `other`.
    pub fn days_until(&self, other: &Date) -> i64 {
        other.ordinal() - self.ordinal()
    }
}

impl Default for Date {
    fn default() -> Self {
        Self::new(2025, 1, 1)
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.year, self.month, self.day)
    }
}

pub type CountryCode = String;
pub type WarId = u32;
pub type AgreementId = u32;
pub type CrisisId = u32;
pub type CoalitionId = u32;
pub type ClaimId = u32;
pub type FortificationId = u32;

/// Personality tag driving AI decisions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Personality {
    Expansionist,
    #[default]
    Defensive,
    Isolationist,
    Opportunist,
    TradingPower,
    Ideological,
}

impl Personality {
    /// Weight applied to the base chance of honoring an alliance.
    pub fn alliance_loyalty(&self) -> f64 {
        match self {
            Personality::Expansionist => 1.3,
            Personality::Ideological => 1.2,
            Personality::Defensive => 1.0,
            Personality::Opportunist => 0.8,
            Personality::TradingPower => 0.6,
            Personality::Isolationist => 0.3,
        }
    }
}

/// Attitude toward the player. Always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Friendly,
    Neutral,
    Hostile,
    AtWar,
}

/// Standing modifiers that feed AI triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountryModifier {
    /// Wants lost territory back
    Revanchist,
    /// Quicker to start and join wars
    Militarist,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TariffLevel {
    FreeTrade,
    #[default]
    Low,
    High,
    Embargo,
}

impl TariffLevel {
    /// Trade income multiplier for goods crossing this tariff.
    pub fn trade_multiplier(&self) -> f64 {
        match self {
            TariffLevel::FreeTrade => 1.5,
            TariffLevel::Low => 1.0,
            TariffLevel::High => 0.8,
            TariffLevel::Embargo => 0.0,
        }
    }

    /// One step more protectionist (saturates at Embargo).
    pub fn raised(&self) -> TariffLevel {
        match self {
            TariffLevel::FreeTrade => TariffLevel::Low,
            TariffLevel::Low => TariffLevel::High,
            TariffLevel::High | TariffLevel::Embargo => TariffLevel::Embargo,
        }
    }

    pub fn is_hostile(&self) -> bool {
        matches!(self, TariffLevel::High | TariffLevel::Embargo)
    }
}

/// An AI-controlled country.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Country {
    pub code: CountryCode,
    pub name: String,

    pub population: u64,
    pub language: String,
    pub culture: String,
    pub religion: String,

    /// 0-100
    pub economy_index: f64,
    pub wealth: f64,
    pub budget: f64,

    pub soldiers: u64,
    pub manpower: u64,
    pub power: f64,

    pub authority: f64,
    /// 0-100; 50 and above holds elections
    pub freedom_level: f64,
    /// 0-100
    pub unrest_level: f64,
    /// 0-5
    pub aggression: u8,
    pub personality: Personality,
    pub leader: String,
    pub next_election: Option<Date>,

    pub relations: RelationsScore,
    pub reputation: Reputation,
    pub allies: BTreeSet<CountryCode>,
    pub enemies: BTreeSet<CountryCode>,
    pub trade_partners: BTreeSet<CountryCode>,
    /// Tariff the player levies on this country's goods
    pub outbound_tariff: TariffLevel,
    /// Tariff this country levies on the player's goods
    pub inbound_tariff: TariffLevel,
    pub modifiers: BTreeSet<CountryModifier>,

    pub territory_lost_percent: Percent,
    pub claimed_by_player_percent: Percent,
    pub is_annexed: bool,
}

impl Country {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Disposition toward the player.
    ///
    /// Checked in order: war, friendly threshold, hostile threshold, neutral.
    pub fn disposition(&self, at_war: bool) -> Disposition {
        let score = self.relations.get();
        if at_war {
            Disposition::AtWar
        } else if score > relations::FRIENDLY_ABOVE {
            Disposition::Friendly
        } else if score < relations::HOSTILE_BELOW {
            Disposition::Hostile
        } else {
            Disposition::Neutral
        }
    }

    pub fn gdp_per_capita(&self) -> f64 {
        economy::AI_BASE_GDP_PER_CAPITA + self.economy_index * economy::AI_GDP_PER_CAPITA_PER_INDEX
    }

    /// Gross domestic product in millions.
    pub fn gdp(&self) -> f64 {
        self.population as f64 * self.gdp_per_capita() / 1_000_000.0
    }

    /// Military power score: thousands of soldiers scaled by the economy.
    pub fn recompute_power(&mut self) {
        self.power = self.soldiers as f64 / 1000.0 * (1.0 + self.economy_index / 100.0);
    }

    pub fn is_democracy(&self) -> bool {
        self.freedom_level >= politics::DEMOCRACY_FREEDOM
    }

    pub fn has_modifier(&self, modifier: CountryModifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

impl Default for Country {
    fn default() -> Self {
        Self {
            code: String::new(),
            name: String::new(),
            population: 5_000_000,
            language: String::new(),
            culture: String::new(),
            religion: String::new(),
            economy_index: 50.0,
            wealth: 0.0,
            budget: 0.0,
            soldiers: 20_000,
            manpower: 50_000,
            power: 30.0,
            authority: 50.0,
            freedom_level: 50.0,
            unrest_level: 10.0,
            aggression: 2,
            personality: Personality::Defensive,
            leader: String::new(),
            next_election: None,
            relations: RelationsScore::default(),
            reputation: Reputation::default(),
            allies: BTreeSet::new(),
            enemies: BTreeSet::new(),
            trade_partners: BTreeSet::new(),
            outbound_tariff: TariffLevel::Low,
            inbound_tariff: TariffLevel::Low,
            modifiers: BTreeSet::new(),
            territory_lost_percent: Percent::default(),
            claimed_by_player_percent: Percent::default(),
            is_annexed: false,
        }
    }
}

/// Aggregated 0-100 ratings of the player nation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NationStats {
    pub economy: f64,
    pub military: f64,
    pub diplomacy: f64,
    pub science: f64,
    pub stability: f64,
}

/// The player-controlled nation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerNation {
    pub code: CountryCode,
    pub name: String,
    pub population: u64,
    pub gdp_per_capita: f64,
    /// 0.0-1.0
    pub tax_rate: f64,
    pub treasury: f64,
    pub soldiers: u64,
    pub manpower: u64,
    pub reputation: Reputation,
    pub research_pool: f64,
    pub territory_km2: f64,
    pub territory_lost_percent: Percent,
    pub stats: NationStats,
}

impl PlayerNation {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn gdp(&self) -> f64 {
        self.population as f64 * self.gdp_per_capita / 1_000_000.0
    }

    /// Same scale as [`Country::power`].
    pub fn power(&self) -> f64 {
        self.soldiers as f64 / 1000.0 * (1.0 + self.stats.military / 100.0)
    }
}

impl Default for PlayerNation {
    fn default() -> Self {
        Self {
            code: "PLY".to_string(),
            name: String::new(),
            population: 1_000_000,
            gdp_per_capita: 10_000.0,
            tax_rate: 0.2,
            treasury: 1_000.0,
            soldiers: 10_000,
            manpower: 10_000,
            reputation: Reputation::default(),
            research_pool: 0.0,
            territory_km2: 10_000.0,
            territory_lost_percent: Percent::default(),
            stats: NationStats::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgreementKind {
    NonAggression,
    TradeAgreement,
    MilitaryAlliance,
    SecurityGuarantee,
}

/// A bilateral agreement. Parties are stored in sorted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    pub id: AgreementId,
    pub kind: AgreementKind,
    pub parties: (CountryCode, CountryCode),
    pub signed: Date,
}

impl Agreement {
    pub fn involves(&self, code: &str) -> bool {
        self.parties.0 == code || self.parties.1 == code
    }

    pub fn between(&self, a: &str, b: &str) -> bool {
        self.parties == sorted_pair(a, b)
    }

    pub fn other_party(&self, code: &str) -> Option<&CountryCode> {
        if self.parties.0 == code {
            Some(&self.parties.1)
        } else if self.parties.1 == code {
            Some(&self.parties.0)
        } else {
            None
        }
    }
}

pub fn sorted_pair(a: &str, b: &str) -> (CountryCode, CountryCode) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarStatus {
    Active,
    Ended,
}

/// What started a war.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarOrigin {
    /// Declared directly
    Declaration,
    /// An ally honoring an alliance in the given war
    AllianceResponse { war_id: WarId },
    /// A crisis reached phase 5
    Crisis { crisis_id: CrisisId },
}

/// A war between exactly two countries.
///
/// Occupation percentages only grow while the war is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct War {
    pub id: WarId,
    pub attacker: CountryCode,
    pub defender: CountryCode,
    pub status: WarStatus,
    /// Share of the defender's territory held by the attacker
    pub attacker_occupation: Percent,
    /// Share of the attacker's territory held by the defender
    pub defender_occupation: Percent,
    pub origin: WarOrigin,
    pub start_date: Date,
    pub end_date: Option<Date>,
}

impl War {
    pub fn is_active(&self) -> bool {
        self.status == WarStatus::Active
    }

    pub fn involves(&self, code: &str) -> bool {
        self.attacker == code || self.defender == code
    }

    pub fn between(&self, a: &str, b: &str) -> bool {
        (self.attacker == a && self.defender == b) || (self.attacker == b && self.defender == a)
    }

    pub fn opponent_of(&self, code: &str) -> Option<&CountryCode> {
        if self.attacker == code {
            Some(&self.defender)
        } else if self.defender == code {
            Some(&self.attacker)
        } else {
            None
        }
    }

    /// Occupation held by `code`'s side.
    pub fn occupation_by(&self, code: &str) -> f64 {
        if self.attacker == code {
            self.attacker_occupation.get()
        } else if self.defender == code {
            self.defender_occupation.get()
        } else {
            0.0
        }
    }

    /// Adds occupation for `code`'s side. Negative deltas and inactive wars are ignored.
    ///
    /// Returns the occupation actually gained.
    pub fn add_occupation(&mut self, code: &str, delta: f64) -> f64 {
        if !self.is_active() || delta <= 0.0 {
            return 0.0;
        }
        let slot = if self.attacker == code {
            &mut self.attacker_occupation
        } else if self.defender == code {
            &mut self.defender_occupation
        } else {
            return 0.0;
        };
        let before = slot.get();
        slot.add(delta) - before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoalitionKind {
    Military,
    Economic,
    /// Formed by countries alarmed at the player
    Containment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coalition {
    pub id: CoalitionId,
    pub name: String,
    pub kind: CoalitionKind,
    pub members: BTreeSet<CountryCode>,
    pub formed: Date,
}

/// Share of one country covered by a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimTarget {
    pub code: CountryCode,
    pub area_km2: f64,
    /// Share of the target's territory
    pub percent: f64,
}

/// Territory drawn by the player over land it does not own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub polygon: Polygon,
    pub targets: Vec<ClaimTarget>,
    pub created: Date,
}

impl Claim {
    pub fn total_area_km2(&self) -> f64 {
        self.targets.iter().map(|t| t.area_km2).sum()
    }
}

/// A fortified position that grants its owner a defense bonus nearby.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fortification {
    pub id: FortificationId,
    pub owner: CountryCode,
    pub location: GeoPoint,
    /// Added to the defender's effective strength, e.g. 0.5 = +50%
    pub bonus: f64,
}
