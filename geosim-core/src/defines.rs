//! Game mechanic constants (defines).
//!
//! Fixed rules of the simulation. Tunable odds and caps that a scenario may
//! want to change live in [`SimConfig`](crate::config::SimConfig) instead.

/// Relation and disposition constants
pub mod relations {
    /// Above this score a country is friendly
    pub const FRIENDLY_ABOVE: f64 = 50.0;

    /// Below this score a country is hostile
    pub const HOSTILE_BELOW: f64 = -30.0;

    /// Relations gained when a proposal is accepted
    pub const AGREEMENT_ACCEPTED_BONUS: f64 = 5.0;

    /// Relations lost when the player breaks an agreement
    pub const AGREEMENT_BROKEN_PENALTY: f64 = -10.0;

    /// Relations lost by the AI side when war is declared between it and the player
    pub const WAR_DECLARED_PENALTY: f64 = -40.0;

    /// Monthly relations drift while an embargo is in place (either direction)
    pub const EMBARGO_MONTHLY_DRIFT: f64 = -2.0;
}

/// Agreement acceptance thresholds (minimum relations score)
pub mod agreements {
    pub const ALLIANCE_THRESHOLD: f64 = 70.0;
    pub const GUARANTEE_THRESHOLD: f64 = 50.0;
    pub const NON_AGGRESSION_THRESHOLD: f64 = 0.0;
    pub const TRADE_THRESHOLD: f64 = -10.0;
}

/// Crisis state machine constants
pub mod crisis {
    /// Phase deadlines in days for phases 1-4 (phase 5 is terminal)
    pub const PHASE_DEADLINE_DAYS: [u32; 4] = [30, 20, 14, 7];

    pub const HOLD_FIRM_RISK: f64 = 5.0;
    pub const MEDIATION_RISK: f64 = -10.0;
    pub const MEDIATION_ROLLBACK_CHANCE: f64 = 0.5;
    pub const SUMMIT_SUCCESS_CHANCE: f64 = 0.6;
    pub const SUMMIT_RELATIONS_BONUS: f64 = 5.0;
    pub const MOBILIZE_RISK: f64 = 20.0;

    pub const BACK_DOWN_RELATIONS: f64 = -10.0;
    pub const BACK_DOWN_REPUTATION: f64 = -5.0;
    pub const DECLARE_WAR_RELATIONS: f64 = -15.0;

    /// Trigger: minimum aggression for border incidents
    pub const BORDER_INCIDENT_MIN_AGGRESSION: u8 = 4;
    /// Trigger: relations below which border incidents can start
    pub const BORDER_INCIDENT_RELATIONS: f64 = -30.0;
    /// Trigger: territory lost above which revanchists open disputes
    pub const TERRITORY_DISPUTE_LOST_PERCENT: f64 = 10.0;
}

/// Combat constants
pub mod combat {
    /// Ceiling on occupation gained in a single battle, approached asymptotically
    pub const MAX_BATTLE_GAIN: f64 = 25.0;

    /// Strength ratio below which an offensive gains nothing
    pub const MIN_EFFECTIVE_RATIO: f64 = 0.5;

    /// Share of soldiers lost per battle, scaled by the opponent's share of strength
    pub const CASUALTY_RATE: f64 = 0.03;

    /// Luck roll bounds applied on top of the deterministic gain
    pub const LUCK_MIN: f64 = 0.8;
    pub const LUCK_MAX: f64 = 1.2;

    /// Territory lost beyond which a country turns revanchist
    pub const REVANCHIST_LOST_PERCENT: f64 = 10.0;
}

/// Economy constants. Money is in millions.
pub mod economy {
    pub const MONTHS_PER_YEAR: f64 = 12.0;

    /// Upkeep per soldier per month
    pub const SOLDIER_UPKEEP: f64 = 0.002;

    /// Share of population available as manpower
    pub const MANPOWER_RATE: f64 = 0.01;

    /// Share of population recruited per month
    pub const RECRUITMENT_RATE: f64 = 0.0001;

    /// Share of a partner's GDP that flows to the player as monthly trade income
    pub const TRADE_SHARE: f64 = 0.0005;

    /// Cost of funding separatists in a foreign country
    pub const SEPARATIST_FUNDING_COST: f64 = 500.0;

    /// AI GDP per capita at economy index 0 and per index point
    pub const AI_BASE_GDP_PER_CAPITA: f64 = 500.0;
    pub const AI_GDP_PER_CAPITA_PER_INDEX: f64 = 600.0;

    /// Monthly wealth accrual of AI countries as a share of GDP
    pub const AI_WEALTH_SHARE: f64 = 0.00002;
}

/// Victory thresholds
pub mod victory {
    pub const DOMINATION_TERRITORY_PERCENT: f64 = 40.0;
    pub const HEGEMONY_MONTHS: u32 = 120;
    pub const ECONOMIC_MONTHS: u32 = 240;
    pub const SURVIVAL_MONTHS: u32 = 1200;
}

/// Elections and coups
pub mod politics {
    /// Freedom level at which a country holds elections
    pub const DEMOCRACY_FREEDOM: f64 = 50.0;

    /// Base chance the incumbent wins, reduced by unrest
    pub const INCUMBENT_BASE_CHANCE: f64 = 0.6;

    /// Unrest at which an autocracy risks a coup
    pub const COUP_UNREST: f64 = 70.0;

    /// Coup chance at the unrest threshold, rising with every point above it
    pub const COUP_BASE_CHANCE: f64 = 0.1;

    /// Share of relations toward the player a new leader forgets
    pub const NEW_LEADER_RELATIONS_RESET: f64 = 0.2;

    pub const ELECTION_UNREST_RELIEF: f64 = -10.0;
    pub const COUP_UNREST_RELIEF: f64 = -30.0;
    pub const COUP_AUTHORITY: f64 = 80.0;
}

/// Coalition constants
pub mod coalition {
    /// Player reputation below which hostile countries band together
    pub const CONTAINMENT_REPUTATION: f64 = -20.0;

    /// Hostile countries needed to form a containment coalition
    pub const CONTAINMENT_MIN_HOSTILE: usize = 4;

    /// A coalition with fewer members dissolves
    pub const MIN_MEMBERS: usize = 3;
}

/// Territorial claim constants
pub mod claims {
    /// Relations lost with each country a new claim covers
    pub const CLAIM_RELATIONS_PENALTY: f64 = -5.0;

    /// Relations lost when a country cedes land on demand
    pub const CESSION_RELATIONS_PENALTY: f64 = -20.0;

    /// Ceiling on the chance a country yields to a territorial demand
    pub const MAX_CESSION_CHANCE: f64 = 0.9;
}
