use crate::crisis::{CrisisAction, CrisisKind};
use crate::geometry::{GeoPoint, Polygon};
use crate::state::{
    AgreementKind, ClaimId, CoalitionId, CoalitionKind, CountryCode, CrisisId, TariffLevel,
};
use crate::systems::economy::BuildingKind;
use serde::{Deserialize, Serialize};

/// A player action, as a scenario script or host UI submits it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    // Diplomatic
    DeclareWar {
        target: CountryCode,
    },
    MakePeace {
        target: CountryCode,
    },
    ProposeAgreement {
        target: CountryCode,
        kind: AgreementKind,
    },
    BreakAgreement {
        target: CountryCode,
        kind: AgreementKind,
    },
    SetTariff {
        target: CountryCode,
        level: TariffLevel,
    },
    UpdateRelations {
        target: CountryCode,
        delta: f64,
    },
    FundSeparatists {
        target: CountryCode,
    },
    RequestSupport {
        target: CountryCode,
    },
    CreateCoalition {
        name: String,
        kind: CoalitionKind,
        invitees: Vec<CountryCode>,
    },
    LeaveCoalition {
        coalition: CoalitionId,
    },

    // Crises
    StartCrisis {
        target: CountryCode,
        kind: CrisisKind,
    },
    CrisisAction {
        crisis: CrisisId,
        action: CrisisAction,
    },

    // Military
    LaunchOffensive {
        target: CountryCode,
        soldiers: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<GeoPoint>,
    },

    // Territory
    CreateClaim {
        polygon: Polygon,
    },
    RelinquishClaim {
        claim: ClaimId,
    },
    SeizeClaim {
        claim: ClaimId,
    },
    DemandTerritory {
        claim: ClaimId,
    },

    // Economic
    Build {
        building: BuildingKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<GeoPoint>,
    },
}

/// A command to run at the start of a given month of a scripted run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledCommand {
    /// Zero-based month of the run
    pub month: u32,
    #[serde(flatten)]
    pub command: Command,
}
