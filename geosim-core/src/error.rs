use crate::state::{CountryCode, CrisisId};
use thiserror::Error;

/// Why an operation was rejected.
///
/// None of these are fatal. The public [`Simulation`](crate::Simulation)
/// surface turns them into `false`, `0` or a logged no-op so a tick always
/// completes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("{action} is not legal in phase {phase} of crisis {crisis}")]
    InvalidTransition {
        crisis: CrisisId,
        phase: u8,
        action: String,
    },
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: f64, available: f64 },
    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),
    #[error("Crisis {0} not found or already resolved")]
    CrisisNotFound(CrisisId),
    #[error("{actor} is not a participant in crisis {crisis}")]
    NotParticipant { crisis: CrisisId, actor: CountryCode },
}
