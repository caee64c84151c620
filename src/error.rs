use thiserror::Error;

use crate::individual::{IndividualId, Stage};
use crate::spatial::LocationKey;

/// Problems with the inputs of a run. Always raised before the first tick.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("climate period is empty")]
    EmptyPeriod,
    #[error("climate record {index} is malformed: {reason}")]
    MalformedHour { index: usize, reason: String },
    #[error("initial sample at ({x}, {y}) has negative count {count}")]
    NegativeCount { x: f64, y: f64, count: i64 },
    #[error("initial sample count {0} does not fit in a population")]
    CountTooLarge(i64),
    #[error("location resolution must be a positive number of metres, got {0}")]
    InvalidResolution(f64),
    #[error("regulation period must be at least one hour")]
    ZeroRegulationPeriod,
    #[error("mortality scale must be a non-negative number, got {0}")]
    InvalidMortalityScale(f64),
}

/// Population and group bookkeeping drifted apart. A run that hits one of
/// these cannot continue.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("no group registered for location {0}")]
    MissingGroup(LocationKey),
    #[error("{stage} count at {key} would drop below zero")]
    CountUnderflow { key: LocationKey, stage: Stage },
    #[error("individual {0} is an adult and has no next stage")]
    TerminalStage(IndividualId),
    #[error("group {key} records {recorded} {stage} but {actual} are alive there")]
    CountMismatch {
        key: LocationKey,
        stage: Stage,
        recorded: u64,
        actual: u64,
    },
}
