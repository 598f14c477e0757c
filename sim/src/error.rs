use crate::vehicle::VehicleId;
use hyperbol_shared::config::ConfigError;

/// Errors raised by the simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    InvalidConfiguration(#[from] ConfigError),

    /// Internal state contradicts itself; a programming error, not bad input.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("unknown vehicle {0}")]
    UnknownVehicle(VehicleId),

    #[error("no free spawn point for the {0:?} team")]
    ArenaFull(hyperbol_shared::team::Team),

    #[error("could not read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("could not parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
