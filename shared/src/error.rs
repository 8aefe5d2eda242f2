//! Error kinds raised by the costing engine

use thiserror::Error;
use uuid::Uuid;

/// Errors produced while deriving cost figures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CostError {
    /// Entity missing, or owned by a different tenant
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Numeric failure such as an overflowing sum. Division by zero is never
    /// reported here; it is defined to yield zero.
    #[error("Computation error: {0}")]
    Computation(String),
}

impl CostError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        CostError::NotFound { entity, id }
    }

    pub fn overflow(what: &str) -> Self {
        CostError::Computation(format!("{} exceeds representable range", what))
    }
}

/// Result alias for costing computations
pub type CostResult<T> = Result<T, CostError>;
