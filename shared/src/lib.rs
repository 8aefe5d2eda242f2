//! Shared types and costing logic for the Meal Program Cost Engine
//!
//! This crate contains the domain models and the pure (I/O free) cost
//! computations shared between the backend, the browser preview (via WASM),
//! and other components of the system.

pub mod budget;
pub mod costing;
pub mod efficiency;
pub mod error;
pub mod models;
pub mod reconciliation;
pub mod types;
pub mod validation;
pub mod variance;

pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;
