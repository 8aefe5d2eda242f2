//! Domain models for the Meal Program Cost Engine

mod category;
mod distribution;
mod master;
mod plan;
mod procurement;
mod production;

pub use category::*;
pub use distribution::*;
pub use master::*;
pub use plan::*;
pub use procurement::*;
pub use production::*;
