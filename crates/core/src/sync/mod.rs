//! Synchronization engine: directional gates, reconcilers, and the
//! status/history mutator.

mod engine;
mod state;

pub use engine::*;
pub use state::*;
