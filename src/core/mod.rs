pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{ArenaError, Result};
pub use types::{Bounds, ItemId, TeamId, UnitId, Vec2};
