//! Arena Combat - round-based tactical combat core

pub mod battle;
pub mod core;
pub mod skills;
pub mod unit;
