//! Battle system - round-based arena combat
//!
//! Flow per round:
//! - `turn_order` sorts living units by speed
//! - `ai` decides an intent for each actor (locally or through the worker)
//! - `execution` plays the intent through its animation windows
//! - `resolution` applies damage, healing and effects, publishing events
//! - `aftermath` reacts to deaths and hits; `round` drives it all

pub mod aftermath;
pub mod ai;
pub mod events;
pub mod execution;
pub mod resolution;
pub mod roster;
pub mod round;
pub mod scenario;
pub mod turn_order;

// Re-exports for convenient access
pub use aftermath::AftermathPipeline;
pub use events::{BattleEvent, EventBus, EventListener, EventRecord, Topic};
pub use execution::{
    execute, AbortReason, ActionExecution, ActionOutcome, ActionReport, AnimationClock,
    ExecState, FrameClock, HitPhase, InstantClock, Step, Suspension,
};
pub use resolution::{apply_attack, attack_cooldown, skill_cooldown, AttackReport};
pub use roster::{BattleOutcome, BattleResult, Battlefield, GroundItem, Team, TeamStance};
pub use round::{RoundController, RoundPhase};
pub use scenario::{Scenario, TeamSetup, UnitSetup};
pub use turn_order::{order_by_speed, TurnSequencer};
