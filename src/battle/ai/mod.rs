//! Per-unit decision making
//!
//! Architecture: tagged strategy handle + single dispatch site
//! - `Strategy` is stored on each unit and replaceable at runtime
//! - `DecisionEngine::decide` is the only place strategies are interpreted
//! - `DecisionSource` is the async request/response seam (local or worker)
//! - `WorldSnapshot` is the plain-data view decisions are computed from

pub mod decision_context;
pub mod engine;
pub mod player;
pub mod roles;
pub mod scoring;
pub mod worker;

pub use decision_context::{UnitSnapshot, WorldSnapshot};
pub use engine::DecisionEngine;
pub use player::{PlayerInput, QueuedInput};
pub use scoring::{PredictionScorer, RewardScorer, ScoreWeights};
pub use worker::{
    DecisionRequest, DecisionResponse, DecisionSource, DecisionWorker, LocalDecisions,
    WorkerHandle,
};

use serde::{Deserialize, Serialize};

use crate::core::types::{TeamId, UnitId, Vec2};
use crate::skills::SkillId;
use crate::unit::stats::Job;

/// A decided-but-not-yet-applied action for one unit's turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionIntent {
    Idle,
    /// Walk the path; with `engage` set, strike that unit on arrival
    Move {
        path: Vec<Vec2>,
        engage: Option<UnitId>,
    },
    Attack {
        target: UnitId,
    },
    Skill {
        skill: SkillId,
        target: UnitId,
    },
}

impl ActionIntent {
    pub fn kind(&self) -> IntentType {
        match self {
            ActionIntent::Idle => IntentType::Idle,
            ActionIntent::Move { .. } => IntentType::Move,
            ActionIntent::Attack { .. } => IntentType::Attack,
            ActionIntent::Skill { .. } => IntentType::Skill,
        }
    }

    /// Unit this intent acts upon, if any
    pub fn target(&self) -> Option<UnitId> {
        match self {
            ActionIntent::Idle => None,
            ActionIntent::Move { engage, .. } => *engage,
            ActionIntent::Attack { target } | ActionIntent::Skill { target, .. } => Some(*target),
        }
    }

    pub fn move_to(destination: Vec2) -> Self {
        ActionIntent::Move {
            path: vec![destination],
            engage: None,
        }
    }

    pub fn approach(destination: Vec2, target: UnitId) -> Self {
        ActionIntent::Move {
            path: vec![destination],
            engage: Some(target),
        }
    }
}

/// Wire-level intent discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntentType {
    Move,
    Attack,
    Skill,
    Idle,
}

/// Specialised behaviors layered over a movement fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Healer,
    Archer,
    Wizard,
    Summoner,
    Bard,
    Warrior,
    Ghost,
}

impl Role {
    pub fn default_fallback(self) -> Fallback {
        match self {
            Role::Warrior | Role::Ghost => Fallback::Melee,
            Role::Healer | Role::Archer | Role::Wizard | Role::Summoner | Role::Bard => {
                Fallback::Ranged
            }
        }
    }
}

/// Movement/attack behavior used when no skill applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    Melee,
    Ranged,
}

/// Decision strategy handle stored per unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    Melee,
    Ranged,
    Role {
        role: Role,
        fallback: Fallback,
    },
    /// Intents come from external input, never computed
    Player,
    /// A ghost has taken over; `previous` is restored on release
    Possessed {
        by: UnitId,
        team: TeamId,
        previous: Box<Strategy>,
    },
}

impl Strategy {
    pub fn role(role: Role) -> Self {
        Strategy::Role {
            role,
            fallback: role.default_fallback(),
        }
    }

    /// Default strategy for AI-controlled units of a job
    pub fn for_job(job: Job) -> Self {
        match job {
            Job::Warrior => Strategy::role(Role::Warrior),
            Job::Archer => Strategy::role(Role::Archer),
            Job::Wizard => Strategy::role(Role::Wizard),
            Job::Healer => Strategy::role(Role::Healer),
            Job::Summoner => Strategy::role(Role::Summoner),
            Job::Bard => Strategy::role(Role::Bard),
            Job::Ghost => Strategy::role(Role::Ghost),
            Job::Rogue | Job::Beast => Strategy::Melee,
        }
    }

    pub fn is_player_controlled(&self) -> bool {
        matches!(self, Strategy::Player)
    }

    /// The possessing ghost, if any
    pub fn possessor(&self) -> Option<UnitId> {
        match self {
            Strategy::Possessed { by, .. } => Some(*by),
            _ => None,
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Melee
    }
}
