//! Plain-data unit snapshot
//!
//! Used both for save/restore and as the payload crossing the decision
//! worker boundary. Holds no references into the live battlefield.

use serde::{Deserialize, Serialize};

use crate::battle::ai::Strategy;
use crate::core::types::{TeamId, UnitId, Vec2};
use crate::skills::{SkillId, SkillLibrary};
use crate::unit::effects::{EffectKind, StatusEffect};
use crate::unit::equipment::{Equipment, Item};
use crate::unit::stats::{BaseStats, DerivedStats, JobTemplate, Stat, Trait};
use crate::unit::UnitKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub name: String,
    pub kind: UnitKind,
    pub team: TeamId,
    pub allegiance: TeamId,
    pub position: Vec2,
    pub template: JobTemplate,
    pub base: BaseStats,
    #[serde(default)]
    pub traits: Vec<Trait>,
    pub level: u32,
    #[serde(default)]
    pub exp: u32,
    pub stats: DerivedStats,
    pub hp: f32,
    pub mp: f32,
    #[serde(default)]
    pub shield: f32,
    #[serde(default)]
    pub equipment: Equipment,
    #[serde(default)]
    pub effects: Vec<StatusEffect>,
    #[serde(default)]
    pub skills: SkillLibrary,
    #[serde(default)]
    pub attack_cooldown: u32,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub consumables: Vec<Item>,
    #[serde(default)]
    pub consumable_capacity: usize,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub flagged: bool,
    /// Alive and not inside its death window
    pub alive: bool,
}

impl UnitSnapshot {
    pub fn stat(&self, stat: Stat) -> f32 {
        self.stats.get(stat)
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.stats.max_hp > 0.0 {
            self.hp / self.stats.max_hp
        } else {
            0.0
        }
    }

    pub fn is_wounded(&self) -> bool {
        self.hp < self.stats.max_hp
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn distance_to(&self, other: &UnitSnapshot) -> f32 {
        self.position.distance(&other.position)
    }

    pub fn skill_ready(&self, skill: SkillId) -> bool {
        self.skills.is_ready(skill)
    }
}
