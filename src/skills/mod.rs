//! Combat skills
//!
//! Definitions are static and shared; each unit carries its own ordered
//! library of learned skills with independent cooldown timers.

pub mod definitions;
pub mod library;
pub mod skill_id;

pub use definitions::{get_skill_definition, SkillDefinition, SkillEffect, SkillTarget, SKILL_LIBRARY};
pub use library::{LearnedSkill, SkillLibrary};
pub use skill_id::SkillId;
