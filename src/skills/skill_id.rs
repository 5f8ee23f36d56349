//! Skill identifiers

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillId {
    Heal,
    Barrier,
    Fireball,
    PowerShot,
    Cleave,
    Lullaby,
    Inspire,
    SummonWolf,
    PoisonArrow,
    Renew,
    Quicken,
    Frostbolt,
    Possess,
}

impl SkillId {
    pub const ALL: [SkillId; 13] = [
        SkillId::Heal,
        SkillId::Barrier,
        SkillId::Fireball,
        SkillId::PowerShot,
        SkillId::Cleave,
        SkillId::Lullaby,
        SkillId::Inspire,
        SkillId::SummonWolf,
        SkillId::PoisonArrow,
        SkillId::Renew,
        SkillId::Quicken,
        SkillId::Frostbolt,
        SkillId::Possess,
    ];
}
