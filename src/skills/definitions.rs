//! Static skill definitions - the global library all units reference

use crate::skills::SkillId;
use crate::unit::stats::Stat;

/// Who a skill may be aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillTarget {
    /// Any living unit of the caster's allegiance, caster included
    Ally,
    /// A living hostile unit
    Enemy,
    /// Always the caster
    Caster,
}

/// What landing the skill does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillEffect {
    Damage,
    Heal,
    Shield,
    Sleep,
    Inspire,
    Summon,
    /// Damage over time (poison)
    Poison,
    /// Healing over time (regeneration)
    Regenerate,
    Haste,
    Slow,
    /// Take over an enemy body for the duration
    Possess,
}

#[derive(Debug, Clone)]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: &'static str,
    pub target: SkillTarget,
    pub effect: SkillEffect,
    pub range: f32,
    pub base_power: f32,
    /// Offensive/support stat added to base power
    pub scaling: Option<Stat>,
    pub mp_cost: f32,
    /// Rounds before reuse at attack speed 1.0
    pub base_cooldown: f32,
    /// Rounds a status-applying skill lasts
    pub duration_rounds: u32,
}

impl SkillDefinition {
    /// Power before the target's shield: base power plus the scaling stat
    pub fn power_with(&self, scaling_value: f32) -> f32 {
        (self.base_power + scaling_value).max(0.0)
    }
}

pub static SKILL_LIBRARY: &[SkillDefinition] = &[
    SkillDefinition {
        id: SkillId::Heal,
        name: "Heal",
        target: SkillTarget::Ally,
        effect: SkillEffect::Heal,
        range: 6.0,
        base_power: 8.0,
        scaling: Some(Stat::SpellPower),
        mp_cost: 6.0,
        base_cooldown: 2.0,
        duration_rounds: 0,
    },
    SkillDefinition {
        id: SkillId::Barrier,
        name: "Barrier",
        target: SkillTarget::Ally,
        effect: SkillEffect::Shield,
        range: 6.0,
        base_power: 6.0,
        scaling: Some(Stat::SpellPower),
        mp_cost: 8.0,
        base_cooldown: 4.0,
        duration_rounds: 0,
    },
    SkillDefinition {
        id: SkillId::Fireball,
        name: "Fireball",
        target: SkillTarget::Enemy,
        effect: SkillEffect::Damage,
        range: 8.0,
        base_power: 10.0,
        scaling: Some(Stat::SpellPower),
        mp_cost: 10.0,
        base_cooldown: 3.0,
        duration_rounds: 0,
    },
    SkillDefinition {
        id: SkillId::PowerShot,
        name: "Power Shot",
        target: SkillTarget::Enemy,
        effect: SkillEffect::Damage,
        range: 12.0,
        base_power: 6.0,
        scaling: Some(Stat::AttackPower),
        mp_cost: 4.0,
        base_cooldown: 3.0,
        duration_rounds: 0,
    },
    SkillDefinition {
        id: SkillId::Cleave,
        name: "Cleave",
        target: SkillTarget::Enemy,
        effect: SkillEffect::Damage,
        range: 2.0,
        base_power: 5.0,
        scaling: Some(Stat::AttackPower),
        mp_cost: 3.0,
        base_cooldown: 2.0,
        duration_rounds: 0,
    },
    SkillDefinition {
        id: SkillId::Lullaby,
        name: "Lullaby",
        target: SkillTarget::Enemy,
        effect: SkillEffect::Sleep,
        range: 7.0,
        base_power: 0.0,
        scaling: None,
        mp_cost: 8.0,
        base_cooldown: 5.0,
        duration_rounds: 2,
    },
    SkillDefinition {
        id: SkillId::Inspire,
        name: "Inspire",
        target: SkillTarget::Ally,
        effect: SkillEffect::Inspire,
        range: 6.0,
        base_power: 3.0,
        scaling: None,
        mp_cost: 6.0,
        base_cooldown: 4.0,
        duration_rounds: 3,
    },
    SkillDefinition {
        id: SkillId::SummonWolf,
        name: "Summon Wolf",
        target: SkillTarget::Caster,
        effect: SkillEffect::Summon,
        range: 0.0,
        base_power: 0.0,
        scaling: None,
        mp_cost: 15.0,
        base_cooldown: 6.0,
        duration_rounds: 0,
    },
    SkillDefinition {
        id: SkillId::PoisonArrow,
        name: "Poison Arrow",
        target: SkillTarget::Enemy,
        effect: SkillEffect::Poison,
        range: 10.0,
        base_power: 2.0,
        scaling: None,
        mp_cost: 5.0,
        base_cooldown: 4.0,
        duration_rounds: 3,
    },
    SkillDefinition {
        id: SkillId::Renew,
        name: "Renew",
        target: SkillTarget::Ally,
        effect: SkillEffect::Regenerate,
        range: 6.0,
        base_power: 3.0,
        scaling: None,
        mp_cost: 6.0,
        base_cooldown: 4.0,
        duration_rounds: 3,
    },
    SkillDefinition {
        id: SkillId::Quicken,
        name: "Quicken",
        target: SkillTarget::Ally,
        effect: SkillEffect::Haste,
        range: 6.0,
        base_power: 0.0,
        scaling: None,
        mp_cost: 6.0,
        base_cooldown: 5.0,
        duration_rounds: 2,
    },
    SkillDefinition {
        id: SkillId::Frostbolt,
        name: "Frostbolt",
        target: SkillTarget::Enemy,
        effect: SkillEffect::Slow,
        range: 8.0,
        base_power: 0.0,
        scaling: None,
        mp_cost: 6.0,
        base_cooldown: 4.0,
        duration_rounds: 2,
    },
    SkillDefinition {
        id: SkillId::Possess,
        name: "Possess",
        target: SkillTarget::Enemy,
        effect: SkillEffect::Possess,
        range: 6.0,
        base_power: 0.0,
        scaling: None,
        mp_cost: 20.0,
        base_cooldown: 6.0,
        duration_rounds: 3,
    },
];

pub fn get_skill_definition(id: SkillId) -> Option<&'static SkillDefinition> {
    SKILL_LIBRARY.iter().find(|def| def.id == id)
}
