//! Derived stat model
//!
//! Derivation order, each layer additive flats first then its percents:
//! 1. Job template + attribute slider contributions
//! 2. Origin / trait bonuses
//! 3. Equipment contributions
//! 4. Active status effect modifiers
//! 5. Clamp to sane bounds (no negative ranges or speeds)
//!
//! Derived values are never stored by hand; `StatModel::derive` is pure and
//! recomputing with unchanged inputs yields identical results.

use serde::{Deserialize, Serialize};

use crate::unit::effects::StatusEffect;
use crate::unit::equipment::Equipment;

/// Every derived attribute a unit exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    MaxHp,
    MaxMp,
    AttackPower,
    SpellPower,
    AttackRange,
    MovementSpeed,
    AttackSpeed,
    CastingSpeed,
    VisionRange,
    HpRegen,
    MpRegen,
    /// Initiative; feeds turn order
    Agility,
}

impl Stat {
    pub const ALL: [Stat; 12] = [
        Stat::MaxHp,
        Stat::MaxMp,
        Stat::AttackPower,
        Stat::SpellPower,
        Stat::AttackRange,
        Stat::MovementSpeed,
        Stat::AttackSpeed,
        Stat::CastingSpeed,
        Stat::VisionRange,
        Stat::HpRegen,
        Stat::MpRegen,
        Stat::Agility,
    ];

    /// Lowest legal value after derivation
    ///
    /// Speeds bottom out above zero so cooldown and cast-time divisions stay finite.
    pub fn floor(self) -> f32 {
        match self {
            Stat::MaxHp => 1.0,
            Stat::AttackSpeed | Stat::CastingSpeed => 0.1,
            _ => 0.0,
        }
    }
}

/// Attribute sliders a unit is built from
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseStats {
    pub strength: f32,
    pub agility: f32,
    pub endurance: f32,
    pub focus: f32,
    pub intelligence: f32,
}

impl BaseStats {
    pub fn uniform(value: f32) -> Self {
        Self {
            strength: value,
            agility: value,
            endurance: value,
            focus: value,
            intelligence: value,
        }
    }

    /// Sliders after level growth (every level past the first adds one point)
    pub fn at_level(&self, level: u32) -> Self {
        let growth = level.saturating_sub(1) as f32;
        Self {
            strength: sanitize(self.strength, 0.0) + growth,
            agility: sanitize(self.agility, 0.0) + growth,
            endurance: sanitize(self.endurance, 0.0) + growth,
            focus: sanitize(self.focus, 0.0) + growth,
            intelligence: sanitize(self.intelligence, 0.0) + growth,
        }
    }
}

/// Flat or percentage adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    Flat,
    Percent,
}

/// A single contribution to one derived stat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: Stat,
    pub kind: ModifierKind,
    pub amount: f32,
}

impl StatModifier {
    pub fn flat(stat: Stat, amount: f32) -> Self {
        Self { stat, kind: ModifierKind::Flat, amount }
    }

    pub fn percent(stat: Stat, amount: f32) -> Self {
        Self { stat, kind: ModifierKind::Percent, amount }
    }
}

/// Origin / personality trait granting permanent bonuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trait {
    Hardy,
    Swift,
    Brawny,
    Studious,
    Eagle,
    Frail,
}

impl Trait {
    pub fn modifiers(self) -> Vec<StatModifier> {
        match self {
            Trait::Hardy => vec![StatModifier::percent(Stat::MaxHp, 10.0)],
            Trait::Swift => vec![
                StatModifier::flat(Stat::MovementSpeed, 1.0),
                StatModifier::percent(Stat::AttackSpeed, 10.0),
                StatModifier::flat(Stat::Agility, 2.0),
            ],
            Trait::Brawny => vec![StatModifier::flat(Stat::AttackPower, 2.0)],
            Trait::Studious => vec![
                StatModifier::flat(Stat::SpellPower, 2.0),
                StatModifier::flat(Stat::MaxMp, 5.0),
            ],
            Trait::Eagle => vec![
                StatModifier::flat(Stat::VisionRange, 3.0),
                StatModifier::flat(Stat::AttackRange, 0.5),
            ],
            Trait::Frail => vec![StatModifier::percent(Stat::MaxHp, -15.0)],
        }
    }
}

/// Unit profession; picks the template and the default loadout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Job {
    Warrior,
    Archer,
    Wizard,
    Healer,
    Summoner,
    Bard,
    Rogue,
    Beast,
    /// Frail spirit that fights by taking over enemy bodies
    Ghost,
}

/// Concrete derived values for every stat
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivedStats {
    pub max_hp: f32,
    pub max_mp: f32,
    pub attack_power: f32,
    pub spell_power: f32,
    pub attack_range: f32,
    pub movement_speed: f32,
    pub attack_speed: f32,
    pub casting_speed: f32,
    pub vision_range: f32,
    pub hp_regen: f32,
    pub mp_regen: f32,
    pub agility: f32,
}

impl DerivedStats {
    pub fn get(&self, stat: Stat) -> f32 {
        match stat {
            Stat::MaxHp => self.max_hp,
            Stat::MaxMp => self.max_mp,
            Stat::AttackPower => self.attack_power,
            Stat::SpellPower => self.spell_power,
            Stat::AttackRange => self.attack_range,
            Stat::MovementSpeed => self.movement_speed,
            Stat::AttackSpeed => self.attack_speed,
            Stat::CastingSpeed => self.casting_speed,
            Stat::VisionRange => self.vision_range,
            Stat::HpRegen => self.hp_regen,
            Stat::MpRegen => self.mp_regen,
            Stat::Agility => self.agility,
        }
    }

    fn slot(&mut self, stat: Stat) -> &mut f32 {
        match stat {
            Stat::MaxHp => &mut self.max_hp,
            Stat::MaxMp => &mut self.max_mp,
            Stat::AttackPower => &mut self.attack_power,
            Stat::SpellPower => &mut self.spell_power,
            Stat::AttackRange => &mut self.attack_range,
            Stat::MovementSpeed => &mut self.movement_speed,
            Stat::AttackSpeed => &mut self.attack_speed,
            Stat::CastingSpeed => &mut self.casting_speed,
            Stat::VisionRange => &mut self.vision_range,
            Stat::HpRegen => &mut self.hp_regen,
            Stat::MpRegen => &mut self.mp_regen,
            Stat::Agility => &mut self.agility,
        }
    }

    pub fn set(&mut self, stat: Stat, value: f32) {
        *self.slot(stat) = value;
    }

    /// Apply one layer of modifiers: all flats, then all percents
    fn apply_layer<'a>(&mut self, modifiers: impl IntoIterator<Item = &'a StatModifier>) {
        let mut percents: Vec<&StatModifier> = Vec::new();
        for modifier in modifiers {
            match modifier.kind {
                ModifierKind::Flat => *self.slot(modifier.stat) += sanitize(modifier.amount, 0.0),
                ModifierKind::Percent => percents.push(modifier),
            }
        }
        for modifier in percents {
            let value = self.slot(modifier.stat);
            *value *= 1.0 + sanitize(modifier.amount, 0.0) / 100.0;
        }
    }

    fn clamp_all(&mut self) {
        for stat in Stat::ALL {
            let value = self.slot(stat);
            *value = sanitize(*value, stat.floor()).max(stat.floor());
        }
    }
}

/// Job template: the first layer of derivation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobTemplate {
    pub job: Job,
    pub stats: DerivedStats,
}

impl JobTemplate {
    pub fn new(job: Job, stats: DerivedStats) -> Self {
        Self { job, stats }
    }

    pub fn for_job(job: Job) -> Self {
        let stats = match job {
            Job::Warrior => DerivedStats {
                max_hp: 40.0,
                max_mp: 10.0,
                attack_power: 7.0,
                spell_power: 0.0,
                attack_range: 1.5,
                movement_speed: 4.0,
                attack_speed: 1.0,
                casting_speed: 0.8,
                vision_range: 12.0,
                hp_regen: 0.5,
                mp_regen: 0.5,
                agility: 0.0,
            },
            Job::Archer => DerivedStats {
                max_hp: 28.0,
                max_mp: 10.0,
                attack_power: 6.0,
                spell_power: 0.0,
                attack_range: 8.0,
                movement_speed: 4.5,
                attack_speed: 1.1,
                casting_speed: 1.0,
                vision_range: 16.0,
                hp_regen: 0.3,
                mp_regen: 0.5,
                agility: 0.0,
            },
            Job::Wizard => DerivedStats {
                max_hp: 22.0,
                max_mp: 40.0,
                attack_power: 3.0,
                spell_power: 8.0,
                attack_range: 6.0,
                movement_speed: 3.5,
                attack_speed: 0.8,
                casting_speed: 1.2,
                vision_range: 14.0,
                hp_regen: 0.2,
                mp_regen: 2.0,
                agility: 0.0,
            },
            Job::Healer => DerivedStats {
                max_hp: 24.0,
                max_mp: 40.0,
                attack_power: 3.0,
                spell_power: 6.0,
                attack_range: 5.0,
                movement_speed: 3.5,
                attack_speed: 0.8,
                casting_speed: 1.1,
                vision_range: 14.0,
                hp_regen: 0.3,
                mp_regen: 2.0,
                agility: 0.0,
            },
            Job::Summoner => DerivedStats {
                max_hp: 22.0,
                max_mp: 45.0,
                attack_power: 3.0,
                spell_power: 7.0,
                attack_range: 5.0,
                movement_speed: 3.5,
                attack_speed: 0.8,
                casting_speed: 1.0,
                vision_range: 14.0,
                hp_regen: 0.2,
                mp_regen: 2.5,
                agility: 0.0,
            },
            Job::Bard => DerivedStats {
                max_hp: 26.0,
                max_mp: 30.0,
                attack_power: 4.0,
                spell_power: 5.0,
                attack_range: 4.0,
                movement_speed: 4.0,
                attack_speed: 1.0,
                casting_speed: 1.0,
                vision_range: 14.0,
                hp_regen: 0.3,
                mp_regen: 1.5,
                agility: 0.0,
            },
            Job::Rogue => DerivedStats {
                max_hp: 26.0,
                max_mp: 10.0,
                attack_power: 6.0,
                spell_power: 0.0,
                attack_range: 1.5,
                movement_speed: 5.5,
                attack_speed: 1.3,
                casting_speed: 1.0,
                vision_range: 14.0,
                hp_regen: 0.3,
                mp_regen: 0.5,
                agility: 0.0,
            },
            Job::Beast => DerivedStats {
                max_hp: 30.0,
                max_mp: 0.0,
                attack_power: 5.0,
                spell_power: 0.0,
                attack_range: 1.5,
                movement_speed: 5.0,
                attack_speed: 1.0,
                casting_speed: 1.0,
                vision_range: 10.0,
                hp_regen: 0.5,
                mp_regen: 0.0,
                agility: 0.0,
            },
            Job::Ghost => DerivedStats {
                max_hp: 24.0,
                max_mp: 40.0,
                attack_power: 4.0,
                spell_power: 4.0,
                attack_range: 1.5,
                movement_speed: 5.0,
                attack_speed: 1.0,
                casting_speed: 1.2,
                vision_range: 16.0,
                hp_regen: 0.2,
                mp_regen: 2.0,
                agility: 0.0,
            },
        };
        Self { job, stats }
    }
}

/// Everything the derivation reads
pub struct StatInputs<'a> {
    pub template: &'a JobTemplate,
    pub base: &'a BaseStats,
    pub level: u32,
    pub traits: &'a [Trait],
    pub equipment: &'a Equipment,
    pub effects: &'a [StatusEffect],
}

/// Stat derivation pipeline
pub struct StatModel;

impl StatModel {
    /// Derive all stats from their inputs
    pub fn derive(inputs: &StatInputs<'_>) -> DerivedStats {
        let mut stats = inputs.template.stats;
        let sliders = inputs.base.at_level(inputs.level.max(1));

        stats.max_hp += sliders.endurance * 2.0;
        stats.max_mp += sliders.focus * 2.0;
        stats.attack_power += sliders.strength * 0.5;
        stats.spell_power += sliders.intelligence * 0.5;
        stats.movement_speed += sliders.agility * 0.1;
        stats.attack_speed += sliders.agility * 0.02;
        stats.casting_speed += sliders.focus * 0.02;
        stats.hp_regen += sliders.endurance * 0.05;
        stats.mp_regen += sliders.focus * 0.05;
        stats.agility += sliders.agility;

        let trait_modifiers: Vec<StatModifier> =
            inputs.traits.iter().flat_map(|t| t.modifiers()).collect();
        stats.apply_layer(&trait_modifiers);

        let equipment_modifiers = inputs.equipment.modifiers();
        stats.apply_layer(&equipment_modifiers);

        stats.apply_layer(inputs.effects.iter().flat_map(|e| e.modifiers.iter()));

        stats.clamp_all();
        stats
    }
}

/// Replace non-finite values with a safe default
pub(crate) fn sanitize(value: f32, default: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::effects::StatusEffect;
    use crate::unit::equipment::{EquipmentSlot, Item};

    fn derive(template: &JobTemplate, equipment: &Equipment, effects: &[StatusEffect]) -> DerivedStats {
        StatModel::derive(&StatInputs {
            template,
            base: &BaseStats::default(),
            level: 1,
            traits: &[],
            equipment,
            effects,
        })
    }

    #[test]
    fn test_template_passes_through_with_zero_sliders() {
        let template = JobTemplate::for_job(Job::Warrior);
        let stats = derive(&template, &Equipment::default(), &[]);
        assert_eq!(stats.max_hp, 40.0);
        assert_eq!(stats.attack_power, 7.0);
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let template = JobTemplate::for_job(Job::Archer);
        let mut equipment = Equipment::default();
        equipment.equip(EquipmentSlot::MainHand, Item::bow());
        let effects = vec![StatusEffect::haste(2)];
        let first = derive(&template, &equipment, &effects);
        let second = derive(&template, &equipment, &effects);
        assert_eq!(first, second);
    }

    #[test]
    fn test_equipment_adds_after_traits() {
        let template = JobTemplate::for_job(Job::Warrior);
        let mut equipment = Equipment::default();
        equipment.equip(EquipmentSlot::MainHand, Item::sword());
        let base = BaseStats::default();
        let stats = StatModel::derive(&StatInputs {
            template: &template,
            base: &base,
            level: 1,
            traits: &[Trait::Brawny],
            equipment: &equipment,
            effects: &[],
        });
        // 7 template + 2 brawny + 4 sword
        assert_eq!(stats.attack_power, 13.0);
    }

    #[test]
    fn test_negative_ranges_are_clamped() {
        let template = JobTemplate::for_job(Job::Warrior);
        let mut equipment = Equipment::default();
        let mut cursed = Item::new("Cursed Boots");
        cursed.modifiers.push(StatModifier::flat(Stat::MovementSpeed, -100.0));
        cursed.modifiers.push(StatModifier::flat(Stat::AttackSpeed, -100.0));
        equipment.equip(EquipmentSlot::Boots, cursed);
        let stats = derive(&template, &equipment, &[]);
        assert_eq!(stats.movement_speed, 0.0);
        assert_eq!(stats.attack_speed, Stat::AttackSpeed.floor());
    }

    #[test]
    fn test_non_finite_inputs_fall_back_to_defaults() {
        let mut template = JobTemplate::for_job(Job::Warrior);
        template.stats.attack_range = f32::NAN;
        template.stats.max_hp = f32::INFINITY;
        let stats = derive(&template, &Equipment::default(), &[]);
        assert_eq!(stats.attack_range, 0.0);
        assert_eq!(stats.max_hp, 1.0);
    }

    #[test]
    fn test_level_growth_raises_sliders() {
        let base = BaseStats::uniform(10.0);
        let grown = base.at_level(3);
        assert_eq!(grown.strength, 12.0);
        assert_eq!(base.at_level(1), base);
    }
}
