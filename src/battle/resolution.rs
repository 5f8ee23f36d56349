//! Combat calculator
//!
//! Computes damage/heal amounts and applies them to units, publishing the
//! domain events downstream handlers react to. Shield is always consumed
//! before hp and hp never drops below zero.

use crate::battle::events::{BattleEvent, EventBus};
use crate::core::config::EngineConfig;
use crate::core::types::UnitId;
use crate::skills::SkillDefinition;
use crate::unit::{EquipmentSlot, StatusEffect, Unit, UnitKind};

/// Exp a weapon gains per landed hit
const WEAPON_EXP_PER_HIT: u32 = 1;

/// Durability lost per hit dealt or damaging hit taken
const WEAR_PER_HIT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttackReport {
    /// Damage before the shield
    pub damage: f32,
    pub absorbed: f32,
    pub hp_lost: f32,
    pub target_died: bool,
}

/// Raw damage of a basic attack or a damaging skill
///
/// Skill: base power plus the caster's scaling stat. Basic: attack power.
pub fn attack_damage(attacker: &Unit, skill: Option<&SkillDefinition>) -> f32 {
    match skill {
        Some(def) => def.power_with(def.scaling.map_or(0.0, |s| attacker.stat(s))),
        None => attacker.stats().attack_power,
    }
}

/// Heal/shield/buff magnitude of a support skill
pub fn support_power(caster: &Unit, def: &SkillDefinition) -> f32 {
    def.power_with(def.scaling.map_or(0.0, |s| caster.stat(s)))
}

/// Rounds until the next basic attack: max(1, round(base / attack speed))
pub fn attack_cooldown(attacker: &Unit, config: &EngineConfig) -> u32 {
    let base = attacker
        .equipment()
        .weapon_cooldown()
        .unwrap_or(config.default_attack_cooldown);
    scaled_cooldown(base, attacker.stats().attack_speed)
}

/// Rounds until a skill is ready again, on the same attack speed scaling
pub fn skill_cooldown(caster: &Unit, def: &SkillDefinition) -> u32 {
    scaled_cooldown(def.base_cooldown, caster.stats().attack_speed)
}

fn scaled_cooldown(base: f32, speed: f32) -> u32 {
    let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
    let rounds = (base / speed).round();
    if rounds.is_finite() {
        (rounds as u32).max(1)
    } else {
        1
    }
}

/// Apply one attack (basic or damaging skill) from `attacker` to `defender`
pub fn apply_attack(
    attacker: &mut Unit,
    defender: &mut Unit,
    skill: Option<&SkillDefinition>,
    bus: &mut EventBus,
) -> AttackReport {
    bus.publish(BattleEvent::EntityAttack {
        attacker: attacker.id,
        defender: defender.id,
        skill: skill.map(|d| d.id),
    });

    let damage = attack_damage(attacker, skill);
    bus.publish(BattleEvent::DamageCalculated {
        attacker: attacker.id,
        defender: defender.id,
        damage,
    });

    let taken = defender.take_damage(damage);
    bus.publish(BattleEvent::EntityDamaged {
        attacker: Some(attacker.id),
        defender: defender.id,
        damage,
        absorbed: taken.absorbed,
        hp_after: defender.hp(),
    });
    tracing::debug!(
        attacker = %attacker.id,
        defender = %defender.id,
        damage,
        absorbed = taken.absorbed,
        hp = defender.hp(),
        "hit"
    );

    // Gear wear and weapon practice; basic attacks only
    if skill.is_none() {
        if let Some(item) = attacker.wear(EquipmentSlot::MainHand, WEAR_PER_HIT) {
            bus.publish(BattleEvent::ItemBroken {
                unit: attacker.id,
                item: item.id,
                slot: EquipmentSlot::MainHand,
            });
        }
        if let Some(level) = attacker.train_weapon(WEAPON_EXP_PER_HIT) {
            bus.publish(BattleEvent::WeaponLeveled {
                unit: attacker.id,
                level,
            });
        }
    }
    if taken.hp_lost > 0.0 && defender.is_alive() {
        for slot in EquipmentSlot::ALL.into_iter().filter(|s| s.is_protective()) {
            if let Some(item) = defender.wear(slot, WEAR_PER_HIT) {
                bus.publish(BattleEvent::ItemBroken {
                    unit: defender.id,
                    item: item.id,
                    slot,
                });
            }
        }
    }

    if taken.died {
        attacker.kills += 1;
        publish_death(defender, Some(attacker.id), bus);
    }

    AttackReport {
        damage,
        absorbed: taken.absorbed,
        hp_lost: taken.hp_lost,
        target_died: taken.died,
    }
}

/// Death notice for a unit whose hp just reached zero
pub fn publish_death(victim: &Unit, killer: Option<UnitId>, bus: &mut EventBus) {
    tracing::info!(victim = %victim.id, killer = ?killer, "unit died");
    bus.publish(BattleEvent::EntityDeath {
        victim: victim.id,
        killer,
    });
    if matches!(victim.kind, UnitKind::Monster) {
        bus.publish(BattleEvent::MonsterDefeated {
            victim: victim.id,
            killer,
        });
    }
}

pub fn apply_heal(caster: UnitId, target: &mut Unit, amount: f32, bus: &mut EventBus) -> f32 {
    let healed = target.heal(amount);
    bus.publish(BattleEvent::EntityHealed {
        healer: caster,
        target: target.id,
        amount: healed,
    });
    healed
}

pub fn apply_shield(caster: UnitId, target: &mut Unit, amount: f32, bus: &mut EventBus) -> f32 {
    let before = target.shield();
    target.add_shield(amount);
    let granted = target.shield() - before;
    bus.publish(BattleEvent::ShieldGranted {
        caster,
        target: target.id,
        amount: granted,
    });
    granted
}

/// Apply a status effect; returns whether it was newly added
pub fn apply_status(target: &mut Unit, effect: StatusEffect, bus: &mut EventBus) -> bool {
    let kind = effect.kind;
    let source = effect.source;
    let added = target.apply_effect(effect);
    bus.publish(BattleEvent::StatusApplied {
        unit: target.id,
        effect: kind,
        source,
    });
    added
}
