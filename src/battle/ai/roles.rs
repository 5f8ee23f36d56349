//! Skill eligibility rules for role strategies
//!
//! A role scans its unit's ready skills in learned order; the first skill
//! that is affordable and has an eligible target becomes the intent.

use crate::battle::ai::decision_context::{UnitSnapshot, WorldSnapshot};
use crate::battle::ai::{ActionIntent, Role};
use crate::core::types::UnitId;
use crate::skills::{get_skill_definition, SkillDefinition, SkillEffect};
use crate::unit::EffectKind;

/// Allies below this hp ratio are worth a barrier
const BARRIER_THRESHOLD: f32 = 0.5;

/// hp ratio below which a role will spend a heal on an ally
///
/// Dedicated healers top up any wound; everyone else waits for real damage.
pub fn heal_threshold(role: Role) -> f32 {
    match role {
        Role::Healer => 1.0,
        Role::Summoner | Role::Bard => 0.75,
        Role::Archer | Role::Wizard | Role::Warrior | Role::Ghost => 0.5,
    }
}

/// First eligible skill intent, or None to fall back to movement/attack
pub fn choose_skill(
    role: Role,
    actor: &UnitSnapshot,
    world: &WorldSnapshot,
    max_summons: u32,
) -> Option<ActionIntent> {
    for skill in actor.skills.ready() {
        let Some(def) = get_skill_definition(skill) else {
            continue;
        };
        if actor.mp + f32::EPSILON < def.mp_cost {
            continue;
        }
        if let Some(target) = eligible_target(role, def, actor, world, max_summons) {
            tracing::debug!(actor = %actor.id, ?skill, %target, "skill chosen");
            return Some(ActionIntent::Skill { skill, target });
        }
    }
    None
}

/// Target the skill would be aimed at right now, if its rule is satisfied
pub fn eligible_target(
    role: Role,
    def: &SkillDefinition,
    actor: &UnitSnapshot,
    world: &WorldSnapshot,
    max_summons: u32,
) -> Option<UnitId> {
    match def.effect {
        SkillEffect::Heal => {
            let threshold = heal_threshold(role);
            world
                .weakest_ally_within(actor, def.range, |u| {
                    u.is_wounded() && u.hp_ratio() < threshold
                })
                .map(|u| u.id)
        }
        SkillEffect::Shield => world
            .weakest_ally_within(actor, def.range, |u| {
                u.hp_ratio() < BARRIER_THRESHOLD && u.shield <= 0.0
            })
            .map(|u| u.id),
        SkillEffect::Damage => world.nearest_enemy_within(actor, def.range).map(|u| u.id),
        SkillEffect::Sleep => nearest_matching_enemy(actor, world, def.range, |u| {
            !u.has_effect(EffectKind::Sleep)
        }),
        SkillEffect::Inspire => nearest_unbuffed_ally(actor, world, def.range, EffectKind::Inspired),
        SkillEffect::Haste => nearest_unbuffed_ally(actor, world, def.range, EffectKind::Haste),
        SkillEffect::Summon => {
            world.nearest_enemy(actor)?;
            (world.living_summons(actor.id) < max_summons as usize).then_some(actor.id)
        }
        SkillEffect::Regenerate => {
            let threshold = heal_threshold(role);
            world
                .weakest_ally_within(actor, def.range, |u| {
                    u.is_wounded()
                        && u.hp_ratio() < threshold
                        && !u.has_effect(EffectKind::Regeneration)
                })
                .map(|u| u.id)
        }
        SkillEffect::Poison => nearest_matching_enemy(actor, world, def.range, |u| {
            !u.has_effect(EffectKind::Poison)
        }),
        SkillEffect::Slow => nearest_matching_enemy(actor, world, def.range, |u| {
            !u.has_effect(EffectKind::Slow)
        }),
        SkillEffect::Possess => nearest_matching_enemy(actor, world, def.range, |u| {
            !u.has_effect(EffectKind::Possession)
        }),
    }
}

/// Closest ally in range without `kind`, only while there is a fight to win
fn nearest_unbuffed_ally(
    actor: &UnitSnapshot,
    world: &WorldSnapshot,
    range: f32,
    kind: EffectKind,
) -> Option<UnitId> {
    world.nearest_enemy(actor)?;
    let mut best: Option<(UnitId, f32)> = None;
    for ally in world.allies_of(actor) {
        if ally.has_effect(kind) {
            continue;
        }
        let d = actor.distance_to(ally);
        if d > range {
            continue;
        }
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((ally.id, d)),
        }
    }
    best.map(|(id, _)| id)
}

fn nearest_matching_enemy(
    actor: &UnitSnapshot,
    world: &WorldSnapshot,
    range: f32,
    filter: impl Fn(&UnitSnapshot) -> bool,
) -> Option<UnitId> {
    let mut best: Option<(UnitId, f32)> = None;
    for enemy in world.enemies_of(actor) {
        if !filter(enemy) {
            continue;
        }
        let d = actor.distance_to(enemy);
        if d > range {
            continue;
        }
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((enemy.id, d)),
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Bounds, TeamId, Vec2};
    use crate::skills::SkillId;
    use crate::unit::{Job, StatusEffect, Unit, UnitFactory, UnitSpec};

    fn build(specs: Vec<UnitSpec>) -> Vec<Unit> {
        let mut factory = UnitFactory::new();
        specs.into_iter().map(|s| factory.create(s)).collect()
    }

    fn world(units: &[Unit]) -> WorldSnapshot {
        WorldSnapshot::new(1, Bounds::new(50.0), units.iter().map(Unit::snapshot).collect())
    }

    #[test]
    fn test_healer_heals_wounded_ally() {
        let mut units = build(vec![
            UnitSpec::new("healer", Job::Healer, TeamId(1)),
            UnitSpec::new("tank", Job::Warrior, TeamId(1)).at(Vec2::new(2.0, 0.0)),
            UnitSpec::new("foe", Job::Warrior, TeamId(2)).at(Vec2::new(3.0, 0.0)),
        ]);
        units[1].take_damage(5.0);
        let w = world(&units);
        let intent = choose_skill(Role::Healer, &w.units[0], &w, 2);
        assert_eq!(
            intent,
            Some(ActionIntent::Skill {
                skill: SkillId::Heal,
                target: units[1].id
            })
        );
    }

    #[test]
    fn test_warrior_waits_for_heavier_wounds() {
        let mut units = build(vec![
            UnitSpec::new("w", Job::Warrior, TeamId(1)).skills([SkillId::Heal]),
            UnitSpec::new("ally", Job::Warrior, TeamId(1)).at(Vec2::new(1.0, 0.0)),
        ]);
        units[1].take_damage(5.0);
        let w = world(&units);
        assert!(choose_skill(Role::Warrior, &w.units[0], &w, 2).is_none());
    }

    #[test]
    fn test_skill_on_cooldown_is_skipped() {
        let mut units = build(vec![
            UnitSpec::new("wiz", Job::Wizard, TeamId(1)).skills([SkillId::Fireball, SkillId::Barrier]),
            UnitSpec::new("foe", Job::Warrior, TeamId(2)).at(Vec2::new(4.0, 0.0)),
        ]);
        units[0].skills.start_cooldown(SkillId::Fireball, 2);
        let w = world(&units);
        assert!(choose_skill(Role::Wizard, &w.units[0], &w, 2).is_none());
    }

    #[test]
    fn test_unaffordable_skill_is_skipped() {
        let mut units = build(vec![
            UnitSpec::new("wiz", Job::Wizard, TeamId(1)),
            UnitSpec::new("foe", Job::Warrior, TeamId(2)).at(Vec2::new(4.0, 0.0)),
        ]);
        units[0].set_mp(1.0);
        let w = world(&units);
        assert!(choose_skill(Role::Wizard, &w.units[0], &w, 2).is_none());
    }

    #[test]
    fn test_lullaby_skips_sleeping_enemies() {
        let mut units = build(vec![
            UnitSpec::new("bard", Job::Bard, TeamId(1)).skills([SkillId::Lullaby]),
            UnitSpec::new("near", Job::Warrior, TeamId(2)).at(Vec2::new(2.0, 0.0)),
            UnitSpec::new("far", Job::Warrior, TeamId(2)).at(Vec2::new(5.0, 0.0)),
        ]);
        units[1].apply_effect(StatusEffect::sleep(2));
        let w = world(&units);
        assert_eq!(
            choose_skill(Role::Bard, &w.units[0], &w, 2),
            Some(ActionIntent::Skill {
                skill: SkillId::Lullaby,
                target: units[2].id
            })
        );
    }

    #[test]
    fn test_wizard_slows_when_fireball_is_down() {
        let mut units = build(vec![
            UnitSpec::new("wiz", Job::Wizard, TeamId(1)),
            UnitSpec::new("foe", Job::Warrior, TeamId(2)).at(Vec2::new(4.0, 0.0)),
        ]);
        units[0].skills.start_cooldown(SkillId::Fireball, 2);
        let w = world(&units);
        assert_eq!(
            choose_skill(Role::Wizard, &w.units[0], &w, 2),
            Some(ActionIntent::Skill {
                skill: SkillId::Frostbolt,
                target: units[1].id
            })
        );

        units[1].apply_effect(StatusEffect::slow(2));
        let w = world(&units);
        assert!(choose_skill(Role::Wizard, &w.units[0], &w, 2).is_none());
    }

    #[test]
    fn test_archer_poisons_unpoisoned_enemies() {
        let mut units = build(vec![
            UnitSpec::new("archer", Job::Archer, TeamId(1)).skills([SkillId::PoisonArrow]),
            UnitSpec::new("near", Job::Warrior, TeamId(2)).at(Vec2::new(3.0, 0.0)),
            UnitSpec::new("far", Job::Warrior, TeamId(2)).at(Vec2::new(6.0, 0.0)),
        ]);
        units[1].apply_effect(StatusEffect::poison(2, 2.0));
        let w = world(&units);
        assert_eq!(
            choose_skill(Role::Archer, &w.units[0], &w, 2),
            Some(ActionIntent::Skill {
                skill: SkillId::PoisonArrow,
                target: units[2].id
            })
        );
    }

    #[test]
    fn test_renew_goes_to_wounded_ally_without_regeneration() {
        let mut units = build(vec![
            UnitSpec::new("healer", Job::Healer, TeamId(1)).skills([SkillId::Renew]),
            UnitSpec::new("a", Job::Warrior, TeamId(1)).at(Vec2::new(1.0, 0.0)),
            UnitSpec::new("b", Job::Warrior, TeamId(1)).at(Vec2::new(2.0, 0.0)),
        ]);
        units[1].take_damage(20.0);
        units[2].take_damage(5.0);
        units[1].apply_effect(StatusEffect::regeneration(2, 3.0));
        let w = world(&units);
        assert_eq!(
            choose_skill(Role::Healer, &w.units[0], &w, 2),
            Some(ActionIntent::Skill {
                skill: SkillId::Renew,
                target: units[2].id
            })
        );
    }

    #[test]
    fn test_bard_quickens_nearest_ally() {
        let units = build(vec![
            UnitSpec::new("bard", Job::Bard, TeamId(1)).skills([SkillId::Quicken]),
            UnitSpec::new("tank", Job::Warrior, TeamId(1)).at(Vec2::new(1.0, 0.0)),
            UnitSpec::new("foe", Job::Warrior, TeamId(2)).at(Vec2::new(20.0, 0.0)),
        ]);
        let w = world(&units);
        // The bard itself is the closest ally
        assert_eq!(
            choose_skill(Role::Bard, &w.units[0], &w, 2),
            Some(ActionIntent::Skill {
                skill: SkillId::Quicken,
                target: units[0].id
            })
        );
    }

    #[test]
    fn test_ghost_possesses_free_enemy_in_range() {
        let mut units = build(vec![
            UnitSpec::new("ghost", Job::Ghost, TeamId(1)),
            UnitSpec::new("held", Job::Warrior, TeamId(2)).at(Vec2::new(2.0, 0.0)),
            UnitSpec::new("free", Job::Warrior, TeamId(2)).at(Vec2::new(4.0, 0.0)),
        ]);
        units[1].apply_effect(StatusEffect::possession(2));
        let w = world(&units);
        assert_eq!(
            choose_skill(Role::Ghost, &w.units[0], &w, 2),
            Some(ActionIntent::Skill {
                skill: SkillId::Possess,
                target: units[2].id
            })
        );
    }

    #[test]
    fn test_summon_respects_cap() {
        let units = build(vec![
            UnitSpec::new("sum", Job::Summoner, TeamId(1)),
            UnitSpec::new("foe", Job::Warrior, TeamId(2)).at(Vec2::new(20.0, 0.0)),
        ]);
        let w = world(&units);
        assert_eq!(
            choose_skill(Role::Summoner, &w.units[0], &w, 1),
            Some(ActionIntent::Skill {
                skill: SkillId::SummonWolf,
                target: units[0].id
            })
        );
        assert!(choose_skill(Role::Summoner, &w.units[0], &w, 0).is_none());
    }
}
