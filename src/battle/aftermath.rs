//! Aftermath pipeline
//!
//! Reacts to dispatched events: deaths start the removal timer, drop loot and
//! a corpse, pay out experience, free possessed bodies and check for a
//! winner. Damaging hits wake sleepers. Each victim is processed at most
//! once no matter how many death notices arrive.

use ahash::{AHashMap, AHashSet};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::battle::events::{BattleEvent, EventBus};
use crate::battle::roster::Battlefield;
use crate::core::config::EngineConfig;
use crate::core::types::UnitId;
use crate::unit::{EffectKind, Item, UnitKind};

#[derive(Debug, Clone)]
pub struct AftermathPipeline {
    death_grace_frames: u64,
    max_loot_roll: u32,
    spawn_corpses: bool,
    sleep_wake_hits: u32,
    exp_per_level: u32,
    kill_exp_per_level: u32,
    handled: AHashSet<UnitId>,
    /// Frames left before a dying unit leaves the field
    grace: AHashMap<UnitId, u64>,
}

impl AftermathPipeline {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            death_grace_frames: config.death_grace_frames,
            max_loot_roll: config.max_loot_roll,
            spawn_corpses: config.spawn_corpses,
            sleep_wake_hits: config.sleep_wake_hits,
            exp_per_level: config.exp_per_level,
            kill_exp_per_level: config.kill_exp_per_level,
            handled: AHashSet::new(),
            grace: AHashMap::new(),
        }
    }

    pub fn handle(&mut self, event: &BattleEvent, field: &mut Battlefield, bus: &mut EventBus) {
        match event {
            BattleEvent::EntityDeath { victim, killer } => {
                self.on_death(*victim, *killer, field, bus)
            }
            BattleEvent::EntityDamaged {
                attacker: Some(_),
                defender,
                hp_after,
                ..
            } if *hp_after > 0.0 => self.wake(*defender, field, bus),
            _ => {}
        }
    }

    /// Whether a victim's death has already been processed
    pub fn is_handled(&self, unit: UnitId) -> bool {
        self.handled.contains(&unit)
    }

    /// Units still inside their death window
    pub fn pending_removals(&self) -> usize {
        self.grace.len()
    }

    fn on_death(&mut self, victim: UnitId, killer: Option<UnitId>, field: &mut Battlefield, bus: &mut EventBus) {
        if !self.handled.insert(victim) {
            tracing::trace!(%victim, "duplicate death notice");
            return;
        }
        let Some(unit) = field.unit_mut(victim) else {
            return;
        };
        unit.begin_dying();
        let position = unit.position;
        let name = unit.name.clone();
        let level = unit.level;
        let loot = unit.strip_loot();
        self.grace.insert(victim, self.death_grace_frames);

        self.drop_loot(victim, loot, field, bus);
        if self.spawn_corpses {
            field.drop_item(Item::corpse(&name), position, Some(victim));
        }
        if let Some(killer) = killer {
            self.award_kill(killer, level, field, bus);
        }
        release_possessed(victim, field, bus);

        if let Some(result) = field.evaluate_outcome() {
            field.conclude(result, bus);
        }
    }

    /// Keep min(pool, floor(random * max_loot_roll)) shuffled items
    fn drop_loot(&self, victim: UnitId, mut pool: Vec<Item>, field: &mut Battlefield, bus: &mut EventBus) {
        let Some(position) = field.unit(victim).map(|u| u.position) else {
            return;
        };
        let rng = field.rng_mut();
        pool.shuffle(&mut *rng);
        let roll = (rng.gen::<f32>() * self.max_loot_roll as f32).floor() as usize;
        pool.truncate(roll.min(pool.len()));
        if pool.is_empty() {
            return;
        }

        let items = pool.iter().map(|i| i.id).collect();
        for item in pool {
            field.drop_item(item, position, Some(victim));
        }
        bus.publish(BattleEvent::LootDropped {
            victim,
            items,
            position,
        });
    }

    /// Players keep the whole award; mercenaries and pets split it with
    /// their owner; monsters learn nothing
    fn award_kill(&self, killer: UnitId, victim_level: u32, field: &mut Battlefield, bus: &mut EventBus) {
        let Some(kind) = field.unit(killer).map(|u| u.kind) else {
            return;
        };
        let amount = victim_level.max(1) * self.kill_exp_per_level;
        match kind {
            UnitKind::Player => self.grant(killer, amount, field, bus),
            UnitKind::Mercenary { .. } | UnitKind::Pet { .. } => {
                let half = amount / 2;
                self.grant(killer, half, field, bus);
                if let Some(owner) = kind.owner() {
                    self.grant(owner, half, field, bus);
                }
            }
            UnitKind::Monster => {}
        }
    }

    fn grant(&self, unit_id: UnitId, amount: u32, field: &mut Battlefield, bus: &mut EventBus) {
        if amount == 0 {
            return;
        }
        let Some(unit) = field.unit_mut(unit_id) else {
            return;
        };
        let gained = unit.gain_exp(amount, self.exp_per_level);
        bus.publish(BattleEvent::ExperienceAwarded {
            unit: unit_id,
            amount,
        });
        if gained > 0 {
            tracing::info!(unit = %unit_id, level = unit.level, "level up");
            bus.publish(BattleEvent::LevelUp {
                unit: unit_id,
                level: unit.level,
            });
        }
    }

    fn wake(&self, unit_id: UnitId, field: &mut Battlefield, bus: &mut EventBus) {
        let Some(unit) = field.unit_mut(unit_id) else {
            return;
        };
        if unit.has_effect(EffectKind::Sleep) && unit.register_hit(self.sleep_wake_hits) {
            tracing::debug!(unit = %unit_id, "woke up");
            bus.publish(BattleEvent::UnitWoke { unit: unit_id });
        }
    }

    /// Count down death windows; units whose window closes are removed
    pub fn advance_frames(&mut self, frames: u32, field: &mut Battlefield, bus: &mut EventBus) -> Vec<UnitId> {
        let mut expired = Vec::new();
        for (id, left) in self.grace.iter_mut() {
            *left = left.saturating_sub(frames as u64);
            if *left == 0 {
                expired.push(*id);
            }
        }
        expired.sort();
        for id in &expired {
            self.grace.remove(id);
            self.remove(*id, field, bus);
        }
        expired
    }

    /// Remove every unit still in its death window
    pub fn flush(&mut self, field: &mut Battlefield, bus: &mut EventBus) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self.grace.drain().map(|(id, _)| id).collect();
        ids.sort();
        for id in &ids {
            self.remove(*id, field, bus);
        }
        ids
    }

    fn remove(&self, id: UnitId, field: &mut Battlefield, bus: &mut EventBus) {
        if field.remove_unit(id).is_some() {
            tracing::debug!(unit = %id, "removed from field");
            bus.publish(BattleEvent::UnitRemoved { unit: id });
        }
    }
}

/// A dead ghost lets go of every body it held
fn release_possessed(ghost: UnitId, field: &mut Battlefield, bus: &mut EventBus) {
    let held: Vec<UnitId> = field
        .units()
        .iter()
        .filter(|u| u.strategy().possessor() == Some(ghost))
        .map(|u| u.id)
        .collect();
    for id in held {
        if let Some(unit) = field.unit_mut(id) {
            unit.release_possession();
            bus.publish(BattleEvent::PossessionEnded { unit: id, ghost });
        }
    }
}
