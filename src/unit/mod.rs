//! Combat participants
//!
//! One flat `Unit` record for players, mercenaries, monsters and pets; the
//! `UnitKind` carries the kind-specific fields. hp, mp and shield are private
//! so every write goes through a clamping method.

pub mod effects;
pub mod equipment;
pub mod factory;
pub mod snapshot;
pub mod stats;

pub use effects::{ActiveEffects, EffectKind, EffectTick, StatusEffect};
pub use equipment::{Durability, Equipment, EquipmentSlot, Item, ItemTag, WeaponProgress};
pub use factory::{UnitFactory, UnitSpec};
pub use snapshot::UnitSnapshot;
pub use stats::{
    BaseStats, DerivedStats, Job, JobTemplate, ModifierKind, Stat, StatInputs, StatModel,
    StatModifier, Trait,
};

use serde::{Deserialize, Serialize};

use crate::battle::ai::Strategy;
use crate::core::types::{TeamId, UnitId, Vec2};
use crate::skills::SkillLibrary;
use crate::unit::stats::sanitize;

/// What sort of participant a unit is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitKind {
    Player,
    Mercenary { owner: Option<UnitId> },
    Monster,
    Pet { owner: UnitId },
}

impl UnitKind {
    /// Player-side unit that shares kill experience with this one
    pub fn owner(&self) -> Option<UnitId> {
        match self {
            UnitKind::Mercenary { owner } => *owner,
            UnitKind::Pet { owner } => Some(*owner),
            UnitKind::Player | UnitKind::Monster => None,
        }
    }
}

/// Result of pushing damage through shield and hp
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageTaken {
    pub absorbed: f32,
    pub hp_lost: f32,
    /// hp went from above zero to zero with this hit
    pub died: bool,
}

/// Start-of-round bookkeeping result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundUpkeep {
    pub poison: DamageTaken,
    pub regenerated: f32,
    pub expired: Vec<EffectKind>,
    /// Ghost whose possession ran out this round
    pub released_from: Option<UnitId>,
}

/// Combat participant
#[derive(Debug, Clone)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub kind: UnitKind,
    pub team: TeamId,
    pub position: Vec2,

    // Derivation inputs
    pub template: JobTemplate,
    pub base: BaseStats,
    pub traits: Vec<Trait>,
    pub level: u32,
    pub exp: u32,
    equipment: Equipment,
    effects: ActiveEffects,
    stats: DerivedStats,

    // Resources
    hp: f32,
    mp: f32,
    shield: f32,

    pub skills: SkillLibrary,
    /// Rounds until a basic attack is available again
    pub attack_cooldown: u32,
    strategy: Strategy,

    pub consumables: Vec<Item>,
    pub consumable_capacity: usize,
    pub kills: u32,
    /// Marked for reward scoring (over/under-performance tracking)
    pub flagged: bool,
    dying: bool,
}

impl Unit {
    /// Create a unit at full hp/mp with stats derived from its inputs
    pub fn new(
        id: UnitId,
        name: impl Into<String>,
        kind: UnitKind,
        team: TeamId,
        template: JobTemplate,
        base: BaseStats,
    ) -> Self {
        let mut unit = Self {
            id,
            name: name.into(),
            kind,
            team,
            position: Vec2::ZERO,
            template,
            base,
            traits: Vec::new(),
            level: 1,
            exp: 0,
            equipment: Equipment::new(),
            effects: ActiveEffects::new(),
            stats: DerivedStats::default(),
            hp: 0.0,
            mp: 0.0,
            shield: 0.0,
            skills: SkillLibrary::new(),
            attack_cooldown: 0,
            strategy: Strategy::for_job(template.job),
            consumables: Vec::new(),
            consumable_capacity: 4,
            kills: 0,
            flagged: false,
            dying: false,
        };
        unit.recalculate();
        unit.hp = unit.stats.max_hp;
        unit.mp = unit.stats.max_mp;
        unit
    }

    // === STATS ===

    /// Recompute derived stats from base, traits, equipment and effects
    ///
    /// Current hp/mp are left alone except for clamping down to new maxima.
    pub fn recalculate(&mut self) {
        self.stats = StatModel::derive(&StatInputs {
            template: &self.template,
            base: &self.base,
            level: self.level,
            traits: &self.traits,
            equipment: &self.equipment,
            effects: self.effects.as_slice(),
        });
        self.hp = sanitize(self.hp, 0.0).clamp(0.0, self.stats.max_hp);
        self.mp = sanitize(self.mp, 0.0).clamp(0.0, self.stats.max_mp);
        self.shield = sanitize(self.shield, 0.0).max(0.0);
    }

    pub fn stat(&self, stat: Stat) -> f32 {
        self.stats.get(stat)
    }

    pub fn stats(&self) -> &DerivedStats {
        &self.stats
    }

    pub fn add_trait(&mut self, t: Trait) {
        if !self.traits.contains(&t) {
            self.traits.push(t);
            self.recalculate();
        }
    }

    // === RESOURCES ===

    pub fn hp(&self) -> f32 {
        self.hp
    }

    pub fn max_hp(&self) -> f32 {
        self.stats.max_hp
    }

    pub fn mp(&self) -> f32 {
        self.mp
    }

    pub fn shield(&self) -> f32 {
        self.shield
    }

    pub fn set_hp(&mut self, hp: f32) {
        self.hp = sanitize(hp, 0.0).clamp(0.0, self.stats.max_hp);
    }

    pub fn set_mp(&mut self, mp: f32) {
        self.mp = sanitize(mp, 0.0).clamp(0.0, self.stats.max_mp);
    }

    pub fn add_shield(&mut self, amount: f32) {
        self.shield = (self.shield + sanitize(amount, 0.0)).max(0.0);
    }

    /// Apply damage: shield first, remainder to hp, hp floored at zero
    pub fn take_damage(&mut self, amount: f32) -> DamageTaken {
        let damage = sanitize(amount, 0.0).max(0.0);
        let was_alive = self.hp > 0.0;

        let absorbed = self.shield.min(damage);
        self.shield -= absorbed;
        let remainder = damage - absorbed;

        let before = self.hp;
        self.hp = (self.hp - remainder).max(0.0);

        DamageTaken {
            absorbed,
            hp_lost: before - self.hp,
            died: was_alive && self.hp <= 0.0,
        }
    }

    /// Restore hp up to max; returns the amount actually healed
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !self.is_alive() {
            return 0.0;
        }
        let before = self.hp;
        self.hp = (self.hp + sanitize(amount, 0.0).max(0.0)).min(self.stats.max_hp);
        self.hp - before
    }

    /// Spend mana if there is enough
    pub fn spend_mp(&mut self, cost: f32) -> bool {
        let cost = sanitize(cost, 0.0).max(0.0);
        if self.mp + f32::EPSILON < cost {
            return false;
        }
        self.mp = (self.mp - cost).max(0.0);
        true
    }

    /// Explicit regen tick: the only path by which hp/mp grow passively
    pub fn regen(&mut self, dt: f32) {
        if !self.is_alive() {
            return;
        }
        let dt = sanitize(dt, 0.0).max(0.0);
        self.hp = (self.hp + self.stats.hp_regen * dt).min(self.stats.max_hp);
        self.mp = (self.mp + self.stats.mp_regen * dt).min(self.stats.max_mp);
    }

    // === LIFECYCLE ===

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn is_dying(&self) -> bool {
        self.dying
    }

    /// Mark as dying; returns false if already marked
    pub fn begin_dying(&mut self) -> bool {
        if self.dying {
            return false;
        }
        self.dying = true;
        true
    }

    /// Alive, not in its death window, and awake
    pub fn can_act(&self) -> bool {
        self.is_alive() && !self.dying && !self.effects.has(EffectKind::Sleep)
    }

    /// Valid target for new actions
    pub fn is_targetable(&self) -> bool {
        self.is_alive() && !self.dying
    }

    // === EQUIPMENT ===

    pub fn equipment(&self) -> &Equipment {
        &self.equipment
    }

    /// Equip an item, returning whatever the slot held
    pub fn equip(&mut self, slot: EquipmentSlot, item: Item) -> Option<Item> {
        let previous = self.equipment.equip(slot, item);
        self.recalculate();
        previous
    }

    pub fn unequip(&mut self, slot: EquipmentSlot) -> Option<Item> {
        let removed = self.equipment.unequip(slot);
        if removed.is_some() {
            self.recalculate();
        }
        removed
    }

    /// Wear a slot; a broken item is removed, stats recomputed, and returned
    pub fn wear(&mut self, slot: EquipmentSlot, amount: u32) -> Option<Item> {
        let broken = self.equipment.wear(slot, amount);
        if broken.is_some() {
            self.recalculate();
        }
        broken
    }

    /// Feed main-hand weapon progression; returns the new level on level-up
    pub fn train_weapon(&mut self, exp: u32) -> Option<u32> {
        let progress = self
            .equipment
            .get_mut(EquipmentSlot::MainHand)
            .and_then(|item| item.progress.as_mut())?;
        if progress.gain(exp) {
            let level = progress.level;
            self.recalculate();
            Some(level)
        } else {
            None
        }
    }

    /// Total declared carried weight, None if nothing declares one
    pub fn carried_weight(&self) -> Option<u32> {
        self.equipment.declared_weight()
    }

    /// Take everything droppable: equipped items then consumables
    pub fn strip_loot(&mut self) -> Vec<Item> {
        let mut pool = self.equipment.drain();
        pool.append(&mut self.consumables);
        self.recalculate();
        pool
    }

    /// Add to the consumable pouch if there is room
    pub fn stash(&mut self, item: Item) -> Result<(), Item> {
        if self.consumables.len() >= self.consumable_capacity {
            return Err(item);
        }
        self.consumables.push(item);
        Ok(())
    }

    // === EFFECTS ===

    pub fn effects(&self) -> &ActiveEffects {
        &self.effects
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.effects.has(kind)
    }

    pub fn apply_effect(&mut self, effect: StatusEffect) -> bool {
        let added = self.effects.apply(effect);
        self.recalculate();
        added
    }

    pub fn remove_effect(&mut self, kind: EffectKind) -> Option<StatusEffect> {
        let removed = self.effects.remove(kind);
        if removed.is_some() {
            self.recalculate();
        }
        removed
    }

    /// Count a damaging hit against sleep; wakes and returns true at the threshold
    pub fn register_hit(&mut self, wake_after: u32) -> bool {
        if self.effects.register_hit(wake_after) {
            self.remove_effect(EffectKind::Sleep);
            true
        } else {
            false
        }
    }

    /// Round-start upkeep: cooldowns and effect durations tick down,
    /// poison and regeneration apply
    pub fn begin_round(&mut self) -> RoundUpkeep {
        self.attack_cooldown = self.attack_cooldown.saturating_sub(1);
        self.skills.tick_round();

        let tick = self.effects.tick_round();
        if !tick.expired.is_empty() {
            self.recalculate();
        }
        let released_from = if tick.expired.contains(&EffectKind::Possession) {
            self.release_possession()
        } else {
            None
        };

        let regenerated = self.heal(tick.regeneration);
        let poison = if tick.poison_damage > 0.0 {
            self.take_damage(tick.poison_damage)
        } else {
            DamageTaken::default()
        };

        RoundUpkeep {
            poison,
            regenerated,
            expired: tick.expired,
            released_from,
        }
    }

    // === PROGRESSION ===

    /// Add experience; returns the number of levels gained
    pub fn gain_exp(&mut self, amount: u32, exp_per_level: u32) -> u32 {
        let per_level = exp_per_level.max(1);
        self.exp += amount;
        let mut gained = 0;
        while self.exp >= self.level * per_level {
            self.exp -= self.level * per_level;
            self.level += 1;
            gained += 1;
        }
        if gained > 0 {
            self.recalculate();
        }
        gained
    }

    // === STRATEGY ===

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Swap the decision strategy, returning the previous one
    pub fn set_strategy(&mut self, strategy: Strategy) -> Strategy {
        std::mem::replace(&mut self.strategy, strategy)
    }

    /// Side this unit currently fights for
    pub fn allegiance(&self) -> TeamId {
        match &self.strategy {
            Strategy::Possessed { team, .. } => *team,
            _ => self.team,
        }
    }

    /// Hand control to a ghost fighting for `team`
    pub fn possess(&mut self, by: UnitId, team: TeamId) {
        let previous = match std::mem::take(&mut self.strategy) {
            // Re-possession replaces the ghost but keeps the original strategy
            Strategy::Possessed { previous, .. } => previous,
            other => Box::new(other),
        };
        self.strategy = Strategy::Possessed { by, team, previous };
    }

    /// End possession; returns the ghost that held the unit
    pub fn release_possession(&mut self) -> Option<UnitId> {
        self.remove_effect(EffectKind::Possession);
        match std::mem::take(&mut self.strategy) {
            Strategy::Possessed { by, previous, .. } => {
                self.strategy = *previous;
                Some(by)
            }
            other => {
                self.strategy = other;
                None
            }
        }
    }

    // === SNAPSHOTS ===

    pub fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            team: self.team,
            allegiance: self.allegiance(),
            position: self.position,
            template: self.template,
            base: self.base,
            traits: self.traits.clone(),
            level: self.level,
            exp: self.exp,
            stats: self.stats,
            hp: self.hp,
            mp: self.mp,
            shield: self.shield,
            equipment: self.equipment.clone(),
            effects: self.effects.as_slice().to_vec(),
            skills: self.skills.clone(),
            attack_cooldown: self.attack_cooldown,
            strategy: self.strategy.clone(),
            consumables: self.consumables.clone(),
            consumable_capacity: self.consumable_capacity,
            kills: self.kills,
            flagged: self.flagged,
            alive: self.is_targetable(),
        }
    }

    /// Rebuild a unit from a snapshot; derived stats are recomputed, not trusted
    pub fn from_snapshot(snapshot: &UnitSnapshot) -> Self {
        let mut unit = Self {
            id: snapshot.id,
            name: snapshot.name.clone(),
            kind: snapshot.kind,
            team: snapshot.team,
            position: snapshot.position,
            template: snapshot.template,
            base: snapshot.base,
            traits: snapshot.traits.clone(),
            level: snapshot.level.max(1),
            exp: snapshot.exp,
            equipment: snapshot.equipment.clone(),
            effects: ActiveEffects::from(snapshot.effects.clone()),
            stats: DerivedStats::default(),
            hp: snapshot.hp,
            mp: snapshot.mp,
            shield: snapshot.shield,
            skills: snapshot.skills.clone(),
            attack_cooldown: snapshot.attack_cooldown,
            strategy: snapshot.strategy.clone(),
            consumables: snapshot.consumables.clone(),
            consumable_capacity: snapshot.consumable_capacity,
            kills: snapshot.kills,
            flagged: snapshot.flagged,
            dying: false,
        };
        unit.recalculate();
        unit
    }
}
