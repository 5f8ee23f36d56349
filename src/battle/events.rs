//! Domain events and the in-process event bus
//!
//! Components publish into the bus they were handed at construction; the
//! round controller drains pending events after every action and routes them
//! to the aftermath pipeline and any registered listeners. Every event is
//! also kept in an ordered log.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::battle::ai::IntentType;
use crate::battle::execution::ActionOutcome;
use crate::battle::roster::Battlefield;
use crate::core::types::{ItemId, TeamId, UnitId, Vec2};
use crate::skills::SkillId;
use crate::unit::effects::EffectKind;
use crate::unit::equipment::EquipmentSlot;

/// Topic names as seen by external pub/sub collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    EntityAttack,
    DamageCalculated,
    EntityDamaged,
    EntityHealed,
    ShieldGranted,
    EntityDeath,
    MonsterDefeated,
    UnitMoved,
    ActionResolved,
    ArenaRoundStart,
    ArenaRoundEnd,
    BattleEnded,
    MercenaryHired,
    UnitSummoned,
    StatusApplied,
    StatusExpired,
    UnitWoke,
    ItemBroken,
    WeaponLeveled,
    LootDropped,
    ExperienceAwarded,
    LevelUp,
    PossessionStarted,
    PossessionEnded,
    UnitRemoved,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::EntityAttack => "entity_attack",
            Topic::DamageCalculated => "damage_calculated",
            Topic::EntityDamaged => "entity_damaged",
            Topic::EntityHealed => "entity_healed",
            Topic::ShieldGranted => "shield_granted",
            Topic::EntityDeath => "entity_death",
            Topic::MonsterDefeated => "monster_defeated",
            Topic::UnitMoved => "unit_moved",
            Topic::ActionResolved => "action_resolved",
            Topic::ArenaRoundStart => "arena_round_start",
            Topic::ArenaRoundEnd => "arena_round_end",
            Topic::BattleEnded => "battle_ended",
            Topic::MercenaryHired => "mercenary_hired",
            Topic::UnitSummoned => "unit_summoned",
            Topic::StatusApplied => "status_applied",
            Topic::StatusExpired => "status_expired",
            Topic::UnitWoke => "unit_woke",
            Topic::ItemBroken => "item_broken",
            Topic::WeaponLeveled => "weapon_leveled",
            Topic::LootDropped => "loot_dropped",
            Topic::ExperienceAwarded => "experience_awarded",
            Topic::LevelUp => "level_up",
            Topic::PossessionStarted => "possession_started",
            Topic::PossessionEnded => "possession_ended",
            Topic::UnitRemoved => "unit_removed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BattleEvent {
    EntityAttack {
        attacker: UnitId,
        defender: UnitId,
        skill: Option<SkillId>,
    },
    DamageCalculated {
        attacker: UnitId,
        defender: UnitId,
        damage: f32,
    },
    /// `attacker` is None for damage over time
    EntityDamaged {
        attacker: Option<UnitId>,
        defender: UnitId,
        damage: f32,
        absorbed: f32,
        hp_after: f32,
    },
    EntityHealed {
        healer: UnitId,
        target: UnitId,
        amount: f32,
    },
    ShieldGranted {
        caster: UnitId,
        target: UnitId,
        amount: f32,
    },
    EntityDeath {
        victim: UnitId,
        killer: Option<UnitId>,
    },
    MonsterDefeated {
        victim: UnitId,
        killer: Option<UnitId>,
    },
    UnitMoved {
        unit: UnitId,
        position: Vec2,
    },
    ActionResolved {
        actor: UnitId,
        intent: IntentType,
        outcome: ActionOutcome,
    },
    ArenaRoundStart {
        round: u32,
    },
    ArenaRoundEnd {
        round: u32,
    },
    BattleEnded {
        winner: Option<TeamId>,
        survivors: Vec<UnitId>,
        round: u32,
    },
    MercenaryHired {
        unit: UnitId,
        owner: Option<UnitId>,
    },
    UnitSummoned {
        summoner: UnitId,
        unit: UnitId,
    },
    StatusApplied {
        unit: UnitId,
        effect: EffectKind,
        source: Option<UnitId>,
    },
    StatusExpired {
        unit: UnitId,
        effect: EffectKind,
    },
    UnitWoke {
        unit: UnitId,
    },
    ItemBroken {
        unit: UnitId,
        item: ItemId,
        slot: EquipmentSlot,
    },
    WeaponLeveled {
        unit: UnitId,
        level: u32,
    },
    LootDropped {
        victim: UnitId,
        items: Vec<ItemId>,
        position: Vec2,
    },
    ExperienceAwarded {
        unit: UnitId,
        amount: u32,
    },
    LevelUp {
        unit: UnitId,
        level: u32,
    },
    PossessionStarted {
        unit: UnitId,
        ghost: UnitId,
        team: TeamId,
    },
    PossessionEnded {
        unit: UnitId,
        ghost: UnitId,
    },
    UnitRemoved {
        unit: UnitId,
    },
}

impl BattleEvent {
    pub fn topic(&self) -> Topic {
        match self {
            BattleEvent::EntityAttack { .. } => Topic::EntityAttack,
            BattleEvent::DamageCalculated { .. } => Topic::DamageCalculated,
            BattleEvent::EntityDamaged { .. } => Topic::EntityDamaged,
            BattleEvent::EntityHealed { .. } => Topic::EntityHealed,
            BattleEvent::ShieldGranted { .. } => Topic::ShieldGranted,
            BattleEvent::EntityDeath { .. } => Topic::EntityDeath,
            BattleEvent::MonsterDefeated { .. } => Topic::MonsterDefeated,
            BattleEvent::UnitMoved { .. } => Topic::UnitMoved,
            BattleEvent::ActionResolved { .. } => Topic::ActionResolved,
            BattleEvent::ArenaRoundStart { .. } => Topic::ArenaRoundStart,
            BattleEvent::ArenaRoundEnd { .. } => Topic::ArenaRoundEnd,
            BattleEvent::BattleEnded { .. } => Topic::BattleEnded,
            BattleEvent::MercenaryHired { .. } => Topic::MercenaryHired,
            BattleEvent::UnitSummoned { .. } => Topic::UnitSummoned,
            BattleEvent::StatusApplied { .. } => Topic::StatusApplied,
            BattleEvent::StatusExpired { .. } => Topic::StatusExpired,
            BattleEvent::UnitWoke { .. } => Topic::UnitWoke,
            BattleEvent::ItemBroken { .. } => Topic::ItemBroken,
            BattleEvent::WeaponLeveled { .. } => Topic::WeaponLeveled,
            BattleEvent::LootDropped { .. } => Topic::LootDropped,
            BattleEvent::ExperienceAwarded { .. } => Topic::ExperienceAwarded,
            BattleEvent::LevelUp { .. } => Topic::LevelUp,
            BattleEvent::PossessionStarted { .. } => Topic::PossessionStarted,
            BattleEvent::PossessionEnded { .. } => Topic::PossessionEnded,
            BattleEvent::UnitRemoved { .. } => Topic::UnitRemoved,
        }
    }
}

/// Logged event with its position in the battle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub round: u32,
    pub event: BattleEvent,
}

/// Read-only observer of dispatched events (UI, audio, scoring, telemetry)
pub trait EventListener: Send {
    fn on_event(&mut self, event: &BattleEvent, battlefield: &Battlefield);
}

/// Ordered event log plus a queue of not-yet-dispatched events
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    log: Vec<EventRecord>,
    pending: VecDeque<BattleEvent>,
    round: u32,
    next_seq: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_round(&mut self, round: u32) {
        self.round = round;
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn publish(&mut self, event: BattleEvent) {
        tracing::trace!(topic = event.topic().as_str(), "publish");
        self.log.push(EventRecord {
            seq: self.next_seq,
            round: self.round,
            event: event.clone(),
        });
        self.next_seq += 1;
        self.pending.push_back(event);
    }

    /// Take the next undispatched event
    pub fn next_pending(&mut self) -> Option<BattleEvent> {
        self.pending.pop_front()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn log(&self) -> &[EventRecord] {
        &self.log
    }

    pub fn events(&self) -> impl Iterator<Item = &BattleEvent> {
        self.log.iter().map(|r| &r.event)
    }

    pub fn count(&self, topic: Topic) -> usize {
        self.events().filter(|e| e.topic() == topic).count()
    }

    pub fn last_of(&self, topic: Topic) -> Option<&BattleEvent> {
        self.log.iter().rev().map(|r| &r.event).find(|e| e.topic() == topic)
    }
}
