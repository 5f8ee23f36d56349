//! Timed status effects
//!
//! Durations count rounds. Effects of the same kind do not stack: reapplying
//! refreshes to whichever instance lasts longer.

use serde::{Deserialize, Serialize};

use crate::core::types::UnitId;
use crate::unit::stats::{Stat, StatModifier};

/// Initiative swing of haste (gained) and slow (lost)
const HASTE_AGILITY: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Skips turns until woken by damage or expiry
    Sleep,
    /// Loses `potency` hp at each round start
    Poison,
    /// Regains `potency` hp at each round start
    Regeneration,
    Inspired,
    Haste,
    Slow,
    /// Fighting for a ghost's side; the body is released on expiry
    Possession,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: EffectKind,
    pub remaining_rounds: u32,
    #[serde(default)]
    pub modifiers: Vec<StatModifier>,
    #[serde(default)]
    pub potency: f32,
    #[serde(default)]
    pub source: Option<UnitId>,
    /// Damaging hits taken while this effect was active
    #[serde(default)]
    pub hits_taken: u32,
}

impl StatusEffect {
    pub fn new(kind: EffectKind, rounds: u32) -> Self {
        Self {
            kind,
            remaining_rounds: rounds,
            modifiers: Vec::new(),
            potency: 0.0,
            source: None,
            hits_taken: 0,
        }
    }

    pub fn from_source(mut self, source: UnitId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn sleep(rounds: u32) -> Self {
        Self::new(EffectKind::Sleep, rounds)
    }

    pub fn poison(rounds: u32, per_round: f32) -> Self {
        Self {
            potency: per_round,
            ..Self::new(EffectKind::Poison, rounds)
        }
    }

    pub fn regeneration(rounds: u32, per_round: f32) -> Self {
        Self {
            potency: per_round,
            ..Self::new(EffectKind::Regeneration, rounds)
        }
    }

    pub fn inspired(rounds: u32, attack_bonus: f32) -> Self {
        Self {
            modifiers: vec![
                StatModifier::flat(Stat::AttackPower, attack_bonus),
                StatModifier::flat(Stat::SpellPower, attack_bonus),
            ],
            potency: attack_bonus,
            ..Self::new(EffectKind::Inspired, rounds)
        }
    }

    pub fn haste(rounds: u32) -> Self {
        Self {
            modifiers: vec![
                StatModifier::percent(Stat::MovementSpeed, 50.0),
                StatModifier::percent(Stat::AttackSpeed, 25.0),
                StatModifier::flat(Stat::Agility, HASTE_AGILITY),
            ],
            ..Self::new(EffectKind::Haste, rounds)
        }
    }

    pub fn possession(rounds: u32) -> Self {
        Self::new(EffectKind::Possession, rounds)
    }

    pub fn slow(rounds: u32) -> Self {
        Self {
            modifiers: vec![
                StatModifier::percent(Stat::MovementSpeed, -50.0),
                StatModifier::percent(Stat::AttackSpeed, -25.0),
                StatModifier::flat(Stat::Agility, -HASTE_AGILITY),
            ],
            ..Self::new(EffectKind::Slow, rounds)
        }
    }
}

/// Per-round result of ticking effects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectTick {
    pub poison_damage: f32,
    pub regeneration: f32,
    pub expired: Vec<EffectKind>,
}

/// The set of effects active on one unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffects {
    effects: Vec<StatusEffect>,
}

impl ActiveEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[StatusEffect] {
        &self.effects
    }

    pub fn has(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn get(&self, kind: EffectKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.kind == kind)
    }

    /// Add or refresh an effect; returns true if it was newly applied
    pub fn apply(&mut self, effect: StatusEffect) -> bool {
        if effect.remaining_rounds == 0 {
            return false;
        }
        match self.effects.iter_mut().find(|e| e.kind == effect.kind) {
            Some(existing) => {
                if effect.remaining_rounds >= existing.remaining_rounds {
                    *existing = effect;
                }
                false
            }
            None => {
                self.effects.push(effect);
                true
            }
        }
    }

    pub fn remove(&mut self, kind: EffectKind) -> Option<StatusEffect> {
        let index = self.effects.iter().position(|e| e.kind == kind)?;
        Some(self.effects.remove(index))
    }

    /// Count a damaging hit; returns true when a sleeper should wake
    pub fn register_hit(&mut self, wake_after: u32) -> bool {
        match self.effects.iter_mut().find(|e| e.kind == EffectKind::Sleep) {
            Some(sleep) => {
                sleep.hits_taken += 1;
                sleep.hits_taken >= wake_after.max(1)
            }
            None => false,
        }
    }

    /// Advance every effect by one round
    pub fn tick_round(&mut self) -> EffectTick {
        let mut tick = EffectTick::default();
        for effect in &mut self.effects {
            match effect.kind {
                EffectKind::Poison => tick.poison_damage += effect.potency.max(0.0),
                EffectKind::Regeneration => tick.regeneration += effect.potency.max(0.0),
                _ => {}
            }
            effect.remaining_rounds = effect.remaining_rounds.saturating_sub(1);
        }
        self.effects.retain(|e| {
            if e.remaining_rounds == 0 {
                tick.expired.push(e.kind);
                false
            } else {
                true
            }
        });
        tick
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

impl From<Vec<StatusEffect>> for ActiveEffects {
    fn from(effects: Vec<StatusEffect>) -> Self {
        let mut active = ActiveEffects::new();
        for effect in effects {
            active.apply(effect);
        }
        active
    }
}
