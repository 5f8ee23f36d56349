//! Initiative ordering for one round
//!
//! speed = base - carried weight + agility, where agility is the derived
//! value (level growth, traits, gear and effects included). Units that carry
//! nothing with a declared weight get a random weight from the battle rng.
//! Recomputed every round because gear and effects change between rounds.

use rand::Rng;

use crate::core::config::EngineConfig;
use crate::core::types::UnitId;
use crate::unit::Unit;

#[derive(Debug, Clone)]
pub struct TurnSequencer {
    base: i32,
    random_weight_max: u32,
}

impl TurnSequencer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            base: config.turn_speed_base,
            random_weight_max: config.random_weight_max,
        }
    }

    /// Speed of one unit; rolls a weight if none is declared
    pub fn speed_of(&self, unit: &Unit, rng: &mut impl Rng) -> i32 {
        let weight = match unit.carried_weight() {
            Some(w) => w,
            None if self.random_weight_max > 0 => rng.gen_range(0..self.random_weight_max),
            None => 0,
        };
        self.base - weight as i32 + unit.stats().agility.round() as i32
    }

    /// Living units with their speeds, in roster order
    pub fn speeds(&self, units: &[Unit], rng: &mut impl Rng) -> Vec<(UnitId, i32)> {
        units
            .iter()
            .filter(|u| u.is_alive() && !u.is_dying())
            .map(|u| (u.id, self.speed_of(u, rng)))
            .collect()
    }

    pub fn order_for(&self, units: &[Unit], rng: &mut impl Rng) -> Vec<UnitId> {
        let order = order_by_speed(self.speeds(units, rng));
        tracing::debug!(?order, "turn order");
        order
    }
}

/// Descending by speed; equal speeds keep their input order
pub fn order_by_speed(mut speeds: Vec<(UnitId, i32)>) -> Vec<UnitId> {
    // sort_by is stable
    speeds.sort_by(|a, b| b.1.cmp(&a.1));
    speeds.into_iter().map(|(id, _)| id).collect()
}
