//! Strategy dispatch
//!
//! `decide` is the one place a `Strategy` is interpreted. Everything it reads
//! comes from a `WorldSnapshot`, so it runs unchanged on the worker side.

use crate::battle::ai::decision_context::{UnitSnapshot, WorldSnapshot};
use crate::battle::ai::roles;
use crate::battle::ai::{ActionIntent, Fallback, Strategy};
use crate::battle::roster::TeamStance;
use crate::core::config::{EngineConfig, APPROACH_MARGIN};
use crate::core::types::Vec2;

#[derive(Debug, Clone)]
pub struct DecisionEngine {
    ranged_min_distance_ratio: f32,
    max_summons: u32,
}

impl DecisionEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            ranged_min_distance_ratio: config.ranged_min_distance_ratio,
            max_summons: config.max_summons,
        }
    }

    /// Intent for `actor` given the current world
    ///
    /// Player-controlled units never reach the algorithm: their intents are
    /// supplied externally, so this returns Idle for them.
    pub fn decide(&self, actor: &UnitSnapshot, world: &WorldSnapshot) -> ActionIntent {
        if !actor.alive {
            return ActionIntent::Idle;
        }
        let intent = match &actor.strategy {
            Strategy::Player => ActionIntent::Idle,
            strategy => self.decide_with(strategy, actor, world),
        };
        tracing::debug!(actor = %actor.id, ?intent, "decided");
        intent
    }

    fn decide_with(
        &self,
        strategy: &Strategy,
        actor: &UnitSnapshot,
        world: &WorldSnapshot,
    ) -> ActionIntent {
        match strategy {
            Strategy::Melee => self.melee(actor, world),
            Strategy::Ranged => self.ranged(actor, world),
            Strategy::Role { role, fallback } => {
                roles::choose_skill(*role, actor, world, self.max_summons).unwrap_or_else(|| {
                    match fallback {
                        Fallback::Melee => self.melee(actor, world),
                        Fallback::Ranged => self.ranged(actor, world),
                    }
                })
            }
            // A possessed body keeps its own fighting style for its new side
            Strategy::Possessed { previous, .. } => self.decide_with(previous, actor, world),
            // A possessed player body has no input source; it brawls
            Strategy::Player => self.melee(actor, world),
        }
    }

    /// Local nearest-enemy melee, used when the decision channel fails
    pub fn fallback_melee(&self, actor: &UnitSnapshot, world: &WorldSnapshot) -> ActionIntent {
        if !actor.alive {
            return ActionIntent::Idle;
        }
        self.melee(actor, world)
    }

    /// Attack the nearest enemy in range, otherwise close the distance
    pub fn melee(&self, actor: &UnitSnapshot, world: &WorldSnapshot) -> ActionIntent {
        let Some(enemy) = world.nearest_enemy(actor) else {
            return ActionIntent::Idle;
        };
        let distance = actor.distance_to(enemy);
        if holds_position(actor, world, distance) {
            return ActionIntent::Idle;
        }

        let range = actor.stats.attack_range;
        if distance <= range {
            return attack_if_ready(actor, enemy);
        }
        let destination = approach_point(actor, enemy.position, range, world);
        ActionIntent::approach(destination, enemy.id)
    }

    /// Keep the nearest enemy inside a stand-off band
    ///
    /// Too close: step straight away (clamped to the arena). Too far: close in
    /// and fire on arrival. Inside the band: fire.
    pub fn ranged(&self, actor: &UnitSnapshot, world: &WorldSnapshot) -> ActionIntent {
        let Some(enemy) = world.nearest_enemy(actor) else {
            return ActionIntent::Idle;
        };
        let distance = actor.distance_to(enemy);
        if holds_position(actor, world, distance) {
            return ActionIntent::Idle;
        }

        let range = actor.stats.attack_range;
        let min_distance = range * self.ranged_min_distance_ratio;

        if distance < min_distance {
            let mut away = (actor.position - enemy.position).normalize();
            if away == Vec2::ZERO {
                away = Vec2::new(1.0, 0.0);
            }
            let destination =
                world.bounds.clamp(actor.position + away * actor.stats.movement_speed);
            if destination.distance(&actor.position) > f32::EPSILON {
                return ActionIntent::move_to(destination);
            }
            // Cornered: fight from here
            return attack_if_ready(actor, enemy);
        }
        if distance > range {
            let destination = approach_point(actor, enemy.position, range, world);
            return ActionIntent::approach(destination, enemy.id);
        }
        attack_if_ready(actor, enemy)
    }

    /// Answer a worker request in place
    pub fn respond(
        &self,
        request: &crate::battle::ai::DecisionRequest,
    ) -> crate::battle::ai::DecisionResponse {
        let intent = self.decide(&request.actor, &request.world);
        crate::battle::ai::DecisionResponse::from_intent(request.actor.id, &intent)
    }
}

fn attack_if_ready(actor: &UnitSnapshot, enemy: &UnitSnapshot) -> ActionIntent {
    if actor.attack_cooldown == 0 {
        ActionIntent::Attack { target: enemy.id }
    } else {
        ActionIntent::Idle
    }
}

/// Defensive sides do not leave their post for enemies they cannot see
fn holds_position(actor: &UnitSnapshot, world: &WorldSnapshot, distance: f32) -> bool {
    world.stance(actor.allegiance) == TeamStance::Defensive && distance > actor.stats.vision_range
}

/// One turn of movement toward a point just inside attack range of `target`
fn approach_point(actor: &UnitSnapshot, target: Vec2, range: f32, world: &WorldSnapshot) -> Vec2 {
    let from_target = (actor.position - target).normalize();
    let stand = target + from_target * (range * APPROACH_MARGIN);
    world
        .bounds
        .clamp(actor.position.move_towards(&stand, actor.stats.movement_speed))
}
