//! Action execution state machine
//!
//! Issued -> (AwaitingMoveAnim)* -> AwaitingHitAnim(PreHit)* -> Resolving
//!        -> AwaitingHitAnim(PostHit)* -> Applied
//!
//! Any state may end in Aborted. `step` advances until the next suspension
//! point (one animation frame) or completion, so an execution can be driven
//! by a real frame clock, an instant clock, or by hand in tests. Completion
//! always publishes `action_resolved`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::battle::ai::{ActionIntent, IntentType};
use crate::battle::events::{BattleEvent, EventBus};
use crate::battle::resolution;
use crate::battle::roster::Battlefield;
use crate::core::config::EngineConfig;
use crate::core::types::{Bounds, UnitId, Vec2};
use crate::skills::{get_skill_definition, SkillEffect, SkillId, SkillTarget};
use crate::unit::StatusEffect;

/// Slack on range checks so a unit parked exactly at range can still hit
const RANGE_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// Actor is gone, dead, dying or asleep
    ActorUnavailable,
    TargetMissing,
    TargetDead,
    /// Wrong side for this action
    InvalidTarget,
    OnCooldown,
    OutOfRange,
    UnknownSkill,
    InsufficientMana,
    InvalidPath,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionOutcome {
    Idle,
    Moved {
        to: Vec2,
    },
    Attacked {
        target: UnitId,
        damage: f32,
        killed: bool,
    },
    SkillUsed {
        skill: SkillId,
        target: UnitId,
        amount: f32,
        killed: bool,
    },
    Aborted {
        reason: AbortReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPhase {
    PreHit,
    PostHit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecState {
    Issued,
    AwaitingMoveAnim { frame: u32 },
    AwaitingHitAnim { phase: HitPhase, frame: u32 },
    Resolving,
    Applied(ActionOutcome),
    Aborted(AbortReason),
}

/// Wait requested by the execution before it can continue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suspension {
    pub frames: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Suspend(Suspension),
    Done(ActionReport),
}

/// Structured completion signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReport {
    pub actor: UnitId,
    pub intent: IntentType,
    pub outcome: ActionOutcome,
    /// Animation frames the action suspended for
    pub frames: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strike {
    Attack(UnitId),
    Skill(SkillId, UnitId),
}

/// One in-flight action
#[derive(Debug, Clone)]
pub struct ActionExecution {
    actor: UnitId,
    intent: ActionIntent,
    state: ExecState,
    waypoints: Vec<Vec2>,
    strike: Option<Strike>,
    pre_frames: u32,
    post_frames: u32,
    pending: Option<ActionOutcome>,
    frames: u32,
    report: Option<ActionReport>,
}

impl ActionExecution {
    pub fn new(actor: UnitId, intent: ActionIntent) -> Self {
        Self {
            actor,
            intent,
            state: ExecState::Issued,
            waypoints: Vec::new(),
            strike: None,
            pre_frames: 0,
            post_frames: 0,
            pending: None,
            frames: 0,
            report: None,
        }
    }

    pub fn state(&self) -> &ExecState {
        &self.state
    }

    pub fn actor(&self) -> UnitId {
        self.actor
    }

    /// Advance to the next suspension point or to completion
    pub fn step(&mut self, field: &mut Battlefield, bus: &mut EventBus, config: &EngineConfig) -> Step {
        if let Some(report) = &self.report {
            return Step::Done(report.clone());
        }
        loop {
            match self.state.clone() {
                ExecState::Issued => self.state = self.begin(field, config),
                ExecState::AwaitingMoveAnim { frame } => {
                    if let Some(&position) = self.waypoints.get(frame as usize) {
                        let Some(unit) = field.unit_mut(self.actor) else {
                            self.state = ExecState::Aborted(AbortReason::ActorUnavailable);
                            continue;
                        };
                        unit.position = position;
                        bus.publish(BattleEvent::UnitMoved {
                            unit: self.actor,
                            position,
                        });
                        self.state = ExecState::AwaitingMoveAnim { frame: frame + 1 };
                        return self.suspend();
                    }
                    self.state = self.arrive(field, config);
                }
                ExecState::AwaitingHitAnim {
                    phase: HitPhase::PreHit,
                    frame,
                } => {
                    if frame < self.pre_frames {
                        self.state = ExecState::AwaitingHitAnim {
                            phase: HitPhase::PreHit,
                            frame: frame + 1,
                        };
                        return self.suspend();
                    }
                    self.state = ExecState::Resolving;
                }
                ExecState::Resolving => self.state = self.resolve(field, bus, config),
                ExecState::AwaitingHitAnim {
                    phase: HitPhase::PostHit,
                    frame,
                } => {
                    if frame < self.post_frames {
                        self.state = ExecState::AwaitingHitAnim {
                            phase: HitPhase::PostHit,
                            frame: frame + 1,
                        };
                        return self.suspend();
                    }
                    let outcome = self.pending.take().unwrap_or(ActionOutcome::Idle);
                    self.state = ExecState::Applied(outcome);
                }
                ExecState::Applied(outcome) => return self.finish(outcome, bus),
                ExecState::Aborted(reason) => {
                    return self.finish(ActionOutcome::Aborted { reason }, bus)
                }
            }
        }
    }

    fn suspend(&mut self) -> Step {
        self.frames += 1;
        Step::Suspend(Suspension { frames: 1 })
    }

    fn finish(&mut self, outcome: ActionOutcome, bus: &mut EventBus) -> Step {
        if let ActionOutcome::Aborted { reason } = &outcome {
            tracing::debug!(actor = %self.actor, ?reason, "action aborted");
        }
        bus.publish(BattleEvent::ActionResolved {
            actor: self.actor,
            intent: self.intent.kind(),
            outcome: outcome.clone(),
        });
        let report = ActionReport {
            actor: self.actor,
            intent: self.intent.kind(),
            outcome,
            frames: self.frames,
        };
        self.report = Some(report.clone());
        Step::Done(report)
    }

    fn begin(&mut self, field: &Battlefield, config: &EngineConfig) -> ExecState {
        let Some(actor) = field.unit(self.actor) else {
            return ExecState::Aborted(AbortReason::ActorUnavailable);
        };
        if !actor.can_act() {
            return ExecState::Aborted(AbortReason::ActorUnavailable);
        }

        match self.intent.clone() {
            ActionIntent::Idle => ExecState::Applied(ActionOutcome::Idle),
            ActionIntent::Move { path, engage } => {
                if path.is_empty() || path.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
                    return ExecState::Aborted(AbortReason::InvalidPath);
                }
                self.waypoints = plan_frames(
                    actor.position,
                    &path,
                    actor.stats().movement_speed,
                    config.move_frames,
                    field.bounds(),
                );
                self.strike = engage.map(Strike::Attack);
                ExecState::AwaitingMoveAnim { frame: 0 }
            }
            ActionIntent::Attack { target } => self.prepare(Strike::Attack(target), field, config),
            ActionIntent::Skill { skill, target } => {
                self.prepare(Strike::Skill(skill, target), field, config)
            }
        }
    }

    fn prepare(&mut self, strike: Strike, field: &Battlefield, config: &EngineConfig) -> ExecState {
        if let Err(reason) = self.check(strike, field) {
            return ExecState::Aborted(reason);
        }
        self.strike = Some(strike);
        self.pre_frames = match strike {
            Strike::Attack(_) => config.pre_hit_frames,
            Strike::Skill(..) => field
                .unit(self.actor)
                .map_or(config.cast_frames, |u| cast_frames(config.cast_frames, u.stats().casting_speed)),
        };
        self.post_frames = config.post_hit_frames;
        ExecState::AwaitingHitAnim {
            phase: HitPhase::PreHit,
            frame: 0,
        }
    }

    /// Movement finished; chain into the engaged attack when possible
    fn arrive(&mut self, field: &Battlefield, config: &EngineConfig) -> ExecState {
        let Some(actor) = field.unit(self.actor) else {
            return ExecState::Aborted(AbortReason::ActorUnavailable);
        };
        let moved = ActionOutcome::Moved { to: actor.position };
        match self.strike {
            Some(strike) => match self.prepare(strike, field, config) {
                ExecState::Aborted(reason) => {
                    tracing::trace!(actor = %self.actor, ?reason, "no follow-up attack");
                    self.strike = None;
                    ExecState::Applied(moved)
                }
                next => next,
            },
            None => ExecState::Applied(moved),
        }
    }

    /// Validate a strike against the live battlefield
    fn check(&self, strike: Strike, field: &Battlefield) -> Result<(), AbortReason> {
        let actor = field
            .unit(self.actor)
            .ok_or(AbortReason::ActorUnavailable)?;
        if !actor.can_act() {
            return Err(AbortReason::ActorUnavailable);
        }
        match strike {
            Strike::Attack(target_id) => {
                let target = field.unit(target_id).ok_or(AbortReason::TargetMissing)?;
                if !target.is_targetable() {
                    return Err(AbortReason::TargetDead);
                }
                if target_id == self.actor || target.allegiance() == actor.allegiance() {
                    return Err(AbortReason::InvalidTarget);
                }
                if actor.attack_cooldown > 0 {
                    return Err(AbortReason::OnCooldown);
                }
                if actor.position.distance(&target.position) > actor.stats().attack_range + RANGE_EPSILON {
                    return Err(AbortReason::OutOfRange);
                }
                Ok(())
            }
            Strike::Skill(skill, target_id) => {
                let def = get_skill_definition(skill).ok_or(AbortReason::UnknownSkill)?;
                if !actor.skills.knows(skill) {
                    return Err(AbortReason::UnknownSkill);
                }
                if !actor.skills.is_ready(skill) {
                    return Err(AbortReason::OnCooldown);
                }
                if actor.mp() + f32::EPSILON < def.mp_cost {
                    return Err(AbortReason::InsufficientMana);
                }
                if def.target == SkillTarget::Caster {
                    return Ok(());
                }
                let target = field.unit(target_id).ok_or(AbortReason::TargetMissing)?;
                if !target.is_targetable() {
                    return Err(AbortReason::TargetDead);
                }
                let same_side = target.allegiance() == actor.allegiance();
                match def.target {
                    SkillTarget::Ally if !same_side => return Err(AbortReason::InvalidTarget),
                    SkillTarget::Enemy if same_side => return Err(AbortReason::InvalidTarget),
                    _ => {}
                }
                if actor.position.distance(&target.position) > def.range + RANGE_EPSILON {
                    return Err(AbortReason::OutOfRange);
                }
                Ok(())
            }
        }
    }

    fn resolve(&mut self, field: &mut Battlefield, bus: &mut EventBus, config: &EngineConfig) -> ExecState {
        let Some(strike) = self.strike else {
            return ExecState::Applied(ActionOutcome::Idle);
        };
        // The world may have changed during the wind-up
        if let Err(reason) = self.check(strike, field) {
            return ExecState::Aborted(reason);
        }

        let outcome = match strike {
            Strike::Attack(target) => {
                let Some((attacker, defender)) = field.pair_mut(self.actor, target) else {
                    return ExecState::Aborted(AbortReason::TargetMissing);
                };
                // Set before the swing lands: the hit may break the weapon
                attacker.attack_cooldown = resolution::attack_cooldown(attacker, config);
                let report = resolution::apply_attack(attacker, defender, None, bus);
                ActionOutcome::Attacked {
                    target,
                    damage: report.damage,
                    killed: report.target_died,
                }
            }
            Strike::Skill(skill, target) => match self.cast(skill, target, field, bus) {
                Ok(outcome) => outcome,
                Err(reason) => return ExecState::Aborted(reason),
            },
        };

        self.pending = Some(outcome);
        ExecState::AwaitingHitAnim {
            phase: HitPhase::PostHit,
            frame: 0,
        }
    }

    fn cast(
        &self,
        skill: SkillId,
        target: UnitId,
        field: &mut Battlefield,
        bus: &mut EventBus,
    ) -> Result<ActionOutcome, AbortReason> {
        let def = get_skill_definition(skill).ok_or(AbortReason::UnknownSkill)?;
        let caster = field
            .unit_mut(self.actor)
            .ok_or(AbortReason::ActorUnavailable)?;
        if !caster.spend_mp(def.mp_cost) {
            return Err(AbortReason::InsufficientMana);
        }
        let cooldown = resolution::skill_cooldown(caster, def);
        caster.skills.start_cooldown(skill, cooldown);
        let power = resolution::support_power(caster, def);
        tracing::debug!(caster = %self.actor, ?skill, %target, power, "cast");

        let used = |target: UnitId, amount: f32, killed: bool| ActionOutcome::SkillUsed {
            skill,
            target,
            amount,
            killed,
        };

        match def.effect {
            SkillEffect::Damage => {
                let (attacker, defender) = field
                    .pair_mut(self.actor, target)
                    .ok_or(AbortReason::TargetMissing)?;
                let report = resolution::apply_attack(attacker, defender, Some(def), bus);
                Ok(used(target, report.damage, report.target_died))
            }
            SkillEffect::Heal => {
                let unit = field.unit_mut(target).ok_or(AbortReason::TargetMissing)?;
                let healed = resolution::apply_heal(self.actor, unit, power, bus);
                Ok(used(target, healed, false))
            }
            SkillEffect::Shield => {
                let unit = field.unit_mut(target).ok_or(AbortReason::TargetMissing)?;
                let granted = resolution::apply_shield(self.actor, unit, power, bus);
                Ok(used(target, granted, false))
            }
            SkillEffect::Sleep => {
                let unit = field.unit_mut(target).ok_or(AbortReason::TargetMissing)?;
                let effect = StatusEffect::sleep(def.duration_rounds).from_source(self.actor);
                resolution::apply_status(unit, effect, bus);
                Ok(used(target, 0.0, false))
            }
            SkillEffect::Inspire => {
                let unit = field.unit_mut(target).ok_or(AbortReason::TargetMissing)?;
                let effect =
                    StatusEffect::inspired(def.duration_rounds, power).from_source(self.actor);
                resolution::apply_status(unit, effect, bus);
                Ok(used(target, power, false))
            }
            SkillEffect::Summon => {
                let pet = field
                    .summon(self.actor, bus)
                    .map_err(|_| AbortReason::ActorUnavailable)?;
                Ok(used(pet, 0.0, false))
            }
            SkillEffect::Poison => {
                let unit = field.unit_mut(target).ok_or(AbortReason::TargetMissing)?;
                let effect = StatusEffect::poison(def.duration_rounds, power).from_source(self.actor);
                resolution::apply_status(unit, effect, bus);
                Ok(used(target, power, false))
            }
            SkillEffect::Regenerate => {
                let unit = field.unit_mut(target).ok_or(AbortReason::TargetMissing)?;
                let effect =
                    StatusEffect::regeneration(def.duration_rounds, power).from_source(self.actor);
                resolution::apply_status(unit, effect, bus);
                Ok(used(target, power, false))
            }
            SkillEffect::Haste => {
                let unit = field.unit_mut(target).ok_or(AbortReason::TargetMissing)?;
                let effect = StatusEffect::haste(def.duration_rounds).from_source(self.actor);
                resolution::apply_status(unit, effect, bus);
                Ok(used(target, 0.0, false))
            }
            SkillEffect::Slow => {
                let unit = field.unit_mut(target).ok_or(AbortReason::TargetMissing)?;
                let effect = StatusEffect::slow(def.duration_rounds).from_source(self.actor);
                resolution::apply_status(unit, effect, bus);
                Ok(used(target, 0.0, false))
            }
            SkillEffect::Possess => {
                let side = field
                    .unit(self.actor)
                    .map(|ghost| ghost.allegiance())
                    .ok_or(AbortReason::ActorUnavailable)?;
                let unit = field.unit_mut(target).ok_or(AbortReason::TargetMissing)?;
                unit.possess(self.actor, side);
                let effect = StatusEffect::possession(def.duration_rounds).from_source(self.actor);
                resolution::apply_status(unit, effect, bus);
                tracing::info!(ghost = %self.actor, unit = %target, "possessed");
                bus.publish(BattleEvent::PossessionStarted {
                    unit: target,
                    ghost: self.actor,
                    team: side,
                });
                Ok(used(target, 0.0, false))
            }
        }
    }
}

/// Skill wind-up frames: max(1, round(cast_frames / casting speed))
pub fn cast_frames(base: u32, casting_speed: f32) -> u32 {
    if base == 0 {
        return 0;
    }
    let speed = if casting_speed.is_finite() && casting_speed > 0.0 {
        casting_speed
    } else {
        1.0
    };
    ((base as f32 / speed).round() as u32).max(1)
}

/// Per-frame positions walking `path` from `start`, at most `budget` far
pub fn plan_frames(start: Vec2, path: &[Vec2], budget: f32, frames: u32, bounds: Bounds) -> Vec<Vec2> {
    let length = polyline_length(start, path);
    let travel = length.min(budget.max(0.0));
    if travel <= f32::EPSILON {
        return Vec::new();
    }
    let frames = frames.max(1);
    (1..=frames)
        .map(|i| bounds.clamp(point_along(start, path, travel * i as f32 / frames as f32)))
        .collect()
}

fn polyline_length(start: Vec2, path: &[Vec2]) -> f32 {
    let mut from = start;
    let mut total = 0.0;
    for &p in path {
        total += from.distance(&p);
        from = p;
    }
    total
}

fn point_along(start: Vec2, path: &[Vec2], distance: f32) -> Vec2 {
    let mut from = start;
    let mut left = distance;
    for &p in path {
        let seg = from.distance(&p);
        if left <= seg {
            return from.move_towards(&p, left);
        }
        left -= seg;
        from = p;
    }
    from
}

/// Source of animation time
#[async_trait]
pub trait AnimationClock: Send {
    async fn wait(&mut self, frames: u32);
}

/// Resolves every wait immediately; counts the frames it skipped
#[derive(Debug, Default)]
pub struct InstantClock {
    elapsed: u64,
}

impl InstantClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_frames(&self) -> u64 {
        self.elapsed
    }
}

#[async_trait]
impl AnimationClock for InstantClock {
    async fn wait(&mut self, frames: u32) {
        self.elapsed += frames as u64;
    }
}

/// Sleeps a fixed wall-clock duration per frame
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame: std::time::Duration,
}

impl FrameClock {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            frame: config.frame_duration(),
        }
    }
}

#[async_trait]
impl AnimationClock for FrameClock {
    async fn wait(&mut self, frames: u32) {
        tokio::time::sleep(self.frame * frames).await;
    }
}

/// Drive one action to completion against `clock`
pub async fn execute(
    actor: UnitId,
    intent: ActionIntent,
    field: &mut Battlefield,
    bus: &mut EventBus,
    config: &EngineConfig,
    clock: &mut dyn AnimationClock,
) -> ActionReport {
    let mut execution = ActionExecution::new(actor, intent);
    loop {
        match execution.step(field, bus, config) {
            Step::Suspend(s) => clock.wait(s.frames).await,
            Step::Done(report) => return report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::events::Topic;
    use crate::core::types::TeamId;
    use crate::unit::{EffectKind, Job, UnitSpec};

    fn setup(distance: f32) -> (Battlefield, EventBus, EngineConfig, UnitId, UnitId) {
        let config = EngineConfig::default();
        let mut field = Battlefield::new(&config);
        let a = field.spawn(UnitSpec::new("a", Job::Rogue, TeamId(1)));
        let b = field.spawn(UnitSpec::new("b", Job::Rogue, TeamId(2)).at(Vec2::new(distance, 0.0)));
        (field, EventBus::new(), config, a, b)
    }

    fn drive(exec: &mut ActionExecution, field: &mut Battlefield, bus: &mut EventBus, config: &EngineConfig) -> (ActionReport, u32) {
        let mut suspensions = 0;
        loop {
            match exec.step(field, bus, config) {
                Step::Suspend(_) => suspensions += 1,
                Step::Done(report) => return (report, suspensions),
            }
        }
    }

    #[test]
    fn test_attack_passes_named_states() {
        let (mut field, mut bus, config, a, b) = setup(1.0);
        let mut exec = ActionExecution::new(a, ActionIntent::Attack { target: b });

        assert_eq!(exec.step(&mut field, &mut bus, &config), Step::Suspend(Suspension { frames: 1 }));
        assert_eq!(
            exec.state(),
            &ExecState::AwaitingHitAnim {
                phase: HitPhase::PreHit,
                frame: 1
            }
        );
        // Nothing lands during the wind-up
        assert_eq!(field.unit(b).unwrap().hp(), field.unit(b).unwrap().max_hp());

        let (report, _) = drive(&mut exec, &mut field, &mut bus, &config);
        assert!(matches!(report.outcome, ActionOutcome::Attacked { target, .. } if target == b));
        assert_eq!(report.frames, config.pre_hit_frames + config.post_hit_frames);
        assert!(field.unit(a).unwrap().attack_cooldown >= 1);
        assert_eq!(bus.count(Topic::ActionResolved), 1);
    }

    #[test]
    fn test_dead_target_aborts_without_cooldown() {
        let (mut field, mut bus, config, a, b) = setup(1.0);
        field.unit_mut(b).unwrap().take_damage(1000.0);
        let mut exec = ActionExecution::new(a, ActionIntent::Attack { target: b });
        let (report, frames) = drive(&mut exec, &mut field, &mut bus, &config);
        assert_eq!(
            report.outcome,
            ActionOutcome::Aborted {
                reason: AbortReason::TargetDead
            }
        );
        assert_eq!(frames, 0);
        assert_eq!(field.unit(a).unwrap().attack_cooldown, 0);
        assert_eq!(bus.count(Topic::ActionResolved), 1);
    }

    #[test]
    fn test_target_dying_mid_windup_aborts() {
        let (mut field, mut bus, config, a, b) = setup(1.0);
        let mut exec = ActionExecution::new(a, ActionIntent::Attack { target: b });
        exec.step(&mut field, &mut bus, &config);
        field.unit_mut(b).unwrap().take_damage(1000.0);
        let (report, _) = drive(&mut exec, &mut field, &mut bus, &config);
        assert_eq!(
            report.outcome,
            ActionOutcome::Aborted {
                reason: AbortReason::TargetDead
            }
        );
        assert_eq!(field.unit(a).unwrap().attack_cooldown, 0);
    }

    #[test]
    fn test_missing_target_aborts() {
        let (mut field, mut bus, config, a, _) = setup(1.0);
        let mut exec = ActionExecution::new(a, ActionIntent::Attack { target: UnitId(99) });
        let (report, _) = drive(&mut exec, &mut field, &mut bus, &config);
        assert_eq!(
            report.outcome,
            ActionOutcome::Aborted {
                reason: AbortReason::TargetMissing
            }
        );
    }

    #[test]
    fn test_move_interpolates_then_chains_attack() {
        let (mut field, mut bus, config, a, b) = setup(3.0);
        let intent = ActionIntent::approach(Vec2::new(2.0, 0.0), b);
        let mut exec = ActionExecution::new(a, intent);

        // First frame moves part way
        exec.step(&mut field, &mut bus, &config);
        let x = field.unit(a).unwrap().position.x;
        assert!(x > 0.0 && x < 2.0);

        let (report, _) = drive(&mut exec, &mut field, &mut bus, &config);
        assert_eq!(field.unit(a).unwrap().position, Vec2::new(2.0, 0.0));
        assert!(matches!(report.outcome, ActionOutcome::Attacked { .. }));
        assert_eq!(report.intent, IntentType::Move);
        assert_eq!(bus.count(Topic::UnitMoved), config.move_frames as usize);
    }

    #[test]
    fn test_move_without_reach_just_moves() {
        let (mut field, mut bus, config, a, b) = setup(30.0);
        let intent = ActionIntent::approach(Vec2::new(5.0, 0.0), b);
        let mut exec = ActionExecution::new(a, intent);
        let (report, _) = drive(&mut exec, &mut field, &mut bus, &config);
        assert_eq!(
            report.outcome,
            ActionOutcome::Moved {
                to: Vec2::new(5.0, 0.0)
            }
        );
        assert_eq!(bus.count(Topic::EntityAttack), 0);
    }

    #[test]
    fn test_long_paths_are_capped_by_speed() {
        let waypoints = plan_frames(Vec2::ZERO, &[Vec2::new(100.0, 0.0)], 4.0, 4, Bounds::new(50.0));
        assert_eq!(waypoints.len(), 4);
        assert_eq!(waypoints[3], Vec2::new(4.0, 0.0));
        assert_eq!(waypoints[0], Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_sleeping_actor_cannot_act() {
        let (mut field, mut bus, config, a, b) = setup(1.0);
        field.unit_mut(a).unwrap().apply_effect(StatusEffect::sleep(2));
        let mut exec = ActionExecution::new(a, ActionIntent::Attack { target: b });
        let (report, _) = drive(&mut exec, &mut field, &mut bus, &config);
        assert_eq!(
            report.outcome,
            ActionOutcome::Aborted {
                reason: AbortReason::ActorUnavailable
            }
        );
    }

    #[test]
    fn test_heal_spends_mana_and_starts_cooldown() {
        let config = EngineConfig::default();
        let mut field = Battlefield::new(&config);
        let mut bus = EventBus::new();
        let healer = field.spawn(UnitSpec::new("h", Job::Healer, TeamId(1)));
        let ally = field.spawn(UnitSpec::new("w", Job::Warrior, TeamId(1)).at(Vec2::new(2.0, 0.0)));
        field.unit_mut(ally).unwrap().take_damage(10.0);
        let mp_before = field.unit(healer).unwrap().mp();

        let mut exec = ActionExecution::new(
            healer,
            ActionIntent::Skill {
                skill: SkillId::Heal,
                target: ally,
            },
        );
        let (report, _) = drive(&mut exec, &mut field, &mut bus, &config);
        assert!(matches!(report.outcome, ActionOutcome::SkillUsed { amount, .. } if amount > 0.0));
        let h = field.unit(healer).unwrap();
        assert!(h.mp() < mp_before);
        assert!(!h.skills.is_ready(SkillId::Heal));
    }

    #[test]
    fn test_possess_turns_the_target() {
        let config = EngineConfig::default();
        let mut field = Battlefield::new(&config);
        let mut bus = EventBus::new();
        let ghost = field.spawn(UnitSpec::new("g", Job::Ghost, TeamId(1)));
        let brute = field.spawn(UnitSpec::new("b", Job::Warrior, TeamId(2)).at(Vec2::new(3.0, 0.0)));

        let mut exec = ActionExecution::new(
            ghost,
            ActionIntent::Skill {
                skill: SkillId::Possess,
                target: brute,
            },
        );
        let (report, _) = drive(&mut exec, &mut field, &mut bus, &config);
        assert!(matches!(report.outcome, ActionOutcome::SkillUsed { target, .. } if target == brute));

        let held = field.unit(brute).unwrap();
        assert_eq!(held.allegiance(), TeamId(1));
        assert_eq!(held.strategy().possessor(), Some(ghost));
        assert!(held.has_effect(EffectKind::Possession));
        assert_eq!(bus.count(Topic::PossessionStarted), 1);
    }

    #[test]
    fn test_poison_arrow_applies_damage_over_time() {
        let config = EngineConfig::default();
        let mut field = Battlefield::new(&config);
        let mut bus = EventBus::new();
        let archer = field.spawn(UnitSpec::new("a", Job::Archer, TeamId(1)));
        let foe = field.spawn(UnitSpec::new("f", Job::Warrior, TeamId(2)).at(Vec2::new(5.0, 0.0)));

        let mut exec = ActionExecution::new(
            archer,
            ActionIntent::Skill {
                skill: SkillId::PoisonArrow,
                target: foe,
            },
        );
        drive(&mut exec, &mut field, &mut bus, &config);
        let unit = field.unit_mut(foe).unwrap();
        let hp = unit.hp();
        let upkeep = unit.begin_round();
        assert!(upkeep.poison.hp_lost > 0.0);
        assert!(unit.hp() < hp);
    }

    #[test]
    fn test_cannot_heal_an_enemy() {
        let (mut field, mut bus, config, _, b) = setup(1.0);
        let healer = field.spawn(UnitSpec::new("h", Job::Healer, TeamId(1)));
        let mut exec = ActionExecution::new(
            healer,
            ActionIntent::Skill {
                skill: SkillId::Heal,
                target: b,
            },
        );
        let (report, _) = drive(&mut exec, &mut field, &mut bus, &config);
        assert_eq!(
            report.outcome,
            ActionOutcome::Aborted {
                reason: AbortReason::InvalidTarget
            }
        );
    }

    #[test]
    fn test_cast_frames_scale_with_speed() {
        assert_eq!(cast_frames(4, 1.0), 4);
        assert_eq!(cast_frames(4, 2.0), 2);
        assert_eq!(cast_frames(4, 100.0), 1);
        assert_eq!(cast_frames(0, 1.0), 0);
    }

    #[tokio::test]
    async fn test_execute_with_instant_clock() {
        let (mut field, mut bus, config, a, b) = setup(1.0);
        let mut clock = InstantClock::new();
        let report = execute(a, ActionIntent::Attack { target: b }, &mut field, &mut bus, &config, &mut clock).await;
        assert!(matches!(report.outcome, ActionOutcome::Attacked { .. }));
        assert_eq!(clock.elapsed_frames(), report.frames as u64);
    }
}
