//! Round controller
//!
//! Drives the battle: round start upkeep, one turn per unit in initiative
//! order, round end regeneration, until one side remains or the round cap
//! declares a draw. Decisions for AI units go through the async decision
//! source with a timeout; on any failure the unit falls back to local melee.

use std::sync::Arc;

use crate::battle::aftermath::AftermathPipeline;
use crate::battle::ai::{
    ActionIntent, DecisionEngine, DecisionRequest, DecisionSource, LocalDecisions, PlayerInput,
    QueuedInput, RewardScorer,
};
use crate::battle::events::{BattleEvent, EventBus, EventListener};
use crate::battle::execution::{ActionExecution, ActionReport, AnimationClock, InstantClock, Step};
use crate::battle::resolution;
use crate::battle::roster::{BattleResult, Battlefield};
use crate::battle::turn_order::TurnSequencer;
use crate::core::config::EngineConfig;
use crate::core::error::{ArenaError, Result};
use crate::core::types::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Idle,
    RoundStart,
    ActorTurn(UnitId),
    RoundEnd,
    BattleEnd,
}

pub struct RoundController {
    config: EngineConfig,
    field: Battlefield,
    bus: EventBus,
    sequencer: TurnSequencer,
    engine: DecisionEngine,
    decisions: Arc<dyn DecisionSource>,
    player: Box<dyn PlayerInput>,
    clock: Box<dyn AnimationClock>,
    aftermath: AftermathPipeline,
    listeners: Vec<Box<dyn EventListener>>,
    scorers: Vec<Box<dyn RewardScorer>>,
    phase: RoundPhase,
    fallbacks: u32,
}

impl RoundController {
    /// Controller with local decisions, a queued player input and an
    /// instant animation clock
    pub fn new(config: EngineConfig, field: Battlefield) -> Self {
        let engine = DecisionEngine::new(&config);
        Self {
            sequencer: TurnSequencer::new(&config),
            aftermath: AftermathPipeline::new(&config),
            decisions: Arc::new(LocalDecisions::new(engine.clone())),
            engine,
            player: Box::new(QueuedInput::new()),
            clock: Box::new(InstantClock::new()),
            bus: EventBus::new(),
            listeners: Vec::new(),
            scorers: Vec::new(),
            phase: RoundPhase::Idle,
            fallbacks: 0,
            field,
            config,
        }
    }

    pub fn with_decision_source(mut self, source: impl DecisionSource + 'static) -> Self {
        self.decisions = Arc::new(source);
        self
    }

    pub fn with_player_input(mut self, input: impl PlayerInput + 'static) -> Self {
        self.player = Box::new(input);
        self
    }

    pub fn with_clock(mut self, clock: impl AnimationClock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn add_listener(mut self, listener: impl EventListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn add_scorer(mut self, scorer: impl RewardScorer + 'static) -> Self {
        self.scorers.push(Box::new(scorer));
        self
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn field(&self) -> &Battlefield {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut Battlefield {
        &mut self.field
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn scorers(&self) -> &[Box<dyn RewardScorer>] {
        &self.scorers
    }

    /// Decisions that fell back to local melee
    pub fn fallback_count(&self) -> u32 {
        self.fallbacks
    }

    /// Play rounds until the battle is decided
    pub async fn run(&mut self) -> Result<BattleResult> {
        if let Some(result) = self.field.result() {
            return Ok(result.clone());
        }
        self.config.validate()?;
        let teams = self.field.living_teams();
        if teams.len() < 2 {
            return Err(ArenaError::InvalidSetup(format!(
                "need at least two sides with living units, found {}",
                teams.len()
            )));
        }
        tracing::info!(teams = teams.len(), units = self.field.units().len(), "battle started");

        let result = loop {
            if let Some(result) = self.play_round().await {
                break result;
            }
        };

        let world = self.field.snapshot();
        for scorer in &mut self.scorers {
            scorer.on_battle_end(&result, &world);
        }
        self.aftermath.flush(&mut self.field, &mut self.bus);
        self.dispatch();
        self.phase = RoundPhase::BattleEnd;
        Ok(result)
    }

    /// Play a single round; returns the result once the battle is over
    pub async fn play_round(&mut self) -> Option<BattleResult> {
        if let Some(result) = self.field.result() {
            return Some(result.clone());
        }
        let round = self.field.round() + 1;
        self.field.set_round(round);
        self.bus.set_round(round);

        self.phase = RoundPhase::RoundStart;
        tracing::debug!(round, "round start");
        self.bus.publish(BattleEvent::ArenaRoundStart { round });
        self.upkeep();
        self.dispatch();
        let world = self.field.snapshot();
        for scorer in &mut self.scorers {
            scorer.on_round_start(&world);
        }

        let order = self.field.turn_order(&self.sequencer);
        for id in order {
            if self.field.is_over() {
                break;
            }
            if !self.field.unit(id).is_some_and(|u| u.can_act()) {
                tracing::trace!(unit = %id, "turn skipped");
                continue;
            }
            self.phase = RoundPhase::ActorTurn(id);
            let intent = self.decide(id).await;
            self.execute(id, intent).await;
            self.dispatch();
            self.check_outcome();
        }

        self.check_outcome();
        if !self.field.is_over() {
            self.phase = RoundPhase::RoundEnd;
            self.field.regen_tick(1.0);
            self.bus.publish(BattleEvent::ArenaRoundEnd { round });
            self.dispatch();
        }
        // Scorers see the final round too, even when it ended the battle
        let world = self.field.snapshot();
        for scorer in &mut self.scorers {
            scorer.on_round_end(&world);
        }
        if !self.field.is_over() && round >= self.config.round_cap {
            tracing::info!(round, "round cap reached");
            self.field.declare_draw(&mut self.bus);
            self.dispatch();
        }

        self.field.result().cloned()
    }

    /// Conclude if at most one side still has living units
    fn check_outcome(&mut self) {
        if self.field.is_over() {
            return;
        }
        if let Some(result) = self.field.evaluate_outcome() {
            self.field.conclude(result, &mut self.bus);
            self.dispatch();
        }
    }

    /// Cooldowns, effect durations, poison, regeneration and expired
    /// possessions
    fn upkeep(&mut self) {
        let ids: Vec<UnitId> = self
            .field
            .units()
            .iter()
            .filter(|u| u.is_targetable())
            .map(|u| u.id)
            .collect();
        for id in ids {
            let Some(unit) = self.field.unit_mut(id) else {
                continue;
            };
            let upkeep = unit.begin_round();
            for effect in upkeep.expired {
                self.bus.publish(BattleEvent::StatusExpired { unit: id, effect });
            }
            if let Some(ghost) = upkeep.released_from {
                tracing::debug!(unit = %id, %ghost, "possession expired");
                self.bus.publish(BattleEvent::PossessionEnded { unit: id, ghost });
            }
            if upkeep.regenerated > 0.0 {
                self.bus.publish(BattleEvent::EntityHealed {
                    healer: id,
                    target: id,
                    amount: upkeep.regenerated,
                });
            }
            let poison = upkeep.poison;
            if poison.absorbed + poison.hp_lost > 0.0 {
                self.bus.publish(BattleEvent::EntityDamaged {
                    attacker: None,
                    defender: id,
                    damage: poison.absorbed + poison.hp_lost,
                    absorbed: poison.absorbed,
                    hp_after: unit.hp(),
                });
            }
            if poison.died {
                resolution::publish_death(unit, None, &mut self.bus);
            }
        }
    }

    async fn decide(&mut self, id: UnitId) -> ActionIntent {
        let world = self.field.snapshot();
        let Some(actor) = world.unit(id).cloned() else {
            return ActionIntent::Idle;
        };
        if actor.strategy.is_player_controlled() {
            return self.player.next_intent(&actor, &world).await;
        }

        let request = DecisionRequest::new(actor.clone(), world.clone());
        let reply = tokio::time::timeout(
            self.config.decision_timeout(),
            self.decisions.request(request),
        )
        .await;
        let failure = match reply {
            Ok(Ok(response)) if response.actor_id == id => match response.into_intent() {
                Ok(intent) => return intent,
                Err(e) => e.to_string(),
            },
            Ok(Ok(response)) => format!("response for {} instead", response.actor_id),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {:?}", self.config.decision_timeout()),
        };
        tracing::warn!(unit = %id, reason = %failure, "decision failed, falling back to melee");
        self.fallbacks += 1;
        self.engine.fallback_melee(&actor, &world)
    }

    async fn execute(&mut self, id: UnitId, intent: ActionIntent) -> ActionReport {
        let mut execution = ActionExecution::new(id, intent);
        loop {
            match execution.step(&mut self.field, &mut self.bus, &self.config) {
                Step::Suspend(suspension) => {
                    self.clock.wait(suspension.frames).await;
                    self.aftermath
                        .advance_frames(suspension.frames, &mut self.field, &mut self.bus);
                    self.dispatch();
                }
                Step::Done(report) => {
                    tracing::debug!(unit = %id, outcome = ?report.outcome, "action resolved");
                    return report;
                }
            }
        }
    }

    /// Route pending events to the aftermath pipeline, then to listeners
    fn dispatch(&mut self) {
        while let Some(event) = self.bus.next_pending() {
            self.aftermath.handle(&event, &mut self.field, &mut self.bus);
            for listener in &mut self.listeners {
                listener.on_event(&event, &self.field);
            }
        }
    }
}
