//! Battlefield state: teams, units, ground items and the battle result
//!
//! The battlefield exclusively owns every `Unit`. Units stay addressable
//! after death until the aftermath removes them at the end of their grace
//! window.

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battle::ai::WorldSnapshot;
use crate::battle::events::{BattleEvent, EventBus};
use crate::battle::turn_order::TurnSequencer;
use crate::core::config::EngineConfig;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{Bounds, TeamId, UnitId, Vec2};
use crate::unit::{Item, Unit, UnitFactory, UnitKind, UnitSpec};

/// Engagement posture shared by a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamStance {
    /// Seek out enemies anywhere on the field
    #[default]
    Aggressive,
    /// Engage only enemies within vision range
    Defensive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub stance: TeamStance,
    pub members: Vec<UnitId>,
}

/// Item lying on the battlefield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundItem {
    pub item: Item,
    pub position: Vec2,
    pub dropped_by: Option<UnitId>,
    pub round: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    Victory,
    Draw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    pub outcome: BattleOutcome,
    pub winner: Option<TeamId>,
    pub survivors: Vec<UnitId>,
    pub rounds: u32,
}

pub struct Battlefield {
    config: EngineConfig,
    bounds: Bounds,
    teams: Vec<Team>,
    /// Roster order; ties in turn order fall back to this
    units: Vec<Unit>,
    index: AHashMap<UnitId, usize>,
    ground: Vec<GroundItem>,
    factory: UnitFactory,
    rng: ChaCha8Rng,
    round: u32,
    result: Option<BattleResult>,
}

impl Battlefield {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
            bounds: Bounds::new(config.arena_half_extent),
            teams: Vec::new(),
            units: Vec::new(),
            index: AHashMap::new(),
            ground: Vec::new(),
            factory: UnitFactory::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            round: 0,
            result: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn set_round(&mut self, round: u32) {
        self.round = round;
    }

    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    // === TEAMS ===

    pub fn add_team(&mut self, id: TeamId, name: impl Into<String>, stance: TeamStance) -> Result<()> {
        if self.team(id).is_some() {
            return Err(ArenaError::InvalidSetup(format!("duplicate {}", id)));
        }
        self.teams.push(Team {
            id,
            name: name.into(),
            stance,
            members: Vec::new(),
        });
        Ok(())
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn stance(&self, id: TeamId) -> TeamStance {
        self.team(id).map(|t| t.stance).unwrap_or_default()
    }

    fn ensure_team(&mut self, id: TeamId) -> &mut Team {
        if let Some(pos) = self.teams.iter().position(|t| t.id == id) {
            return &mut self.teams[pos];
        }
        self.teams.push(Team {
            id,
            name: id.to_string(),
            stance: TeamStance::default(),
            members: Vec::new(),
        });
        let last = self.teams.len() - 1;
        &mut self.teams[last]
    }

    // === UNITS ===

    /// Create a unit through the factory; its team is created on demand
    pub fn spawn(&mut self, spec: UnitSpec) -> UnitId {
        let mut unit = self.factory.create(spec);
        unit.position = self.bounds.clamp(unit.position);
        self.insert(unit)
    }

    /// Add an externally built unit
    pub fn add_unit(&mut self, unit: Unit) -> Result<UnitId> {
        if self.index.contains_key(&unit.id) {
            return Err(ArenaError::InvalidSetup(format!("duplicate {}", unit.id)));
        }
        self.factory.reserve(unit.id);
        Ok(self.insert(unit))
    }

    fn insert(&mut self, unit: Unit) -> UnitId {
        let id = unit.id;
        self.ensure_team(unit.team).members.push(id);
        self.index.insert(id, self.units.len());
        self.units.push(unit);
        id
    }

    /// Drop a unit from every tracker
    pub fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        let pos = self.index.remove(&id)?;
        let unit = self.units.remove(pos);
        for team in &mut self.teams {
            team.members.retain(|m| *m != id);
        }
        self.index = self
            .units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.id, i))
            .collect();
        Some(unit)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.index.get(&id).map(|&i| &self.units[i])
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        match self.index.get(&id) {
            Some(&i) => Some(&mut self.units[i]),
            None => None,
        }
    }

    pub fn get(&self, id: UnitId) -> Result<&Unit> {
        self.unit(id).ok_or(ArenaError::UnitNotFound(id))
    }

    /// Two distinct units mutably at once
    pub fn pair_mut(&mut self, a: UnitId, b: UnitId) -> Option<(&mut Unit, &mut Unit)> {
        let ia = *self.index.get(&a)?;
        let ib = *self.index.get(&b)?;
        if ia == ib {
            return None;
        }
        if ia < ib {
            let (left, right) = self.units.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.units.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.iter_mut()
    }

    /// Living units currently fighting for `team`
    ///
    /// Counted by allegiance: a possessed body fights for its ghost's side,
    /// so a side whose last unit is possessed has nobody left.
    pub fn living_count(&self, team: TeamId) -> usize {
        self.units
            .iter()
            .filter(|u| u.allegiance() == team && u.is_alive())
            .count()
    }

    /// Teams with at least one living fighter, in registration order
    pub fn living_teams(&self) -> Vec<TeamId> {
        self.teams
            .iter()
            .map(|t| t.id)
            .filter(|&t| self.living_count(t) > 0)
            .collect()
    }

    pub fn survivors(&self) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|u| u.is_alive())
            .map(|u| u.id)
            .collect()
    }

    /// Order for the coming round, weights rolled from the battle rng
    pub fn turn_order(&mut self, sequencer: &TurnSequencer) -> Vec<UnitId> {
        sequencer.order_for(&self.units, &mut self.rng)
    }

    /// Plain-data view for decision making
    pub fn snapshot(&self) -> WorldSnapshot {
        let mut world = WorldSnapshot::new(
            self.round,
            self.bounds,
            self.units.iter().map(Unit::snapshot).collect(),
        );
        for team in &self.teams {
            world = world.with_stance(team.id, team.stance);
        }
        world
    }

    // === ROSTER CHANGES ===

    /// Bring a mercenary onto the field mid-battle
    pub fn hire_mercenary(
        &mut self,
        spec: UnitSpec,
        owner: Option<UnitId>,
        bus: &mut EventBus,
    ) -> Result<UnitId> {
        if let Some(owner) = owner {
            self.get(owner)?;
        }
        let id = self.spawn(spec.kind(UnitKind::Mercenary { owner }));
        tracing::info!(unit = %id, ?owner, "mercenary hired");
        bus.publish(BattleEvent::MercenaryHired { unit: id, owner });
        Ok(id)
    }

    /// Spawn a pet next to its summoner
    pub fn summon(&mut self, summoner: UnitId, bus: &mut EventBus) -> Result<UnitId> {
        let idx = *self
            .index
            .get(&summoner)
            .ok_or(ArenaError::UnitNotFound(summoner))?;
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let caster = &self.units[idx];
        let position = self
            .bounds
            .clamp(caster.position + Vec2::new(angle.cos(), angle.sin()));
        let pet = self.factory.create_summon(caster, position);
        let id = self.insert(pet);
        bus.publish(BattleEvent::UnitSummoned { summoner, unit: id });
        Ok(id)
    }

    /// Passive hp/mp regeneration over `dt` rounds (or seconds in real time)
    pub fn regen_tick(&mut self, dt: f32) {
        for unit in self.units.iter_mut().filter(|u| u.is_targetable()) {
            unit.regen(dt);
        }
    }

    // === GROUND ===

    pub fn drop_item(&mut self, item: Item, position: Vec2, dropped_by: Option<UnitId>) {
        self.ground.push(GroundItem {
            item,
            position: self.bounds.clamp(position),
            dropped_by,
            round: self.round,
        });
    }

    pub fn ground_items(&self) -> &[GroundItem] {
        &self.ground
    }

    // === OUTCOME ===

    /// Result if the field is decided right now: one side left wins,
    /// none left is a draw
    pub fn evaluate_outcome(&self) -> Option<BattleResult> {
        let living = self.living_teams();
        match living.as_slice() {
            [] => Some(BattleResult {
                outcome: BattleOutcome::Draw,
                winner: None,
                survivors: Vec::new(),
                rounds: self.round,
            }),
            [winner] => Some(BattleResult {
                outcome: BattleOutcome::Victory,
                winner: Some(*winner),
                survivors: self.survivors(),
                rounds: self.round,
            }),
            _ => None,
        }
    }

    /// Settle the battle; publishes `battle_ended` only the first time
    pub fn conclude(&mut self, result: BattleResult, bus: &mut EventBus) -> bool {
        if self.result.is_some() {
            return false;
        }
        tracing::info!(winner = ?result.winner, round = result.rounds, "battle ended");
        bus.publish(BattleEvent::BattleEnded {
            winner: result.winner,
            survivors: result.survivors.clone(),
            round: result.rounds,
        });
        self.result = Some(result);
        true
    }

    /// Declare a draw with everyone still standing
    pub fn declare_draw(&mut self, bus: &mut EventBus) -> bool {
        let result = BattleResult {
            outcome: BattleOutcome::Draw,
            winner: None,
            survivors: self.survivors(),
            rounds: self.round,
        };
        self.conclude(result, bus)
    }

    pub fn result(&self) -> Option<&BattleResult> {
        self.result.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }
}
