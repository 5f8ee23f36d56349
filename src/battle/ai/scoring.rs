//! Reward scoring hook
//!
//! Scorers watch round starts, round ends and the battle result and keep a
//! running score. The default scorer predicts the winner from team strength
//! and rewards accurate predictions and flagged units that pull their weight.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::ai::decision_context::WorldSnapshot;
use crate::battle::roster::BattleResult;
use crate::core::types::{TeamId, UnitId};

/// Observer that turns battle progress into a score
pub trait RewardScorer: Send {
    fn on_round_start(&mut self, world: &WorldSnapshot);
    fn on_round_end(&mut self, world: &WorldSnapshot);
    fn on_battle_end(&mut self, result: &BattleResult, world: &WorldSnapshot);
    fn score(&self) -> f32;
}

/// Points awarded by `PredictionScorer`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Latest prediction named the actual winner
    pub correct_prediction: f32,
    /// Latest prediction named someone else (or a draw went unpredicted)
    pub wrong_prediction: f32,
    /// Per kill scored by a flagged unit during a round
    pub flagged_kill: f32,
    /// A flagged unit died during a round
    pub flagged_death: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            correct_prediction: 10.0,
            wrong_prediction: -5.0,
            flagged_kill: 3.0,
            flagged_death: -3.0,
        }
    }
}

/// Summary of a scorer's run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: f32,
    pub prediction: Option<TeamId>,
    pub prediction_correct: Option<bool>,
    pub rounds_observed: u32,
}

#[derive(Debug, Clone, Copy)]
struct FlaggedState {
    kills: u32,
    alive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PredictionScorer {
    weights: ScoreWeights,
    score: f32,
    prediction: Option<TeamId>,
    prediction_correct: Option<bool>,
    rounds_observed: u32,
    flagged: AHashMap<UnitId, FlaggedState>,
}

impl PredictionScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            weights,
            ..Default::default()
        }
    }

    pub fn prediction(&self) -> Option<TeamId> {
        self.prediction
    }

    pub fn report(&self) -> ScoreReport {
        ScoreReport {
            score: self.score,
            prediction: self.prediction,
            prediction_correct: self.prediction_correct,
            rounds_observed: self.rounds_observed,
        }
    }
}

/// Living strength of one side: hp plus offensive output
pub fn team_strength(world: &WorldSnapshot, team: TeamId) -> f32 {
    world
        .units
        .iter()
        .filter(|u| u.alive && u.allegiance == team)
        .map(|u| u.hp + u.stats.attack_power + u.stats.spell_power)
        .sum()
}

/// Strongest side, None on an exact tie or an empty field
pub fn predict_winner(world: &WorldSnapshot) -> Option<TeamId> {
    let mut teams: Vec<TeamId> = world.units.iter().map(|u| u.allegiance).collect();
    teams.sort();
    teams.dedup();

    let mut best: Option<(TeamId, f32)> = None;
    let mut tied = false;
    for team in teams {
        let strength = team_strength(world, team);
        match best {
            Some((_, s)) if strength < s => {}
            Some((_, s)) if strength == s => tied = true,
            _ => {
                best = Some((team, strength));
                tied = false;
            }
        }
    }
    if tied {
        None
    } else {
        best.filter(|(_, s)| *s > 0.0).map(|(t, _)| t)
    }
}

impl RewardScorer for PredictionScorer {
    fn on_round_start(&mut self, world: &WorldSnapshot) {
        self.prediction = predict_winner(world);
        self.flagged = world
            .units
            .iter()
            .filter(|u| u.flagged)
            .map(|u| {
                (
                    u.id,
                    FlaggedState {
                        kills: u.kills,
                        alive: u.alive,
                    },
                )
            })
            .collect();
    }

    fn on_round_end(&mut self, world: &WorldSnapshot) {
        self.rounds_observed += 1;
        for unit in &world.units {
            let Some(before) = self.flagged.get(&unit.id) else {
                continue;
            };
            let new_kills = unit.kills.saturating_sub(before.kills);
            self.score += new_kills as f32 * self.weights.flagged_kill;
            if before.alive && !unit.alive {
                self.score += self.weights.flagged_death;
            }
        }
    }

    fn on_battle_end(&mut self, result: &BattleResult, _world: &WorldSnapshot) {
        let correct = self.prediction == result.winner;
        self.score += if correct {
            self.weights.correct_prediction
        } else {
            self.weights.wrong_prediction
        };
        self.prediction_correct = Some(correct);
        tracing::debug!(score = self.score, correct, "prediction scored");
    }

    fn score(&self) -> f32 {
        self.score
    }
}
