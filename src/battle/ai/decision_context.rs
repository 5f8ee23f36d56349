//! Plain-data view of the battle that decisions are computed from
//!
//! Built fresh for every decision so it can cross the worker boundary.

use serde::{Deserialize, Serialize};

pub use crate::unit::UnitSnapshot;

use crate::battle::roster::TeamStance;
use crate::core::types::{Bounds, TeamId, UnitId};
use crate::unit::UnitKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub round: u32,
    pub bounds: Bounds,
    pub units: Vec<UnitSnapshot>,
    #[serde(default)]
    pub stances: Vec<(TeamId, TeamStance)>,
}

impl WorldSnapshot {
    pub fn new(round: u32, bounds: Bounds, units: Vec<UnitSnapshot>) -> Self {
        Self {
            round,
            bounds,
            units,
            stances: Vec::new(),
        }
    }

    pub fn with_stance(mut self, team: TeamId, stance: TeamStance) -> Self {
        self.stances.retain(|(t, _)| *t != team);
        self.stances.push((team, stance));
        self
    }

    pub fn unit(&self, id: UnitId) -> Option<&UnitSnapshot> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Stance of a team, aggressive when unspecified
    pub fn stance(&self, team: TeamId) -> TeamStance {
        self.stances
            .iter()
            .find(|(t, _)| *t == team)
            .map(|(_, s)| *s)
            .unwrap_or_default()
    }

    /// Living units fighting against `actor`, in roster order
    pub fn enemies_of(&self, actor: &UnitSnapshot) -> impl Iterator<Item = &UnitSnapshot> + '_ {
        let side = actor.allegiance;
        self.units
            .iter()
            .filter(move |u| u.alive && u.allegiance != side)
    }

    /// Living units on `actor`'s side, `actor` included
    pub fn allies_of(&self, actor: &UnitSnapshot) -> impl Iterator<Item = &UnitSnapshot> + '_ {
        let side = actor.allegiance;
        self.units
            .iter()
            .filter(move |u| u.alive && u.allegiance == side)
    }

    /// Nearest living enemy by Euclidean distance
    ///
    /// Strict comparison: on an exact tie the first one found wins.
    pub fn nearest_enemy(&self, actor: &UnitSnapshot) -> Option<&UnitSnapshot> {
        let mut best: Option<(&UnitSnapshot, f32)> = None;
        for enemy in self.enemies_of(actor) {
            let d = actor.distance_to(enemy);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((enemy, d)),
            }
        }
        best.map(|(u, _)| u)
    }

    pub fn nearest_enemy_within(&self, actor: &UnitSnapshot, range: f32) -> Option<&UnitSnapshot> {
        self.nearest_enemy(actor)
            .filter(|enemy| actor.distance_to(enemy) <= range)
    }

    /// Ally within range with the lowest hp ratio, among those matching `filter`
    pub fn weakest_ally_within(
        &self,
        actor: &UnitSnapshot,
        range: f32,
        filter: impl Fn(&UnitSnapshot) -> bool,
    ) -> Option<&UnitSnapshot> {
        let mut best: Option<&UnitSnapshot> = None;
        for ally in self.allies_of(actor) {
            if actor.distance_to(ally) > range || !filter(ally) {
                continue;
            }
            match best {
                Some(b) if ally.hp_ratio() >= b.hp_ratio() => {}
                _ => best = Some(ally),
            }
        }
        best
    }

    /// Living pets bound to `owner`
    pub fn living_summons(&self, owner: UnitId) -> usize {
        self.units
            .iter()
            .filter(|u| u.alive && u.kind == UnitKind::Pet { owner })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;
    use crate::unit::{Job, UnitFactory, UnitSpec};

    fn world(specs: Vec<UnitSpec>) -> WorldSnapshot {
        let mut factory = UnitFactory::new();
        let units = specs
            .into_iter()
            .map(|s| factory.create(s).snapshot())
            .collect();
        WorldSnapshot::new(1, Bounds::new(50.0), units)
    }

    #[test]
    fn test_nearest_enemy_keeps_first_on_tie() {
        let w = world(vec![
            UnitSpec::new("me", Job::Warrior, TeamId(1)),
            UnitSpec::new("e1", Job::Warrior, TeamId(2)).at(Vec2::new(3.0, 0.0)),
            UnitSpec::new("e2", Job::Warrior, TeamId(2)).at(Vec2::new(-3.0, 0.0)),
        ]);
        let me = &w.units[0];
        assert_eq!(w.nearest_enemy(me).map(|u| u.id), Some(UnitId(2)));
    }

    #[test]
    fn test_dead_enemies_are_ignored() {
        let mut w = world(vec![
            UnitSpec::new("me", Job::Warrior, TeamId(1)),
            UnitSpec::new("e1", Job::Warrior, TeamId(2)).at(Vec2::new(1.0, 0.0)),
            UnitSpec::new("e2", Job::Warrior, TeamId(2)).at(Vec2::new(9.0, 0.0)),
        ]);
        w.units[1].alive = false;
        let me = w.units[0].clone();
        assert_eq!(w.nearest_enemy(&me).map(|u| u.id), Some(UnitId(3)));
        assert!(w.nearest_enemy_within(&me, 5.0).is_none());
    }

    #[test]
    fn test_allies_follow_allegiance() {
        let mut w = world(vec![
            UnitSpec::new("me", Job::Warrior, TeamId(1)),
            UnitSpec::new("turncoat", Job::Warrior, TeamId(2)),
        ]);
        w.units[1].allegiance = TeamId(1);
        let me = w.units[0].clone();
        assert_eq!(w.allies_of(&me).count(), 2);
        assert!(w.nearest_enemy(&me).is_none());
    }

    #[test]
    fn test_weakest_ally_prefers_lowest_ratio() {
        let mut w = world(vec![
            UnitSpec::new("me", Job::Healer, TeamId(1)),
            UnitSpec::new("a", Job::Warrior, TeamId(1)).at(Vec2::new(1.0, 0.0)),
            UnitSpec::new("b", Job::Warrior, TeamId(1)).at(Vec2::new(2.0, 0.0)),
        ]);
        w.units[1].hp = w.units[1].stats.max_hp * 0.8;
        w.units[2].hp = w.units[2].stats.max_hp * 0.3;
        let me = w.units[0].clone();
        let pick = w.weakest_ally_within(&me, 6.0, |u| u.is_wounded());
        assert_eq!(pick.map(|u| u.id), Some(UnitId(3)));
    }

    #[test]
    fn test_query_results_outlive_the_actor() {
        let w = world(vec![
            UnitSpec::new("me", Job::Healer, TeamId(1)),
            UnitSpec::new("ally", Job::Warrior, TeamId(1)).at(Vec2::new(1.0, 0.0)),
            UnitSpec::new("foe", Job::Warrior, TeamId(2)).at(Vec2::new(4.0, 0.0)),
        ]);
        let (foe, ally) = {
            let mut me = w.units[0].clone();
            me.position = Vec2::new(0.5, 0.0);
            (
                w.nearest_enemy(&me),
                w.weakest_ally_within(&me, 6.0, |u| u.id != me.id),
            )
        };
        assert_eq!(foe.map(|u| u.id), Some(UnitId(3)));
        assert_eq!(ally.map(|u| u.id), Some(UnitId(2)));
    }

    #[test]
    fn test_stance_defaults_to_aggressive() {
        let w = world(vec![]).with_stance(TeamId(2), TeamStance::Defensive);
        assert_eq!(w.stance(TeamId(1)), TeamStance::Aggressive);
        assert_eq!(w.stance(TeamId(2)), TeamStance::Defensive);
    }
}
