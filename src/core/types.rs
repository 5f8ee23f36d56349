//! Core type definitions used throughout the codebase

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for combat participants
///
/// Plain integers so snapshots stay readable on the decision wire.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[display(fmt = "unit#{}", _0)]
#[serde(transparent)]
pub struct UnitId(pub u32);

/// Allegiance of a unit (one side of the battle)
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[display(fmt = "team#{}", _0)]
#[serde(transparent)]
pub struct TeamId(pub u32);

/// Unique identifier for items (equipment, consumables, loot, corpses)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

/// 2D position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0001 {
            Self { x: self.x / len, y: self.y / len }
        } else {
            Self::default()
        }
    }

    /// Step toward `target` by at most `max_step`, never overshooting
    pub fn move_towards(&self, target: &Self, max_step: f32) -> Self {
        let remaining = self.distance(target);
        if remaining <= max_step || remaining <= f32::EPSILON {
            *target
        } else {
            *self + (*target - *self).normalize() * max_step
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

/// Axis-aligned arena bounds, centered on the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub half_extent: f32,
}

impl Bounds {
    pub fn new(half_extent: f32) -> Self {
        Self { half_extent: half_extent.max(0.0) }
    }

    pub fn clamp(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(-self.half_extent, self.half_extent),
            point.y.clamp(-self.half_extent, self.half_extent),
        )
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x.abs() <= self.half_extent && point.y.abs() <= self.half_extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id_display() {
        assert_eq!(UnitId(7).to_string(), "unit#7");
        assert_eq!(TeamId(2).to_string(), "team#2");
    }

    #[test]
    fn test_move_towards_does_not_overshoot() {
        let from = Vec2::new(0.0, 0.0);
        let to = Vec2::new(3.0, 4.0);
        assert_eq!(from.move_towards(&to, 10.0), to);

        let partial = from.move_towards(&to, 2.5);
        assert!((partial.distance(&from) - 2.5).abs() < 1e-4);
        assert!((partial.distance(&to) - 2.5).abs() < 1e-4);
    }

    #[test]
    fn test_bounds_clamp() {
        let bounds = Bounds::new(10.0);
        assert_eq!(bounds.clamp(Vec2::new(15.0, -20.0)), Vec2::new(10.0, -10.0));
        assert!(bounds.contains(Vec2::new(9.9, -9.9)));
        assert!(!bounds.contains(Vec2::new(10.1, 0.0)));
    }
}
