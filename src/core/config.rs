//! Engine configuration with documented constants
//!
//! All tuning numbers for the combat core live here. The config is handed to
//! each component at construction; nothing reads it from a global.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{ArenaError, Result};

/// Fraction of attack range an approaching unit stops at
///
/// Ranged units must keep their minimum distance below this or they would
/// close in and immediately back off again.
pub const APPROACH_MARGIN: f32 = 0.9;

/// Configuration for the combat core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === ROUNDS ===
    /// Hard cap on rounds before the battle is declared a draw
    ///
    /// Symmetric stalemates (two healers, two kiting archers) would otherwise
    /// never terminate.
    pub round_cap: u32,

    // === DECISIONS ===
    /// How long to wait for the decision worker before falling back to
    /// the local nearest-enemy melee decision (milliseconds)
    pub decision_timeout_ms: u64,

    // === ANIMATION WINDOWS ===
    /// Wall-clock length of one animation frame when driven by a real clock
    pub frame_ms: u64,

    /// Interpolation frames used to cover one turn's worth of movement
    pub move_frames: u32,

    /// Frames between the swing starting and the hit landing
    pub pre_hit_frames: u32,

    /// Frames of hit effect after damage is applied
    pub post_hit_frames: u32,

    /// Channel frames for a skill at casting speed 1.0
    ///
    /// Scaled down by the caster's casting speed, never below one frame.
    pub cast_frames: u32,

    // === TURN ORDER ===
    /// Base speed every unit starts from before weight and agility
    ///
    /// speed = turn_speed_base - carried weight + agility
    pub turn_speed_base: i32,

    /// Upper bound (exclusive) of the random weight rolled for units that
    /// carry nothing with a declared weight
    pub random_weight_max: u32,

    // === ATTACKS ===
    /// Base cooldown of a basic attack when the main hand carries no weapon
    /// cooldown of its own (in rounds, before attack speed)
    pub default_attack_cooldown: f32,

    // === AFTERMATH ===
    /// Animation frames a dead unit stays addressable before removal
    pub death_grace_frames: u64,

    /// Loot roll size multiplier: a death drops
    /// min(pool size, floor(random * max_loot_roll)) items
    pub max_loot_roll: u32,

    /// Whether a corpse item is left where a unit died
    pub spawn_corpses: bool,

    /// Damaging hits a sleeping unit absorbs before waking
    pub sleep_wake_hits: u32,

    /// Experience needed per level (threshold = level * exp_per_level)
    pub exp_per_level: u32,

    /// Experience granted per victim level on a kill
    pub kill_exp_per_level: u32,

    // === AI ===
    /// Ranged units keep at least this fraction of their attack range
    /// between themselves and the nearest enemy
    pub ranged_min_distance_ratio: f32,

    /// Maximum simultaneously living summons per summoner
    pub max_summons: u32,

    // === WORLD ===
    /// Half the side length of the square arena
    pub arena_half_extent: f32,

    /// Seed for turn-order weights and loot rolls
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            round_cap: 100,

            decision_timeout_ms: 250,

            frame_ms: 16,
            move_frames: 4,
            pre_hit_frames: 2,
            post_hit_frames: 2,
            cast_frames: 4,

            turn_speed_base: 1000,
            random_weight_max: 20,

            default_attack_cooldown: 1.0,

            death_grace_frames: 30,
            max_loot_roll: 6,
            spawn_corpses: true,
            sleep_wake_hits: 1,
            exp_per_level: 100,
            kill_exp_per_level: 25,

            ranged_min_distance_ratio: 0.5,
            max_summons: 2,

            arena_half_extent: 50.0,
            seed: 42,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML, falling back to defaults for missing keys
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_millis(self.decision_timeout_ms)
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.round_cap == 0 {
            return Err(ArenaError::InvalidConfig("round_cap must be at least 1".into()));
        }

        if self.move_frames == 0 {
            return Err(ArenaError::InvalidConfig("move_frames must be at least 1".into()));
        }

        if !(0.0..APPROACH_MARGIN).contains(&self.ranged_min_distance_ratio) {
            return Err(ArenaError::InvalidConfig(format!(
                "ranged_min_distance_ratio ({}) must be in [0, {})",
                self.ranged_min_distance_ratio, APPROACH_MARGIN
            )));
        }

        if self.default_attack_cooldown <= 0.0 {
            return Err(ArenaError::InvalidConfig(
                "default_attack_cooldown must be positive".into(),
            ));
        }

        if self.exp_per_level == 0 {
            return Err(ArenaError::InvalidConfig("exp_per_level must be at least 1".into()));
        }

        if self.arena_half_extent <= 0.0 {
            return Err(ArenaError::InvalidConfig("arena_half_extent must be positive".into()));
        }

        Ok(())
    }
}
