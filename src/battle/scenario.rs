//! Battle scenarios loaded from TOML
//!
//! A scenario lists the sides and their units by job with optional
//! overrides. Items are referenced by preset name; mercenaries name their
//! owner by unit name.

use std::collections::BTreeMap;
use std::path::Path;

use ahash::AHashMap;
use serde::de::value::StrDeserializer;
use serde::de::IntoDeserializer;
use serde::{Deserialize, Serialize};

use crate::battle::ai::Strategy;
use crate::battle::events::EventBus;
use crate::battle::roster::{Battlefield, TeamStance};
use crate::core::config::EngineConfig;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{TeamId, UnitId, Vec2};
use crate::skills::SkillId;
use crate::unit::{BaseStats, EquipmentSlot, Item, Job, Trait, UnitKind, UnitSpec};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub teams: Vec<TeamSetup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSetup {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub stance: TeamStance,
    #[serde(default)]
    pub units: Vec<UnitSetup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupKind {
    Player,
    Mercenary,
    #[default]
    Monster,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSetup {
    pub name: String,
    pub job: Job,
    #[serde(default)]
    pub kind: SetupKind,
    /// Name of the unit that hired this mercenary
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub base: Option<BaseStats>,
    #[serde(default)]
    pub traits: Vec<Trait>,
    /// Replaces the job's default skills when present
    #[serde(default)]
    pub skills: Option<Vec<SkillId>>,
    #[serde(default)]
    pub strategy: Option<Strategy>,
    /// Slot -> item preset; replaces the job's default loadout when present
    #[serde(default)]
    pub equipment: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub consumables: Vec<String>,
    #[serde(default)]
    pub flagged: bool,
}

impl Scenario {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.teams.len() < 2 {
            return Err(ArenaError::InvalidSetup(format!(
                "scenario '{}' needs at least two teams",
                self.name
            )));
        }
        let mut ids: Vec<u32> = self.teams.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.teams.len() {
            return Err(ArenaError::InvalidSetup("duplicate team id".into()));
        }
        Ok(())
    }

    /// Populate a fresh battlefield
    ///
    /// Mercenaries are hired after everyone else so their owners exist.
    pub fn build(&self, config: &EngineConfig) -> Result<Battlefield> {
        let mut field = Battlefield::new(config);
        let mut bus = EventBus::new();
        let mut by_name: AHashMap<String, UnitId> = AHashMap::new();

        for team in &self.teams {
            field.add_team(TeamId(team.id), team.name.clone(), team.stance)?;
        }

        let mut hires = Vec::new();
        for team in &self.teams {
            for setup in &team.units {
                let spec = setup.to_spec(TeamId(team.id))?;
                if setup.kind == SetupKind::Mercenary {
                    hires.push((setup, spec));
                    continue;
                }
                let id = field.spawn(spec);
                by_name.insert(setup.name.clone(), id);
            }
        }

        for (setup, spec) in hires {
            let owner = match &setup.owner {
                Some(name) => Some(*by_name.get(name).ok_or_else(|| {
                    ArenaError::InvalidSetup(format!("unknown owner '{}' for {}", name, setup.name))
                })?),
                None => None,
            };
            let id = field.hire_mercenary(spec, owner, &mut bus)?;
            by_name.insert(setup.name.clone(), id);
        }

        tracing::info!(scenario = %self.name, units = field.units().len(), "scenario built");
        Ok(field)
    }
}

impl UnitSetup {
    fn to_spec(&self, team: TeamId) -> Result<UnitSpec> {
        let kind = match self.kind {
            SetupKind::Player => UnitKind::Player,
            // Owner is resolved when hiring
            SetupKind::Mercenary => UnitKind::Mercenary { owner: None },
            SetupKind::Monster => UnitKind::Monster,
        };
        let mut spec = UnitSpec::new(self.name.clone(), self.job, team)
            .kind(kind)
            .at(Vec2::new(self.x, self.y));

        if let Some(level) = self.level {
            spec = spec.level(level);
        }
        if let Some(base) = self.base {
            spec = spec.base(base);
        }
        for t in &self.traits {
            spec = spec.with_trait(*t);
        }
        if let Some(skills) = &self.skills {
            spec = spec.skills(skills.iter().copied());
        }
        if let Some(strategy) = &self.strategy {
            spec = spec.strategy(strategy.clone());
        }
        if let Some(loadout) = &self.equipment {
            spec = spec.without_equipment();
            for (slot, name) in loadout {
                spec = spec.equip(parse_slot(slot)?, preset(name)?);
            }
        }
        for name in &self.consumables {
            spec = spec.carry(preset(name)?);
        }
        if self.flagged {
            spec = spec.flagged();
        }
        Ok(spec)
    }
}

fn parse_slot(name: &str) -> Result<EquipmentSlot> {
    let de: StrDeserializer<'_, serde::de::value::Error> = name.into_deserializer();
    EquipmentSlot::deserialize(de)
        .map_err(|_| ArenaError::InvalidSetup(format!("unknown equipment slot '{}'", name)))
}

fn preset(name: &str) -> Result<Item> {
    Item::preset(name).ok_or_else(|| ArenaError::InvalidSetup(format!("unknown item '{}'", name)))
}
