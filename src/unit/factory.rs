//! Unit construction at battle setup, hire time and summon time

use serde::{Deserialize, Serialize};

use crate::battle::ai::Strategy;
use crate::core::types::{TeamId, UnitId, Vec2};
use crate::skills::{SkillId, SkillLibrary};
use crate::unit::equipment::{EquipmentSlot, Item};
use crate::unit::stats::{BaseStats, Job, JobTemplate, Trait};
use crate::unit::{Unit, UnitKind};

/// Everything needed to build one unit
#[derive(Debug, Clone)]
pub struct UnitSpec {
    pub name: String,
    pub kind: UnitKind,
    pub team: TeamId,
    pub position: Vec2,
    pub template: JobTemplate,
    pub base: BaseStats,
    pub level: u32,
    pub traits: Vec<Trait>,
    pub equipment: Vec<(EquipmentSlot, Item)>,
    pub consumables: Vec<Item>,
    pub skills: Vec<SkillId>,
    pub strategy: Option<Strategy>,
    pub flagged: bool,
}

impl UnitSpec {
    /// A unit of `job` with that job's default skills and loadout
    pub fn new(name: impl Into<String>, job: Job, team: TeamId) -> Self {
        Self {
            name: name.into(),
            kind: UnitKind::Monster,
            team,
            position: Vec2::ZERO,
            template: JobTemplate::for_job(job),
            base: BaseStats::uniform(10.0),
            level: 1,
            traits: Vec::new(),
            equipment: default_loadout(job),
            consumables: Vec::new(),
            skills: default_skills(job).to_vec(),
            strategy: None,
            flagged: false,
        }
    }

    /// A bare unit built from an explicit template: no sliders, gear or skills
    pub fn from_template(name: impl Into<String>, template: JobTemplate, team: TeamId) -> Self {
        Self {
            name: name.into(),
            kind: UnitKind::Monster,
            team,
            position: Vec2::ZERO,
            template,
            base: BaseStats::default(),
            level: 1,
            traits: Vec::new(),
            equipment: Vec::new(),
            consumables: Vec::new(),
            skills: Vec::new(),
            strategy: None,
            flagged: false,
        }
    }

    pub fn kind(mut self, kind: UnitKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn base(mut self, base: BaseStats) -> Self {
        self.base = base;
        self
    }

    pub fn level(mut self, level: u32) -> Self {
        self.level = level.max(1);
        self
    }

    pub fn with_trait(mut self, t: Trait) -> Self {
        self.traits.push(t);
        self
    }

    pub fn equip(mut self, slot: EquipmentSlot, item: Item) -> Self {
        self.equipment.retain(|(s, _)| *s != slot);
        self.equipment.push((slot, item));
        self
    }

    pub fn without_equipment(mut self) -> Self {
        self.equipment.clear();
        self
    }

    pub fn carry(mut self, item: Item) -> Self {
        self.consumables.push(item);
        self
    }

    pub fn skills(mut self, skills: impl IntoIterator<Item = SkillId>) -> Self {
        self.skills = skills.into_iter().collect();
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn flagged(mut self) -> Self {
        self.flagged = true;
        self
    }
}

/// Allocates unit ids and assembles units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitFactory {
    next_id: u32,
}

impl UnitFactory {
    /// Ids start at 1
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Make sure future ids do not collide with an externally chosen one
    pub fn reserve(&mut self, id: UnitId) {
        self.next_id = self.next_id.max(id.0 + 1);
    }

    pub fn next_id(&mut self) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn create(&mut self, spec: UnitSpec) -> Unit {
        let id = self.next_id();
        build(id, spec)
    }

    /// Summoned wolf bound to its summoner
    pub fn create_summon(&mut self, summoner: &Unit, position: Vec2) -> Unit {
        let spec = UnitSpec::new(format!("{}'s Wolf", summoner.name), Job::Beast, summoner.allegiance())
            .kind(UnitKind::Pet { owner: summoner.id })
            .at(position)
            .level(summoner.level)
            .strategy(Strategy::Melee);
        self.create(spec)
    }
}

impl Default for UnitFactory {
    fn default() -> Self {
        Self::new()
    }
}

fn build(id: UnitId, spec: UnitSpec) -> Unit {
    let mut unit = Unit::new(id, spec.name, spec.kind, spec.team, spec.template, spec.base);
    unit.position = spec.position;
    unit.level = spec.level.max(1);
    unit.traits = spec.traits;
    for (slot, item) in spec.equipment {
        unit.equip(slot, item);
    }
    for item in spec.consumables {
        // Overflow beyond pouch capacity is dropped at creation
        let _ = unit.stash(item);
    }
    unit.skills = SkillLibrary::from_ids(spec.skills);
    if let Some(strategy) = spec.strategy {
        unit.set_strategy(strategy);
    } else if matches!(spec.kind, UnitKind::Player) {
        unit.set_strategy(Strategy::Player);
    }
    unit.flagged = spec.flagged;
    unit.recalculate();
    unit.set_hp(unit.max_hp());
    let max_mp = unit.stats().max_mp;
    unit.set_mp(max_mp);
    unit
}

/// Skills each job starts with, in scan order
pub fn default_skills(job: Job) -> &'static [SkillId] {
    match job {
        Job::Healer => &[SkillId::Heal, SkillId::Barrier, SkillId::Renew],
        Job::Wizard => &[SkillId::Fireball, SkillId::Frostbolt, SkillId::Barrier],
        Job::Archer => &[SkillId::PowerShot, SkillId::PoisonArrow],
        Job::Warrior => &[SkillId::Cleave],
        Job::Bard => &[SkillId::Inspire, SkillId::Lullaby, SkillId::Quicken],
        Job::Summoner => &[SkillId::SummonWolf, SkillId::Heal],
        Job::Ghost => &[SkillId::Possess],
        Job::Rogue | Job::Beast => &[],
    }
}

/// Starting equipment per job
pub fn default_loadout(job: Job) -> Vec<(EquipmentSlot, Item)> {
    match job {
        Job::Warrior => vec![
            (EquipmentSlot::MainHand, Item::sword()),
            (EquipmentSlot::OffHand, Item::shield()),
            (EquipmentSlot::Armor, Item::leather_armor()),
        ],
        Job::Archer => vec![
            (EquipmentSlot::MainHand, Item::bow()),
            (EquipmentSlot::Boots, Item::boots()),
        ],
        Job::Wizard | Job::Healer | Job::Summoner => vec![
            (EquipmentSlot::MainHand, Item::staff()),
            (EquipmentSlot::Accessory1, Item::ring_of_focus()),
        ],
        Job::Bard => vec![(EquipmentSlot::MainHand, Item::dagger())],
        Job::Rogue => vec![
            (EquipmentSlot::MainHand, Item::dagger()),
            (EquipmentSlot::Boots, Item::boots()),
        ],
        Job::Beast | Job::Ghost => Vec::new(),
    }
}
