//! Items and the eight-slot equipment loadout

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::types::ItemId;
use crate::unit::stats::{Stat, StatModifier};

/// Equipment slots; each holds at most one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    MainHand,
    OffHand,
    Armor,
    Helmet,
    Gloves,
    Boots,
    Accessory1,
    Accessory2,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 8] = [
        EquipmentSlot::MainHand,
        EquipmentSlot::OffHand,
        EquipmentSlot::Armor,
        EquipmentSlot::Helmet,
        EquipmentSlot::Gloves,
        EquipmentSlot::Boots,
        EquipmentSlot::Accessory1,
        EquipmentSlot::Accessory2,
    ];

    /// Slots that take wear when their wearer is hit
    pub fn is_protective(self) -> bool {
        matches!(
            self,
            EquipmentSlot::Armor | EquipmentSlot::Helmet | EquipmentSlot::Gloves | EquipmentSlot::Boots
        )
    }
}

/// Category tags an item can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemTag {
    Weapon,
    Ranged,
    Magic,
    Armor,
    Accessory,
    Consumable,
    Pet,
    Corpse,
}

/// Depletable item condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durability {
    pub current: u32,
    pub max: u32,
}

impl Durability {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Returns true when this wear broke the item
    pub fn wear(&mut self, amount: u32) -> bool {
        let was_intact = self.current > 0;
        self.current = self.current.saturating_sub(amount);
        was_intact && self.current == 0
    }

    pub fn is_broken(&self) -> bool {
        self.current == 0
    }
}

/// Weapon-specific progression, independent of the wielder's level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponProgress {
    pub level: u32,
    pub exp: u32,
}

impl WeaponProgress {
    /// Exp a weapon needs per level
    pub const EXP_PER_LEVEL: u32 = 10;

    pub fn new() -> Self {
        Self { level: 1, exp: 0 }
    }

    /// Add exp; returns true when the weapon levelled
    pub fn gain(&mut self, exp: u32) -> bool {
        self.exp += exp;
        let mut levelled = false;
        while self.exp >= self.level * Self::EXP_PER_LEVEL {
            self.exp -= self.level * Self::EXP_PER_LEVEL;
            self.level += 1;
            levelled = true;
        }
        levelled
    }

    /// Attack power granted by weapon levels past the first
    pub fn attack_bonus(&self) -> f32 {
        self.level.saturating_sub(1) as f32
    }
}

impl Default for WeaponProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Equipment or consumable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub tags: BTreeSet<ItemTag>,
    #[serde(default)]
    pub modifiers: Vec<StatModifier>,
    /// Carried weight; feeds turn order
    #[serde(default)]
    pub weight: Option<u32>,
    #[serde(default)]
    pub durability: Option<Durability>,
    #[serde(default)]
    pub progress: Option<WeaponProgress>,
    /// Base cooldown of a basic attack made with this weapon
    #[serde(default)]
    pub attack_cooldown: Option<f32>,
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            tags: BTreeSet::new(),
            modifiers: Vec::new(),
            weight: None,
            durability: None,
            progress: None,
            attack_cooldown: None,
        }
    }

    pub fn with_tag(mut self, tag: ItemTag) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn with_modifier(mut self, modifier: StatModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_durability(mut self, max: u32) -> Self {
        self.durability = Some(Durability::new(max));
        self
    }

    pub fn has_tag(&self, tag: ItemTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Modifiers this item currently contributes, including weapon levels
    pub fn effective_modifiers(&self) -> Vec<StatModifier> {
        let mut modifiers = self.modifiers.clone();
        if let Some(progress) = &self.progress {
            let bonus = progress.attack_bonus();
            if bonus > 0.0 {
                modifiers.push(StatModifier::flat(Stat::AttackPower, bonus));
            }
        }
        modifiers
    }

    pub fn sword() -> Self {
        let mut item = Item::new("Sword")
            .with_tag(ItemTag::Weapon)
            .with_modifier(StatModifier::flat(Stat::AttackPower, 4.0))
            .with_weight(8)
            .with_durability(60);
        item.progress = Some(WeaponProgress::new());
        item.attack_cooldown = Some(1.0);
        item
    }

    pub fn bow() -> Self {
        let mut item = Item::new("Bow")
            .with_tag(ItemTag::Weapon)
            .with_tag(ItemTag::Ranged)
            .with_modifier(StatModifier::flat(Stat::AttackPower, 3.0))
            .with_modifier(StatModifier::flat(Stat::AttackRange, 2.0))
            .with_weight(4)
            .with_durability(50);
        item.progress = Some(WeaponProgress::new());
        item.attack_cooldown = Some(1.0);
        item
    }

    pub fn staff() -> Self {
        let mut item = Item::new("Staff")
            .with_tag(ItemTag::Weapon)
            .with_tag(ItemTag::Magic)
            .with_modifier(StatModifier::flat(Stat::SpellPower, 3.0))
            .with_modifier(StatModifier::flat(Stat::MaxMp, 10.0))
            .with_weight(5)
            .with_durability(40);
        item.attack_cooldown = Some(1.5);
        item
    }

    pub fn dagger() -> Self {
        let mut item = Item::new("Dagger")
            .with_tag(ItemTag::Weapon)
            .with_modifier(StatModifier::flat(Stat::AttackPower, 2.0))
            .with_modifier(StatModifier::percent(Stat::AttackSpeed, 20.0))
            .with_weight(2)
            .with_durability(40);
        item.progress = Some(WeaponProgress::new());
        item.attack_cooldown = Some(0.8);
        item
    }

    pub fn shield() -> Self {
        Item::new("Buckler")
            .with_tag(ItemTag::Armor)
            .with_modifier(StatModifier::flat(Stat::MaxHp, 6.0))
            .with_weight(6)
            .with_durability(40)
    }

    pub fn leather_armor() -> Self {
        Item::new("Leather Armor")
            .with_tag(ItemTag::Armor)
            .with_modifier(StatModifier::flat(Stat::MaxHp, 8.0))
            .with_weight(6)
            .with_durability(50)
    }

    pub fn plate_armor() -> Self {
        Item::new("Plate Armor")
            .with_tag(ItemTag::Armor)
            .with_modifier(StatModifier::flat(Stat::MaxHp, 16.0))
            .with_modifier(StatModifier::flat(Stat::MovementSpeed, -1.0))
            .with_weight(14)
            .with_durability(80)
    }

    pub fn helmet() -> Self {
        Item::new("Helmet")
            .with_tag(ItemTag::Armor)
            .with_modifier(StatModifier::flat(Stat::MaxHp, 4.0))
            .with_weight(3)
            .with_durability(40)
    }

    pub fn boots() -> Self {
        Item::new("Boots")
            .with_tag(ItemTag::Armor)
            .with_modifier(StatModifier::flat(Stat::MovementSpeed, 0.5))
            .with_weight(2)
            .with_durability(40)
    }

    pub fn ring_of_focus() -> Self {
        Item::new("Ring of Focus")
            .with_tag(ItemTag::Accessory)
            .with_tag(ItemTag::Magic)
            .with_modifier(StatModifier::percent(Stat::CastingSpeed, 15.0))
            .with_modifier(StatModifier::flat(Stat::MpRegen, 0.5))
    }

    pub fn potion() -> Self {
        Item::new("Healing Potion").with_tag(ItemTag::Consumable)
    }

    /// A corpse left on the ground where a unit died
    pub fn corpse(of: &str) -> Self {
        Item::new(format!("{} corpse", of)).with_tag(ItemTag::Corpse)
    }

    /// Look up a named preset (scenario files refer to items by name)
    pub fn preset(name: &str) -> Option<Self> {
        let item = match name {
            "sword" => Item::sword(),
            "bow" => Item::bow(),
            "staff" => Item::staff(),
            "dagger" => Item::dagger(),
            "buckler" => Item::shield(),
            "leather_armor" => Item::leather_armor(),
            "plate_armor" => Item::plate_armor(),
            "helmet" => Item::helmet(),
            "boots" => Item::boots(),
            "ring_of_focus" => Item::ring_of_focus(),
            "potion" => Item::potion(),
            _ => return None,
        };
        Some(item)
    }

    /// Default slot for an item, judged from its tags and name
    pub fn natural_slot(&self) -> Option<EquipmentSlot> {
        if self.has_tag(ItemTag::Weapon) {
            Some(EquipmentSlot::MainHand)
        } else if self.has_tag(ItemTag::Accessory) {
            Some(EquipmentSlot::Accessory1)
        } else if self.has_tag(ItemTag::Armor) {
            let lower = self.name.to_lowercase();
            Some(if lower.contains("helm") {
                EquipmentSlot::Helmet
            } else if lower.contains("boot") {
                EquipmentSlot::Boots
            } else if lower.contains("glove") || lower.contains("gauntlet") {
                EquipmentSlot::Gloves
            } else if lower.contains("buckler") || lower.contains("shield") {
                EquipmentSlot::OffHand
            } else {
                EquipmentSlot::Armor
            })
        } else {
            None
        }
    }
}

/// Eight-slot loadout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    slots: BTreeMap<EquipmentSlot, Item>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an item in a slot, returning whatever was there
    pub fn equip(&mut self, slot: EquipmentSlot, item: Item) -> Option<Item> {
        self.slots.insert(slot, item)
    }

    pub fn unequip(&mut self, slot: EquipmentSlot) -> Option<Item> {
        self.slots.remove(&slot)
    }

    pub fn get(&self, slot: EquipmentSlot) -> Option<&Item> {
        self.slots.get(&slot)
    }

    pub fn get_mut(&mut self, slot: EquipmentSlot) -> Option<&mut Item> {
        self.slots.get_mut(&slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EquipmentSlot, &Item)> {
        self.slots.iter().map(|(slot, item)| (*slot, item))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sum of declared weights; None when nothing equipped declares a weight
    pub fn declared_weight(&self) -> Option<u32> {
        self.slots
            .values()
            .filter_map(|item| item.weight)
            .fold(None, |acc, w| Some(acc.unwrap_or(0) + w))
    }

    /// Every stat contribution from equipped items, in slot order
    pub fn modifiers(&self) -> Vec<StatModifier> {
        self.slots.values().flat_map(|item| item.effective_modifiers()).collect()
    }

    /// Base attack cooldown of the main-hand weapon, if it declares one
    pub fn weapon_cooldown(&self) -> Option<f32> {
        self.get(EquipmentSlot::MainHand).and_then(|item| item.attack_cooldown)
    }

    /// Wear an item down; a broken item is removed and returned
    pub fn wear(&mut self, slot: EquipmentSlot, amount: u32) -> Option<Item> {
        let broke = self
            .slots
            .get_mut(&slot)
            .and_then(|item| item.durability.as_mut())
            .map(|durability| durability.wear(amount))
            .unwrap_or(false);
        if broke {
            self.slots.remove(&slot)
        } else {
            None
        }
    }

    /// Take every equipped item out (loot pools, snapshots)
    pub fn drain(&mut self) -> Vec<Item> {
        std::mem::take(&mut self.slots).into_values().collect()
    }
}
