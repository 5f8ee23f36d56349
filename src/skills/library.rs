//! Per-unit skill library with cooldown timers

use serde::{Deserialize, Serialize};

use crate::skills::SkillId;

/// A skill a unit knows and its remaining cooldown in rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedSkill {
    pub id: SkillId,
    pub cooldown: u32,
}

/// Ordered set of learned skills; order is the AI's scan order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillLibrary {
    skills: Vec<LearnedSkill>,
}

impl SkillLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: impl IntoIterator<Item = SkillId>) -> Self {
        let mut library = Self::new();
        for id in ids {
            library.learn(id);
        }
        library
    }

    /// Learn a skill at the end of the order; duplicates are ignored
    pub fn learn(&mut self, id: SkillId) -> bool {
        if self.knows(id) {
            return false;
        }
        self.skills.push(LearnedSkill { id, cooldown: 0 });
        true
    }

    pub fn knows(&self, id: SkillId) -> bool {
        self.skills.iter().any(|s| s.id == id)
    }

    pub fn cooldown(&self, id: SkillId) -> Option<u32> {
        self.skills.iter().find(|s| s.id == id).map(|s| s.cooldown)
    }

    pub fn is_ready(&self, id: SkillId) -> bool {
        self.cooldown(id) == Some(0)
    }

    pub fn start_cooldown(&mut self, id: SkillId, rounds: u32) {
        if let Some(skill) = self.skills.iter_mut().find(|s| s.id == id) {
            skill.cooldown = rounds;
        }
    }

    /// Count every cooldown down by one round
    pub fn tick_round(&mut self) {
        for skill in &mut self.skills {
            skill.cooldown = skill.cooldown.saturating_sub(1);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LearnedSkill> {
        self.skills.iter()
    }

    /// Skills off cooldown, in learned order
    pub fn ready(&self) -> impl Iterator<Item = SkillId> + '_ {
        self.skills.iter().filter(|s| s.cooldown == 0).map(|s| s.id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learn_keeps_order_and_rejects_duplicates() {
        let mut library = SkillLibrary::new();
        assert!(library.learn(SkillId::Heal));
        assert!(library.learn(SkillId::Fireball));
        assert!(!library.learn(SkillId::Heal));
        let ids: Vec<SkillId> = library.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SkillId::Heal, SkillId::Fireball]);
    }

    #[test]
    fn test_cooldowns_are_independent() {
        let mut library = SkillLibrary::from_ids([SkillId::Heal, SkillId::Barrier]);
        library.start_cooldown(SkillId::Heal, 2);
        assert!(!library.is_ready(SkillId::Heal));
        assert!(library.is_ready(SkillId::Barrier));
        assert_eq!(library.ready().collect::<Vec<_>>(), vec![SkillId::Barrier]);

        library.tick_round();
        library.tick_round();
        assert!(library.is_ready(SkillId::Heal));
    }

    #[test]
    fn test_unknown_skill_is_not_ready() {
        let library = SkillLibrary::new();
        assert!(!library.is_ready(SkillId::Cleave));
        assert_eq!(library.cooldown(SkillId::Cleave), None);
    }
}
