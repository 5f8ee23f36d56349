//! Externally supplied intents for player-controlled units

use std::collections::VecDeque;

use ahash::AHashMap;
use async_trait::async_trait;

use crate::battle::ai::decision_context::{UnitSnapshot, WorldSnapshot};
use crate::battle::ai::ActionIntent;
use crate::core::types::UnitId;

/// Source of player commands (UI, network, script)
#[async_trait]
pub trait PlayerInput: Send {
    /// Intent for a player-controlled unit whose turn it is
    async fn next_intent(&mut self, actor: &UnitSnapshot, world: &WorldSnapshot) -> ActionIntent;
}

/// Pre-queued commands per unit; an empty queue means the unit idles
#[derive(Debug, Default)]
pub struct QueuedInput {
    queues: AHashMap<UnitId, VecDeque<ActionIntent>>,
}

impl QueuedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, unit: UnitId, intent: ActionIntent) {
        self.queues.entry(unit).or_default().push_back(intent);
    }

    pub fn pending(&self, unit: UnitId) -> usize {
        self.queues.get(&unit).map_or(0, VecDeque::len)
    }
}

#[async_trait]
impl PlayerInput for QueuedInput {
    async fn next_intent(&mut self, actor: &UnitSnapshot, _world: &WorldSnapshot) -> ActionIntent {
        self.queues
            .get_mut(&actor.id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(ActionIntent::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Bounds, TeamId};
    use crate::unit::{Job, UnitFactory, UnitSpec};

    #[tokio::test]
    async fn test_queue_pops_in_order_then_idles() {
        let mut factory = UnitFactory::new();
        let hero = factory.create(UnitSpec::new("hero", Job::Warrior, TeamId(1))).snapshot();
        let world = WorldSnapshot::new(1, Bounds::new(10.0), vec![hero.clone()]);

        let mut input = QueuedInput::new();
        input.push(hero.id, ActionIntent::Attack { target: UnitId(7) });
        assert_eq!(input.pending(hero.id), 1);

        assert_eq!(
            input.next_intent(&hero, &world).await,
            ActionIntent::Attack { target: UnitId(7) }
        );
        assert_eq!(input.next_intent(&hero, &world).await, ActionIntent::Idle);
    }
}
