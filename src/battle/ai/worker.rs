//! Asynchronous decision boundary
//!
//! A decision is an explicit request/response exchange. The round controller
//! awaits the response under a timeout and substitutes a local melee decision
//! if it never arrives, so a dead or slow worker cannot stall a round.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::battle::ai::decision_context::{UnitSnapshot, WorldSnapshot};
use crate::battle::ai::{ActionIntent, DecisionEngine, IntentType};
use crate::core::error::{ArenaError, Result};
use crate::core::types::{UnitId, Vec2};
use crate::skills::SkillId;

/// Plain-data decision request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    #[serde(rename = "actorSnapshot")]
    pub actor: UnitSnapshot,
    #[serde(rename = "allUnitsSnapshot")]
    pub world: WorldSnapshot,
}

impl DecisionRequest {
    pub fn new(actor: UnitSnapshot, world: WorldSnapshot) -> Self {
        Self { actor, world }
    }
}

/// Intent-shaped decision payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub actor_id: UnitId,
    #[serde(rename = "type")]
    pub kind: IntentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Vec2>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<UnitId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<SkillId>,
}

impl DecisionResponse {
    pub fn from_intent(actor_id: UnitId, intent: &ActionIntent) -> Self {
        let mut response = Self {
            actor_id,
            kind: intent.kind(),
            path: None,
            target_id: intent.target(),
            skill_id: None,
        };
        match intent {
            ActionIntent::Move { path, .. } => response.path = Some(path.clone()),
            ActionIntent::Skill { skill, .. } => response.skill_id = Some(*skill),
            ActionIntent::Idle | ActionIntent::Attack { .. } => {}
        }
        response
    }

    pub fn idle(actor_id: UnitId) -> Self {
        Self::from_intent(actor_id, &ActionIntent::Idle)
    }

    /// Rebuild the intent, rejecting payloads missing a required field
    pub fn into_intent(self) -> Result<ActionIntent> {
        let missing = |field: &str| {
            ArenaError::MalformedDecision(format!(
                "{:?} for {} without {}",
                self.kind, self.actor_id, field
            ))
        };
        match self.kind {
            IntentType::Idle => Ok(ActionIntent::Idle),
            IntentType::Move => {
                let path = self.path.clone().filter(|p| !p.is_empty()).ok_or_else(|| missing("path"))?;
                Ok(ActionIntent::Move {
                    path,
                    engage: self.target_id,
                })
            }
            IntentType::Attack => Ok(ActionIntent::Attack {
                target: self.target_id.ok_or_else(|| missing("targetId"))?,
            }),
            IntentType::Skill => Ok(ActionIntent::Skill {
                skill: self.skill_id.ok_or_else(|| missing("skillId"))?,
                target: self.target_id.ok_or_else(|| missing("targetId"))?,
            }),
        }
    }
}

/// Anything that can answer a decision request
#[async_trait]
pub trait DecisionSource: Send + Sync {
    async fn request(&self, request: DecisionRequest) -> Result<DecisionResponse>;
}

/// Decides in place on the caller's task
#[derive(Debug, Clone)]
pub struct LocalDecisions {
    engine: DecisionEngine,
}

impl LocalDecisions {
    pub fn new(engine: DecisionEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl DecisionSource for LocalDecisions {
    async fn request(&self, request: DecisionRequest) -> Result<DecisionResponse> {
        Ok(self.engine.respond(&request))
    }
}

struct Job {
    request: DecisionRequest,
    reply: oneshot::Sender<DecisionResponse>,
}

/// Background task that owns a decision engine
pub struct DecisionWorker;

impl DecisionWorker {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(engine: DecisionEngine, capacity: usize) -> WorkerHandle {
        let (tx, mut rx) = mpsc::channel::<Job>(capacity.max(1));
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let response = engine.respond(&job.request);
                // Requester may have timed out and dropped its receiver
                let _ = job.reply.send(response);
            }
            tracing::debug!("decision worker stopped");
        });
        WorkerHandle { tx }
    }
}

/// Client side of a spawned `DecisionWorker`
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<Job>,
}

#[async_trait]
impl DecisionSource for WorkerHandle {
    async fn request(&self, request: DecisionRequest) -> Result<DecisionResponse> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Job {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ArenaError::DecisionUnavailable("worker channel closed".into()))?;
        reply_rx
            .await
            .map_err(|_| ArenaError::DecisionUnavailable("worker dropped the reply".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::{Bounds, TeamId};
    use crate::unit::{Job as UnitJob, UnitFactory, UnitSpec};

    fn request() -> DecisionRequest {
        let mut factory = UnitFactory::new();
        let a = factory.create(UnitSpec::new("a", UnitJob::Rogue, TeamId(1)));
        let b = factory.create(UnitSpec::new("b", UnitJob::Rogue, TeamId(2)).at(Vec2::new(1.0, 0.0)));
        let world = WorldSnapshot::new(1, Bounds::new(50.0), vec![a.snapshot(), b.snapshot()]);
        DecisionRequest::new(a.snapshot(), world)
    }

    #[test]
    fn test_response_wire_shape() {
        let response = DecisionResponse::from_intent(UnitId(1), &ActionIntent::Attack { target: UnitId(2) });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["actorId"], 1);
        assert_eq!(json["type"], "ATTACK");
        assert_eq!(json["targetId"], 2);
        assert!(json.get("path").is_none());
    }

    #[test]
    fn test_malformed_response_is_rejected() {
        let response = DecisionResponse {
            actor_id: UnitId(1),
            kind: IntentType::Skill,
            path: None,
            target_id: Some(UnitId(2)),
            skill_id: None,
        };
        assert!(matches!(
            response.into_intent(),
            Err(ArenaError::MalformedDecision(_))
        ));
    }

    #[test]
    fn test_request_parses_from_json() {
        let json = serde_json::to_string(&request()).unwrap();
        assert!(json.contains("actorSnapshot"));
        let parsed: DecisionRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.world.units.len(), 2);
    }

    #[tokio::test]
    async fn test_worker_round_trip() {
        let handle = DecisionWorker::spawn(DecisionEngine::new(&EngineConfig::default()), 4);
        let response = handle.request(request()).await.unwrap();
        assert_eq!(
            response.into_intent().unwrap(),
            ActionIntent::Attack { target: UnitId(2) }
        );
    }

    #[tokio::test]
    async fn test_local_matches_worker() {
        let engine = DecisionEngine::new(&EngineConfig::default());
        let local = LocalDecisions::new(engine.clone()).request(request()).await.unwrap();
        let remote = DecisionWorker::spawn(engine, 1).request(request()).await.unwrap();
        assert_eq!(local, remote);
    }
}
