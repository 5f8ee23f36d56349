//! Battle system integration tests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use arena_combat::battle::ai::*;
use arena_combat::battle::*;
use arena_combat::core::{EngineConfig, Result, TeamId, UnitId, Vec2};
use arena_combat::skills::SkillId;
use arena_combat::unit::*;
use async_trait::async_trait;

fn template(job: Job, max_hp: f32, attack_power: f32) -> JobTemplate {
    JobTemplate::new(
        job,
        DerivedStats {
            max_hp,
            attack_power,
            attack_range: 2.0,
            movement_speed: 3.0,
            attack_speed: 1.0,
            casting_speed: 1.0,
            vision_range: 20.0,
            ..DerivedStats::default()
        },
    )
}

#[tokio::test]
async fn test_single_attack_ends_duel() {
    let config = EngineConfig::default();
    let mut field = Battlefield::new(&config);
    let a = field.spawn(
        UnitSpec::from_template("A", template(Job::Rogue, 30.0, 10.0), TeamId(1)).kind(UnitKind::Player),
    );
    let b = field.spawn(
        UnitSpec::from_template("B", template(Job::Rogue, 10.0, 0.0), TeamId(2)).at(Vec2::new(1.0, 0.0)),
    );

    let mut input = QueuedInput::new();
    input.push(a, ActionIntent::Attack { target: b });
    let mut controller = RoundController::new(config, field).with_player_input(input);
    let result = controller.run().await.unwrap();

    assert_eq!(result.outcome, BattleOutcome::Victory);
    assert_eq!(result.winner, Some(TeamId(1)));
    assert_eq!(result.rounds, 1);
    assert_eq!(controller.bus().count(Topic::EntityDeath), 1);
    assert_eq!(controller.bus().count(Topic::MonsterDefeated), 1);
    assert!(matches!(
        controller.bus().last_of(Topic::BattleEnded),
        Some(BattleEvent::BattleEnded { winner: Some(TeamId(1)), .. })
    ));
    // The body is gone once the battle wraps up
    assert!(controller.field().unit(b).is_none());
    assert_eq!(controller.field().unit(a).unwrap().exp, 25);
}

#[test]
fn test_healer_prefers_heal_over_attack() {
    let mut factory = UnitFactory::new();
    let healer = factory.create(UnitSpec::new("healer", Job::Healer, TeamId(1)));
    let mut ally = factory.create(UnitSpec::new("ally", Job::Warrior, TeamId(1)).at(Vec2::new(2.0, 0.0)));
    ally.take_damage(5.0);
    let enemy = factory.create(UnitSpec::new("enemy", Job::Rogue, TeamId(2)).at(Vec2::new(1.0, 1.0)));

    let world = WorldSnapshot::new(
        1,
        arena_combat::core::Bounds::new(50.0),
        vec![healer.snapshot(), ally.snapshot(), enemy.snapshot()],
    );
    let engine = DecisionEngine::new(&EngineConfig::default());
    assert_eq!(
        engine.decide(&world.units[0], &world),
        ActionIntent::Skill {
            skill: SkillId::Heal,
            target: ally.id
        }
    );
}

#[test]
fn test_shield_absorbs_before_hp() {
    let mut factory = UnitFactory::new();
    let mut attacker = factory.create(UnitSpec::from_template("a", template(Job::Rogue, 10.0, 8.0), TeamId(1)));
    let mut defender = factory.create(UnitSpec::from_template("d", template(Job::Rogue, 30.0, 0.0), TeamId(2)));
    defender.add_shield(5.0);
    let mut bus = EventBus::new();

    apply_attack(&mut attacker, &mut defender, None, &mut bus);
    assert_eq!(defender.shield(), 0.0);
    assert_eq!(defender.hp(), 27.0);
}

#[test]
fn test_turn_order_from_weight_and_agility() {
    let mut factory = UnitFactory::new();
    let units: Vec<Unit> = [(10, 5.0), (5, 8.0), (5, 4.0)]
        .into_iter()
        .map(|(weight, agility)| {
            factory.create(
                UnitSpec::new("u", Job::Rogue, TeamId(1))
                    .without_equipment()
                    .base(BaseStats {
                        agility,
                        ..BaseStats::default()
                    })
                    .equip(EquipmentSlot::Armor, Item::new("pack").with_weight(weight)),
            )
        })
        .collect();

    let sequencer = TurnSequencer::new(&EngineConfig::default());
    let mut rng = <rand_chacha::ChaCha8Rng as rand::SeedableRng>::seed_from_u64(0);
    let speeds: Vec<i32> = sequencer.speeds(&units, &mut rng).into_iter().map(|(_, s)| s).collect();
    assert_eq!(speeds, vec![995, 1003, 999]);
    assert_eq!(
        sequencer.order_for(&units, &mut rng),
        vec![units[1].id, units[2].id, units[0].id]
    );
}

#[tokio::test]
async fn test_fallen_side_ends_battle_next_check() {
    let config = EngineConfig::default();
    let mut field = Battlefield::new(&config);
    let fallen = field.spawn(UnitSpec::new("fallen", Job::Warrior, TeamId(1)));
    field.spawn(UnitSpec::new("standing", Job::Warrior, TeamId(2)).at(Vec2::new(5.0, 0.0)));
    field.unit_mut(fallen).unwrap().take_damage(1_000.0);

    let mut controller = RoundController::new(config, field);
    let result = controller.play_round().await.unwrap();
    assert_eq!(result.winner, Some(TeamId(2)));
    assert_eq!(controller.bus().count(Topic::BattleEnded), 1);
}

#[tokio::test]
async fn test_ghost_wins_by_taking_the_last_enemy() {
    let config = EngineConfig::default();
    let mut field = Battlefield::new(&config);
    let ghost = field.spawn(UnitSpec::new("ghost", Job::Ghost, TeamId(1)));
    let brute = field.spawn(UnitSpec::new("brute", Job::Warrior, TeamId(2)).at(Vec2::new(4.0, 0.0)));

    let mut controller = RoundController::new(config, field);
    let result = controller.run().await.unwrap();

    assert_eq!(result.outcome, BattleOutcome::Victory);
    assert_eq!(result.winner, Some(TeamId(1)));
    assert!(result.survivors.contains(&ghost));
    assert!(result.survivors.contains(&brute));
    assert!(controller.bus().count(Topic::PossessionStarted) >= 1);
}

#[tokio::test]
async fn test_stalemate_is_a_draw_at_the_cap() {
    let config = EngineConfig {
        round_cap: 5,
        ..EngineConfig::default()
    };
    let mut field = Battlefield::new(&config);
    // Zero damage on both sides
    field.spawn(UnitSpec::from_template("a", template(Job::Rogue, 10.0, 0.0), TeamId(1)));
    field.spawn(
        UnitSpec::from_template("b", template(Job::Rogue, 10.0, 0.0), TeamId(2)).at(Vec2::new(1.0, 0.0)),
    );
    let mut controller = RoundController::new(config, field);
    let result = controller.run().await.unwrap();
    assert_eq!(result.outcome, BattleOutcome::Draw);
    assert_eq!(result.winner, None);
    assert_eq!(result.rounds, 5);
    assert_eq!(result.survivors.len(), 2);
}

struct SlowSource;

#[async_trait]
impl DecisionSource for SlowSource {
    async fn request(&self, request: DecisionRequest) -> Result<DecisionResponse> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(DecisionResponse::idle(request.actor.id))
    }
}

struct ConfusedSource;

#[async_trait]
impl DecisionSource for ConfusedSource {
    async fn request(&self, _request: DecisionRequest) -> Result<DecisionResponse> {
        Ok(DecisionResponse::idle(UnitId(9_999)))
    }
}

fn brawl(config: &EngineConfig) -> Battlefield {
    let mut field = Battlefield::new(config);
    field.spawn(UnitSpec::new("a", Job::Rogue, TeamId(1)));
    field.spawn(UnitSpec::new("b", Job::Rogue, TeamId(2)).at(Vec2::new(1.0, 0.0)));
    field
}

#[tokio::test]
async fn test_slow_worker_falls_back_to_melee() {
    let config = EngineConfig {
        decision_timeout_ms: 10,
        round_cap: 2,
        ..EngineConfig::default()
    };
    let mut controller = RoundController::new(config.clone(), brawl(&config)).with_decision_source(SlowSource);
    controller.run().await.unwrap();
    assert!(controller.fallback_count() > 0);
    // The fallback still fights
    assert!(controller.bus().count(Topic::EntityAttack) > 0);
}

#[tokio::test]
async fn test_mismatched_response_falls_back() {
    let config = EngineConfig {
        round_cap: 1,
        ..EngineConfig::default()
    };
    let mut controller = RoundController::new(config.clone(), brawl(&config)).with_decision_source(ConfusedSource);
    controller.run().await.unwrap();
    assert_eq!(controller.fallback_count(), 2);
}

#[tokio::test]
async fn test_worker_drives_a_full_battle() {
    let config = EngineConfig::default();
    let handle = DecisionWorker::spawn(DecisionEngine::new(&config), 4);
    let mut controller = RoundController::new(config.clone(), brawl(&config)).with_decision_source(handle);
    let result = controller.run().await.unwrap();
    assert_eq!(result.outcome, BattleOutcome::Victory);
    assert_eq!(controller.fallback_count(), 0);
}

#[test]
fn test_death_handling_is_idempotent() {
    let config = EngineConfig {
        max_loot_roll: 100,
        ..EngineConfig::default()
    };
    let mut field = Battlefield::new(&config);
    let hero = field.spawn(UnitSpec::new("hero", Job::Warrior, TeamId(1)).kind(UnitKind::Player));
    let victim = field.spawn(
        UnitSpec::new("victim", Job::Warrior, TeamId(2))
            .carry(Item::potion())
            .at(Vec2::new(1.0, 0.0)),
    );
    field.spawn(UnitSpec::new("other", Job::Warrior, TeamId(2)).at(Vec2::new(3.0, 0.0)));
    field.unit_mut(victim).unwrap().take_damage(1_000.0);

    let mut pipeline = AftermathPipeline::new(&config);
    let mut bus = EventBus::new();
    let death = BattleEvent::EntityDeath {
        victim,
        killer: Some(hero),
    };
    pipeline.handle(&death, &mut field, &mut bus);
    let ground = field.ground_items().len();
    let exp = field.unit(hero).unwrap().exp;

    pipeline.handle(&death, &mut field, &mut bus);
    assert_eq!(field.ground_items().len(), ground);
    assert_eq!(field.unit(hero).unwrap().exp, exp);
    assert!(bus.count(Topic::LootDropped) <= 1);
    assert_eq!(bus.count(Topic::ExperienceAwarded), 1);
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Topic>>>);

impl EventListener for Recorder {
    fn on_event(&mut self, event: &BattleEvent, _battlefield: &Battlefield) {
        if let Ok(mut topics) = self.0.lock() {
            topics.push(event.topic());
        }
    }
}

#[tokio::test]
async fn test_listeners_see_round_boundaries() {
    let config = EngineConfig {
        round_cap: 2,
        ..EngineConfig::default()
    };
    let recorder = Recorder::default();
    let mut field = Battlefield::new(&config);
    field.spawn(UnitSpec::new("a", Job::Warrior, TeamId(1)).at(Vec2::new(-40.0, 0.0)));
    field.spawn(UnitSpec::new("b", Job::Warrior, TeamId(2)).at(Vec2::new(40.0, 0.0)));
    let mut controller = RoundController::new(config, field).add_listener(recorder.clone());
    controller.run().await.unwrap();

    let topics = recorder.0.lock().unwrap().clone();
    assert_eq!(topics.first(), Some(&Topic::ArenaRoundStart));
    assert_eq!(topics.iter().filter(|t| **t == Topic::ArenaRoundEnd).count(), 2);
    assert_eq!(topics.last(), Some(&Topic::BattleEnded));
}

#[tokio::test]
async fn test_summoner_calls_a_pet() {
    let config = EngineConfig {
        round_cap: 1,
        ..EngineConfig::default()
    };
    let mut field = Battlefield::new(&config);
    let summoner = field.spawn(UnitSpec::new("summoner", Job::Summoner, TeamId(1)));
    field.spawn(UnitSpec::new("far", Job::Warrior, TeamId(2)).at(Vec2::new(40.0, 0.0)));
    let mut controller = RoundController::new(config, field);
    controller.run().await.unwrap();

    let pet = controller
        .field()
        .units()
        .iter()
        .find(|u| u.kind == UnitKind::Pet { owner: summoner })
        .expect("pet summoned");
    assert_eq!(pet.team, TeamId(1));
    assert_eq!(controller.bus().count(Topic::UnitSummoned), 1);
}

#[tokio::test]
async fn test_scorer_sees_the_whole_battle() {
    let config = EngineConfig::default();
    let mut controller = RoundController::new(config.clone(), brawl(&config)).add_scorer(PredictionScorer::default());
    let result = controller.run().await.unwrap();
    assert_eq!(controller.scorers().len(), 1);
    // A decided battle always moves the score
    assert_ne!(controller.scorers()[0].score(), 0.0);
    assert_eq!(result.outcome, BattleOutcome::Victory);
}

#[test]
fn test_snapshot_restores_combat_state() {
    let mut factory = UnitFactory::new();
    let mut unit = factory.create(UnitSpec::new("saved", Job::Archer, TeamId(1)).level(3));
    unit.take_damage(7.0);
    unit.add_shield(2.0);

    let json = serde_json::to_string(&unit.snapshot()).unwrap();
    let restored = Unit::from_snapshot(&serde_json::from_str(&json).unwrap());
    assert_eq!(restored.hp(), unit.hp());
    assert_eq!(restored.shield(), unit.shield());
    assert_eq!(restored.stats(), unit.stats());
    let ids = |u: &Unit| u.equipment().iter().map(|(_, i)| i.id).collect::<Vec<_>>();
    assert_eq!(ids(&restored), ids(&unit));
}

#[test]
fn test_scenario_file_builds() {
    let scenario = Scenario::load(concat!(env!("CARGO_MANIFEST_DIR"), "/data/scenarios/skirmish.toml")).unwrap();
    let field = scenario.build(&EngineConfig::default()).unwrap();
    assert_eq!(field.teams().len(), 2);
    assert!(field.units().len() >= 4);

    let config = EngineConfig::load(concat!(env!("CARGO_MANIFEST_DIR"), "/data/arena.toml")).unwrap();
    assert_eq!(config.max_loot_roll, 6);
}
