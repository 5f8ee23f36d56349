//! Combat invariants checked over generated inputs

use arena_combat::battle::{apply_attack, order_by_speed, EventBus};
use arena_combat::core::{TeamId, UnitId};
use arena_combat::unit::{DerivedStats, Job, JobTemplate, Unit, UnitFactory, UnitSpec};
use proptest::prelude::*;

fn unit(factory: &mut UnitFactory, max_hp: f32, attack_power: f32, team: u32) -> Unit {
    let template = JobTemplate::new(
        Job::Rogue,
        DerivedStats {
            max_hp,
            attack_power,
            attack_range: 2.0,
            attack_speed: 1.0,
            casting_speed: 1.0,
            ..DerivedStats::default()
        },
    );
    factory.create(UnitSpec::from_template("u", template, TeamId(team)))
}

#[derive(Debug, Clone)]
enum Change {
    Damage(f32),
    Heal(f32),
    Shield(f32),
    SetHp(f32),
}

fn change() -> impl Strategy<Value = Change> {
    prop_oneof![
        (-50.0f32..200.0).prop_map(Change::Damage),
        (-50.0f32..200.0).prop_map(Change::Heal),
        (-50.0f32..200.0).prop_map(Change::Shield),
        (-500.0f32..500.0).prop_map(Change::SetHp),
    ]
}

proptest! {
    #[test]
    fn hp_and_shield_stay_in_bounds(max_hp in 1.0f32..500.0, changes in prop::collection::vec(change(), 0..40)) {
        let mut factory = UnitFactory::new();
        let mut u = unit(&mut factory, max_hp, 0.0, 1);
        for c in changes {
            match c {
                Change::Damage(d) => { u.take_damage(d); }
                Change::Heal(h) => { u.heal(h); }
                Change::Shield(s) => u.add_shield(s),
                Change::SetHp(hp) => u.set_hp(hp),
            }
            prop_assert!(u.hp() >= 0.0);
            prop_assert!(u.hp() <= u.max_hp());
            prop_assert!(u.shield() >= 0.0);
        }
    }

    #[test]
    fn shield_is_spent_before_hp(hp in 1.0f32..200.0, shield in 0.0f32..100.0, damage in 0.0f32..300.0) {
        let mut factory = UnitFactory::new();
        let mut attacker = unit(&mut factory, 10.0, damage, 1);
        let mut defender = unit(&mut factory, hp, 0.0, 2);
        defender.add_shield(shield);
        let mut bus = EventBus::new();

        apply_attack(&mut attacker, &mut defender, None, &mut bus);

        if damage > shield {
            prop_assert_eq!(defender.shield(), 0.0);
            let expected = (hp - (damage - shield)).max(0.0);
            prop_assert!((defender.hp() - expected).abs() < 1e-3);
        } else {
            prop_assert_eq!(defender.hp(), hp);
            prop_assert!((defender.shield() - (shield - damage)).abs() < 1e-3);
        }
    }

    #[test]
    fn order_keeps_everyone_and_is_stable(speeds in prop::collection::vec(990i32..1010, 0..30)) {
        let input: Vec<(UnitId, i32)> = speeds
            .iter()
            .enumerate()
            .map(|(i, s)| (UnitId(i as u32 + 1), *s))
            .collect();
        let order = order_by_speed(input.clone());
        prop_assert_eq!(order.len(), input.len());

        let speed_of = |id: UnitId| input[(id.0 - 1) as usize].1;
        for pair in order.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            prop_assert!(speed_of(a) >= speed_of(b));
            if speed_of(a) == speed_of(b) {
                prop_assert!(a < b, "equal speeds must keep input order");
            }
        }
    }
}
