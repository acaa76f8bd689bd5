use duelsim::combat::{
    basic_attack_damage, skill_damage, BattleLog, Combatant, RandomStream, Simulator, StatValues,
    TurnContext, DAMAGE_FLOOR_RATIO,
};
use duelsim::roster::{valkyrie_roster, RosterConfig};
use proptest::prelude::*;

proptest! {
    #[test]
    fn basic_attack_never_drops_below_the_floor(attack in 0.0f64..1.0e6, defense in 0.0f64..1.0e9) {
        let damage = basic_attack_damage(attack, defense);
        prop_assert!(damage >= DAMAGE_FLOOR_RATIO * attack - 1e-9);
        prop_assert!(damage <= attack.max(DAMAGE_FLOOR_RATIO * attack) + 1e-9);
    }

    #[test]
    fn skill_damage_is_bounded_by_floor_and_base(
        base in -100.0f64..1.0e6,
        defense in 0.0f64..1.0e9,
    ) {
        let damage = skill_damage(base, defense);
        prop_assert!(damage >= 0.0);
        prop_assert!(damage >= DAMAGE_FLOOR_RATIO * base.max(0.0) - 1e-9);
        prop_assert!(damage <= base.max(0.0) + 1e-9);
    }

    #[test]
    fn hp_stays_within_zero_and_max(
        ops in prop::collection::vec((any::<bool>(), -50.0f64..500.0), 0..64),
    ) {
        let mut stream = RandomStream::unbound();
        let mut log = BattleLog::silent();
        let mut ctx = TurnContext::new(&mut stream, &mut log);
        let mut target = Combatant::plain("Target", StatValues::new(250.0, 10.0, 5.0, 1.0));

        for (is_damage, amount) in ops {
            if is_damage {
                target.take_damage(amount, "falling rocks", false, None, &mut ctx).unwrap();
            } else {
                target.heal(amount, "heal", &mut ctx);
            }
            prop_assert!(target.current_hp() >= 0.0);
            prop_assert!(target.current_hp() <= target.effective_max_hp());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn valkyrie_battles_end_with_hp_in_bounds(
        left in 0usize..8,
        right in 0usize..8,
        seed in any::<u64>(),
    ) {
        let roster = valkyrie_roster(&RosterConfig::default());
        let mut a = roster.entries()[left].spawn();
        let mut b = roster.entries()[right].spawn();

        let outcome = Simulator::with_seed(seed)
            .simulate_once(&mut a, &mut b, &mut BattleLog::silent())
            .unwrap();

        for fighter in [&a, &b] {
            prop_assert!(fighter.current_hp() >= 0.0);
            prop_assert!(fighter.current_hp() <= fighter.effective_max_hp() + 1e-9);
        }
        match outcome.winner.as_deref() {
            Some(name) => prop_assert!(name == a.name() || name == b.name()),
            // Draws are mutual knockouts or both standing at the round cap.
            None => prop_assert_eq!(a.is_alive(), b.is_alive()),
        }
    }

    #[test]
    fn seeded_battles_are_reproducible(
        left in 0usize..8,
        right in 0usize..8,
        seed in any::<u64>(),
    ) {
        let roster = valkyrie_roster(&RosterConfig::default());
        let fight = || {
            let mut a = roster.entries()[left].spawn();
            let mut b = roster.entries()[right].spawn();
            let mut log = BattleLog::verbose();
            let outcome = Simulator::with_seed(seed)
                .simulate_once(&mut a, &mut b, &mut log)
                .unwrap();
            (outcome, log.into_events())
        };
        prop_assert_eq!(fight(), fight());
    }
}
