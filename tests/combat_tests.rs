use duelsim::combat::{
    BattleLog, Combatant, LogCategory, RandomStream, Rng, SimulationConfig, Simulator, StatValues,
    StatusId, StatusRecord, TurnContext,
};
use duelsim::roster::{full_roster, valkyrie_roster, RosterConfig};
use duelsim::DuelError;

fn approx_eq(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() <= tol, "expected {b}, got {a}");
}

fn plain(name: &str, hp: f64, attack: f64, defense: f64, speed: f64) -> Combatant {
    Combatant::plain(name, StatValues::new(hp, attack, defense, speed))
}

fn spawn(name: &str) -> Combatant {
    full_roster(&RosterConfig::default())
        .require(name)
        .expect("built-in archetype")
        .spawn()
}

#[test]
fn faster_plain_fighter_wins_in_exactly_five_rounds() {
    let mut a = plain("A", 100.0, 20.0, 0.0, 10.0);
    let mut b = plain("B", 100.0, 10.0, 0.0, 5.0);
    let mut log = BattleLog::verbose();

    let outcome = Simulator::with_seed(1)
        .simulate_once(&mut a, &mut b, &mut log)
        .expect("battle should finish");

    assert_eq!(outcome.winner.as_deref(), Some("A"));
    assert_eq!(outcome.first_actor, "A");
    assert_eq!(outcome.rounds, 5);
    approx_eq(a.current_hp(), 60.0, 1e-12);
    approx_eq(b.current_hp(), 0.0, 1e-12);

    for round in 1..=5 {
        let attackers: Vec<_> = log
            .events()
            .iter()
            .filter(|e| e.round == round && e.category == LogCategory::Basic)
            .filter_map(|e| e.actor.as_deref())
            .collect();
        let expected = if round == 5 { vec!["A"] } else { vec!["A", "B"] };
        assert_eq!(attackers, expected, "round {round}");
    }
}

#[test]
fn slower_first_argument_still_acts_second() {
    let mut a = plain("A", 100.0, 10.0, 0.0, 5.0);
    let mut b = plain("B", 100.0, 20.0, 0.0, 10.0);
    let outcome = Simulator::with_seed(99)
        .simulate_once(&mut a, &mut b, &mut BattleLog::silent())
        .unwrap();
    assert_eq!(outcome.first_actor, "B");
    assert_eq!(outcome.winner.as_deref(), Some("B"));
}

#[test]
fn same_seed_replays_identical_battles() {
    let run = |seed| {
        let mut log = BattleLog::verbose();
        let mut simulator = Simulator::with_seed(seed);
        let mut outcomes = Vec::new();
        for _ in 0..3 {
            outcomes.push(
                simulator
                    .simulate_once(&mut spawn("Korali"), &mut spawn("Bronya"), &mut log)
                    .unwrap(),
            );
        }
        (outcomes, log.into_events())
    };

    let (first_outcomes, first_events) = run(2024);
    let (second_outcomes, second_events) = run(2024);
    assert_eq!(first_outcomes, second_outcomes);
    assert_eq!(first_events, second_events);
}

#[test]
fn silent_log_does_not_change_outcomes() {
    let mut verbose = Simulator::with_seed(77);
    let mut silent = Simulator::with_seed(77);
    for _ in 0..5 {
        let loud = verbose
            .simulate_once(&mut spawn("Theresa"), &mut spawn("Vita"), &mut BattleLog::verbose())
            .unwrap();
        let quiet = silent
            .simulate_once(&mut spawn("Theresa"), &mut spawn("Vita"), &mut BattleLog::silent())
            .unwrap();
        assert_eq!(loud, quiet);
    }
}

#[test]
fn status_lasts_exactly_its_duration_with_one_expiry_event() {
    let mut stream = RandomStream::unbound();
    let mut log = BattleLog::verbose();
    let mut ctx = TurnContext::new(&mut stream, &mut log);
    let mut carrier = plain("Carrier", 100.0, 10.0, 0.0, 1.0);
    let mut other = plain("Other", 100.0, 10.0, 0.0, 1.0);

    carrier.apply_state(StatusRecord::bleed(10.0, 3), &mut ctx);
    for _ in 0..3 {
        assert!(carrier.statuses().contains(StatusId::Bleed));
        carrier.apply_status_effects(&mut other, &mut ctx).unwrap();
    }
    assert!(!carrier.statuses().contains(StatusId::Bleed));
    carrier.apply_status_effects(&mut other, &mut ctx).unwrap();

    approx_eq(carrier.current_hp(), 70.0, 1e-12);
    let expiries = log
        .events()
        .iter()
        .filter(|e| e.message == "bleed wore off")
        .count();
    assert_eq!(expiries, 1);
}

#[test]
fn shield_absorbs_before_hp_loss() {
    let mut stream = RandomStream::bound(Rng::new(5));
    let mut log = BattleLog::silent();
    let mut ctx = TurnContext::new(&mut stream, &mut log);
    let mut bianka = spawn("Bianka");
    let mut target = plain("Target", 1_000.0, 0.0, 0.0, 1.0);

    bianka.perform_basic_attack(&mut target, &mut ctx).unwrap();
    approx_eq(bianka.kit().shield(), 5.0, 1e-12);

    bianka.take_damage(3.0, "falling rocks", false, None, &mut ctx).unwrap();
    approx_eq(bianka.current_hp(), 100.0, 1e-12);
    approx_eq(bianka.kit().shield(), 2.0, 1e-12);

    bianka.take_damage(10.0, "falling rocks", false, None, &mut ctx).unwrap();
    approx_eq(bianka.current_hp(), 92.0, 1e-12);
    approx_eq(bianka.kit().shield(), 0.0, 1e-12);
}

#[test]
fn confused_attack_is_mitigated_by_own_defense() {
    let mut stream = RandomStream::unbound();
    let mut log = BattleLog::silent();
    let mut ctx = TurnContext::new(&mut stream, &mut log);
    let mut confused = plain("Confused", 100.0, 20.0, 15.0, 1.0);
    let mut opponent = plain("Opponent", 100.0, 10.0, 0.0, 1.0);

    confused.apply_state(StatusRecord::confusion(1), &mut ctx);
    confused.apply_status_effects(&mut opponent, &mut ctx).unwrap();
    assert!(confused.is_confused());
    confused.perform_basic_attack(&mut opponent, &mut ctx).unwrap();

    approx_eq(confused.current_hp(), 95.0, 1e-12);
    approx_eq(opponent.current_hp(), 100.0, 1e-12);
}

#[test]
fn active_skill_fires_on_the_cooldown_turn() {
    let mut stream = RandomStream::bound(Rng::new(11));
    let mut log = BattleLog::silent();
    let mut ctx = TurnContext::new(&mut stream, &mut log);
    let mut korali = spawn("Korali");
    let mut target = plain("Target", 10_000.0, 0.0, 0.0, 1.0);

    let fired: Vec<bool> = (0..6)
        .map(|_| korali.use_active_skill(&mut target, &mut ctx).unwrap())
        .collect();
    assert_eq!(fired, vec![false, false, true, false, false, true]);
    // Three segments of 20/18/18 against zero defense, twice.
    approx_eq(target.current_hp(), 10_000.0 - 112.0, 1e-9);
}

#[test]
fn healing_stalemate_ends_in_a_draw_at_the_round_cap() {
    let mut a = plain("A", 1_000.0, 1.0, 0.0, 2.0);
    let mut b = plain("B", 1_000.0, 1.0, 0.0, 1.0);
    let mut simulator = Simulator::new(SimulationConfig {
        max_rounds: 10,
        seed: 3,
    });
    let mut log = BattleLog::verbose();

    let outcome = simulator.simulate_once(&mut a, &mut b, &mut log).unwrap();
    assert!(outcome.is_draw());
    assert_eq!(outcome.winning_side, None);
    assert_eq!(outcome.rounds, 10);
    assert_eq!(
        log.events().last().map(|e| e.message.as_str()),
        Some("=== draw after 10 rounds ===")
    );
}

#[test]
fn probability_roll_without_bound_stream_fails_fast() {
    let mut stream = RandomStream::unbound();
    let mut log = BattleLog::silent();
    let mut ctx = TurnContext::new(&mut stream, &mut log);
    let mut korali = spawn("Korali");
    let mut target = plain("Target", 100.0, 0.0, 0.0, 1.0);

    let err = korali
        .perform_basic_attack(&mut target, &mut ctx)
        .expect_err("korali's stun roll needs a bound stream");
    assert!(matches!(err, DuelError::UnboundRandomStream));
}

#[test]
fn out_of_range_probability_is_rejected() {
    let mut stream = RandomStream::bound(Rng::new(1));
    assert!(matches!(
        stream.chance(1.5),
        Err(DuelError::ProbabilityOutOfRange(p)) if p == 1.5
    ));
    assert!(matches!(
        stream.chance(-0.1),
        Err(DuelError::ProbabilityOutOfRange(_))
    ));
}

#[test]
fn dodge_only_rolls_against_direct_attacks() {
    let mut stream = RandomStream::unbound();
    let mut log = BattleLog::silent();
    let mut ctx = TurnContext::new(&mut stream, &mut log);
    let mut rita = spawn("Rita");
    let mut attacker = plain("Attacker", 100.0, 10.0, 0.0, 1.0);

    // Status, passive and heal sources never reach the dodge roll.
    rita.take_damage(4.0, "state:bleed", false, Some(&mut attacker), &mut ctx)
        .unwrap();
    rita.take_damage(4.0, "passive:dodge counter", false, Some(&mut attacker), &mut ctx)
        .unwrap();
    approx_eq(rita.current_hp(), 92.0, 1e-12);

    let direct = rita.take_damage(4.0, "basic attack", false, Some(&mut attacker), &mut ctx);
    assert!(matches!(direct, Err(DuelError::UnboundRandomStream)));
}

#[test]
fn passive_seal_suppresses_reactive_passives() {
    let mut stream = RandomStream::unbound();
    let mut log = BattleLog::silent();
    let mut ctx = TurnContext::new(&mut stream, &mut log);
    let mut vita = spawn("Vita");
    let mut attacker = plain("Attacker", 100.0, 10.0, 0.0, 1.0);

    vita.apply_state(StatusRecord::passive_seal(2), &mut ctx);
    assert!(vita.is_passive_blocked());
    vita.take_damage(500.0, "basic attack", false, Some(&mut attacker), &mut ctx)
        .expect("sealed passives draw nothing");
    assert!(!vita.is_alive());
    assert!(!attacker.is_charmed());
}

#[test]
fn stunned_combatant_loses_the_turn() {
    let mut stream = RandomStream::unbound();
    let mut log = BattleLog::verbose();
    let mut ctx = TurnContext::new(&mut stream, &mut log);
    let mut actor = plain("Actor", 100.0, 10.0, 0.0, 1.0);
    let mut target = plain("Target", 100.0, 10.0, 0.0, 1.0);

    actor.apply_state(StatusRecord::stun(2), &mut ctx);
    duelsim::combat::resolve_turn(&mut actor, &mut target, &mut ctx).unwrap();
    duelsim::combat::resolve_turn(&mut actor, &mut target, &mut ctx).unwrap();
    approx_eq(target.current_hp(), 100.0, 1e-12);

    duelsim::combat::resolve_turn(&mut actor, &mut target, &mut ctx).unwrap();
    approx_eq(target.current_hp(), 90.0, 1e-12);
}

#[test]
fn every_valkyrie_pairing_finishes() {
    let roster = valkyrie_roster(&RosterConfig::default());
    let mut simulator = Simulator::with_seed(8);
    for a in roster.entries() {
        for b in roster.entries() {
            let mut left = a.spawn();
            let mut right = b.spawn();
            let outcome = simulator
                .simulate_once(&mut left, &mut right, &mut BattleLog::silent())
                .unwrap();
            assert!(outcome.rounds >= 1);
            for (name, hp) in &outcome.hp {
                assert!(*hp >= 0.0, "{name} ended with negative HP");
            }
        }
    }
}
