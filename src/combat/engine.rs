//! Turn resolution and the battle driver.
//!
//! A battle is a sequence of rounds; in every round both combatants take one
//! turn in the initiative order fixed at battle start. Each turn runs the same
//! phases (status tick, passive, active skill, basic attack) with an early
//! exit as soon as either side is down.

use serde::{Deserialize, Serialize};

use crate::error::DuelError;

use super::combatant::{Combatant, TurnContext};
use super::log::BattleLog;
use super::rng::{RandomStream, Rng};

/// Probability that combatant A leads when both speeds are equal.
pub const SAME_SPEED_LEAD_CHANCE: f64 = 0.5;
pub const DEFAULT_MAX_ROUNDS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Rounds after which a battle with both combatants standing is a draw.
    pub max_rounds: u32,
    pub seed: u64,
}

impl SimulationConfig {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleOutcome {
    /// `None` when the round cap was hit or both combatants fell together.
    pub winner: Option<String>,
    pub winning_side: Option<Side>,
    pub rounds: u32,
    pub first_actor: String,
    pub hp: [(String, f64); 2],
}

impl BattleOutcome {
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

/// Decides which side leads every round of the battle. Strictly faster wins
/// without touching the stream; a tie costs exactly one draw.
pub fn decide_order(
    a: &Combatant,
    b: &Combatant,
    rng: &mut RandomStream,
) -> Result<Side, DuelError> {
    if a.speed() > b.speed() {
        return Ok(Side::A);
    }
    if b.speed() > a.speed() {
        return Ok(Side::B);
    }
    if rng.chance(SAME_SPEED_LEAD_CHANCE)? {
        Ok(Side::A)
    } else {
        Ok(Side::B)
    }
}

/// One combatant's turn. Returns early, with no further phases, as soon as
/// either side is down or the actor is control-locked or its skill consumed
/// the action.
pub fn resolve_turn(
    actor: &mut Combatant,
    target: &mut Combatant,
    ctx: &mut TurnContext<'_>,
) -> Result<(), DuelError> {
    if !actor.is_alive() || !target.is_alive() {
        return Ok(());
    }

    actor.apply_status_effects(target, ctx)?;
    if !actor.is_alive() || !target.is_alive() {
        return Ok(());
    }

    let locked = actor.trigger_passive(target, ctx)?;
    if locked || !actor.is_alive() || !target.is_alive() {
        return Ok(());
    }

    if actor.use_active_skill(target, ctx)? {
        return Ok(());
    }
    // A proc-style skill may still have decided the battle.
    if !actor.is_alive() || !target.is_alive() {
        return Ok(());
    }

    actor.perform_basic_attack(target, ctx)
}

pub fn resolve_round(
    a: &mut Combatant,
    b: &mut Combatant,
    lead: Side,
    ctx: &mut TurnContext<'_>,
) -> Result<(), DuelError> {
    match lead {
        Side::A => {
            resolve_turn(a, b, ctx)?;
            resolve_turn(b, a, ctx)
        }
        Side::B => {
            resolve_turn(b, a, ctx)?;
            resolve_turn(a, b, ctx)
        }
    }
}

/// Battle driver. Owns the random state and lends it to exactly one battle
/// at a time, so consecutive battles continue the same sequence.
#[derive(Debug, Clone)]
pub struct Simulator {
    rng: Rng,
    config: SimulationConfig,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            rng: Rng::new(config.seed),
            config,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(SimulationConfig::new(seed))
    }

    pub fn config(&self) -> SimulationConfig {
        self.config
    }

    /// Resets both combatants and fights one battle to completion or the round cap.
    pub fn simulate_once(
        &mut self,
        a: &mut Combatant,
        b: &mut Combatant,
        log: &mut BattleLog,
    ) -> Result<BattleOutcome, DuelError> {
        a.reset_for_battle();
        b.reset_for_battle();

        let mut stream = RandomStream::bound(self.rng);
        let outcome = fight(a, b, self.config.max_rounds, &mut stream, log);
        if let Some(rng) = stream.release() {
            self.rng = rng;
        }
        outcome
    }
}

fn fight(
    a: &mut Combatant,
    b: &mut Combatant,
    max_rounds: u32,
    stream: &mut RandomStream,
    log: &mut BattleLog,
) -> Result<BattleOutcome, DuelError> {
    log.set_round(0);
    log.system(format_args!("=== {} vs {} ===", a.name(), b.name()));
    let lead = decide_order(a, b, stream)?;
    let first_actor = match lead {
        Side::A => a.name().to_string(),
        Side::B => b.name().to_string(),
    };
    tracing::debug!(a = a.name(), b = b.name(), first = %first_actor, "battle start");

    let mut ctx = TurnContext::new(stream, log);
    let mut rounds = 0;
    while a.is_alive() && b.is_alive() {
        if rounds >= max_rounds {
            tracing::warn!(
                a = a.name(),
                b = b.name(),
                max_rounds,
                "round cap reached, declaring a draw"
            );
            break;
        }
        rounds += 1;
        ctx.log.set_round(rounds);
        ctx.log.system(format_args!("-- round {rounds} --"));
        resolve_round(a, b, lead, &mut ctx)?;
    }

    let winning_side = match (a.is_alive(), b.is_alive()) {
        (true, false) => Some(Side::A),
        (false, true) => Some(Side::B),
        _ => None,
    };
    let winner = winning_side.map(|side| match side {
        Side::A => a.name().to_string(),
        Side::B => b.name().to_string(),
    });
    match &winner {
        Some(name) => ctx.log.system(format_args!("=== winner: {name} ===")),
        None => ctx.log.system(format_args!("=== draw after {rounds} rounds ===")),
    }
    tracing::debug!(rounds, winner = winner.as_deref().unwrap_or("draw"), "battle finished");

    Ok(BattleOutcome {
        winner,
        winning_side,
        rounds,
        first_actor,
        hp: [
            (a.name().to_string(), a.current_hp()),
            (b.name().to_string(), b.current_hp()),
        ],
    })
}
