pub mod combatant;
pub mod damage;
pub mod engine;
pub mod kit;
pub mod log;
pub mod rng;
pub mod stats;
pub mod status;

pub use combatant::{Combatant, Cooldown, TurnContext, BLEED_SOURCE};
pub use damage::{
    absorb_with_shield, basic_attack_damage, skill_damage, ShieldSplit, DAMAGE_FLOOR_RATIO,
};
pub use engine::{
    decide_order, resolve_round, resolve_turn, BattleOutcome, Side, SimulationConfig, Simulator,
    DEFAULT_MAX_ROUNDS, SAME_SPEED_LEAD_CHANCE,
};
pub use kit::Kit;
pub use log::{
    classify_source, render_event, render_transcript, serialize_events_json, BattleEvent,
    BattleLog, LogCategory,
};
pub use rng::{RandomStream, Rng};
pub use stats::StatValues;
pub use status::{StatusEffect, StatusId, StatusLedger, StatusRecord, StatusTick};
