//! Status effects: the closed set of kinds, their records, and the per-combatant
//! ledger that ticks them.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Key of a status in the ledger. At most one record per id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusId {
    Bleed,
    Stun,
    Confusion,
    Charm,
    DefenseBreak,
    PassiveSeal,
}

impl StatusId {
    /// Order in which a tick pass evaluates statuses.
    pub const TICK_ORDER: [StatusId; 6] = [
        Self::Bleed,
        Self::Stun,
        Self::Confusion,
        Self::Charm,
        Self::DefenseBreak,
        Self::PassiveSeal,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Bleed => "bleed",
            Self::Stun => "stun",
            Self::Confusion => "confusion",
            Self::Charm => "charm",
            Self::DefenseBreak => "defense break",
            Self::PassiveSeal => "passive seal",
        }
    }

    /// Suppresses or redirects the carrier's action.
    pub const fn is_control(self) -> bool {
        matches!(self, Self::Stun | Self::Confusion | Self::Charm)
    }

    pub const fn is_attribute_debuff(self) -> bool {
        matches!(self, Self::DefenseBreak)
    }

    pub const fn is_negative(self) -> bool {
        self.is_control() || self.is_attribute_debuff()
    }
}

/// Kind-specific payload of a status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusEffect {
    Bleed { damage_per_tick: f64 },
    Stun,
    Confusion,
    Charm,
    DefenseBreak { defense_reduction: f64 },
    PassiveSeal,
}

impl StatusEffect {
    pub const fn id(&self) -> StatusId {
        match self {
            Self::Bleed { .. } => StatusId::Bleed,
            Self::Stun => StatusId::Stun,
            Self::Confusion => StatusId::Confusion,
            Self::Charm => StatusId::Charm,
            Self::DefenseBreak { .. } => StatusId::DefenseBreak,
            Self::PassiveSeal => StatusId::PassiveSeal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusRecord {
    /// Always at least 1 while the record is in a ledger.
    pub remaining_turns: u32,
    pub effect: StatusEffect,
    /// Set once a carrier-side reaction to this record (e.g. heal-on-debuff) has fired.
    pub reaction_consumed: bool,
}

impl StatusRecord {
    /// Durations below one turn are raised to one.
    pub fn new(effect: StatusEffect, turns: u32) -> Self {
        Self {
            remaining_turns: turns.max(1),
            effect,
            reaction_consumed: false,
        }
    }

    pub fn bleed(damage_per_tick: f64, turns: u32) -> Self {
        Self::new(
            StatusEffect::Bleed {
                damage_per_tick: damage_per_tick.max(0.0),
            },
            turns,
        )
    }

    pub fn stun(turns: u32) -> Self {
        Self::new(StatusEffect::Stun, turns)
    }

    pub fn confusion(turns: u32) -> Self {
        Self::new(StatusEffect::Confusion, turns)
    }

    pub fn charm(turns: u32) -> Self {
        Self::new(StatusEffect::Charm, turns)
    }

    pub fn defense_break(defense_reduction: f64, turns: u32) -> Self {
        Self::new(
            StatusEffect::DefenseBreak {
                defense_reduction: defense_reduction.max(0.0),
            },
            turns,
        )
    }

    pub fn passive_seal(turns: u32) -> Self {
        Self::new(StatusEffect::PassiveSeal, turns)
    }

    pub fn id(&self) -> StatusId {
        self.effect.id()
    }
}

/// What a single tick did to one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusTick {
    pub effect: StatusEffect,
    /// Turns left after this tick.
    pub remaining_turns: u32,
    /// The record reached zero and was removed by this tick.
    pub expired: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StatusLedger {
    records: BTreeMap<StatusId, StatusRecord>,
    expired_this_pass: BTreeSet<StatusId>,
}

impl StatusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites; the previous record is returned. Durations do not stack.
    pub fn insert(&mut self, record: StatusRecord) -> Option<StatusRecord> {
        self.records.insert(record.id(), record)
    }

    pub fn get(&self, id: StatusId) -> Option<&StatusRecord> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: StatusId) -> Option<&mut StatusRecord> {
        self.records.get_mut(&id)
    }

    pub fn contains(&self, id: StatusId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn remove(&mut self, id: StatusId) -> Option<StatusRecord> {
        self.records.remove(&id)
    }

    pub fn ids(&self) -> Vec<StatusId> {
        self.records.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StatusId, &StatusRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.expired_this_pass.clear();
    }

    /// Starts a new tick pass for the carrier's turn.
    pub fn begin_tick_pass(&mut self) {
        self.expired_this_pass.clear();
    }

    /// Decrements one record, removing it when it reaches zero.
    pub fn tick(&mut self, id: StatusId) -> Option<StatusTick> {
        let record = self.records.get_mut(&id)?;
        record.remaining_turns = record.remaining_turns.saturating_sub(1);
        let tick = StatusTick {
            effect: record.effect,
            remaining_turns: record.remaining_turns,
            expired: record.remaining_turns == 0,
        };
        if tick.expired {
            self.records.remove(&id);
            self.expired_this_pass.insert(id);
        }
        Some(tick)
    }

    /// A status is in effect while its record exists, and for the rest of the
    /// turn in which its final tick removed it.
    pub fn in_effect(&self, id: StatusId) -> bool {
        self.records.contains_key(&id) || self.expired_this_pass.contains(&id)
    }

    /// Sum of active defense reductions.
    pub fn defense_reduction(&self) -> f64 {
        self.records
            .values()
            .map(|record| match record.effect {
                StatusEffect::DefenseBreak { defense_reduction } => defense_reduction,
                _ => 0.0,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_lasts_exactly_its_duration() {
        let mut ledger = StatusLedger::new();
        ledger.insert(StatusRecord::bleed(10.0, 3));

        for expected_left in [2, 1] {
            ledger.begin_tick_pass();
            let tick = ledger.tick(StatusId::Bleed).expect("bleed should tick");
            assert_eq!(tick.remaining_turns, expected_left);
            assert!(!tick.expired);
        }

        ledger.begin_tick_pass();
        let last = ledger.tick(StatusId::Bleed).expect("final tick");
        assert!(last.expired);
        assert!(!ledger.contains(StatusId::Bleed));
        assert!(ledger.tick(StatusId::Bleed).is_none());
    }

    #[test]
    fn overwrite_resets_duration_instead_of_stacking() {
        let mut ledger = StatusLedger::new();
        ledger.insert(StatusRecord::stun(2));
        ledger.tick(StatusId::Stun);
        let previous = ledger.insert(StatusRecord::stun(2));
        assert_eq!(previous.map(|r| r.remaining_turns), Some(1));
        assert_eq!(ledger.get(StatusId::Stun).map(|r| r.remaining_turns), Some(2));
    }

    #[test]
    fn expired_status_stays_in_effect_until_next_pass() {
        let mut ledger = StatusLedger::new();
        ledger.insert(StatusRecord::stun(1));
        ledger.begin_tick_pass();
        ledger.tick(StatusId::Stun);
        assert!(!ledger.contains(StatusId::Stun));
        assert!(ledger.in_effect(StatusId::Stun));

        ledger.begin_tick_pass();
        assert!(!ledger.in_effect(StatusId::Stun));
    }

    #[test]
    fn zero_duration_is_raised_to_one_turn() {
        assert_eq!(StatusRecord::confusion(0).remaining_turns, 1);
    }

    #[test]
    fn defense_reduction_sums_defense_breaks_only() {
        let mut ledger = StatusLedger::new();
        ledger.insert(StatusRecord::bleed(25.0, 2));
        assert_eq!(ledger.defense_reduction(), 0.0);
        ledger.insert(StatusRecord::defense_break(6.0, 2));
        assert_eq!(ledger.defense_reduction(), 6.0);
    }

    #[test]
    fn negative_statuses_are_control_and_debuffs() {
        let negative: Vec<_> = StatusId::TICK_ORDER
            .into_iter()
            .filter(|id| id.is_negative())
            .collect();
        assert_eq!(
            negative,
            vec![
                StatusId::Stun,
                StatusId::Confusion,
                StatusId::Charm,
                StatusId::DefenseBreak
            ]
        );
    }
}
