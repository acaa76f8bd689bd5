//! Per-battle combatant state and the action contract the turn resolver drives.
//!
//! Archetype-specific behavior lives in [`Kit`](super::kit::Kit); this module
//! owns the shared bookkeeping (HP, modifiers, statuses, cooldown) and the
//! default bodies of each phase.

use crate::error::DuelError;

use super::damage::basic_attack_damage;
use super::kit::Kit;
use super::log::{
    classify_source, BattleLog, LogCategory, BASIC_ATTACK_SOURCE, CONFUSION_SELF_HIT_SOURCE,
};
use super::rng::RandomStream;
use super::stats::StatValues;
use super::status::{StatusEffect, StatusId, StatusLedger, StatusRecord};

pub const BLEED_SOURCE: &str = "state:bleed";

/// Everything a phase needs besides the two combatants.
pub struct TurnContext<'a> {
    pub rng: &'a mut RandomStream,
    pub log: &'a mut BattleLog,
}

impl<'a> TurnContext<'a> {
    pub fn new(rng: &'a mut RandomStream, log: &'a mut BattleLog) -> Self {
        Self { rng, log }
    }

    pub fn roll(&mut self, probability: f64) -> Result<bool, DuelError> {
        self.rng.chance(probability)
    }
}

/// Turn counter gating an active skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    total: u32,
    remaining: u32,
}

impl Cooldown {
    pub fn new(turns: u32) -> Self {
        let total = turns.max(1);
        Self {
            total,
            remaining: total,
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn reset(&mut self) {
        self.remaining = self.total;
    }

    /// Counts down one eligible turn. Returns true when the counter reaches
    /// zero, in which case it is rearmed to the full duration.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.remaining = self.total;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct Combatant {
    pub(super) name: String,
    pub(super) base_stats: StatValues,
    pub(super) max_hp_override: Option<f64>,
    pub(super) current_hp: f64,
    pub(super) bonus_attack: f64,
    pub(super) bonus_defense: f64,
    pub(super) statuses: StatusLedger,
    pub(super) cooldown: Option<Cooldown>,
    pub(super) kit: Kit,
}

impl Combatant {
    pub fn new(name: impl Into<String>, base_stats: StatValues, kit: Kit) -> Self {
        let mut combatant = Self {
            name: name.into(),
            base_stats,
            max_hp_override: None,
            current_hp: base_stats.max_hp,
            bonus_attack: 0.0,
            bonus_defense: 0.0,
            statuses: StatusLedger::new(),
            cooldown: None,
            kit,
        };
        combatant.reset_for_battle();
        combatant
    }

    /// No passive, no active skill, default basic attack.
    pub fn plain(name: impl Into<String>, base_stats: StatValues) -> Self {
        Self::new(name, base_stats, Kit::Plain)
    }

    pub fn with_cooldown(mut self, turns: u32) -> Self {
        self.cooldown = Some(Cooldown::new(turns));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_stats(&self) -> StatValues {
        self.base_stats
    }

    pub fn speed(&self) -> f64 {
        self.base_stats.speed
    }

    pub fn current_hp(&self) -> f64 {
        self.current_hp
    }

    /// Sets HP directly, clamped to `[0, effective max]`.
    pub fn set_current_hp(&mut self, hp: f64) {
        self.current_hp = hp.clamp(0.0, self.effective_max_hp());
    }

    pub fn bonus_attack(&self) -> f64 {
        self.bonus_attack
    }

    pub fn bonus_defense(&self) -> f64 {
        self.bonus_defense
    }

    pub fn statuses(&self) -> &StatusLedger {
        &self.statuses
    }

    pub fn cooldown(&self) -> Option<Cooldown> {
        self.cooldown
    }

    pub fn kit(&self) -> &Kit {
        &self.kit
    }

    /// Restores the pristine battle-start state. Idempotent.
    pub fn reset_for_battle(&mut self) {
        self.max_hp_override = None;
        self.bonus_attack = 0.0;
        self.bonus_defense = 0.0;
        self.statuses.clear();
        if let Some(cooldown) = self.cooldown.as_mut() {
            cooldown.reset();
        }
        self.reset_kit();
        self.current_hp = self.effective_max_hp();
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0.0
    }

    pub fn effective_max_hp(&self) -> f64 {
        self.max_hp_override
            .unwrap_or(self.base_stats.max_hp)
            .max(0.0)
    }

    pub fn effective_attack(&self) -> f64 {
        (self.base_stats.attack + self.bonus_attack + self.kit.attack_buff()).max(0.0)
    }

    pub fn effective_defense(&self) -> f64 {
        let buffed =
            (self.base_stats.defense + self.bonus_defense + self.kit.defense_buff()).max(0.0);
        (buffed - self.statuses.defense_reduction()).max(0.0)
    }

    pub fn is_stunned(&self) -> bool {
        self.statuses.in_effect(StatusId::Stun)
    }

    pub fn is_confused(&self) -> bool {
        self.statuses.in_effect(StatusId::Confusion)
    }

    pub fn is_charmed(&self) -> bool {
        self.statuses.in_effect(StatusId::Charm)
    }

    pub fn is_passive_blocked(&self) -> bool {
        self.statuses.in_effect(StatusId::PassiveSeal)
    }

    /// Cannot use an active skill or basic attack this turn.
    pub fn is_control_locked(&self) -> bool {
        self.is_stunned() || self.is_charmed()
    }

    /// Phase 1: ticks every status this combatant carries, in
    /// [`StatusId::TICK_ORDER`]. Death from a tick is left for the resolver to notice.
    pub fn apply_status_effects(
        &mut self,
        _opponent: &mut Combatant,
        ctx: &mut TurnContext<'_>,
    ) -> Result<(), DuelError> {
        self.statuses.begin_tick_pass();
        self.kit_before_status_tick(ctx);
        for id in StatusId::TICK_ORDER {
            self.tick_status(id, ctx)?;
        }
        self.kit_after_status_tick(ctx);
        Ok(())
    }

    fn tick_status(&mut self, id: StatusId, ctx: &mut TurnContext<'_>) -> Result<(), DuelError> {
        let Some(tick) = self.statuses.tick(id) else {
            return Ok(());
        };
        let left = tick.remaining_turns;
        match tick.effect {
            StatusEffect::Bleed { damage_per_tick } => {
                ctx.log.emit(
                    Some(&self.name),
                    LogCategory::State,
                    format_args!("suffers bleed for {damage_per_tick:.2} ({left} turns left)"),
                );
                self.take_damage(damage_per_tick, BLEED_SOURCE, false, None, ctx)?;
            }
            StatusEffect::Stun => ctx.log.emit(
                Some(&self.name),
                LogCategory::State,
                format_args!("is stunned and cannot use skills or attack ({left} turns left)"),
            ),
            StatusEffect::Confusion => ctx.log.emit(
                Some(&self.name),
                LogCategory::State,
                format_args!("is confused; basic attacks will hit itself ({left} turns left)"),
            ),
            StatusEffect::Charm => ctx.log.emit(
                Some(&self.name),
                LogCategory::State,
                format_args!("is charmed and cannot use skills or attack ({left} turns left)"),
            ),
            // Magnitude is read through effective_defense / is_passive_blocked.
            StatusEffect::DefenseBreak { .. } | StatusEffect::PassiveSeal => {}
        }
        if tick.expired {
            ctx.log.emit(
                Some(&self.name),
                LogCategory::State,
                format_args!("{} wore off", id.label()),
            );
        }
        Ok(())
    }

    /// Phase 2. Returns true when the combatant cannot act this turn.
    pub fn trigger_passive(
        &mut self,
        _opponent: &mut Combatant,
        ctx: &mut TurnContext<'_>,
    ) -> Result<bool, DuelError> {
        self.kit_passive(ctx);
        if self.is_control_locked() {
            let cause = if self.is_stunned() { "stun" } else { "charm" };
            ctx.log.emit(
                Some(&self.name),
                LogCategory::State,
                format_args!("skips skills and attacks this turn ({cause})"),
            );
            return Ok(true);
        }
        Ok(false)
    }

    /// Phase 3. Returns true iff the skill consumed the action.
    pub fn use_active_skill(
        &mut self,
        opponent: &mut Combatant,
        ctx: &mut TurnContext<'_>,
    ) -> Result<bool, DuelError> {
        if let Some(cooldown) = self.cooldown.as_mut() {
            if !cooldown.tick() {
                return Ok(false);
            }
        }
        self.kit_active(opponent, ctx)
    }

    /// Phase 4. A confused combatant hits itself, mitigated by its own defense.
    pub fn perform_basic_attack(
        &mut self,
        opponent: &mut Combatant,
        ctx: &mut TurnContext<'_>,
    ) -> Result<(), DuelError> {
        if self.is_confused() {
            let damage = basic_attack_damage(self.effective_attack(), self.effective_defense());
            ctx.log.emit(
                Some(&self.name),
                LogCategory::State,
                format_args!("hits itself in confusion for {damage:.2}"),
            );
            self.take_damage(damage, CONFUSION_SELF_HIT_SOURCE, false, None, ctx)?;
            self.kit_after_self_hit(ctx);
            return Ok(());
        }

        let damage = basic_attack_damage(self.effective_attack(), opponent.effective_defense());
        ctx.log.emit(
            Some(&self.name),
            LogCategory::Basic,
            format_args!("attacks for {damage:.2}"),
        );
        opponent.take_damage(damage, BASIC_ATTACK_SOURCE, false, Some(&mut *self), ctx)?;
        self.kit_after_basic_attack(opponent, ctx)
    }

    /// Applies incoming damage. Kit interception (shield, dodge) runs before HP
    /// loss; `ignore_shield` marks true damage. `attacker` is only used for
    /// same-call retaliation.
    pub fn take_damage(
        &mut self,
        amount: f64,
        source: &str,
        ignore_shield: bool,
        mut attacker: Option<&mut Combatant>,
        ctx: &mut TurnContext<'_>,
    ) -> Result<(), DuelError> {
        let category = classify_source(source);
        let Some(amount) = self.intercept_damage(
            amount.max(0.0),
            category,
            ignore_shield,
            attacker.as_deref_mut(),
            ctx,
        )?
        else {
            return Ok(());
        };

        let max_hp = self.effective_max_hp();
        self.current_hp = (self.current_hp - amount).clamp(0.0, max_hp);
        ctx.log.emit(
            Some(&self.name),
            LogCategory::Damage,
            format_args!(
                "takes {amount:.2} damage from {source} -> HP {:.2}/{max_hp:.2}",
                self.current_hp
            ),
        );
        self.after_damage_taken(category, attacker, ctx)
    }

    pub fn heal(&mut self, amount: f64, source: &str, ctx: &mut TurnContext<'_>) {
        let amount = amount.max(0.0);
        let max_hp = self.effective_max_hp();
        self.current_hp = (self.current_hp + amount).min(max_hp);
        ctx.log.emit(
            Some(&self.name),
            LogCategory::Heal,
            format_args!(
                "recovers {amount:.2} from {source} -> HP {:.2}/{max_hp:.2}",
                self.current_hp
            ),
        );
    }

    /// Inserts or overwrites a status (last application wins) and runs the
    /// carrier's inflicted hook.
    pub fn apply_state(&mut self, record: StatusRecord, ctx: &mut TurnContext<'_>) {
        let id = record.id();
        self.statuses.insert(record);
        self.on_status_inflicted(id, ctx);
    }
}
