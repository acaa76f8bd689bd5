//! Archetype kits: the per-archetype passive, active, and reaction bodies that
//! plug into the [`Combatant`] action contract.
//!
//! Every kit proc consumes at most one draw from the battle stream, and only
//! when its preconditions hold, so a fixed seed replays the same battle.

use serde::Serialize;

use crate::error::DuelError;

use super::combatant::{Combatant, TurnContext};
use super::damage::{absorb_with_shield, skill_damage};
use super::log::{LogCategory, BASIC_ATTACK_SOURCE};
use super::status::{StatusEffect, StatusId, StatusRecord};

const ACTIVE_SKILL_SOURCE: &str = "active skill";
const PASSIVE_SKILL_SOURCE: &str = "passive skill";

const PLACEHOLDER_SKILL_ATTACK_RATIO: f64 = 1.5;
const PLACEHOLDER_BLEED_TURNS: u32 = 2;

const KORALI_SEGMENTS: [f64; 3] = [20.0, 18.0, 18.0];
const KORALI_STUN_CHANCE: f64 = 0.20;
const KORALI_STUN_TURNS: u32 = 2;

const BRONYA_SEGMENTS: u32 = 5;
const BRONYA_SEGMENT_DAMAGE: f64 = 15.0;
const BRONYA_PIERCE_CHANCE: f64 = 0.15;
const BRONYA_CONFUSION_CHANCE: f64 = 0.25;
const BRONYA_CONFUSION_TURNS: u32 = 1;

const BIANKA_SHIELD_GAIN: f64 = 5.0;
const BIANKA_SKILL_BASE: f64 = 16.0;
const BIANKA_FOLLOW_UP_CHANCE: f64 = 0.20;
const BIANKA_FOLLOW_UP_BASE: f64 = 24.0;

const KIANA_BURST_RATIO: f64 = 0.15;
const KIANA_BURST_MIN: f64 = 1.0;
const KIANA_SKILL_BASE: f64 = 20.0;
const KIANA_BURST_SOURCE: &str = "passive:overlimit strike";

const CHENXUE_MAX_HP_FACTOR: f64 = 1.5;
const CHENXUE_DEFENSE_PENALTY: f64 = 0.15;
const CHENXUE_LOW_HP_THRESHOLD: f64 = 30.0;
const CHENXUE_LOW_HP_HEAL: f64 = 5.0;
const CHENXUE_LOST_HP_RATIO: f64 = 0.12;
const CHENXUE_FLAT_BONUS: f64 = 8.0;

const RITA_SKILL_BASE: f64 = 15.0;
const RITA_DEFENSE_BREAK_STEP: f64 = 3.0;
const RITA_DEFENSE_BREAK_TURNS: u32 = 2;
const RITA_DODGE_CHANCE: f64 = 0.18;
const RITA_COUNTER_DAMAGE: f64 = 12.0;
const RITA_COUNTER_SOURCE: &str = "passive:dodge counter";

const THERESA_SANCTIFIED_HEAL_RATIO: f64 = 0.10;
const THERESA_SANCTIFIED_SOURCE: &str = "passive:sanctified blood";
const THERESA_HIT_CHANCE: f64 = 0.70;
const THERESA_SKILL_BASE: f64 = 30.0;
const THERESA_MISS_DAMAGE: f64 = 1.0;
const THERESA_MISS_HEAL: f64 = 18.0;
const THERESA_SEAL_CHANCE: f64 = 0.25;
const THERESA_SEAL_TURNS: u32 = 2;

const VITA_WING_TURNS: u32 = 1;
const VITA_WING_ATTACK: f64 = 7.0;
const VITA_WING_DEFENSE: f64 = 3.0;
const VITA_CHARM_CHANCE: f64 = 0.20;
const VITA_CHARM_TURNS: u32 = 2;
const VITA_REVIVE_CHANCE: f64 = 0.15;
const VITA_REVIVE_HP_RATIO: f64 = 0.20;

/// Archetype tag plus the private per-battle state that archetype needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "archetype", rename_all = "snake_case")]
pub enum Kit {
    Plain,
    Placeholder { bleed_damage: f64, heal_ratio: f64 },
    Korali,
    Bronya,
    Bianka { shield: f64 },
    Kiana,
    Chenxue { intro_logged: bool },
    Rita,
    Theresa,
    Vita { wing_turns: u32 },
}

impl Kit {
    pub const fn placeholder(bleed_damage: f64, heal_ratio: f64) -> Self {
        Self::Placeholder {
            bleed_damage,
            heal_ratio,
        }
    }

    pub const fn bianka() -> Self {
        Self::Bianka { shield: 0.0 }
    }

    pub const fn chenxue() -> Self {
        Self::Chenxue {
            intro_logged: false,
        }
    }

    pub const fn vita() -> Self {
        Self::Vita { wing_turns: 0 }
    }

    pub const fn archetype(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Placeholder { .. } => "placeholder",
            Self::Korali => "korali",
            Self::Bronya => "bronya",
            Self::Bianka { .. } => "bianka",
            Self::Kiana => "kiana",
            Self::Chenxue { .. } => "chenxue",
            Self::Rita => "rita",
            Self::Theresa => "theresa",
            Self::Vita { .. } => "vita",
        }
    }

    /// Current shield charge; zero for kits without one.
    pub fn shield(&self) -> f64 {
        match self {
            Self::Bianka { shield } => *shield,
            _ => 0.0,
        }
    }

    pub(super) fn attack_buff(&self) -> f64 {
        match self {
            Self::Vita { wing_turns } if *wing_turns > 0 => VITA_WING_ATTACK,
            _ => 0.0,
        }
    }

    pub(super) fn defense_buff(&self) -> f64 {
        match self {
            Self::Vita { wing_turns } if *wing_turns > 0 => VITA_WING_DEFENSE,
            _ => 0.0,
        }
    }
}

impl Combatant {
    pub(super) fn reset_kit(&mut self) {
        match self.kit {
            Kit::Bianka { .. } => self.kit = Kit::bianka(),
            Kit::Vita { .. } => self.kit = Kit::vita(),
            Kit::Chenxue { .. } => {
                self.kit = Kit::chenxue();
                self.max_hp_override = Some(self.base_stats.max_hp * CHENXUE_MAX_HP_FACTOR);
                self.bonus_defense -= self.base_stats.defense * CHENXUE_DEFENSE_PENALTY;
            }
            _ => {}
        }
    }

    pub(super) fn kit_before_status_tick(&mut self, ctx: &mut TurnContext<'_>) {
        match self.kit {
            Kit::Chenxue {
                intro_logged: false,
            } => {
                self.kit = Kit::Chenxue { intro_logged: true };
                ctx.log.emit(
                    Some(&self.name),
                    LogCategory::Passive,
                    format_args!("passive: max HP +50%, defense -15%"),
                );
            }
            Kit::Vita { wing_turns } if wing_turns > 0 => {
                let left = wing_turns - 1;
                self.kit = Kit::Vita { wing_turns: left };
                if left == 0 {
                    ctx.log.emit(
                        Some(&self.name),
                        LogCategory::State,
                        format_args!("wing form fades"),
                    );
                }
            }
            Kit::Theresa => {
                for id in self.statuses.ids() {
                    if id.is_negative() {
                        self.try_sanctified_heal(id, ctx);
                    }
                }
            }
            _ => {}
        }
    }

    pub(super) fn kit_after_status_tick(&mut self, ctx: &mut TurnContext<'_>) {
        if matches!(self.kit, Kit::Chenxue { .. })
            && self.is_alive()
            && self.current_hp < CHENXUE_LOW_HP_THRESHOLD
        {
            ctx.log.emit(
                Some(&self.name),
                LogCategory::Passive,
                format_args!("low HP recovery triggers"),
            );
            self.heal(CHENXUE_LOW_HP_HEAL, PASSIVE_SKILL_SOURCE, ctx);
        }
    }

    pub(super) fn kit_passive(&mut self, ctx: &mut TurnContext<'_>) {
        if let Kit::Placeholder { heal_ratio, .. } = self.kit {
            let amount = self.effective_max_hp() * heal_ratio;
            ctx.log.emit(
                Some(&self.name),
                LogCategory::Passive,
                format_args!("regenerates {amount:.2}"),
            );
            self.heal(amount, PASSIVE_SKILL_SOURCE, ctx);
        }
    }

    pub(super) fn kit_active(
        &mut self,
        opponent: &mut Combatant,
        ctx: &mut TurnContext<'_>,
    ) -> Result<bool, DuelError> {
        match self.kit {
            Kit::Plain => Ok(false),
            Kit::Placeholder { bleed_damage, .. } => {
                self.placeholder_active(opponent, bleed_damage, ctx)
            }
            Kit::Korali => self.korali_active(opponent, ctx),
            Kit::Bronya => self.bronya_active(opponent, ctx),
            Kit::Bianka { .. } => self.bianka_active(opponent, ctx),
            Kit::Kiana => self.kiana_active(opponent, ctx),
            Kit::Chenxue { .. } => self.chenxue_active(opponent, ctx),
            Kit::Rita => self.rita_active(opponent, ctx),
            Kit::Theresa => self.theresa_active(opponent, ctx),
            Kit::Vita { .. } => {
                self.kit = Kit::Vita {
                    wing_turns: VITA_WING_TURNS,
                };
                ctx.log.emit(
                    Some(&self.name),
                    LogCategory::Active,
                    format_args!(
                        "enters wing form: attack +{VITA_WING_ATTACK}, defense +{VITA_WING_DEFENSE}"
                    ),
                );
                Ok(false)
            }
        }
    }

    pub(super) fn kit_after_basic_attack(
        &mut self,
        opponent: &mut Combatant,
        ctx: &mut TurnContext<'_>,
    ) -> Result<(), DuelError> {
        match self.kit {
            Kit::Korali => self.korali_try_stun(opponent, ctx),
            Kit::Bianka { .. } => {
                self.bianka_gain_shield(ctx);
                Ok(())
            }
            Kit::Theresa => self.theresa_try_seal(opponent, BASIC_ATTACK_SOURCE, ctx),
            _ => Ok(()),
        }
    }

    pub(super) fn kit_after_self_hit(&mut self, ctx: &mut TurnContext<'_>) {
        if matches!(self.kit, Kit::Bianka { .. }) {
            self.bianka_gain_shield(ctx);
        }
    }

    /// Runs before HP loss. `None` means the hit was fully absorbed or dodged.
    pub(super) fn intercept_damage(
        &mut self,
        amount: f64,
        category: LogCategory,
        ignore_shield: bool,
        attacker: Option<&mut Combatant>,
        ctx: &mut TurnContext<'_>,
    ) -> Result<Option<f64>, DuelError> {
        match self.kit {
            Kit::Bianka { shield } if !ignore_shield && shield > 0.0 && amount > 0.0 => {
                let split = absorb_with_shield(shield, amount);
                self.kit = Kit::Bianka {
                    shield: split.shield_remaining,
                };
                ctx.log.emit(
                    Some(&self.name),
                    LogCategory::State,
                    format_args!(
                        "shield absorbs {:.2} -> shield {:.2}",
                        split.absorbed, split.shield_remaining
                    ),
                );
                if split.overflow <= 0.0 {
                    return Ok(None);
                }
                Ok(Some(split.overflow))
            }
            Kit::Rita if category.is_direct_attack() && !self.is_passive_blocked() => {
                let Some(attacker) = attacker else {
                    return Ok(Some(amount));
                };
                if !ctx.roll(RITA_DODGE_CHANCE)? {
                    return Ok(Some(amount));
                }
                ctx.log.emit(
                    Some(&self.name),
                    LogCategory::Passive,
                    format_args!("dodges and counters for {RITA_COUNTER_DAMAGE}"),
                );
                attacker.take_damage(
                    RITA_COUNTER_DAMAGE,
                    RITA_COUNTER_SOURCE,
                    false,
                    Some(self),
                    ctx,
                )?;
                Ok(None)
            }
            _ => Ok(Some(amount)),
        }
    }

    /// Runs after HP loss was applied and logged.
    pub(super) fn after_damage_taken(
        &mut self,
        category: LogCategory,
        attacker: Option<&mut Combatant>,
        ctx: &mut TurnContext<'_>,
    ) -> Result<(), DuelError> {
        if !matches!(self.kit, Kit::Vita { .. }) || self.is_passive_blocked() {
            return Ok(());
        }

        if let Some(attacker) = attacker {
            let charmable = !matches!(category, LogCategory::State | LogCategory::Heal);
            if charmable && attacker.is_alive() && ctx.roll(VITA_CHARM_CHANCE)? {
                attacker.apply_state(StatusRecord::charm(VITA_CHARM_TURNS), ctx);
                ctx.log.emit(
                    Some(&attacker.name),
                    LogCategory::State,
                    format_args!(
                        "is charmed by {} for {VITA_CHARM_TURNS} turns",
                        self.name
                    ),
                );
            }
        }

        if self.current_hp <= 0.0 && ctx.roll(VITA_REVIVE_CHANCE)? {
            let max_hp = self.effective_max_hp();
            self.current_hp = (max_hp * VITA_REVIVE_HP_RATIO).max(1.0).min(max_hp);
            ctx.log.emit(
                Some(&self.name),
                LogCategory::Passive,
                format_args!("revives with {:.2}/{max_hp:.2} HP", self.current_hp),
            );
        }
        Ok(())
    }

    pub(super) fn on_status_inflicted(&mut self, id: StatusId, ctx: &mut TurnContext<'_>) {
        if matches!(self.kit, Kit::Theresa) && id.is_negative() {
            self.try_sanctified_heal(id, ctx);
        }
    }

    fn try_sanctified_heal(&mut self, id: StatusId, ctx: &mut TurnContext<'_>) {
        if self.is_passive_blocked() {
            return;
        }
        let Some(record) = self.statuses.get_mut(id) else {
            return;
        };
        if record.reaction_consumed {
            return;
        }
        record.reaction_consumed = true;
        let amount = self.effective_max_hp() * THERESA_SANCTIFIED_HEAL_RATIO;
        self.heal(amount, THERESA_SANCTIFIED_SOURCE, ctx);
    }

    fn placeholder_active(
        &mut self,
        opponent: &mut Combatant,
        bleed_damage: f64,
        ctx: &mut TurnContext<'_>,
    ) -> Result<bool, DuelError> {
        let damage = skill_damage(
            self.effective_attack() * PLACEHOLDER_SKILL_ATTACK_RATIO,
            opponent.effective_defense(),
        );
        ctx.log.emit(
            Some(&self.name),
            LogCategory::Active,
            format_args!("unleashes the active skill for {damage:.2} and inflicts bleed"),
        );
        opponent.take_damage(damage, ACTIVE_SKILL_SOURCE, false, Some(&mut *self), ctx)?;
        opponent.apply_state(
            StatusRecord::bleed(bleed_damage, PLACEHOLDER_BLEED_TURNS),
            ctx,
        );
        Ok(true)
    }

    fn korali_active(
        &mut self,
        opponent: &mut Combatant,
        ctx: &mut TurnContext<'_>,
    ) -> Result<bool, DuelError> {
        ctx.log.emit(
            Some(&self.name),
            LogCategory::Active,
            format_args!("unleashes a three-hit combo"),
        );
        for (index, base) in KORALI_SEGMENTS.into_iter().enumerate() {
            let damage = skill_damage(base, opponent.effective_defense());
            ctx.log.emit(
                Some(&self.name),
                LogCategory::Active,
                format_args!("segment {} deals {damage:.2}", index + 1),
            );
            opponent.take_damage(damage, ACTIVE_SKILL_SOURCE, false, Some(&mut *self), ctx)?;
            if !opponent.is_alive() || !self.is_alive() {
                break;
            }
        }
        self.korali_try_stun(opponent, ctx)?;
        Ok(true)
    }

    fn korali_try_stun(
        &mut self,
        opponent: &mut Combatant,
        ctx: &mut TurnContext<'_>,
    ) -> Result<(), DuelError> {
        if !opponent.is_alive() || !self.is_alive() || self.is_passive_blocked() {
            return Ok(());
        }
        if ctx.roll(KORALI_STUN_CHANCE)? {
            opponent.apply_state(StatusRecord::stun(KORALI_STUN_TURNS), ctx);
            ctx.log.emit(
                Some(&opponent.name),
                LogCategory::Passive,
                format_args!("is stunned by {} for {KORALI_STUN_TURNS} turns", self.name),
            );
        }
        Ok(())
    }

    fn bronya_active(
        &mut self,
        opponent: &mut Combatant,
        ctx: &mut TurnContext<'_>,
    ) -> Result<bool, DuelError> {
        ctx.log.emit(
            Some(&self.name),
            LogCategory::Active,
            format_args!("fires a {BRONYA_SEGMENTS}-shell barrage"),
        );
        for segment in 1..=BRONYA_SEGMENTS {
            if !self.is_passive_blocked() && ctx.roll(BRONYA_PIERCE_CHANCE)? {
                ctx.log.emit(
                    Some(&self.name),
                    LogCategory::Passive,
                    format_args!(
                        "segment {segment} pierces for {BRONYA_SEGMENT_DAMAGE} true damage"
                    ),
                );
                opponent.take_damage(
                    BRONYA_SEGMENT_DAMAGE,
                    ACTIVE_SKILL_SOURCE,
                    true,
                    Some(&mut *self),
                    ctx,
                )?;
            } else {
                let damage = skill_damage(BRONYA_SEGMENT_DAMAGE, opponent.effective_defense());
                ctx.log.emit(
                    Some(&self.name),
                    LogCategory::Active,
                    format_args!("segment {segment} deals {damage:.2}"),
                );
                opponent.take_damage(damage, ACTIVE_SKILL_SOURCE, false, Some(&mut *self), ctx)?;
            }
            if !opponent.is_alive() || !self.is_alive() {
                break;
            }
        }

        if opponent.is_alive()
            && self.is_alive()
            && !self.is_passive_blocked()
            && ctx.roll(BRONYA_CONFUSION_CHANCE)?
        {
            opponent.apply_state(StatusRecord::confusion(BRONYA_CONFUSION_TURNS), ctx);
            ctx.log.emit(
                Some(&opponent.name),
                LogCategory::State,
                format_args!(
                    "is confused by {} and will hit itself for {BRONYA_CONFUSION_TURNS} turn",
                    self.name
                ),
            );
        }
        Ok(false)
    }

    fn bianka_gain_shield(&mut self, ctx: &mut TurnContext<'_>) {
        let shield = self.kit.shield() + BIANKA_SHIELD_GAIN;
        self.kit = Kit::Bianka { shield };
        ctx.log.emit(
            Some(&self.name),
            LogCategory::Passive,
            format_args!("gains {BIANKA_SHIELD_GAIN} shield -> {shield:.2}"),
        );
    }

    fn bianka_active(
        &mut self,
        opponent: &mut Combatant,
        ctx: &mut TurnContext<'_>,
    ) -> Result<bool, DuelError> {
        let damage = skill_damage(BIANKA_SKILL_BASE, opponent.effective_defense());
        ctx.log.emit(
            Some(&self.name),
            LogCategory::Active,
            format_args!("slashes with the active skill for {damage:.2}"),
        );
        opponent.take_damage(damage, ACTIVE_SKILL_SOURCE, false, Some(&mut *self), ctx)?;
        self.bianka_gain_shield(ctx);

        if opponent.is_alive() && ctx.roll(BIANKA_FOLLOW_UP_CHANCE)? {
            let damage = skill_damage(BIANKA_FOLLOW_UP_BASE, opponent.effective_defense());
            ctx.log.emit(
                Some(&self.name),
                LogCategory::Active,
                format_args!("follow-up slash deals {damage:.2}"),
            );
            opponent.take_damage(
                damage,
                "active skill follow-up",
                false,
                Some(&mut *self),
                ctx,
            )?;
        }
        Ok(true)
    }

    fn kiana_active(
        &mut self,
        opponent: &mut Combatant,
        ctx: &mut TurnContext<'_>,
    ) -> Result<bool, DuelError> {
        if opponent.is_alive() {
            let burst = (opponent.current_hp * KIANA_BURST_RATIO).max(KIANA_BURST_MIN);
            ctx.log.emit(
                Some(&self.name),
                LogCategory::Passive,
                format_args!("deals {burst:.2} true damage before the skill"),
            );
            opponent.take_damage(burst, KIANA_BURST_SOURCE, true, Some(&mut *self), ctx)?;
        }
        if opponent.is_alive() && self.is_alive() {
            let damage = skill_damage(KIANA_SKILL_BASE, opponent.effective_defense());
            ctx.log.emit(
                Some(&self.name),
                LogCategory::Active,
                format_args!("follows up with the active skill for {damage:.2}"),
            );
            opponent.take_damage(damage, ACTIVE_SKILL_SOURCE, false, Some(&mut *self), ctx)?;
        }
        Ok(false)
    }

    fn chenxue_active(
        &mut self,
        opponent: &mut Combatant,
        ctx: &mut TurnContext<'_>,
    ) -> Result<bool, DuelError> {
        let lost_hp = self.effective_max_hp() - self.current_hp;
        let bonus = lost_hp * CHENXUE_LOST_HP_RATIO + CHENXUE_FLAT_BONUS;
        let mitigated = (self.effective_attack() + bonus - opponent.effective_defense()).max(0.0);
        let damage = mitigated.max(1.0);
        ctx.log.emit(
            Some(&self.name),
            LogCategory::Active,
            format_args!("lunges for {damage:.2} (lost HP bonus {bonus:.2})"),
        );
        opponent.take_damage(damage, ACTIVE_SKILL_SOURCE, false, Some(&mut *self), ctx)?;
        Ok(false)
    }

    fn rita_active(
        &mut self,
        opponent: &mut Combatant,
        ctx: &mut TurnContext<'_>,
    ) -> Result<bool, DuelError> {
        let damage = skill_damage(RITA_SKILL_BASE, opponent.effective_defense());
        ctx.log.emit(
            Some(&self.name),
            LogCategory::Active,
            format_args!("strikes for {damage:.2} and shreds defense"),
        );
        opponent.take_damage(damage, ACTIVE_SKILL_SOURCE, false, Some(&mut *self), ctx)?;

        let stacked = match opponent.statuses.get(StatusId::DefenseBreak) {
            Some(StatusRecord {
                effect: StatusEffect::DefenseBreak { defense_reduction },
                ..
            }) => *defense_reduction,
            _ => 0.0,
        } + RITA_DEFENSE_BREAK_STEP;
        opponent.apply_state(
            StatusRecord::defense_break(stacked, RITA_DEFENSE_BREAK_TURNS),
            ctx,
        );
        Ok(true)
    }

    fn theresa_active(
        &mut self,
        opponent: &mut Combatant,
        ctx: &mut TurnContext<'_>,
    ) -> Result<bool, DuelError> {
        if ctx.roll(THERESA_HIT_CHANCE)? {
            let damage = skill_damage(THERESA_SKILL_BASE, opponent.effective_defense());
            ctx.log.emit(
                Some(&self.name),
                LogCategory::Active,
                format_args!("prayer lands for {damage:.2}"),
            );
            opponent.take_damage(damage, ACTIVE_SKILL_SOURCE, false, Some(&mut *self), ctx)?;
        } else {
            ctx.log.emit(
                Some(&self.name),
                LogCategory::Active,
                format_args!(
                    "prayer falters: {} true damage, recovers {}",
                    THERESA_MISS_DAMAGE, THERESA_MISS_HEAL
                ),
            );
            opponent.take_damage(
                THERESA_MISS_DAMAGE,
                ACTIVE_SKILL_SOURCE,
                true,
                Some(&mut *self),
                ctx,
            )?;
            self.heal(THERESA_MISS_HEAL, "active skill recovery", ctx);
        }
        self.theresa_try_seal(opponent, ACTIVE_SKILL_SOURCE, ctx)?;
        Ok(true)
    }

    fn theresa_try_seal(
        &mut self,
        opponent: &mut Combatant,
        source: &str,
        ctx: &mut TurnContext<'_>,
    ) -> Result<(), DuelError> {
        if self.is_passive_blocked() || !opponent.is_alive() {
            return Ok(());
        }
        if ctx.roll(THERESA_SEAL_CHANCE)? {
            opponent.apply_state(StatusRecord::passive_seal(THERESA_SEAL_TURNS), ctx);
            ctx.log.emit(
                Some(&opponent.name),
                LogCategory::State,
                format_args!(
                    "passive sealed by {}'s {source} for {THERESA_SEAL_TURNS} turns",
                    self.name
                ),
            );
        }
        Ok(())
    }
}
