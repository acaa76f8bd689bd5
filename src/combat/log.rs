//! Battle transcript: event categories, the collector that records them, and
//! plain-text / JSON rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of damage sources produced by status effects (e.g. `state:bleed`).
pub const STATE_SOURCE_PREFIX: &str = "state:";
/// Prefix of sources produced by passive abilities.
pub const PASSIVE_SOURCE_PREFIX: &str = "passive";
/// Prefix of sources produced by active skills.
pub const ACTIVE_SOURCE_PREFIX: &str = "active";
pub const BASIC_ATTACK_SOURCE: &str = "basic attack";
pub const CONFUSION_SELF_HIT_SOURCE: &str = "confusion self-hit";
pub const HEAL_SOURCE: &str = "heal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    System,
    State,
    Passive,
    Active,
    Basic,
    Heal,
    Damage,
}

impl LogCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::State => "state",
            Self::Passive => "passive",
            Self::Active => "active",
            Self::Basic => "basic",
            Self::Heal => "heal",
            Self::Damage => "damage",
        }
    }

    /// Whether damage from a source of this category counts as a direct hit
    /// that defensive passives (dodge) may react to.
    pub const fn is_direct_attack(self) -> bool {
        !matches!(self, Self::State | Self::Heal | Self::Passive)
    }
}

/// Maps a freeform damage/heal source onto a category.
pub fn classify_source(source: &str) -> LogCategory {
    if source.starts_with(STATE_SOURCE_PREFIX) {
        LogCategory::State
    } else if source.starts_with(PASSIVE_SOURCE_PREFIX) {
        LogCategory::Passive
    } else if source.starts_with(ACTIVE_SOURCE_PREFIX) {
        LogCategory::Active
    } else if source == BASIC_ATTACK_SOURCE {
        LogCategory::Basic
    } else if source == CONFUSION_SELF_HIT_SOURCE {
        LogCategory::State
    } else if source == HEAL_SOURCE {
        LogCategory::Heal
    } else {
        LogCategory::Damage
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub round: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub actor: Option<String>,
    pub category: LogCategory,
    pub message: String,
}

/// Collects battle events when enabled; a disabled log drops everything
/// without formatting it.
#[derive(Debug, Clone, Default)]
pub struct BattleLog {
    enabled: bool,
    round: u32,
    events: Vec<BattleEvent>,
}

impl BattleLog {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            round: 0,
            events: Vec::new(),
        }
    }

    pub fn silent() -> Self {
        Self::new(false)
    }

    pub fn verbose() -> Self {
        Self::new(true)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_round(&mut self, round: u32) {
        self.round = round;
    }

    pub fn emit(
        &mut self,
        actor: Option<&str>,
        category: LogCategory,
        message: fmt::Arguments<'_>,
    ) {
        if !self.enabled {
            return;
        }
        let message = message.to_string();
        tracing::trace!(
            round = self.round,
            actor = actor.unwrap_or("-"),
            category = category.as_str(),
            "{message}"
        );
        self.events.push(BattleEvent {
            round: self.round,
            actor: actor.map(str::to_string),
            category,
            message,
        });
    }

    pub fn system(&mut self, message: fmt::Arguments<'_>) {
        self.emit(None, LogCategory::System, message);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<BattleEvent> {
        self.events
    }

    pub fn clear(&mut self) {
        self.round = 0;
        self.events.clear();
    }
}

/// One transcript line, e.g. `[R3] Korali <active> unleashes a three-hit combo`.
pub fn render_event(event: &BattleEvent) -> String {
    match &event.actor {
        Some(actor) => format!(
            "[R{}] {} <{}> {}",
            event.round,
            actor,
            event.category.as_str(),
            event.message
        ),
        None => event.message.clone(),
    }
}

pub fn render_transcript(events: &[BattleEvent]) -> String {
    let mut out = String::new();
    for event in events {
        out.push_str(&render_event(event));
        out.push('\n');
    }
    out
}

pub fn serialize_events_json(events: &[BattleEvent]) -> Result<String, serde_json::Error> {
    serde_json::to_string(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_source_follows_prefix_rules() {
        assert_eq!(classify_source("state:bleed"), LogCategory::State);
        assert_eq!(classify_source("passive:dodge counter"), LogCategory::Passive);
        assert_eq!(classify_source("active skill follow-up"), LogCategory::Active);
        assert_eq!(classify_source("basic attack"), LogCategory::Basic);
        assert_eq!(classify_source("confusion self-hit"), LogCategory::State);
        assert_eq!(classify_source("heal"), LogCategory::Heal);
        assert_eq!(classify_source("falling rocks"), LogCategory::Damage);
        // Exact markers only match exactly.
        assert_eq!(classify_source("basic attack x2"), LogCategory::Damage);
    }

    #[test]
    fn direct_attack_excludes_state_heal_and_passive() {
        assert!(LogCategory::Basic.is_direct_attack());
        assert!(LogCategory::Active.is_direct_attack());
        assert!(LogCategory::Damage.is_direct_attack());
        assert!(!LogCategory::State.is_direct_attack());
        assert!(!LogCategory::Heal.is_direct_attack());
        assert!(!LogCategory::Passive.is_direct_attack());
    }

    #[test]
    fn log_records_only_when_enabled() {
        let mut on = BattleLog::verbose();
        on.set_round(2);
        on.emit(Some("Korali"), LogCategory::Basic, format_args!("hits for {}", 11));
        assert_eq!(on.events().len(), 1);
        assert_eq!(on.events()[0].round, 2);
        assert_eq!(on.events()[0].message, "hits for 11");

        let mut off = BattleLog::silent();
        off.emit(Some("Korali"), LogCategory::Basic, format_args!("hits"));
        off.system(format_args!("round"));
        assert!(off.events().is_empty());
    }

    #[test]
    fn render_event_prefixes_round_actor_and_category() {
        let event = BattleEvent {
            round: 3,
            actor: Some("Bianka".to_string()),
            category: LogCategory::Passive,
            message: "gains 5 shield".to_string(),
        };
        assert_eq!(render_event(&event), "[R3] Bianka <passive> gains 5 shield");

        let system = BattleEvent {
            round: 0,
            actor: None,
            category: LogCategory::System,
            message: "=== battle start ===".to_string(),
        };
        assert_eq!(render_event(&system), "=== battle start ===");
    }

    #[test]
    fn serialize_events_json_uses_lowercase_categories() {
        let json = serialize_events_json(&[BattleEvent {
            round: 1,
            actor: Some("Vita".to_string()),
            category: LogCategory::Heal,
            message: "recovers".to_string(),
        }])
        .expect("serialization should succeed");

        let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(parsed[0]["category"], "heal");
        assert_eq!(parsed[0]["actor"], "Vita");
        assert_eq!(parsed[0]["round"], 1);
    }
}
