//! Named combatant factories. Every battle gets a pristine instance from its
//! entry's spawn function; instances are never reused across battles.

pub mod config;

use std::fmt;
use std::sync::Arc;

use crate::combat::{Combatant, Kit, StatValues};
use crate::error::DuelError;

pub use config::{
    load_roster_config, resolve_roster_config, RosterConfig, StatOverride, ROSTER_ENV_VAR,
};

pub const CODE_RED: &str = "Code Red";
pub const CODE_BLUE: &str = "Code Blue";

pub type SpawnFn = Arc<dyn Fn() -> Combatant + Send + Sync>;

#[derive(Clone)]
pub struct RosterEntry {
    name: String,
    spawn: SpawnFn,
}

impl RosterEntry {
    pub fn new<F>(name: impl Into<String>, spawn: F) -> Self
    where
        F: Fn() -> Combatant + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            spawn: Arc::new(spawn),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spawn(&self) -> Combatant {
        (self.spawn)()
    }
}

impl fmt::Debug for RosterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RosterEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered set of entries, unique by name.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, replacing any existing entry with the same name in place.
    pub fn insert(&mut self, entry: RosterEntry) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn with<F>(mut self, name: impl Into<String>, spawn: F) -> Self
    where
        F: Fn() -> Combatant + Send + Sync + 'static,
    {
        self.insert(RosterEntry::new(name, spawn));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(RosterEntry::name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Case-insensitive lookup, for names typed on the command line.
    pub fn require(&self, name: &str) -> Result<&RosterEntry, DuelError> {
        self.get(name)
            .or_else(|| self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name)))
            .ok_or_else(|| DuelError::UnknownCombatant(name.to_string()))
    }
}

/// Built-in archetype: display name, default stats, cooldown, kit.
#[derive(Debug, Clone, Copy)]
pub struct Archetype {
    pub name: &'static str,
    pub stats: StatValues,
    pub cooldown: u32,
    pub kit: Kit,
}

impl Archetype {
    pub fn build(&self, stats: StatValues) -> Combatant {
        Combatant::new(self.name, stats, self.kit).with_cooldown(self.cooldown)
    }
}

pub const PLACEHOLDERS: [Archetype; 2] = [
    Archetype {
        name: CODE_RED,
        stats: StatValues::new(1500.0, 240.0, 60.0, 120.0),
        cooldown: 2,
        kit: Kit::placeholder(30.0, 0.04),
    },
    Archetype {
        name: CODE_BLUE,
        stats: StatValues::new(1650.0, 220.0, 80.0, 110.0),
        cooldown: 3,
        kit: Kit::placeholder(20.0, 0.06),
    },
];

pub const VALKYRIES: [Archetype; 8] = [
    Archetype {
        name: "Korali",
        stats: StatValues::new(100.0, 17.0, 6.0, 21.0),
        cooldown: 3,
        kit: Kit::Korali,
    },
    Archetype {
        name: "Bronya",
        stats: StatValues::new(100.0, 18.0, 6.0, 20.0),
        cooldown: 3,
        kit: Kit::Bronya,
    },
    Archetype {
        name: "Bianka",
        stats: StatValues::new(100.0, 16.0, 11.0, 22.0),
        cooldown: 2,
        kit: Kit::bianka(),
    },
    Archetype {
        name: "Kiana",
        stats: StatValues::new(100.0, 18.0, 7.0, 21.0),
        cooldown: 2,
        kit: Kit::Kiana,
    },
    Archetype {
        name: "Chenxue",
        stats: StatValues::new(100.0, 16.0, 8.0, 21.0),
        cooldown: 2,
        kit: Kit::chenxue(),
    },
    Archetype {
        name: "Rita",
        stats: StatValues::new(100.0, 22.0, 9.0, 25.0),
        cooldown: 2,
        kit: Kit::Rita,
    },
    Archetype {
        name: "Theresa",
        stats: StatValues::new(100.0, 23.0, 7.0, 24.0),
        cooldown: 3,
        kit: Kit::Theresa,
    },
    Archetype {
        name: "Vita",
        stats: StatValues::new(100.0, 20.0, 8.0, 25.0),
        cooldown: 3,
        kit: Kit::vita(),
    },
];

/// Exact display-name lookup, matching how override keys are applied.
pub fn find_archetype(name: &str) -> Option<&'static Archetype> {
    PLACEHOLDERS
        .iter()
        .chain(VALKYRIES.iter())
        .find(|a| a.name == name)
}

fn roster_from(archetypes: &[Archetype], config: &RosterConfig) -> Roster {
    let mut roster = Roster::new();
    for archetype in archetypes.iter().copied() {
        let stats = config.stats_for(archetype.name, archetype.stats);
        roster.insert(RosterEntry::new(archetype.name, move || archetype.build(stats)));
    }
    roster
}

/// Code Red vs Code Blue.
pub fn placeholder_pair(config: &RosterConfig) -> Roster {
    roster_from(&PLACEHOLDERS, config)
}

/// The default tournament roster.
pub fn valkyrie_roster(config: &RosterConfig) -> Roster {
    roster_from(&VALKYRIES, config)
}

/// Every built-in archetype. Warns about override keys that match none of them.
pub fn full_roster(config: &RosterConfig) -> Roster {
    for name in config.overrides.keys() {
        if find_archetype(name).is_none() {
            tracing::warn!(name = %name, "roster override does not match any archetype");
        }
    }
    let mut roster = placeholder_pair(config);
    for entry in valkyrie_roster(config).entries {
        roster.insert(entry);
    }
    roster
}
