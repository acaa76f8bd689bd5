//! Optional stat overrides for built-in archetypes, read from YAML or JSON.
//!
//! ```yaml
//! overrides:
//!   Kiana:
//!     attack: 20
//!   Code Red:
//!     max_hp: 1800
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::combat::StatValues;
use crate::error::DuelError;

/// Environment variable consulted when no `--roster` path is given.
pub const ROSTER_ENV_VAR: &str = "DUELSIM_ROSTER";

/// Per-field replacement; absent fields keep the archetype default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatOverride {
    #[serde(default)]
    pub max_hp: Option<f64>,
    #[serde(default)]
    pub attack: Option<f64>,
    #[serde(default)]
    pub defense: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
}

impl StatOverride {
    pub fn apply(&self, base: StatValues) -> StatValues {
        StatValues {
            max_hp: self.max_hp.unwrap_or(base.max_hp),
            attack: self.attack.unwrap_or(base.attack),
            defense: self.defense.unwrap_or(base.defense),
            speed: self.speed.unwrap_or(base.speed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Keyed by display name.
    #[serde(default)]
    pub overrides: BTreeMap<String, StatOverride>,
}

impl RosterConfig {
    pub fn stats_for(&self, name: &str, defaults: StatValues) -> StatValues {
        match self.overrides.get(name) {
            Some(stat_override) => stat_override.apply(defaults),
            None => defaults,
        }
    }
}

/// Parses by file extension: `.yaml`/`.yml` as YAML, anything else as JSON.
pub fn parse_roster_config(path: &Path, raw: &str) -> Result<RosterConfig, DuelError> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    let parsed: Result<RosterConfig, String> = if is_yaml {
        serde_yaml::from_str(raw).map_err(|err| err.to_string())
    } else {
        serde_json::from_str(raw).map_err(|err| err.to_string())
    };
    parsed.map_err(|message| DuelError::ConfigParse {
        path: path.to_path_buf(),
        message,
    })
}

pub fn load_roster_config(path: &Path) -> Result<RosterConfig, DuelError> {
    let raw = fs::read_to_string(path).map_err(|source| DuelError::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_roster_config(path, &raw)?;
    tracing::debug!(
        path = %path.display(),
        overrides = config.overrides.len(),
        "loaded roster config"
    );
    Ok(config)
}

/// An explicit path wins over [`ROSTER_ENV_VAR`]; with neither, built-in defaults apply.
pub fn resolve_roster_config(explicit: Option<&Path>) -> Result<RosterConfig, DuelError> {
    if let Some(path) = explicit {
        return load_roster_config(path);
    }
    match std::env::var_os(ROSTER_ENV_VAR) {
        Some(value) if !value.is_empty() => load_roster_config(&PathBuf::from(value)),
        _ => Ok(RosterConfig::default()),
    }
}
