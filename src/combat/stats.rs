use serde::{Deserialize, Serialize};

/// Base attributes shared by every instance of an archetype.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatValues {
    pub max_hp: f64,
    pub attack: f64,
    pub defense: f64,
    pub speed: f64,
}

impl StatValues {
    pub const fn new(max_hp: f64, attack: f64, defense: f64, speed: f64) -> Self {
        Self {
            max_hp,
            attack,
            defense,
            speed,
        }
    }
}
