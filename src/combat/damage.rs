//! Damage and mitigation arithmetic. Every formula here is total and never
//! returns a negative amount.

/// Share of the unmitigated value that always gets through defense.
pub const DAMAGE_FLOOR_RATIO: f64 = 0.05;

/// Basic attack: `max(5% of attack, attack - defense)`.
pub fn basic_attack_damage(attack: f64, defense: f64) -> f64 {
    (DAMAGE_FLOOR_RATIO * attack).max(attack - defense)
}

/// Skill damage from a fixed base value, with the same 5% floor as basic attacks
/// computed from the skill's own base.
pub fn skill_damage(base_damage: f64, defense: f64) -> f64 {
    let raw = base_damage.max(0.0);
    let mitigated = (raw - defense).max(0.0);
    mitigated.max(raw * DAMAGE_FLOOR_RATIO)
}

/// Result of routing incoming damage through a shield charge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShieldSplit {
    pub absorbed: f64,
    pub shield_remaining: f64,
    pub overflow: f64,
}

/// Absorbs `min(incoming, shield)` and forwards the remainder.
pub fn absorb_with_shield(shield: f64, incoming: f64) -> ShieldSplit {
    let shield = shield.max(0.0);
    let incoming = incoming.max(0.0);
    let absorbed = incoming.min(shield);
    ShieldSplit {
        absorbed,
        shield_remaining: shield - absorbed,
        overflow: incoming - absorbed,
    }
}
