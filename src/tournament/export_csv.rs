//! CSV export of round-robin results: one row per unordered pairing.

use std::io::Write;

use serde::Serialize;

use crate::error::DuelError;
use crate::tournament::monte_carlo::RoundRobinReport;

#[derive(Debug, Serialize)]
struct MatchupRow<'a> {
    name_a: &'a str,
    name_b: &'a str,
    rate_a: f64,
    rate_b: f64,
    draw_rate: f64,
}

/// Columns: `name_a,name_b,rate_a,rate_b,draw_rate`.
pub fn write_matchups_csv<W: Write>(report: &RoundRobinReport, writer: W) -> Result<(), DuelError> {
    let mut csv = csv::Writer::from_writer(writer);
    for matchup in &report.matchups {
        csv.serialize(MatchupRow {
            name_a: &matchup.name_a,
            name_b: &matchup.name_b,
            rate_a: matchup.rate_a(),
            rate_b: matchup.rate_b(),
            draw_rate: matchup.draw_rate(),
        })?;
    }
    csv.flush().map_err(|err| DuelError::Csv(err.to_string()))?;
    Ok(())
}
