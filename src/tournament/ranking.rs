use serde::Serialize;

use crate::tournament::monte_carlo::RoundRobinReport;

#[derive(Debug, Clone, Serialize)]
pub struct Standing {
    /// 1-based.
    pub rank: usize,
    pub name: String,
    pub win_rate: f64,
    pub wins: usize,
    pub draws: usize,
    pub matches: usize,
}

/// Orders by win rate, then fewer draws, then name.
pub fn rank_standings(report: &RoundRobinReport) -> Vec<Standing> {
    let mut totals: Vec<_> = report.overall.iter().collect();
    totals.sort_by(|left, right| {
        right
            .win_rate
            .total_cmp(&left.win_rate)
            .then_with(|| left.draws.cmp(&right.draws))
            .then_with(|| left.name.cmp(&right.name))
    });

    totals
        .into_iter()
        .enumerate()
        .map(|(index, totals)| Standing {
            rank: index + 1,
            name: totals.name.clone(),
            win_rate: totals.win_rate,
            wins: totals.wins,
            draws: totals.draws,
            matches: totals.matches,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::monte_carlo::CombatantTotals;

    fn totals(name: &str, wins: usize, draws: usize) -> CombatantTotals {
        CombatantTotals {
            name: name.to_string(),
            wins,
            draws,
            losses: 20 - wins - draws,
            matches: 20,
            win_rate: wins as f64 / 20.0,
        }
    }

    #[test]
    fn ranks_by_rate_then_draws_then_name() {
        let report = RoundRobinReport {
            iterations_per_pair: 10,
            overall: vec![
                totals("Vita", 8, 0),
                totals("Bianka", 12, 1),
                totals("Rita", 8, 2),
                totals("Kiana", 8, 0),
            ],
            matchups: Vec::new(),
        };
        let names: Vec<_> = rank_standings(&report).into_iter().map(|s| (s.rank, s.name)).collect();
        assert_eq!(
            names,
            vec![
                (1, "Bianka".to_string()),
                (2, "Kiana".to_string()),
                (3, "Vita".to_string()),
                (4, "Rita".to_string()),
            ]
        );
    }
}
