//! Win-rate aggregation over many battles: one pairing, or every pairing of a
//! roster (round robin). Sequential runs draw every battle from one driver;
//! parallel runs give each unit of work its own stably seeded driver.

use rayon::prelude::*;
use serde::Serialize;

use crate::combat::{BattleLog, SimulationConfig, Side, Simulator};
use crate::error::DuelError;
use crate::parallel::{batch_ranges, WorkerPool};
use crate::roster::{Roster, RosterEntry};

pub const MIN_ROSTER_SIZE: usize = 2;

/// Tasks per worker thread in the parallel pairwise split.
const BATCHES_PER_WORKER: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct Tally {
    wins_a: usize,
    wins_b: usize,
    draws: usize,
}

impl Tally {
    fn record(&mut self, winner: Option<Side>) {
        match winner {
            Some(Side::A) => self.wins_a += 1,
            Some(Side::B) => self.wins_b += 1,
            None => self.draws += 1,
        }
    }

    fn merge(mut self, other: Tally) -> Tally {
        self.wins_a += other.wins_a;
        self.wins_b += other.wins_b;
        self.draws += other.draws;
        self
    }
}

fn rate(count: usize, iterations: usize) -> f64 {
    if iterations == 0 {
        0.0
    } else {
        count as f64 / iterations as f64
    }
}

/// Results of `iterations` battles between A and B. Rates divide by the
/// iteration count, so with draws `rate_a + rate_b < 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseStats {
    pub name_a: String,
    pub name_b: String,
    pub iterations: usize,
    pub wins_a: usize,
    pub wins_b: usize,
    pub draws: usize,
}

impl PairwiseStats {
    fn from_tally(a: &RosterEntry, b: &RosterEntry, iterations: usize, tally: Tally) -> Self {
        Self {
            name_a: a.name().to_string(),
            name_b: b.name().to_string(),
            iterations,
            wins_a: tally.wins_a,
            wins_b: tally.wins_b,
            draws: tally.draws,
        }
    }

    pub fn rate_a(&self) -> f64 {
        rate(self.wins_a, self.iterations)
    }

    pub fn rate_b(&self) -> f64 {
        rate(self.wins_b, self.iterations)
    }

    pub fn draw_rate(&self) -> f64 {
        rate(self.draws, self.iterations)
    }

    /// Wins credited to `name` in this pairing, if it took part.
    pub fn wins_for(&self, name: &str) -> Option<usize> {
        if self.name_a == name {
            Some(self.wins_a)
        } else if self.name_b == name {
            Some(self.wins_b)
        } else {
            None
        }
    }

    pub fn involves(&self, name: &str) -> bool {
        self.name_a == name || self.name_b == name
    }
}

/// Runs `iterations` battles on `simulator`'s stream, spawning fresh
/// combatants for each.
pub fn run_pairwise(
    simulator: &mut Simulator,
    a: &RosterEntry,
    b: &RosterEntry,
    iterations: usize,
) -> Result<PairwiseStats, DuelError> {
    let mut log = BattleLog::silent();
    let mut tally = Tally::default();
    for _ in 0..iterations {
        let mut fighter_a = a.spawn();
        let mut fighter_b = b.spawn();
        let outcome = simulator.simulate_once(&mut fighter_a, &mut fighter_b, &mut log)?;
        tally.record(outcome.winning_side);
    }
    let stats = PairwiseStats::from_tally(a, b, iterations, tally);
    tracing::debug!(
        a = %stats.name_a,
        b = %stats.name_b,
        wins_a = stats.wins_a,
        wins_b = stats.wins_b,
        draws = stats.draws,
        "pairing finished"
    );
    Ok(stats)
}

/// Like [run_pairwise] but spreads iterations over the pool. Iteration `i`
/// runs on its own driver seeded from `(config.seed, names, i)`, so the result
/// does not depend on the worker count.
pub fn run_pairwise_parallel(
    a: &RosterEntry,
    b: &RosterEntry,
    iterations: usize,
    config: SimulationConfig,
    pool: &WorkerPool,
) -> Result<PairwiseStats, DuelError> {
    let base_seed = stable_seed(config.seed, &[a.name(), b.name()]);
    let run_batch = |&(start, end): &(usize, usize)| -> Result<Tally, DuelError> {
        let mut log = BattleLog::silent();
        let mut tally = Tally::default();
        for iteration in start..end {
            let mut simulator = Simulator::new(SimulationConfig {
                seed: base_seed.wrapping_add(iteration as u64),
                ..config
            });
            let mut fighter_a = a.spawn();
            let mut fighter_b = b.spawn();
            let outcome = simulator.simulate_once(&mut fighter_a, &mut fighter_b, &mut log)?;
            tally.record(outcome.winning_side);
        }
        Ok(tally)
    };

    let tally = pool.install(|| {
        let batches = batch_ranges(iterations, rayon::current_num_threads() * BATCHES_PER_WORKER);
        batches
            .par_iter()
            .map(run_batch)
            .try_reduce(Tally::default, |left, right| Ok(left.merge(right)))
    })?;
    Ok(PairwiseStats::from_tally(a, b, iterations, tally))
}

/// Aggregate over every opponent of one roster member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatantTotals {
    pub name: String,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    /// `iterations_per_pair × (roster_size − 1)`.
    pub matches: usize,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundRobinReport {
    pub iterations_per_pair: usize,
    /// Roster order.
    pub overall: Vec<CombatantTotals>,
    /// One entry per unordered pair, in roster order.
    pub matchups: Vec<PairwiseStats>,
}

impl RoundRobinReport {
    fn from_matchups(
        names: &[&str],
        iterations_per_pair: usize,
        matchups: Vec<PairwiseStats>,
    ) -> Self {
        let matches = iterations_per_pair * names.len().saturating_sub(1);
        let overall = names
            .iter()
            .map(|&name| {
                let mut wins = 0;
                let mut draws = 0;
                for matchup in matchups.iter().filter(|m| m.involves(name)) {
                    wins += matchup.wins_for(name).unwrap_or(0);
                    draws += matchup.draws;
                }
                CombatantTotals {
                    name: name.to_string(),
                    wins,
                    draws,
                    losses: matches.saturating_sub(wins + draws),
                    matches,
                    win_rate: rate(wins, matches),
                }
            })
            .collect();
        Self {
            iterations_per_pair,
            overall,
            matchups,
        }
    }

    pub fn overall_rate(&self, name: &str) -> Option<f64> {
        self.overall.iter().find(|t| t.name == name).map(|t| t.win_rate)
    }

    /// The pairing of `a` and `b` in either order.
    pub fn matchup(&self, a: &str, b: &str) -> Option<&PairwiseStats> {
        self.matchups.iter().find(|m| {
            (m.name_a == a && m.name_b == b) || (m.name_a == b && m.name_b == a)
        })
    }
}

fn pairs(roster: &Roster) -> Result<Vec<(&RosterEntry, &RosterEntry)>, DuelError> {
    if roster.len() < MIN_ROSTER_SIZE {
        return Err(DuelError::RosterTooSmall { size: roster.len() });
    }
    let entries = roster.entries();
    Ok(entries
        .iter()
        .enumerate()
        .flat_map(|(i, a)| entries[i + 1..].iter().map(move |b| (a, b)))
        .collect())
}

/// Every unordered pair in roster order, all drawn from `simulator`'s stream.
pub fn run_round_robin(
    simulator: &mut Simulator,
    roster: &Roster,
    iterations_per_pair: usize,
) -> Result<RoundRobinReport, DuelError> {
    let mut matchups = Vec::new();
    for (a, b) in pairs(roster)? {
        matchups.push(run_pairwise(simulator, a, b, iterations_per_pair)?);
    }
    let report = RoundRobinReport::from_matchups(&roster.names(), iterations_per_pair, matchups);
    tracing::info!(
        combatants = roster.len(),
        pairings = report.matchups.len(),
        iterations_per_pair,
        "round robin finished"
    );
    Ok(report)
}

/// Runs pairings concurrently. Each pairing gets its own driver seeded from
/// `(config.seed, name_a, name_b)`: reproducible for any worker count, but a
/// different sample than [run_round_robin] with the same seed.
pub fn run_round_robin_parallel(
    roster: &Roster,
    iterations_per_pair: usize,
    config: SimulationConfig,
    pool: &WorkerPool,
) -> Result<RoundRobinReport, DuelError> {
    let pairings = pairs(roster)?;
    let matchups = pool.install(|| {
        pairings
            .par_iter()
            .map(|&(a, b)| {
                let mut simulator = Simulator::new(SimulationConfig {
                    seed: stable_seed(config.seed, &[a.name(), b.name()]),
                    ..config
                });
                run_pairwise(&mut simulator, a, b, iterations_per_pair)
            })
            .collect::<Result<Vec<_>, DuelError>>()
    })?;
    let report = RoundRobinReport::from_matchups(&roster.names(), iterations_per_pair, matchups);
    tracing::info!(
        combatants = roster.len(),
        pairings = report.matchups.len(),
        iterations_per_pair,
        workers = pool.workers,
        "parallel round robin finished"
    );
    Ok(report)
}

fn stable_seed(seed: u64, names: &[&str]) -> u64 {
    let mut acc = seed;
    for name in names {
        for b in name.bytes() {
            acc = acc.wrapping_mul(37).wrapping_add(u64::from(b));
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_seed_depends_on_order_and_names() {
        let ab = stable_seed(7, &["Korali", "Bronya"]);
        assert_eq!(ab, stable_seed(7, &["Korali", "Bronya"]));
        assert_ne!(ab, stable_seed(7, &["Bronya", "Korali"]));
        assert_ne!(ab, stable_seed(8, &["Korali", "Bronya"]));
    }

    #[test]
    fn zero_iterations_yield_zero_rates() {
        let stats = PairwiseStats {
            name_a: "A".into(),
            name_b: "B".into(),
            iterations: 0,
            wins_a: 0,
            wins_b: 0,
            draws: 0,
        };
        assert_eq!(stats.rate_a(), 0.0);
        assert_eq!(stats.draw_rate(), 0.0);
    }

    #[test]
    fn tally_merge_adds_counts() {
        let mut left = Tally::default();
        left.record(Some(Side::A));
        left.record(None);
        let mut right = Tally::default();
        right.record(Some(Side::B));
        right.record(Some(Side::A));
        assert_eq!(
            left.merge(right),
            Tally {
                wins_a: 2,
                wins_b: 1,
                draws: 1
            }
        );
    }
}
