pub mod export_csv;
pub mod monte_carlo;
pub mod ranking;

pub use export_csv::write_matchups_csv;
pub use monte_carlo::{
    run_pairwise, run_pairwise_parallel, run_round_robin, run_round_robin_parallel,
    CombatantTotals, PairwiseStats, RoundRobinReport, MIN_ROSTER_SIZE,
};
pub use ranking::{rank_standings, Standing};
