use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::combat::{
    render_transcript, BattleEvent, BattleLog, BattleOutcome, SimulationConfig, Simulator,
    StatValues,
};
use crate::parallel::WorkerPool;
use crate::roster::{
    full_roster, placeholder_pair, resolve_roster_config, valkyrie_roster, RosterConfig,
    RosterEntry, CODE_BLUE, CODE_RED,
};
use crate::tournament::{
    rank_standings, run_pairwise, run_pairwise_parallel, run_round_robin,
    run_round_robin_parallel, write_matchups_csv, PairwiseStats, RoundRobinReport, Standing,
};

pub const DEFAULT_ITERATIONS: usize = 10_000;
pub const DEFAULT_TOURNAMENT_ITERATIONS: usize = 1_000;

const USAGE: &str =
    "usage: duelsim [--roster <path>] <simulate|duel|tournament|replay|roster> [args]";

type CliResult = Result<i32, Box<dyn Error>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Simulate,
    Duel,
    Tournament,
    Replay,
    Roster,
}

pub fn parse_command(name: &str) -> Option<Command> {
    match name {
        "simulate" => Some(Command::Simulate),
        "duel" => Some(Command::Duel),
        "tournament" => Some(Command::Tournament),
        "replay" => Some(Command::Replay),
        "roster" => Some(Command::Roster),
        _ => None,
    }
}

/// Command line split into positionals (command first) and options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub positionals: Vec<String>,
    pub roster: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub json: bool,
    pub parallel: bool,
}

impl Invocation {
    pub fn command(&self) -> Option<Command> {
        self.positionals.first().and_then(|name| parse_command(name))
    }

    fn arg(&self, index: usize) -> Option<&String> {
        self.positionals.get(index)
    }
}

/// `args[0]` is the program name. Options may appear anywhere.
pub fn parse_invocation(args: &[String]) -> Result<Invocation, String> {
    let mut invocation = Invocation::default();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => invocation.json = true,
            "--parallel" => invocation.parallel = true,
            "--roster" => {
                let path = iter.next().ok_or("--roster needs a path")?;
                invocation.roster = Some(PathBuf::from(path));
            }
            "--csv" => {
                let path = iter.next().ok_or("--csv needs a path")?;
                invocation.csv = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option '{flag}'")),
            _ => invocation.positionals.push(arg.clone()),
        }
    }
    Ok(invocation)
}

pub fn run_with_args(args: &[String]) -> i32 {
    let invocation = match parse_invocation(args) {
        Ok(invocation) => invocation,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{USAGE}");
            return 2;
        }
    };
    let Some(command) = invocation.command() else {
        eprintln!("{USAGE}");
        return 2;
    };
    let config = match resolve_roster_config(invocation.roster.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };

    let result = match command {
        Command::Simulate => handle_simulate(&invocation, &config),
        Command::Duel => handle_duel(&invocation, &config),
        Command::Tournament => handle_tournament(&invocation, &config),
        Command::Replay => handle_replay(&invocation, &config),
        Command::Roster => handle_roster(&config),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}

fn pairwise(
    a: &RosterEntry,
    b: &RosterEntry,
    iterations: usize,
    simulator: &mut Simulator,
    parallel: bool,
) -> Result<PairwiseStats, Box<dyn Error>> {
    let stats = if parallel {
        run_pairwise_parallel(a, b, iterations, simulator.config(), &WorkerPool::default())?
    } else {
        run_pairwise(simulator, a, b, iterations)?
    };
    Ok(stats)
}

fn print_pairwise(stats: &PairwiseStats) {
    println!("{} win rate: {:.2}%", stats.name_a, stats.rate_a() * 100.0);
    println!("{} win rate: {:.2}%", stats.name_b, stats.rate_b() * 100.0);
    println!("draw rate: {:.2}%", stats.draw_rate() * 100.0);
}

/// Code Red vs Code Blue win rates, then one verbose battle from the same stream.
fn handle_simulate(invocation: &Invocation, config: &RosterConfig) -> CliResult {
    let iterations = parse_usize_arg(invocation.arg(1), "iterations", DEFAULT_ITERATIONS);
    let seed = parse_seed_arg(invocation.arg(2));
    let roster = placeholder_pair(config);
    let red = roster.require(CODE_RED)?;
    let blue = roster.require(CODE_BLUE)?;

    let mut simulator = Simulator::with_seed(seed);
    let stats = pairwise(red, blue, iterations, &mut simulator, invocation.parallel)?;
    println!("seed: {seed}");
    println!("iterations: {iterations}");
    print_pairwise(&stats);

    let mut log = BattleLog::verbose();
    simulator.simulate_once(&mut red.spawn(), &mut blue.spawn(), &mut log)?;
    println!();
    print!("{}", render_transcript(log.events()));
    Ok(0)
}

#[derive(Serialize)]
struct DuelPayload<'a> {
    seed: u64,
    rate_a: f64,
    rate_b: f64,
    draw_rate: f64,
    #[serde(flatten)]
    stats: &'a PairwiseStats,
}

fn handle_duel(invocation: &Invocation, config: &RosterConfig) -> CliResult {
    let (Some(name_a), Some(name_b)) = (invocation.arg(1), invocation.arg(2)) else {
        eprintln!(
            "usage: duelsim duel <name_a> <name_b> [iterations] [seed] [--parallel] [--json]"
        );
        return Ok(2);
    };
    let iterations = parse_usize_arg(invocation.arg(3), "iterations", DEFAULT_ITERATIONS);
    let seed = parse_seed_arg(invocation.arg(4));
    let roster = full_roster(config);
    let a = roster.require(name_a)?;
    let b = roster.require(name_b)?;

    let mut simulator = Simulator::with_seed(seed);
    let stats = pairwise(a, b, iterations, &mut simulator, invocation.parallel)?;
    if invocation.json {
        let payload = DuelPayload {
            seed,
            rate_a: stats.rate_a(),
            rate_b: stats.rate_b(),
            draw_rate: stats.draw_rate(),
            stats: &stats,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("seed: {seed}");
        println!("iterations: {iterations}");
        print_pairwise(&stats);
    }
    Ok(0)
}

#[derive(Serialize)]
struct TournamentPayload<'a> {
    seed: u64,
    standings: &'a [Standing],
    #[serde(flatten)]
    report: &'a RoundRobinReport,
}

fn handle_tournament(invocation: &Invocation, config: &RosterConfig) -> CliResult {
    let iterations =
        parse_usize_arg(invocation.arg(1), "iterations", DEFAULT_TOURNAMENT_ITERATIONS);
    let seed = parse_seed_arg(invocation.arg(2));
    let roster = valkyrie_roster(config);

    let report = if invocation.parallel {
        run_round_robin_parallel(
            &roster,
            iterations,
            SimulationConfig::new(seed),
            &WorkerPool::default(),
        )?
    } else {
        run_round_robin(&mut Simulator::with_seed(seed), &roster, iterations)?
    };
    let standings = rank_standings(&report);

    if let Some(path) = &invocation.csv {
        write_matchups_csv(&report, BufWriter::new(File::create(path)?))?;
        eprintln!("matchups written to {}", path.display());
    }

    if invocation.json {
        let payload = TournamentPayload {
            seed,
            standings: &standings,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(0);
    }

    println!("seed: {seed}");
    println!("iterations per pair: {iterations}");
    println!("{:>4}  {:<10} {:>9} {:>7} {:>6}", "rank", "name", "win rate", "wins", "draws");
    for standing in &standings {
        println!(
            "{:>4}  {:<10} {:>8.2}% {:>7} {:>6}",
            standing.rank,
            standing.name,
            standing.win_rate * 100.0,
            standing.wins,
            standing.draws
        );
    }
    println!();
    println!("matchups:");
    for matchup in &report.matchups {
        println!(
            "  {} vs {}: {:.2}% / {:.2}% (draws {:.2}%)",
            matchup.name_a,
            matchup.name_b,
            matchup.rate_a() * 100.0,
            matchup.rate_b() * 100.0,
            matchup.draw_rate() * 100.0
        );
    }
    Ok(0)
}

#[derive(Serialize)]
struct ReplayPayload<'a> {
    seed: u64,
    outcome: &'a BattleOutcome,
    events: &'a [BattleEvent],
}

fn handle_replay(invocation: &Invocation, config: &RosterConfig) -> CliResult {
    let (Some(name_a), Some(name_b)) = (invocation.arg(1), invocation.arg(2)) else {
        eprintln!("usage: duelsim replay <name_a> <name_b> [seed] [--json]");
        return Ok(2);
    };
    let seed = parse_seed_arg(invocation.arg(3));
    let roster = full_roster(config);
    let a = roster.require(name_a)?;
    let b = roster.require(name_b)?;

    let mut log = BattleLog::verbose();
    let outcome =
        Simulator::with_seed(seed).simulate_once(&mut a.spawn(), &mut b.spawn(), &mut log)?;
    if invocation.json {
        let payload = ReplayPayload {
            seed,
            outcome: &outcome,
            events: log.events(),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("seed: {seed}");
        print!("{}", render_transcript(log.events()));
    }
    Ok(0)
}

#[derive(Serialize)]
struct RosterListing {
    name: String,
    archetype: &'static str,
    stats: StatValues,
    cooldown: Option<u32>,
}

fn handle_roster(config: &RosterConfig) -> CliResult {
    let listing: Vec<RosterListing> = full_roster(config)
        .entries()
        .iter()
        .map(|entry| {
            let combatant = entry.spawn();
            RosterListing {
                name: combatant.name().to_string(),
                archetype: combatant.kit().archetype(),
                stats: combatant.base_stats(),
                cooldown: combatant.cooldown().map(|cooldown| cooldown.total()),
            }
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(0)
}

fn parse_usize_arg(raw: Option<&String>, name: &str, default: usize) -> usize {
    raw.and_then(|value| value.parse::<usize>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

/// A missing or unparsable seed is replaced by a fresh one from OS entropy.
fn parse_seed_arg(raw: Option<&String>) -> u64 {
    match raw {
        Some(value) => value.parse::<u64>().unwrap_or_else(|_| {
            let seed = entropy_seed();
            eprintln!("invalid seed '{value}', using random seed {seed}");
            seed
        }),
        None => entropy_seed(),
    }
}

fn entropy_seed() -> u64 {
    let mut bytes = [0u8; 8];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => u64::from_le_bytes(bytes),
        Err(err) => {
            tracing::warn!(error = %err, "OS entropy unavailable, seeding from the clock");
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos() as u64)
                .unwrap_or_default()
        }
    }
}
