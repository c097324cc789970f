//! Campus Tour - Command Line Interface
//!
//! Plans time-constrained campus tours with greedy orienteering heuristics.

use clap::{Parser, Subcommand, ValueEnum};
use campus_tour::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use campus_tour::heuristics::{CandidateProgress, MultiStartSearch, PolicyKind, SelectionPolicy};
use campus_tour::synthesis::DEFAULT_TIME_SCALE;
use campus_tour::{CampusInstance, Error, PlannerConfig, PointId, Result, RunOutcome, TourPlanner};
use indicatif::{ProgressBar, ProgressStyle};

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "campus-tour")]
#[command(version = "1.0")]
#[command(about = "Plans time-constrained campus tours with greedy orienteering heuristics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the best tour of a campus
    Solve {
        /// Campus payload (JSON). The built-in sample campus is used when omitted
        #[arg(short, long)]
        instance: Option<PathBuf>,

        /// Start from this point only; every point is tried when omitted
        #[arg(short, long)]
        start: Option<PointId>,

        /// Selection policy
        #[arg(short, long, value_enum)]
        policy: Option<Policy>,

        /// Ranking of multi-start tours (defaults to the policy's own)
        #[arg(long, value_enum)]
        objective: Option<Objective>,

        /// Time budget in minutes, overrides the payload's
        #[arg(short, long)]
        budget: Option<u32>,

        /// Canvas units per minute when synthesizing travel times
        #[arg(long)]
        scale: Option<f64>,

        /// Planner configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output solution to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze a campus
    Analyze {
        /// Campus payload (JSON); sample campus when omitted
        #[arg(short, long)]
        instance: Option<PathBuf>,
    },

    /// Compare every policy on one campus or a directory of campuses
    Compare {
        /// Campus payload (JSON); sample campus when neither this nor --dir is given
        #[arg(short, long, conflicts_with = "dir")]
        instance: Option<PathBuf>,

        /// Directory of campus payloads
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Time budget applied to every campus
        #[arg(short, long)]
        budget: Option<u32>,

        /// Output CSV file with one row per policy and campus
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output CSV file with per-policy statistics
        #[arg(long)]
        stats_output: Option<PathBuf>,

        /// Run policies one after the other
        #[arg(long)]
        sequential: bool,
    },

    /// Generate a random campus
    Generate {
        /// Number of points
        #[arg(short = 'n', long, default_value = "10")]
        points: usize,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Canvas width
        #[arg(long, default_value = "700")]
        width: f64,

        /// Canvas height
        #[arg(long, default_value = "500")]
        height: f64,

        /// Maximum point value (1..=max). 0 generates a coverage campus without values
        #[arg(long, default_value = "15")]
        max_value: u32,

        /// Time budget in minutes
        #[arg(short, long, default_value = "30")]
        budget: u32,

        /// Output payload
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Replace every edge of a campus with times synthesized from coordinates
    Regenerate {
        /// Campus payload (JSON)
        #[arg(short, long)]
        instance: PathBuf,

        /// Canvas units per minute
        #[arg(long, default_value = "20")]
        scale: f64,

        /// Output payload
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Policy {
    /// Highest value per minute walked
    ValueDensity,
    /// Nearest reachable point
    Nearest,
    /// Nearest reachable point, keeping time to walk back to the start
    NearestReturn,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Objective {
    /// Largest collected value
    TotalValue,
    /// Most distinct points, then shortest time
    Coverage,
}

impl From<Policy> for PolicyKind {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::ValueDensity => PolicyKind::ValueDensity,
            Policy::Nearest => PolicyKind::Nearest,
            Policy::NearestReturn => PolicyKind::NearestReturn,
        }
    }
}

impl From<Objective> for campus_tour::heuristics::Objective {
    fn from(objective: Objective) -> Self {
        match objective {
            Objective::TotalValue => campus_tour::heuristics::Objective::TotalValue,
            Objective::Coverage => campus_tour::heuristics::Objective::Coverage,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Solve { instance, start, policy, objective, budget, scale, config, output, verbose } => {
            solve_campus(instance.as_deref(), start, policy, objective, budget, scale, config.as_deref(), output, verbose)
        }

        Commands::Analyze { instance } => analyze_campus(instance.as_deref()),

        Commands::Compare { instance, dir, budget, output, stats_output, sequential } => {
            compare_policies(instance.as_deref(), dir.as_deref(), budget, output, stats_output, sequential)
        }

        Commands::Generate { points, seed, width, height, max_value, budget, output } => {
            let campus = CampusInstance::random(points, seed, width, height, max_value, budget);
            campus.save_json(&output).map(|()| println!("Campus with {} points saved to {:?}", points, output))
        }

        Commands::Regenerate { instance, scale, output } => regenerate_campus(&instance, scale, &output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_campus(path: Option<&Path>) -> Result<CampusInstance> {
    match path {
        Some(path) => {
            println!("Loading campus from {:?}...", path);
            CampusInstance::from_file(path)
        }
        None => Ok(CampusInstance::sample_campus()),
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_campus(
    path: Option<&Path>,
    start: Option<PointId>,
    policy: Option<Policy>,
    objective: Option<Objective>,
    budget: Option<u32>,
    scale: Option<f64>,
    config_path: Option<&Path>,
    output: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::default(),
    };
    if let Some(policy) = policy {
        config.policy = policy.into();
    }
    if let Some(objective) = objective {
        config.objective = Some(objective.into());
    }
    if let Some(scale) = scale {
        config.time_scale = scale;
    }

    let mut campus = load_campus(path)?;
    if let Some(minutes) = budget {
        campus.set_time_budget(minutes);
    }

    let planner = TourPlanner::new(campus, config)?;
    let graph = planner.snapshot();

    if verbose {
        println!("{}", graph.statistics());
        println!("Policy: {}", planner.config().policy.name());
        println!("Objective: {:?}", planner.config().objective());
    }

    let timer = Instant::now();
    let outcome = match start {
        Some(id) => {
            println!("Building tour from point {} with {}...", id, planner.config().policy.name());
            planner.optimize(id)?
        }
        None => {
            println!("Trying all {} starting points with {}...", graph.len(), planner.config().policy.name());
            let bar = ProgressBar::new(graph.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            let outcome = planner.find_best(|p: &CandidateProgress<'_>| {
                bar.set_position(p.index as u64);
                bar.set_message(format!("start {} | best value {} in {} min", p.candidate, p.best.total_value, p.best.total_time));
                ControlFlow::Continue(())
            })?;
            bar.finish_and_clear();
            outcome
        }
    };
    let elapsed = timer.elapsed();

    let solution = match outcome {
        RunOutcome::Completed(solution) => solution,
        RunOutcome::Rejected | RunOutcome::Abandoned => {
            return Err(Error::invalid_input("the run did not complete"));
        }
    };

    println!("\n========== Results ==========");
    println!("Policy: {}", solution.algorithm);
    println!("Stops: {} ({} distinct)", solution.route.len(), solution.distinct_points);
    println!("Total time: {} / {} min", solution.total_time, graph.time_budget());
    println!("Total value: {}", solution.total_value);
    println!("Returns to start: {}", solution.returns_to_start);
    println!("Time: {:.4}s", elapsed.as_secs_f64());
    if let Some(starts) = solution.starts_evaluated {
        println!("Starts evaluated: {}", starts);
    }

    println!("\nItinerary:");
    for line in solution.describe(&graph) {
        println!("  {}", line);
    }
    if verbose {
        println!("\nLeg times: {:?}", solution.leg_times);
        println!("Cumulative times: {:?}", solution.cumulative_times());
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&solution)?;
        std::fs::write(&out_path, json)?;
        println!("\nSolution saved to {:?}", out_path);
    }

    Ok(())
}

fn analyze_campus(path: Option<&Path>) -> Result<()> {
    let mut campus = load_campus(path)?;
    if campus.ensure_edges(DEFAULT_TIME_SCALE) {
        println!("No edges in payload, synthesized a complete graph.");
    }

    println!("========== Campus Analysis ==========\n");
    println!("{}", campus.statistics());

    println!("Points:");
    for point in campus.points() {
        let degree = campus.point_ids().filter(|&other| campus.edge_time(point.id, other).is_some()).count();
        let value = point.value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        println!("  [{}] {:<24} value {:>4}  reachable {}", point.id, point.name, value, degree);
    }

    println!("\nQuick Solution Estimates:");
    for kind in PolicyKind::ALL {
        let best = MultiStartSearch::with_policy(kind).run(&campus)?;
        println!("  {:<24} value {:>5}, {} distinct, {} min, route {:?}",
            kind.name(), best.total_value, best.distinct_points, best.total_time, best.route);
    }

    Ok(())
}

fn compare_policies(
    path: Option<&Path>,
    dir: Option<&Path>,
    budget: Option<u32>,
    output: Option<PathBuf>,
    stats_output: Option<PathBuf>,
    sequential: bool,
) -> Result<()> {
    let mut campuses = match dir {
        Some(dir) => {
            println!("Loading campuses from {:?}...", dir);
            load_instances_from_dir(dir)
        }
        None => vec![load_campus(path)?],
    };

    if campuses.is_empty() {
        return Err(Error::invalid_input("no campus found"));
    }
    for campus in &mut campuses {
        campus.ensure_edges(DEFAULT_TIME_SCALE);
    }
    println!("Comparing policies on {} campus(es)...", campuses.len());

    let config = BenchmarkConfig {
        time_budget: budget,
        parallel: !sequential,
        ..Default::default()
    };
    let mut benchmark = Benchmark::new(config);

    for (i, campus) in campuses.iter().enumerate() {
        println!("[{}/{}] {} (n={})", i + 1, campuses.len(), campus.name, campus.len());
        benchmark.run_policies(campus)?;
    }

    println!("\n{}", benchmark.generate_report());

    if let Some(out_path) = output {
        benchmark.export_to_csv(&out_path)?;
        println!("Results exported to {:?}", out_path);
    }
    if let Some(stats_path) = stats_output {
        benchmark.export_statistics_csv(&stats_path)?;
        println!("Statistics exported to {:?}", stats_path);
    }

    Ok(())
}

fn regenerate_campus(path: &Path, scale: f64, output: &Path) -> Result<()> {
    let config = PlannerConfig { time_scale: scale, ..Default::default() };
    config.validate()?;

    let mut campus = CampusInstance::from_file(path)?;
    let manual = campus.edges().len();
    campus.regenerate_edges(config.time_scale);
    campus.save_json(output)?;

    println!("Replaced {} edges with {} synthesized ones, saved to {:?}", manual, campus.edges().len(), output);
    Ok(())
}
