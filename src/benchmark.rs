//! Policy comparison over one or more campuses.
//!
//! Runs the multi-start search once per selection policy, collects the best
//! tour of each, and summarizes or exports the results.

use crate::error::Result;
use crate::heuristics::{GreedyTourBuilder, MultiStartSearch, Objective, PolicyKind, SelectionPolicy};
use crate::instance::CampusInstance;

use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Best tour of one policy on one campus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyResult {
    /// Policy name
    pub policy: String,
    /// Objective used to rank starts
    pub objective: Objective,
    /// Campus name
    pub campus: String,
    /// Number of points in the campus
    pub num_points: usize,
    /// Budget of the run
    pub time_budget: u32,
    /// Route as `1-2-4-5`
    pub route: String,
    /// Distinct points visited
    pub distinct_points: usize,
    /// Collected value
    pub total_value: u32,
    /// Time used
    pub total_time: u32,
    /// Whether the tour closes at its start
    pub returns_to_start: bool,
    /// Wall time of the multi-start search in seconds
    pub time: f64,
}

/// Aggregated statistics for a policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyStatistics {
    pub policy: String,
    pub num_campuses: usize,
    pub avg_value: f64,
    pub best_value: u32,
    pub std_value: f64,
    /// Mean share of the campus visited, in percent
    pub avg_coverage: f64,
    /// Mean share of the budget used, in percent
    pub avg_budget_use: f64,
    pub avg_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Policies to compare
    pub policies: Vec<PolicyKind>,
    /// Ranking override; by default every policy uses its own objective
    pub objective: Option<Objective>,
    /// Budget override applied to every campus
    pub time_budget: Option<u32>,
    /// Run the policies of a campus in parallel
    pub parallel: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            policies: PolicyKind::ALL.to_vec(),
            objective: None,
            time_budget: None,
            parallel: true,
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<PolicyResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Run every configured policy on a campus
    pub fn run_policies(&mut self, instance: &CampusInstance) -> Result<()> {
        log::info!("Comparing {} policies on {}", self.config.policies.len(), instance.name);

        let budgeted;
        let instance = match self.config.time_budget {
            Some(minutes) => {
                let mut copy = instance.clone();
                copy.set_time_budget(minutes);
                budgeted = copy;
                &budgeted
            }
            None => instance,
        };

        let objective = self.config.objective;
        let results: Result<Vec<PolicyResult>> = if self.config.parallel {
            self.config
                .policies
                .par_iter()
                .map(|&kind| run_policy(instance, kind, objective))
                .collect()
        } else {
            self.config
                .policies
                .iter()
                .map(|&kind| run_policy(instance, kind, objective))
                .collect()
        };

        self.results.extend(results?);
        Ok(())
    }

    /// Run benchmark on multiple campuses
    pub fn run_on_instances(&mut self, instances: &[CampusInstance]) -> Result<()> {
        for instance in instances {
            self.run_policies(instance)?;
        }
        Ok(())
    }

    /// Compute statistics for each policy
    pub fn compute_statistics(&self) -> Vec<PolicyStatistics> {
        use statrs::statistics::Statistics;

        let mut by_policy: HashMap<&str, Vec<&PolicyResult>> = HashMap::new();
        for result in &self.results {
            by_policy.entry(result.policy.as_str()).or_default().push(result);
        }

        let mut statistics: Vec<PolicyStatistics> = by_policy
            .into_iter()
            .map(|(policy, results)| {
                let values: Vec<f64> = results.iter().map(|r| r.total_value as f64).collect();
                let coverage: Vec<f64> = results
                    .iter()
                    .map(|r| percent(r.distinct_points as f64, r.num_points as f64))
                    .collect();
                let budget_use: Vec<f64> = results
                    .iter()
                    .map(|r| percent(r.total_time as f64, r.time_budget as f64))
                    .collect();
                let times: Vec<f64> = results.iter().map(|r| r.time).collect();

                PolicyStatistics {
                    policy: policy.to_string(),
                    num_campuses: results.len(),
                    avg_value: values.iter().mean(),
                    best_value: results.iter().fold(0, |best, r| best.max(r.total_value)),
                    std_value: if values.len() > 1 { values.iter().std_dev() } else { 0.0 },
                    avg_coverage: coverage.iter().mean(),
                    avg_budget_use: budget_use.iter().mean(),
                    avg_time: times.iter().mean(),
                }
            })
            .collect();

        statistics.sort_by_key(|s| std::cmp::Reverse(OrderedFloat(s.avg_value)));
        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("      Campus Tour Policy Report\n");
        report.push_str("========================================\n\n");

        report.push_str("Policy Summary:\n");
        report.push_str("-".repeat(84).as_str());
        report.push('\n');
        report.push_str(&format!("{:<24} {:>8} {:>10} {:>10} {:>10} {:>10} {:>8}\n",
            "Policy", "Campuses", "Avg Value", "Best", "Coverage", "Budget", "Time"));
        report.push_str("-".repeat(84).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!("{:<24} {:>8} {:>10.2} {:>10} {:>9.1}% {:>9.1}% {:>8.4}\n",
                stat.policy,
                stat.num_campuses,
                stat.avg_value,
                stat.best_value,
                stat.avg_coverage,
                stat.avg_budget_use,
                stat.avg_time));
        }

        report.push_str("-".repeat(84).as_str());
        report.push('\n');

        report.push_str("\nBest Tours per Campus:\n");

        let mut campus_best: Vec<(&str, &PolicyResult)> = Vec::new();
        for result in &self.results {
            match campus_best.iter_mut().find(|(name, _)| *name == result.campus) {
                Some(entry) => {
                    let key = |r: &PolicyResult| (r.total_value, r.distinct_points, std::cmp::Reverse(r.total_time));
                    if key(result) > key(entry.1) {
                        entry.1 = result;
                    }
                }
                None => campus_best.push((result.campus.as_str(), result)),
            }
        }

        for (campus, best) in &campus_best {
            report.push_str(&format!("  {}: value {} in {} min via {} ({})\n",
                campus, best.total_value, best.total_time, best.route, best.policy));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[PolicyResult] {
        &self.results
    }
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

fn run_policy(instance: &CampusInstance, kind: PolicyKind, objective: Option<Objective>) -> Result<PolicyResult> {
    let objective = objective.unwrap_or_else(|| kind.default_objective());
    let search = MultiStartSearch::new(GreedyTourBuilder::new(kind), objective);
    let best = search.run(instance)?;

    Ok(PolicyResult {
        policy: kind.name().to_string(),
        objective,
        campus: instance.name.clone(),
        num_points: instance.len(),
        time_budget: instance.time_budget(),
        route: best.route.iter().map(|id| id.to_string()).collect::<Vec<_>>().join("-"),
        distinct_points: best.distinct_points,
        total_value: best.total_value,
        total_time: best.total_time,
        returns_to_start: best.returns_to_start,
        time: best.computation_time,
    })
}

/// Load every `*.json` campus of a directory, smallest first
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Vec<CampusInstance> {
    let mut instances = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match CampusInstance::from_file(&path) {
                    Ok(instance) => instances.push(instance),
                    Err(e) => log::warn!("Skipping {:?}: {}", path, e),
                }
            }
        }
    }

    instances.sort_by_key(|i| i.len());

    instances
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.policies.len(), 3);
        assert!(config.parallel);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let campuses: Vec<CampusInstance> = (0..3).map(|seed| CampusInstance::random(9, seed, 700.0, 500.0, 12, 40)).collect();

        let mut parallel = Benchmark::new(BenchmarkConfig::default());
        parallel.run_on_instances(&campuses).unwrap();
        let mut sequential = Benchmark::new(BenchmarkConfig { parallel: false, ..Default::default() });
        sequential.run_on_instances(&campuses).unwrap();

        assert_eq!(parallel.results().len(), 9);
        for (p, s) in parallel.results().iter().zip(sequential.results()) {
            assert_eq!(p.policy, s.policy);
            assert_eq!(p.route, s.route);
            assert_eq!(p.total_value, s.total_value);
        }
    }

    #[test]
    fn test_sample_campus_report() {
        let mut bench = Benchmark::new(BenchmarkConfig {
            policies: vec![PolicyKind::ValueDensity],
            ..Default::default()
        });
        bench.run_policies(&CampusInstance::sample_campus()).unwrap();

        let result = &bench.results()[0];
        assert_eq!(result.route, "1-2-4-5");
        assert_eq!(result.total_value, 47);

        let stats = bench.compute_statistics();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].best_value, 47);
        assert!((stats[0].avg_coverage - 4.0 / 6.0 * 100.0).abs() < 1e-9);

        let report = bench.generate_report();
        assert!(report.contains("sample-campus: value 47 in 25 min via 1-2-4-5 (ValueDensity)"));
    }

    #[test]
    fn test_budget_override() {
        let mut bench = Benchmark::new(BenchmarkConfig {
            time_budget: Some(0),
            ..Default::default()
        });
        bench.run_policies(&CampusInstance::sample_campus()).unwrap();
        assert!(bench.results().iter().all(|r| r.total_time == 0 && r.distinct_points == 1));
    }
}
