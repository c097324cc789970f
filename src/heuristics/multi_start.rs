//! Multi-start search: one greedy tour per starting point, keep the best.

use crate::error::Result;
use crate::heuristics::construction::{ConstructionHeuristic, GreedyTourBuilder};
use crate::heuristics::policy::SelectionPolicy;
use crate::instance::{CampusInstance, PointId};
use crate::solution::Solution;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;

/// Rule ranking the tours of a multi-start search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Objective {
    /// Largest summed value of the visited points
    TotalValue,
    /// Most distinct points, then shortest total time. Same order as
    /// `distinct * LARGE - total_time` for any `LARGE` above the budget.
    Coverage,
}

impl Objective {
    /// Ranking key, higher is better
    pub fn key(&self, solution: &Solution) -> (u64, i64) {
        match self {
            Objective::TotalValue => (solution.total_value as u64, 0),
            Objective::Coverage => (solution.distinct_points as u64, -(solution.total_time as i64)),
        }
    }

    /// Strictly better; on equal keys the incumbent stays.
    pub fn is_better(&self, candidate: &Solution, incumbent: &Solution) -> bool {
        self.key(candidate) > self.key(incumbent)
    }
}

/// Snapshot handed to the progress observer after each starting point
#[derive(Debug)]
pub struct CandidateProgress<'a> {
    /// Starting point just evaluated
    pub candidate: PointId,
    /// 1-based position of `candidate`
    pub index: usize,
    /// Number of starting points
    pub total: usize,
    /// Tour built from `candidate`
    pub tour: &'a Solution,
    /// Best tour so far, `tour` included
    pub best: &'a Solution,
}

impl CandidateProgress<'_> {
    pub fn is_new_best(&self) -> bool {
        std::ptr::eq(self.tour, self.best)
    }
}

/// Multi-Start Search
///
/// Runs a construction heuristic from every point of the campus, in point
/// order, and returns the best tour under an [`Objective`].
pub struct MultiStartSearch<H> {
    heuristic: H,
    objective: Objective,
}

impl<P: SelectionPolicy> MultiStartSearch<GreedyTourBuilder<P>> {
    /// Greedy builder over `policy`, ranked by the policy's default objective
    pub fn with_policy(policy: P) -> Self {
        let objective = policy.default_objective();
        MultiStartSearch::new(GreedyTourBuilder::new(policy), objective)
    }
}

impl<H: ConstructionHeuristic> MultiStartSearch<H> {
    pub fn new(heuristic: H, objective: Objective) -> Self {
        MultiStartSearch { heuristic, objective }
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn heuristic(&self) -> &H {
        &self.heuristic
    }

    /// Run every start without observing progress
    pub fn run(&self, instance: &CampusInstance) -> Result<Solution> {
        let best = self.run_with_progress(instance, |_| ControlFlow::Continue(()))?;
        Ok(best.unwrap_or_default())
    }

    /// Run every start, calling `on_progress` after each one. Returning
    /// `ControlFlow::Break` from the observer abandons the run: the result
    /// is `Ok(None)` and nothing evaluated so far is returned.
    pub fn run_with_progress<F>(&self, instance: &CampusInstance, mut on_progress: F) -> Result<Option<Solution>>
    where
        F: FnMut(&CandidateProgress<'_>) -> ControlFlow<()>,
    {
        let timer = std::time::Instant::now();
        let starts: Vec<PointId> = instance.point_ids().collect();
        let total = starts.len();

        let mut best: Option<Solution> = None;

        for (i, &start) in starts.iter().enumerate() {
            let tour = self.heuristic.construct(instance, start)?;
            let improved = best.as_ref().map_or(true, |b| self.objective.is_better(&tour, b));
            log::debug!(
                "[{}/{}] start {}: {} stops, value {}, {} min{}",
                i + 1,
                total,
                start,
                tour.route.len(),
                tour.total_value,
                tour.total_time,
                if improved { " (new best)" } else { "" }
            );

            let flow = {
                let incumbent = match &best {
                    Some(b) if !improved => b,
                    _ => &tour,
                };
                on_progress(&CandidateProgress {
                    candidate: start,
                    index: i + 1,
                    total,
                    tour: &tour,
                    best: incumbent,
                })
            };
            if flow.is_break() {
                log::info!("{} search abandoned after {}/{} starts", self.heuristic.name(), i + 1, total);
                return Ok(None);
            }

            if improved {
                best = Some(tour);
            }
        }

        let mut best = best.unwrap_or_default();
        if best.algorithm.is_empty() {
            best.algorithm = self.heuristic.name().to_string();
        }
        best.starts_evaluated = Some(total);
        best.computation_time = timer.elapsed().as_secs_f64();

        log::info!(
            "{} best tour over {} starts: {:?} (value {}, {} min)",
            best.algorithm,
            total,
            best.route,
            best.total_value,
            best.total_time
        );
        Ok(Some(best))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::policy::{NearestFeasible, PolicyKind, ValueDensity};
    use crate::instance::Point;
    use crate::synthesis::{synthesize_edges, DEFAULT_TIME_SCALE};

    fn line_campus(budget: u32) -> CampusInstance {
        let points = vec![
            Point::new(1, "A", 0.0, 0.0, None),
            Point::new(2, "B", 100.0, 0.0, None),
            Point::new(3, "C", 300.0, 0.0, None),
        ];
        let edges = synthesize_edges(&points, DEFAULT_TIME_SCALE);
        CampusInstance::new("line", points, edges, budget)
    }

    fn tour(distinct: usize, value: u32, time: u32) -> Solution {
        Solution {
            route: vec![1],
            distinct_points: distinct,
            total_value: value,
            total_time: time,
            ..Solution::empty()
        }
    }

    #[test]
    fn test_objective_ordering() {
        assert!(Objective::TotalValue.is_better(&tour(1, 10, 50), &tour(3, 9, 1)));
        assert!(!Objective::TotalValue.is_better(&tour(4, 10, 1), &tour(1, 10, 50)));
        assert!(Objective::Coverage.is_better(&tour(3, 0, 50), &tour(2, 99, 1)));
        assert!(Objective::Coverage.is_better(&tour(3, 0, 10), &tour(3, 0, 11)));
        assert!(!Objective::Coverage.is_better(&tour(3, 0, 10), &tour(3, 0, 10)));
    }

    #[test]
    fn test_sample_campus_best_tour() {
        let campus = CampusInstance::sample_campus();
        let best = MultiStartSearch::with_policy(ValueDensity).run(&campus).unwrap();
        // starts 1, 2 and 4 all reach 47; the first one is kept
        assert_eq!(best.route, vec![1, 2, 4, 5]);
        assert_eq!(best.leg_times, vec![8, 9, 8]);
        assert_eq!(best.total_time, 25);
        assert_eq!(best.total_value, 47);
        assert_eq!(best.starts_evaluated, Some(6));
    }

    #[test]
    fn test_coverage_prefers_shorter_full_tour() {
        let campus = line_campus(100);
        let search = MultiStartSearch::with_policy(NearestFeasible::new());
        assert_eq!(search.objective(), Objective::Coverage);
        let best = search.run(&campus).unwrap();
        // A: 5 + 10, B: 5 + 15, C: 10 + 5. A and C tie, A comes first.
        assert_eq!(best.route, vec![1, 2, 3]);
        assert_eq!(best.total_time, 15);
        assert_eq!(best.distinct_points, 3);
    }

    #[test]
    fn test_best_dominates_every_single_start() {
        for seed in 0..10 {
            let campus = CampusInstance::random(10, seed, 700.0, 500.0, 15, 25 + seed as u32 * 3);
            for kind in PolicyKind::ALL {
                let search = MultiStartSearch::with_policy(kind);
                let best = search.run(&campus).unwrap();
                let builder = GreedyTourBuilder::new(kind);
                for start in campus.point_ids() {
                    let single = builder.construct(&campus, start).unwrap();
                    assert!(
                        !search.objective().is_better(&single, &best),
                        "seed {} policy {:?} start {}",
                        seed,
                        kind,
                        start
                    );
                }
                assert!(best.is_within_budget(campus.time_budget()));
            }
        }
    }

    #[test]
    fn test_progress_reports_every_start() {
        let campus = CampusInstance::sample_campus();
        let mut seen = Vec::new();
        let best = MultiStartSearch::with_policy(ValueDensity)
            .run_with_progress(&campus, |p| {
                assert_eq!(p.total, 6);
                assert_eq!(p.tour.start(), Some(p.candidate));
                assert!(p.best.total_value >= p.tour.total_value);
                seen.push((p.index, p.candidate, p.is_new_best()));
                ControlFlow::Continue(())
            })
            .unwrap()
            .unwrap();
        let indexes: Vec<usize> = seen.iter().map(|s| s.0).collect();
        let candidates: Vec<PointId> = seen.iter().map(|s| s.1).collect();
        assert_eq!(indexes, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(candidates, vec![1, 2, 3, 4, 5, 6]);
        // only the first start ever improves the incumbent
        assert_eq!(seen.iter().filter(|s| s.2).count(), 1);
        assert_eq!(best.route[0], 1);
    }

    #[test]
    fn test_abandoned_run_publishes_nothing() {
        let campus = CampusInstance::sample_campus();
        let mut calls = 0;
        let result = MultiStartSearch::with_policy(ValueDensity)
            .run_with_progress(&campus, |p| {
                calls += 1;
                if p.index == 2 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
            })
            .unwrap();
        assert!(result.is_none());
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_empty_campus() {
        let campus = CampusInstance::new("empty", Vec::new(), Vec::new(), 30);
        let best = MultiStartSearch::with_policy(ValueDensity).run(&campus).unwrap();
        assert!(best.is_empty());
        assert_eq!(best.total_time, 0);
        assert_eq!(best.starts_evaluated, Some(0));
    }

    #[test]
    fn test_objective_override() {
        let campus = CampusInstance::sample_campus();
        let search = MultiStartSearch::with_policy(ValueDensity).with_objective(Objective::Coverage);
        let best = search.run(&campus).unwrap();
        assert_eq!(best.distinct_points, 4);
        assert_eq!(best.total_time, 25);
    }
}
