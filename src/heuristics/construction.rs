use crate::error::{Error, Result};
use crate::heuristics::policy::SelectionPolicy;
use crate::instance::{CampusInstance, PointId};
use crate::solution::Solution;
use ordered_float::OrderedFloat;
use std::collections::HashSet;

pub trait ConstructionHeuristic {
    /// Build one tour leaving from `start`, within the instance's time budget
    fn construct(&self, instance: &CampusInstance, start: PointId) -> Result<Solution>;
    fn name(&self) -> &str;
}

/// Greedy Tour Builder
///
/// Starting from a single point, repeatedly walks to the best-scoring
/// unvisited point whose leg still fits in the remaining budget, until no
/// point fits. Scores come from the selection policy. When several
/// candidates share the best score, the first one in the campus's point
/// order wins; this order carries no meaning of its own, the rule only keeps
/// results reproducible.
pub struct GreedyTourBuilder<P> {
    pub policy: P,
}

impl<P: SelectionPolicy> GreedyTourBuilder<P> {
    pub fn new(policy: P) -> Self {
        GreedyTourBuilder { policy }
    }

    /// Best feasible next stop and its leg time
    fn find_next(
        &self,
        instance: &CampusInstance,
        start: PointId,
        current: PointId,
        elapsed: u64,
        visited: &HashSet<PointId>,
    ) -> Option<(PointId, u32)> {
        let budget = instance.time_budget() as u64;
        let mut best: Option<(PointId, u32)> = None;
        let mut best_score = OrderedFloat(f64::NEG_INFINITY);

        for candidate in instance.points() {
            if visited.contains(&candidate.id) {
                continue;
            }
            let Some(travel) = instance.edge_time(current, candidate.id) else {
                continue;
            };

            let mut needed = elapsed + travel as u64;
            if self.policy.reserves_return_leg() {
                let Some(back) = instance.edge_time(candidate.id, start) else {
                    continue;
                };
                needed += back as u64;
            }
            if needed > budget {
                continue;
            }

            let score = self.policy.score(candidate, travel);
            if best.is_none() || score > best_score {
                best_score = score;
                best = Some((candidate.id, travel));
            }
        }

        best
    }
}

impl<P: SelectionPolicy> ConstructionHeuristic for GreedyTourBuilder<P> {
    fn construct(&self, instance: &CampusInstance, start: PointId) -> Result<Solution> {
        let timer = std::time::Instant::now();
        if !instance.contains(start) {
            return Err(Error::UnknownPoint(start));
        }

        let budget = instance.time_budget() as u64;
        let mut solution = Solution::degenerate(instance, start);
        solution.algorithm = self.name().to_string();
        // A zero budget is exhausted from the start, even for zero-minute legs.
        if budget == 0 {
            solution.computation_time = timer.elapsed().as_secs_f64();
            return Ok(solution);
        }

        let mut visited = HashSet::new();
        visited.insert(start);

        let mut current = start;
        let mut elapsed = 0u64;

        while let Some((next, travel)) = self.find_next(instance, start, current, elapsed, &visited) {
            log::trace!("{}: {} -> {} ({} min, {} elapsed)", self.name(), current, next, travel, elapsed + travel as u64);
            solution.push_leg(instance, next, travel);
            visited.insert(next);
            elapsed += travel as u64;
            current = next;
        }

        if self.policy.reserves_return_leg() && current != start {
            if let Some(back) = instance.edge_time(current, start) {
                if elapsed + back as u64 <= budget {
                    solution.push_leg(instance, start, back);
                }
            }
        }

        solution.computation_time = timer.elapsed().as_secs_f64();
        Ok(solution)
    }

    fn name(&self) -> &str {
        self.policy.name()
    }
}
