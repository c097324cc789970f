//! Tour representation handed to callers.
//!
//! A [`Solution`] is built leg by leg by the tour builder and then
//! serialized, printed or rendered by the host. It carries the ordered
//! route, the time of every leg and the collected value.

use crate::instance::{CampusInstance, PointId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A tour over the campus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Visited points, starting point first
    pub route: Vec<PointId>,
    /// Travel time of every leg, `route.len() - 1` entries
    pub leg_times: Vec<u32>,
    /// Sum of `leg_times`
    pub total_time: u32,
    /// Sum of the values of the distinct visited points, start included
    pub total_value: u32,
    /// Number of distinct visited points
    pub distinct_points: usize,
    /// Whether the last leg returns to the starting point
    pub returns_to_start: bool,
    /// Policy that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of starting points tried (multi-start only)
    pub starts_evaluated: Option<usize>,
}

impl Solution {
    /// The empty tour, produced for a campus without points
    pub fn empty() -> Self {
        Solution {
            route: Vec::new(),
            leg_times: Vec::new(),
            total_time: 0,
            total_value: 0,
            distinct_points: 0,
            returns_to_start: false,
            algorithm: String::new(),
            computation_time: 0.0,
            starts_evaluated: None,
        }
    }

    /// The tour that never leaves `start`
    pub fn degenerate(instance: &CampusInstance, start: PointId) -> Self {
        Solution {
            route: vec![start],
            total_value: instance.value_of(start),
            distinct_points: 1,
            ..Solution::empty()
        }
    }

    /// Append a leg ending at `point`. Coming back to the start closes the
    /// tour and collects nothing.
    pub fn push_leg(&mut self, instance: &CampusInstance, point: PointId, time: u32) {
        if self.start() == Some(point) {
            self.returns_to_start = true;
        } else {
            self.total_value = self.total_value.saturating_add(instance.value_of(point));
            self.distinct_points += 1;
        }
        self.route.push(point);
        self.leg_times.push(time);
        self.total_time += time;
    }

    pub fn start(&self) -> Option<PointId> {
        self.route.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.route.is_empty()
    }

    pub fn visits(&self, point: PointId) -> bool {
        self.route.contains(&point)
    }

    /// Elapsed time on arrival at each route position
    pub fn cumulative_times(&self) -> Vec<u32> {
        let mut elapsed = 0;
        let mut times = Vec::with_capacity(self.route.len());
        if !self.route.is_empty() {
            times.push(0);
        }
        for &leg in &self.leg_times {
            elapsed += leg;
            times.push(elapsed);
        }
        times
    }

    /// Every prefix of the tour fits in `budget`
    pub fn is_within_budget(&self, budget: u32) -> bool {
        self.cumulative_times().iter().all(|&t| t <= budget)
    }

    /// Whether a point is visited twice, not counting a final return leg
    pub fn has_repeated_points(&self) -> bool {
        let body = if self.returns_to_start {
            &self.route[..self.route.len() - 1]
        } else {
            &self.route[..]
        };
        let unique: HashSet<PointId> = body.iter().copied().collect();
        unique.len() != body.len()
    }

    /// Human readable itinerary, one line per stop
    pub fn describe(&self, instance: &CampusInstance) -> Vec<String> {
        self.route
            .iter()
            .zip(self.cumulative_times())
            .enumerate()
            .map(|(i, (&id, elapsed))| {
                let name = instance.point(id).map(|p| p.name.as_str()).unwrap_or("?");
                format!("{}. {} [{}] at {} min", i + 1, name, id, elapsed)
            })
            .collect()
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Stops: {} ({} distinct)", self.route.len(), self.distinct_points)?;
        writeln!(f, "  Total time: {} min", self.total_time)?;
        writeln!(f, "  Total value: {}", self.total_value)?;
        writeln!(f, "  Returns to start: {}", self.returns_to_start)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(starts) = self.starts_evaluated {
            writeln!(f, "  Starts evaluated: {}", starts)?;
        }
        writeln!(f, "  Route: {:?}", self.route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Point, TravelEdge};

    fn triangle() -> CampusInstance {
        let points = vec![
            Point::new(1, "A", 0.0, 0.0, Some(3)),
            Point::new(2, "B", 0.0, 0.0, Some(4)),
            Point::new(3, "C", 0.0, 0.0, Some(5)),
        ];
        let edges = vec![TravelEdge::new(1, 2, 2), TravelEdge::new(2, 3, 3), TravelEdge::new(1, 3, 4)];
        CampusInstance::new("triangle", points, edges, 20)
    }

    #[test]
    fn test_solution_creation() {
        let sol = Solution::empty();
        assert!(sol.is_empty());
        assert_eq!(sol.total_time, 0);
        assert!(sol.cumulative_times().is_empty());
    }

    #[test]
    fn test_push_legs_and_return() {
        let campus = triangle();
        let mut sol = Solution::degenerate(&campus, 1);
        assert_eq!(sol.total_value, 3);
        sol.push_leg(&campus, 2, 2);
        sol.push_leg(&campus, 3, 3);
        sol.push_leg(&campus, 1, 4);

        assert_eq!(sol.route, vec![1, 2, 3, 1]);
        assert_eq!(sol.leg_times, vec![2, 3, 4]);
        assert_eq!(sol.total_time, 9);
        assert_eq!(sol.total_value, 12);
        assert_eq!(sol.distinct_points, 3);
        assert!(sol.returns_to_start);
        assert!(!sol.has_repeated_points());
        assert_eq!(sol.cumulative_times(), vec![0, 2, 5, 9]);
        assert!(sol.is_within_budget(9));
        assert!(!sol.is_within_budget(8));
    }

    #[test]
    fn test_repeated_point_detection() {
        let sol = Solution {
            route: vec![1, 2, 1, 3],
            leg_times: vec![1, 1, 1],
            total_time: 3,
            ..Solution::empty()
        };
        assert!(sol.has_repeated_points());
    }

    #[test]
    fn test_describe() {
        let campus = triangle();
        let mut sol = Solution::degenerate(&campus, 2);
        sol.push_leg(&campus, 3, 3);
        assert_eq!(sol.describe(&campus), vec!["1. B [2] at 0 min", "2. C [3] at 3 min"]);
    }
}
