//! Selection policies for the greedy tour builder.
//!
//! A policy scores every feasible candidate seen from the current point; the
//! builder keeps the highest score. Policies may also ask the builder to keep
//! enough budget to walk back to the start.

use crate::heuristics::multi_start::Objective;
use crate::instance::Point;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

pub trait SelectionPolicy {
    /// Score of moving to `candidate` in `travel_time` minutes. Higher is better.
    fn score(&self, candidate: &Point, travel_time: u32) -> OrderedFloat<f64>;

    /// Whether a candidate must leave room for the leg back to the start,
    /// and the tour is closed with that leg once no candidate fits.
    fn reserves_return_leg(&self) -> bool {
        false
    }

    /// Objective the multi-start search uses unless told otherwise
    fn default_objective(&self) -> Objective;

    fn name(&self) -> &str;
}

impl<P: SelectionPolicy + ?Sized> SelectionPolicy for Box<P> {
    fn score(&self, candidate: &Point, travel_time: u32) -> OrderedFloat<f64> {
        (**self).score(candidate, travel_time)
    }

    fn reserves_return_leg(&self) -> bool {
        (**self).reserves_return_leg()
    }

    fn default_objective(&self) -> Objective {
        (**self).default_objective()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Value collected per minute walked: `value / (time + 1)`
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueDensity;

impl SelectionPolicy for ValueDensity {
    fn score(&self, candidate: &Point, travel_time: u32) -> OrderedFloat<f64> {
        OrderedFloat(candidate.value_or_unit() as f64 / (travel_time as f64 + 1.0))
    }

    fn default_objective(&self) -> Objective {
        Objective::TotalValue
    }

    fn name(&self) -> &str {
        "ValueDensity"
    }
}

/// Nearest reachable point first, optionally keeping a return leg in reserve
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestFeasible {
    pub reserve_return: bool,
}

impl NearestFeasible {
    pub fn new() -> Self {
        NearestFeasible { reserve_return: false }
    }

    pub fn returning() -> Self {
        NearestFeasible { reserve_return: true }
    }
}

impl SelectionPolicy for NearestFeasible {
    fn score(&self, _candidate: &Point, travel_time: u32) -> OrderedFloat<f64> {
        OrderedFloat(-(travel_time as f64))
    }

    fn reserves_return_leg(&self) -> bool {
        self.reserve_return
    }

    fn default_objective(&self) -> Objective {
        Objective::Coverage
    }

    fn name(&self) -> &str {
        if self.reserve_return {
            "NearestFeasible-Return"
        } else {
            "NearestFeasible"
        }
    }
}

/// Runtime choice between the shipped policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    #[default]
    ValueDensity,
    Nearest,
    NearestReturn,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 3] = [PolicyKind::ValueDensity, PolicyKind::Nearest, PolicyKind::NearestReturn];
}

impl SelectionPolicy for PolicyKind {
    fn score(&self, candidate: &Point, travel_time: u32) -> OrderedFloat<f64> {
        match self {
            PolicyKind::ValueDensity => ValueDensity.score(candidate, travel_time),
            PolicyKind::Nearest => NearestFeasible::new().score(candidate, travel_time),
            PolicyKind::NearestReturn => NearestFeasible::returning().score(candidate, travel_time),
        }
    }

    fn reserves_return_leg(&self) -> bool {
        matches!(self, PolicyKind::NearestReturn)
    }

    fn default_objective(&self) -> Objective {
        match self {
            PolicyKind::ValueDensity => Objective::TotalValue,
            PolicyKind::Nearest | PolicyKind::NearestReturn => Objective::Coverage,
        }
    }

    fn name(&self) -> &str {
        match self {
            PolicyKind::ValueDensity => "ValueDensity",
            PolicyKind::Nearest => "NearestFeasible",
            PolicyKind::NearestReturn => "NearestFeasible-Return",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_density_score() {
        let p = Point::new(1, "p", 0.0, 0.0, Some(10));
        assert_eq!(ValueDensity.score(&p, 4), OrderedFloat(2.0));
        assert_eq!(ValueDensity.score(&p, 0), OrderedFloat(10.0));

        let unvalued = Point::new(2, "q", 0.0, 0.0, None);
        assert_eq!(ValueDensity.score(&unvalued, 1), OrderedFloat(0.5));
    }

    #[test]
    fn test_nearest_prefers_short_legs() {
        let p = Point::new(1, "p", 0.0, 0.0, Some(100));
        let policy = NearestFeasible::new();
        assert!(policy.score(&p, 3) > policy.score(&p, 7));
        assert!(!policy.reserves_return_leg());
        assert!(NearestFeasible::returning().reserves_return_leg());
    }

    #[test]
    fn test_policy_kind_matches_concrete_policies() {
        let p = Point::new(1, "p", 0.0, 0.0, Some(9));
        assert_eq!(PolicyKind::ValueDensity.score(&p, 2), ValueDensity.score(&p, 2));
        assert_eq!(PolicyKind::NearestReturn.name(), NearestFeasible::returning().name());
        assert_eq!(PolicyKind::Nearest.default_objective(), Objective::Coverage);
        assert_eq!(PolicyKind::default(), PolicyKind::ValueDensity);
        let boxed: Box<dyn SelectionPolicy> = Box::new(NearestFeasible::returning());
        assert!(boxed.reserves_return_leg());
    }

    #[test]
    fn test_policy_kind_serde_names() {
        let json = serde_json::to_string(&PolicyKind::NearestReturn).unwrap();
        assert_eq!(json, "\"nearest-return\"");
        let kind: PolicyKind = serde_json::from_str("\"value-density\"").unwrap();
        assert_eq!(kind, PolicyKind::ValueDensity);
    }
}
