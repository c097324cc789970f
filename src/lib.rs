//! Campus Tour Library
//!
//! Greedy orienteering heuristics for time-constrained visits of a campus:
//! pick which points of interest to visit, and in which order, so that the
//! tour fits in a time budget and collects as much value (or covers as many
//! points) as possible.
//!
//! # Features
//!
//! - Campus graph with symmetric travel times and JSON interchange
//! - Travel times synthesized from coordinates
//! - Greedy tour builder with pluggable selection policies
//!   (value density, nearest feasible, nearest feasible with return leg)
//! - Multi-start search with progress reporting and cancellation
//! - Run session with snapshot isolation and a single-run guard
//! - Policy comparison with CSV export
//!
//! # Example
//!
//! ```
//! use campus_tour::instance::CampusInstance;
//! use campus_tour::heuristics::{MultiStartSearch, ValueDensity};
//!
//! let campus = CampusInstance::sample_campus();
//! let best = MultiStartSearch::with_policy(ValueDensity).run(&campus).unwrap();
//!
//! assert!(best.total_time <= campus.time_budget());
//! println!("Best tour: {:?} worth {}", best.route, best.total_value);
//! ```

pub mod benchmark;
pub mod config;
pub mod error;
pub mod heuristics;
pub mod instance;
pub mod planner;
pub mod solution;
pub mod synthesis;

pub use config::PlannerConfig;
pub use error::{Error, Result};
pub use instance::{CampusInstance, Point, PointId, TravelEdge};
pub use planner::{RunOutcome, TourPlanner};
pub use solution::Solution;
