//! Planner configuration.

use crate::error::{Error, Result};
use crate::heuristics::{GreedyTourBuilder, MultiStartSearch, Objective, PolicyKind, SelectionPolicy};
use crate::synthesis::DEFAULT_TIME_SCALE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings shared by every run of a [`crate::planner::TourPlanner`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Selection policy of the greedy builder
    pub policy: PolicyKind,
    /// Ranking of multi-start tours; defaults to the policy's own objective
    pub objective: Option<Objective>,
    /// Canvas units per minute used when synthesizing travel times
    pub time_scale: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            policy: PolicyKind::ValueDensity,
            objective: None,
            time_scale: DEFAULT_TIME_SCALE,
        }
    }
}

impl PlannerConfig {
    pub fn with_policy(policy: PolicyKind) -> Self {
        PlannerConfig { policy, ..Default::default() }
    }

    /// Read a JSON configuration; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: PlannerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(Error::invalid_input(format!(
                "time scale must be a positive number, got {}",
                self.time_scale
            )));
        }
        Ok(())
    }

    /// Objective actually used by the multi-start search
    pub fn objective(&self) -> Objective {
        self.objective.unwrap_or_else(|| self.policy.default_objective())
    }

    pub fn builder(&self) -> GreedyTourBuilder<PolicyKind> {
        GreedyTourBuilder::new(self.policy)
    }

    pub fn search(&self) -> MultiStartSearch<GreedyTourBuilder<PolicyKind>> {
        MultiStartSearch::new(self.builder(), self.objective())
    }
}
