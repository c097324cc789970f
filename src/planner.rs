//! Run session over a campus graph.
//!
//! The planner owns the session's graph and hands every run an immutable
//! snapshot of it. Only one run may be active at a time: a second request is
//! answered with [`RunOutcome::Rejected`], and edits are refused until the
//! active run ends.

use crate::config::PlannerConfig;
use crate::error::{Error, Result};
use crate::heuristics::{CandidateProgress, ConstructionHeuristic};
use crate::instance::{CampusInstance, PointId};
use crate::solution::Solution;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of a run request
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The run finished; its solution replaces any previous one
    Completed(Solution),
    /// Another run was active, nothing was done
    Rejected,
    /// The observer cancelled the run, its partial work is discarded
    Abandoned,
}

impl RunOutcome {
    pub fn solution(self) -> Option<Solution> {
        match self {
            RunOutcome::Completed(solution) => Some(solution),
            RunOutcome::Rejected | RunOutcome::Abandoned => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

/// Clears the busy flag when dropped, also on unwind
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct TourPlanner {
    graph: Mutex<Arc<CampusInstance>>,
    busy: AtomicBool,
    config: PlannerConfig,
}

impl TourPlanner {
    /// Start a session. A graph without edges gets the synthesized complete
    /// graph.
    pub fn new(mut instance: CampusInstance, config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        instance.ensure_edges(config.time_scale);
        Ok(TourPlanner {
            graph: Mutex::new(Arc::new(instance)),
            busy: AtomicBool::new(false),
            config,
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Whether a run (or an edit) currently holds the session
    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Current graph, shared and immutable
    pub fn snapshot(&self) -> Arc<CampusInstance> {
        Arc::clone(&self.lock_graph())
    }

    pub fn time_budget(&self) -> u32 {
        self.lock_graph().time_budget()
    }

    fn lock_graph(&self) -> MutexGuard<'_, Arc<CampusInstance>> {
        self.graph.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_acquire(&self) -> Option<RunGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(&self.busy))
    }

    /// Mutate the session graph. Snapshots already handed out keep the old
    /// graph. Fails with [`Error::RunInProgress`] while a run is active.
    pub fn edit<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut CampusInstance) -> T,
    {
        let _guard = self.try_acquire().ok_or(Error::RunInProgress)?;
        let mut graph = self.lock_graph();
        Ok(f(Arc::make_mut(&mut graph)))
    }

    pub fn replace_graph(&self, mut instance: CampusInstance) -> Result<()> {
        instance.ensure_edges(self.config.time_scale);
        self.edit(|graph| *graph = instance)
    }

    pub fn set_time_budget(&self, minutes: u32) -> Result<()> {
        self.edit(|graph| graph.set_time_budget(minutes))
    }

    /// Destructively re-synthesize every edge from coordinates
    pub fn regenerate_edges(&self) -> Result<()> {
        let scale = self.config.time_scale;
        self.edit(|graph| graph.regenerate_edges(scale))
    }

    /// Single-start run from `start`
    pub fn optimize(&self, start: PointId) -> Result<RunOutcome> {
        let Some(_guard) = self.try_acquire() else {
            log::warn!("Ignoring optimize({}): a run is already in progress", start);
            return Ok(RunOutcome::Rejected);
        };
        let graph = self.snapshot();
        let solution = self.config.builder().construct(&graph, start)?;
        log::info!(
            "{} from {}: {:?} (value {}, {} min)",
            solution.algorithm,
            start,
            solution.route,
            solution.total_value,
            solution.total_time
        );
        Ok(RunOutcome::Completed(solution))
    }

    /// Multi-start run over every point. `on_progress` is called after each
    /// start; breaking out of it abandons the run.
    pub fn find_best<F>(&self, on_progress: F) -> Result<RunOutcome>
    where
        F: FnMut(&CandidateProgress<'_>) -> ControlFlow<()>,
    {
        let Some(_guard) = self.try_acquire() else {
            log::warn!("Ignoring find_best(): a run is already in progress");
            return Ok(RunOutcome::Rejected);
        };
        let graph = self.snapshot();
        let outcome = match self.config.search().run_with_progress(&graph, on_progress)? {
            Some(solution) => RunOutcome::Completed(solution),
            None => RunOutcome::Abandoned,
        };
        Ok(outcome)
    }
}
