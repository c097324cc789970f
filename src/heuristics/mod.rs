//! Heuristics module for campus tours.
//!
//! This module exports the selection policies, the greedy tour builder and
//! the multi-start search.

pub mod construction;
pub mod multi_start;
pub mod policy;

pub use construction::*;
pub use multi_start::*;
pub use policy::*;
