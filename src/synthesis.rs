//! Travel times derived from point coordinates.
//!
//! Every unordered pair of points gets `round(distance / scale)` minutes,
//! which yields a complete graph.

use crate::instance::{CampusInstance, Point, TravelEdge};

/// Canvas units per minute of walking.
pub const DEFAULT_TIME_SCALE: f64 = 20.0;

#[inline]
pub fn euclidean_distance(a: &Point, b: &Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Synthesized travel time, rounded half away from zero
#[inline]
pub fn travel_time(a: &Point, b: &Point, scale: f64) -> u32 {
    (euclidean_distance(a, b) / scale).round() as u32
}

/// One edge per unordered pair, in `(i, j)` order with `i < j`
pub fn synthesize_edges(points: &[Point], scale: f64) -> Vec<TravelEdge> {
    let n = points.len();
    let mut edges = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in i + 1..n {
            edges.push(TravelEdge::new(points[i].id, points[j].id, travel_time(&points[i], &points[j], scale)));
        }
    }
    edges
}

impl CampusInstance {
    /// Synthesize the complete graph if no edge is stored yet.
    /// Returns whether edges were generated.
    pub fn ensure_edges(&mut self, scale: f64) -> bool {
        if !self.edges().is_empty() {
            return false;
        }
        self.regenerate_edges(scale);
        true
    }

    /// Discard every stored edge, manual edits included, and replace them
    /// with the synthesized complete graph.
    pub fn regenerate_edges(&mut self, scale: f64) {
        let edges = synthesize_edges(self.points(), scale);
        log::info!("Regenerated {} edges for {} points (scale {})", edges.len(), self.len(), scale);
        self.replace_edges(edges);
    }
}
