//! Campus graph model: points of interest and the travel times between them.
//!
//! A [`CampusInstance`] is the read-only input of every engine call. Travel
//! times are stored once per unordered pair and looked up symmetrically; a
//! pair without an edge is unreachable and reported as `None`.
//!
//! Instances are exchanged as JSON payloads of the form
//! `{"points": [...], "edges": [...], "timeBudget": n}`. The keys `nodes` and
//! `timeLimit` are accepted as aliases.

use crate::error::{Error, Result};
use crate::synthesis::{synthesize_edges, DEFAULT_TIME_SCALE};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Identifier of a point of interest.
pub type PointId = u32;

/// Budget used when a payload does not carry one.
pub const DEFAULT_TIME_BUDGET: u32 = 30;

/// A point of interest on the campus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Unique identifier
    pub id: PointId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// X coordinate, only used to synthesize travel times
    pub x: f64,
    /// Y coordinate, only used to synthesize travel times
    pub y: f64,
    /// Value collected when visiting. `None` in coverage-only campuses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
}

impl Point {
    pub fn new(id: PointId, name: impl Into<String>, x: f64, y: f64, value: Option<u32>) -> Self {
        Point { id, name: name.into(), x, y, value }
    }

    /// Value of a visit; a point without a value counts as one.
    #[inline]
    pub fn value_or_unit(&self) -> u32 {
        self.value.unwrap_or(1)
    }
}

/// Travel time in minutes between two points, valid in both directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelEdge {
    pub from: PointId,
    pub to: PointId,
    pub time: u32,
}

impl TravelEdge {
    pub fn new(from: PointId, to: PointId, time: u32) -> Self {
        TravelEdge { from, to, time }
    }

    /// Whether this edge connects `a` and `b`, in either direction.
    pub fn connects(&self, a: PointId, b: PointId) -> bool {
        pair_key(self.from, self.to) == pair_key(a, b)
    }
}

/// Interchange payload, the on-disk shape of a campus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampusPayload {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(alias = "nodes")]
    pub points: Vec<Point>,
    #[serde(default)]
    pub edges: Vec<TravelEdge>,
    #[serde(
        rename = "timeBudget",
        alias = "timeLimit",
        default = "default_time_budget",
        deserialize_with = "deserialize_budget"
    )]
    pub time_budget: u32,
}

fn default_time_budget() -> u32 {
    DEFAULT_TIME_BUDGET
}

/// Budgets are whole minutes. Negative or non-finite budgets collapse to the
/// exhausted budget `0`; fractional ones are truncated.
fn deserialize_budget<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw <= 0.0 {
        return Ok(0);
    }
    Ok(raw.min(u32::MAX as f64) as u32)
}

#[inline]
fn pair_key(a: PointId, b: PointId) -> (PointId, PointId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// A campus: points, travel times and the time budget of a tour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "CampusPayload", into = "CampusPayload")]
pub struct CampusInstance {
    /// Name of the campus
    pub name: String,
    points: Vec<Point>,
    edges: Vec<TravelEdge>,
    time_budget: u32,
    /// Unordered pair -> position in `edges`
    edge_index: HashMap<(PointId, PointId), usize>,
}

impl From<CampusPayload> for CampusInstance {
    fn from(payload: CampusPayload) -> Self {
        CampusInstance::new(payload.name, payload.points, payload.edges, payload.time_budget)
    }
}

impl From<CampusInstance> for CampusPayload {
    fn from(instance: CampusInstance) -> Self {
        CampusPayload {
            name: instance.name,
            points: instance.points,
            edges: instance.edges,
            time_budget: instance.time_budget,
        }
    }
}

impl CampusInstance {
    /// Build an instance from explicit edges. No edge is synthesized here;
    /// see [`CampusInstance::ensure_edges`]. When several edges name the same
    /// unordered pair the last one wins.
    pub fn new(name: impl Into<String>, points: Vec<Point>, edges: Vec<TravelEdge>, time_budget: u32) -> Self {
        let mut instance = CampusInstance {
            name: name.into(),
            points,
            edges: Vec::with_capacity(edges.len()),
            time_budget,
            edge_index: HashMap::new(),
        };
        instance.replace_edges(edges);
        instance
    }

    /// Parse an interchange payload
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load an interchange payload from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path)?;
        let mut instance = Self::from_json_str(&text)?;
        if instance.name.is_empty() {
            instance.name = path
                .as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(instance)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn edges(&self) -> &[TravelEdge] {
        &self.edges
    }

    pub fn time_budget(&self) -> u32 {
        self.time_budget
    }

    pub fn set_time_budget(&mut self, minutes: u32) {
        self.time_budget = minutes;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point identifiers in enumeration order. Greedy ties are broken by
    /// this order.
    pub fn point_ids(&self) -> impl Iterator<Item = PointId> + '_ {
        self.points.iter().map(|p| p.id)
    }

    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.point(id).is_some()
    }

    /// Value of visiting `id`; unknown points are worth nothing.
    pub fn value_of(&self, id: PointId) -> u32 {
        self.point(id).map(Point::value_or_unit).unwrap_or(0)
    }

    /// Travel time between two points in either direction, `None` when no
    /// edge connects them.
    #[inline]
    pub fn edge_time(&self, a: PointId, b: PointId) -> Option<u32> {
        if a == b {
            return None;
        }
        self.edge_index
            .get(&pair_key(a, b))
            .map(|&pos| self.edges[pos].time)
    }

    /// Total time of a route, `None` if some leg is unreachable
    pub fn route_time(&self, route: &[PointId]) -> Option<u32> {
        route
            .windows(2)
            .try_fold(0u32, |acc, leg| acc.checked_add(self.edge_time(leg[0], leg[1])?))
    }

    /// Set the travel time of an unordered pair, replacing any previous edge.
    pub fn set_edge(&mut self, a: PointId, b: PointId, time: u32) -> Result<()> {
        if a == b {
            return Err(Error::SelfEdge(a));
        }
        for id in [a, b] {
            if !self.contains(id) {
                return Err(Error::UnknownPoint(id));
            }
        }
        self.upsert_edge(TravelEdge::new(a, b, time));
        Ok(())
    }

    /// Remove the edge of an unordered pair. Returns whether one existed.
    pub fn remove_edge(&mut self, a: PointId, b: PointId) -> bool {
        let before = self.edges.len();
        let kept: Vec<TravelEdge> = self.edges.iter().copied().filter(|e| !e.connects(a, b)).collect();
        if kept.len() == before {
            return false;
        }
        self.replace_edges(kept);
        true
    }

    /// Replace every stored edge
    pub fn replace_edges(&mut self, edges: Vec<TravelEdge>) {
        self.edges.clear();
        self.edge_index.clear();
        for edge in edges {
            if edge.from == edge.to {
                log::warn!("Ignoring self edge on point {}", edge.from);
                continue;
            }
            self.upsert_edge(edge);
        }
    }

    fn upsert_edge(&mut self, edge: TravelEdge) {
        let key = pair_key(edge.from, edge.to);
        match self.edge_index.get(&key) {
            Some(&pos) => self.edges[pos] = edge,
            None => {
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(edge);
            }
        }
    }

    /// Smallest identifier not used by any point
    pub fn next_point_id(&self) -> PointId {
        self.points.iter().map(|p| p.id).max().map_or(1, |m| m + 1)
    }

    pub fn add_point(&mut self, point: Point) -> Result<()> {
        if self.contains(point.id) {
            return Err(Error::DuplicatePoint(point.id));
        }
        self.points.push(point);
        Ok(())
    }

    /// Remove a point together with every edge touching it
    pub fn remove_point(&mut self, id: PointId) -> Result<Point> {
        let pos = self
            .points
            .iter()
            .position(|p| p.id == id)
            .ok_or(Error::UnknownPoint(id))?;
        let removed = self.points.remove(pos);
        let kept: Vec<TravelEdge> = self
            .edges
            .iter()
            .copied()
            .filter(|e| e.from != id && e.to != id)
            .collect();
        self.replace_edges(kept);
        Ok(removed)
    }

    pub fn rename_point(&mut self, id: PointId, name: impl Into<String>) -> Result<()> {
        self.point_mut(id)?.name = name.into();
        Ok(())
    }

    pub fn set_point_value(&mut self, id: PointId, value: Option<u32>) -> Result<()> {
        self.point_mut(id)?.value = value;
        Ok(())
    }

    fn point_mut(&mut self, id: PointId) -> Result<&mut Point> {
        self.points
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(Error::UnknownPoint(id))
    }

    /// The six-point demo campus, with synthesized travel times and a
    /// 30 minute budget.
    pub fn sample_campus() -> Self {
        let points = vec![
            Point::new(1, "Main Entrance", 100.0, 200.0, Some(10)),
            Point::new(2, "Library", 250.0, 150.0, Some(15)),
            Point::new(3, "Cafeteria", 400.0, 180.0, Some(8)),
            Point::new(4, "Computer Lab", 350.0, 300.0, Some(12)),
            Point::new(5, "Auditorium", 200.0, 350.0, Some(10)),
            Point::new(6, "Gym", 500.0, 250.0, Some(7)),
        ];
        let edges = synthesize_edges(&points, DEFAULT_TIME_SCALE);
        CampusInstance::new("sample-campus", points, edges, DEFAULT_TIME_BUDGET)
    }

    /// Random campus on a `width` x `height` canvas with a complete
    /// synthesized graph. Deterministic via seed. With `max_value == 0` the
    /// points carry no value (coverage campus).
    pub fn random(num_points: usize, seed: u64, width: f64, height: f64, max_value: u32, time_budget: u32) -> Self {
        use rand::prelude::*;
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let points: Vec<Point> = (1..=num_points as PointId)
            .map(|id| {
                let x = rng.gen_range(0.0..width.max(1.0));
                let y = rng.gen_range(0.0..height.max(1.0));
                let value = (max_value > 0).then(|| rng.gen_range(1..=max_value));
                Point::new(id, format!("Place {}", id), x, y, value)
            })
            .collect();
        let edges = synthesize_edges(&points, DEFAULT_TIME_SCALE);
        CampusInstance::new(format!("random-{}-{}", num_points, seed), points, edges, time_budget)
    }

    /// Get statistics about the campus
    pub fn statistics(&self) -> InstanceStatistics {
        use statrs::statistics::Statistics;

        let times: Vec<f64> = self.edges.iter().map(|e| e.time as f64).collect();
        let (avg_time, std_time) = match times.len() {
            0 => (0.0, 0.0),
            1 => (times[0], 0.0),
            _ => (times.iter().mean(), times.iter().std_dev()),
        };
        let min_time = times.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_time = times.iter().cloned().fold(0.0, f64::max);

        let mut unreachable_pairs = 0;
        for (i, a) in self.points.iter().enumerate() {
            for b in &self.points[i + 1..] {
                if self.edge_time(a.id, b.id).is_none() {
                    unreachable_pairs += 1;
                }
            }
        }

        InstanceStatistics {
            name: self.name.clone(),
            num_points: self.points.len(),
            num_edges: self.edges.len(),
            unreachable_pairs,
            valued_points: self.points.iter().filter(|p| p.value.is_some()).count(),
            total_value: self.points.iter().map(|p| p.value_or_unit() as u64).sum(),
            time_budget: self.time_budget,
            avg_time,
            std_time,
            min_time: if times.is_empty() { 0.0 } else { min_time },
            max_time,
        }
    }
}

/// Statistics about a campus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_points: usize,
    pub num_edges: usize,
    pub unreachable_pairs: usize,
    pub valued_points: usize,
    pub total_value: u64,
    pub time_budget: u32,
    pub avg_time: f64,
    pub std_time: f64,
    pub min_time: f64,
    pub max_time: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Campus: {}", self.name)?;
        writeln!(f, "  Points: {} ({} with a value)", self.num_points, self.valued_points)?;
        writeln!(f, "  Edges: {} ({} unreachable pairs)", self.num_edges, self.unreachable_pairs)?;
        writeln!(f, "  Total value: {}", self.total_value)?;
        writeln!(f, "  Time budget: {} min", self.time_budget)?;
        writeln!(f, "  Travel time: avg {:.2}, std {:.2}, min {:.0}, max {:.0}",
            self.avg_time, self.std_time, self.min_time, self.max_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_campus() -> CampusInstance {
        let points = vec![
            Point::new(1, "A", 0.0, 0.0, Some(1)),
            Point::new(2, "B", 0.0, 0.0, Some(2)),
            Point::new(3, "C", 0.0, 0.0, None),
        ];
        let edges = vec![TravelEdge::new(1, 2, 4), TravelEdge::new(3, 2, 6)];
        CampusInstance::new("line", points, edges, 10)
    }

    #[test]
    fn test_edge_lookup_is_symmetric() {
        let campus = line_campus();
        for a in campus.point_ids() {
            for b in campus.point_ids() {
                assert_eq!(campus.edge_time(a, b), campus.edge_time(b, a));
            }
        }
        assert_eq!(campus.edge_time(2, 3), Some(6));
        assert_eq!(campus.edge_time(1, 3), None);
        assert_eq!(campus.edge_time(1, 1), None);
    }

    #[test]
    fn test_last_write_wins() {
        let mut campus = line_campus();
        campus.set_edge(2, 1, 9).unwrap();
        assert_eq!(campus.edge_time(1, 2), Some(9));
        assert_eq!(campus.edges().len(), 2);

        let dup = CampusInstance::new(
            "dup",
            line_campus().points().to_vec(),
            vec![TravelEdge::new(1, 2, 4), TravelEdge::new(2, 1, 7)],
            10,
        );
        assert_eq!(dup.edge_time(1, 2), Some(7));
        assert_eq!(dup.edges().len(), 1);
    }

    #[test]
    fn test_set_edge_rejects_bad_pairs() {
        let mut campus = line_campus();
        assert!(matches!(campus.set_edge(1, 1, 3), Err(Error::SelfEdge(1))));
        assert!(matches!(campus.set_edge(1, 42, 3), Err(Error::UnknownPoint(42))));
    }

    #[test]
    fn test_remove_point_drops_incident_edges() {
        let mut campus = line_campus();
        let removed = campus.remove_point(2).unwrap();
        assert_eq!(removed.name, "B");
        assert!(campus.edges().is_empty());
        assert_eq!(campus.edge_time(1, 2), None);
        assert!(campus.remove_point(2).is_err());
        assert_eq!(campus.next_point_id(), 4);
    }

    #[test]
    fn test_remove_edge() {
        let mut campus = line_campus();
        assert!(campus.remove_edge(2, 1));
        assert!(!campus.remove_edge(2, 1));
        assert_eq!(campus.edge_time(1, 2), None);
        assert_eq!(campus.edge_time(3, 2), Some(6));
    }

    #[test]
    fn test_point_editing() {
        let mut campus = line_campus();
        campus.rename_point(3, "Cafeteria").unwrap();
        campus.set_point_value(3, Some(5)).unwrap();
        assert_eq!(campus.point(3).unwrap().name, "Cafeteria");
        assert_eq!(campus.value_of(3), 5);
        assert!(matches!(
            campus.add_point(Point::new(1, "again", 0.0, 0.0, None)),
            Err(Error::DuplicatePoint(1))
        ));
    }

    #[test]
    fn test_payload_aliases_and_budget_clamp() {
        let json = r#"{
            "nodes": [
                {"id": 1, "name": "Gate", "x": 0, "y": 0, "value": 10},
                {"id": 2, "name": "Hall", "x": 100, "y": 0}
            ],
            "edges": [{"from": 2, "to": 1, "time": 5}],
            "timeLimit": -4
        }"#;
        let campus = CampusInstance::from_json_str(json).unwrap();
        assert_eq!(campus.len(), 2);
        assert_eq!(campus.time_budget(), 0);
        assert_eq!(campus.edge_time(1, 2), Some(5));
        assert_eq!(campus.point(2).unwrap().value, None);

        let defaulted = CampusInstance::from_json_str(r#"{"points": []}"#).unwrap();
        assert_eq!(defaulted.time_budget(), DEFAULT_TIME_BUDGET);
        assert!(defaulted.edges().is_empty());

        assert!(CampusInstance::from_json_str(r#"{"edges": []}"#).is_err());
    }

    #[test]
    fn test_payload_round_trip_keeps_index() {
        let campus = line_campus();
        let json = campus.to_json_string().unwrap();
        assert!(json.contains("\"timeBudget\""));
        let back = CampusInstance::from_json_str(&json).unwrap();
        assert_eq!(back.edge_time(3, 2), Some(6));
        assert_eq!(back.time_budget(), 10);
    }

    #[test]
    fn test_route_time() {
        let campus = line_campus();
        assert_eq!(campus.route_time(&[1, 2, 3]), Some(10));
        assert_eq!(campus.route_time(&[1]), Some(0));
        assert_eq!(campus.route_time(&[1, 3]), None);
    }

    #[test]
    fn test_statistics() {
        let stats = line_campus().statistics();
        assert_eq!(stats.num_points, 3);
        assert_eq!(stats.num_edges, 2);
        assert_eq!(stats.unreachable_pairs, 1);
        assert_eq!(stats.total_value, 4);
        assert!((stats.avg_time - 5.0).abs() < 1e-10);
        assert!((stats.min_time - 4.0).abs() < 1e-10);
        assert!((stats.max_time - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_random_campus_is_deterministic() {
        let a = CampusInstance::random(8, 7, 700.0, 500.0, 20, 30);
        let b = CampusInstance::random(8, 7, 700.0, 500.0, 20, 30);
        assert_eq!(a.points(), b.points());
        assert_eq!(a.edges().len(), 28);
        assert!(a.points().iter().all(|p| matches!(p.value, Some(v) if (1..=20).contains(&v))));
    }
}
