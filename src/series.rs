//! Named, ordered sample series and the shared store the session writes to.
//!
//! A [`Series`] is append-only while a run is active; insertion order is the
//! plotting order. The [`SeriesStore`] is clone-shared between the session
//! reader task (sole writer of the live series) and display collaborators,
//! which read snapshots.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// A single 2-D point on a plotted series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    /// Domain value (absolute time in seconds for live runs).
    pub x: f64,
    /// Range value (resistance in ohms for live runs).
    pub y: f64,
}

impl PlotPoint {
    /// Creates a point from raw coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A named, ordered, append-only sequence of points.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Series {
    name: String,
    points: Vec<PlotPoint>,
}

impl Series {
    /// Creates an empty series.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    /// Creates a series with a pre-built point list (historical import).
    pub fn with_points(name: impl Into<String>, points: Vec<PlotPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// The series name (store key and chart legend label).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Points in insertion order.
    pub fn points(&self) -> &[PlotPoint] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the series holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Returned when a series name is already present in the store.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("series '{0}' already exists")]
pub struct DuplicateSeries(pub String);

/// A thread-safe collection of series, keyed by name, in insertion order.
///
/// Cloning is cheap and shares the underlying storage.
#[derive(Clone, Default)]
pub struct SeriesStore(Arc<Mutex<VecDeque<Series>>>);

impl SeriesStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty series under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateSeries`] if the name is already taken.
    pub fn create(&self, name: &str) -> Result<(), DuplicateSeries> {
        self.insert(Series::new(name))
    }

    /// Adds a fully-built series, rejecting duplicate names.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateSeries`] if the name is already taken.
    pub fn insert(&self, series: Series) -> Result<(), DuplicateSeries> {
        let mut inner = self.0.lock().unwrap();
        if inner.iter().any(|s| s.name == series.name) {
            return Err(DuplicateSeries(series.name));
        }
        inner.push_back(series);
        Ok(())
    }

    /// Appends a point to the named series, preserving arrival order.
    ///
    /// Returns `false` if the series does not exist (it was cleared while
    /// the worker was still emitting samples); the point is dropped.
    pub fn append(&self, name: &str, point: PlotPoint) -> bool {
        let mut inner = self.0.lock().unwrap();
        match inner.iter_mut().find(|s| s.name == name) {
            Some(series) => {
                series.points.push(point);
                true
            }
            None => false,
        }
    }

    /// A deep copy of the named series, if present.
    pub fn get(&self, name: &str) -> Option<Series> {
        self.0.lock().unwrap().iter().find(|s| s.name == name).cloned()
    }

    /// A deep copy of every series, in display order.
    pub fn snapshot(&self) -> Vec<Series> {
        self.0.lock().unwrap().iter().cloned().collect()
    }

    /// Series names in display order.
    pub fn names(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|s| s.name.clone()).collect()
    }

    /// Number of series held.
    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    /// True when no series are held.
    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }

    /// Removes every series. Idempotent.
    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_arrival_order() {
        let store = SeriesStore::new();
        store.create("Run 1").unwrap();
        assert!(store.append("Run 1", PlotPoint::new(0.0, 100.0)));
        assert!(store.append("Run 1", PlotPoint::new(1.0, 111.1)));

        let series = store.get("Run 1").unwrap();
        assert_eq!(
            series.points(),
            &[PlotPoint::new(0.0, 100.0), PlotPoint::new(1.0, 111.1)]
        );
    }

    #[test]
    fn series_order_is_insertion_order() {
        let store = SeriesStore::new();
        store.create("Run 1").unwrap();
        store.create("loaded.csv").unwrap();
        assert_eq!(store.names(), vec!["Run 1", "loaded.csv"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let store = SeriesStore::new();
        store.create("Run 1").unwrap();
        assert_eq!(
            store.create("Run 1"),
            Err(DuplicateSeries("Run 1".to_string()))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn append_to_missing_series_drops_the_point() {
        let store = SeriesStore::new();
        assert!(!store.append("Run 1", PlotPoint::new(0.0, 0.0)));
        assert!(store.is_empty());
    }

    #[test]
    fn clear_is_idempotent() {
        let store = SeriesStore::new();
        store.create("Run 1").unwrap();
        store.clear();
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn clones_share_storage() {
        let store = SeriesStore::new();
        let writer = store.clone();
        writer.create("Run 1").unwrap();
        writer.append("Run 1", PlotPoint::new(0.5, 42.0));
        assert_eq!(store.get("Run 1").unwrap().len(), 1);
    }
}
