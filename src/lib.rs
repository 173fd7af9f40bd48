//! # Workout Tracker
//!
//! Client-side workout tracking core: typed running/cycling records, an
//! insertion-ordered store, snapshot persistence, and a controller that keeps
//! map and list views in sync.
//!
//! This library provides:
//! - Validated workout records with eagerly derived pace/speed metrics
//! - An ordered store with lookup, edit, removal, and distance sorting
//! - JSON snapshot persistence to a pluggable key-value slot
//! - A view-sync controller driving map and list collaborators
//!
//! ## Quick Start
//!
//! ```rust
//! use workout_tracker::{GeoPoint, Workout, WorkoutStore};
//!
//! let mut store = WorkoutStore::new();
//! let run = Workout::running(GeoPoint::new(51.5074, -0.1278), 5.0, 25.0, 170).unwrap();
//! store.add(run).unwrap();
//!
//! for workout in store.iter() {
//!     println!("{}: {:.1} km", workout.label, workout.distance_km);
//! }
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, TrackerError};

// Workout records and derived metrics
pub mod workout;
pub use workout::{Workout, WorkoutKind, WorkoutMetric};

// Insertion-ordered workout store
pub mod store;
pub use store::{ListOrder, WorkoutStore};

// Snapshot persistence to a key-value slot
pub mod persistence;
pub use persistence::{
    KeyValueStore, MemoryKeyStore, PersistenceBridge, RestoreOutcome, SqliteKeyStore, StoredWorkout,
};

// View collaborator interfaces (map + list)
pub mod view;
pub use view::{ListView, MapView, Marker};

// Controller wiring store, persistence, and views together
pub mod controller;
pub use controller::{LocationProvider, StartupSummary, Tracker};

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use workout_tracker::GeoPoint;
/// let point = GeoPoint::new(51.5074, -0.1278); // London
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new geographic point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box over workout locations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from geographic points, ignoring invalid coordinates.
    ///
    /// Returns `None` if the slice holds no valid points.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;
        let mut any = false;

        for p in points.iter().filter(|p| p.is_valid()) {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
            any = true;
        }

        if !any {
            return None;
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Expand the bounds by a fraction of their size in each direction.
    ///
    /// A fraction of `0.5` grows a 1km-wide box by 500m on every side. The
    /// center is unchanged.
    pub fn padded(&self, fraction: f64) -> Bounds {
        let lat_buffer = (self.max_lat - self.min_lat) * fraction;
        let lng_buffer = (self.max_lng - self.min_lng) * fraction;
        Bounds {
            min_lat: self.min_lat - lat_buffer,
            max_lat: self.max_lat + lat_buffer,
            min_lng: self.min_lng - lng_buffer,
            max_lng: self.max_lng + lng_buffer,
        }
    }
}

/// Configuration for the tracker controller.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Map zoom level used when centering on a position.
    /// Default: 13
    pub zoom_level: u32,

    /// Padding fraction applied to bounds when fitting all workouts.
    /// Default: 0.5
    pub fit_padding: f64,

    /// Key-value slot under which the workout snapshot is stored.
    /// Default: "workouts"
    pub storage_key: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            zoom_level: 13,
            fit_padding: 0.5,
            storage_key: "workouts".to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
