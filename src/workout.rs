//! Workout records with validated construction and derived metrics.
//!
//! A [`Workout`] is created through [`Workout::running`] or
//! [`Workout::cycling`], which validate the raw inputs and eagerly compute
//! the derived pace/speed metric and the display label. Edits rebuild the
//! record through the same validated path, so an invalid edit can never
//! leave a half-updated workout behind.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error::{Result, TrackerError};
use crate::GeoPoint;

/// The sport-specific part of a workout record.
///
/// Exactly one variant is attached to each workout; an edit may replace it
/// wholesale (a run can become a ride).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutKind {
    /// A run, with step cadence in steps per minute.
    Running { cadence_spm: u32 },
    /// A ride, with total elevation gain in meters (negative for net
    /// descents).
    Cycling { elevation_gain_m: f64 },
}

impl WorkoutKind {
    /// Lowercase tag used in persisted records.
    pub fn tag(&self) -> &'static str {
        match self {
            WorkoutKind::Running { .. } => "running",
            WorkoutKind::Cycling { .. } => "cycling",
        }
    }

    /// Capitalized kind name for display.
    pub fn name(&self) -> &'static str {
        match self {
            WorkoutKind::Running { .. } => "Running",
            WorkoutKind::Cycling { .. } => "Cycling",
        }
    }

    /// Marker icon for this kind.
    pub fn icon(&self) -> &'static str {
        match self {
            WorkoutKind::Running { .. } => "🏃‍♂️",
            WorkoutKind::Cycling { .. } => "🚴‍♀️",
        }
    }

    /// Display label for a workout of this kind created at the given time,
    /// e.g. `"Running on August 26"`.
    pub fn label_for(&self, created_at: DateTime<Utc>) -> String {
        format!("{} on {}", self.name(), created_at.format("%B %-d"))
    }
}

/// Derived performance metric, computed at construction and on every edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutMetric {
    /// Running pace in minutes per kilometer (`duration / distance`).
    Pace { min_per_km: f64 },
    /// Cycling speed in kilometers per hour (`distance / (duration / 60)`).
    Speed { km_per_h: f64 },
}

impl WorkoutMetric {
    /// Compute the metric matching the workout kind.
    pub fn for_kind(kind: &WorkoutKind, distance_km: f64, duration_min: f64) -> WorkoutMetric {
        match kind {
            WorkoutKind::Running { .. } => WorkoutMetric::Pace {
                min_per_km: duration_min / distance_km,
            },
            WorkoutKind::Cycling { .. } => WorkoutMetric::Speed {
                km_per_h: distance_km / (duration_min / 60.0),
            },
        }
    }

    /// The numeric value, regardless of unit.
    pub fn value(&self) -> f64 {
        match self {
            WorkoutMetric::Pace { min_per_km } => *min_per_km,
            WorkoutMetric::Speed { km_per_h } => *km_per_h,
        }
    }
}

/// A single workout record.
///
/// `id`, `created_at`, and `coords` are fixed at creation; edits replace the
/// measurable details and recompute `metric` and `label`.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    /// Unique identifier: the last ten digits of the creation
    /// epoch-millisecond count.
    pub id: String,
    /// Creation time; never reissued by edits.
    pub created_at: DateTime<Utc>,
    /// Location the workout was logged at.
    pub coords: GeoPoint,
    /// Distance in kilometers.
    pub distance_km: f64,
    /// Duration in minutes.
    pub duration_min: f64,
    /// Sport-specific details.
    pub kind: WorkoutKind,
    /// Derived pace/speed metric.
    pub metric: WorkoutMetric,
    /// Display label, e.g. `"Cycling on March 3"`.
    pub label: String,
    /// Interaction counter; reserved, currently never incremented.
    pub click_count: u32,
}

impl Workout {
    /// Create a running workout.
    ///
    /// # Example
    /// ```
    /// use workout_tracker::{GeoPoint, Workout, WorkoutMetric};
    ///
    /// let run = Workout::running(GeoPoint::new(51.5074, -0.1278), 5.0, 25.0, 180).unwrap();
    /// assert_eq!(run.metric, WorkoutMetric::Pace { min_per_km: 5.0 });
    /// ```
    pub fn running(
        coords: GeoPoint,
        distance_km: f64,
        duration_min: f64,
        cadence_spm: u32,
    ) -> Result<Self> {
        Self::new(
            coords,
            distance_km,
            duration_min,
            WorkoutKind::Running { cadence_spm },
        )
    }

    /// Create a cycling workout. Elevation gain may be negative.
    pub fn cycling(
        coords: GeoPoint,
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    ) -> Result<Self> {
        Self::new(
            coords,
            distance_km,
            duration_min,
            WorkoutKind::Cycling { elevation_gain_m },
        )
    }

    /// Create a workout of the given kind.
    ///
    /// Fails with [`TrackerError::Validation`] before any state is touched
    /// if the inputs are invalid.
    pub fn new(
        coords: GeoPoint,
        distance_km: f64,
        duration_min: f64,
        kind: WorkoutKind,
    ) -> Result<Self> {
        validate(distance_km, duration_min, &kind)?;

        let created_at = Utc::now();
        let metric = WorkoutMetric::for_kind(&kind, distance_km, duration_min);
        let label = kind.label_for(created_at);

        Ok(Self {
            id: next_id(),
            created_at,
            coords,
            distance_km,
            duration_min,
            kind,
            metric,
            label,
            click_count: 0,
        })
    }

    /// Rebuild this workout with new details, keeping its identity.
    ///
    /// `id`, `created_at`, `coords`, and `click_count` carry over; the
    /// metric and label are recomputed for the new values. Returns the
    /// rebuilt record without touching `self`, so a validation failure
    /// changes nothing.
    pub fn edited(
        &self,
        kind: WorkoutKind,
        distance_km: f64,
        duration_min: f64,
    ) -> Result<Workout> {
        validate(distance_km, duration_min, &kind)?;

        Ok(Workout {
            id: self.id.clone(),
            created_at: self.created_at,
            coords: self.coords,
            distance_km,
            duration_min,
            kind,
            metric: WorkoutMetric::for_kind(&kind, distance_km, duration_min),
            label: kind.label_for(self.created_at),
            click_count: self.click_count,
        })
    }
}

/// Validate the raw inputs for a workout of the given kind.
///
/// Distance and duration must be positive and finite for both kinds.
/// Cadence must be positive; elevation gain only has to be finite, its sign
/// is unrestricted.
pub(crate) fn validate(distance_km: f64, duration_min: f64, kind: &WorkoutKind) -> Result<()> {
    if !distance_km.is_finite() || distance_km <= 0.0 {
        return Err(TrackerError::validation(
            "distance",
            "must be a positive, finite number",
        ));
    }
    if !duration_min.is_finite() || duration_min <= 0.0 {
        return Err(TrackerError::validation(
            "duration",
            "must be a positive, finite number",
        ));
    }
    match kind {
        WorkoutKind::Running { cadence_spm } => {
            if *cadence_spm == 0 {
                return Err(TrackerError::validation("cadence", "must be positive"));
            }
        }
        WorkoutKind::Cycling { elevation_gain_m } => {
            if !elevation_gain_m.is_finite() {
                return Err(TrackerError::validation(
                    "elevation",
                    "must be a finite number",
                ));
            }
        }
    }
    Ok(())
}

// Ids follow the ten-digit epoch-millisecond scheme. Two workouts created in
// the same millisecond would collide, so the generator bumps past the last
// issued stamp.
static LAST_ID_MS: Mutex<i64> = Mutex::new(0);

fn next_id() -> String {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_ID_MS.lock().unwrap();
    *last = now.max(*last + 1);

    let digits = format!("{:010}", *last);
    digits[digits.len() - 10..].to_string()
}
