//! Snapshot persistence for the workout store.
//!
//! The full ordered store is serialized as one JSON text blob (an array of
//! camelCase records) and written to a single slot of a [`KeyValueStore`].
//! Restoration is forgiving: records that fail to parse or validate are
//! skipped with a warning and the rest come back. Only an unreadable blob
//! is an error, and even that must never crash startup: the controller
//! falls back to an empty store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::warn;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::store::WorkoutStore;
use crate::workout::{self, Workout, WorkoutKind, WorkoutMetric};
use crate::GeoPoint;

// ============================================================================
// Stored record format
// ============================================================================

/// Wire format for one persisted workout record.
///
/// Field names match the stored JSON exactly; the app-facing [`Workout`]
/// stays independent of the wire shape. The variant-specific fields are
/// optional so a record of either kind fits one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredWorkout {
    pub id: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// `[latitude, longitude]`.
    pub coords: [f64; 2],
    pub distance_km: f64,
    pub duration_min: f64,
    /// `"running"` or `"cycling"`.
    pub variant_tag: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cadence_spm: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub elevation_gain_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pace_min_per_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub speed_km_per_h: Option<f64>,
    #[serde(default)]
    pub display_label: Option<String>,
    #[serde(default)]
    pub click_count: u32,
}

impl StoredWorkout {
    /// Build the wire record for a workout.
    pub fn from_workout(workout: &Workout) -> Self {
        let (cadence_spm, elevation_gain_m) = match workout.kind {
            WorkoutKind::Running { cadence_spm } => (Some(cadence_spm), None),
            WorkoutKind::Cycling { elevation_gain_m } => (None, Some(elevation_gain_m)),
        };
        let (pace_min_per_km, speed_km_per_h) = match workout.metric {
            WorkoutMetric::Pace { min_per_km } => (Some(min_per_km), None),
            WorkoutMetric::Speed { km_per_h } => (None, Some(km_per_h)),
        };

        Self {
            id: workout.id.clone(),
            created_at: workout.created_at.to_rfc3339(),
            coords: [workout.coords.latitude, workout.coords.longitude],
            distance_km: workout.distance_km,
            duration_min: workout.duration_min,
            variant_tag: workout.kind.tag().to_string(),
            cadence_spm,
            elevation_gain_m,
            pace_min_per_km,
            speed_km_per_h,
            display_label: Some(workout.label.clone()),
            click_count: workout.click_count,
        }
    }

    /// Rebuild the app-facing workout from this record.
    ///
    /// Fails when the variant tag is unknown, the variant's own field is
    /// missing, the timestamp does not parse, or the measurable values
    /// violate the record invariants. A finite stored metric is kept as-is;
    /// an absent or spoiled one is recomputed from distance and duration.
    pub fn into_workout(self) -> Result<Workout> {
        let kind = match self.variant_tag.as_str() {
            "running" => WorkoutKind::Running {
                cadence_spm: self.cadence_spm.ok_or_else(|| TrackerError::CorruptData {
                    message: format!("running record '{}' has no cadence", self.id),
                })?,
            },
            "cycling" => WorkoutKind::Cycling {
                elevation_gain_m: self.elevation_gain_m.ok_or_else(|| {
                    TrackerError::CorruptData {
                        message: format!("cycling record '{}' has no elevation gain", self.id),
                    }
                })?,
            },
            other => {
                return Err(TrackerError::CorruptData {
                    message: format!("record '{}' has unknown variant tag '{}'", self.id, other),
                })
            }
        };

        workout::validate(self.distance_km, self.duration_min, &kind)?;

        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| TrackerError::CorruptData {
                message: format!("record '{}' has unparsable timestamp: {}", self.id, e),
            })?
            .with_timezone(&Utc);

        let stored_metric = match kind {
            WorkoutKind::Running { .. } => self
                .pace_min_per_km
                .map(|min_per_km| WorkoutMetric::Pace { min_per_km }),
            WorkoutKind::Cycling { .. } => self
                .speed_km_per_h
                .map(|km_per_h| WorkoutMetric::Speed { km_per_h }),
        };
        let metric = match stored_metric {
            Some(metric) if metric.value().is_finite() => metric,
            _ => WorkoutMetric::for_kind(&kind, self.distance_km, self.duration_min),
        };

        let label = match self.display_label {
            Some(label) if !label.is_empty() => label,
            _ => kind.label_for(created_at),
        };

        Ok(Workout {
            id: self.id,
            created_at,
            coords: GeoPoint::new(self.coords[0], self.coords[1]),
            distance_km: self.distance_km,
            duration_min: self.duration_min,
            kind,
            metric,
            label,
            click_count: self.click_count,
        })
    }
}

// ============================================================================
// Snapshot / restore bridge
// ============================================================================

/// Outcome of restoring a snapshot blob.
#[derive(Debug, Default)]
pub struct RestoreOutcome {
    /// Successfully restored workouts, in stored order.
    pub workouts: Vec<Workout>,
    /// Records dropped because they failed to parse or validate.
    pub skipped: usize,
}

/// Bridge between the in-memory store and a key-value snapshot slot.
pub struct PersistenceBridge;

impl PersistenceBridge {
    /// Serialize the full ordered store as a JSON array of records.
    pub fn snapshot(store: &WorkoutStore) -> Result<String> {
        let records: Vec<StoredWorkout> = store.iter().map(StoredWorkout::from_workout).collect();
        Ok(serde_json::to_string(&records)?)
    }

    /// Parse a snapshot blob back into workouts.
    ///
    /// Individual bad records are skipped with a warning and counted in the
    /// outcome; an unreadable blob fails with
    /// [`TrackerError::CorruptData`].
    pub fn restore(blob: &str) -> Result<RestoreOutcome> {
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(blob).map_err(|e| TrackerError::CorruptData {
                message: format!("snapshot is not a JSON array: {}", e),
            })?;

        let mut outcome = RestoreOutcome::default();
        for value in raw {
            let record: StoredWorkout = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    warn!("[Persistence] skipping malformed record: {}", e);
                    outcome.skipped += 1;
                    continue;
                }
            };
            match record.into_workout() {
                Ok(workout) => outcome.workouts.push(workout),
                Err(e) => {
                    warn!("[Persistence] skipping invalid record: {}", e);
                    outcome.skipped += 1;
                }
            }
        }
        Ok(outcome)
    }

    /// Restore whatever is stored under `key`; an empty slot restores
    /// nothing.
    pub fn load(kv: &dyn KeyValueStore, key: &str) -> Result<RestoreOutcome> {
        match kv.get(key)? {
            Some(blob) => Self::restore(&blob),
            None => Ok(RestoreOutcome::default()),
        }
    }

    /// Snapshot the store into the slot under `key`.
    ///
    /// Serialization happens before the slot is touched, so a failure
    /// leaves the previous snapshot in place.
    pub fn save(kv: &mut dyn KeyValueStore, key: &str, store: &WorkoutStore) -> Result<()> {
        let blob = Self::snapshot(store)?;
        kv.set(key, &blob)
    }
}

// ============================================================================
// Key-value slot stores
// ============================================================================

/// Key-value collaborator holding persisted snapshots, one slot per key.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete the slot for `key` if present.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory slot store for tests and embeddings without a database.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    slots: HashMap<String, String>,
}

impl MemoryKeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.slots.remove(key);
        Ok(())
    }
}

/// SQLite-backed slot store: one row per key in a single table.
pub struct SqliteKeyStore {
    db: Connection,
}

impl SqliteKeyStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let db = Connection::open(path)?;
        Self::init_schema(&db)?;
        Ok(Self { db })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn init_schema(db: &Connection) -> Result<()> {
        db.execute_batch(
            r#"
            -- Snapshot slots, one JSON blob per key
            CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER DEFAULT (strftime('%s', 'now'))
            );
            "#,
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteKeyStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let result = self.db.query_row(
            "SELECT value FROM slots WHERE key = ?",
            params![key],
            |row| row.get(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // INSERT OR REPLACE re-evaluates the updated_at default
        self.db.execute(
            "INSERT OR REPLACE INTO slots (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.db
            .execute("DELETE FROM slots WHERE key = ?", params![key])?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> WorkoutStore {
        let mut store = WorkoutStore::new();
        store
            .add(Workout::running(GeoPoint::new(51.5074, -0.1278), 5.0, 25.0, 180).unwrap())
            .unwrap();
        store
            .add(Workout::cycling(GeoPoint::new(46.95, 7.45), 20.0, 60.0, -120.0).unwrap())
            .unwrap();
        store
    }

    #[test]
    fn test_round_trip_preserves_records() {
        let store = sample_store();
        let original: Vec<Workout> = store.iter().cloned().collect();

        let blob = PersistenceBridge::snapshot(&store).unwrap();
        let outcome = PersistenceBridge::restore(&blob).unwrap();

        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.workouts, original);
    }

    #[test]
    fn test_snapshot_field_layout() {
        let mut store = WorkoutStore::new();
        store
            .add(Workout::running(GeoPoint::new(51.5074, -0.1278), 5.0, 25.0, 180).unwrap())
            .unwrap();

        let blob = PersistenceBridge::snapshot(&store).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&blob).unwrap();
        let record = &parsed.as_array().unwrap()[0];

        assert!(record["id"].is_string());
        assert!(record["createdAt"].is_string());
        assert_eq!(record["coords"][0].as_f64().unwrap(), 51.5074);
        assert_eq!(record["coords"][1].as_f64().unwrap(), -0.1278);
        assert_eq!(record["distanceKm"].as_f64().unwrap(), 5.0);
        assert_eq!(record["durationMin"].as_f64().unwrap(), 25.0);
        assert_eq!(record["variantTag"], "running");
        assert_eq!(record["cadenceSpm"].as_u64().unwrap(), 180);
        assert_eq!(record["paceMinPerKm"].as_f64().unwrap(), 5.0);
        assert!(record.get("elevationGainM").is_none());
        assert!(record.get("speedKmPerH").is_none());
        assert!(record["displayLabel"].as_str().unwrap().starts_with("Running on"));
        assert_eq!(record["clickCount"].as_u64().unwrap(), 0);
    }

    #[test]
    fn test_restore_skips_bad_records() {
        let blob = r#"[
            {"id":"1111111111","createdAt":"2024-04-05T12:00:00+00:00","coords":[51.5,-0.12],
             "distanceKm":5.0,"durationMin":25.0,"variantTag":"running","cadenceSpm":180,
             "paceMinPerKm":5.0,"displayLabel":"Running on April 5","clickCount":0},
            {"unexpected":true},
            {"id":"2222222222","createdAt":"2024-04-05T12:00:00+00:00","coords":[51.5,-0.12],
             "distanceKm":5.0,"durationMin":25.0,"variantTag":"swimming","clickCount":0},
            {"id":"3333333333","createdAt":"2024-04-05T12:00:00+00:00","coords":[51.5,-0.12],
             "distanceKm":5.0,"durationMin":25.0,"variantTag":"running","clickCount":0}
        ]"#;

        let outcome = PersistenceBridge::restore(blob).unwrap();
        assert_eq!(outcome.workouts.len(), 1);
        assert_eq!(outcome.skipped, 3);
        assert_eq!(outcome.workouts[0].id, "1111111111");
    }

    #[test]
    fn test_restore_skips_invalid_values() {
        let blob = r#"[
            {"id":"1111111111","createdAt":"2024-04-05T12:00:00+00:00","coords":[51.5,-0.12],
             "distanceKm":-5.0,"durationMin":25.0,"variantTag":"running","cadenceSpm":180,
             "clickCount":0},
            {"id":"2222222222","createdAt":"not a timestamp","coords":[51.5,-0.12],
             "distanceKm":5.0,"durationMin":25.0,"variantTag":"running","cadenceSpm":180,
             "clickCount":0}
        ]"#;

        let outcome = PersistenceBridge::restore(blob).unwrap();
        assert!(outcome.workouts.is_empty());
        assert_eq!(outcome.skipped, 2);
    }

    #[test]
    fn test_restore_recomputes_missing_metric() {
        // A null metric (the old NaN-speed failure mode) is recomputed
        let blob = r#"[
            {"id":"1111111111","createdAt":"2024-04-05T12:00:00+00:00","coords":[46.95,7.45],
             "distanceKm":20.0,"durationMin":60.0,"variantTag":"cycling","elevationGainM":300.0,
             "speedKmPerH":null,"displayLabel":"Cycling on April 5","clickCount":0}
        ]"#;

        let outcome = PersistenceBridge::restore(blob).unwrap();
        assert_eq!(outcome.workouts.len(), 1);
        assert_eq!(
            outcome.workouts[0].metric,
            WorkoutMetric::Speed { km_per_h: 20.0 }
        );
    }

    #[test]
    fn test_restore_rejects_unreadable_blob() {
        let result = PersistenceBridge::restore("definitely not json");
        assert!(matches!(result, Err(TrackerError::CorruptData { .. })));
    }

    #[test]
    fn test_load_from_empty_slot() {
        let kv = MemoryKeyStore::new();
        let outcome = PersistenceBridge::load(&kv, "workouts").unwrap();
        assert!(outcome.workouts.is_empty());
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn test_save_then_load() {
        let mut kv = MemoryKeyStore::new();
        let store = sample_store();
        let original: Vec<Workout> = store.iter().cloned().collect();

        PersistenceBridge::save(&mut kv, "workouts", &store).unwrap();
        let outcome = PersistenceBridge::load(&kv, "workouts").unwrap();

        assert_eq!(outcome.workouts, original);
    }

    #[test]
    fn test_memory_key_store_slots() {
        let mut kv = MemoryKeyStore::new();
        assert!(kv.get("workouts").unwrap().is_none());

        kv.set("workouts", "[]").unwrap();
        assert_eq!(kv.get("workouts").unwrap().unwrap(), "[]");

        kv.set("workouts", "[1]").unwrap();
        assert_eq!(kv.get("workouts").unwrap().unwrap(), "[1]");

        kv.remove("workouts").unwrap();
        assert!(kv.get("workouts").unwrap().is_none());
    }

    #[test]
    fn test_sqlite_key_store_slots() {
        let mut kv = SqliteKeyStore::in_memory().unwrap();
        assert!(kv.get("workouts").unwrap().is_none());

        kv.set("workouts", "[]").unwrap();
        assert_eq!(kv.get("workouts").unwrap().unwrap(), "[]");

        kv.set("workouts", r#"[{"id":"x"}]"#).unwrap();
        assert_eq!(kv.get("workouts").unwrap().unwrap(), r#"[{"id":"x"}]"#);

        kv.remove("workouts").unwrap();
        assert!(kv.get("workouts").unwrap().is_none());
    }
}
