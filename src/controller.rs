//! Tracker controller.
//!
//! Wires the store, the persistence slot, and the view collaborators into
//! explicit command handlers, one per user action. Every successful
//! mutation re-renders the list in the current display order, resyncs the
//! full marker set, and snapshots the store into the slot before the
//! handler returns, in event order.

use log::{info, warn};

use crate::error::{Result, TrackerError};
use crate::persistence::{KeyValueStore, PersistenceBridge, RestoreOutcome};
use crate::store::{ListOrder, WorkoutStore};
use crate::view::{ListView, MapView, Marker};
use crate::workout::{Workout, WorkoutKind};
use crate::{Bounds, GeoPoint, TrackerConfig};

/// Geolocation collaborator.
pub trait LocationProvider {
    /// Acquire the device's current position.
    fn current_position(&mut self) -> Result<GeoPoint>;
}

/// Summary of a tracker startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupSummary {
    /// Workouts restored from the persistence slot.
    pub restored: usize,
    /// Persisted records dropped as corrupt.
    pub skipped: usize,
    /// Whether the map came up (geolocation succeeded).
    pub map_ready: bool,
}

/// The application controller.
///
/// Owns the store and the collaborator handles. All handlers are
/// synchronous: when one returns, the views and the persisted snapshot
/// already reflect the change.
pub struct Tracker {
    store: WorkoutStore,
    kv: Box<dyn KeyValueStore>,
    list: Box<dyn ListView>,
    map: Box<dyn MapView>,
    location: Box<dyn LocationProvider>,
    config: TrackerConfig,
    map_ready: bool,
    pending_location: Option<GeoPoint>,
}

impl Tracker {
    /// Create a tracker over its collaborators. No I/O happens until
    /// [`Tracker::start`].
    pub fn new(
        kv: Box<dyn KeyValueStore>,
        list: Box<dyn ListView>,
        map: Box<dyn MapView>,
        location: Box<dyn LocationProvider>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            store: WorkoutStore::new(),
            kv,
            list,
            map,
            location,
            config,
            map_ready: false,
            pending_location: None,
        }
    }

    /// Start the tracker: restore persisted workouts, render the list, and
    /// bring up the map at the current position.
    ///
    /// Bad persisted data is never fatal. A corrupt record is skipped, an
    /// unreadable slot falls back to an empty store. Geolocation failure
    /// degrades to list-only mode with the map left uninitialized.
    pub fn start(&mut self) -> Result<StartupSummary> {
        let outcome = match PersistenceBridge::load(self.kv.as_ref(), &self.config.storage_key) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("[Tracker] discarding unreadable snapshot: {}", e);
                RestoreOutcome::default()
            }
        };

        let mut summary = StartupSummary {
            restored: 0,
            skipped: outcome.skipped,
            map_ready: false,
        };

        for workout in outcome.workouts {
            match self.store.add(workout) {
                Ok(()) => summary.restored += 1,
                Err(e) => {
                    warn!("[Tracker] dropping restored workout: {}", e);
                    summary.skipped += 1;
                }
            }
        }

        self.render_list();

        match self.location.current_position() {
            Ok(position) if position.is_valid() => {
                self.map.set_center(position, self.config.zoom_level);
                self.map_ready = true;
                summary.map_ready = true;
                self.sync_markers();
            }
            Ok(position) => {
                warn!(
                    "[Tracker] ignoring invalid position {:?}; running list-only",
                    position
                );
            }
            Err(e) => {
                warn!("[Tracker] could not get position: {}; running list-only", e);
            }
        }

        info!(
            "[Tracker] started with {} workouts ({} skipped), map {}",
            summary.restored,
            summary.skipped,
            if summary.map_ready { "ready" } else { "unavailable" }
        );
        Ok(summary)
    }

    /// Handle a map click: remember the location for the next creation.
    ///
    /// Clicks cannot happen before the map is up, so a select in list-only
    /// mode is ignored.
    pub fn select_location(&mut self, position: GeoPoint) {
        if !self.map_ready {
            warn!("[Tracker] map not ready; ignoring location select");
            return;
        }
        self.pending_location = Some(position);
    }

    /// Create a workout at the pending location and return its id.
    ///
    /// Fails with [`TrackerError::LocationNotSelected`] when no map click
    /// preceded it. The pending location is consumed only on success, so a
    /// rejected form can be fixed and resubmitted.
    pub fn create_workout(
        &mut self,
        kind: WorkoutKind,
        distance_km: f64,
        duration_min: f64,
    ) -> Result<String> {
        let coords = self
            .pending_location
            .ok_or(TrackerError::LocationNotSelected)?;
        let workout = Workout::new(coords, distance_km, duration_min, kind)?;
        let id = workout.id.clone();

        self.store.add(workout)?;
        self.pending_location = None;
        self.sync_and_persist()?;

        info!("[Tracker] created workout {}", id);
        Ok(id)
    }

    /// Edit a workout, possibly switching its variant.
    pub fn edit_workout(
        &mut self,
        id: &str,
        kind: WorkoutKind,
        distance_km: f64,
        duration_min: f64,
    ) -> Result<()> {
        self.store.edit(id, kind, distance_km, duration_min)?;
        self.sync_and_persist()?;

        info!("[Tracker] edited workout {}", id);
        Ok(())
    }

    /// Delete one workout.
    pub fn delete_workout(&mut self, id: &str) -> Result<()> {
        self.store.remove(id)?;
        self.sync_and_persist()?;

        info!("[Tracker] deleted workout {}", id);
        Ok(())
    }

    /// Delete every workout. Store, views, and the snapshot slot empty out
    /// together.
    pub fn delete_all(&mut self) -> Result<()> {
        let count = self.store.len();
        self.store.remove_all();
        self.sync_and_persist()?;

        info!("[Tracker] deleted all {} workouts", count);
        Ok(())
    }

    /// Flip the list display order and re-render.
    ///
    /// The stored sequence and the persisted snapshot are untouched; only
    /// the rendered order changes.
    pub fn toggle_distance_sort(&mut self) -> ListOrder {
        let order = self.store.toggle_distance_sort();
        self.render_list();
        order
    }

    /// Fit the map to the padded bounds of every workout's location.
    pub fn show_all_workouts(&mut self) -> Result<()> {
        if !self.map_ready {
            return Err(TrackerError::Geolocation {
                message: "map never initialized".to_string(),
            });
        }

        let coords: Vec<GeoPoint> = self.store.iter().map(|w| w.coords).collect();
        let bounds = Bounds::from_points(&coords).ok_or(TrackerError::EmptyCollection)?;
        self.map.fit_bounds(bounds.padded(self.config.fit_padding));
        Ok(())
    }

    /// Center the map on one workout's location at the configured zoom.
    pub fn focus_workout(&mut self, id: &str) -> Result<()> {
        if !self.map_ready {
            return Err(TrackerError::Geolocation {
                message: "map never initialized".to_string(),
            });
        }

        let coords = self
            .store
            .find_by_id(id)
            .ok_or_else(|| TrackerError::NotFound { id: id.to_string() })?
            .coords;
        self.map.set_center(coords, self.config.zoom_level);
        Ok(())
    }

    /// Clear the persistence slot and the store, and re-render empty views.
    pub fn reset(&mut self) -> Result<()> {
        self.kv.remove(&self.config.storage_key)?;
        self.store.remove_all();
        self.pending_location = None;
        self.render_list();
        self.sync_markers();

        info!("[Tracker] reset");
        Ok(())
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &WorkoutStore {
        &self.store
    }

    /// Whether the map came up during startup.
    pub fn map_ready(&self) -> bool {
        self.map_ready
    }

    fn render_list(&mut self) {
        self.list.render(&self.store.display_order());
    }

    fn sync_markers(&mut self) {
        if !self.map_ready {
            return;
        }
        let markers: Vec<Marker> = self.store.iter().map(Marker::for_workout).collect();
        self.map.replace_markers(&markers);
    }

    // Every successful mutation funnels through here: views first, then the
    // snapshot, before the handler returns.
    fn sync_and_persist(&mut self) -> Result<()> {
        self.render_list();
        self.sync_markers();
        PersistenceBridge::save(self.kv.as_mut(), &self.config.storage_key, &self.store)
    }
}
