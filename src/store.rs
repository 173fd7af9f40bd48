//! Insertion-ordered workout store.
//!
//! The store owns the authoritative sequence of workouts in creation order.
//! Sorting is a transient display concern: toggling distance sort changes
//! what [`WorkoutStore::display_order`] returns, never the stored sequence,
//! and the mode is not persisted.

use std::cmp::Ordering;

use crate::error::{Result, TrackerError};
use crate::workout::{Workout, WorkoutKind};

/// Display ordering for the workout list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    /// Creation order (the stored sequence).
    Insertion,
    /// Descending by distance, stable on ties.
    DistanceDesc,
}

impl Default for ListOrder {
    fn default() -> Self {
        ListOrder::Insertion
    }
}

/// Ordered collection of workouts with id lookup, edit, and removal.
#[derive(Debug, Default)]
pub struct WorkoutStore {
    workouts: Vec<Workout>,
    order: ListOrder,
}

impl WorkoutStore {
    /// Create an empty store in insertion display order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a workout to the end of the sequence.
    ///
    /// Id generation should never collide, but a collision would corrupt
    /// lookups, so `add` rejects it with [`TrackerError::DuplicateId`].
    pub fn add(&mut self, workout: Workout) -> Result<()> {
        if self.find_by_id(&workout.id).is_some() {
            return Err(TrackerError::DuplicateId {
                id: workout.id.clone(),
            });
        }
        self.workouts.push(workout);
        Ok(())
    }

    /// Look up a workout by id. Linear scan; the list is user-scale.
    pub fn find_by_id(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    /// Remove a workout by id, preserving the relative order of the rest.
    pub fn remove(&mut self, id: &str) -> Result<Workout> {
        let index = self.position(id)?;
        Ok(self.workouts.remove(index))
    }

    /// Remove every workout.
    pub fn remove_all(&mut self) {
        self.workouts.clear();
    }

    /// Rebuild the identified workout with new details.
    ///
    /// The record keeps its position in the sequence along with its id,
    /// creation time, coordinates, and click count; kind, distance, and
    /// duration are replaced and the metric and label recomputed. A
    /// validation failure leaves the store unchanged.
    pub fn edit(
        &mut self,
        id: &str,
        kind: WorkoutKind,
        distance_km: f64,
        duration_min: f64,
    ) -> Result<&Workout> {
        let index = self.position(id)?;
        let updated = self.workouts[index].edited(kind, distance_km, duration_min)?;
        self.workouts[index] = updated;
        Ok(&self.workouts[index])
    }

    /// Copy of the sequence sorted descending by distance.
    ///
    /// The sort is stable: equal distances keep their insertion order.
    pub fn sorted_by_distance_desc(&self) -> Vec<Workout> {
        let mut sorted = self.workouts.clone();
        sorted.sort_by(|a, b| {
            b.distance_km
                .partial_cmp(&a.distance_km)
                .unwrap_or(Ordering::Equal)
        });
        sorted
    }

    /// Flip the transient display order between insertion and
    /// distance-descending. The stored sequence never moves.
    pub fn toggle_distance_sort(&mut self) -> ListOrder {
        self.order = match self.order {
            ListOrder::Insertion => ListOrder::DistanceDesc,
            ListOrder::DistanceDesc => ListOrder::Insertion,
        };
        self.order
    }

    /// The current display order mode.
    pub fn order(&self) -> ListOrder {
        self.order
    }

    /// The sequence in the current display mode.
    pub fn display_order(&self) -> Vec<Workout> {
        match self.order {
            ListOrder::Insertion => self.workouts.clone(),
            ListOrder::DistanceDesc => self.sorted_by_distance_desc(),
        }
    }

    /// Number of stored workouts.
    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    /// True when no workouts are stored.
    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    /// Iterate the stored sequence in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Workout> {
        self.workouts.iter()
    }

    /// The stored sequence as a slice, in insertion order.
    pub fn as_slice(&self) -> &[Workout] {
        &self.workouts
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.workouts
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| TrackerError::NotFound { id: id.to_string() })
    }
}
