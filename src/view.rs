//! View collaborator interfaces.
//!
//! The core pushes data into passive views; actual rendering lives outside
//! the crate. After every mutation the full list and marker set are handed
//! over again, so a view never has to diff.

use crate::workout::Workout;
use crate::{Bounds, GeoPoint};

/// One map marker per workout.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: String,
    pub coords: GeoPoint,
    /// Display label of the workout, e.g. `"Running on April 5"`.
    pub label: String,
    /// Variant icon for the marker popup.
    pub icon: String,
}

impl Marker {
    /// Build the marker for a workout.
    pub fn for_workout(workout: &Workout) -> Self {
        Self {
            id: workout.id.clone(),
            coords: workout.coords,
            label: workout.label.clone(),
            icon: workout.kind.icon().to_string(),
        }
    }
}

/// List collaborator; receives the full sequence after every change.
pub trait ListView {
    /// Replace the rendered list with `workouts`, already in display order.
    fn render(&mut self, workouts: &[Workout]);
}

/// Map collaborator; receives centering, marker, and bounds commands.
pub trait MapView {
    /// Center the map on a position at the given zoom level.
    fn set_center(&mut self, center: GeoPoint, zoom: u32);

    /// Replace the full marker set, one marker per workout.
    fn replace_markers(&mut self, markers: &[Marker]);

    /// Zoom and pan so the given bounds are fully visible.
    fn fit_bounds(&mut self, bounds: Bounds);
}
