//! One-shot commands sent to the renderer.
//!
//! A [`Command`] serializes to a JSON object tagged by its `type` key, for
//! example `{"type": "focus_point", "index": 5}`. Optional parameters that
//! are not given are sent as `null` so the renderer falls back to its own
//! defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// An imperative instruction for the renderer.
///
/// Commands are fire-and-forget: they have no identity, are never stored and
/// get no acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Selects a single point.
    SelectPointByIndex {
        /// Point index.
        index: usize,
    },
    /// Selects a set of points.
    SelectPointsByIndices {
        /// Point indices.
        indices: Vec<usize>,
    },
    /// Turns on rectangular selection with the mouse.
    ActivateRectSelection,
    /// Turns off rectangular selection.
    DeactivateRectSelection,
    /// Fits the view to all points.
    FitView,
    /// Fits the view to the given points.
    FitViewByIndices {
        /// Point indices.
        indices: Vec<usize>,
        /// Animation duration in milliseconds.
        duration: Option<f64>,
        /// Padding around the fitted points.
        padding: Option<f64>,
    },
    /// Fits the view to the given space coordinates.
    FitViewByCoordinates {
        /// `[x, y]` pairs.
        coordinates: Vec<[f64; 2]>,
        /// Animation duration in milliseconds.
        duration: Option<f64>,
        /// Padding around the fitted area.
        padding: Option<f64>,
    },
    /// Focuses a point, or clears focus when `index` is `None`.
    FocusPoint {
        /// Point index.
        index: Option<usize>,
    },
    /// Starts the simulation.
    Start {
        /// Initial simulation energy.
        alpha: Option<f64>,
    },
    /// Pauses the simulation.
    Pause,
    /// Restarts the simulation.
    Restart,
    /// Advances the simulation by one tick.
    Step,
}

impl Command {
    /// Wire tag of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectPointByIndex { .. } => "select_point_by_index",
            Self::SelectPointsByIndices { .. } => "select_points_by_indices",
            Self::ActivateRectSelection => "activate_rect_selection",
            Self::DeactivateRectSelection => "deactivate_rect_selection",
            Self::FitView => "fit_view",
            Self::FitViewByIndices { .. } => "fit_view_by_indices",
            Self::FitViewByCoordinates { .. } => "fit_view_by_coordinates",
            Self::FocusPoint { .. } => "focus_point",
            Self::Start { .. } => "start",
            Self::Pause => "pause",
            Self::Restart => "restart",
            Self::Step => "step",
        }
    }

    /// JSON wire form of the command.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
