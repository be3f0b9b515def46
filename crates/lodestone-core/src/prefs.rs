//! Snapping preferences.
//!
//! The engine only reads these; persistence is owned by the host, which is
//! why the struct derives serde and nothing here touches disk.

use serde::{Deserialize, Serialize};

/// Global snapping preferences, shared by all snappers of one manager.
///
/// Tolerances are expressed in the same units as snap distances (canvas
/// pixels) and must be strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapPreferences {
    /// Master switch; when false no query produces candidates.
    pub enabled: bool,
    /// Temporarily suspend snapping (e.g. while a modifier key is held)
    /// without forgetting the enabled state.
    pub postponed: bool,
    /// Snap to grid lines and their intersections.
    pub snap_to_grids: bool,
    /// Snap to guide lines and their intersections.
    pub snap_to_guides: bool,
    /// Snap to object geometry at all.
    pub snap_to_objects: bool,
    /// Snap to the on-curve nodes of objects.
    pub snap_to_nodes: bool,
    /// Snap to the nearest point of object paths.
    pub snap_to_paths: bool,
    /// Treat the page border as an object path to snap to.
    pub snap_to_page_border: bool,
    /// Search for intersections between two snapped object paths.
    pub curve_intersections: bool,
    /// Search for intersections of a grid line with a guide line.
    pub grid_guide_intersections: bool,
    /// Only show the indicator for the single closest snap source.
    pub closest_only: bool,
    /// Maximum snap distance for grid candidates.
    pub grid_tolerance: f64,
    /// Maximum snap distance for guide candidates.
    pub guide_tolerance: f64,
    /// Maximum snap distance for object candidates.
    pub object_tolerance: f64,
    /// Grid candidates snap regardless of distance.
    pub grid_always_snap: bool,
    /// Guide candidates snap regardless of distance.
    pub guide_always_snap: bool,
}

impl Default for SnapPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            postponed: false,
            snap_to_grids: true,
            snap_to_guides: true,
            snap_to_objects: true,
            snap_to_nodes: true,
            snap_to_paths: true,
            snap_to_page_border: false,
            curve_intersections: false,
            grid_guide_intersections: false,
            closest_only: false,
            grid_tolerance: 10.0,
            guide_tolerance: 10.0,
            object_tolerance: 10.0,
            grid_always_snap: false,
            guide_always_snap: false,
        }
    }
}

impl SnapPreferences {
    /// True when snapping is both enabled and not postponed.
    pub fn active(&self) -> bool {
        self.enabled && !self.postponed
    }
}
