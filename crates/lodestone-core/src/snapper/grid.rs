//! Snapping against rectangular grids.

use crate::candidates::{CandidateCollection, LineCandidate, PointCandidate};
use crate::geometry::{ConstraintLine, SnapError, EPS};
use crate::prefs::SnapPreferences;
use crate::snapped::{SnapSourceKind, SnapTargetKind};
use crate::snapper::Snapper;
use crate::transform::Axis;
use kurbo::{Point, Rect, Vec2};
use std::collections::HashSet;
use uuid::Uuid;

/// A rectangular grid: lines at `origin + n * spacing` along both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    origin: Point,
    spacing: Vec2,
}

impl Grid {
    /// Create a grid; both pitches must be strictly positive.
    pub fn try_new(origin: Point, spacing: Vec2) -> Result<Self, SnapError> {
        let min = spacing.x.min(spacing.y);
        if min < EPS {
            return Err(SnapError::InvalidGridSpacing(min));
        }
        Ok(Self { origin, spacing })
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn spacing(&self) -> Vec2 {
        self.spacing
    }

    /// The grid line of the given orientation nearest to `p`.
    /// For `Axis::X` this is a vertical line (fixed x); the returned value
    /// is that fixed coordinate.
    fn nearest_line(&self, p: Point, axis: Axis) -> f64 {
        let origin = axis.of(self.origin);
        let pitch = axis.of_vec(self.spacing);
        origin + ((axis.of(p) - origin) / pitch).round() * pitch
    }
}

/// One snapper per active grid, so snapping can be toggled per grid.
#[derive(Debug, Clone)]
pub struct GridSnapper {
    grid: Grid,
    /// Per-grid switch, independent of the global grid preference.
    pub enabled: bool,
}

impl GridSnapper {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            enabled: true,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The two grid lines nearest to `p`, as (line point, direction,
    /// perpendicular distance) triples.
    fn nearest_lines(&self, p: Point) -> [(Point, Vec2, f64); 2] {
        let vx = self.grid.nearest_line(p, Axis::X);
        let hy = self.grid.nearest_line(p, Axis::Y);
        [
            (Point::new(vx, p.y), Vec2::new(0.0, 1.0), (p.x - vx).abs()),
            (Point::new(p.x, hy), Vec2::new(1.0, 0.0), (p.y - hy).abs()),
        ]
    }
}

impl Snapper for GridSnapper {
    fn might_snap(&self, prefs: &SnapPreferences) -> bool {
        prefs.snap_to_grids && self.enabled
    }

    fn free_snap(
        &mut self,
        collection: &mut CandidateCollection,
        prefs: &SnapPreferences,
        _source: SnapSourceKind,
        point: Point,
        _first_of_batch: bool,
        _selection_bbox: Option<Rect>,
        _ignore: &HashSet<Uuid>,
        _stationary: &[Point],
    ) {
        if !self.might_snap(prefs) {
            return;
        }
        for (line_point, direction, distance) in self.nearest_lines(point) {
            collection.grid_lines.push(LineCandidate {
                position: line_point,
                distance,
                tolerance: grid_tolerance(prefs),
                always_snap: prefs.grid_always_snap,
                target: SnapTargetKind::GridLine,
                line_point,
                direction,
            });
        }
    }

    fn constrained_snap(
        &mut self,
        collection: &mut CandidateCollection,
        prefs: &SnapPreferences,
        _source: SnapSourceKind,
        point: Point,
        _first_of_batch: bool,
        _selection_bbox: Option<Rect>,
        constraint: &ConstraintLine,
        _ignore: &HashSet<Uuid>,
    ) {
        if !self.might_snap(prefs) {
            return;
        }
        for (line_point, direction, _) in self.nearest_lines(point) {
            let Some(x) = constraint.intersect(line_point, direction) else {
                continue;
            };
            collection.points.push(PointCandidate {
                position: x,
                distance: (point - x).hypot(),
                tolerance: grid_tolerance(prefs),
                always_snap: prefs.grid_always_snap,
                target: SnapTargetKind::GridLine,
            });
        }
    }
}

fn grid_tolerance(prefs: &SnapPreferences) -> f64 {
    if prefs.grid_always_snap {
        f64::INFINITY
    } else {
        prefs.grid_tolerance
    }
}
