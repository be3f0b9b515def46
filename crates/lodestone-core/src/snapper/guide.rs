//! Snapping against guide lines.

use crate::candidates::{CandidateCollection, LineCandidate, PointCandidate};
use crate::geometry::{rot90, ConstraintLine, SnapError, EPS};
use crate::prefs::SnapPreferences;
use crate::snapped::{SnapSourceKind, SnapTargetKind};
use crate::snapper::Snapper;
use kurbo::{Point, Rect, Vec2};
use std::collections::HashSet;
use uuid::Uuid;

/// An infinite guide line, stored as an anchor point plus its normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guide {
    pub id: Uuid,
    /// A point on the guide (its draggable origin).
    pub point: Point,
    /// Normal of the guide line.
    pub normal: Vec2,
}

impl Guide {
    pub fn new(point: Point, normal: Vec2) -> Self {
        Self {
            id: Uuid::new_v4(),
            point,
            normal,
        }
    }

    /// Direction along the guide line.
    pub fn direction(&self) -> Vec2 {
        rot90(self.normal)
    }

    /// The guide as a snapping constraint (used when dragging a guide's
    /// origin along the guide itself). Fails for a degenerate normal.
    pub fn as_constraint(&self) -> Result<ConstraintLine, SnapError> {
        ConstraintLine::try_new(self.point, self.direction())
    }
}

/// The single snapper covering all guides of a document.
#[derive(Debug, Clone, Default)]
pub struct GuideSnapper {
    pub guides: Vec<Guide>,
}

impl GuideSnapper {
    pub fn new(guides: Vec<Guide>) -> Self {
        Self { guides }
    }

    fn active_guides<'a>(
        &'a self,
        ignore: &'a HashSet<Uuid>,
    ) -> impl Iterator<Item = &'a Guide> + 'a {
        // A near-zero normal leaves the guide without a line direction;
        // projecting onto it would divide by zero.
        self.guides
            .iter()
            .filter(move |g| !ignore.contains(&g.id) && g.normal.hypot() >= EPS)
    }
}

impl Snapper for GuideSnapper {
    fn might_snap(&self, prefs: &SnapPreferences) -> bool {
        prefs.snap_to_guides && !self.guides.is_empty()
    }

    fn free_snap(
        &mut self,
        collection: &mut CandidateCollection,
        prefs: &SnapPreferences,
        _source: SnapSourceKind,
        point: Point,
        _first_of_batch: bool,
        _selection_bbox: Option<Rect>,
        ignore: &HashSet<Uuid>,
        _stationary: &[Point],
    ) {
        if !self.might_snap(prefs) {
            return;
        }
        for guide in self.active_guides(ignore) {
            let direction = guide.direction();
            let t = (point - guide.point).dot(direction) / direction.dot(direction);
            let projected = guide.point + t * direction;
            collection.guide_lines.push(LineCandidate {
                position: projected,
                distance: (point - projected).hypot(),
                tolerance: guide_tolerance(prefs),
                always_snap: prefs.guide_always_snap,
                target: SnapTargetKind::GuideLine,
                line_point: guide.point,
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
        ignore: &HashSet<Uuid>,
    ) {
        if !self.might_snap(prefs) {
            return;
        }
        for guide in self.active_guides(ignore) {
            let Some(x) = constraint.intersect(guide.point, guide.direction()) else {
                continue;
            };
            collection.points.push(PointCandidate {
                position: x,
                distance: (point - x).hypot(),
                tolerance: guide_tolerance(prefs),
                always_snap: prefs.guide_always_snap,
                target: SnapTargetKind::GuideLine,
            });
        }
    }
}

fn guide_tolerance(prefs: &SnapPreferences) -> f64 {
    if prefs.guide_always_snap {
        f64::INFINITY
    } else {
        prefs.guide_tolerance
    }
}
