//! Snapping against object geometry (nodes and paths).

use crate::candidates::{CandidateCollection, CurveCandidate, PointCandidate};
use crate::geometry::ConstraintLine;
use crate::prefs::SnapPreferences;
use crate::snapped::{SnapSourceKind, SnapTargetKind};
use crate::snapper::Snapper;
use kurbo::{BezPath, Line, ParamCurve, ParamCurveNearest, PathEl, Point, Rect, Shape};
use std::collections::HashSet;
use uuid::Uuid;

/// Accuracy for nearest-point-on-segment queries.
const NEAREST_ACCURACY: f64 = 1e-4;

/// Half-length of the segment used to model an infinite constraint line
/// when intersecting it with path segments.
const CONSTRAINT_EXTENT: f64 = 1e4;

/// A snappable canvas item: its identity (for the ignore list) and its
/// outline geometry.
#[derive(Debug, Clone)]
pub struct SnapItem {
    pub id: Uuid,
    pub path: BezPath,
}

impl SnapItem {
    pub fn new(path: BezPath) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
        }
    }
}

/// The single snapper covering all object geometry of a document.
///
/// The first query of a gesture rebuilds the candidate cache (the
/// ignore-filtered paths plus the page border); later points of the same
/// gesture reuse it.
#[derive(Debug, Clone, Default)]
pub struct ObjectSnapper {
    pub items: Vec<SnapItem>,
    /// Page rectangle; snapped as a path when the preference is on.
    pub page: Option<Rect>,
    cache: Vec<(BezPath, Rect, SnapTargetKind)>,
}

impl ObjectSnapper {
    pub fn new(items: Vec<SnapItem>) -> Self {
        Self {
            items,
            page: None,
            cache: Vec::new(),
        }
    }

    fn rebuild_cache(&mut self, prefs: &SnapPreferences, ignore: &HashSet<Uuid>) {
        self.cache.clear();
        for item in &self.items {
            if ignore.contains(&item.id) {
                continue;
            }
            let bbox = item.path.bounding_box();
            self.cache
                .push((item.path.clone(), bbox, SnapTargetKind::Path));
        }
        if prefs.snap_to_page_border {
            if let Some(page) = self.page {
                let path = border_path(page);
                self.cache.push((path, page, SnapTargetKind::PageBorder));
            }
        }
    }

    /// Skip items too far away to ever fall within tolerance, either of
    /// the query point or of the whole selection box.
    fn in_range(bbox: Rect, point: Point, selection_bbox: Option<Rect>, tolerance: f64) -> bool {
        let inflated = bbox.inflate(tolerance, tolerance);
        if inflated.contains(point) {
            return true;
        }
        selection_bbox.is_some_and(|sel| rects_overlap(inflated, sel))
    }
}

impl Snapper for ObjectSnapper {
    fn might_snap(&self, prefs: &SnapPreferences) -> bool {
        if !prefs.snap_to_objects {
            return false;
        }
        let has_geometry =
            !self.items.is_empty() || (prefs.snap_to_page_border && self.page.is_some());
        has_geometry && (prefs.snap_to_nodes || prefs.snap_to_paths)
    }

    fn free_snap(
        &mut self,
        collection: &mut CandidateCollection,
        prefs: &SnapPreferences,
        _source: SnapSourceKind,
        point: Point,
        first_of_batch: bool,
        selection_bbox: Option<Rect>,
        ignore: &HashSet<Uuid>,
        stationary: &[Point],
    ) {
        if !self.might_snap(prefs) {
            return;
        }
        if first_of_batch || self.cache.is_empty() {
            self.rebuild_cache(prefs, ignore);
        }
        let tolerance = prefs.object_tolerance;

        if prefs.snap_to_nodes {
            for p in stationary {
                collection.points.push(PointCandidate {
                    position: *p,
                    distance: (point - *p).hypot(),
                    tolerance,
                    always_snap: false,
                    target: SnapTargetKind::Node,
                });
            }
            for (path, bbox, target) in &self.cache {
                if *target != SnapTargetKind::Path
                    || !Self::in_range(*bbox, point, selection_bbox, tolerance)
                {
                    continue;
                }
                for node in on_curve_nodes(path) {
                    collection.points.push(PointCandidate {
                        position: node,
                        distance: (point - node).hypot(),
                        tolerance,
                        always_snap: false,
                        target: SnapTargetKind::Node,
                    });
                }
            }
        }

        if prefs.snap_to_paths {
            for (path, bbox, target) in &self.cache {
                if !Self::in_range(*bbox, point, selection_bbox, tolerance) {
                    continue;
                }
                let Some((nearest, distance)) = nearest_on_path(path, point) else {
                    continue;
                };
                collection.curves.push(CurveCandidate {
                    position: nearest,
                    distance,
                    tolerance,
                    always_snap: false,
                    target: *target,
                    path: path.clone(),
                });
            }
        }
    }

    fn constrained_snap(
        &mut self,
        collection: &mut CandidateCollection,
        prefs: &SnapPreferences,
        _source: SnapSourceKind,
        point: Point,
        first_of_batch: bool,
        _selection_bbox: Option<Rect>,
        constraint: &ConstraintLine,
        ignore: &HashSet<Uuid>,
    ) {
        if !self.might_snap(prefs) || !prefs.snap_to_paths {
            return;
        }
        if first_of_batch || self.cache.is_empty() {
            self.rebuild_cache(prefs, ignore);
        }
        // Model the infinite constraint as a long segment centred on the
        // query point, so segment-parameter clipping inside kurbo cannot
        // cut off relevant intersections.
        let dir = constraint.direction();
        let anchor = constraint.projection(point);
        let line = Line::new(
            anchor - CONSTRAINT_EXTENT * dir,
            anchor + CONSTRAINT_EXTENT * dir,
        );
        for (path, _, target) in &self.cache {
            for seg in path.segments() {
                for hit in seg.intersect_line(line) {
                    let x = seg.eval(hit.segment_t);
                    collection.points.push(PointCandidate {
                        position: x,
                        distance: (point - x).hypot(),
                        tolerance: prefs.object_tolerance,
                        always_snap: false,
                        target: *target,
                    });
                }
            }
        }
    }
}

/// On-curve nodes of a path (segment start/end points; control points are
/// not snappable).
fn on_curve_nodes(path: &BezPath) -> Vec<Point> {
    let mut nodes = Vec::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => nodes.push(p),
            PathEl::QuadTo(_, p) => nodes.push(p),
            PathEl::CurveTo(_, _, p) => nodes.push(p),
            PathEl::ClosePath => {}
        }
    }
    nodes
}

/// Nearest point of a path to `p`, with its Euclidean distance.
fn nearest_on_path(path: &BezPath, p: Point) -> Option<(Point, f64)> {
    let mut best: Option<(Point, f64)> = None;
    for seg in path.segments() {
        let nearest = seg.nearest(p, NEAREST_ACCURACY);
        let candidate = seg.eval(nearest.t);
        let distance = nearest.distance_sq.sqrt();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((candidate, distance)),
        }
    }
    best
}

fn border_path(page: Rect) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(Point::new(page.x0, page.y0));
    path.line_to(Point::new(page.x1, page.y0));
    path.line_to(Point::new(page.x1, page.y1));
    path.line_to(Point::new(page.x0, page.y1));
    path.close_path();
    path
}

fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}
