//! Raw snap candidates accumulated during one query, and the reductions
//! that collapse them into comparable [`SnappedPoint`]s.
//!
//! A collection is write-once: the snappers append to it, the selector
//! reduces it, then it is discarded.

use crate::geometry::line_intersection;
use crate::snapped::{SnapSourceKind, SnapTargetKind, SnappedPoint};
use kurbo::{flatten, BezPath, PathEl, Point, Vec2};

/// Flattening tolerance used when searching for curve-curve intersections.
const FLATTEN_TOLERANCE: f64 = 0.01;

/// A point-like candidate (object node, stationary node, or the
/// intersection of a constraint with some other geometry).
#[derive(Debug, Clone)]
pub struct PointCandidate {
    pub position: Point,
    pub distance: f64,
    pub tolerance: f64,
    pub always_snap: bool,
    pub target: SnapTargetKind,
}

/// A candidate on a path, carrying the path itself so intersections with
/// other snapped paths can be searched later.
#[derive(Debug, Clone)]
pub struct CurveCandidate {
    /// Nearest point of the path to the query.
    pub position: Point,
    pub distance: f64,
    pub tolerance: f64,
    pub always_snap: bool,
    pub target: SnapTargetKind,
    pub path: BezPath,
}

/// An infinite-line candidate (grid or guide line).
#[derive(Debug, Clone)]
pub struct LineCandidate {
    /// Projection of the query onto the line.
    pub position: Point,
    /// Perpendicular distance from the query to the line.
    pub distance: f64,
    pub tolerance: f64,
    pub always_snap: bool,
    pub target: SnapTargetKind,
    /// A point on the line.
    pub line_point: Point,
    /// Direction of the line.
    pub direction: Vec2,
}

/// All raw candidates produced for one query, grouped by kind.
#[derive(Debug, Clone, Default)]
pub struct CandidateCollection {
    pub points: Vec<PointCandidate>,
    pub curves: Vec<CurveCandidate>,
    pub grid_lines: Vec<LineCandidate>,
    pub guide_lines: Vec<LineCandidate>,
}

impl CandidateCollection {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
            && self.curves.is_empty()
            && self.grid_lines.is_empty()
            && self.guide_lines.is_empty()
    }

    /// Nearest point candidate.
    pub fn closest_point(&self, source: SnapSourceKind) -> Option<SnappedPoint> {
        let best = closest_by_distance(&self.points, |c| c.distance)?;
        Some(SnappedPoint::new(
            best.position,
            source,
            best.target,
            best.distance,
            best.tolerance,
            best.always_snap,
        ))
    }

    /// Nearest curve candidate.
    pub fn closest_curve(&self, source: SnapSourceKind) -> Option<SnappedPoint> {
        let best = closest_by_distance(&self.curves, |c| c.distance)?;
        Some(SnappedPoint::new(
            best.position,
            source,
            best.target,
            best.distance,
            best.tolerance,
            best.always_snap,
        ))
    }

    /// Nearest grid line.
    pub fn closest_grid_line(&self, source: SnapSourceKind) -> Option<SnappedPoint> {
        closest_line(&self.grid_lines, source)
    }

    /// Nearest guide line.
    pub fn closest_guide_line(&self, source: SnapSourceKind) -> Option<SnappedPoint> {
        closest_line(&self.guide_lines, source)
    }

    /// Nearest intersection of two snapped grid lines.
    pub fn closest_grid_intersection(&self, source: SnapSourceKind) -> Option<SnappedPoint> {
        closest_intersection_within(&self.grid_lines, source, SnapTargetKind::GridIntersection)
    }

    /// Nearest intersection of two snapped guide lines.
    pub fn closest_guide_intersection(&self, source: SnapSourceKind) -> Option<SnappedPoint> {
        closest_intersection_within(&self.guide_lines, source, SnapTargetKind::GuideIntersection)
    }

    /// Nearest intersection of a snapped grid line with a snapped guide
    /// line.
    pub fn closest_grid_guide_intersection(&self, source: SnapSourceKind) -> Option<SnappedPoint> {
        let mut best: Option<SnappedPoint> = None;
        for a in &self.grid_lines {
            for b in &self.guide_lines {
                consider_line_pair(
                    &mut best,
                    a,
                    b,
                    source,
                    SnapTargetKind::GridGuideIntersection,
                );
            }
        }
        best
    }

    /// Nearest intersection of two snapped curves, ranked by Euclidean
    /// distance from the query point to the crossing.
    ///
    /// kurbo has no exact path-path intersection, so both paths are
    /// flattened and their segments intersected pairwise.
    pub fn closest_curve_intersection(
        &self,
        query: Point,
        source: SnapSourceKind,
    ) -> Option<SnappedPoint> {
        let mut best: Option<SnappedPoint> = None;
        for (i, a) in self.curves.iter().enumerate() {
            let segs_a = flatten_to_segments(&a.path);
            for b in &self.curves[i + 1..] {
                let segs_b = flatten_to_segments(&b.path);
                for &(a0, a1) in &segs_a {
                    for &(b0, b1) in &segs_b {
                        let Some(x) = segment_intersection(a0, a1, b0, b1) else {
                            continue;
                        };
                        let distance = (query - x).hypot();
                        let candidate = SnappedPoint::at_intersection(
                            x,
                            source,
                            SnapTargetKind::PathIntersection,
                            distance,
                            a.distance.max(b.distance),
                            a.tolerance.min(b.tolerance),
                            a.always_snap && b.always_snap,
                        );
                        replace_if_closer(&mut best, candidate);
                    }
                }
            }
        }
        best
    }
}

fn closest_by_distance<T>(items: &[T], distance: impl Fn(&T) -> f64) -> Option<&T> {
    let mut best: Option<&T> = None;
    for item in items {
        match best {
            Some(b) if distance(item) >= distance(b) => {}
            _ => best = Some(item),
        }
    }
    best
}

fn closest_line(lines: &[LineCandidate], source: SnapSourceKind) -> Option<SnappedPoint> {
    let best = closest_by_distance(lines, |c| c.distance)?;
    Some(SnappedPoint::new(
        best.position,
        source,
        best.target,
        best.distance,
        best.tolerance,
        best.always_snap,
    ))
}

fn closest_intersection_within(
    lines: &[LineCandidate],
    source: SnapSourceKind,
    target: SnapTargetKind,
) -> Option<SnappedPoint> {
    let mut best: Option<SnappedPoint> = None;
    for (i, a) in lines.iter().enumerate() {
        for b in &lines[i + 1..] {
            consider_line_pair(&mut best, a, b, source, target);
        }
    }
    best
}

/// Score the crossing of two lines and keep it if it beats the current
/// best. The primary distance of a line-line intersection is the distance
/// to the nearer of the two lines; the distance to the farther one becomes
/// the second distance.
fn consider_line_pair(
    best: &mut Option<SnappedPoint>,
    a: &LineCandidate,
    b: &LineCandidate,
    source: SnapSourceKind,
    target: SnapTargetKind,
) {
    let Some(x) = line_intersection(a.line_point, a.direction, b.line_point, b.direction) else {
        return;
    };
    let candidate = SnappedPoint::at_intersection(
        x,
        source,
        target,
        a.distance.min(b.distance),
        a.distance.max(b.distance),
        a.tolerance.min(b.tolerance),
        a.always_snap && b.always_snap,
    );
    replace_if_closer(best, candidate);
}

fn replace_if_closer(best: &mut Option<SnappedPoint>, candidate: SnappedPoint) {
    match best {
        Some(b) if candidate.distance >= b.distance => {}
        _ => *best = Some(candidate),
    }
}

/// Flatten a path into straight segments.
fn flatten_to_segments(path: &BezPath) -> Vec<(Point, Point)> {
    let mut segments = Vec::new();
    let mut subpath_start = Point::ZERO;
    let mut current = Point::ZERO;
    flatten(path.elements().iter().copied(), FLATTEN_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            subpath_start = p;
            current = p;
        }
        PathEl::LineTo(p) => {
            segments.push((current, p));
            current = p;
        }
        PathEl::ClosePath => {
            segments.push((current, subpath_start));
            current = subpath_start;
        }
        // flatten() only emits MoveTo/LineTo/ClosePath.
        _ => {}
    });
    segments
}

/// Intersection of two finite segments, or `None` when they miss.
fn segment_intersection(a0: Point, a1: Point, b0: Point, b1: Point) -> Option<Point> {
    let da = a1 - a0;
    let db = b1 - b0;
    let denom = da.cross(db);
    if denom.abs() < 1e-12 {
        return None;
    }
    let t = (b0 - a0).cross(db) / denom;
    let u = (b0 - a0).cross(da) / denom;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }
    Some(a0 + t * da)
}
