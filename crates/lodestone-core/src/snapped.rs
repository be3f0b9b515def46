//! Snap result types and the cross-kind comparison rule.

use crate::geometry::DISTANCE_EPS;
use crate::transform::TransformDescriptor;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Why a point is being snapped. Echoed into results for the indicator;
/// never influences the geometric computation itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SnapSourceKind {
    #[default]
    Undefined,
    /// An on-curve node of a path being edited or dragged.
    Node,
    /// A corner of the selection bounding box.
    BBoxCorner,
    /// A midpoint of a selection bounding box edge.
    BBoxEdgeMidpoint,
    /// The center of the selection bounding box.
    BBoxCenter,
    /// The rotation center of the selection.
    RotationCenter,
    /// A point on a guide being dragged.
    Guide,
    /// The origin/anchor of a guide being dragged.
    GuideOrigin,
}

/// What a query matched. Mutually exclusive with "unsnapped".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SnapTargetKind {
    #[default]
    Undefined,
    /// An on-curve node of an object.
    Node,
    /// The nearest point of an object path.
    Path,
    /// The crossing of two object paths.
    PathIntersection,
    GridLine,
    GridIntersection,
    GuideLine,
    GuideIntersection,
    /// The crossing of a grid line with a guide line.
    GridGuideIntersection,
    PageBorder,
}

impl SnapTargetKind {
    /// True for targets that fix both degrees of freedom at once.
    pub fn is_intersection(self) -> bool {
        matches!(
            self,
            SnapTargetKind::PathIntersection
                | SnapTargetKind::GridIntersection
                | SnapTargetKind::GuideIntersection
                | SnapTargetKind::GridGuideIntersection
        )
    }
}

/// The canonical result of one snap query.
///
/// An unsnapped result is a sentinel value rather than an error: it carries
/// the original query position, an infinite distance and an undefined
/// target. [`SnappedPoint::unsnapped`] is the only way these fields are
/// combined, keeping the sentinel invariant in one place.
#[derive(Debug, Clone, PartialEq)]
pub struct SnappedPoint {
    /// The resulting position (the target position when snapped, the query
    /// position otherwise).
    pub position: Point,
    pub source: SnapSourceKind,
    pub target: SnapTargetKind,
    /// Primary ranking distance. For line intersections this is the
    /// distance to the nearest of the two crossing lines, not to the
    /// intersection point itself; that keeps intersections competitive
    /// with single lines when a point is nearly aligned with both.
    pub distance: f64,
    /// Maximum distance at which this particular candidate may match.
    pub tolerance: f64,
    /// Distance to the farther of the two crossing lines; 0 when the
    /// target is not an intersection.
    pub second_distance: f64,
    /// False marks the unsnapped sentinel.
    pub snapped: bool,
    /// Candidate matches regardless of distance.
    pub always_snap: bool,
    pub at_intersection: bool,
    /// Distance from an independent reference (the pointer); last-resort
    /// tie-break only.
    pub pointer_distance: f64,
    /// Whole-selection transformation realizing this snap; filled in by
    /// the batch orchestrator only.
    pub transform: Option<TransformDescriptor>,
}

impl SnappedPoint {
    /// The unsnapped sentinel for a query at `position`.
    pub fn unsnapped(position: Point, source: SnapSourceKind) -> Self {
        Self {
            position,
            source,
            target: SnapTargetKind::Undefined,
            distance: f64::INFINITY,
            tolerance: 1.0,
            second_distance: 0.0,
            snapped: false,
            always_snap: false,
            at_intersection: false,
            pointer_distance: f64::INFINITY,
            transform: None,
        }
    }

    /// A plain (non-intersection) snap result.
    pub fn new(
        position: Point,
        source: SnapSourceKind,
        target: SnapTargetKind,
        distance: f64,
        tolerance: f64,
        always_snap: bool,
    ) -> Self {
        Self {
            position,
            source,
            target,
            distance,
            tolerance,
            second_distance: 0.0,
            snapped: true,
            always_snap,
            at_intersection: false,
            pointer_distance: f64::INFINITY,
            transform: None,
        }
    }

    /// An intersection snap result; `distance`/`second_distance` are the
    /// distances to the nearer and farther of the two crossing elements.
    pub fn at_intersection(
        position: Point,
        source: SnapSourceKind,
        target: SnapTargetKind,
        distance: f64,
        second_distance: f64,
        tolerance: f64,
        always_snap: bool,
    ) -> Self {
        Self {
            position,
            source,
            target,
            distance,
            tolerance,
            second_distance,
            snapped: true,
            always_snap,
            at_intersection: true,
            pointer_distance: f64::INFINITY,
            transform: None,
        }
    }

    /// Whether `other` should replace `self` as the current best snap.
    ///
    /// Tie-break tiers, each only consulted when the previous one is
    /// undecided:
    ///  1. an always-snap candidate beats one without, regardless of
    ///     distance;
    ///  2. at (nearly) equal distance an intersection beats a
    ///     non-intersection, unless `prefer_intersection` is off;
    ///  3. smaller primary distance;
    ///  4. at (nearly) equal distance, smaller second distance;
    ///  5. smaller pointer distance.
    pub fn is_other_snap_better(&self, other: &SnappedPoint, prefer_intersection: bool) -> bool {
        if other.snapped != self.snapped {
            return other.snapped;
        }
        if other.always_snap != self.always_snap {
            return other.always_snap;
        }
        let near_equal = (other.distance - self.distance).abs() <= DISTANCE_EPS;
        if prefer_intersection && near_equal && other.at_intersection != self.at_intersection {
            return other.at_intersection;
        }
        if !near_equal {
            return other.distance < self.distance;
        }
        if (other.second_distance - self.second_distance).abs() > DISTANCE_EPS {
            return other.second_distance < self.second_distance;
        }
        other.pointer_distance < self.pointer_distance
    }

    /// True when this candidate is inside its own snapping range.
    pub fn within_tolerance(&self) -> bool {
        self.always_snap || self.distance <= self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(distance: f64) -> SnappedPoint {
        SnappedPoint::new(
            Point::ZERO,
            SnapSourceKind::Node,
            SnapTargetKind::GridLine,
            distance,
            10.0,
            false,
        )
    }

    #[test]
    fn sentinel_invariant() {
        let s = SnappedPoint::unsnapped(Point::new(2.0, 3.0), SnapSourceKind::Node);
        assert!(!s.snapped);
        assert_eq!(s.target, SnapTargetKind::Undefined);
        assert!(s.distance.is_infinite());
        assert!(s.tolerance > 0.0);
        assert_eq!(s.position, Point::new(2.0, 3.0));
    }

    #[test]
    fn any_snap_beats_the_sentinel() {
        let sentinel = SnappedPoint::unsnapped(Point::ZERO, SnapSourceKind::Node);
        assert!(sentinel.is_other_snap_better(&plain(9.9), true));
        assert!(!plain(9.9).is_other_snap_better(&sentinel, true));
    }

    #[test]
    fn closer_snap_wins() {
        assert!(plain(5.0).is_other_snap_better(&plain(2.0), true));
        assert!(!plain(2.0).is_other_snap_better(&plain(5.0), true));
    }

    #[test]
    fn equal_distance_keeps_first() {
        // Neither is strictly better, so a left-to-right scan keeps the
        // first encountered.
        let a = plain(3.0);
        let b = plain(3.0);
        assert!(!a.is_other_snap_better(&b, true));
        assert!(!b.is_other_snap_better(&a, true));
    }

    #[test]
    fn always_snap_beats_distance() {
        let far_but_always = SnappedPoint::new(
            Point::ZERO,
            SnapSourceKind::Node,
            SnapTargetKind::GridLine,
            50.0,
            f64::INFINITY,
            true,
        );
        assert!(plain(0.1).is_other_snap_better(&far_but_always, true));
        assert!(!far_but_always.is_other_snap_better(&plain(0.1), true));
    }

    #[test]
    fn intersection_wins_at_equal_distance() {
        let line = plain(1.0);
        let crossing = SnappedPoint::at_intersection(
            Point::ZERO,
            SnapSourceKind::Node,
            SnapTargetKind::GridIntersection,
            1.0,
            1.5,
            10.0,
            false,
        );
        assert!(line.is_other_snap_better(&crossing, true));
        assert!(!crossing.is_other_snap_better(&line, true));
        // With the preference disabled the tie stands.
        assert!(!line.is_other_snap_better(&crossing, false));
    }

    #[test]
    fn intersection_does_not_win_from_farther_away() {
        let line = plain(1.0);
        let crossing = SnappedPoint::at_intersection(
            Point::ZERO,
            SnapSourceKind::Node,
            SnapTargetKind::GridIntersection,
            4.0,
            4.5,
            10.0,
            false,
        );
        assert!(!line.is_other_snap_better(&crossing, true));
    }

    #[test]
    fn second_distance_breaks_exact_ties() {
        let a = SnappedPoint::at_intersection(
            Point::ZERO,
            SnapSourceKind::Node,
            SnapTargetKind::GridIntersection,
            1.0,
            3.0,
            10.0,
            false,
        );
        let b = SnappedPoint::at_intersection(
            Point::ZERO,
            SnapSourceKind::Node,
            SnapTargetKind::GuideIntersection,
            1.0,
            2.0,
            10.0,
            false,
        );
        assert!(a.is_other_snap_better(&b, true));
        assert!(!b.is_other_snap_better(&a, true));
    }

    #[test]
    fn pointer_distance_is_the_last_resort() {
        let mut a = plain(1.0);
        let mut b = plain(1.0);
        a.pointer_distance = 40.0;
        b.pointer_distance = 20.0;
        assert!(a.is_other_snap_better(&b, true));
        assert!(!b.is_other_snap_better(&a, true));
    }

    #[test]
    fn rule_is_irreflexive() {
        let cases = [
            plain(1.0),
            SnappedPoint::unsnapped(Point::ZERO, SnapSourceKind::Node),
            SnappedPoint::at_intersection(
                Point::ZERO,
                SnapSourceKind::Node,
                SnapTargetKind::GridIntersection,
                1.0,
                2.0,
                10.0,
                true,
            ),
        ];
        for c in &cases {
            assert!(!c.is_other_snap_better(c, true));
            assert!(!c.is_other_snap_better(c, false));
        }
    }

    #[test]
    fn within_tolerance_honors_always_snap() {
        let mut s = plain(50.0);
        assert!(!s.within_tolerance());
        s.always_snap = true;
        assert!(s.within_tolerance());
    }
}
