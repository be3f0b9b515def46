//! Low-level geometric helpers shared by the snappers and the manager.

use kurbo::{Point, Vec2};
use thiserror::Error;

/// Epsilon below which a denominator is treated as zero.
pub const EPS: f64 = 1e-6;

/// Epsilon for "these two snap distances are effectively equal".
pub const DISTANCE_EPS: f64 = 1e-6;

/// Snap distances at or above this value are treated as "did not snap".
/// Deliberately far below `f64::INFINITY` to absorb rounding blow-up.
pub const HUGE_DISTANCE: f64 = 1e6;

/// Errors raised when constructing snap geometry from invalid parameters.
#[derive(Debug, Error, PartialEq)]
pub enum SnapError {
    /// A constraint line needs a direction of non-zero length.
    #[error("constraint direction has near-zero length ({0})")]
    DegenerateConstraint(f64),
    /// Grid pitches must be strictly positive.
    #[error("grid spacing must be positive, got {0}")]
    InvalidGridSpacing(f64),
}

/// A 1-D subspace of the canvas: all points `anchor + t * direction`.
///
/// Used for constrained snapping, where the caller already knows the
/// allowed direction of motion (e.g. stretching along an axis, or scaling
/// radially away from the scale origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintLine {
    anchor: Point,
    direction: Vec2,
}

impl ConstraintLine {
    /// Create a constraint line through `anchor` along `direction`.
    ///
    /// The direction is normalized on construction; a near-zero direction
    /// is rejected because every projection onto it would be degenerate.
    pub fn try_new(anchor: Point, direction: Vec2) -> Result<Self, SnapError> {
        let len = direction.hypot();
        if len < EPS {
            return Err(SnapError::DegenerateConstraint(len));
        }
        Ok(Self {
            anchor,
            direction: direction / len,
        })
    }

    /// Constraint along the given axis unit vector. Infallible because the
    /// axis vectors have unit length.
    pub fn axis_aligned(anchor: Point, axis: crate::transform::Axis) -> Self {
        Self {
            anchor,
            direction: axis.unit(),
        }
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Unit direction of the line.
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Orthogonal projection of `p` onto this line.
    pub fn projection(&self, p: Point) -> Point {
        let t = (p - self.anchor).dot(self.direction);
        self.anchor + t * self.direction
    }

    /// The same direction re-anchored at `anchor`. Used for constrained
    /// translations, where every point of a selection moves along parallel
    /// but not colinear lines.
    pub fn with_anchor(&self, anchor: Point) -> Self {
        Self {
            anchor,
            direction: self.direction,
        }
    }

    /// Intersection with another infinite line given as point + direction.
    pub fn intersect(&self, point: Point, direction: Vec2) -> Option<Point> {
        line_intersection(self.anchor, self.direction, point, direction)
    }
}

/// Counter-clockwise quarter turn.
pub fn rot90(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Intersection of two infinite lines, each given as point + direction.
/// Returns `None` for (near-)parallel lines.
pub fn line_intersection(p1: Point, d1: Vec2, p2: Point, d2: Vec2) -> Option<Point> {
    let denom = d1.cross(d2);
    if denom.abs() < EPS {
        return None;
    }
    let t = (p2 - p1).cross(d2) / denom;
    Some(p1 + t * d1)
}

/// Perpendicular distance from `p` to the infinite line through `point`
/// along `direction`. `direction` need not be normalized.
pub fn distance_to_line(p: Point, point: Point, direction: Vec2) -> f64 {
    let len = direction.hypot();
    if len < EPS {
        return (p - point).hypot();
    }
    ((p - point).cross(direction) / len).abs()
}
