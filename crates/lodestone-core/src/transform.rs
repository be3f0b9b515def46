//! Transformation descriptors applied to selections while snapping.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// One of the two canvas axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// The other axis.
    pub fn other(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// Unit vector along this axis.
    pub fn unit(self) -> Vec2 {
        match self {
            Axis::X => Vec2::new(1.0, 0.0),
            Axis::Y => Vec2::new(0.0, 1.0),
        }
    }

    /// Component of a point along this axis.
    pub fn of(self, p: Point) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }

    /// Component of a vector along this axis.
    pub fn of_vec(self, v: Vec2) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    /// Replace this axis' component of a point.
    pub fn set(self, p: &mut Point, value: f64) {
        match self {
            Axis::X => p.x = value,
            Axis::Y => p.y = value,
        }
    }
}

/// A proposed transformation of a whole selection.
///
/// All families except `Translation` share a common origin. The descriptor
/// is pure data; [`TransformDescriptor::apply`] maps single points through
/// it without mutating anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransformDescriptor {
    /// Move every point by `offset`.
    Translation { offset: Vec2 },
    /// Scale about `origin` with independent per-axis factors.
    Scale { factors: Vec2, origin: Point },
    /// Scale a single axis about `origin`; if `uniform`, the other axis
    /// receives the same factor, otherwise it is held at 1.
    Stretch {
        factor: f64,
        axis: Axis,
        uniform: bool,
        origin: Point,
    },
    /// Skew along `axis` by `skew`, while the other axis is rescaled by
    /// `scale` about the origin (mirroring during a skew is allowed).
    Skew {
        skew: f64,
        scale: f64,
        axis: Axis,
        origin: Point,
    },
}

impl TransformDescriptor {
    /// Apply this transformation to a single point.
    pub fn apply(&self, p: Point) -> Point {
        match *self {
            TransformDescriptor::Translation { offset } => p + offset,
            TransformDescriptor::Scale { factors, origin } => {
                let b = p - origin;
                origin + Vec2::new(b.x * factors.x, b.y * factors.y)
            }
            TransformDescriptor::Stretch {
                factor,
                axis,
                uniform,
                origin,
            } => {
                let b = p - origin;
                let (fx, fy) = match (axis, uniform) {
                    (_, true) => (factor, factor),
                    (Axis::X, false) => (factor, 1.0),
                    (Axis::Y, false) => (1.0, factor),
                };
                origin + Vec2::new(b.x * fx, b.y * fy)
            }
            TransformDescriptor::Skew {
                skew,
                scale,
                axis,
                origin,
            } => {
                let other = axis.other();
                let mut out = p;
                axis.set(&mut out, axis.of(p) + skew * (other.of(p) - other.of(origin)));
                other.set(
                    &mut out,
                    (other.of(p) - other.of(origin)) * scale + other.of(origin),
                );
                out
            }
        }
    }

    /// Origin of the transformation; the translation family has none.
    pub fn origin(&self) -> Option<Point> {
        match *self {
            TransformDescriptor::Translation { .. } => None,
            TransformDescriptor::Scale { origin, .. }
            | TransformDescriptor::Stretch { origin, .. }
            | TransformDescriptor::Skew { origin, .. } => Some(origin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn translation_moves_point() {
        let tr = TransformDescriptor::Translation {
            offset: Vec2::new(3.0, -2.0),
        };
        assert!(close(tr.apply(Point::new(1.0, 1.0)), Point::new(4.0, -1.0)));
    }

    #[test]
    fn scale_about_origin() {
        let tr = TransformDescriptor::Scale {
            factors: Vec2::new(2.0, 0.5),
            origin: Point::new(1.0, 1.0),
        };
        assert!(close(tr.apply(Point::new(3.0, 5.0)), Point::new(5.0, 3.0)));
        // The origin itself is a fixed point.
        assert!(close(tr.apply(Point::new(1.0, 1.0)), Point::new(1.0, 1.0)));
    }

    #[test]
    fn stretch_single_axis() {
        let tr = TransformDescriptor::Stretch {
            factor: 3.0,
            axis: Axis::Y,
            uniform: false,
            origin: Point::ZERO,
        };
        assert!(close(tr.apply(Point::new(2.0, 2.0)), Point::new(2.0, 6.0)));
    }

    #[test]
    fn stretch_uniform_scales_both_axes() {
        let tr = TransformDescriptor::Stretch {
            factor: 2.0,
            axis: Axis::X,
            uniform: true,
            origin: Point::ZERO,
        };
        assert!(close(tr.apply(Point::new(1.0, 4.0)), Point::new(2.0, 8.0)));
    }

    #[test]
    fn skew_offsets_by_other_axis() {
        let tr = TransformDescriptor::Skew {
            skew: 0.5,
            scale: 1.0,
            axis: Axis::X,
            origin: Point::ZERO,
        };
        // x gains skew * (y - origin.y), y is unchanged at scale 1.
        assert!(close(tr.apply(Point::new(1.0, 4.0)), Point::new(3.0, 4.0)));
    }

    #[test]
    fn skew_rescales_other_axis() {
        let tr = TransformDescriptor::Skew {
            skew: 0.0,
            scale: -1.0,
            axis: Axis::X,
            origin: Point::new(0.0, 2.0),
        };
        // Mirror about y = 2.
        assert!(close(tr.apply(Point::new(1.0, 5.0)), Point::new(1.0, -1.0)));
    }

    #[test]
    fn apply_does_not_mutate_input() {
        let p = Point::new(1.0, 2.0);
        let tr = TransformDescriptor::Translation {
            offset: Vec2::new(1.0, 1.0),
        };
        let _ = tr.apply(p);
        assert_eq!(p, Point::new(1.0, 2.0));
    }
}
