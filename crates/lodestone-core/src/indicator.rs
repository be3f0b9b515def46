//! Snap indicator sink.
//!
//! The engine reports where a snap happened (and, optionally, which source
//! point is the active one); drawing is the host's job. Notifications are
//! fire-and-forget and never influence geometric results.

use crate::snapped::{SnapSourceKind, SnappedPoint};
use kurbo::Point;

/// Receiver for snap indicator updates.
pub trait SnapIndicator {
    /// A snap target was found; show it.
    fn set_target(&mut self, snap: &SnappedPoint);
    /// No target is active anymore.
    fn clear_target(&mut self);
    /// Mark the snap source point (used with the closest-only preference).
    fn set_source(&mut self, position: Point, source: SnapSourceKind);
    /// No source marker is active anymore.
    fn clear_source(&mut self);
}

/// Indicator that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullIndicator;

impl SnapIndicator for NullIndicator {
    fn set_target(&mut self, _snap: &SnappedPoint) {}
    fn clear_target(&mut self) {}
    fn set_source(&mut self, _position: Point, _source: SnapSourceKind) {}
    fn clear_source(&mut self) {}
}
