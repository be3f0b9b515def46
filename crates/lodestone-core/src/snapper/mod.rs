//! Candidate sources: grid, guide and object snappers.
//!
//! Each snapper turns one kind of canvas geometry into raw candidates.
//! The set of kinds is closed, so the manager dispatches over the concrete
//! structs in a fixed order (guides, objects, grids); the trait only pins
//! down the shared contract.

mod grid;
mod guide;
mod object;

pub use grid::{Grid, GridSnapper};
pub use guide::{Guide, GuideSnapper};
pub use object::{ObjectSnapper, SnapItem};

use crate::candidates::CandidateCollection;
use crate::geometry::ConstraintLine;
use crate::prefs::SnapPreferences;
use crate::snapped::SnapSourceKind;
use kurbo::{Point, Rect};
use std::collections::HashSet;
use uuid::Uuid;

/// A provider of raw snap candidates.
///
/// Queries only append to the collection; `ignore` and `stationary` are
/// read-only. `first_of_batch` marks the first point of a gesture so
/// expensive per-gesture precomputation can be reused for the remaining
/// points (a performance contract, not a correctness one).
pub trait Snapper {
    /// Cheap pre-check: could this source produce any candidate under the
    /// current preferences?
    fn might_snap(&self, prefs: &SnapPreferences) -> bool;

    /// Unconstrained query around `point`.
    #[allow(clippy::too_many_arguments)]
    fn free_snap(
        &mut self,
        collection: &mut CandidateCollection,
        prefs: &SnapPreferences,
        source: SnapSourceKind,
        point: Point,
        first_of_batch: bool,
        selection_bbox: Option<Rect>,
        ignore: &HashSet<Uuid>,
        stationary: &[Point],
    );

    /// Query restricted to candidates lying on `constraint`. `point` is
    /// already projected onto the constraint by the caller.
    #[allow(clippy::too_many_arguments)]
    fn constrained_snap(
        &mut self,
        collection: &mut CandidateCollection,
        prefs: &SnapPreferences,
        source: SnapSourceKind,
        point: Point,
        first_of_batch: bool,
        selection_bbox: Option<Rect>,
        constraint: &ConstraintLine,
        ignore: &HashSet<Uuid>,
    );
}
