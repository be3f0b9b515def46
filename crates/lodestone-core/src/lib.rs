//! Lodestone Core Library
//!
//! Geometric snap resolution for canvas editors: grids, guides and object
//! geometry as snap sources, a cross-source best-candidate selector, and
//! whole-selection transformation snapping.

pub mod candidates;
pub mod geometry;
pub mod indicator;
pub mod manager;
pub mod prefs;
pub mod snapped;
pub mod snapper;
pub mod transform;

pub use geometry::{ConstraintLine, SnapError};
pub use indicator::{NullIndicator, SnapIndicator};
pub use manager::{SnapContext, SnapManager};
pub use prefs::SnapPreferences;
pub use snapped::{SnapSourceKind, SnapTargetKind, SnappedPoint};
pub use snapper::{Grid, GridSnapper, Guide, GuideSnapper, ObjectSnapper, SnapItem, Snapper};
pub use transform::{Axis, TransformDescriptor};
