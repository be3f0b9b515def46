//! The snap manager: drives queries across all sources, reduces the
//! results, and resolves whole-selection transformations.

use crate::candidates::CandidateCollection;
use crate::geometry::{ConstraintLine, EPS, HUGE_DISTANCE};
use crate::indicator::{NullIndicator, SnapIndicator};
use crate::prefs::SnapPreferences;
use crate::snapped::{SnapSourceKind, SnappedPoint};
use crate::snapper::{GridSnapper, GuideSnapper, ObjectSnapper, Snapper};
use crate::transform::{Axis, TransformDescriptor};
use kurbo::{Point, Rect, Vec2};
use std::collections::HashSet;
use uuid::Uuid;

/// Second-distance placeholder for metrics that have no second line.
const NO_SECOND_DISTANCE: f64 = HUGE_DISTANCE;

/// Per-gesture query context, built once by the caller when a drag starts
/// and passed by reference into every snap call.
///
/// `ignore` is the single merged set of everything that must not be
/// snapped to (dragged items and dragged guides alike); `stationary` holds
/// unselected node positions that remain valid targets while editing a
/// path.
#[derive(Debug, Clone)]
pub struct SnapContext {
    /// Pointer position when the gesture started; only used as the
    /// last-resort tie-break and for batch metrics.
    pub pointer: Point,
    pub ignore: HashSet<Uuid>,
    pub stationary: Vec<Point>,
    /// Whether this gesture wants indicator updates.
    pub indicator_enabled: bool,
}

impl SnapContext {
    pub fn new(pointer: Point) -> Self {
        Self {
            pointer,
            ignore: HashSet::new(),
            stationary: Vec::new(),
            indicator_enabled: false,
        }
    }
}

/// Aggregates one guide snapper, one object snapper and one snapper per
/// active grid, and reduces their candidates into single results.
///
/// Every query is a self-contained request/response cycle; the only state
/// that outlives a call is the object snapper's per-gesture geometry cache.
pub struct SnapManager {
    pub prefs: SnapPreferences,
    pub guide: GuideSnapper,
    pub object: ObjectSnapper,
    pub grids: Vec<GridSnapper>,
    indicator: Box<dyn SnapIndicator>,
}

impl Default for SnapManager {
    fn default() -> Self {
        Self::new(SnapPreferences::default())
    }
}

impl SnapManager {
    pub fn new(prefs: SnapPreferences) -> Self {
        Self {
            prefs,
            guide: GuideSnapper::default(),
            object: ObjectSnapper::default(),
            grids: Vec::new(),
            indicator: Box::new(NullIndicator),
        }
    }

    /// Replace the indicator sink.
    pub fn set_indicator(&mut self, indicator: Box<dyn SnapIndicator>) {
        self.indicator = indicator;
    }

    /// Cheap pre-check across all sources; mandatory short-circuit before
    /// any querying.
    pub fn some_snapper_might_snap(&self) -> bool {
        if !self.prefs.active() {
            return false;
        }
        self.guide.might_snap(&self.prefs)
            || self.object.might_snap(&self.prefs)
            || self.grids.iter().any(|g| g.might_snap(&self.prefs))
    }

    /// Grid-only variant of the pre-check.
    pub fn grid_snapper_might_snap(&self) -> bool {
        self.prefs.active() && self.grids.iter().any(|g| g.might_snap(&self.prefs))
    }

    /// Snap a point in two degrees of freedom: any direction, to the
    /// nearest target of any source.
    pub fn free_snap(
        &mut self,
        ctx: &SnapContext,
        source: SnapSourceKind,
        point: Point,
        first_of_batch: bool,
        selection_bbox: Option<Rect>,
    ) -> SnappedPoint {
        if !self.some_snapper_might_snap() {
            return SnappedPoint::unsnapped(point, source);
        }
        let mut sc = CandidateCollection::default();
        // Fixed source order keeps tie-breaking deterministic.
        self.guide.free_snap(
            &mut sc,
            &self.prefs,
            source,
            point,
            first_of_batch,
            selection_bbox,
            &ctx.ignore,
            &ctx.stationary,
        );
        self.object.free_snap(
            &mut sc,
            &self.prefs,
            source,
            point,
            first_of_batch,
            selection_bbox,
            &ctx.ignore,
            &ctx.stationary,
        );
        for grid in &mut self.grids {
            grid.free_snap(
                &mut sc,
                &self.prefs,
                source,
                point,
                first_of_batch,
                selection_bbox,
                &ctx.ignore,
                &ctx.stationary,
            );
        }
        self.find_best_snap(ctx, point, source, &sc, false, true)
    }

    /// Snap the pointer itself, e.g. while drawing. Works like
    /// [`SnapManager::free_snap`] but does not prefer intersections over
    /// plain lines at equal distance; when drawing freehand the nearest
    /// geometry is less surprising than a crossing slightly off to the
    /// side.
    pub fn pointer_free_snap(&mut self, ctx: &SnapContext, point: Point) -> SnappedPoint {
        let source = SnapSourceKind::Undefined;
        if !self.some_snapper_might_snap() {
            return SnappedPoint::unsnapped(point, source);
        }
        let mut sc = CandidateCollection::default();
        self.guide.free_snap(
            &mut sc,
            &self.prefs,
            source,
            point,
            true,
            None,
            &ctx.ignore,
            &ctx.stationary,
        );
        self.object.free_snap(
            &mut sc,
            &self.prefs,
            source,
            point,
            true,
            None,
            &ctx.ignore,
            &ctx.stationary,
        );
        for grid in &mut self.grids {
            grid.free_snap(
                &mut sc,
                &self.prefs,
                source,
                point,
                true,
                None,
                &ctx.ignore,
                &ctx.stationary,
            );
        }
        self.find_best_snap(ctx, point, source, &sc, false, false)
    }

    /// Snap a point in one degree of freedom, along `constraint`.
    pub fn constrained_snap(
        &mut self,
        ctx: &SnapContext,
        source: SnapSourceKind,
        point: Point,
        first_of_batch: bool,
        selection_bbox: Option<Rect>,
        constraint: &ConstraintLine,
    ) -> SnappedPoint {
        if !self.some_snapper_might_snap() {
            return SnappedPoint::unsnapped(point, source);
        }
        let projected = constraint.projection(point);
        let mut sc = CandidateCollection::default();
        self.guide.constrained_snap(
            &mut sc,
            &self.prefs,
            source,
            projected,
            first_of_batch,
            selection_bbox,
            constraint,
            &ctx.ignore,
        );
        self.object.constrained_snap(
            &mut sc,
            &self.prefs,
            source,
            projected,
            first_of_batch,
            selection_bbox,
            constraint,
            &ctx.ignore,
        );
        for grid in &mut self.grids {
            grid.constrained_snap(
                &mut sc,
                &self.prefs,
                source,
                projected,
                first_of_batch,
                selection_bbox,
                constraint,
                &ctx.ignore,
            );
        }
        self.find_best_snap(ctx, point, source, &sc, true, true)
    }

    /// Snap a dragged guide to object geometry or other guides (grids are
    /// deliberately not consulted; a guide aligned to the grid has no
    /// value over the grid itself).
    pub fn guide_free_snap(&mut self, ctx: &SnapContext, point: Point) -> SnappedPoint {
        let source = SnapSourceKind::Guide;
        if !self.prefs.active() {
            return SnappedPoint::unsnapped(point, source);
        }
        if !self.object.might_snap(&self.prefs) && !self.guide.might_snap(&self.prefs) {
            return SnappedPoint::unsnapped(point, source);
        }
        let mut sc = CandidateCollection::default();
        self.guide.free_snap(
            &mut sc,
            &self.prefs,
            source,
            point,
            true,
            None,
            &ctx.ignore,
            &ctx.stationary,
        );
        self.object.free_snap(
            &mut sc,
            &self.prefs,
            source,
            point,
            true,
            None,
            &ctx.ignore,
            &ctx.stationary,
        );
        self.find_best_snap(ctx, point, source, &sc, false, true)
    }

    /// Snap a point of a guide along the guide itself, e.g. while dragging
    /// the guide's origin, to crossings with paths and other guides.
    pub fn guide_constrained_snap(
        &mut self,
        ctx: &SnapContext,
        point: Point,
        guide: &crate::snapper::Guide,
    ) -> SnappedPoint {
        let source = SnapSourceKind::GuideOrigin;
        if !self.prefs.active() {
            return SnappedPoint::unsnapped(point, source);
        }
        if !self.object.might_snap(&self.prefs) && !self.guide.might_snap(&self.prefs) {
            return SnappedPoint::unsnapped(point, source);
        }
        // A guide with a degenerate normal has no line to slide along.
        let Ok(constraint) = guide.as_constraint() else {
            return SnappedPoint::unsnapped(point, source);
        };
        let projected = constraint.projection(point);
        let mut sc = CandidateCollection::default();
        self.guide.constrained_snap(
            &mut sc,
            &self.prefs,
            source,
            projected,
            true,
            None,
            &constraint,
            &ctx.ignore,
        );
        self.object.constrained_snap(
            &mut sc,
            &self.prefs,
            source,
            projected,
            true,
            None,
            &constraint,
            &ctx.ignore,
        );
        self.find_best_snap(ctx, point, source, &sc, true, true)
    }

    /// Round a paste/duplicate offset to the nearest multiple of a grid
    /// pitch, compensating for the grid origin, so aligned copies stay
    /// aligned. With several grids the closest result wins.
    pub fn multiple_of_grid_pitch(&mut self, offset: Vec2) -> Vec2 {
        if !self.prefs.enabled {
            return offset;
        }
        let mut nearest: Option<(Vec2, f64)> = None;
        let ignore = HashSet::new();
        for grid in &mut self.grids {
            if !grid.might_snap(&self.prefs) {
                continue;
            }
            // Snapping `offset` itself to the grid finds the nearest
            // multiple, provided the grid origin is compensated.
            let origin = grid.grid().origin();
            let query = Point::new(offset.x + origin.x, offset.y + origin.y);
            let mut sc = CandidateCollection::default();
            grid.free_snap(
                &mut sc,
                &self.prefs,
                SnapSourceKind::Undefined,
                query,
                true,
                None,
                &ignore,
                &[],
            );
            let best = select_best(
                &self.prefs,
                query,
                SnapSourceKind::Undefined,
                &sc,
                false,
                true,
            );
            if best.snapped && nearest.as_ref().map_or(true, |(_, d)| best.distance < *d) {
                nearest = Some((best.position - origin, best.distance));
            }
        }
        nearest.map_or(offset, |(multiple, _)| multiple)
    }

    /// Translate a batch of points and snap freely.
    pub fn free_snap_translation(
        &mut self,
        ctx: &SnapContext,
        points: &[(Point, SnapSourceKind)],
        offset: Vec2,
    ) -> SnappedPoint {
        let transform = TransformDescriptor::Translation { offset };
        self.display_snap_source(ctx, points, &transform);
        self.snap_transformed(ctx, points, false, None, &transform, false)
    }

    /// Translate a batch of points and snap along `constraint`.
    pub fn constrained_snap_translation(
        &mut self,
        ctx: &SnapContext,
        points: &[(Point, SnapSourceKind)],
        constraint: &ConstraintLine,
        offset: Vec2,
    ) -> SnappedPoint {
        let transform = TransformDescriptor::Translation { offset };
        self.display_snap_source(ctx, points, &transform);
        self.snap_transformed(ctx, points, true, Some(constraint), &transform, false)
    }

    /// Scale a batch of points about `origin` and snap freely. The two
    /// axis factors are resolved independently.
    pub fn free_snap_scale(
        &mut self,
        ctx: &SnapContext,
        points: &[(Point, SnapSourceKind)],
        factors: Vec2,
        origin: Point,
    ) -> SnappedPoint {
        let transform = TransformDescriptor::Scale { factors, origin };
        self.display_snap_source(ctx, points, &transform);
        self.snap_transformed(ctx, points, false, None, &transform, false)
    }

    /// Scale a batch of points about `origin` such that the aspect ratio
    /// is preserved: every point snaps along its own radial line from the
    /// origin.
    pub fn constrained_snap_scale(
        &mut self,
        ctx: &SnapContext,
        points: &[(Point, SnapSourceKind)],
        factors: Vec2,
        origin: Point,
    ) -> SnappedPoint {
        let transform = TransformDescriptor::Scale { factors, origin };
        self.display_snap_source(ctx, points, &transform);
        self.snap_transformed(ctx, points, true, None, &transform, true)
    }

    /// Stretch a batch of points along one axis and snap such that the
    /// stretch direction is preserved.
    pub fn constrained_snap_stretch(
        &mut self,
        ctx: &SnapContext,
        points: &[(Point, SnapSourceKind)],
        factor: f64,
        axis: Axis,
        origin: Point,
        uniform: bool,
    ) -> SnappedPoint {
        let transform = TransformDescriptor::Stretch {
            factor,
            axis,
            uniform,
            origin,
        };
        self.display_snap_source(ctx, points, &transform);
        self.snap_transformed(ctx, points, true, None, &transform, false)
    }

    /// Skew a batch of points and snap such that the skew direction is
    /// preserved.
    ///
    /// Bounding-box points must not be skew-snapped: the box itself cannot
    /// skew, so its corners transform differently from the nodes.
    pub fn constrained_snap_skew(
        &mut self,
        ctx: &SnapContext,
        points: &[(Point, SnapSourceKind)],
        constraint: &ConstraintLine,
        skew: f64,
        scale: f64,
        axis: Axis,
        origin: Point,
    ) -> SnappedPoint {
        debug_assert!(
            points.iter().all(|(_, s)| !matches!(
                s,
                SnapSourceKind::BBoxCorner
                    | SnapSourceKind::BBoxEdgeMidpoint
                    | SnapSourceKind::BBoxCenter
            )),
            "bounding-box points cannot be snapped while skewing"
        );
        let transform = TransformDescriptor::Skew {
            skew,
            scale,
            axis,
            origin,
        };
        self.display_snap_source(ctx, points, &transform);
        self.snap_transformed(ctx, points, true, Some(constraint), &transform, false)
    }

    /// Reduce one candidate collection into the best snap and notify the
    /// indicator.
    fn find_best_snap(
        &mut self,
        ctx: &SnapContext,
        point: Point,
        source: SnapSourceKind,
        sc: &CandidateCollection,
        constrained: bool,
        prefer_intersection: bool,
    ) -> SnappedPoint {
        let best = select_best(&self.prefs, point, source, sc, constrained, prefer_intersection);
        if ctx.indicator_enabled {
            if best.snapped {
                self.indicator.set_target(&best);
            } else {
                self.indicator.clear_target();
            }
        }
        log::trace!(
            "best snap for {:?}: snapped={} target={:?} distance={}",
            point,
            best.snapped,
            best.target,
            best.distance
        );
        best
    }

    /// Core of all transformation snapping: transform every point, snap
    /// each one (free or constrained as appropriate), back out the
    /// whole-batch transform each snap implies, and keep the best.
    ///
    /// `uniform_scale` only applies to the `Scale` family, which has no
    /// uniform flag of its own (stretch carries one in the descriptor).
    fn snap_transformed(
        &mut self,
        ctx: &SnapContext,
        points: &[(Point, SnapSourceKind)],
        constrained: bool,
        constraint: Option<&ConstraintLine>,
        transform: &TransformDescriptor,
        uniform_scale: bool,
    ) -> SnappedPoint {
        if points.is_empty() || !self.some_snapper_might_snap() {
            let source = points.first().map_or(SnapSourceKind::Undefined, |p| p.1);
            let mut out = SnappedPoint::unsnapped(ctx.pointer, source);
            out.transform = Some(*transform);
            return out;
        }

        let transformed: Vec<Point> = points.iter().map(|(p, _)| transform.apply(*p)).collect();
        let mut bbox = Rect::from_points(transformed[0], transformed[0]);
        for p in &transformed[1..] {
            bbox = bbox.union_pt(*p);
        }

        let mut best_desc = *transform;
        let mut best_snap = SnappedPoint::unsnapped(ctx.pointer, points[0].1);
        let mut snapped_any = false;
        // Scale tracks each axis independently; these start "unset".
        let mut best_scale = Vec2::new(f64::INFINITY, f64::INFINITY);
        let mut best_scale_metric = Vec2::new(f64::INFINITY, f64::INFINITY);

        for (index, ((original, source), &tp)) in points.iter().zip(&transformed).enumerate() {
            let first = index == 0;
            let mut snap = self.snap_one_of_batch(
                ctx,
                *original,
                *source,
                tp,
                first,
                bbox,
                constrained,
                constraint,
                transform,
                uniform_scale,
            );
            snap.pointer_distance = (ctx.pointer - *original).hypot();
            if !snap.snapped {
                continue;
            }

            match *transform {
                TransformDescriptor::Translation { .. } => {
                    // The snap distance itself is the metric: preferring an
                    // intersection of two grid lines over a single line
                    // requires ranking by distance-to-nearest-line, which
                    // the snap already carries.
                    let desc = TransformDescriptor::Translation {
                        offset: snap.position - *original,
                    };
                    if !snapped_any || best_snap.is_other_snap_better(&snap, true) {
                        best_desc = desc;
                        best_snap = snap;
                        snapped_any = true;
                    }
                }
                TransformDescriptor::Scale { factors, origin } => {
                    let a = snap.position - origin;
                    let b = *original - origin;
                    let mut result = Vec2::new(f64::INFINITY, f64::INFINITY);
                    for axis in [Axis::X, Axis::Y] {
                        let ai = axis.of_vec(a);
                        let bi = axis.of_vec(b);
                        let proposed = axis.of_vec(factors);
                        // A point aligned with the origin on this axis puts
                        // no constraint on the factor; neither does a snap
                        // that did not actually move this coordinate.
                        if bi.abs() > EPS && ((ai / bi).abs() - proposed.abs()).abs() > 1e-12 {
                            match axis {
                                Axis::X => result.x = ai / bi,
                                Axis::Y => result.y = ai / bi,
                            }
                        }
                    }
                    let metric = result - factors;
                    for axis in [Axis::X, Axis::Y] {
                        if axis.of_vec(metric).abs() < axis.of_vec(best_scale_metric) {
                            match axis {
                                Axis::X => {
                                    best_scale.x = result.x;
                                    best_scale_metric.x = metric.x.abs();
                                }
                                Axis::Y => {
                                    best_scale.y = result.y;
                                    best_scale_metric.y = metric.y.abs();
                                }
                            }
                            // Two different points may supply the two axes;
                            // only one snap is reported for the indicator.
                            best_snap = snap.clone();
                            snapped_any = true;
                        }
                    }
                    if uniform_scale {
                        if best_scale_metric.x < best_scale_metric.y {
                            best_scale.y = best_scale.x;
                            best_scale_metric.y = best_scale_metric.x;
                        } else {
                            best_scale.x = best_scale.y;
                            best_scale_metric.x = best_scale_metric.y;
                        }
                    }
                }
                TransformDescriptor::Stretch {
                    factor,
                    axis,
                    uniform,
                    origin,
                } => {
                    let a = snap.position - origin;
                    let b = *original - origin;
                    let other = axis.other();
                    let result = if axis.of_vec(b).abs() > EPS {
                        Some(axis.of_vec(a) / axis.of_vec(b))
                    } else if uniform && other.of_vec(b).abs() > EPS {
                        // On the stretch axis this point is unconstrained,
                        // but a uniform stretch lets the other axis pin
                        // the factor.
                        Some(other.of_vec(a) / other.of_vec(b))
                    } else {
                        None
                    };
                    if let Some(result) = result {
                        let mut snap = snap;
                        snap.distance = (result - factor).abs();
                        snap.second_distance = NO_SECOND_DISTANCE;
                        if !snapped_any || best_snap.is_other_snap_better(&snap, true) {
                            best_desc = TransformDescriptor::Stretch {
                                factor: result,
                                axis,
                                uniform,
                                origin,
                            };
                            best_snap = snap;
                            snapped_any = true;
                        }
                    }
                }
                TransformDescriptor::Skew {
                    skew,
                    scale,
                    axis,
                    origin,
                } => {
                    let other = axis.other();
                    let denom = other.of(*original) - other.of(origin);
                    if denom.abs() > EPS {
                        let result = (axis.of(snap.position) - axis.of(*original)) / denom;
                        let mut snap = snap;
                        snap.distance = (result - skew).abs();
                        snap.second_distance = NO_SECOND_DISTANCE;
                        if !snapped_any || best_snap.is_other_snap_better(&snap, true) {
                            best_desc = TransformDescriptor::Skew {
                                skew: result,
                                scale,
                                axis,
                                origin,
                            };
                            best_snap = snap;
                            snapped_any = true;
                        }
                    }
                }
            }
        }

        let best_metric = if let TransformDescriptor::Scale { factors, origin } = *transform {
            // Never return a scale with an unset component: fall back to
            // the other axis when uniform, else to the proposed factor.
            let mut out = best_scale;
            if !out.x.is_finite() {
                out.x = if uniform_scale && out.y.is_finite() {
                    out.y
                } else {
                    factors.x
                };
            }
            if !out.y.is_finite() {
                out.y = if uniform_scale && out.x.is_finite() {
                    out.x
                } else {
                    factors.y
                };
            }
            best_desc = TransformDescriptor::Scale {
                factors: out,
                origin,
            };
            best_scale_metric.x.min(best_scale_metric.y)
        } else {
            best_snap.distance
        };

        log::debug!(
            "batch snap over {} points: snapped={} metric={}",
            points.len(),
            snapped_any,
            best_metric
        );

        if !snapped_any || best_metric >= HUGE_DISTANCE {
            let mut out = SnappedPoint::unsnapped(best_snap.position, best_snap.source);
            out.transform = Some(best_desc);
            return out;
        }
        best_snap.distance = best_metric;
        best_snap.transform = Some(best_desc);
        best_snap
    }

    /// Snap one point of a batch, deriving its dedicated constraint from
    /// the transformation family.
    #[allow(clippy::too_many_arguments)]
    fn snap_one_of_batch(
        &mut self,
        ctx: &SnapContext,
        original: Point,
        source: SnapSourceKind,
        transformed: Point,
        first: bool,
        bbox: Rect,
        constrained: bool,
        constraint: Option<&ConstraintLine>,
        transform: &TransformDescriptor,
        uniform_scale: bool,
    ) -> SnappedPoint {
        if constrained {
            let dedicated = match *transform {
                TransformDescriptor::Scale { origin, .. } if uniform_scale => {
                    // Uniform scaling moves each point radially away from
                    // the origin; its own radius is its constraint. A point
                    // sitting exactly on the origin never moves and cannot
                    // snap.
                    ConstraintLine::try_new(origin, original - origin).ok()
                }
                TransformDescriptor::Scale { .. } => {
                    log::warn!("non-uniform constrained scaling is not supported");
                    None
                }
                TransformDescriptor::Stretch {
                    uniform: true,
                    origin,
                    ..
                } => ConstraintLine::try_new(origin, original - origin).ok(),
                TransformDescriptor::Stretch {
                    uniform: false,
                    axis,
                    ..
                } => Some(ConstraintLine::axis_aligned(original, axis)),
                TransformDescriptor::Translation { .. } => {
                    // All points move in the same direction but along
                    // parallel, not colinear, lines.
                    constraint.map(|c| c.with_anchor(original))
                }
                TransformDescriptor::Skew { .. } => constraint.copied(),
            };
            match dedicated {
                Some(line) => {
                    self.constrained_snap(ctx, source, transformed, first, Some(bbox), &line)
                }
                None => SnappedPoint::unsnapped(transformed, source),
            }
        } else if let TransformDescriptor::Scale { origin, .. } = *transform {
            let b = original - origin;
            let on_x_axis = b.y.abs() < EPS;
            let on_y_axis = b.x.abs() < EPS;
            if (on_x_axis || on_y_axis) && !(on_x_axis && on_y_axis) {
                // A point sharing one axis with the scale origin can only
                // move along that axis; snapping it anywhere else would
                // make the scale non-rectilinear.
                let axis = if on_y_axis { Axis::Y } else { Axis::X };
                let line = ConstraintLine::axis_aligned(origin, axis);
                self.constrained_snap(ctx, source, transformed, first, Some(bbox), &line)
            } else {
                self.free_snap(ctx, source, transformed, first, Some(bbox))
            }
        } else {
            self.free_snap(ctx, source, transformed, first, Some(bbox))
        }
    }

    /// Mark the snap source on the canvas when a single point is being
    /// dragged and the closest-only preference is on.
    fn display_snap_source(
        &mut self,
        ctx: &SnapContext,
        points: &[(Point, SnapSourceKind)],
        transform: &TransformDescriptor,
    ) {
        if !ctx.indicator_enabled || !self.prefs.closest_only {
            return;
        }
        if let [(point, source)] = points {
            if self.prefs.active() {
                self.indicator.set_source(transform.apply(*point), *source);
            } else {
                self.indicator.clear_source();
            }
        }
    }
}

/// Reduce a candidate collection against the query point, without side
/// effects. Constrained queries are already fully determined in one degree
/// of freedom, so every intersection search is skipped for them.
fn select_best(
    prefs: &SnapPreferences,
    point: Point,
    source: SnapSourceKind,
    sc: &CandidateCollection,
    constrained: bool,
    prefer_intersection: bool,
) -> SnappedPoint {
    let mut candidates: Vec<SnappedPoint> = Vec::new();
    candidates.extend(sc.closest_point(source));
    candidates.extend(sc.closest_curve(source));
    if prefs.curve_intersections && !constrained {
        candidates.extend(sc.closest_curve_intersection(point, source));
    }
    candidates.extend(sc.closest_grid_line(source));
    candidates.extend(sc.closest_guide_line(source));
    if !constrained {
        candidates.extend(sc.closest_grid_intersection(source));
        candidates.extend(sc.closest_guide_intersection(source));
        if prefs.grid_guide_intersections {
            candidates.extend(sc.closest_grid_guide_intersection(source));
        }
    }

    let mut best = SnappedPoint::unsnapped(point, source);
    for candidate in candidates {
        if candidate.within_tolerance() && best.is_other_snap_better(&candidate, prefer_intersection)
        {
            best = candidate;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::test_support::RecordingIndicator;
    use crate::snapped::SnapTargetKind;
    use crate::snapper::{Grid, Guide, SnapItem};
    use kurbo::BezPath;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn grid_manager(tolerance: f64) -> SnapManager {
        let prefs = SnapPreferences {
            grid_tolerance: tolerance,
            ..Default::default()
        };
        let mut manager = SnapManager::new(prefs);
        manager.grids.push(GridSnapper::new(
            Grid::try_new(Point::ZERO, Vec2::new(5.0, 5.0)).unwrap(),
        ));
        manager
    }

    fn guide_manager(guides: Vec<Guide>) -> SnapManager {
        let mut manager = SnapManager::new(SnapPreferences::default());
        manager.guide.guides = guides;
        manager
    }

    fn vertical_guide(x: f64) -> Guide {
        Guide::new(Point::new(x, 0.0), Vec2::new(1.0, 0.0))
    }

    fn horizontal_guide(y: f64) -> Guide {
        Guide::new(Point::new(0.0, y), Vec2::new(0.0, 1.0))
    }

    fn node(x: f64, y: f64) -> (Point, SnapSourceKind) {
        (Point::new(x, y), SnapSourceKind::Node)
    }

    #[test]
    fn disabled_manager_short_circuits() {
        let mut manager = grid_manager(3.0);
        manager.prefs.enabled = false;
        assert!(!manager.some_snapper_might_snap());
        let ctx = SnapContext::new(Point::ZERO);
        let s = manager.free_snap(&ctx, SnapSourceKind::Node, Point::new(10.1, 10.0), true, None);
        assert!(!s.snapped);
        assert_eq!(s.position, Point::new(10.1, 10.0));
    }

    #[test]
    fn postponed_manager_short_circuits() {
        let mut manager = grid_manager(3.0);
        manager.prefs.postponed = true;
        assert!(!manager.some_snapper_might_snap());
    }

    #[test]
    fn exact_grid_intersection_snaps_at_zero_distance() {
        let mut manager = grid_manager(3.0);
        let ctx = SnapContext::new(Point::new(10.0, 10.0));
        let s = manager.free_snap(
            &ctx,
            SnapSourceKind::Node,
            Point::new(10.0, 10.0),
            true,
            None,
        );
        assert!(s.snapped);
        assert!(s.at_intersection);
        assert_eq!(s.target, SnapTargetKind::GridIntersection);
        assert!((s.position - Point::new(10.0, 10.0)).hypot() < 1e-9);
        assert!(s.distance < 1e-12);
    }

    #[test]
    fn grid_intersection_beats_single_line_nearby() {
        let mut manager = grid_manager(3.0);
        let ctx = SnapContext::new(Point::new(11.5, 9.0));
        let s = manager.free_snap(
            &ctx,
            SnapSourceKind::Node,
            Point::new(11.5, 9.0),
            true,
            None,
        );
        assert!(s.snapped);
        assert_eq!(s.target, SnapTargetKind::GridIntersection);
        assert!((s.position - Point::new(10.0, 10.0)).hypot() < 1e-9);
        // Primary distance is to the nearer of the two lines (y = 10).
        assert!((s.distance - 1.0).abs() < 1e-12);
        assert!((s.second_distance - 1.5).abs() < 1e-12);
    }

    #[test]
    fn pointer_snap_takes_the_nearest_line_over_the_intersection() {
        let mut manager = grid_manager(3.0);
        let ctx = SnapContext::new(Point::new(11.5, 9.0));
        let s = manager.pointer_free_snap(&ctx, Point::new(11.5, 9.0));
        assert!(s.snapped);
        assert_eq!(s.target, SnapTargetKind::GridLine);
        assert!((s.position - Point::new(11.5, 10.0)).hypot() < 1e-9);
        assert!((s.distance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn out_of_tolerance_returns_the_sentinel() {
        let mut manager = grid_manager(2.0);
        let ctx = SnapContext::new(Point::new(2.5, 2.5));
        let s = manager.free_snap(&ctx, SnapSourceKind::Node, Point::new(2.5, 2.5), true, None);
        assert!(!s.snapped);
        assert_eq!(s.position, Point::new(2.5, 2.5));
        assert!(s.distance.is_infinite());
    }

    #[test]
    fn guide_intersection_beats_nearby_path() {
        let mut manager = guide_manager(vec![horizontal_guide(5.0), vertical_guide(5.0)]);
        let mut path = BezPath::new();
        path.move_to(Point::new(5.2, 4.0));
        path.line_to(Point::new(5.2, 6.0));
        manager.object.items.push(SnapItem::new(path));
        let ctx = SnapContext::new(Point::new(5.1, 5.0));
        let s = manager.free_snap(&ctx, SnapSourceKind::Node, Point::new(5.1, 5.0), true, None);
        assert!(s.snapped);
        assert_eq!(s.target, SnapTargetKind::GuideIntersection);
        assert!((s.position - Point::new(5.0, 5.0)).hypot() < 1e-9);
    }

    #[test]
    fn always_snap_guide_beats_closer_grid() {
        let mut manager = grid_manager(10.0);
        manager.prefs.guide_always_snap = true;
        manager.guide.guides.push(horizontal_guide(8.0));
        let ctx = SnapContext::new(Point::new(0.1, 4.6));
        let s = manager.free_snap(&ctx, SnapSourceKind::Node, Point::new(0.1, 4.6), true, None);
        assert!(s.snapped);
        assert_eq!(s.target, SnapTargetKind::GuideLine);
        assert!((s.position - Point::new(0.1, 8.0)).hypot() < 1e-9);
    }

    #[test]
    fn constrained_snap_stays_on_the_constraint() {
        let mut manager = grid_manager(3.0);
        let constraint =
            ConstraintLine::try_new(Point::new(0.0, 2.0), Vec2::new(1.0, 0.0)).unwrap();
        let ctx = SnapContext::new(Point::new(7.3, 2.0));
        let s = manager.constrained_snap(
            &ctx,
            SnapSourceKind::Node,
            Point::new(7.3, 2.0),
            true,
            None,
            &constraint,
        );
        assert!(s.snapped);
        assert!((s.position - Point::new(5.0, 2.0)).hypot() < 1e-9);
        let proj = constraint.projection(s.position);
        assert!((proj - s.position).hypot() < 1e-9);
    }

    #[test]
    fn free_translation_backs_out_the_offset() {
        let mut manager = grid_manager(3.0);
        let ctx = SnapContext::new(Point::new(1.0, 1.0));
        let s = manager.free_snap_translation(&ctx, &[node(1.0, 1.0)], Vec2::new(8.0, 7.5));
        assert!(s.snapped);
        assert!((s.position - Point::new(10.0, 10.0)).hypot() < 1e-9);
        match s.transform {
            Some(TransformDescriptor::Translation { offset }) => {
                assert!((offset - Vec2::new(9.0, 9.0)).hypot() < 1e-9);
            }
            other => panic!("expected a translation, got {:?}", other),
        }
    }

    #[test]
    fn constrained_translation_rebases_the_constraint_per_point() {
        let mut manager = grid_manager(3.0);
        let constraint = ConstraintLine::try_new(Point::ZERO, Vec2::new(1.0, 0.0)).unwrap();
        let ctx = SnapContext::new(Point::new(0.0, 2.0));
        let s = manager.constrained_snap_translation(
            &ctx,
            &[node(0.0, 2.0)],
            &constraint,
            Vec2::new(7.3, 0.0),
        );
        assert!(s.snapped);
        assert!((s.position - Point::new(5.0, 2.0)).hypot() < 1e-9);
        match s.transform {
            Some(TransformDescriptor::Translation { offset }) => {
                assert!((offset - Vec2::new(5.0, 0.0)).hypot() < 1e-9);
            }
            other => panic!("expected a translation, got {:?}", other),
        }
    }

    #[test]
    fn uniform_scale_copies_the_snapped_axis() {
        let mut manager = guide_manager(vec![vertical_guide(2.4)]);
        let ctx = SnapContext::new(Point::new(2.0, 0.0));
        // Only the first point can snap: the second moves along the y axis,
        // parallel to the guide.
        let s = manager.constrained_snap_scale(
            &ctx,
            &[node(2.0, 0.0), node(0.0, 4.0)],
            Vec2::new(1.1, 1.1),
            Point::ZERO,
        );
        assert!(s.snapped);
        assert!((s.position - Point::new(2.4, 0.0)).hypot() < 1e-9);
        assert!((s.distance - 0.1).abs() < 1e-9);
        match s.transform {
            Some(TransformDescriptor::Scale { factors, .. }) => {
                assert!((factors.x - 1.2).abs() < 1e-9);
                assert!((factors.y - 1.2).abs() < 1e-9);
            }
            other => panic!("expected a scale, got {:?}", other),
        }
    }

    #[test]
    fn free_scale_keeps_axis_aligned_points_rectilinear() {
        let mut manager = guide_manager(vec![vertical_guide(2.4)]);
        let ctx = SnapContext::new(Point::new(2.0, 0.0));
        // The point shares the x axis with the origin, so it may only move
        // along that axis; the y factor stays as proposed.
        let s = manager.free_snap_scale(
            &ctx,
            &[node(2.0, 0.0)],
            Vec2::new(1.1, 1.3),
            Point::ZERO,
        );
        assert!(s.snapped);
        assert!((s.position - Point::new(2.4, 0.0)).hypot() < 1e-9);
        match s.transform {
            Some(TransformDescriptor::Scale { factors, .. }) => {
                assert!((factors.x - 1.2).abs() < 1e-9);
                assert!((factors.y - 1.3).abs() < 1e-9);
            }
            other => panic!("expected a scale, got {:?}", other),
        }
    }

    #[test]
    fn stretch_backs_out_the_factor() {
        let mut manager = guide_manager(vec![horizontal_guide(4.8)]);
        let ctx = SnapContext::new(Point::new(2.0, 3.0));
        let s = manager.constrained_snap_stretch(
            &ctx,
            &[node(2.0, 3.0)],
            1.5,
            Axis::Y,
            Point::ZERO,
            false,
        );
        assert!(s.snapped);
        assert!((s.position - Point::new(2.0, 4.8)).hypot() < 1e-9);
        assert!((s.distance - 0.1).abs() < 1e-9);
        match s.transform {
            Some(TransformDescriptor::Stretch { factor, axis, .. }) => {
                assert!((factor - 1.6).abs() < 1e-9);
                assert_eq!(axis, Axis::Y);
            }
            other => panic!("expected a stretch, got {:?}", other),
        }
    }

    #[test]
    fn skew_backs_out_the_factor() {
        let mut manager = guide_manager(vec![vertical_guide(2.4)]);
        let constraint =
            ConstraintLine::try_new(Point::new(0.0, 2.0), Vec2::new(1.0, 0.0)).unwrap();
        let ctx = SnapContext::new(Point::new(2.0, 2.0));
        let s = manager.constrained_snap_skew(
            &ctx,
            &[node(2.0, 2.0)],
            &constraint,
            0.1,
            1.0,
            Axis::X,
            Point::ZERO,
        );
        assert!(s.snapped);
        assert!((s.position - Point::new(2.4, 2.0)).hypot() < 1e-9);
        assert!((s.distance - 0.1).abs() < 1e-9);
        match s.transform {
            Some(TransformDescriptor::Skew { skew, scale, .. }) => {
                assert!((skew - 0.2).abs() < 1e-9);
                assert!((scale - 1.0).abs() < 1e-12);
            }
            other => panic!("expected a skew, got {:?}", other),
        }
    }

    #[test]
    fn empty_batch_returns_the_proposal() {
        let mut manager = grid_manager(3.0);
        let ctx = SnapContext::new(Point::ZERO);
        let s = manager.free_snap_translation(&ctx, &[], Vec2::new(3.0, 4.0));
        assert!(!s.snapped);
        match s.transform {
            Some(TransformDescriptor::Translation { offset }) => {
                assert!((offset - Vec2::new(3.0, 4.0)).hypot() < 1e-12);
            }
            other => panic!("expected a translation, got {:?}", other),
        }
    }

    #[test]
    fn unsnapped_batch_keeps_the_proposal() {
        let mut manager = grid_manager(0.5);
        let ctx = SnapContext::new(Point::new(2.5, 2.5));
        let s = manager.free_snap_translation(&ctx, &[node(1.0, 1.0)], Vec2::new(1.5, 1.5));
        assert!(!s.snapped);
        match s.transform {
            Some(TransformDescriptor::Translation { offset }) => {
                assert!((offset - Vec2::new(1.5, 1.5)).hypot() < 1e-12);
            }
            other => panic!("expected a translation, got {:?}", other),
        }
    }

    #[test]
    fn multiple_of_grid_pitch_compensates_the_origin() {
        let mut manager = SnapManager::new(SnapPreferences::default());
        manager.grids.push(GridSnapper::new(
            Grid::try_new(Point::new(2.0, 0.0), Vec2::new(5.0, 5.0)).unwrap(),
        ));
        let rounded = manager.multiple_of_grid_pitch(Vec2::new(6.2, 4.9));
        assert!((rounded - Vec2::new(5.0, 5.0)).hypot() < 1e-9);
    }

    #[test]
    fn multiple_of_grid_pitch_without_grids_is_identity() {
        let mut manager = SnapManager::new(SnapPreferences::default());
        let offset = Vec2::new(6.2, 4.9);
        assert_eq!(manager.multiple_of_grid_pitch(offset), offset);
    }

    #[test]
    fn guide_free_snap_never_consults_grids() {
        let mut manager = grid_manager(3.0);
        let ctx = SnapContext::new(Point::new(10.1, 10.0));
        let s = manager.guide_free_snap(&ctx, Point::new(10.1, 10.0));
        assert!(!s.snapped);
    }

    #[test]
    fn guide_free_snap_hits_other_guides() {
        let guides = vec![horizontal_guide(5.0)];
        let mut manager = guide_manager(guides);
        let ctx = SnapContext::new(Point::new(3.0, 5.4));
        let s = manager.guide_free_snap(&ctx, Point::new(3.0, 5.4));
        assert!(s.snapped);
        assert_eq!(s.source, SnapSourceKind::Guide);
        assert!((s.position - Point::new(3.0, 5.0)).hypot() < 1e-9);
    }

    #[test]
    fn guide_constrained_snap_slides_along_the_guide() {
        let dragged = horizontal_guide(5.0);
        let mut manager = guide_manager(vec![dragged, vertical_guide(7.0)]);
        let mut ctx = SnapContext::new(Point::new(6.6, 5.0));
        ctx.ignore.insert(dragged.id);
        let s = manager.guide_constrained_snap(&ctx, Point::new(6.6, 5.0), &dragged);
        assert!(s.snapped);
        assert_eq!(s.source, SnapSourceKind::GuideOrigin);
        // Crossing of the dragged guide with the vertical one.
        assert!((s.position - Point::new(7.0, 5.0)).hypot() < 1e-9);
    }

    #[derive(Clone, Default)]
    struct SharedIndicator(Rc<RefCell<RecordingIndicator>>);

    impl SnapIndicator for SharedIndicator {
        fn set_target(&mut self, snap: &SnappedPoint) {
            self.0.borrow_mut().set_target(snap);
        }
        fn clear_target(&mut self) {
            self.0.borrow_mut().clear_target();
        }
        fn set_source(&mut self, position: Point, source: SnapSourceKind) {
            self.0.borrow_mut().set_source(position, source);
        }
        fn clear_source(&mut self) {
            self.0.borrow_mut().clear_source();
        }
    }

    #[test]
    fn indicator_reports_source_and_target() {
        let shared = SharedIndicator::default();
        let mut manager = grid_manager(3.0);
        manager.prefs.closest_only = true;
        manager.set_indicator(Box::new(shared.clone()));
        let mut ctx = SnapContext::new(Point::new(1.0, 1.0));
        ctx.indicator_enabled = true;
        let s = manager.free_snap_translation(&ctx, &[node(1.0, 1.0)], Vec2::new(8.0, 7.5));
        assert!(s.snapped);
        let recorded = shared.0.borrow();
        // The source marker sits at the transformed point, the target at
        // the snapped position.
        assert!(recorded
            .sources
            .iter()
            .any(|p| (*p - Point::new(9.0, 8.5)).hypot() < 1e-9));
        assert!(recorded
            .targets
            .iter()
            .any(|p| (*p - Point::new(10.0, 10.0)).hypot() < 1e-9));
    }

    #[test]
    fn indicator_cleared_when_nothing_snaps() {
        let shared = SharedIndicator::default();
        let mut manager = grid_manager(0.5);
        manager.set_indicator(Box::new(shared.clone()));
        let mut ctx = SnapContext::new(Point::new(2.5, 2.5));
        ctx.indicator_enabled = true;
        let s = manager.free_snap(&ctx, SnapSourceKind::Node, Point::new(2.5, 2.5), true, None);
        assert!(!s.snapped);
        assert!(shared.0.borrow().cleared > 0);
    }
}
