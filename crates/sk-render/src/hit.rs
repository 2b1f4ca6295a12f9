//! Hit testing: point / shape / marquee → shape lookup.
//!
//! Layer shape lists are bottom-first, so point queries walk them in
//! reverse (last painted = topmost) and stop at the first hit. Radii are in
//! world units; callers divide their screen threshold by the zoom factor.

use kurbo::{Ellipse, Point, Rect, Shape as _};
use sk_core::geometry;
use sk_core::id::ShapeId;
use sk_core::model::{Shape, ShapeKind};
use sk_core::project::ShapeStore;
use smallvec::SmallVec;

/// Flattening tolerance for curve outlines.
const TOLERANCE: f64 = 0.1;

/// Slack for outline distances found by numeric nearest-point search.
const DISTANCE_EPSILON: f64 = 1e-9;

/// Find the topmost point within `radius` of `query`.
///
/// Each shape is checked through its own points: a point shape is its own
/// candidate, other shapes offer their endpoints, corners or figure
/// points, and groups offer their connectors and then their children's.
pub fn hit_point(store: &ShapeStore, shapes: &[ShapeId], query: Point, radius: f64) -> Option<ShapeId> {
    shapes
        .iter()
        .rev()
        .find_map(|id| hit_point_in(store, *id, query, radius))
}

fn hit_point_in(store: &ShapeStore, id: ShapeId, query: Point, radius: f64) -> Option<ShapeId> {
    let mut stack: SmallVec<[ShapeId; 8]> = SmallVec::new();
    stack.push(id);
    while let Some(id) = stack.pop() {
        let Some(shape) = store.get(id) else { continue };
        if shape.kind.is_point() {
            if point_within(store, id, query, radius) {
                return Some(id);
            }
            continue;
        }
        if let Some(p) = shape
            .kind
            .points()
            .into_iter()
            .find(|p| point_within(store, *p, query, radius))
        {
            return Some(p);
        }
        // Later children are on top.
        stack.extend(shape.kind.children().iter().copied());
    }
    None
}

fn point_within(store: &ShapeStore, id: ShapeId, query: Point, radius: f64) -> bool {
    geometry::point(store, id).is_some_and(|p| p.distance(query) <= radius)
}

/// Find the topmost non-point shape whose geometry is within `radius` of
/// `query`.
pub fn hit_shape(store: &ShapeStore, shapes: &[ShapeId], query: Point, radius: f64) -> Option<ShapeId> {
    shapes.iter().rev().copied().find(|id| {
        store
            .get(*id)
            .is_some_and(|shape| !shape.kind.is_point() && contains(store, shape, query, radius))
    })
}

fn contains(store: &ShapeStore, shape: &Shape, query: Point, radius: f64) -> bool {
    match &shape.kind {
        ShapeKind::Point { x, y } => within(Point::new(*x, *y).distance(query), radius),
        ShapeKind::Line { start, end } => {
            match (geometry::point(store, *start), geometry::point(store, *end)) {
                (Some(a), Some(b)) => within(geometry::distance_to_line(a, b, query), radius),
                _ => false,
            }
        }
        ShapeKind::Rectangle {
            top_left,
            bottom_right,
        }
        | ShapeKind::Text {
            top_left,
            bottom_right,
            ..
        }
        | ShapeKind::Image {
            top_left,
            bottom_right,
            ..
        } => geometry::corner_rect(store, *top_left, *bottom_right)
            .is_some_and(|rect| rect_within(rect, query, radius)),
        ShapeKind::Ellipse {
            top_left,
            bottom_right,
        } => {
            let Some(rect) = geometry::corner_rect(store, *top_left, *bottom_right) else {
                return false;
            };
            let ellipse = Ellipse::from_rect(rect);
            let outline = ellipse.to_path(TOLERANCE);
            ellipse.contains(query) || within(geometry::distance_to_path(&outline, query), radius)
        }
        ShapeKind::Path { .. } => {
            let Some(path) = geometry::shape_path(store, shape, TOLERANCE) else {
                return false;
            };
            (shape.is_filled && path.contains(query))
                || within(geometry::distance_to_path(&path, query), radius)
        }
        ShapeKind::Arc { .. } | ShapeKind::CubicBezier { .. } | ShapeKind::QuadraticBezier { .. } => {
            geometry::shape_path(store, shape, TOLERANCE)
                .is_some_and(|path| within(geometry::distance_to_path(&path, query), radius))
        }
        ShapeKind::Group { shapes, .. } => shapes
            .iter()
            .filter_map(|child| store.get(*child))
            .any(|child| contains(store, child, query, radius)),
    }
}

/// Inclusive at exactly `radius`.
fn within(distance: f64, radius: f64) -> bool {
    distance <= radius + DISTANCE_EPSILON
}

/// `rect` grown by `radius`, closed on every edge. `Rect::contains` is
/// half-open and would miss the right and bottom boundary.
fn rect_within(rect: Rect, query: Point, radius: f64) -> bool {
    rect.x0 - radius <= query.x
        && query.x <= rect.x1 + radius
        && rect.y0 - radius <= query.y
        && query.y <= rect.y1 + radius
}

/// Every shape touching `rect`, in z-order (bottom first). Used for
/// marquee selection.
pub fn hit_rect(store: &ShapeStore, shapes: &[ShapeId], rect: Rect, radius: f64) -> Vec<ShapeId> {
    let hits: Vec<ShapeId> = shapes
        .iter()
        .copied()
        .filter(|id| store.get(*id).is_some_and(|shape| intersects(store, shape, rect, radius)))
        .collect();
    log::trace!("marquee {rect:?} hit {} of {} shapes", hits.len(), shapes.len());
    hits
}

fn intersects(store: &ShapeStore, shape: &Shape, rect: Rect, radius: f64) -> bool {
    match &shape.kind {
        ShapeKind::Point { x, y } => {
            let r = rect.inflate(radius, radius);
            // Closed on every edge, unlike `Rect::contains`.
            (r.x0..=r.x1).contains(x) && (r.y0..=r.y1).contains(y)
        }
        ShapeKind::Line { start, end } => {
            match (geometry::point(store, *start), geometry::point(store, *end)) {
                (Some(a), Some(b)) => geometry::segment_intersects_rect(a, b, rect),
                _ => false,
            }
        }
        ShapeKind::Group { shapes, .. } => shapes
            .iter()
            .filter_map(|child| store.get(*child))
            .any(|child| intersects(store, child, rect, radius)),
        _ => geometry::bounds(store, shape.id, TOLERANCE)
            .is_some_and(|bounds| geometry::rects_overlap(bounds, rect)),
    }
}
