//! Geometry helpers backed by kurbo.
//!
//! Shapes only store point ids; everything here resolves those ids against
//! a [`ShapeStore`] and hands back kurbo values for measuring.

use crate::id::ShapeId;
use crate::model::{Figure, Geometry, Segment, Shape, ShapeKind};
use crate::project::ShapeStore;
use kurbo::{BezPath, Ellipse, ParamCurveNearest, PathEl, Point, Rect, Shape as _, SvgArc, Vec2};

/// Accuracy used when measuring distances to curves.
const NEAREST_ACCURACY: f64 = 1e-3;

/// Position of a point shape as a kurbo point.
pub fn point(store: &ShapeStore, id: ShapeId) -> Option<Point> {
    store.position(id).map(|(x, y)| Point::new(x, y))
}

/// Closest point to `p` on the finite segment `a → b`.
pub fn nearest_point_on_line(a: Point, b: Point, p: Point) -> Point {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq == 0.0 {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

pub fn distance_to_line(a: Point, b: Point, p: Point) -> f64 {
    nearest_point_on_line(a, b, p).distance(p)
}

/// Normalized rectangle spanned by two corner points.
pub fn corner_rect(store: &ShapeStore, top_left: ShapeId, bottom_right: ShapeId) -> Option<Rect> {
    Some(Rect::from_points(
        point(store, top_left)?,
        point(store, bottom_right)?,
    ))
}

/// AABB overlap, edges touching count as overlap.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

/// Whether the segment `a → b` touches `rect` (Liang–Barsky clipping).
pub fn segment_intersects_rect(a: Point, b: Point, rect: Rect) -> bool {
    let d = b - a;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let checks = [
        (-d.x, a.x - rect.x0),
        (d.x, rect.x1 - a.x),
        (-d.y, a.y - rect.y0),
        (d.y, rect.y1 - a.y),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return false;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return false;
            }
            t1 = t1.min(r);
        }
    }
    t0 <= t1
}

/// Elliptical arc from `from` to `to` as path elements (no leading move).
/// `rotation` is in degrees. Degenerate arcs become a straight line.
pub fn arc_elements(
    from: Point,
    to: Point,
    radii: Vec2,
    rotation: f64,
    is_large_arc: bool,
    sweep: bool,
    tolerance: f64,
) -> Vec<PathEl> {
    let svg = SvgArc {
        from,
        to,
        radii,
        x_rotation: rotation.to_radians(),
        large_arc: is_large_arc,
        sweep,
    };
    match kurbo::Arc::from_svg_arc(&svg) {
        Some(arc) => arc.append_iter(tolerance).collect(),
        None => vec![PathEl::LineTo(to)],
    }
}

fn append_figure(store: &ShapeStore, figure: &Figure, path: &mut BezPath, tolerance: f64) -> Option<()> {
    let mut last = point(store, figure.start)?;
    path.move_to(last);
    for segment in &figure.segments {
        match segment {
            Segment::Line { point: p } => path.line_to(point(store, *p)?),
            Segment::Quadratic { control, point: p } => {
                path.quad_to(point(store, *control)?, point(store, *p)?)
            }
            Segment::Cubic {
                control1,
                control2,
                point: p,
            } => path.curve_to(
                point(store, *control1)?,
                point(store, *control2)?,
                point(store, *p)?,
            ),
            Segment::Arc {
                point: p,
                radius_x,
                radius_y,
                rotation,
                is_large_arc,
                sweep,
            } => {
                let to = point(store, *p)?;
                for el in arc_elements(
                    last,
                    to,
                    Vec2::new(*radius_x, *radius_y),
                    *rotation,
                    *is_large_arc,
                    *sweep,
                    tolerance,
                ) {
                    path.push(el);
                }
            }
        }
        last = point(store, segment.end_point())?;
    }
    if figure.is_closed {
        path.close_path();
    }
    Some(())
}

/// Outline of a path geometry.
pub fn geometry_path(store: &ShapeStore, geometry: &Geometry, tolerance: f64) -> Option<BezPath> {
    let mut path = BezPath::new();
    for figure in &geometry.figures {
        append_figure(store, figure, &mut path, tolerance)?;
    }
    Some(path)
}

/// Outline of a single shape. `None` for points, groups, and shapes whose
/// points cannot be resolved.
pub fn shape_path(store: &ShapeStore, shape: &Shape, tolerance: f64) -> Option<BezPath> {
    let p = |id: ShapeId| point(store, id);
    let mut path = BezPath::new();
    match &shape.kind {
        ShapeKind::Point { .. } | ShapeKind::Group { .. } => return None,
        ShapeKind::Line { start, end } => {
            path.move_to(p(*start)?);
            path.line_to(p(*end)?);
        }
        ShapeKind::Arc {
            start,
            end,
            radius_x,
            radius_y,
            rotation,
            is_large_arc,
            sweep,
        } => {
            let from = p(*start)?;
            path.move_to(from);
            for el in arc_elements(
                from,
                p(*end)?,
                Vec2::new(*radius_x, *radius_y),
                *rotation,
                *is_large_arc,
                *sweep,
                tolerance,
            ) {
                path.push(el);
            }
        }
        ShapeKind::CubicBezier { p1, p2, p3, p4 } => {
            path.move_to(p(*p1)?);
            path.curve_to(p(*p2)?, p(*p3)?, p(*p4)?);
        }
        ShapeKind::QuadraticBezier { p1, p2, p3 } => {
            path.move_to(p(*p1)?);
            path.quad_to(p(*p2)?, p(*p3)?);
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
        } => return Some(corner_rect(store, *top_left, *bottom_right)?.to_path(tolerance)),
        ShapeKind::Ellipse {
            top_left,
            bottom_right,
        } => {
            let rect = corner_rect(store, *top_left, *bottom_right)?;
            return Some(Ellipse::from_rect(rect).to_path(tolerance));
        }
        ShapeKind::Path { geometry } => return geometry_path(store, geometry, tolerance),
    }
    Some(path)
}

/// Shortest distance from `p` to the outline of `path`.
pub fn distance_to_path(path: &BezPath, p: Point) -> f64 {
    path.segments()
        .map(|seg| seg.nearest(p, NEAREST_ACCURACY).distance_sq)
        .fold(f64::INFINITY, f64::min)
        .sqrt()
}

/// Axis-aligned bounds of a shape, including every child of a group.
pub fn bounds(store: &ShapeStore, id: ShapeId, tolerance: f64) -> Option<Rect> {
    let shape = store.get(id)?;
    match &shape.kind {
        ShapeKind::Point { x, y } => Some(Rect::new(*x, *y, *x, *y)),
        ShapeKind::Group { shapes, .. } => shapes
            .iter()
            .filter_map(|child| bounds(store, *child, tolerance))
            .reduce(|a, b| a.union(b)),
        _ => shape_path(store, shape, tolerance).map(|path| path.bounding_box()),
    }
}

/// Union of the bounds of several shapes.
pub fn union_bounds(store: &ShapeStore, ids: &[ShapeId], tolerance: f64) -> Option<Rect> {
    ids.iter()
        .filter_map(|id| bounds(store, *id, tolerance))
        .reduce(|a, b| a.union(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_point_clamps_to_segment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(nearest_point_on_line(a, b, Point::new(5.0, 3.0)), Point::new(5.0, 0.0));
        assert_eq!(nearest_point_on_line(a, b, Point::new(-4.0, 1.0)), a);
        assert_eq!(nearest_point_on_line(a, b, Point::new(14.0, 1.0)), b);
        assert_eq!(nearest_point_on_line(a, a, Point::new(3.0, 4.0)), a);
        assert_eq!(distance_to_line(a, b, Point::new(5.0, 3.0)), 3.0);
    }

    #[test]
    fn segment_rect_intersection() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        // Crosses through without endpoints inside.
        assert!(segment_intersects_rect(Point::new(-5.0, 5.0), Point::new(15.0, 5.0), rect));
        // Entirely inside.
        assert!(segment_intersects_rect(Point::new(2.0, 2.0), Point::new(3.0, 3.0), rect));
        // Passes beside.
        assert!(!segment_intersects_rect(Point::new(-5.0, 12.0), Point::new(15.0, 12.0), rect));
        // Diagonal missing the corner.
        assert!(!segment_intersects_rect(Point::new(8.0, -5.0), Point::new(15.0, 2.0), rect));
    }

    #[test]
    fn bounds_cover_group_children() {
        let a = Shape::point(0.0, 0.0);
        let b = Shape::point(10.0, 5.0);
        let c = Shape::point(-3.0, 20.0);
        let line = Shape::line(a.id, b.id);
        let group = Shape::group(&[line.id, c.id]);
        let (line_id, group_id) = (line.id, group.id);
        let store: ShapeStore = [a, b, c, line, group].into_iter().collect();

        assert_eq!(bounds(&store, line_id, 0.1), Some(Rect::new(0.0, 0.0, 10.0, 5.0)));
        assert_eq!(bounds(&store, group_id, 0.1), Some(Rect::new(-3.0, 0.0, 10.0, 20.0)));
    }

    #[test]
    fn distance_to_rectangle_outline() {
        let path = Rect::new(0.0, 0.0, 10.0, 10.0).to_path(0.1);
        assert!((distance_to_path(&path, Point::new(5.0, 12.0)) - 2.0).abs() < 1e-6);
        assert!((distance_to_path(&path, Point::new(5.0, 5.0)) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_arc_is_a_line() {
        let els = arc_elements(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Vec2::new(0.0, 0.0),
            0.0,
            false,
            true,
            0.1,
        );
        assert_eq!(els, vec![PathEl::LineTo(Point::new(10.0, 0.0))]);
    }
}
