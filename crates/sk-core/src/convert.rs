//! Conversion of closed-form shapes and SVG path data into `Path` shapes.

use crate::geometry;
use crate::id::ShapeId;
use crate::model::{Figure, FillRule, Geometry, Segment, Shape, ShapeKind};
use crate::project::ShapeStore;
use kurbo::{BezPath, PathEl, Point};

/// A freshly built path shape plus the anonymous points its figures use.
/// Nothing here is in any arena yet.
#[derive(Debug, Clone)]
pub struct Converted {
    pub shape: Shape,
    pub points: Vec<Shape>,
}

pub trait PathConverter {
    /// Convert `shape` into an equivalent `Path` shape, if this converter
    /// knows how.
    fn to_path_shape(&self, store: &ShapeStore, shape: &Shape) -> Option<Converted>;

    /// Build a `Path` shape from SVG path data (`M 0 0 L 10 0 Z`).
    fn from_svg_path_data(&self, text: &str, is_stroked: bool, is_filled: bool) -> Option<Converted>;
}

/// Converts rectangles and ellipses through kurbo outlines. Text and images
/// would need font and raster data and are not converted.
#[derive(Debug, Clone, Copy)]
pub struct KurboPathConverter {
    pub tolerance: f64,
}

impl Default for KurboPathConverter {
    fn default() -> Self {
        Self { tolerance: 0.1 }
    }
}

impl PathConverter for KurboPathConverter {
    fn to_path_shape(&self, store: &ShapeStore, shape: &Shape) -> Option<Converted> {
        match shape.kind {
            ShapeKind::Rectangle { .. } | ShapeKind::Ellipse { .. } => {}
            _ => return None,
        }
        let mut outline = geometry::shape_path(store, shape, self.tolerance)?;
        // Ellipse outlines end on their start without an explicit close.
        if !matches!(outline.elements().last(), Some(PathEl::ClosePath)) {
            outline.close_path();
        }
        let (geometry, points) = geometry_from_bez(&outline, shape.is_filled);
        let mut path = Shape::new(ShapeKind::Path { geometry });
        path.name = shape.name.clone();
        path.style = shape.style;
        path.record = shape.record.clone();
        path.is_stroked = shape.is_stroked;
        path.is_filled = shape.is_filled;
        Some(Converted {
            shape: path,
            points,
        })
    }

    fn from_svg_path_data(&self, text: &str, is_stroked: bool, is_filled: bool) -> Option<Converted> {
        let outline = match BezPath::from_svg(text.trim()) {
            Ok(path) => path,
            Err(err) => {
                log::debug!("not svg path data: {err}");
                return None;
            }
        };
        let (geometry, points) = geometry_from_bez(&outline, is_filled);
        if geometry.figures.is_empty() {
            return None;
        }
        let mut path = Shape::new(ShapeKind::Path { geometry });
        path.is_stroked = is_stroked;
        path.is_filled = is_filled;
        Some(Converted {
            shape: path,
            points,
        })
    }
}

/// Build a geometry whose anchors are new point shapes.
///
/// A closed figure whose last segment lands back on the start coordinate
/// reuses the start point object for that end, so the figure closes on the
/// same point instead of a coincident copy.
pub fn geometry_from_bez(path: &BezPath, is_filled: bool) -> (Geometry, Vec<Shape>) {
    let mut points: Vec<Shape> = Vec::new();
    let mut figures: Vec<Figure> = Vec::new();
    let mut current: Option<(Figure, Point)> = None;

    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                if let Some((figure, _)) = current.take() {
                    figures.push(figure);
                }
                let start = new_point(p, &mut points);
                current = Some((
                    Figure {
                        start,
                        segments: Vec::new(),
                        is_filled,
                        is_closed: false,
                    },
                    p,
                ));
            }
            PathEl::LineTo(p) => {
                if let Some((figure, _)) = current.as_mut() {
                    let point = new_point(p, &mut points);
                    figure.segments.push(Segment::Line { point });
                }
            }
            PathEl::QuadTo(c, p) => {
                if let Some((figure, _)) = current.as_mut() {
                    let control = new_point(c, &mut points);
                    let point = new_point(p, &mut points);
                    figure.segments.push(Segment::Quadratic { control, point });
                }
            }
            PathEl::CurveTo(c1, c2, p) => {
                if let Some((figure, _)) = current.as_mut() {
                    let control1 = new_point(c1, &mut points);
                    let control2 = new_point(c2, &mut points);
                    let point = new_point(p, &mut points);
                    figure.segments.push(Segment::Cubic {
                        control1,
                        control2,
                        point,
                    });
                }
            }
            PathEl::ClosePath => {
                if let Some((mut figure, start)) = current.take() {
                    figure.is_closed = true;
                    close_on_start(&mut figure, start, &mut points);
                    figures.push(figure);
                }
            }
        }
    }
    if let Some((figure, _)) = current.take() {
        figures.push(figure);
    }

    let geometry = Geometry {
        fill_rule: FillRule::EvenOdd,
        figures,
    };
    (geometry, points)
}

fn new_point(p: Point, points: &mut Vec<Shape>) -> ShapeId {
    let shape = Shape::point(p.x, p.y);
    let id = shape.id;
    points.push(shape);
    id
}

fn close_on_start(figure: &mut Figure, start: Point, points: &mut Vec<Shape>) {
    let Some(last) = figure.segments.last_mut() else {
        return;
    };
    let end = last.end_point();
    let lands_on_start = points
        .iter()
        .find(|s| s.id == end)
        .and_then(Shape::position)
        .is_some_and(|(x, y)| Point::new(x, y).distance(start) < 1e-6);
    if !lands_on_start {
        return;
    }
    let start_id = figure.start;
    match last {
        Segment::Line { point }
        | Segment::Quadratic { point, .. }
        | Segment::Cubic { point, .. }
        | Segment::Arc { point, .. } => *point = start_id,
    }
    points.retain(|s| s.id != end);
}
