//! Shape decomposition: paths and groups → flat primitives.
//!
//! Breaking never touches the project. It stages new arena objects and the
//! top-level ids to add and remove in a [`Breakdown`]; the editor commits
//! the whole breakdown as one transaction.
//!
//! Primitives built from a figure chain its point objects: each segment
//! starts on the previous segment's end point, not on a copy of it.

use sk_core::convert::PathConverter;
use sk_core::id::{ShapeId, StyleId};
use sk_core::model::{Figure, Geometry, Segment, Shape, ShapeKind, ShapeStyle};
use sk_core::project::ShapeStore;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Breakdown {
    /// New shapes for the arena (primitives, split paths, converted points).
    pub shapes: Vec<Shape>,
    /// New styles for the arena.
    pub styles: Vec<(StyleId, ShapeStyle)>,
    /// Top-level shapes to add to the layer, in order.
    pub add: Vec<ShapeId>,
    /// Top-level shapes to take off the layer.
    pub remove: Vec<ShapeId>,
}

impl Breakdown {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    fn push(&mut self, shape: Shape) {
        self.add.push(shape.id);
        self.shapes.push(shape);
    }

    /// A private copy of `source`'s style, or of the default style.
    fn copy_style(&mut self, styles: &HashMap<StyleId, ShapeStyle>, source: &Shape) -> StyleId {
        let style = source
            .style
            .and_then(|id| styles.get(&id))
            .cloned()
            .unwrap_or_default();
        let id = StyleId::next();
        self.styles.push((id, style));
        id
    }
}

/// Break `shape` into simpler shapes. Returns `false` when the shape is
/// already primitive or cannot be converted.
pub fn break_shape(
    store: &ShapeStore,
    styles: &HashMap<StyleId, ShapeStyle>,
    converter: &dyn PathConverter,
    shape: &Shape,
    out: &mut Breakdown,
) -> bool {
    match &shape.kind {
        ShapeKind::Group { shapes, .. } => {
            for child in shapes.iter() {
                let Some(child_shape) = store.get(*child) else {
                    log::warn!("group {} holds missing shape {child}", shape.id);
                    continue;
                };
                if !break_shape(store, styles, converter, child_shape, out) {
                    out.add.push(*child);
                }
            }
            out.remove.push(shape.id);
            true
        }
        ShapeKind::Path { geometry } => {
            break_path(styles, shape, geometry, out);
            out.remove.push(shape.id);
            true
        }
        ShapeKind::Rectangle { .. }
        | ShapeKind::Ellipse { .. }
        | ShapeKind::Text { .. }
        | ShapeKind::Image { .. } => {
            let Some(converted) = converter.to_path_shape(store, shape) else {
                log::debug!("no path conversion for {} {}", shape.kind.label(), shape.id);
                return false;
            };
            out.shapes.extend(converted.points);
            if let ShapeKind::Path { geometry } = &converted.shape.kind {
                break_path(styles, &converted.shape, geometry, out);
            }
            out.remove.push(shape.id);
            true
        }
        ShapeKind::Point { .. }
        | ShapeKind::Line { .. }
        | ShapeKind::Arc { .. }
        | ShapeKind::CubicBezier { .. }
        | ShapeKind::QuadraticBezier { .. } => false,
    }
}

fn break_path(styles: &HashMap<StyleId, ShapeStyle>, path: &Shape, geometry: &Geometry, out: &mut Breakdown) {
    match geometry.figures.as_slice() {
        [figure] => break_figure(styles, path, figure, out),
        figures => {
            for figure in figures {
                let mut single = Shape::new(ShapeKind::Path {
                    geometry: Geometry {
                        fill_rule: geometry.fill_rule,
                        figures: vec![figure.clone()],
                    },
                });
                single.name = path.name.clone();
                single.style = Some(out.copy_style(styles, path));
                single.is_stroked = path.is_stroked;
                single.is_filled = path.is_filled;
                out.push(single);
            }
        }
    }
}

/// One primitive per segment, each starting on the previous segment's end
/// point. A closed figure gets one more line from the last point back to
/// the start, so it yields `segments + 1` shapes. The exception is a figure
/// whose last segment already ends on the start point object, as converted
/// paths that return to their start do: the closing line would join a
/// point to itself, so it yields `segments` shapes.
fn break_figure(styles: &HashMap<StyleId, ShapeStyle>, path: &Shape, figure: &Figure, out: &mut Breakdown) {
    let mut previous = figure.start;
    for segment in &figure.segments {
        let kind = match *segment {
            Segment::Line { point } => ShapeKind::Line {
                start: previous,
                end: point,
            },
            Segment::Quadratic { control, point } => ShapeKind::QuadraticBezier {
                p1: previous,
                p2: control,
                p3: point,
            },
            Segment::Cubic {
                control1,
                control2,
                point,
            } => ShapeKind::CubicBezier {
                p1: previous,
                p2: control1,
                p3: control2,
                p4: point,
            },
            Segment::Arc {
                point,
                radius_x,
                radius_y,
                rotation,
                is_large_arc,
                sweep,
            } => ShapeKind::Arc {
                start: previous,
                end: point,
                radius_x,
                radius_y,
                rotation,
                is_large_arc,
                sweep,
            },
        };
        let shape = primitive(styles, path, kind, out);
        out.push(shape);
        previous = segment.end_point();
    }
    if figure.is_closed && previous != figure.start {
        let closing = ShapeKind::Line {
            start: previous,
            end: figure.start,
        };
        let shape = primitive(styles, path, closing, out);
        out.push(shape);
    }
}

fn primitive(styles: &HashMap<StyleId, ShapeStyle>, path: &Shape, kind: ShapeKind, out: &mut Breakdown) -> Shape {
    let mut shape = Shape::new(kind);
    shape.style = Some(out.copy_style(styles, path));
    shape.is_stroked = path.is_stroked;
    shape.is_filled = path.is_filled;
    shape
}
