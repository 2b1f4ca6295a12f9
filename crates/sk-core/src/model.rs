//! Core shape model.
//!
//! Shapes live in an arena keyed by `ShapeId`. Every geometric anchor is a
//! `Point` shape referenced by id, so one point can serve as the endpoint of
//! several lines at once. Containment (layer → shape, group → child) is
//! expressed by immutable `Seq<ShapeId>` collections, never by ownership of
//! the referenced point.

use crate::id::{RecordId, ShapeId, StyleId};
use crate::project::Record;
use crate::seq::{self, Seq};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`. The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let byte = |i: usize| -> Option<f32> {
            Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0)
        };

        match bytes.len() {
            6 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, 1.0)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (
            channel(self.r),
            channel(self.g),
            channel(self.b),
            channel(self.a),
        );
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

// ─── Styling ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineCap {
    #[default]
    Flat,
    Square,
    Round,
}

/// A shared style object. Shapes refer to styles by `StyleId`; editing a
/// style changes every shape that references it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub name: String,
    pub stroke: Color,
    pub fill: Color,
    pub thickness: f64,
    pub line_cap: LineCap,
    /// Dash pattern in stroke-width units, e.g. `"2 2"`.
    pub dashes: Option<String>,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            name: "Default".into(),
            stroke: Color::BLACK,
            fill: Color::TRANSPARENT,
            thickness: 2.0,
            line_cap: LineCap::Flat,
            dashes: None,
        }
    }
}

// ─── Path geometry ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillRule {
    #[default]
    EvenOdd,
    Nonzero,
}

/// One drawing command inside a figure. The segment's start is implied by
/// the previous segment's end (or the figure start).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    Line {
        point: ShapeId,
    },
    Quadratic {
        control: ShapeId,
        point: ShapeId,
    },
    Cubic {
        control1: ShapeId,
        control2: ShapeId,
        point: ShapeId,
    },
    Arc {
        point: ShapeId,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        is_large_arc: bool,
        sweep: bool,
    },
}

impl Segment {
    /// The point this segment ends on.
    pub fn end_point(&self) -> ShapeId {
        match self {
            Segment::Line { point }
            | Segment::Quadratic { point, .. }
            | Segment::Cubic { point, .. }
            | Segment::Arc { point, .. } => *point,
        }
    }

    fn points(&self) -> SmallVec<[ShapeId; 3]> {
        match self {
            Segment::Line { point } | Segment::Arc { point, .. } => smallvec::smallvec![*point],
            Segment::Quadratic { control, point } => smallvec::smallvec![*control, *point],
            Segment::Cubic {
                control1,
                control2,
                point,
            } => smallvec::smallvec![*control1, *control2, *point],
        }
    }

    fn map_points(&self, f: &mut impl FnMut(ShapeId) -> ShapeId) -> Segment {
        match self {
            Segment::Line { point } => Segment::Line { point: f(*point) },
            Segment::Quadratic { control, point } => Segment::Quadratic {
                control: f(*control),
                point: f(*point),
            },
            Segment::Cubic {
                control1,
                control2,
                point,
            } => Segment::Cubic {
                control1: f(*control1),
                control2: f(*control2),
                point: f(*point),
            },
            Segment::Arc {
                point,
                radius_x,
                radius_y,
                rotation,
                is_large_arc,
                sweep,
            } => Segment::Arc {
                point: f(*point),
                radius_x: *radius_x,
                radius_y: *radius_y,
                rotation: *rotation,
                is_large_arc: *is_large_arc,
                sweep: *sweep,
            },
        }
    }
}

/// A start point plus an ordered run of segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub start: ShapeId,
    pub segments: Vec<Segment>,
    pub is_filled: bool,
    pub is_closed: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub fill_rule: FillRule,
    pub figures: Vec<Figure>,
}

// ─── Shapes ──────────────────────────────────────────────────────────────

/// The closed set of shape variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Point {
        x: f64,
        y: f64,
    },
    Line {
        start: ShapeId,
        end: ShapeId,
    },
    /// Elliptical arc in endpoint form (SVG `A` semantics).
    Arc {
        start: ShapeId,
        end: ShapeId,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        is_large_arc: bool,
        sweep: bool,
    },
    CubicBezier {
        p1: ShapeId,
        p2: ShapeId,
        p3: ShapeId,
        p4: ShapeId,
    },
    QuadraticBezier {
        p1: ShapeId,
        p2: ShapeId,
        p3: ShapeId,
    },
    Rectangle {
        top_left: ShapeId,
        bottom_right: ShapeId,
    },
    Ellipse {
        top_left: ShapeId,
        bottom_right: ShapeId,
    },
    Text {
        top_left: ShapeId,
        bottom_right: ShapeId,
        text: String,
    },
    Image {
        top_left: ShapeId,
        bottom_right: ShapeId,
        key: String,
    },
    Path {
        geometry: Geometry,
    },
    Group {
        shapes: Seq<ShapeId>,
        /// Points other shapes may attach to when the group is dropped.
        connectors: Seq<ShapeId>,
    },
}

impl ShapeKind {
    pub fn is_point(&self) -> bool {
        matches!(self, ShapeKind::Point { .. })
    }

    /// Short lowercase name of the variant, used for default shape names.
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Point { .. } => "point",
            ShapeKind::Line { .. } => "line",
            ShapeKind::Arc { .. } => "arc",
            ShapeKind::CubicBezier { .. } => "cubic",
            ShapeKind::QuadraticBezier { .. } => "quadratic",
            ShapeKind::Rectangle { .. } => "rectangle",
            ShapeKind::Ellipse { .. } => "ellipse",
            ShapeKind::Text { .. } => "text",
            ShapeKind::Image { .. } => "image",
            ShapeKind::Path { .. } => "path",
            ShapeKind::Group { .. } => "group",
        }
    }

    /// Point shapes this shape references directly, in a stable order.
    /// Groups report their connectors; children are reached via [`Self::children`].
    pub fn points(&self) -> SmallVec<[ShapeId; 4]> {
        match self {
            ShapeKind::Point { .. } => SmallVec::new(),
            ShapeKind::Line { start, end } | ShapeKind::Arc { start, end, .. } => {
                smallvec::smallvec![*start, *end]
            }
            ShapeKind::CubicBezier { p1, p2, p3, p4 } => smallvec::smallvec![*p1, *p2, *p3, *p4],
            ShapeKind::QuadraticBezier { p1, p2, p3 } => smallvec::smallvec![*p1, *p2, *p3],
            ShapeKind::Rectangle {
                top_left,
                bottom_right,
            }
            | ShapeKind::Ellipse {
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
            } => smallvec::smallvec![*top_left, *bottom_right],
            ShapeKind::Path { geometry } => {
                let mut out = SmallVec::new();
                for figure in &geometry.figures {
                    out.push(figure.start);
                    for segment in &figure.segments {
                        out.extend(segment.points());
                    }
                }
                out
            }
            ShapeKind::Group { connectors, .. } => connectors.iter().copied().collect(),
        }
    }

    /// Child shapes owned by a group; empty for every other variant.
    pub fn children(&self) -> &[ShapeId] {
        match self {
            ShapeKind::Group { shapes, .. } => shapes,
            _ => &[],
        }
    }

    /// Every shape id this shape refers to: points first, then children.
    pub fn refs(&self) -> SmallVec<[ShapeId; 4]> {
        let mut out = self.points();
        out.extend(self.children().iter().copied());
        out
    }

    /// A copy of this kind with every referenced shape id passed through `f`.
    pub fn map_refs(&self, mut f: impl FnMut(ShapeId) -> ShapeId) -> ShapeKind {
        match self {
            ShapeKind::Point { x, y } => ShapeKind::Point { x: *x, y: *y },
            ShapeKind::Line { start, end } => ShapeKind::Line {
                start: f(*start),
                end: f(*end),
            },
            ShapeKind::Arc {
                start,
                end,
                radius_x,
                radius_y,
                rotation,
                is_large_arc,
                sweep,
            } => ShapeKind::Arc {
                start: f(*start),
                end: f(*end),
                radius_x: *radius_x,
                radius_y: *radius_y,
                rotation: *rotation,
                is_large_arc: *is_large_arc,
                sweep: *sweep,
            },
            ShapeKind::CubicBezier { p1, p2, p3, p4 } => ShapeKind::CubicBezier {
                p1: f(*p1),
                p2: f(*p2),
                p3: f(*p3),
                p4: f(*p4),
            },
            ShapeKind::QuadraticBezier { p1, p2, p3 } => ShapeKind::QuadraticBezier {
                p1: f(*p1),
                p2: f(*p2),
                p3: f(*p3),
            },
            ShapeKind::Rectangle {
                top_left,
                bottom_right,
            } => ShapeKind::Rectangle {
                top_left: f(*top_left),
                bottom_right: f(*bottom_right),
            },
            ShapeKind::Ellipse {
                top_left,
                bottom_right,
            } => ShapeKind::Ellipse {
                top_left: f(*top_left),
                bottom_right: f(*bottom_right),
            },
            ShapeKind::Text {
                top_left,
                bottom_right,
                text,
            } => ShapeKind::Text {
                top_left: f(*top_left),
                bottom_right: f(*bottom_right),
                text: text.clone(),
            },
            ShapeKind::Image {
                top_left,
                bottom_right,
                key,
            } => ShapeKind::Image {
                top_left: f(*top_left),
                bottom_right: f(*bottom_right),
                key: key.clone(),
            },
            ShapeKind::Path { geometry } => ShapeKind::Path {
                geometry: Geometry {
                    fill_rule: geometry.fill_rule,
                    figures: geometry
                        .figures
                        .iter()
                        .map(|figure| Figure {
                            start: f(figure.start),
                            segments: figure
                                .segments
                                .iter()
                                .map(|s| s.map_points(&mut f))
                                .collect(),
                            is_filled: figure.is_filled,
                            is_closed: figure.is_closed,
                        })
                        .collect(),
                },
            },
            ShapeKind::Group { shapes, connectors } => {
                let connectors: Seq<ShapeId> = connectors.iter().map(|c| f(*c)).collect();
                let shapes: Seq<ShapeId> = shapes.iter().map(|c| f(*c)).collect();
                ShapeKind::Group { shapes, connectors }
            }
        }
    }
}

/// A single drawable element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub name: String,
    pub kind: ShapeKind,
    /// Shared style; `None` renders with the default style.
    pub style: Option<StyleId>,
    /// Shared, non-owning link to a database row.
    pub record: Option<Arc<Record>>,
    pub is_stroked: bool,
    pub is_filled: bool,
}

impl Shape {
    /// A new shape with a fresh id, stroked and unfilled.
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            id: ShapeId::next(),
            name: String::new(),
            kind,
            style: None,
            record: None,
            is_stroked: true,
            is_filled: false,
        }
    }

    pub fn point(x: f64, y: f64) -> Self {
        Self::new(ShapeKind::Point { x, y })
    }

    pub fn line(start: ShapeId, end: ShapeId) -> Self {
        Self::new(ShapeKind::Line { start, end })
    }

    pub fn group(shapes: &[ShapeId]) -> Self {
        Self::new(ShapeKind::Group {
            shapes: Seq::from(shapes),
            connectors: seq::empty(),
        })
    }

    pub fn with_style(mut self, style: StyleId) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_record(mut self, record: Arc<Record>) -> Self {
        self.record = Some(record);
        self
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record.as_ref().map(|r| r.id)
    }

    /// Position of a point shape.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self.kind {
            ShapeKind::Point { x, y } => Some((x, y)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_hex(), "#6C5CE7");

        let c2 = Color::from_hex("#FF000080").unwrap();
        assert!((c2.a - 128.0 / 255.0).abs() < 0.01);
        assert_eq!(c2.to_hex().len(), 9);

        assert!(Color::from_hex("#12").is_none());
    }

    #[test]
    fn path_points_follow_figure_order() {
        let (a, b, c, d) = (ShapeId::next(), ShapeId::next(), ShapeId::next(), ShapeId::next());
        let kind = ShapeKind::Path {
            geometry: Geometry {
                fill_rule: FillRule::EvenOdd,
                figures: vec![Figure {
                    start: a,
                    segments: vec![
                        Segment::Line { point: b },
                        Segment::Quadratic {
                            control: c,
                            point: d,
                        },
                    ],
                    is_filled: false,
                    is_closed: true,
                }],
            },
        };
        assert_eq!(kind.points().as_slice(), &[a, b, c, d]);
    }

    #[test]
    fn map_refs_keeps_shared_endpoints_shared() {
        let shared = ShapeId::next();
        let other = ShapeId::next();
        let replacement = ShapeId::next();
        let kind = ShapeKind::CubicBezier {
            p1: shared,
            p2: other,
            p3: other,
            p4: shared,
        };
        let mapped = kind.map_refs(|id| if id == shared { replacement } else { id });
        assert_eq!(
            mapped,
            ShapeKind::CubicBezier {
                p1: replacement,
                p2: other,
                p3: other,
                p4: replacement,
            }
        );
    }

    #[test]
    fn group_refs_list_connectors_then_children() {
        let child = ShapeId::next();
        let connector = ShapeId::next();
        let kind = ShapeKind::Group {
            shapes: Seq::from(vec![child]),
            connectors: Seq::from(vec![connector]),
        };
        assert_eq!(kind.refs().as_slice(), &[connector, child]);
        assert_eq!(kind.children(), &[child]);
    }
}
