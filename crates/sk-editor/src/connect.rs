//! Line splitting and connector attachment.
//!
//! Dropping a group whose connectors land on a line splits that line so
//! the connectors become its new inner endpoints. The halves reuse the
//! original `start` and `end` point objects, so every other shape sharing
//! them stays attached.

use kurbo::Point;
use sk_core::geometry;
use sk_core::id::ShapeId;
use sk_core::model::{Shape, ShapeKind};
use sk_core::project::ShapeStore;

/// A line replaced by two halves. Nothing is in the arena yet.
#[derive(Debug, Clone)]
pub struct Split {
    pub line: ShapeId,
    pub first: Shape,
    pub second: Shape,
}

/// Split `line` at the connector points `p0` and `p1`.
///
/// Whichever connector is nearer to the line's start closes the first half;
/// the other opens the second half. `p0 == p1` splits at a single point.
pub fn split_line(store: &ShapeStore, line: &Shape, p0: ShapeId, p1: ShapeId) -> Option<Split> {
    let ShapeKind::Line { start, end } = line.kind else {
        return None;
    };
    let origin = geometry::point(store, start)?;
    let d0 = geometry::point(store, p0)?.distance(origin);
    let d1 = geometry::point(store, p1)?.distance(origin);
    let (near, far) = if d0 <= d1 { (p0, p1) } else { (p1, p0) };

    Some(Split {
        line: line.id,
        first: half(line, start, near),
        second: half(line, far, end),
    })
}

fn half(line: &Shape, start: ShapeId, end: ShapeId) -> Shape {
    let mut shape = Shape::line(start, end);
    shape.name = line.name.clone();
    shape.style = line.style;
    shape.record = line.record.clone();
    shape.is_stroked = line.is_stroked;
    shape.is_filled = line.is_filled;
    shape
}

/// Stage a split for every line hit by exactly two connectors that line up
/// along one axis only.
///
/// A connector hits a line when it lies within `threshold` of it. The pair
/// counts as aligned when exactly one of `|Δx| < threshold` and
/// `|Δy| < threshold` holds; the pair is then ordered left to right
/// (horizontal) or top to bottom (vertical) before splitting.
pub fn try_to_connect_lines(
    store: &ShapeStore,
    lines: &[ShapeId],
    connectors: &[ShapeId],
    threshold: f64,
) -> Vec<Split> {
    let mut splits = Vec::new();
    for line_id in lines {
        let Some(line) = store.get(*line_id) else { continue };
        let ShapeKind::Line { start, end } = line.kind else { continue };
        let (Some(a), Some(b)) = (geometry::point(store, start), geometry::point(store, end)) else {
            continue;
        };

        let hits: Vec<(ShapeId, Point)> = connectors
            .iter()
            .filter_map(|c| geometry::point(store, *c).map(|p| (*c, p)))
            .filter(|(_, p)| geometry::distance_to_line(a, b, *p) <= threshold)
            .collect();
        let &[first, second] = hits.as_slice() else {
            log::trace!("line {line_id}: {} connectors, not splitting", hits.len());
            continue;
        };

        let dx = (first.1.x - second.1.x).abs();
        let dy = (first.1.y - second.1.y).abs();
        let vertical = dx < threshold;
        let horizontal = dy < threshold;
        if vertical == horizontal {
            continue;
        }
        let swap = if horizontal {
            first.1.x > second.1.x
        } else {
            first.1.y > second.1.y
        };
        let (first, second) = if swap { (second, first) } else { (first, second) };

        if let Some(split) = split_line(store, line, first.0, second.0) {
            log::debug!("connecting line {line_id} at {} and {}", first.0, second.0);
            splits.push(split);
        }
    }
    splits
}
