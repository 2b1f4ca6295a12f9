//! Selection and hover state.
//!
//! The selection is an ordered set of shape ids. A single selected point
//! or line is drawn with its own handles; any other selection carries a
//! [`Decoration`], a transient bounds overlay that is not part of the
//! document.

use kurbo::Rect;
use sk_core::geometry;
use sk_core::id::ShapeId;
use sk_core::model::ShapeKind;
use sk_core::project::ShapeStore;
use smallvec::SmallVec;

pub type ShapeSet = SmallVec<[ShapeId; 4]>;

#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub shapes: ShapeSet,
    pub bounds: Option<Rect>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    selected: ShapeSet,
    hovered: Option<ShapeId>,
    decoration: Option<Decoration>,
}

impl Selection {
    pub fn selected(&self) -> &[ShapeId] {
        &self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.selected.contains(&id)
    }

    pub fn hovered(&self) -> Option<ShapeId> {
        self.hovered
    }

    pub fn decoration(&self) -> Option<&Decoration> {
        self.decoration.as_ref()
    }

    /// Replace the selection. Duplicates keep their first position.
    pub fn set(&mut self, store: &ShapeStore, ids: impl IntoIterator<Item = ShapeId>, tolerance: f64) {
        self.selected.clear();
        for id in ids {
            if !self.selected.contains(&id) {
                self.selected.push(id);
            }
        }
        self.refresh(store, tolerance);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.decoration = None;
    }

    /// Drop ids `keep` rejects, e.g. shapes an undo took off the layer.
    pub fn retain(&mut self, store: &ShapeStore, tolerance: f64, mut keep: impl FnMut(ShapeId) -> bool) {
        self.selected.retain(|id| keep(*id));
        if self.hovered.is_some_and(|id| !keep(id)) {
            self.hovered = None;
        }
        self.refresh(store, tolerance);
    }

    /// Recompute the decoration after the selected shapes moved.
    pub fn refresh(&mut self, store: &ShapeStore, tolerance: f64) {
        self.decoration = needs_decoration(store, &self.selected).then(|| Decoration {
            shapes: self.selected.clone(),
            bounds: geometry::union_bounds(store, &self.selected, tolerance),
        });
    }

    /// Hover `candidate` unless the selection rules it out: a multi
    /// selection, or a single selection of some other shape.
    pub fn hover(&mut self, candidate: ShapeId) -> bool {
        let allowed = match self.selected.as_slice() {
            [] => true,
            [only] => *only == candidate,
            _ => false,
        };
        if allowed {
            self.hovered = Some(candidate);
        }
        allowed
    }

    pub fn dehover(&mut self) -> bool {
        self.hovered.take().is_some()
    }
}

/// A lone point or line is decorated by its own handles.
fn needs_decoration(store: &ShapeStore, ids: &[ShapeId]) -> bool {
    match ids {
        [] => false,
        [only] => !matches!(
            store.get(*only).map(|s| &s.kind),
            Some(ShapeKind::Point { .. } | ShapeKind::Line { .. })
        ),
        _ => true,
    }
}

/// Symmetric difference of the current selection and a marquee hit list.
/// Current members keep their order, newly hit shapes follow.
pub fn toggle(current: &[ShapeId], hits: &[ShapeId]) -> Vec<ShapeId> {
    current
        .iter()
        .filter(|id| !hits.contains(id))
        .chain(hits.iter().filter(|id| !current.contains(id)))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sk_core::model::Shape;

    fn scene() -> (ShapeStore, ShapeId, ShapeId, ShapeId) {
        let a = Shape::point(0.0, 0.0);
        let b = Shape::point(10.0, 10.0);
        let line = Shape::line(a.id, b.id);
        let rect = Shape::new(ShapeKind::Rectangle {
            top_left: a.id,
            bottom_right: b.id,
        });
        let (a_id, line_id, rect_id) = (a.id, line.id, rect.id);
        let store = [a, b, line, rect].into_iter().collect();
        (store, a_id, line_id, rect_id)
    }

    #[test]
    fn lone_point_or_line_has_no_decoration() {
        let (store, point, line, rect) = scene();
        let mut selection = Selection::default();

        selection.set(&store, [point], 0.1);
        assert!(selection.decoration().is_none());
        selection.set(&store, [line], 0.1);
        assert!(selection.decoration().is_none());

        selection.set(&store, [rect], 0.1);
        let decoration = selection.decoration().unwrap();
        assert_eq!(decoration.bounds, Some(Rect::new(0.0, 0.0, 10.0, 10.0)));

        selection.set(&store, [point, line], 0.1);
        assert!(selection.decoration().is_some());
    }

    #[test]
    fn hover_is_suppressed_by_other_selection() {
        let (store, _, line, rect) = scene();
        let mut selection = Selection::default();
        assert!(selection.hover(line));

        selection.set(&store, [rect], 0.1);
        assert!(!selection.hover(line));
        assert!(selection.hover(rect));

        selection.set(&store, [rect, line], 0.1);
        assert!(!selection.hover(rect));
        assert!(selection.dehover());
        assert!(!selection.dehover());
    }

    #[test]
    fn toggle_twice_is_identity() {
        let (s1, s2, s3, s4) = (ShapeId::next(), ShapeId::next(), ShapeId::next(), ShapeId::next());
        let current = vec![s1, s2, s3];
        let hits = vec![s2, s4];
        let once = toggle(&current, &hits);
        assert_eq!(once, vec![s1, s3, s4]);
        let mut twice = toggle(&once, &hits);
        twice.sort();
        assert_eq!(twice, current);
    }

    #[test]
    fn set_drops_duplicates() {
        let (store, point, line, _) = scene();
        let mut selection = Selection::default();
        selection.set(&store, [line, point, line], 0.1);
        assert_eq!(selection.selected(), &[line, point]);
    }
}
