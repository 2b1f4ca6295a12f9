//! Editor façade: one project, its history, and the selection.
//!
//! Every command reads the live project, stages whatever it needs, and
//! then commits through `ops` inside a named history batch, so each
//! command undoes as a single step. Queries (hit tests) never mutate.

use crate::clipboard::{Clipboard, ClipboardPayload, MemoryClipboard};
use crate::config::EditorConfig;
use crate::connect::{Split, split_line, try_to_connect_lines};
use crate::decompose::{Breakdown, break_shape};
use crate::error::EditorError;
use crate::records::{restore_records, restore_styles};
use crate::selection::{Selection, toggle};
use kurbo::{Point, Rect, Vec2};
use sk_core::convert::{KurboPathConverter, PathConverter};
use sk_core::id::{ContainerId, LayerId, ShapeId, StyleId};
use sk_core::model::{Shape, ShapeKind, ShapeStyle};
use sk_core::project::{Project, ShapeStore};
use sk_core::{Edit, History, geometry, seq};
use sk_render::{Renderer, hit_point, hit_rect, hit_shape};
use std::collections::HashSet;

pub struct Editor {
    pub project: Project,
    pub history: History<Edit>,
    pub selection: Selection,
    pub config: EditorConfig,
    zoom: f64,
    renderers: Vec<Box<dyn Renderer>>,
    clipboard: Box<dyn Clipboard>,
    converter: Box<dyn PathConverter>,
}

impl Editor {
    pub fn new(project: Project, config: EditorConfig) -> Self {
        Self {
            project,
            history: History::new(config.max_undo_depth),
            selection: Selection::default(),
            converter: Box::new(KurboPathConverter {
                tolerance: config.path_tolerance,
            }),
            config,
            zoom: 1.0,
            renderers: Vec::new(),
            clipboard: Box::new(MemoryClipboard::default()),
        }
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_converter(mut self, converter: Box<dyn PathConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() && zoom > 0.0 {
            self.zoom = zoom;
        } else {
            log::warn!("ignoring zoom factor {zoom}");
        }
    }

    /// Hit radius in world units.
    fn radius(&self) -> f64 {
        self.config.hit_threshold / self.zoom
    }

    fn current_layer(&self) -> Option<LayerId> {
        self.project
            .current_layer
            .filter(|id| self.project.layer(*id).is_some())
    }

    fn select_ids(&mut self, ids: impl IntoIterator<Item = ShapeId>) {
        self.selection
            .set(self.project.shapes(), ids, self.config.path_tolerance);
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select the topmost point under `p`, or failing that the topmost
    /// shape. The selection is left alone when nothing is hit.
    pub fn try_select_at(&mut self, p: Point) -> bool {
        let shapes = self.project.current_shapes();
        let store = self.project.shapes();
        let radius = self.radius();
        let Some(hit) = hit_point(store, &shapes, p, radius).or_else(|| hit_shape(store, &shapes, p, radius)) else {
            return false;
        };
        self.select_ids([hit]);
        true
    }

    /// Marquee selection. With `include_selected`, shapes already selected
    /// and hit again drop out, newly hit shapes join.
    pub fn try_select_rect(&mut self, rect: Rect, include_selected: bool) -> bool {
        let shapes = self.project.current_shapes();
        let hits = hit_rect(self.project.shapes(), &shapes, rect.abs(), self.radius());
        let next = if include_selected {
            toggle(self.selection.selected(), &hits)
        } else {
            hits
        };
        let any = !next.is_empty();
        self.select_ids(next);
        any
    }

    pub fn select(&mut self, ids: &[ShapeId]) {
        self.select_ids(ids.iter().copied());
    }

    pub fn select_all(&mut self) {
        let shapes = self.project.current_shapes();
        self.select_ids(shapes.iter().copied());
    }

    pub fn deselect(&mut self) {
        self.selection.clear();
    }

    pub fn hover_at(&mut self, p: Point) -> bool {
        let shapes = self.project.current_shapes();
        let store = self.project.shapes();
        let radius = self.radius();
        match hit_point(store, &shapes, p, radius).or_else(|| hit_shape(store, &shapes, p, radius)) {
            Some(candidate) => self.selection.hover(candidate),
            None => {
                self.selection.dehover();
                false
            }
        }
    }

    pub fn dehover(&mut self) -> bool {
        self.selection.dehover()
    }

    /// Forget selected shapes that are no longer part of the drawing.
    fn prune_selection(&mut self) {
        let live_points: HashSet<ShapeId> = self
            .project
            .shapes()
            .collect_points(&self.project.current_shapes())
            .into_iter()
            .collect();
        let project = &self.project;
        self.selection.retain(project.shapes(), self.config.path_tolerance, |id| {
            project.owner_of(id).is_some() || live_points.contains(&id)
        });
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    pub fn delete_selected(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        let ids = self.selection.selected().to_vec();
        self.history.begin_batch("delete");
        let mut any = false;
        for id in ids {
            any |= self.project.detach_shape(&mut self.history, id);
        }
        self.history.end_batch();
        self.selection.clear();
        self.selection.dehover();
        any
    }

    /// Move every point of the selection once, however many selected
    /// shapes share it.
    pub fn move_selection(&mut self, dx: f64, dy: f64) -> bool {
        let points = self.project.shapes().collect_points(self.selection.selected());
        if points.is_empty() {
            return false;
        }
        self.history.begin_batch("move");
        for point in points {
            if let Some((x, y)) = self.project.shapes().position(point) {
                self.project.move_point(&mut self.history, point, x + dx, y + dy);
            }
        }
        self.history.end_batch();
        self.selection.refresh(self.project.shapes(), self.config.path_tolerance);
        true
    }

    /// Apply `change` once to every distinct style used by the selection
    /// (group members included).
    pub fn update_selected_styles(&mut self, change: impl Fn(&mut ShapeStyle)) -> bool {
        let store = self.project.shapes();
        let mut styles: Vec<StyleId> = Vec::new();
        let mut stack: Vec<ShapeId> = self.selection.selected().to_vec();
        while let Some(id) = stack.pop() {
            let Some(shape) = store.get(id) else { continue };
            if let Some(style) = shape.style
                && !styles.contains(&style)
            {
                styles.push(style);
            }
            stack.extend(shape.kind.children().iter().copied());
        }
        if styles.is_empty() {
            return false;
        }

        self.history.begin_batch("style");
        for id in styles {
            let Some(mut style) = self.project.style(id).cloned() else { continue };
            change(&mut style);
            self.project.update_style(&mut self.history, id, style);
        }
        self.history.end_batch();
        true
    }

    /// Replace the selected layer shapes by one group on top of the layer.
    pub fn group_selected(&mut self) -> Option<ShapeId> {
        let layer = self.current_layer()?;
        let shapes = self.project.current_shapes();
        let members: Vec<ShapeId> = shapes
            .iter()
            .copied()
            .filter(|id| self.selection.contains(*id))
            .collect();
        if members.is_empty() {
            return None;
        }
        let group = self.project.insert_shape(Shape::group(&members));
        let next = seq::with(&seq::without_all(&shapes, &members), group);

        self.history.begin_batch("group");
        self.project.set_layer_shapes(&mut self.history, layer, next);
        self.history.end_batch();
        self.select_ids([group]);
        Some(group)
    }

    /// Put each selected group's children where the group was.
    pub fn ungroup_selected(&mut self) -> bool {
        let Some(layer) = self.current_layer() else {
            return false;
        };
        let mut next = self.project.current_shapes();
        let mut released: Vec<ShapeId> = Vec::new();
        for id in self.selection.selected() {
            let Some(ShapeKind::Group { shapes, .. }) = self.project.shape(*id).map(|s| &s.kind) else {
                continue;
            };
            if let Some(spliced) = seq::splice(&next, id, shapes) {
                next = spliced;
                released.extend(shapes.iter().copied());
            }
        }
        if released.is_empty() {
            return false;
        }

        self.history.begin_batch("ungroup");
        self.project.set_layer_shapes(&mut self.history, layer, next);
        self.history.end_batch();
        self.select_ids(released);
        true
    }

    pub fn bring_forward(&mut self) -> bool {
        self.restack(true)
    }

    pub fn send_backward(&mut self) -> bool {
        self.restack(false)
    }

    /// Move each selected layer shape one step up (or down), past the
    /// nearest unselected neighbour.
    fn restack(&mut self, forward: bool) -> bool {
        let Some(layer) = self.current_layer() else {
            return false;
        };
        let mut order = self.project.current_shapes().to_vec();
        let selected = |id: &ShapeId| self.selection.contains(*id);
        let mut moved = false;
        if forward {
            for i in (0..order.len().saturating_sub(1)).rev() {
                if selected(&order[i]) && !selected(&order[i + 1]) {
                    order.swap(i, i + 1);
                    moved = true;
                }
            }
        } else {
            for i in 1..order.len() {
                if selected(&order[i]) && !selected(&order[i - 1]) {
                    order.swap(i - 1, i);
                    moved = true;
                }
            }
        }
        if !moved {
            return false;
        }
        let description = if forward { "bring forward" } else { "send backward" };
        self.history.begin_batch(description);
        self.project.set_layer_shapes(&mut self.history, layer, order.into());
        self.history.end_batch();
        true
    }

    /// Break every selected layer shape into primitives.
    pub fn break_selected(&mut self) -> bool {
        let Some(layer) = self.current_layer() else {
            return false;
        };
        let shapes = self.project.current_shapes();
        let mut breakdown = Breakdown::default();
        for id in self.selection.selected() {
            if !shapes.contains(id) {
                continue;
            }
            let Some(shape) = self.project.shape(*id) else { continue };
            break_shape(
                self.project.shapes(),
                &self.project.arena.styles,
                self.converter.as_ref(),
                shape,
                &mut breakdown,
            );
        }
        if breakdown.is_empty() {
            return false;
        }

        for (id, style) in breakdown.styles {
            self.project.arena.styles.insert(id, style);
        }
        for shape in breakdown.shapes {
            self.project.insert_shape(shape);
        }
        self.history.begin_batch("break");
        self.project.remove_shapes(&mut self.history, layer, &breakdown.remove);
        self.project.add_shapes(&mut self.history, layer, &breakdown.add);
        self.history.end_batch();
        log::debug!(
            "broke {} shapes into {}",
            breakdown.remove.len(),
            breakdown.add.len()
        );
        self.select_ids(breakdown.add);
        true
    }

    // ─── Lines and connectors ────────────────────────────────────────────

    fn commit_split(&mut self, layer: LayerId, split: Split) -> Option<(ShapeId, ShapeId)> {
        let first = self.project.insert_shape(split.first);
        let second = self.project.insert_shape(split.second);
        let previous = self.project.layer(layer)?.shapes.clone();
        let next = seq::splice(&previous, &split.line, &[first, second])?;
        self.project
            .set_layer_shapes(&mut self.history, layer, next)
            .then_some((first, second))
    }

    /// Split the topmost line under `p` at the point of the line nearest
    /// to `p`. Returns the two halves.
    pub fn split_line_at(&mut self, p: Point) -> Option<(ShapeId, ShapeId)> {
        let layer = self.current_layer()?;
        let shapes = self.project.current_shapes();
        let radius = self.radius();
        let store = self.project.shapes();
        let line = shapes.iter().rev().find_map(|id| {
            let shape = store.get(*id)?;
            let ShapeKind::Line { start, end } = shape.kind else {
                return None;
            };
            hit_shape(store, &[*id], p, radius)?;
            Some((shape.clone(), start, end))
        });
        let (line, start, end) = line?;
        let a = geometry::point(store, start)?;
        let b = geometry::point(store, end)?;
        let at = geometry::nearest_point_on_line(a, b, p);

        let point = self.project.new_point(at.x, at.y);
        let split = split_line(self.project.shapes(), &line, point, point)?;
        self.history.begin_batch("split line");
        let halves = self.commit_split(layer, split);
        self.history.end_batch();
        if halves.is_some() {
            self.prune_selection();
        }
        halves
    }

    /// Drop a copy of `group` (usually a group-library item) with its top
    /// left corner at `at`. Lines of the layer hit by exactly two of the
    /// copy's connectors are split to meet them.
    pub fn insert_group_at(&mut self, group: ShapeId, at: Point) -> Result<Option<ShapeId>, EditorError> {
        logged("insert group", self.insert_group_inner(group, at))
    }

    fn insert_group_inner(&mut self, group: ShapeId, at: Point) -> Result<Option<ShapeId>, EditorError> {
        if !matches!(self.project.shape(group).map(|s| &s.kind), Some(ShapeKind::Group { .. })) {
            return Ok(None);
        }
        let layer = self.current_layer().ok_or(EditorError::NoCurrentLayer)?;
        let payload = ClipboardPayload::capture(&self.project, &[group])?.deep_clone()?;
        let mut staged = payload.stage()?;
        let Some(&root) = staged.roots.first() else {
            return Ok(None);
        };

        let store: ShapeStore = staged.shapes.iter().cloned().collect();
        let offset = geometry::bounds(&store, root, self.config.path_tolerance)
            .map(|b| at - b.origin())
            .unwrap_or(Vec2::ZERO);
        translate(&mut staged.shapes, offset);
        let connectors: Vec<ShapeId> = staged
            .shapes
            .iter()
            .find(|s| s.id == root)
            .map(|s| s.kind.points().to_vec())
            .unwrap_or_default();

        self.history.begin_batch("insert group");
        self.commit_staged(layer, &payload, staged.shapes, &staged.roots);
        let lines: Vec<ShapeId> = self
            .project
            .current_shapes()
            .iter()
            .copied()
            .filter(|id| matches!(self.project.shape(*id).map(|s| &s.kind), Some(ShapeKind::Line { .. })))
            .collect();
        let splits = try_to_connect_lines(
            self.project.shapes(),
            &lines,
            &connectors,
            self.config.connect_threshold,
        );
        for split in splits {
            self.commit_split(layer, split);
        }
        self.history.end_batch();
        self.select_ids([root]);
        Ok(Some(root))
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    pub fn can_paste(&self) -> bool {
        self.clipboard.contains_text()
    }

    pub fn copy(&mut self) -> Result<bool, EditorError> {
        logged("copy", self.copy_inner())
    }

    fn copy_inner(&mut self) -> Result<bool, EditorError> {
        if self.selection.is_empty() {
            return Ok(false);
        }
        let payload = ClipboardPayload::capture(&self.project, self.selection.selected())?;
        self.clipboard.set_text(payload.to_text()?);
        Ok(true)
    }

    pub fn cut(&mut self) -> Result<bool, EditorError> {
        if !self.copy()? {
            return Ok(false);
        }
        Ok(self.delete_selected())
    }

    /// Paste shapes from the clipboard into the current layer. Text that
    /// is not a shape payload is tried as SVG path data.
    pub fn paste(&mut self) -> Result<Vec<ShapeId>, EditorError> {
        logged("paste", self.paste_inner())
    }

    fn paste_inner(&mut self) -> Result<Vec<ShapeId>, EditorError> {
        let text = self
            .clipboard
            .get_text()
            .filter(|text| !text.is_empty())
            .ok_or(EditorError::ClipboardEmpty)?;
        let payload = match ClipboardPayload::from_text(&text) {
            Ok(payload) => payload,
            Err(err) => {
                log::debug!("clipboard text is not a shape payload: {err}");
                let converted = self
                    .converter
                    .from_svg_path_data(&text, true, false)
                    .ok_or(EditorError::UnsupportedPaste)?;
                ClipboardPayload::from_converted(converted)
            }
        };
        self.insert_payload(&payload, "paste")
    }

    /// Clone the selection through the binary serializer and add the clone
    /// to the current layer.
    pub fn duplicate_selected(&mut self) -> Result<Vec<ShapeId>, EditorError> {
        logged("duplicate", self.duplicate_inner())
    }

    fn duplicate_inner(&mut self) -> Result<Vec<ShapeId>, EditorError> {
        if self.selection.is_empty() {
            return Ok(Vec::new());
        }
        let payload = ClipboardPayload::capture(&self.project, self.selection.selected())?.deep_clone()?;
        self.insert_payload(&payload, "duplicate")
    }

    fn insert_payload(&mut self, payload: &ClipboardPayload, description: &str) -> Result<Vec<ShapeId>, EditorError> {
        let layer = self.current_layer().ok_or(EditorError::NoCurrentLayer)?;
        let mut staged = payload.stage()?;
        let offset = self.config.paste_offset;
        translate(&mut staged.shapes, Vec2::new(offset, offset));

        self.history.begin_batch(description);
        self.commit_staged(layer, payload, staged.shapes, &staged.roots);
        self.history.end_batch();
        self.select_ids(staged.roots.iter().copied());
        Ok(staged.roots)
    }

    /// Repair styles and records of staged shapes, move them into the
    /// arena and add the roots to `layer`. Runs inside the caller's batch.
    fn commit_staged(&mut self, layer: LayerId, payload: &ClipboardPayload, mut shapes: Vec<Shape>, roots: &[ShapeId]) {
        restore_styles(
            &mut self.project,
            &mut self.history,
            &mut shapes,
            &payload.styles,
            &self.config.imported_style_library_name,
        );
        restore_records(
            &mut self.project,
            &mut self.history,
            &mut shapes,
            &payload.databases,
            &self.config.imported_database_name,
        );
        for shape in shapes {
            self.project.insert_shape(shape);
        }
        self.project.add_shapes(&mut self.history, layer, roots);
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        let Some(description) = self.history.undo(&mut self.project) else {
            return false;
        };
        log::debug!("undo '{description}'");
        self.prune_selection();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(description) = self.history.redo(&mut self.project) else {
            return false;
        };
        log::debug!("redo '{description}'");
        self.prune_selection();
        true
    }

    // ─── Templates, renderers, images ────────────────────────────────────

    /// Attach `template` to the current page (or detach with `None`).
    /// Attached renderers drop their caches.
    pub fn set_template(&mut self, template: Option<ContainerId>) -> bool {
        let Some(page) = self.project.current_container else {
            return false;
        };
        if !self.project.set_template(&mut self.history, page, template) {
            return false;
        }
        for renderer in &mut self.renderers {
            renderer.clear_cache();
        }
        true
    }

    pub fn attach_renderer(&mut self, mut renderer: Box<dyn Renderer>) {
        renderer.set_image_cache(Some(self.project.images.clone()));
        self.renderers.push(renderer);
    }

    pub fn detach_renderers(&mut self) {
        for mut renderer in self.renderers.drain(..) {
            renderer.set_image_cache(None);
        }
    }

    /// Drop image bytes no shape in the arena refers to. Run after
    /// `Project::compact` to also drop images of deleted shapes.
    pub fn purge_unused_images(&mut self) -> usize {
        let used: HashSet<String> = self
            .project
            .shapes()
            .iter()
            .filter_map(|shape| match &shape.kind {
                ShapeKind::Image { key, .. } => Some(key.clone()),
                _ => None,
            })
            .collect();
        let removed = self.project.images.purge_unused(&used);
        if removed > 0 {
            for renderer in &mut self.renderers {
                renderer.set_image_cache(Some(self.project.images.clone()));
            }
        }
        removed
    }
}

fn translate(shapes: &mut [Shape], offset: Vec2) {
    if offset == Vec2::ZERO {
        return;
    }
    for shape in shapes {
        if let ShapeKind::Point { x, y } = &mut shape.kind {
            *x += offset.x;
            *y += offset.y;
        }
    }
}

fn logged<T>(what: &str, result: Result<T, EditorError>) -> Result<T, EditorError> {
    if let Err(err) = &result {
        log::error!("{what} failed: {err}");
    }
    result
}
