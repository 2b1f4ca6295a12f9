//! Integration tests: editor commands → project → undo/redo.
//!
//! Each scenario drives the `Editor` façade the way an interactive tool
//! would and then checks the resulting document, including that one undo
//! takes the whole command back.

use kurbo::{Point, Rect};
use pretty_assertions::assert_eq;
use sk_core::id::ShapeId;
use sk_core::model::{Shape, ShapeKind};
use sk_core::project::{Column, Database, ImageStore, Project, Record};
use sk_core::seq::Seq;
use sk_editor::{Clipboard, Editor, EditorConfig};
use sk_render::Renderer;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

fn editor() -> Editor {
    Editor::new(Project::with_page("test", 800.0, 600.0), EditorConfig::default())
}

fn add_line(editor: &mut Editor, x1: f64, y1: f64, x2: f64, y2: f64) -> ShapeId {
    let layer = editor.project.current_layer.unwrap();
    let line = editor.project.new_line(x1, y1, x2, y2);
    editor.project.add_shape(&mut editor.history, layer, line);
    line
}

fn endpoints(editor: &Editor, line: ShapeId) -> (ShapeId, ShapeId) {
    match editor.project.shape(line).map(|s| &s.kind) {
        Some(ShapeKind::Line { start, end }) => (*start, *end),
        other => panic!("not a line: {other:?}"),
    }
}

/// A clipboard two editors can share.
#[derive(Clone, Default)]
struct SharedClipboard(Rc<RefCell<Option<String>>>);

impl Clipboard for SharedClipboard {
    fn set_text(&mut self, text: String) {
        *self.0.borrow_mut() = Some(text);
    }

    fn get_text(&self) -> Option<String> {
        self.0.borrow().clone()
    }
}

#[derive(Default)]
struct Calls {
    clears: usize,
    images: Vec<Option<usize>>,
}

struct RecordingRenderer(Rc<RefCell<Calls>>);

impl Renderer for RecordingRenderer {
    fn clear_cache(&mut self) {
        self.0.borrow_mut().clears += 1;
    }

    fn set_image_cache(&mut self, images: Option<ImageStore>) {
        self.0.borrow_mut().images.push(images.map(|i| i.len()));
    }
}

// ─── Split ───────────────────────────────────────────────────────────────

#[test]
fn split_then_undo_restores_the_same_endpoints() {
    let mut editor = editor();
    let line = add_line(&mut editor, 0.0, 0.0, 100.0, 0.0);
    let (start, end) = endpoints(&editor, line);
    editor.history.clear();

    let (first, second) = editor.split_line_at(Point::new(40.0, 2.0)).unwrap();
    assert_eq!(&*editor.project.current_shapes(), &[first, second]);

    let (first_start, middle) = endpoints(&editor, first);
    let (second_start, second_end) = endpoints(&editor, second);
    assert_eq!(first_start, start);
    assert_eq!(second_end, end);
    assert_eq!(middle, second_start);
    assert_eq!(editor.project.shapes().position(middle), Some((40.0, 0.0)));

    assert!(editor.undo());
    assert_eq!(&*editor.project.current_shapes(), &[line]);
    assert_eq!(endpoints(&editor, line), (start, end));
    assert!(!editor.history.can_undo());

    assert!(editor.redo());
    assert_eq!(&*editor.project.current_shapes(), &[first, second]);
}

#[test]
fn split_misses_when_no_line_is_near() {
    let mut editor = editor();
    add_line(&mut editor, 0.0, 0.0, 100.0, 0.0);
    assert_eq!(editor.split_line_at(Point::new(50.0, 40.0)), None);
}

#[test]
fn dropped_group_connectors_split_a_line() {
    let mut editor = editor();
    let line = add_line(&mut editor, 0.0, 50.0, 300.0, 50.0);
    let (start, end) = endpoints(&editor, line);

    // A 100-wide box with connectors at its left and right mid points.
    let left = editor.project.new_point(0.0, 10.0);
    let right = editor.project.new_point(100.0, 10.0);
    let body = editor.project.new_rectangle(0.0, 0.0, 100.0, 20.0);
    let group = editor.project.insert_shape(Shape::new(ShapeKind::Group {
        shapes: Seq::from(vec![body]),
        connectors: Seq::from(vec![left, right]),
    }));
    editor.history.clear();

    let placed = editor
        .insert_group_at(group, Point::new(100.0, 40.0))
        .unwrap()
        .unwrap();

    let layer = editor.project.current_shapes();
    assert_eq!(layer.len(), 3, "two halves and the placed group");
    assert!(!layer.contains(&line));
    let ShapeKind::Group { connectors, .. } = &editor.project.shape(placed).unwrap().kind else {
        panic!("expected a group");
    };
    let (copied_left, copied_right) = (connectors[0], connectors[1]);
    assert_eq!(editor.project.shapes().position(copied_left), Some((100.0, 50.0)));

    assert_eq!(endpoints(&editor, layer[0]), (start, copied_left));
    assert_eq!(endpoints(&editor, layer[1]), (copied_right, end));

    assert!(editor.undo());
    assert_eq!(&*editor.project.current_shapes(), &[line]);
}

// ─── Selection ───────────────────────────────────────────────────────────

#[test]
fn marquee_toggle_twice_restores_selection() {
    let mut editor = editor();
    let a = add_line(&mut editor, 0.0, 0.0, 10.0, 0.0);
    let b = add_line(&mut editor, 0.0, 50.0, 10.0, 50.0);
    let c = add_line(&mut editor, 0.0, 100.0, 10.0, 100.0);
    editor.select(&[a, b]);

    let marquee = Rect::new(-5.0, 40.0, 20.0, 110.0);
    assert!(editor.try_select_rect(marquee, true));
    assert_eq!(editor.selection.selected(), &[a, c]);

    editor.try_select_rect(marquee, true);
    let selected: HashSet<ShapeId> = editor.selection.selected().iter().copied().collect();
    assert_eq!(selected, [a, b].into_iter().collect());
}

#[test]
fn click_prefers_points_over_shapes() {
    let mut editor = editor();
    let line = add_line(&mut editor, 0.0, 0.0, 100.0, 0.0);
    let (start, _) = endpoints(&editor, line);

    assert!(editor.try_select_at(Point::new(2.0, 1.0)));
    assert_eq!(editor.selection.selected(), &[start]);

    assert!(editor.try_select_at(Point::new(50.0, 1.0)));
    assert_eq!(editor.selection.selected(), &[line]);
    assert!(editor.selection.decoration().is_none());

    assert!(!editor.try_select_at(Point::new(50.0, 300.0)));
    assert_eq!(editor.selection.selected(), &[line]);
}

#[test]
fn hit_threshold_is_in_screen_pixels() {
    let mut editor = editor();
    let line = add_line(&mut editor, 0.0, 0.0, 100.0, 0.0);
    let query = Point::new(50.0, 5.0);

    editor.set_zoom(1.0);
    assert!(editor.try_select_at(query));
    assert_eq!(editor.selection.selected(), &[line]);

    editor.deselect();
    editor.set_zoom(2.0);
    assert!(!editor.try_select_at(query));
}

#[test]
fn rectangle_is_picked_exactly_at_the_threshold_on_every_side() {
    let mut editor = editor();
    let layer = editor.project.current_layer.unwrap();
    let rect = editor.project.new_rectangle(100.0, 100.0, 200.0, 200.0);
    editor.project.add_shape(&mut editor.history, layer, rect);
    let threshold = editor.config.hit_threshold;

    for zoom in [1.0, 2.0] {
        editor.set_zoom(zoom);
        let r = threshold / zoom;
        for (x, y) in [(100.0 - r, 150.0), (200.0 + r, 150.0), (150.0, 100.0 - r), (150.0, 200.0 + r)] {
            editor.deselect();
            assert!(editor.try_select_at(Point::new(x, y)), "zoom {zoom} at ({x}, {y})");
            assert_eq!(editor.selection.selected(), &[rect]);
        }
        editor.deselect();
        assert!(!editor.try_select_at(Point::new(200.0 + r + 0.5, 150.0)), "zoom {zoom}");
    }
}

// ─── Editing ─────────────────────────────────────────────────────────────

#[test]
fn moving_lines_that_share_a_point_moves_it_once() {
    let mut editor = editor();
    let layer = editor.project.current_layer.unwrap();
    let a = editor.project.new_point(0.0, 0.0);
    let shared = editor.project.new_point(10.0, 0.0);
    let c = editor.project.new_point(20.0, 0.0);
    let l1 = editor.project.insert_shape(Shape::line(a, shared));
    let l2 = editor.project.insert_shape(Shape::line(shared, c));
    editor.project.add_shapes(&mut editor.history, layer, &[l1, l2]);
    editor.history.clear();

    editor.select(&[l1, l2]);
    assert!(editor.move_selection(5.0, 5.0));
    assert_eq!(editor.project.shapes().position(shared), Some((15.0, 5.0)));
    assert_eq!(editor.history.undo_len(), 1);

    editor.undo();
    assert_eq!(editor.project.shapes().position(shared), Some((10.0, 0.0)));
}

#[test]
fn break_rectangle_into_connected_lines() {
    let mut editor = editor();
    let layer = editor.project.current_layer.unwrap();
    let rect = editor.project.new_rectangle(0.0, 0.0, 40.0, 20.0);
    editor.project.add_shape(&mut editor.history, layer, rect);
    editor.history.clear();

    editor.select(&[rect]);
    assert!(editor.break_selected());
    let lines = editor.project.current_shapes();
    assert_eq!(lines.len(), 4);
    for pair in lines.windows(2) {
        assert_eq!(endpoints(&editor, pair[0]).1, endpoints(&editor, pair[1]).0);
    }
    assert_eq!(endpoints(&editor, lines[3]).1, endpoints(&editor, lines[0]).0);
    assert_eq!(editor.selection.selected(), &*lines);

    editor.undo();
    assert_eq!(&*editor.project.current_shapes(), &[rect]);
    assert!(editor.selection.is_empty());
}

#[test]
fn group_then_ungroup_keeps_members() {
    let mut editor = editor();
    let a = add_line(&mut editor, 0.0, 0.0, 10.0, 0.0);
    let b = add_line(&mut editor, 0.0, 10.0, 10.0, 10.0);
    let c = add_line(&mut editor, 0.0, 20.0, 10.0, 20.0);

    editor.select(&[a, c]);
    let group = editor.group_selected().unwrap();
    assert_eq!(&*editor.project.current_shapes(), &[b, group]);
    assert_eq!(editor.project.shape(group).unwrap().kind.children(), &[a, c]);

    assert!(editor.ungroup_selected());
    assert_eq!(&*editor.project.current_shapes(), &[b, a, c]);
    assert_eq!(editor.selection.selected(), &[a, c]);
}

#[test]
fn restack_moves_past_unselected_neighbours() {
    let mut editor = editor();
    let a = add_line(&mut editor, 0.0, 0.0, 10.0, 0.0);
    let b = add_line(&mut editor, 0.0, 10.0, 10.0, 10.0);
    let c = add_line(&mut editor, 0.0, 20.0, 10.0, 20.0);

    editor.select(&[a]);
    assert!(editor.bring_forward());
    assert_eq!(&*editor.project.current_shapes(), &[b, a, c]);
    assert!(editor.send_backward());
    assert!(!editor.send_backward());
    assert_eq!(&*editor.project.current_shapes(), &[a, b, c]);
}

#[test]
fn shared_style_updates_once() {
    let mut editor = editor();
    let style = editor.project.new_style(Default::default());
    let a = add_line(&mut editor, 0.0, 0.0, 10.0, 0.0);
    let b = add_line(&mut editor, 0.0, 10.0, 10.0, 10.0);
    for id in [a, b] {
        editor.project.arena.shapes.get_mut(id).unwrap().style = Some(style);
    }
    editor.history.clear();

    editor.select(&[a, b]);
    assert!(editor.update_selected_styles(|s| s.thickness += 1.0));
    assert_eq!(editor.project.style(style).unwrap().thickness, 3.0);
    editor.undo();
    assert_eq!(editor.project.style(style).unwrap().thickness, 2.0);
}

#[test]
fn commands_work_again_after_undoing_a_layer_removal() {
    let mut editor = editor();
    let page = editor.project.current_container.unwrap();
    let layer = editor.project.current_layer.unwrap();

    assert!(editor.project.remove_layer(&mut editor.history, page, layer));
    assert_eq!(editor.project.current_layer, None);
    assert!(editor.undo());
    assert_eq!(editor.project.current_layer, Some(layer));

    let a = add_line(&mut editor, 0.0, 0.0, 10.0, 0.0);
    let b = add_line(&mut editor, 0.0, 10.0, 10.0, 10.0);
    editor.select(&[a, b]);
    let group = editor.group_selected().expect("layer is current again");
    assert_eq!(&*editor.project.current_shapes(), &[group]);
}

#[test]
fn delete_then_undo_brings_selection_back_into_layer() {
    let mut editor = editor();
    let a = add_line(&mut editor, 0.0, 0.0, 10.0, 0.0);
    editor.select(&[a]);
    assert!(editor.delete_selected());
    assert!(editor.project.current_shapes().is_empty());
    assert!(editor.selection.is_empty());
    editor.undo();
    assert_eq!(&*editor.project.current_shapes(), &[a]);
}

// ─── Clipboard ───────────────────────────────────────────────────────────

#[test]
fn paste_keeps_shared_endpoints_shared() {
    let mut editor = editor();
    let layer = editor.project.current_layer.unwrap();
    let a = editor.project.new_point(0.0, 0.0);
    let b = editor.project.new_point(10.0, 0.0);
    let c = editor.project.new_point(10.0, 10.0);
    let l1 = editor.project.insert_shape(Shape::line(a, b));
    let l2 = editor.project.insert_shape(Shape::line(b, c));
    editor.project.add_shapes(&mut editor.history, layer, &[l1, l2]);
    editor.history.clear();

    editor.select(&[l1, l2]);
    assert!(editor.copy().unwrap());
    assert!(editor.can_paste());
    let pasted = editor.paste().unwrap();

    assert_eq!(pasted.len(), 2);
    assert_eq!(endpoints(&editor, pasted[0]).1, endpoints(&editor, pasted[1]).0);
    assert_ne!(endpoints(&editor, pasted[0]).1, b);
    assert_eq!(editor.selection.selected(), &*pasted);
    assert_eq!(editor.history.undo_len(), 1);

    editor.undo();
    assert_eq!(&*editor.project.current_shapes(), &[l1, l2]);
}

#[test]
fn pasting_foreign_records_twice_creates_one_database() {
    let clipboard = SharedClipboard::default();
    let mut source = editor().with_clipboard(Box::new(clipboard.clone()));
    let db = source
        .project
        .new_database(Database::new("People", Seq::from(vec![Column::new("Name")])));
    source.project.add_database(&mut source.history, db);
    let record = Arc::new(Record::new(db, vec!["Ada".into()]));
    source.project.add_record(&mut source.history, db, record.clone());
    let line = add_line(&mut source, 0.0, 0.0, 10.0, 0.0);
    source.project.arena.shapes.get_mut(line).unwrap().record = Some(record.clone());
    source.select(&[line]);
    source.copy().unwrap();

    let mut target = editor().with_clipboard(Box::new(clipboard));
    let first = target.paste().unwrap();
    let second = target.paste().unwrap();

    assert_eq!(target.project.databases.len(), 1);
    let imported = target.project.database(target.project.databases[0]).unwrap();
    assert_eq!(imported.name, "Imported");
    assert_eq!(imported.records.len(), 1);
    let r1 = target.project.shape(first[0]).unwrap().record.clone().unwrap();
    let r2 = target.project.shape(second[0]).unwrap().record.clone().unwrap();
    assert!(Arc::ptr_eq(&r1, &r2));
    assert_eq!(r1.id, record.id);

    // Undoing the first paste also removes the imported database.
    target.undo();
    target.undo();
    assert!(target.project.databases.is_empty());
}

#[test]
fn svg_path_text_pastes_as_a_path() {
    let mut clipboard = SharedClipboard::default();
    let mut editor = editor().with_clipboard(Box::new(clipboard.clone()));
    clipboard.set_text("M0 0 L50 0 L50 50 Z".into());

    let pasted = editor.paste().unwrap();
    assert_eq!(pasted.len(), 1);
    assert!(matches!(
        editor.project.shape(pasted[0]).unwrap().kind,
        ShapeKind::Path { .. }
    ));
}

#[test]
fn empty_or_unknown_clipboard_leaves_document_alone() {
    let mut clipboard = SharedClipboard::default();
    let mut editor = editor().with_clipboard(Box::new(clipboard.clone()));
    assert!(matches!(editor.paste(), Err(sk_editor::EditorError::ClipboardEmpty)));

    clipboard.set_text("definitely not shapes".into());
    assert!(matches!(editor.paste(), Err(sk_editor::EditorError::UnsupportedPaste)));
    assert!(!editor.history.can_undo());
    assert!(editor.project.current_shapes().is_empty());
}

#[test]
fn cut_removes_and_duplicate_clones() {
    let mut editor = editor();
    let line = add_line(&mut editor, 0.0, 0.0, 10.0, 0.0);

    editor.select(&[line]);
    let copies = editor.duplicate_selected().unwrap();
    assert_eq!(copies.len(), 1);
    assert_ne!(copies[0], line);
    assert_eq!(editor.project.current_shapes().len(), 2);

    editor.select(&[line]);
    assert!(editor.cut().unwrap());
    assert_eq!(&*editor.project.current_shapes(), &copies[..]);
    assert!(editor.can_paste());
}

// ─── Renderers ───────────────────────────────────────────────────────────

#[test]
fn template_change_clears_renderer_caches() {
    let mut editor = editor();
    let calls = Rc::new(RefCell::new(Calls::default()));
    editor.project.images.add("logo.png", vec![1u8, 2, 3]);
    editor.attach_renderer(Box::new(RecordingRenderer(calls.clone())));

    let template = editor.project.new_container("Template", 800.0, 600.0);
    editor.project.add_template(&mut editor.history, template);
    assert!(editor.set_template(Some(template)));
    assert_eq!(calls.borrow().clears, 1);

    assert_eq!(editor.purge_unused_images(), 1);
    editor.detach_renderers();
    assert_eq!(calls.borrow().images, vec![Some(1), Some(0), None]);
}
