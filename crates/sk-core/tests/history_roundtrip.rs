//! Integration tests: tracked operations → undo/redo → verify collections.
//!
//! Exercises the full `sk-core` edit path: ops build next states, the
//! history records them, and undo/redo restore every intermediate state.

use pretty_assertions::assert_eq;
use sk_core::copy::{CopyMap, copy_shapes};
use sk_core::id::{DatabaseId, LayerId, ShapeId, StyleId};
use sk_core::model::{Shape, ShapeKind, ShapeStyle};
use sk_core::project::{Column, Database, Project, Record};
use sk_core::seq::Seq;
use sk_core::{Edit, History};
use std::sync::Arc;

/// What a test compares between steps.
#[derive(Debug, Clone, PartialEq)]
struct State {
    layer: Vec<ShapeId>,
    positions: Vec<(f64, f64)>,
    style_thickness: f64,
    records: usize,
}

fn layer_of(project: &Project) -> LayerId {
    project.current_layer.expect("with_page sets a layer")
}

fn capture(project: &Project, points: &[ShapeId], style: StyleId, db: DatabaseId) -> State {
    State {
        layer: project.current_shapes().to_vec(),
        positions: points
            .iter()
            .map(|p| project.shapes().position(*p).unwrap())
            .collect(),
        style_thickness: project.style(style).unwrap().thickness,
        records: project.database(db).unwrap().records.len(),
    }
}

// ─── Round trip ──────────────────────────────────────────────────────────

#[test]
fn every_step_is_restored_by_undo_and_redo() {
    let mut project = Project::with_page("p", 800.0, 600.0);
    let mut history: History<Edit> = History::new(64);
    let layer = layer_of(&project);

    let style = project.new_style(ShapeStyle::default());
    let db = project.new_database(Database::new("db", Seq::from(vec![Column::new("Name")])));
    project.add_database(&mut history, db);
    history.clear();

    let l1 = project.new_line(0.0, 0.0, 10.0, 0.0);
    let l2 = project.new_line(0.0, 5.0, 10.0, 5.0);
    let rect = project.new_rectangle(20.0, 20.0, 40.0, 30.0);
    let points = project.shapes().collect_points(&[l1, l2, rect]);

    let mut states = vec![capture(&project, &points, style, db)];
    macro_rules! step {
        ($op:expr) => {{
            assert!($op);
            states.push(capture(&project, &points, style, db));
        }};
    }

    step!(project.add_shape(&mut history, layer, l1));
    step!(project.add_shapes(&mut history, layer, &[l2, rect]));
    step!(project.swap_shapes(&mut history, layer, l1, rect));
    step!(project.move_point(&mut history, points[0], 3.0, 4.0));
    let thicker = ShapeStyle {
        thickness: 9.0,
        ..ShapeStyle::default()
    };
    step!(project.update_style(&mut history, style, thicker));
    let row = Arc::new(Record::new(db, vec!["row".into()]));
    step!(project.add_record(&mut history, db, row));
    step!(project.remove_shape(&mut history, layer, l2));

    let n = states.len() - 1;
    assert_eq!(history.undo_len(), n);

    for i in (0..n).rev() {
        history.undo(&mut project).unwrap();
        assert_eq!(capture(&project, &points, style, db), states[i], "undo to step {i}");
    }
    for i in 1..=n {
        history.redo(&mut project).unwrap();
        assert_eq!(capture(&project, &points, style, db), states[i], "redo to step {i}");
    }
}

#[test]
fn removed_shape_comes_back_as_the_same_object() {
    let mut project = Project::with_page("p", 800.0, 600.0);
    let mut history = History::new(16);
    let layer = layer_of(&project);
    let line = project.new_line(0.0, 0.0, 10.0, 10.0);
    project.add_shape(&mut history, layer, line);

    project.remove_shape(&mut history, layer, line);
    assert!(project.current_shapes().is_empty());

    history.undo(&mut project);
    assert_eq!(&*project.current_shapes(), &[line]);
    assert!(matches!(project.shape(line).unwrap().kind, ShapeKind::Line { .. }));
}

#[test]
fn compact_keeps_what_history_can_restore() {
    let mut project = Project::with_page("p", 800.0, 600.0);
    let mut history = History::new(16);
    let layer = layer_of(&project);
    let kept = project.new_line(0.0, 0.0, 10.0, 10.0);
    let _orphan = project.new_line(50.0, 50.0, 60.0, 60.0);
    project.add_shape(&mut history, layer, kept);
    project.remove_shape(&mut history, layer, kept);

    // Orphan line and its two points go; the removed line survives for undo.
    assert_eq!(project.compact(&history), 3);
    history.undo(&mut project);
    assert!(project.shapes().position(project.shapes().collect_points(&[kept])[0]).is_some());

    project.remove_shape(&mut history, layer, kept);
    history.clear();
    assert_eq!(project.compact(&history), 3);
}

// ─── Aliasing ────────────────────────────────────────────────────────────

#[test]
fn copied_shapes_share_endpoints_like_the_source() {
    let mut project = Project::with_page("p", 800.0, 600.0);
    let a = project.new_point(0.0, 0.0);
    let b = project.new_point(10.0, 0.0);
    let c = project.new_point(10.0, 10.0);
    let l1 = project.insert_shape(Shape::line(a, b));
    let l2 = project.insert_shape(Shape::line(b, c));
    let l3 = project.insert_shape(Shape::line(c, a));

    let copied = copy_shapes(project.shapes(), &[l1, l2, l3], &mut CopyMap::new()).unwrap();
    assert_eq!(copied.shapes.len(), 6);
    for shape in copied.shapes {
        project.insert_shape(shape);
    }
    let copies = copied.roots;
    assert_eq!(
        project.shapes().collect_points(&copies).len(),
        3,
        "a triangle copy still has three corners"
    );
}
