//! Reversible edits on a [`Project`].
//!
//! One variant per tracked field. Each variant carries a [`Snapshot`] whose
//! target is the stable id of the object owning the field; the value types
//! are by-value (immutable sequences, plain data, `Arc` handles), so a
//! replayed snapshot can never be corrupted by a later edit.

use crate::history::{Reversible, Side, Snapshot};
use crate::id::{ContainerId, DatabaseId, DocumentId, LayerId, LibraryId, ShapeId, StyleId};
use crate::model::{ShapeKind, ShapeStyle};
use crate::project::{Project, Record};
use crate::seq::Seq;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Edit {
    ProjectDocuments(Snapshot<(), Seq<DocumentId>>),
    ProjectTemplates(Snapshot<(), Seq<ContainerId>>),
    ProjectDatabases(Snapshot<(), Seq<DatabaseId>>),
    CurrentDatabase(Snapshot<(), Option<DatabaseId>>),
    CurrentDocument(Snapshot<(), Option<DocumentId>>),
    CurrentLayer(Snapshot<(), Option<LayerId>>),
    StyleLibraries(Snapshot<(), Seq<LibraryId>>),
    GroupLibraries(Snapshot<(), Seq<LibraryId>>),
    DocumentPages(Snapshot<DocumentId, Seq<ContainerId>>),
    ContainerLayers(Snapshot<ContainerId, Seq<LayerId>>),
    ContainerTemplate(Snapshot<ContainerId, Option<ContainerId>>),
    LayerShapes(Snapshot<LayerId, Seq<ShapeId>>),
    GroupShapes(Snapshot<ShapeId, Seq<ShapeId>>),
    DatabaseRecords(Snapshot<DatabaseId, Seq<Arc<Record>>>),
    LibraryStyles(Snapshot<LibraryId, Seq<StyleId>>),
    LibraryGroups(Snapshot<LibraryId, Seq<ShapeId>>),
    PointPosition(Snapshot<ShapeId, (f64, f64)>),
    ShapeStyle(Snapshot<ShapeId, Option<StyleId>>),
    ShapeRecord(Snapshot<ShapeId, Option<Arc<Record>>>),
    Style(Snapshot<StyleId, ShapeStyle>),
}

fn stale<T: std::fmt::Debug>(what: &str, target: T) {
    log::warn!("history: {what} {target:?} no longer exists, edit skipped");
}

impl Reversible for Edit {
    type Doc = Project;

    fn apply(&self, project: &mut Project, side: Side) {
        let arena = &mut project.arena;
        match self {
            Edit::ProjectDocuments(s) => project.documents = s.value(side).clone(),
            Edit::ProjectTemplates(s) => project.templates = s.value(side).clone(),
            Edit::ProjectDatabases(s) => project.databases = s.value(side).clone(),
            Edit::CurrentDatabase(s) => project.current_database = *s.value(side),
            Edit::CurrentDocument(s) => project.current_document = *s.value(side),
            Edit::CurrentLayer(s) => project.current_layer = *s.value(side),
            Edit::StyleLibraries(s) => project.style_libraries = s.value(side).clone(),
            Edit::GroupLibraries(s) => project.group_libraries = s.value(side).clone(),
            Edit::DocumentPages(s) => match arena.documents.get_mut(&s.target) {
                Some(document) => document.pages = s.value(side).clone(),
                None => stale("document", s.target),
            },
            Edit::ContainerLayers(s) => match arena.containers.get_mut(&s.target) {
                Some(container) => container.layers = s.value(side).clone(),
                None => stale("container", s.target),
            },
            Edit::ContainerTemplate(s) => match arena.containers.get_mut(&s.target) {
                Some(container) => container.template = *s.value(side),
                None => stale("container", s.target),
            },
            Edit::LayerShapes(s) => match arena.layers.get_mut(&s.target) {
                Some(layer) => layer.shapes = s.value(side).clone(),
                None => stale("layer", s.target),
            },
            Edit::GroupShapes(s) => match arena.shapes.get_mut(s.target) {
                Some(shape) => match &mut shape.kind {
                    ShapeKind::Group { shapes, .. } => *shapes = s.value(side).clone(),
                    _ => stale("group", s.target),
                },
                None => stale("group", s.target),
            },
            Edit::DatabaseRecords(s) => match arena.databases.get_mut(&s.target) {
                Some(database) => database.records = s.value(side).clone(),
                None => stale("database", s.target),
            },
            Edit::LibraryStyles(s) => match arena.style_libraries.get_mut(&s.target) {
                Some(library) => library.items = s.value(side).clone(),
                None => stale("style library", s.target),
            },
            Edit::LibraryGroups(s) => match arena.group_libraries.get_mut(&s.target) {
                Some(library) => library.items = s.value(side).clone(),
                None => stale("group library", s.target),
            },
            Edit::PointPosition(s) => match arena.shapes.get_mut(s.target) {
                Some(shape) => match &mut shape.kind {
                    ShapeKind::Point { x, y } => (*x, *y) = *s.value(side),
                    _ => stale("point", s.target),
                },
                None => stale("point", s.target),
            },
            Edit::ShapeStyle(s) => match arena.shapes.get_mut(s.target) {
                Some(shape) => shape.style = *s.value(side),
                None => stale("shape", s.target),
            },
            Edit::ShapeRecord(s) => match arena.shapes.get_mut(s.target) {
                Some(shape) => shape.record = s.value(side).clone(),
                None => stale("shape", s.target),
            },
            Edit::Style(s) => match arena.styles.get_mut(&s.target) {
                Some(style) => *style = s.value(side).clone(),
                None => stale("style", s.target),
            },
        }
    }
}

impl Edit {
    /// Add every shape and style this edit can bring back to life.
    pub(crate) fn collect_roots(&self, shapes: &mut Vec<ShapeId>, styles: &mut HashSet<StyleId>) {
        fn both<K>(s: &Snapshot<K, Seq<ShapeId>>, out: &mut Vec<ShapeId>) {
            out.extend(s.previous.iter().copied());
            out.extend(s.next.iter().copied());
        }
        match self {
            Edit::LayerShapes(s) => both(s, shapes),
            Edit::LibraryGroups(s) => both(s, shapes),
            Edit::GroupShapes(s) => {
                shapes.push(s.target);
                both(s, shapes);
            }
            Edit::PointPosition(s) => shapes.push(s.target),
            Edit::ShapeRecord(s) => shapes.push(s.target),
            Edit::ShapeStyle(s) => {
                shapes.push(s.target);
                styles.extend(s.previous.iter().chain(s.next.iter()).copied());
            }
            Edit::LibraryStyles(s) => {
                styles.extend(s.previous.iter().chain(s.next.iter()).copied());
            }
            Edit::Style(s) => {
                styles.insert(s.target);
            }
            Edit::ProjectDocuments(_)
            | Edit::ProjectTemplates(_)
            | Edit::ProjectDatabases(_)
            | Edit::CurrentDatabase(_)
            | Edit::CurrentDocument(_)
            | Edit::CurrentLayer(_)
            | Edit::StyleLibraries(_)
            | Edit::GroupLibraries(_)
            | Edit::DocumentPages(_)
            | Edit::ContainerLayers(_)
            | Edit::ContainerTemplate(_)
            | Edit::DatabaseRecords(_) => {}
        }
    }
}
