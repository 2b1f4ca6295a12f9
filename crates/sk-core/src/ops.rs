//! Tracked mutation operations.
//!
//! Every operation builds the complete next value of one collection or
//! field from the live project, then commits it through the history as a
//! single [`Edit`]. An operation whose target does not exist, or whose item
//! is not where it is expected, records nothing and returns `false`.

use crate::edit::Edit;
use crate::history::{History, Snapshot};
use crate::id::{ContainerId, DatabaseId, DocumentId, LayerId, LibraryId, ShapeId, StyleId};
use crate::model::{ShapeKind, ShapeStyle};
use crate::project::{Owner, Project, Record};
use crate::seq::{self, Seq};
use std::sync::Arc;

impl Project {
    // ─── Documents, pages, templates ─────────────────────────────────────

    pub fn add_document(&mut self, history: &mut History<Edit>, document: DocumentId) -> bool {
        if self.document(document).is_none() {
            return false;
        }
        let next = seq::with(&self.documents, document);
        let edit = Edit::ProjectDocuments(Snapshot::new((), self.documents.clone(), next));
        history.execute(self, edit);
        true
    }

    pub fn remove_document(&mut self, history: &mut History<Edit>, document: DocumentId) -> bool {
        if !self.documents.contains(&document) {
            return false;
        }
        history.begin_batch("remove document");
        let next = seq::without(&self.documents, &document);
        let edit = Edit::ProjectDocuments(Snapshot::new((), self.documents.clone(), next));
        history.execute(self, edit);
        if self.current_document == Some(document) {
            let next = self.documents.first().copied();
            self.set_current_document(history, next);
        }
        history.end_batch();
        true
    }

    pub fn set_current_document(
        &mut self,
        history: &mut History<Edit>,
        document: Option<DocumentId>,
    ) -> bool {
        if document.is_some_and(|id| self.document(id).is_none()) {
            return false;
        }
        let edit = Edit::CurrentDocument(Snapshot::new((), self.current_document, document));
        history.execute(self, edit);
        true
    }

    pub fn add_page(
        &mut self,
        history: &mut History<Edit>,
        document: DocumentId,
        page: ContainerId,
    ) -> bool {
        let Some(previous) = self.document(document).map(|d| d.pages.clone()) else {
            return false;
        };
        if self.container(page).is_none() {
            return false;
        }
        let next = seq::with(&previous, page);
        history.execute(self, Edit::DocumentPages(Snapshot::new(document, previous, next)));
        true
    }

    pub fn remove_page(
        &mut self,
        history: &mut History<Edit>,
        document: DocumentId,
        page: ContainerId,
    ) -> bool {
        let Some(previous) = self.document(document).map(|d| d.pages.clone()) else {
            return false;
        };
        if !previous.contains(&page) {
            return false;
        }
        let next = seq::without(&previous, &page);
        history.execute(self, Edit::DocumentPages(Snapshot::new(document, previous, next)));
        true
    }

    pub fn add_template(&mut self, history: &mut History<Edit>, template: ContainerId) -> bool {
        if self.container(template).is_none() {
            return false;
        }
        let next = seq::with(&self.templates, template);
        let edit = Edit::ProjectTemplates(Snapshot::new((), self.templates.clone(), next));
        history.execute(self, edit);
        true
    }

    pub fn remove_template(&mut self, history: &mut History<Edit>, template: ContainerId) -> bool {
        if !self.templates.contains(&template) {
            return false;
        }
        let next = seq::without(&self.templates, &template);
        let edit = Edit::ProjectTemplates(Snapshot::new((), self.templates.clone(), next));
        history.execute(self, edit);
        true
    }

    /// Attach (or detach, with `None`) a template to a page.
    pub fn set_template(
        &mut self,
        history: &mut History<Edit>,
        page: ContainerId,
        template: Option<ContainerId>,
    ) -> bool {
        let Some(previous) = self.container(page).map(|c| c.template) else {
            return false;
        };
        if template.is_some_and(|t| self.container(t).is_none()) {
            return false;
        }
        history.execute(self, Edit::ContainerTemplate(Snapshot::new(page, previous, template)));
        true
    }

    // ─── Layers ──────────────────────────────────────────────────────────

    pub fn add_layer(
        &mut self,
        history: &mut History<Edit>,
        container: ContainerId,
        layer: LayerId,
    ) -> bool {
        let Some(previous) = self.container(container).map(|c| c.layers.clone()) else {
            return false;
        };
        if self.layer(layer).is_none() {
            return false;
        }
        let next = seq::with(&previous, layer);
        history.execute(self, Edit::ContainerLayers(Snapshot::new(container, previous, next)));
        true
    }

    pub fn remove_layer(
        &mut self,
        history: &mut History<Edit>,
        container: ContainerId,
        layer: LayerId,
    ) -> bool {
        let Some(previous) = self.container(container).map(|c| c.layers.clone()) else {
            return false;
        };
        if !previous.contains(&layer) {
            return false;
        }
        history.begin_batch("remove layer");
        let next = seq::without(&previous, &layer);
        history.execute(self, Edit::ContainerLayers(Snapshot::new(container, previous, next)));
        if self.current_layer == Some(layer) {
            let next = next_first(self, container);
            self.set_current_layer(history, next);
        }
        history.end_batch();
        true
    }

    pub fn set_current_layer(&mut self, history: &mut History<Edit>, layer: Option<LayerId>) -> bool {
        if layer.is_some_and(|id| self.layer(id).is_none()) {
            return false;
        }
        let edit = Edit::CurrentLayer(Snapshot::new((), self.current_layer, layer));
        history.execute(self, edit);
        true
    }

    // ─── Layer shapes ────────────────────────────────────────────────────

    /// Replace a layer's whole shape collection.
    pub fn set_layer_shapes(
        &mut self,
        history: &mut History<Edit>,
        layer: LayerId,
        next: Seq<ShapeId>,
    ) -> bool {
        let Some(previous) = self.layer(layer).map(|l| l.shapes.clone()) else {
            return false;
        };
        history.execute(self, Edit::LayerShapes(Snapshot::new(layer, previous, next)));
        true
    }

    pub fn add_shape(&mut self, history: &mut History<Edit>, layer: LayerId, shape: ShapeId) -> bool {
        self.add_shapes(history, layer, &[shape])
    }

    pub fn add_shapes(
        &mut self,
        history: &mut History<Edit>,
        layer: LayerId,
        shapes: &[ShapeId],
    ) -> bool {
        if shapes.iter().any(|id| self.shape(*id).is_none()) {
            return false;
        }
        let Some(previous) = self.layer(layer).map(|l| l.shapes.clone()) else {
            return false;
        };
        let next = seq::with_all(&previous, shapes);
        self.set_layer_shapes(history, layer, next)
    }

    /// Insert a shape at a z-order position.
    pub fn insert_shape_at(
        &mut self,
        history: &mut History<Edit>,
        layer: LayerId,
        index: usize,
        shape: ShapeId,
    ) -> bool {
        if self.shape(shape).is_none() {
            return false;
        }
        let Some(previous) = self.layer(layer).map(|l| l.shapes.clone()) else {
            return false;
        };
        let next = seq::insert_at(&previous, index, shape);
        self.set_layer_shapes(history, layer, next)
    }

    pub fn remove_shape(&mut self, history: &mut History<Edit>, layer: LayerId, shape: ShapeId) -> bool {
        self.remove_shapes(history, layer, &[shape])
    }

    pub fn remove_shapes(
        &mut self,
        history: &mut History<Edit>,
        layer: LayerId,
        shapes: &[ShapeId],
    ) -> bool {
        let Some(previous) = self.layer(layer).map(|l| l.shapes.clone()) else {
            return false;
        };
        if !shapes.iter().any(|id| previous.contains(id)) {
            return false;
        }
        let next = seq::without_all(&previous, shapes);
        self.set_layer_shapes(history, layer, next)
    }

    /// Put `new` where `old` was, keeping its z-order position.
    pub fn replace_shape(
        &mut self,
        history: &mut History<Edit>,
        layer: LayerId,
        old: ShapeId,
        new: ShapeId,
    ) -> bool {
        if self.shape(new).is_none() {
            return false;
        }
        let Some(previous) = self.layer(layer).map(|l| l.shapes.clone()) else {
            return false;
        };
        let Some(next) = seq::replace(&previous, &old, new) else {
            return false;
        };
        self.set_layer_shapes(history, layer, next)
    }

    /// Exchange the z-order positions of two shapes of the same layer.
    pub fn swap_shapes(
        &mut self,
        history: &mut History<Edit>,
        layer: LayerId,
        a: ShapeId,
        b: ShapeId,
    ) -> bool {
        let Some(previous) = self.layer(layer).map(|l| l.shapes.clone()) else {
            return false;
        };
        let (Some(ia), Some(ib)) = (
            previous.iter().position(|s| *s == a),
            previous.iter().position(|s| *s == b),
        ) else {
            return false;
        };
        let Some(next) = seq::swap(&previous, ia, ib) else {
            return false;
        };
        self.set_layer_shapes(history, layer, next)
    }

    /// Remove a shape from whichever layer or group holds it.
    pub fn detach_shape(&mut self, history: &mut History<Edit>, shape: ShapeId) -> bool {
        match self.owner_of(shape) {
            Some(Owner::Layer(layer)) => self.remove_shape(history, layer, shape),
            Some(Owner::Group(group)) => {
                let Some(previous) = self.shape(group).map(|g| Seq::from(g.kind.children())) else {
                    return false;
                };
                let next = seq::without(&previous, &shape);
                self.set_group_shapes(history, group, next)
            }
            None => false,
        }
    }

    // ─── Groups ──────────────────────────────────────────────────────────

    pub fn set_group_shapes(
        &mut self,
        history: &mut History<Edit>,
        group: ShapeId,
        next: Seq<ShapeId>,
    ) -> bool {
        let Some(ShapeKind::Group { shapes, .. }) = self.shape(group).map(|s| &s.kind) else {
            return false;
        };
        let previous = shapes.clone();
        history.execute(self, Edit::GroupShapes(Snapshot::new(group, previous, next)));
        true
    }

    // ─── Databases ───────────────────────────────────────────────────────

    pub fn add_database(&mut self, history: &mut History<Edit>, database: DatabaseId) -> bool {
        if self.database(database).is_none() {
            return false;
        }
        let next = seq::with(&self.databases, database);
        let edit = Edit::ProjectDatabases(Snapshot::new((), self.databases.clone(), next));
        history.execute(self, edit);
        true
    }

    /// Remove a database from the project. Shapes that reference its
    /// records keep their references.
    pub fn remove_database(&mut self, history: &mut History<Edit>, database: DatabaseId) -> bool {
        if !self.databases.contains(&database) {
            return false;
        }
        history.begin_batch("remove database");
        let next = seq::without(&self.databases, &database);
        let edit = Edit::ProjectDatabases(Snapshot::new((), self.databases.clone(), next));
        history.execute(self, edit);
        if self.current_database == Some(database) {
            let next = self.databases.first().copied();
            self.set_current_database(history, next);
        }
        history.end_batch();
        true
    }

    pub fn set_current_database(
        &mut self,
        history: &mut History<Edit>,
        database: Option<DatabaseId>,
    ) -> bool {
        if database.is_some_and(|id| self.database(id).is_none()) {
            return false;
        }
        let edit = Edit::CurrentDatabase(Snapshot::new((), self.current_database, database));
        history.execute(self, edit);
        true
    }

    pub fn add_record(
        &mut self,
        history: &mut History<Edit>,
        database: DatabaseId,
        record: Arc<Record>,
    ) -> bool {
        let Some(previous) = self.database(database).map(|d| d.records.clone()) else {
            return false;
        };
        let next = seq::with(&previous, record);
        history.execute(self, Edit::DatabaseRecords(Snapshot::new(database, previous, next)));
        true
    }

    pub fn remove_record(
        &mut self,
        history: &mut History<Edit>,
        database: DatabaseId,
        record: &Arc<Record>,
    ) -> bool {
        let Some(previous) = self.database(database).map(|d| d.records.clone()) else {
            return false;
        };
        if !previous.iter().any(|r| Arc::ptr_eq(r, record)) {
            return false;
        }
        let next: Seq<Arc<Record>> = previous
            .iter()
            .filter(|r| !Arc::ptr_eq(*r, record))
            .cloned()
            .collect();
        history.execute(self, Edit::DatabaseRecords(Snapshot::new(database, previous, next)));
        true
    }

    // ─── Shape fields ────────────────────────────────────────────────────

    pub fn set_shape_style(
        &mut self,
        history: &mut History<Edit>,
        shape: ShapeId,
        style: Option<StyleId>,
    ) -> bool {
        let Some(previous) = self.shape(shape).map(|s| s.style) else {
            return false;
        };
        history.execute(self, Edit::ShapeStyle(Snapshot::new(shape, previous, style)));
        true
    }

    pub fn set_shape_record(
        &mut self,
        history: &mut History<Edit>,
        shape: ShapeId,
        record: Option<Arc<Record>>,
    ) -> bool {
        let Some(previous) = self.shape(shape).map(|s| s.record.clone()) else {
            return false;
        };
        history.execute(self, Edit::ShapeRecord(Snapshot::new(shape, previous, record)));
        true
    }

    /// Move a point shape. Every shape referencing the point follows.
    pub fn move_point(&mut self, history: &mut History<Edit>, point: ShapeId, x: f64, y: f64) -> bool {
        let Some(previous) = self.shapes().position(point) else {
            return false;
        };
        history.execute(self, Edit::PointPosition(Snapshot::new(point, previous, (x, y))));
        true
    }

    // ─── Styles and libraries ────────────────────────────────────────────

    /// Overwrite a shared style object.
    pub fn update_style(&mut self, history: &mut History<Edit>, style: StyleId, next: ShapeStyle) -> bool {
        let Some(previous) = self.style(style).cloned() else {
            return false;
        };
        history.execute(self, Edit::Style(Snapshot::new(style, previous, next)));
        true
    }

    pub fn add_style_library(&mut self, history: &mut History<Edit>, library: LibraryId) -> bool {
        if self.style_library(library).is_none() {
            return false;
        }
        let next = seq::with(&self.style_libraries, library);
        let edit = Edit::StyleLibraries(Snapshot::new((), self.style_libraries.clone(), next));
        history.execute(self, edit);
        true
    }

    pub fn add_style(&mut self, history: &mut History<Edit>, library: LibraryId, style: StyleId) -> bool {
        if self.style(style).is_none() {
            return false;
        }
        let Some(previous) = self.style_library(library).map(|l| l.items.clone()) else {
            return false;
        };
        let next = seq::with(&previous, style);
        history.execute(self, Edit::LibraryStyles(Snapshot::new(library, previous, next)));
        true
    }

    pub fn remove_style(&mut self, history: &mut History<Edit>, library: LibraryId, style: StyleId) -> bool {
        let Some(previous) = self.style_library(library).map(|l| l.items.clone()) else {
            return false;
        };
        if !previous.contains(&style) {
            return false;
        }
        let next = seq::without(&previous, &style);
        history.execute(self, Edit::LibraryStyles(Snapshot::new(library, previous, next)));
        true
    }

    pub fn add_group_library(&mut self, history: &mut History<Edit>, library: LibraryId) -> bool {
        if self.group_library(library).is_none() {
            return false;
        }
        let next = seq::with(&self.group_libraries, library);
        let edit = Edit::GroupLibraries(Snapshot::new((), self.group_libraries.clone(), next));
        history.execute(self, edit);
        true
    }

    pub fn add_group(&mut self, history: &mut History<Edit>, library: LibraryId, group: ShapeId) -> bool {
        if !matches!(self.shape(group).map(|s| &s.kind), Some(ShapeKind::Group { .. })) {
            return false;
        }
        let Some(previous) = self.group_library(library).map(|l| l.items.clone()) else {
            return false;
        };
        let next = seq::with(&previous, group);
        history.execute(self, Edit::LibraryGroups(Snapshot::new(library, previous, next)));
        true
    }
}

fn next_first(project: &Project, container: ContainerId) -> Option<LayerId> {
    project
        .container(container)
        .and_then(|c| c.layers.first().copied())
}
