//! Project tree: project → documents → pages → layers → shapes.
//!
//! Every object lives in an arena owned by the `Project` and is referenced
//! by id. Parents own their children through immutable `Seq` collections;
//! there are no back-pointers, owners are found with [`Project::owner_of`].

use crate::edit::Edit;
use crate::history::History;
use crate::id::{ContainerId, DatabaseId, DocumentId, LayerId, LibraryId, RecordId, ShapeId, StyleId};
use crate::model::{Color, Shape, ShapeKind, ShapeStyle};
use crate::seq::{self, Seq};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// ─── Databases ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub is_visible: bool,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_visible: true,
        }
    }
}

/// A row of values. Shapes hold records through `Arc`, so instance identity
/// is `Arc::ptr_eq`; the stable identity is `id` together with `owner`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    /// Database the record was created in. Used to recover its schema.
    pub owner: DatabaseId,
    pub values: Vec<String>,
}

impl Record {
    pub fn new(owner: DatabaseId, values: Vec<String>) -> Self {
        Self {
            id: RecordId::generate(),
            owner,
            values,
        }
    }

    /// Same row, possibly a different instance or a different project.
    pub fn is_same(&self, other: &Record) -> bool {
        self.id == other.id && self.owner == other.owner
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub id: DatabaseId,
    pub name: String,
    pub id_column_name: String,
    pub columns: Seq<Column>,
    pub records: Seq<Arc<Record>>,
}

impl Database {
    pub fn new(name: impl Into<String>, columns: Seq<Column>) -> Self {
        Self {
            id: DatabaseId::next(),
            name: name.into(),
            id_column_name: "Id".into(),
            columns,
            records: seq::empty(),
        }
    }

    pub fn find_record(&self, record: &Record) -> Option<&Arc<Record>> {
        self.records.iter().find(|r| r.is_same(record))
    }
}

// ─── Libraries ───────────────────────────────────────────────────────────

/// An ordered, named collection of items kept outside the document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library<T> {
    pub id: LibraryId,
    pub name: String,
    pub items: Seq<T>,
    pub selected: Option<T>,
}

impl<T: Clone> Library<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LibraryId::next(),
            name: name.into(),
            items: seq::empty(),
            selected: None,
        }
    }
}

// ─── Images ──────────────────────────────────────────────────────────────

/// Image bytes keyed by name. Cloning is cheap; renderers receive clones.
#[derive(Debug, Clone, Default)]
pub struct ImageStore {
    images: HashMap<String, Arc<[u8]>>,
}

impl ImageStore {
    pub fn add(&mut self, key: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.images.insert(key.into(), bytes.into());
    }

    pub fn get(&self, key: &str) -> Option<&Arc<[u8]>> {
        self.images.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Drop every image whose key is not in `used`. Returns the number removed.
    pub fn purge_unused(&mut self, used: &HashSet<String>) -> usize {
        let before = self.images.len();
        self.images.retain(|key, _| used.contains(key));
        before - self.images.len()
    }
}

// ─── Tree nodes ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub is_visible: bool,
    pub shapes: Seq<ShapeId>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LayerId::next(),
            name: name.into(),
            is_visible: true,
            shapes: seq::empty(),
        }
    }
}

/// A page or a template: a sized surface holding layers.
#[derive(Debug, Clone)]
pub struct Container {
    pub id: ContainerId,
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub background: Color,
    pub layers: Seq<LayerId>,
    pub template: Option<ContainerId>,
}

impl Container {
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: ContainerId::next(),
            name: name.into(),
            width,
            height,
            background: Color::TRANSPARENT,
            layers: seq::empty(),
            template: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub pages: Seq<ContainerId>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DocumentId::next(),
            name: name.into(),
            pages: seq::empty(),
        }
    }
}

// ─── Arena ───────────────────────────────────────────────────────────────

/// All shapes of a project (or of a clipboard payload), keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ShapeStore {
    shapes: HashMap<ShapeId, Shape>,
}

impl ShapeStore {
    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    /// Insert (or overwrite) a shape under its own id.
    pub fn insert(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id;
        self.shapes.insert(id, shape);
        id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.values()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Position of a point shape.
    pub fn position(&self, id: ShapeId) -> Option<(f64, f64)> {
        self.get(id)?.position()
    }

    /// Every point reachable from `roots`: the roots' own points and,
    /// through groups, their children's. Each point appears once.
    pub fn collect_points(&self, roots: &[ShapeId]) -> Vec<ShapeId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut stack: Vec<ShapeId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(shape) = self.get(id) else { continue };
            if shape.kind.is_point() {
                if seen.insert(id) {
                    out.push(id);
                }
                continue;
            }
            for p in shape.kind.points() {
                if seen.insert(p) {
                    out.push(p);
                }
            }
            stack.extend(shape.kind.children().iter().rev().copied());
        }
        out
    }

    fn retain(&mut self, keep: &HashSet<ShapeId>) {
        self.shapes.retain(|id, _| keep.contains(id));
    }
}

impl FromIterator<Shape> for ShapeStore {
    fn from_iter<I: IntoIterator<Item = Shape>>(iter: I) -> Self {
        Self {
            shapes: iter.into_iter().map(|s| (s.id, s)).collect(),
        }
    }
}

/// Id-keyed storage for every non-shape object.
#[derive(Debug, Clone, Default)]
pub struct Arena {
    pub shapes: ShapeStore,
    pub styles: HashMap<StyleId, ShapeStyle>,
    pub layers: HashMap<LayerId, Layer>,
    pub containers: HashMap<ContainerId, Container>,
    pub documents: HashMap<DocumentId, Document>,
    pub databases: HashMap<DatabaseId, Database>,
    pub style_libraries: HashMap<LibraryId, Library<StyleId>>,
    pub group_libraries: HashMap<LibraryId, Library<ShapeId>>,
}

/// Who holds a shape in one of its collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Layer(LayerId),
    Group(ShapeId),
}

// ─── Project ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Project {
    pub name: String,
    pub documents: Seq<DocumentId>,
    pub templates: Seq<ContainerId>,
    pub databases: Seq<DatabaseId>,
    pub current_database: Option<DatabaseId>,
    pub style_libraries: Seq<LibraryId>,
    pub group_libraries: Seq<LibraryId>,

    pub current_document: Option<DocumentId>,
    pub current_container: Option<ContainerId>,
    pub current_layer: Option<LayerId>,
    pub current_style_library: Option<LibraryId>,

    pub images: ImageStore,
    pub arena: Arena,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: seq::empty(),
            templates: seq::empty(),
            databases: seq::empty(),
            style_libraries: seq::empty(),
            group_libraries: seq::empty(),
            ..Default::default()
        }
    }

    /// A project with one document, one page, one layer and one style
    /// library, all of them current.
    pub fn with_page(name: impl Into<String>, width: f64, height: f64) -> Self {
        let mut project = Self::new(name);

        let layer = Layer::new("Layer1");
        let layer_id = layer.id;
        project.arena.layers.insert(layer_id, layer);

        let mut page = Container::new("Page1", width, height);
        page.layers = Seq::from(vec![layer_id]);
        let page_id = page.id;
        project.arena.containers.insert(page_id, page);

        let mut document = Document::new("Document1");
        document.pages = Seq::from(vec![page_id]);
        let document_id = document.id;
        project.arena.documents.insert(document_id, document);
        project.documents = Seq::from(vec![document_id]);

        let library = Library::new("Default");
        let library_id = library.id;
        project.arena.style_libraries.insert(library_id, library);
        project.style_libraries = Seq::from(vec![library_id]);

        project.current_document = Some(document_id);
        project.current_container = Some(page_id);
        project.current_layer = Some(layer_id);
        project.current_style_library = Some(library_id);
        project
    }

    // ─── Lookup ──────────────────────────────────────────────────────────

    pub fn shapes(&self) -> &ShapeStore {
        &self.arena.shapes
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.arena.shapes.get(id)
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.arena.layers.get(&id)
    }

    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.arena.containers.get(&id)
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.arena.documents.get(&id)
    }

    pub fn database(&self, id: DatabaseId) -> Option<&Database> {
        self.arena.databases.get(&id)
    }

    pub fn style(&self, id: StyleId) -> Option<&ShapeStyle> {
        self.arena.styles.get(&id)
    }

    pub fn style_library(&self, id: LibraryId) -> Option<&Library<StyleId>> {
        self.arena.style_libraries.get(&id)
    }

    pub fn group_library(&self, id: LibraryId) -> Option<&Library<ShapeId>> {
        self.arena.group_libraries.get(&id)
    }

    /// Shapes of the current layer in z-order (bottom first).
    pub fn current_shapes(&self) -> Seq<ShapeId> {
        self.current_layer
            .and_then(|id| self.layer(id))
            .map(|l| l.shapes.clone())
            .unwrap_or_else(seq::empty)
    }

    /// Find the layer or group whose collection holds `shape`.
    pub fn owner_of(&self, shape: ShapeId) -> Option<Owner> {
        if let Some(layer) = self.arena.layers.values().find(|l| l.shapes.contains(&shape)) {
            return Some(Owner::Layer(layer.id));
        }
        self.arena
            .shapes
            .shapes
            .values()
            .find(|s| s.kind.children().contains(&shape))
            .map(|group| Owner::Group(group.id))
    }

    /// Every style id held by any style library of the project.
    pub fn library_styles(&self) -> impl Iterator<Item = StyleId> + '_ {
        self.style_libraries
            .iter()
            .filter_map(|id| self.style_library(*id))
            .flat_map(|lib| lib.items.iter().copied())
    }

    // ─── Untracked arena insertion (factories) ───────────────────────────

    /// Register a new shape in the arena. Not undoable: the shape only
    /// becomes part of the document once a tracked edit references it.
    pub fn insert_shape(&mut self, shape: Shape) -> ShapeId {
        self.arena.shapes.insert(shape)
    }

    pub fn new_point(&mut self, x: f64, y: f64) -> ShapeId {
        self.insert_shape(Shape::point(x, y))
    }

    /// A line between two fresh points.
    pub fn new_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> ShapeId {
        let start = self.new_point(x1, y1);
        let end = self.new_point(x2, y2);
        self.insert_shape(Shape::line(start, end))
    }

    pub fn new_rectangle(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> ShapeId {
        let top_left = self.new_point(x1, y1);
        let bottom_right = self.new_point(x2, y2);
        self.insert_shape(Shape::new(ShapeKind::Rectangle {
            top_left,
            bottom_right,
        }))
    }

    pub fn new_ellipse(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> ShapeId {
        let top_left = self.new_point(x1, y1);
        let bottom_right = self.new_point(x2, y2);
        self.insert_shape(Shape::new(ShapeKind::Ellipse {
            top_left,
            bottom_right,
        }))
    }

    pub fn new_style(&mut self, style: ShapeStyle) -> StyleId {
        let id = StyleId::next();
        self.arena.styles.insert(id, style);
        id
    }

    pub fn new_layer(&mut self, name: &str) -> LayerId {
        let layer = Layer::new(name);
        let id = layer.id;
        self.arena.layers.insert(id, layer);
        id
    }

    pub fn new_container(&mut self, name: &str, width: f64, height: f64) -> ContainerId {
        let container = Container::new(name, width, height);
        let id = container.id;
        self.arena.containers.insert(id, container);
        id
    }

    pub fn new_document(&mut self, name: &str) -> DocumentId {
        let document = Document::new(name);
        let id = document.id;
        self.arena.documents.insert(id, document);
        id
    }

    pub fn new_database(&mut self, database: Database) -> DatabaseId {
        let id = database.id;
        self.arena.databases.insert(id, database);
        id
    }

    pub fn new_style_library(&mut self, name: &str) -> LibraryId {
        let library = Library::new(name);
        let id = library.id;
        self.arena.style_libraries.insert(id, library);
        id
    }

    pub fn new_group_library(&mut self, name: &str) -> LibraryId {
        let library = Library::new(name);
        let id = library.id;
        self.arena.group_libraries.insert(id, library);
        id
    }

    // ─── Garbage collection ──────────────────────────────────────────────

    /// Drop shapes and styles that neither the live tree nor any recorded
    /// history edit can reach. Returns the number of shapes removed.
    pub fn compact(&mut self, history: &History<Edit>) -> usize {
        let mut roots: Vec<ShapeId> = Vec::new();
        roots.extend(self.arena.layers.values().flat_map(|l| l.shapes.iter().copied()));
        roots.extend(
            self.arena
                .group_libraries
                .values()
                .flat_map(|l| l.items.iter().copied()),
        );
        let mut styles: HashSet<StyleId> = self.library_styles().collect();
        for edit in history.edits() {
            edit.collect_roots(&mut roots, &mut styles);
        }

        let mut keep = HashSet::new();
        let mut stack = roots;
        while let Some(id) = stack.pop() {
            if !keep.insert(id) {
                continue;
            }
            if let Some(shape) = self.arena.shapes.get(id) {
                if let Some(style) = shape.style {
                    styles.insert(style);
                }
                stack.extend(shape.kind.refs());
            }
        }

        let before = self.arena.shapes.len();
        self.arena.shapes.retain(&keep);
        self.arena.styles.retain(|id, _| styles.contains(id));
        let removed = before - self.arena.shapes.len();
        log::debug!("compact: dropped {removed} unreachable shapes");
        removed
    }
}
