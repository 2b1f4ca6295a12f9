//! Clipboard collaborator and the structural payload it carries.
//!
//! Copying captures every shape reachable from the selection (children
//! and points included) under its original ids, together with the styles
//! those shapes use and the schemas of the databases their records come
//! from. Pasting never reuses those ids: the payload is re-copied into
//! fresh ids first.

use serde::{Deserialize, Serialize};
use sk_core::convert::Converted;
use sk_core::copy::{Copied, CopyMap, copy_shapes};
use sk_core::id::{DatabaseId, ShapeId, StyleId};
use sk_core::model::{Shape, ShapeStyle};
use sk_core::project::{Database, Project, Record, ShapeStore};
use sk_core::{CoreError, seq, serialize};
use std::collections::HashSet;

pub trait Clipboard {
    fn set_text(&mut self, text: String);

    fn get_text(&self) -> Option<String>;

    /// Cheap availability check; must not block.
    fn contains_text(&self) -> bool {
        self.get_text().is_some_and(|text| !text.is_empty())
    }
}

/// Process-local clipboard.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, text: String) {
        self.text = Some(text);
    }

    fn get_text(&self) -> Option<String> {
        self.text.clone()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClipboardPayload {
    pub roots: Vec<ShapeId>,
    pub shapes: Vec<Shape>,
    pub styles: Vec<(StyleId, ShapeStyle)>,
    /// Schemas (no records) of the databases owning the shapes' records.
    pub databases: Vec<Database>,
}

impl ClipboardPayload {
    /// Capture `roots` and everything they reference.
    pub fn capture(project: &Project, roots: &[ShapeId]) -> Result<Self, CoreError> {
        let store = project.shapes();
        let mut payload = Self {
            roots: roots.to_vec(),
            ..Self::default()
        };
        let mut seen: HashSet<ShapeId> = HashSet::new();
        let mut seen_styles: HashSet<StyleId> = HashSet::new();
        let mut seen_databases: HashSet<DatabaseId> = HashSet::new();
        let mut stack: Vec<ShapeId> = roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let shape = store.get(id).ok_or(CoreError::MissingShape(id))?;
            if let Some(style) = shape.style
                && seen_styles.insert(style)
                && let Some(value) = project.style(style)
            {
                payload.styles.push((style, value.clone()));
            }
            // Restored records keep their origin owner; the database now
            // holding them was built from that owner's schema.
            if let Some(record) = &shape.record
                && seen_databases.insert(record.owner)
                && let Some(database) = project
                    .database(record.owner)
                    .or_else(|| holder(project, record))
            {
                payload.databases.push(Database {
                    id: record.owner,
                    records: seq::empty(),
                    ..database.clone()
                });
            }
            stack.extend(shape.kind.refs().into_iter().rev());
            payload.shapes.push(shape.clone());
        }
        Ok(payload)
    }

    /// Wrap a freshly converted path (e.g. from SVG text) as a payload.
    pub fn from_converted(converted: Converted) -> Self {
        let root = converted.shape.id;
        let mut shapes = converted.points;
        shapes.push(converted.shape);
        Self {
            roots: vec![root],
            shapes,
            ..Self::default()
        }
    }

    pub fn to_text(&self) -> Result<String, CoreError> {
        serialize::to_text(self)
    }

    pub fn from_text(text: &str) -> Result<Self, CoreError> {
        serialize::from_text(text)
    }

    /// Copy of the payload that shares nothing with it, records included.
    pub fn deep_clone(&self) -> Result<Self, CoreError> {
        serialize::deep_clone(self)
    }

    /// Re-copy the payload's shapes under fresh ids, keeping shared points
    /// shared.
    pub fn stage(&self) -> Result<Copied, CoreError> {
        let store: ShapeStore = self.shapes.iter().cloned().collect();
        copy_shapes(&store, &self.roots, &mut CopyMap::new())
    }
}

/// Project database currently holding `record`.
fn holder<'a>(project: &'a Project, record: &Record) -> Option<&'a Database> {
    project
        .databases
        .iter()
        .filter_map(|id| project.database(*id))
        .find(|db| db.find_record(record).is_some())
}
