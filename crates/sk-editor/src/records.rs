//! Style and record repair for shapes arriving from another project.
//!
//! Pasted shapes carry style ids and record handles that mean nothing in
//! the destination. Both passes run on staged shapes before they enter the
//! arena; every project change they need (a new library, a new database, a
//! restored record) goes through the history so it undoes with the paste.

use sk_core::Edit;
use sk_core::history::History;
use sk_core::id::{DatabaseId, LibraryId, StyleId};
use sk_core::model::{Shape, ShapeStyle};
use sk_core::project::{Column, Database, Project, Record};
use sk_core::seq::Seq;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// ─── Styles ──────────────────────────────────────────────────────────────

/// Point every staged shape at a style of `project`.
///
/// A style id already held by one of the project's style libraries, or
/// already used by one of its shapes, is kept. Otherwise a library style with the same name is used, and failing
/// that the style is imported into the library called `library_name`
/// (created on first use). Returns the number of shapes repointed.
pub fn restore_styles(
    project: &mut Project,
    history: &mut History<Edit>,
    shapes: &mut [Shape],
    styles: &[(StyleId, ShapeStyle)],
    library_name: &str,
) -> usize {
    let mut known: HashSet<StyleId> = project.library_styles().collect();
    known.extend(project.shapes().iter().filter_map(|s| s.style));
    let mut remap: HashMap<StyleId, Option<StyleId>> = HashMap::new();
    let mut imported: Option<LibraryId> = None;
    let mut repaired = 0;

    for shape in shapes.iter_mut() {
        let Some(id) = shape.style else { continue };
        if known.contains(&id) && project.style(id).is_some() {
            continue;
        }
        if let Some(target) = remap.get(&id) {
            shape.style = *target;
            repaired += 1;
            continue;
        }

        let value = styles
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, style)| style.clone())
            .or_else(|| project.style(id).cloned());
        let target = match value {
            Some(value) => Some(match library_style_named(project, &value.name) {
                Some(existing) => existing,
                None => {
                    let library = *imported.get_or_insert_with(|| style_library(project, history, library_name));
                    let new_id = project.new_style(value);
                    project.add_style(history, library, new_id);
                    log::debug!("imported style {id} as {new_id}");
                    new_id
                }
            }),
            None => {
                log::warn!("style {id} of shape {} is unknown, using default", shape.id);
                None
            }
        };
        remap.insert(id, target);
        shape.style = target;
        repaired += 1;
    }
    repaired
}

fn library_style_named(project: &Project, name: &str) -> Option<StyleId> {
    project
        .library_styles()
        .find(|id| project.style(*id).is_some_and(|s| s.name == name))
}

fn style_library(project: &mut Project, history: &mut History<Edit>, name: &str) -> LibraryId {
    let existing = project
        .style_libraries
        .iter()
        .copied()
        .find(|id| project.style_library(*id).is_some_and(|l| l.name == name));
    if let Some(id) = existing {
        return id;
    }
    let id = project.new_style_library(name);
    project.add_style_library(history, id);
    id
}

// ─── Records ─────────────────────────────────────────────────────────────

/// Point every staged shape's record at a record of `project`.
///
/// Records are matched by id and owner across all project databases (see
/// [`Record::is_same`]). A match replaces the staged handle with the
/// project's own `Arc`. A miss adds the record, owner unchanged, to the
/// current database; when there is none, a database called
/// `database_name` is first built from the record owner's schema (taken
/// from `schemas`, then from the project arena) and made current. Returns
/// the number of shapes repointed.
pub fn restore_records(
    project: &mut Project,
    history: &mut History<Edit>,
    shapes: &mut [Shape],
    schemas: &[Database],
    database_name: &str,
) -> usize {
    let mut repaired = 0;
    for shape in shapes.iter_mut() {
        let Some(record) = shape.record.clone() else { continue };

        if let Some(existing) = find_record(project, &record) {
            if !Arc::ptr_eq(&existing, &record) {
                shape.record = Some(existing);
                repaired += 1;
            }
            continue;
        }

        let current = project
            .current_database
            .filter(|id| project.databases.contains(id));
        let target = match current {
            Some(id) => id,
            None => imported_database(project, history, &record, schemas, database_name),
        };
        let restored = Arc::new((*record).clone());
        project.add_record(history, target, restored.clone());
        log::debug!("restored record {} into {target}", record.id);
        shape.record = Some(restored);
        repaired += 1;
    }
    repaired
}

fn find_record(project: &Project, record: &Record) -> Option<Arc<Record>> {
    project
        .databases
        .iter()
        .filter_map(|db| project.database(*db))
        .find_map(|db| db.find_record(record))
        .cloned()
}

fn imported_database(
    project: &mut Project,
    history: &mut History<Edit>,
    record: &Record,
    schemas: &[Database],
    name: &str,
) -> DatabaseId {
    let schema = schemas
        .iter()
        .find(|db| db.id == record.owner)
        .or_else(|| project.arena.databases.get(&record.owner));
    let database = match schema {
        Some(schema) => {
            let mut db = Database::new(name, schema.columns.clone());
            db.id_column_name = schema.id_column_name.clone();
            db
        }
        None => {
            let columns: Seq<Column> = (0..record.values.len())
                .map(|i| Column::new(format!("Column{i}")))
                .collect();
            Database::new(name, columns)
        }
    };
    let id = project.new_database(database);
    project.add_database(history, id);
    project.set_current_database(history, Some(id));
    log::debug!("created database '{name}' ({id}) for pasted records");
    id
}
