//! Structural copy of shape subgraphs.
//!
//! Shapes reference their points and children by id, and one point can be
//! shared by many shapes. A copy pass walks the subgraph and gives every
//! reached shape a fresh id exactly once; the [`CopyMap`] remembers the
//! mapping so a second reference to the same original resolves to the same
//! copy, keeping shared endpoints shared in the result.

use crate::error::CoreError;
use crate::id::ShapeId;
use crate::model::Shape;
use crate::project::ShapeStore;
use std::collections::HashMap;

/// Original → copy ids for one copy pass.
#[derive(Debug, Clone, Default)]
pub struct CopyMap {
    shapes: HashMap<ShapeId, ShapeId>,
}

impl CopyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, original: ShapeId) -> Option<ShapeId> {
        self.shapes.get(&original).copied()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Result of a copy: the copied roots in input order, and every new shape
/// (roots, children and points) ready to be inserted into an arena.
#[derive(Debug, Clone, Default)]
pub struct Copied {
    pub roots: Vec<ShapeId>,
    pub shapes: Vec<Shape>,
}

/// Deep-copy `roots` and everything they reference out of `store`.
///
/// Styles and records are shared handles and stay as they are; callers
/// repair them against the destination project afterwards.
pub fn copy_shapes(store: &ShapeStore, roots: &[ShapeId], map: &mut CopyMap) -> Result<Copied, CoreError> {
    let mut copied = Copied::default();
    for root in roots {
        let id = copy_one(store, *root, map, &mut copied.shapes)?;
        copied.roots.push(id);
    }
    log::trace!("copied {} roots into {} shapes", copied.roots.len(), copied.shapes.len());
    Ok(copied)
}

fn copy_one(store: &ShapeStore, id: ShapeId, map: &mut CopyMap, out: &mut Vec<Shape>) -> Result<ShapeId, CoreError> {
    if let Some(copy) = map.get(id) {
        return Ok(copy);
    }
    let shape = store.get(id).ok_or(CoreError::MissingShape(id))?;
    let new_id = ShapeId::next();
    map.shapes.insert(id, new_id);

    for reference in shape.kind.refs() {
        copy_one(store, reference, map, out)?;
    }
    let kind = shape.kind.map_refs(|r| map.get(r).unwrap_or(r));
    out.push(Shape {
        id: new_id,
        kind,
        ..shape.clone()
    });
    Ok(new_id)
}
