//! Undo/redo history.
//!
//! The history is a linear log of transactions with a cursor. Each
//! transaction groups one or more reversible edits; each edit records the
//! previous and next value of exactly one field or collection together with
//! the stable id of the object that owns it. Undo replays `previous` values
//! (newest edit first), redo replays `next` values (oldest first).
//!
//! Edits are resolved against the document by id at apply time, never
//! through a captured reference, so an edit stays valid even after the
//! object that held the collection has itself been replaced.

use std::fmt;

/// Which side of a transition to restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Previous,
    Next,
}

/// One reversible transition of a single field owned by `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<K, V> {
    pub target: K,
    pub previous: V,
    pub next: V,
}

impl<K, V> Snapshot<K, V> {
    pub fn new(target: K, previous: V, next: V) -> Self {
        Self {
            target,
            previous,
            next,
        }
    }

    pub fn value(&self, side: Side) -> &V {
        match side {
            Side::Previous => &self.previous,
            Side::Next => &self.next,
        }
    }
}

/// An edit that knows how to write either of its sides into a document.
pub trait Reversible {
    type Doc;

    fn apply(&self, doc: &mut Self::Doc, side: Side);
}

/// A group of edits undone and redone as one step.
#[derive(Debug, Clone)]
pub struct Transaction<E> {
    pub description: String,
    pub edits: Vec<E>,
}

/// Linear undo/redo log with a movable cursor.
pub struct History<E> {
    /// Transactions; `entries[..cursor]` are applied, the rest are redoable.
    entries: Vec<Transaction<E>>,
    cursor: usize,
    /// Maximum number of transactions kept.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Edits collected by the open batch.
    pending: Option<Transaction<E>>,
}

impl<E> fmt::Debug for History<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("entries", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("max_depth", &self.max_depth)
            .field("batch_depth", &self.batch_depth)
            .finish()
    }
}

impl<E: Reversible> History<E> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            max_depth: max_depth.max(1),
            batch_depth: 0,
            pending: None,
        }
    }

    /// Start a batch. Every edit recorded until the matching `end_batch()`
    /// is undone and redone as one step. Batches nest; only the outermost
    /// description is kept.
    pub fn begin_batch(&mut self, description: &str) {
        if self.batch_depth == 0 {
            self.pending = Some(Transaction {
                description: description.to_string(),
                edits: Vec::new(),
            });
        }
        self.batch_depth += 1;
    }

    /// Close a batch. When the outermost batch closes and it recorded at
    /// least one edit, the batch becomes a single history entry.
    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0
            && let Some(tx) = self.pending.take()
            && !tx.edits.is_empty()
        {
            self.push(tx);
        }
    }

    /// Abandon the open batch, restoring the previous side of every edit it
    /// already applied.
    pub fn cancel_batch(&mut self, doc: &mut E::Doc) {
        if let Some(tx) = self.pending.take() {
            for edit in tx.edits.iter().rev() {
                edit.apply(doc, Side::Previous);
            }
            log::debug!("cancelled batch '{}' ({} edits)", tx.description, tx.edits.len());
        }
        self.batch_depth = 0;
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Register a transition without applying it. The caller commits the
    /// next value itself.
    pub fn snapshot(&mut self, edit: E) {
        if let Some(tx) = self.pending.as_mut() {
            tx.edits.push(edit);
            return;
        }
        self.push(Transaction {
            description: String::new(),
            edits: vec![edit],
        });
    }

    /// Register a transition and apply its next value.
    pub fn execute(&mut self, doc: &mut E::Doc, edit: E) {
        edit.apply(doc, Side::Next);
        self.snapshot(edit);
    }

    /// Undo the transaction before the cursor. Returns its description.
    pub fn undo(&mut self, doc: &mut E::Doc) -> Option<String> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        let tx = &self.entries[self.cursor];
        for edit in tx.edits.iter().rev() {
            edit.apply(doc, Side::Previous);
        }
        Some(tx.description.clone())
    }

    /// Redo the transaction at the cursor. Returns its description.
    pub fn redo(&mut self, doc: &mut E::Doc) -> Option<String> {
        let tx = self.entries.get(self.cursor)?;
        for edit in &tx.edits {
            edit.apply(doc, Side::Next);
        }
        let description = tx.description.clone();
        self.cursor += 1;
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn undo_len(&self) -> usize {
        self.cursor
    }

    pub fn redo_len(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// Forget every transaction.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Every recorded edit, including redoable ones and the open batch.
    pub fn edits(&self) -> impl Iterator<Item = &E> {
        self.entries
            .iter()
            .chain(self.pending.iter())
            .flat_map(|tx| tx.edits.iter())
    }

    fn push(&mut self, tx: Transaction<E>) {
        // A new edit discards the redo branch.
        self.entries.truncate(self.cursor);
        self.entries.push(tx);
        if self.entries.len() > self.max_depth {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len();
    }
}

impl<E: Reversible> Default for History<E> {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    /// A document with two immutable lists, enough to exercise the log.
    #[derive(Debug, Default, PartialEq)]
    struct Doc {
        a: Arc<[u32]>,
        b: Arc<[u32]>,
    }

    #[derive(Debug, Clone, Copy)]
    enum Field {
        A,
        B,
    }

    #[derive(Debug)]
    struct ListEdit(Snapshot<Field, Arc<[u32]>>);

    impl Reversible for ListEdit {
        type Doc = Doc;

        fn apply(&self, doc: &mut Doc, side: Side) {
            let value = self.0.value(side).clone();
            match self.0.target {
                Field::A => doc.a = value,
                Field::B => doc.b = value,
            }
        }
    }

    fn push_to(doc: &Doc, field: Field, item: u32) -> ListEdit {
        let prev = match field {
            Field::A => doc.a.clone(),
            Field::B => doc.b.clone(),
        };
        let next: Arc<[u32]> = prev.iter().copied().chain([item]).collect();
        ListEdit(Snapshot::new(field, prev, next))
    }

    #[test]
    fn undo_then_redo_restores_every_step() {
        let mut doc = Doc::default();
        let mut history = History::new(100);
        let mut states = vec![(doc.a.to_vec(), doc.b.to_vec())];

        for i in 0..6 {
            let field = if i % 2 == 0 { Field::A } else { Field::B };
            let edit = push_to(&doc, field, i);
            history.execute(&mut doc, edit);
            states.push((doc.a.to_vec(), doc.b.to_vec()));
        }

        for step in (0..6).rev() {
            history.undo(&mut doc).unwrap();
            assert_eq!((doc.a.to_vec(), doc.b.to_vec()), states[step]);
        }
        assert!(!history.can_undo());

        for step in 1..=6 {
            history.redo(&mut doc).unwrap();
            assert_eq!((doc.a.to_vec(), doc.b.to_vec()), states[step]);
        }
        assert!(!history.can_redo());
    }

    #[test]
    fn new_edit_discards_redo_branch() {
        let mut doc = Doc::default();
        let mut history = History::new(100);
        let e = push_to(&doc, Field::A, 1);
        history.execute(&mut doc, e);
        history.undo(&mut doc);
        assert!(history.can_redo());

        let e = push_to(&doc, Field::A, 2);
        history.execute(&mut doc, e);
        assert!(!history.can_redo());
        assert_eq!(&*doc.a, &[2]);
    }

    #[test]
    fn max_depth_trims_oldest() {
        let mut doc = Doc::default();
        let mut history = History::new(3);
        for i in 0..5 {
            let e = push_to(&doc, Field::A, i);
            history.execute(&mut doc, e);
        }
        let mut undo_count = 0;
        while history.undo(&mut doc).is_some() {
            undo_count += 1;
        }
        assert_eq!(undo_count, 3);
        assert_eq!(&*doc.a, &[0, 1]);
    }

    #[test]
    fn batch_undo_is_single_step() {
        let mut doc = Doc::default();
        let mut history = History::new(100);

        history.begin_batch("two lists");
        let e = push_to(&doc, Field::A, 1);
        history.execute(&mut doc, e);
        history.begin_batch("nested");
        let e = push_to(&doc, Field::B, 2);
        history.execute(&mut doc, e);
        history.end_batch();
        history.end_batch();

        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.undo(&mut doc).as_deref(), Some("two lists"));
        assert_eq!(doc, Doc::default());
    }

    #[test]
    fn empty_batch_no_undo_entry() {
        let mut history: History<ListEdit> = History::new(100);
        history.begin_batch("nothing");
        history.end_batch();
        assert!(!history.can_undo());
    }

    #[test]
    fn cancel_batch_rolls_back_applied_edits() {
        let mut doc = Doc::default();
        let mut history = History::new(100);
        history.begin_batch("partial");
        let e = push_to(&doc, Field::A, 7);
        history.execute(&mut doc, e);
        history.cancel_batch(&mut doc);

        assert_eq!(doc, Doc::default());
        assert!(!history.can_undo());
        assert!(!history.is_batching());
    }

    #[test]
    fn snapshot_does_not_apply() {
        let mut doc = Doc::default();
        let mut history = History::new(100);
        let e = push_to(&doc, Field::A, 3);
        history.snapshot(e);
        assert!(doc.a.is_empty());
        history.undo(&mut doc);
        assert!(doc.a.is_empty());
        history.redo(&mut doc);
        assert_eq!(&*doc.a, &[3]);
    }
}
