//! Structurally immutable sequences.
//!
//! Every owned collection in the model is a `Seq<T>`. A sequence is never
//! edited in place: each helper below returns a fresh sequence and leaves
//! its input untouched, so a history snapshot holding the old `Arc` can
//! never observe a later edit.

use std::sync::Arc;

pub type Seq<T> = Arc<[T]>;

/// An empty sequence.
pub fn empty<T>() -> Seq<T> {
    Arc::from(Vec::new())
}

/// `seq` with `item` appended.
pub fn with<T: Clone>(seq: &[T], item: T) -> Seq<T> {
    let mut v = Vec::with_capacity(seq.len() + 1);
    v.extend_from_slice(seq);
    v.push(item);
    v.into()
}

/// `seq` with every item of `items` appended.
pub fn with_all<T: Clone>(seq: &[T], items: &[T]) -> Seq<T> {
    let mut v = Vec::with_capacity(seq.len() + items.len());
    v.extend_from_slice(seq);
    v.extend_from_slice(items);
    v.into()
}

/// `seq` with `item` inserted at `index` (clamped to the end).
pub fn insert_at<T: Clone>(seq: &[T], index: usize, item: T) -> Seq<T> {
    let mut v = seq.to_vec();
    v.insert(index.min(v.len()), item);
    v.into()
}

/// `seq` without any occurrence of `item`.
pub fn without<T: Clone + PartialEq>(seq: &[T], item: &T) -> Seq<T> {
    seq.iter().filter(|x| *x != item).cloned().collect()
}

/// `seq` without any item contained in `items`.
pub fn without_all<T: Clone + PartialEq>(seq: &[T], items: &[T]) -> Seq<T> {
    seq.iter().filter(|x| !items.contains(x)).cloned().collect()
}

/// `seq` with the first occurrence of `old` replaced by `new`.
/// Returns `None` when `old` is absent.
pub fn replace<T: Clone + PartialEq>(seq: &[T], old: &T, new: T) -> Option<Seq<T>> {
    let pos = seq.iter().position(|x| x == old)?;
    let mut v = seq.to_vec();
    v[pos] = new;
    Some(v.into())
}

/// `seq` with the first occurrence of `old` replaced by all of `news`.
pub fn splice<T: Clone + PartialEq>(seq: &[T], old: &T, news: &[T]) -> Option<Seq<T>> {
    let pos = seq.iter().position(|x| x == old)?;
    let mut v = seq.to_vec();
    v.splice(pos..=pos, news.iter().cloned());
    Some(v.into())
}

/// `seq` with the items at positions `a` and `b` exchanged.
pub fn swap<T: Clone>(seq: &[T], a: usize, b: usize) -> Option<Seq<T>> {
    if a >= seq.len() || b >= seq.len() {
        return None;
    }
    let mut v = seq.to_vec();
    v.swap(a, b);
    Some(v.into())
}
