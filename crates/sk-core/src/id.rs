use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Global string interner for record IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Process-wide counter shared by every arena key type, so keys minted in
/// one project never collide with keys minted in another.
static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

fn next_key() -> u64 {
    NEXT_KEY.fetch_add(1, Ordering::Relaxed)
}

/// Stable identity of a database record.
///
/// Survives copy, serialize and deserialize unchanged, which is what lets
/// pasted shapes find "their" record again in a different project.
/// Generated ids are random UUIDs, so they do not collide across
/// processes. Internally a 4-byte `Spur` index.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(Spur);

impl RecordId {
    /// Intern a string as a RecordId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        RecordId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a fresh, globally unique record id.
    pub fn generate() -> Self {
        Self::intern(&Uuid::new_v4().to_string())
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(RecordId::intern(&s))
    }
}

macro_rules! arena_key {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Mint a key that has never been handed out in this process.
            pub fn next() -> Self {
                Self(next_key())
            }

            pub fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "{}"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "{}"), self.0)
            }
        }
    };
}

/// Keys of objects that travel between projects through the clipboard.
/// Random UUIDs, so a foreign key never aliases a local one.
macro_rules! stable_key {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn next() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "{}"), self.0.simple())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "{}"), self.0.simple())
            }
        }
    };
}

arena_key!(
    /// Key of a shape (including standalone and figure-local points).
    ShapeId,
    "shape_"
);
arena_key!(
    /// Key of a layer.
    LayerId,
    "layer_"
);
arena_key!(
    /// Key of a page or template container.
    ContainerId,
    "container_"
);
arena_key!(DocumentId, "document_");
stable_key!(
    /// Key of a database. Pasted records name their database by it.
    DatabaseId,
    "database_"
);
stable_key!(
    /// Key of a shared style object.
    StyleId,
    "style_"
);
arena_key!(LibraryId, "library_");
