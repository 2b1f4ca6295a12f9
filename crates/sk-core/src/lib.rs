pub mod convert;
pub mod copy;
pub mod edit;
pub mod error;
pub mod geometry;
pub mod history;
pub mod id;
pub mod model;
pub mod ops;
pub mod project;
pub mod seq;
pub mod serialize;

pub use convert::{Converted, KurboPathConverter, PathConverter};
pub use copy::{CopyMap, Copied, copy_shapes};
pub use edit::Edit;
pub use error::CoreError;
pub use history::{History, Reversible, Side, Snapshot};
pub use id::*;
pub use model::*;
pub use project::*;
pub use seq::Seq;

// Re-export kurbo geometry types so downstream crates share one version
pub use kurbo::{Point, Rect};
