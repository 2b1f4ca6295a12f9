pub mod clipboard;
pub mod config;
pub mod connect;
pub mod decompose;
pub mod editor;
pub mod error;
pub mod records;
pub mod selection;

pub use clipboard::{Clipboard, ClipboardPayload, MemoryClipboard};
pub use config::EditorConfig;
pub use decompose::{Breakdown, break_shape};
pub use editor::Editor;
pub use error::EditorError;
pub use selection::{Decoration, Selection};
