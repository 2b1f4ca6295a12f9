//! Editor configuration.

use serde::Deserialize;

/// Tunables for one editor session. Every field has a default, so a JSON
/// document only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Pick radius in screen pixels. Divided by the zoom factor before
    /// querying world coordinates. Default: **7.0**.
    pub hit_threshold: f64,

    /// Axis tolerance for dropping a group's connectors onto a line.
    /// Default: **10.0**.
    pub connect_threshold: f64,

    /// Transactions kept by the undo history. Default: **256**.
    pub max_undo_depth: usize,

    /// Name of the database created for pasted records whose owner is
    /// unknown. Default: **"Imported"**.
    pub imported_database_name: String,

    /// Name of the style library created for pasted styles. Default:
    /// **"Imported"**.
    pub imported_style_library_name: String,

    /// Curve flattening tolerance. Default: **0.1**.
    pub path_tolerance: f64,

    /// Offset applied to pasted and duplicated shapes. Default: **0.0**.
    pub paste_offset: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            hit_threshold: 7.0,
            connect_threshold: 10.0,
            max_undo_depth: 256,
            imported_database_name: "Imported".into(),
            imported_style_library_name: "Imported".into(),
            path_tolerance: 0.1,
            paste_offset: 0.0,
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
