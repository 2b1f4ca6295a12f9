use sk_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("clipboard holds no text")]
    ClipboardEmpty,
    #[error("clipboard text is neither shapes nor svg path data")]
    UnsupportedPaste,
    #[error("no current layer")]
    NoCurrentLayer,
}
