use blockpad_syntax::LanguageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The stored text of a block's delimiter no longer parses as the
    /// delimiter the block list says is there.
    #[error("block {block} delimiter does not match the buffer: found {found:?}")]
    StructuralDesync { block: usize, found: String },

    #[error("unknown language token {0:?}")]
    UnknownLanguage(String),

    #[error("document is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error(transparent)]
    Language(#[from] LanguageError),

    #[error("failed to build delimiter pattern: {0}")]
    Pattern(#[from] regex::Error),
}
