//! Block document engine.
//!
//! One text buffer holds an ordered run of language-tagged blocks separated
//! by `∞∞∞` delimiter lines. The engine derives the block list from the text
//! and keeps its structural rules intact through every edit.
//!
//! - [`blocks`]: delimiter grammar, segmenters, block store
//! - [`editing`]: document, commands, transactions, history, folds
//! - [`detection`]: registry for asynchronous language detection
//! - [`note_file`]: metadata line framing of buffer files

pub mod blocks;
pub mod clock;
pub mod detection;
pub mod editing;
pub mod error;
pub mod note_file;

pub use blocks::{delimiter, segment, store};
pub use editing::{commands, filters, folds, history, timestamps};

// Re-export key types for easier usage
pub use blocks::{Block, BlockList, BlockStore, Delimiter, Segmenter, Strategy};
pub use clock::{Clock, FixedClock, SystemClock};
pub use detection::{
    CompletedDetection, DetectionRegistry, DetectionRequest, DetectionResponse, DetectionStale,
    DocumentId, LanguageSuggestion,
};
pub use editing::{
    Change, ChangeSet, Cmd, Document, LoadState, Origin, Patch, PersistedState, Selection,
    Transaction,
};
pub use error::EngineError;
pub use note_file::{NoteFile, NoteMetadata};
