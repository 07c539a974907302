/*!
 * # Editing Core Module
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: xi-rope Buffer
 * - The entire document is stored in a single **`xi_rope::Rope`** buffer
 * - Blocks are never stored: the block list is derived from the text after
 *   every content change
 * - **Lossless round-trip**: saving writes rope bytes verbatim
 *
 * ### 2. Command-Based Editing
 * - Every edit is a **Command** (`Cmd` enum) compiled to a **Transaction**:
 *   ordered change sets, an optional selection and an **Origin**
 * - Transactions run through one ordered filter pipeline
 *   (`filters::PIPELINE`), whatever produced them: commands, undo/redo,
 *   content loads, language detection
 * - The origin decides which structural rules apply (first-delimiter
 *   protection, selection clamp, timestamp refresh, fold guard)
 *
 * ### 3. History
 * - Each committed content change keeps its steps and their inverses
 * - Undo/redo replay them through the same pipeline
 *
 * ## Module Structure
 *
 * - **`changes`**: `Change`, `ChangeSet`, `Selection`, `Origin`, `Transaction`
 * - **`commands`**: `Cmd` enum and transaction compilation
 * - **`document`**: Core `Document` type and the dispatch loop
 * - **`filters`**: The pipeline and the delimiter/selection enforcers
 * - **`folds`**: Fold ranges and the fold-safety guard
 * - **`history`**: Undo/redo stacks
 * - **`lines`**: Line arithmetic helpers
 * - **`patch`**: Dispatch result
 * - **`timestamps`**: `created` refresher
 */

pub mod changes;
pub mod commands;
pub mod document;
pub mod filters;
pub mod folds;
pub mod history;
pub mod lines;
pub mod patch;
pub mod timestamps;

pub use changes::{Assoc, Change, ChangeSet, Origin, Selection, Transaction};
pub use commands::Cmd;
pub use document::{Document, LoadState, PersistedState, Settings};
pub use patch::Patch;
