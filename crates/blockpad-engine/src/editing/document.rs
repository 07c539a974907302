use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use blockpad_config::{Config, DetectionConfig};
use blockpad_syntax::LanguageTable;
use log::{debug, warn};
use rowan::GreenNode;
use serde::{Deserialize, Serialize};
use xi_rope::Rope;

use crate::blocks::{Block, BlockList, BlockStore};
use crate::clock::{Clock, SystemClock};
use crate::detection::{DetectionRegistry, DetectionStale, DocumentId, LanguageSuggestion, levenshtein};
use crate::editing::changes::{Assoc, Change, ChangeSet, Origin, Selection, Transaction};
use crate::editing::filters::{self, Filter, PIPELINE};
use crate::editing::folds::Folds;
use crate::editing::history::{History, Revision};
use crate::editing::lines::floor_char_boundary;
use crate::editing::timestamps;
use crate::editing::{Cmd, Patch};
use crate::error::EngineError;

/// Editor settings a document needs from the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub default_language: String,
    pub default_auto: bool,
    pub sync_parse_limit: usize,
    pub detection: DetectionConfig,
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            default_language: config.editor.default_language.clone(),
            default_auto: config.editor.default_auto,
            sync_parse_limit: config.editor.sync_parse_limit,
            detection: config.detection.clone(),
        }
    }
}

/// Text, selection and folds as a host stores them between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedState {
    pub text: String,
    pub selection: Selection,
    #[serde(default)]
    pub folds: Vec<Range<usize>>,
}

/// What [`Document::load`] accepts; the same shape [`Document::persist_state`]
/// produces.
pub type LoadState = PersistedState;

/// A block document: one text buffer, the blocks derived from it, and the
/// editing state around it.
///
/// The buffer is only ever changed by [`Document::dispatch`], which runs each
/// [`Transaction`] through the filter [`PIPELINE`]:
///
/// 1. **ProtectDelimiters**: clip unflagged changes against the first
///    delimiter (every delimiter for a replace-all)
/// 2. **RefreshTimestamps**: stamp `created` on a block receiving its first
///    character
/// 3. **Apply**: apply the steps to the rope, reparse when the document is
///    small enough, recompute the block list
/// 4. **ClampSelection**: keep an unflagged selection out of the first
///    delimiter
/// 5. **GuardFolds**: unfold folds whose edge lines were edited
/// 6. **Commit**: record history and bump the version
///
/// ## Usage Pattern
///
/// ```rust
/// # use blockpad_config::Config;
/// # use blockpad_engine::{Cmd, Document};
/// let mut doc = Document::from_text("\n∞∞∞text\nhello", &Config::default()).unwrap();
///
/// let patch = doc.apply(Cmd::InsertText { at: 20, text: " world".to_string() }).unwrap();
/// assert_eq!(patch.version, 1);
/// assert_eq!(doc.text(), "\n∞∞∞text\nhello world");
///
/// doc.apply(Cmd::AddBlockAtEnd).unwrap();
/// assert_eq!(doc.blocks().len(), 2);
///
/// doc.undo();
/// assert_eq!(doc.blocks().len(), 1);
/// ```
pub struct Document {
    id: DocumentId,
    pub(crate) buffer: Rope,
    pub(crate) selection: Selection,
    pub(crate) version: u64,
    pub(crate) languages: LanguageTable,
    pub(crate) settings: Settings,
    /// Syntax tree of the current buffer, `None` while a reparse is pending
    pub(crate) tree: Option<GreenNode>,
    pub(crate) store: BlockStore,
    pub(crate) folds: Folds,
    pub(crate) history: History,
    pub(crate) clock: Arc<dyn Clock>,
}

/// State carried from one filter to the next during a dispatch.
struct Pass {
    tx: Transaction,
    text_before: Rope,
    blocks_before: BlockList,
    selection_before: Selection,
    inverses: Vec<ChangeSet>,
    changed: Vec<Range<usize>>,
}

impl Document {
    /// Create an empty document.
    pub fn new(config: &Config) -> Result<Self, EngineError> {
        Self::from_text("", config)
    }

    /// Create a document from raw bytes.
    pub fn from_bytes(bytes: &[u8], config: &Config) -> Result<Self, EngineError> {
        let text = std::str::from_utf8(bytes)?;
        Self::from_text(text, config)
    }

    pub fn from_text(text: &str, config: &Config) -> Result<Self, EngineError> {
        let languages = LanguageTable::from_tokens(&config.editor.languages)?;
        let settings = Settings::from(config);
        if !languages.contains(&settings.default_language) {
            return Err(EngineError::UnknownLanguage(settings.default_language));
        }

        let store = BlockStore::new(&languages, &settings.default_language)?;
        let buffer = Rope::from(text);
        let len = buffer.len();

        let mut doc = Self {
            id: DocumentId::new(),
            buffer,
            selection: Selection::caret(len),
            version: 0,
            languages,
            settings,
            tree: None,
            store,
            folds: Folds::new(),
            history: History::new(),
            clock: Arc::new(SystemClock),
        };
        doc.reparse(text);
        doc.selection = filters::clamp_selection(doc.selection, Origin::Input, doc.store.list());
        Ok(doc)
    }

    /// Replace the clock used for `created` timestamps.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Get the document's content as raw bytes (exact round-trip)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer.to_string().into_bytes()
    }

    /// Get the current text content
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub(crate) fn slice(&self, range: Range<usize>) -> String {
        let start = self.floor_boundary(range.start);
        let end = self.floor_boundary(range.end).max(start);
        self.buffer.slice_to_cow(start..end).into_owned()
    }

    /// Largest char boundary not after `pos`, clamped to the length.
    pub(crate) fn floor_boundary(&self, pos: usize) -> usize {
        let pos = pos.min(self.buffer.len());
        self.buffer.at_or_prev_codepoint_boundary(pos).unwrap_or(0)
    }

    pub(crate) fn floor_range(&self, range: &Range<usize>) -> Range<usize> {
        let start = self.floor_boundary(range.start);
        start..self.floor_boundary(range.end).max(start)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Move the selection. Goes through the pipeline, so it is clamped like
    /// any other unflagged selection.
    pub fn set_selection(&mut self, selection: Selection) -> Patch {
        let selection = Selection::new(
            self.floor_boundary(selection.anchor),
            self.floor_boundary(selection.head),
        );
        self.dispatch(Transaction::new(Origin::Input).with_selection(selection))
    }

    pub fn languages(&self) -> &LanguageTable {
        &self.languages
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ============ Blocks ============

    pub fn blocks(&self) -> &[Block] {
        self.store.blocks()
    }

    pub fn block_list(&self) -> &BlockList {
        self.store.list()
    }

    pub fn block_at(&self, pos: usize) -> Option<&Block> {
        self.store.list().block_at(pos)
    }

    /// Block holding the selection head.
    pub fn active_block(&self) -> Option<&Block> {
        self.block_at(self.selection.head)
    }

    /// Index and block that would be active with the head at `pos`.
    pub fn active_block_at(&self, pos: usize) -> Option<(usize, &Block)> {
        let index = self.store.list().index_at(pos);
        self.store.list().get(index).map(|block| (index, block))
    }

    pub(crate) fn active_index(&self) -> usize {
        self.store.list().index_at(self.selection.head)
    }

    pub fn block_content(&self, index: usize) -> Option<String> {
        self.blocks()
            .get(index)
            .map(|block| self.slice(block.content.clone()))
    }

    // ============ Edit pipeline ============

    /// Compile a command and dispatch it.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, EngineError> {
        let tx = crate::editing::commands::compile(self, &cmd)?;
        Ok(self.dispatch(tx))
    }

    /// Run a transaction through the filter pipeline.
    pub fn dispatch(&mut self, tx: Transaction) -> Patch {
        let mut pass = Pass {
            tx,
            text_before: self.buffer.clone(),
            blocks_before: self.store.list().clone(),
            selection_before: self.selection,
            inverses: Vec::new(),
            changed: Vec::new(),
        };

        for filter in PIPELINE {
            self.run_filter(filter, &mut pass);
        }

        Patch {
            changed: pass.changed,
            new_selection: self.selection.range(),
            version: self.version,
        }
    }

    fn run_filter(&mut self, filter: Filter, pass: &mut Pass) {
        match filter {
            Filter::ProtectDelimiters => {
                filters::protect_delimiters(&mut pass.tx, &pass.blocks_before);
            }
            Filter::RefreshTimestamps => {
                timestamps::refresh_timestamps(
                    &mut pass.tx,
                    &pass.text_before,
                    &pass.blocks_before,
                    &self.languages,
                    self.clock.now(),
                );
            }
            Filter::Apply => self.apply_steps(pass),
            Filter::ClampSelection => {
                self.selection =
                    filters::clamp_selection(self.selection, pass.tx.origin, self.store.list());
            }
            Filter::GuardFolds => self.folds.guard(&pass.tx, &pass.text_before),
            Filter::Commit => self.commit(pass),
        }
    }

    fn apply_steps(&mut self, pass: &mut Pass) {
        let mut text = self.buffer.clone();
        let mut applied = Vec::with_capacity(pass.tx.steps.len());

        for step in pass.tx.steps.drain(..) {
            if step.len_before() != text.len() {
                warn!(
                    "dropping step built for {} bytes, document has {}",
                    step.len_before(),
                    text.len()
                );
                continue;
            }
            if step.is_empty() {
                continue;
            }

            pass.changed = pass
                .changed
                .iter()
                .map(|range| {
                    step.map_pos(range.start, Assoc::Before)..step.map_pos(range.end, Assoc::After)
                })
                .collect();
            pass.changed.extend(step.changed_ranges());
            pass.inverses.push(step.invert(&text));
            text = step.apply(&text);
            applied.push(step);
        }
        pass.tx.steps = applied;

        let content_changed = pass.tx.changes_content();
        if content_changed {
            self.buffer = text;
            let text = self.buffer.to_string();
            self.reparse(&text);
        } else if self.store.is_empty() {
            let text = self.buffer.to_string();
            self.store.recompute(&text, self.tree.as_ref());
        }

        let selection = match pass.tx.selection {
            Some(selection) => selection,
            None => pass
                .tx
                .steps
                .iter()
                .fold(self.selection, |selection, step| selection.map(step)),
        };
        self.selection = selection.clamp(self.buffer.len());
    }

    /// Reparse synchronously when the document is small enough, then
    /// recompute the block list.
    fn reparse(&mut self, text: &str) {
        if text.len() <= self.settings.sync_parse_limit {
            self.tree = Some(blockpad_syntax::parse(text, &self.languages).green().into_owned());
        } else if self.tree.take().is_some() {
            debug!(
                "document is {} bytes, over the sync parse limit; deferring reparse",
                text.len()
            );
        }
        self.store.recompute(text, self.tree.as_ref());
    }

    fn commit(&mut self, pass: &mut Pass) {
        if !pass.tx.changes_content() {
            return;
        }

        self.version += 1;
        match pass.tx.origin {
            Origin::ContentLoad => self.history.clear(),
            Origin::Undo | Origin::Redo => {}
            origin => self.history.record(Revision {
                steps: pass.tx.steps.clone(),
                inverses: std::mem::take(&mut pass.inverses),
                selection_before: pass.selection_before,
                selection_after: self.selection,
                origin,
            }),
        }
    }

    /// Build the syntax tree if it was deferred. Returns whether a parse ran.
    ///
    /// Hosts call this from their idle loop. Until it runs, the block list
    /// comes from the string segmenter.
    pub fn parse_idle(&mut self) -> bool {
        if self.tree.is_some() {
            return false;
        }
        let text = self.text();
        self.tree = Some(blockpad_syntax::parse(&text, &self.languages).green().into_owned());
        self.store.recompute(&text, self.tree.as_ref());
        true
    }

    pub fn needs_idle_parse(&self) -> bool {
        self.tree.is_none()
    }

    // ============ History ============

    pub fn undo(&mut self) -> Option<Patch> {
        let revision = self.history.pop_undo()?;
        let patch = self.dispatch(revision.undo_transaction());
        self.history.push_redo(revision);
        Some(patch)
    }

    pub fn redo(&mut self) -> Option<Patch> {
        let revision = self.history.pop_redo()?;
        let patch = self.dispatch(revision.redo_transaction());
        self.history.push_undo(revision);
        Some(patch)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ============ Folds ============

    pub fn folds(&self) -> &[Range<usize>] {
        self.folds.ranges()
    }

    pub fn fold(&mut self, range: Range<usize>) -> bool {
        let range = self.floor_range(&range);
        self.folds.add(range)
    }

    /// Remove folds overlapping `range`. Returns how many were removed.
    pub fn unfold(&mut self, range: Range<usize>) -> usize {
        self.folds.remove_overlapping(range)
    }

    pub fn fold_block(&mut self, index: usize) -> bool {
        match self.blocks().get(index) {
            Some(block) => {
                let content = block.content.clone();
                self.folds.add(content)
            }
            None => false,
        }
    }

    /// Fold or unfold a block's content. Returns whether it is folded now.
    pub fn toggle_fold_block(&mut self, index: usize) -> bool {
        let Some(content) = self.blocks().get(index).map(|block| block.content.clone()) else {
            return false;
        };
        if self.folds.contains(&content) {
            self.folds.remove_overlapping(content);
            false
        } else {
            self.folds.add(content)
        }
    }

    pub fn unfold_all(&mut self) {
        self.folds.clear();
    }

    // ============ Persistence ============

    /// Replace the whole document with stored state. History is cleared.
    pub fn load(&mut self, state: LoadState) -> Patch {
        let new_len = state.text.len();
        let selection = Selection::new(
            floor_char_boundary(&state.text, state.selection.anchor),
            floor_char_boundary(&state.text, state.selection.head),
        );

        self.folds.clear();
        let tx = Transaction::new(Origin::ContentLoad)
            .with_changes(ChangeSet::new(
                self.len(),
                vec![Change::new(0..self.len(), state.text)],
            ))
            .with_selection(selection);
        let patch = self.dispatch(tx);
        self.history.clear();

        for fold in state.folds {
            if fold.end <= new_len {
                self.folds.add(fold);
            }
        }
        patch
    }

    pub fn persist_state(&self) -> PersistedState {
        PersistedState {
            text: self.text(),
            selection: self.selection,
            folds: self.folds.ranges().to_vec(),
        }
    }

    // ============ Language detection ============

    /// Queue the active block for detection if its language is automatic.
    pub fn request_detection(&self, registry: &mut DetectionRegistry, now: Instant) -> Option<u64> {
        let index = self.active_index();
        let block = self.blocks().get(index)?;
        if !block.auto {
            return None;
        }
        let content = self.slice(block.content.clone());
        Some(registry.schedule(self.id, index, content, now))
    }

    /// Apply a detected language to a block.
    ///
    /// `snapshot` is the block content the detector saw. The suggestion is
    /// dropped (and logged) unless the block is still automatic, the
    /// confidence is high enough, the content has not drifted too far from
    /// the snapshot, the language is registered and different, and nothing
    /// is waiting to be redone.
    pub fn apply_detection(
        &mut self,
        snapshot: &str,
        suggestion: &LanguageSuggestion,
    ) -> Option<Patch> {
        if let Err(reason) = self.check_detection(snapshot, suggestion) {
            debug!("dropping language suggestion: {reason}");
            return None;
        }

        match crate::editing::commands::change_language(
            self,
            suggestion.block_index,
            &suggestion.token,
            true,
            Origin::LanguageDetection,
        ) {
            Ok(tx) => Some(self.dispatch(tx)),
            Err(err) => {
                debug!("dropping language suggestion: {err}");
                None
            }
        }
    }

    fn check_detection(
        &self,
        snapshot: &str,
        suggestion: &LanguageSuggestion,
    ) -> Result<(), DetectionStale> {
        let block = self
            .blocks()
            .get(suggestion.block_index)
            .ok_or(DetectionStale::BlockGone {
                block: suggestion.block_index,
            })?;
        if !block.auto {
            return Err(DetectionStale::NotAuto);
        }
        if suggestion.confidence < self.settings.detection.min_confidence {
            return Err(DetectionStale::LowConfidence {
                confidence: suggestion.confidence,
            });
        }

        let current = self.slice(block.content.clone());
        let distance = levenshtein(&current, snapshot);
        let limit = self.settings.detection.max_edit_ratio * snapshot.chars().count() as f64;
        if distance as f64 > limit {
            return Err(DetectionStale::ContentDiverged { distance, limit });
        }

        if !self.languages.contains(&suggestion.token) {
            return Err(DetectionStale::UnknownLanguage {
                token: suggestion.token.clone(),
            });
        }
        if suggestion.token == block.language {
            return Err(DetectionStale::SameLanguage);
        }
        if self.history.can_redo() {
            return Err(DetectionStale::RedoPending);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("len", &self.buffer.len())
            .field("selection", &self.selection)
            .field("version", &self.version)
            .field("blocks", &self.store.blocks().len())
            .field("folds", &self.folds.ranges())
            .finish()
    }
}
