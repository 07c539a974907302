//! Bookkeeping for asynchronous language detection.
//!
//! The detector itself runs outside the engine. The registry decides when a
//! block's content is handed to it (after an idle delay, newest request per
//! block wins) and which answers are still worth applying: every request
//! carries a generation, and a response whose generation no longer matches
//! the pending request for its block is dropped.
//!
//! ```text
//! schedule ──(idle delay)──▶ take_due ──▶ detector ──▶ complete ──▶ Document::apply_detection
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::{Duration, Instant};

use blockpad_config::DetectionConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identity of one open document, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc:{}", self.0)
    }
}

/// Content handed to the detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionRequest {
    pub doc: DocumentId,
    pub generation: u64,
    pub block_index: usize,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageSuggestion {
    pub block_index: usize,
    pub token: String,
    /// Detector confidence in `0.0..=1.0`
    pub confidence: f64,
}

/// What the detector sends back for a [`DetectionRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResponse {
    pub doc: DocumentId,
    pub generation: u64,
    pub suggestion: LanguageSuggestion,
}

/// A response that matched its pending request, with the content the
/// detector was given.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedDetection {
    pub doc: DocumentId,
    pub snapshot: String,
    pub suggestion: LanguageSuggestion,
}

/// Why a language suggestion was not applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionStale {
    #[error("block {block} no longer exists")]
    BlockGone { block: usize },

    #[error("block language is no longer automatic")]
    NotAuto,

    #[error("confidence {confidence} below threshold")]
    LowConfidence { confidence: f64 },

    #[error("content changed too much since detection ({distance} edits, limit {limit})")]
    ContentDiverged { distance: usize, limit: f64 },

    #[error("suggested language {token:?} is not registered")]
    UnknownLanguage { token: String },

    #[error("block already has the suggested language")]
    SameLanguage,

    #[error("redo history would be lost")]
    RedoPending,
}

#[derive(Debug)]
struct Pending {
    generation: u64,
    content: String,
    deadline: Instant,
    dispatched: bool,
}

#[derive(Debug, Default)]
struct DocumentDetections {
    generation: u64,
    pending: BTreeMap<usize, Pending>,
}

/// Pending detections of every open document.
#[derive(Debug)]
pub struct DetectionRegistry {
    idle_delay: Duration,
    documents: HashMap<DocumentId, DocumentDetections>,
}

impl DetectionRegistry {
    pub fn new(idle_delay: Duration) -> Self {
        Self {
            idle_delay,
            documents: HashMap::new(),
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(Duration::from_millis(config.idle_delay_ms))
    }

    /// Queue `content` of a block for detection once the idle delay has
    /// passed. Supersedes any request still pending for the same block.
    /// Returns the request's generation.
    pub fn schedule(
        &mut self,
        doc: DocumentId,
        block_index: usize,
        content: String,
        now: Instant,
    ) -> u64 {
        let entry = self.documents.entry(doc).or_default();
        entry.generation = entry.generation.wrapping_add(1);
        let generation = entry.generation;

        let pending = Pending {
            generation,
            content,
            deadline: now + self.idle_delay,
            dispatched: false,
        };
        if let Some(previous) = entry.pending.insert(block_index, pending) {
            debug!(
                "{doc}: detection for block {block_index} superseded (generation {} -> {generation})",
                previous.generation
            );
        }
        generation
    }

    /// Requests whose idle delay has passed. Each request is handed out once.
    pub fn take_due(&mut self, now: Instant) -> Vec<DetectionRequest> {
        let mut due = Vec::new();
        for (doc, entry) in &mut self.documents {
            for (&block_index, pending) in &mut entry.pending {
                if pending.dispatched || pending.deadline > now {
                    continue;
                }
                pending.dispatched = true;
                due.push(DetectionRequest {
                    doc: *doc,
                    generation: pending.generation,
                    block_index,
                    content: pending.content.clone(),
                });
            }
        }
        due
    }

    /// Match a response to its request. Responses for forgotten documents,
    /// superseded generations or requests never handed out are dropped.
    pub fn complete(&mut self, response: DetectionResponse) -> Option<CompletedDetection> {
        let block_index = response.suggestion.block_index;
        let Some(entry) = self.documents.get_mut(&response.doc) else {
            debug!("{}: dropping detection response for unknown document", response.doc);
            return None;
        };

        let current = entry.pending.get(&block_index).is_some_and(|pending| {
            pending.dispatched && pending.generation == response.generation
        });
        if !current {
            debug!(
                "{}: dropping stale detection response for block {block_index} (generation {})",
                response.doc, response.generation
            );
            return None;
        }

        let pending = entry.pending.remove(&block_index)?;
        Some(CompletedDetection {
            doc: response.doc,
            snapshot: pending.content,
            suggestion: response.suggestion,
        })
    }

    /// Drop everything pending for a closed document.
    pub fn forget(&mut self, doc: DocumentId) {
        self.documents.remove(&doc);
    }

    pub fn pending(&self, doc: DocumentId) -> usize {
        self.documents
            .get(&doc)
            .map_or(0, |entry| entry.pending.len())
    }

    /// Earliest deadline not yet handed out, for hosts that sleep until then.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.documents
            .values()
            .flat_map(|entry| entry.pending.values())
            .filter(|pending| !pending.dispatched)
            .map(|pending| pending.deadline)
            .min()
    }
}

/// Edit distance in characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const DELAY: Duration = Duration::from_millis(1000);

    fn suggestion(block_index: usize) -> LanguageSuggestion {
        LanguageSuggestion {
            block_index,
            token: "json".to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn requests_wait_for_idle_delay() {
        let mut registry = DetectionRegistry::new(DELAY);
        let doc = DocumentId::new();
        let start = Instant::now();
        registry.schedule(doc, 0, "{}".to_string(), start);

        assert!(registry.take_due(start).is_empty());
        assert_eq!(registry.next_deadline(), Some(start + DELAY));

        let due = registry.take_due(start + DELAY);
        assert_eq!(
            due,
            vec![DetectionRequest {
                doc,
                generation: 1,
                block_index: 0,
                content: "{}".to_string(),
            }]
        );
        // Handed out once
        assert!(registry.take_due(start + DELAY * 2).is_empty());
        assert_eq!(registry.next_deadline(), None);
    }

    #[test]
    fn newer_request_supersedes_pending_one() {
        let mut registry = DetectionRegistry::new(DELAY);
        let doc = DocumentId::new();
        let start = Instant::now();
        registry.schedule(doc, 0, "{".to_string(), start);
        let second = registry.schedule(doc, 0, "{}".to_string(), start + DELAY / 2);

        assert_eq!(registry.pending(doc), 1);
        assert!(registry.take_due(start + DELAY).is_empty());
        let due = registry.take_due(start + DELAY * 2);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].generation, second);
        assert_eq!(due[0].content, "{}");
    }

    #[test]
    fn complete_matches_generation() {
        let mut registry = DetectionRegistry::new(DELAY);
        let doc = DocumentId::new();
        let start = Instant::now();
        let generation = registry.schedule(doc, 2, "{}".to_string(), start);
        registry.take_due(start + DELAY);

        let completed = registry
            .complete(DetectionResponse {
                doc,
                generation,
                suggestion: suggestion(2),
            })
            .unwrap();
        assert_eq!(completed.snapshot, "{}");
        assert_eq!(completed.suggestion, suggestion(2));
        assert_eq!(registry.pending(doc), 0);
    }

    #[test]
    fn stale_response_is_dropped() {
        let mut registry = DetectionRegistry::new(DELAY);
        let doc = DocumentId::new();
        let start = Instant::now();
        let first = registry.schedule(doc, 0, "{".to_string(), start);
        registry.take_due(start + DELAY);
        // Block edited again while the detector was busy
        registry.schedule(doc, 0, "{}".to_string(), start + DELAY);

        let response = DetectionResponse {
            doc,
            generation: first,
            suggestion: suggestion(0),
        };
        assert_eq!(registry.complete(response), None);
        assert_eq!(registry.pending(doc), 1);
    }

    #[test]
    fn undispatched_and_forgotten_requests_do_not_complete() {
        let mut registry = DetectionRegistry::new(DELAY);
        let doc = DocumentId::new();
        let generation = registry.schedule(doc, 0, "{}".to_string(), Instant::now());
        let response = DetectionResponse {
            doc,
            generation,
            suggestion: suggestion(0),
        };
        assert_eq!(registry.complete(response.clone()), None);

        registry.forget(doc);
        assert_eq!(registry.pending(doc), 0);
        assert_eq!(registry.complete(response), None);
    }

    #[test]
    fn documents_are_independent() {
        let mut registry = DetectionRegistry::new(DELAY);
        let (a, b) = (DocumentId::new(), DocumentId::new());
        let start = Instant::now();
        assert_eq!(registry.schedule(a, 0, "x".to_string(), start), 1);
        assert_eq!(registry.schedule(b, 0, "y".to_string(), start), 1);
        assert_eq!(registry.take_due(start + DELAY).len(), 2);
    }

    #[rstest]
    #[case("", "", 0)]
    #[case("abc", "", 3)]
    #[case("kitten", "sitting", 3)]
    #[case("{\"a\": 1}", "{\"a\": 12}", 1)]
    #[case("∞∞", "∞x∞", 1)]
    fn levenshtein_distance(#[case] a: &str, #[case] b: &str, #[case] expected: usize) {
        assert_eq!(levenshtein(a, b), expected);
        assert_eq!(levenshtein(b, a), expected);
    }
}
