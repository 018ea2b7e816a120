//! # Pending Attachment Ledger
//!
//! Side store of image payloads that cannot be uploaded yet because their
//! question has no server identifier. Keyed by tree position, not by id,
//! because the id does not exist until after the first save.
//!
//! The ledger lives outside the quiz tree so the tree itself stays
//! serializable. Invariant: outside an active mutation, every key addresses
//! a position that exists in the current tree. `EditSession` upholds this by
//! routing every removal through the reindex hooks below.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A question addressed by its location in the tree rather than by id
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PositionKey {
    pub section: usize,
    pub question: usize,
}

impl PositionKey {
    pub fn new(section: usize, question: usize) -> Self {
        Self { section, question }
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.section, self.question)
    }
}

/// An image picked locally but not yet uploaded
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAttachment {
    pub payload: Vec<u8>,
}

impl PendingAttachment {
    pub fn new(payload: Vec<u8>) -> Self {
        Self { payload }
    }
}

/// Map from positional key to unsent payload
///
/// BTreeMap so iteration (and therefore upload issue order) is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentLedger {
    entries: BTreeMap<PositionKey, PendingAttachment>,
}

impl AttachmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert one entry per key; a second attach at the same key replaces
    /// the first, discarding the earlier payload (returned for inspection).
    pub fn attach(&mut self, key: PositionKey, payload: Vec<u8>) -> Option<PendingAttachment> {
        self.entries.insert(key, PendingAttachment::new(payload))
    }

    /// Remove an entry (question deleted, or the user cleared the file)
    pub fn detach(&mut self, key: PositionKey) -> Option<PendingAttachment> {
        self.entries.remove(&key)
    }

    pub fn get(&self, key: PositionKey) -> Option<&PendingAttachment> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: PositionKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PositionKey, &PendingAttachment)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PositionKey> {
        self.entries.keys()
    }

    /// Re-key after a section was removed from the tree: entries in the
    /// removed section are dropped, entries in later sections shift down.
    pub fn reindex_after_section_removal(&mut self, removed: usize) {
        let entries = std::mem::take(&mut self.entries);
        self.entries = entries
            .into_iter()
            .filter_map(|(key, attachment)| match key.section.cmp(&removed) {
                std::cmp::Ordering::Less => Some((key, attachment)),
                std::cmp::Ordering::Equal => None,
                std::cmp::Ordering::Greater => Some((
                    PositionKey::new(key.section - 1, key.question),
                    attachment,
                )),
            })
            .collect();
    }

    /// Re-key after a question was removed within `section`: the entry at
    /// the removed position is dropped, later siblings shift down.
    pub fn reindex_after_question_removal(&mut self, section: usize, removed: usize) {
        let entries = std::mem::take(&mut self.entries);
        self.entries = entries
            .into_iter()
            .filter_map(|(key, attachment)| {
                if key.section != section {
                    return Some((key, attachment));
                }
                match key.question.cmp(&removed) {
                    std::cmp::Ordering::Less => Some((key, attachment)),
                    std::cmp::Ordering::Equal => None,
                    std::cmp::Ordering::Greater => Some((
                        PositionKey::new(key.section, key.question - 1),
                        attachment,
                    )),
                }
            })
            .collect();
    }
}
