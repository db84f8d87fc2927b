//! Cardsmith Storage Layer
//!
//! Implements the `FlashcardStore` trait on a single JSON document.
//!
//! # Architecture
//!
//! - The whole collection lives in memory and is rewritten on every
//!   successful insert batch
//! - Writes go to a temporary sibling file that is renamed over the store, so
//!   readers never observe a half-written document
//! - The previous document is copied to `<file>.bak` before each write
//! - Duplicates are detected by exact question key
//!
//! # Examples
//!
//! ```
//! use cardsmith_domain::Candidate;
//! use cardsmith_domain::traits::FlashcardStore;
//! use cardsmith_store::JsonStore;
//!
//! let mut store = JsonStore::in_memory();
//! let outcome = store
//!     .insert(&[Candidate::new("What is DNA?", "A nucleic acid molecule.", 0)])
//!     .unwrap();
//! assert_eq!(outcome.accepted, 1);
//! ```

#![warn(missing_docs)]

mod document;

pub use document::{FlashcardRecord, CURRENT_VERSION};

use cardsmith_domain::traits::{FlashcardStore, InsertOutcome};
use cardsmith_domain::{Candidate, Flashcard, FlashcardId};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The collection could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The store file exists but is not a valid document
    #[error("Corrupt store file {}: {message}", .path.display())]
    Corrupt {
        /// Store file
        path: PathBuf,
        /// Parse failure detail
        message: String,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// JSON-document implementation of FlashcardStore
///
/// # Thread Safety
///
/// Mutation takes `&mut self`; share a store between tasks behind a mutex so
/// that the duplicate check and the append happen as one step.
#[derive(Debug)]
pub struct JsonStore {
    path: Option<PathBuf>,
    cards: Vec<Flashcard>,
    keys: HashSet<String>,
    removed_on_load: usize,
    needs_rewrite: bool,
}

impl JsonStore {
    /// Open the store at `path`
    ///
    /// A missing file yields an empty collection; nothing is written until the
    /// first successful insert. Duplicates found in the file are dropped in
    /// memory and counted (see [`clean`](Self::clean)).
    ///
    /// # Errors
    ///
    /// `StoreError::Corrupt` when the file exists but cannot be parsed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No store at {}, starting empty", path.display());
                return Ok(Self::empty(Some(path)));
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Self::empty(Some(path)));
        }

        let decoded = document::decode(&content, unix_now()).map_err(|message| StoreError::Corrupt {
            path: path.clone(),
            message,
        })?;

        let mut store = Self::empty(Some(path));
        for card in decoded.cards {
            if !store.keys.insert(card.key()) {
                store.removed_on_load += 1;
                continue;
            }
            store.cards.push(card);
        }
        store.needs_rewrite = decoded.legacy;

        if decoded.legacy {
            warn!("Store uses the legacy array format; it will be rewritten on next save");
        }
        if store.removed_on_load > 0 {
            warn!("Dropped {} duplicate flashcards while loading", store.removed_on_load);
        }
        info!("Loaded {} flashcards", store.cards.len());

        Ok(store)
    }

    /// Create a store that is never written to disk
    pub fn in_memory() -> Self {
        Self::empty(None)
    }

    fn empty(path: Option<PathBuf>) -> Self {
        Self {
            path,
            cards: Vec::new(),
            keys: HashSet::new(),
            removed_on_load: 0,
            needs_rewrite: false,
        }
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Location of the last-known-good copy
    pub fn backup_path(&self) -> Option<PathBuf> {
        self.path.as_ref().map(|path| {
            let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
            name.push(".bak");
            path.with_file_name(name)
        })
    }

    /// Look up a flashcard by id
    pub fn get(&self, id: FlashcardId) -> Option<&Flashcard> {
        self.cards.iter().find(|card| card.id == id)
    }

    /// True when a flashcard with the same question key exists
    pub fn contains_question(&self, question: &str) -> bool {
        self.keys.contains(&cardsmith_domain::question_key(question))
    }

    /// Persist the deduplicated collection if loading changed it
    ///
    /// Returns the number of duplicates removed from the file.
    pub fn clean(&mut self) -> Result<usize, StoreError> {
        let removed = self.removed_on_load;
        if removed > 0 || self.needs_rewrite {
            self.save()?;
            info!("Cleaned store: removed {} duplicates", removed);
        }
        self.removed_on_load = 0;
        Ok(removed)
    }

    /// Insert candidates with an explicit creation time
    pub fn insert_at(&mut self, candidates: &[Candidate], created_at: u64) -> Result<InsertOutcome, StoreError> {
        let original_len = self.cards.len();
        let mut added_keys = Vec::new();
        let mut outcome = InsertOutcome::default();

        for candidate in candidates {
            let key = candidate.key();
            if self.keys.contains(&key) {
                debug!("Duplicate question: {}", candidate.question);
                outcome.rejected_duplicate += 1;
                continue;
            }
            self.keys.insert(key.clone());
            added_keys.push(key);
            self.cards.push(Flashcard::from_candidate(candidate, created_at));
            outcome.accepted += 1;
        }

        if outcome.accepted == 0 {
            return Ok(outcome);
        }

        if let Err(e) = self.save() {
            // Nothing new is visible unless it reached disk
            self.cards.truncate(original_len);
            for key in &added_keys {
                self.keys.remove(key);
            }
            return Err(e);
        }

        Ok(outcome)
    }

    /// Write the collection atomically, keeping the previous file as backup
    fn save(&mut self) -> Result<(), StoreError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&document::StoreDocument::from_cards(&self.cards))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        if path.exists() {
            if let Some(backup) = self.backup_path() {
                fs::copy(path, &backup).map_err(|e| StoreError::io(&backup, e))?;
            }
        }

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| StoreError::io(&dir, e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;

        self.needs_rewrite = false;
        debug!("Saved {} flashcards to {}", self.cards.len(), path.display());
        Ok(())
    }
}

impl FlashcardStore for JsonStore {
    type Error = StoreError;

    fn insert(&mut self, candidates: &[Candidate]) -> Result<InsertOutcome, Self::Error> {
        self.insert_at(candidates, unix_now())
    }

    fn flashcards(&self) -> &[Flashcard] {
        &self.cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_dedup_within_batch() {
        let mut store = JsonStore::in_memory();
        let outcome = store
            .insert(&[
                Candidate::new("What is ATP?", "The energy currency of cells.", 0),
                Candidate::new("what is  atp?", "Adenosine triphosphate molecule.", 1),
            ])
            .unwrap();

        assert_eq!(outcome, InsertOutcome { accepted: 1, rejected_duplicate: 1 });
        assert_eq!(store.len(), 1);
        assert!(store.contains_question("WHAT IS ATP?"));
    }

    #[test]
    fn test_get_by_id() {
        let mut store = JsonStore::in_memory();
        store
            .insert_at(&[Candidate::new("What is DNA?", "A nucleic acid molecule.", 0)], 5)
            .unwrap();

        let id = FlashcardId::from_content("What is DNA?", "A nucleic acid molecule.");
        let card = store.get(id).unwrap();
        assert_eq!(card.created_at, 5);
    }

    #[test]
    fn test_backup_path() {
        let store = JsonStore::open("/nonexistent/dir/cards.json").unwrap();
        assert_eq!(store.backup_path(), Some(PathBuf::from("/nonexistent/dir/cards.json.bak")));
        assert!(JsonStore::in_memory().backup_path().is_none());
    }
}
