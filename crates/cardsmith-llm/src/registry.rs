//! Process-wide registry of heavyweight model handles.
//!
//! Each model key owns a slot guarded by its own mutex. The first caller for a
//! key runs the factory while holding that slot's lock, so concurrent
//! first-time callers block until construction finishes and then share the
//! same handle. Constructing one model never blocks callers of another key.
//!
//! A failed construction is remembered for its key: later `acquire` calls
//! report the same failure without re-running the factory, and only an
//! explicit [`ModelRegistry::retry`] constructs again.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use thiserror::Error;
use tracing::{info, warn};

/// Registry error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The factory for this key failed
    #[error("Failed to load model {key}: {message}")]
    Construction {
        /// Key whose construction failed
        key: ModelKey,
        /// Factory error message
        message: String,
    },

    /// The key is loaded, but with a different handle type
    #[error("Model {key} is registered with a different handle type")]
    TypeMismatch {
        /// Key that was requested
        key: ModelKey,
    },
}

/// Category of model held by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
    /// Sentence-boundary detector
    Sentence,
    /// Generative text model
    Generator,
    /// OCR reader
    Ocr,
}

impl ModelKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Sentence => "sentence",
            ModelKind::Generator => "generator",
            ModelKind::Ocr => "ocr",
        }
    }
}

/// Identity and configuration of a model instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelKey {
    kind: ModelKind,
    name: String,
}

impl ModelKey {
    /// Key for a sentence-boundary model
    pub fn sentence(name: impl Into<String>) -> Self {
        Self {
            kind: ModelKind::Sentence,
            name: name.into(),
        }
    }

    /// Key for a generative model
    pub fn generator(name: impl Into<String>) -> Self {
        Self {
            kind: ModelKind::Generator,
            name: name.into(),
        }
    }

    /// Key for an OCR reader over a set of languages
    ///
    /// Language order does not matter.
    ///
    /// # Examples
    ///
    /// ```
    /// use cardsmith_llm::ModelKey;
    ///
    /// assert_eq!(ModelKey::ocr(&["fr", "en"]), ModelKey::ocr(&["en", "fr"]));
    /// ```
    pub fn ocr(languages: &[&str]) -> Self {
        let mut languages: Vec<&str> = languages.to_vec();
        languages.sort_unstable();
        languages.dedup();
        Self {
            kind: ModelKind::Ocr,
            name: languages.join("_"),
        }
    }

    /// Model category
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Model name or configuration string
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.name)
    }
}

type Handle = Arc<dyn Any + Send + Sync>;

enum SlotState {
    Empty,
    Ready(Handle),
    Failed(String),
}

struct Slot {
    state: Mutex<SlotState>,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Empty),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // A panicking factory leaves the slot Empty, so the state is still valid
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Registry for lazily constructed, shared model handles
///
/// Create one per process and pass it by reference to whatever needs models.
pub struct ModelRegistry {
    slots: RwLock<HashMap<ModelKey, Arc<Slot>>>,
}

impl ModelRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &ModelKey) -> Arc<Slot> {
        {
            let slots = self.slots.read().unwrap_or_else(|p| p.into_inner());
            if let Some(slot) = slots.get(key) {
                return Arc::clone(slot);
            }
        }
        let mut slots = self.slots.write().unwrap_or_else(|p| p.into_inner());
        Arc::clone(
            slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Slot::new())),
        )
    }

    /// Get the handle for `key`, constructing it with `factory` on first use
    ///
    /// `factory` runs at most once per key across all threads. If an earlier
    /// construction failed, the recorded failure is returned and `factory` is
    /// not called; use [`retry`](Self::retry) to construct again.
    pub fn acquire<T, E, F>(&self, key: &ModelKey, factory: F) -> Result<Arc<T>, RegistryError>
    where
        T: Send + Sync + 'static,
        E: fmt::Display,
        F: FnOnce() -> Result<T, E>,
    {
        let slot = self.slot(key);
        let mut state = slot.lock();
        match &*state {
            SlotState::Ready(handle) => downcast(key, handle),
            SlotState::Failed(message) => Err(RegistryError::Construction {
                key: key.clone(),
                message: message.clone(),
            }),
            SlotState::Empty => construct(key, &mut state, factory),
        }
    }

    /// Construct `key` again after a failure, possibly with a different factory
    ///
    /// A key that is already loaded is returned as-is.
    pub fn retry<T, E, F>(&self, key: &ModelKey, factory: F) -> Result<Arc<T>, RegistryError>
    where
        T: Send + Sync + 'static,
        E: fmt::Display,
        F: FnOnce() -> Result<T, E>,
    {
        let slot = self.slot(key);
        let mut state = slot.lock();
        if let SlotState::Ready(handle) = &*state {
            return downcast(key, handle);
        }
        info!("Retrying construction of model {}", key);
        construct(key, &mut state, factory)
    }

    /// True when `key` holds a constructed handle
    pub fn is_loaded(&self, key: &ModelKey) -> bool {
        let slot = {
            let slots = self.slots.read().unwrap_or_else(|p| p.into_inner());
            match slots.get(key) {
                Some(slot) => Arc::clone(slot),
                None => return false,
            }
        };
        let state = slot.lock();
        matches!(&*state, SlotState::Ready(_))
    }

    /// Keys with constructed handles, sorted
    pub fn loaded_keys(&self) -> Vec<ModelKey> {
        let slots: Vec<(ModelKey, Arc<Slot>)> = {
            let slots = self.slots.read().unwrap_or_else(|p| p.into_inner());
            slots
                .iter()
                .map(|(key, slot)| (key.clone(), Arc::clone(slot)))
                .collect()
        };
        let mut keys: Vec<ModelKey> = slots
            .into_iter()
            .filter(|(_, slot)| matches!(&*slot.lock(), SlotState::Ready(_)))
            .map(|(key, _)| key)
            .collect();
        keys.sort();
        keys
    }

    /// Forget every handle of one kind
    pub fn release(&self, kind: ModelKind) {
        let count = self.reset_slots(|key| key.kind == kind);
        info!("Released {} {} models", count, kind.as_str());
    }

    /// Forget all cached handles
    ///
    /// Handles already given out stay valid; the next `acquire` constructs
    /// a fresh instance. Slots are emptied rather than removed, so an
    /// `acquire` racing with the release still shares one construction.
    pub fn release_all(&self) {
        let count = self.reset_slots(|_| true);
        info!("Released {} model slots", count);
    }

    fn reset_slots(&self, matches: impl Fn(&ModelKey) -> bool) -> usize {
        let slots: Vec<Arc<Slot>> = {
            let slots = self.slots.read().unwrap_or_else(|p| p.into_inner());
            slots
                .iter()
                .filter(|(key, _)| matches(key))
                .map(|(_, slot)| Arc::clone(slot))
                .collect()
        };
        // Map lock released first: a factory may itself call `acquire`
        for slot in &slots {
            *slot.lock() = SlotState::Empty;
        }
        slots.len()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn downcast<T>(key: &ModelKey, handle: &Handle) -> Result<Arc<T>, RegistryError>
where
    T: Send + Sync + 'static,
{
    Arc::clone(handle)
        .downcast::<T>()
        .map_err(|_| RegistryError::TypeMismatch { key: key.clone() })
}

fn construct<T, E, F>(
    key: &ModelKey,
    state: &mut SlotState,
    factory: F,
) -> Result<Arc<T>, RegistryError>
where
    T: Send + Sync + 'static,
    E: fmt::Display,
    F: FnOnce() -> Result<T, E>,
{
    info!("Loading model {}", key);
    match factory() {
        Ok(model) => {
            let model = Arc::new(model);
            *state = SlotState::Ready(Arc::clone(&model) as Handle);
            info!("Loaded model {}", key);
            Ok(model)
        }
        Err(e) => {
            let message = e.to_string();
            warn!("Failed to load model {}: {}", key, message);
            *state = SlotState::Failed(message.clone());
            Err(RegistryError::Construction {
                key: key.clone(),
                message,
            })
        }
    }
}
