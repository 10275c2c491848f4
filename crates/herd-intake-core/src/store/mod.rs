//! Profile storage for Herd Intake.
//!
//! [`ProfileStore`] keeps every profile in memory, newest first, and writes
//! the whole collection as one JSON blob under a single namespace key of a
//! [`KvBackend`]. There are no per-profile keys and no partial writes.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`open`](ProfileStore::open) | Load the collection; absent or corrupt blobs start empty |
//! | [`create`](ProfileStore::create) | Stamp, prepend, and persist a new profile |
//! | [`get`](ProfileStore::get) | Look up a profile by ID |
//! | [`delete`](ProfileStore::delete) | Remove every profile with an ID and persist |
//! | [`list`](ProfileStore::list) | Newest-first view of the collection |
//! | [`count`](ProfileStore::count) | Number of profiles held |

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::models::{Profile, ProfilePayload};

/// Namespace key the profile collection is stored under by default.
pub const DEFAULT_NAMESPACE: &str = "intake_profiles";

const ID_PREFIX: &str = "CER";
const SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 4;

/// A key-value byte/string store addressed by namespace key.
///
/// All operations are async (via `async-trait`) so the same store logic runs
/// over SQLite on native targets and over browser storage elsewhere.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Returns the value stored under `key`, or `None` if nothing is stored.
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value stored under `key`.
    async fn write(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to serialize profiles: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The in-memory collection changed but the backend write failed.
    #[error("profile {id} changed in memory but was not persisted: {reason}")]
    PersistenceFailed { id: String, reason: String },
}

/// Builds an identifier of the form `CER-<year>-<epoch millis>-<4 uppercase chars>`.
///
/// Uniqueness is probabilistic: two calls in the same millisecond can only
/// collide if their random suffixes also match.
pub fn generate_id<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!(
        "{}-{}-{}-{}",
        ID_PREFIX,
        now.year(),
        now.timestamp_millis(),
        suffix
    )
}

/// Newest-first, versioned collection of intake profiles.
pub struct ProfileStore<B: KvBackend> {
    backend: B,
    namespace: String,
    profiles: Vec<Profile>,
}

impl<B: KvBackend> ProfileStore<B> {
    /// Loads the collection stored under `namespace`.
    ///
    /// Never fails: a missing blob, an unreadable backend, or a blob that
    /// does not deserialize all yield an empty store.
    pub async fn open(backend: B, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let profiles = match backend.read(&namespace).await {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<Profile>>(&blob) {
                Ok(profiles) => profiles,
                Err(e) => {
                    warn!(namespace = %namespace, error = %e, "stored profiles are corrupt; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!(namespace = %namespace, "no stored profiles");
                Vec::new()
            }
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "failed to read stored profiles; starting empty");
                Vec::new()
            }
        };

        Self {
            backend,
            namespace,
            profiles,
        }
    }

    /// Creates a profile from `payload`, prepends it, and persists the collection.
    ///
    /// On a failed write the profile stays in memory (no rollback) and
    /// [`StoreError::PersistenceFailed`] is returned; `get` still finds it.
    /// A profile that cannot be stored as JSON (a non-finite number, say) is
    /// dropped again and [`StoreError::Serialization`] is returned.
    pub async fn create(&mut self, payload: ProfilePayload) -> Result<Profile, StoreError> {
        let created_at = Utc::now();
        let id = generate_id(created_at, &mut rand::thread_rng());
        let profile = Profile::from_payload(id, created_at, payload);

        self.profiles.insert(0, profile.clone());
        if let Err(e) = self.persist(&profile.id).await {
            if matches!(e, StoreError::Serialization(_)) {
                self.profiles.remove(0);
            }
            return Err(e);
        }

        info!(id = %profile.id, total = self.profiles.len(), "profile created");
        Ok(profile)
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Removes every profile whose ID equals `id` and returns how many went.
    ///
    /// Unknown IDs are a no-op and nothing is written.
    pub async fn delete(&mut self, id: &str) -> Result<usize, StoreError> {
        let before = self.profiles.len();
        self.profiles.retain(|p| p.id != id);
        let removed = before - self.profiles.len();
        if removed > 0 {
            self.persist(id).await?;
        }
        Ok(removed)
    }

    pub fn list(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn count(&self) -> usize {
        self.profiles.len()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn persist(&self, id: &str) -> Result<(), StoreError> {
        let blob = serde_json::to_string(&self.profiles)?;
        // NaN and infinities serialize as `null`, which `open` would reject
        // and then discard the whole collection.
        if let Err(e) = serde_json::from_str::<Vec<Profile>>(&blob) {
            warn!(namespace = %self.namespace, id = %id, error = %e, "refusing to persist unreadable profiles");
            return Err(StoreError::Serialization(e));
        }
        self.backend
            .write(&self.namespace, &blob)
            .await
            .map_err(|e| {
                warn!(namespace = %self.namespace, id = %id, error = %e, "failed to persist profiles");
                StoreError::PersistenceFailed {
                    id: id.to_string(),
                    reason: format!("{:#}", e),
                }
            })
    }
}
