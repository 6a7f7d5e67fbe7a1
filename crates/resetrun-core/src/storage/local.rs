//! Device-resident state: run store, preferences and the cached profile.
//!
//! Every load is fail-soft. Saves report [`StorageError`] so callers can log
//! them, but nothing in the engine stops on a failed write.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::blob::BlobStore;
use crate::date_key::DateKey;
use crate::error::StorageError;
use crate::preferences::{Audience, PreferenceSet};
use crate::profile::{CachedProfile, Profile};
use crate::run::{RunStore, StoreShape};

pub const RUN_STORE_KEY: &str = "reset_run_v3";
pub const PREFERENCES_KEY: &str = "reset_run_v2_goals";
pub const PROFILE_CACHE_KEY: &str = "reset_run_profile_cache";

/// Typed access to the local blobs.
#[derive(Clone)]
pub struct LocalState {
    blobs: Arc<dyn BlobStore>,
}

impl LocalState {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    pub fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    fn put_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.blobs.put(key, &encoded)
    }

    /// Load the run store for `today`.
    ///
    /// Missing, corrupt or legacy blobs are migrated or replaced, stale locks
    /// are dropped, an expired cycle restarts, and the result is written back.
    pub fn load_run_store(&self, today: DateKey) -> RunStore {
        let (mut store, shape) = match self.blobs.get(RUN_STORE_KEY) {
            Some(raw) => RunStore::from_json(&raw, today),
            None => (RunStore::fresh(today), StoreShape::Fresh),
        };
        let before = store.clone();
        store.settle(today);

        if shape != StoreShape::Current || store != before {
            if let Err(e) = self.save_run_store(&store) {
                tracing::warn!("could not write back run store: {e}");
            }
        }
        store
    }

    pub fn save_run_store(&self, store: &RunStore) -> Result<(), StorageError> {
        self.put_json(RUN_STORE_KEY, store)
    }

    /// Stored preferences; guests never read them.
    pub fn load_preferences(&self, audience: Audience) -> Option<PreferenceSet> {
        if audience == Audience::Guest {
            return None;
        }
        self.blobs
            .get(PREFERENCES_KEY)
            .and_then(|raw| PreferenceSet::from_json(&raw))
    }

    pub fn save_preferences(&self, prefs: &PreferenceSet) -> Result<(), StorageError> {
        self.put_json(PREFERENCES_KEY, prefs)
    }

    pub fn clear_preferences(&self) -> Result<(), StorageError> {
        self.blobs.remove(PREFERENCES_KEY)
    }

    /// Cached profile for `uid`; a cache written for another identity is ignored.
    pub fn load_cached_profile(&self, uid: &str) -> Option<Profile> {
        let raw = self.blobs.get(PROFILE_CACHE_KEY)?;
        match serde_json::from_str::<CachedProfile>(&raw) {
            Ok(cached) if cached.uid == uid => Some(cached.profile),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("profile cache is corrupt: {e}");
                None
            }
        }
    }

    pub fn save_cached_profile(
        &self,
        uid: &str,
        profile: &Profile,
        cached_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let payload = CachedProfile {
            uid: uid.to_string(),
            profile: profile.clone(),
            cached_at,
        };
        self.put_json(PROFILE_CACHE_KEY, &payload)
    }

    pub fn clear_cached_profile(&self) -> Result<(), StorageError> {
        self.blobs.remove(PROFILE_CACHE_KEY)
    }

    /// Overwrite local preferences and run store from a profile.
    ///
    /// A profile without preferences clears them; one without run state
    /// leaves the local run store alone.
    pub fn hydrate(&self, profile: &Profile) -> Result<(), StorageError> {
        match &profile.preferences {
            Some(prefs) => self.save_preferences(prefs)?,
            None => self.clear_preferences()?,
        }
        if let Some(run_state) = &profile.run_state {
            self.save_run_store(run_state)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for LocalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalState").finish_non_exhaustive()
    }
}
