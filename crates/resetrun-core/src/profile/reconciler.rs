//! Sign-in reconciliation between local state and the remote profile.
//!
//! On sign-in the cached profile is applied immediately, then the remote
//! document is fetched, validated against local state and written back. A
//! generation counter identifies each sign-in; a result whose generation is no
//! longer current is dropped without touching local state.

use std::sync::{Arc, Mutex};

use super::normalize::normalize_profile;
use super::remote::ProfileRemote;
use super::types::{Profile, ProfileLocks, ProfilePatch};
use crate::date_key::Clock;
use crate::preferences::Audience;
use crate::storage::LocalState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilerState {
    Idle,
    /// Waiting on the remote; `cached` is shown meanwhile.
    Loading { uid: String, cached: Option<Profile> },
    Ready { uid: String, profile: Profile },
}

impl ReconcilerState {
    pub fn uid(&self) -> Option<&str> {
        match self {
            ReconcilerState::Idle => None,
            ReconcilerState::Loading { uid, .. } | ReconcilerState::Ready { uid, .. } => {
                Some(uid.as_str())
            }
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            ReconcilerState::Idle => None,
            ReconcilerState::Loading { cached, .. } => cached.as_ref(),
            ReconcilerState::Ready { profile, .. } => Some(profile),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    Ready(Profile),
    /// Another sign-in or a sign-out happened while this one was in flight.
    Superseded,
}

/// Result of one best-effort remote write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced,
    /// The remote store is disabled.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub profile: Profile,
    pub sync: SyncOutcome,
}

#[derive(Debug)]
struct Session {
    generation: u64,
    state: ReconcilerState,
}

pub struct ProfileReconciler {
    local: LocalState,
    remote: Arc<dyn ProfileRemote>,
    clock: Arc<dyn Clock>,
    session: Mutex<Session>,
}

impl ProfileReconciler {
    pub fn new(local: LocalState, remote: Arc<dyn ProfileRemote>, clock: Arc<dyn Clock>) -> Self {
        Self {
            local,
            remote,
            clock,
            session: Mutex::new(Session {
                generation: 0,
                state: ReconcilerState::Idle,
            }),
        }
    }

    fn with_session<T>(&self, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut session)
    }

    pub fn state(&self) -> ReconcilerState {
        self.with_session(|s| s.state.clone())
    }

    pub fn uid(&self) -> Option<String> {
        self.with_session(|s| s.state.uid().map(str::to_string))
    }

    pub fn profile(&self) -> Option<Profile> {
        self.with_session(|s| s.state.profile().cloned())
    }

    /// Profile rebuilt from the device's run store and preferences.
    pub fn build_profile_from_local(&self) -> Profile {
        let today = self.clock.today();
        Profile::from_local(
            Some(self.local.load_run_store(today)),
            self.local.load_preferences(Audience::SignedIn),
        )
    }

    fn hydrate(&self, profile: &Profile) {
        if let Err(e) = self.local.hydrate(profile) {
            tracing::warn!("failed to apply profile locally: {e}");
        }
    }

    fn persist(&self, uid: &str, profile: &Profile) {
        if let Err(e) = self.local.save_cached_profile(uid, profile, self.clock.now()) {
            tracing::warn!(uid, "failed to cache profile: {e}");
        }
        self.hydrate(profile);
    }

    /// Move to `Ready` and persist, unless `generation` is stale.
    fn commit(&self, uid: &str, generation: u64, profile: &Profile) -> bool {
        self.with_session(|s| {
            if s.generation != generation || s.state.uid() != Some(uid) {
                return false;
            }
            self.persist(uid, profile);
            s.state = ReconcilerState::Ready {
                uid: uid.to_string(),
                profile: profile.clone(),
            };
            true
        })
    }

    async fn push(&self, uid: &str, profile: &Profile) -> SyncOutcome {
        if !self.remote.is_enabled() {
            return SyncOutcome::Skipped;
        }
        match self.remote.write(uid, profile).await {
            Ok(()) => {
                tracing::debug!(uid, "profile written to remote");
                SyncOutcome::Synced
            }
            Err(e) => {
                tracing::warn!(uid, "remote profile write failed: {e}");
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    /// Full reconciliation for `uid`.
    ///
    /// Remote failures are logged and fall back to local state; they never
    /// fail the sign-in.
    pub async fn sign_in(&self, uid: &str) -> SignInOutcome {
        let cached = self.local.load_cached_profile(uid);
        if let Some(profile) = &cached {
            self.hydrate(profile);
        }
        let generation = self.with_session(|s| {
            s.generation += 1;
            s.state = ReconcilerState::Loading {
                uid: uid.to_string(),
                cached,
            };
            s.generation
        });

        let baseline = self.build_profile_from_local();
        let profile = match self.remote.fetch(uid).await {
            Ok(Some(raw)) => normalize_profile(&raw, &baseline, self.clock.today()),
            Ok(None) => {
                tracing::debug!(uid, "no remote profile, using local state");
                baseline
            }
            Err(e) => {
                tracing::warn!(uid, "remote profile fetch failed, using local state: {e}");
                baseline
            }
        };

        let sync = self.push(uid, &profile).await;

        if !self.commit(uid, generation, &profile) {
            tracing::debug!(uid, generation, "sign-in superseded, discarding result");
            return SignInOutcome::Superseded;
        }
        tracing::info!(uid, ?sync, "signed in");
        SignInOutcome::Ready(profile)
    }

    /// Back to `Idle`; any sign-in still in flight is discarded.
    pub fn sign_out(&self) {
        let previous = self.with_session(|s| {
            s.generation += 1;
            std::mem::replace(&mut s.state, ReconcilerState::Idle)
        });
        if let Err(e) = self.local.clear_cached_profile() {
            tracing::warn!("failed to clear profile cache: {e}");
        }
        if let Some(uid) = previous.uid() {
            tracing::info!(uid, "signed out");
        }
    }

    /// Ready on the cached profile without contacting the remote.
    ///
    /// Without a cache the profile is rebuilt from local state.
    pub fn restore_cached(&self, uid: &str) -> Profile {
        let profile = match self.local.load_cached_profile(uid) {
            Some(cached) => {
                self.hydrate(&cached);
                cached
            }
            None => self.build_profile_from_local(),
        };
        self.with_session(|s| {
            s.generation += 1;
            s.state = ReconcilerState::Ready {
                uid: uid.to_string(),
                profile: profile.clone(),
            };
        });
        profile
    }

    /// Ready for `uid` without applying the cache to local state.
    ///
    /// For short-lived callers whose local blobs are at least as new as the
    /// cache, such as a command that just mutated them.
    pub fn resume(&self, uid: &str) -> Profile {
        let profile = self
            .local
            .load_cached_profile(uid)
            .unwrap_or_else(|| self.build_profile_from_local());
        self.with_session(|s| {
            s.generation += 1;
            s.state = ReconcilerState::Ready {
                uid: uid.to_string(),
                profile: profile.clone(),
            };
        });
        profile
    }

    /// Merge `patch` into the current profile and sync it.
    ///
    /// Returns `None` unless a sign-in is `Ready`; a sign-in still loading
    /// keeps its state. Local state is updated before the remote write, whose
    /// outcome is only reported.
    pub async fn update_profile(&self, patch: ProfilePatch) -> Option<ProfileUpdate> {
        let (uid, generation, base) = self.with_session(|s| match &s.state {
            ReconcilerState::Ready { uid, profile } => {
                Some((uid.clone(), s.generation, profile.clone()))
            }
            ReconcilerState::Idle | ReconcilerState::Loading { .. } => None,
        })?;

        let merged = patch.merged_over(&base);
        let profile = match serde_json::to_value(&merged) {
            Ok(raw) => normalize_profile(&raw, &base, self.clock.today()),
            Err(_) => merged,
        };

        if !self.commit(&uid, generation, &profile) {
            tracing::debug!(uid = %uid, "profile update raced a sign-in change, dropped");
            return None;
        }
        let sync = self.push(&uid, &profile).await;
        Some(ProfileUpdate { profile, sync })
    }

    /// Publish the current local run store and preferences.
    pub async fn publish_local(&self) -> Option<ProfileUpdate> {
        let local = self.build_profile_from_local();
        let run_lock_until = self
            .profile()
            .and_then(|p| p.locks.run_lock_until);

        let patch = ProfilePatch {
            onboarding_complete: local.preferences.is_some().then_some(true),
            preferences: Some(local.preferences),
            locks: Some(ProfileLocks {
                daily_lock_date: local.locks.daily_lock_date,
                run_lock_until,
            }),
            run_state: local.run_state,
        };
        self.update_profile(patch).await
    }
}

impl std::fmt::Debug for ProfileReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileReconciler")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
