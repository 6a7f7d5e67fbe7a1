//! Per-identity profile: what is synchronized, how untrusted documents are
//! validated, and the sign-in state machine that reconciles local and remote.

mod normalize;
mod reconciler;
mod remote;
mod types;

pub use normalize::normalize_profile;
pub use reconciler::{
    ProfileReconciler, ProfileUpdate, ReconcilerState, SignInOutcome, SyncOutcome,
};
pub use remote::{
    remote_from_config, HttpProfileRemote, MemoryProfileRemote, OfflineRemote, ProfileRemote,
};
pub use types::{CachedProfile, Profile, ProfileLocks, ProfilePatch};
