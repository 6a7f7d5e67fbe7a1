//! # Reset Run Core Library
//!
//! This library provides the streak-integrity engine behind Reset Run: a
//! seven-day run of short reset sessions with a per-day completion goal. All
//! operations are available through the standalone CLI binary, which is a
//! thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Date keys**: calendar-day identity in the device time zone, with an
//!   injectable [`Clock`]
//! - **Run**: the persisted 7-day cycle, legacy migration, completion
//!   recording and the daily settings lock
//! - **Storage**: JSON blobs for device state and TOML-based configuration
//! - **Profile**: per-identity sync with a remote store, validated field by
//!   field and reconciled on sign-in
//!
//! ## Key Components
//!
//! - [`RunStore`]: the cycle and its invariants
//! - [`RunTracker`]: load, mutate and persist the run for today
//! - [`ProfileReconciler`]: sign-in state machine
//! - [`Config`]: application configuration management

pub mod date_key;
pub mod error;
pub mod preferences;
pub mod profile;
pub mod protocols;
pub mod run;
pub mod storage;

pub use date_key::{Clock, DateKey, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, RemoteError, StorageError, ValidationError};
pub use preferences::{Audience, PreferenceSet};
pub use profile::{
    Profile, ProfilePatch, ProfileReconciler, ProfileRemote, SignInOutcome, SyncOutcome,
};
pub use protocols::{Mode, SessionLength};
pub use run::{CompletionOutcome, DailyGoal, RunStore, RunTracker, SettingsChange};
pub use storage::{Config, FileBlobStore, LocalState};
