//! The 7-day reset run: persisted store, legacy migration, completion
//! recording and the daily settings lock.

mod lock;
mod migrate;
mod recorder;
mod store;
mod tracker;

pub use lock::SettingsLockStatus;
pub use migrate::StoreShape;
pub use recorder::CompletionOutcome;
pub use store::{CycleDay, DailyGoal, RunStore, CYCLE_LENGTH};
pub use tracker::{Completion, RunStatus, RunTracker, SettingsChange};
