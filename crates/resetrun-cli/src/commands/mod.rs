pub mod config;
pub mod profile;
pub mod run;
pub mod settings;

use std::sync::Arc;

use resetrun_core::error::RemoteError;
use resetrun_core::profile::{remote_from_config, ProfileReconciler, SyncOutcome};
use resetrun_core::storage::data_dir;
use resetrun_core::{
    Audience, Clock, Config, DateKey, FileBlobStore, FixedClock, LocalState, RunTracker,
    SettingsChange, SystemClock,
};
use serde::Serialize;

/// Everything a command needs: local state, the clock and configuration.
pub struct Context {
    pub local: LocalState,
    pub clock: Arc<dyn Clock>,
    pub config: Config,
    pub json: bool,
}

impl Context {
    pub fn load(today: Option<DateKey>, json: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = data_dir()?;
        let clock: Arc<dyn Clock> = match today {
            Some(today) => Arc::new(FixedClock::new(today)),
            None => Arc::new(SystemClock),
        };
        Ok(Self {
            local: LocalState::new(Arc::new(FileBlobStore::new(dir.join("state")))),
            clock,
            config: Config::load()?,
            json,
        })
    }

    pub fn uid(&self) -> Option<&str> {
        self.config.account.uid.as_deref()
    }

    pub fn audience(&self) -> Audience {
        match self.uid() {
            Some(_) => Audience::SignedIn,
            None => Audience::Guest,
        }
    }

    pub fn tracker(&self) -> RunTracker {
        RunTracker::new(self.local.clone(), self.clock.clone(), self.audience())
    }

    pub fn reconciler(&self) -> Result<ProfileReconciler, RemoteError> {
        let remote = remote_from_config(&self.config.remote)?;
        Ok(ProfileReconciler::new(
            self.local.clone(),
            remote,
            self.clock.clone(),
        ))
    }

    /// Push local changes to the signed-in profile, if any.
    ///
    /// The local change is already saved, so sync problems of any kind are
    /// reported on stderr and never fail the command.
    pub fn publish(&self) {
        let Some(uid) = self.uid() else {
            return;
        };
        let reconciler = match self.reconciler() {
            Ok(reconciler) => reconciler,
            Err(e) => {
                tracing::warn!(uid, "remote profile store unavailable: {e}");
                eprintln!("warning: profile not synced: {e}");
                return;
            }
        };
        reconciler.resume(uid);

        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::warn!(uid, "could not start async runtime: {e}");
                eprintln!("warning: profile not synced: {e}");
                return;
            }
        };
        if let Some(update) = rt.block_on(reconciler.publish_local()) {
            if let SyncOutcome::Failed(reason) = update.sync {
                eprintln!("warning: profile not synced: {reason}");
            }
        }
    }

    /// Print `value` as JSON in `--json` mode, otherwise run `human`.
    pub fn emit<T: Serialize>(
        &self,
        value: &T,
        human: impl FnOnce(),
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human();
        }
        Ok(())
    }
}

/// Turn a guarded settings edit into command output.
pub fn report_change(ctx: &Context, change: SettingsChange) -> Result<(), Box<dyn std::error::Error>> {
    match change {
        SettingsChange::Applied => {
            ctx.publish();
            println!("settings saved, locked until tomorrow");
            Ok(())
        }
        SettingsChange::Unchanged => {
            println!("settings unchanged");
            Ok(())
        }
        SettingsChange::Locked { unlocks_on } => {
            Err(format!("settings are locked until {unlocks_on}").into())
        }
        SettingsChange::Invalid(e) => Err(e.into()),
    }
}
