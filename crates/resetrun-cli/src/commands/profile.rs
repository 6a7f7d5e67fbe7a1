use clap::Subcommand;
use resetrun_core::{Profile, SignInOutcome};

use super::Context;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Sign in and reconcile local state with the remote profile
    SignIn {
        /// Account identifier
        uid: String,
    },
    /// Sign out and drop the cached profile
    SignOut,
    /// Print the profile for the signed-in account
    Show,
    /// Re-run reconciliation for the signed-in account
    Sync,
}

fn describe(uid: &str, profile: &Profile) {
    println!("Account:     {uid}");
    println!("Onboarded:   {}", profile.onboarding_complete);
    match &profile.preferences {
        Some(prefs) => println!(
            "Settings:    {}/day, {} min, {} modes",
            prefs.daily_resets,
            prefs.preferred_duration.minutes(),
            prefs.preferred_modes.len()
        ),
        None => println!("Settings:    none"),
    }
    if let Some(run) = &profile.run_state {
        println!(
            "Run:         started {}, {}/7 credited",
            run.run_start_date,
            run.credited_days()
        );
    }
    if let Some(day) = profile.locks.daily_lock_date {
        println!("Locked for:  {day}");
    }
}

fn reconcile(ctx: &Context, uid: &str) -> Result<(), Box<dyn std::error::Error>> {
    let reconciler = ctx.reconciler()?;
    let rt = tokio::runtime::Runtime::new()?;
    match rt.block_on(reconciler.sign_in(uid)) {
        SignInOutcome::Ready(profile) => ctx.emit(&profile, || describe(uid, &profile)),
        SignInOutcome::Superseded => Err("sign-in was superseded".into()),
    }
}

fn signed_in(ctx: &Context) -> Result<&str, Box<dyn std::error::Error>> {
    ctx.uid()
        .ok_or_else(|| "not signed in (run `profile sign-in <uid>`)".into())
}

pub fn run(action: ProfileAction, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ProfileAction::SignIn { uid } => {
            let mut config = ctx.config.clone();
            config.account.uid = Some(uid.clone());
            config.save()?;
            reconcile(ctx, &uid)?;
        }
        ProfileAction::SignOut => {
            ctx.reconciler()?.sign_out();
            let mut config = ctx.config.clone();
            config.account.uid = None;
            config.save()?;
            println!("signed out");
        }
        ProfileAction::Show => {
            let uid = signed_in(ctx)?;
            let profile = ctx.reconciler()?.resume(uid);
            ctx.emit(&profile, || describe(uid, &profile))?;
        }
        ProfileAction::Sync => {
            let uid = signed_in(ctx)?;
            reconcile(ctx, uid)?;
        }
    }
    Ok(())
}
