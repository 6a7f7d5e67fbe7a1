use clap::Subcommand;
use resetrun_core::{DailyGoal, Mode, PreferenceSet, SessionLength};
use serde_json::json;

use super::{report_change, Context};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings and whether they can be changed today
    Show,
    /// Change settings (allowed once per day, before any session)
    Set {
        /// Completions needed to credit a day (1, 2 or 3)
        #[arg(long)]
        goal: Option<i64>,
        /// Comma-separated modes (calm, focus, clean, body, timeout)
        #[arg(long, value_delimiter = ',')]
        modes: Option<Vec<String>>,
        /// Session length in minutes (2, 5 or 10)
        #[arg(long)]
        duration: Option<i64>,
        /// Reminder time, stored as given; empty clears it
        #[arg(long)]
        reminder: Option<String>,
    },
    /// Lock settings for the rest of today
    Lock,
}

fn describe(prefs: &PreferenceSet) {
    let modes: Vec<&str> = prefs.preferred_modes.iter().map(Mode::display_name).collect();
    println!("Daily resets:  {}", prefs.daily_resets);
    println!("Modes:         {}", modes.join(", "));
    println!("Duration:      {} min", prefs.preferred_duration.minutes());
    println!(
        "Reminder:      {}",
        prefs.reminder_time.as_deref().unwrap_or("none")
    );
}

pub fn run(action: SettingsAction, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = ctx.tracker();
    match action {
        SettingsAction::Show => {
            let settings = tracker.settings();
            let lock = tracker.lock_status();
            ctx.emit(&json!({ "settings": settings, "lock": lock }), || {
                describe(&settings);
                match lock.unlocks_on {
                    Some(day) => println!("Status:        locked until {day}"),
                    None => println!("Status:        editable"),
                }
            })?;
        }
        SettingsAction::Set {
            goal,
            modes,
            duration,
            reminder,
        } => {
            let mut prefs = tracker.settings();
            if let Some(goal) = goal {
                prefs.daily_resets = DailyGoal::new(goal)?;
            }
            if let Some(modes) = modes {
                prefs.preferred_modes = modes
                    .iter()
                    .map(|m| m.trim().parse::<Mode>())
                    .collect::<Result<_, _>>()?;
            }
            if let Some(duration) = duration {
                prefs.preferred_duration = SessionLength::try_from(duration)?;
            }
            if let Some(reminder) = reminder {
                prefs.reminder_time = Some(reminder).filter(|r| !r.is_empty());
            }
            report_change(ctx, tracker.apply_settings(prefs)?)?;
        }
        SettingsAction::Lock => {
            if tracker.lock_today()? {
                ctx.publish();
                println!("settings locked until {}", tracker.today().next());
            } else {
                println!("settings already locked today");
            }
        }
    }
    Ok(())
}
