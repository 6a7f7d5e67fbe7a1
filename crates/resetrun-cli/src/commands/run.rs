use clap::Subcommand;

use super::{report_change, Context};

#[derive(Subcommand)]
pub enum RunAction {
    /// Show the current cycle
    Status,
    /// Record a finished session
    Complete {
        /// The session ended early and does not count
        #[arg(long)]
        abandoned: bool,
    },
    /// Start a session (locks settings for the rest of today)
    Begin,
    /// Change the daily goal (1, 2 or 3)
    Goal {
        /// Completions needed to credit a day
        goal: i64,
    },
}

pub fn run(action: RunAction, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = ctx.tracker();
    match action {
        RunAction::Status => {
            let status = tracker.status();
            ctx.emit(&status, || {
                let store = &status.store;
                println!(
                    "Day {} of 7 (started {})",
                    status.day_number, store.run_start_date
                );
                println!(
                    "Goal: {}/day  Credited: {}/7  Total resets: {}",
                    store.daily_goal,
                    store.credited_days(),
                    store.total_resets
                );
                for day in &status.cycle {
                    let mark = if day.credited { "x" } else { " " };
                    let here = if day.key == status.today { "  <- today" } else { "" };
                    println!("  [{mark}] {} {}  {}{here}", day.day, day.key, day.completions);
                }
                if let Some(unlocks_on) = status.lock.unlocks_on {
                    println!("Settings locked until {unlocks_on}");
                }
            })?;
        }
        RunAction::Complete { abandoned } => {
            let completion = tracker.record_completion(!abandoned)?;
            ctx.publish();
            let outcome = completion.outcome;
            ctx.emit(&completion, || {
                if outcome.cycle_restarted {
                    println!("Previous cycle ended, new run started {}", outcome.today_key);
                }
                if abandoned {
                    println!("Session not counted");
                } else if outcome.hit_day_seven {
                    println!("Day 7 credited. Run complete!");
                } else if outcome.completed_day_now {
                    println!("Day {} credited ({}/7)", outcome.day_index + 1, outcome.completed_count);
                } else if outcome.already_completed_today {
                    println!("Today is already credited");
                } else {
                    println!(
                        "Session recorded ({}/{} today)",
                        completion.store.completions_on(outcome.today_key),
                        completion.store.daily_goal
                    );
                }
            })?;
        }
        RunAction::Begin => {
            if tracker.begin_session()? {
                ctx.publish();
            }
            let lock = tracker.lock_status();
            ctx.emit(&lock, || {
                println!("Session started, settings locked until {}", tracker.today().next());
            })?;
        }
        RunAction::Goal { goal } => {
            report_change(ctx, tracker.set_daily_goal(goal)?)?;
        }
    }
    Ok(())
}
