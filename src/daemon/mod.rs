pub mod notifier;
pub mod schedule;

use anyhow::Result;
use chrono::Local;
use log::{error, info};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use crate::config::SnoozeConfig;
use crate::daemon::notifier::Notifier;
use crate::daemon::schedule::{FiredState, Schedule};
use crate::mail::mailbox::Mailbox;
use crate::snooze::resolver::ThreadSleeper;
use crate::snooze::{Snoozer, Tick};

pub struct DaemonConfig {
    /// Seconds between passes; cleanup runs on every pass.
    pub interval_secs: u64,
    pub notify: bool,
}

/// Runs ticks on the local clock until Ctrl-C. A failing tick is logged and
/// notified, then retried on a later pass.
pub fn run_daemon(mailbox: &dyn Mailbox, snooze: &SnoozeConfig, cfg: DaemonConfig) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r2 = running.clone();
    ctrlc::set_handler(move || {
        r2.store(false, Ordering::SeqCst);
    })?;

    let notifier = Notifier::new();
    let schedule = Schedule::new(snooze.hours);
    let snoozer = Snoozer::new(mailbox, &ThreadSleeper, snooze);
    let mut fired = FiredState::default();

    info!("daemon started, pass every {}s", cfg.interval_secs);

    while running.load(Ordering::SeqCst) {
        let now = Local::now().naive_local();

        for tick in schedule.due(now, &fired) {
            match snoozer.run(tick) {
                Ok(()) => {
                    if tick != Tick::Cleanup {
                        info!("{tick} release done");
                        fired.mark(tick, now.date());
                    }
                }
                Err(e) => {
                    error!("{tick} run failed: {}", e.chain());
                    if cfg.notify {
                        notifier.notify_failure(tick, &e);
                    }
                }
            }
        }

        thread::sleep(Duration::from_secs(cfg.interval_secs));
    }

    info!("daemon stopped");
    Ok(())
}
