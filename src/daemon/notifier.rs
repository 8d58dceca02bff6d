use log::warn;
use notify_rust::{Hint, Notification, Timeout};

use crate::error::SnoozeError;
use crate::snooze::Tick;

/// Surfaces failed ticks on the desktop.
pub struct Notifier {
    app_name: &'static str,
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            app_name: "gmail_snooze",
        }
    }

    pub fn notify_failure(&self, tick: Tick, err: &SnoozeError) {
        let (summary, body) = failure_message(tick, err);
        let shown = Notification::new()
            .appname(self.app_name)
            .summary(&summary)
            .body(&body)
            .icon("mail-unread")
            .hint(Hint::Category("email".to_string()))
            .timeout(Timeout::Never)
            .show();

        if let Err(e) = shown {
            warn!("notification error: {e}");
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

fn failure_message(tick: Tick, err: &SnoozeError) -> (String, String) {
    let summary = format!("Gmail Snooze: {tick} run failed");
    let body = format!(
        "{}\nThe next run will retry from the current label state.",
        err.chain()
    );
    (summary, body)
}
