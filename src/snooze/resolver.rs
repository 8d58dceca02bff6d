use std::thread;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;

use crate::domain::label::LabelHandle;
use crate::error::SnoozeError;
use crate::mail::mailbox::Mailbox;

pub const MAX_ATTEMPTS: u32 = 5;
pub const MAX_JITTER_MS: u64 = 1000;
const BASE_DELAY_MS: u64 = 1000;

/// Wait after failed attempt `attempt` (1-based): `2^attempt` seconds plus
/// `jitter_ms`, which is clamped below [`MAX_JITTER_MS`].
pub fn backoff_delay(attempt: u32, jitter_ms: u64) -> Duration {
    let base = (1u64 << attempt.min(32)) * BASE_DELAY_MS;
    Duration::from_millis(base + jitter_ms.min(MAX_JITTER_MS - 1))
}

pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration);
}

/// Blocks the calling thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        thread::sleep(delay);
    }
}

/// Resolves fully-qualified label names, retrying failed lookups with
/// exponential backoff. Lookups are the only calls made on the mailbox.
pub struct LabelResolver<'a> {
    mailbox: &'a dyn Mailbox,
    sleeper: &'a dyn Sleeper,
}

impl<'a> LabelResolver<'a> {
    pub fn new(mailbox: &'a dyn Mailbox, sleeper: &'a dyn Sleeper) -> Self {
        Self { mailbox, sleeper }
    }

    pub fn resolve(&self, name: &str) -> Result<LabelHandle, SnoozeError> {
        let mut attempt = 1;
        loop {
            match self.mailbox.get_label(name) {
                Ok(label) => {
                    debug!("resolved label {name} on attempt {attempt}");
                    return Ok(label);
                }
                Err(source) if attempt >= MAX_ATTEMPTS => {
                    return Err(SnoozeError::Resolution {
                        label: name.to_string(),
                        attempts: attempt,
                        source,
                    });
                }
                Err(e) => {
                    let jitter = rand::thread_rng().gen_range(0..MAX_JITTER_MS);
                    let delay = backoff_delay(attempt, jitter);
                    warn!(
                        "lookup of label {name} failed (attempt {attempt}/{MAX_ATTEMPTS}): {e}; retrying in {} ms",
                        delay.as_millis()
                    );
                    self.sleeper.sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
