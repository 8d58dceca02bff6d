//! Snoozing: threads tagged with a snooze label leave the inbox on the
//! cleanup tick and come back when that label's release tick fires.

pub mod mover;
pub mod resolver;

use std::fmt;

use log::{info, warn};

use crate::config::SnoozeConfig;
use crate::domain::label::qualified_name;
use crate::error::SnoozeError;
use crate::mail::mailbox::{Mailbox, Operation};

use self::mover::{BatchMover, Transition};
use self::resolver::Sleeper;

/// Invocation entry points driven by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Tick {
    Cleanup,
    Evening,
    Tomorrow,
    Saturday,
}

impl Tick {
    pub const ALL: [Tick; 4] = [Tick::Cleanup, Tick::Evening, Tick::Tomorrow, Tick::Saturday];
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tick::Cleanup => "cleanup",
            Tick::Evening => "evening",
            Tick::Tomorrow => "tomorrow",
            Tick::Saturday => "saturday",
        };
        f.write_str(name)
    }
}

pub struct Snoozer<'a> {
    mailbox: &'a dyn Mailbox,
    sleeper: &'a dyn Sleeper,
    cfg: &'a SnoozeConfig,
}

impl<'a> Snoozer<'a> {
    pub fn new(mailbox: &'a dyn Mailbox, sleeper: &'a dyn Sleeper, cfg: &'a SnoozeConfig) -> Self {
        Self {
            mailbox,
            sleeper,
            cfg,
        }
    }

    pub fn run(&self, tick: Tick) -> Result<(), SnoozeError> {
        match tick {
            Tick::Cleanup => self.clean_labels(),
            Tick::Evening => self.run_evening(),
            Tick::Tomorrow => self.run_tomorrow(),
            Tick::Saturday => self.run_saturday(),
        }
    }

    /// Marks every snoozed thread read and archives it. Stops at the first
    /// label that fails.
    pub fn clean_labels(&self) -> Result<(), SnoozeError> {
        let mover = BatchMover::new(self.mailbox, self.sleeper);
        for name in self.cfg.labels.all() {
            mover.drain(&self.qualified(name), Transition::clean())?;
        }
        Ok(())
    }

    pub fn run_evening(&self) -> Result<(), SnoozeError> {
        self.release(&self.cfg.labels.evening)
    }

    pub fn run_tomorrow(&self) -> Result<(), SnoozeError> {
        self.release(&self.cfg.labels.tomorrow)
    }

    pub fn run_saturday(&self) -> Result<(), SnoozeError> {
        self.release(&self.cfg.labels.saturday)
    }

    /// Creates the grouping label and every snooze label under it. Labels
    /// that already exist are left alone.
    pub fn install(&self) -> Result<(), SnoozeError> {
        let group = &self.cfg.grouping_label;
        let names = std::iter::once(group.clone())
            .chain(self.cfg.labels.all().into_iter().map(|n| self.qualified(n)));

        for name in names {
            let created = self.mailbox.create_label(&name).map_err(|source| {
                SnoozeError::MailboxOperation {
                    op: Operation::CreateLabel,
                    label: name.clone(),
                    source,
                }
            })?;
            if created {
                info!("created label {name}");
            } else {
                warn!("label {name} already exists, skipping");
            }
        }
        Ok(())
    }

    fn release(&self, name: &str) -> Result<(), SnoozeError> {
        BatchMover::new(self.mailbox, self.sleeper)
            .drain(&self.qualified(name), Transition::release(self.cfg.mark_unread))?;
        Ok(())
    }

    fn qualified(&self, name: &str) -> String {
        qualified_name(&self.cfg.grouping_label, name)
    }
}
