use log::{debug, info};

use crate::domain::label::{LabelHandle, ThreadHandle};
use crate::error::SnoozeError;
use crate::mail::mailbox::{Mailbox, MailboxError, MailboxResult, Operation};
use crate::snooze::resolver::{LabelResolver, Sleeper};

pub const PAGE_SIZE: usize = 100;

type BatchOp = fn(&dyn Mailbox, &[ThreadHandle]) -> MailboxResult<()>;

/// Side effects applied to every page of a drained label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub move_to_inbox: bool,
    pub mark_unread: bool,
    pub mark_read: bool,
    pub move_to_archive: bool,
    pub remove_label: bool,
}

impl Transition {
    /// Brings threads back to the inbox and takes them off the label.
    pub fn release(mark_unread: bool) -> Self {
        Self {
            move_to_inbox: true,
            mark_unread,
            mark_read: false,
            move_to_archive: false,
            remove_label: true,
        }
    }

    /// Takes threads out of the inbox. The label stays so the release tick
    /// can find them later.
    pub fn clean() -> Self {
        Self {
            move_to_inbox: false,
            mark_unread: false,
            mark_read: true,
            move_to_archive: true,
            remove_label: false,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainStats {
    pub fetches: usize,
    pub threads: usize,
}

/// Drains a label page by page.
///
/// A thread stays eligible until its label is removed, which happens last for
/// each page. A run that dies part way leaves the unfinished threads labeled
/// and the next run picks them up again.
pub struct BatchMover<'a> {
    mailbox: &'a dyn Mailbox,
    resolver: LabelResolver<'a>,
    page_size: usize,
}

impl<'a> BatchMover<'a> {
    pub fn new(mailbox: &'a dyn Mailbox, sleeper: &'a dyn Sleeper) -> Self {
        Self {
            mailbox,
            resolver: LabelResolver::new(mailbox, sleeper),
            page_size: PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn drain(&self, name: &str, transition: Transition) -> Result<DrainStats, SnoozeError> {
        let label = self.resolver.resolve(name)?;
        let mut stats = DrainStats::default();
        // Threads keeping the label stay in the result set, so skip past them.
        let mut offset = 0;

        loop {
            let page = self
                .mailbox
                .threads_for_label(&label, offset, self.page_size)
                .map_err(|e| op_error(Operation::FetchThreads, &label, e))?;
            stats.fetches += 1;

            if page.is_empty() {
                break;
            }

            self.apply(&label, transition, &page)?;
            stats.threads += page.len();
            debug!("{label}: processed page of {} threads", page.len());

            if page.len() < self.page_size {
                break;
            }
            if !transition.remove_label {
                offset += page.len();
            }
        }

        info!(
            "{label}: drained {} threads in {} fetches",
            stats.threads, stats.fetches
        );
        Ok(stats)
    }

    fn apply(
        &self,
        label: &LabelHandle,
        transition: Transition,
        page: &[ThreadHandle],
    ) -> Result<(), SnoozeError> {
        let mb = self.mailbox;
        let steps: [(bool, Operation, BatchOp); 4] = [
            (transition.move_to_inbox, Operation::MoveToInbox, |mb, t| mb.move_to_inbox(t)),
            (transition.mark_unread, Operation::MarkUnread, |mb, t| mb.mark_unread(t)),
            (transition.mark_read, Operation::MarkRead, |mb, t| mb.mark_read(t)),
            (transition.move_to_archive, Operation::MoveToArchive, |mb, t| mb.move_to_archive(t)),
        ];

        for (_, op, call) in steps.into_iter().filter(|(enabled, ..)| *enabled) {
            call(mb, page).map_err(|e| op_error(op, label, e))?;
        }

        if transition.remove_label {
            mb.remove_label(label, page)
                .map_err(|e| op_error(Operation::RemoveLabel, label, e))?;
        }
        Ok(())
    }
}

fn op_error(op: Operation, label: &LabelHandle, source: MailboxError) -> SnoozeError {
    SnoozeError::MailboxOperation {
        op,
        label: label.name.clone(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::mail::memory::{MemoryMailbox, ThreadState};

    const LABEL: &str = "Remind me/Tomorrow";

    struct NoSleep;

    impl Sleeper for NoSleep {
        fn sleep(&self, _delay: Duration) {}
    }

    fn mailbox() -> MemoryMailbox {
        let mb = MemoryMailbox::new();
        mb.add_label(LABEL);
        mb
    }

    #[test]
    fn release_applies_effects_before_label_removal() {
        let mb = mailbox();
        mb.add_snoozed(LABEL, 3, false);
        BatchMover::new(&mb, &NoSleep)
            .drain(LABEL, Transition::release(true))
            .unwrap();

        assert_eq!(
            vec![
                Operation::GetLabel,
                Operation::FetchThreads,
                Operation::MoveToInbox,
                Operation::MarkUnread,
                Operation::RemoveLabel,
            ],
            mb.calls()
        );
    }

    #[test]
    fn clean_marks_read_then_archives() {
        let mb = mailbox();
        mb.add_thread(ThreadState::new(true, true).with_label(LABEL));
        BatchMover::new(&mb, &NoSleep)
            .drain(LABEL, Transition::clean())
            .unwrap();

        assert_eq!(
            vec![
                Operation::GetLabel,
                Operation::FetchThreads,
                Operation::MarkRead,
                Operation::MoveToArchive,
            ],
            mb.calls()
        );
    }

    #[test]
    fn clean_walks_offsets_over_retained_label() {
        let mb = mailbox();
        mb.add_snoozed(LABEL, 25, true);
        let stats = BatchMover::new(&mb, &NoSleep)
            .with_page_size(10)
            .drain(LABEL, Transition::clean())
            .unwrap();

        assert_eq!(DrainStats { fetches: 3, threads: 25 }, stats);
        assert_eq!(25, mb.labeled(LABEL).len());
        assert!(mb.threads().values().all(|s| !s.unread && !s.in_inbox));
    }

    #[test]
    fn resolution_failure_touches_nothing() {
        let mb = mailbox();
        mb.add_snoozed(LABEL, 3, false);
        mb.fail_next(Operation::GetLabel, 5);
        let err = BatchMover::new(&mb, &NoSleep)
            .drain(LABEL, Transition::release(true))
            .unwrap_err();

        assert!(matches!(err, SnoozeError::Resolution { .. }));
        assert_eq!(0, mb.count(Operation::FetchThreads));
        assert_eq!(3, mb.labeled(LABEL).len());
    }

    #[test]
    fn fetch_failure_is_reported_with_operation() {
        let mb = mailbox();
        mb.fail_next(Operation::FetchThreads, 1);
        let err = BatchMover::new(&mb, &NoSleep)
            .drain(LABEL, Transition::release(true))
            .unwrap_err();

        match err {
            SnoozeError::MailboxOperation { op, label, .. } => {
                assert_eq!(Operation::FetchThreads, op);
                assert_eq!(LABEL, label);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_page_size_is_clamped() {
        let mb = mailbox();
        mb.add_snoozed(LABEL, 2, false);
        let stats = BatchMover::new(&mb, &NoSleep)
            .with_page_size(0)
            .drain(LABEL, Transition::release(false))
            .unwrap();

        assert_eq!(DrainStats { fetches: 3, threads: 2 }, stats);
    }
}
