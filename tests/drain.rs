use std::collections::BTreeMap;
use std::time::Duration;

use gmail_snooze::domain::label::ThreadId;
use gmail_snooze::error::SnoozeError;
use gmail_snooze::mail::mailbox::Operation;
use gmail_snooze::mail::memory::{MemoryMailbox, ThreadState};
use gmail_snooze::snooze::mover::{BatchMover, DrainStats, Transition};
use gmail_snooze::snooze::resolver::Sleeper;

const LABEL: &str = "Remind me/Tomorrow";

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _delay: Duration) {}
}

fn mailbox_with(count: usize) -> MemoryMailbox {
    let mb = MemoryMailbox::new();
    mb.add_label(LABEL);
    mb.add_snoozed(LABEL, count, false);
    mb
}

fn drain(mb: &MemoryMailbox, transition: Transition) -> Result<DrainStats, SnoozeError> {
    BatchMover::new(mb, &NoSleep).drain(LABEL, transition)
}

fn released(state: &ThreadState) -> bool {
    state.in_inbox && state.unread && !state.labels.contains(LABEL)
}

#[test]
fn drains_250_threads_in_three_fetches() {
    let mb = mailbox_with(250);
    let stats = drain(&mb, Transition::release(true)).unwrap();

    assert_eq!(DrainStats { fetches: 3, threads: 250 }, stats);
    assert_eq!(3, mb.count(Operation::FetchThreads));
    assert_eq!(3, mb.count(Operation::RemoveLabel));
    assert!(mb.labeled(LABEL).is_empty());
    assert_eq!(250, mb.threads().values().filter(|s| released(s)).count());
}

#[test]
fn exact_multiple_needs_trailing_empty_fetch() {
    let mb = mailbox_with(200);
    let stats = drain(&mb, Transition::release(true)).unwrap();

    assert_eq!(DrainStats { fetches: 3, threads: 200 }, stats);
    assert_eq!(2, mb.count(Operation::RemoveLabel));
}

#[test]
fn empty_label_fetches_once() {
    let mb = mailbox_with(0);
    let stats = drain(&mb, Transition::release(true)).unwrap();

    assert_eq!(DrainStats { fetches: 1, threads: 0 }, stats);
    assert_eq!(vec![Operation::GetLabel, Operation::FetchThreads], mb.calls());
}

#[test]
fn second_drain_changes_nothing() {
    let mb = mailbox_with(120);
    drain(&mb, Transition::release(true)).unwrap();
    let after_first: BTreeMap<ThreadId, ThreadState> = mb.threads();

    mb.clear_calls();
    let stats = drain(&mb, Transition::release(true)).unwrap();

    assert_eq!(DrainStats { fetches: 1, threads: 0 }, stats);
    assert_eq!(after_first, mb.threads());
}

#[test]
fn repeated_clean_converges() {
    let mb = MemoryMailbox::new();
    mb.add_label(LABEL);
    for _ in 0..30 {
        mb.add_thread(ThreadState::new(true, true).with_label(LABEL));
    }

    drain(&mb, Transition::clean()).unwrap();
    let after_first = mb.threads();
    drain(&mb, Transition::clean()).unwrap();

    assert_eq!(after_first, mb.threads());
}

#[test]
fn rerun_after_failed_page_finishes_remaining_threads() {
    let mb = mailbox_with(250);
    // Page 1 completes; page 2 dies before its label comes off.
    mb.fail_after(Operation::RemoveLabel, 1, 1);

    let err = drain(&mb, Transition::release(true)).unwrap_err();
    assert!(matches!(
        err,
        SnoozeError::MailboxOperation {
            op: Operation::RemoveLabel,
            ..
        }
    ));
    assert_eq!(150, mb.labeled(LABEL).len());

    mb.clear_calls();
    let stats = drain(&mb, Transition::release(true)).unwrap();

    assert_eq!(DrainStats { fetches: 2, threads: 150 }, stats);
    assert!(mb.labeled(LABEL).is_empty());
    assert!(mb.threads().values().all(released));
}

#[test]
fn failure_mid_page_leaves_page_labeled() {
    let mb = mailbox_with(250);
    // Page 2's mark-unread fails after its move-to-inbox went through.
    mb.fail_after(Operation::MarkUnread, 1, 1);

    drain(&mb, Transition::release(true)).unwrap_err();
    let still_labeled = mb.labeled(LABEL);
    assert_eq!(150, still_labeled.len());
    assert!(still_labeled.iter().all(|t| !mb.thread(*t).unwrap().unread));

    drain(&mb, Transition::release(true)).unwrap();
    assert!(mb.threads().values().all(released));
}

#[test]
fn release_without_mark_unread_keeps_read_state() {
    let mb = MemoryMailbox::new();
    mb.add_label(LABEL);
    let read = mb.add_thread(ThreadState::new(false, false).with_label(LABEL));
    let unread = mb.add_thread(ThreadState::new(true, false).with_label(LABEL));

    drain(&mb, Transition::release(false)).unwrap();

    let read = mb.thread(read).unwrap();
    let unread = mb.thread(unread).unwrap();
    assert!(read.in_inbox && !read.unread);
    assert!(unread.in_inbox && unread.unread);
    assert_eq!(0, mb.count(Operation::MarkUnread));
}

#[test]
fn release_with_mark_unread_always_unread() {
    let mb = MemoryMailbox::new();
    mb.add_label(LABEL);
    mb.add_thread(ThreadState::new(false, false).with_label(LABEL));
    mb.add_thread(ThreadState::new(true, false).with_label(LABEL));

    drain(&mb, Transition::release(true)).unwrap();
    assert!(mb.threads().values().all(released));
}

#[test]
fn clean_archives_and_keeps_every_label() {
    let mb = MemoryMailbox::new();
    mb.add_label(LABEL);
    let t = mb.add_thread(
        ThreadState::new(true, true)
            .with_label(LABEL)
            .with_label("Work"),
    );

    drain(&mb, Transition::clean()).unwrap();

    let s = mb.thread(t).unwrap();
    assert!(!s.unread && !s.in_inbox);
    assert!(s.labels.contains(LABEL) && s.labels.contains("Work"));
}

#[test]
fn other_labels_are_untouched() {
    let mb = mailbox_with(5);
    let other = mb.add_thread(ThreadState::new(false, false).with_label("Remind me/On Saturday"));

    drain(&mb, Transition::release(true)).unwrap();

    let s = mb.thread(other).unwrap();
    assert!(!s.in_inbox && !s.unread);
    assert!(s.labels.contains("Remind me/On Saturday"));
}
