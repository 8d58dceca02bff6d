//! In-process mailbox keeping per-thread label sets. Used for dry runs and as
//! the test double for the snooze core; individual calls can be made to fail.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::label::{LabelHandle, ThreadHandle, ThreadId};
use crate::mail::mailbox::{Mailbox, MailboxError, MailboxResult, Operation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadState {
    pub unread: bool,
    pub in_inbox: bool,
    pub labels: BTreeSet<String>,
}

impl ThreadState {
    pub fn new(unread: bool, in_inbox: bool) -> Self {
        Self {
            unread,
            in_inbox,
            labels: BTreeSet::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }
}

struct Fault {
    op: Operation,
    skip: usize,
    times: usize,
}

#[derive(Default)]
struct Inner {
    labels: BTreeSet<String>,
    threads: BTreeMap<ThreadId, ThreadState>,
    next_id: ThreadId,
    calls: Vec<Operation>,
    faults: Vec<Fault>,
}

impl Inner {
    fn record(&mut self, op: Operation) -> MailboxResult<()> {
        self.calls.push(op);
        for fault in self.faults.iter_mut().filter(|f| f.op == op) {
            if fault.skip > 0 {
                fault.skip -= 1;
            } else if fault.times > 0 {
                fault.times -= 1;
                return Err(MailboxError::Unavailable(format!("injected {op} failure")));
            }
        }
        Ok(())
    }

    fn update(&mut self, threads: &[ThreadHandle], f: impl Fn(&mut ThreadState)) {
        for t in threads {
            if let Some(state) = self.threads.get_mut(&t.id) {
                f(state);
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryMailbox {
    inner: Mutex<Inner>,
}

impl MemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_label(&self, name: impl Into<String>) {
        self.lock().labels.insert(name.into());
    }

    pub fn add_thread(&self, state: ThreadState) -> ThreadHandle {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.threads.insert(id, state);
        ThreadHandle::new(id)
    }

    /// Adds `count` threads tagged with `label` that sit outside the inbox.
    pub fn add_snoozed(&self, label: &str, count: usize, unread: bool) -> Vec<ThreadHandle> {
        (0..count)
            .map(|_| self.add_thread(ThreadState::new(unread, false).with_label(label)))
            .collect()
    }

    pub fn thread(&self, handle: ThreadHandle) -> Option<ThreadState> {
        self.lock().threads.get(&handle.id).cloned()
    }

    pub fn threads(&self) -> BTreeMap<ThreadId, ThreadState> {
        self.lock().threads.clone()
    }

    pub fn labeled(&self, label: &str) -> Vec<ThreadHandle> {
        self.lock()
            .threads
            .iter()
            .filter(|(_, s)| s.labels.contains(label))
            .map(|(id, _)| ThreadHandle::new(*id))
            .collect()
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.lock().labels.contains(name)
    }

    pub fn calls(&self) -> Vec<Operation> {
        self.lock().calls.clone()
    }

    pub fn count(&self, op: Operation) -> usize {
        self.lock().calls.iter().filter(|c| **c == op).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Lets the next `skip` calls of `op` through, then fails the following
    /// `times` calls.
    pub fn fail_after(&self, op: Operation, skip: usize, times: usize) {
        self.lock().faults.push(Fault { op, skip, times });
    }

    pub fn fail_next(&self, op: Operation, times: usize) {
        self.fail_after(op, 0, times);
    }
}

impl Mailbox for MemoryMailbox {
    fn get_label(&self, name: &str) -> MailboxResult<LabelHandle> {
        let mut inner = self.lock();
        inner.record(Operation::GetLabel)?;
        if inner.labels.contains(name) {
            Ok(LabelHandle::new(name))
        } else {
            Err(MailboxError::LabelNotFound(name.to_string()))
        }
    }

    fn threads_for_label(
        &self,
        label: &LabelHandle,
        offset: usize,
        limit: usize,
    ) -> MailboxResult<Vec<ThreadHandle>> {
        let mut inner = self.lock();
        inner.record(Operation::FetchThreads)?;
        Ok(inner
            .threads
            .iter()
            .filter(|(_, s)| s.labels.contains(&label.name))
            .skip(offset)
            .take(limit)
            .map(|(id, _)| ThreadHandle::new(*id))
            .collect())
    }

    fn move_to_inbox(&self, threads: &[ThreadHandle]) -> MailboxResult<()> {
        let mut inner = self.lock();
        inner.record(Operation::MoveToInbox)?;
        inner.update(threads, |s| s.in_inbox = true);
        Ok(())
    }

    fn move_to_archive(&self, threads: &[ThreadHandle]) -> MailboxResult<()> {
        let mut inner = self.lock();
        inner.record(Operation::MoveToArchive)?;
        inner.update(threads, |s| s.in_inbox = false);
        Ok(())
    }

    fn mark_read(&self, threads: &[ThreadHandle]) -> MailboxResult<()> {
        let mut inner = self.lock();
        inner.record(Operation::MarkRead)?;
        inner.update(threads, |s| s.unread = false);
        Ok(())
    }

    fn mark_unread(&self, threads: &[ThreadHandle]) -> MailboxResult<()> {
        let mut inner = self.lock();
        inner.record(Operation::MarkUnread)?;
        inner.update(threads, |s| s.unread = true);
        Ok(())
    }

    fn remove_label(&self, label: &LabelHandle, threads: &[ThreadHandle]) -> MailboxResult<()> {
        let mut inner = self.lock();
        inner.record(Operation::RemoveLabel)?;
        inner.update(threads, |s| {
            s.labels.remove(&label.name);
        });
        Ok(())
    }

    fn create_label(&self, name: &str) -> MailboxResult<bool> {
        let mut inner = self.lock();
        inner.record(Operation::CreateLabel)?;
        Ok(inner.labels.insert(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_pages_over_labeled_threads_only() {
        let mb = MemoryMailbox::new();
        mb.add_label("G/A");
        mb.add_snoozed("G/A", 3, false);
        mb.add_thread(ThreadState::new(false, true).with_label("G/B"));
        let label = mb.get_label("G/A").unwrap();

        assert_eq!(2, mb.threads_for_label(&label, 0, 2).unwrap().len());
        assert_eq!(1, mb.threads_for_label(&label, 2, 2).unwrap().len());
        assert!(mb.threads_for_label(&label, 3, 2).unwrap().is_empty());
    }

    #[test]
    fn injected_fault_fires_after_skipped_calls() {
        let mb = MemoryMailbox::new();
        mb.add_label("G/A");
        mb.fail_after(Operation::GetLabel, 1, 1);

        assert!(mb.get_label("G/A").is_ok());
        assert!(matches!(
            mb.get_label("G/A"),
            Err(MailboxError::Unavailable(_))
        ));
        assert!(mb.get_label("G/A").is_ok());
        assert_eq!(3, mb.count(Operation::GetLabel));
    }

    #[test]
    fn missing_label_is_not_found() {
        let mb = MemoryMailbox::new();
        assert!(matches!(
            mb.get_label("nope"),
            Err(MailboxError::LabelNotFound(_))
        ));
    }

    #[test]
    fn create_label_reports_existing() {
        let mb = MemoryMailbox::new();
        assert!(mb.create_label("G").unwrap());
        assert!(!mb.create_label("G").unwrap());
        assert!(mb.has_label("G"));
    }
}
