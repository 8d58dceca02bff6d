use std::fmt;

use thiserror::Error;

use crate::domain::label::{LabelHandle, ThreadHandle};

#[derive(Error, Debug)]
pub enum MailboxError {
    #[error("label {0} not found")]
    LabelNotFound(String),
    #[error("mailbox unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Imap(#[from] imap::Error),
    #[error(transparent)]
    Tls(#[from] native_tls::Error),
}

/// The calls a [`Mailbox`] offers, used to name a failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetLabel,
    FetchThreads,
    MoveToInbox,
    MoveToArchive,
    MarkRead,
    MarkUnread,
    RemoveLabel,
    CreateLabel,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::GetLabel => "get label",
            Operation::FetchThreads => "fetch threads",
            Operation::MoveToInbox => "move to inbox",
            Operation::MoveToArchive => "move to archive",
            Operation::MarkRead => "mark read",
            Operation::MarkUnread => "mark unread",
            Operation::RemoveLabel => "remove label",
            Operation::CreateLabel => "create label",
        };
        f.write_str(name)
    }
}

pub type MailboxResult<T> = Result<T, MailboxError>;

/// Label-based mailbox the snooze core runs against.
///
/// Every batch operation applies to all of `threads` as one call. Mutations
/// are assignments, so applying one twice leaves the mailbox as applying it
/// once did.
pub trait Mailbox: Send + Sync {
    fn get_label(&self, name: &str) -> MailboxResult<LabelHandle>;

    /// Returns up to `limit` threads currently tagged with `label`, skipping
    /// the first `offset`. A result shorter than `limit` means the label has
    /// no more threads past it.
    fn threads_for_label(
        &self,
        label: &LabelHandle,
        offset: usize,
        limit: usize,
    ) -> MailboxResult<Vec<ThreadHandle>>;

    fn move_to_inbox(&self, threads: &[ThreadHandle]) -> MailboxResult<()>;
    fn move_to_archive(&self, threads: &[ThreadHandle]) -> MailboxResult<()>;
    fn mark_read(&self, threads: &[ThreadHandle]) -> MailboxResult<()>;
    fn mark_unread(&self, threads: &[ThreadHandle]) -> MailboxResult<()>;
    fn remove_label(&self, label: &LabelHandle, threads: &[ThreadHandle]) -> MailboxResult<()>;

    /// Creates `name`. Returns false if the label already existed.
    fn create_label(&self, name: &str) -> MailboxResult<bool>;
}
