use thiserror::Error;

use crate::mail::mailbox::{MailboxError, Operation};

#[derive(Error, Debug)]
pub enum SnoozeError {
    /// Label lookup kept failing; the last lookup error is the source.
    #[error("could not resolve label {label} after {attempts} attempts")]
    Resolution {
        label: String,
        attempts: u32,
        #[source]
        source: MailboxError,
    },
    #[error("{op} failed on label {label}")]
    MailboxOperation {
        op: Operation,
        label: String,
        #[source]
        source: MailboxError,
    },
}

impl SnoozeError {
    pub fn label(&self) -> &str {
        match self {
            SnoozeError::Resolution { label, .. } | SnoozeError::MailboxOperation { label, .. } => {
                label
            }
        }
    }

    /// This error followed by each of its causes, `: `-separated.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str(": ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}
