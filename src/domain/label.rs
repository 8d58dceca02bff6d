use std::fmt;

/// Mailbox-specific identifier of a thread. Opaque to the snooze core.
pub type ThreadId = u32;

/// A resolved label. Only valid for the invocation that resolved it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelHandle {
    pub name: String,
}

impl LabelHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for LabelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadHandle {
    pub id: ThreadId,
}

impl ThreadHandle {
    pub fn new(id: ThreadId) -> Self {
        Self { id }
    }
}

/// Joins the grouping label and a snooze label into `<group>/<name>`.
pub fn qualified_name(group: &str, name: &str) -> String {
    format!("{group}/{name}")
}
