pub mod gmail;
pub mod mailbox;
pub mod memory;
