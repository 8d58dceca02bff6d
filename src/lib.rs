//! Gmail snoozing: threads tagged with a snooze label are taken out of the
//! inbox and brought back when that label's release time comes round.

pub mod auth;
pub mod config;
pub mod daemon;
pub mod domain;
pub mod error;
pub mod mail;
pub mod snooze;
