pub mod config;
pub mod recurrence;
pub mod retry;
pub mod webhook;
