//! Periodic background tasks run by the daemon.

pub mod history_sync;
