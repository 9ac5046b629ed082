//! Trabalho diferido (work queues)

pub mod workqueue;

pub use workqueue::{DelayedWork, WorkQueue};
