//! Tempo monotônico (jiffies)

pub mod jiffies;

pub use jiffies::{Clock, Jiffies, HZ};
