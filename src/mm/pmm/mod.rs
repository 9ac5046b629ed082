//! # Physical Memory (zonas)

pub mod zones;

pub use zones::{ZoneSpan, ZoneStats};
