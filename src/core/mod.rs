//! # Core
//!
//! Infraestrutura compartilhada pelo motor: logs, relógio em jiffies,
//! filas de trabalho diferido e parser da linha de comando.

pub mod boot;
pub mod logging;
pub mod time;
pub mod work;
