//! # Boot
//!
//! Parâmetros de boot (linha de comando do kernel).

pub mod cmdline;

pub use cmdline::CommandLine;
