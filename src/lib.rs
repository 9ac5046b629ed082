//! Forge pgboost.
//!
//! Motor de afinidade de rank DRAM para o alocador de páginas físicas.
//! Ponto central de exportação dos módulos.

#![cfg_attr(not(test), no_std)]

// Habilitar alocação dinâmica (necessário para Vec/Box/Arc)
extern crate alloc;

// --- Infraestrutura (logs, tempo, work queues, cmdline) ---
pub mod core;

// --- Gerenciamento de Memória (alocador de referência + pgboost) ---
pub mod mm;

pub use crate::mm::pgboost::{Pgboost, PgboostAction, PgboostParams};
pub use crate::mm::{PgboostError, PgboostResult};
