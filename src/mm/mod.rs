//! # Memory Management Subsystem (MM)
//!
//! Alocador de páginas físicas de referência e o motor pgboost que opera
//! sobre ele.
//!
//! ## 🏗️ Arquitetura dos Módulos
//!
//! | Módulo | Responsabilidade |
//! |--------|------------------|
//! | `config` | Constantes de página, ordens, pageblocks e limiares do pgboost |
//! | `error` | `PgboostError` / `PgboostResult` |
//! | `pmm` | Span e estatísticas da zona |
//! | `alloc` | Buddy allocator: free lists por classe, pcp, hooks |
//! | `reclaim` | Shrinkers e pressão de memória |
//! | `pgboost` | Reordenação das free lists por rank DRAM |
//!
//! ---------------------------------------------------------------------
//! MODELO DE LOCKING
//! ---------------------------------------------------------------------
//!
//! ```text
//! pcp lock (por CPU) ──▶ zone lock (FreeArea)
//! side cache lock      (nunca aninhado com o zone lock)
//! hooks / shrinkers    (chamados sem o zone lock)
//! ```
//!
//! - O zone lock é o único ponto de serialização das free lists.
//! - O pgboost segura o zone lock por ordem/lote, nunca por um passe
//!   inteiro.
//! - Hooks executam inline em todo free/alloc e por isso não podem
//!   adquirir o zone lock.
//!
//! ---------------------------------------------------------------------
//! INICIALIZAÇÃO TÍPICA
//! ---------------------------------------------------------------------
//!
//! ```text
//! BuddyZone::new(span, cpus)      zona com tudo ocupado
//! zone.online_pages(start, end)   memória entra nas free lists
//! Pgboost::init(zone, mc, wq, ..) motor ativo (ou erro, fail closed)
//! ```

pub mod alloc;
pub mod config;
pub mod error;
pub mod pgboost;
pub mod pmm;
pub mod reclaim;

#[cfg(test)]
mod test;

// Re-exports para conveniência
pub use error::{PgboostError, PgboostResult};
