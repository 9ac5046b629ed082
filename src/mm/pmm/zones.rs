//! # Zonas de Memória Física
//!
//! Extensão e estatísticas de uma zona gerenciada pelo buddy.
//!
//! ## 🎯 Propósito
//!
//! O pgboost só opera em sistemas com **uma** zona populada: a partição em
//! ranks é feita sobre o intervalo de PFNs dessa zona. Configurações com
//! múltiplas zonas fazem o motor recusar a inicialização.

use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

// =============================================================================
// EXTENSÃO DA ZONA
// =============================================================================

/// Intervalo de PFNs `[start_pfn, end_pfn)` de uma zona
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneSpan {
    pub start_pfn: u64,
    pub end_pfn: u64,
}

impl ZoneSpan {
    pub const fn new(start_pfn: u64, end_pfn: u64) -> Self {
        Self { start_pfn, end_pfn }
    }

    /// Verifica se o frame pertence à zona
    pub const fn contains(&self, pfn: u64) -> bool {
        pfn >= self.start_pfn && pfn < self.end_pfn
    }

    /// Total de páginas da zona
    pub const fn nr_pages(&self) -> u64 {
        self.end_pfn - self.start_pfn
    }
}

// =============================================================================
// ESTATÍSTICAS POR ZONA
// =============================================================================

/// Estatísticas de uma zona de memória
#[repr(C, align(64))]
pub struct ZoneStats {
    /// Blocos entregues a chamadores
    pub alloc_count: AtomicUsize,
    /// Blocos devolvidos por chamadores
    pub free_count: AtomicUsize,
    /// Páginas liberadas desde o boot (contador monotônico)
    pub pages_freed: AtomicU64,
    /// Alocações atendidas por outra classe de migração
    pub fallback_count: AtomicUsize,
    /// Alocações que falharam
    pub failed_count: AtomicUsize,
}

impl ZoneStats {
    pub const fn new() -> Self {
        Self {
            alloc_count: AtomicUsize::new(0),
            free_count: AtomicUsize::new(0),
            pages_freed: AtomicU64::new(0),
            fallback_count: AtomicUsize::new(0),
            failed_count: AtomicUsize::new(0),
        }
    }

    /// Registra alocação
    pub fn record_alloc(&self) {
        self.alloc_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Registra liberação de `pages` páginas
    pub fn record_free(&self, pages: u64) {
        self.free_count.fetch_add(1, Ordering::Relaxed);
        self.pages_freed.fetch_add(pages, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallback_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pages_freed(&self) -> u64 {
        self.pages_freed.load(Ordering::Relaxed)
    }
}

impl Default for ZoneStats {
    fn default() -> Self {
        Self::new()
    }
}
