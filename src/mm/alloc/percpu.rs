//! # Per-CPU Page Caches (pcp)
//!
//! Caches locais por CPU de páginas de ordem 0 recém-liberadas.
//!
//! ## 🎯 Propósito
//!
//! Liberar uma página direto no buddy exige o zone lock. O cache por CPU
//! absorve a maioria das liberações de ordem 0 sem tocar no zone lock:
//!
//! 1. free(order 0) → empilha no cache local
//! 2. Se cheio (`PCP_HIGH`) → devolve `PCP_BATCH` páginas ao buddy
//! 3. alloc(order 0) → tenta o cache local antes do buddy
//!
//! Páginas paradas aqui ficam invisíveis para as free lists; o pgboost força
//! um `drain_all` antes do primeiro passe de cada ciclo completo.

use alloc::vec::Vec;

use spin::Mutex;

use crate::mm::config::{PCP_BATCH, PCP_HIGH};

/// Cache local de uma CPU (pilha LIFO de PFNs)
#[derive(Default)]
pub struct PcpList {
    pages: Vec<u64>,
    hits: u64,
    misses: u64,
}

impl PcpList {
    /// Tenta obter página do cache local
    #[inline]
    pub fn pop(&mut self) -> Option<u64> {
        match self.pages.pop() {
            Some(pfn) => {
                self.hits += 1;
                Some(pfn)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Devolve página ao cache local
    #[inline]
    pub fn push(&mut self, pfn: u64) {
        self.pages.push(pfn);
    }

    /// Verifica se precisa devolver um lote ao buddy
    #[inline]
    pub fn needs_flush(&self) -> bool {
        self.pages.len() >= PCP_HIGH
    }

    /// Remove as `PCP_BATCH` páginas mais antigas
    pub fn flush_batch(&mut self) -> Vec<u64> {
        let n = core::cmp::min(PCP_BATCH, self.pages.len());
        self.pages.drain(..n).collect()
    }

    /// Esvazia o cache
    pub fn take_all(&mut self) -> Vec<u64> {
        core::mem::take(&mut self.pages)
    }

    /// Página parada neste cache
    pub fn contains(&self, pfn: u64) -> bool {
        self.pages.contains(&pfn)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Retorna estatísticas (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

/// Conjunto de caches, um por CPU
pub struct PerCpuPages {
    cpus: Vec<Mutex<PcpList>>,
}

impl PerCpuPages {
    pub fn new(nr_cpus: usize) -> Self {
        let mut cpus = Vec::with_capacity(nr_cpus);
        cpus.resize_with(nr_cpus.max(1), || Mutex::new(PcpList::default()));
        Self { cpus }
    }

    pub fn nr_cpus(&self) -> usize {
        self.cpus.len()
    }

    /// Cache da CPU `cpu` (índices fora do range caem na CPU 0)
    pub fn cpu(&self, cpu: usize) -> &Mutex<PcpList> {
        self.cpus.get(cpu).unwrap_or(&self.cpus[0])
    }

    /// Total de páginas paradas em todos os caches
    pub fn total(&self) -> usize {
        self.cpus.iter().map(|c| c.lock().len()).sum()
    }
}
