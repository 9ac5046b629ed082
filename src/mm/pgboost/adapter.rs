//! # Interfaces consumidas pelo pgboost
//!
//! O motor não conhece o alocador concreto. Tudo o que ele faz passa por
//! `ZoneAdapter`, que precisa dar as mesmas garantias de atomicidade do
//! buddy de referência:
//!
//! - toda leitura ou mutação de free list acontece com o zone lock
//!   (`free_area()`) adquirido;
//! - hooks de free/alloc são síncronos, chamados sem o zone lock;
//! - `alloc_pages` segue o caminho normal do alocador (caches por CPU,
//!   hooks);
//! - `free_pages_direct` devolve direto às free lists, sem cache por CPU e
//!   sem hooks: putback do próprio motor não é violação nem burst de frees.

use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

use crate::mm::alloc::{BuddyZone, FreeArea, Gfp, HookId, PageObserver};
use crate::mm::pmm::zones::ZoneSpan;
use crate::mm::reclaim::Shrinker;

/// Consulta ao controlador de memória (feita uma vez no init).
pub trait MemoryController {
    /// Quantos ranks a plataforma reporta.
    fn nr_ranks(&self) -> usize;

    /// Tamanho em bytes do rank `rank`.
    fn rank_size(&self, rank: usize) -> u64;
}

/// Controlador com tamanhos fixos (device tree, linha de comando, testes).
#[derive(Clone, Debug, Default)]
pub struct StaticMemoryController {
    rank_bytes: Vec<u64>,
}

impl StaticMemoryController {
    pub fn new(rank_bytes: &[u64]) -> Self {
        Self {
            rank_bytes: rank_bytes.to_vec(),
        }
    }
}

impl MemoryController for StaticMemoryController {
    fn nr_ranks(&self) -> usize {
        self.rank_bytes.len()
    }

    fn rank_size(&self, rank: usize) -> u64 {
        self.rank_bytes.get(rank).copied().unwrap_or(0)
    }
}

/// Superfície do alocador usada pelo motor.
pub trait ZoneAdapter: Send + Sync + 'static {
    /// PFNs cobertos pela zona.
    fn zone_span(&self) -> ZoneSpan;

    /// Zonas populadas no sistema.
    fn nr_populated_zones(&self) -> usize;

    /// Zone lock + free lists.
    fn free_area(&self) -> &Mutex<FreeArea>;

    /// Devolve os caches por CPU às free lists.
    fn drain_all_pages(&self);

    /// Aloca `2^order` páginas pelo caminho normal.
    fn alloc_pages(&self, order: usize, gfp: Gfp) -> Option<u64>;

    /// Devolve `2^order` páginas retidas pelo motor direto às free lists.
    fn free_pages_direct(&self, pfn: u64, order: usize);

    /// Páginas liberadas desde o boot (monotônico).
    fn pages_freed(&self) -> u64;

    fn register_observer(&self, observer: Arc<dyn PageObserver>) -> HookId;

    fn unregister_observer(&self, id: HookId);

    fn register_shrinker(&self, shrinker: Arc<dyn Shrinker>) -> HookId;

    fn unregister_shrinker(&self, id: HookId);
}

impl ZoneAdapter for BuddyZone {
    fn zone_span(&self) -> ZoneSpan {
        self.span()
    }

    fn nr_populated_zones(&self) -> usize {
        self.nr_zones()
    }

    fn free_area(&self) -> &Mutex<FreeArea> {
        self.area()
    }

    fn drain_all_pages(&self) {
        BuddyZone::drain_all_pages(self);
    }

    fn alloc_pages(&self, order: usize, gfp: Gfp) -> Option<u64> {
        self.alloc_pages_on(0, order, gfp)
    }

    fn free_pages_direct(&self, pfn: u64, order: usize) {
        if let Err(e) = BuddyZone::free_pages_direct(self, pfn, order) {
            crate::kwarn!("(PGB) free pfn={:#x} ordem={} falhou: {}", pfn, order, e);
        }
    }

    fn pages_freed(&self) -> u64 {
        self.stats().pages_freed()
    }

    fn register_observer(&self, observer: Arc<dyn PageObserver>) -> HookId {
        BuddyZone::register_observer(self, observer)
    }

    fn unregister_observer(&self, id: HookId) {
        BuddyZone::unregister_observer(self, id);
    }

    fn register_shrinker(&self, shrinker: Arc<dyn Shrinker>) -> HookId {
        BuddyZone::register_shrinker(self, shrinker)
    }

    fn unregister_shrinker(&self, id: HookId) {
        BuddyZone::unregister_shrinker(self, id);
    }
}
