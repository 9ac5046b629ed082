//! # Side Cache (estratégia "hold small pages")
//!
//! Depois de um passe com `hold_small`, blocos pequenos do rank NÃO
//! favorecido são alocados e segurados aqui, fora das free lists, para não
//! voltarem a poluir a cabeça das listas recém-reordenadas.
//!
//! ## Ciclo de vida
//!
//! 1. `collect`: até `surplus[order]` alocações por ordem pelo caminho
//!    normal do alocador. Um bloco do rank favorecido é devolvido na hora
//!    (mismatch) e encerra a ordem; falha de alocação também.
//! 2. `release`: devolve os blocos ao alocador. Chamado antes de todo
//!    passe, no shutdown e pelo shrinker sob pressão de memória.
//!
//! Mismatches e blocos liberados voltam por `free_pages_direct`: direto
//! para as free lists, sem passar pelo cache por CPU nem pelos hooks.
//!
//! O lock do cache nunca é mantido durante chamadas ao alocador.

use alloc::sync::Weak;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

use spin::Mutex;

use super::adapter::ZoneAdapter;
use super::rank::RankMap;
use super::stats::PgboostStats;
use super::Pgboost;
use crate::mm::alloc::Gfp;
use crate::mm::config::{order_pages, MAX_ORDER};
use crate::mm::error::{PgboostError, PgboostResult};
use crate::mm::reclaim::Shrinker;

/// Política das alocações do cache: movable, sem reclaim, sem aviso.
pub const COLLECT_GFP: Gfp = Gfp::MOVABLE.union(Gfp::NOWARN).union(Gfp::NORETRY);

/// Capacidade inicial de cada lista por ordem
const INITIAL_CAPACITY: usize = 16;

pub struct SideCache {
    lists: Mutex<Vec<Vec<u64>>>,
    held: AtomicU64,
}

impl SideCache {
    /// Aloca a contabilidade do cache.
    ///
    /// Falha com `OutOfMemory` se o heap não comporta as listas.
    pub fn new() -> PgboostResult<Self> {
        let mut lists = Vec::new();
        lists
            .try_reserve_exact(MAX_ORDER)
            .map_err(|_| PgboostError::OutOfMemory)?;
        for _ in 0..MAX_ORDER {
            let mut list = Vec::new();
            list.try_reserve(INITIAL_CAPACITY)
                .map_err(|_| PgboostError::OutOfMemory)?;
            lists.push(list);
        }

        Ok(Self {
            lists: Mutex::new(lists),
            held: AtomicU64::new(0),
        })
    }

    /// Páginas seguradas agora
    pub fn held_pages(&self) -> u64 {
        self.held.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.held_pages() == 0
    }

    /// Blocos segurados por ordem
    pub fn occupancy(&self) -> [usize; MAX_ORDER] {
        let lists = self.lists.lock();
        core::array::from_fn(|order| lists[order].len())
    }

    /// Aloca até `surplus[order]` blocos do rank não favorecido por ordem.
    /// Retorna as páginas coletadas.
    pub fn collect<A: ZoneAdapter + ?Sized>(
        &self,
        zone: &A,
        map: &RankMap,
        surplus: &[u64; MAX_ORDER],
        favor_rank1: bool,
        stats: &PgboostStats,
    ) -> u64 {
        let mut collected = 0;

        'orders: for (order, &want) in surplus.iter().enumerate() {
            for _ in 0..want {
                let Some(pfn) = zone.alloc_pages(order, COLLECT_GFP) else {
                    break;
                };

                if map.in_favored_rank(pfn, favor_rank1) {
                    zone.free_pages_direct(pfn, order);
                    PgboostStats::inc(&stats.cache_mismatches);
                    break;
                }

                let stored = {
                    let mut lists = self.lists.lock();
                    if lists[order].try_reserve(1).is_ok() {
                        lists[order].push(pfn);
                        self.held.fetch_add(order_pages(order), Ordering::AcqRel);
                        true
                    } else {
                        false
                    }
                };
                if !stored {
                    crate::kwarn!("(PGB) side cache: sem memória para contabilidade");
                    zone.free_pages_direct(pfn, order);
                    break 'orders;
                }

                collected += order_pages(order);
                PgboostStats::inc(&stats.cache_collected);
            }
        }

        if collected > 0 {
            crate::kdebug!("(PGB) side cache: {} páginas coletadas", collected);
        }
        collected
    }

    /// Devolve ao alocador até `max_pages` páginas, ordens menores primeiro.
    /// Retorna as páginas devolvidas.
    pub fn release<A: ZoneAdapter + ?Sized>(
        &self,
        zone: &A,
        max_pages: u64,
        stats: &PgboostStats,
    ) -> u64 {
        if self.is_empty() {
            return 0;
        }

        let mut detached: [Vec<u64>; MAX_ORDER] = core::array::from_fn(|_| Vec::new());
        let mut taken = 0u64;
        {
            let mut lists = self.lists.lock();
            for (order, list) in lists.iter_mut().enumerate() {
                let pages = order_pages(order);
                let budget = (max_pages - taken) / pages;
                let count = core::cmp::min(list.len() as u64, budget) as usize;
                if count == 0 {
                    continue;
                }
                detached[order] = list.split_off(list.len() - count);
                taken += count as u64 * pages;
            }
            self.held.fetch_sub(taken, Ordering::AcqRel);
        }

        for (order, blocks) in detached.iter().enumerate() {
            for &pfn in blocks {
                zone.free_pages_direct(pfn, order);
                PgboostStats::inc(&stats.cache_released);
            }
        }

        if taken > 0 {
            crate::kdebug!("(PGB) side cache: {} páginas devolvidas", taken);
        }
        taken
    }
}

/// Shrinker que esvazia o side cache sob pressão de memória.
pub struct SideCacheShrinker<A: ZoneAdapter> {
    engine: Weak<Pgboost<A>>,
}

impl<A: ZoneAdapter> SideCacheShrinker<A> {
    pub fn new(engine: Weak<Pgboost<A>>) -> Self {
        Self { engine }
    }
}

impl<A: ZoneAdapter> Shrinker for SideCacheShrinker<A> {
    fn name(&self) -> &'static str {
        "pgboost-sidecache"
    }

    fn count_objects(&self) -> usize {
        self.engine
            .upgrade()
            .map_or(0, |engine| engine.side_cache().held_pages() as usize)
    }

    fn scan_objects(&self, nr_to_scan: usize) -> usize {
        let Some(engine) = self.engine.upgrade() else {
            return 0;
        };
        engine
            .side_cache()
            .release(engine.zone(), nr_to_scan as u64, engine.stats()) as usize
    }
}
