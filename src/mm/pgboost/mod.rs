//! # pgboost - afinidade de rank DRAM nas free lists
//!
//! Em sistemas dual-rank, alocações consecutivas vindas do mesmo rank
//! físico têm melhor throughput. O pgboost reordena as free lists do
//! alocador de páginas para que o próximo bloco entregue venha,
//! preferencialmente, do rank "favorecido".
//!
//! ## 🏗️ Componentes
//!
//! | Módulo | Papel |
//! |--------|-------|
//! | `rank` | mapa PFN → rank, teste de rank favorecido |
//! | `decision` | `next_pgboost_action`: vale reordenar? para qual rank? |
//! | `rebalance` | `change_migrate_type`: Unmovable/Reclaimable → Movable |
//! | `reorder` | `do_pgboost_list_reordering`: favorecidos na cabeça/cauda |
//! | `sidecache` | segura blocos pequenos do rank errado + shrinker |
//! | `trigger` | trabalho periódico, trabalho por eventos, `kick`, cooldowns |
//! | `status` | dump textual |
//!
//! ## Fluxo
//!
//! ```text
//! trigger → decisão (scan sob zone lock) → rebalance → reorder → side cache
//! ```
//!
//! ## Concorrência
//!
//! O zone lock do alocador é o único ponto de serialização das free lists e
//! é mantido apenas por ordem/lote, nunca durante um passe inteiro. O estado
//! escalar do motor (rank favorecido, violações, passe em andamento, pronto)
//! são atômicos deste contexto. Um passe por vez: `in_progress` funciona
//! como trava não bloqueante.
//!
//! ## Inicialização
//!
//! `Pgboost::init` falha fechado: rank count diferente de 2, mais de uma
//! zona populada ou configuração inválida retornam erro e nenhum motor é
//! criado.

pub mod adapter;
pub mod config;
pub mod decision;
pub mod params;
pub mod rank;
pub mod rebalance;
pub mod reorder;
pub mod sidecache;
pub mod stats;
pub mod status;
pub mod trigger;

use alloc::sync::{Arc, Weak};
use core::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use spin::Mutex;

use crate::core::work::{DelayedWork, WorkQueue};
use crate::mm::alloc::{Gfp, HookId, PageObserver};
use crate::mm::config::order_pages;
use crate::mm::error::{PgboostError, PgboostResult};

pub use adapter::{MemoryController, StaticMemoryController, ZoneAdapter};
pub use config::PgboostConfig;
pub use decision::{PgboostAction, RankScan};
pub use params::PgboostParams;
pub use rank::{RankId, RankInfo, RankMap};
pub use sidecache::SideCache;
pub use stats::{PgboostStats, StatsSnapshot};
pub use trigger::PassKind;

use sidecache::SideCacheShrinker;
use trigger::Cooldown;

/// Sentinela de "nenhum rank favorecido" em `favored`
const NO_RANK: u8 = u8::MAX;

#[derive(Default)]
struct Registrations {
    observer: Option<HookId>,
    shrinker: Option<HookId>,
}

/// Contexto do motor. Um por zona.
pub struct Pgboost<A: ZoneAdapter> {
    zone: Arc<A>,
    map: RankMap,
    config: PgboostConfig,
    params: PgboostParams,
    stats: PgboostStats,
    cache: SideCache,

    wq: Arc<WorkQueue>,
    periodic_work: Arc<DelayedWork>,
    event_work: Arc<DelayedWork>,
    full_cooldown: Cooldown,
    light_cooldown: Cooldown,
    last_pages_freed: AtomicU64,

    favored: AtomicU8,
    violations: AtomicU64,
    in_progress: AtomicBool,
    ready: AtomicBool,

    registrations: Mutex<Registrations>,
}

impl<A: ZoneAdapter> Pgboost<A> {
    /// Cria e ativa o motor sobre `zone`.
    ///
    /// Registra os hooks de free/alloc e o shrinker do side cache e agenda
    /// o trabalho periódico (se habilitado).
    pub fn init(
        zone: Arc<A>,
        mc: &dyn MemoryController,
        wq: Arc<WorkQueue>,
        config: PgboostConfig,
        params: PgboostParams,
    ) -> PgboostResult<Arc<Self>> {
        if let Err(e) = config.validate() {
            crate::kerror!("(PGB) init abortado: configuração inválida: {}", e);
            return Err(e);
        }

        let zones = zone.nr_populated_zones();
        if zones != 1 {
            crate::kerror!("(PGB) init abortado: {} zonas populadas", zones);
            return Err(PgboostError::MultiZone);
        }

        let span = zone.zone_span();
        let map = match RankMap::from_controller(span.start_pfn, mc) {
            Ok(map) => map,
            Err(e) => {
                crate::kerror!("(PGB) init abortado: {} (ranks={})", e, mc.nr_ranks());
                return Err(e);
            }
        };
        let (_, ranks_end) = map.span();
        if ranks_end < span.end_pfn {
            crate::kwarn!(
                "(PGB) ranks cobrem até {:#x}, zona termina em {:#x}",
                ranks_end,
                span.end_pfn
            );
        }

        let cache = match SideCache::new() {
            Ok(cache) => cache,
            Err(e) => {
                crate::kerror!("(PGB) init abortado: {}", e);
                return Err(e);
            }
        };

        let engine = Arc::new_cyclic(|weak: &Weak<Self>| {
            let periodic = weak.clone();
            let event = weak.clone();
            Self {
                last_pages_freed: AtomicU64::new(zone.pages_freed()),
                zone,
                map,
                config,
                params,
                stats: PgboostStats::default(),
                cache,
                wq,
                periodic_work: DelayedWork::new("pgboost-periodic", move || {
                    if let Some(engine) = periodic.upgrade() {
                        engine.periodic_tick();
                    }
                }),
                event_work: DelayedWork::new("pgboost-event", move || {
                    if let Some(engine) = event.upgrade() {
                        engine.event_tick();
                    }
                }),
                full_cooldown: Cooldown::new(),
                light_cooldown: Cooldown::new(),
                favored: AtomicU8::new(NO_RANK),
                violations: AtomicU64::new(0),
                in_progress: AtomicBool::new(false),
                ready: AtomicBool::new(false),
                registrations: Mutex::new(Registrations::default()),
            }
        });

        let observer = engine.zone.register_observer(Arc::new(PgboostHook {
            engine: Arc::downgrade(&engine),
        }));
        let shrinker = engine
            .zone
            .register_shrinker(Arc::new(SideCacheShrinker::new(Arc::downgrade(&engine))));
        {
            let mut regs = engine.registrations.lock();
            regs.observer = Some(observer);
            regs.shrinker = Some(shrinker);
        }

        engine.ready.store(true, Ordering::Release);
        engine.arm_periodic();

        crate::kinfo!(
            "(PGB) ativo: rank0=[{:#x},{:#x}) rank1=[{:#x},{:#x}) piso={} páginas",
            engine.map.rank(0).start_pfn,
            engine.map.rank(0).end_pfn,
            engine.map.rank(1).start_pfn,
            engine.map.rank(1).end_pfn,
            engine.config.least_total_pgs
        );
        Ok(engine)
    }

    /// Desativa o motor: cancela e espera os trabalhos, devolve o side
    /// cache e remove hooks e shrinker. Um passe em andamento termina.
    pub fn shutdown(&self) {
        if !self.ready.swap(false, Ordering::AcqRel) {
            return;
        }

        self.wq.cancel_work_sync(&self.periodic_work);
        self.wq.cancel_work_sync(&self.event_work);

        let regs = core::mem::take(&mut *self.registrations.lock());
        if let Some(id) = regs.shrinker {
            self.zone.unregister_shrinker(id);
        }
        if let Some(id) = regs.observer {
            self.zone.unregister_observer(id);
        }

        // Espera um passe manual em voo antes de esvaziar o cache
        while self.in_progress.load(Ordering::Acquire) {
            core::hint::spin_loop();
        }
        let released = self.cache.release(&*self.zone, u64::MAX, &self.stats);

        crate::kinfo!("(PGB) desligado ({} páginas devolvidas)", released);
    }

    // =========================================================================
    // ACESSORES
    // =========================================================================

    pub fn zone(&self) -> &A {
        &self.zone
    }

    pub fn rank_map(&self) -> &RankMap {
        &self.map
    }

    pub fn config(&self) -> &PgboostConfig {
        &self.config
    }

    pub fn params(&self) -> &PgboostParams {
        &self.params
    }

    pub fn stats(&self) -> &PgboostStats {
        &self.stats
    }

    pub fn side_cache(&self) -> &SideCache {
        &self.cache
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Rank favorecido pelo último passe
    pub fn favored_rank(&self) -> Option<RankId> {
        match self.favored.load(Ordering::Acquire) {
            NO_RANK => None,
            rank => Some(rank as RankId),
        }
    }

    /// Páginas liberadas fora do rank favorecido desde o último passe
    pub fn violations(&self) -> u64 {
        self.violations.load(Ordering::Relaxed)
    }

    pub(crate) fn set_favored(&self, rank: RankId) {
        self.favored.store(rank as u8, Ordering::Release);
    }

    pub(crate) fn reset_violations(&self) {
        self.violations.store(0, Ordering::Relaxed);
    }

    /// Trava de passe: `None` se outro passe já está rodando.
    pub(crate) fn begin_pass(&self) -> Option<PassGuard<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard {
                flag: &self.in_progress,
            })
    }

    // =========================================================================
    // PARÂMETROS
    // =========================================================================

    /// Grava um parâmetro; `"kick"` dispara um passe manual.
    pub fn store_param(&self, name: &str, value: &str) -> PgboostResult<()> {
        if name == "kick" {
            let opcode = value
                .trim()
                .parse::<u32>()
                .map_err(|_| PgboostError::InvalidParameter)?;
            let ran = self.kick(opcode)?;
            crate::kdebug!("(PGB) kick {}: passe executado={}", opcode, ran);
            return Ok(());
        }

        self.params.store(name, value)?;
        if name == "periodic_enable" || name == "interval" {
            self.arm_periodic();
        }
        Ok(())
    }

    pub fn show_param(&self, name: &str) -> PgboostResult<u64> {
        self.params.show(name)
    }

    // =========================================================================
    // TELEMETRIA
    // =========================================================================

    fn on_free(&self, pfn: u64, order: usize) {
        if !self.is_ready() || self.in_progress() {
            return;
        }
        let Some(rank) = self.favored_rank() else {
            return;
        };
        if self.map.in_favored_rank(pfn, rank == 1) {
            return;
        }

        let pages = order_pages(order);
        let total = self.violations.fetch_add(pages, Ordering::Relaxed) + pages;
        PgboostStats::add(&self.stats.violations, pages);

        if total >= self.config.least_total_pgs
            && self.params.event_enabled()
            && self.wq.queue_work(&self.event_work)
        {
            PgboostStats::inc(&self.stats.event_queued);
            crate::ktrace!("(PGB) {} violações: passe leve agendado", total);
        }
    }

    fn on_alloc(&self, pfn: u64) {
        let Some(rank) = self.favored_rank() else {
            return;
        };
        if self.map.in_favored_rank(pfn, rank == 1) {
            PgboostStats::inc(&self.stats.alloc_hits);
        } else {
            PgboostStats::inc(&self.stats.alloc_misses);
        }
    }
}

/// Limpa `in_progress` ao sair do escopo do passe.
pub(crate) struct PassGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Hook de free/alloc registrado no alocador.
struct PgboostHook<A: ZoneAdapter> {
    engine: Weak<Pgboost<A>>,
}

impl<A: ZoneAdapter> PageObserver for PgboostHook<A> {
    fn on_page_free(&self, pfn: u64, order: usize) {
        if let Some(engine) = self.engine.upgrade() {
            engine.on_free(pfn, order);
        }
    }

    fn on_page_alloc(&self, pfn: u64, _order: usize, _gfp: Gfp) {
        if let Some(engine) = self.engine.upgrade() {
            engine.on_alloc(pfn);
        }
    }
}
