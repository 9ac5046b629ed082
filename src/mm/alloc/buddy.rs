//! # Buddy Zone - alocador de páginas físicas de referência
//!
//! Gerencia os PFNs de uma zona em blocos de potência de 2, segregados por
//! classe de migração. É o alocador sobre o qual o pgboost opera quando o
//! kernel hospedeiro não fornece o seu.
//!
//! - Minimiza fragmentação externa via coalescência (buddy = idx XOR 2^order).
//! - Ordem 0 passa pelos caches por CPU (`percpu`).
//! - Pageblocks carregam a tag de classe; blocos liberados voltam para a
//!   lista da classe do seu pageblock.
//! - Hooks síncronos de free/alloc e shrinkers em falha de alocação.
//!
//! ## Locking
//!
//! `area` é o zone lock: toda mutação de free list acontece com ele
//! adquirido. Hooks e shrinkers são chamados SEM o zone lock.

use alloc::sync::Arc;

use spin::Mutex;

use super::freearea::{FreeArea, ListPosition};
use super::gfp::{Gfp, MigrateType};
use super::hooks::{HookId, HookList, PageObserver};
use super::percpu::PerCpuPages;
use crate::mm::config::{is_aligned, order_pages, MAX_ORDER, PAGEBLOCK_ORDER};
use crate::mm::error::{PgboostError, PgboostResult};
use crate::mm::pmm::zones::{ZoneSpan, ZoneStats};
use crate::mm::reclaim::{self, Shrinker, ShrinkerList};

/// Zona gerenciada por buddy allocator
pub struct BuddyZone {
    area: Mutex<FreeArea>,
    span: ZoneSpan,
    pcp: PerCpuPages,
    stats: ZoneStats,
    observers: HookList<dyn PageObserver>,
    shrinkers: ShrinkerList,
    nr_zones: usize,
}

impl BuddyZone {
    /// Cria a zona `span` com todas as páginas ocupadas.
    ///
    /// Páginas entram nas free lists via `free_pages_on` ou `online_pages`.
    /// `span.start_pfn` deve ser alinhado à maior ordem.
    pub fn new(span: ZoneSpan, nr_cpus: usize) -> Self {
        debug_assert!(is_aligned(span.start_pfn, order_pages(MAX_ORDER - 1)));
        Self {
            area: Mutex::new(FreeArea::new(span, MigrateType::Movable)),
            span,
            pcp: PerCpuPages::new(nr_cpus),
            stats: ZoneStats::new(),
            observers: HookList::new(),
            shrinkers: ShrinkerList::new(),
            nr_zones: 1,
        }
    }

    /// Declara quantas zonas populadas o sistema tem (padrão 1).
    pub fn with_nr_zones(mut self, nr_zones: usize) -> Self {
        self.nr_zones = nr_zones;
        self
    }

    /// Coloca `[start, end)` nas free lists em blocos da maior ordem possível,
    /// sem notificar hooks (memória entrando no sistema).
    pub fn online_pages(&self, start: u64, end: u64) -> PgboostResult<()> {
        if start < self.span.start_pfn || end > self.span.end_pfn || start > end {
            return Err(PgboostError::InvalidAddress);
        }

        let mut area = self.area.lock();
        let mut pfn = start;
        while pfn < end {
            let mut order = MAX_ORDER - 1;
            while order > 0
                && (!is_aligned(pfn - self.span.start_pfn, order_pages(order))
                    || pfn + order_pages(order) > end)
            {
                order -= 1;
            }
            Self::free_one(&mut area, self.span, pfn, order);
            pfn += order_pages(order);
        }
        Ok(())
    }

    pub fn span(&self) -> ZoneSpan {
        self.span
    }

    pub fn nr_zones(&self) -> usize {
        self.nr_zones
    }

    pub fn stats(&self) -> &ZoneStats {
        &self.stats
    }

    pub fn pcp(&self) -> &PerCpuPages {
        &self.pcp
    }

    /// Zone lock
    pub fn area(&self) -> &Mutex<FreeArea> {
        &self.area
    }

    /// Páginas livres nas free lists (exclui caches por CPU)
    pub fn nr_free_pages(&self) -> u64 {
        self.area.lock().nr_free_pages()
    }

    // =========================================================================
    // HOOKS
    // =========================================================================

    pub fn register_observer(&self, observer: Arc<dyn PageObserver>) -> HookId {
        self.observers.register(observer)
    }

    pub fn unregister_observer(&self, id: HookId) -> bool {
        self.observers.unregister(id)
    }

    pub fn register_shrinker(&self, shrinker: Arc<dyn Shrinker>) -> HookId {
        self.shrinkers.register(shrinker)
    }

    pub fn unregister_shrinker(&self, id: HookId) -> bool {
        self.shrinkers.unregister(id)
    }

    pub fn shrinkers(&self) -> &ShrinkerList {
        &self.shrinkers
    }

    // =========================================================================
    // ALOCAÇÃO
    // =========================================================================

    /// Aloca um bloco de `2^order` páginas na CPU `cpu`.
    pub fn alloc_pages_on(&self, cpu: usize, order: usize, gfp: Gfp) -> Option<u64> {
        if order >= MAX_ORDER {
            return None;
        }

        let mut pfn = self.try_alloc(cpu, order, gfp);

        if pfn.is_none() && gfp.contains(Gfp::DIRECT_RECLAIM) && !self.shrinkers.is_empty() {
            let target = reclaim::reclaim_target(self.nr_free_pages(), order);
            let freed = self.shrinkers.shrink(target);
            crate::kdebug!("(Buddy) falha ordem={} shrinkers liberaram {} páginas", order, freed);
            if freed > 0 && !gfp.contains(Gfp::NORETRY) {
                pfn = self.try_alloc(cpu, order, gfp);
            }
        }

        match pfn {
            Some(pfn) => {
                self.stats.record_alloc();
                self.observers.for_each(|o| o.on_page_alloc(pfn, order, gfp));
            }
            None => {
                self.stats.record_failure();
                if !gfp.contains(Gfp::NOWARN) {
                    crate::kwarn!("(Buddy) alocação falhou: ordem={} gfp={:?}", order, gfp);
                }
            }
        }
        pfn
    }

    fn try_alloc(&self, cpu: usize, order: usize, gfp: Gfp) -> Option<u64> {
        if order == 0 {
            if let Some(pfn) = self.pcp.cpu(cpu).lock().pop() {
                return Some(pfn);
            }
        }

        let mut area = self.area.lock();
        self.rmqueue(&mut area, order, gfp)
    }

    /// Retira um bloco da ordem pedida, dividindo blocos maiores se preciso.
    fn rmqueue(&self, area: &mut FreeArea, order: usize, gfp: Gfp) -> Option<u64> {
        let mt = gfp.migratetype();

        for current in order..MAX_ORDER {
            if let Some(pfn) = area.pop_head(current, mt) {
                Self::expand(area, pfn, order, current, mt);
                return Some(pfn);
            }
        }

        // Fallback: roubar o maior bloco disponível de outra classe
        let mut fallbacks = mt.fallbacks().iter().copied().collect::<alloc::vec::Vec<_>>();
        if mt == MigrateType::Movable && gfp.contains(Gfp::CMA) {
            fallbacks.push(MigrateType::Cma);
        }
        for current in (order..MAX_ORDER).rev() {
            for &fallback in &fallbacks {
                if let Some(pfn) = area.pop_head(current, fallback) {
                    let target = if current >= PAGEBLOCK_ORDER && !fallback.is_cma() {
                        // Bloco inteiro muda de dono
                        for pb in 0..(1u64 << (current - PAGEBLOCK_ORDER)) {
                            area.set_pageblock_migratetype(pfn + (pb << PAGEBLOCK_ORDER), mt);
                        }
                        mt
                    } else {
                        fallback
                    };
                    Self::expand(area, pfn, order, current, target);
                    self.stats.record_fallback();
                    return Some(pfn);
                }
            }
        }

        None
    }

    /// Divide um bloco de ordem `high` até `low`; as metades superiores
    /// voltam para a cabeça das listas menores.
    fn expand(area: &mut FreeArea, pfn: u64, low: usize, high: usize, mt: MigrateType) {
        let mut high = high;
        while high > low {
            high -= 1;
            area.add(pfn + order_pages(high), high, mt, ListPosition::Head);
        }
    }

    // =========================================================================
    // LIBERAÇÃO
    // =========================================================================

    /// Libera um bloco na CPU `cpu`.
    ///
    /// Observers e contadores só veem frees aceitos.
    pub fn free_pages_on(&self, cpu: usize, pfn: u64, order: usize) -> PgboostResult<()> {
        self.check_block(pfn, order)?;

        if order == 0 {
            if self.is_free_page(pfn) {
                crate::kerror!("(Buddy) double free: pfn={:#x} ordem=0", pfn);
                return Err(PgboostError::InvalidAddress);
            }
            let flush = {
                let mut pcp = self.pcp.cpu(cpu).lock();
                pcp.push(pfn);
                pcp.needs_flush().then(|| pcp.flush_batch())
            };
            if let Some(batch) = flush {
                let mut area = self.area.lock();
                for page in batch {
                    Self::free_one(&mut area, self.span, page, 0);
                }
            }
        } else {
            let mut area = self.area.lock();
            if area.block_containing(pfn).is_some() {
                crate::kerror!("(Buddy) double free: pfn={:#x} ordem={}", pfn, order);
                return Err(PgboostError::InvalidAddress);
            }
            Self::free_one(&mut area, self.span, pfn, order);
        }

        self.stats.record_free(order_pages(order));
        self.observers.for_each(|o| o.on_page_free(pfn, order));
        Ok(())
    }

    /// Devolve um bloco direto às free lists: sem cache por CPU, sem
    /// observers e fora do contador de páginas liberadas.
    ///
    /// Caminho de putback de blocos que o chamador tirou do alocador e
    /// segurou (side cache do pgboost).
    pub fn free_pages_direct(&self, pfn: u64, order: usize) -> PgboostResult<()> {
        self.check_block(pfn, order)?;
        if order == 0 && self.pcp_contains(pfn) {
            crate::kerror!("(Buddy) double free: pfn={:#x} ordem=0", pfn);
            return Err(PgboostError::InvalidAddress);
        }

        let mut area = self.area.lock();
        if area.block_containing(pfn).is_some() {
            crate::kerror!("(Buddy) double free: pfn={:#x} ordem={}", pfn, order);
            return Err(PgboostError::InvalidAddress);
        }
        Self::free_one(&mut area, self.span, pfn, order);
        Ok(())
    }

    fn check_block(&self, pfn: u64, order: usize) -> PgboostResult<()> {
        if order >= MAX_ORDER
            || !self.span.contains(pfn)
            || pfn + order_pages(order) > self.span.end_pfn
            || !is_aligned(pfn - self.span.start_pfn, order_pages(order))
        {
            return Err(PgboostError::InvalidAddress);
        }
        Ok(())
    }

    /// Página já livre, nas free lists ou em algum cache por CPU.
    fn is_free_page(&self, pfn: u64) -> bool {
        self.area.lock().block_containing(pfn).is_some() || self.pcp_contains(pfn)
    }

    fn pcp_contains(&self, pfn: u64) -> bool {
        (0..self.pcp.nr_cpus()).any(|cpu| self.pcp.cpu(cpu).lock().contains(pfn))
    }

    /// Coalesce com os buddies livres e insere na lista do pageblock.
    fn free_one(area: &mut FreeArea, span: ZoneSpan, pfn: u64, order: usize) {
        let mut pfn = pfn;
        let mut order = order;

        while order < MAX_ORDER - 1 {
            let idx = pfn - span.start_pfn;
            let buddy = span.start_pfn + (idx ^ order_pages(order));
            if buddy + order_pages(order) > span.end_pfn {
                break;
            }
            match area.block_at(buddy) {
                Some(b) if b.order == order => {
                    // CMA nunca funde com pageblocks comuns
                    if order + 1 >= PAGEBLOCK_ORDER
                        && area.pageblock_migratetype(buddy).is_cma()
                            != area.pageblock_migratetype(pfn).is_cma()
                    {
                        break;
                    }
                    area.remove(buddy);
                    pfn = core::cmp::min(pfn, buddy);
                    order += 1;
                }
                _ => break,
            }
        }

        let mt = area.pageblock_migratetype(pfn);
        area.add(pfn, order, mt, ListPosition::Head);
    }

    /// Devolve todos os caches por CPU às free lists.
    pub fn drain_all_pages(&self) -> usize {
        let mut drained = 0;
        for cpu in 0..self.pcp.nr_cpus() {
            let pages = self.pcp.cpu(cpu).lock().take_all();
            if pages.is_empty() {
                continue;
            }
            drained += pages.len();
            let mut area = self.area.lock();
            for pfn in pages {
                Self::free_one(&mut area, self.span, pfn, 0);
            }
        }
        crate::ktrace!("(Buddy) drain: {} páginas devolvidas", drained);
        drained
    }

    /// Retagueia o pageblock de `pfn` (configuração de plataforma / testes).
    pub fn set_pageblock_migratetype(&self, pfn: u64, mt: MigrateType) {
        self.area.lock().set_pageblock_migratetype(pfn, mt);
    }
}
