//! # Free Area - listas livres por (ordem, classe de migração)
//!
//! Estado protegido pelo zone lock. Cada lista guarda o PFN inicial dos
//! blocos livres de `2^order` páginas; a frente da `VecDeque` é a *cabeça*
//! da lista, de onde o alocador retira primeiro.
//!
//! ## Primitivas expostas ao pgboost
//!
//! | Primitiva | Uso |
//! |-----------|-----|
//! | `list` / `nr_free` | percorrer e contar uma lista |
//! | `extract_if` | separar blocos preservando a ordem relativa |
//! | `splice` | devolver um `FreeSublist` na cabeça ou na cauda |
//! | `splice_migratetype` | reclassificar um `FreeSublist` inteiro |
//!
//! Todas preservam o número total de blocos livres por ordem.

use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;

use super::gfp::{MigrateType, MIGRATE_TYPES};
use crate::mm::config::{order_pages, MAX_ORDER, PAGEBLOCK_ORDER};
use crate::mm::pmm::zones::ZoneSpan;

/// Posição de inserção numa free list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListPosition {
    Head,
    Tail,
}

/// Metadados de um bloco livre
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeBlock {
    pub order: usize,
    pub migratetype: MigrateType,
}

/// Blocos retirados de uma lista, que só podem voltar para a mesma lista.
#[must_use = "blocos extraídos precisam voltar para a free list via FreeArea::splice"]
#[derive(Debug)]
pub struct FreeSublist {
    order: usize,
    migratetype: MigrateType,
    pfns: VecDeque<u64>,
}

impl FreeSublist {
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn migratetype(&self) -> MigrateType {
        self.migratetype
    }

    pub fn len(&self) -> usize {
        self.pfns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pfns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.pfns.iter().copied()
    }
}

/// Listas livres de uma zona
pub struct FreeArea {
    span: ZoneSpan,
    lists: Vec<VecDeque<u64>>,
    blocks: BTreeMap<u64, FreeBlock>,
    pageblock_mt: Vec<MigrateType>,
}

#[inline(always)]
const fn list_index(order: usize, mt: MigrateType) -> usize {
    order * MIGRATE_TYPES + mt.index()
}

impl FreeArea {
    /// Cria listas vazias; todos os pageblocks recebem `initial_mt`.
    pub fn new(span: ZoneSpan, initial_mt: MigrateType) -> Self {
        let nr_pageblocks = span.nr_pages().div_ceil(order_pages(PAGEBLOCK_ORDER)) as usize;
        let mut lists = Vec::with_capacity(MAX_ORDER * MIGRATE_TYPES);
        lists.resize_with(MAX_ORDER * MIGRATE_TYPES, VecDeque::new);

        Self {
            span,
            lists,
            blocks: BTreeMap::new(),
            pageblock_mt: alloc::vec![initial_mt; nr_pageblocks],
        }
    }

    pub fn span(&self) -> ZoneSpan {
        self.span
    }

    // =========================================================================
    // CONSULTA
    // =========================================================================

    /// Lista de `(order, mt)`, da cabeça para a cauda.
    pub fn list(&self, order: usize, mt: MigrateType) -> &VecDeque<u64> {
        &self.lists[list_index(order, mt)]
    }

    /// Blocos livres em `(order, mt)`
    pub fn nr_free(&self, order: usize, mt: MigrateType) -> usize {
        self.list(order, mt).len()
    }

    /// Páginas livres em todas as listas
    pub fn nr_free_pages(&self) -> u64 {
        (0..MAX_ORDER)
            .map(|order| {
                let blocks: usize = MigrateType::ALL.iter().map(|&mt| self.nr_free(order, mt)).sum();
                blocks as u64 * order_pages(order)
            })
            .sum()
    }

    /// Contagem de blocos por (ordem, classe)
    pub fn counts(&self) -> [[usize; MIGRATE_TYPES]; MAX_ORDER] {
        let mut counts = [[0; MIGRATE_TYPES]; MAX_ORDER];
        for (order, row) in counts.iter_mut().enumerate() {
            for mt in MigrateType::ALL {
                row[mt.index()] = self.nr_free(order, mt);
            }
        }
        counts
    }

    /// Bloco livre que começa exatamente em `pfn`
    pub fn block_at(&self, pfn: u64) -> Option<FreeBlock> {
        self.blocks.get(&pfn).copied()
    }

    /// Bloco livre que contém `pfn` (início ou interior)
    pub fn block_containing(&self, pfn: u64) -> Option<(u64, FreeBlock)> {
        let (&head, &block) = self.blocks.range(..=pfn).next_back()?;
        (pfn < head + order_pages(block.order)).then_some((head, block))
    }

    // =========================================================================
    // PAGEBLOCKS
    // =========================================================================

    /// Classe do pageblock que contém `pfn`
    pub fn pageblock_migratetype(&self, pfn: u64) -> MigrateType {
        self.pageblock_mt[self.pageblock_index(pfn)]
    }

    /// Retagueia o pageblock que contém `pfn`. Não move blocos livres.
    pub fn set_pageblock_migratetype(&mut self, pfn: u64, mt: MigrateType) {
        let idx = self.pageblock_index(pfn);
        self.pageblock_mt[idx] = mt;
    }

    fn pageblock_index(&self, pfn: u64) -> usize {
        ((pfn - self.span.start_pfn) >> PAGEBLOCK_ORDER) as usize
    }

    /// Retagueia todos os pageblocks cobertos por um bloco de ordem
    /// `>= PAGEBLOCK_ORDER`; blocos menores não mudam tags.
    fn retag_block(&mut self, pfn: u64, order: usize, mt: MigrateType) {
        if order < PAGEBLOCK_ORDER {
            return;
        }
        let first = self.pageblock_index(pfn);
        let count = 1usize << (order - PAGEBLOCK_ORDER);
        for tag in self.pageblock_mt.iter_mut().skip(first).take(count) {
            *tag = mt;
        }
    }

    // =========================================================================
    // MANIPULAÇÃO (usada pelo buddy)
    // =========================================================================

    /// Insere um bloco na lista `(order, mt)`.
    pub(crate) fn add(&mut self, pfn: u64, order: usize, mt: MigrateType, pos: ListPosition) {
        debug_assert!(!self.blocks.contains_key(&pfn), "bloco já livre");
        self.blocks.insert(pfn, FreeBlock { order, migratetype: mt });
        let list = &mut self.lists[list_index(order, mt)];
        match pos {
            ListPosition::Head => list.push_front(pfn),
            ListPosition::Tail => list.push_back(pfn),
        }
    }

    /// Remove um bloco específico. Retorna seus metadados.
    pub(crate) fn remove(&mut self, pfn: u64) -> Option<FreeBlock> {
        let block = self.blocks.remove(&pfn)?;
        let list = &mut self.lists[list_index(block.order, block.migratetype)];
        if let Some(idx) = list.iter().position(|&p| p == pfn) {
            list.remove(idx);
        }
        Some(block)
    }

    /// Retira o bloco da cabeça de `(order, mt)`.
    pub(crate) fn pop_head(&mut self, order: usize, mt: MigrateType) -> Option<u64> {
        let pfn = self.lists[list_index(order, mt)].pop_front()?;
        self.blocks.remove(&pfn);
        Some(pfn)
    }

    // =========================================================================
    // PRIMITIVAS DO PGBOOST
    // =========================================================================

    /// Separa até `limit` blocos de `(order, mt)` que satisfazem `pred`,
    /// preservando a ordem relativa dos separados e dos restantes.
    pub fn extract_if<F>(&mut self, order: usize, mt: MigrateType, limit: usize, mut pred: F) -> FreeSublist
    where
        F: FnMut(u64) -> bool,
    {
        let list = &mut self.lists[list_index(order, mt)];
        let mut taken = VecDeque::new();
        let mut kept = VecDeque::with_capacity(list.len());

        for pfn in list.drain(..) {
            if taken.len() < limit && pred(pfn) {
                taken.push_back(pfn);
            } else {
                kept.push_back(pfn);
            }
        }
        *list = kept;

        FreeSublist {
            order,
            migratetype: mt,
            pfns: taken,
        }
    }

    /// Devolve blocos extraídos para sua lista de origem.
    pub fn splice(&mut self, sub: FreeSublist, pos: ListPosition) {
        let list = &mut self.lists[list_index(sub.order, sub.migratetype)];
        match pos {
            ListPosition::Head => {
                for pfn in sub.pfns.into_iter().rev() {
                    list.push_front(pfn);
                }
            }
            ListPosition::Tail => list.extend(sub.pfns),
        }
    }

    /// Reclassifica em lote os blocos de `sub` para `to`, anexando-os à
    /// cauda de `(order, to)`. Retorna quantos blocos mudaram de classe.
    pub fn splice_migratetype(&mut self, sub: FreeSublist, to: MigrateType) -> usize {
        let order = sub.order;
        let mut moved = 0;
        for pfn in sub.pfns {
            if let Some(block) = self.blocks.get_mut(&pfn) {
                block.migratetype = to;
            }
            self.retag_block(pfn, order, to);
            self.lists[list_index(order, to)].push_back(pfn);
            moved += 1;
        }
        moved
    }
}
