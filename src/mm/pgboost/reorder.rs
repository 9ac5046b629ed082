//! # List Reorderer
//!
//! Reordena as listas Movable, da maior ordem até o corte, para que o
//! alocador (que retira pela cabeça) entregue primeiro blocos do rank
//! favorecido:
//!
//! ```text
//! ordem >= huge:  [fav fav fav | outros ...]        cabeça
//! ordem <  huge:  [outros ... | fav fav fav]        cauda, alternando
//!                 [fav fav fav | outros ...]        cabeça na ordem seguinte
//! ```
//!
//! Com `hold_small`, as ordens pequenas vão sempre para a cauda e o
//! excedente do rank não favorecido é levado ao side cache.
//!
//! O zone lock é liberado entre ordens.

use super::adapter::ZoneAdapter;
use super::stats::PgboostStats;
use super::Pgboost;
use crate::mm::alloc::{ListPosition, MigrateType};
use crate::mm::config::{order_pages, MAX_ORDER};
use crate::mm::error::{PgboostError, PgboostResult};

impl<A: ZoneAdapter> Pgboost<A> {
    /// Passe de reordenação avulso.
    ///
    /// `pick_small` limita o passe às ordens huge. Retorna quantos blocos
    /// favorecidos foram reposicionados; `0` se outro passe está rodando.
    pub fn do_pgboost_list_reordering(
        &self,
        pick_small: bool,
        favor_rank1: bool,
        hold_small: bool,
    ) -> PgboostResult<usize> {
        if !self.is_ready() {
            return Err(PgboostError::NotReady);
        }
        let Some(_guard) = self.begin_pass() else {
            PgboostStats::inc(&self.stats.skipped_busy);
            return Ok(0);
        };
        Ok(self.reorder_lists(pick_small, favor_rank1, hold_small))
    }

    /// Corpo do reorder. Chamar com a trava de passe adquirida.
    pub(crate) fn reorder_lists(&self, pick_small: bool, favor_rank1: bool, hold_small: bool) -> usize {
        self.cache.release(&*self.zone, u64::MAX, &self.stats);

        let huge_order = self.config.huge_order;
        let cutoff = if pick_small { huge_order } else { 0 };
        let mut surplus = [0u64; MAX_ORDER];
        let mut positive_seq = false;
        let mut moved = 0;

        for order in (cutoff..MAX_ORDER).rev() {
            let pos = if order >= huge_order {
                ListPosition::Head
            } else if hold_small {
                ListPosition::Tail
            } else {
                let pos = if positive_seq {
                    ListPosition::Head
                } else {
                    ListPosition::Tail
                };
                positive_seq = !positive_seq;
                pos
            };

            let (favored, unfavored) = {
                let mut area = self.zone.free_area().lock();
                let sub = area.extract_if(order, MigrateType::Movable, usize::MAX, |pfn| {
                    self.map.in_favored_rank(pfn, favor_rank1)
                });
                let favored = sub.len();
                let unfavored = area.nr_free(order, MigrateType::Movable);
                area.splice(sub, pos);
                (favored, unfavored)
            };

            if hold_small && order < huge_order {
                surplus[order] = unfavored.saturating_sub(favored) as u64;
            }
            match pos {
                ListPosition::Head => PgboostStats::add(&self.stats.moved_head, favored as u64),
                ListPosition::Tail => PgboostStats::add(&self.stats.moved_tail, favored as u64),
            }
            moved += favored;
        }

        if hold_small {
            let estimate: u64 = surplus
                .iter()
                .enumerate()
                .map(|(order, &blocks)| blocks * order_pages(order))
                .sum();
            if estimate >= self.config.least_total_pgs {
                crate::kdebug!("(PGB) side cache: excedente de {} páginas acima do piso", estimate);
            } else if estimate > 0 {
                self.cache
                    .collect(&*self.zone, &self.map, &surplus, favor_rank1, &self.stats);
            }
        }

        self.set_favored(favor_rank1 as usize);
        self.reset_violations();
        crate::ktrace!("(PGB) reorder rank{}: {} blocos reposicionados", favor_rank1 as usize, moved);
        moved
    }
}
