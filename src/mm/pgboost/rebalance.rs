//! # Migrate-Class Rebalancer
//!
//! Blocos da maior ordem que estão em Unmovable/Reclaimable fora do rank
//! favorecido são reclassificados como Movable (com os pageblocks), para
//! que o reorder consiga ordená-los. Depois, os Movable do rank favorecido
//! das ordens huge sobem para a cabeça.
//!
//! Melhor esforço: no máximo `rebalance_retries` tentativas de até
//! `rebalance_batch` blocos por aquisição do zone lock.

use super::adapter::ZoneAdapter;
use super::stats::PgboostStats;
use super::Pgboost;
use crate::mm::alloc::{ListPosition, MigrateType};
use crate::mm::config::{MAX_ORDER, MAX_ORDER_IDX, REBALANCE_IDLE_LIMIT};
use crate::mm::error::{PgboostError, PgboostResult};

impl<A: ZoneAdapter> Pgboost<A> {
    /// Reclassifica blocos de `mt` fora do rank favorecido para Movable.
    ///
    /// Só aceita `Unmovable` e `Reclaimable`. Com `drain`, a primeira
    /// tentativa devolve os caches por CPU às free lists antes do scan.
    /// Retorna o número de blocos reclassificados.
    pub fn change_migrate_type(
        &self,
        mt: MigrateType,
        favor_rank1: bool,
        drain: bool,
    ) -> PgboostResult<usize> {
        if !matches!(mt, MigrateType::Unmovable | MigrateType::Reclaimable) {
            return Err(PgboostError::InvalidMigrateType);
        }

        let mut total = 0;
        let mut idle = 0;

        for attempt in 0..self.config.rebalance_retries {
            if attempt == 0 && drain {
                self.zone.drain_all_pages();
            }

            let moved = {
                let mut area = self.zone.free_area().lock();
                let sub = area.extract_if(MAX_ORDER_IDX, mt, self.config.rebalance_batch, |pfn| {
                    self.map.in_unfavored_rank(pfn, favor_rank1)
                });
                area.splice_migratetype(sub, MigrateType::Movable)
            };

            if moved == 0 {
                if attempt == 0 {
                    crate::ktrace!("(PGB) rebalance {}: nada a mover", mt.name());
                    return Ok(0);
                }
                idle += 1;
                if idle >= REBALANCE_IDLE_LIMIT {
                    break;
                }
            } else {
                idle = 0;
                total += moved;
            }
        }

        let mut promoted = 0;
        for order in self.config.huge_order..MAX_ORDER {
            let mut area = self.zone.free_area().lock();
            let sub = area.extract_if(order, MigrateType::Movable, usize::MAX, |pfn| {
                self.map.in_favored_rank(pfn, favor_rank1)
            });
            promoted += sub.len();
            area.splice(sub, ListPosition::Head);
        }

        PgboostStats::add(&self.stats.reclassified, total as u64);
        crate::kdebug!(
            "(PGB) rebalance {}: {} blocos → Movable, {} favorecidos na cabeça",
            mt.name(),
            total,
            promoted
        );
        Ok(total)
    }
}
