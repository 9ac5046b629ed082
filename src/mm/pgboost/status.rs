//! # Dump de status
//!
//! Formato (uma seção por classe com blocos livres):
//!
//! ```text
//! [Movable]
//!  9: (1)3-(0)1-(1)2-
//! 10: (0)4-
//! [side cache]
//!  0: 12
//! rank0 [0x0,0x3e8) livre=1536
//! rank1 [0x3e8,0x7d0) livre=4608
//! favorecido: rank1 violações: 0
//! full_passes: 1
//! ...
//! ```
//!
//! Cada token `(rank)count-` é uma sequência de blocos consecutivos do mesmo
//! rank, da cabeça para a cauda da lista.

use alloc::vec::Vec;
use core::fmt::{self, Write};

use super::adapter::ZoneAdapter;
use super::rank::{RankId, RankMap};
use super::Pgboost;
use crate::mm::alloc::{FreeArea, MigrateType};
use crate::mm::config::MAX_ORDER;

/// Sequências `(rank, blocos)` de uma lista, da cabeça para a cauda.
pub fn rank_runs(list: impl IntoIterator<Item = u64>, map: &RankMap) -> Vec<(RankId, usize)> {
    let mut runs: Vec<(RankId, usize)> = Vec::new();
    for pfn in list {
        let rank = map.rank_of(pfn);
        match runs.last_mut() {
            Some((last, count)) if *last == rank => *count += 1,
            _ => runs.push((rank, 1)),
        }
    }
    runs
}

/// Escreve os tokens `(rank)count-`.
pub fn write_runs(out: &mut impl Write, runs: &[(RankId, usize)]) -> fmt::Result {
    for (rank, count) in runs {
        write!(out, "({}){}-", rank, count)?;
    }
    Ok(())
}

struct ClassSnapshot {
    mt: MigrateType,
    orders: Vec<Vec<(RankId, usize)>>,
}

fn snapshot(area: &FreeArea, map: &RankMap) -> Vec<ClassSnapshot> {
    MigrateType::ALL
        .into_iter()
        .filter(|&mt| (0..MAX_ORDER).any(|order| area.nr_free(order, mt) > 0))
        .map(|mt| ClassSnapshot {
            mt,
            orders: (0..MAX_ORDER)
                .map(|order| rank_runs(area.list(order, mt).iter().copied(), map))
                .collect(),
        })
        .collect()
}

impl<A: ZoneAdapter> Pgboost<A> {
    /// Escreve o dump de status em `out`.
    pub fn show_status(&self, out: &mut impl Write) -> fmt::Result {
        let classes = {
            let area = self.zone.free_area().lock();
            snapshot(&area, &self.map)
        };

        for class in &classes {
            writeln!(out, "[{}]", class.mt.name())?;
            for (order, runs) in class.orders.iter().enumerate() {
                if runs.is_empty() {
                    continue;
                }
                write!(out, "{:2}: ", order)?;
                write_runs(out, runs)?;
                writeln!(out)?;
            }
        }

        writeln!(out, "[side cache]")?;
        for (order, blocks) in self.cache.occupancy().iter().enumerate() {
            if *blocks > 0 {
                writeln!(out, "{:2}: {}", order, blocks)?;
            }
        }
        writeln!(out, "retido: {} páginas", self.cache.held_pages())?;

        for (id, rank) in self.map.ranks().iter().enumerate() {
            writeln!(
                out,
                "rank{} [{:#x},{:#x}) livre={}",
                id,
                rank.start_pfn,
                rank.end_pfn,
                rank.free()
            )?;
        }
        match self.favored_rank() {
            Some(rank) => write!(out, "favorecido: rank{}", rank)?,
            None => write!(out, "favorecido: nenhum")?,
        }
        writeln!(out, " violações: {}", self.violations())?;

        for (name, value) in self.stats.snapshot().fields() {
            writeln!(out, "{}: {}", name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::config::PAGE_SIZE;
    use alloc::string::String;

    #[test]
    fn runs_collapse_consecutive_ranks() {
        let pg = PAGE_SIZE as u64;
        let map = RankMap::new(0, &[1000 * pg, 1000 * pg]).unwrap();
        let runs = rank_runs([1000, 1100, 5, 1200, 1300, 1400], &map);
        assert_eq!(runs, [(1, 2), (0, 1), (1, 3)]);

        let mut out = String::new();
        write_runs(&mut out, &runs).unwrap();
        assert_eq!(out, "(1)2-(0)1-(1)3-");

        assert!(rank_runs([0u64; 0], &map).is_empty());
    }
}
