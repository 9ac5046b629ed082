//! # Decision Engine
//!
//! Lê a ocupação das free lists por rank e decide se vale reordenar, e com
//! que agressividade.
//!
//! O scan (`scan_free_area`) roda com o zone lock adquirido; a regra
//! (`evaluate`) é pura e opera sobre o `RankScan` resultante.

use core::fmt;

use super::adapter::ZoneAdapter;
use super::config::PgboostConfig;
use super::rank::{RankId, RankMap};
use super::stats::PgboostStats;
use super::Pgboost;
use crate::mm::alloc::{FreeArea, MigrateType};
use crate::mm::config::{order_pages, MAX_ORDER, NR_RANKS};

/// Ação decidida para um ciclo. Nunca persistida.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgboostAction {
    NoFavor,
    FavorRank { rank: RankId, strict: bool },
}

impl PgboostAction {
    pub const fn favor(rank: RankId) -> Self {
        Self::FavorRank { rank, strict: false }
    }

    pub const fn strict(rank: RankId) -> Self {
        Self::FavorRank { rank, strict: true }
    }

    /// Rank favorecido, se houver
    pub fn rank(&self) -> Option<RankId> {
        match *self {
            Self::NoFavor => None,
            Self::FavorRank { rank, .. } => Some(rank),
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::FavorRank { strict: true, .. })
    }
}

impl fmt::Display for PgboostAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NoFavor => f.write_str("nofavor"),
            Self::FavorRank { rank, strict: false } => write!(f, "rank{}", rank),
            Self::FavorRank { rank, strict: true } => write!(f, "rank{}|strict", rank),
        }
    }
}

/// Resultado de um scan das free lists (páginas ponderadas por `2^order`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RankScan {
    /// Páginas livres por rank, todas as ordens, classes não-CMA
    pub free: [u64; NR_RANKS],
    /// Páginas livres por rank nas ordens huge
    pub huge: [u64; NR_RANKS],
    /// Blocos por rank entre os primeiros `zone_batch` de cada lista huge
    pub head: [u64; NR_RANKS],
}

impl RankScan {
    pub fn total(&self) -> u64 {
        self.free[0] + self.free[1]
    }

    pub fn huge_total(&self) -> u64 {
        self.huge[0] + self.huge[1]
    }
}

/// Percorre todas as listas não-CMA. Chamar com o zone lock adquirido.
pub fn scan_free_area(area: &FreeArea, map: &RankMap, cfg: &PgboostConfig) -> RankScan {
    let mut scan = RankScan::default();

    for order in 0..MAX_ORDER {
        let pages = order_pages(order);
        let huge = order >= cfg.huge_order;

        for mt in MigrateType::ALL.into_iter().filter(|mt| !mt.is_cma()) {
            for (idx, &pfn) in area.list(order, mt).iter().enumerate() {
                let rank = map.rank_of(pfn);
                scan.free[rank] += pages;
                if huge {
                    scan.huge[rank] += pages;
                    if idx < cfg.zone_batch {
                        scan.head[rank] += 1;
                    }
                }
            }
        }
    }

    scan
}

/// Aplica as regras de decisão ao scan.
///
/// `current` é o rank favorecido hoje (usado pela regra de poluição).
/// Com `force` só a maioria bruta das ordens huge conta.
pub fn evaluate(
    scan: &RankScan,
    cfg: &PgboostConfig,
    current: Option<RankId>,
    force: bool,
) -> PgboostAction {
    let [h0, h1] = scan.huge;

    if force {
        return match h0.cmp(&h1) {
            core::cmp::Ordering::Greater => PgboostAction::favor(0),
            core::cmp::Ordering::Less => PgboostAction::favor(1),
            core::cmp::Ordering::Equal => PgboostAction::NoFavor,
        };
    }

    if scan.total() < cfg.least_total_pgs {
        return PgboostAction::NoFavor;
    }

    // Igual ao piso ainda decide; só abaixo dele é NoFavor
    let total = scan.huge_total();
    if total < cfg.least_total_pgs {
        return PgboostAction::NoFavor;
    }

    let larger = if h1 > h0 { 1 } else { 0 };
    if h0.abs_diff(h1) >= cfg.least_total_pgs {
        return PgboostAction::favor(larger);
    }

    for rank in 0..NR_RANKS {
        if cfg.dominates(scan.huge[rank], total) {
            return PgboostAction::favor(rank);
        }
    }
    for rank in 0..NR_RANKS {
        if cfg.minority(scan.huge[rank], total) {
            return PgboostAction::favor(1 - rank);
        }
    }

    // Cabeça das listas tomada pelo rank oposto ao favorecido: passa a
    // favorecer o oposto, com passe completo.
    if let Some(cur) = current {
        let sampled = scan.head[0] + scan.head[1];
        let opposite = 1 - cur;
        if sampled > 0 && cfg.dominates(scan.head[opposite], sampled) {
            return PgboostAction::strict(opposite);
        }
    }

    PgboostAction::NoFavor
}

impl<A: ZoneAdapter> Pgboost<A> {
    /// Decide a ação do ciclo. Atualiza `RankInfo::free` como efeito
    /// colateral do scan.
    pub fn next_pgboost_action(&self, force: bool) -> PgboostAction {
        let scan = {
            let area = self.zone.free_area().lock();
            scan_free_area(&area, &self.map, &self.config)
        };
        for (rank, info) in self.map.ranks().iter().enumerate() {
            info.set_free(scan.free[rank]);
        }

        let action = evaluate(&scan, &self.config, self.favored_rank(), force);
        match action {
            PgboostAction::NoFavor => PgboostStats::inc(&self.stats.decisions_nofavor),
            PgboostAction::FavorRank { strict: false, .. } => {
                PgboostStats::inc(&self.stats.decisions_favor)
            }
            PgboostAction::FavorRank { strict: true, .. } => {
                PgboostStats::inc(&self.stats.decisions_strict)
            }
        }
        crate::kdebug!(
            "(PGB) decisão {}: livre={:?} huge={:?} cabeça={:?} force={}",
            action,
            scan.free,
            scan.huge,
            scan.head,
            force
        );
        action
    }
}
