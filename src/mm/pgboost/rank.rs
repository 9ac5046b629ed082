//! # Rank Map
//!
//! Partição estática dos PFNs da zona em dois ranks DRAM contíguos:
//!
//! ```text
//! start_pfn            rank_boundary              end_pfn
//!     |------ rank 0 ------|-------- rank 1 ---------|
//! ```
//!
//! Construído uma vez no init a partir dos tamanhos reportados pelo
//! controlador de memória. Só as contagens de páginas livres mudam depois.

use core::sync::atomic::{AtomicU64, Ordering};

use super::adapter::MemoryController;
use crate::mm::config::{bytes_to_pages, NR_RANKS};
use crate::mm::error::{PgboostError, PgboostResult};

/// Identificador de rank (0 ou 1)
pub type RankId = usize;

/// Um rank DRAM
#[derive(Debug)]
pub struct RankInfo {
    pub start_pfn: u64,
    pub end_pfn: u64,
    free: AtomicU64,
}

impl RankInfo {
    /// Páginas livres vistas no último scan da Decision Engine
    pub fn free(&self) -> u64 {
        self.free.load(Ordering::Relaxed)
    }

    pub(crate) fn set_free(&self, pages: u64) {
        self.free.store(pages, Ordering::Relaxed);
    }

    pub fn nr_pages(&self) -> u64 {
        self.end_pfn - self.start_pfn
    }
}

/// Mapa PFN → rank
#[derive(Debug)]
pub struct RankMap {
    ranks: [RankInfo; NR_RANKS],
}

impl RankMap {
    /// Monta o mapa com ranks consecutivos a partir de `base_pfn`.
    ///
    /// Falha com `UnsupportedRanks` se não houver exatamente dois ranks de
    /// tamanho não nulo.
    pub fn new(base_pfn: u64, rank_bytes: &[u64]) -> PgboostResult<Self> {
        if rank_bytes.len() != NR_RANKS {
            return Err(PgboostError::UnsupportedRanks);
        }
        let rank0 = bytes_to_pages(rank_bytes[0]);
        let rank1 = bytes_to_pages(rank_bytes[1]);
        if rank0 == 0 || rank1 == 0 {
            return Err(PgboostError::UnsupportedRanks);
        }

        let boundary = base_pfn + rank0;
        Ok(Self {
            ranks: [
                RankInfo {
                    start_pfn: base_pfn,
                    end_pfn: boundary,
                    free: AtomicU64::new(0),
                },
                RankInfo {
                    start_pfn: boundary,
                    end_pfn: boundary + rank1,
                    free: AtomicU64::new(0),
                },
            ],
        })
    }

    /// Consulta o controlador de memória e monta o mapa.
    pub fn from_controller(base_pfn: u64, mc: &dyn MemoryController) -> PgboostResult<Self> {
        let nr = mc.nr_ranks();
        if nr != NR_RANKS {
            return Err(PgboostError::UnsupportedRanks);
        }
        let sizes = [mc.rank_size(0), mc.rank_size(1)];
        Self::new(base_pfn, &sizes)
    }

    /// Primeiro PFN do rank 1
    #[inline]
    pub fn boundary(&self) -> u64 {
        self.ranks[0].end_pfn
    }

    /// Rank do PFN
    #[inline]
    pub fn rank_of(&self, pfn: u64) -> RankId {
        (pfn >= self.boundary()) as RankId
    }

    /// O PFN está no rank favorecido?
    #[inline]
    pub fn in_favored_rank(&self, pfn: u64, favor_rank1: bool) -> bool {
        (pfn >= self.boundary()) == favor_rank1
    }

    #[inline]
    pub fn in_unfavored_rank(&self, pfn: u64, favor_rank1: bool) -> bool {
        !self.in_favored_rank(pfn, favor_rank1)
    }

    pub fn rank(&self, id: RankId) -> &RankInfo {
        &self.ranks[id]
    }

    pub fn ranks(&self) -> &[RankInfo; NR_RANKS] {
        &self.ranks
    }

    /// Primeiro e último PFN (exclusivo) cobertos pelos ranks
    pub fn span(&self) -> (u64, u64) {
        (self.ranks[0].start_pfn, self.ranks[1].end_pfn)
    }
}
