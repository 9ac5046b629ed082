//! Política do motor (fixada no init)

use crate::mm::config::{
    HPAGE_PMD_ORDER, LEAST_TOTAL_PGS, MAX_ORDER, REBALANCE_BATCH, REBALANCE_RETRIES, ZONE_BATCH,
};
use crate::mm::error::{PgboostError, PgboostResult};

/// Limiares e tamanhos de lote do motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgboostConfig {
    /// Piso em páginas: memória livre mínima, diferença mínima entre ranks,
    /// limiar do contador de violações e teto do side cache.
    pub least_total_pgs: u64,
    /// Blocos reclassificados por aquisição do zone lock
    pub rebalance_batch: usize,
    /// Tentativas do rebalanceador
    pub rebalance_retries: usize,
    /// Entradas amostradas por lista na detecção de poluição
    pub zone_batch: usize,
    /// Primeira ordem tratada como "huge"
    pub huge_order: usize,
    /// Fração de dominância (3/4): `pollution_num / pollution_den`
    pub pollution_num: u64,
    pub pollution_den: u64,
}

impl Default for PgboostConfig {
    fn default() -> Self {
        Self {
            least_total_pgs: LEAST_TOTAL_PGS,
            rebalance_batch: REBALANCE_BATCH,
            rebalance_retries: REBALANCE_RETRIES,
            zone_batch: ZONE_BATCH,
            huge_order: HPAGE_PMD_ORDER,
            pollution_num: 3,
            pollution_den: 4,
        }
    }
}

impl PgboostConfig {
    /// Rejeita configurações que o motor não consegue honrar.
    pub fn validate(&self) -> PgboostResult<()> {
        if self.rebalance_batch == 0 || self.rebalance_retries == 0 || self.zone_batch == 0 {
            return Err(PgboostError::InvalidBatch);
        }
        if self.least_total_pgs == 0 || self.huge_order == 0 || self.huge_order >= MAX_ORDER {
            return Err(PgboostError::InvalidParameter);
        }
        // A fração precisa ficar em (1/2, 1) para que "domina" e "minoria"
        // não se sobreponham.
        if self.pollution_den == 0
            || self.pollution_num >= self.pollution_den
            || self.pollution_num * 2 <= self.pollution_den
        {
            return Err(PgboostError::InvalidParameter);
        }
        Ok(())
    }

    /// `part` domina `total` (> num/den)?
    #[inline]
    pub fn dominates(&self, part: u64, total: u64) -> bool {
        part.saturating_mul(self.pollution_den) > total.saturating_mul(self.pollution_num)
    }

    /// `part` é minoria em `total` (< 1 - num/den)?
    #[inline]
    pub fn minority(&self, part: u64, total: u64) -> bool {
        part.saturating_mul(self.pollution_den)
            < total.saturating_mul(self.pollution_den - self.pollution_num)
    }
}
