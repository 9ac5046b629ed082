//! Contadores do pgboost
//!
//! Todos monotônicos, atualizados com `Relaxed`: só servem ao dump de
//! status e aos testes.

use core::sync::atomic::{AtomicU64, Ordering};

macro_rules! pgboost_stats {
    ($($(#[$doc:meta])* $field:ident),+ $(,)?) => {
        /// Estatísticas do motor
        #[derive(Debug, Default)]
        pub struct PgboostStats {
            $($(#[$doc])* pub $field: AtomicU64,)+
        }

        /// Cópia dos contadores num instante
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
        pub struct StatsSnapshot {
            $(pub $field: u64,)+
        }

        impl PgboostStats {
            pub fn snapshot(&self) -> StatsSnapshot {
                StatsSnapshot {
                    $($field: self.$field.load(Ordering::Relaxed),)+
                }
            }
        }

        impl StatsSnapshot {
            /// Pares (nome, valor) na ordem de declaração
            pub fn fields(&self) -> impl Iterator<Item = (&'static str, u64)> {
                [$((stringify!($field), self.$field),)+].into_iter()
            }
        }
    };
}

pgboost_stats! {
    /// Passes completos executados
    full_passes,
    /// Passes leves executados
    light_passes,
    /// Passes disparados por `kick`
    manual_passes,
    /// Disparos barrados pelo cooldown
    skipped_cooldown,
    /// Disparos barrados por outro passe em andamento
    skipped_busy,
    decisions_nofavor,
    decisions_favor,
    decisions_strict,
    /// Blocos movidos de Unmovable/Reclaimable para Movable
    reclassified,
    /// Blocos favorecidos levados à cabeça
    moved_head,
    /// Blocos favorecidos levados à cauda
    moved_tail,
    /// Alocações servidas pelo rank favorecido
    alloc_hits,
    alloc_misses,
    /// Frees fora do rank favorecido
    violations,
    /// Trabalhos de evento enfileirados
    event_queued,
    cache_collected,
    cache_released,
    /// Alocações do side cache que caíram no rank favorecido
    cache_mismatches,
}

impl PgboostStats {
    #[inline]
    pub(crate) fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let stats = PgboostStats::default();
        PgboostStats::inc(&stats.full_passes);
        PgboostStats::add(&stats.moved_head, 5);

        let snap = stats.snapshot();
        assert_eq!(snap.full_passes, 1);
        assert_eq!(snap.moved_head, 5);
        assert_eq!(snap.fields().next(), Some(("full_passes", 1)));
        assert_eq!(snap.fields().count(), 18);
    }
}
