//! # Configuração do Módulo de Memória
//!
//! Define constantes e configurações globais do alocador de referência e do
//! motor pgboost.

// =============================================================================
// CONSTANTES DE TAMANHO
// =============================================================================

/// Tamanho de uma página (4 KiB)
pub const PAGE_SIZE: usize = 4096;

/// Bits de offset dentro de uma página
pub const PAGE_SHIFT: usize = 12;

// =============================================================================
// CONFIGURAÇÃO DO BUDDY
// =============================================================================

/// Número de ordens do Buddy allocator (0..MAX_ORDER, 2^10 páginas = 4 MiB)
pub const MAX_ORDER: usize = 11;

/// Maior ordem válida
pub const MAX_ORDER_IDX: usize = MAX_ORDER - 1;

/// Ordem de uma huge page transparente (2 MiB / 4 KiB = 2^9)
pub const HPAGE_PMD_ORDER: usize = 9;

/// Ordem de um pageblock (granularidade da tag de migrate type)
pub const PAGEBLOCK_ORDER: usize = HPAGE_PMD_ORDER;

// =============================================================================
// CONFIGURAÇÃO SMP
// =============================================================================

/// Máximo de páginas em cache por CPU antes de devolver um lote ao buddy
pub const PCP_HIGH: usize = 64;

/// Lote devolvido ao buddy quando o cache por CPU enche
pub const PCP_BATCH: usize = 16;

// =============================================================================
// CONFIGURAÇÃO DO PGBOOST
// =============================================================================

/// Piso de páginas livres (256K páginas = 1 GiB). Abaixo disso o motor não
/// reordena, e é também o limiar de diferença entre ranks e de violações.
pub const LEAST_TOTAL_PGS: u64 = 256 * 1024;

/// Blocos reclassificados por aquisição do zone lock
pub const REBALANCE_BATCH: usize = 64;

/// Tentativas máximas do rebalanceador
pub const REBALANCE_RETRIES: usize = 9;

/// Tentativas seguidas sem progresso antes de desistir
pub const REBALANCE_IDLE_LIMIT: usize = 2;

/// Entradas amostradas no início de cada free list para detectar poluição
pub const ZONE_BATCH: usize = 63;

/// Período do trabalho periódico (segundos)
pub const PERIODIC_INTERVAL_SECS: u64 = 10;

/// Cooldown do caminho periódico (segundos)
pub const PERIODIC_COOLDOWN_SECS: u64 = 10;

/// Cooldown do caminho por eventos (segundos)
pub const EVENT_COOLDOWN_SECS: u64 = 1;

/// Número de ranks suportados
pub const NR_RANKS: usize = 2;

// =============================================================================
// FUNÇÕES UTILITÁRIAS
// =============================================================================

/// Páginas em um bloco de ordem `order`
#[inline(always)]
pub const fn order_pages(order: usize) -> u64 {
    1 << order
}

/// Converte bytes em número de páginas (arredonda para baixo)
#[inline(always)]
pub const fn bytes_to_pages(bytes: u64) -> u64 {
    bytes >> PAGE_SHIFT
}

/// Verifica se valor está alinhado
#[inline(always)]
pub const fn is_aligned(val: u64, align: u64) -> bool {
    val & (align - 1) == 0
}
