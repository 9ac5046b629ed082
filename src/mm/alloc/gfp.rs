//! # Política de Alocação (GFP) e Classes de Migração
//!
//! Cada bloco livre do buddy pertence a uma *migrate class*, que indica se
//! as páginas podem ser realocadas por compactação. As flags GFP de um pedido
//! determinam a classe preferida e o comportamento em caso de falha.

use bitflags::bitflags;

/// Número de classes de migração
pub const MIGRATE_TYPES: usize = 5;

/// Classe de migração de um bloco livre / pageblock
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum MigrateType {
    /// Páginas do kernel que não podem ser movidas
    Unmovable = 0,
    /// Páginas de usuário / page cache, migráveis
    Movable = 1,
    /// Caches recuperáveis (slab reclaimable)
    Reclaimable = 2,
    /// Reserva para alocações atômicas de alta ordem
    HighAtomic = 3,
    /// Contiguous Memory Allocator
    Cma = 4,
}

impl MigrateType {
    /// Todas as classes em ordem de índice
    pub const ALL: [Self; MIGRATE_TYPES] = [
        Self::Unmovable,
        Self::Movable,
        Self::Reclaimable,
        Self::HighAtomic,
        Self::Cma,
    ];

    /// Índice da classe nas tabelas por (ordem, classe)
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Nome da classe
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unmovable => "Unmovable",
            Self::Movable => "Movable",
            Self::Reclaimable => "Reclaimable",
            Self::HighAtomic => "HighAtomic",
            Self::Cma => "CMA",
        }
    }

    pub fn is_cma(&self) -> bool {
        matches!(self, Self::Cma)
    }

    /// Classes consultadas quando a lista preferida está vazia.
    pub fn fallbacks(&self) -> &'static [Self] {
        match self {
            Self::Unmovable => &[Self::Reclaimable, Self::Movable],
            Self::Reclaimable => &[Self::Unmovable, Self::Movable],
            Self::Movable => &[Self::Reclaimable, Self::Unmovable],
            Self::HighAtomic | Self::Cma => &[],
        }
    }
}

bitflags! {
    /// Flags de alocação (Get Free Pages)
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Gfp: u32 {
        /// Pedido migrável (page cache, anônimas)
        const MOVABLE = 1 << 0;
        /// Pedido recuperável (slab reclaimable)
        const RECLAIMABLE = 1 << 1;
        /// Pode usar pageblocks CMA como fallback de pedidos migráveis
        const CMA = 1 << 2;
        /// Não registrar falha em log
        const NOWARN = 1 << 3;
        /// Não repetir após a primeira falha
        const NORETRY = 1 << 4;
        /// Pode invocar shrinkers para liberar memória
        const DIRECT_RECLAIM = 1 << 5;

        /// Alocação genérica do kernel
        const KERNEL = Self::DIRECT_RECLAIM.bits();
        /// Alocação migrável de usuário
        const HIGHUSER_MOVABLE = Self::MOVABLE.bits() | Self::CMA.bits() | Self::DIRECT_RECLAIM.bits();
    }
}

impl Gfp {
    /// Classe de migração preferida pelo pedido
    pub fn migratetype(&self) -> MigrateType {
        if self.contains(Gfp::MOVABLE) {
            MigrateType::Movable
        } else if self.contains(Gfp::RECLAIMABLE) {
            MigrateType::Reclaimable
        } else {
            MigrateType::Unmovable
        }
    }
}
