//! # Page Reclaim Subsystem
//!
//! Pressão de memória e shrinkers.

pub mod shrinker;

pub use shrinker::{Shrinker, ShrinkerList};

use crate::mm::config::order_pages;

/// Limiares de páginas livres (em páginas)
pub struct MemoryWatermarks {
    pub low: u64,
    pub high: u64,
    pub min: u64,
}

impl Default for MemoryWatermarks {
    fn default() -> Self {
        Self {
            low: 1024,
            high: 4096,
            min: 256,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPressure {
    None,
    Low,
    Medium,
    Critical,
}

impl MemoryPressure {
    /// Classifica a pressão a partir das páginas livres
    pub fn from_free(free: u64, wm: &MemoryWatermarks) -> Self {
        if free > wm.high {
            MemoryPressure::None
        } else if free > wm.low {
            MemoryPressure::Low
        } else if free > wm.min {
            MemoryPressure::Medium
        } else {
            MemoryPressure::Critical
        }
    }

    /// Páginas pedidas aos shrinkers num ciclo de recuperação
    pub fn scan_target(&self) -> usize {
        match self {
            MemoryPressure::None => 0,
            MemoryPressure::Low => 16,
            MemoryPressure::Medium => 64,
            MemoryPressure::Critical => 256,
        }
    }
}

/// Quantas páginas pedir aos shrinkers após falhar uma alocação de `order`.
pub fn reclaim_target(free: u64, order: usize) -> usize {
    let pressure = MemoryPressure::from_free(free, &MemoryWatermarks::default());
    core::cmp::max(pressure.scan_target(), order_pages(order) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressure_levels_follow_watermarks() {
        let wm = MemoryWatermarks::default();
        assert_eq!(MemoryPressure::from_free(10_000, &wm), MemoryPressure::None);
        assert_eq!(MemoryPressure::from_free(2_000, &wm), MemoryPressure::Low);
        assert_eq!(MemoryPressure::from_free(500, &wm), MemoryPressure::Medium);
        assert_eq!(MemoryPressure::from_free(10, &wm), MemoryPressure::Critical);
    }

    #[test]
    fn reclaim_target_covers_request() {
        assert_eq!(reclaim_target(10, 0), 256);
        assert_eq!(reclaim_target(100_000, 9), 512);
    }
}
