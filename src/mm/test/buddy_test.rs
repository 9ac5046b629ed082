//! Testes do alocador de referência (BuddyZone)

use alloc::sync::Arc;
use core::sync::atomic::{AtomicUsize, Ordering};

use super::fixture::{counts, empty_zone, movable};
use crate::mm::alloc::{BuddyZone, Gfp, MigrateType, PageObserver};
use crate::mm::config::PCP_BATCH;
use crate::mm::error::PgboostError;
use crate::mm::pmm::zones::ZoneSpan;
use crate::mm::reclaim::Shrinker;

fn online_zone(pages: u64) -> Arc<BuddyZone> {
    let zone = empty_zone(pages);
    zone.online_pages(0, pages).unwrap();
    zone
}

#[derive(Default)]
struct CountingObserver {
    frees: AtomicUsize,
    allocs: AtomicUsize,
}

impl PageObserver for CountingObserver {
    fn on_page_free(&self, _pfn: u64, _order: usize) {
        self.frees.fetch_add(1, Ordering::Relaxed);
    }

    fn on_page_alloc(&self, _pfn: u64, _order: usize, _gfp: Gfp) {
        self.allocs.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Default)]
struct IdleShrinker {
    scans: AtomicUsize,
}

impl Shrinker for IdleShrinker {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn count_objects(&self) -> usize {
        5
    }

    fn scan_objects(&self, _nr_to_scan: usize) -> usize {
        self.scans.fetch_add(1, Ordering::Relaxed);
        0
    }
}

#[test]
fn online_pages_uses_largest_blocks() {
    let zone = online_zone(4096);
    assert_eq!(zone.nr_free_pages(), 4096);
    assert_eq!(movable(&zone, 10), [3072, 2048, 1024, 0]);
    assert_eq!(zone.online_pages(0, 8192), Err(PgboostError::InvalidAddress));
}

#[test]
fn split_and_coalesce_restore_counts() {
    let zone = online_zone(4096);
    let before = counts(&zone);

    let pfn = zone.alloc_pages_on(0, 0, Gfp::MOVABLE).unwrap();
    assert_eq!(pfn, 3072);
    assert_eq!(zone.nr_free_pages(), 4095);
    for order in 0..10 {
        assert_eq!(movable(&zone, order), [3072 + (1u64 << order)]);
    }

    // Ordem 0 fica no cache da CPU até o drain
    zone.free_pages_on(0, pfn, 0).unwrap();
    assert_eq!(zone.pcp().total(), 1);
    assert_eq!(zone.nr_free_pages(), 4095);

    assert_eq!(zone.drain_all_pages(), 1);
    assert_eq!(counts(&zone), before);
}

#[test]
fn rejects_double_free_and_bad_blocks() {
    let zone = online_zone(4096);
    let pfn = zone.alloc_pages_on(0, 1, Gfp::MOVABLE).unwrap();
    assert_eq!(zone.free_pages_on(0, pfn, 1), Ok(()));
    assert_eq!(zone.free_pages_on(0, pfn, 1), Err(PgboostError::InvalidAddress));
    assert_eq!(zone.free_pages_on(0, 4096, 0), Err(PgboostError::InvalidAddress));
    assert_eq!(zone.free_pages_on(0, 1, 1), Err(PgboostError::InvalidAddress));
    assert_eq!(zone.free_pages_on(0, 0, 11), Err(PgboostError::InvalidAddress));
}

#[test]
fn pcp_flushes_oldest_batch() {
    let zone = online_zone(4096);
    let pages: alloc::vec::Vec<u64> = (0..64)
        .map(|_| zone.alloc_pages_on(0, 0, Gfp::MOVABLE).unwrap())
        .collect();
    for &pfn in &pages {
        zone.free_pages_on(0, pfn, 0).unwrap();
    }
    assert_eq!(zone.pcp().total(), 64 - PCP_BATCH);

    zone.drain_all_pages();
    assert_eq!(zone.nr_free_pages(), 4096);
}

#[test]
fn fallback_steals_whole_pageblocks() {
    let zone = online_zone(2048);
    let pfn = zone.alloc_pages_on(0, 9, Gfp::KERNEL).unwrap();
    assert_eq!(pfn, 1024);
    assert_eq!(zone.area().lock().pageblock_migratetype(1536), MigrateType::Unmovable);
    assert_eq!(zone.area().lock().nr_free(9, MigrateType::Unmovable), 1);
    assert_eq!(zone.stats().fallback_count.load(Ordering::Relaxed), 1);
}

#[test]
fn observers_see_alloc_and_free() {
    let zone = online_zone(4096);
    let obs = Arc::new(CountingObserver::default());
    let id = zone.register_observer(obs.clone());

    let pfn = zone.alloc_pages_on(0, 3, Gfp::MOVABLE).unwrap();
    zone.free_pages_on(0, pfn, 3).unwrap();
    assert_eq!(obs.allocs.load(Ordering::Relaxed), 1);
    assert_eq!(obs.frees.load(Ordering::Relaxed), 1);
    assert_eq!(zone.stats().pages_freed(), 8);

    assert!(zone.unregister_observer(id));
    zone.free_pages_on(0, zone.alloc_pages_on(0, 3, Gfp::MOVABLE).unwrap(), 3).unwrap();
    assert_eq!(obs.frees.load(Ordering::Relaxed), 1);
}

#[test]
fn rejected_frees_are_not_observed() {
    let zone = online_zone(4096);
    let obs = Arc::new(CountingObserver::default());
    zone.register_observer(obs.clone());

    let pfn = zone.alloc_pages_on(0, 1, Gfp::MOVABLE).unwrap();
    zone.free_pages_on(0, pfn, 1).unwrap();
    assert_eq!(zone.free_pages_on(0, pfn, 1), Err(PgboostError::InvalidAddress));
    assert_eq!(obs.frees.load(Ordering::Relaxed), 1);
    assert_eq!(zone.stats().pages_freed(), 2);

    // Ordem 0: duplicata no cache da CPU e depois nas free lists
    let page = zone.alloc_pages_on(0, 0, Gfp::MOVABLE).unwrap();
    zone.free_pages_on(0, page, 0).unwrap();
    assert_eq!(zone.free_pages_on(0, page, 0), Err(PgboostError::InvalidAddress));
    assert_eq!(zone.free_pages_on(1, page, 0), Err(PgboostError::InvalidAddress));
    zone.drain_all_pages();
    assert_eq!(zone.free_pages_on(0, page, 0), Err(PgboostError::InvalidAddress));
    assert_eq!(zone.free_pages_on(0, 5, 0), Err(PgboostError::InvalidAddress));

    assert_eq!(obs.frees.load(Ordering::Relaxed), 2);
    assert_eq!(zone.stats().pages_freed(), 3);
    assert_eq!(zone.nr_free_pages(), 4096);
}

#[test]
fn direct_free_skips_cpu_cache_and_observers() {
    let zone = online_zone(4096);
    let obs = Arc::new(CountingObserver::default());
    zone.register_observer(obs.clone());

    let pfn = zone.alloc_pages_on(0, 0, Gfp::MOVABLE).unwrap();
    assert_eq!(zone.free_pages_direct(pfn, 0), Ok(()));
    assert_eq!(zone.pcp().total(), 0);
    assert_eq!(zone.nr_free_pages(), 4096);
    assert_eq!(obs.frees.load(Ordering::Relaxed), 0);
    assert_eq!(zone.stats().pages_freed(), 0);

    assert_eq!(zone.free_pages_direct(pfn, 0), Err(PgboostError::InvalidAddress));
    assert_eq!(zone.free_pages_direct(1, 1), Err(PgboostError::InvalidAddress));
}

#[test]
fn failed_reclaim_alloc_asks_shrinkers() {
    let zone = Arc::new(BuddyZone::new(ZoneSpan::new(0, 1024), 1));
    let shrinker = Arc::new(IdleShrinker::default());
    zone.register_shrinker(shrinker.clone());

    assert_eq!(zone.alloc_pages_on(0, 0, Gfp::MOVABLE | Gfp::NOWARN), None);
    assert_eq!(shrinker.scans.load(Ordering::Relaxed), 0);

    assert_eq!(zone.alloc_pages_on(0, 0, Gfp::HIGHUSER_MOVABLE | Gfp::NOWARN), None);
    assert_eq!(shrinker.scans.load(Ordering::Relaxed), 1);
    assert_eq!(zone.stats().failed_count.load(Ordering::Relaxed), 2);
}
