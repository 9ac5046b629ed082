//! Testes do side cache e do seu shrinker

use alloc::sync::Arc;

use super::fixture::{counts, empty_zone, engine_on, movable, small_config, Fixture};
use crate::mm::config::MAX_ORDER;
use crate::mm::pgboost::sidecache::SideCacheShrinker;
use crate::mm::reclaim::Shrinker;

/// Blocos reais de ordem 2: três no rank0 (0, 8, 16) e dois no rank1.
fn small_blocks() -> Fixture {
    let zone = empty_zone(2048);
    for pfn in [0, 8, 16, 1024, 1032] {
        zone.free_pages_on(0, pfn, 2).unwrap();
    }
    assert_eq!(movable(&zone, 2), [1032, 1024, 16, 8, 0]);
    engine_on(zone, [1000, 1000], small_config(64))
}

#[test]
fn hold_small_collects_unfavored_surplus() {
    let fx = small_blocks();

    fx.engine.do_pgboost_list_reordering(false, true, true).unwrap();

    // Favorecidos vão para a cauda; excedente do rank0 = 3 - 2 = 1 bloco
    assert_eq!(movable(&fx.zone, 2), [8, 0, 1032, 1024]);
    let cache = fx.engine.side_cache();
    assert_eq!(cache.held_pages(), 4);
    assert_eq!(cache.occupancy()[2], 1);
    assert_eq!(fx.engine.stats().snapshot().cache_collected, 1);
}

#[test]
fn release_restores_free_lists() {
    let fx = small_blocks();
    let before = counts(&fx.zone);

    fx.engine.do_pgboost_list_reordering(false, true, true).unwrap();
    assert_ne!(counts(&fx.zone), before);

    let released = fx
        .engine
        .side_cache()
        .release(fx.engine.zone(), u64::MAX, fx.engine.stats());
    assert_eq!(released, 4);
    assert!(fx.engine.side_cache().is_empty());
    assert_eq!(counts(&fx.zone), before);
    assert_eq!(fx.engine.stats().snapshot().cache_released, 1);
}

#[test]
fn order0_putback_bypasses_cpu_caches() {
    let zone = empty_zone(2048);
    for pfn in [0, 2, 4, 1024] {
        zone.free_pages_on(0, pfn, 0).unwrap();
    }
    zone.drain_all_pages();
    let fx = engine_on(zone, [1000, 1000], small_config(64));
    assert_eq!(movable(&fx.zone, 0), [1024, 4, 2, 0]);
    let before = counts(&fx.zone);
    let freed = fx.zone.stats().pages_freed();

    let mut surplus = [0u64; MAX_ORDER];
    surplus[0] = 2;
    let cache = fx.engine.side_cache();

    // Cabeça já é do rank1: mismatch imediato
    assert_eq!(
        cache.collect(fx.engine.zone(), fx.engine.rank_map(), &surplus, true, fx.engine.stats()),
        0
    );
    assert_eq!(movable(&fx.zone, 0), [1024, 4, 2, 0]);

    // Rank0 favorecido: 1024 fica retido, 4 volta como mismatch
    assert_eq!(
        cache.collect(fx.engine.zone(), fx.engine.rank_map(), &surplus, false, fx.engine.stats()),
        1
    );
    assert_eq!(movable(&fx.zone, 0), [4, 2, 0]);
    assert_eq!(cache.release(fx.engine.zone(), u64::MAX, fx.engine.stats()), 1);

    assert_eq!(movable(&fx.zone, 0), [1024, 4, 2, 0]);
    assert_eq!(counts(&fx.zone), before);
    assert_eq!(fx.zone.pcp().total(), 0);
    assert_eq!(fx.zone.stats().pages_freed(), freed);
    assert_eq!(fx.engine.stats().snapshot().cache_mismatches, 2);
}

#[test]
fn next_pass_releases_before_reordering() {
    let fx = small_blocks();
    fx.engine.do_pgboost_list_reordering(false, true, true).unwrap();
    assert_eq!(fx.engine.side_cache().held_pages(), 4);

    fx.engine.do_pgboost_list_reordering(false, true, false).unwrap();
    assert!(fx.engine.side_cache().is_empty());
    assert_eq!(fx.zone.nr_free_pages(), 5 * 4);
}

#[test]
fn favored_block_is_a_mismatch_and_stops_the_order() {
    let zone = empty_zone(2048);
    for pfn in [1024, 1032, 0, 8] {
        zone.free_pages_on(0, pfn, 2).unwrap();
    }
    let fx = engine_on(zone, [1000, 1000], small_config(64));
    assert_eq!(movable(&fx.zone, 2), [8, 0, 1032, 1024]);

    let mut surplus = [0u64; MAX_ORDER];
    surplus[2] = 5;
    let collected = fx.engine.side_cache().collect(
        fx.engine.zone(),
        fx.engine.rank_map(),
        &surplus,
        true,
        fx.engine.stats(),
    );

    assert_eq!(collected, 8);
    assert_eq!(fx.engine.side_cache().held_pages(), 8);
    assert_eq!(movable(&fx.zone, 2), [1032, 1024]);
    let snap = fx.engine.stats().snapshot();
    assert_eq!(snap.cache_mismatches, 1);
    assert_eq!(snap.cache_collected, 2);
}

#[test]
fn allocation_failure_stops_collect() {
    let fx = engine_on(empty_zone(2048), [1000, 1000], small_config(64));
    let mut surplus = [0u64; MAX_ORDER];
    surplus[0] = 3;
    surplus[4] = 1;

    let collected = fx.engine.side_cache().collect(
        fx.engine.zone(),
        fx.engine.rank_map(),
        &surplus,
        true,
        fx.engine.stats(),
    );
    assert_eq!(collected, 0);
    assert!(fx.engine.side_cache().is_empty());
}

#[test]
fn release_respects_budget_smaller_orders_first() {
    let zone = empty_zone(2048);
    for (pfn, order) in [(0, 0), (2, 1), (16, 3)] {
        zone.free_pages_on(0, pfn, order).unwrap();
    }
    zone.drain_all_pages();
    let fx = engine_on(zone, [1000, 1000], small_config(64));

    let mut surplus = [0u64; MAX_ORDER];
    surplus[0] = 1;
    surplus[1] = 1;
    surplus[3] = 1;
    let cache = fx.engine.side_cache();
    assert_eq!(
        cache.collect(fx.engine.zone(), fx.engine.rank_map(), &surplus, true, fx.engine.stats()),
        11
    );

    // Orçamento de 4 páginas: ordem 0 (1) + ordem 1 (2); ordem 3 não cabe
    assert_eq!(cache.release(fx.engine.zone(), 4, fx.engine.stats()), 3);
    assert_eq!(cache.held_pages(), 8);
    assert_eq!(cache.occupancy()[3], 1);
    assert_eq!(cache.release(fx.engine.zone(), 7, fx.engine.stats()), 0);
    assert_eq!(cache.release(fx.engine.zone(), 8, fx.engine.stats()), 8);
    assert!(cache.is_empty());
}

#[test]
fn shrinker_reports_and_frees_held_pages() {
    let fx = small_blocks();
    fx.engine.do_pgboost_list_reordering(false, true, true).unwrap();

    assert_eq!(fx.zone.shrinkers().len(), 1);
    assert_eq!(fx.zone.shrinkers().count(), 4);

    let shrinker = SideCacheShrinker::new(Arc::downgrade(&fx.engine));
    assert_eq!(shrinker.name(), "pgboost-sidecache");
    assert_eq!(shrinker.scan_objects(1), 0);
    assert_eq!(fx.engine.side_cache().held_pages(), 4);

    assert_eq!(fx.zone.shrinkers().shrink(4), 4);
    assert_eq!(fx.zone.shrinkers().count(), 0);
}

#[test]
fn shrinker_putback_does_not_count_as_violation() {
    let fx = small_blocks();
    fx.engine.do_pgboost_list_reordering(false, true, true).unwrap();
    assert_eq!(fx.engine.favored_rank(), Some(1));
    assert_eq!(fx.engine.violations(), 0);

    // Bloco retido é do rank0, fora do favorecido
    assert_eq!(fx.zone.shrinkers().shrink(16), 4);
    assert!(fx.engine.side_cache().is_empty());
    assert_eq!(fx.engine.violations(), 0);
    let snap = fx.engine.stats().snapshot();
    assert_eq!(snap.violations, 0);
    assert_eq!(snap.event_queued, 0);
    assert_eq!(fx.wq.len(), 1);
}

#[test]
fn shrinker_outliving_engine_is_inert() {
    let fx = small_blocks();
    let shrinker = SideCacheShrinker::new(Arc::downgrade(&fx.engine));
    fx.engine.shutdown();
    drop(fx);

    assert_eq!(shrinker.count_objects(), 0);
    assert_eq!(shrinker.scan_objects(16), 0);
}
