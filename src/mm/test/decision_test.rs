//! Testes da Decision Engine sobre free lists reais

use super::fixture::{empty_zone, engine_on, seed, small_config, two_rank_scenario};
use crate::mm::alloc::MigrateType;
use crate::mm::pgboost::decision::scan_free_area;
use crate::mm::pgboost::PgboostAction;

#[test]
fn two_rank_scenario_favors_rank1() {
    let fx = two_rank_scenario();
    assert_eq!(fx.engine.next_pgboost_action(false), PgboostAction::favor(1));

    // Efeito colateral: contagens por rank atualizadas
    let map = fx.engine.rank_map();
    assert_eq!(map.rank(0).free(), 512 + 16 + 8 + 1);
    assert_eq!(map.rank(1).free(), 9 * 512 + 16 + 4 + 1);
    assert_eq!(fx.engine.stats().snapshot().decisions_favor, 1);
}

#[test]
fn scan_ignores_cma_and_weights_by_order() {
    let zone = empty_zone(2048);
    seed(&zone, 10, MigrateType::Movable, &[1024]);
    seed(&zone, 9, MigrateType::Unmovable, &[0]);
    seed(&zone, 9, MigrateType::Cma, &[512]);
    seed(&zone, 1, MigrateType::Reclaimable, &[1500]);
    let fx = engine_on(zone, [1000, 1000], small_config(64));

    let scan = {
        let area = fx.zone.area().lock();
        scan_free_area(&area, fx.engine.rank_map(), fx.engine.config())
    };
    assert_eq!(scan.free, [512, 1024 + 2]);
    assert_eq!(scan.huge, [512, 1024]);
    assert_eq!(scan.head, [1, 1]);
}

#[test]
fn threshold_monotonicity_on_real_lists() {
    // rank1 - rank0 >= piso → rank1
    let zone = empty_zone(4096);
    seed(&zone, 10, MigrateType::Movable, &[2048, 3072]);
    seed(&zone, 9, MigrateType::Movable, &[0]);
    let fx = engine_on(zone, [2048, 2048], small_config(1024));
    assert_eq!(fx.engine.next_pgboost_action(false), PgboostAction::favor(1));

    // rank0 - rank1 >= piso → rank0
    let zone = empty_zone(4096);
    seed(&zone, 10, MigrateType::Movable, &[0, 1024]);
    seed(&zone, 9, MigrateType::Movable, &[2048]);
    let fx = engine_on(zone, [2048, 2048], small_config(1024));
    assert_eq!(fx.engine.next_pgboost_action(false), PgboostAction::favor(0));

    // equilibrado, sem rank favorecido ainda → NoFavor
    let zone = empty_zone(4096);
    seed(&zone, 10, MigrateType::Movable, &[0, 2048]);
    seed(&zone, 9, MigrateType::Movable, &[1024, 3072]);
    let fx = engine_on(zone, [2048, 2048], small_config(1024));
    assert_eq!(fx.engine.next_pgboost_action(false), PgboostAction::NoFavor);
}

#[test]
fn below_floor_only_force_decides() {
    let zone = empty_zone(2048);
    seed(&zone, 9, MigrateType::Movable, &[1024, 1536]);
    let fx = engine_on(zone, [1000, 1000], small_config(4096));
    assert_eq!(fx.engine.next_pgboost_action(false), PgboostAction::NoFavor);
    assert_eq!(fx.engine.next_pgboost_action(true), PgboostAction::favor(1));
}

#[test]
fn polluted_head_requests_strict_pass() {
    let zone = empty_zone(4096);
    seed(&zone, 10, MigrateType::Movable, &[2048, 3072]);
    seed(&zone, 9, MigrateType::Movable, &[0, 512, 1024, 1536]);
    seed(&zone, 9, MigrateType::Unmovable, &[100, 200, 300]);
    let fx = engine_on(zone, [2048, 2048], small_config(2048));

    // huge: rank0 = 7 * 512, rank1 = 2 * 1024; nenhuma regra de volume
    // dispara e ainda não há rank favorecido
    assert_eq!(fx.engine.next_pgboost_action(false), PgboostAction::NoFavor);

    // Com rank1 favorecido, 7 de 9 cabeças amostradas no rank0 é poluição:
    // o rank0 passa a ser o favorecido, com passe completo
    fx.engine.do_pgboost_list_reordering(true, true, false).unwrap();
    assert_eq!(fx.engine.favored_rank(), Some(1));
    assert_eq!(fx.engine.next_pgboost_action(false), PgboostAction::strict(0));
    assert_eq!(fx.engine.stats().snapshot().decisions_strict, 1);
}
