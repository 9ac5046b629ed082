//! # Testes do Subsistema de Memória
//!
//! Organização modular dos testes:
//! - `fixture.rs` - Zonas, relógio e motor prontos para os testes
//! - `buddy_test.rs` - Alocador de referência (split, coalescência, pcp, hooks)
//! - `decision_test.rs` - Decisão sobre listas reais + cenário de 2 ranks
//! - `rebalance_test.rs` - Reclassificação Unmovable/Reclaimable → Movable
//! - `reorder_test.rs` - Reordenação, conservação e idempotência
//! - `sidecache_test.rs` - Side cache e shrinker
//! - `trigger_test.rs` - Kick, cooldown, eventos, trabalho periódico
//! - `engine_test.rs` - Init fail-closed, parâmetros, status, shutdown


mod buddy_test;
mod decision_test;
mod sidecache_test;
