//! # Shrinkers
//!
//! Callbacks de pressão de memória. Um subsistema que segura páginas que
//! podem ser devolvidas (caches) registra um `Shrinker`; quando uma alocação
//! com `Gfp::DIRECT_RECLAIM` falha, o alocador pede de volta até
//! `nr_to_scan` páginas.

use alloc::sync::Arc;

use crate::mm::alloc::hooks::{HookId, HookList};

/// Cache que devolve páginas sob pressão.
pub trait Shrinker: Send + Sync {
    fn name(&self) -> &'static str;

    /// Páginas que poderiam ser liberadas agora.
    fn count_objects(&self) -> usize;

    /// Libera até `nr_to_scan` páginas; retorna quantas foram liberadas.
    fn scan_objects(&self, nr_to_scan: usize) -> usize;
}

/// Shrinkers registrados numa zona
#[derive(Default)]
pub struct ShrinkerList {
    shrinkers: HookList<dyn Shrinker>,
}

impl ShrinkerList {
    pub const fn new() -> Self {
        Self {
            shrinkers: HookList::new(),
        }
    }

    pub fn register(&self, shrinker: Arc<dyn Shrinker>) -> HookId {
        crate::kdebug!("(Shrink) registrado: {}", shrinker.name());
        self.shrinkers.register(shrinker)
    }

    pub fn unregister(&self, id: HookId) -> bool {
        self.shrinkers.unregister(id)
    }

    /// Total de páginas recuperáveis
    pub fn count(&self) -> usize {
        let mut total = 0;
        self.shrinkers.for_each(|s| total += s.count_objects());
        total
    }

    /// Pede até `nr_to_scan` páginas aos shrinkers, em ordem de registro.
    pub fn shrink(&self, nr_to_scan: usize) -> usize {
        let mut freed = 0;
        self.shrinkers.for_each(|s| {
            if freed >= nr_to_scan {
                return;
            }
            let available = s.count_objects();
            if available == 0 {
                return;
            }
            let want = core::cmp::min(available, nr_to_scan - freed);
            let got = s.scan_objects(want);
            crate::ktrace!("(Shrink) {}: pedido={} liberado={}", s.name(), want, got);
            freed += got;
        });
        freed
    }

    pub fn len(&self) -> usize {
        self.shrinkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shrinkers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    struct Pool(AtomicUsize);

    impl Shrinker for Pool {
        fn name(&self) -> &'static str {
            "pool"
        }

        fn count_objects(&self) -> usize {
            self.0.load(Ordering::Relaxed)
        }

        fn scan_objects(&self, nr_to_scan: usize) -> usize {
            let held = self.0.load(Ordering::Relaxed);
            let n = core::cmp::min(held, nr_to_scan);
            self.0.fetch_sub(n, Ordering::Relaxed);
            n
        }
    }

    #[test]
    fn shrink_walks_shrinkers_until_target() {
        let list = ShrinkerList::new();
        let a = Arc::new(Pool(AtomicUsize::new(10)));
        let b = Arc::new(Pool(AtomicUsize::new(10)));
        list.register(a.clone());
        list.register(b.clone());

        assert_eq!(list.count(), 20);
        assert_eq!(list.shrink(15), 15);
        assert_eq!(a.count_objects(), 0);
        assert_eq!(b.count_objects(), 5);
    }
}
