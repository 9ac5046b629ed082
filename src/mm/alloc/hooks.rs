//! # Hooks do Alocador
//!
//! Observadores síncronos dos caminhos de alocação e liberação (equivalente
//! aos tracepoints `mm_page_alloc` / `mm_page_free`).
//!
//! Os callbacks executam inline em TODA liberação/alocação, com o read lock
//! da lista de hooks adquirido: devem ser O(1) e não podem registrar ou
//! remover hooks nem adquirir o zone lock.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

use spin::RwLock;

use super::gfp::Gfp;

/// Identificador devolvido no registro de um hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// Observador de eventos de página.
pub trait PageObserver: Send + Sync {
    /// Um bloco de `2^order` páginas começando em `pfn` foi liberado.
    fn on_page_free(&self, pfn: u64, order: usize);

    /// Um bloco foi entregue a um chamador.
    fn on_page_alloc(&self, _pfn: u64, _order: usize, _gfp: Gfp) {}
}

/// Lista de hooks registrados.
pub struct HookList<T: ?Sized> {
    hooks: RwLock<Vec<(HookId, Arc<T>)>>,
    next_id: AtomicU64,
}

impl<T: ?Sized> HookList<T> {
    pub const fn new() -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn register(&self, hook: Arc<T>) -> HookId {
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.hooks.write().push((id, hook));
        id
    }

    /// Remove o hook. Retorna `false` se o id não estava registrado.
    pub fn unregister(&self, id: HookId) -> bool {
        let mut hooks = self.hooks.write();
        let before = hooks.len();
        hooks.retain(|(hid, _)| *hid != id);
        before != hooks.len()
    }

    /// Executa `f` para cada hook registrado.
    pub fn for_each(&self, mut f: impl FnMut(&T)) {
        for (_, hook) in self.hooks.read().iter() {
            f(hook);
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized> Default for HookList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicUsize;

    struct Counter(AtomicUsize);

    impl PageObserver for Counter {
        fn on_page_free(&self, _pfn: u64, order: usize) {
            self.0.fetch_add(1 << order, Ordering::Relaxed);
        }
    }

    #[test]
    fn register_and_unregister() {
        let list: HookList<dyn PageObserver> = HookList::new();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let id = list.register(counter.clone());

        list.for_each(|h| h.on_page_free(0, 3));
        assert_eq!(counter.0.load(Ordering::Relaxed), 8);

        assert!(list.unregister(id));
        assert!(!list.unregister(id));
        list.for_each(|h| h.on_page_free(0, 3));
        assert_eq!(counter.0.load(Ordering::Relaxed), 8);
        assert!(list.is_empty());
    }
}
