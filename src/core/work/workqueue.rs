//! Arquivo: core/work/workqueue.rs
//!
//! Propósito: Implementação de Filas de Trabalho (Work Queues).
//! Permite agendar a execução de funções para um momento posterior, fora do
//! contexto do alocador (hooks de free/alloc não podem fazer trabalho pesado).
//!
//! Detalhes de Implementação:
//! - Usa `VecDeque` protegido por `spin::Mutex` para armazenar trabalhos.
//! - Cada trabalho tem um instante de expiração em jiffies (delayed work).
//! - Fila "unbound": qualquer número de worker threads pode consumir a fila
//!   em paralelo via `run_pending`; cada item é executado por um só worker.
//! - `cancel_work_sync` remove o item e espera a execução em andamento.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use spin::Mutex;

use crate::core::time::jiffies::{time_after_eq, Clock};

/// Um trabalho reagendável.
///
/// O mesmo `DelayedWork` pode ser enfileirado muitas vezes (inclusive por
/// ele mesmo, para trabalhos periódicos), mas no máximo uma vez pendente.
pub struct DelayedWork {
    name: &'static str,
    func: Box<dyn Fn() + Send + Sync>,
    pending: AtomicBool,
    disabled: AtomicBool,
    running: AtomicUsize,
}

impl DelayedWork {
    pub fn new<F>(name: &'static str, f: F) -> Arc<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Arc::new(Self {
            name,
            func: Box::new(f),
            pending: AtomicBool::new(false),
            disabled: AtomicBool::new(false),
            running: AtomicUsize::new(0),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Está na fila aguardando execução?
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Algum worker está executando este trabalho agora?
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) != 0
    }

    /// Foi cancelado via `cancel_work_sync`?
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// Reabilita um trabalho cancelado.
    pub fn enable(&self) {
        self.disabled.store(false, Ordering::Release);
    }
}

struct QueuedWork {
    expires: u64,
    work: Arc<DelayedWork>,
}

/// Fila de trabalho
pub struct WorkQueue {
    name: &'static str,
    queue: Mutex<VecDeque<QueuedWork>>,
    clock: Arc<dyn Clock>,
}

impl WorkQueue {
    /// Cria uma nova WorkQueue medindo expiração com `clock`.
    pub fn new(name: &'static str, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            queue: Mutex::new(VecDeque::new()),
            clock,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Relógio usado pela fila.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Enfileira para execução imediata.
    ///
    /// Retorna `false` se o trabalho já estava pendente ou foi cancelado.
    pub fn queue_work(&self, work: &Arc<DelayedWork>) -> bool {
        self.queue_delayed_work(work, 0)
    }

    /// Enfileira para execução após `delay` jiffies.
    ///
    /// Retorna `false` se o trabalho já estava pendente ou foi cancelado.
    pub fn queue_delayed_work(&self, work: &Arc<DelayedWork>, delay: u64) -> bool {
        if work.is_disabled() {
            return false;
        }
        if work.pending.swap(true, Ordering::AcqRel) {
            return false;
        }

        let expires = self.clock.jiffies().wrapping_add(delay);
        self.queue.lock().push_back(QueuedWork {
            expires,
            work: work.clone(),
        });

        crate::ktrace!("(WQ) {}: '{}' agendado para {}", self.name, work.name, expires);
        true
    }

    /// Executa um item expirado, se houver.
    ///
    /// Retorna `true` se um item foi retirado da fila.
    pub fn run_one(&self) -> bool {
        let now = self.clock.jiffies();

        // Retirar um item protegendo o lock o mínimo possível.
        // `running` é marcado ainda sob o lock para que `cancel_work_sync`
        // nunca observe o item fora da fila e fora de execução ao mesmo tempo.
        let work = {
            let mut q = self.queue.lock();
            let idx = match q.iter().position(|e| time_after_eq(now, e.expires)) {
                Some(idx) => idx,
                None => return false,
            };
            match q.remove(idx) {
                Some(entry) => {
                    entry.work.running.fetch_add(1, Ordering::AcqRel);
                    entry.work.pending.store(false, Ordering::Release);
                    entry.work
                }
                None => return false,
            }
        };

        if !work.is_disabled() {
            (work.func)();
        }
        work.running.fetch_sub(1, Ordering::AcqRel);
        true
    }

    /// Processa todos os itens expirados (Flush).
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        ran
    }

    /// Cancela o trabalho e espera a execução em andamento terminar.
    ///
    /// Após o retorno o trabalho não executa mais até `enable()`. Não pode
    /// ser chamado de dentro do próprio trabalho (esperaria por si mesmo).
    pub fn cancel_work_sync(&self, work: &Arc<DelayedWork>) -> bool {
        work.disabled.store(true, Ordering::Release);

        let removed = self.remove_queued(work);

        while work.is_running() {
            core::hint::spin_loop();
        }

        // Um reagendamento feito pela execução que acabou de terminar
        let removed = self.remove_queued(work) || removed;
        work.pending.store(false, Ordering::Release);

        crate::kdebug!("(WQ) {}: '{}' cancelado", self.name, work.name);
        removed
    }

    fn remove_queued(&self, work: &Arc<DelayedWork>) -> bool {
        let mut q = self.queue.lock();
        let before = q.len();
        q.retain(|e| !Arc::ptr_eq(&e.work, work));
        before != q.len()
    }

    /// Número de itens na fila (expirados ou não).
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Menor instante de expiração entre os itens pendentes.
    pub fn next_expiry(&self) -> Option<u64> {
        let now = self.clock.jiffies();
        self.queue
            .lock()
            .iter()
            .map(|e| e.expires)
            .min_by_key(|&exp| exp.wrapping_sub(now) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::Jiffies;

    fn queue() -> (Arc<Jiffies>, WorkQueue) {
        let clock = Arc::new(Jiffies::new());
        let wq = WorkQueue::new("test_wq", clock.clone());
        (clock, wq)
    }

    #[test]
    fn delayed_work_waits_for_expiry() {
        let (clock, wq) = queue();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let work = DelayedWork::new("w", move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert!(wq.queue_delayed_work(&work, 10));
        assert!(!wq.queue_delayed_work(&work, 10), "já pendente");
        assert_eq!(wq.run_pending(), 0);

        clock.advance(10);
        assert_eq!(wq.run_pending(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!work.is_pending());
    }

    #[test]
    fn cancelled_work_never_runs() {
        let (clock, wq) = queue();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let work = DelayedWork::new("w", move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        wq.queue_work(&work);
        assert!(wq.cancel_work_sync(&work));
        assert!(!wq.queue_work(&work), "desabilitado após cancel");
        clock.advance(1);
        assert_eq!(wq.run_pending(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        work.enable();
        assert!(wq.queue_work(&work));
        assert_eq!(wq.run_pending(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn next_expiry_reports_earliest() {
        let (_clock, wq) = queue();
        let a = DelayedWork::new("a", || {});
        let b = DelayedWork::new("b", || {});
        wq.queue_delayed_work(&a, 50);
        wq.queue_delayed_work(&b, 5);
        assert_eq!(wq.next_expiry(), Some(5));
        assert_eq!(wq.len(), 2);
    }

    #[test]
    fn parallel_workers_run_each_item_once() {
        let (_clock, wq) = queue();
        let wq = Arc::new(wq);
        let hits = Arc::new(AtomicUsize::new(0));
        let works: alloc::vec::Vec<_> = (0..64)
            .map(|_| {
                let h = hits.clone();
                DelayedWork::new("w", move || {
                    h.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();
        for w in &works {
            wq.queue_work(w);
        }

        let workers: alloc::vec::Vec<_> = (0..4)
            .map(|_| {
                let wq = wq.clone();
                std::thread::spawn(move || wq.run_pending())
            })
            .collect();
        let ran: usize = workers.into_iter().map(|t| t.join().unwrap()).sum();

        assert_eq!(ran, 64);
        assert_eq!(hits.load(Ordering::SeqCst), 64);
    }
}
