//! Arquivo: core/time/jiffies.rs
//!
//! Propósito: Jiffies (Contador de ticks do sistema).
//! "Jiffies" é o termo histórico (do Linux) para ticks de relógio.
//! Usado pelo pgboost para janelas de cooldown e pelas work queues para
//! expiração de trabalhos atrasados.
//!
//! Detalhes de Implementação:
//! - `Clock` é a fonte de tempo monotônica consumida pelo motor; o kernel
//!   hospedeiro fornece a sua.
//! - `Jiffies` é um contador AtomicU64 thread-safe e lock-free, avançado
//!   pelo handler do timer (ou manualmente nos testes).

use core::sync::atomic::{AtomicU64, Ordering};

/// Frequência do Tick (Ticks por segundo)
pub const HZ: u64 = 100;

/// Fonte de tempo monotônica em jiffies.
pub trait Clock: Send + Sync {
    /// Retorna o número atual de jiffies.
    fn jiffies(&self) -> u64;
}

/// Contador de ticks desde o boot.
#[derive(Debug, Default)]
pub struct Jiffies {
    ticks: AtomicU64,
}

impl Jiffies {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
        }
    }

    /// Retorna o número atual de jiffies.
    #[inline]
    pub fn get(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Incrementa o contador de jiffies.
    /// Deve ser chamado APENAS pelo handler de interrupção do timer.
    #[inline]
    pub fn inc(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Avança o contador em `ticks` de uma vez.
    #[inline]
    pub fn advance(&self, ticks: u64) {
        self.ticks.fetch_add(ticks, Ordering::Relaxed);
    }
}

impl Clock for Jiffies {
    fn jiffies(&self) -> u64 {
        self.get()
    }
}

/// Converte segundos para jiffies.
#[inline]
pub const fn seconds_to_jiffies(seconds: u64) -> u64 {
    seconds * HZ
}

/// Converte milisegundos para jiffies.
#[inline]
pub const fn millis_to_jiffies(millis: u64) -> u64 {
    (millis * HZ) / 1000
}

/// `a` é posterior a `b`? Seguro contra wraparound do contador.
#[inline]
pub const fn time_after(a: u64, b: u64) -> bool {
    (b.wrapping_sub(a) as i64) < 0
}

/// `a` é posterior ou igual a `b`? Seguro contra wraparound do contador.
#[inline]
pub const fn time_after_eq(a: u64, b: u64) -> bool {
    (a.wrapping_sub(b) as i64) >= 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_use_hz() {
        assert_eq!(seconds_to_jiffies(10), 10 * HZ);
        assert_eq!(millis_to_jiffies(1000), HZ);
        assert_eq!(millis_to_jiffies(10), 1);
    }

    #[test]
    fn comparisons_survive_wraparound() {
        let before = u64::MAX - 5;
        let after = before.wrapping_add(10);
        assert!(time_after(after, before));
        assert!(!time_after(before, after));
        assert!(time_after_eq(after, after));
    }

    #[test]
    fn counter_advances() {
        let j = Jiffies::new();
        j.inc();
        j.advance(99);
        assert_eq!(j.jiffies(), 100);
    }
}
