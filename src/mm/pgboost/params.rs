//! # Parâmetros ajustáveis do pgboost
//!
//! Inteiros ajustáveis em runtime (`store` / `show`) ou no boot, via
//! `pgboost.<nome>=<valor>` na linha de comando.
//!
//! | Nome | Unidade | Padrão |
//! |------|---------|--------|
//! | `interval` | segundos | 10 |
//! | `periodic_cooldown` | segundos | 10 |
//! | `event_cooldown` | segundos | 1 |
//! | `periodic_enable` | 0/1 | 1 |
//! | `event_enable` | 0/1 | 1 |
//! | `hold_small` | 0/1 | 0 |
//!
//! `kick` não é um parâmetro armazenado: é tratado por `Pgboost::store_param`.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::core::boot::CommandLine;
use crate::core::time::jiffies::seconds_to_jiffies;
use crate::mm::config::{EVENT_COOLDOWN_SECS, PERIODIC_COOLDOWN_SECS, PERIODIC_INTERVAL_SECS};
use crate::mm::error::{PgboostError, PgboostResult};

/// Prefixo dos parâmetros na linha de comando
pub const CMDLINE_PREFIX: &str = "pgboost";

/// Nomes aceitos por `store` / `show`
pub const PARAM_NAMES: [&str; 6] = [
    "interval",
    "periodic_cooldown",
    "event_cooldown",
    "periodic_enable",
    "event_enable",
    "hold_small",
];

#[derive(Debug)]
pub struct PgboostParams {
    interval: AtomicU64,
    periodic_cooldown: AtomicU64,
    event_cooldown: AtomicU64,
    periodic_enable: AtomicBool,
    event_enable: AtomicBool,
    hold_small: AtomicBool,
}

impl Default for PgboostParams {
    fn default() -> Self {
        Self {
            interval: AtomicU64::new(PERIODIC_INTERVAL_SECS),
            periodic_cooldown: AtomicU64::new(PERIODIC_COOLDOWN_SECS),
            event_cooldown: AtomicU64::new(EVENT_COOLDOWN_SECS),
            periodic_enable: AtomicBool::new(true),
            event_enable: AtomicBool::new(true),
            hold_small: AtomicBool::new(false),
        }
    }
}

fn parse_u64(value: &str) -> PgboostResult<u64> {
    value.trim().parse::<u64>().map_err(|_| PgboostError::InvalidParameter)
}

fn parse_bool(value: &str) -> PgboostResult<bool> {
    match parse_u64(value)? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(PgboostError::InvalidParameter),
    }
}

impl PgboostParams {
    /// Padrões sobrescritos pelos `pgboost.*` da linha de comando.
    pub fn from_cmdline(cmdline: &CommandLine) -> Self {
        let params = Self::default();
        params.apply_cmdline(cmdline);
        params
    }

    /// Grava `value` no parâmetro `name`.
    pub fn store(&self, name: &str, value: &str) -> PgboostResult<()> {
        match name {
            "interval" => {
                let secs = parse_u64(value)?;
                if secs == 0 {
                    return Err(PgboostError::InvalidParameter);
                }
                self.interval.store(secs, Ordering::Relaxed);
            }
            "periodic_cooldown" => self.periodic_cooldown.store(parse_u64(value)?, Ordering::Relaxed),
            "event_cooldown" => self.event_cooldown.store(parse_u64(value)?, Ordering::Relaxed),
            "periodic_enable" => self.periodic_enable.store(parse_bool(value)?, Ordering::Relaxed),
            "event_enable" => self.event_enable.store(parse_bool(value)?, Ordering::Relaxed),
            "hold_small" => self.hold_small.store(parse_bool(value)?, Ordering::Relaxed),
            _ => return Err(PgboostError::UnknownParam),
        }
        crate::kdebug!("(PGB) param {}={}", name, value.trim());
        Ok(())
    }

    /// Valor atual de `name`.
    pub fn show(&self, name: &str) -> PgboostResult<u64> {
        let value = match name {
            "interval" => self.interval.load(Ordering::Relaxed),
            "periodic_cooldown" => self.periodic_cooldown.load(Ordering::Relaxed),
            "event_cooldown" => self.event_cooldown.load(Ordering::Relaxed),
            "periodic_enable" => self.periodic_enable.load(Ordering::Relaxed) as u64,
            "event_enable" => self.event_enable.load(Ordering::Relaxed) as u64,
            "hold_small" => self.hold_small.load(Ordering::Relaxed) as u64,
            _ => return Err(PgboostError::UnknownParam),
        };
        Ok(value)
    }

    /// Aplica os `pgboost.<nome>=<valor>` da linha de comando. Entradas
    /// inválidas são ignoradas com aviso. Retorna quantas foram aplicadas.
    pub fn apply_cmdline(&self, cmdline: &CommandLine) -> usize {
        let mut applied = 0;
        for (name, value) in cmdline.module_params(CMDLINE_PREFIX) {
            match self.store(name, value) {
                Ok(()) => applied += 1,
                Err(e) => crate::kwarn!("(PGB) cmdline {}.{}={}: {}", CMDLINE_PREFIX, name, value, e),
            }
        }
        applied
    }

    // =========================================================================
    // ACESSO TIPADO
    // =========================================================================

    pub fn interval_jiffies(&self) -> u64 {
        seconds_to_jiffies(self.interval.load(Ordering::Relaxed))
    }

    pub fn periodic_cooldown_jiffies(&self) -> u64 {
        seconds_to_jiffies(self.periodic_cooldown.load(Ordering::Relaxed))
    }

    pub fn event_cooldown_jiffies(&self) -> u64 {
        seconds_to_jiffies(self.event_cooldown.load(Ordering::Relaxed))
    }

    pub fn periodic_enabled(&self) -> bool {
        self.periodic_enable.load(Ordering::Relaxed)
    }

    pub fn event_enabled(&self) -> bool {
        self.event_enable.load(Ordering::Relaxed)
    }

    pub fn hold_small(&self) -> bool {
        self.hold_small.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::HZ;

    #[test]
    fn defaults() {
        let p = PgboostParams::default();
        assert_eq!(p.show("interval"), Ok(10));
        assert_eq!(p.show("event_cooldown"), Ok(1));
        assert_eq!(p.show("hold_small"), Ok(0));
        assert_eq!(p.periodic_cooldown_jiffies(), 10 * HZ);
        for name in PARAM_NAMES {
            assert!(p.show(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn store_validates_values() {
        let p = PgboostParams::default();
        assert_eq!(p.store("event_cooldown", "3"), Ok(()));
        assert_eq!(p.event_cooldown_jiffies(), 3 * HZ);
        assert_eq!(p.store("hold_small", " 1\n"), Ok(()));
        assert!(p.hold_small());

        assert_eq!(p.store("interval", "0"), Err(PgboostError::InvalidParameter));
        assert_eq!(p.store("event_enable", "2"), Err(PgboostError::InvalidParameter));
        assert_eq!(p.store("periodic_cooldown", "-1"), Err(PgboostError::InvalidParameter));
        assert_eq!(p.store("bogus", "1"), Err(PgboostError::UnknownParam));
        assert_eq!(p.show("bogus"), Err(PgboostError::UnknownParam));
        assert_eq!(p.show("interval"), Ok(10));
    }

    #[test]
    fn cmdline_overrides_defaults() {
        let c = CommandLine::parse("quiet pgboost.interval=5 pgboost.event_enable=0 pgboost.nope=1 pgboost.hold_small=x");
        let p = PgboostParams::default();
        assert_eq!(p.apply_cmdline(&c), 2);
        assert_eq!(p.show("interval"), Ok(5));
        assert!(!p.event_enabled());
        assert!(!p.hold_small());

        let p = PgboostParams::from_cmdline(&c);
        assert_eq!(p.interval_jiffies(), 5 * HZ);
    }
}
