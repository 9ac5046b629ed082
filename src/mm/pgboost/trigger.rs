//! # Trigger Scheduler
//!
//! Três portas de entrada, todas levando a `run_pass`:
//!
//! - **Periódica**: `DelayedWork` rearmado a cada `interval` segundos. Se o
//!   contador de páginas liberadas do alocador saltou mais que o piso desde
//!   o último tick, o passe usa o cooldown curto (de evento).
//! - **Evento**: o hook de free acumula violações; ao atingir o piso o
//!   trabalho de evento é enfileirado e roda um passe leve.
//! - **Manual** (`kick`): passe forçado, síncrono, sujeito ao cooldown.
//!
//! Passes completos e leves têm carimbos de cooldown independentes. O
//! carimbo é trocado por compare-exchange, então chamadores concorrentes na
//! mesma janela produzem no máximo um passe.

use core::sync::atomic::{AtomicU64, Ordering};

use super::adapter::ZoneAdapter;
use super::decision::PgboostAction;
use super::stats::PgboostStats;
use super::Pgboost;
use crate::core::time::jiffies::time_after_eq;
use crate::core::time::Clock;
use crate::mm::alloc::MigrateType;
use crate::mm::error::{PgboostError, PgboostResult};

/// Opcode de `kick`: passe completo forçado
pub const KICK_FULL: u32 = 1;
/// Opcode de `kick`: passe leve forçado
pub const KICK_LIGHT: u32 = 2;

/// Tipo de passe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Drena caches por CPU e reordena todas as ordens
    Full,
    /// Sem drain; só ordens huge (a menos que a decisão seja Strict)
    Light,
}

/// Janela de cooldown medida em jiffies.
#[derive(Debug)]
pub struct Cooldown {
    last: AtomicU64,
}

impl Cooldown {
    const NEVER: u64 = u64::MAX;

    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(Self::NEVER),
        }
    }

    /// Tenta abrir a janela em `now`. Retorna `false` se o último carimbo
    /// ainda está dentro de `window` ou se outro chamador venceu a corrida.
    pub fn try_acquire(&self, now: u64, window: u64) -> bool {
        let last = self.last.load(Ordering::Acquire);
        if last != Self::NEVER && !time_after_eq(now, last.wrapping_add(window)) {
            return false;
        }
        self.last
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Jiffies do último passe aceito
    pub fn last(&self) -> Option<u64> {
        match self.last.load(Ordering::Acquire) {
            Self::NEVER => None,
            last => Some(last),
        }
    }
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ZoneAdapter> Pgboost<A> {
    /// Agenda o próximo tick periódico (se habilitado e ainda não pendente).
    pub fn arm_periodic(&self) -> bool {
        if !self.is_ready() || !self.params.periodic_enabled() {
            return false;
        }
        self.wq
            .queue_delayed_work(&self.periodic_work, self.params.interval_jiffies())
    }

    /// Corpo do trabalho periódico.
    pub(crate) fn periodic_tick(&self) {
        if !self.is_ready() || !self.params.periodic_enabled() {
            return;
        }

        let freed = self.zone.pages_freed();
        let last = self.last_pages_freed.swap(freed, Ordering::AcqRel);
        let burst = freed.wrapping_sub(last) > self.config.least_total_pgs;

        let window = if burst {
            self.params.event_cooldown_jiffies()
        } else {
            self.params.periodic_cooldown_jiffies()
        };
        crate::ktrace!("(PGB) tick: {} páginas liberadas, burst={}", freed.wrapping_sub(last), burst);

        self.run_pass(PassKind::Full, false, window);
        self.arm_periodic();
    }

    /// Corpo do trabalho de evento.
    pub(crate) fn event_tick(&self) {
        if !self.is_ready() || !self.params.event_enabled() {
            return;
        }
        self.run_pass(PassKind::Light, false, self.params.event_cooldown_jiffies());
    }

    /// Passe manual síncrono: `1` = completo, `2` = leve. Ambos forçados.
    ///
    /// Retorna se um passe foi executado.
    pub fn kick(&self, opcode: u32) -> PgboostResult<bool> {
        let (kind, window) = match opcode {
            KICK_FULL => (PassKind::Full, self.params.periodic_cooldown_jiffies()),
            KICK_LIGHT => (PassKind::Light, self.params.event_cooldown_jiffies()),
            _ => return Err(PgboostError::InvalidParameter),
        };
        if !self.is_ready() {
            return Err(PgboostError::NotReady);
        }

        let ran = self.run_pass(kind, true, window);
        if ran {
            PgboostStats::inc(&self.stats.manual_passes);
        }
        Ok(ran)
    }

    /// Cooldown + decisão + rebalance + reorder.
    ///
    /// Retorna `true` se a decisão favoreceu um rank e o passe rodou.
    pub fn run_pass(&self, kind: PassKind, force: bool, window: u64) -> bool {
        if !self.is_ready() {
            return false;
        }

        let cooldown = match kind {
            PassKind::Full => &self.full_cooldown,
            PassKind::Light => &self.light_cooldown,
        };
        let now = self.wq.clock().jiffies();
        if !cooldown.try_acquire(now, window) {
            PgboostStats::inc(&self.stats.skipped_cooldown);
            crate::ktrace!("(PGB) passe {:?} em cooldown", kind);
            return false;
        }

        let Some(_guard) = self.begin_pass() else {
            PgboostStats::inc(&self.stats.skipped_busy);
            crate::kdebug!("(PGB) passe {:?} ignorado: outro em andamento", kind);
            return false;
        };

        let action = self.next_pgboost_action(force);
        let PgboostAction::FavorRank { rank, strict } = action else {
            return false;
        };
        let favor_rank1 = rank == 1;

        self.cache.release(&*self.zone, u64::MAX, &self.stats);

        let drain = kind == PassKind::Full || strict;
        // Só falha para classes inválidas, e as duas abaixo são válidas
        let reclassified = self
            .change_migrate_type(MigrateType::Unmovable, favor_rank1, drain)
            .unwrap_or(0)
            + self
                .change_migrate_type(MigrateType::Reclaimable, favor_rank1, false)
                .unwrap_or(0);

        let pick_small = kind == PassKind::Light && !strict;
        let moved = self.reorder_lists(pick_small, favor_rank1, self.params.hold_small());

        match kind {
            PassKind::Full => PgboostStats::inc(&self.stats.full_passes),
            PassKind::Light => PgboostStats::inc(&self.stats.light_passes),
        }
        crate::kinfo!(
            "(PGB) passe {:?} {}: {} reclassificados, {} reordenados",
            kind,
            action,
            reclassified,
            moved
        );
        true
    }
}
