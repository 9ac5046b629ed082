// =============================================================================
// PGBOOST LOGGING SYSTEM - ZERO OVERHEAD
// =============================================================================
//
// Sistema de logging do motor pgboost com custo ZERO em release.
//
// ARQUITETURA:
// - Usa features do Cargo para compile-time filtering
// - Com feature "no_logs", TODOS os macros viram expressões vazias
// - Emite pela fachada `log`: o kernel hospedeiro registra o backend
//   (serial, ring buffer, stdout nos testes)
//
// NÍVEIS DE LOG (do mais crítico ao menos):
// - ERROR: Falhas de init (motor desabilitado)
// - WARN:  Situações suspeitas mas recuperáveis
// - INFO:  Fluxo normal de execução (init, shutdown, kick)
// - DEBUG: Decisões e passes de reordenação
// - TRACE: Detalhes extremos (cada lote, cada ordem)
//
// FEATURES:
// - no_logs:   Remove 100% dos logs
// - log_error: Apenas ERROR, WARN
// - log_info:  ERROR, WARN, INFO
// - log_debug: ERROR, WARN, INFO, DEBUG
// - log_trace: Todos os níveis (padrão)
//
// COMO USAR:
//   kinfo!("(PGB) Inicializando...");
//   kdebug!("(PGB) ordem={} movidos={}", order, moved);
//
// Convenção: toda mensagem começa com o prefixo do subsistema entre
// parênteses: (PGB), (Buddy), (WQ), (Shrink), (Cmdline).
//
// =============================================================================

#[doc(hidden)]
pub use log as __log;

/// Alvo usado em todos os registros emitidos pelo crate.
pub const LOG_TARGET: &str = "pgboost";

// =============================================================================
// MACROS DE LOG - NÍVEL ERROR
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kerror {
    ($($arg:tt)+) => {{
        $crate::core::logging::__log::error!(
            target: $crate::core::logging::LOG_TARGET,
            $($arg)+
        );
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kerror {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL WARN
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)+) => {{
        $crate::core::logging::__log::warn!(
            target: $crate::core::logging::LOG_TARGET,
            $($arg)+
        );
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kwarn {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL INFO
// =============================================================================
//
// kinfo! - Ativo exceto com no_logs e log_error
//

#[cfg(not(any(feature = "no_logs", feature = "log_error")))]
#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)+) => {{
        $crate::core::logging::__log::info!(
            target: $crate::core::logging::LOG_TARGET,
            $($arg)+
        );
    }};
}

#[cfg(any(feature = "no_logs", feature = "log_error"))]
#[macro_export]
macro_rules! kinfo {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL DEBUG
// =============================================================================
//
// kdebug! - Ativo apenas com log_trace ou log_debug
//

#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_trace", feature = "log_debug")
))]
#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)+) => {{
        $crate::core::logging::__log::debug!(
            target: $crate::core::logging::LOG_TARGET,
            $($arg)+
        );
    }};
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_trace", feature = "log_debug")
)))]
#[macro_export]
macro_rules! kdebug {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL TRACE
// =============================================================================
//
// ktrace! - Ativo apenas com log_trace
//

#[cfg(all(not(feature = "no_logs"), feature = "log_trace"))]
#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)+) => {{
        $crate::core::logging::__log::trace!(
            target: $crate::core::logging::LOG_TARGET,
            $($arg)+
        );
    }};
}

#[cfg(not(all(not(feature = "no_logs"), feature = "log_trace")))]
#[macro_export]
macro_rules! ktrace {
    ($($t:tt)*) => {{}};
}
