//! # Alocador de Páginas de Referência
//!
//! | Módulo | Responsabilidade |
//! |--------|------------------|
//! | `gfp` | Flags GFP e classes de migração |
//! | `freearea` | Free lists por (ordem, classe) + tags de pageblock |
//! | `percpu` | Caches de ordem 0 por CPU |
//! | `hooks` | Observadores síncronos de free/alloc |
//! | `buddy` | A zona: split, coalescência, fallback, drain |

pub mod buddy;
pub mod freearea;
pub mod gfp;
pub mod hooks;
pub mod percpu;

pub use buddy::BuddyZone;
pub use freearea::{FreeArea, FreeBlock, FreeSublist, ListPosition};
pub use gfp::{Gfp, MigrateType, MIGRATE_TYPES};
pub use hooks::{HookId, PageObserver};
