//! Expiring, tick-aware cache for expensive derived queries
//!
//! Entries are keyed by `(kind, owner, query)`, so two
//! subsystems (or two differently-typed queries of one subsystem) can never
//! collide. Each entry carries its own expiry tick with a small random jitter,
//! so owners sharing a timeout do not all recompute on the same tick.

mod expiring;

pub use expiring::{CacheKey, CacheKind, ExpiringCache, Reresolve};

use crate::core::types::ObjectId;

/// Anything with a stable identity the cache can re-resolve across ticks
pub trait Identified {
    fn id(&self) -> ObjectId;
}
