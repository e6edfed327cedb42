use super::Identified;
use crate::core::config::CacheConfig;
use crate::core::types::{ObjectId, Position, Tick};
use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::any::Any;
use std::fmt;

/// Value shape of a cache entry; part of the key so shapes never collide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Collections of world-object handles, re-resolved once per tick
    Objects,
    /// Scalar aggregates
    Number,
    /// A single position
    Position,
    /// Arbitrary plain-data lists
    List,
    /// Handles assigned onto a field of the owner every tick
    Assigned,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: CacheKind,
    pub owner: String,
    pub query: String,
}

impl CacheKey {
    pub fn new(kind: CacheKind, owner: &str, query: &str) -> Self {
        Self {
            kind,
            owner: owner.to_string(),
            query: query.to_string(),
        }
    }
}

struct CacheEntry {
    value: Box<dyn Any>,
    expires_at: Tick,
    last_refreshed: Tick,
}

impl CacheEntry {
    fn is_live(&self, now: Tick) -> bool {
        now < self.expires_at
    }
}

/// Handle-valued slots the cache can write onto an owner
pub trait Reresolve<T>: Clone + 'static {
    /// An unset value is recomputed on the next access
    fn is_unset(&self) -> bool;

    fn reresolve<R: Fn(ObjectId) -> Option<T>>(&self, resolve: &R) -> Self;
}

impl<T: Identified + Clone + 'static> Reresolve<T> for Vec<T> {
    fn is_unset(&self) -> bool {
        false
    }

    fn reresolve<R: Fn(ObjectId) -> Option<T>>(&self, resolve: &R) -> Self {
        self.iter().filter_map(|handle| resolve(handle.id())).collect()
    }
}

impl<T: Identified + Clone + 'static> Reresolve<T> for Option<T> {
    fn is_unset(&self) -> bool {
        self.is_none()
    }

    fn reresolve<R: Fn(ObjectId) -> Option<T>>(&self, resolve: &R) -> Self {
        self.as_ref().and_then(|handle| resolve(handle.id()))
    }
}

/// Tick-aware memo table shared by every subsystem of a colony
pub struct ExpiringCache {
    now: Tick,
    rng: ChaCha8Rng,
    config: CacheConfig,
    entries: AHashMap<CacheKey, CacheEntry>,
    recomputes: u64,
}

impl ExpiringCache {
    pub fn new(config: CacheConfig, seed: u64) -> Self {
        Self {
            now: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            entries: AHashMap::new(),
            recomputes: 0,
        }
    }

    /// Advance the cache clock; must be called once at the start of every tick
    pub fn begin_tick(&mut self, tick: Tick) {
        self.now = tick;
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    /// Total number of compute closures invoked so far
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Memoize a collection of world-object handles
    ///
    /// On a hit the handles are re-resolved by id the first time they are
    /// read on a new tick; handles that no longer resolve are dropped.
    pub fn objects<T, R, F>(
        &mut self,
        owner: &str,
        query: &str,
        ttl: Option<Tick>,
        resolve: R,
        compute: F,
    ) -> Vec<T>
    where
        T: Identified + Clone + 'static,
        R: Fn(ObjectId) -> Option<T>,
        F: FnOnce() -> Vec<T>,
    {
        let key = CacheKey::new(CacheKind::Objects, owner, query);
        let now = self.now;
        if let Some((handles, last_refreshed)) = self.live_mut::<Vec<T>>(&key) {
            if *last_refreshed < now {
                *handles = handles.reresolve(&resolve);
                *last_refreshed = now;
            }
            return handles.clone();
        }

        let value = compute();
        let ttl = ttl.unwrap_or(self.config.default_timeout);
        self.insert(key, value.clone(), ttl);
        value
    }

    /// Memoize a scalar aggregate
    pub fn number<F>(&mut self, owner: &str, query: &str, ttl: Option<Tick>, compute: F) -> f64
    where
        F: FnOnce() -> f64,
    {
        let key = CacheKey::new(CacheKind::Number, owner, query);
        if let Some((value, _)) = self.live_mut::<f64>(&key) {
            return *value;
        }

        let value = compute();
        let ttl = ttl.unwrap_or(self.config.short_timeout);
        self.insert(key, value, ttl);
        value
    }

    /// Memoize a single position; a cached `None` is recomputed on next access
    pub fn position<F>(
        &mut self,
        owner: &str,
        query: &str,
        ttl: Option<Tick>,
        compute: F,
    ) -> Option<Position>
    where
        F: FnOnce() -> Option<Position>,
    {
        let key = CacheKey::new(CacheKind::Position, owner, query);
        if let Some((Some(pos), _)) = self.live_mut::<Option<Position>>(&key) {
            return Some(*pos);
        }

        let value = compute();
        let ttl = ttl.unwrap_or(self.config.default_timeout);
        self.insert(key, value, ttl);
        value
    }

    /// Memoize a list of plain values
    pub fn list<T, F>(&mut self, owner: &str, query: &str, ttl: Option<Tick>, compute: F) -> Vec<T>
    where
        T: Clone + 'static,
        F: FnOnce() -> Vec<T>,
    {
        let key = CacheKey::new(CacheKind::List, owner, query);
        if let Some((values, _)) = self.live_mut::<Vec<T>>(&key) {
            return values.clone();
        }

        let value = compute();
        let ttl = ttl.unwrap_or(self.config.default_timeout);
        self.insert(key, value.clone(), ttl);
        value
    }

    /// Memoize handles and write them onto `slot` on every access
    ///
    /// The owner's field is refreshed every tick once computed, so it never
    /// keeps a handle from a previous tick.
    pub fn assign<V, T, R, F>(
        &mut self,
        owner: &str,
        query: &str,
        slot: &mut V,
        ttl: Option<Tick>,
        resolve: R,
        compute: F,
    ) where
        V: Reresolve<T>,
        R: Fn(ObjectId) -> Option<T>,
        F: FnOnce() -> V,
    {
        let key = CacheKey::new(CacheKind::Assigned, owner, query);
        let now = self.now;
        if let Some((value, last_refreshed)) = self.live_mut::<V>(&key) {
            if !value.is_unset() {
                if *last_refreshed < now {
                    *value = value.reresolve(&resolve);
                    *last_refreshed = now;
                }
                *slot = value.clone();
                return;
            }
        }

        let value = compute();
        let ttl = ttl.unwrap_or(self.config.default_timeout);
        self.insert(key, value.clone(), ttl);
        *slot = value;
    }

    /// Drop every entry written by `owner`
    pub fn invalidate(&mut self, owner: &str) {
        self.entries.retain(|key, _| key.owner != owner);
    }

    /// Drop entries that can only be recomputed from here on
    pub fn purge_expired(&mut self) -> usize {
        let now = self.now;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before - self.entries.len()
    }

    fn live_mut<V: 'static>(&mut self, key: &CacheKey) -> Option<(&mut V, &mut Tick)> {
        let now = self.now;
        let entry = self.entries.get_mut(key)?;
        if !entry.is_live(now) {
            return None;
        }
        let CacheEntry {
            value,
            last_refreshed,
            ..
        } = entry;
        // A different value type under the same key is treated as a miss
        let value = value.downcast_mut::<V>()?;
        Some((value, last_refreshed))
    }

    fn insert<V: 'static>(&mut self, key: CacheKey, value: V, ttl: Tick) {
        let jitter = self.rng.gen_range(0..=ttl / 10);
        let entry = CacheEntry {
            value: Box::new(value),
            expires_at: self.now.saturating_add(ttl).saturating_add(jitter),
            last_refreshed: self.now,
        };
        self.recomputes += 1;
        self.entries.insert(key, entry);
    }
}

impl fmt::Debug for ExpiringCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("now", &self.now)
            .field("entries", &self.entries.len())
            .field("recomputes", &self.recomputes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    struct Handle {
        id: ObjectId,
        hits: u32,
    }

    impl Identified for Handle {
        fn id(&self) -> ObjectId {
            self.id
        }
    }

    fn cache() -> ExpiringCache {
        ExpiringCache::new(CacheConfig::default(), 42)
    }

    #[test]
    fn test_number_hit_within_ttl() {
        let mut cache = cache();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            7.5
        };

        cache.begin_tick(100);
        assert_eq!(cache.number("colony", "energy", Some(10), compute), 7.5);
        cache.begin_tick(109);
        assert_eq!(cache.number("colony", "energy", Some(10), || unreachable!()), 7.5);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_kinds_do_not_collide() {
        let mut cache = cache();
        cache.begin_tick(1);
        cache.number("owner", "key", None, || 3.0);
        let list: Vec<u32> = cache.list("owner", "key", None, || vec![1, 2, 3]);
        assert_eq!(list, vec![1, 2, 3]);
        assert_eq!(cache.number("owner", "key", None, || 99.0), 3.0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_owners_do_not_collide() {
        let mut cache = cache();
        cache.begin_tick(1);
        cache.number("a", "key", None, || 1.0);
        assert_eq!(cache.number("b", "key", None, || 2.0), 2.0);
    }

    #[test]
    fn test_objects_refreshed_once_per_tick() {
        let mut cache = cache();
        let resolves = Cell::new(0);
        let resolve = |id: ObjectId| {
            resolves.set(resolves.get() + 1);
            Some(Handle { id, hits: 50 })
        };
        let initial = || {
            vec![
                Handle { id: ObjectId(1), hits: 100 },
                Handle { id: ObjectId(2), hits: 100 },
            ]
        };

        cache.begin_tick(10);
        let first = cache.objects("roads", "all", Some(50), resolve, initial);
        assert_eq!(first[0].hits, 100);
        // Same tick as the compute: no re-resolution
        cache.objects("roads", "all", Some(50), resolve, initial);
        assert_eq!(resolves.get(), 0);

        cache.begin_tick(11);
        let refreshed = cache.objects("roads", "all", Some(50), resolve, initial);
        assert_eq!(refreshed[0].hits, 50);
        assert_eq!(resolves.get(), 2);
        cache.objects("roads", "all", Some(50), resolve, initial);
        cache.objects("roads", "all", Some(50), resolve, initial);
        assert_eq!(resolves.get(), 2, "only one refresh per tick");
        assert_eq!(cache.recomputes(), 1);
    }

    #[test]
    fn test_destroyed_objects_dropped_on_refresh() {
        let mut cache = cache();
        cache.begin_tick(1);
        cache.objects(
            "owner",
            "labs",
            None,
            |_| None::<Handle>,
            || {
                vec![
                    Handle { id: ObjectId(1), hits: 1 },
                    Handle { id: ObjectId(2), hits: 1 },
                ]
            },
        );
        cache.begin_tick(2);
        let alive = cache.objects(
            "owner",
            "labs",
            None,
            |id| (id == ObjectId(2)).then_some(Handle { id, hits: 1 }),
            Vec::new,
        );
        assert_eq!(alive.len(), 1);
        assert_eq!(alive[0].id, ObjectId(2));
    }

    #[test]
    fn test_position_none_is_a_miss() {
        let mut cache = cache();
        let calls = Cell::new(0);
        cache.begin_tick(1);
        let mut lookup = |cache: &mut ExpiringCache| {
            cache.position("site", "anchor", None, || {
                calls.set(calls.get() + 1);
                None
            })
        };
        assert_eq!(lookup(&mut cache), None);
        assert_eq!(lookup(&mut cache), None);
        assert_eq!(calls.get(), 2);

        assert_eq!(
            cache.position("site", "anchor", None, || Some(Position::new(4, 4))),
            Some(Position::new(4, 4))
        );
        assert_eq!(
            cache.position("site", "anchor", None, || unreachable!()),
            Some(Position::new(4, 4))
        );
    }

    #[test]
    fn test_assign_writes_slot_every_access() {
        let mut cache = cache();
        let mut slot: Option<Handle> = None;
        cache.begin_tick(5);
        cache.assign(
            "hatchery",
            "battery",
            &mut slot,
            None,
            |id| Some(Handle { id, hits: 1 }),
            || Some(Handle { id: ObjectId(9), hits: 10 }),
        );
        assert_eq!(slot.as_ref().map(|h| h.hits), Some(10));

        slot = None;
        cache.begin_tick(6);
        cache.assign(
            "hatchery",
            "battery",
            &mut slot,
            None,
            |id| Some(Handle { id, hits: 1 }),
            || unreachable!(),
        );
        assert_eq!(slot.as_ref().map(|h| h.hits), Some(1));
    }

    #[test]
    fn test_assign_recomputes_when_handle_destroyed() {
        let mut cache = cache();
        let mut slot: Option<Handle> = None;
        cache.begin_tick(1);
        cache.assign("o", "k", &mut slot, None, |_| None, || {
            Some(Handle { id: ObjectId(1), hits: 1 })
        });
        cache.begin_tick(2);
        // Refresh resolves nothing, so the slot is cleared
        cache.assign("o", "k", &mut slot, None, |_| None::<Handle>, || {
            Some(Handle { id: ObjectId(2), hits: 2 })
        });
        assert!(slot.is_none());
        // The cleared value is unset, so the next access recomputes
        cache.assign("o", "k", &mut slot, None, |_| None::<Handle>, || {
            Some(Handle { id: ObjectId(2), hits: 2 })
        });
        assert_eq!(slot.map(|h| h.id), Some(ObjectId(2)));
    }

    #[test]
    fn test_type_mismatch_recomputes() {
        let mut cache = cache();
        cache.begin_tick(1);
        let _: Vec<u32> = cache.list("o", "k", None, || vec![1]);
        let strings: Vec<String> = cache.list("o", "k", None, || vec!["a".to_string()]);
        assert_eq!(strings, vec!["a".to_string()]);
    }

    #[test]
    fn test_invalidate_and_purge() {
        let mut cache = cache();
        cache.begin_tick(1);
        cache.number("a", "x", Some(5), || 1.0);
        cache.number("b", "x", Some(100), || 1.0);
        cache.invalidate("a");
        assert_eq!(cache.len(), 1);

        cache.number("c", "x", Some(1), || 1.0);
        cache.begin_tick(50);
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let mut cache = cache();
        cache.begin_tick(5);
        assert_eq!(cache.number("colony", "energy", Some(Tick::MAX), || 1.0), 1.0);
        cache.begin_tick(Tick::MAX - 1);
        assert_eq!(cache.number("colony", "energy", Some(Tick::MAX), || 2.0), 1.0);
        assert_eq!(cache.recomputes(), 1);
    }
}
