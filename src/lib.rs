//! An ordered associative map backed by a red-black tree.
//!
//! Keys are unique under the map's comparator and enumerable in comparator
//! order; insert, lookup, and erase are `O(log n)`. The balancing engine
//! lives in [`base`]; this module is the safe public facade.
//!
//! Two deliberate departures from the usual map surface:
//!
//! * [`RBTreeMap::insert`] never overwrites. Inserting an existing key
//!   returns `false` and leaves the old value in place; callers wanting
//!   upsert semantics go through [`RBTreeMap::get_or_default`] or the
//!   [`Entry`] API.
//! * [`RBTreeMap::get`] is strict and fails with [`KeyNotFound`] on a miss.
//!
//! ```
//! use rbmap::RBTreeMap;
//!
//! let mut map = RBTreeMap::new();
//! assert!(map.insert(2, "two"));
//! assert!(map.insert(1, "one"));
//! assert!(!map.insert(2, "again"));
//! assert_eq!(map.get(&2), Ok(&"two"));
//! let keys: Vec<i32> = map.iter().map(|(k, _)| *k).collect();
//! assert_eq!(keys, [1, 2]);
//! ```

#![deny(unused_must_use)]

mod base;
mod cursor;
mod error;

pub use crate::cursor::{Cursor, Iter};
pub use crate::error::KeyNotFound;

use crate::base::{Location, Node, RBRoot, VacantLocation};
use std::fmt;
use std::iter::FromIterator;
use std::mem;
use std::ptr::NonNull;

/// Strict-weak-ordering comparator: `less(a, b)` is true iff `a` strictly
/// precedes `b`. Two keys with `!less(a, b) && !less(b, a)` are equal.
pub trait Compare<K> {
    fn less(&self, a: &K, b: &K) -> bool;
}

/// The default comparator, ordering keys by their [`Ord`] instance.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: Ord> Compare<K> for NaturalOrder {
    #[inline]
    fn less(&self, a: &K, b: &K) -> bool {
        a < b
    }
}

impl<K, F: Fn(&K, &K) -> bool> Compare<K> for F {
    #[inline]
    fn less(&self, a: &K, b: &K) -> bool {
        self(a, b)
    }
}

/// Ordered map with unique keys and `O(log n)` point operations.
pub struct RBTreeMap<K, V, C = NaturalOrder> {
    pub(crate) raw: RBRoot<K, V, C>,
}

// the raw pointers inside never leak out of a `&self`/`&mut self` borrow
unsafe impl<K: Send, V: Send, C: Send> Send for RBTreeMap<K, V, C> {}
unsafe impl<K: Sync, V: Sync, C: Sync> Sync for RBTreeMap<K, V, C> {}

impl<K, V> RBTreeMap<K, V> {
    pub fn new() -> Self {
        RBTreeMap {
            raw: RBRoot::new(NaturalOrder),
        }
    }
}

impl<K, V, C> RBTreeMap<K, V, C> {
    /// An empty map ordered by `compare`. The comparator is instance state;
    /// two maps may sort the same key type differently.
    pub fn with_comparator(compare: C) -> Self {
        RBTreeMap {
            raw: RBRoot::new(compare),
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len
    }

    pub fn is_empty(&self) -> bool {
        self.raw.len == 0
    }

    /// Removes every entry, freeing nodes iteratively.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Cursor at the smallest entry (the end position when empty).
    pub fn begin(&self) -> Cursor<'_, K, V, C> {
        Cursor::new(self, self.raw.first())
    }

    /// The end position, one past the largest entry.
    pub fn end(&self) -> Cursor<'_, K, V, C> {
        Cursor::new(self, None)
    }

    /// In-order iterator over `(&K, &V)`.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.raw.first(), self.raw.len)
    }

    /// Structural self-check: black root, no red-red edge, equal black
    /// counts on every path. Intended for tests and diagnostics; the public
    /// operations keep this true as an invariant.
    pub fn is_balanced(&self) -> bool {
        self.raw.is_valid()
    }

    /// Writes the keys in breadth-first order, space-separated, to `out`.
    pub fn dump_level_order<W: fmt::Write>(&self, out: &mut W) -> fmt::Result
    where
        K: fmt::Display,
    {
        self.raw.dump_level_order(out)
    }
}

impl<K, V, C: Compare<K>> RBTreeMap<K, V, C> {
    /// Strict lookup.
    pub fn get(&self, key: &K) -> Result<&V, KeyNotFound> {
        match self.raw.lookup(key) {
            Some(node) => Ok(unsafe { &(*node.as_ptr()).value }),
            None => Err(KeyNotFound),
        }
    }

    /// Strict mutable lookup.
    pub fn get_mut(&mut self, key: &K) -> Result<&mut V, KeyNotFound> {
        match self.raw.lookup(key) {
            Some(node) => Ok(unsafe { &mut (*node.as_ptr()).value }),
            None => Err(KeyNotFound),
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.raw.lookup(key).is_some()
    }

    /// Inserts `key` if absent. Returns `true` if a new entry was created;
    /// an existing entry keeps its value and `false` is returned.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        match self.raw.location(&key) {
            Location::Occupied { .. } => false,
            Location::Vacant(location) => {
                self.raw.insert_at(location, key, value);
                true
            }
        }
    }

    /// Removes the entry for `key`. Returns `true` if it existed.
    pub fn erase(&mut self, key: &K) -> bool {
        self.raw.erase(key)
    }

    /// Mutable access to the value for `key`, inserting `V::default()`
    /// first when the key is absent.
    pub fn get_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.entry(key).or_default()
    }

    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, C> {
        match self.raw.location(&key) {
            Location::Occupied { node } => Entry::Occupied(OccupiedEntry {
                map: self,
                node,
                key,
            }),
            Location::Vacant(location) => Entry::Vacant(VacantEntry {
                map: self,
                location,
                key,
            }),
        }
    }

    /// Cursor at the first entry with key not less than `key`, or [`end`]
    /// when every key is smaller.
    ///
    /// [`end`]: RBTreeMap::end
    pub fn lower_bound(&self, key: &K) -> Cursor<'_, K, V, C> {
        Cursor::new(self, self.raw.lower_bound(key))
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for RBTreeMap<K, V, C> {
    fn clone(&self) -> Self {
        RBTreeMap {
            raw: self.raw.clone_tree(),
        }
    }
}

impl<K, V, C: Default> Default for RBTreeMap<K, V, C> {
    fn default() -> Self {
        RBTreeMap::with_comparator(C::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for RBTreeMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, C> IntoIterator for &'a RBTreeMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, V, C: Compare<K>> Extend<(K, V)> for RBTreeMap<K, V, C> {
    /// On duplicate keys the first inserted value wins.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, C: Compare<K> + Default> FromIterator<(K, V)> for RBTreeMap<K, V, C> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = RBTreeMap::default();
        map.extend(iter);
        map
    }
}

/// A map slot bound to a probe key, either occupied or vacant.
pub enum Entry<'a, K, V, C> {
    Vacant(VacantEntry<'a, K, V, C>),
    Occupied(OccupiedEntry<'a, K, V, C>),
}

impl<'a, K, V, C: Compare<K>> Entry<'a, K, V, C> {
    pub fn or_insert(self, default: V) -> &'a mut V {
        self.or_insert_with(move || default)
    }

    pub fn or_insert_with<F: FnOnce() -> V>(self, default: F) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }

    pub fn and_modify<F: FnOnce(&mut V)>(mut self, f: F) -> Self {
        if let Entry::Occupied(entry) = &mut self {
            f(entry.get_mut());
        }
        self
    }
}

/// A vacant slot; holds the insertion point found during the search so that
/// inserting does not search again.
pub struct VacantEntry<'a, K, V, C> {
    map: &'a mut RBTreeMap<K, V, C>,
    location: VacantLocation<K, V>,
    key: K,
}

impl<'a, K, V, C: Compare<K>> VacantEntry<'a, K, V, C> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn into_key(self) -> K {
        self.key
    }

    pub fn insert(self, value: V) -> &'a mut V {
        let node = self.map.raw.insert_at(self.location, self.key, value);
        unsafe { &mut (*node.as_ptr()).value }
    }
}

/// An occupied slot.
pub struct OccupiedEntry<'a, K, V, C> {
    map: &'a mut RBTreeMap<K, V, C>,
    node: NonNull<Node<K, V>>,
    key: K,
}

impl<'a, K, V, C: Compare<K>> OccupiedEntry<'a, K, V, C> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn get(&self) -> &V {
        unsafe { &(*self.node.as_ptr()).value }
    }

    pub fn get_mut(&mut self) -> &mut V {
        unsafe { &mut (*self.node.as_ptr()).value }
    }

    pub fn into_mut(self) -> &'a mut V {
        unsafe { &mut (*self.node.as_ptr()).value }
    }

    /// Replaces the value, returning the old one. The key is untouched.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the entry, returning its value.
    pub fn remove(self) -> V {
        let (_, value) = unsafe { self.map.raw.erase_node(self.node) };
        value
    }
}
