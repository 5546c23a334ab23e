//! In-order traversal handles built purely from parent/child links.

use crate::base::{self, Link, Node};
use crate::RBTreeMap;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

/// A position in the tree: either an entry or the end position.
///
/// Advancing walks the in-order successor/predecessor chain; there is no
/// hidden state beyond the current node. `move_prev` from the end position
/// steps to the maximum entry, and `move_next` at the end is a no-op.
pub struct Cursor<'a, K, V, C> {
    map: &'a RBTreeMap<K, V, C>,
    current: Link<K, V>,
}

impl<'a, K, V, C> Cursor<'a, K, V, C> {
    pub(crate) fn new(map: &'a RBTreeMap<K, V, C>, current: Link<K, V>) -> Self {
        Cursor { map, current }
    }

    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    pub fn key(&self) -> Option<&'a K> {
        self.current.map(|node| unsafe { &(*node.as_ptr()).key })
    }

    pub fn value(&self) -> Option<&'a V> {
        self.current.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        self.current.map(|node| unsafe {
            let node = &*node.as_ptr();
            (&node.key, &node.value)
        })
    }

    pub fn move_next(&mut self) {
        if let Some(node) = self.current {
            self.current = unsafe { base::successor(node) };
        }
    }

    pub fn move_prev(&mut self) {
        self.current = match self.current {
            Some(node) => unsafe { base::predecessor(node) },
            None => self.map.raw.last(),
        };
    }
}

impl<'a, K, V, C> Clone for Cursor<'a, K, V, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, V, C> Copy for Cursor<'a, K, V, C> {}

impl<'a, K, V, C> PartialEq for Cursor<'a, K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

impl<'a, K, V, C> Eq for Cursor<'a, K, V, C> {}

impl<'a, K: fmt::Debug, V, C> fmt::Debug for Cursor<'a, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key() {
            Some(key) => f.debug_tuple("Cursor").field(key).finish(),
            None => f.write_str("Cursor(end)"),
        }
    }
}

unsafe impl<'a, K: Sync, V: Sync, C: Sync> Send for Cursor<'a, K, V, C> {}
unsafe impl<'a, K: Sync, V: Sync, C: Sync> Sync for Cursor<'a, K, V, C> {}

/// Borrowing in-order iterator over `(&K, &V)` pairs.
pub struct Iter<'a, K, V> {
    next: Link<K, V>,
    remaining: usize,
    _marker: PhantomData<&'a Node<K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(next: Link<K, V>, remaining: usize) -> Self {
        Iter {
            next,
            remaining,
            _marker: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = unsafe { base::successor(node) };
        self.remaining -= 1;
        let node = unsafe { &*node.as_ptr() };
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}
impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Iter {
            next: self.next,
            remaining: self.remaining,
            _marker: PhantomData,
        }
    }
}

unsafe impl<'a, K: Sync, V: Sync> Send for Iter<'a, K, V> {}
unsafe impl<'a, K: Sync, V: Sync> Sync for Iter<'a, K, V> {}
