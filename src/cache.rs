//! # Cache
//!
//! A bounded least-recently-used map, used to memoize pure computations such as lexing a prefix.

use std::collections::HashMap;
use std::hash::Hash;


pub const DEFAULT_CAPACITY: usize = 128;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// # Summary
///
/// `LruCache` maps keys to values, holding at most `capacity` entries. When full,
/// inserting a new key evicts the entry that was used least recently.
///
/// Entries live in a slab and are chained, most recent first, through indices;
/// `get` and `put` are O(1).
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    index: HashMap<K, usize>,
    entries: Vec<Entry<K, V>>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// A cache holding at most `capacity` entries. A cache of capacity 0 stores nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            index: HashMap::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Look `key` up, and mark it as the most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let slot = *self.index.get(key)?;
        self.unlink(slot);
        self.push_front(slot);
        Some(&self.entries[slot].value)
    }

    /// Look `key` up without touching its recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&slot| &self.entries[slot].value)
    }

    /// Insert or overwrite `key`, marking it as the most recently used.
    pub fn put(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if let Some(&slot) = self.index.get(&key) {
            self.entries[slot].value = value;
            self.unlink(slot);
            self.push_front(slot);
            return;
        }
        let slot = if self.entries.len() < self.capacity {
            self.entries.push(Entry {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.entries.len() - 1
        } else {
            // Full: reuse the slot of the least recent entry.
            let Some(slot) = self.tail else {
                return;
            };
            self.unlink(slot);
            let entry = &mut self.entries[slot];
            self.index.remove(&entry.key);
            entry.key = key.clone();
            entry.value = value;
            slot
        };
        self.index.insert(key, slot);
        self.push_front(slot);
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
        self.head = None;
        self.tail = None;
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = {
            let entry = &mut self.entries[slot];
            (entry.prev.take(), entry.next.take())
        };
        match prev {
            Some(prev) => self.entries[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.entries[next].prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, slot: usize) {
        self.entries[slot].next = self.head;
        if let Some(head) = self.head {
            self.entries[head].prev = Some(slot);
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }
}

impl<K: Hash + Eq + Clone, V> Default for LruCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
