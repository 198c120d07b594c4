//! LRU Module
//!
//! Fixed-capacity Least Recently Used map with O(1) get, put and delete.
//!
//! Entries live in a slot arena linked into a doubly-linked recency list
//! by index, so promotion is a splice and never reallocates.

use std::collections::HashMap;

use ahash::RandomState;

use crate::cache::{CacheEntry, Lookup};

// == LRU Cache ==
/// Single-threaded LRU map. Wrapped by [`crate::cache::Cache`] for shared use.
///
/// - `head` = most recently used
/// - `tail` = least recently used, next eviction candidate
#[derive(Debug)]
pub struct LruCache {
    /// Key to arena slot
    lookup: HashMap<String, usize, RandomState>,
    /// Arena of entries, `None` marks a free slot
    slots: Vec<Option<CacheEntry>>,
    /// Free slot indices available for reuse
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: usize,
}

impl LruCache {
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LRU capacity must be greater than 0");

        Self {
            lookup: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            capacity,
        }
    }

    // == Get ==
    /// Looks up `key`, promoting it to most recently used when found.
    pub fn get(&mut self, key: &str) -> Lookup {
        let Some(&idx) = self.lookup.get(key) else {
            return Lookup::NotFound;
        };

        self.promote(idx);
        match &self.slots[idx] {
            Some(entry) => Lookup::Found(entry.value.clone()),
            None => Lookup::NotFound,
        }
    }

    // == Put ==
    /// Inserts or updates `key`, making it most recently used.
    ///
    /// Returns the key evicted to make room, if any.
    pub fn put(&mut self, key: String, value: String) -> Option<String> {
        if let Some(&idx) = self.lookup.get(&key) {
            if let Some(entry) = self.slots[idx].as_mut() {
                entry.value = value;
            }
            self.promote(idx);
            return None;
        }

        let evicted = if self.lookup.len() >= self.capacity {
            self.evict_tail()
        } else {
            None
        };

        let idx = self.alloc(CacheEntry::new(key.clone(), value));
        self.push_front(idx);
        self.lookup.insert(key, idx);

        evicted
    }

    // == Delete ==
    /// Removes `key` if present. Returns whether an entry was removed.
    pub fn del(&mut self, key: &str) -> bool {
        match self.lookup.remove(key) {
            Some(idx) => {
                self.unlink(idx);
                self.slots[idx] = None;
                self.free.push(idx);
                true
            }
            None => false,
        }
    }

    // == Peek ==
    /// Returns the value for `key` without touching recency.
    pub fn peek(&self, key: &str) -> Option<&str> {
        let idx = *self.lookup.get(key)?;
        self.slots[idx].as_ref().map(|entry| entry.value.as_str())
    }

    /// Checks if a key is cached without touching recency.
    pub fn contains(&self, key: &str) -> bool {
        self.lookup.contains_key(key)
    }

    /// Returns the least recently used key without removing it.
    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<&str> {
        let idx = self.tail?;
        self.slots[idx].as_ref().map(|entry| entry.key.as_str())
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.lookup.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            match &self.slots[idx] {
                Some(entry) => {
                    keys.push(entry.key.clone());
                    cursor = entry.next;
                }
                None => break,
            }
        }
        keys
    }

    /// Walks the recency list and checks it against the lookup table.
    ///
    /// Returns a description of the first broken invariant.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.lookup.len() > self.capacity {
            return Err(format!(
                "{} entries exceed capacity {}",
                self.lookup.len(),
                self.capacity
            ));
        }

        let mut walked = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let entry = self.slots[idx]
                .as_ref()
                .ok_or_else(|| format!("list points at free slot {}", idx))?;
            if entry.prev != prev {
                return Err(format!("broken back link at key '{}'", entry.key));
            }
            if self.lookup.get(&entry.key) != Some(&idx) {
                return Err(format!("key '{}' not mapped to its slot", entry.key));
            }
            walked += 1;
            if walked > self.lookup.len() {
                return Err("recency list longer than lookup table".to_string());
            }
            prev = Some(idx);
            cursor = entry.next;
        }

        if prev != self.tail {
            return Err("tail does not terminate the recency list".to_string());
        }
        if walked != self.lookup.len() {
            return Err(format!(
                "recency list holds {} entries, lookup table {}",
                walked,
                self.lookup.len()
            ));
        }
        Ok(())
    }

    // == List Maintenance ==
    fn alloc(&mut self, entry: CacheEntry) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                idx
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        }
    }

    fn promote(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(entry) = self.slots[idx].as_mut() {
            entry.prev = None;
            entry.next = old_head;
        }
        if let Some(head_idx) = old_head {
            if let Some(head) = self.slots[head_idx].as_mut() {
                head.prev = Some(idx);
            }
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_mut() {
            Some(entry) => (entry.prev.take(), entry.next.take()),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_entry) = self.slots[prev_idx].as_mut() {
                    prev_entry.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_entry) = self.slots[next_idx].as_mut() {
                    next_entry.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn evict_tail(&mut self) -> Option<String> {
        let idx = self.tail?;
        self.unlink(idx);
        let entry = self.slots[idx].take()?;
        self.free.push(idx);
        self.lookup.remove(&entry.key);
        Some(entry.key)
    }
}
