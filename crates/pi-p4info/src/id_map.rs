//! Sparse identifier map.
//!
//! Maps 32- or 64-bit integer keys to dense slot indices. Keys are
//! caller-assigned, may be inserted in any order and may be spread over
//! a large, sparse key space.
//!
//! # Layout
//!
//! The key space is cut into leaves of 64 consecutive keys. Only leaves
//! holding at least one key are allocated, in a `BTreeMap` ordered by
//! leaf number. Each leaf stores a 64-bit presence bitmap and a dense
//! vector with one slot per present key, ordered by key. The slot of a
//! key is found by ranking its bit: the number of present keys below it
//! in the same leaf.
//!
//! | Operation | Time |
//! |-----------|------|
//! | `insert()` | O(log L + 64) |
//! | `get()` | O(log L) |
//! | `iter()` | O(N), ascending key order |
//!
//! where `L` is the number of allocated leaves. Memory is proportional to
//! the number of populated keys, never to the size of the key space.

use std::collections::{btree_map, BTreeMap};
use std::marker::PhantomData;
use std::mem;

use pi_types::P4Id;
use thiserror::Error;

const LEAF_BITS: u32 = 6;
const LEAF_MASK: u64 = (1 << LEAF_BITS) - 1;

/// Integer key usable in a [`SparseIdMap`].
pub trait SparseKey: Copy + Ord {
    /// Widens the key to 64 bits.
    fn to_bits(self) -> u64;

    /// Narrows a value produced by [`SparseKey::to_bits`] back to a key.
    fn from_bits(bits: u64) -> Self;
}

impl SparseKey for u64 {
    fn to_bits(self) -> u64 {
        self
    }

    fn from_bits(bits: u64) -> Self {
        bits
    }
}

impl SparseKey for u32 {
    fn to_bits(self) -> u64 {
        u64::from(self)
    }

    fn from_bits(bits: u64) -> Self {
        // Only ever called with values produced by `to_bits`.
        bits as u32
    }
}

impl SparseKey for P4Id {
    fn to_bits(self) -> u64 {
        u64::from(self.as_u32())
    }

    fn from_bits(bits: u64) -> Self {
        P4Id::new(u32::from_bits(bits))
    }
}

/// Returned when inserting a key that is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("key {0} already present")]
pub struct DuplicateKey(pub u64);

#[derive(Debug, Clone, Default)]
struct Leaf {
    present: u64,
    slots: Vec<usize>,
}

impl Leaf {
    fn rank(&self, bit: u32) -> usize {
        (self.present & ((1u64 << bit) - 1)).count_ones() as usize
    }

    fn contains(&self, bit: u32) -> bool {
        self.present & (1u64 << bit) != 0
    }
}

/// Ordered map from sparse integer keys to slot indices.
///
/// # Example
///
/// ```
/// use pi_p4info::SparseIdMap;
///
/// let mut map: SparseIdMap<u32> = SparseIdMap::new();
/// map.insert(1000, 0).unwrap();
/// map.insert(3, 1).unwrap();
/// map.insert(70, 2).unwrap();
///
/// assert_eq!(map.get(70), Some(2));
/// assert_eq!(map.get(71), None);
/// assert!(map.insert(3, 9).is_err());
///
/// let keys: Vec<u32> = map.keys().collect();
/// assert_eq!(keys, vec![3, 70, 1000]);
/// ```
#[derive(Debug, Clone)]
pub struct SparseIdMap<K: SparseKey> {
    leaves: BTreeMap<u64, Leaf>,
    len: usize,
    // Slots still to be handed out to new leaves, from `with_capacity`.
    spare: usize,
    _key: PhantomData<K>,
}

impl<K: SparseKey> SparseIdMap<K> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            leaves: BTreeMap::new(),
            len: 0,
            spare: 0,
            _key: PhantomData,
        }
    }

    /// Creates an empty map sized for about `expected` keys.
    ///
    /// Leaves are still allocated on first use. Each new leaf reserves
    /// slots out of a budget of `expected`, so a dense key range fills
    /// without regrowing and the total reservation never exceeds
    /// `expected` slots.
    pub fn with_capacity(expected: usize) -> Self {
        Self {
            spare: expected,
            ..Self::new()
        }
    }

    fn split(key: K) -> (u64, u32) {
        let bits = key.to_bits();
        (bits >> LEAF_BITS, (bits & LEAF_MASK) as u32)
    }

    /// Inserts `key` with the given slot.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateKey`] and leaves the map unchanged if `key` is
    /// already present.
    pub fn insert(&mut self, key: K, slot: usize) -> Result<(), DuplicateKey> {
        let (leaf_no, bit) = Self::split(key);
        let spare = &mut self.spare;
        let leaf = self.leaves.entry(leaf_no).or_insert_with(|| {
            let reserve = (*spare).min(1 << LEAF_BITS);
            *spare -= reserve;
            Leaf {
                present: 0,
                slots: Vec::with_capacity(reserve),
            }
        });
        if leaf.contains(bit) {
            return Err(DuplicateKey(key.to_bits()));
        }
        let rank = leaf.rank(bit);
        leaf.slots.insert(rank, slot);
        leaf.present |= 1u64 << bit;
        self.len += 1;
        Ok(())
    }

    /// Returns the slot of `key`, if present.
    pub fn get(&self, key: K) -> Option<usize> {
        let (leaf_no, bit) = Self::split(key);
        let leaf = self.leaves.get(&leaf_no)?;
        if !leaf.contains(bit) {
            return None;
        }
        leaf.slots.get(leaf.rank(bit)).copied()
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: K) -> bool {
        let (leaf_no, bit) = Self::split(key);
        self.leaves
            .get(&leaf_no)
            .map_or(false, |leaf| leaf.contains(bit))
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the map holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns an iterator over `(key, slot)` pairs in ascending key order.
    ///
    /// The iterator borrows the map; calling `iter` again restarts from
    /// the smallest key.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            leaves: self.leaves.iter(),
            current: None,
            remaining: self.len,
            _key: PhantomData,
        }
    }

    /// Returns an iterator over keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Removes every key and releases leaf storage.
    pub fn clear(&mut self) {
        self.leaves.clear();
        self.len = 0;
        self.spare = 0;
    }

    /// Returns the number of allocated leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Estimates heap usage in bytes.
    ///
    /// This is approximate: B-tree node overhead is counted per entry and
    /// allocator metadata is ignored.
    pub fn memory_usage(&self) -> usize {
        let per_leaf = mem::size_of::<u64>() + mem::size_of::<Leaf>();
        self.leaves
            .values()
            .map(|leaf| per_leaf + leaf.slots.capacity() * mem::size_of::<usize>())
            .sum()
    }
}

impl<K: SparseKey> Default for SparseIdMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K: SparseKey> IntoIterator for &'a SparseIdMap<K> {
    type Item = (K, usize);
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending-order iterator over a [`SparseIdMap`].
pub struct Iter<'a, K> {
    leaves: btree_map::Iter<'a, u64, Leaf>,
    // Leaf number, bits not yet yielded, and the matching slots.
    current: Option<(u64, u64, std::slice::Iter<'a, usize>)>,
    remaining: usize,
    _key: PhantomData<K>,
}

impl<'a, K: SparseKey> Iterator for Iter<'a, K> {
    type Item = (K, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((leaf_no, bits, slots)) = &mut self.current {
                if *bits != 0 {
                    let bit = u64::from(bits.trailing_zeros());
                    *bits &= *bits - 1;
                    let slot = *slots.next()?;
                    self.remaining -= 1;
                    return Some((K::from_bits((*leaf_no << LEAF_BITS) | bit), slot));
                }
            }
            let (leaf_no, leaf) = self.leaves.next()?;
            self.current = Some((*leaf_no, leaf.present, leaf.slots.iter()));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: SparseKey> ExactSizeIterator for Iter<'a, K> {}
