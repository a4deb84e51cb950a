use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

const DEFAULT_CAPACITY: usize = 64;
const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// An open-addressed, strong-reference intern pool.
///
/// `intern(v)` returns the first value structurally equal to `v` that was ever
/// stored; later equal values are discarded in favor of the canonical one.
/// Interned values are expected to be cheaply cloneable handles (`Arc`-backed
/// names, types, lists), so pointer identity becomes a usable fast path for
/// equality of heavily repeated sub-structures.
///
/// Probing is linear, and removal relocates displaced entries in place
/// (Knuth's backward-shift deletion) rather than leaving tombstones.
#[derive(Debug)]
pub struct InternPool<T: Eq + Hash + Clone> {
    slots: Box<[Option<T>]>,
    len: usize,
    load_factor: f32,
    threshold: usize,
    order: Vec<T>,
    index: Option<PoolIndex<T>>,
    hasher: RandomState,
}

impl<T: Eq + Hash + Clone> Default for InternPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Clone> InternPool<T> {
    pub fn new() -> InternPool<T> {
        Self::with_capacity_and_load_factor(DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR)
    }

    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> InternPool<T> {
        assert!(
            load_factor > 0.0 && load_factor < 1.0,
            "load factor must be in (0, 1)"
        );
        let capacity = capacity.next_power_of_two().max(8);
        InternPool {
            slots: vec![None; capacity].into_boxed_slice(),
            len: 0,
            load_factor,
            threshold: (capacity as f32 * load_factor) as usize,
            order: Vec::new(),
            index: None,
            hasher: RandomState::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn slot_of(&self, value: &T) -> usize {
        (self.hasher.hash_one(value) as usize) & (self.slots.len() - 1)
    }

    /// Returns the canonical instance equal to `value`, storing `value` if no
    /// equal instance exists yet.
    pub fn intern(&mut self, value: T) -> T {
        if self.len + 1 > self.threshold {
            self.grow();
        }
        let mask = self.slots.len() - 1;
        let mut i = self.slot_of(&value);
        loop {
            match &self.slots[i] {
                Some(existing) if *existing == value => return existing.clone(),
                Some(_) => i = (i + 1) & mask,
                None => {
                    self.slots[i] = Some(value.clone());
                    self.len += 1;
                    self.order.push(value.clone());
                    self.index = None;
                    return value;
                }
            }
        }
    }

    pub fn get(&self, value: &T) -> Option<&T> {
        let mask = self.slots.len() - 1;
        let mut i = self.slot_of(value);
        loop {
            match &self.slots[i] {
                Some(existing) if existing == value => return self.slots[i].as_ref(),
                Some(_) => i = (i + 1) & mask,
                None => return None,
            }
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.get(value).is_some()
    }

    /// Removes the canonical instance equal to `value`, relocating displaced
    /// neighbors so no tombstone is left behind.
    pub fn remove(&mut self, value: &T) -> bool {
        let mask = self.slots.len() - 1;
        let mut i = self.slot_of(value);
        loop {
            match &self.slots[i] {
                Some(existing) if existing == value => break,
                Some(_) => i = (i + 1) & mask,
                None => return false,
            }
        }

        self.slots[i] = None;
        let mut hole = i;
        let mut j = i;
        loop {
            j = (j + 1) & mask;
            let Some(candidate) = self.slots[j].clone() else {
                break;
            };
            let ideal = self.slot_of(&candidate);
            // Keep the entry where it is only if its ideal slot lies
            // cyclically within (hole, j]; otherwise shift it into the hole.
            let reachable = if j > hole {
                ideal > hole && ideal <= j
            } else {
                ideal > hole || ideal <= j
            };
            if !reachable {
                self.slots[hole] = self.slots[j].take();
                hole = j;
            }
        }

        self.len -= 1;
        self.order.retain(|v| v != value);
        self.index = None;
        true
    }

    /// Iterates canonical values in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter()
    }

    /// The position view: each stored element gets a stable 1-based position
    /// (0 is reserved for "null"). Invalidated by any structural change and
    /// rebuilt lazily here.
    pub fn index(&mut self) -> &PoolIndex<T> {
        if self.index.is_none() {
            let mut positions = HashMap::with_capacity(self.order.len());
            for (i, v) in self.order.iter().enumerate() {
                positions.insert(v.clone(), (i + 1) as u32);
            }
            self.index = Some(PoolIndex {
                items: self.order.clone(),
                positions,
            });
        }
        match &self.index {
            Some(index) => index,
            None => unreachable!(),
        }
    }

    fn grow(&mut self) {
        let new_cap = self.slots.len() * 2;
        let old = std::mem::replace(&mut self.slots, vec![None; new_cap].into_boxed_slice());
        self.threshold = (new_cap as f32 * self.load_factor) as usize;
        let mask = new_cap - 1;
        for value in old.into_vec().into_iter().flatten() {
            let mut i = self.slot_of(&value);
            while self.slots[i].is_some() {
                i = (i + 1) & mask;
            }
            self.slots[i] = Some(value);
        }
    }
}

/// Dense 1-based positions for the current pool contents.
#[derive(Debug)]
pub struct PoolIndex<T: Eq + Hash + Clone> {
    items: Vec<T>,
    positions: HashMap<T, u32>,
}

impl<T: Eq + Hash + Clone> PoolIndex<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 1-based position of an interned value, `None` if it is not pooled.
    pub fn position_of(&self, value: &T) -> Option<u32> {
        self.positions.get(value).copied()
    }

    /// Inverse of [`position_of`]; positions are 1-based.
    ///
    /// [`position_of`]: PoolIndex::position_of
    pub fn get(&self, position: u32) -> Option<&T> {
        if position == 0 {
            return None;
        }
        self.items.get(position as usize - 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}
