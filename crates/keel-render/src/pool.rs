use crate::bitset::Bitset;
use crate::resource::ResourceKind;

/// Contract for records stored in a [`Pool`].
pub trait PoolItem {
    const KIND: ResourceKind;

    /// Bytes of backing-store data this record currently holds.
    fn byte_usage(&self) -> usize;
}

/// Fixed-capacity slab keyed by an occupancy bitset.
///
/// Slots are handed out lowest-free-first and never move; a slot index stays
/// valid until [`Pool::free`] releases it. The pool never grows.
#[derive(Debug)]
pub struct Pool<T: PoolItem> {
    occupancy: Bitset,
    slots: Vec<Option<T>>,
}

impl<T: PoolItem> Pool<T> {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            occupancy: Bitset::new(capacity),
            slots,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn live(&self) -> usize {
        self.occupancy.count_set()
    }

    pub fn is_full(&self) -> bool {
        self.live() == self.capacity()
    }

    /// Reserve the lowest free slot for `value`.
    ///
    /// Returns `None` when every slot is occupied.
    pub fn allocate(&mut self, value: T) -> Option<u32> {
        let index = self.occupancy.find_first_unset()?;
        self.occupancy.set(index);
        self.slots[index] = Some(value);
        Some(index as u32)
    }

    /// Release `index` and return the record it held.
    pub fn free(&mut self, index: u32) -> Option<T> {
        if !self.contains(index) {
            return None;
        }
        self.occupancy.clear(index as usize);
        self.slots[index as usize].take()
    }

    /// Whether `index` names an occupied slot.
    pub fn contains(&self, index: u32) -> bool {
        (index as usize) < self.slots.len() && self.occupancy.test(index as usize)
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.slots.get(index as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.slots.get_mut(index as usize)?.as_mut()
    }

    /// Iterate occupied slots as `(index, record)` in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| Some((i as u32, slot.as_ref()?)))
    }

    /// Total backing-store bytes across occupied slots.
    pub fn byte_usage(&self) -> usize {
        self.iter().map(|(_, record)| record.byte_usage()).sum()
    }
}

impl<T: PoolItem> Drop for Pool<T> {
    fn drop(&mut self) {
        let leaked = self.live();
        if leaked > 0 {
            tracing::warn!(kind = %T::KIND, leaked, "pool dropped with live slots");
        }
    }
}
