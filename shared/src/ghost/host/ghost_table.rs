use std::collections::HashMap;

use log::warn;

use crate::{
    ghost::{
        diff_mask::DiffMask,
        host::{
            ghost_record::{GhostRecord, GhostState},
            global_ghost_manager::ObjectId,
        },
    },
    types::GhostIndex,
};

/// Smallest wire width for ghost indices; also the floor the 3-bit
/// width field encodes against (stored value = width - MIN).
pub const MIN_INDEX_BIT_WIDTH: u8 = 3;
/// 3-bit width field ⇒ widths 3..=10 ⇒ at most 1024 ghost slots.
pub const MAX_GHOST_CAPACITY: u16 = 1 << 10;

struct GhostSlot {
    generation: u16,
    record: Option<GhostRecord>,
}

/// The fixed-capacity set of ghost records owned by one connection.
///
/// Records live in slots; a record's slot number is its stable wire
/// identity for its whole lifetime and is reused (with a bumped
/// generation) after the record is freed. Separately, every slot has a
/// position in a scheduling order array that is partitioned into three
/// contiguous regions by index swaps:
///
/// ```text
/// [0, zero_update_index)        records owing data (residual != 0)
/// [zero_update_index, free_index) records fully sent (residual == 0)
/// [free_index, capacity)        free slots
/// ```
///
/// All residual-mask changes route through this type so the partition
/// invariant is enforced at a single choke point.
pub struct GhostTable {
    slots: Vec<GhostSlot>,
    /// Scheduling order: positions partitioned as documented above.
    order: Vec<GhostIndex>,
    /// slot → its current position in `order`.
    positions: Vec<u16>,
    zero_update_index: u16,
    free_index: u16,
    lookup: HashMap<ObjectId, GhostIndex>,
    capacity: u16,
}

impl GhostTable {
    pub fn new(capacity: u16) -> Self {
        let capacity = if capacity > MAX_GHOST_CAPACITY {
            warn!(
                "ghost capacity {} exceeds wire limit, clamping to {}",
                capacity, MAX_GHOST_CAPACITY
            );
            MAX_GHOST_CAPACITY
        } else {
            capacity
        };
        let mut slots = Vec::with_capacity(capacity as usize);
        let mut order = Vec::with_capacity(capacity as usize);
        let mut positions = Vec::with_capacity(capacity as usize);
        for i in 0..capacity {
            slots.push(GhostSlot {
                generation: 0,
                record: None,
            });
            order.push(i);
            positions.push(i);
        }
        Self {
            slots,
            order,
            positions,
            zero_update_index: 0,
            free_index: 0,
            lookup: HashMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> u16 {
        self.capacity
    }

    pub fn ghost_count(&self) -> usize {
        self.free_index as usize
    }

    pub fn zero_update_index(&self) -> u16 {
        self.zero_update_index
    }

    pub fn free_index(&self) -> u16 {
        self.free_index
    }

    pub fn record(&self, slot: GhostIndex) -> Option<&GhostRecord> {
        self.slots.get(slot as usize)?.record.as_ref()
    }

    pub(crate) fn record_mut(&mut self, slot: GhostIndex) -> Option<&mut GhostRecord> {
        self.slots.get_mut(slot as usize)?.record.as_mut()
    }

    pub fn generation(&self, slot: GhostIndex) -> u16 {
        self.slots[slot as usize].generation
    }

    pub fn slot_of(&self, id: &ObjectId) -> Option<GhostIndex> {
        self.lookup.get(id).copied()
    }

    /// Slots of all live records, in scheduling order.
    pub fn active_slots(&self) -> Vec<GhostIndex> {
        self.order[..self.free_index as usize].to_vec()
    }

    /// Slots of records that still owe data, in scheduling order.
    pub fn nonzero_slots(&self) -> Vec<GhostIndex> {
        self.order[..self.zero_update_index as usize].to_vec()
    }

    /// Allocate a record for `id` out of the free region. Returns
    /// `None` when the table is at capacity — callers treat that as
    /// recoverable and simply retry on a later tick.
    pub(crate) fn allocate(&mut self, id: ObjectId, scope_exempt: bool) -> Option<GhostIndex> {
        if self.free_index >= self.capacity {
            return None;
        }
        debug_assert!(!self.lookup.contains_key(&id));
        let slot = self.order[self.free_index as usize];
        self.free_index += 1;
        self.slots[slot as usize].record = Some(GhostRecord::new(id, scope_exempt));
        self.lookup.insert(id, slot);
        // a fresh record owes its full initial state
        self.force_residual_all(slot);
        Some(slot)
    }

    /// OR additional dirty bits into a record's residual, moving it
    /// into the nonzero region on a 0→nonzero transition.
    pub(crate) fn or_residual(&mut self, slot: GhostIndex, mask: &DiffMask) {
        let Some(record) = self.record_mut(slot) else {
            warn!("or_residual on empty ghost slot {}", slot);
            return;
        };
        let was_clear = record.residual.is_clear();
        record.residual.or(mask);
        if was_clear && !record.residual.is_clear() {
            self.push_nonzero(slot);
        }
    }

    pub(crate) fn force_residual_all(&mut self, slot: GhostIndex) {
        self.or_residual(slot, &DiffMask::all());
    }

    /// Replace a record's residual with what its encoder reported
    /// unsent, moving it between regions as needed.
    pub(crate) fn set_residual(&mut self, slot: GhostIndex, mask: DiffMask) {
        let Some(record) = self.record_mut(slot) else {
            warn!("set_residual on empty ghost slot {}", slot);
            return;
        };
        let was_clear = record.residual.is_clear();
        record.residual = mask;
        let now_clear = mask.is_clear();
        if was_clear && !now_clear {
            self.push_nonzero(slot);
        } else if !was_clear && now_clear {
            self.push_to_zero(slot);
        }
    }

    pub(crate) fn clear_residual(&mut self, slot: GhostIndex) {
        self.set_residual(slot, DiffMask::empty());
    }

    /// Begin tearing a ghost down. If the record was never serialized
    /// the peer knows nothing of it, so it is freed outright and its
    /// `ObjectId` is returned for observer cleanup.
    pub(crate) fn schedule_destroy(&mut self, slot: GhostIndex) -> Option<ObjectId> {
        let state = self.record(slot)?.state;
        match state {
            GhostState::NotYetCreated => self.free_record(slot),
            GhostState::Creating => {
                if let Some(record) = self.record_mut(slot) {
                    record.destroy_after_create = true;
                }
                None
            }
            GhostState::Steady => {
                if let Some(record) = self.record_mut(slot) {
                    record.state = GhostState::Destroying;
                }
                // the destroy notice itself is now the thing owed
                self.force_residual_all(slot);
                None
            }
            GhostState::Destroying => None,
        }
    }

    /// Return a record to the free region, bumping the slot generation
    /// so stale ack nodes can never touch its successor.
    pub(crate) fn free_record(&mut self, slot: GhostIndex) -> Option<ObjectId> {
        let object_id = self.record(slot)?.object_id;
        self.clear_residual(slot);
        self.push_zero_to_free(slot);
        self.lookup.remove(&object_id);
        let slot_ref = &mut self.slots[slot as usize];
        slot_ref.record = None;
        slot_ref.generation = slot_ref.generation.wrapping_add(1);
        Some(object_id)
    }

    /// Drain every record without any peer handshake. Returns the
    /// object ids that were still ghosted, for observer cleanup.
    pub(crate) fn reset(&mut self) -> Vec<ObjectId> {
        let mut object_ids = Vec::new();
        for slot in self.active_slots() {
            if let Some(id) = self.free_record(slot) {
                object_ids.push(id);
            }
        }
        debug_assert!(self.free_index == 0 && self.zero_update_index == 0);
        object_ids
    }

    /// Wire width for ghost indices this packet: enough bits for the
    /// highest live slot, never below the 3-bit floor.
    pub fn index_bit_width(&self) -> u8 {
        let max_active = self.order[..self.free_index as usize]
            .iter()
            .copied()
            .max()
            .unwrap_or(0) as u32;
        let needed = 32 - max_active.leading_zeros().min(31);
        let needed = needed.max(1) as u8;
        needed.max(MIN_INDEX_BIT_WIDTH)
    }

    /// True when every structural invariant of the table holds. Cheap
    /// enough for tests, not meant for per-packet use.
    pub fn invariants_hold(&self) -> bool {
        if !(self.zero_update_index <= self.free_index && self.free_index <= self.capacity) {
            return false;
        }
        for (position, &slot) in self.order.iter().enumerate() {
            if self.positions[slot as usize] as usize != position {
                return false;
            }
            let record = &self.slots[slot as usize].record;
            let position = position as u16;
            let ok = if position < self.zero_update_index {
                record.as_ref().is_some_and(|r| !r.residual.is_clear())
            } else if position < self.free_index {
                record.as_ref().is_some_and(|r| r.residual.is_clear())
            } else {
                record.is_none()
            };
            if !ok {
                return false;
            }
        }
        self.lookup.iter().all(|(id, &slot)| {
            self.slots[slot as usize]
                .record
                .as_ref()
                .is_some_and(|r| r.object_id == *id)
        })
    }

    // The four primitive region moves. Each is an O(1) swap in `order`
    // plus a boundary shift, keeping both records' positions accurate.

    fn push_nonzero(&mut self, slot: GhostIndex) {
        let position = self.positions[slot as usize];
        if !(self.zero_update_index..self.free_index).contains(&position) {
            debug_assert!(false, "push_nonzero: slot {} not in zero region", slot);
            warn!("push_nonzero: slot {} not in zero region", slot);
            return;
        }
        self.swap_positions(position, self.zero_update_index);
        self.zero_update_index += 1;
    }

    fn push_to_zero(&mut self, slot: GhostIndex) {
        let position = self.positions[slot as usize];
        if !(position < self.zero_update_index) {
            debug_assert!(false, "push_to_zero: slot {} not in nonzero region", slot);
            warn!("push_to_zero: slot {} not in nonzero region", slot);
            return;
        }
        self.swap_positions(position, self.zero_update_index - 1);
        self.zero_update_index -= 1;
    }

    fn push_zero_to_free(&mut self, slot: GhostIndex) {
        let position = self.positions[slot as usize];
        if !(self.zero_update_index..self.free_index).contains(&position) {
            debug_assert!(false, "push_zero_to_free: slot {} not in zero region", slot);
            warn!("push_zero_to_free: slot {} not in zero region", slot);
            return;
        }
        self.swap_positions(position, self.free_index - 1);
        self.free_index -= 1;
    }

    fn swap_positions(&mut self, a: u16, b: u16) {
        let slot_a = self.order[a as usize];
        let slot_b = self.order[b as usize];
        self.order.swap(a as usize, b as usize);
        self.positions[slot_a as usize] = b;
        self.positions[slot_b as usize] = a;
    }
}
