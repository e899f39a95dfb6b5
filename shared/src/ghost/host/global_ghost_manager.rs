use std::collections::HashSet;

use log::warn;

use crate::{
    ghost::{class_registry::ClassTag, diff_mask::DiffMask, replicable::Replicable},
    types::ConnKey,
};

/// Generation-checked handle to an authoritative object. A freed and
/// reused slot produces a new generation, so a stale id held by an old
/// ack callback or scope list can never alias its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    slot: u32,
    generation: u16,
}

/// How an object participates in scope queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeMode {
    /// Ghosted only while the simulation marks it in scope.
    Normal,
    /// Ghosted to every connection, bypassing scope queries.
    AlwaysVisible,
    /// Ghosted unconditionally, but only to one designated connection.
    AlwaysVisibleTo(ConnKey),
}

struct ObjectEntry {
    object: Box<dyn Replicable>,
    tag: ClassTag,
    dirty: DiffMask,
    scope_mode: ScopeMode,
    observers: HashSet<ConnKey>,
}

struct Slot {
    generation: u16,
    entry: Option<ObjectEntry>,
}

/// The authoritative endpoint's store of replicable objects: the
/// objects themselves, their accumulated dirty masks, their scope
/// modes, and a back-reference set of every connection currently
/// ghosting each one.
///
/// Objects registered here are authoritative by construction; remote
/// proxies live in `RemoteGhostManager` and are never fed back in, so a
/// ghost can never itself be ghosted.
pub struct GlobalGhostManager {
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
}

impl GlobalGhostManager {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
        }
    }

    pub fn register(
        &mut self,
        object: Box<dyn Replicable>,
        tag: ClassTag,
        scope_mode: ScopeMode,
    ) -> ObjectId {
        let entry = ObjectEntry {
            object,
            tag,
            dirty: DiffMask::empty(),
            scope_mode,
            observers: HashSet::new(),
        };
        if let Some(slot) = self.free_slots.pop() {
            let slot_ref = &mut self.slots[slot as usize];
            slot_ref.entry = Some(entry);
            ObjectId {
                slot,
                generation: slot_ref.generation,
            }
        } else {
            let slot = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            ObjectId {
                slot,
                generation: 0,
            }
        }
    }

    /// Remove an object from replication. Connections still ghosting it
    /// notice on their next scope pass and tear the ghost down through
    /// the normal destroy handshake.
    pub fn unregister(&mut self, id: ObjectId) -> Option<Box<dyn Replicable>> {
        let slot_ref = self.slot_mut(id)?;
        let entry = slot_ref.entry.take()?;
        slot_ref.generation = slot_ref.generation.wrapping_add(1);
        self.free_slots.push(id.slot);
        Some(entry.object)
    }

    pub fn is_registered(&self, id: ObjectId) -> bool {
        self.entry(id).is_some()
    }

    pub fn object(&self, id: ObjectId) -> Option<&dyn Replicable> {
        self.entry(id).map(|entry| entry.object.as_ref())
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut dyn Replicable> {
        match self.entry_mut(id) {
            Some(entry) => Some(&mut *entry.object),
            None => None,
        }
    }

    pub fn tag(&self, id: ObjectId) -> Option<ClassTag> {
        self.entry(id).map(|entry| entry.tag)
    }

    pub fn scope_mode(&self, id: ObjectId) -> Option<ScopeMode> {
        self.entry(id).map(|entry| entry.scope_mode)
    }

    /// Fold changed aspects into the object's dirty mask. Collected and
    /// fanned out to observing connections once per tick via
    /// [`Self::take_dirty`].
    pub fn mark_dirty(&mut self, id: ObjectId, mask: DiffMask) {
        let Some(entry) = self.entry_mut(id) else {
            warn!("mark_dirty: stale object id {:?}", id);
            return;
        };
        entry.dirty.or(&mask);
    }

    /// Drain every nonzero dirty mask. Run once per simulation tick,
    /// before any connection serializes packets; each connection then
    /// merges the result into its own residual masks.
    pub fn take_dirty(&mut self) -> Vec<(ObjectId, DiffMask)> {
        let mut output = Vec::new();
        for (slot, slot_ref) in self.slots.iter_mut().enumerate() {
            if let Some(entry) = slot_ref.entry.as_mut() {
                if !entry.dirty.is_clear() {
                    output.push((
                        ObjectId {
                            slot: slot as u32,
                            generation: slot_ref.generation,
                        },
                        entry.dirty,
                    ));
                    entry.dirty.clear();
                }
            }
        }
        output
    }

    /// Objects this connection must ghost regardless of scope queries.
    pub fn always_visible_for(&self, conn: ConnKey) -> Vec<ObjectId> {
        let mut output = Vec::new();
        for (slot, slot_ref) in self.slots.iter().enumerate() {
            if let Some(entry) = slot_ref.entry.as_ref() {
                let applies = match entry.scope_mode {
                    ScopeMode::Normal => false,
                    ScopeMode::AlwaysVisible => true,
                    ScopeMode::AlwaysVisibleTo(key) => key == conn,
                };
                if applies {
                    output.push(ObjectId {
                        slot: slot as u32,
                        generation: slot_ref.generation,
                    });
                }
            }
        }
        output
    }

    // Observer back-references

    pub(crate) fn add_observer(&mut self, id: ObjectId, conn: ConnKey) {
        let Some(entry) = self.entry_mut(id) else {
            warn!("add_observer: stale object id {:?}", id);
            return;
        };
        entry.observers.insert(conn);
    }

    /// Tolerant of stale ids: an object may legitimately be
    /// unregistered while a connection still winds its ghost down.
    pub(crate) fn remove_observer(&mut self, id: ObjectId, conn: ConnKey) {
        if let Some(entry) = self.entry_mut(id) {
            entry.observers.remove(&conn);
        }
    }

    pub fn observer_count(&self, id: ObjectId) -> usize {
        self.entry(id).map_or(0, |entry| entry.observers.len())
    }

    fn slot_mut(&mut self, id: ObjectId) -> Option<&mut Slot> {
        let slot_ref = self.slots.get_mut(id.slot as usize)?;
        if slot_ref.generation != id.generation {
            return None;
        }
        Some(slot_ref)
    }

    fn entry(&self, id: ObjectId) -> Option<&ObjectEntry> {
        let slot_ref = self.slots.get(id.slot as usize)?;
        if slot_ref.generation != id.generation {
            return None;
        }
        slot_ref.entry.as_ref()
    }

    fn entry_mut(&mut self, id: ObjectId) -> Option<&mut ObjectEntry> {
        self.slot_mut(id)?.entry.as_mut()
    }
}

impl Default for GlobalGhostManager {
    fn default() -> Self {
        Self::new()
    }
}
