#![allow(dead_code)]

use std::any::Any;

use ghostwire_shared::{
    BitReader, BitWrite, BitWriter, ClassRegistry, ClassTag, DiffMask, GhostConnection,
    GlobalGhostManager, GhostScopeMut, ObjectId, PacketIndex, RemoteGhostManager,
    RemoteGhostReader, Replicable, ScopeQuery, Serde, SerdeErr,
};

/// A replicable with four independently-tracked u32 fields, encoded
/// with one presence bit per field. `fields_per_packet` caps how many
/// fields a single write is willing to emit, leaving the rest behind
/// as residual.
pub struct TestBlob {
    pub fields: [u32; 4],
    pub fields_per_packet: Option<usize>,
}

impl TestBlob {
    pub fn new(fields: [u32; 4]) -> Self {
        Self {
            fields,
            fields_per_packet: None,
        }
    }
}

impl Replicable for TestBlob {
    fn write_update(&self, mask: &DiffMask, writer: &mut dyn BitWrite) -> DiffMask {
        let mut leftover = DiffMask::empty();
        let mut written = 0;
        for i in 0..4u8 {
            let wanted = mask.bit(i);
            let within_cap = self.fields_per_packet.map_or(true, |cap| written < cap);
            if wanted && within_cap {
                writer.write_bit(true);
                self.fields[i as usize].ser(writer);
                written += 1;
            } else {
                writer.write_bit(false);
                if wanted {
                    leftover.set_bit(i);
                }
            }
        }
        leftover
    }

    fn read_update(&mut self, reader: &mut BitReader) -> Result<(), SerdeErr> {
        for i in 0..4 {
            if reader.read_bit()? {
                self.fields[i] = u32::de(reader)?;
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub fn blob_registry() -> (ClassRegistry, ClassTag) {
    let mut registry = ClassRegistry::new();
    let tag = registry.register("test_blob", || Box::new(TestBlob::new([0; 4])));
    (registry, tag)
}

/// Scope query that marks a fixed list of objects visible.
pub struct ScopeSet {
    pub visible: Vec<ObjectId>,
}

impl ScopeSet {
    pub fn of(visible: &[ObjectId]) -> Self {
        Self {
            visible: visible.to_vec(),
        }
    }
}

impl ScopeQuery for ScopeSet {
    fn query_scope(&mut self, scope: &mut GhostScopeMut) {
        for id in &self.visible {
            scope.mark_in_scope(*id);
        }
    }
}

/// One full host tick: scope pass, dirty fan-out, then packet
/// production into a fresh full-size writer.
pub fn host_tick(
    globals: &mut GlobalGhostManager,
    conn: &mut GhostConnection,
    scope: &mut ScopeSet,
    packet_index: PacketIndex,
) -> Vec<u8> {
    conn.run_scope_pass(globals, scope);
    let dirty = globals.take_dirty();
    conn.merge_dirty(&dirty);
    let mut writer = BitWriter::new();
    conn.write_ghost_section(globals, packet_index, &mut writer);
    writer.to_bytes()
}

pub fn remote_read(registry: &ClassRegistry, remote: &mut RemoteGhostManager, bytes: &[u8]) {
    let mut reader = BitReader::new(bytes);
    RemoteGhostReader::read_ghost_section(registry, remote, &mut reader)
        .expect("ghost section should decode");
}

pub fn blob_fields(remote: &RemoteGhostManager, slot: u16) -> [u32; 4] {
    remote
        .ghost(slot)
        .expect("ghost should exist")
        .as_any()
        .downcast_ref::<TestBlob>()
        .expect("ghost should be a TestBlob")
        .fields
}
