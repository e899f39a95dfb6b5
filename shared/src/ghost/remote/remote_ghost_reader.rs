use ghostwire_serde::{BitReader, Serde};

use crate::{
    ghost::{
        class_registry::{ClassRegistry, ClassTag},
        error::GhostError,
        host::ghost_table::{MAX_GHOST_CAPACITY, MIN_INDEX_BIT_WIDTH},
        remote::{ghost_event::GhostEvent, remote_ghost_manager::RemoteGhostManager},
    },
    types::GhostIndex,
};

/// Decodes the ghost section of one incoming packet, mirroring the
/// host writer's layout exactly. Any decode failure is fatal for the
/// packet: a misparse leaves the reader at an arbitrary bit offset, so
/// nothing after it can be trusted.
pub struct RemoteGhostReader;

impl RemoteGhostReader {
    pub fn read_ghost_section(
        registry: &ClassRegistry,
        manager: &mut RemoteGhostManager,
        reader: &mut BitReader,
    ) -> Result<(), GhostError> {
        let width = reader.read_bits(3)? as u8 + MIN_INDEX_BIT_WIDTH;

        while reader.read_bit()? {
            let slot = reader.read_bits(width)? as GhostIndex;
            if slot >= MAX_GHOST_CAPACITY {
                return Err(GhostError::GhostIndexOutOfRange {
                    index: slot,
                    capacity: MAX_GHOST_CAPACITY,
                });
            }

            let destroy = reader.read_bit()?;
            if destroy {
                if manager.take(slot).is_none() {
                    return Err(GhostError::MissingGhost { index: slot });
                }
                manager.push_event(GhostEvent::Despawned(slot));
            } else if let Some(object) = manager.ghost_mut(slot) {
                object.read_update(reader)?;
                manager.push_event(GhostEvent::Updated(slot));
            } else {
                // first sight of this slot: class tag then full state
                let tag = ClassTag::de(reader)?;
                let mut object = registry.create(tag)?;
                object.read_update(reader)?;
                manager.insert(slot, object);
                manager.push_event(GhostEvent::Spawned(slot));
            }
        }
        Ok(())
    }
}
