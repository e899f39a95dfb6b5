use log::warn;

use ghostwire_serde::{BitWrite, BitWriter, Serde};

use crate::{
    ghost::{
        diff_mask::DiffMask,
        host::{
            ghost_record::GhostState,
            ghost_table::{GhostTable, MIN_INDEX_BIT_WIDTH},
            ghost_update_manager::{AckNode, GhostUpdateManager, SentGhost},
            global_ghost_manager::GlobalGhostManager,
        },
        scope::{scope_in, GhostScopeMut, ScopeQuery},
    },
    types::{ConnKey, GhostIndex, PacketIndex},
};

/// Priority earned per packet a record has been passed over.
const SKIP_PRIORITY_STEP: f32 = 1.0;
/// Destroy notices outrank any accumulation of skipped updates.
const DESTROY_PRIORITY_BOOST: f32 = 16_384.0;

/// Host-side packet production: the scope pass that decides what each
/// connection may see, and the greedy priority-ordered encoder that
/// fills one packet's ghost section.
pub struct HostGhostWriter;

impl HostGhostWriter {
    /// Re-derive the connection's visible set. Scope-exempt records
    /// keep their visibility; every other record must be re-marked by
    /// the query or it is scheduled for destruction.
    pub fn run_scope_pass(
        globals: &mut GlobalGhostManager,
        table: &mut GhostTable,
        conn_key: ConnKey,
        query: &mut dyn ScopeQuery,
    ) {
        for slot in table.active_slots() {
            let Some(record) = table.record_mut(slot) else {
                continue;
            };
            if !globals.is_registered(record.object_id) {
                // object vanished from the global set: force it out,
                // exempt or not
                record.in_scope = false;
                record.scope_exempt = false;
            } else if !record.scope_exempt {
                record.in_scope = false;
            }
        }

        for id in globals.always_visible_for(conn_key) {
            scope_in(globals, table, conn_key, id, true);
        }

        query.query_scope(&mut GhostScopeMut::new(globals, table, conn_key));

        for slot in table.active_slots() {
            let Some(record) = table.record(slot) else {
                continue;
            };
            if record.in_scope {
                continue;
            }
            if let Some(id) = table.schedule_destroy(slot) {
                globals.remove_observer(id, conn_key);
            }
        }
    }

    /// Fill the ghost section of one outgoing packet.
    ///
    /// Layout: a 3-bit index-width field, then a run of entries each
    /// prefixed by a continue bit, closed by a reserved zero bit.
    /// Entries are taken highest-priority-first and encoding stops at
    /// the first entry that no longer fits.
    pub fn write_ghost_section(
        globals: &GlobalGhostManager,
        table: &mut GhostTable,
        updates: &mut GhostUpdateManager,
        packet_index: PacketIndex,
        writer: &mut BitWriter,
    ) {
        let width = table.index_bit_width();
        writer.write_bits((width - MIN_INDEX_BIT_WIDTH) as u32, 3);
        // the section terminator must always fit
        writer.reserve_bits(1);

        let pending = table.nonzero_slots();
        // pre-charge a skip on everything owing data; records that do
        // get written reset theirs below
        for &slot in &pending {
            if let Some(record) = table.record_mut(slot) {
                record.skip_count += 1;
            }
        }

        let mut eligible: Vec<GhostIndex> = Vec::with_capacity(pending.len());
        for slot in pending {
            let Some(record) = table.record_mut(slot) else {
                continue;
            };
            // a record whose create is in flight has nothing new to
            // say until the create resolves
            if record.state == GhostState::Creating {
                continue;
            }
            let mut priority = record.skip_count as f32 * SKIP_PRIORITY_STEP;
            if record.state == GhostState::Destroying {
                priority += DESTROY_PRIORITY_BOOST;
            }
            record.priority = priority;
            eligible.push(slot);
        }
        eligible.sort_unstable_by(|a, b| {
            let pa = table.record(*a).map_or(0.0, |r| r.priority);
            let pb = table.record(*b).map_or(0.0, |r| r.priority);
            pb.total_cmp(&pa)
        });

        for slot in eligible {
            let mut counter = writer.counter();
            counter.write_bit(true);
            counter.count_bits(width as u32);
            Self::write_payload(globals, table, slot, &mut counter);
            if counter.overflowed() {
                // highest-priority leftover no longer fits; everything
                // below it keeps its pre-charged skip
                break;
            }

            let residual_before = match table.record(slot) {
                Some(record) => record.residual,
                None => continue,
            };
            writer.write_bit(true);
            writer.write_bits(slot as u32, width);
            let Some(remainder) = Self::write_payload(globals, table, slot, writer) else {
                warn!("ghost slot {} lost its object mid-write", slot);
                table.clear_residual(slot);
                continue;
            };

            let generation = table.generation(slot);
            let state = match table.record_mut(slot) {
                Some(record) => {
                    record.skip_count = 0;
                    record.state
                }
                None => continue,
            };
            match state {
                GhostState::NotYetCreated => {
                    if let Some(record) = table.record_mut(slot) {
                        record.state = GhostState::Creating;
                    }
                    updates.record(
                        packet_index,
                        AckNode {
                            slot,
                            generation,
                            sent: SentGhost::Create,
                        },
                    );
                    table.set_residual(slot, remainder);
                }
                GhostState::Steady => {
                    let mut sent = residual_before;
                    sent.nand(&remainder);
                    if !sent.is_clear() {
                        updates.record(
                            packet_index,
                            AckNode {
                                slot,
                                generation,
                                sent: SentGhost::Update(sent),
                            },
                        );
                    }
                    table.set_residual(slot, remainder);
                }
                GhostState::Destroying => {
                    updates.record(
                        packet_index,
                        AckNode {
                            slot,
                            generation,
                            sent: SentGhost::Destroy,
                        },
                    );
                    // nothing further owed until the outcome arrives
                    table.clear_residual(slot);
                }
                GhostState::Creating => {
                    debug_assert!(false, "creating record passed the eligibility filter");
                    warn!("creating record {} passed the eligibility filter", slot);
                }
            }
        }

        writer.release_bits(1);
        writer.write_bit(false);
    }

    /// Encode one record's payload after the continue bit and index.
    /// Works against either the real writer or a dry-run counter, and
    /// mutates nothing; the caller applies state changes once the
    /// entry is known to fit. Returns the bits the object declined to
    /// write, or `None` when the object is gone from the global set.
    fn write_payload(
        globals: &GlobalGhostManager,
        table: &GhostTable,
        slot: GhostIndex,
        writer: &mut dyn BitWrite,
    ) -> Option<DiffMask> {
        let record = table.record(slot)?;
        match record.state {
            GhostState::Destroying => {
                writer.write_bit(true);
                Some(DiffMask::empty())
            }
            GhostState::NotYetCreated => {
                writer.write_bit(false);
                let tag = globals.tag(record.object_id)?;
                let object = globals.object(record.object_id)?;
                tag.ser(writer);
                // the create carries full state
                Some(object.write_update(&DiffMask::all(), writer))
            }
            GhostState::Steady => {
                writer.write_bit(false);
                let object = globals.object(record.object_id)?;
                Some(object.write_update(&record.residual, writer))
            }
            GhostState::Creating => None,
        }
    }
}
