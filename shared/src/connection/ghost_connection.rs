use ghostwire_serde::BitWriter;

use crate::{
    connection::config::GhostConfig,
    ghost::{
        diff_mask::DiffMask,
        host::{
            ghost_record::GhostState,
            ghost_table::GhostTable,
            ghost_update_manager::{GhostUpdateManager, SentGhost},
            global_ghost_manager::{GlobalGhostManager, ObjectId},
            host_ghost_writer::HostGhostWriter,
        },
        scope::ScopeQuery,
    },
    types::{ConnKey, PacketIndex},
};

/// The host side of one connection: its ghost table plus the in-flight
/// packet bookkeeping, and the delivered/dropped reconciliation that
/// ties the two together.
///
/// The transport owns packet sequencing and delivery detection; this
/// type only reacts to the outcomes it reports.
pub struct GhostConnection {
    key: ConnKey,
    table: GhostTable,
    updates: GhostUpdateManager,
}

impl GhostConnection {
    pub fn new(key: ConnKey, config: &GhostConfig) -> Self {
        Self {
            key,
            table: GhostTable::new(config.max_ghost_count),
            updates: GhostUpdateManager::new(),
        }
    }

    pub fn key(&self) -> ConnKey {
        self.key
    }

    pub fn table(&self) -> &GhostTable {
        &self.table
    }

    pub fn in_flight_packets(&self) -> usize {
        self.updates.in_flight_packets()
    }

    /// Fan this tick's dirty bits out into the table. Records being
    /// torn down are skipped; a destroy supersedes any update.
    pub fn merge_dirty(&mut self, dirty: &[(ObjectId, DiffMask)]) {
        for (id, mask) in dirty {
            let Some(slot) = self.table.slot_of(id) else {
                continue;
            };
            let Some(record) = self.table.record(slot) else {
                continue;
            };
            if record.state == GhostState::Destroying || record.destroy_after_create {
                continue;
            }
            self.table.or_residual(slot, mask);
        }
    }

    pub fn run_scope_pass(&mut self, globals: &mut GlobalGhostManager, query: &mut dyn ScopeQuery) {
        HostGhostWriter::run_scope_pass(globals, &mut self.table, self.key, query);
    }

    pub fn write_ghost_section(
        &mut self,
        globals: &GlobalGhostManager,
        packet_index: PacketIndex,
        writer: &mut BitWriter,
    ) {
        HostGhostWriter::write_ghost_section(
            globals,
            &mut self.table,
            &mut self.updates,
            packet_index,
            writer,
        );
    }

    /// The transport confirmed `packet_index` arrived. Creates settle
    /// into `Steady` (or roll straight into a queued destroy) and
    /// destroys free their slots. Duplicate notifications are no-ops.
    pub fn notify_packet_delivered(
        &mut self,
        globals: &mut GlobalGhostManager,
        packet_index: PacketIndex,
    ) {
        let Some(nodes) = self.updates.take_packet(packet_index) else {
            return;
        };
        for node in nodes {
            if self.table.generation(node.slot) != node.generation {
                continue;
            }
            match node.sent {
                SentGhost::Create => self.settle_create(node.slot),
                SentGhost::Update(_) => {}
                SentGhost::Destroy => {
                    let destroying = self
                        .table
                        .record(node.slot)
                        .is_some_and(|r| r.state == GhostState::Destroying);
                    if destroying {
                        if let Some(id) = self.table.free_record(node.slot) {
                            globals.remove_observer(id, self.key);
                        }
                    }
                }
            }
        }
    }

    /// The transport gave up on `packet_index`. Everything it carried
    /// that a later in-flight packet does not also carry flows back
    /// into residual masks for resending. Duplicate notifications are
    /// no-ops.
    pub fn notify_packet_dropped(
        &mut self,
        globals: &mut GlobalGhostManager,
        packet_index: PacketIndex,
    ) {
        let Some(nodes) = self.updates.take_packet(packet_index) else {
            return;
        };
        for node in nodes {
            if self.table.generation(node.slot) != node.generation {
                continue;
            }
            match node.sent {
                SentGhost::Create => self.rewind_create(globals, node.slot),
                SentGhost::Update(sent_mask) => {
                    let steady = self
                        .table
                        .record(node.slot)
                        .is_some_and(|r| r.state == GhostState::Steady);
                    if !steady {
                        // a destroy has since superseded these bits
                        continue;
                    }
                    let undelivered = self.updates.undelivered_mask(
                        packet_index,
                        node.slot,
                        node.generation,
                        sent_mask,
                    );
                    if !undelivered.is_clear() {
                        self.table.or_residual(node.slot, &undelivered);
                    }
                }
                SentGhost::Destroy => {
                    let destroying = self
                        .table
                        .record(node.slot)
                        .is_some_and(|r| r.state == GhostState::Destroying);
                    if destroying {
                        // the destroy notice itself must be resent
                        self.table.force_residual_all(node.slot);
                    }
                }
            }
        }
    }

    /// Drop all replication state for this connection, as on
    /// disconnect, unhooking its observer entries.
    pub fn reset(&mut self, globals: &mut GlobalGhostManager) {
        for id in self.table.reset() {
            globals.remove_observer(id, self.key);
        }
        self.updates.clear();
    }

    fn settle_create(&mut self, slot: crate::types::GhostIndex) {
        let queued_destroy = match self.table.record(slot) {
            Some(record) if record.state == GhostState::Creating => record.destroy_after_create,
            _ => return,
        };
        if queued_destroy {
            // it left scope while the create was in flight
            if let Some(record) = self.table.record_mut(slot) {
                record.destroy_after_create = false;
                record.state = GhostState::Destroying;
            }
            self.table.force_residual_all(slot);
        } else if let Some(record) = self.table.record_mut(slot) {
            record.state = GhostState::Steady;
        }
    }

    fn rewind_create(&mut self, globals: &mut GlobalGhostManager, slot: crate::types::GhostIndex) {
        let queued_destroy = match self.table.record(slot) {
            Some(record) if record.state == GhostState::Creating => record.destroy_after_create,
            _ => return,
        };
        if queued_destroy {
            // the peer never saw it and it is out of scope anyway
            if let Some(id) = self.table.free_record(slot) {
                globals.remove_observer(id, self.key);
            }
        } else {
            if let Some(record) = self.table.record_mut(slot) {
                record.state = GhostState::NotYetCreated;
            }
            self.table.force_residual_all(slot);
        }
    }
}
