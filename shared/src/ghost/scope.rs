use log::warn;

use crate::{
    ghost::host::{
        ghost_record::GhostState, ghost_table::GhostTable,
        global_ghost_manager::GlobalGhostManager, ObjectId,
    },
    types::ConnKey,
};

/// The per-packet contract between the replication core and the
/// simulation: given this connection's viewpoint, mark every object
/// that should currently be visible. Anything not marked (and not
/// always-visible) is scheduled for destruction afterwards.
pub trait ScopeQuery {
    fn query_scope(&mut self, scope: &mut GhostScopeMut);
}

/// Handle passed to [`ScopeQuery::query_scope`] for marking objects in
/// scope on one connection.
pub struct GhostScopeMut<'s> {
    globals: &'s mut GlobalGhostManager,
    table: &'s mut GhostTable,
    conn_key: ConnKey,
}

impl<'s> GhostScopeMut<'s> {
    pub(crate) fn new(
        globals: &'s mut GlobalGhostManager,
        table: &'s mut GhostTable,
        conn_key: ConnKey,
    ) -> Self {
        Self {
            globals,
            table,
            conn_key,
        }
    }

    /// Returns true if this connection already ghosts the object.
    pub fn has(&self, id: ObjectId) -> bool {
        self.table.slot_of(&id).is_some()
    }

    /// Marks an object visible for this packet cycle, allocating a
    /// ghost record on first sight.
    pub fn mark_in_scope(&mut self, id: ObjectId) {
        scope_in(self.globals, self.table, self.conn_key, id, false);
    }
}

/// Mark `id` in scope on `table`, allocating a record if none exists.
/// A full table is recoverable: the object is skipped this cycle and
/// picked up by a later scope query once a slot frees up.
pub(crate) fn scope_in(
    globals: &mut GlobalGhostManager,
    table: &mut GhostTable,
    conn_key: ConnKey,
    id: ObjectId,
    scope_exempt: bool,
) {
    if !globals.is_registered(id) {
        warn!("scope query marked unregistered object {:?}", id);
        return;
    }
    if let Some(slot) = table.slot_of(&id) {
        if let Some(record) = table.record_mut(slot) {
            record.in_scope = true;
            if scope_exempt {
                record.scope_exempt = true;
            }
            // came back before its create resolved: cancel the queued
            // teardown instead of destroying and recreating. A record
            // already `Destroying` cannot be rescued, the peer may be
            // dropping it as we speak.
            if record.state == GhostState::Creating {
                record.destroy_after_create = false;
            }
        }
        return;
    }
    if table.allocate(id, scope_exempt).is_some() {
        globals.add_observer(id, conn_key);
    } else {
        warn!(
            "connection {} ghost table full ({} slots), deferring object {:?}",
            conn_key,
            table.capacity(),
            id
        );
    }
}
