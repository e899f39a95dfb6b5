use crate::ghost::{diff_mask::DiffMask, host::global_ghost_manager::ObjectId};

/// Lifecycle of one ghost on one connection.
///
/// `NotYetCreated → Creating → Steady ⇄ dirty → Destroying → freed`,
/// with at most one in-flight create or destroy per record at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostState {
    /// Allocated on scope-in; the create has not been written yet.
    NotYetCreated,
    /// A create carrying full state is in flight, unacknowledged.
    Creating,
    /// Creation acknowledged; residual tracks deltas since last ack.
    Steady,
    /// The ghost is being torn down; only destroy notices are sent.
    Destroying,
}

/// Per-connection, per-object replication state.
///
/// The stable wire identity of the record is the table slot it occupies
/// (see `GhostTable`); everything here is bookkeeping about what the
/// peer has and what it is still owed.
pub struct GhostRecord {
    pub(crate) object_id: ObjectId,
    pub(crate) state: GhostState,
    pub(crate) in_scope: bool,
    /// Always-visible objects skip the per-packet scope clearing.
    pub(crate) scope_exempt: bool,
    /// Set when the object left scope while its create was still in
    /// flight; the destroy is issued once the creation resolves.
    pub(crate) destroy_after_create: bool,
    pub(crate) residual: DiffMask,
    /// Packets since this record was last serialized; feeds priority.
    pub(crate) skip_count: u32,
    /// Transient, recomputed each packet before the priority sort.
    pub(crate) priority: f32,
}

impl GhostRecord {
    pub(crate) fn new(object_id: ObjectId, scope_exempt: bool) -> Self {
        Self {
            object_id,
            state: GhostState::NotYetCreated,
            in_scope: true,
            scope_exempt,
            destroy_after_create: false,
            residual: DiffMask::empty(),
            skip_count: 0,
            priority: 0.0,
        }
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    pub fn state(&self) -> GhostState {
        self.state
    }

    pub fn in_scope(&self) -> bool {
        self.in_scope
    }

    pub fn residual(&self) -> DiffMask {
        self.residual
    }

    pub fn skip_count(&self) -> u32 {
        self.skip_count
    }
}
