use std::any::Any;

use ghostwire_serde::{BitReader, BitWrite, SerdeErr};

use crate::ghost::diff_mask::DiffMask;

/// The contract an application object fulfills to be mirrored over a
/// connection.
///
/// The mask-gated encoder and the decoder are the object's own
/// business: the replication core never interprets the payload, it only
/// budgets, schedules, and retries it. The one requirement is that
/// `read_update` can parse anything `write_update` emits, for any mask
/// (a freshly created proxy is fed the output of an all-bits write).
pub trait Replicable: Send + Sync {
    /// Write the aspects selected by `mask` into `writer`, returning
    /// the sub-mask of aspects that were NOT written (and so remain
    /// owed to this connection). Returning an empty mask means the
    /// whole requested delta went out.
    fn write_update(&self, mask: &DiffMask, writer: &mut dyn BitWrite) -> DiffMask;

    /// Apply a payload previously produced by `write_update`.
    fn read_update(&mut self, reader: &mut BitReader) -> Result<(), SerdeErr>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
