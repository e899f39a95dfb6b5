use ghostwire_serde::SerdeErr;
use thiserror::Error;

use crate::types::GhostIndex;

/// Fatal protocol errors raised while decoding a ghost section.
///
/// Once one entry is misaligned nothing after it can be trusted, so
/// these are never recovered per-entry: the caller is expected to tear
/// the connection down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GhostError {
    #[error("unknown class tag {tag} in ghost create")]
    UnknownClassTag { tag: u16 },

    #[error("ghost index {index} out of range (capacity {capacity})")]
    GhostIndexOutOfRange { index: GhostIndex, capacity: u16 },

    #[error("destroy received for ghost index {index}, but no such ghost exists")]
    MissingGhost { index: GhostIndex },

    #[error("malformed ghost payload: {0}")]
    Serde(#[from] SerdeErr),
}
