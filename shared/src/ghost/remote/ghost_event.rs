use crate::types::GhostIndex;

/// What the remote side learned from incoming ghost sections since the
/// last drain. Indices stay valid until the ghost despawns; the object
/// itself is fetched through `RemoteGhostManager::ghost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostEvent {
    Spawned(GhostIndex),
    Updated(GhostIndex),
    Despawned(GhostIndex),
}
