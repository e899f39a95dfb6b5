pub type PacketIndex = u16;
pub type Tick = u16;

/// Stable per-connection ghost slot, used as the wire identity of a
/// replicated object for the lifetime of its record.
pub type GhostIndex = u16;

/// Identifies one connection on the authoritative endpoint.
pub type ConnKey = u64;
