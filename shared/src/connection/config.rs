/// Per-connection replication settings.
#[derive(Clone, Debug)]
pub struct GhostConfig {
    /// Ghost table capacity: the most objects one connection can have
    /// replicated at once. Clamped to the wire limit of 1024.
    pub max_ghost_count: u16,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            max_ghost_count: 512,
        }
    }
}
