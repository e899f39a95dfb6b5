pub mod ghost_record;
pub mod ghost_table;
pub mod ghost_update_manager;
pub mod global_ghost_manager;
pub mod host_ghost_writer;

pub use ghost_record::{GhostRecord, GhostState};
pub use ghost_table::{GhostTable, MAX_GHOST_CAPACITY, MIN_INDEX_BIT_WIDTH};
pub use ghost_update_manager::{AckNode, GhostUpdateManager, SentGhost};
pub use global_ghost_manager::{GlobalGhostManager, ObjectId, ScopeMode};
pub use host_ghost_writer::HostGhostWriter;
