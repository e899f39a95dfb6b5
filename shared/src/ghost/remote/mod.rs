pub mod ghost_event;
pub mod remote_ghost_manager;
pub mod remote_ghost_reader;

pub use ghost_event::GhostEvent;
pub use remote_ghost_manager::RemoteGhostManager;
pub use remote_ghost_reader::RemoteGhostReader;
