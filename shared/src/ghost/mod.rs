pub mod class_registry;
pub mod diff_mask;
pub mod error;
pub mod host;
pub mod remote;
pub mod replicable;
pub mod scope;

pub use class_registry::{ClassRegistry, ClassTag};
pub use diff_mask::DiffMask;
pub use error::GhostError;
pub use replicable::Replicable;
pub use scope::{GhostScopeMut, ScopeQuery};
