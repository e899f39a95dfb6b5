//! Ghostwire is a library for replicating sets of game objects from a
//! host to many connected peers over unreliable packets: each
//! connection gets its own scoped view, updates are prioritized into a
//! fixed packet budget, and lost packets are repaired from delta masks
//! rather than retransmitted wholesale.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod connection;
pub mod ghost;

mod types;
mod wrapping_number;

pub use ghostwire_serde::{
    BitCounter, BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr,
    UnsignedInteger, UnsignedVariableInteger, MTU_SIZE_BITS, MTU_SIZE_BYTES,
};

pub use connection::{GhostConfig, GhostConnection};
pub use ghost::{
    class_registry::{ClassRegistry, ClassTag},
    diff_mask::DiffMask,
    error::GhostError,
    host::{
        GhostRecord, GhostState, GhostTable, GlobalGhostManager, HostGhostWriter, ObjectId,
        ScopeMode, MAX_GHOST_CAPACITY, MIN_INDEX_BIT_WIDTH,
    },
    remote::{GhostEvent, RemoteGhostManager, RemoteGhostReader},
    replicable::Replicable,
    scope::{GhostScopeMut, ScopeQuery},
};
pub use types::{ConnKey, GhostIndex, PacketIndex, Tick};
pub use wrapping_number::{sequence_greater_than, sequence_less_than};
