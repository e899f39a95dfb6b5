use thiserror::Error;

/// Errors that can occur while reading bits back out of a buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// Ran off the end of the buffer mid-value
    #[error("bit buffer exhausted while reading")]
    BufferExhausted,
    /// A decoded value violated its own encoding rules
    /// (e.g. a variable-length integer longer than 64 bits)
    #[error("decoded value out of range")]
    ValueOutOfRange,
}
