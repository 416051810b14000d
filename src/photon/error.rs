use std::fmt;

/// Decode errors for Photon frames, messages, and values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended before the declared data did
    TruncatedInput { requested: usize, available: usize },
    /// A type tag byte that no value shape is defined for
    UnknownTag { tag: u8 },
    /// A frame or command header that contradicts itself or the buffer
    MalformedHeader { reason: &'static str },
    /// A fragment set expired before all of its pieces arrived
    FragmentTimeout,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::TruncatedInput {
                requested,
                available,
            } => {
                write!(
                    f,
                    "truncated input: needed {} bytes, {} available",
                    requested, available
                )
            }
            DecodeError::UnknownTag { tag } => write!(f, "unknown type tag {}", tag),
            DecodeError::MalformedHeader { reason } => {
                write!(f, "malformed header: {}", reason)
            }
            DecodeError::FragmentTimeout => write!(f, "fragment set expired before completion"),
        }
    }
}

impl std::error::Error for DecodeError {}
