use std::fmt;

use crate::coords::Size;

/// Failure to allocate a back buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// Requested a buffer with a zero dimension.
    Empty { size: Size },
    /// Requested size exceeds what the surface provider can upload.
    TooLarge { size: Size, limit: u32 },
    /// The allocator refused the request.
    OutOfMemory { size: Size },
}

impl AllocError {
    pub fn size(&self) -> Size {
        match *self {
            AllocError::Empty { size }
            | AllocError::TooLarge { size, .. }
            | AllocError::OutOfMemory { size } => size,
        }
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::Empty { size } => write!(f, "cannot allocate empty {size} buffer"),
            AllocError::TooLarge { size, limit } => {
                write!(f, "{size} buffer exceeds maximum dimension {limit}")
            }
            AllocError::OutOfMemory { size } => write!(f, "out of memory allocating {size} buffer"),
        }
    }
}

impl std::error::Error for AllocError {}
