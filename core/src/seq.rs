//! Nucleotides, genomic regions and sequences.
//!
//! Everything here is a pure value type: no I/O happens in this module, and the only failures
//! are validation errors, see [`Error`].

use std::fmt;

mod base;
pub use base::Base;

pub mod code;

pub mod iupac;
pub use iupac::reverse_complement;

mod region;
pub use region::{Region, Strand};

mod sequence;
pub use sequence::Sequence;

/// An error associated with validating nucleotides, regions or sequences.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// Symbol is not a legal nucleotide.
    InvalidBase(u8),
    /// Region is empty, inverted, or falls outside its parent sequence.
    InvalidRegion {
        /// Start of the offending region.
        start: usize,
        /// End of the offending region.
        end: usize,
        /// Reason the region was rejected.
        reason: &'static str,
    },
}

impl Error {
    pub(crate) fn invalid_region(start: usize, end: usize, reason: &'static str) -> Self {
        Self::InvalidRegion { start, end, reason }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidBase(symbol) => {
                write!(f, "invalid base '{}'", char::from(*symbol).escape_default())
            }
            Error::InvalidRegion { start, end, reason } => {
                write!(f, "invalid region {start}-{end}: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}
