//! Reading per-individual variant calls from VCF.
//!
//! Records are parsed by `noodles-vcf`, and only the fixed columns and the `GT` genotype field are
//! interpreted. Records are read linearly; a [`Reader`] checks that its records are sorted, and a
//! [`Scanner`] advances a number of readers in lock-step so that calls for the same site are
//! returned together.

use std::{fmt, io};

mod header;
pub use header::Header;

mod call;
pub use call::GenotypeCall;

mod reader;
pub use reader::Reader;

pub mod scanner;
pub use scanner::{Scanner, Site};

/// An error associated with reading VCF.
#[derive(Debug)]
pub enum Error {
    /// I/O error.
    Io(io::Error),
    /// Input does not follow the VCF format, or is not sorted.
    MalformedFormat {
        /// One-based line number of the offending line.
        line: usize,
        /// Reason the line was rejected.
        reason: String,
    },
    /// A reader is too far ahead of the others.
    Desync {
        /// Chromosome of the current site.
        chrom: String,
        /// Position of the current site.
        consensus: usize,
        /// Index of the reader that is ahead.
        reader: usize,
        /// Position of the next call of the reader that is ahead.
        position: usize,
    },
    /// Readers visit chromosomes in different orders.
    ChromosomeOrder {
        /// Chromosome that was returned to.
        chrom: String,
        /// Position at which the chromosome was returned to.
        position: usize,
    },
    /// Calls on a chromosome follow calls on a chromosome that comes later in the reference.
    ReferenceOrder {
        /// Chromosome of the call.
        chrom: String,
        /// Position of the call.
        position: usize,
    },
    /// The reference base of a call does not match the reference sequence.
    RefMismatch {
        /// Chromosome of the call.
        chrom: String,
        /// Position of the call.
        position: usize,
        /// Base in the reference sequence.
        expected: u8,
        /// Reference base of the call.
        found: u8,
    },
}

impl Error {
    pub(crate) fn malformed<S>(line: usize, reason: S) -> Self
    where
        S: Into<String>,
    {
        Self::MalformedFormat {
            line,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "{e}"),
            Error::MalformedFormat { line, reason } => {
                write!(f, "malformed VCF at line {line}: {reason}")
            }
            Error::Desync {
                chrom,
                consensus,
                reader,
                position,
            } => write!(
                f,
                "VCF readers out of sync at {chrom}:{consensus}: \
                reader {reader} is ahead at position {position}"
            ),
            Error::ChromosomeOrder { chrom, position } => write!(
                f,
                "VCF readers disagree on chromosome order: \
                chromosome '{chrom}' revisited at position {position}"
            ),
            Error::ReferenceOrder { chrom, position } => write!(
                f,
                "VCF and reference disagree on chromosome order: \
                call at {chrom}:{position} follows calls on a later reference chromosome"
            ),
            Error::RefMismatch {
                chrom,
                position,
                expected,
                found,
            } => write!(
                f,
                "reference base mismatch at {chrom}:{position}: \
                reference sequence has '{}', VCF has '{}'",
                char::from(*expected),
                char::from(*found),
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
