//! The Counts format, and its construction from alignments and variant calls.
//!
//! A Counts file holds, for each site, one vector of four allele counts over `A,C,G,T` per
//! population. Files are written by a [`Writer`] and read back by a [`Reader`]; an [`Engine`]
//! built by a [`Builder`] produces [`Record`]s from FASTA alignments or from a reference sequence
//! combined with VCF variant calls.

use std::{fmt, io};

use crate::{fasta, seq, vcf};

mod allele;
pub use allele::{AlleleCounts, ParseAlleleCountsError};

mod builder;
pub use builder::{AbsentPolicy, Builder, Insufficient, RefCheck, ZeroCoverage};

mod downsample;
pub use downsample::Downsampler;

mod engine;
pub use engine::{Engine, Reference, State};

mod extract;
pub use extract::{to_fasta, Extraction};

mod header;
pub use header::{Header, Population};

pub mod population;
pub use population::{PopulationId, PopulationMap, Populations};

mod reader;
pub use reader::Reader;

mod record;
pub use record::Record;

mod stats;
pub use stats::{Skip, Statistics};

mod writer;
pub use writer::Writer;

/// An error associated with producing, writing, or reading allele counts.
#[derive(Debug)]
pub enum Error {
    /// I/O error.
    Io(io::Error),
    /// Input does not follow the Counts format.
    MalformedFormat {
        /// One-based line number of the offending line.
        line: usize,
        /// Reason the line was rejected.
        reason: String,
    },
    /// A record was written out of order.
    OutOfOrderWrite {
        /// Chromosome of the record.
        chrom: String,
        /// Position of the record.
        position: usize,
        /// Previous position on the chromosome, if the chromosome was not revisited.
        previous: Option<usize>,
    },
    /// A record does not have one allele count vector per population.
    RecordShape {
        /// Number of populations in the header.
        expected: usize,
        /// Number of allele count vectors in the record.
        found: usize,
    },
    /// Inconsistent configuration or population assignment.
    Config(String),
    /// The engine failed earlier and cannot continue.
    Halted,
    /// Error reading FASTA.
    Fasta(fasta::Error),
    /// Error reading VCF.
    Vcf(vcf::Error),
    /// Invalid sequence data.
    Seq(seq::Error),
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
                write!(f, "malformed counts file at line {line}: {reason}")
            }
            Error::OutOfOrderWrite {
                chrom,
                position,
                previous: Some(previous),
            } => write!(
                f,
                "cannot write position {chrom}:{position} after position {previous}"
            ),
            Error::OutOfOrderWrite {
                chrom,
                position,
                previous: None,
            } => write!(
                f,
                "cannot write position {chrom}:{position}, chromosome '{chrom}' was already written"
            ),
            Error::RecordShape { expected, found } => write!(
                f,
                "record has {found} allele count vectors, expected one for each of {expected} populations"
            ),
            Error::Config(reason) => f.write_str(reason),
            Error::Halted => f.write_str("cannot continue after an earlier error"),
            Error::Fasta(e) => write!(f, "{e}"),
            Error::Vcf(e) => write!(f, "{e}"),
            Error::Seq(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Fasta(e) => Some(e),
            Error::Vcf(e) => Some(e),
            Error::Seq(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<fasta::Error> for Error {
    fn from(e: fasta::Error) -> Self {
        Self::Fasta(e)
    }
}

impl From<vcf::Error> for Error {
    fn from(e: vcf::Error) -> Self {
        Self::Vcf(e)
    }
}

impl From<seq::Error> for Error {
    fn from(e: seq::Error) -> Self {
        Self::Seq(e)
    }
}
