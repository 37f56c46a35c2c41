#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Conversion between sequence alignments, variant calls, and allele counts.
//!
//! This serves as the core library implementation for the `counts` CLI, but can also be used as a
//! free-standing library for preparing input to polymorphism-aware phylogenetic models.
//!
//! # Overview
//!
//! Data flows through the crate in one direction:
//!
//! - [`fasta`] and [`vcf`] read alignments and per-individual variant calls as streams, holding
//!   no more than a single look-ahead record;
//! - [`counts`] synchronizes these streams site by site, aggregates the observed bases into
//!   per-population allele counts, downsamples them, and writes or reads the Counts format;
//! - [`model`] turns allele counts into binomial probability matrices for model fitting.
//!
//! # Example
//!
//! Converting a small alignment to allele counts, with individuals assigned to populations by
//! the prefix of their names:
//!
//! ```
//! use counts_core::{counts, fasta};
//!
//! let alignment = b">pop1-a\nACGT\n>pop1-b\nACTT\n>pop2-a\nAGGT\n";
//! let reader = fasta::alignment::Reader::new(&alignment[..]);
//!
//! let mut engine = counts::Builder::default()
//!     .build_from_alignments(reader, counts::Populations::Split('-'))?;
//!
//! let mut records = Vec::new();
//! while let Some(record) = engine.next_record()? {
//!     records.push(record.to_string());
//! }
//!
//! assert_eq!(engine.header().names().collect::<Vec<_>>(), ["pop1", "pop2"]);
//! assert_eq!(records[2], "NA\t3\t0,0,1,1\t0,0,1,0");
//! # Ok::<(), counts_core::counts::Error>(())
//! ```

#[cfg(test)]
#[macro_use]
pub(crate) mod approx;

pub mod counts;

pub mod fasta;

pub mod input;
pub use input::Input;

pub mod model;

pub mod output;
pub use output::Output;

mod position;

pub mod seq;
pub use seq::{Base, Region, Sequence, Strand};

pub mod utils;

pub mod vcf;
