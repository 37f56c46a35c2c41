use std::path::PathBuf;

use anyhow::Error;

use clap::Parser;

use counts_core::{counts, fasta::alignment};

use crate::args::{open_input, write_counts, Filters, Grouping, Sampling};

/// Convert a multiple sequence alignment to counts format.
#[derive(Debug, Parser)]
pub struct MsaToCounts {
    /// Input alignment in FASTA format.
    ///
    /// Alignment blocks are separated by blank lines. If no file is provided, stdin will be used.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output counts file.
    ///
    /// If no path is given, counts are written to stdout. Paths ending in '.gz' are BGZF
    /// compressed.
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Chromosome name of alignments without a region in their headers.
    ///
    /// Positions of such alignments are counted consecutively from one.
    #[arg(long, default_value = "NA", value_name = "NAME")]
    chrom: String,

    /// Count unambiguous bases twice.
    ///
    /// Use this when every sequence is a diploid individual with heterozygous sites encoded as
    /// IUPAC ambiguity codes.
    #[arg(long)]
    double_fixed_sites: bool,

    #[command(flatten)]
    grouping: Grouping,

    #[command(flatten)]
    sampling: Sampling,

    #[command(flatten)]
    filters: Filters,
}

impl MsaToCounts {
    pub fn run(self) -> Result<(), Error> {
        let populations = self.grouping.populations()?;
        let reader = alignment::Reader::new(open_input(self.input)?);

        let engine = self
            .sampling
            .apply(counts::Builder::default())
            .set_chrom(self.chrom)
            .set_double_fixed_sites(self.double_fixed_sites)
            .set_filters((&self.filters).into())
            .build_from_alignments(reader, populations)?;

        write_counts(engine, self.output.as_deref())
    }
}
