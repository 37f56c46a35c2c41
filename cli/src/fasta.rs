use std::path::PathBuf;

use anyhow::Error;

use clap::Parser;

use counts_core::{
    counts::{self, Downsampler, Extraction},
    fasta,
};

use crate::args::{create_output, open_input};

/// Extract one sequence per population from a counts file.
#[derive(Debug, Parser)]
pub struct CountsToFasta {
    /// Input counts file.
    ///
    /// If no file is provided, stdin will be used.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output FASTA file.
    ///
    /// If no path is given, sequences are written to stdout.
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Use the most frequent base of each population.
    ///
    /// By default, a random base is drawn at each site with probability proportional to its
    /// count. With this flag, the most frequent base is used, with ties broken in A, C, G, T
    /// order.
    #[arg(long)]
    consensus: bool,

    /// Seed for drawing random bases.
    #[arg(long, value_name = "INT", conflicts_with = "consensus")]
    seed: Option<u64>,

    /// Number of bases per line; zero writes each sequence on a single line.
    #[arg(long, default_value_t = 60, value_name = "INT")]
    line_width: usize,
}

impl CountsToFasta {
    pub fn run(self) -> Result<(), Error> {
        let mut reader = counts::Reader::new(open_input(self.input)?)?;

        let extraction = match (self.consensus, self.seed) {
            (true, _) => Extraction::Consensus,
            (false, Some(seed)) => Extraction::Sample(Downsampler::from_seed(seed)),
            (false, None) => Extraction::Sample(Downsampler::from_entropy()),
        };

        let output = create_output(self.output.as_deref())?;
        let mut writer = fasta::Writer::new(output).set_line_width(self.line_width);

        let sites = counts::to_fasta(&mut reader, extraction, &mut writer)?;
        log::info!("Extracted {sites} sites.");

        writer.into_inner().finish()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::error::ErrorKind as ClapErrorKind;

    use crate::tests::try_parse_subcmd;

    #[test]
    fn test_consensus_and_seed_conflict() {
        let result = try_parse_subcmd::<CountsToFasta>("counts counts-to-fasta --consensus --seed 1");

        assert_eq!(result.unwrap_err().kind(), ClapErrorKind::ArgumentConflict);
    }
}
