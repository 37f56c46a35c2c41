use std::path::PathBuf;

use anyhow::Error;

use clap::Parser;

use counts_core::fasta::{
    self,
    alignment,
    filter::{FilterConfig, Summary},
};

use crate::args::{create_output, open_input, Filters};

/// Filter alignment blocks of coding sequences.
#[derive(Debug, Parser)]
pub struct FilterMsa {
    /// Input alignment in FASTA format.
    ///
    /// Alignment blocks are separated by blank lines. If no file is provided, stdin will be used.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output FASTA file of the accepted blocks.
    ///
    /// If no path is given, blocks are written to stdout.
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(flatten)]
    filters: Filters,
}

impl FilterMsa {
    pub fn run(self) -> Result<(), Error> {
        let config = FilterConfig::from(&self.filters);
        if config.is_empty() {
            log::warn!("No filters enabled, all alignments will be accepted.");
        }

        let reader = alignment::Reader::new(open_input(self.input)?);
        let mut writer = fasta::Writer::new(create_output(self.output.as_deref())?);
        let mut summary = Summary::default();

        for alignment in reader {
            let alignment = alignment?;

            if config.apply(&alignment, &mut summary) {
                if summary.accepted() > 1 {
                    writer.write_block_separator()?;
                }

                for row in alignment.rows() {
                    writer.write_sequence(row)?;
                }
            }
        }

        summary.summarize();
        writer.into_inner().finish()?;

        Ok(())
    }
}
