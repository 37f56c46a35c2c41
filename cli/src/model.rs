use std::path::PathBuf;

use anyhow::{anyhow, Error};

use clap::Parser;

use counts_core::{
    counts,
    model::{self, Parameters},
};

use crate::args::{create_output, open_input};

/// Create model input from a counts file.
///
/// Every site is mapped to an ancestral and derived allele, and every population is downsampled
/// to the largest supported sample size. Probability matrices are written before the first site
/// that uses them.
#[derive(Debug, Parser)]
pub struct ModelInput {
    /// Input counts file.
    ///
    /// If no file is provided, stdin will be used.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file.
    ///
    /// If no path is given, model input is written to stdout.
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Supported sample sizes, separated by commas.
    #[arg(
        short = 'n',
        long,
        required = true,
        value_delimiter = ',',
        value_name = "INT,..."
    )]
    sample_sizes: Vec<usize>,

    /// Population-scaled mutation rate.
    #[arg(long, default_value_t = 0.01, value_name = "FLOAT")]
    theta: f64,

    /// Relative mutation rates towards A, C, G and T, separated by commas.
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = [0.25, 0.25, 0.25, 0.25],
        value_name = "FLOAT,..."
    )]
    mutation: Vec<f64>,

    /// Selection coefficient favouring C and G.
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true)]
    selection: Option<f64>,

    /// Seed for downsampling.
    #[arg(long, value_name = "INT")]
    seed: Option<u64>,
}

impl ModelInput {
    fn parameters(&self) -> Result<Parameters, Error> {
        let mutation: [f64; 4] = self.mutation.as_slice().try_into().map_err(|_| {
            anyhow!(
                "expected four mutation rates, found {}",
                self.mutation.len()
            )
        })?;

        let parameters = Parameters::new(mutation, self.theta);

        Ok(match self.selection {
            Some(selection) => parameters.with_selection(selection),
            None => parameters,
        })
    }

    pub fn run(self) -> Result<(), Error> {
        let mut builder = model::Builder::default()
            .set_sample_sizes(self.sample_sizes.clone())
            .set_parameters(self.parameters()?);
        if let Some(seed) = self.seed {
            builder = builder.set_seed(seed);
        }

        let batch = builder.build(counts::Reader::new(open_input(self.input)?)?)?;

        let mut output = create_output(self.output.as_deref())?;
        let skipped = batch.run(&mut output)?;
        output.finish()?;

        if !skipped.is_empty() {
            log::info!("Skipped {} sites in total.", skipped.len());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::tests::parse_subcmd;

    #[test]
    fn test_parameters() -> Result<(), Error> {
        let args = parse_subcmd::<ModelInput>(
            "counts model-input -n 4,2 --theta 0.1 --mutation 0.1,0.2,0.3,0.4 --selection -0.5",
        );

        assert_eq!(args.sample_sizes, [4, 2]);
        assert_eq!(
            args.parameters()?,
            Parameters::new([0.1, 0.2, 0.3, 0.4], 0.1).with_selection(-0.5)
        );

        Ok(())
    }

    #[test]
    fn test_wrong_number_of_mutation_rates() {
        let args = parse_subcmd::<ModelInput>("counts model-input -n 2 --mutation 0.5,0.5");

        assert!(args.parameters().is_err());
    }
}
