use std::{
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Error};

use clap::{Args, ValueEnum};

use counts_core::{
    counts::{self, PopulationMap, Populations},
    fasta::filter::FilterConfig,
    Input, Output,
};

/// Downsampling options shared by the conversion commands.
#[derive(Args, Debug)]
pub struct Sampling {
    /// Number of alleles to downsample each population to.
    ///
    /// By default, raw counts are written. If set, every population is downsampled at every site
    /// by drawing alleles without replacement.
    #[arg(short = 'n', long, value_name = "INT")]
    pub sample_size: Option<usize>,

    /// Seed for downsampling and for picking individuals.
    ///
    /// By default, a random seed is used, which is logged at debug level.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Handling of populations with fewer alleles than the sample size.
    #[arg(long, default_value = "missing", value_name = "POLICY")]
    pub insufficient: Insufficient,

    /// Handling of populations without alleles when downsampling.
    #[arg(long, default_value = "missing", value_name = "POLICY")]
    pub zero_coverage: ZeroCoverage,

    /// Skip sites with more than this number of alleles.
    #[arg(long, value_name = "INT")]
    pub max_alleles: Option<usize>,

    /// Count a base as an allele only if it occurs more than this number of times at a site.
    #[arg(long, default_value_t = 0, value_name = "INT", requires = "max_alleles")]
    pub noise: usize,
}

impl Sampling {
    pub fn apply(&self, mut builder: counts::Builder) -> counts::Builder {
        if let Some(sample_size) = self.sample_size {
            builder = builder.set_sample_size(sample_size);
        }
        if let Some(seed) = self.seed {
            builder = builder.set_seed(seed);
        }
        if let Some(max_alleles) = self.max_alleles {
            builder = builder.set_max_alleles(max_alleles).set_noise(self.noise);
        }

        builder
            .set_insufficient(self.insufficient.into())
            .set_zero_coverage(self.zero_coverage.into())
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Insufficient {
    /// Skip the site.
    Skip,
    /// Write the population with all counts zero.
    Missing,
}

impl From<Insufficient> for counts::Insufficient {
    fn from(value: Insufficient) -> Self {
        match value {
            Insufficient::Skip => Self::SkipSite,
            Insufficient::Missing => Self::MarkMissing,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum ZeroCoverage {
    /// Write the population with all counts zero.
    Missing,
    /// Write the reference base with the full sample size.
    Reference,
}

impl From<ZeroCoverage> for counts::ZeroCoverage {
    fn from(value: ZeroCoverage) -> Self {
        match value {
            ZeroCoverage::Missing => Self::Missing,
            ZeroCoverage::Reference => Self::ForceReference,
        }
    }
}

/// Alignment filter options.
#[derive(Args, Debug, Default)]
pub struct Filters {
    /// Reject alignments with an internal gap longer than this.
    #[arg(long, value_name = "INT")]
    pub max_gap_length: Option<usize>,

    /// Reject alignments with an internal gap of a length not divisible by three.
    #[arg(long)]
    pub frame_shifting_gap: bool,

    /// Reject alignments where the first sequence does not start with ATG.
    #[arg(long)]
    pub start_codon: bool,

    /// Reject alignments with a premature stop codon in any sequence.
    #[arg(long)]
    pub stop_codon: bool,

    /// Reject alignments where the p-distance between any two sequences exceeds this.
    #[arg(long, value_name = "FLOAT")]
    pub max_divergence: Option<f64>,

    /// Reject alignments with fewer codons without gaps than this.
    #[arg(long, value_name = "INT")]
    pub min_codons: Option<usize>,
}

impl From<&Filters> for FilterConfig {
    fn from(filters: &Filters) -> Self {
        let mut config = FilterConfig::default()
            .set_frame_shifting_gap(filters.frame_shifting_gap)
            .set_start_codon(filters.start_codon)
            .set_stop_codon(filters.stop_codon);

        if let Some(max_length) = filters.max_gap_length {
            config = config.set_max_gap_length(max_length);
        }
        if let Some(max) = filters.max_divergence {
            config = config.set_max_divergence(max);
        }
        if let Some(min) = filters.min_codons {
            config = config.set_min_codons(min);
        }

        config
    }
}

pub fn open_input(path: Option<PathBuf>) -> Result<Box<dyn io::BufRead>, Error> {
    let input = Input::new(path)?;

    input.open().with_context(|| match input.as_path() {
        Some(path) => format!("failed to open '{}'", path.display()),
        None => String::from("failed to read stdin"),
    })
}

pub fn open_path(path: &Path) -> Result<Box<dyn io::BufRead>, Error> {
    Input::new_unchecked(Some(path.to_path_buf()))
        .open()
        .with_context(|| format!("failed to open '{}'", path.display()))
}

pub fn create_output(path: Option<&Path>) -> Result<Output, Error> {
    Output::create(path).with_context(|| match path {
        Some(path) => format!("failed to create '{}'", path.display()),
        None => String::from("failed to write stdout"),
    })
}

/// Population assignment options shared by the conversion commands.
#[derive(Args, Debug)]
pub struct Grouping {
    /// Character separating population and individual in sequence or sample names.
    ///
    /// Individuals belong to the population named by the part of their name before the last
    /// occurrence of this character, or to a population of their full name if it does not occur.
    #[arg(short = 's', long, default_value_t = '-', value_name = "CHAR")]
    pub split_char: char,

    /// Population map file.
    ///
    /// Each line should contain a sample name and a population name, separated by a tab.
    /// Samples not in the map are ignored.
    #[arg(short = 'p', long, value_name = "FILE")]
    pub populations: Option<PathBuf>,
}

impl Grouping {
    pub fn populations(&self) -> Result<Populations, Error> {
        match &self.populations {
            Some(path) => PopulationMap::from_path(path)
                .map(Populations::Map)
                .with_context(|| format!("failed to read population map '{}'", path.display())),
            None => Ok(Populations::Split(self.split_char)),
        }
    }
}

pub fn write_counts<R>(engine: counts::Engine<R>, path: Option<&Path>) -> Result<(), Error>
where
    R: io::BufRead,
{
    let mut writer = counts::Writer::new(create_output(path)?, engine.header().clone());

    engine.run(&mut writer)?;
    writer.finish()?.finish()?;

    Ok(())
}
