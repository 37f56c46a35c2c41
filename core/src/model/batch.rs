use std::{fmt, io};

use indexmap::IndexMap;

use crate::{
    counts::{self, AlleleCounts, Downsampler, Record},
    seq::Base,
};

use super::{Error, Parameters, ProbabilityMatrix};

/// A site that could not be mapped to model input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Skipped {
    /// More than two bases are observed across populations.
    Multiallelic {
        /// Chromosome of the site.
        chrom: String,
        /// Position of the site.
        position: usize,
    },
    /// A population has fewer alleles than the smallest supported sample size.
    UnsupportedSampleSize {
        /// Chromosome of the site.
        chrom: String,
        /// Position of the site.
        position: usize,
        /// Name of the population.
        population: String,
        /// Number of alleles observed in the population.
        observed: usize,
    },
}

impl Skipped {
    const N: usize = 2;

    const REASONS: [&'static str; Self::N] = ["more than two alleles", "unsupported sample size"];

    fn index(&self) -> usize {
        match self {
            Skipped::Multiallelic { .. } => 0,
            Skipped::UnsupportedSampleSize { .. } => 1,
        }
    }

    /// Returns a short description of the reason.
    pub fn reason(&self) -> &'static str {
        Self::REASONS[self.index()]
    }

    fn site(&self) -> (&str, usize) {
        match self {
            Skipped::Multiallelic { chrom, position }
            | Skipped::UnsupportedSampleSize {
                chrom, position, ..
            } => (chrom.as_str(), *position),
        }
    }
}

/// The model input of one population at a site.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sample {
    /// Name of the population.
    pub population: String,
    /// Number of derived alleles after downsampling.
    pub derived: usize,
    /// Sample size after downsampling.
    pub sample_size: usize,
    /// Index of the probability matrix.
    pub matrix: usize,
}

/// The model input of a site.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Site {
    /// Chromosome of the site.
    pub chrom: String,
    /// Position of the site.
    pub position: usize,
    /// Most frequent allele across populations.
    pub ancestral: Base,
    /// Second most frequent allele across populations.
    pub derived: Base,
    /// Model input of each population.
    pub samples: Vec<Sample>,
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SITE {} {} {} {}",
            self.chrom, self.position, self.ancestral, self.derived
        )?;

        for sample in self.samples.iter() {
            write!(
                f,
                " {}:{}/{}:{}",
                sample.population, sample.derived, sample.sample_size, sample.matrix
            )?;
        }

        Ok(())
    }
}

/// A builder of a [`Batch`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Builder {
    sample_sizes: Vec<usize>,
    parameters: Parameters,
    seed: Option<u64>,
}

impl Builder {
    /// Builds a batch over the records of a Counts reader.
    ///
    /// # Errors
    ///
    /// If no positive sample size is set, or if the parameters are invalid.
    pub fn build<R>(self, reader: counts::Reader<R>) -> Result<Batch<R>, Error>
    where
        R: io::BufRead,
    {
        let mut sample_sizes = self.sample_sizes;
        sample_sizes.sort_unstable();
        sample_sizes.dedup();

        if sample_sizes.first().map_or(true, |&size| size == 0) {
            return Err(Error::InvalidParameter(String::from(
                "supported sample sizes must be positive",
            )));
        }

        self.parameters.validate()?;

        let downsampler = match self.seed {
            Some(seed) => Downsampler::from_seed(seed),
            None => Downsampler::from_entropy(),
        };

        Ok(Batch {
            reader,
            sample_sizes,
            parameters: self.parameters,
            downsampler,
            matrices: IndexMap::new(),
            skipped: Vec::new(),
            counts: [0; Skipped::N],
            sites: 0,
        })
    }

    /// Sets the sample sizes for which probability matrices may be built.
    pub fn set_sample_sizes(mut self, sample_sizes: Vec<usize>) -> Self {
        self.sample_sizes = sample_sizes;
        self
    }

    /// Sets the mutation and selection parameters.
    pub fn set_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Sets the seed used for downsampling.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A driver mapping the sites of a Counts file to model input.
///
/// Each population is downsampled to the largest supported sample size not above its number of
/// alleles. Probability matrices are built on first use for each allele pair and sample size.
pub struct Batch<R> {
    reader: counts::Reader<R>,
    sample_sizes: Vec<usize>,
    parameters: Parameters,
    downsampler: Downsampler,
    matrices: IndexMap<(Base, Base, usize), ProbabilityMatrix>,
    skipped: Vec<Skipped>,
    counts: [usize; Skipped::N],
    sites: usize,
}

impl<R> Batch<R>
where
    R: io::BufRead,
{
    /// Returns the next site of model input, or `None` when the input is exhausted.
    ///
    /// Sites that cannot be mapped are recorded in [`Batch::skipped`].
    pub fn next_site(&mut self) -> Result<Option<Site>, Error> {
        while let Some(record) = self.reader.read_record()? {
            self.sites += 1;

            match self.map(&record)? {
                Ok(site) => return Ok(Some(site)),
                Err(skipped) => self.skip(skipped),
            }
        }

        Ok(None)
    }

    /// Writes all remaining sites, each preceded by the matrices it uses for the first time.
    ///
    /// Returns the skipped sites.
    pub fn run<W>(mut self, writer: &mut W) -> Result<Vec<Skipped>, Error>
    where
        W: io::Write,
    {
        let mut written = 0;

        while let Some(site) = self.next_site()? {
            for (id, matrix) in self.matrices.values().enumerate().skip(written) {
                writeln!(
                    writer,
                    "MATRIX {id} {} {} {}",
                    matrix.ancestral(),
                    matrix.derived(),
                    matrix.sample_size()
                )?;
                writeln!(writer, "{matrix}")?;
            }
            written = self.matrices.len();

            writeln!(writer, "{site}")?;
        }

        self.summarize();

        Ok(self.skipped)
    }

    /// Returns the probability matrices built so far, in order of index.
    pub fn matrices(&self) -> impl Iterator<Item = &ProbabilityMatrix> {
        self.matrices.values()
    }

    /// Returns the sites skipped so far.
    pub fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }

    /// Logs the number of sites read and skipped.
    pub fn summarize(&self) {
        for (count, reason) in self.counts.iter().zip(Skipped::REASONS) {
            if *count > 0 {
                log::warn!("Skipped {count} sites due to {reason}.");
            }
        }

        log::info!(
            "Read {} sites, built {} probability matrices.",
            self.sites,
            self.matrices.len()
        );
    }

    fn map(&mut self, record: &Record) -> Result<Result<Site, Skipped>, Error> {
        let header = self.reader.header();

        let mut sample_sizes = Vec::with_capacity(record.counts().len());
        for (population, counts) in header.names().zip(record.counts()) {
            let observed = counts.total();

            match self.sample_sizes.iter().rev().find(|&&size| size <= observed) {
                Some(&size) => sample_sizes.push(size),
                None => {
                    return Ok(Err(Skipped::UnsupportedSampleSize {
                        chrom: record.chrom().to_string(),
                        position: record.position(),
                        population: population.to_string(),
                        observed,
                    }))
                }
            }
        }

        let Some((ancestral, derived)) = allele_pair(&record.total()) else {
            return Ok(Err(Skipped::Multiallelic {
                chrom: record.chrom().to_string(),
                position: record.position(),
            }));
        };

        let names: Vec<String> = header.names().map(String::from).collect();
        let mut samples = Vec::with_capacity(names.len());
        for ((population, counts), sample_size) in
            names.into_iter().zip(record.counts()).zip(sample_sizes)
        {
            let downsampled = self
                .downsampler
                .downsample(counts, sample_size)
                .unwrap_or(*counts);

            samples.push(Sample {
                population,
                derived: downsampled.get(derived),
                sample_size,
                matrix: self.matrix(ancestral, derived, sample_size)?,
            });
        }

        Ok(Ok(Site {
            chrom: record.chrom().to_string(),
            position: record.position(),
            ancestral,
            derived,
            samples,
        }))
    }

    fn matrix(
        &mut self,
        ancestral: Base,
        derived: Base,
        sample_size: usize,
    ) -> Result<usize, Error> {
        let key = (ancestral, derived, sample_size);

        if let Some(index) = self.matrices.get_index_of(&key) {
            return Ok(index);
        }

        let matrix = ProbabilityMatrix::new(ancestral, derived, sample_size, &self.parameters)?;
        log::debug!(
            target: "model",
            "Built probability matrix {} for {ancestral}>{derived} with sample size {sample_size}",
            self.matrices.len()
        );

        Ok(self.matrices.insert_full(key, matrix).0)
    }

    fn skip(&mut self, skipped: Skipped) {
        let count = &mut self.counts[skipped.index()];

        if *count == 0 {
            let (chrom, position) = skipped.site();
            let reason = skipped.reason();

            log::warn!(
                "Skipping site at position '{chrom}:{position}' due to {reason}. \
                This warning will be shown only once, with a summary at the end."
            );
        }

        *count += 1;
        self.skipped.push(skipped);
    }
}

/// Returns the two most frequent bases, with ties broken in `A`, `C`, `G`, `T` order, or `None` if
/// more than two bases are observed.
fn allele_pair(total: &AlleleCounts) -> Option<(Base, Base)> {
    if total.distinct(0) > 2 {
        return None;
    }

    let mut bases = Base::VARIANTS;
    bases.sort_by(|a, b| total.get(*b).cmp(&total.get(*a)).then(a.cmp(b)));

    Some((bases[0], bases[1]))
}
