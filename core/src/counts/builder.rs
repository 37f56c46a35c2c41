use std::io;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    fasta::{alignment, filter::FilterConfig},
    vcf::Scanner,
};

use super::{
    engine::{AlignmentSource, Source, VariantSource},
    population::Assignment,
    Downsampler, Engine, Error, Populations, Reference,
};

/// What to do with a population that has some, but fewer alleles than the sample size.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Insufficient {
    /// Skip the site.
    SkipSite,
    /// Emit the population with all counts zero.
    #[default]
    MarkMissing,
}

/// What to do with a population that has no alleles at all.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ZeroCoverage {
    /// Emit the population with all counts zero.
    #[default]
    Missing,
    /// Emit the reference base with the full sample size.
    ForceReference,
}

/// What to do with individuals without a variant call at a reference coordinate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AbsentPolicy {
    /// Individuals without a call are homozygous for the reference base.
    #[default]
    Reference,
    /// Individuals without a call contribute nothing, and sites without any call are skipped.
    Skip,
}

/// What to do when the reference base of a variant call differs from the reference sequence.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RefCheck {
    /// Fail with an error.
    #[default]
    Fail,
    /// Warn once, and skip the site.
    WarnAndSkip,
    /// Do not compare, and count the calls as given.
    Ignore,
}

/// A builder of an [`Engine`].
///
/// By default, counts are not downsampled, no site filters are applied, and sites without a
/// chromosome name are placed on chromosome `NA`.
#[derive(Clone, Debug, PartialEq)]
pub struct Builder {
    pub(super) sample_size: Option<usize>,
    pub(super) insufficient: Insufficient,
    pub(super) zero_coverage: ZeroCoverage,
    pub(super) absent: AbsentPolicy,
    pub(super) ref_check: RefCheck,
    pub(super) max_alleles: Option<usize>,
    pub(super) noise: usize,
    pub(super) only_synonymous: bool,
    pub(super) one_individual: bool,
    pub(super) double_fixed_sites: bool,
    pub(super) chrom: String,
    pub(super) seed: Option<u64>,
    pub(super) filters: FilterConfig,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            sample_size: None,
            insufficient: Insufficient::default(),
            zero_coverage: ZeroCoverage::default(),
            absent: AbsentPolicy::default(),
            ref_check: RefCheck::default(),
            max_alleles: None,
            noise: 0,
            only_synonymous: false,
            one_individual: false,
            double_fixed_sites: false,
            chrom: String::from("NA"),
            seed: None,
            filters: FilterConfig::default(),
        }
    }
}

impl Builder {
    /// Builds an engine counting the rows of alignments.
    ///
    /// Every row is a haploid individual, and populations are assigned from the rows of the first
    /// alignment. Rows of later alignments must belong to the same populations.
    pub fn build_from_alignments<R>(
        self,
        mut reader: alignment::Reader<R>,
        populations: Populations,
    ) -> Result<Engine<R>, Error>
    where
        R: io::BufRead,
    {
        if self.only_synonymous {
            return Err(Error::Config(String::from(
                "synonymous sites can only be determined with a reference sequence",
            )));
        }
        if self.one_individual {
            return Err(Error::Config(String::from(
                "picking one individual per population requires variant calls",
            )));
        }

        let first = reader
            .read_alignment()?
            .ok_or_else(|| Error::Config(String::from("input contains no alignments")))?;

        let names: Vec<&str> = first.rows().iter().map(|row| row.name()).collect();
        let assignment = Assignment::new(&populations, &[&names[..]])?;

        let ploidy = if self.double_fixed_sites { 2 } else { 1 };
        let source = Source::Alignments(AlignmentSource::new(
            reader,
            first,
            populations,
            &self,
        ));

        Ok(self.build(source, assignment, ploidy, Vec::new()))
    }

    /// Builds an engine counting variant calls against a reference sequence.
    ///
    /// Each reference coordinate is one site. Populations are assigned from the samples of the
    /// VCF inputs of the scanner, with inputs in scanner order. If only one individual per
    /// population is kept, the picked individuals are listed in the header comments.
    pub fn build_from_variants<R, T>(
        self,
        reference: T,
        scanner: Scanner<R>,
        populations: Populations,
    ) -> Result<Engine<R>, Error>
    where
        R: io::BufRead,
        T: Into<Reference<R>>,
    {
        let samples: Vec<&[String]> = scanner
            .readers()
            .iter()
            .map(|reader| reader.header().samples())
            .collect();
        let mut assignment = Assignment::new(&populations, &samples)?;

        let mut comments = Vec::new();
        if self.one_individual {
            let seed = self.seed.unwrap_or_else(|| rand::thread_rng().gen());
            let picks = assignment.pick_one(&mut ChaCha8Rng::seed_from_u64(seed));

            let picked: Vec<&str> = picks
                .iter()
                .map(|&(input, individual)| samples[input][individual].as_str())
                .collect();
            log::debug!(
                target: "populations",
                "Picked individuals {} with seed {seed}",
                picked.join(", ")
            );

            comments.push(String::from("One individual per population only."));
            comments.push(format!("Picked individuals: {}", picked.join(" ")));
        }

        let ploidy = scanner.readers().first().map_or(2, |reader| reader.ploidy());
        let source = Source::Variants(VariantSource::new(
            reference.into(),
            scanner,
            ploidy,
            &self,
        ));

        Ok(self.build(source, assignment, ploidy, comments))
    }

    fn build<R>(
        self,
        source: Source<R>,
        assignment: Assignment,
        ploidy: usize,
        comments: Vec<String>,
    ) -> Engine<R>
    where
        R: io::BufRead,
    {
        let downsampler = self.sample_size.map(|_| match self.seed {
            Some(seed) => Downsampler::from_seed(seed),
            None => Downsampler::from_entropy(),
        });

        Engine::new(source, assignment, self, ploidy, downsampler, comments)
    }

    /// Sets the number of alleles to downsample each population to at each site.
    pub fn set_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = Some(sample_size);
        self
    }

    /// Sets the policy for populations with fewer alleles than the sample size.
    pub fn set_insufficient(mut self, insufficient: Insufficient) -> Self {
        self.insufficient = insufficient;
        self
    }

    /// Sets the policy for populations without alleles.
    pub fn set_zero_coverage(mut self, zero_coverage: ZeroCoverage) -> Self {
        self.zero_coverage = zero_coverage;
        self
    }

    /// Sets the policy for individuals without a variant call.
    pub fn set_absent(mut self, absent: AbsentPolicy) -> Self {
        self.absent = absent;
        self
    }

    /// Sets the policy for variant calls disagreeing with the reference sequence.
    pub fn set_ref_check(mut self, ref_check: RefCheck) -> Self {
        self.ref_check = ref_check;
        self
    }

    /// Sets the largest number of bases above the noise threshold for a site to be kept.
    pub fn set_max_alleles(mut self, max_alleles: usize) -> Self {
        self.max_alleles = Some(max_alleles);
        self
    }

    /// Sets the count a base must exceed, summed over populations, to count as an allele.
    pub fn set_noise(mut self, noise: usize) -> Self {
        self.noise = noise;
        self
    }

    /// Sets whether to keep only four-fold degenerate sites of the reference.
    pub fn set_only_synonymous(mut self, only_synonymous: bool) -> Self {
        self.only_synonymous = only_synonymous;
        self
    }

    /// Sets whether to keep only one individual of each population, picked using the seed.
    pub fn set_one_individual(mut self, one_individual: bool) -> Self {
        self.one_individual = one_individual;
        self
    }

    /// Sets whether to count unambiguous alignment symbols twice.
    ///
    /// This is meant for alignments with heterozygous sites encoded as IUPAC ambiguity codes,
    /// where each row is a diploid individual.
    pub fn set_double_fixed_sites(mut self, double_fixed_sites: bool) -> Self {
        self.double_fixed_sites = double_fixed_sites;
        self
    }

    /// Sets the chromosome name of alignments without a region.
    pub fn set_chrom<S>(mut self, chrom: S) -> Self
    where
        S: Into<String>,
    {
        self.chrom = chrom.into();
        self
    }

    /// Sets the seed of the downsampler and of picking individuals.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the filters applied to alignments before counting.
    pub fn set_filters(mut self, filters: FilterConfig) -> Self {
        self.filters = filters;
        self
    }
}
