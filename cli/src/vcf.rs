use std::path::PathBuf;

use anyhow::{Context, Error};

use clap::{Parser, ValueEnum};

use counts_core::{
    counts::{self, Populations, Reference},
    fasta::{self, alignment},
    vcf::scanner,
};

use crate::args::{open_path, write_counts, Filters, Grouping, Sampling};

/// Convert VCF files and a reference sequence to counts format.
#[derive(Debug, Parser)]
pub struct VcfToCounts {
    /// Input VCF files, optionally gzip or BGZF compressed.
    ///
    /// The files are read in lock-step, and must be sorted in the same chromosome order as the
    /// reference. Calls on chromosomes missing from the reference are skipped with a warning.
    #[arg(required = true, value_name = "VCF")]
    inputs: Vec<PathBuf>,

    /// Reference sequence in FASTA format.
    ///
    /// Each sequence is a chromosome, or a region of one if a region is given in its header.
    #[arg(short = 'r', long, value_name = "FILE")]
    reference: PathBuf,

    /// Read the reference as alignment blocks, using the first sequence of each.
    #[arg(long)]
    alignment: bool,

    /// Output counts file.
    ///
    /// If no path is given, counts are written to stdout. Paths ending in '.gz' are BGZF
    /// compressed.
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Ploidy of all individuals.
    #[arg(long, default_value_t = 2, value_name = "INT")]
    ploidy: usize,

    /// Fail if a file lags more than this number of positions behind the others.
    #[arg(long, value_name = "INT")]
    max_skip: Option<usize>,

    /// Merge all individuals of each VCF file into one population.
    ///
    /// One population name must be given for each input file, in order, separated by commas.
    #[arg(long, value_delimiter = ',', value_name = "NAMES", conflicts_with = "populations")]
    merge: Option<Vec<String>>,

    /// Handling of individuals without a call at a reference position.
    #[arg(long, default_value = "reference", value_name = "POLICY")]
    absent: Absent,

    /// Handling of calls with a reference base different from the reference sequence.
    #[arg(long, default_value = "fail", value_name = "POLICY")]
    ref_mismatch: RefMismatch,

    /// Keep only third codon positions of four-fold degenerate codons in the reference.
    #[arg(long)]
    only_synonymous: bool,

    /// Keep only one randomly picked individual of each population.
    ///
    /// The picks depend on the seed, and are listed in comments of the output header.
    #[arg(long)]
    one_individual: bool,

    #[command(flatten)]
    grouping: Grouping,

    #[command(flatten)]
    sampling: Sampling,

    #[command(flatten)]
    filters: Filters,
}

#[derive(ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Absent {
    /// Individuals without a call are homozygous for the reference base.
    Reference,
    /// Individuals without a call are ignored, and sites without any call are skipped.
    Skip,
}

impl From<Absent> for counts::AbsentPolicy {
    fn from(value: Absent) -> Self {
        match value {
            Absent::Reference => Self::Reference,
            Absent::Skip => Self::Skip,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum RefMismatch {
    /// Fail with an error.
    Fail,
    /// Skip the site with a warning.
    Skip,
    /// Do not compare reference bases.
    Ignore,
}

impl From<RefMismatch> for counts::RefCheck {
    fn from(value: RefMismatch) -> Self {
        match value {
            RefMismatch::Fail => Self::Fail,
            RefMismatch::Skip => Self::WarnAndSkip,
            RefMismatch::Ignore => Self::Ignore,
        }
    }
}

impl VcfToCounts {
    pub fn run(self) -> Result<(), Error> {
        let populations = match self.merge {
            Some(names) => Populations::MergeFiles(names),
            None => self.grouping.populations()?,
        };

        let inputs = self
            .inputs
            .iter()
            .map(|path| open_path(path))
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = scanner::Builder::default().set_ploidy(self.ploidy);
        if let Some(max_skip) = self.max_skip {
            builder = builder.set_max_skip(max_skip);
        }
        let scanner = builder
            .build(inputs)
            .context("failed to read VCF headers")?;

        let reader = open_path(&self.reference)?;
        let reference = if self.alignment {
            Reference::Alignments(alignment::Reader::new(reader))
        } else {
            Reference::Sequences(fasta::Reader::new(reader))
        };

        let engine = self
            .sampling
            .apply(counts::Builder::default())
            .set_absent(self.absent.into())
            .set_ref_check(self.ref_mismatch.into())
            .set_only_synonymous(self.only_synonymous)
            .set_one_individual(self.one_individual)
            .set_filters((&self.filters).into())
            .build_from_variants(reference, scanner, populations)?;

        write_counts(engine, self.output.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::error::ErrorKind as ClapErrorKind;

    use crate::tests::{parse_subcmd, try_parse_subcmd};

    #[test]
    fn test_requires_reference() {
        let result = try_parse_subcmd::<VcfToCounts>("counts vcf-to-counts a.vcf");

        assert_eq!(
            result.unwrap_err().kind(),
            ClapErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_merge() {
        let args =
            parse_subcmd::<VcfToCounts>("counts vcf-to-counts -r ref.fa --merge x,y a.vcf b.vcf");

        assert_eq!(args.inputs.len(), 2);
        assert_eq!(
            args.merge,
            Some(vec![String::from("x"), String::from("y")])
        );
    }

    #[test]
    fn test_merge_and_population_map_conflict() {
        let result = try_parse_subcmd::<VcfToCounts>(
            "counts vcf-to-counts -r ref.fa --merge x -p pops.txt a.vcf",
        );

        assert_eq!(result.unwrap_err().kind(), ClapErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_one_individual() {
        let args = parse_subcmd::<VcfToCounts>(
            "counts vcf-to-counts -r ref.fa --one-individual --seed 3 a.vcf",
        );

        assert!(args.one_individual);
        assert_eq!(args.sampling.seed, Some(3));
    }

    #[test]
    fn test_ref_mismatch_ignore() {
        let args = parse_subcmd::<VcfToCounts>(
            "counts vcf-to-counts -r ref.fa --ref-mismatch ignore a.vcf",
        );

        assert_eq!(args.ref_mismatch, RefMismatch::Ignore);
        assert_eq!(counts::RefCheck::from(args.ref_mismatch), counts::RefCheck::Ignore);
    }
}
