use std::fmt;

use crate::fasta::filter::Summary;

/// A reason for skipping a site.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Skip {
    /// More than two bases above the noise threshold.
    Multiallelic = 0,
    /// A population has fewer alleles than the sample size.
    InsufficientCoverage = 1,
    /// Reference base is not an unambiguous nucleotide.
    InvalidReference = 2,
    /// Reference base of a variant call differs from the reference sequence.
    RefMismatch = 3,
    /// Site is not four-fold degenerate.
    NonSynonymous = 4,
    /// No individual has a call at the site.
    Uncalled = 5,
}

impl Skip {
    /// The number of reasons.
    pub const N: usize = 6;

    /// All reasons.
    pub const VARIANTS: [Skip; Self::N] = [
        Self::Multiallelic,
        Self::InsufficientCoverage,
        Self::InvalidReference,
        Self::RefMismatch,
        Self::NonSynonymous,
        Self::Uncalled,
    ];

    /// Returns a short description of the reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Multiallelic => "more than two alleles",
            Self::InsufficientCoverage => "insufficient coverage",
            Self::InvalidReference => "invalid reference base",
            Self::RefMismatch => "reference base mismatch",
            Self::NonSynonymous => "non-synonymous site",
            Self::Uncalled => "no variant calls",
        }
    }
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Counts of the sites read, emitted and skipped by an engine.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Statistics {
    sites: usize,
    emitted: usize,
    skipped: [usize; Skip::N],
    zero_coverage: usize,
    missing: usize,
    unmatched_calls: usize,
    invalid_calls: usize,
    alignments: Summary,
}

impl Statistics {
    /// Returns the number of sites read.
    pub fn sites(&self) -> usize {
        self.sites
    }

    /// Returns the number of records emitted.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Returns the number of sites skipped for the provided reason.
    pub fn skipped(&self, skip: Skip) -> usize {
        self.skipped[skip as u8 as usize]
    }

    /// Returns the total number of skipped sites.
    pub fn total_skipped(&self) -> usize {
        self.skipped.iter().sum()
    }

    /// Returns the number of times a population had no alleles at an emitted site.
    pub fn zero_coverage(&self) -> usize {
        self.zero_coverage
    }

    /// Returns the number of times a population was emitted as missing.
    pub fn missing(&self) -> usize {
        self.missing
    }

    /// Returns the number of variant sites that did not match a reference coordinate.
    pub fn unmatched_calls(&self) -> usize {
        self.unmatched_calls
    }

    /// Returns the number of variant records skipped for an invalid reference base.
    pub fn invalid_calls(&self) -> usize {
        self.invalid_calls
    }

    /// Returns the accepted and rejected alignments.
    pub fn alignments(&self) -> &Summary {
        &self.alignments
    }

    pub(crate) fn alignments_mut(&mut self) -> &mut Summary {
        &mut self.alignments
    }

    pub(crate) fn read_site(&mut self) {
        self.sites += 1;
    }

    pub(crate) fn emit(&mut self) {
        self.emitted += 1;
    }

    pub(crate) fn zero_coverage_population(&mut self) {
        self.zero_coverage += 1;
    }

    pub(crate) fn missing_population(&mut self) {
        self.missing += 1;
    }

    pub(crate) fn unmatched_calls_mut(&mut self) -> &mut usize {
        &mut self.unmatched_calls
    }

    pub(crate) fn set_invalid_calls(&mut self, count: usize) {
        self.invalid_calls = count;
    }

    /// Counts a skipped site, warning the first time a reason occurs.
    pub(crate) fn skip(&mut self, skip: Skip, chrom: &str, position: usize) {
        let count = &mut self.skipped[skip as u8 as usize];

        if *count == 0 {
            let reason = skip.reason();

            log::warn!(
                "Skipping site at position '{chrom}:{position}' due to {reason}. \
                This warning will be shown only once, with a summary at the end."
            );
        }

        *count += 1;
    }

    /// Logs the number of skipped sites for each reason and the other counts.
    pub fn summarize(&self) {
        for skip in Skip::VARIANTS {
            let count = self.skipped(skip);

            if count > 0 {
                let reason = skip.reason();

                log::warn!("Skipped {count} sites due to {reason}.");
            }
        }

        if self.invalid_calls > 0 {
            log::warn!(
                "Skipped {} variant records due to invalid reference base.",
                self.invalid_calls
            );
        }

        if self.unmatched_calls > 0 {
            log::warn!(
                "Ignored {} variant sites outside the reference sequence.",
                self.unmatched_calls
            );
        }

        if self.alignments.accepted() > 0 || self.alignments.total_rejected() > 0 {
            self.alignments.summarize();
        }

        if self.missing > 0 {
            log::info!("Marked {} population sites as missing.", self.missing);
        }

        log::info!("Read {} sites, wrote {} sites.", self.sites, self.emitted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_counts() {
        let mut statistics = Statistics::default();

        statistics.read_site();
        statistics.skip(Skip::Multiallelic, "chr1", 3);
        statistics.read_site();
        statistics.skip(Skip::Multiallelic, "chr1", 4);
        statistics.read_site();
        statistics.skip(Skip::Uncalled, "chr1", 5);
        statistics.read_site();
        statistics.emit();

        assert_eq!(statistics.sites(), 4);
        assert_eq!(statistics.emitted(), 1);
        assert_eq!(statistics.skipped(Skip::Multiallelic), 2);
        assert_eq!(statistics.skipped(Skip::Uncalled), 1);
        assert_eq!(statistics.skipped(Skip::RefMismatch), 0);
        assert_eq!(statistics.total_skipped(), 3);
    }
}
