//! Quality filters for alignments of coding sequences.
//!
//! Filters are configured using a [`FilterConfig`], and are always applied in the order of the
//! [`Filter`] variants, stopping at the first rejection.

use std::fmt;

use crate::seq::{code, iupac, Sequence};

use super::Alignment;

/// An alignment filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Filter {
    /// Rejects alignments where any row has an internal gap longer than `max_length`.
    LongGap {
        /// Longest accepted gap.
        max_length: usize,
    },
    /// Rejects alignments where any row has an internal gap with length not divisible by three.
    FrameShiftingGap,
    /// Rejects alignments where the reference row does not start with a start codon.
    StartCodon,
    /// Rejects alignments where any row has an in-frame stop codon before its last codon.
    StopCodon,
    /// Rejects alignments where the p-distance between any two rows exceeds `max`.
    Divergence {
        /// Largest accepted p-distance.
        max: f64,
    },
    /// Rejects alignments with fewer than `min` codons without gaps in any row.
    MinCodons {
        /// Fewest accepted codons.
        min: usize,
    },
}

impl Filter {
    /// Returns the rejection produced by this filter.
    pub fn rejection(&self) -> Rejection {
        match self {
            Filter::LongGap { .. } => Rejection::LongGap,
            Filter::FrameShiftingGap => Rejection::FrameShiftingGap,
            Filter::StartCodon => Rejection::StartCodon,
            Filter::StopCodon => Rejection::StopCodon,
            Filter::Divergence { .. } => Rejection::Divergence,
            Filter::MinCodons { .. } => Rejection::MinCodons,
        }
    }

    /// Returns true if the alignment passes the filter.
    pub fn accepts(&self, alignment: &Alignment) -> bool {
        let rows = alignment.rows();

        match *self {
            Filter::LongGap { max_length } => rows
                .iter()
                .all(|row| internal_gaps(row.symbols()).all(|gap| gap <= max_length)),
            Filter::FrameShiftingGap => rows
                .iter()
                .all(|row| internal_gaps(row.symbols()).all(|gap| gap % 3 == 0)),
            Filter::StartCodon => alignment.reference().codon(0).is_some_and(code::is_start),
            Filter::StopCodon => rows.iter().all(|row| !has_premature_stop(row)),
            Filter::Divergence { max } => rows.iter().enumerate().all(|(i, x)| {
                rows[i + 1..]
                    .iter()
                    .all(|y| p_distance(x.symbols(), y.symbols()) <= max)
            }),
            Filter::MinCodons { min } => ungapped_codons(alignment) >= min,
        }
    }
}

/// Returns the lengths of gap runs not touching either end of the symbols.
fn internal_gaps(symbols: &[u8]) -> impl Iterator<Item = usize> + '_ {
    let first = symbols.iter().position(|&s| !iupac::is_gap(s)).unwrap_or(0);
    let last = symbols
        .iter()
        .rposition(|&s| !iupac::is_gap(s))
        .map_or(0, |i| i + 1);

    symbols
        .get(first..last)
        .unwrap_or_default()
        .split(|&s| !iupac::is_gap(s))
        .map(<[u8]>::len)
        .filter(|&len| len > 0)
}

fn has_premature_stop(row: &Sequence) -> bool {
    let codons: Vec<_> = row.codons().collect();

    codons
        .split_last()
        .map(|(_, init)| init)
        .unwrap_or_default()
        .iter()
        .filter(|codon| !codon.iter().any(|&s| iupac::is_gap(s)))
        .any(|codon| code::is_stop(codon))
}

/// Returns the proportion of differing columns among columns where neither symbol is a gap.
///
/// Returns zero if the sequences share no such column.
pub fn p_distance(x: &[u8], y: &[u8]) -> f64 {
    let (shared, different) = x
        .iter()
        .zip(y)
        .filter(|&(a, b)| !iupac::is_gap(*a) && !iupac::is_gap(*b))
        .fold((0usize, 0usize), |(shared, different), (a, b)| {
            (shared + 1, different + usize::from(!a.eq_ignore_ascii_case(b)))
        });

    if shared == 0 {
        0.0
    } else {
        different as f64 / shared as f64
    }
}

fn ungapped_codons(alignment: &Alignment) -> usize {
    let frame = alignment.reference().frame();
    let width = alignment.width();

    (frame..width)
        .step_by(3)
        .filter(|&start| start + 3 <= width)
        .filter(|&start| {
            alignment
                .rows()
                .iter()
                .all(|row| !row.symbols()[start..start + 3].iter().any(|&s| iupac::is_gap(s)))
        })
        .count()
}

/// A reason an alignment was rejected.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Rejection {
    /// See [`Filter::LongGap`].
    LongGap = 0,
    /// See [`Filter::FrameShiftingGap`].
    FrameShiftingGap = 1,
    /// See [`Filter::StartCodon`].
    StartCodon = 2,
    /// See [`Filter::StopCodon`].
    StopCodon = 3,
    /// See [`Filter::Divergence`].
    Divergence = 4,
    /// See [`Filter::MinCodons`].
    MinCodons = 5,
}

impl Rejection {
    /// The number of rejection reasons.
    pub const N: usize = 6;

    /// All rejection reasons, in the order their filters are applied.
    pub const VARIANTS: [Rejection; Self::N] = [
        Self::LongGap,
        Self::FrameShiftingGap,
        Self::StartCodon,
        Self::StopCodon,
        Self::Divergence,
        Self::MinCodons,
    ];

    /// Returns a description of the reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::LongGap => "long gap",
            Self::FrameShiftingGap => "frame-shifting gap",
            Self::StartCodon => "missing start codon",
            Self::StopCodon => "premature stop codon",
            Self::Divergence => "high divergence",
            Self::MinCodons => "too few ungapped codons",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Configuration of the filters applied to alignments.
///
/// By default, no filters are enabled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterConfig {
    max_gap_length: Option<usize>,
    frame_shifting_gap: bool,
    start_codon: bool,
    stop_codon: bool,
    max_divergence: Option<f64>,
    min_codons: Option<usize>,
}

impl FilterConfig {
    /// Returns the enabled filters in the order they are applied.
    pub fn filters(&self) -> Vec<Filter> {
        [
            self.max_gap_length
                .map(|max_length| Filter::LongGap { max_length }),
            self.frame_shifting_gap.then_some(Filter::FrameShiftingGap),
            self.start_codon.then_some(Filter::StartCodon),
            self.stop_codon.then_some(Filter::StopCodon),
            self.max_divergence.map(|max| Filter::Divergence { max }),
            self.min_codons.map(|min| Filter::MinCodons { min }),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Returns true if no filters are enabled.
    pub fn is_empty(&self) -> bool {
        self.filters().is_empty()
    }

    /// Checks the alignment against the enabled filters, returning the first rejection.
    pub fn check(&self, alignment: &Alignment) -> Result<(), Rejection> {
        match self
            .filters()
            .into_iter()
            .find(|filter| !filter.accepts(alignment))
        {
            Some(filter) => Err(filter.rejection()),
            None => Ok(()),
        }
    }

    /// Checks the alignment and records the outcome in the summary.
    pub fn apply(&self, alignment: &Alignment, summary: &mut Summary) -> bool {
        match self.check(alignment) {
            Ok(()) => {
                summary.accepted += 1;
                true
            }
            Err(rejection) => {
                log::debug!(
                    "Rejecting alignment starting with '{}' due to {rejection}",
                    alignment.reference().name()
                );
                summary.rejected[rejection as u8 as usize] += 1;
                false
            }
        }
    }

    /// Sets the longest accepted internal gap.
    pub fn set_max_gap_length(mut self, max_length: usize) -> Self {
        self.max_gap_length = Some(max_length);
        self
    }

    /// Sets whether to reject frame-shifting gaps.
    pub fn set_frame_shifting_gap(mut self, enabled: bool) -> Self {
        self.frame_shifting_gap = enabled;
        self
    }

    /// Sets whether to require a start codon in the reference row.
    pub fn set_start_codon(mut self, enabled: bool) -> Self {
        self.start_codon = enabled;
        self
    }

    /// Sets whether to reject premature stop codons.
    pub fn set_stop_codon(mut self, enabled: bool) -> Self {
        self.stop_codon = enabled;
        self
    }

    /// Sets the largest accepted pairwise p-distance.
    pub fn set_max_divergence(mut self, max: f64) -> Self {
        self.max_divergence = Some(max);
        self
    }

    /// Sets the fewest accepted ungapped codons.
    pub fn set_min_codons(mut self, min: usize) -> Self {
        self.min_codons = Some(min);
        self
    }
}

/// Counts of accepted and rejected alignments.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    accepted: usize,
    rejected: [usize; Rejection::N],
}

impl Summary {
    /// Returns the number of accepted alignments.
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Returns the number of alignments rejected for the provided reason.
    pub fn rejected(&self, rejection: Rejection) -> usize {
        self.rejected[rejection as u8 as usize]
    }

    /// Returns the total number of rejected alignments.
    pub fn total_rejected(&self) -> usize {
        self.rejected.iter().sum()
    }

    /// Logs the number of rejections for each reason.
    pub fn summarize(&self) {
        for rejection in Rejection::VARIANTS {
            let count = self.rejected(rejection);

            if count > 0 {
                let reason = rejection.reason();

                log::warn!("Rejected {count} alignments due to {reason}.");
            }
        }

        log::info!("Accepted {} alignments.", self.accepted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alignment(rows: &[&str]) -> Alignment {
        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, row)| Sequence::new(format!("s{i}"), row.as_bytes().to_vec()))
            .collect();

        Alignment::new(rows).unwrap()
    }

    #[test]
    fn test_internal_gaps() {
        assert_eq!(internal_gaps(b"--AC---G-T--").collect::<Vec<_>>(), [3, 1]);
        assert_eq!(internal_gaps(b"----").count(), 0);
        assert_eq!(internal_gaps(b"ACGT").count(), 0);
    }

    #[test]
    fn test_long_gap() {
        let filter = Filter::LongGap { max_length: 3 };

        assert!(filter.accepts(&alignment(&["A---CA", "------"])));
        assert!(!filter.accepts(&alignment(&["ACGTAC", "A----C"])));
    }

    #[test]
    fn test_frame_shifting_gap() {
        let filter = Filter::FrameShiftingGap;

        assert!(filter.accepts(&alignment(&["ATG---AAA", "--GAAAAAA"])));
        assert!(!filter.accepts(&alignment(&["ATG--AAAA", "ATGAAAAAA"])));
    }

    #[test]
    fn test_start_codon() {
        assert!(Filter::StartCodon.accepts(&alignment(&["ATGAAA", "CTGAAA"])));
        assert!(!Filter::StartCodon.accepts(&alignment(&["CTGAAA", "ATGAAA"])));
    }

    #[test]
    fn test_stop_codon() {
        let filter = Filter::StopCodon;

        assert!(filter.accepts(&alignment(&["ATGAAATAA", "ATGAAATGA"])));
        assert!(filter.accepts(&alignment(&["ATGTA-AAA", "ATGAAAAAA"])));
        assert!(!filter.accepts(&alignment(&["ATGAAAAAA", "ATGTAGAAA"])));
    }

    #[test]
    fn test_divergence() {
        assert_eq!(p_distance(b"ACGT", b"ACGA"), 0.25);
        assert_eq!(p_distance(b"AC--", b"aGTT"), 0.5);
        assert_eq!(p_distance(b"AC--", b"--GT"), 0.0);

        let filter = Filter::Divergence { max: 0.3 };
        assert!(filter.accepts(&alignment(&["ACGT", "ACGA", "ACGT"])));
        assert!(!filter.accepts(&alignment(&["ACGT", "ACGA", "ACTA"])));
    }

    #[test]
    fn test_min_codons() {
        let filter = Filter::MinCodons { min: 2 };

        assert!(filter.accepts(&alignment(&["ATGAAACCC", "ATG-AACCC"])));
        assert!(!filter.accepts(&alignment(&["ATGAAACCC", "AT--AACCC"])));
    }

    #[test]
    fn test_check_order() {
        let config = FilterConfig::default()
            .set_start_codon(true)
            .set_stop_codon(true)
            .set_frame_shifting_gap(true);

        let both = alignment(&["CTGTAA-AAA", "CTGTAAAAAA"]);
        assert_eq!(config.check(&both), Err(Rejection::FrameShiftingGap));

        let codons = alignment(&["CTGTAAAAA", "CTGTAAAAA"]);
        assert_eq!(config.check(&codons), Err(Rejection::StartCodon));

        assert_eq!(
            FilterConfig::default().check(&codons),
            Ok(()),
            "no filters enabled"
        );
    }

    #[test]
    fn test_summary() {
        let config = FilterConfig::default().set_start_codon(true);
        let mut summary = Summary::default();

        assert!(config.apply(&alignment(&["ATGAAA"]), &mut summary));
        assert!(!config.apply(&alignment(&["AAAAAA"]), &mut summary));
        assert!(!config.apply(&alignment(&["CCCAAA"]), &mut summary));

        assert_eq!(summary.accepted(), 1);
        assert_eq!(summary.rejected(Rejection::StartCodon), 2);
        assert_eq!(summary.total_rejected(), 2);
    }
}
