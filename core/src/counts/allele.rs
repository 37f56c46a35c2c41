use std::{fmt, ops::AddAssign, str::FromStr};

use crate::seq::{iupac, Base};

/// Counts of the four bases in one population at one site.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct AlleleCounts([usize; Base::N]);

impl AlleleCounts {
    /// Creates new allele counts in `A`, `C`, `G`, `T` order.
    pub const fn new(counts: [usize; Base::N]) -> Self {
        Self(counts)
    }

    /// Creates allele counts with all weight on a single base.
    pub fn fixed(base: Base, count: usize) -> Self {
        let mut counts = Self::default();
        counts.add(base, count);
        counts
    }

    /// Returns the count of a base.
    pub fn get(&self, base: Base) -> usize {
        self.0[base.index()]
    }

    /// Adds to the count of a base.
    pub fn add(&mut self, base: Base, count: usize) {
        self.0[base.index()] += count;
    }

    pub(crate) fn remove(&mut self, base: Base) {
        self.0[base.index()] -= 1;
    }

    /// Adds one count for each base represented by an IUPAC symbol.
    ///
    /// Unambiguous bases count `weight` times, two- and three-fold ambiguity codes add one to each
    /// base they represent, and `N`, gaps and unknown symbols add nothing. Returns true if
    /// anything was added.
    pub fn add_symbol(&mut self, symbol: u8, weight: usize) -> bool {
        match iupac::bases(symbol) {
            Some(&[base]) => {
                self.add(base, weight);
                true
            }
            Some(bases) if (2..Base::N).contains(&bases.len()) => {
                for &base in bases {
                    self.add(base, 1);
                }
                true
            }
            _ => false,
        }
    }

    /// Returns the counts as an array.
    pub fn as_array(&self) -> &[usize; Base::N] {
        &self.0
    }

    /// Returns the total count.
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Returns true if all counts are zero.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Returns the number of bases with a count larger than `noise`.
    pub fn distinct(&self, noise: usize) -> usize {
        self.0.iter().filter(|&&count| count > noise).count()
    }

    /// Returns the base with the largest count, preferring the first in `A`, `C`, `G`, `T` order
    /// on ties, or `None` if all counts are zero.
    pub fn max_base(&self) -> Option<Base> {
        let mut max: Option<(Base, usize)> = None;

        for base in Base::VARIANTS {
            let count = self.get(base);
            if count > 0 && max.map_or(true, |(_, max)| count > max) {
                max = Some((base, count));
            }
        }

        max.map(|(base, _)| base)
    }

    /// Returns the bases with non-zero counts, ordered by decreasing count and then by base.
    pub fn ranked(&self) -> Vec<Base> {
        let mut bases: Vec<Base> = Base::VARIANTS
            .into_iter()
            .filter(|&base| self.get(base) > 0)
            .collect();
        bases.sort_by(|a, b| self.get(*b).cmp(&self.get(*a)).then(a.cmp(b)));
        bases
    }
}

impl AddAssign<&AlleleCounts> for AlleleCounts {
    fn add_assign(&mut self, other: &AlleleCounts) {
        self.0
            .iter_mut()
            .zip(other.0.iter())
            .for_each(|(x, y)| *x += y);
    }
}

impl From<[usize; Base::N]> for AlleleCounts {
    fn from(counts: [usize; Base::N]) -> Self {
        Self::new(counts)
    }
}

impl fmt::Display for AlleleCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, c, g, t] = self.0;
        write!(f, "{a},{c},{g},{t}")
    }
}

impl FromStr for AlleleCounts {
    type Err = ParseAlleleCountsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseAlleleCountsError(s.to_string());

        let mut counts = [0; Base::N];
        let mut fields = s.split(',');

        for count in counts.iter_mut() {
            *count = fields
                .next()
                .and_then(|field| field.trim().parse().ok())
                .ok_or_else(err)?;
        }

        if fields.next().is_some() {
            return Err(err());
        }

        Ok(Self(counts))
    }
}

/// An error associated with parsing allele counts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseAlleleCountsError(String);

impl fmt::Display for ParseAlleleCountsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid allele counts '{}', expected four comma-separated counts",
            self.0
        )
    }
}

impl std::error::Error for ParseAlleleCountsError {}
