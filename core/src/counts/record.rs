use std::fmt;

use super::AlleleCounts;

/// A site in a Counts file, with one vector of allele counts per population.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    chrom: String,
    position: usize,
    counts: Vec<AlleleCounts>,
}

impl Record {
    /// Creates a new record.
    pub fn new<S>(chrom: S, position: usize, counts: Vec<AlleleCounts>) -> Self
    where
        S: Into<String>,
    {
        Self {
            chrom: chrom.into(),
            position,
            counts,
        }
    }

    /// Returns the chromosome.
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    /// Returns the one-based position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the allele counts of each population.
    pub fn counts(&self) -> &[AlleleCounts] {
        &self.counts
    }

    /// Returns the allele counts summed over all populations.
    pub fn total(&self) -> AlleleCounts {
        self.counts
            .iter()
            .fold(AlleleCounts::default(), |mut total, counts| {
                total += counts;
                total
            })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.chrom, self.position)?;
        self.counts
            .iter()
            .try_for_each(|counts| write!(f, "\t{counts}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let record = Record::new(
            "chr2",
            1077,
            vec![AlleleCounts::new([0, 0, 1, 1]), AlleleCounts::new([4, 0, 0, 0])],
        );

        assert_eq!(record.to_string(), "chr2\t1077\t0,0,1,1\t4,0,0,0");
        assert_eq!(record.total(), AlleleCounts::new([4, 0, 1, 1]));
    }
}
