use std::fmt;

use crate::{seq::Base, utils::binomial_pmf};

use super::{Error, Parameters};

/// A transition matrix over the number of derived alleles in a sample.
///
/// Entry `(j, k)` is the probability that a sample of size `N` with `j` copies of the derived
/// allele has `k` copies in the next generation. Every row sums to one.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbabilityMatrix {
    ancestral: Base,
    derived: Base,
    sample_size: usize,
    values: Vec<f64>,
}

impl ProbabilityMatrix {
    /// The largest accepted deviation of a row sum from one.
    pub const TOLERANCE: f64 = 1e-9;

    /// Creates a new matrix for the allele pair and sample size.
    ///
    /// The derived allele frequency `p = j / N` is first changed by selection, weighting each
    /// allele by its fitness, and then by mutation, with rate `u` from ancestral to derived and
    /// `v` from derived to ancestral. The next generation is a binomial sample of size `N`.
    ///
    /// # Errors
    ///
    /// If the alleles are equal, the sample size is zero, or the parameters are invalid.
    pub fn new(
        ancestral: Base,
        derived: Base,
        sample_size: usize,
        parameters: &Parameters,
    ) -> Result<Self, Error> {
        if ancestral == derived {
            return Err(Error::InvalidParameter(format!(
                "ancestral and derived alleles are both {ancestral}"
            )));
        } else if sample_size == 0 {
            return Err(Error::InvalidParameter(String::from(
                "sample size must be positive",
            )));
        }

        parameters.validate()?;

        let (u, v) = (parameters.rate(derived), parameters.rate(ancestral));
        let (w_a, w_d) = (parameters.fitness(ancestral), parameters.fitness(derived));

        let n = sample_size as u64;
        let dimension = sample_size + 1;
        let mut values = Vec::with_capacity(dimension * dimension);

        for j in 0..dimension {
            let p = j as f64 / sample_size as f64;
            let selected = p * w_d / (p * w_d + (1.0 - p) * w_a);
            let mutated = selected * (1.0 - v) + (1.0 - selected) * u;

            values.extend((0..=n).map(|k| binomial_pmf(n, mutated, k)));
        }

        let matrix = Self {
            ancestral,
            derived,
            sample_size,
            values,
        };
        matrix.check_rows()?;

        Ok(matrix)
    }

    fn check_rows(&self) -> Result<(), Error> {
        for row in 0..self.dimension() {
            let sum: f64 = self.row(row).iter().sum();

            if !sum.is_finite() || (sum - 1.0).abs() > Self::TOLERANCE {
                return Err(Error::RowSum { row, sum });
            }
        }

        Ok(())
    }

    /// Returns the ancestral allele.
    pub fn ancestral(&self) -> Base {
        self.ancestral
    }

    /// Returns the derived allele.
    pub fn derived(&self) -> Base {
        self.derived
    }

    /// Returns the sample size.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Returns the number of rows and columns.
    pub fn dimension(&self) -> usize {
        self.sample_size + 1
    }

    /// Returns the transition probability from `from` to `to` derived alleles.
    pub fn get(&self, from: usize, to: usize) -> Option<f64> {
        let dimension = self.dimension();

        (from < dimension && to < dimension).then(|| self.values[from * dimension + to])
    }

    /// Returns a row of the matrix.
    ///
    /// # Panics
    ///
    /// If the row is out of bounds.
    pub fn row(&self, row: usize) -> &[f64] {
        let dimension = self.dimension();
        &self.values[row * dimension..(row + 1) * dimension]
    }

    /// Returns the values in row-major order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl fmt::Display for ProbabilityMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut values = self.values.iter();

        if let Some(first) = values.next() {
            write!(f, "{first}")?;
        }

        values.try_for_each(|value| write!(f, " {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_sum_to_one() -> Result<(), Error> {
        let parameters = Parameters::new([0.1, 0.4, 0.3, 0.2], 0.1).with_selection(0.05);

        for n in [1, 2, 5, 10, 50] {
            let matrix = ProbabilityMatrix::new(Base::A, Base::G, n, &parameters)?;

            assert_eq!(matrix.values().len(), (n + 1) * (n + 1));
            for row in 0..matrix.dimension() {
                assert_approx_eq!(matrix.row(row).iter().sum::<f64>(), 1.0);
            }
        }

        Ok(())
    }

    #[test]
    fn test_check_rows_rejects_non_finite() {
        let matrix = |values: Vec<f64>| ProbabilityMatrix {
            ancestral: Base::A,
            derived: Base::C,
            sample_size: 1,
            values,
        };

        assert!(matrix(vec![0.5, 0.5, 0.0, 1.0]).check_rows().is_ok());
        assert!(matches!(
            matrix(vec![f64::NAN, 0.5, 0.0, 1.0]).check_rows(),
            Err(Error::RowSum { row: 0, .. })
        ));
        assert!(matches!(
            matrix(vec![0.5, 0.5, f64::INFINITY, 1.0]).check_rows(),
            Err(Error::RowSum { row: 1, .. })
        ));
        assert!(matches!(
            matrix(vec![0.5, 0.4, 0.0, 1.0]).check_rows(),
            Err(Error::RowSum { row: 0, .. })
        ));
    }

    #[test]
    fn test_without_mutation_or_selection() -> Result<(), Error> {
        let parameters = Parameters::new([0.0; 4], 1.0);
        let matrix = ProbabilityMatrix::new(Base::C, Base::T, 2, &parameters)?;

        assert_approx_eq!(matrix.row(0), &[1.0, 0.0, 0.0][..]);
        assert_approx_eq!(matrix.row(1), &[0.25, 0.5, 0.25][..]);
        assert_approx_eq!(matrix.row(2), &[0.0, 0.0, 1.0][..]);

        Ok(())
    }

    #[test]
    fn test_mutation() -> Result<(), Error> {
        let parameters = Parameters::new([0.0, 0.0, 0.0, 0.5], 0.2);
        let matrix = ProbabilityMatrix::new(Base::A, Base::T, 1, &parameters)?;

        // u = 0.1 from A to T, v = 0 from T to A
        assert_approx_eq!(matrix.row(0), &[0.9, 0.1][..]);
        assert_approx_eq!(matrix.row(1), &[0.0, 1.0][..]);
        assert_eq!(matrix.get(0, 1), matrix.values().get(1).copied());
        assert_eq!(matrix.get(2, 0), None);

        Ok(())
    }

    #[test]
    fn test_selection_favours_strong_allele() -> Result<(), Error> {
        let parameters = Parameters::new([0.0; 4], 0.0);
        let neutral = ProbabilityMatrix::new(Base::A, Base::C, 4, &parameters)?;
        let selected =
            ProbabilityMatrix::new(Base::A, Base::C, 4, &parameters.with_selection(0.5))?;

        let expected = |matrix: &ProbabilityMatrix| {
            matrix
                .row(2)
                .iter()
                .enumerate()
                .map(|(k, p)| k as f64 * p)
                .sum::<f64>()
        };

        assert_approx_eq!(expected(&neutral), 2.0);
        assert!(expected(&selected) > 2.0);

        Ok(())
    }

    #[test]
    fn test_invalid_parameters() {
        let parameters = Parameters::new([0.25; 4], 5.0);
        assert!(matches!(
            ProbabilityMatrix::new(Base::A, Base::C, 2, &parameters),
            Err(Error::InvalidParameter(_))
        ));

        let parameters = Parameters::default().with_selection(-1.0);
        assert!(matches!(
            ProbabilityMatrix::new(Base::A, Base::C, 2, &parameters),
            Err(Error::InvalidParameter(_))
        ));

        assert!(ProbabilityMatrix::new(Base::A, Base::A, 2, &Parameters::default()).is_err());
        assert!(ProbabilityMatrix::new(Base::A, Base::C, 0, &Parameters::default()).is_err());
    }

    #[test]
    fn test_display() -> Result<(), Error> {
        let parameters = Parameters::new([0.0; 4], 1.0);
        let matrix = ProbabilityMatrix::new(Base::C, Base::T, 1, &parameters)?;

        assert_eq!(matrix.to_string(), "1 0 0 1");

        Ok(())
    }
}
