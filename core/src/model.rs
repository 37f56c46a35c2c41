//! Probability matrices for polymorphism-aware models, and their construction from allele counts.
//!
//! A [`ProbabilityMatrix`] describes one generation of drift, mutation and selection between a
//! pair of alleles in a sample of fixed size. A [`Batch`] reads a Counts file, maps every site to
//! an allele pair and a supported sample size per population, and writes the model input.

use std::{fmt, io};

use crate::{counts, seq::Base};

mod batch;
pub use batch::{Batch, Builder, Sample, Site, Skipped};

mod matrix;
pub use matrix::ProbabilityMatrix;

/// Parameters of the mutation and selection process.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    /// Relative mutation rate towards each base, in `A`, `C`, `G`, `T` order.
    pub mutation: [f64; Base::N],
    /// Population-scaled mutation rate.
    pub theta: f64,
    /// Selection coefficient favouring `C` and `G`, if any.
    pub selection: Option<f64>,
}

impl Parameters {
    /// Creates new parameters without selection.
    pub fn new(mutation: [f64; Base::N], theta: f64) -> Self {
        Self {
            mutation,
            theta,
            selection: None,
        }
    }

    /// Returns the parameters with a GC-biased selection coefficient.
    pub fn with_selection(mut self, selection: f64) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Returns the scaled rate of mutation towards a base.
    pub fn rate(&self, base: Base) -> f64 {
        self.theta * self.mutation[base.index()]
    }

    /// Returns the relative fitness of a base.
    pub fn fitness(&self, base: Base) -> f64 {
        match self.selection {
            Some(s) if base.is_strong() => 1.0 + s,
            _ => 1.0,
        }
    }

    /// Checks that every scaled mutation rate lies in `[0, 1]` and every fitness is finite and
    /// positive.
    pub fn validate(&self) -> Result<(), Error> {
        for base in Base::VARIANTS {
            let rate = self.rate(base);
            if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
                return Err(Error::InvalidParameter(format!(
                    "mutation rate {rate} towards {base} is outside [0, 1]"
                )));
            }

            let fitness = self.fitness(base);
            if !fitness.is_finite() || fitness <= 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "selection coefficient gives fitness {fitness} to {base}"
                )));
            }
        }

        Ok(())
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new([0.25; Base::N], 0.01)
    }
}

/// An error associated with building model input.
#[derive(Debug)]
pub enum Error {
    /// A parameter is outside its valid range.
    InvalidParameter(String),
    /// A row of a probability matrix does not sum to one.
    RowSum {
        /// Index of the row.
        row: usize,
        /// Sum of the row.
        sum: f64,
    },
    /// Error reading allele counts.
    Counts(counts::Error),
    /// I/O error.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParameter(reason) => write!(f, "invalid model parameter: {reason}"),
            Error::RowSum { row, sum } => write!(
                f,
                "row {row} of probability matrix sums to {sum}, expected 1"
            ),
            Error::Counts(e) => write!(f, "{e}"),
            Error::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Counts(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<counts::Error> for Error {
    fn from(e: counts::Error) -> Self {
        Self::Counts(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters() {
        let parameters = Parameters::new([0.1, 0.2, 0.3, 0.4], 0.5).with_selection(0.1);

        assert_approx_eq!(parameters.rate(Base::C), 0.1);
        assert_approx_eq!(parameters.fitness(Base::G), 1.1);
        assert_approx_eq!(parameters.fitness(Base::A), 1.0);
        assert_approx_eq!(Parameters::default().fitness(Base::C), 1.0);
    }

    #[test]
    fn test_validate() {
        assert!(Parameters::default().validate().is_ok());
        assert!(Parameters::new([0.25; 4], 5.0).validate().is_err());
        assert!(Parameters::new([0.25, -0.1, 0.25, 0.25], 0.1).validate().is_err());
        assert!(Parameters::default().with_selection(-1.0).validate().is_err());
        assert!(Parameters::default().with_selection(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_validate_non_finite() {
        assert!(Parameters::default().with_selection(f64::INFINITY).validate().is_err());
        assert!(Parameters::new([0.25; 4], f64::INFINITY).validate().is_err());
        assert!(Parameters::new([0.0, 0.5, 0.5, 0.0], f64::INFINITY).validate().is_err());
        assert!(Parameters::new([f64::NAN, 0.25, 0.25, 0.25], 0.1).validate().is_err());
    }
}
