use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::seq::Base;

use super::AlleleCounts;

/// Weighted random downsampling of allele counts.
///
/// Draws are made without replacement: each draw picks an integer uniformly from the number of
/// remaining alleles and walks the cumulative remaining counts in `A`, `C`, `G`, `T` order, so a
/// base with no remaining alleles is never chosen.
#[derive(Clone, Debug)]
pub struct Downsampler {
    rng: ChaCha8Rng,
    seed: u64,
}

impl Downsampler {
    /// Creates a new downsampler from a seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Creates a new downsampler with a random seed.
    pub fn from_entropy() -> Self {
        let seed = rand::thread_rng().gen();
        log::debug!(target: "downsample", "Using random seed {seed}");
        Self::from_seed(seed)
    }

    /// Returns the seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draws `sample_size` alleles without replacement from `counts`.
    ///
    /// Returns `None` if fewer than `sample_size` alleles are available. If exactly
    /// `sample_size` alleles are available, the counts are returned unchanged without consuming
    /// randomness.
    pub fn downsample(
        &mut self,
        counts: &AlleleCounts,
        sample_size: usize,
    ) -> Option<AlleleCounts> {
        let total = counts.total();

        if total < sample_size {
            return None;
        } else if total == sample_size {
            return Some(*counts);
        }

        let mut remaining = *counts;
        let mut drawn = AlleleCounts::default();

        for left in (total - sample_size + 1..=total).rev() {
            let base = Self::pick(&remaining, self.rng.gen_range(0..left))?;
            remaining.remove(base);
            drawn.add(base, 1);
        }

        Some(drawn)
    }

    /// Draws a single base with probability proportional to its count, or `None` if all counts
    /// are zero.
    pub fn choose(&mut self, counts: &AlleleCounts) -> Option<Base> {
        match counts.total() {
            0 => None,
            total => Self::pick(counts, self.rng.gen_range(0..total)),
        }
    }

    fn pick(counts: &AlleleCounts, draw: usize) -> Option<Base> {
        let mut cumulative = 0;

        for base in Base::VARIANTS {
            cumulative += counts.get(base);
            if draw < cumulative {
                return Some(base);
            }
        }

        None
    }
}
