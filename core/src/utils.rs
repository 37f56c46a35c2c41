//! Binomial distribution.
//!
//! Much of the code here is adapted from the implementation in statrs.

use factorial::ln_factorial;

/// Returns the natural logarithm of the binomial coefficient.
pub fn ln_binomial(n: u64, k: u64) -> f64 {
    if k > n {
        f64::NEG_INFINITY
    } else {
        ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k)
    }
}

/// Returns the PMF of the binomial distribution with `trials` trials and success probability `p`.
///
/// The edge cases `p = 0` and `p = 1` are exact.
pub fn binomial_pmf(trials: u64, p: f64, successes: u64) -> f64 {
    if successes > trials {
        0.0
    } else if p <= 0.0 {
        if successes == 0 {
            1.0
        } else {
            0.0
        }
    } else if p >= 1.0 {
        if successes == trials {
            1.0
        } else {
            0.0
        }
    } else {
        let k = successes as f64;
        let n = trials as f64;

        (ln_binomial(trials, successes) + k * p.ln() + (n - k) * (-p).ln_1p()).exp()
    }
}

mod factorial {
    use std::sync::OnceLock;

    use super::gamma::ln_gamma;

    const MAX: usize = 170;

    fn ln_precomputed() -> &'static [f64; MAX + 1] {
        static LN_PRECOMPUTED: OnceLock<[f64; MAX + 1]> = OnceLock::new();

        LN_PRECOMPUTED.get_or_init(|| {
            let mut precomputed = [0.0; MAX + 1];

            for i in 1..=MAX {
                precomputed[i] = precomputed[i - 1] + (i as f64).ln();
            }

            precomputed
        })
    }

    pub(super) fn ln_factorial(x: u64) -> f64 {
        usize::try_from(x)
            .ok()
            .and_then(|x| ln_precomputed().get(x).copied())
            .unwrap_or_else(|| ln_gamma(x as f64 + 1.0))
    }
}

mod gamma {
    use std::f64::consts::E;

    const LN_2_SQRT_E_OVER_PI: f64 = 0.620_782_237_635_245_2;
    const R: f64 = 10.900511;
    const DK: &[f64] = &[
        2.485_740_891_387_535_5e-5,
        1.051_423_785_817_219_7,
        -3.456_870_972_220_162_5,
        4.512_277_094_668_948,
        -2.982_852_253_235_766_4,
        1.056_397_115_771_267,
        -1.954_287_731_916_458_7e-1,
        1.709_705_434_044_412e-2,
        -5.719_261_174_043_057e-4,
        4.633_994_733_599_057e-6,
        -2.719_949_084_886_077_2e-9,
    ];

    /// Lanczos approximation, valid for `x >= 0.5`.
    pub(super) fn ln_gamma(x: f64) -> f64 {
        let s = DK
            .iter()
            .enumerate()
            .skip(1)
            .fold(DK[0], |s, (i, d)| s + d / (x + i as f64 - 1.0));

        s.ln() + LN_2_SQRT_E_OVER_PI + (x - 0.5) * ((x - 0.5 + R) / E).ln()
    }
}
