//! `divcompare`: Shannon entropy vs. Simpson's index over small category multisets.
//!
//! This crate answers a narrow empirical question: when a sample of `m` observations falls into
//! at most `k` categories, which (entropy, Simpson) pairs are actually reachable, and does one
//! measure ever separate samples the other cannot? It does so by brute force: every multiset of
//! labels is enumerated (see [`sweep`]), reduced to its frequency table, and scored.
//!
//! Design intent:
//! - The statistics are *plug-in* functionals of the observed counts. No bias correction, no
//!   smoothing, natural log throughout.
//! - The hot path ([`shannon_nats`], [`simpson_index`]) is unchecked: the enumerator only
//!   produces well-formed counts. Library callers with arbitrary input use the `_from_counts`
//!   variants, which return [`Result`].
//!
//! ## Quick example
//!
//! ```rust
//! use divcompare::{table, shannon_nats, simpson_index};
//!
//! let counts = table(&[0, 0, 1, 2, 2, 2]);
//! assert_eq!(counts, vec![2, 1, 3]);
//!
//! let h = shannon_nats(&counts);
//! let d = simpson_index(&counts);
//! assert!(h > 0.0);
//! assert!((0.0..1.0).contains(&d));
//! ```

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

pub mod seen;
pub mod sweep;

/// Errors for the checked statistics and the sweep driver.
#[derive(Debug, Error)]
pub enum DiversityError {
    #[error("empty sample")]
    EmptySample,

    #[error("invalid input: {0}")]
    Invalid(&'static str),

    #[error(transparent)]
    Logp(#[from] logp::Error),

    #[error("failed to write sweep output: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = core::result::Result<T, DiversityError>;

/// Frequency table of a label sequence: one count per distinct label.
///
/// Counts are returned in ascending label order. The statistics below are symmetric in their
/// entries, but a fixed order keeps floating-point accumulation (and therefore exact-equality
/// deduplication) reproducible.
///
/// The result always satisfies `counts.iter().sum() == labels.len()`, and `counts.len()` is the
/// number of distinct labels. Every entry is `>= 1`.
///
/// # Examples
///
/// ```
/// use divcompare::table;
///
/// assert_eq!(table(&[0, 0, 0]), vec![3]);
/// assert_eq!(table(&['b', 'a', 'b']), vec![1, 2]);
/// ```
#[must_use]
pub fn table<T: Ord>(labels: &[T]) -> Vec<usize> {
    let mut freq: BTreeMap<&T, usize> = BTreeMap::new();
    for label in labels {
        *freq.entry(label).or_insert(0) += 1;
    }
    freq.into_values().collect()
}

/// Convert per-category counts into an empirical distribution on the observed support.
///
/// \[
/// \hat p_i = \frac{c_i}{n}, \quad n = \sum_i c_i.
/// \]
///
/// # Errors
///
/// Returns [`DiversityError::EmptySample`] if `counts` is empty, or
/// [`DiversityError::Invalid`] if any count is zero.
pub fn empirical_simplex_from_counts(counts: &[usize]) -> Result<Vec<f64>> {
    if counts.is_empty() {
        return Err(DiversityError::EmptySample);
    }
    if counts.contains(&0) {
        return Err(DiversityError::Invalid("counts must be positive"));
    }
    let n = counts.iter().sum::<usize>() as f64;
    Ok(counts.iter().map(|&c| (c as f64) / n).collect())
}

/// Shannon entropy (nats) of the empirical distribution of `counts`.
///
/// \[
/// H = -\sum_i \hat p_i \ln \hat p_i, \qquad \hat p_i = \frac{c_i}{\sum_j c_j}.
/// \]
///
/// The log base is natural and is not configurable; see [`shannon_bits`] for reporting in bits.
///
/// Unchecked: every count must be positive and the sum must be non-zero. A zero count yields
/// `NaN` rather than an error. The accumulator starts at `+0.0`, so a single-category sample
/// returns exactly `0.0` (never `-0.0`).
///
/// # Examples
///
/// ```
/// use divcompare::shannon_nats;
///
/// assert_eq!(shannon_nats(&[3]), 0.0);
/// assert!((shannon_nats(&[1, 1]) - 2.0_f64.ln()).abs() < 1e-15);
/// ```
#[must_use]
pub fn shannon_nats(counts: &[usize]) -> f64 {
    let s = counts.iter().sum::<usize>() as f64;
    let mut h = 0.0;
    for &c in counts {
        let p = (c as f64) / s;
        h -= p * p.ln();
    }
    h
}

/// Shannon entropy in bits. Equal to `shannon_nats(counts) / ln 2`.
#[must_use]
pub fn shannon_bits(counts: &[usize]) -> f64 {
    shannon_nats(counts) / logp::LN_2
}

/// Checked Shannon entropy (nats).
///
/// Builds the empirical simplex, validates it with `logp`, then evaluates the same
/// accumulation as [`shannon_nats`] so results are bit-identical on valid input.
///
/// # Errors
///
/// - [`DiversityError::EmptySample`] if `counts` is empty.
/// - [`DiversityError::Invalid`] if any count is zero.
/// - Propagates simplex validation errors from `logp::validate_simplex`.
pub fn shannon_nats_from_counts(counts: &[usize]) -> Result<f64> {
    let p = empirical_simplex_from_counts(counts)?;
    logp::validate_simplex(&p, 1e-9)?;
    Ok(shannon_nats(counts))
}

/// Simpson's index: the probability that two draws *without replacement* land in the same
/// category.
///
/// \[
/// D = \frac{\sum_i c_i (c_i - 1)}{N (N - 1)}, \qquad N = \sum_i c_i.
/// \]
///
/// This is the unnormalized dominance form: `1.0` for a single category, `0.0` when every
/// observation is its own category. Numerator and denominator are exact integers divided once.
///
/// Unchecked: `N < 2` is outside the domain (`N == 1` gives `NaN`).
///
/// # Examples
///
/// ```
/// use divcompare::simpson_index;
///
/// assert_eq!(simpson_index(&[3]), 1.0);
/// assert_eq!(simpson_index(&[1, 1]), 0.0);
/// assert_eq!(simpson_index(&[2, 1]), 1.0 / 3.0);
/// ```
#[must_use]
pub fn simpson_index(counts: &[usize]) -> f64 {
    let n = counts.iter().sum::<usize>() as f64;
    let same: usize = counts.iter().map(|&c| c * c.saturating_sub(1)).sum();
    (same as f64) / (n * (n - 1.0))
}

/// Checked Simpson's index.
///
/// # Errors
///
/// - [`DiversityError::EmptySample`] if `counts` is empty.
/// - [`DiversityError::Invalid`] if any count is zero or the total is below 2.
pub fn simpson_index_from_counts(counts: &[usize]) -> Result<f64> {
    if counts.is_empty() {
        return Err(DiversityError::EmptySample);
    }
    if counts.contains(&0) {
        return Err(DiversityError::Invalid("counts must be positive"));
    }
    if counts.iter().sum::<usize>() < 2 {
        return Err(DiversityError::Invalid("sample size must be >= 2"));
    }
    Ok(simpson_index(counts))
}

/// A point in (entropy, Simpson) space.
///
/// Equality is exact floating-point equality of both components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiversityPair {
    /// Shannon entropy in nats.
    pub shannon: f64,
    /// Simpson's index (same-category probability without replacement).
    pub simpson: f64,
}

impl fmt::Display for DiversityPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.shannon, self.simpson)
    }
}

/// Both statistics for one frequency table (unchecked).
#[must_use]
pub fn diversity_pair(counts: &[usize]) -> DiversityPair {
    DiversityPair {
        shannon: shannon_nats(counts),
        simpson: simpson_index(counts),
    }
}

/// Both statistics for one frequency table, validating the input first.
///
/// # Errors
///
/// Same conditions as [`shannon_nats_from_counts`] and [`simpson_index_from_counts`].
pub fn diversity_pair_from_counts(counts: &[usize]) -> Result<DiversityPair> {
    Ok(DiversityPair {
        shannon: shannon_nats_from_counts(counts)?,
        simpson: simpson_index_from_counts(counts)?,
    })
}
