//! The enumeration driver.
//!
//! A sweep walks a grid of *cells* `(n, resp)`. Cell `(n, resp)` draws samples of length
//! `resp + 2` from the labels `0..n + 2`, one sample per multiset (combination with
//! replacement, lexicographic order). Each sample is reduced with [`table`](crate::table),
//! scored with [`diversity_pair`](crate::diversity_pair), and reported the first time its pair
//! shows up anywhere in the run.
//!
//! The `+ 2` offsets keep every sample at two or more observations over two or more labels, which
//! is exactly the domain of the unchecked statistics.

use std::convert::Infallible;
use std::fmt;
use std::io::Write;

use itertools::Itertools;

use crate::seen::Discoveries;
use crate::{diversity_pair, table, DiversityError, DiversityPair, Result};

/// Loop bounds for a sweep (both inclusive).
///
/// The default, `max_n = 13` and `max_resp = 15`, covers 2..=15 categories and sample sizes
/// 2..=17.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Largest `n`; the category count is `n + 2`.
    pub max_n: usize,
    /// Largest `resp`; the sample length is `resp + 2`.
    pub max_resp: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_n: 13,
            max_resp: 15,
        }
    }
}

impl SweepConfig {
    /// Cells in driver order: `n` outer, `resp` inner.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let max_resp = self.max_resp;
        (0..=self.max_n).flat_map(move |n| (0..=max_resp).map(move |resp| Cell { n, resp }))
    }

    /// Total number of samples the sweep will score, or `None` if it does not fit in `u128`.
    #[must_use]
    pub fn total_samples(&self) -> Option<u128> {
        self.cells()
            .try_fold(0u128, |acc, c| acc.checked_add(c.multiset_count()?))
    }

    /// Reject bounds whose category count, sample length or total sample count overflow.
    ///
    /// Cost is one [`multiset_count`] per cell.
    ///
    /// # Errors
    ///
    /// [`DiversityError::Invalid`] naming the overflowing quantity.
    pub fn validate(&self) -> Result<()> {
        if self.max_n.checked_add(2).is_none() {
            return Err(DiversityError::Invalid("max_n + 2 overflows usize"));
        }
        if self.max_resp.checked_add(2).is_none() {
            return Err(DiversityError::Invalid("max_resp + 2 overflows usize"));
        }
        if self.total_samples().is_none() {
            return Err(DiversityError::Invalid("total sample count overflows u128"));
        }
        Ok(())
    }
}

/// One `(n, resp)` grid point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub n: usize,
    pub resp: usize,
}

impl Cell {
    /// `n + 2`, saturating. Cells of a validated [`SweepConfig`] never saturate.
    #[must_use]
    pub fn categories(&self) -> usize {
        self.n.saturating_add(2)
    }

    /// `resp + 2`, saturating.
    #[must_use]
    pub fn sample_len(&self) -> usize {
        self.resp.saturating_add(2)
    }

    /// Every multiset of `sample_len()` labels drawn from `0..categories()`, as non-decreasing
    /// label vectors in lexicographic order.
    pub fn samples(&self) -> impl Iterator<Item = Vec<usize>> {
        (0..self.categories()).combinations_with_replacement(self.sample_len())
    }

    /// Number of items [`Cell::samples`] yields, or `None` on overflow.
    #[must_use]
    pub fn multiset_count(&self) -> Option<u128> {
        multiset_count(self.categories(), self.sample_len())
    }
}

/// Number of multisets of size `len` over `categories` labels: \(\binom{k + m - 1}{m}\).
///
/// Computed incrementally; after step `i` the accumulator equals \(\binom{k - 1 + i}{i}\), so
/// every division is exact. Returns `None` when an intermediate product exceeds `u128`.
#[must_use]
pub fn multiset_count(categories: usize, len: usize) -> Option<u128> {
    if categories == 0 {
        return Some(u128::from(len == 0));
    }
    let k = categories as u128;
    let mut acc: u128 = 1;
    for i in 1..=len as u128 {
        acc = acc.checked_mul(k - 1 + i)? / i;
    }
    Some(acc)
}

/// A newly seen pair together with the cell that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discovery {
    pub cell: Cell,
    pub pair: DiversityPair,
}

/// Output row: `n resp shannon simpson`.
impl fmt::Display for Discovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.cell.n, self.cell.resp, self.pair)
    }
}

/// What one cell contributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellReport {
    pub cell: Cell,
    pub samples: u128,
    pub new_pairs: usize,
}

/// Totals for a finished sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepSummary {
    pub cells: usize,
    pub samples: u128,
    pub discoveries: usize,
}

/// Sweep state: the bounds plus the run-global seen-set.
#[derive(Debug, Clone)]
pub struct Sweep {
    config: SweepConfig,
    seen: Discoveries,
}

impl Sweep {
    #[must_use]
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config,
            seen: Discoveries::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Pairs found so far, in discovery order.
    #[must_use]
    pub fn discoveries(&self) -> &Discoveries {
        &self.seen
    }

    /// Score every sample of `cell`, calling `on_new` for each first sighting.
    ///
    /// The seen-set is shared with every other cell of this sweep.
    pub fn scan_cell<F>(&mut self, cell: Cell, on_new: F) -> Result<CellReport>
    where
        F: FnMut(Discovery) -> Result<()>,
    {
        self.scan(cell, on_new)
    }

    fn scan<F, E>(&mut self, cell: Cell, mut on_new: F) -> core::result::Result<CellReport, E>
    where
        F: FnMut(Discovery) -> core::result::Result<(), E>,
    {
        let mut samples: u128 = 0;
        let mut new_pairs = 0;
        for labels in cell.samples() {
            samples += 1;
            let pair = diversity_pair(&table(&labels));
            if self.seen.insert(pair) {
                new_pairs += 1;
                on_new(Discovery { cell, pair })?;
            }
        }
        Ok(CellReport {
            cell,
            samples,
            new_pairs,
        })
    }

    /// Run every cell, writing one line per discovery to `out`. `progress` sees each finished
    /// cell.
    ///
    /// # Errors
    ///
    /// - [`DiversityError::Invalid`] if the bounds fail [`SweepConfig::validate`].
    /// - [`DiversityError::Io`] on output failure.
    pub fn run<W, P>(&mut self, out: &mut W, mut progress: P) -> Result<SweepSummary>
    where
        W: Write,
        P: FnMut(&CellReport),
    {
        self.config.validate()?;
        let mut summary = SweepSummary::default();
        let cells: Vec<Cell> = self.config.cells().collect();
        for cell in cells {
            let report = self.scan_cell(cell, |d| {
                writeln!(out, "{d}")?;
                Ok(())
            })?;
            summary.cells += 1;
            summary.samples += report.samples;
            progress(&report);
        }
        out.flush()?;
        summary.discoveries = self.seen.len();
        Ok(summary)
    }
}

/// Run a fresh sweep over `config`, writing rows to `out`.
///
/// # Errors
///
/// Invalid bounds, or write failures on `out`.
pub fn run<W: Write>(config: SweepConfig, out: &mut W) -> Result<SweepSummary> {
    Sweep::new(config).run(out, |_| {})
}

/// Run a fresh sweep and collect the discoveries instead of printing them.
#[must_use]
pub fn collect(config: SweepConfig) -> Vec<Discovery> {
    let mut sweep = Sweep::new(config);
    let mut found = Vec::new();
    for cell in config.cells() {
        let scanned: core::result::Result<_, Infallible> = sweep.scan(cell, |d| {
            found.push(d);
            Ok(())
        });
        if let Err(never) = scanned {
            match never {}
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn small() -> SweepConfig {
        SweepConfig {
            max_n: 3,
            max_resp: 4,
        }
    }

    #[test]
    fn default_bounds() {
        let cfg = SweepConfig::default();
        assert_eq!(cfg.cells().count(), 14 * 16);
        let first = cfg.cells().next().unwrap();
        let last = cfg.cells().last().unwrap();
        assert_eq!((first.categories(), first.sample_len()), (2, 2));
        assert_eq!((last.categories(), last.sample_len()), (15, 17));
    }

    #[test]
    fn cells_are_n_major() {
        let cells: Vec<_> = SweepConfig {
            max_n: 1,
            max_resp: 1,
        }
        .cells()
        .map(|c| (c.n, c.resp))
        .collect();
        assert_eq!(cells, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn smallest_cell_yields_two_pairs() {
        let mut sweep = Sweep::new(SweepConfig::default());
        let mut found = Vec::new();
        let report = sweep
            .scan_cell(Cell { n: 0, resp: 0 }, |d| {
                found.push(d.pair);
                Ok(())
            })
            .unwrap();
        assert_eq!(report.samples, 3);
        assert_eq!(report.new_pairs, 2);
        assert_eq!(
            found,
            vec![
                DiversityPair {
                    shannon: 0.0,
                    simpson: 1.0
                },
                DiversityPair {
                    shannon: 2.0_f64.ln(),
                    simpson: 0.0
                },
            ]
        );
    }

    #[test]
    fn samples_are_sorted_multisets() {
        let cell = Cell { n: 2, resp: 1 };
        let samples: Vec<_> = cell.samples().collect();
        assert_eq!(samples.first(), Some(&vec![0, 0, 0]));
        assert_eq!(samples.last(), Some(&vec![3, 3, 3]));
        for s in &samples {
            assert_eq!(s.len(), 3);
            assert!(s.windows(2).all(|w| w[0] <= w[1]));
            assert!(s.iter().all(|&l| l < cell.categories()));
        }
        let mut sorted = samples.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, samples);
    }

    #[test]
    fn multiset_count_small_values() {
        assert_eq!(multiset_count(2, 2), Some(3));
        assert_eq!(multiset_count(3, 2), Some(6));
        assert_eq!(multiset_count(4, 3), Some(20));
        assert_eq!(multiset_count(0, 0), Some(1));
        assert_eq!(multiset_count(0, 3), Some(0));
        assert_eq!(multiset_count(5, 0), Some(1));
        // Largest default cell: C(31, 17).
        assert_eq!(multiset_count(15, 17), Some(265_182_525));
    }

    #[test]
    fn multiset_count_matches_enumeration() {
        for cell in small().cells() {
            assert_eq!(Some(cell.samples().count() as u128), cell.multiset_count());
        }
    }

    #[test]
    fn large_bounds_report_overflow_instead_of_panicking() {
        let cfg = SweepConfig {
            max_n: 100,
            max_resp: 100,
        };
        assert_eq!(cfg.total_samples(), None);
        assert_eq!(Cell { n: 100, resp: 100 }.multiset_count(), None);
        assert!(multiset_count(60, 60).is_some());
        assert!(matches!(cfg.validate(), Err(DiversityError::Invalid(_))));
    }

    #[test]
    fn extreme_cell_saturates() {
        let cell = Cell {
            n: usize::MAX,
            resp: usize::MAX - 1,
        };
        assert_eq!(cell.categories(), usize::MAX);
        assert_eq!(cell.sample_len(), usize::MAX);
        assert_eq!(cell.multiset_count(), None);
    }

    #[test]
    fn validate_rejects_overflowing_offsets() {
        for cfg in [
            SweepConfig {
                max_n: usize::MAX - 1,
                max_resp: 0,
            },
            SweepConfig {
                max_n: 0,
                max_resp: usize::MAX,
            },
        ] {
            assert!(matches!(cfg.validate(), Err(DiversityError::Invalid(_))));
        }
    }

    #[test]
    fn default_bounds_validate() {
        let cfg = SweepConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.total_samples().is_some());
        assert_eq!(Sweep::new(cfg).config(), &cfg);
    }

    #[test]
    fn run_rejects_invalid_bounds_before_writing() {
        let mut out = Vec::new();
        let err = run(
            SweepConfig {
                max_n: 100,
                max_resp: 100,
            },
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, DiversityError::Invalid(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn run_writes_one_line_per_discovery() {
        let mut out = Vec::new();
        let summary = run(
            SweepConfig {
                max_n: 0,
                max_resp: 1,
            },
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        let third = 1.0_f64 / 3.0;
        let h = -(third * third.ln() + (2.0 * third) * (2.0 * third).ln());
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "0 0 0 1");
        assert_eq!(lines[1], format!("0 0 {} 0", 2.0_f64.ln()));
        assert!(lines[2].starts_with("0 1 "));
        let fields: Vec<f64> = lines[2]
            .split_whitespace()
            .skip(2)
            .map(|f| f.parse().unwrap())
            .collect();
        assert!((fields[0] - h).abs() < 1e-15);
        assert!((fields[1] - third).abs() < 1e-15);
        assert_eq!(
            summary,
            SweepSummary {
                cells: 2,
                samples: 3 + 4,
                discoveries: 3,
            }
        );
    }

    #[test]
    fn progress_sees_every_cell() {
        let mut seen_cells = Vec::new();
        let mut sweep = Sweep::new(small());
        let summary = sweep
            .run(&mut std::io::sink(), |r| seen_cells.push(r.cell))
            .unwrap();
        assert_eq!(seen_cells, small().cells().collect::<Vec<_>>());
        assert_eq!(Some(summary.samples), small().total_samples());
        assert_eq!(summary.discoveries, sweep.discoveries().len());
    }

    #[test]
    fn collect_has_no_duplicate_pairs() {
        let found = collect(small());
        for (i, a) in found.iter().enumerate() {
            for b in &found[i + 1..] {
                assert_ne!(a.pair, b.pair);
            }
        }
    }

    #[test]
    fn exact_equality_caveat() {
        // Same distribution, labels permuted: the accumulation order differs for three or more
        // categories, so the pair can differ in the last bits. Exact comparison then keeps both.
        let a = diversity_pair(&[1, 2, 4]);
        let b = diversity_pair(&[4, 2, 1]);
        assert!((a.shannon - b.shannon).abs() < 1e-15);
        assert_eq!(a.simpson, b.simpson);
        let mut seen = Discoveries::new();
        seen.insert(a);
        assert_eq!(seen.insert(b), a != b);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]

        #[test]
        fn discoveries_are_reported_in_cell_order(max_n in 0usize..3, max_resp in 0usize..4) {
            let cfg = SweepConfig { max_n, max_resp };
            let found = collect(cfg);
            let order: Vec<_> = cfg.cells().collect();
            let pos = |c: &Cell| order.iter().position(|o| o == c).unwrap();
            for w in found.windows(2) {
                prop_assert!(pos(&w[0].cell) <= pos(&w[1].cell));
            }
            // The first cell always contributes the two extreme pairs.
            prop_assert!(found.len() >= 2);
        }

        #[test]
        fn every_pair_is_in_range(max_n in 0usize..3, max_resp in 0usize..4) {
            for d in collect(SweepConfig { max_n, max_resp }) {
                prop_assert!(d.pair.shannon >= 0.0);
                prop_assert!(d.pair.shannon <= (d.cell.categories() as f64).ln() + 1e-12);
                prop_assert!((0.0..=1.0).contains(&d.pair.simpson));
            }
        }
    }
}
