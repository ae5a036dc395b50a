use anyhow::{Result, bail};
use std::{cell::OnceCell, collections::BTreeMap};

/// Sum each contiguous, non-overlapping block of `tau` raw samples.
///
/// Built from an exclusive prefix-sum pass, so every window is an exact
/// integer sum. Trailing samples that do not fill a window are dropped;
/// `tau` greater than the sequence length yields an empty sequence.
/// `tau` must be at least 1.
pub fn group_by_tau(raw: &[i64], tau: usize) -> Vec<i64> {
    debug_assert!(tau >= 1);

    let mut prefix = Vec::with_capacity(raw.len() + 1);
    let mut sum = 0;
    prefix.push(sum);
    for &count in raw {
        sum += count;
        prefix.push(sum);
    }

    let n_windows = raw.len() / tau;
    (0..n_windows)
        .map(|i_win| prefix[(i_win + 1) * tau] - prefix[i_win * tau])
        .collect()
}

/// Windowed pulse-count series for one window size.
///
/// Construction stores the grouped sequence; every derived statistic is
/// computed on first access and cached.
pub struct TauSeries {
    tau: usize,
    raw_len: usize,
    grouped: Vec<i64>,

    mean: OnceCell<f64>,
    dispersion: OnceCell<f64>,
    counts: OnceCell<BTreeMap<i64, usize>>,
}

impl TauSeries {
    pub fn new(raw: &[i64], tau: usize) -> Result<Self> {
        if tau < 1 {
            bail!("window size must be at least 1");
        }

        Ok(Self {
            tau,
            raw_len: raw.len(),
            grouped: group_by_tau(raw, tau),
            mean: OnceCell::new(),
            dispersion: OnceCell::new(),
            counts: OnceCell::new(),
        })
    }

    pub fn tau(&self) -> usize {
        self.tau
    }

    pub fn grouped(&self) -> &[i64] {
        &self.grouped
    }

    /// Mean of the grouped sequence.
    ///
    /// # Errors
    /// Fails when the window size exceeds the raw sequence length and no
    /// complete window remains.
    pub fn mean(&self) -> Result<f64> {
        if self.grouped.is_empty() {
            bail!(
                "tau = {} leaves no complete windows (raw length {})",
                self.tau,
                self.raw_len
            );
        }
        Ok(*self.mean.get_or_init(|| {
            self.grouped.iter().sum::<i64>() as f64 / self.grouped.len() as f64
        }))
    }

    /// Population standard deviation of the grouped sequence.
    pub fn dispersion(&self) -> Result<f64> {
        let mean = self.mean()?;
        Ok(*self.dispersion.get_or_init(|| {
            let diff_2_sum: f64 = self
                .grouped
                .iter()
                .map(|&val| (val as f64 - mean).powi(2))
                .sum();
            (diff_2_sum / self.grouped.len() as f64).sqrt()
        }))
    }

    /// Standard error of the mean, normalized by the raw sequence length.
    pub fn std_error(&self) -> Result<f64> {
        Ok(self.dispersion()? / (self.raw_len as f64).sqrt())
    }

    pub fn counts(&self) -> &BTreeMap<i64, usize> {
        self.counts.get_or_init(|| {
            let mut counts = BTreeMap::new();
            for &val in &self.grouped {
                *counts.entry(val).or_insert(0) += 1;
            }
            counts
        })
    }

    /// Empirical probability mass of each distinct grouped value.
    pub fn frequencies(&self) -> BTreeMap<i64, f64> {
        let n_vals = self.grouped.len();
        self.counts()
            .iter()
            .map(|(&val, &count)| (val, count as f64 / n_vals as f64))
            .collect()
    }

    /// Fraction of grouped values strictly within `sigmas` dispersions of the mean.
    pub fn sigma_inclusion(&self, sigmas: f64) -> Result<f64> {
        let mean = self.mean()?;
        let dispersion = self.dispersion()?;

        let n_within = self
            .grouped
            .iter()
            .filter(|&&val| (val as f64 - mean).abs() < dispersion * sigmas)
            .count();
        Ok(n_within as f64 / self.grouped.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn windows_are_block_sums() {
        assert_eq!(group_by_tau(&[1, 2, 3, 4, 5, 6], 2), vec![3, 7, 11]);
        assert_eq!(group_by_tau(&[1, 2, 3, 4, 5, 6], 3), vec![6, 15]);
    }

    #[test]
    fn tau_one_is_the_identity_window() {
        let raw = [4, 0, 7, 7, 2];
        assert_eq!(group_by_tau(&raw, 1), raw.to_vec());
    }

    #[test]
    fn trailing_partial_window_is_dropped() {
        let raw = [1, 2, 3, 4, 5, 6, 7];
        let grouped = group_by_tau(&raw, 3);

        assert_eq!(grouped.len(), raw.len() / 3);
        let kept: i64 = raw[..6].iter().sum();
        assert_eq!(grouped.iter().sum::<i64>(), kept);
    }

    #[test]
    fn tau_beyond_length_yields_empty() {
        assert!(group_by_tau(&[5], 2).is_empty());
    }

    #[test]
    fn zero_tau_is_rejected() {
        assert!(TauSeries::new(&[1, 2, 3], 0).is_err());
    }

    #[test]
    fn mean_and_dispersion_of_worked_example() {
        let series = TauSeries::new(&[1, 2, 3, 4, 5, 6], 2).unwrap();

        assert_eq!(series.grouped(), &[3, 7, 11]);
        assert!((series.mean().unwrap() - 7.0).abs() < TOL);
        assert!((series.dispersion().unwrap() - (32.0f64 / 3.0).sqrt()).abs() < TOL);
    }

    #[test]
    fn std_error_is_normalized_by_raw_length() {
        let series = TauSeries::new(&[1, 2, 3, 4, 5, 6], 2).unwrap();

        let expected = (32.0f64 / 3.0).sqrt() / 6.0f64.sqrt();
        assert!((series.std_error().unwrap() - expected).abs() < TOL);
    }

    #[test]
    fn empty_series_surfaces_a_defined_error() {
        let series = TauSeries::new(&[5], 2).unwrap();

        assert!(series.grouped().is_empty());
        assert!(series.mean().is_err());
        assert!(series.dispersion().is_err());
        assert!(series.std_error().is_err());
        assert!(series.sigma_inclusion(1.0).is_err());
    }

    #[test]
    fn counts_tally_distinct_values() {
        let series = TauSeries::new(&[3, 3, 5, 3], 1).unwrap();

        let counts = series.counts();
        assert_eq!(counts.get(&3), Some(&3));
        assert_eq!(counts.get(&5), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn frequencies_sum_to_one() {
        let series = TauSeries::new(&[2, 4, 4, 6, 8, 2, 4], 1).unwrap();

        let total: f64 = series.frequencies().values().sum();
        assert!((total - 1.0).abs() < TOL);
    }

    #[test]
    fn sigma_inclusion_is_non_decreasing() {
        let series = TauSeries::new(&[1, 2, 2, 3, 3, 3, 9, 15], 1).unwrap();

        let mut prev = 0.0;
        for sigmas in [0.5, 1.0, 2.0, 3.0] {
            let inclusion = series.sigma_inclusion(sigmas).unwrap();
            assert!(inclusion >= prev);
            prev = inclusion;
        }
    }
}
