use crate::bins::HistogramBin;
use crate::edges::BinEdges;
use areahist_common::{HistError, Result};
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

const PAR_CHUNK: usize = 64 * 1024;

/// Result of one aggregation: the bins plus the tallies behind their areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    pub counts: Vec<u64>,
    pub placed: u64,
    pub unplaced: u64,
    pub total: u64, // normalization denominator
}

impl Histogram {
    pub fn bins(&self) -> &[HistogramBin] {
        &self.bins
    }

    pub fn into_bins(self) -> Vec<HistogramBin> {
        self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// False when nothing counted towards the total, in which case every area is NaN.
    pub fn is_defined(&self) -> bool {
        self.total > 0
    }

    /// Turn the NaN-area case into [`HistError::UndefinedResult`].
    pub fn require_defined(self) -> Result<Self> {
        if self.is_defined() {
            Ok(self)
        } else {
            Err(HistError::UndefinedResult {
                bins: self.bins.len(),
            })
        }
    }

    pub fn area_sum(&self) -> f64 {
        self.bins.iter().map(|b| b.area).sum()
    }
}

/// Per-bin counters for one pass over the samples.
struct BinCounter<'e> {
    edges: &'e BinEdges,
    counts: Vec<u64>,
    placed: u64,
    unplaced: u64,
}

impl<'e> BinCounter<'e> {
    fn new(edges: &'e BinEdges) -> Self {
        Self {
            edges,
            counts: vec![0; edges.bin_count()],
            placed: 0,
            unplaced: 0,
        }
    }

    fn add(&mut self, x: f64) {
        match self.edges.bin_index(x) {
            Some(i) => {
                self.counts[i] += 1;
                self.placed += 1;
            }
            None => self.unplaced += 1,
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for (c, o) in self.counts.iter_mut().zip(&other.counts) {
            *c += o;
        }
        self.placed += other.placed;
        self.unplaced += other.unplaced;
        self
    }

    fn finish(self, count_unplaced: bool) -> Histogram {
        let total = if count_unplaced {
            self.placed + self.unplaced
        } else {
            self.placed
        };
        if total == 0 {
            warn!(
                "no samples counted towards the total; {} bin areas are NaN",
                self.counts.len()
            );
        }
        let bins = self
            .edges
            .ranges()
            .zip(&self.counts)
            .map(|((start, end), &count)| {
                let area = if total == 0 {
                    f64::NAN
                } else {
                    count as f64 / total as f64
                };
                HistogramBin::new(start, end, area)
            })
            .collect();
        debug!(
            "aggregated {} bins: placed={} unplaced={} total={}",
            self.counts.len(),
            self.placed,
            self.unplaced,
            total
        );
        Histogram {
            bins,
            counts: self.counts,
            placed: self.placed,
            unplaced: self.unplaced,
            total,
        }
    }
}

/// Bin `samples` into `edges`, one bin per adjacent edge pair.
///
/// Each bin's area is its count divided by the total. The total counts placed samples
/// only, or every sample when `count_unplaced` is set. An empty total gives NaN areas.
pub fn aggregate<I>(samples: I, edges: &BinEdges, count_unplaced: bool) -> Histogram
where
    I: IntoIterator<Item = f64>,
{
    let mut counter = BinCounter::new(edges);
    for x in samples {
        counter.add(x);
    }
    counter.finish(count_unplaced)
}

/// Same result as [`aggregate`], counting chunks of the slice on the rayon pool.
pub fn aggregate_par(samples: &[f64], edges: &BinEdges, count_unplaced: bool) -> Histogram {
    samples
        .par_chunks(PAR_CHUNK)
        .map(|chunk| {
            let mut counter = BinCounter::new(edges);
            for &x in chunk {
                counter.add(x);
            }
            counter
        })
        .reduce(|| BinCounter::new(edges), BinCounter::merge)
        .finish(count_unplaced)
}

/// Bin into `bin_count` equal-width bins spanning `start..end`.
pub fn collect_uniform<I>(
    samples: I,
    start: f64,
    end: f64,
    bin_count: usize,
    count_unplaced: bool,
) -> Result<Histogram>
where
    I: IntoIterator<Item = f64>,
{
    let edges = BinEdges::uniform(start, end, bin_count)?;
    Ok(aggregate(samples, &edges, count_unplaced))
}

/// Bin into caller-supplied breaks. Duplicate breaks collapse before binning.
pub fn collect<I>(samples: I, breaks: &[f64], count_unplaced: bool) -> Result<Histogram>
where
    I: IntoIterator<Item = f64>,
{
    if breaks.len() < 2 {
        return Err(HistError::invalid(format!(
            "need at least 2 edges, got {}",
            breaks.len()
        )));
    }
    let edges = BinEdges::from_breaks(breaks)?;
    Ok(aggregate(samples, &edges, count_unplaced))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn areas(h: &Histogram) -> Vec<f64> {
        h.bins.iter().map(|b| b.area).collect()
    }

    #[test]
    fn one_bin_per_edge_pair() {
        let h = collect(vec![0.5, 1.5], &[0.0, 1.0, 3.0, 7.0], true).unwrap();
        assert_eq!(h.len(), 3);
        let ranges: Vec<(f64, f64)> = h.bins.iter().map(|b| (b.range_start, b.range_end)).collect();
        assert_eq!(ranges, vec![(0.0, 1.0), (1.0, 3.0), (3.0, 7.0)]);
        assert!(h.bins.iter().all(|b| b.range_end > b.range_start));
    }

    #[test]
    fn placed_only_normalization() {
        let h = collect_uniform(vec![0.0, 0.5, 0.5, 1.0], 0.0, 1.0, 2, false).unwrap();
        assert_eq!(h.placed, 3);
        assert_eq!(h.unplaced, 1);
        assert_eq!(h.total, 3);
        assert_eq!(h.counts, vec![1, 2]);
        assert!((h.bins[0].area - 1.0 / 3.0).abs() < 1e-12);
        assert!((h.bins[1].area - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn count_unplaced_includes_outliers_in_total() {
        let h = collect_uniform(vec![0.0, 0.5, 0.5, 1.0], 0.0, 1.0, 2, true).unwrap();
        assert_eq!(h.total, 4);
        assert_eq!(areas(&h), vec![0.25, 0.5]);
        assert!((h.area_sum() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn areas_sum_to_one_when_everything_placed() {
        let samples: Vec<f64> = (0..1000).map(|i| i as f64 / 1000.0).collect();
        let h = collect(samples, &[0.0, 0.02, 0.05, 0.1, 0.2, 0.4, 0.6, 0.8, 1.0], true).unwrap();
        assert_eq!(h.unplaced, 0);
        assert!((h.area_sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn interior_edge_goes_right_last_edge_dropped() {
        let h = collect(vec![1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], false).unwrap();
        assert_eq!(h.counts, vec![1, 1]);
        assert_eq!(h.unplaced, 1);
    }

    #[test]
    fn empty_samples_give_nan_areas() {
        let h = collect_uniform(Vec::new(), 0.0, 1.0, 4, true).unwrap();
        assert_eq!(h.len(), 4);
        assert!(h.bins.iter().all(|b| b.area.is_nan()));
        assert!(!h.is_defined());
        assert!(matches!(
            h.require_defined(),
            Err(HistError::UndefinedResult { bins: 4 })
        ));
    }

    #[test]
    fn all_unplaced_without_counting_is_undefined() {
        let h = collect_uniform(vec![-1.0, 5.0], 0.0, 1.0, 2, false).unwrap();
        assert_eq!(h.total, 0);
        assert!(h.bins.iter().all(|b| b.area.is_nan()));
        let h = collect_uniform(vec![-1.0, 5.0], 0.0, 1.0, 2, true).unwrap();
        assert_eq!(areas(&h), vec![0.0, 0.0]);
    }

    #[test]
    fn nan_samples_are_unplaced() {
        let h = collect_uniform(vec![f64::NAN, 0.1], 0.0, 1.0, 1, true).unwrap();
        assert_eq!(h.placed, 1);
        assert_eq!(h.unplaced, 1);
        assert_eq!(areas(&h), vec![0.5]);
    }

    #[test]
    fn duplicate_breaks_reduce_bin_count() {
        let h = collect(vec![0.5, 1.5, 2.5], &[0.0, 0.0, 1.0, 2.0, 2.0, 3.0], true).unwrap();
        assert_eq!(h.len(), 3);
        assert_eq!(h.counts, vec![1, 1, 1]);
    }

    #[test]
    fn collect_rejects_short_break_lists() {
        assert!(matches!(
            collect(vec![1.0], &[0.0], true),
            Err(HistError::InvalidArgument(_))
        ));
        assert!(matches!(
            collect(vec![1.0], &[2.0, 2.0], true),
            Err(HistError::InvalidArgument(_))
        ));
        assert!(collect_uniform(vec![1.0], 0.0, 1.0, 0, true).is_err());
    }

    #[test]
    fn height_is_density() {
        let h = collect(vec![0.5, 1.5, 2.5, 3.5], &[0.0, 1.0, 4.0], true).unwrap();
        assert!((h.bins[0].height() - 0.25).abs() < 1e-12);
        assert!((h.bins[1].height() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn parallel_matches_sequential() {
        let samples: Vec<f64> = (0..200_003)
            .map(|i| ((i * 7919) % 10_007) as f64 / 10_007.0 * 1.2 - 0.1)
            .collect();
        let edges = BinEdges::from_breaks(&[0.0, 0.1, 0.25, 0.5, 0.9, 1.0]).unwrap();
        for count_unplaced in [true, false] {
            let seq = aggregate(samples.iter().copied(), &edges, count_unplaced);
            let par = aggregate_par(&samples, &edges, count_unplaced);
            assert_eq!(seq, par);
        }
    }

    #[test]
    fn parallel_empty_slice() {
        let edges = BinEdges::uniform(0.0, 1.0, 3).unwrap();
        let h = aggregate_par(&[], &edges, true);
        assert_eq!(h.counts, vec![0, 0, 0]);
        assert!(!h.is_defined());
    }
}
