use areahist_common::{HistError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use tdigest::TDigest;

/// Outcome of a binary search over the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSearch {
    /// The value equals the edge at this index.
    Found(usize),
    /// No edge equals the value; it would be inserted at this index.
    NotFound(usize),
}

/// Largest bin count accepted by [`BinEdges::uniform`] and [`BinEdges::quantiles`].
pub const MAX_BIN_COUNT: usize = 1 << 24;

fn check_bin_count(bin_count: usize) -> Result<()> {
    if bin_count < 1 {
        return Err(HistError::invalid("bin count must be at least 1"));
    }
    if bin_count > MAX_BIN_COUNT {
        return Err(HistError::invalid(format!(
            "bin count {bin_count} exceeds the maximum of {MAX_BIN_COUNT}"
        )));
    }
    Ok(())
}

/// Strictly increasing bin boundaries. `len() == bin_count() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct BinEdges(Vec<f64>);

impl BinEdges {
    /// `bin_count + 1` equally spaced edges from `start` to `end`.
    pub fn uniform(start: f64, end: f64, bin_count: usize) -> Result<Self> {
        check_bin_count(bin_count)?;
        if !start.is_finite() || !end.is_finite() {
            return Err(HistError::invalid(format!(
                "range bounds must be finite, got {start}..{end}"
            )));
        }
        let step = (end - start) / bin_count as f64;
        if !step.is_finite() {
            return Err(HistError::invalid(format!(
                "range {start}..{end} is too wide to split into {bin_count} bins"
            )));
        }
        let breaks: Vec<f64> = (0..=bin_count).map(|i| start + step * i as f64).collect();
        Self::from_breaks(&breaks)
    }

    /// Resolve an arbitrary list of breaks: exact duplicates are dropped and the rest sorted.
    ///
    /// Duplicates collapse silently, so the resulting bin count can be lower than
    /// `breaks.len() - 1`.
    pub fn from_breaks(breaks: &[f64]) -> Result<Self> {
        if let Some(pos) = breaks.iter().position(|b| b.is_nan()) {
            return Err(HistError::invalid(format!("edge {pos} is NaN")));
        }
        let mut edges = breaks.to_vec();
        edges.sort_by(f64::total_cmp);
        // -0.0 and 0.0 are equal edges even though total_cmp orders them
        edges.dedup_by(|a, b| a == b);
        if edges.len() < 2 {
            return Err(HistError::invalid(format!(
                "need at least 2 distinct edges, got {}",
                edges.len()
            )));
        }
        if edges.len() != breaks.len() {
            debug!(
                "collapsed {} duplicate edge(s): {} breaks -> {} bins",
                breaks.len() - edges.len(),
                breaks.len(),
                edges.len() - 1
            );
        }
        Ok(Self(edges))
    }

    /// Equal-mass edges from t-digest estimates of the sample quantiles.
    ///
    /// Quantiles that coincide (heavily repeated values) collapse like any other
    /// duplicate break. The outermost edges are the exact sample minimum and maximum,
    /// so samples equal to the maximum sit on the last edge and are not placed.
    pub fn quantiles(samples: &[f64], bin_count: usize) -> Result<Self> {
        check_bin_count(bin_count)?;
        let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Err(HistError::invalid("quantile edges need at least one finite sample"));
        }
        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let digest = TDigest::new_with_size(100).merge_unsorted(finite);
        let mut breaks = Vec::with_capacity(bin_count + 1);
        breaks.push(min);
        for i in 1..bin_count {
            let q = digest.estimate_quantile(i as f64 / bin_count as f64);
            breaks.push(q.clamp(min, max));
        }
        breaks.push(max);
        Self::from_breaks(&breaks)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: a resolved sequence holds at least two edges.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bin_count(&self) -> usize {
        self.0.len() - 1
    }

    pub fn first(&self) -> f64 {
        self.0[0]
    }

    pub fn last(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Adjacent `(lower, upper)` pairs, one per bin.
    pub fn ranges(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.0.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn locate(&self, x: f64) -> EdgeSearch {
        match self.0.binary_search_by(|edge| edge.total_cmp(&x)) {
            Ok(i) => EdgeSearch::Found(i),
            // total_cmp separates -0.0 from 0.0; treat them as the same edge
            Err(i) if i < self.0.len() && self.0[i] == x => EdgeSearch::Found(i),
            Err(i) if i > 0 && self.0[i - 1] == x => EdgeSearch::Found(i - 1),
            Err(i) => EdgeSearch::NotFound(i),
        }
    }

    /// Bin index for `x`, left edge inclusive, right edge exclusive.
    ///
    /// A value equal to the last edge is not placed. NaN is never placed.
    pub fn bin_index(&self, x: f64) -> Option<usize> {
        if x.is_nan() {
            return None;
        }
        let bins = self.bin_count();
        match self.locate(x) {
            EdgeSearch::Found(i) => (i < bins).then_some(i),
            EdgeSearch::NotFound(0) => None,
            EdgeSearch::NotFound(insert) => {
                let i = insert - 1;
                (i < bins).then_some(i)
            }
        }
    }
}

impl TryFrom<Vec<f64>> for BinEdges {
    type Error = HistError;

    fn try_from(breaks: Vec<f64>) -> Result<Self> {
        Self::from_breaks(&breaks)
    }
}

impl From<BinEdges> for Vec<f64> {
    fn from(edges: BinEdges) -> Self {
        edges.0
    }
}
