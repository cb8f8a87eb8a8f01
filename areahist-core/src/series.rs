use crate::aggregate::Histogram;
use crate::bins::{DataPoint, HistogramBin};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A point in display space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned display rectangle, normalized so `width` and `height` are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn from_corners(a: ScreenPoint, b: ScreenPoint) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }
}

/// Mapping between data space and display space, supplied by the renderer.
pub trait DisplayTransform {
    fn transform(&self, p: DataPoint) -> ScreenPoint;
    fn inverse_transform(&self, s: ScreenPoint) -> DataPoint;
}

/// Linear mapping of a data window onto a screen window.
///
/// With `x_vertical` the data x axis runs along the screen's vertical direction,
/// which is how horizontal histograms are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTransform {
    pub data_min: DataPoint,
    pub data_max: DataPoint,
    pub screen_min: ScreenPoint,
    pub screen_max: ScreenPoint,
    pub x_vertical: bool,
}

impl LinearTransform {
    fn scale(v: f64, from_min: f64, from_max: f64, to_min: f64, to_max: f64) -> f64 {
        to_min + (v - from_min) / (from_max - from_min) * (to_max - to_min)
    }

    fn orientate(&self, s: ScreenPoint) -> ScreenPoint {
        if self.x_vertical {
            ScreenPoint::new(s.y, s.x)
        } else {
            s
        }
    }
}

impl DisplayTransform for LinearTransform {
    fn transform(&self, p: DataPoint) -> ScreenPoint {
        let s = ScreenPoint::new(
            Self::scale(p.x, self.data_min.x, self.data_max.x, self.screen_min.x, self.screen_max.x),
            Self::scale(p.y, self.data_min.y, self.data_max.y, self.screen_min.y, self.screen_max.y),
        );
        self.orientate(s)
    }

    fn inverse_transform(&self, s: ScreenPoint) -> DataPoint {
        let s = self.orientate(s);
        DataPoint::new(
            Self::scale(s.x, self.screen_min.x, self.screen_max.x, self.data_min.x, self.data_max.x),
            Self::scale(s.y, self.screen_min.y, self.screen_max.y, self.data_min.y, self.data_max.y),
        )
    }
}

/// Bounds of a series in data space. The y range always includes the 0 baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_value: f64,
    pub max_value: f64,
}

impl Extent {
    pub fn contains(&self, p: DataPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Result of a hit test against a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerHit {
    pub index: usize,
    pub data_point: DataPoint,
    pub screen_point: ScreenPoint,
    pub area: f64,
}

/// Bins as handed to a renderer, either owned or borrowed from the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries<'a> {
    items: Cow<'a, [HistogramBin]>,
}

impl<'a> HistogramSeries<'a> {
    /// Zero-copy view over caller-owned bins.
    pub fn borrowed(items: &'a [HistogramBin]) -> Self {
        Self {
            items: Cow::Borrowed(items),
        }
    }

    pub fn owned(items: Vec<HistogramBin>) -> HistogramSeries<'static> {
        HistogramSeries {
            items: Cow::Owned(items),
        }
    }

    pub fn items(&self) -> &[HistogramBin] {
        &self.items
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self.items, Cow::Borrowed(_))
    }

    /// Mutable access; a borrowed view is copied first.
    pub fn items_mut(&mut self) -> &mut Vec<HistogramBin> {
        self.items.to_mut()
    }

    pub fn into_owned(self) -> HistogramSeries<'static> {
        HistogramSeries::owned(self.items.into_owned())
    }

    /// `None` for an empty series.
    pub fn extent(&self) -> Option<Extent> {
        let first = self.items.first()?;
        let init = Extent {
            min_x: first.range_start.min(first.range_end),
            max_x: first.range_start.max(first.range_end),
            min_y: first.height().min(0.0),
            max_y: first.height().max(0.0),
            min_value: first.value(),
            max_value: first.value(),
        };
        Some(self.items.iter().skip(1).fold(init, |e, b| Extent {
            min_x: e.min_x.min(b.range_start).min(b.range_end),
            max_x: e.max_x.max(b.range_start).max(b.range_end),
            min_y: e.min_y.min(b.height()),
            max_y: e.max_y.max(b.height()),
            min_value: e.min_value.min(b.value()),
            max_value: e.max_value.max(b.value()),
        }))
    }

    /// Rectangle from `(range_start, 0)` to `(range_end, height)` for every bin.
    pub fn screen_rects<T: DisplayTransform + ?Sized>(&self, transform: &T) -> Vec<ScreenRect> {
        self.items
            .iter()
            .map(|b| {
                let a = transform.transform(DataPoint::new(b.range_start, 0.0));
                let c = transform.transform(DataPoint::new(b.range_end, b.height()));
                ScreenRect::from_corners(a, c)
            })
            .collect()
    }

    /// First bin containing the screen point, if the point is within the series extent.
    pub fn nearest_hit<T: DisplayTransform + ?Sized>(
        &self,
        transform: &T,
        point: ScreenPoint,
    ) -> Option<TrackerHit> {
        let p = transform.inverse_transform(point);
        if !self.extent()?.contains(p) {
            return None;
        }
        self.items
            .iter()
            .position(|b| b.contains(p))
            .map(|index| TrackerHit {
                index,
                data_point: p,
                screen_point: point,
                area: self.items[index].area,
            })
    }
}

impl From<Histogram> for HistogramSeries<'static> {
    fn from(h: Histogram) -> Self {
        HistogramSeries::owned(h.bins)
    }
}

impl<'a> From<&'a Histogram> for HistogramSeries<'a> {
    fn from(h: &'a Histogram) -> Self {
        HistogramSeries::borrowed(&h.bins)
    }
}
