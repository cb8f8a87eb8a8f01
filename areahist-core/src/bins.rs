use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in data space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

impl DataPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Fill override for a single bin. `Automatic` defers to whoever renders the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinColor {
    #[default]
    Automatic,
    Rgba { r: u8, g: u8, b: u8, a: u8 },
}

impl BinColor {
    pub fn is_automatic(&self) -> bool {
        matches!(self, BinColor::Automatic)
    }
}

/// One histogram bin: a range of the sample domain and its share of the total mass.
///
/// Only the range and the area are stored; `width`, `height` and `value` are derived,
/// so the drawn rectangle always has exactly `area` as its area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub range_start: f64,
    pub range_end: f64,
    pub area: f64,
    #[serde(default, skip_serializing_if = "BinColor::is_automatic")]
    pub color: BinColor,
}

impl HistogramBin {
    pub fn new(range_start: f64, range_end: f64, area: f64) -> Self {
        Self {
            range_start,
            range_end,
            area,
            color: BinColor::Automatic,
        }
    }

    pub fn with_color(mut self, color: BinColor) -> Self {
        self.color = color;
        self
    }

    /// Negative when the range is given in descending order.
    pub fn width(&self) -> f64 {
        self.range_end - self.range_start
    }

    pub fn height(&self) -> f64 {
        self.area / self.width()
    }

    /// Same as [`height`](Self::height); used to color-code the rectangle.
    pub fn value(&self) -> f64 {
        self.height()
    }

    /// Whether `p` lies in the rectangle from the baseline up to `height`, edges included.
    ///
    /// Works for both ascending and descending ranges.
    pub fn contains(&self, p: DataPoint) -> bool {
        let in_y = p.y <= self.height() && p.y >= 0.0;
        let in_x = (p.x <= self.range_end && p.x >= self.range_start)
            || (p.x <= self.range_start && p.x >= self.range_end);
        in_x && in_y
    }
}

impl fmt::Display for HistogramBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.range_start, self.range_end, self.area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_geometry() {
        let b = HistogramBin::new(1.0, 3.0, 0.5);
        assert_eq!(b.width(), 2.0);
        assert_eq!(b.height(), 0.25);
        assert_eq!(b.value(), b.height());
    }

    #[test]
    fn descending_range_has_negative_width() {
        let b = HistogramBin::new(3.0, 1.0, 0.5);
        assert_eq!(b.width(), -2.0);
        assert_eq!(b.height(), -0.25);
    }

    #[test]
    fn contains_corners_ascending() {
        let b = HistogramBin::new(0.0, 2.0, 1.0); // height 0.5
        assert!(b.contains(DataPoint::new(0.0, 0.0)));
        assert!(b.contains(DataPoint::new(2.0, 0.0)));
        assert!(b.contains(DataPoint::new(0.0, 0.5)));
        assert!(b.contains(DataPoint::new(2.0, 0.5)));
        assert!(b.contains(DataPoint::new(1.0, 0.25)));
    }

    #[test]
    fn contains_rejects_outside_vertical_band() {
        let b = HistogramBin::new(0.0, 2.0, 1.0);
        assert!(!b.contains(DataPoint::new(1.0, 0.51)));
        assert!(!b.contains(DataPoint::new(1.0, -0.01)));
        assert!(!b.contains(DataPoint::new(2.01, 0.1)));
        assert!(!b.contains(DataPoint::new(-0.01, 0.1)));
    }

    #[test]
    fn contains_descending_range() {
        // reversed bounds with a negative area keep a positive height
        let b = HistogramBin::new(2.0, 0.0, -1.0);
        assert_eq!(b.height(), 0.5);
        assert!(b.contains(DataPoint::new(0.0, 0.0)));
        assert!(b.contains(DataPoint::new(2.0, 0.5)));
        assert!(b.contains(DataPoint::new(1.0, 0.3)));
        assert!(!b.contains(DataPoint::new(1.0, 0.6)));
        assert!(!b.contains(DataPoint::new(2.5, 0.1)));
    }

    #[test]
    fn negative_height_contains_nothing_above_zero() {
        let b = HistogramBin::new(2.0, 0.0, 1.0); // height -0.5
        assert!(!b.contains(DataPoint::new(1.0, 0.1)));
        assert!(!b.contains(DataPoint::new(1.0, -0.1)));
    }

    #[test]
    fn nan_area_contains_nothing() {
        let b = HistogramBin::new(0.0, 1.0, f64::NAN);
        assert!(!b.contains(DataPoint::new(0.5, 0.0)));
    }

    #[test]
    fn display_format() {
        assert_eq!(HistogramBin::new(0.0, 0.5, 0.25).to_string(), "0 0.5 0.25");
    }

    #[test]
    fn color_override_round_trips_json() {
        let b = HistogramBin::new(0.0, 1.0, 1.0).with_color(BinColor::Rgba {
            r: 255,
            g: 0,
            b: 0,
            a: 255,
        });
        let json = serde_json::to_string(&b).unwrap();
        let back: HistogramBin = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
        let plain = serde_json::to_string(&HistogramBin::new(0.0, 1.0, 1.0)).unwrap();
        assert!(!plain.contains("color"));
    }
}
