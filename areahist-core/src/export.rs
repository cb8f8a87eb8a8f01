use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use areahist_common::Result;
use serde_json::{json, Value};

use crate::aggregate::Histogram;

fn bin_rows(hist: &Histogram) -> Vec<Value> {
    hist.bins
        .iter()
        .zip(&hist.counts)
        .map(|(b, count)| {
            json!({
                "range_start": b.range_start,
                "range_end": b.range_end,
                "count": count,
                "area": b.area,
                "width": b.width(),
                "height": b.height(),
            })
        })
        .collect()
}

/// JSON document for a histogram. Non-finite numbers (undefined areas) become `null`.
pub fn histogram_json(hist: &Histogram) -> Value {
    json!({
        "placed": hist.placed,
        "unplaced": hist.unplaced,
        "total": hist.total,
        "bins": bin_rows(hist),
    })
}

pub fn export_json(output_path: &Path, hist: &Histogram) -> Result<()> {
    let mut file = std::fs::File::create(output_path)?;
    serde_json::to_writer_pretty(&mut file, &histogram_json(hist))?;
    Ok(())
}

pub fn write_csv<W: Write>(out: &mut W, hist: &Histogram) -> Result<()> {
    writeln!(out, "range_start,range_end,count,area,width,height")?;
    for (b, count) in hist.bins.iter().zip(&hist.counts) {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            b.range_start,
            b.range_end,
            count,
            b.area,
            b.width(),
            b.height()
        )?;
    }
    Ok(())
}

pub fn export_csv(output_path: &Path, hist: &Histogram) -> Result<()> {
    let mut file = std::fs::File::create(output_path)?;
    write_csv(&mut file, hist)
}

/// Plain-text table, one line per bin, bar length proportional to height.
pub fn render_table(hist: &Histogram, bar_width: usize) -> String {
    let max_h = hist
        .bins
        .iter()
        .map(|b| b.height())
        .filter(|h| h.is_finite())
        .fold(0.0_f64, f64::max);
    let mut out = String::new();
    for (b, count) in hist.bins.iter().zip(&hist.counts) {
        let h = b.height();
        let blen = if max_h > 0.0 && h.is_finite() && h > 0.0 {
            (h / max_h * bar_width as f64).round() as usize
        } else {
            0
        };
        let _ = writeln!(
            out,
            "{:>10.4} - {:<10.4} |{:<bw$}| {:>8} {:>8.4} {:>10.4}",
            b.range_start,
            b.range_end,
            "█".repeat(blen),
            count,
            b.area,
            h,
            bw = bar_width
        );
    }
    let _ = writeln!(
        out,
        "placed={} unplaced={} total={}",
        hist.placed, hist.unplaced, hist.total
    );
    out
}
