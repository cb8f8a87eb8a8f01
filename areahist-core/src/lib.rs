pub mod aggregate;
pub mod bins;
pub mod edges;
pub mod export;
pub mod series;
pub mod source;

pub use aggregate::{aggregate, aggregate_par, collect, collect_uniform, Histogram};
pub use areahist_common::{HistError, Result};
pub use bins::{BinColor, DataPoint, HistogramBin};
pub use edges::{BinEdges, EdgeSearch, MAX_BIN_COUNT};
pub use export::{export_csv, export_json, histogram_json, render_table, write_csv};
pub use series::{
    DisplayTransform, Extent, HistogramSeries, LinearTransform, ScreenPoint, ScreenRect,
    TrackerHit,
};
pub use source::{
    demo_samples, is_parquet, parse_samples, read_parquet_column, read_samples,
    read_text_samples, resolve_inputs,
};
