//! Domain types for MacroDash

pub mod indicator;
pub mod period;
pub mod series;

pub use indicator::{default_indicators, Indicator, SourceKind};
pub use period::{month_end, Period, UnknownPeriod};
pub use series::{GrowthSeries, MomentumSeries, Series};
