pub mod billing_year;
pub mod meter;
pub mod metric;
pub mod month_label;

pub use billing_year::{BillingMonth, BillingYear};
pub use meter::{MeterMetrics, MeterRecord};
pub use metric::{Metric, MetricValue, TouMetric};
pub use month_label::{month_labels, MonthLabel, MONTH_NAMES};
