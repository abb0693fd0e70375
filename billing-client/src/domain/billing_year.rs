use serde::{Deserialize, Serialize};

use super::meter::MeterRecord;
use super::metric::{Metric, MetricValue};
use super::month_label::{month_labels, MonthLabel};

/// Upper bound on `num_months`; a billing year never spans a century.
pub const MAX_NUM_MONTHS: u32 = 1200;

/// A billing year as imported: the calendar window plus one entry per billed
/// period. Month labels are derived from the window, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingYear {
    pub start_month: u8,
    pub start_year: i32,
    pub num_months: u32,
    pub billing_months: Vec<BillingMonth>,
}

/// One billing period covering the main and ADU meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingMonth {
    pub year: i32,
    pub month: u8,
    pub month_label: MonthLabel,
    pub main: MeterRecord,
    pub adu: MeterRecord,
}

impl BillingYear {
    pub fn months(&self) -> Vec<MonthLabel> {
        month_labels(self.start_month, self.start_year, self.num_months)
    }

    /// Structural invariants that hold for every accepted record. Returns one
    /// message per violation.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !(1..=12).contains(&self.start_month) {
            out.push(format!("start_month {} outside 1..=12", self.start_month));
        }
        if self.num_months == 0 || self.num_months > MAX_NUM_MONTHS {
            out.push(format!(
                "num_months {} outside 1..={MAX_NUM_MONTHS}",
                self.num_months
            ));
        }
        if self.billing_months.len() as u64 > u64::from(self.num_months) {
            out.push(format!(
                "{} billing months exceed num_months {}",
                self.billing_months.len(),
                self.num_months
            ));
        }
        for (i, bm) in self.billing_months.iter().enumerate() {
            if !(1..=12).contains(&bm.month) {
                out.push(format!("billing_months[{i}].month {} outside 1..=12", bm.month));
            }
            for (slot, meter) in [("main", &bm.main), ("adu", &bm.adu)] {
                for (field, value) in meter.metrics.iter() {
                    if !metric_is_finite(value) {
                        out.push(format!(
                            "billing_months[{i}].{slot}.{field} has a non-finite reading or sum"
                        ));
                    }
                }
            }
        }
        out
    }
}

fn metric_is_finite(value: &MetricValue) -> bool {
    match value {
        MetricValue::Simple(m) => m.is_finite(),
        MetricValue::TimeOfUse(t) => [&t.peak, &t.off_peak, &t.total]
            .into_iter()
            .all(Metric::is_finite),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MeterMetrics;
    use crate::schema::MeterType;
    use time::Month;

    fn meter(meter_type: MeterType) -> MeterRecord {
        MeterRecord {
            meter_type,
            billing_date: None,
            service_end_date: None,
            metrics: MeterMetrics::empty(),
        }
    }

    fn year(num_months: u32, billed: usize) -> BillingYear {
        BillingYear {
            start_month: 5,
            start_year: 2024,
            num_months,
            billing_months: (0..billed)
                .map(|_| BillingMonth {
                    year: 2024,
                    month: 5,
                    month_label: MonthLabel::new(Month::May, 2024),
                    main: meter(MeterType::Generation),
                    adu: meter(MeterType::Benefit),
                })
                .collect(),
        }
    }

    #[test]
    fn months_are_derived_from_window() {
        let by = year(2, 1);
        let labels: Vec<_> = by.months().iter().map(|l| l.month_name()).collect();
        assert_eq!(labels, vec!["May", "June"]);
    }

    #[test]
    fn fewer_billing_months_than_window_is_fine() {
        assert!(year(12, 3).invariant_violations().is_empty());
    }

    #[test]
    fn more_billing_months_than_window_is_rejected() {
        let v = year(1, 2).invariant_violations();
        assert_eq!(v.len(), 1);
        assert!(v[0].contains("exceed num_months"));
    }

    #[test]
    fn zero_window_is_rejected() {
        let v = year(0, 0).invariant_violations();
        assert!(v[0].contains("num_months 0"));
    }
}
