use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use time::Month;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthLabel {
    pub month: Month,
    pub year: i32,
}

impl MonthLabel {
    pub fn new(month: Month, year: i32) -> Self {
        Self { month, year }
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[usize::from(u8::from(self.month)) - 1]
    }

    pub fn parse_month_name(name: &str) -> Option<Month> {
        MONTH_NAMES
            .iter()
            .position(|candidate| *candidate == name)
            .map(|idx| MONTHS[idx])
    }
}

impl Serialize for MonthLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire {
            month_name: &'static str,
            year: i32,
        }

        Wire {
            month_name: self.month_name(),
            year: self.year,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MonthLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Wire {
            month_name: String,
            year: i32,
        }

        let wire = Wire::deserialize(deserializer)?;
        let month = Self::parse_month_name(&wire.month_name).ok_or_else(|| {
            de::Error::invalid_value(de::Unexpected::Str(&wire.month_name), &"a month name")
        })?;
        Ok(Self::new(month, wire.year))
    }
}

/// Derives the month label sequence of a billing year by calendar rollover.
///
/// `start_month` is 1-based and must already be validated to lie in 1..=12.
pub fn month_labels(start_month: u8, start_year: i32, num_months: u32) -> Vec<MonthLabel> {
    let first = u32::from(start_month.clamp(1, 12)) - 1;
    (0..num_months)
        .map(|i| {
            let offset = first.saturating_add(i);
            let month = MONTHS[(offset % 12) as usize];
            let year_offset = i32::try_from(offset / 12).unwrap_or(i32::MAX);
            MonthLabel::new(month, start_year.saturating_add(year_offset))
        })
        .collect()
}
