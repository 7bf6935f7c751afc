// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use chrono::Datelike;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::Weekday;
use serde::Serialize;
use serde::Serializer;

/// A local calendar day, the unit of streaks and history buckets.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Date(NaiveDate);

impl Date {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn into_inner(self) -> NaiveDate {
        self.0
    }

    pub fn prev_day(self) -> Self {
        Self(self.0 - Duration::days(1))
    }

    pub fn next_day(self) -> Self {
        Self(self.0 + Duration::days(1))
    }

    pub fn sub_days(self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    /// Three-letter weekday label ("Mon", "Tue", ...).
    pub fn weekday_label(self) -> &'static str {
        match self.0.weekday() {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        }
    }
}

impl Display for Date {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
pub fn date(year: i32, month: u32, day: u32) -> Date {
    Date::new(NaiveDate::from_ymd_opt(year, month, day).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_iso() {
        assert_eq!(date(2024, 1, 5).to_string(), "2024-01-05");
    }

    #[test]
    fn test_prev_day_crosses_month() {
        assert_eq!(date(2024, 3, 1).prev_day(), date(2024, 2, 29));
    }

    #[test]
    fn test_weekday_label() {
        // 2024-01-12 was a Friday.
        assert_eq!(date(2024, 1, 12).weekday_label(), "Fri");
    }
}
