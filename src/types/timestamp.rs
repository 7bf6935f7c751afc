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

use chrono::DateTime;
use chrono::Duration;
use chrono::NaiveDateTime;
use chrono::Utc;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::error::Fallible;

/// A UTC instant. Every timestamp in the system is one of these; local-time
/// interpretation only happens through an explicit zone conversion.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(ts: DateTime<Utc>) -> Self {
        Self(ts)
    }

    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parse an RFC 3339 timestamp. A timestamp without a zone designator is
    /// taken to be UTC rather than rejected: the store boundary normalizes,
    /// it never assumes an ambient default zone.
    pub fn parse(s: &str) -> Fallible<Self> {
        match DateTime::parse_from_rfc3339(s) {
            Ok(ts) => Ok(Self(ts.with_timezone(&Utc))),
            Err(_) => {
                let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")?;
                Ok(Self(DateTime::from_naive_utc_and_offset(naive, Utc)))
            }
        }
    }

    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }

    pub fn add_days(self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Whole seconds elapsed since `earlier`. Negative if `earlier` is in
    /// the future, truncated toward zero.
    pub fn seconds_since(self, earlier: Timestamp) -> i64 {
        self.0.signed_duration_since(earlier.0).num_seconds()
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let str = self.0.to_rfc3339();
        Ok(ToSqlOutput::from(str))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        let ts =
            DateTime::parse_from_rfc3339(&string).map_err(|e| FromSqlError::Other(Box::new(e)))?;
        let ts = ts.with_timezone(&Utc);
        Ok(Timestamp(ts))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        Timestamp::parse(&string).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_zoned() -> Fallible<()> {
        let ts = Timestamp::parse("2024-01-10T12:30:00+02:00")?;
        assert_eq!(ts.to_string(), "2024-01-10T10:30:00+00:00");
        Ok(())
    }

    #[test]
    fn test_parse_naive_assumes_utc() -> Fallible<()> {
        let ts = Timestamp::parse("2024-01-10T12:30:00")?;
        assert_eq!(ts.to_string(), "2024-01-10T12:30:00+00:00");
        Ok(())
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Timestamp::parse("yesterday-ish").is_err());
    }

    #[test]
    fn test_seconds_since_truncates() -> Fallible<()> {
        let a = Timestamp::parse("2024-01-10T00:00:00Z")?;
        let b = Timestamp::parse("2024-01-10T00:01:30.900Z")?;
        assert_eq!(b.seconds_since(a), 90);
        assert_eq!(a.seconds_since(b), -90);
        Ok(())
    }

    #[test]
    fn test_add_days() -> Fallible<()> {
        let a = Timestamp::parse("2024-01-10T06:00:00Z")?;
        assert_eq!(a.add_days(6).to_string(), "2024-01-16T06:00:00+00:00");
        Ok(())
    }
}
