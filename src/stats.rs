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

//! Study activity analytics: streaks and daily time buckets.
//!
//! Everything here is pure over the session records and an injected clock
//! and zone. The zone is always the caller's: the streak and the histogram
//! share one notion of "today".

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::DateTime;
use chrono::Duration;
use chrono::FixedOffset;
use chrono::Utc;
use serde::Serialize;

use crate::session::StudySession;
use crate::types::activity::ActivityType;
use crate::types::date::Date;
use crate::types::timestamp::Timestamp;

/// Number of buckets in the daily history.
pub const HISTORY_DAYS: usize = 7;

/// Offsets beyond this are nonsense (real zones span UTC-12 to UTC+14).
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// A fixed UTC offset standing in for the caller's timezone.
///
/// Constructed from minutes *west* of UTC, the convention of the
/// JavaScript `Date.getTimezoneOffset()` value browsers send (positive
/// when local time is behind UTC).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LocalZone(FixedOffset);

impl LocalZone {
    pub fn utc() -> Self {
        Self(FixedOffset::east_opt(0).unwrap())
    }

    /// Build a zone from a client-supplied offset. An offset outside the
    /// plausible range fails closed to UTC: a wrong-but-real date beats a
    /// nonsensical streak.
    pub fn from_minutes_west(minutes: i32) -> Self {
        // Range test instead of abs(): abs() overflows on i32::MIN.
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&minutes) {
            log::warn!("implausible timezone offset {minutes}min, falling back to UTC");
            return Self::utc();
        }
        match FixedOffset::west_opt(minutes * 60) {
            Some(offset) => Self(offset),
            None => Self::utc(),
        }
    }

    /// The local calendar date this instant falls on.
    pub fn local_date(&self, ts: Timestamp) -> Date {
        Date::new(ts.into_inner().with_timezone(&self.0).date_naive())
    }

    /// The UTC instant of local midnight opening `date`. With a fixed
    /// offset this is plain arithmetic; there are no DST gaps to resolve.
    pub fn day_start_utc(&self, date: Date) -> Timestamp {
        let midnight = date.into_inner().and_hms_opt(0, 0, 0).unwrap();
        let utc = midnight - Duration::seconds(self.0.local_minus_utc() as i64);
        Timestamp::new(DateTime::from_naive_utc_and_offset(utc, Utc))
    }
}

/// Consecutive local calendar days with at least one session, anchored at
/// `today`. A streak survives one not-yet-studied day: the most recent
/// study date may be today or yesterday. Anything older breaks it.
pub fn streak(starts: &[Timestamp], today: Date, zone: &LocalZone) -> u32 {
    let dates: BTreeSet<Date> = starts.iter().map(|ts| zone.local_date(*ts)).collect();
    let latest = match dates.iter().next_back() {
        Some(latest) => *latest,
        None => return 0,
    };
    // Multiple sessions on one date collapse into one set entry, so the
    // walk below steps one calendar day at a time.
    let mut required = if latest == today {
        today.prev_day()
    } else if latest == today.prev_day() {
        today.sub_days(2)
    } else {
        return 0;
    };
    let mut streak = 1;
    for date in dates.iter().rev().skip(1) {
        if *date == required {
            streak += 1;
            required = required.prev_day();
        } else {
            break;
        }
    }
    streak
}

/// One day of study history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: Date,
    #[serde(rename = "name")]
    pub label: &'static str,
    pub minutes: i64,
}

/// Total study minutes for each of the last `n_days` local days, oldest
/// first, today included.
///
/// Each bucket is the UTC image of a local midnight-to-midnight window.
/// Sessions are assigned by comparing their UTC start against the converted
/// window boundaries, not by converting each session independently, so the
/// buckets tile the timeline with no gaps or overlaps.
pub fn daily_histogram(
    sessions: &[(Timestamp, i64)],
    today: Date,
    n_days: usize,
    zone: &LocalZone,
) -> Vec<DayBucket> {
    let mut buckets = Vec::with_capacity(n_days);
    for i in (0..n_days).rev() {
        let day = today.sub_days(i as i64);
        let window_start = zone.day_start_utc(day);
        let window_end = zone.day_start_utc(day.next_day());
        let seconds: i64 = sessions
            .iter()
            .filter(|(start, _)| *start >= window_start && *start < window_end)
            .map(|(_, duration)| *duration)
            .sum();
        buckets.push(DayBucket {
            date: day,
            label: day.weekday_label(),
            minutes: seconds / 60,
        });
    }
    buckets
}

/// The payload of `GET /api/analytics/stats`.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub total_minutes: i64,
    pub activity_breakdown: BTreeMap<ActivityType, i64>,
    pub current_streak: u32,
    pub daily_history: Vec<DayBucket>,
}

/// Assemble the full report from every recorded session.
pub fn build_report(sessions: &[StudySession], now: Timestamp, zone: &LocalZone) -> StatsReport {
    let total_seconds: i64 = sessions.iter().map(|s| s.duration_seconds).sum();
    let mut activity_breakdown: BTreeMap<ActivityType, i64> = BTreeMap::new();
    for session in sessions {
        *activity_breakdown.entry(session.activity_type).or_insert(0) += 1;
    }
    let today = zone.local_date(now);
    let starts: Vec<Timestamp> = sessions.iter().map(|s| s.start_time).collect();
    let spans: Vec<(Timestamp, i64)> = sessions
        .iter()
        .map(|s| (s.start_time, s.duration_seconds))
        .collect();
    StatsReport {
        total_minutes: total_seconds / 60,
        activity_breakdown,
        current_streak: streak(&starts, today, zone),
        daily_history: daily_histogram(&spans, today, HISTORY_DAYS, zone),
    }
}
