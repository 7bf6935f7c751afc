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

//! Study session lifecycle: started once, ended at most once.

use serde::Serialize;

use crate::db::DocumentId;
use crate::db::SessionId;
use crate::types::activity::ActivityType;
use crate::types::timestamp::Timestamp;

/// One study activity against one document. `duration_seconds` is zero
/// until the session ends, then equals the floored span between start and
/// end.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct StudySession {
    pub id: SessionId,
    pub document_id: DocumentId,
    pub activity_type: ActivityType,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub duration_seconds: i64,
}

/// How a close request resolved.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CloseOutcome {
    /// The session was open and is now ended.
    Closed,
    /// The session was open, but the clock ran backwards between start and
    /// end. Duration is clamped to zero; callers should log this.
    ClockSkew,
    /// The session had already ended. The prior state is returned
    /// unchanged; this is not an error.
    AlreadyClosed,
}

/// End a session. Idempotent: a session that already has an end time comes
/// back untouched. Otherwise the end time is `now` and the duration is the
/// whole-second span since the start, clamped to zero under clock skew.
pub fn close_session(session: &StudySession, now: Timestamp) -> (StudySession, CloseOutcome) {
    if session.end_time.is_some() {
        return (*session, CloseOutcome::AlreadyClosed);
    }
    let elapsed = now.seconds_since(session.start_time);
    let (duration_seconds, outcome) = if elapsed < 0 {
        (0, CloseOutcome::ClockSkew)
    } else {
        (elapsed, CloseOutcome::Closed)
    };
    let closed = StudySession {
        end_time: Some(now),
        duration_seconds,
        ..*session
    };
    (closed, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_session(start: &str) -> StudySession {
        StudySession {
            id: 1,
            document_id: 1,
            activity_type: ActivityType::Flashcards,
            start_time: Timestamp::parse(start).unwrap(),
            end_time: None,
            duration_seconds: 0,
        }
    }

    #[test]
    fn test_close() {
        let session = open_session("2024-01-12T08:00:00Z");
        let now = Timestamp::parse("2024-01-12T08:30:15Z").unwrap();
        let (closed, outcome) = close_session(&session, now);
        assert_eq!(outcome, CloseOutcome::Closed);
        assert_eq!(closed.end_time, Some(now));
        assert_eq!(closed.duration_seconds, 30 * 60 + 15);
    }

    #[test]
    fn test_close_is_idempotent() {
        let session = open_session("2024-01-12T08:00:00Z");
        let now = Timestamp::parse("2024-01-12T09:00:00Z").unwrap();
        let (closed, _) = close_session(&session, now);
        let later = Timestamp::parse("2024-01-12T11:00:00Z").unwrap();
        let (again, outcome) = close_session(&closed, later);
        assert_eq!(outcome, CloseOutcome::AlreadyClosed);
        assert_eq!(again, closed);
        assert_eq!(again.duration_seconds, 3600);
    }

    #[test]
    fn test_clock_skew_clamps_to_zero() {
        let session = open_session("2024-01-12T08:00:00Z");
        let now = Timestamp::parse("2024-01-12T07:59:00Z").unwrap();
        let (closed, outcome) = close_session(&session, now);
        assert_eq!(outcome, CloseOutcome::ClockSkew);
        assert_eq!(closed.duration_seconds, 0);
        assert_eq!(closed.end_time, Some(now));
    }

    #[test]
    fn test_subsecond_span_floors_to_zero() {
        let session = open_session("2024-01-12T08:00:00Z");
        let now = Timestamp::parse("2024-01-12T08:00:00.900Z").unwrap();
        let (closed, outcome) = close_session(&session, now);
        assert_eq!(outcome, CloseOutcome::Closed);
        assert_eq!(closed.duration_seconds, 0);
    }
}
