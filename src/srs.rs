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

//! The SM-2 review scheduler.
//!
//! A pure function from a card's scheduling state and a grade to the next
//! scheduling state. The clock is a parameter: nothing in here reads the
//! wall clock.

use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

/// The floor below which the ease factor never drops.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// The ease factor assigned to a card that has never been reviewed.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// A review grade on the SM-2 scale: 0-2 is a lapse, 3 is hard, 4 is good,
/// 5 is easy.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Grade(u8);

impl Grade {
    pub fn new(value: i64) -> Fallible<Self> {
        if (0..=5).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ErrorReport::invalid_argument(format!(
                "grade must be in [0, 5], got {value}"
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn passing(self) -> bool {
        self.0 >= 3
    }
}

/// A card's scheduling state. The four fields form one unit: they are read
/// together, updated together, and persisted together.
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct Scheduling {
    /// Consecutive passing reviews since the last lapse.
    pub repetitions: u32,
    /// Difficulty multiplier, never below [`MIN_EASE_FACTOR`].
    pub ease_factor: f64,
    /// Days until the next scheduled review.
    pub interval_days: u32,
    /// When the card becomes due.
    pub next_review: Timestamp,
}

impl Scheduling {
    /// The state of a freshly created card: no history, due immediately.
    pub fn initial(now: Timestamp) -> Self {
        Self {
            repetitions: 0,
            ease_factor: INITIAL_EASE_FACTOR,
            interval_days: 0,
            next_review: now,
        }
    }
}

/// Apply one SM-2 review.
///
/// A passing grade grows the interval (1 day, then 6, then the previous
/// interval scaled by the ease factor, truncated). A failing grade resets
/// repetitions and schedules the card for tomorrow. The ease factor moves in
/// both branches, from its pre-update value, and is clamped to the floor.
pub fn review(state: &Scheduling, grade: Grade, now: Timestamp) -> Scheduling {
    let (repetitions, interval_days) = if grade.passing() {
        let interval_days = match state.repetitions {
            0 => 1,
            1 => 6,
            _ => (state.interval_days as f64 * state.ease_factor) as u32,
        };
        (state.repetitions + 1, interval_days)
    } else {
        (0, 1)
    };
    let q = grade.value() as f64;
    let ease_factor = state.ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
    let ease_factor = ease_factor.max(MIN_EASE_FACTOR);
    Scheduling {
        repetitions,
        ease_factor,
        interval_days,
        next_review: now.add_days(interval_days as i64),
    }
}
