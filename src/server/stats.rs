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

use axum::Json;
use axum::extract::Query;
use axum::extract::State;
use serde::Deserialize;

use crate::server::ApiResult;
use crate::server::state::ServerState;
use crate::stats::LocalZone;
use crate::stats::StatsReport;
use crate::stats::build_report;
use crate::types::timestamp::Timestamp;

#[derive(Deserialize)]
pub struct StatsParams {
    /// Minutes west of UTC, as reported by `Date.getTimezoneOffset()`.
    #[serde(default)]
    timezone_offset: i32,
}

/// Study statistics, computed in the caller's timezone. The same zone
/// drives the streak and the daily history.
pub async fn get_stats(
    State(state): State<ServerState>,
    Query(params): Query<StatsParams>,
) -> ApiResult<StatsReport> {
    let zone = LocalZone::from_minutes_west(params.timezone_offset);
    let sessions = state.db.all_sessions()?;
    Ok(Json(build_report(&sessions, Timestamp::now(), &zone)))
}
