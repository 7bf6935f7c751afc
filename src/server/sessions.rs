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
use axum::extract::State;
use serde::Deserialize;

use crate::db::DocumentId;
use crate::db::SessionId;
use crate::server::ApiResult;
use crate::server::state::ServerState;
use crate::session::CloseOutcome;
use crate::session::StudySession;
use crate::session::close_session;
use crate::types::activity::ActivityType;
use crate::types::timestamp::Timestamp;

#[derive(Deserialize)]
pub struct StartSession {
    document_id: DocumentId,
    activity_type: String,
}

pub async fn start_session(
    State(state): State<ServerState>,
    Json(request): Json<StartSession>,
) -> ApiResult<StudySession> {
    let activity_type = ActivityType::try_from(request.activity_type)?;
    let document = state.db.get_document(request.document_id)?;
    let id = state
        .db
        .insert_session(document.id, activity_type, Timestamp::now())?;
    Ok(Json(state.db.get_session(id)?))
}

#[derive(Deserialize)]
pub struct EndSession {
    session_id: SessionId,
}

/// End a session. Calling this twice is fine: the second call returns the
/// state the first one persisted.
pub async fn end_session(
    State(state): State<ServerState>,
    Json(request): Json<EndSession>,
) -> ApiResult<StudySession> {
    let session = state.db.get_session(request.session_id)?;
    let (closed, outcome) = close_session(&session, Timestamp::now());
    if let CloseOutcome::ClockSkew = outcome {
        log::warn!(
            "session {} ended before it started, clamping duration to 0",
            closed.id
        );
    }
    if let CloseOutcome::AlreadyClosed = outcome {
        return Ok(Json(closed));
    }
    if state.db.close_session(&closed)? {
        Ok(Json(closed))
    } else {
        // Another request closed the session between the read and the
        // update. Return what that request persisted.
        Ok(Json(state.db.get_session(closed.id)?))
    }
}
