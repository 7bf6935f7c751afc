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
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use serde::Deserialize;

use crate::db::CardId;
use crate::db::DocumentId;
use crate::db::Flashcard;
use crate::server::ApiResult;
use crate::server::state::ServerState;
use crate::srs::Grade;
use crate::srs::Scheduling;
use crate::srs::review;
use crate::types::timestamp::Timestamp;

#[derive(Deserialize)]
pub struct CreateCard {
    question: String,
    answer: String,
}

pub async fn create_card(
    State(state): State<ServerState>,
    Path(id): Path<DocumentId>,
    Json(request): Json<CreateCard>,
) -> ApiResult<Flashcard> {
    let document = state.db.get_document(id)?;
    let scheduling = Scheduling::initial(Timestamp::now());
    let card_id = state
        .db
        .add_card(document.id, &request.question, &request.answer, &scheduling)?;
    Ok(Json(state.db.get_card(card_id)?))
}

#[derive(Deserialize)]
pub struct DueParams {
    /// RFC 3339 reference instant; the server clock when omitted.
    now: Option<String>,
}

pub async fn due_cards(
    State(state): State<ServerState>,
    Query(params): Query<DueParams>,
) -> ApiResult<Vec<CardId>> {
    let now = match params.now {
        Some(s) => Timestamp::parse(&s)?,
        None => Timestamp::now(),
    };
    let mut due: Vec<CardId> = state.db.due_cards(now)?.into_iter().collect();
    due.sort_unstable();
    Ok(Json(due))
}

#[derive(Deserialize)]
pub struct GradeRequest {
    grade: i64,
}

/// Grade a card. Validation happens before any state moves; the scheduling
/// fields are then persisted as one unit.
pub async fn grade_review(
    State(state): State<ServerState>,
    Path(id): Path<CardId>,
    Json(request): Json<GradeRequest>,
) -> ApiResult<Scheduling> {
    let grade = Grade::new(request.grade)?;
    let card = state.db.get_card(id)?;
    let next = review(&card.scheduling, grade, Timestamp::now());
    state.db.update_card_scheduling(card.id, &next)?;
    log::debug!(
        "Card {id} graded {}: reps={} ef={:.2} interval={}d due={}",
        grade.value(),
        next.repetitions,
        next.ease_factor,
        next.interval_days,
        next.next_review
    );
    Ok(Json(next))
}
