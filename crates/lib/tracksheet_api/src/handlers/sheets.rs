//! Sheet handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use tracksheet_core::models::sheet::ProgressUpdate;
use tracksheet_core::services::sheets;

use super::parse_id;
use crate::AppState;
use crate::error::AppResult;
use crate::extract::Json;
use crate::middleware::session::Session;
use crate::models::{
    CreateSheetRequest, MessageResponse, SheetListQuery, SheetListResponse, SheetResponse,
    SheetView, UpdateSheetRequest,
};

/// `GET /sheets`: public sheets plus the caller's own; `?mine=true` for own only.
pub async fn list_handler(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SheetListQuery>,
) -> AppResult<Json<SheetListResponse>> {
    let found = sheets::list(state.store.as_ref(), session.claims(), query.mine).await?;
    let now = Utc::now();
    Ok(Json(SheetListResponse {
        sheets: found.into_iter().map(|s| SheetView::new(s, now)).collect(),
    }))
}

/// `POST /sheets`
pub async fn create_handler(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CreateSheetRequest>,
) -> AppResult<(StatusCode, Json<SheetResponse>)> {
    let now = Utc::now();
    let sheet = sheets::create(state.store.as_ref(), session.claims(), body.into_draft(now), now)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SheetResponse {
            sheet: SheetView::new(sheet, now),
        }),
    ))
}

/// `GET /sheets/{id}`
pub async fn get_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Json<SheetResponse>> {
    let id = parse_id(&id, "sheet")?;
    let sheet = sheets::get(state.store.as_ref(), session.claims(), id).await?;
    Ok(Json(SheetResponse {
        sheet: SheetView::new(sheet, Utc::now()),
    }))
}

/// `PUT /sheets/{id}`
pub async fn update_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(body): Json<UpdateSheetRequest>,
) -> AppResult<Json<SheetResponse>> {
    let id = parse_id(&id, "sheet")?;
    let now = Utc::now();
    let sheet = sheets::update(state.store.as_ref(), session.claims(), id, body.into(), now).await?;
    Ok(Json(SheetResponse {
        sheet: SheetView::new(sheet, now),
    }))
}

/// `DELETE /sheets/{id}`
pub async fn delete_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id, "sheet")?;
    sheets::delete(state.store.as_ref(), session.claims(), id).await?;
    Ok(Json(MessageResponse::new("Sheet deleted successfully")))
}

/// `POST /sheets/{id}/duplicate`
pub async fn duplicate_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<SheetResponse>)> {
    let id = parse_id(&id, "sheet")?;
    let now = Utc::now();
    let copy = sheets::duplicate(state.store.as_ref(), session.claims(), id, now).await?;
    Ok((
        StatusCode::CREATED,
        Json(SheetResponse {
            sheet: SheetView::new(copy, now),
        }),
    ))
}

/// `PATCH /sheets/{id}/problems/{problem_id}`: record progress on one problem.
pub async fn update_progress_handler(
    State(state): State<AppState>,
    session: Session,
    Path((id, problem_id)): Path<(String, String)>,
    Json(body): Json<ProgressUpdate>,
) -> AppResult<Json<SheetResponse>> {
    let id = parse_id(&id, "sheet")?;
    let problem_id = parse_id(&problem_id, "problem")?;
    let now = Utc::now();
    let sheet = sheets::update_progress(
        state.store.as_ref(),
        session.claims(),
        id,
        problem_id,
        body,
        now,
    )
    .await?;
    Ok(Json(SheetResponse {
        sheet: SheetView::new(sheet, now),
    }))
}
