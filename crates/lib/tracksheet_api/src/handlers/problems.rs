//! Problem catalog handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use tracksheet_core::models::Difficulty;
use tracksheet_core::models::problem::{ProblemDraft, ProblemFilter, ProblemPatch, ProblemSummary};
use tracksheet_core::services::problems::{self, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

use super::parse_id;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::session::Session;
use crate::models::{Pagination, ProblemListQuery, ProblemListResponse, ProblemResponse};

impl ProblemListQuery {
    fn into_filter(self) -> AppResult<ProblemFilter> {
        let difficulty = self
            .difficulty
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::parse::<Difficulty>)
            .transpose()
            .map_err(AppError::Validation)?;
        let tags = self
            .tags
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Ok(ProblemFilter {
            difficulty,
            category: self.category.filter(|c| !c.trim().is_empty()),
            tags,
            page: self.page.unwrap_or(1).max(1),
            limit: self
                .limit
                .filter(|l| *l > 0)
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .min(MAX_PAGE_LIMIT),
        })
    }
}

/// `GET /problems`: paginated active problems without editorial or hints.
pub async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<ProblemListQuery>,
) -> AppResult<Json<ProblemListResponse>> {
    let filter = query.into_filter()?;
    let (page, limit) = (filter.page, filter.limit);
    let found = problems::list(state.store.as_ref(), filter).await?;
    Ok(Json(ProblemListResponse {
        pagination: Pagination::new(page, limit, found.total),
        problems: found.problems.into_iter().map(ProblemSummary::from).collect(),
    }))
}

/// `GET /problems/{id}`: by id or by slug.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> AppResult<Json<ProblemResponse>> {
    let problem = problems::get(state.store.as_ref(), &id_or_slug).await?;
    Ok(Json(ProblemResponse { problem }))
}

/// `POST /problems`: admin only.
pub async fn create_handler(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ProblemDraft>,
) -> AppResult<(StatusCode, Json<ProblemResponse>)> {
    let problem = problems::create(state.store.as_ref(), session.claims(), body, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(ProblemResponse { problem })))
}

/// `PUT /problems/{id}`: admin only.
pub async fn update_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(body): Json<ProblemPatch>,
) -> AppResult<Json<ProblemResponse>> {
    let id = parse_id(&id, "problem")?;
    let problem =
        problems::update(state.store.as_ref(), session.claims(), id, body, Utc::now()).await?;
    Ok(Json(ProblemResponse { problem }))
}

/// `DELETE /problems/{id}`: admin only; returns the removed problem.
pub async fn delete_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Json<ProblemResponse>> {
    let id = parse_id(&id, "problem")?;
    let problem = problems::delete(state.store.as_ref(), session.claims(), id).await?;
    Ok(Json(ProblemResponse { problem }))
}
