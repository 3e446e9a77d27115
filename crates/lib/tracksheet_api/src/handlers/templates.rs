//! Template handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use tracksheet_core::services::templates;

use super::parse_id;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::session::Session;
use crate::models::{
    AddTemplateProblemsRequest, CategoriesResponse, CreateTemplateRequest, MessageResponse,
    SheetResponse, SheetView, TemplateDetail, TemplateListQuery, TemplateListResponse,
    TemplateResponse, TemplateSearchQuery, TemplateView, UpdateTemplateRequest,
};

fn views(found: Vec<tracksheet_core::models::template::Template>) -> Json<TemplateListResponse> {
    Json(TemplateListResponse {
        templates: found.into_iter().map(TemplateView::from).collect(),
    })
}

/// `GET /templates`: official templates, with optional `q` and `category`.
pub async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<TemplateListQuery>,
) -> AppResult<Json<TemplateListResponse>> {
    let found = templates::list_official(
        state.store.as_ref(),
        query.q.as_deref(),
        query.category.as_deref(),
    )
    .await?;
    Ok(views(found))
}

/// `GET /templates/search?q=`
pub async fn search_handler(
    State(state): State<AppState>,
    Query(query): Query<TemplateSearchQuery>,
) -> AppResult<Json<TemplateListResponse>> {
    Ok(views(templates::search(state.store.as_ref(), &query.q).await?))
}

/// `GET /templates/categories`
pub async fn categories_handler(
    State(state): State<AppState>,
) -> AppResult<Json<CategoriesResponse>> {
    let categories = templates::categories(state.store.as_ref()).await?;
    Ok(Json(CategoriesResponse { categories }))
}

/// `GET /templates/mine`
pub async fn mine_handler(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<TemplateListResponse>> {
    Ok(views(
        templates::list_mine(state.store.as_ref(), session.claims()).await?,
    ))
}

/// `POST /templates`
pub async fn create_handler(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CreateTemplateRequest>,
) -> AppResult<(StatusCode, Json<TemplateResponse<TemplateView>>)> {
    let missing = body.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }
    let template =
        templates::create(state.store.as_ref(), session.claims(), body.into(), Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(TemplateResponse {
            template: template.into(),
        }),
    ))
}

/// `GET /templates/{id}`: template with its problems joined.
pub async fn get_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Json<TemplateResponse<TemplateDetail>>> {
    let id = parse_id(&id, "template")?;
    let (template, problems) =
        templates::get_populated(state.store.as_ref(), session.claims(), id).await?;
    Ok(Json(TemplateResponse {
        template: TemplateDetail::new(template, problems),
    }))
}

/// `PUT /templates/{id}`
pub async fn update_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(body): Json<UpdateTemplateRequest>,
) -> AppResult<Json<TemplateResponse<TemplateView>>> {
    let id = parse_id(&id, "template")?;
    let template = templates::update(
        state.store.as_ref(),
        session.claims(),
        id,
        body.into(),
        Utc::now(),
    )
    .await?;
    Ok(Json(TemplateResponse {
        template: template.into(),
    }))
}

/// `DELETE /templates/{id}`
pub async fn delete_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id, "template")?;
    templates::delete(state.store.as_ref(), session.claims(), id).await?;
    Ok(Json(MessageResponse::new("Template deleted successfully")))
}

/// `PATCH /templates/{id}/problems`: append problems not already present.
pub async fn add_problems_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(body): Json<AddTemplateProblemsRequest>,
) -> AppResult<Json<TemplateResponse<TemplateView>>> {
    let id = parse_id(&id, "template")?;
    let template = templates::add_problems(
        state.store.as_ref(),
        session.claims(),
        id,
        body.problems,
        Utc::now(),
    )
    .await?;
    Ok(Json(TemplateResponse {
        template: template.into(),
    }))
}

/// `DELETE /templates/{id}/problems/{problem_id}`
pub async fn remove_problem_handler(
    State(state): State<AppState>,
    session: Session,
    Path((id, problem_id)): Path<(String, String)>,
) -> AppResult<Json<TemplateResponse<TemplateView>>> {
    let id = parse_id(&id, "template")?;
    let problem_id = parse_id(&problem_id, "problem")?;
    let template = templates::remove_problem(
        state.store.as_ref(),
        session.claims(),
        id,
        problem_id,
        Utc::now(),
    )
    .await?;
    Ok(Json(TemplateResponse {
        template: template.into(),
    }))
}

/// `POST /templates/{id}/create-sheet`: instantiate a private sheet for the caller.
pub async fn create_sheet_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<SheetResponse>)> {
    let id = parse_id(&id, "template")?;
    let now = Utc::now();
    let sheet = templates::create_sheet(state.store.as_ref(), session.claims(), id, now).await?;
    Ok((
        StatusCode::CREATED,
        Json(SheetResponse {
            sheet: SheetView::new(sheet, now),
        }),
    ))
}
