//! Request and response bodies. All JSON is camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracksheet_core::models::Difficulty;
use tracksheet_core::models::auth::{Identity, Preferences, Profile, Role, SessionUser};
use tracksheet_core::models::problem::{Problem, ProblemSummary};
use tracksheet_core::models::sheet::{Sheet, SheetCategory, SheetDraft, SheetPatch, SheetProblem, SheetSettings};
use tracksheet_core::models::template::{
    PopulatedTemplateProblem, Template, TemplateDraft, TemplatePatch, TemplateProblem,
};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub identity_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialsLoginRequest {
    pub email: String,
    pub password: String,
}

/// Provider name is parsed by the handler so that an unknown provider is a 400.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FederatedLoginRequest {
    pub provider: String,
    pub assertion: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub session: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session: SessionUser,
}

/// Partial profile edit. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub timezone: Option<String>,
    pub preferences: Option<Preferences>,
}

impl ProfileUpdateRequest {
    pub fn merge_into(self, mut profile: Profile) -> Profile {
        if let Some(name) = self.name {
            profile.name = Some(name);
        }
        if let Some(avatar) = self.avatar {
            profile.avatar = Some(avatar);
        }
        if let Some(timezone) = self.timezone {
            profile.timezone = Some(timezone);
        }
        if let Some(preferences) = self.preferences {
            profile.preferences = preferences;
        }
        profile
    }
}

/// Identity as returned to clients. The password hash never leaves the store.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub reputation: i64,
    pub profile: Profile,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Identity> for IdentityView {
    fn from(i: Identity) -> Self {
        Self {
            id: i.id,
            email: i.email,
            username: i.username,
            role: i.role,
            is_active: i.is_active,
            reputation: i.reputation,
            profile: i.profile,
            last_login: i.last_login,
            created_at: i.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountUpdateRequest {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Sheets
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SheetListQuery {
    pub mine: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProblemInput {
    pub problem_id: Uuid,
    #[serde(default)]
    pub order: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSheetRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: SheetCategory,
    pub is_template: bool,
    pub is_public: bool,
    pub settings: SheetSettings,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    pub problems: Vec<SheetProblemInput>,
}

impl CreateSheetRequest {
    /// Problems start with fresh progress; a missing order takes the 1-based position.
    pub fn into_draft(self, now: DateTime<Utc>) -> SheetDraft {
        let problems = self
            .problems
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                let position = i32::try_from(i + 1).unwrap_or(i32::MAX);
                SheetProblem::fresh(p.problem_id, p.order.unwrap_or(position), now)
            })
            .collect();
        SheetDraft {
            name: self.name,
            description: self.description,
            category: self.category,
            is_template: self.is_template,
            is_public: self.is_public,
            settings: self.settings,
            tags: self.tags,
            difficulty: self.difficulty,
            problems,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSheetRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<SheetCategory>,
    pub is_public: Option<bool>,
    pub settings: Option<SheetSettings>,
    pub tags: Option<Vec<String>>,
    pub difficulty: Option<Difficulty>,
}

impl From<UpdateSheetRequest> for SheetPatch {
    fn from(r: UpdateSheetRequest) -> Self {
        Self {
            name: r.name,
            description: r.description,
            category: r.category,
            is_public: r.is_public,
            settings: r.settings,
            tags: r.tags,
            difficulty: r.difficulty,
        }
    }
}

/// A sheet with its derived fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetView {
    #[serde(flatten)]
    pub sheet: Sheet,
    pub popularity_score: f64,
    pub is_deadline_approaching: bool,
}

impl SheetView {
    pub fn new(sheet: Sheet, now: DateTime<Utc>) -> Self {
        Self {
            popularity_score: sheet.popularity_score(),
            is_deadline_approaching: sheet.is_deadline_approaching(now),
            sheet,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SheetResponse {
    pub sheet: SheetView,
}

#[derive(Debug, Serialize)]
pub struct SheetListResponse {
    pub sheets: Vec<SheetView>,
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TemplateListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TemplateSearchQuery {
    pub q: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub description: Option<String>,
    pub author: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub problems: Vec<TemplateProblem>,
    pub is_official: bool,
    pub is_public: bool,
}

impl CreateTemplateRequest {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.trim().is_empty()),
            ("author", self.author.trim().is_empty()),
            ("category", self.category.trim().is_empty()),
        ]
        .into_iter()
        .filter_map(|(field, missing)| missing.then_some(field))
        .collect()
    }
}

impl From<CreateTemplateRequest> for TemplateDraft {
    fn from(r: CreateTemplateRequest) -> Self {
        Self {
            name: r.name.trim().to_string(),
            description: r.description,
            author: r.author.trim().to_string(),
            category: r.category.trim().to_string(),
            difficulty: r.difficulty,
            problems: r.problems,
            is_official: r.is_official,
            is_public: r.is_public,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub is_public: Option<bool>,
}

impl From<UpdateTemplateRequest> for TemplatePatch {
    fn from(r: UpdateTemplateRequest) -> Self {
        Self {
            name: r.name,
            description: r.description,
            author: r.author,
            category: r.category,
            difficulty: r.difficulty,
            is_public: r.is_public,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddTemplateProblemsRequest {
    pub problems: Vec<TemplateProblem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateView {
    #[serde(flatten)]
    pub template: Template,
    pub problem_count: usize,
}

impl From<Template> for TemplateView {
    fn from(template: Template) -> Self {
        Self {
            problem_count: template.problem_count(),
            template,
        }
    }
}

/// A template with each entry joined to its catalog problem.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDetail {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub author: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub is_official: bool,
    pub is_public: bool,
    pub owner_id: Option<Uuid>,
    pub problem_count: usize,
    pub problems: Vec<PopulatedTemplateProblem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TemplateDetail {
    pub fn new(template: Template, problems: Vec<PopulatedTemplateProblem>) -> Self {
        Self {
            id: template.id,
            name: template.name,
            description: template.description,
            author: template.author,
            category: template.category,
            difficulty: template.difficulty,
            is_official: template.is_official,
            is_public: template.is_public,
            owner_id: template.owner_id,
            problem_count: problems.len(),
            problems,
            created_at: template.created_at,
            updated_at: template.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TemplateResponse<T> {
    pub template: T,
}

#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<TemplateView>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

// ---------------------------------------------------------------------------
// Problems
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProblemListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    /// Comma-separated.
    pub tags: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProblemListResponse {
    pub problems: Vec<ProblemSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ProblemResponse {
    pub problem: Problem,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_round_up() {
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).pages, 1);
        assert_eq!(Pagination::new(1, 10, 11).pages, 2);
    }

    #[test]
    fn sheet_problems_default_to_position_order() {
        let body: CreateSheetRequest = serde_json::from_value(serde_json::json!({
            "name": "Graphs",
            "problems": [
                { "problemId": Uuid::nil() },
                { "problemId": Uuid::now_v7(), "order": 7 }
            ]
        }))
        .unwrap();
        let draft = body.into_draft(Utc::now());
        let orders: Vec<i32> = draft.problems.iter().map(|p| p.order).collect();
        assert_eq!(orders, vec![1, 7]);
    }

    #[test]
    fn profile_update_keeps_absent_fields() {
        let stored = Profile::seeded(Some("Ada"), Some("a.png"));
        let merged = ProfileUpdateRequest {
            timezone: Some("Europe/London".into()),
            ..Default::default()
        }
        .merge_into(stored);
        assert_eq!(merged.name.as_deref(), Some("Ada"));
        assert_eq!(merged.avatar.as_deref(), Some("a.png"));
        assert_eq!(merged.timezone.as_deref(), Some("Europe/London"));
    }

    #[test]
    fn template_missing_fields_are_named() {
        let req = CreateTemplateRequest {
            name: "Blind 75".into(),
            ..Default::default()
        };
        assert_eq!(req.missing_fields(), vec!["author", "category"]);
    }
}
