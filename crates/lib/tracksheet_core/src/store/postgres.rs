//! PostgreSQL store.
//!
//! Nested documents (profile, settings, sheet problems) live in JSONB columns;
//! enums are stored as their canonical text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{
    IdentityStore, ProblemStore, SheetStore, StoreError, StoreResult, TemplateStore, Upserted,
};
use crate::models::auth::{Identity, NewIdentity, Profile, Role, SocialSettings};
use crate::models::problem::{PlatformLinks, Problem, ProblemExample, ProblemFilter, ProblemPage};
use crate::models::sheet::{Sheet, SheetProblem, SheetSettings, Social};
use crate::models::template::{Template, TemplateProblem};

const USER_COLUMNS: &str = "id, email, email_verified, username, password_hash, role, is_active, \
     reputation, profile, social_settings, last_login, created_at, updated_at";

const SHEET_COLUMNS: &str = "id, owner_id, name, description, category, is_template, is_public, \
     settings, social, tags, difficulty, problems, created_at, updated_at";

const TEMPLATE_COLUMNS: &str = "id, name, description, author, category, difficulty, problems, \
     is_official, is_public, owner_id, created_at, updated_at";

const PROBLEM_COLUMNS: &str = "id, title, slug, description, difficulty, category, tags, \
     companies, platform_links, editorial, hints, constraint_text, examples, total_attempts, \
     total_solved, average_rating, is_active, created_at, updated_at";

/// Store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn corrupt(what: &str, detail: String) -> StoreError {
    StoreError::Internal(format!("corrupt {what} row: {detail}"))
}

/// `%needle%` for `ILIKE ... ESCAPE '\'`, with the needle matched literally.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    email_verified: Option<DateTime<Utc>>,
    username: Option<String>,
    password_hash: Option<String>,
    role: String,
    is_active: bool,
    reputation: i64,
    profile: Json<Profile>,
    social_settings: Json<SocialSettings>,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for Identity {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Identity {
            id: row.id,
            email: row.email,
            email_verified: row.email_verified,
            username: row.username,
            password_hash: row.password_hash,
            role: row.role.parse().map_err(|e| corrupt("user", e))?,
            is_active: row.is_active,
            reputation: row.reputation,
            profile: row.profile.0,
            social_settings: row.social_settings.0,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SheetRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    description: Option<String>,
    category: String,
    is_template: bool,
    is_public: bool,
    settings: Json<SheetSettings>,
    social: Json<Social>,
    tags: Vec<String>,
    difficulty: String,
    problems: Json<Vec<SheetProblem>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SheetRow> for Sheet {
    type Error = StoreError;

    fn try_from(row: SheetRow) -> Result<Self, Self::Error> {
        Ok(Sheet {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            description: row.description,
            category: row.category.parse().map_err(|e| corrupt("sheet", e))?,
            is_template: row.is_template,
            is_public: row.is_public,
            settings: row.settings.0,
            social: row.social.0,
            tags: row.tags,
            difficulty: row.difficulty.parse().map_err(|e| corrupt("sheet", e))?,
            problems: row.problems.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    author: String,
    category: String,
    difficulty: String,
    problems: Json<Vec<TemplateProblem>>,
    is_official: bool,
    is_public: bool,
    owner_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TemplateRow> for Template {
    type Error = StoreError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        Ok(Template {
            id: row.id,
            name: row.name,
            description: row.description,
            author: row.author,
            category: row.category,
            difficulty: row.difficulty.parse().map_err(|e| corrupt("template", e))?,
            problems: row.problems.0,
            is_official: row.is_official,
            is_public: row.is_public,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProblemRow {
    id: Uuid,
    title: String,
    slug: String,
    description: String,
    difficulty: String,
    category: String,
    tags: Vec<String>,
    companies: Vec<String>,
    platform_links: Json<PlatformLinks>,
    editorial: Option<String>,
    hints: Vec<String>,
    constraint_text: Option<String>,
    examples: Json<Vec<ProblemExample>>,
    total_attempts: i64,
    total_solved: i64,
    average_rating: f64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProblemRow> for Problem {
    type Error = StoreError;

    fn try_from(row: ProblemRow) -> Result<Self, Self::Error> {
        Ok(Problem {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            difficulty: row.difficulty.parse().map_err(|e| corrupt("problem", e))?,
            category: row.category,
            tags: row.tags,
            companies: row.companies,
            platform_links: row.platform_links.0,
            editorial: row.editorial,
            hints: row.hints,
            constraints: row.constraint_text,
            examples: row.examples.0,
            total_attempts: row.total_attempts,
            total_solved: row.total_solved,
            average_rating: row.average_rating,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_identity_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Identity::try_from).transpose()
    }

    async fn find_identity_by_id(&self, id: Uuid) -> StoreResult<Option<Identity>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Identity::try_from).transpose()
    }

    async fn insert_identity(&self, identity: NewIdentity) -> StoreResult<Identity> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, email_verified, username, password_hash, role,
                               is_active, reputation, profile, social_settings, last_login)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&identity.email)
        .bind(identity.email_verified)
        .bind(&identity.username)
        .bind(&identity.password_hash)
        .bind(identity.role.as_str())
        .bind(identity.is_active)
        .bind(identity.reputation)
        .bind(Json(&identity.profile))
        .bind(Json(&identity.social_settings))
        .bind(identity.last_login)
        .fetch_one(&self.pool)
        .await?;
        Identity::try_from(row)
    }

    async fn insert_identity_if_absent(&self, identity: NewIdentity) -> StoreResult<Upserted> {
        let inserted = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, email_verified, username, password_hash, role,
                               is_active, reputation, profile, social_settings, last_login)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&identity.email)
        .bind(identity.email_verified)
        .bind(&identity.username)
        .bind(&identity.password_hash)
        .bind(identity.role.as_str())
        .bind(identity.is_active)
        .bind(identity.reputation)
        .bind(Json(&identity.profile))
        .bind(Json(&identity.social_settings))
        .bind(identity.last_login)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(Upserted::Created(Identity::try_from(row)?));
        }
        // Lost the race: the winner's row is committed, so read it back.
        self.find_identity_by_email(&identity.email)
            .await?
            .map(Upserted::Existing)
            .ok_or_else(|| {
                StoreError::Internal(format!("identity for {} vanished", identity.email))
            })
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<Option<Identity>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET last_login = $2, updated_at = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Identity::try_from).transpose()
    }

    async fn update_profile(&self, id: Uuid, profile: Profile) -> StoreResult<Option<Identity>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET profile = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(Json(&profile))
        .fetch_optional(&self.pool)
        .await?;
        row.map(Identity::try_from).transpose()
    }

    async fn update_account(
        &self,
        id: Uuid,
        role: Option<Role>,
        is_active: Option<bool>,
    ) -> StoreResult<Option<Identity>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET role = COALESCE($2, role),
                is_active = COALESCE($3, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(role.map(|r| r.as_str()))
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Identity::try_from).transpose()
    }
}

#[async_trait]
impl SheetStore for PgStore {
    async fn get_sheet(&self, id: Uuid) -> StoreResult<Option<Sheet>> {
        let row = sqlx::query_as::<_, SheetRow>(&format!(
            "SELECT {SHEET_COLUMNS} FROM sheets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Sheet::try_from).transpose()
    }

    async fn list_sheets(
        &self,
        owner_id: Option<Uuid>,
        include_public: bool,
    ) -> StoreResult<Vec<Sheet>> {
        let rows = sqlx::query_as::<_, SheetRow>(&format!(
            r#"
            SELECT {SHEET_COLUMNS}
            FROM sheets
            WHERE owner_id = $1 OR ($2 AND is_public)
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .bind(include_public)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn insert_sheet(&self, sheet: &Sheet) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sheets (id, owner_id, name, description, category, is_template, is_public,
                                settings, social, tags, difficulty, problems, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(sheet.id)
        .bind(sheet.owner_id)
        .bind(&sheet.name)
        .bind(&sheet.description)
        .bind(sheet.category.as_str())
        .bind(sheet.is_template)
        .bind(sheet.is_public)
        .bind(Json(&sheet.settings))
        .bind(Json(&sheet.social))
        .bind(&sheet.tags)
        .bind(sheet.difficulty.as_str())
        .bind(Json(&sheet.problems))
        .bind(sheet.created_at)
        .bind(sheet.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_sheet(&self, sheet: &Sheet) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sheets
            SET name = $2, description = $3, category = $4, is_template = $5, is_public = $6,
                settings = $7, social = $8, tags = $9, difficulty = $10, problems = $11,
                updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(sheet.id)
        .bind(&sheet.name)
        .bind(&sheet.description)
        .bind(sheet.category.as_str())
        .bind(sheet.is_template)
        .bind(sheet.is_public)
        .bind(Json(&sheet.settings))
        .bind(Json(&sheet.social))
        .bind(&sheet.tags)
        .bind(sheet.difficulty.as_str())
        .bind(Json(&sheet.problems))
        .bind(sheet.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_sheet(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM sheets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TemplateStore for PgStore {
    async fn get_template(&self, id: Uuid) -> StoreResult<Option<Template>> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Template::try_from).transpose()
    }

    async fn list_official_templates(
        &self,
        query: Option<&str>,
        category: Option<&str>,
        limit: Option<u32>,
    ) -> StoreResult<Vec<Template>> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS}
            FROM templates
            WHERE is_official
              AND ($1::text IS NULL OR name ILIKE $1 ESCAPE '\' OR category ILIKE $1 ESCAPE '\')
              AND ($2::text IS NULL OR category = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#
        ))
        .bind(query.map(contains_pattern))
        .bind(category)
        .bind(limit.map(i64::from))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_templates_owned_by(&self, owner_id: Uuid) -> StoreResult<Vec<Template>> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_template_categories(&self) -> StoreResult<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM templates WHERE is_official ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn insert_template(&self, template: &Template) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO templates (id, name, description, author, category, difficulty, problems,
                                   is_official, is_public, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.description)
        .bind(&template.author)
        .bind(&template.category)
        .bind(template.difficulty.as_str())
        .bind(Json(&template.problems))
        .bind(template.is_official)
        .bind(template.is_public)
        .bind(template.owner_id)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_template(&self, template: &Template) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE templates
            SET name = $2, description = $3, author = $4, category = $5, difficulty = $6,
                problems = $7, is_public = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.description)
        .bind(&template.author)
        .bind(&template.category)
        .bind(template.difficulty.as_str())
        .bind(Json(&template.problems))
        .bind(template.is_public)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_template(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProblemStore for PgStore {
    async fn get_problem(&self, id: Uuid) -> StoreResult<Option<Problem>> {
        let row = sqlx::query_as::<_, ProblemRow>(&format!(
            "SELECT {PROBLEM_COLUMNS} FROM problems WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Problem::try_from).transpose()
    }

    async fn get_problem_by_slug(&self, slug: &str) -> StoreResult<Option<Problem>> {
        let row = sqlx::query_as::<_, ProblemRow>(&format!(
            "SELECT {PROBLEM_COLUMNS} FROM problems WHERE slug = $1 AND is_active"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Problem::try_from).transpose()
    }

    async fn get_problems(&self, ids: &[Uuid]) -> StoreResult<Vec<Problem>> {
        let rows = sqlx::query_as::<_, ProblemRow>(&format!(
            "SELECT {PROBLEM_COLUMNS} FROM problems WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_problems(&self, filter: &ProblemFilter) -> StoreResult<ProblemPage> {
        const WHERE: &str = r#"
            WHERE is_active
              AND ($1::text IS NULL OR difficulty = $1)
              AND ($2::text IS NULL OR category ILIKE $2 ESCAPE '\')
              AND (cardinality($3::text[]) = 0 OR tags && $3)
        "#;
        let difficulty = filter.difficulty.map(|d| d.as_str());
        let category = filter.category.as_deref().map(contains_pattern);

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM problems {WHERE}"))
            .bind(difficulty)
            .bind(&category)
            .bind(&filter.tags)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ProblemRow>(&format!(
            "SELECT {PROBLEM_COLUMNS} FROM problems {WHERE} ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(difficulty)
        .bind(&category)
        .bind(&filter.tags)
        .bind(i64::from(filter.limit))
        .bind(filter.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(ProblemPage {
            problems: convert_all(rows)?,
            total: total.max(0) as u64,
        })
    }

    async fn slug_exists(&self, slug: &str) -> StoreResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM problems WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert_problem(&self, problem: &Problem) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO problems (id, title, slug, description, difficulty, category, tags,
                                  companies, platform_links, editorial, hints, constraint_text,
                                  examples, total_attempts, total_solved, average_rating,
                                  is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19)
            "#,
        )
        .bind(problem.id)
        .bind(&problem.title)
        .bind(&problem.slug)
        .bind(&problem.description)
        .bind(problem.difficulty.as_str())
        .bind(&problem.category)
        .bind(&problem.tags)
        .bind(&problem.companies)
        .bind(Json(&problem.platform_links))
        .bind(&problem.editorial)
        .bind(&problem.hints)
        .bind(&problem.constraints)
        .bind(Json(&problem.examples))
        .bind(problem.total_attempts)
        .bind(problem.total_solved)
        .bind(problem.average_rating)
        .bind(problem.is_active)
        .bind(problem.created_at)
        .bind(problem.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_problem(&self, problem: &Problem) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE problems
            SET title = $2, slug = $3, description = $4, difficulty = $5, category = $6,
                tags = $7, companies = $8, platform_links = $9, editorial = $10, hints = $11,
                constraint_text = $12, examples = $13, is_active = $14, updated_at = $15
            WHERE id = $1
            "#,
        )
        .bind(problem.id)
        .bind(&problem.title)
        .bind(&problem.slug)
        .bind(&problem.description)
        .bind(problem.difficulty.as_str())
        .bind(&problem.category)
        .bind(&problem.tags)
        .bind(&problem.companies)
        .bind(Json(&problem.platform_links))
        .bind(&problem.editorial)
        .bind(&problem.hints)
        .bind(&problem.constraints)
        .bind(Json(&problem.examples))
        .bind(problem.is_active)
        .bind(problem.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_problem(&self, id: Uuid) -> StoreResult<Option<Problem>> {
        let row = sqlx::query_as::<_, ProblemRow>(&format!(
            "DELETE FROM problems WHERE id = $1 RETURNING {PROBLEM_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Problem::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Preferences;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("dp"), "%dp%");
        assert_eq!(contains_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }

    #[test]
    fn corrupt_rows_surface_as_internal_errors() {
        let now = Utc::now();
        let row = UserRow {
            id: Uuid::nil(),
            email: "a@x.com".into(),
            email_verified: None,
            username: None,
            password_hash: None,
            role: "root".into(),
            is_active: true,
            reputation: 0,
            profile: Json(Profile::seeded(None, None)),
            social_settings: Json(SocialSettings::default()),
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        let err = Identity::try_from(row).unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));
    }

    #[test]
    fn profile_defaults_fill_missing_json_fields() {
        let profile: Profile = serde_json::from_value(serde_json::json!({ "name": "Ada" })).unwrap();
        assert_eq!(profile.preferences, Preferences::default());
        assert!(profile.timezone.is_none());
    }
}
