//! Problem catalog models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Difficulty;

/// Links to the same problem on external judges.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformLinks {
    pub leetcode: Option<String>,
    pub gfg: Option<String>,
    pub hackerrank: Option<String>,
    pub codeforces: Option<String>,
    pub custom: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemExample {
    pub input: String,
    pub output: String,
    pub explanation: String,
}

/// A shared catalog problem. Catalog entities have no per-instance owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: String,
    pub tags: Vec<String>,
    pub companies: Vec<String>,
    pub platform_links: PlatformLinks,
    pub editorial: Option<String>,
    pub hints: Vec<String>,
    pub constraints: Option<String>,
    pub examples: Vec<ProblemExample>,
    pub total_attempts: i64,
    pub total_solved: i64,
    pub average_rating: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List view of a problem; omits editorial and hints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: String,
    pub tags: Vec<String>,
    pub companies: Vec<String>,
    pub platform_links: PlatformLinks,
    pub constraints: Option<String>,
    pub examples: Vec<ProblemExample>,
    pub total_attempts: i64,
    pub total_solved: i64,
    pub average_rating: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Problem> for ProblemSummary {
    fn from(p: Problem) -> Self {
        Self {
            id: p.id,
            title: p.title,
            slug: p.slug,
            description: p.description,
            difficulty: p.difficulty,
            category: p.category,
            tags: p.tags,
            companies: p.companies,
            platform_links: p.platform_links,
            constraints: p.constraints,
            examples: p.examples,
            total_attempts: p.total_attempts,
            total_solved: p.total_solved,
            average_rating: p.average_rating,
            is_active: p.is_active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Filter for catalog listing. Only active problems are listed.
#[derive(Debug, Clone, Default)]
pub struct ProblemFilter {
    pub difficulty: Option<Difficulty>,
    /// Case-insensitive substring match on category.
    pub category: Option<String>,
    /// Matches problems carrying any of these tags.
    pub tags: Vec<String>,
    pub page: u32,
    pub limit: u32,
}

impl ProblemFilter {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Whether an (active) problem passes the filter, ignoring pagination.
    pub fn matches(&self, problem: &Problem) -> bool {
        if !problem.is_active {
            return false;
        }
        if let Some(d) = self.difficulty
            && problem.difficulty != d
        {
            return false;
        }
        if let Some(c) = &self.category
            && !problem.category.to_lowercase().contains(&c.to_lowercase())
        {
            return false;
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|t| problem.tags.contains(t)) {
            return false;
        }
        true
    }
}

/// One page of catalog results.
#[derive(Debug, Clone)]
pub struct ProblemPage {
    pub problems: Vec<Problem>,
    pub total: u64,
}

/// Fields supplied when adding a problem to the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProblemDraft {
    pub title: String,
    pub slug: Option<String>,
    pub description: String,
    pub difficulty: Option<Difficulty>,
    pub category: String,
    pub tags: Vec<String>,
    pub companies: Vec<String>,
    pub platform_links: PlatformLinks,
    pub editorial: Option<String>,
    pub hints: Vec<String>,
    pub constraints: Option<String>,
    pub examples: Vec<ProblemExample>,
    pub is_active: Option<bool>,
}

impl ProblemDraft {
    /// Names of required fields that are blank, in declaration order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if self.difficulty.is_none() {
            missing.push("difficulty");
        }
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        missing
    }
}

/// Admin edit of a catalog problem. Counters are not editable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProblemPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub companies: Option<Vec<String>>,
    pub platform_links: Option<PlatformLinks>,
    pub editorial: Option<String>,
    pub hints: Option<Vec<String>>,
    pub constraints: Option<String>,
    pub examples: Option<Vec<ProblemExample>>,
    pub is_active: Option<bool>,
}

impl Problem {
    /// Build a catalog entry from a validated draft and its final slug.
    pub fn from_draft(draft: ProblemDraft, slug: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: draft.title.trim().to_string(),
            slug,
            description: draft.description,
            difficulty: draft.difficulty.unwrap_or_default(),
            category: draft.category.trim().to_string(),
            tags: draft.tags,
            companies: draft.companies,
            platform_links: draft.platform_links,
            editorial: draft.editorial,
            hints: draft.hints,
            constraints: draft.constraints,
            examples: draft.examples,
            total_attempts: 0,
            total_solved: 0,
            average_rating: 0.0,
            is_active: draft.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: ProblemPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(slug) = patch.slug {
            self.slug = slug.trim().to_lowercase();
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(category) = patch.category {
            self.category = category.trim().to_string();
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(companies) = patch.companies {
            self.companies = companies;
        }
        if let Some(links) = patch.platform_links {
            self.platform_links = links;
        }
        if let Some(editorial) = patch.editorial {
            self.editorial = Some(editorial);
        }
        if let Some(hints) = patch.hints {
            self.hints = hints;
        }
        if let Some(constraints) = patch.constraints {
            self.constraints = Some(constraints);
        }
        if let Some(examples) = patch.examples {
            self.examples = examples;
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        self.updated_at = now;
    }
}

/// Convert a title into a URL slug: lower-case alphanumerics joined by hyphens.
pub fn slugify(title: &str) -> String {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    cleaned
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(category: &str, tags: &[&str], active: bool) -> Problem {
        let now = Utc::now();
        Problem {
            id: Uuid::now_v7(),
            title: "Two Sum".into(),
            slug: "two-sum".into(),
            description: "find two numbers".into(),
            difficulty: Difficulty::Easy,
            category: category.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            companies: vec![],
            platform_links: PlatformLinks::default(),
            editorial: Some("hash map".into()),
            hints: vec!["use a map".into()],
            constraints: None,
            examples: vec![],
            total_attempts: 0,
            total_solved: 0,
            average_rating: 0.0,
            is_active: active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn slugify_strips_punctuation_and_collapses_spaces() {
        assert_eq!(slugify("Two Sum"), "two-sum");
        assert_eq!(slugify("  LRU   Cache!! (Design) "), "lru-cache-design");
        assert_eq!(slugify("3Sum -- Closest"), "3sum-closest");
    }

    #[test]
    fn filter_skips_inactive_problems() {
        let filter = ProblemFilter::default();
        assert!(filter.matches(&problem("Arrays", &[], true)));
        assert!(!filter.matches(&problem("Arrays", &[], false)));
    }

    #[test]
    fn filter_matches_category_substring_case_insensitively() {
        let filter = ProblemFilter {
            category: Some("ARR".into()),
            ..Default::default()
        };
        assert!(filter.matches(&problem("Arrays", &[], true)));
        assert!(!filter.matches(&problem("Graphs", &[], true)));
    }

    #[test]
    fn filter_matches_any_tag() {
        let filter = ProblemFilter {
            tags: vec!["dp".into(), "greedy".into()],
            ..Default::default()
        };
        assert!(filter.matches(&problem("Arrays", &["greedy"], true)));
        assert!(!filter.matches(&problem("Arrays", &["graph"], true)));
    }

    #[test]
    fn summary_omits_editorial_and_hints() {
        let summary = ProblemSummary::from(problem("Arrays", &[], true));
        let json = serde_json::to_value(summary).unwrap();
        assert!(json.get("editorial").is_none());
        assert!(json.get("hints").is_none());
        assert_eq!(json["slug"], "two-sum");
    }

    #[test]
    fn draft_reports_missing_required_fields() {
        let draft = ProblemDraft {
            title: "Two Sum".into(),
            ..Default::default()
        };
        assert_eq!(
            draft.missing_fields(),
            vec!["description", "difficulty", "category"]
        );
    }

    #[test]
    fn new_problems_start_with_zero_counters() {
        let draft = ProblemDraft {
            title: " Two Sum ".into(),
            description: "d".into(),
            difficulty: Some(Difficulty::Easy),
            category: "Arrays".into(),
            ..Default::default()
        };
        let p = Problem::from_draft(draft, "two-sum".into(), Utc::now());
        assert_eq!(p.title, "Two Sum");
        assert!(p.is_active);
        assert_eq!(p.total_attempts, 0);
        assert_eq!(p.average_rating, 0.0);
    }

    #[test]
    fn offset_is_zero_based_from_page_one() {
        let filter = ProblemFilter {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(filter.offset(), 20);
    }
}
