//! Template models: curated problem sets that can be instantiated into sheets.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Difficulty;
use super::problem::Problem;
use super::sheet::{SheetCategory, SheetDraft, SheetProblem};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_AUTHOR_LEN: usize = 50;
const MAX_CATEGORY_LEN: usize = 30;

fn default_required() -> bool {
    true
}

/// A problem reference inside a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateProblem {
    pub problem_id: Uuid,
    /// 1-based position, unique within the template.
    pub order: i32,
    #[serde(default = "default_required")]
    pub is_required: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A problem set. Official templates are catalog entities (no owner);
/// user-authored templates are owned resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub author: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub problems: Vec<TemplateProblem>,
    pub is_official: bool,
    pub is_public: bool,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TemplateDraft {
    pub name: String,
    pub description: Option<String>,
    pub author: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub problems: Vec<TemplateProblem>,
    pub is_official: bool,
    pub is_public: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub is_public: Option<bool>,
}

/// A template entry joined with its catalog problem (if it still exists).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedTemplateProblem {
    #[serde(flatten)]
    pub entry: TemplateProblem,
    pub problem: Option<Problem>,
}

impl Template {
    /// Build a template. `owner_id` is `None` for official templates.
    pub fn create(draft: TemplateDraft, owner_id: Option<Uuid>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: draft.name.trim().to_string(),
            description: draft.description.map(|d| d.trim().to_string()),
            author: draft.author.trim().to_string(),
            category: draft.category.trim().to_string(),
            difficulty: draft.difficulty,
            problems: draft.problems,
            is_official: draft.is_official,
            // Official templates are always world-readable.
            is_public: draft.is_official || draft.is_public,
            owner_id: if draft.is_official { None } else { owner_id },
            created_at: now,
            updated_at: now,
        }
    }

    pub fn problem_count(&self) -> usize {
        self.problems.len()
    }

    pub fn validate(&self) -> Result<(), String> {
        check_len("name", &self.name, MAX_NAME_LEN)?;
        if let Some(d) = &self.description {
            check_len("description", d, MAX_DESCRIPTION_LEN)?;
        }
        check_len("author", &self.author, MAX_AUTHOR_LEN)?;
        check_len("category", &self.category, MAX_CATEGORY_LEN)?;
        if self.name.is_empty() || self.author.is_empty() || self.category.is_empty() {
            return Err("name, author and category are required".into());
        }
        let mut orders = HashSet::new();
        for p in &self.problems {
            if p.order < 1 {
                return Err("Problem order must be at least 1".into());
            }
            if !orders.insert(p.order) {
                return Err("Problem orders must be unique".into());
            }
        }
        Ok(())
    }

    pub fn apply(&mut self, patch: TemplatePatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = Some(description.trim().to_string());
        }
        if let Some(author) = patch.author {
            self.author = author.trim().to_string();
        }
        if let Some(category) = patch.category {
            self.category = category.trim().to_string();
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(is_public) = patch.is_public
            && !self.is_official
        {
            self.is_public = is_public;
        }
        self.updated_at = now;
    }

    /// Append problems not already present. Returns how many were added.
    pub fn add_problems(&mut self, candidates: Vec<TemplateProblem>, now: DateTime<Utc>) -> usize {
        let mut existing: HashSet<Uuid> = self.problems.iter().map(|p| p.problem_id).collect();
        let mut added = 0;
        for candidate in candidates {
            if existing.insert(candidate.problem_id) {
                self.problems.push(candidate);
                added += 1;
            }
        }
        if added > 0 {
            self.updated_at = now;
        }
        added
    }

    /// Remove every entry for `problem_id`. Returns whether anything was removed.
    pub fn remove_problem(&mut self, problem_id: Uuid, now: DateTime<Utc>) -> bool {
        let before = self.problems.len();
        self.problems.retain(|p| p.problem_id != problem_id);
        let removed = self.problems.len() != before;
        if removed {
            self.updated_at = now;
        }
        removed
    }

    /// Draft of a private sheet that tracks this template's problems from scratch.
    pub fn instantiate(&self, now: DateTime<Utc>) -> SheetDraft {
        let mut entries: Vec<&TemplateProblem> = self.problems.iter().collect();
        entries.sort_by_key(|p| p.order);
        SheetDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            category: SheetCategory::Template,
            is_template: false,
            is_public: false,
            settings: Default::default(),
            tags: vec![self.category.to_lowercase()],
            difficulty: self.difficulty,
            problems: entries
                .into_iter()
                .map(|p| SheetProblem::fresh(p.problem_id, p.order, now))
                .collect(),
        }
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{field} must be at most {max} characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sheet::ProblemStatus;

    fn entry(order: i32) -> TemplateProblem {
        TemplateProblem {
            problem_id: Uuid::now_v7(),
            order,
            is_required: true,
            notes: None,
        }
    }

    fn draft(problems: Vec<TemplateProblem>, is_official: bool) -> TemplateDraft {
        TemplateDraft {
            name: " Striver SDE ".into(),
            description: None,
            author: "Striver".into(),
            category: "Interview".into(),
            difficulty: Difficulty::Hard,
            problems,
            is_official,
            is_public: false,
        }
    }

    #[test]
    fn official_templates_have_no_owner_and_are_public() {
        let owner = Uuid::now_v7();
        let t = Template::create(draft(vec![], true), Some(owner), Utc::now());
        assert!(t.owner_id.is_none());
        assert!(t.is_public);
        assert_eq!(t.name, "Striver SDE");
    }

    #[test]
    fn user_templates_keep_owner_and_visibility() {
        let owner = Uuid::now_v7();
        let t = Template::create(draft(vec![], false), Some(owner), Utc::now());
        assert_eq!(t.owner_id, Some(owner));
        assert!(!t.is_public);
    }

    #[test]
    fn validate_rejects_duplicate_and_zero_orders() {
        let now = Utc::now();
        let dup = Template::create(draft(vec![entry(1), entry(1)], true), None, now);
        assert_eq!(dup.validate().unwrap_err(), "Problem orders must be unique");

        let zero = Template::create(draft(vec![entry(0)], true), None, now);
        assert!(zero.validate().is_err());

        let ok = Template::create(draft(vec![entry(1), entry(2)], true), None, now);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn validate_enforces_length_limits() {
        let mut t = Template::create(draft(vec![], true), None, Utc::now());
        t.category = "x".repeat(31);
        assert!(t.validate().is_err());
    }

    #[test]
    fn add_problems_skips_existing_ids_and_keeps_count_in_sync() {
        let now = Utc::now();
        let first = entry(1);
        let mut t = Template::create(draft(vec![first.clone()], true), None, now);

        let added = t.add_problems(vec![first.clone(), entry(2)], now);
        assert_eq!(added, 1);
        assert_eq!(t.problem_count(), 2);

        assert!(t.remove_problem(first.problem_id, now));
        assert!(!t.remove_problem(first.problem_id, now));
        assert_eq!(t.problem_count(), 1);
    }

    #[test]
    fn instantiate_builds_private_sheet_in_order() {
        let now = Utc::now();
        let (a, b) = (entry(2), entry(1));
        let t = Template::create(draft(vec![a.clone(), b.clone()], true), None, now);
        let sheet = t.instantiate(now);

        assert!(!sheet.is_public);
        assert_eq!(sheet.category, SheetCategory::Template);
        assert_eq!(sheet.tags, vec!["interview".to_string()]);
        assert_eq!(sheet.difficulty, Difficulty::Hard);
        let ids: Vec<Uuid> = sheet.problems.iter().map(|p| p.problem_id).collect();
        assert_eq!(ids, vec![b.problem_id, a.problem_id]);
        assert!(
            sheet
                .problems
                .iter()
                .all(|p| p.status == ProblemStatus::NotStarted && !p.completed)
        );
    }
}
