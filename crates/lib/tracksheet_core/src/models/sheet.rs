//! Sheet models: personal problem collections with per-problem progress.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Difficulty;

/// Longest sheet name, in characters.
pub const MAX_NAME_LEN: usize = 100;

const COPY_SUFFIX: &str = " (Copy)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SheetCategory {
    #[default]
    Personal,
    Template,
    Study,
    Other,
}

impl SheetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetCategory::Personal => "Personal",
            SheetCategory::Template => "Template",
            SheetCategory::Study => "Study",
            SheetCategory::Other => "Other",
        }
    }
}

impl std::str::FromStr for SheetCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Personal" => Ok(SheetCategory::Personal),
            "Template" => Ok(SheetCategory::Template),
            "Study" => Ok(SheetCategory::Study),
            "Other" => Ok(SheetCategory::Other),
            other => Err(format!("unknown sheet category '{other}'")),
        }
    }
}

/// Progress state of one problem inside a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProblemStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Solved,
    Revisit,
}

/// Per-problem progress entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProblem {
    pub problem_id: Uuid,
    pub order: i32,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub status: ProblemStatus,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Minutes spent.
    #[serde(default)]
    pub time_spent: i64,
    #[serde(default)]
    pub attempts: i64,
    #[serde(default)]
    pub personal_rating: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub bookmarked: bool,
    #[serde(default)]
    pub last_attempt_date: Option<DateTime<Utc>>,
}

impl SheetProblem {
    /// A problem freshly added to a sheet: not started, no effort recorded.
    pub fn fresh(problem_id: Uuid, order: i32, now: DateTime<Utc>) -> Self {
        Self {
            problem_id,
            order,
            added_at: now,
            status: ProblemStatus::NotStarted,
            completed: false,
            completed_at: None,
            time_spent: 0,
            attempts: 0,
            personal_rating: None,
            notes: None,
            bookmarked: false,
            last_attempt_date: None,
        }
    }
}

/// Partial update of a sheet problem's progress.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub status: Option<ProblemStatus>,
    pub completed: Option<bool>,
    pub time_spent: Option<i64>,
    pub attempts: Option<i64>,
    pub personal_rating: Option<u8>,
    pub notes: Option<String>,
    pub bookmarked: Option<bool>,
}

impl ProgressUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if self.time_spent.is_some_and(|t| t < 0) {
            return Err("timeSpent must not be negative".into());
        }
        if self.attempts.is_some_and(|a| a < 0) {
            return Err("attempts must not be negative".into());
        }
        if self.personal_rating.is_some_and(|r| !(1..=5).contains(&r)) {
            return Err("personalRating must be between 1 and 5".into());
        }
        Ok(())
    }

    /// Apply to an entry. Marking a problem solved also marks it completed.
    pub fn apply(&self, entry: &mut SheetProblem, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            entry.status = status;
            if status == ProblemStatus::Solved {
                entry.completed = true;
            }
        }
        if let Some(completed) = self.completed {
            entry.completed = completed;
        }
        if entry.completed {
            entry.completed_at.get_or_insert(now);
        } else {
            entry.completed_at = None;
        }
        if let Some(t) = self.time_spent {
            entry.time_spent = t;
        }
        if let Some(a) = self.attempts {
            if a != entry.attempts {
                entry.last_attempt_date = Some(now);
            }
            entry.attempts = a;
        }
        if let Some(r) = self.personal_rating {
            entry.personal_rating = Some(r);
        }
        if let Some(n) = &self.notes {
            entry.notes = Some(n.clone());
        }
        if let Some(b) = self.bookmarked {
            entry.bookmarked = b;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Goals {
    pub daily_target: Option<u32>,
    pub completion_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SheetPreferences {
    pub show_difficulty: bool,
}

impl Default for SheetPreferences {
    fn default() -> Self {
        Self {
            show_difficulty: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSettings {
    pub goals: Goals,
    pub preferences: SheetPreferences,
}

/// Engagement counters. Never copied onto a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Social {
    pub upvotes: i64,
    pub downvotes: i64,
    pub views: i64,
    pub score: i64,
}

impl Social {
    pub fn recalculate_score(&mut self) {
        self.score = self.upvotes - self.downvotes;
    }
}

/// An owned, optionally public, problem collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: SheetCategory,
    pub is_template: bool,
    pub is_public: bool,
    pub settings: SheetSettings,
    pub social: Social,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    pub problems: Vec<SheetProblem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes supplied when creating a sheet. Owner and counters are never caller-controlled.
#[derive(Debug, Clone, Default)]
pub struct SheetDraft {
    pub name: String,
    pub description: Option<String>,
    pub category: SheetCategory,
    pub is_template: bool,
    pub is_public: bool,
    pub settings: SheetSettings,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    pub problems: Vec<SheetProblem>,
}

/// Owner-editable attributes.
#[derive(Debug, Clone, Default)]
pub struct SheetPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<SheetCategory>,
    pub is_public: Option<bool>,
    pub settings: Option<SheetSettings>,
    pub tags: Option<Vec<String>>,
    pub difficulty: Option<Difficulty>,
}

impl Sheet {
    /// Build a new sheet owned by `owner_id` with zeroed social counters.
    pub fn create(owner_id: Uuid, draft: SheetDraft, now: DateTime<Utc>) -> Self {
        let mut sheet = Self {
            id: Uuid::now_v7(),
            owner_id,
            name: draft.name,
            description: draft.description,
            category: draft.category,
            is_template: draft.is_template,
            is_public: draft.is_public,
            settings: draft.settings,
            social: Social::default(),
            tags: draft.tags,
            difficulty: draft.difficulty,
            problems: draft.problems,
            created_at: now,
            updated_at: now,
        };
        sheet.normalize();
        sheet
    }

    /// Copy for `actor`: new id, new owner, private, engagement reset.
    pub fn duplicate_for(&self, actor: Uuid, now: DateTime<Utc>) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::now_v7();
        copy.owner_id = actor;
        let keep = MAX_NAME_LEN - COPY_SUFFIX.chars().count();
        copy.name = self.name.chars().take(keep).collect::<String>() + COPY_SUFFIX;
        copy.is_public = false;
        copy.social = Social::default();
        copy.created_at = now;
        copy.updated_at = now;
        copy
    }

    pub fn apply(&mut self, patch: SheetPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        if let Some(settings) = patch.settings {
            self.settings = settings;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        self.updated_at = now;
        self.normalize();
    }

    /// Save-time invariants: tags trimmed, lower-cased and unique; score = up - down.
    pub fn normalize(&mut self) {
        let mut seen = Vec::with_capacity(self.tags.len());
        for tag in self.tags.drain(..) {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() && !seen.contains(&tag) {
                seen.push(tag);
            }
        }
        self.tags = seen;
        self.social.recalculate_score();
    }

    pub fn popularity_score(&self) -> f64 {
        (self.social.upvotes - self.social.downvotes) as f64 + self.social.views as f64 * 0.1
    }

    /// True when the completion deadline falls within the next seven days.
    pub fn is_deadline_approaching(&self, now: DateTime<Utc>) -> bool {
        match self.settings.goals.completion_deadline {
            Some(deadline) => deadline > now && deadline - now <= Duration::days(7),
            None => false,
        }
    }

    pub fn problem_mut(&mut self, problem_id: Uuid) -> Option<&mut SheetProblem> {
        self.problems.iter_mut().find(|p| p.problem_id == problem_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_with_social(upvotes: i64, downvotes: i64, views: i64) -> Sheet {
        let mut sheet = Sheet::create(
            Uuid::now_v7(),
            SheetDraft {
                name: "Blind 75".into(),
                is_public: true,
                ..Default::default()
            },
            Utc::now(),
        );
        sheet.social = Social {
            upvotes,
            downvotes,
            views,
            score: 0,
        };
        sheet.normalize();
        sheet
    }

    #[test]
    fn normalize_dedupes_and_lowercases_tags() {
        let mut sheet = sheet_with_social(0, 0, 0);
        sheet.tags = vec![" DP ".into(), "dp".into(), "Graphs".into(), "".into()];
        sheet.normalize();
        assert_eq!(sheet.tags, vec!["dp".to_string(), "graphs".to_string()]);
    }

    #[test]
    fn score_tracks_votes() {
        let sheet = sheet_with_social(10, 2, 0);
        assert_eq!(sheet.social.score, 8);
    }

    #[test]
    fn duplicate_resets_engagement_and_takes_new_owner() {
        let source = sheet_with_social(10, 2, 40);
        let actor = Uuid::now_v7();
        let copy = source.duplicate_for(actor, Utc::now());

        assert_ne!(copy.id, source.id);
        assert_eq!(copy.owner_id, actor);
        assert_eq!(copy.name, "Blind 75 (Copy)");
        assert!(!copy.is_public);
        assert_eq!(copy.social, Social::default());
        assert_eq!(source.social.upvotes, 10);
    }

    #[test]
    fn duplicate_name_stays_within_limit() {
        let mut source = sheet_with_social(0, 0, 0);
        source.name = "é".repeat(MAX_NAME_LEN);
        let copy = source.duplicate_for(Uuid::now_v7(), Utc::now());
        assert_eq!(copy.name.chars().count(), MAX_NAME_LEN);
        assert!(copy.name.ends_with(" (Copy)"));
        assert!(copy.name.starts_with(&"é".repeat(93)));
    }

    #[test]
    fn popularity_weights_views() {
        let sheet = sheet_with_social(5, 1, 20);
        assert!((sheet.popularity_score() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn deadline_window_is_seven_days() {
        let now = Utc::now();
        let mut sheet = sheet_with_social(0, 0, 0);
        assert!(!sheet.is_deadline_approaching(now));

        sheet.settings.goals.completion_deadline = Some(now + Duration::days(3));
        assert!(sheet.is_deadline_approaching(now));

        sheet.settings.goals.completion_deadline = Some(now + Duration::days(10));
        assert!(!sheet.is_deadline_approaching(now));

        sheet.settings.goals.completion_deadline = Some(now - Duration::days(1));
        assert!(!sheet.is_deadline_approaching(now));
    }

    #[test]
    fn solving_marks_completed_once() {
        let now = Utc::now();
        let mut entry = SheetProblem::fresh(Uuid::now_v7(), 1, now);
        let update = ProgressUpdate {
            status: Some(ProblemStatus::Solved),
            attempts: Some(2),
            ..Default::default()
        };
        update.apply(&mut entry, now);
        assert!(entry.completed);
        assert_eq!(entry.completed_at, Some(now));
        assert_eq!(entry.last_attempt_date, Some(now));

        let later = now + Duration::minutes(5);
        ProgressUpdate {
            notes: Some("two pointers".into()),
            ..Default::default()
        }
        .apply(&mut entry, later);
        assert_eq!(entry.completed_at, Some(now));

        ProgressUpdate {
            completed: Some(false),
            ..Default::default()
        }
        .apply(&mut entry, later);
        assert!(entry.completed_at.is_none());
    }

    #[test]
    fn progress_validation_rejects_bad_values() {
        assert!(
            ProgressUpdate {
                attempts: Some(-1),
                ..Default::default()
            }
            .validate()
            .is_err()
        );
        assert!(
            ProgressUpdate {
                personal_rating: Some(6),
                ..Default::default()
            }
            .validate()
            .is_err()
        );
        assert!(ProgressUpdate::default().validate().is_ok());
    }

    #[test]
    fn patch_updates_visibility_and_renormalizes() {
        let mut sheet = sheet_with_social(0, 0, 0);
        let now = Utc::now();
        sheet.apply(
            SheetPatch {
                is_public: Some(false),
                tags: Some(vec!["Trees".into(), "trees".into()]),
                ..Default::default()
            },
            now,
        );
        assert!(!sheet.is_public);
        assert_eq!(sheet.tags, vec!["trees".to_string()]);
        assert_eq!(sheet.updated_at, now);
    }
}
