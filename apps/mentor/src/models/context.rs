use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How and when a user prefers to learn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_learning_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_availability: Option<TimeAvailability>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeAvailability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_per_week: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_schedule: Option<String>,
}

/// Numeric scales the user is bound by (time and budget pressure).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_constraints: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_constraints: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Background {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_experience_years: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredSkill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<String>,
    pub skill: Skill,
}

/// What the user is working towards, e.g. a career path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_skills: Option<Vec<RequiredSkill>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningResource {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// A skill on a learning path, either already learned or still to learn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProgress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proficiency_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<LearningResource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    pub skill: Skill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Completion percentage, 0–100.
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learned_skills: Option<Vec<SkillProgress>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_learn_skills: Option<Vec<SkillProgress>>,
}

/// Links a target to the learning path the user follows to reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub target: Target,
    pub learning_path: LearningPath,
}

/// The per-user aggregate. Written as a whole: an upsert replaces every field,
/// so omitted collections come back empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub learning_preferences: LearningPreferences,
    pub constraints: Constraints,
    pub background: Background,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub progresses: Vec<ProgressEntry>,
}

/// Body of `POST /context/{user_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContextUpsertRequest {
    /// Optional echo of the path id; must match it when present.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub context: UserContext,
}

/// A stored context as returned by `GET /context/{user_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    pub id: i64,
    pub user_id: String,
    pub version: i32,
    #[serde(flatten)]
    pub context: UserContext,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `{status, message}` acknowledgement used by the write endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}
