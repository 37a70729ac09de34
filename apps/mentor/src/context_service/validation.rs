//! Payload checks run before anything touches the store.

use crate::models::chat::NewChatMessage;
use crate::models::context::{ContextUpsertRequest, Skill, SkillProgress, UserContext};
use crate::validation::Issues;

const MAX_HOURS_PER_WEEK: u32 = 168;
const MAX_PROGRESS: u8 = 100;

pub fn validate_user_id(user_id: &str) -> Result<(), String> {
    let mut issues = Issues::new();
    issues.check_user_id("user_id", user_id);
    issues.into_result()
}

/// Validates an upsert body against the `user_id` taken from the path.
pub fn validate_upsert(path_user_id: &str, request: &ContextUpsertRequest) -> Result<(), String> {
    let mut issues = Issues::new();
    issues.check_user_id("user_id", path_user_id);

    if let Some(body_user_id) = &request.user_id {
        if body_user_id != path_user_id {
            issues.push(format!(
                "user_id in body ('{body_user_id}') does not match path ('{path_user_id}')"
            ));
        }
    }

    check_context(&mut issues, &request.context);
    issues.into_result()
}

pub fn validate_chat_message(path_user_id: &str, message: &NewChatMessage) -> Result<(), String> {
    let mut issues = Issues::new();
    issues.check_user_id("user_id", path_user_id);
    if message.user_id != path_user_id {
        issues.push(format!(
            "user_id in body ('{}') does not match path ('{path_user_id}')",
            message.user_id
        ));
    }
    issues.check_non_blank("question", &message.question);
    issues.check_non_blank("answer", &message.answer);
    issues.into_result()
}

fn check_context(issues: &mut Issues, context: &UserContext) {
    if let Some(hours) = context
        .learning_preferences
        .time_availability
        .as_ref()
        .and_then(|t| t.hours_per_week)
    {
        if hours > MAX_HOURS_PER_WEEK {
            issues.push(format!(
                "learning_preferences.time_availability.hours_per_week must be at most {MAX_HOURS_PER_WEEK}"
            ));
        }
    }

    for (i, skill) in context.skills.iter().enumerate() {
        check_skill(issues, &format!("skills[{i}]"), skill);
    }

    for (i, entry) in context.progresses.iter().enumerate() {
        let field = format!("progresses[{i}]");
        issues.check_non_blank(&format!("{field}.target.title"), &entry.target.title);
        for (j, required) in entry.target.required_skills.iter().flatten().enumerate() {
            check_skill(
                issues,
                &format!("{field}.target.required_skills[{j}].skill"),
                &required.skill,
            );
        }

        let path = &entry.learning_path;
        issues.check_non_blank(&format!("{field}.learning_path.title"), &path.title);
        if path.progress > MAX_PROGRESS {
            issues.push(format!(
                "{field}.learning_path.progress must be between 0 and {MAX_PROGRESS}"
            ));
        }
        check_skill_progress(issues, &format!("{field}.learning_path.learned_skills"), path.learned_skills.as_deref().unwrap_or_default());
        check_skill_progress(issues, &format!("{field}.learning_path.to_learn_skills"), path.to_learn_skills.as_deref().unwrap_or_default());
    }
}

fn check_skill(issues: &mut Issues, field: &str, skill: &Skill) {
    issues.check_non_blank(&format!("{field}.name"), &skill.name);
}

fn check_skill_progress(issues: &mut Issues, field: &str, skills: &[SkillProgress]) {
    for (i, progress) in skills.iter().enumerate() {
        check_skill(issues, &format!("{field}[{i}].skill"), &progress.skill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> ContextUpsertRequest {
        serde_json::from_value(value).unwrap()
    }

    fn minimal() -> serde_json::Value {
        json!({
            "learning_preferences": {},
            "constraints": {},
            "background": {}
        })
    }

    #[test]
    fn test_minimal_payload_passes() {
        assert!(validate_upsert("u1", &request(minimal())).is_ok());
    }

    #[test]
    fn test_body_user_id_must_match_path() {
        let mut value = minimal();
        value["user_id"] = json!("someone-else");
        let err = validate_upsert("u1", &request(value)).unwrap_err();
        assert!(err.contains("does not match path"));
    }

    #[test]
    fn test_blank_skill_name_fails() {
        let mut value = minimal();
        value["skills"] = json!([{"name": "python"}, {"name": "  "}]);
        let err = validate_upsert("u1", &request(value)).unwrap_err();
        assert_eq!(err, "skills[1].name cannot be empty");
    }

    #[test]
    fn test_progress_over_100_fails() {
        let mut value = minimal();
        value["progresses"] = json!([{
            "target": {"title": "Backend Developer"},
            "learning_path": {"title": "Python Expert Path", "progress": 120}
        }]);
        let err = validate_upsert("u1", &request(value)).unwrap_err();
        assert!(err.contains("progresses[0].learning_path.progress"));
    }

    #[test]
    fn test_too_many_hours_fails() {
        let mut value = minimal();
        value["learning_preferences"] = json!({"time_availability": {"hours_per_week": 200}});
        assert!(validate_upsert("u1", &request(value)).is_err());
    }

    #[test]
    fn test_all_issues_are_reported_together() {
        let mut value = minimal();
        value["user_id"] = json!("other");
        value["skills"] = json!([{"name": ""}]);
        let err = validate_upsert("u1", &request(value)).unwrap_err();
        assert!(err.contains("does not match path"));
        assert!(err.contains("skills[0].name"));
    }

    #[test]
    fn test_chat_message_checks() {
        let ok = NewChatMessage {
            user_id: "u1".to_string(),
            question: "What next?".to_string(),
            answer: "Learn Rust.".to_string(),
        };
        assert!(validate_chat_message("u1", &ok).is_ok());

        let blank = NewChatMessage {
            answer: " ".to_string(),
            ..ok.clone()
        };
        assert_eq!(
            validate_chat_message("u1", &blank).unwrap_err(),
            "answer cannot be empty"
        );

        assert!(validate_chat_message("u2", &ok).is_err());
    }
}
