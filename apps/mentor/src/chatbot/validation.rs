use crate::validation::Issues;

pub const MAX_QUESTION_CHARS: usize = 4000;

pub fn validate_user_id(user_id: &str) -> Result<(), String> {
    let mut issues = Issues::new();
    issues.check_user_id("userId", user_id);
    issues.into_result()
}

pub fn validate_ask(user_id: &str, question: &str) -> Result<(), String> {
    let mut issues = Issues::new();
    issues.check_user_id("userId", user_id);
    issues.check_non_blank("question", question);
    if question.chars().count() > MAX_QUESTION_CHARS {
        issues.push(format!(
            "question must be at most {MAX_QUESTION_CHARS} characters"
        ));
    }
    issues.into_result()
}
