//! Input checks shared by both services.
//!
//! Violations are collected rather than returned on the first failure so a
//! client sees every problem with its payload in one response.

pub const MAX_USER_ID_CHARS: usize = 256;

#[derive(Debug, Default)]
pub struct Issues(Vec<String>);

impl Issues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: impl Into<String>) {
        self.0.push(issue.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn check_user_id(&mut self, field: &str, user_id: &str) {
        if user_id.trim().is_empty() {
            self.push(format!("{field} cannot be empty"));
            return;
        }
        if user_id.chars().count() > MAX_USER_ID_CHARS {
            self.push(format!(
                "{field} must be at most {MAX_USER_ID_CHARS} characters"
            ));
        }
        if user_id.chars().any(char::is_control) {
            self.push(format!("{field} must not contain control characters"));
        }
    }

    pub fn check_non_blank(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(format!("{field} cannot be empty"));
        }
    }

    /// `Err` carries every issue joined into one message.
    pub fn into_result(self) -> Result<(), String> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.0.join("; "))
        }
    }
}
