use std::fmt::Write;

use crate::chatbot::llm_client::{ChatTurn, Role};
use crate::models::chat::ChatMessage;
use crate::models::context::{
    Background, Constraints, ContextRecord, LearningPreferences, ProgressEntry, Skill,
    SkillProgress,
};

pub const MENTOR_SYSTEM: &str = "\
    You are a personal learning mentor. Answer the user's question using the \
    profile below: their learning preferences, constraints, background, skills \
    and current learning progress. Tailor recommendations to the time and \
    budget they have. If the profile does not contain what you need, say so \
    instead of guessing. Keep answers concise and actionable.";

/// Builds the provider conversation for one question.
///
/// `history` arrives newest first; it is replayed oldest first so the model
/// reads the exchanges in the order they happened. The question is the final
/// user turn.
pub fn build_messages(record: &ContextRecord, history: &[ChatMessage], question: &str) -> Vec<ChatTurn> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(ChatTurn::new(
        Role::System,
        format!("{MENTOR_SYSTEM}\n\n{}", render_profile(record)),
    ));
    for exchange in history.iter().rev() {
        messages.push(ChatTurn::new(Role::User, exchange.question.as_str()));
        messages.push(ChatTurn::new(Role::Assistant, exchange.answer.as_str()));
    }
    messages.push(ChatTurn::new(Role::User, question));
    messages
}

/// Renders a stored context as a Markdown profile for the system prompt.
pub fn render_profile(record: &ContextRecord) -> String {
    let ctx = &record.context;
    let mut md = format!("# Profile of user {}\n\n", record.user_id);

    render_preferences(&mut md, &ctx.learning_preferences);
    render_constraints(&mut md, &ctx.constraints);
    render_background(&mut md, &ctx.background);

    md.push_str("## Skills\n");
    if ctx.skills.is_empty() {
        md.push_str("- none recorded\n");
    }
    for skill in &ctx.skills {
        let _ = writeln!(md, "- {}", describe_skill(skill));
    }
    md.push('\n');

    md.push_str("## Learning progress\n");
    if ctx.progresses.is_empty() {
        md.push_str("- none recorded\n");
    }
    for entry in &ctx.progresses {
        render_progress(&mut md, entry);
    }

    md.trim_end().to_string()
}

fn render_preferences(md: &mut String, prefs: &LearningPreferences) {
    md.push_str("## Learning preferences\n");
    let _ = writeln!(
        md,
        "- Preferred learning style: {}",
        or_unknown(prefs.preferred_learning_style.as_deref())
    );
    let time = prefs.time_availability.as_ref();
    match time.and_then(|t| t.hours_per_week) {
        Some(hours) => {
            let _ = writeln!(md, "- Hours per week: {hours}");
        }
        None => md.push_str("- Hours per week: unknown\n"),
    }
    let _ = writeln!(
        md,
        "- Preferred schedule: {}",
        or_unknown(time.and_then(|t| t.preferred_schedule.as_deref()))
    );
    md.push('\n');
}

fn render_constraints(md: &mut String, constraints: &Constraints) {
    md.push_str("## Constraints\n");
    for (label, value) in [
        ("Time", constraints.time_constraints),
        ("Budget", constraints.budget_constraints),
    ] {
        match value {
            Some(v) => {
                let _ = writeln!(md, "- {label}: {v}");
            }
            None => {
                let _ = writeln!(md, "- {label}: unknown");
            }
        }
    }
    md.push('\n');
}

fn render_background(md: &mut String, background: &Background) {
    md.push_str("## Background\n");
    for (label, value) in [
        ("Education", background.education_level.as_deref()),
        ("Years of experience", background.work_experience_years.as_deref()),
        ("Current role", background.current_role.as_deref()),
        ("Industry", background.industry.as_deref()),
    ] {
        let _ = writeln!(md, "- {label}: {}", or_unknown(value));
    }
    md.push('\n');
}

fn render_progress(md: &mut String, entry: &ProgressEntry) {
    let target = &entry.target;
    let path = &entry.learning_path;

    match &target.target_type {
        Some(kind) => {
            let _ = writeln!(md, "### Goal: {} ({kind})", target.title);
        }
        None => {
            let _ = writeln!(md, "### Goal: {}", target.title);
        }
    }
    if let Some(description) = &target.description {
        let _ = writeln!(md, "{description}");
    }

    let _ = write!(md, "- Learning path: {}, {}% complete", path.title, path.progress);
    if let Some(date) = path.completion_date {
        let _ = write!(md, ", target completion {}", date.format("%Y-%m-%d"));
    }
    md.push('\n');

    let required_skills = target.required_skills.as_deref().unwrap_or_default();
    if !required_skills.is_empty() {
        let required: Vec<String> = required_skills
            .iter()
            .map(|r| match &r.importance {
                Some(importance) => format!("{} [{importance}]", describe_skill(&r.skill)),
                None => describe_skill(&r.skill),
            })
            .collect();
        let _ = writeln!(md, "- Required skills: {}", required.join("; "));
    }
    render_skill_progress(md, "Already learned", path.learned_skills.as_deref().unwrap_or_default());
    render_skill_progress(md, "Next to learn", path.to_learn_skills.as_deref().unwrap_or_default());
    md.push('\n');
}

fn render_skill_progress(md: &mut String, label: &str, skills: &[SkillProgress]) {
    if skills.is_empty() {
        return;
    }
    let _ = writeln!(md, "- {label}:");
    for progress in skills {
        let _ = write!(md, "  - {}", describe_skill(&progress.skill));
        if let Some(status) = &progress.status {
            let _ = write!(md, ", status {status}");
        }
        if let Some(target_level) = &progress.proficiency_level {
            let _ = write!(md, ", aiming for {target_level}");
        }
        md.push('\n');
        for resource in progress.resources.iter().flatten() {
            let title = or_unknown(resource.title.as_deref());
            let mut details: Vec<&str> = Vec::new();
            details.extend(resource.resource_type.as_deref());
            details.extend(resource.provider.as_deref());
            details.extend(resource.price.as_deref());
            if details.is_empty() {
                let _ = writeln!(md, "    - Resource: {title}");
            } else {
                let _ = writeln!(md, "    - Resource: {title} ({})", details.join(", "));
            }
        }
    }
}

fn describe_skill(skill: &Skill) -> String {
    let mut out = skill.name.clone();
    let qualifiers: Vec<&str> = [skill.category.as_deref(), skill.level.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !qualifiers.is_empty() {
        let _ = write!(out, " ({})", qualifiers.join(", "));
    }
    out
}

fn or_unknown(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("unknown")
}
